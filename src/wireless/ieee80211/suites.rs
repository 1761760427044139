//! Cipher and AKM suite registries
//!
//! Maps the one-byte suite type that follows an OUI in RSN suite selectors
//! to a readable name. Unknown ids are kept as raw numbers.

use std::fmt;

use serde::{Serialize, Serializer};

/// Organizationally unique identifier preceding a suite type
pub type Oui = [u8; 3];

/// OUI used by IEEE 802.11 for the standard suites
pub const IEEE80211_OUI: Oui = [0x00, 0x0f, 0xac];

/// Pairwise or group cipher suite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CipherSuite {
    UseGroup,
    Wep40,
    Tkip,
    Reserved,
    Ccmp,
    Wep104,
    BipCmac128,
    Gcmp128,
    Gcmp256,
    Ccmp256,
    BipGmac128,
    BipGmac256,
    Unknown(u8),
}

impl From<u8> for CipherSuite {
    fn from(val: u8) -> Self {
        match val {
            0 => CipherSuite::UseGroup,
            1 => CipherSuite::Wep40,
            2 => CipherSuite::Tkip,
            3 => CipherSuite::Reserved,
            4 => CipherSuite::Ccmp,
            5 => CipherSuite::Wep104,
            6 => CipherSuite::BipCmac128,
            8 => CipherSuite::Gcmp128,
            9 => CipherSuite::Gcmp256,
            10 => CipherSuite::Ccmp256,
            11 => CipherSuite::BipGmac128,
            12 => CipherSuite::BipGmac256,
            _ => CipherSuite::Unknown(val),
        }
    }
}

impl CipherSuite {
    pub fn id(&self) -> u8 {
        match self {
            CipherSuite::UseGroup => 0,
            CipherSuite::Wep40 => 1,
            CipherSuite::Tkip => 2,
            CipherSuite::Reserved => 3,
            CipherSuite::Ccmp => 4,
            CipherSuite::Wep104 => 5,
            CipherSuite::BipCmac128 => 6,
            CipherSuite::Gcmp128 => 8,
            CipherSuite::Gcmp256 => 9,
            CipherSuite::Ccmp256 => 10,
            CipherSuite::BipGmac128 => 11,
            CipherSuite::BipGmac256 => 12,
            CipherSuite::Unknown(id) => *id,
        }
    }

    /// Registry name, `None` for ids without an entry
    pub fn name(&self) -> Option<&'static str> {
        let name = match self {
            CipherSuite::UseGroup => "USE-GROUP",
            CipherSuite::Wep40 => "WEP-40/64",
            CipherSuite::Tkip => "TKIP",
            CipherSuite::Reserved => "RESERVED",
            CipherSuite::Ccmp => "CCMP",
            CipherSuite::Wep104 => "WEP-104/128",
            CipherSuite::BipCmac128 => "BIP-CMAC-128",
            CipherSuite::Gcmp128 => "GCMP-128",
            CipherSuite::Gcmp256 => "GCMP-256",
            CipherSuite::Ccmp256 => "CCMP-256",
            CipherSuite::BipGmac128 => "BIP-GMAC-128",
            CipherSuite::BipGmac256 => "BIP-GMAC-256",
            CipherSuite::Unknown(_) => return None,
        };
        Some(name)
    }

    /// WEP and TKIP are broken
    pub fn is_legacy(&self) -> bool {
        matches!(
            self,
            CipherSuite::Wep40 | CipherSuite::Wep104 | CipherSuite::Tkip
        )
    }
}

/// Authentication and key management suite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AkmSuite {
    Dot1x,
    Psk,
    FtDot1x,
    FtPsk,
    Dot1xSha256,
    PskSha256,
    Sae,
    FtSae,
    Owe,
    Unknown(u8),
}

impl From<u8> for AkmSuite {
    fn from(val: u8) -> Self {
        match val {
            1 => AkmSuite::Dot1x,
            2 => AkmSuite::Psk,
            3 => AkmSuite::FtDot1x,
            4 => AkmSuite::FtPsk,
            5 => AkmSuite::Dot1xSha256,
            6 => AkmSuite::PskSha256,
            8 => AkmSuite::Sae,
            9 => AkmSuite::FtSae,
            18 => AkmSuite::Owe,
            _ => AkmSuite::Unknown(val),
        }
    }
}

impl AkmSuite {
    pub fn id(&self) -> u8 {
        match self {
            AkmSuite::Dot1x => 1,
            AkmSuite::Psk => 2,
            AkmSuite::FtDot1x => 3,
            AkmSuite::FtPsk => 4,
            AkmSuite::Dot1xSha256 => 5,
            AkmSuite::PskSha256 => 6,
            AkmSuite::Sae => 8,
            AkmSuite::FtSae => 9,
            AkmSuite::Owe => 18,
            AkmSuite::Unknown(id) => *id,
        }
    }

    pub fn name(&self) -> Option<&'static str> {
        let name = match self {
            AkmSuite::Dot1x => "802.1x or PMK",
            AkmSuite::Psk => "PSK",
            AkmSuite::FtDot1x => "FT-802.1x",
            AkmSuite::FtPsk => "FT-PSK",
            AkmSuite::Dot1xSha256 => "802.1x-SHA256",
            AkmSuite::PskSha256 => "PSK-SHA256",
            AkmSuite::Sae => "SAE",
            AkmSuite::FtSae => "FT-SAE",
            AkmSuite::Owe => "OWE",
            AkmSuite::Unknown(_) => return None,
        };
        Some(name)
    }
}

macro_rules! named_suite_impls {
    ($($suite:ty),*) => {$(
        impl fmt::Display for $suite {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self.name() {
                    Some(name) => f.write_str(name),
                    None => write!(f, "{}", self.id()),
                }
            }
        }

        // Named suites serialize as their name, unknown ones as the raw id.
        impl Serialize for $suite {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                match self.name() {
                    Some(name) => serializer.serialize_str(name),
                    None => serializer.serialize_u8(self.id()),
                }
            }
        }
    )*};
}

named_suite_impls!(CipherSuite, AkmSuite);

/// One OUI + suite type entry from an RSN suite list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SuiteSelector<T> {
    pub oui: Oui,
    pub suite: T,
}

impl<T: From<u8>> SuiteSelector<T> {
    /// Build from a 4-byte selector (3-byte OUI, 1-byte type)
    pub fn from_bytes(bytes: [u8; 4]) -> Self {
        Self {
            oui: [bytes[0], bytes[1], bytes[2]],
            suite: T::from(bytes[3]),
        }
    }
}

impl<T> SuiteSelector<T> {
    pub fn is_ieee(&self) -> bool {
        self.oui == IEEE80211_OUI
    }
}
