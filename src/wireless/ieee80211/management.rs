//! 802.11 Management Frame Types
//!
//! Beacon, probe request and probe response extraction. All three share the
//! 24-byte header layout; beacons and probe responses carry 12 bytes of
//! fixed parameters before the information elements.

use serde::Serialize;

use super::elements::{parse_ies, InformationElements};
use super::frame::{AddressTriple, DsBits, MacAddr};
use crate::error::{slice_at, ParseError};

/// Length of the management frame header
pub const MGMT_HEADER_LEN: usize = 24;

/// Length of the beacon/probe response fixed parameters
pub const FIXED_PARAMS_LEN: usize = 12;

/// Management subtypes with an extractor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ManagementKind {
    ProbeRequest,
    ProbeResponse,
    Beacon,
}

impl ManagementKind {
    /// Where the information elements begin, counted from the header start.
    ///
    /// Fixed per kind; frames with non-standard fixed parameter widths are
    /// not accounted for.
    pub const fn element_offset(self) -> usize {
        match self {
            ManagementKind::ProbeRequest => MGMT_HEADER_LEN,
            ManagementKind::ProbeResponse | ManagementKind::Beacon => {
                MGMT_HEADER_LEN + FIXED_PARAMS_LEN
            }
        }
    }

    pub const fn has_fixed_parameters(self) -> bool {
        !matches!(self, ManagementKind::ProbeRequest)
    }

    pub fn name(self) -> &'static str {
        match self {
            ManagementKind::ProbeRequest => "probe_request",
            ManagementKind::ProbeResponse => "probe_response",
            ManagementKind::Beacon => "beacon",
        }
    }
}

/// Timestamp, beacon interval and capability info
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FixedParameters {
    /// TSF timer (microseconds)
    pub timestamp: u64,
    /// Beacon interval (TUs, 1 TU = 1024 microseconds)
    pub interval: u16,
    pub capability: u16,
}

impl FixedParameters {
    fn parse(header: &[u8]) -> Result<Self, ParseError> {
        let b = slice_at(header, MGMT_HEADER_LEN, FIXED_PARAMS_LEN, "fixed parameters")?;
        let mut ts = [0u8; 8];
        ts.copy_from_slice(&b[0..8]);
        Ok(Self {
            timestamp: u64::from_le_bytes(ts),
            interval: u16::from_le_bytes([b[8], b[9]]),
            capability: u16::from_le_bytes([b[10], b[11]]),
        })
    }

    /// Infrastructure BSS
    pub fn is_ess(&self) -> bool {
        self.capability & 0x0001 != 0
    }

    /// Ad-hoc BSS
    pub fn is_ibss(&self) -> bool {
        self.capability & 0x0002 != 0
    }

    pub fn is_privacy(&self) -> bool {
        self.capability & 0x0010 != 0
    }
}

/// Beacon, probe request or probe response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManagementFrame {
    pub kind: ManagementKind,
    pub ds: DsBits,
    pub addresses: AddressTriple,
    pub ssid: String,
    pub channel: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed: Option<FixedParameters>,
    pub elements: InformationElements,
}

impl ManagementFrame {
    /// Extract from a frame starting at the 802.11 header.
    ///
    /// Frames without both an SSID and a channel element are rejected.
    pub fn parse(kind: ManagementKind, header: &[u8]) -> Result<Self, ParseError> {
        let ds = DsBits::read(header)?;
        let addresses = AddressTriple {
            destination: MacAddr::read(header, 4, "destination address")?,
            source: MacAddr::read(header, 10, "source address")?,
            bssid: MacAddr::read(header, 16, "bssid")?,
        };

        let fixed = if kind.has_fixed_parameters() {
            Some(FixedParameters::parse(header)?)
        } else {
            None
        };

        let offset = kind.element_offset();
        let body = header.get(offset..).ok_or(ParseError::Truncated {
            field: "information elements",
            needed: offset,
            available: header.len(),
        })?;
        let elements = parse_ies(body)?;

        let ssid = elements
            .ssid
            .clone()
            .ok_or(ParseError::MissingElement("ssid"))?;
        let channel = elements
            .channel
            .ok_or(ParseError::MissingElement("channel"))?;

        Ok(Self {
            kind,
            ds,
            addresses,
            ssid,
            channel,
            fixed,
            elements,
        })
    }

    /// Privacy bit set or an RSN element present
    pub fn is_protected(&self) -> bool {
        self.elements.rsn.is_some() || self.fixed.map(|f| f.is_privacy()).unwrap_or(false)
    }

    pub fn is_hidden(&self) -> bool {
        self.ssid.is_empty() || self.ssid.chars().all(|c| c == '\0')
    }
}
