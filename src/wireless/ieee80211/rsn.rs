//! RSN (Robust Security Network) element
//!
//! Layout of the element payload, read left to right:
//!
//! ```text
//! version(2) group-oui(3) group-type(1)
//! pairwise-count(2) pairwise-count * [oui(3) type(1)]
//! akm-count(2)      akm-count      * [oui(3) type(1)]
//! capabilities(2) pmkid-count(0..2) pmkid-list(..)
//! ```

use serde::Serialize;

use super::suites::{AkmSuite, CipherSuite, Oui, SuiteSelector};
use crate::error::ParseError;

/// Size of one PMKID in the trailing list
pub const PMKID_LEN: usize = 16;

/// Decoded RSN element
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RsnInfo {
    pub version: u16,
    pub group_oui: Oui,
    pub group_cipher: CipherSuite,
    pub pairwise: Vec<SuiteSelector<CipherSuite>>,
    pub akm: Vec<SuiteSelector<AkmSuite>>,
    /// Capability bits as they appear on the wire
    pub capabilities: [u8; 2],
    /// Raw PMKID count bytes (empty when the element ends after capabilities)
    pub pmkid_count: Vec<u8>,
    /// Raw PMKID list, everything after the count
    pub pmkid_list: Vec<u8>,
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, len: usize, field: &'static str) -> Result<&'a [u8], ParseError> {
        let bytes = crate::error::slice_at(self.data, self.pos, len, field)?;
        self.pos += len;
        Ok(bytes)
    }

    fn u16_le(&mut self, field: &'static str) -> Result<u16, ParseError> {
        let b = self.take(2, field)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn array<const N: usize>(&mut self, field: &'static str) -> Result<[u8; N], ParseError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N, field)?);
        Ok(out)
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Up to `len` bytes, fewer if the buffer ends first
    fn take_up_to(&mut self, len: usize) -> &'a [u8] {
        let end = (self.pos + len).min(self.data.len());
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        bytes
    }

    fn rest(&mut self) -> &'a [u8] {
        self.take_up_to(self.remaining())
    }

    fn selectors<T: From<u8>>(
        &mut self,
        field: &'static str,
    ) -> Result<Vec<SuiteSelector<T>>, ParseError> {
        let count = self.u16_le(field)? as usize;
        // The count is attacker-controlled; never reserve more than the buffer can hold.
        let mut out = Vec::with_capacity(count.min(self.remaining() / 4));
        for _ in 0..count {
            out.push(SuiteSelector::from_bytes(self.array::<4>(field)?));
        }
        Ok(out)
    }
}

impl RsnInfo {
    /// Parse the RSN element payload (tag number and length already stripped)
    pub fn parse(payload: &[u8]) -> Result<Self, ParseError> {
        let mut r = Reader::new(payload);

        let version = r.u16_le("rsn version")?;
        let group_oui = r.array::<3>("rsn group cipher")?;
        let group_cipher = CipherSuite::from(r.array::<1>("rsn group cipher")?[0]);
        let pairwise = r.selectors("rsn pairwise ciphers")?;
        let akm = r.selectors("rsn akm suites")?;
        let capabilities = r.array::<2>("rsn capabilities")?;
        let pmkid_count = r.take_up_to(2).to_vec();
        let pmkid_list = r.rest().to_vec();

        Ok(Self {
            version,
            group_oui,
            group_cipher,
            pairwise,
            akm,
            capabilities,
            pmkid_count,
            pmkid_list,
        })
    }

    /// Capability bits as a little-endian integer
    pub fn capability_bits(&self) -> u16 {
        u16::from_le_bytes(self.capabilities)
    }

    /// Management frame protection required (bit 6)
    pub fn mfp_required(&self) -> bool {
        self.capability_bits() & 0x0040 != 0
    }

    /// Management frame protection capable (bit 7)
    pub fn mfp_capable(&self) -> bool {
        self.capability_bits() & 0x0080 != 0
    }

    /// Complete 16-byte PMKIDs in the list; a short tail is ignored
    pub fn pmkids(&self) -> impl Iterator<Item = &[u8]> {
        self.pmkid_list.chunks_exact(PMKID_LEN)
    }

    pub fn is_wpa3(&self) -> bool {
        self.akm
            .iter()
            .any(|a| matches!(a.suite, AkmSuite::Sae | AkmSuite::FtSae))
    }

    pub fn is_wpa2(&self) -> bool {
        self.pairwise.iter().any(|c| {
            matches!(
                c.suite,
                CipherSuite::Ccmp | CipherSuite::Gcmp128 | CipherSuite::Gcmp256
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OUI: [u8; 3] = [0x00, 0x0f, 0xac];

    fn wpa2_psk_payload() -> Vec<u8> {
        let mut p = vec![0x01, 0x00]; // version 1
        p.extend_from_slice(&[0x00, 0x0f, 0xac, 0x04]); // group CCMP
        p.extend_from_slice(&[0x01, 0x00]); // 1 pairwise
        p.extend_from_slice(&[0x00, 0x0f, 0xac, 0x04]); // CCMP
        p.extend_from_slice(&[0x01, 0x00]); // 1 akm
        p.extend_from_slice(&[0x00, 0x0f, 0xac, 0x02]); // PSK
        p.extend_from_slice(&[0x0c, 0x00]); // capabilities
        p
    }

    #[test]
    fn test_parse_wpa2_psk() {
        let rsn = RsnInfo::parse(&wpa2_psk_payload()).unwrap();

        assert_eq!(rsn.version, 1);
        assert_eq!(rsn.group_oui, OUI);
        assert_eq!(rsn.group_cipher, CipherSuite::Ccmp);
        assert_eq!(rsn.pairwise.len(), 1);
        assert_eq!(rsn.pairwise[0].oui, OUI);
        assert_eq!(rsn.pairwise[0].suite.name(), Some("CCMP"));
        assert_eq!(rsn.akm.len(), 1);
        assert_eq!(rsn.akm[0].oui, OUI);
        assert_eq!(rsn.akm[0].suite.name(), Some("PSK"));
        assert_eq!(rsn.capabilities, [0x0c, 0x00]);
        assert!(rsn.pmkid_count.is_empty());
        assert!(rsn.pmkid_list.is_empty());
        assert!(rsn.is_wpa2());
        assert!(!rsn.is_wpa3());
    }

    #[test]
    fn test_multiple_suites_keep_order() {
        let mut p = vec![0x01, 0x00, 0x00, 0x0f, 0xac, 0x02];
        p.extend_from_slice(&[0x02, 0x00]);
        p.extend_from_slice(&[0x00, 0x0f, 0xac, 0x02, 0x00, 0x0f, 0xac, 0x04]);
        p.extend_from_slice(&[0x02, 0x00]);
        p.extend_from_slice(&[0x00, 0x0f, 0xac, 0x02, 0x00, 0x0f, 0xac, 0x08]);
        p.extend_from_slice(&[0xc0, 0x00]);

        let rsn = RsnInfo::parse(&p).unwrap();
        let pairwise: Vec<_> = rsn.pairwise.iter().map(|s| s.suite).collect();
        let akm: Vec<_> = rsn.akm.iter().map(|s| s.suite).collect();
        assert_eq!(rsn.group_cipher, CipherSuite::Tkip);
        assert_eq!(pairwise, vec![CipherSuite::Tkip, CipherSuite::Ccmp]);
        assert_eq!(akm, vec![AkmSuite::Psk, AkmSuite::Sae]);
        assert!(rsn.is_wpa3());
        assert!(rsn.mfp_required());
        assert!(rsn.mfp_capable());
    }

    #[test]
    fn test_unmapped_ids_stay_raw() {
        let mut p = wpa2_psk_payload();
        p[5] = 0x07; // group cipher id with no registry entry
        p[17] = 0x63; // akm id with no registry entry
        let rsn = RsnInfo::parse(&p).unwrap();
        assert_eq!(rsn.group_cipher, CipherSuite::Unknown(7));
        assert_eq!(rsn.akm[0].suite, AkmSuite::Unknown(0x63));
    }

    #[test]
    fn test_vendor_oui_preserved() {
        let mut p = wpa2_psk_payload();
        p[6 + 2..6 + 5].copy_from_slice(&[0x00, 0x50, 0xf2]);
        let rsn = RsnInfo::parse(&p).unwrap();
        assert_eq!(rsn.pairwise[0].oui, [0x00, 0x50, 0xf2]);
        assert!(!rsn.pairwise[0].is_ieee());
    }

    #[test]
    fn test_pmkid_tail() {
        let mut p = wpa2_psk_payload();
        p.extend_from_slice(&[0x01, 0x00]);
        p.extend_from_slice(&[0xab; PMKID_LEN]);

        let rsn = RsnInfo::parse(&p).unwrap();
        assert_eq!(rsn.pmkid_count, vec![0x01, 0x00]);
        assert_eq!(rsn.pmkid_list.len(), PMKID_LEN);
        assert_eq!(rsn.pmkids().count(), 1);
    }

    #[test]
    fn test_truncation_at_every_required_field() {
        let full = wpa2_psk_payload();
        // Every prefix that stops before the capability bytes are complete is mangled.
        for len in 0..full.len() {
            assert!(
                RsnInfo::parse(&full[..len]).is_err(),
                "prefix of {} bytes should not parse",
                len
            );
        }
    }

    #[test]
    fn test_count_larger_than_buffer() {
        let mut p = vec![0x01, 0x00, 0x00, 0x0f, 0xac, 0x04];
        p.extend_from_slice(&[0xff, 0xff]); // 65535 pairwise entries claimed
        p.extend_from_slice(&[0x00, 0x0f, 0xac, 0x04]);

        let err = RsnInfo::parse(&p).unwrap_err();
        assert!(matches!(
            err,
            ParseError::Truncated {
                field: "rsn pairwise ciphers",
                ..
            }
        ));
    }

    #[test]
    fn test_zero_counts() {
        let p = [
            0x01, 0x00, 0x00, 0x0f, 0xac, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ];
        let rsn = RsnInfo::parse(&p).unwrap();
        assert!(rsn.pairwise.is_empty());
        assert!(rsn.akm.is_empty());
    }
}
