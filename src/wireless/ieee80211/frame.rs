//! 802.11 Frame Structure
//!
//! Frame control decoding, addressing and dispatch to the field extractors.

use serde::{Serialize, Serializer};
use tracing::trace;

use super::data::DataFrame;
use super::management::{ManagementFrame, ManagementKind};
use crate::error::{byte_at, slice_at, ParseError};
use crate::wireless::radiotap::RadiotapInfo;

/// MAC address (6 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MacAddr([u8; 6]);

impl MacAddr {
    pub const BROADCAST: MacAddr = MacAddr([0xff; 6]);

    pub const fn new(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(data: &[u8]) -> Option<Self> {
        let bytes: [u8; 6] = data.get(..6)?.try_into().ok()?;
        Some(Self(bytes))
    }

    /// Read the address at `offset` of a frame header
    pub(crate) fn read(
        header: &[u8],
        offset: usize,
        field: &'static str,
    ) -> Result<Self, ParseError> {
        let bytes = slice_at(header, offset, 6, field)?;
        let mut out = [0u8; 6];
        out.copy_from_slice(bytes);
        Ok(Self(out))
    }

    pub fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }

    /// Member of the well-known broadcast/multicast table, see [`is_broadcast`]
    pub fn is_broadcast(&self) -> bool {
        is_broadcast(&self.0)
    }
}

impl From<[u8; 6]> for MacAddr {
    fn from(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }
}

impl std::fmt::Display for MacAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

impl Serialize for MacAddr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Well-known broadcast and multicast destinations
pub const BROADCAST_ADDRESSES: [(&str, [u8; 6]); 10] = [
    ("oldbcast", [0x00, 0x00, 0x00, 0x00, 0x00, 0x00]),
    ("l2", [0xff, 0xff, 0xff, 0xff, 0xff, 0xff]),
    ("ipv6m", [0x33, 0x33, 0x00, 0x00, 0x00, 0x16]),
    ("stp", [0x01, 0x80, 0xc2, 0x00, 0x00, 0x00]),
    ("cdp", [0x01, 0x00, 0x0c, 0xcc, 0xcc, 0xcc]),
    ("cstp", [0x01, 0x00, 0x0c, 0xcc, 0xcc, 0xcd]),
    ("stpp", [0x01, 0x80, 0xc2, 0x00, 0x00, 0x08]),
    ("oam", [0x01, 0x80, 0xc2, 0x00, 0x00, 0x02]),
    ("ipv4m", [0x01, 0x00, 0x5e, 0x00, 0x00, 0xcd]),
    ("ota", [0x01, 0x0b, 0x85, 0x00, 0x00, 0x00]),
];

/// Any address starting with these bytes is IPv6 multicast
pub const IPV6_MULTICAST_PREFIX: [u8; 2] = [0x33, 0x33];

/// True for addresses in [`BROADCAST_ADDRESSES`] and for IPv6 multicast.
///
/// Meant for consumers filtering records; the parsers never call it.
pub fn is_broadcast(mac: &[u8; 6]) -> bool {
    mac[..2] == IPV6_MULTICAST_PREFIX || BROADCAST_ADDRESSES.iter().any(|(_, addr)| addr == mac)
}

/// Frame type (2 bits)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameType {
    Management = 0,
    Control = 1,
    Data = 2,
    Extension = 3,
}

impl From<u8> for FrameType {
    fn from(val: u8) -> Self {
        match val & 0x03 {
            0 => FrameType::Management,
            1 => FrameType::Control,
            2 => FrameType::Data,
            _ => FrameType::Extension,
        }
    }
}

/// Type and subtype from the first frame control byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct FrameKey {
    pub frame_type: FrameType,
    pub subtype: u8,
}

impl FrameKey {
    pub fn from_control_byte(fc0: u8) -> Self {
        Self {
            frame_type: FrameType::from((fc0 >> 2) & 0x03),
            subtype: fc0 >> 4,
        }
    }
}

/// Distribution-system bits from the second frame control byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DsBits {
    /// Neither bit set (station to station, or management)
    Neither = 0,
    /// Station to the distribution system via the AP
    ToDs = 1,
    /// Distribution system to a station via the AP
    FromDs = 2,
    /// Wireless distribution system (both bits)
    Wds = 3,
}

impl DsBits {
    pub fn from_flags(fc1: u8) -> Self {
        match fc1 & 0x03 {
            0 => DsBits::Neither,
            1 => DsBits::ToDs,
            2 => DsBits::FromDs,
            _ => DsBits::Wds,
        }
    }

    pub(crate) fn read(header: &[u8]) -> Result<Self, ParseError> {
        byte_at(header, 1, "frame control flags").map(Self::from_flags)
    }
}

/// Destination, source and BSSID of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AddressTriple {
    pub destination: MacAddr,
    pub source: MacAddr,
    pub bssid: MacAddr,
}

/// Frame categories with an extractor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Management(ManagementKind),
    Data,
}

impl FrameKind {
    /// `None` for combinations that are valid but not decoded
    pub fn classify(key: FrameKey) -> Option<Self> {
        match (key.frame_type, key.subtype) {
            (FrameType::Management, 4) => {
                Some(FrameKind::Management(ManagementKind::ProbeRequest))
            }
            (FrameType::Management, 5) => {
                Some(FrameKind::Management(ManagementKind::ProbeResponse))
            }
            (FrameType::Management, 8) => Some(FrameKind::Management(ManagementKind::Beacon)),
            // Null (4) and CF-Ack+CF-Poll QoS Null (13) carry nothing worth extracting
            (FrameType::Data, 0..=3 | 5..=12 | 14 | 15) => Some(FrameKind::Data),
            _ => None,
        }
    }
}

/// Decoded body of a supported frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum FrameBody {
    Management(ManagementFrame),
    Data(DataFrame),
}

/// One decoded frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedFrame {
    pub key: FrameKey,
    /// Offset of the 802.11 header inside `raw`
    pub header_offset: usize,
    pub body: FrameBody,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radiotap: Option<RadiotapInfo>,
    /// The captured bytes, capture prefix included
    #[serde(skip)]
    pub raw: Vec<u8>,
}

impl ParsedFrame {
    pub fn addresses(&self) -> &AddressTriple {
        match &self.body {
            FrameBody::Management(m) => &m.addresses,
            FrameBody::Data(d) => &d.addresses,
        }
    }

    pub fn ds(&self) -> DsBits {
        match &self.body {
            FrameBody::Management(m) => m.ds,
            FrameBody::Data(d) => d.ds,
        }
    }

    pub fn management(&self) -> Option<&ManagementFrame> {
        match &self.body {
            FrameBody::Management(m) => Some(m),
            FrameBody::Data(_) => None,
        }
    }

    /// Short label for the frame category
    pub fn label(&self) -> &'static str {
        match &self.body {
            FrameBody::Management(m) => m.kind.name(),
            FrameBody::Data(_) => "data",
        }
    }
}

/// Decode the 802.11 frame that starts at `header_offset` in `raw`.
///
/// `Ok(None)` means the frame is well formed but of a kind that is not
/// decoded (control frames, association, WDS data, ...).
pub fn parse_frame(raw: &[u8], header_offset: usize) -> Result<Option<ParsedFrame>, ParseError> {
    let header = raw.get(header_offset..).ok_or(ParseError::Truncated {
        field: "capture header",
        needed: header_offset,
        available: raw.len(),
    })?;
    let key = FrameKey::from_control_byte(byte_at(header, 0, "frame control")?);

    let Some(kind) = FrameKind::classify(key) else {
        trace!(?key, "no extractor for frame");
        return Ok(None);
    };

    let body = match kind {
        FrameKind::Management(kind) => FrameBody::Management(ManagementFrame::parse(kind, header)?),
        FrameKind::Data => match DataFrame::parse(header)? {
            Some(data) => FrameBody::Data(data),
            None => {
                trace!(?key, "wds data frame");
                return Ok(None);
            }
        },
    };

    Ok(Some(ParsedFrame {
        key,
        header_offset,
        body,
        radiotap: None,
        raw: raw.to_vec(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mgmt_header(fc0: u8) -> Vec<u8> {
        let mut h = vec![fc0, 0x00, 0x00, 0x00];
        h.extend_from_slice(&[0xff; 6]);
        h.extend_from_slice(&[0x02, 0x11, 0x22, 0x33, 0x44, 0x55]);
        h.extend_from_slice(&[0x02, 0x11, 0x22, 0x33, 0x44, 0x55]);
        h.extend_from_slice(&[0x10, 0x00]);
        h
    }

    fn probe_request() -> Vec<u8> {
        let mut f = mgmt_header(0x40);
        f.extend_from_slice(&[0x00, 0x04, b'h', b'o', b'm', b'e']);
        f.extend_from_slice(&[0x01, 0x02, 0x82, 0x84]);
        f.extend_from_slice(&[0x03, 0x01, 0x06]);
        f
    }

    #[test]
    fn test_frame_key_bits() {
        let beacon = FrameKey::from_control_byte(0x80);
        assert_eq!(beacon.frame_type, FrameType::Management);
        assert_eq!(beacon.subtype, 8);

        let qos = FrameKey::from_control_byte(0x88);
        assert_eq!(qos.frame_type, FrameType::Data);
        assert_eq!(qos.subtype, 8);

        let ack = FrameKey::from_control_byte(0xd4);
        assert_eq!(ack.frame_type, FrameType::Control);
        assert_eq!(ack.subtype, 13);
    }

    #[test]
    fn test_classify_table() {
        let mgmt = |s| {
            FrameKind::classify(FrameKey { frame_type: FrameType::Management, subtype: s })
        };
        let data = |s| FrameKind::classify(FrameKey { frame_type: FrameType::Data, subtype: s });

        assert_eq!(mgmt(8), Some(FrameKind::Management(ManagementKind::Beacon)));
        assert_eq!(mgmt(4), Some(FrameKind::Management(ManagementKind::ProbeRequest)));
        assert_eq!(mgmt(5), Some(FrameKind::Management(ManagementKind::ProbeResponse)));
        for s in [0, 1, 2, 3, 9, 10, 11, 12, 13, 14, 15] {
            assert_eq!(mgmt(s), None, "management subtype {}", s);
        }
        for s in 0..16 {
            let expected = if s == 4 || s == 13 { None } else { Some(FrameKind::Data) };
            assert_eq!(data(s), expected, "data subtype {}", s);
            assert_eq!(
                FrameKind::classify(FrameKey { frame_type: FrameType::Control, subtype: s }),
                None
            );
        }
    }

    #[test]
    fn test_broadcast_table() {
        assert!(is_broadcast(&[0xff; 6]));
        assert!(is_broadcast(&[0x00; 6]));
        assert!(is_broadcast(&[0x01, 0x80, 0xc2, 0x00, 0x00, 0x00]));
        assert!(is_broadcast(&[0x01, 0x0b, 0x85, 0x00, 0x00, 0x00]));
        assert!(is_broadcast(&[0x33, 0x33, 0xff, 0x12, 0x34, 0x56]));
        assert!(!is_broadcast(&[0x02, 0x11, 0x22, 0x33, 0x44, 0x55]));
        assert!(!is_broadcast(&[0x01, 0x00, 0x5e, 0x00, 0x00, 0x01]));
        assert!(MacAddr::BROADCAST.is_broadcast());
    }

    #[test]
    fn test_mac_display() {
        let mac = MacAddr::new([0x00, 0x1a, 0x2b, 0x3c, 0x4d, 0x5e]);
        assert_eq!(mac.to_string(), "00:1a:2b:3c:4d:5e");
        assert_eq!(serde_json::to_string(&mac).unwrap(), "\"00:1a:2b:3c:4d:5e\"");
        assert_eq!(MacAddr::from_slice(&[1, 2, 3]), None);
    }

    #[test]
    fn test_dispatch_probe_request() {
        let raw = probe_request();
        let parsed = parse_frame(&raw, 0).unwrap().unwrap();

        assert_eq!(parsed.key.subtype, 4);
        assert_eq!(parsed.label(), "probe_request");
        assert_eq!(parsed.header_offset, 0);
        assert_eq!(parsed.raw, raw);
        let mgmt = parsed.management().unwrap();
        assert_eq!(mgmt.ssid, "home");
        assert_eq!(mgmt.channel, 6);
    }

    #[test]
    fn test_dispatch_respects_offset() {
        let mut raw = vec![0xaa; 5];
        raw.extend(probe_request());
        let parsed = parse_frame(&raw, 5).unwrap().unwrap();
        assert_eq!(parsed.header_offset, 5);
        assert_eq!(parsed.raw.len(), raw.len());
        assert_eq!(parsed.addresses().destination, MacAddr::BROADCAST);
    }

    #[test]
    fn test_unhandled_frames() {
        // ACK, association request, reserved type
        for fc0 in [0xd4u8, 0x00, 0x0c] {
            assert_eq!(parse_frame(&[fc0, 0x00], 0), Ok(None));
        }
        // Deauthentication with a body is still unhandled, not malformed
        let deauth = mgmt_header(0xc0);
        assert_eq!(parse_frame(&deauth, 0), Ok(None));
    }

    #[test]
    fn test_empty_and_short_input_is_malformed() {
        assert!(parse_frame(&[], 0).is_err());
        assert!(parse_frame(&[0x80, 0x00], 4).is_err());
        assert!(parse_frame(&[0x80, 0x00, 0x00], 0).is_err());
    }

    #[test]
    fn test_parse_is_idempotent() {
        let raw = probe_request();
        assert_eq!(parse_frame(&raw, 0), parse_frame(&raw, 0));
    }
}
