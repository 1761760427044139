//! Information Element parsing
//!
//! Management frame bodies end in a sequence of `tag(1) length(1) payload`
//! records. A record whose declared length runs past the buffer makes the
//! whole sequence unusable; a record that frames correctly but fails its
//! own decoder is set aside in [`InformationElements::rejected`] and the
//! remaining records still parse.

use serde::Serialize;
use tracing::debug;

use super::rsn::RsnInfo;
use crate::error::ParseError;

/// Elements with a registered decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ElementId {
    Ssid = 0x00,
    SupportedRates = 0x01,
    DsParameter = 0x03,
    RsnInfo = 0x30,
    ExtendedSupportedRates = 0x32,
}

impl ElementId {
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0x00 => Some(ElementId::Ssid),
            0x01 => Some(ElementId::SupportedRates),
            0x03 => Some(ElementId::DsParameter),
            0x30 => Some(ElementId::RsnInfo),
            0x32 => Some(ElementId::ExtendedSupportedRates),
            _ => None,
        }
    }

    /// Key the decoded value is stored under
    pub fn name(self) -> &'static str {
        match self {
            ElementId::Ssid => "ssid",
            ElementId::SupportedRates => "rates",
            ElementId::DsParameter => "channel",
            ElementId::RsnInfo => "rsn",
            ElementId::ExtendedSupportedRates => "exrates",
        }
    }
}

/// Position of one element inside the parsed buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ElementSpan {
    pub tag: u8,
    pub offset: usize,
    /// Total size including the tag and length bytes
    pub len: usize,
}

/// An element that framed correctly but whose payload failed to decode
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedElement {
    pub tag: u8,
    pub span: Vec<u8>,
    pub reason: ParseError,
}

/// Decoded elements from one management frame body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InformationElements {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rates: Option<Vec<u8>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exrates: Option<Vec<u8>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rsn: Option<RsnInfo>,
    /// Raw spans of elements without a decoder, in wire order
    pub unparsed: Vec<Vec<u8>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rejected: Vec<RejectedElement>,
    /// Every element seen, in wire order
    #[serde(skip)]
    pub spans: Vec<ElementSpan>,
}

impl InformationElements {
    /// Whether a decoded value is stored under `name`
    pub fn contains(&self, name: &str) -> bool {
        match name {
            "ssid" => self.ssid.is_some(),
            "rates" => self.rates.is_some(),
            "channel" => self.channel.is_some(),
            "exrates" => self.exrates.is_some(),
            "rsn" => self.rsn.is_some(),
            _ => false,
        }
    }

    /// Supported and extended rates together, in wire order
    pub fn all_rates(&self) -> Vec<u8> {
        self.rates
            .iter()
            .chain(self.exrates.iter())
            .flatten()
            .copied()
            .collect()
    }

    /// Store the decoded value of `span`. Nothing is written on error.
    fn decode(&mut self, id: ElementId, span: &[u8]) -> Result<(), ParseError> {
        let payload = &span[2..];
        match id {
            ElementId::Ssid => self.ssid = Some(String::from_utf8_lossy(payload).into_owned()),
            ElementId::SupportedRates => self.rates = Some(payload.to_vec()),
            ElementId::ExtendedSupportedRates => self.exrates = Some(payload.to_vec()),
            ElementId::DsParameter => {
                self.channel = Some(crate::error::byte_at(payload, 0, "channel")?);
            }
            ElementId::RsnInfo => self.rsn = Some(RsnInfo::parse(payload)?),
        }
        Ok(())
    }
}

/// Split `data` into elements and decode the ones with a registered decoder.
///
/// Returns an error without any partial result when an element's declared
/// length overruns the buffer.
pub fn parse_ies(data: &[u8]) -> Result<InformationElements, ParseError> {
    let mut ies = InformationElements::default();
    let mut offset = 0;

    while offset < data.len() {
        let rest = &data[offset..];
        let tag = rest[0];
        let declared = crate::error::byte_at(rest, 1, "element length")? as usize;
        let span_len = declared + 2;
        if span_len > rest.len() {
            return Err(ParseError::TagOverrun {
                tag,
                declared,
                available: rest.len() - 2,
            });
        }
        let span = &rest[..span_len];

        match ElementId::from_tag(tag) {
            Some(id) => {
                if let Err(reason) = ies.decode(id, span) {
                    debug!(element = id.name(), %reason, "rejected information element");
                    ies.rejected.push(RejectedElement {
                        tag,
                        span: span.to_vec(),
                        reason,
                    });
                }
            }
            None => ies.unparsed.push(span.to_vec()),
        }
        ies.spans.push(ElementSpan {
            tag,
            offset,
            len: span_len,
        });
        offset += span_len;
    }

    Ok(ies)
}
