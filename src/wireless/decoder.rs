//! Per-session frame decoding
//!
//! Wraps [`parse_frame`] with the session's capture-header layout and the
//! shared mangled counter.

use serde::Serialize;
use tracing::debug;

use super::ieee80211::{parse_frame, ParsedFrame};
use super::mangled::MangledCounter;
use super::radiotap::{parse_radiotap, RadiotapHeader};
use crate::error::ParseError;

/// Where the 802.11 header starts in frames of a capture session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "layout", rename_all = "snake_case")]
pub enum HeaderLayout {
    /// Frames start directly with the 802.11 header
    #[default]
    Bare,
    /// Frames carry a radiotap prefix of `len` bytes
    Radiotap { len: u16 },
}

impl HeaderLayout {
    /// Layout implied by the first radiotap frame of a session
    pub fn from_radiotap_frame(first: &[u8]) -> Option<Self> {
        RadiotapHeader::length_field(first).map(|len| Self::Radiotap { len })
    }

    /// Offset of the 802.11 header in `raw`.
    ///
    /// A frame whose own radiotap length differs from the session length is
    /// taken to have no prefix (injected frames carry none).
    pub fn header_offset(&self, raw: &[u8]) -> usize {
        match *self {
            Self::Bare => 0,
            Self::Radiotap { len } => match RadiotapHeader::length_field(raw) {
                Some(own) if own == len => len as usize,
                _ => 0,
            },
        }
    }
}

/// Outcome of decoding one capture poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    Frame(ParsedFrame),
    /// Well-formed frame with no extractor
    Unhandled,
    Malformed(ParseError),
    /// The capture returned nothing
    NoInput,
}

impl Decoded {
    pub fn frame(&self) -> Option<&ParsedFrame> {
        match self {
            Decoded::Frame(f) => Some(f),
            _ => None,
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Decoded::Malformed(_))
    }
}

/// Running totals for a capture session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DecodeStats {
    /// Frames handed to the decoder
    pub frames: u64,
    pub records: u64,
    pub unhandled: u64,
    pub malformed: u64,
    /// Polls that returned nothing
    pub empty_polls: u64,
}

impl DecodeStats {
    pub fn record(&mut self, outcome: &Decoded) {
        match outcome {
            Decoded::Frame(_) => {
                self.frames += 1;
                self.records += 1;
            }
            Decoded::Unhandled => {
                self.frames += 1;
                self.unhandled += 1;
            }
            Decoded::Malformed(_) => {
                self.frames += 1;
                self.malformed += 1;
            }
            Decoded::NoInput => self.empty_polls += 1,
        }
    }
}

/// Decodes frames for one capture session
#[derive(Debug, Clone)]
pub struct FrameDecoder {
    layout: HeaderLayout,
    mangled: MangledCounter,
}

impl FrameDecoder {
    pub fn new(layout: HeaderLayout, mangled: MangledCounter) -> Self {
        Self { layout, mangled }
    }

    pub fn layout(&self) -> HeaderLayout {
        self.layout
    }

    pub fn mangled(&self) -> &MangledCounter {
        &self.mangled
    }

    /// Decode one polled buffer.
    ///
    /// Each malformed frame bumps the mangled counter exactly once.
    pub fn decode(&self, raw: Option<&[u8]>) -> Decoded {
        let Some(raw) = raw else {
            return Decoded::NoInput;
        };

        let offset = self.layout.header_offset(raw);
        match parse_frame(raw, offset) {
            Ok(Some(mut frame)) => {
                if offset > 0 {
                    frame.radiotap = parse_radiotap(raw).map(|(_, info)| info);
                }
                Decoded::Frame(frame)
            }
            Ok(None) => Decoded::Unhandled,
            Err(e) => {
                let total = self.mangled.record();
                debug!(error = %e, len = raw.len(), offset, total, "mangled frame");
                Decoded::Malformed(e)
            }
        }
    }
}
