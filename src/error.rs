use serde::{Serialize, Serializer};
use thiserror::Error;

/// Reasons a frame or one of its sub-structures is rejected as mangled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("truncated {field}: need {needed} bytes, have {available}")]
    Truncated {
        field: &'static str,
        needed: usize,
        available: usize,
    },

    #[error("element {tag:#04x} declares {declared} bytes but only {available} remain")]
    TagOverrun {
        tag: u8,
        declared: usize,
        available: usize,
    },

    #[error("required element missing: {0}")]
    MissingElement(&'static str),

    #[error("invalid distribution-system bits {0:#04b} for a data frame")]
    InvalidDsBits(u8),
}

impl Serialize for ParseError {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Errors from the capture and configuration layers.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("pcap error: {0}")]
    Pcap(#[from] pcap::Error),

    #[error("capture error: {0}")]
    Capture(String),

    #[error("capture ended before any frame was seen")]
    NoFrames,
}

pub type Result<T> = std::result::Result<T, Error>;

/// Borrow `data[offset..offset + len]`, reporting the shortfall as `field`.
pub(crate) fn slice_at<'a>(
    data: &'a [u8],
    offset: usize,
    len: usize,
    field: &'static str,
) -> std::result::Result<&'a [u8], ParseError> {
    let end = offset.saturating_add(len);
    data.get(offset..end).ok_or(ParseError::Truncated {
        field,
        needed: end,
        available: data.len(),
    })
}

pub(crate) fn byte_at(
    data: &[u8],
    offset: usize,
    field: &'static str,
) -> std::result::Result<u8, ParseError> {
    slice_at(data, offset, 1, field).map(|b| b[0])
}
