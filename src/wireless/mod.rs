//! 802.11 Wireless Frame Decoding
//!
//! This module turns captured monitor mode frames into records:
//! - Radiotap capture header handling
//! - Beacon, probe request and probe response extraction
//! - Data frame addressing
//! - Information element and RSN decoding
//!
//! Capture sources live in [`capture`]; the parsers themselves never touch
//! a device.

pub mod capture;
pub mod decoder;
pub mod ieee80211;
pub mod mangled;
pub mod radiotap;

pub use capture::{
    CaptureSession, FrameSource, LinkLayer, LiveCapture, MemorySource, PcapFileSource,
};
pub use decoder::{DecodeStats, Decoded, FrameDecoder, HeaderLayout};
pub use ieee80211::{
    is_broadcast, parse_frame, parse_ies, AddressTriple, AkmSuite, CipherSuite, DataFrame, DsBits,
    FrameBody, FrameKey, FrameType, InformationElements, MacAddr, ManagementFrame, ManagementKind,
    ParsedFrame, RsnInfo,
};
pub use mangled::MangledCounter;
pub use radiotap::{parse_radiotap, RadiotapHeader, RadiotapInfo};
