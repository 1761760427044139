pub mod config;
pub mod error;
pub mod wireless;

pub use config::Config;
pub use error::{Error, ParseError, Result};
pub use wireless::{
    CaptureSession, DecodeStats, Decoded, FrameDecoder, FrameSource, HeaderLayout, MangledCounter,
    ParsedFrame, PcapFileSource,
};
