//! 802.11 Data Frame Types
//!
//! Only the addressing is extracted; payloads are left alone.

use serde::Serialize;

use super::frame::{AddressTriple, DsBits, MacAddr};
use crate::error::ParseError;

/// Data frame addressing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DataFrame {
    pub ds: DsBits,
    pub addresses: AddressTriple,
}

impl DataFrame {
    /// Extract addresses from a frame starting at the 802.11 header.
    ///
    /// `Ok(None)` for WDS frames (both DS bits set), which are not decoded.
    /// A data frame with neither DS bit set is treated as mangled.
    pub fn parse(header: &[u8]) -> Result<Option<Self>, ParseError> {
        let ds = DsBits::read(header)?;

        // (destination, source, bssid) offsets
        let (dst, src, bssid) = match ds {
            DsBits::ToDs => (16, 10, 4),
            DsBits::FromDs => (4, 16, 10),
            DsBits::Wds => return Ok(None),
            DsBits::Neither => return Err(ParseError::InvalidDsBits(0)),
        };

        let addresses = AddressTriple {
            destination: MacAddr::read(header, dst, "destination address")?,
            source: MacAddr::read(header, src, "source address")?,
            bssid: MacAddr::read(header, bssid, "bssid")?,
        };

        Ok(Some(Self { ds, addresses }))
    }
}
