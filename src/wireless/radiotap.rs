//! Radiotap Header Parser
//!
//! Monitor-mode captures prefix each frame with a radiotap header: a fixed
//! 8-byte part (version, pad, little-endian length, present bitmap) followed
//! by naturally aligned fields selected by the bitmap.
//!
//! Reference: https://www.radiotap.org/

use serde::Serialize;

/// Link type number for radiotap-prefixed 802.11 captures
pub const LINKTYPE_IEEE802_11_RADIOTAP: u32 = 127;

/// Link type number for bare 802.11 captures
pub const LINKTYPE_IEEE802_11: u32 = 105;

/// Present-bitmap bits for the fields decoded here
pub mod present {
    pub const TSFT: u32 = 1 << 0;
    pub const FLAGS: u32 = 1 << 1;
    pub const RATE: u32 = 1 << 2;
    pub const CHANNEL: u32 = 1 << 3;
    pub const FHSS: u32 = 1 << 4;
    pub const DBM_ANTSIGNAL: u32 = 1 << 5;
    pub const DBM_ANTNOISE: u32 = 1 << 6;
    pub const EXT: u32 = 1 << 31;
}

/// Fixed part of a radiotap header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RadiotapHeader {
    pub version: u8,
    /// Total header length including fields
    pub length: u16,
    /// First present bitmap
    pub present: u32,
}

impl RadiotapHeader {
    /// Length field at bytes 2..4, without validating anything else
    pub fn length_field(data: &[u8]) -> Option<u16> {
        let b = data.get(2..4)?;
        Some(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn parse(data: &[u8]) -> Option<Self> {
        let b = data.get(..8)?;
        let header = Self {
            version: b[0],
            length: u16::from_le_bytes([b[2], b[3]]),
            present: u32::from_le_bytes([b[4], b[5], b[6], b[7]]),
        };
        let length = header.length as usize;
        if header.version != 0 || length < 8 || data.len() < length {
            return None;
        }
        Some(header)
    }
}

/// Fields pulled from the radiotap header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RadiotapInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tsft: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<u8>,
    /// Data rate in 500 kbps units
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_freq: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_flags: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal_dbm: Option<i8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub noise_dbm: Option<i8>,
}

impl RadiotapInfo {
    pub fn snr(&self) -> Option<i16> {
        Some(self.signal_dbm? as i16 - self.noise_dbm? as i16)
    }

    /// Channel number derived from the frequency
    pub fn channel(&self) -> Option<u8> {
        self.channel_freq.and_then(freq_to_channel)
    }
}

/// Map a centre frequency in MHz to its channel number
pub fn freq_to_channel(freq: u16) -> Option<u8> {
    match freq {
        2484 => Some(14),
        2412..=2472 => Some(((freq - 2407) / 5) as u8),
        5160..=5885 => Some(((freq - 5000) / 5) as u8),
        5955..=7115 => Some(((freq - 5950) / 5) as u8),
        _ => None,
    }
}

struct FieldReader<'a> {
    header: &'a [u8],
    pos: usize,
}

impl<'a> FieldReader<'a> {
    /// Align to `align` (relative to the header start) and take `len` bytes
    fn field(&mut self, align: usize, len: usize) -> Option<&'a [u8]> {
        let start = self.pos.next_multiple_of(align);
        let bytes = self.header.get(start..start + len)?;
        self.pos = start + len;
        Some(bytes)
    }
}

fn read_fields(reader: &mut FieldReader<'_>, p: u32, info: &mut RadiotapInfo) -> Option<()> {
    if p & present::TSFT != 0 {
        let b = reader.field(8, 8)?;
        let mut v = [0u8; 8];
        v.copy_from_slice(b);
        info.tsft = Some(u64::from_le_bytes(v));
    }
    if p & present::FLAGS != 0 {
        info.flags = Some(reader.field(1, 1)?[0]);
    }
    if p & present::RATE != 0 {
        info.rate = Some(reader.field(1, 1)?[0]);
    }
    if p & present::CHANNEL != 0 {
        let b = reader.field(2, 4)?;
        info.channel_freq = Some(u16::from_le_bytes([b[0], b[1]]));
        info.channel_flags = Some(u16::from_le_bytes([b[2], b[3]]));
    }
    if p & present::FHSS != 0 {
        reader.field(1, 2)?;
    }
    if p & present::DBM_ANTSIGNAL != 0 {
        info.signal_dbm = Some(reader.field(1, 1)?[0] as i8);
    }
    if p & present::DBM_ANTNOISE != 0 {
        info.noise_dbm = Some(reader.field(1, 1)?[0] as i8);
    }
    Some(())
}

/// Parse the radiotap header at the start of `data`.
///
/// Fields are decoded in bitmap order up to antenna noise; decoding stops
/// quietly at the first field that does not fit.
pub fn parse_radiotap(data: &[u8]) -> Option<(RadiotapHeader, RadiotapInfo)> {
    let header = RadiotapHeader::parse(data)?;
    let bytes = &data[..header.length as usize];

    // Skip any extended present bitmaps chained by the EXT bit
    let mut pos = 4;
    loop {
        let word = bytes.get(pos..pos + 4)?;
        pos += 4;
        if u32::from_le_bytes([word[0], word[1], word[2], word[3]]) & present::EXT == 0 {
            break;
        }
    }

    let mut reader = FieldReader { header: bytes, pos };
    let mut info = RadiotapInfo::default();
    read_fields(&mut reader, header.present, &mut info);

    Some((header, info))
}
