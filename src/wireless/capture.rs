//! Wireless Packet Capture
//!
//! Frame sources for a decode session: pcap file replay and live capture
//! from a monitor mode interface, both through libpcap.

use std::collections::VecDeque;
use std::ops::ControlFlow;
use std::path::Path;

use tracing::{debug, info, warn};

use super::decoder::{DecodeStats, Decoded, FrameDecoder, HeaderLayout};
use super::mangled::MangledCounter;
use super::radiotap::{LINKTYPE_IEEE802_11, LINKTYPE_IEEE802_11_RADIOTAP};
use crate::config::CaptureConfig;
use crate::error::{Error, Result};

/// Link layer of a capture source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkLayer {
    /// 802.11 frames behind a radiotap header
    Radiotap,
    /// Bare 802.11 frames
    Ieee80211,
    Other(u32),
}

impl From<u32> for LinkLayer {
    fn from(linktype: u32) -> Self {
        match linktype {
            LINKTYPE_IEEE802_11_RADIOTAP => LinkLayer::Radiotap,
            LINKTYPE_IEEE802_11 => LinkLayer::Ieee80211,
            other => LinkLayer::Other(other),
        }
    }
}

/// Trait for frame capture implementations
pub trait FrameSource {
    fn link_type(&self) -> LinkLayer;

    /// Poll the next frame; `Ok(None)` when nothing arrived
    fn next_frame(&mut self) -> Result<Option<Vec<u8>>>;

    /// True once the source can never yield another frame
    fn is_exhausted(&self) -> bool {
        false
    }
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn link_type(&self) -> LinkLayer {
        (**self).link_type()
    }

    fn next_frame(&mut self) -> Result<Option<Vec<u8>>> {
        (**self).next_frame()
    }

    fn is_exhausted(&self) -> bool {
        (**self).is_exhausted()
    }
}

/// PCAP file replay capture
pub struct PcapFileSource {
    cap: pcap::Capture<pcap::Offline>,
    link: LinkLayer,
    exhausted: bool,
}

impl PcapFileSource {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let cap = pcap::Capture::from_file(path.as_ref())?;
        let link = LinkLayer::from(cap.get_datalink().0 as u32);
        debug!(path = %path.as_ref().display(), ?link, "opened capture file");
        Ok(Self {
            cap,
            link,
            exhausted: false,
        })
    }
}

impl FrameSource for PcapFileSource {
    fn link_type(&self) -> LinkLayer {
        self.link
    }

    fn next_frame(&mut self) -> Result<Option<Vec<u8>>> {
        if self.exhausted {
            return Ok(None);
        }
        match self.cap.next_packet() {
            Ok(packet) => Ok(Some(packet.data.to_vec())),
            Err(pcap::Error::NoMorePackets) => {
                self.exhausted = true;
                Ok(None)
            }
            Err(e) => {
                self.exhausted = true;
                Err(e.into())
            }
        }
    }

    fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

/// In-memory frame source, exhausted once drained
#[derive(Debug, Clone)]
pub struct MemorySource {
    frames: VecDeque<Vec<u8>>,
    link: LinkLayer,
}

impl MemorySource {
    pub fn new<I>(link: LinkLayer, frames: I) -> Self
    where
        I: IntoIterator<Item = Vec<u8>>,
    {
        Self {
            frames: frames.into_iter().collect(),
            link,
        }
    }
}

impl FrameSource for MemorySource {
    fn link_type(&self) -> LinkLayer {
        self.link
    }

    fn next_frame(&mut self) -> Result<Option<Vec<u8>>> {
        Ok(self.frames.pop_front())
    }

    fn is_exhausted(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Live capture from a monitor mode interface
pub struct LiveCapture {
    cap: pcap::Capture<pcap::Active>,
    link: LinkLayer,
}

impl LiveCapture {
    pub fn open(config: &CaptureConfig) -> Result<Self> {
        let cap = pcap::Capture::from_device(config.device.as_str())?
            .promisc(config.promiscuous)
            .snaplen(i32::try_from(config.snaplen).unwrap_or(i32::MAX))
            .timeout(i32::try_from(config.timeout().as_millis()).unwrap_or(i32::MAX))
            .open()?;
        let link = LinkLayer::from(cap.get_datalink().0 as u32);
        info!(device = %config.device, ?link, snaplen = config.snaplen, "opened live capture");
        Ok(Self { cap, link })
    }
}

impl FrameSource for LiveCapture {
    fn link_type(&self) -> LinkLayer {
        self.link
    }

    fn next_frame(&mut self) -> Result<Option<Vec<u8>>> {
        match self.cap.next_packet() {
            Ok(packet) => Ok(Some(packet.data.to_vec())),
            Err(pcap::Error::TimeoutExpired) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl HeaderLayout {
    /// Work out the session layout from the source.
    ///
    /// Radiotap sources are polled until a frame long enough to carry the
    /// length field arrives; that frame is handed back so it can still be
    /// decoded.
    pub fn detect<S: FrameSource + ?Sized>(
        source: &mut S,
    ) -> Result<(HeaderLayout, Option<Vec<u8>>)> {
        match source.link_type() {
            LinkLayer::Ieee80211 => {
                info!("capture carries bare 802.11 frames");
                Ok((HeaderLayout::Bare, None))
            }
            LinkLayer::Radiotap => loop {
                match source.next_frame()? {
                    Some(frame) => {
                        if let Some(layout) = HeaderLayout::from_radiotap_frame(&frame) {
                            info!(?layout, "capture carries radiotap headers");
                            return Ok((layout, Some(frame)));
                        }
                        debug!(len = frame.len(), "frame too short to carry the radiotap length");
                    }
                    None if source.is_exhausted() => return Err(Error::NoFrames),
                    None => {}
                }
            },
            LinkLayer::Other(linktype) => Err(Error::Capture(format!(
                "unsupported link type {linktype}, expected 802.11 or radiotap"
            ))),
        }
    }
}

/// A capture source bound to a decoder
pub struct CaptureSession<S> {
    source: S,
    decoder: FrameDecoder,
    pending: Option<Vec<u8>>,
    stats: DecodeStats,
}

impl<S: FrameSource> CaptureSession<S> {
    /// Detect the source's header layout and build the session decoder
    pub fn open(mut source: S, mangled: MangledCounter) -> Result<Self> {
        let (layout, pending) = HeaderLayout::detect(&mut source)?;
        Ok(Self {
            source,
            decoder: FrameDecoder::new(layout, mangled),
            pending,
            stats: DecodeStats::default(),
        })
    }

    pub fn decoder(&self) -> &FrameDecoder {
        &self.decoder
    }

    pub fn stats(&self) -> DecodeStats {
        self.stats
    }

    /// Poll and decode one frame; `Ok(None)` once the source is exhausted
    pub fn poll(&mut self) -> Result<Option<Decoded>> {
        let frame = match self.pending.take() {
            Some(frame) => Some(frame),
            None => {
                if self.source.is_exhausted() {
                    return Ok(None);
                }
                self.source.next_frame()?
            }
        };
        if frame.is_none() && self.source.is_exhausted() {
            return Ok(None);
        }

        let outcome = self.decoder.decode(frame.as_deref());
        self.stats.record(&outcome);
        Ok(Some(outcome))
    }

    /// Decode frames until the source runs dry or `handler` breaks.
    ///
    /// An error after which the source reports exhaustion (a truncated
    /// capture file) ends the run with a warning instead of failing it.
    pub fn run<F>(&mut self, mut handler: F) -> Result<DecodeStats>
    where
        F: FnMut(&Decoded) -> ControlFlow<()>,
    {
        loop {
            match self.poll() {
                Ok(Some(outcome)) => {
                    if handler(&outcome).is_break() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) if self.source.is_exhausted() => {
                    warn!(error = %e, "capture ended early");
                    break;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(self.stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn beacon() -> Vec<u8> {
        let mut f = vec![0x80, 0x00, 0x00, 0x00];
        f.extend_from_slice(&[0xff; 6]);
        f.extend_from_slice(&[0x02, 0x00, 0x00, 0x00, 0x00, 0x01]);
        f.extend_from_slice(&[0x02, 0x00, 0x00, 0x00, 0x00, 0x01]);
        f.extend_from_slice(&[0x00, 0x00]);
        f.extend_from_slice(&[0u8; 8]);
        f.extend_from_slice(&100u16.to_le_bytes());
        f.extend_from_slice(&0x0011u16.to_le_bytes());
        f.extend_from_slice(&[0x00, 0x03, b'l', b'a', b'b']);
        f.extend_from_slice(&[0x03, 0x01, 0x0b]);
        f
    }

    fn with_radiotap(frame: &[u8]) -> Vec<u8> {
        let mut r = vec![0x00, 0x00, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00];
        r.extend_from_slice(frame);
        r
    }

    #[test]
    fn test_link_layer_numbers() {
        assert_eq!(LinkLayer::from(127), LinkLayer::Radiotap);
        assert_eq!(LinkLayer::from(105), LinkLayer::Ieee80211);
        assert_eq!(LinkLayer::from(1), LinkLayer::Other(1));
    }

    #[test]
    fn test_detect_bare() {
        let mut source = MemorySource::new(LinkLayer::Ieee80211, vec![beacon()]);
        let (layout, pending) = HeaderLayout::detect(&mut source).unwrap();
        assert_eq!(layout, HeaderLayout::Bare);
        assert!(pending.is_none());
    }

    #[test]
    fn test_detect_radiotap_keeps_first_frame() {
        let first = with_radiotap(&beacon());
        let mut source =
            MemorySource::new(LinkLayer::Radiotap, vec![vec![0x00, 0x00], first.clone()]);
        let (layout, pending) = HeaderLayout::detect(&mut source).unwrap();
        assert_eq!(layout, HeaderLayout::Radiotap { len: 8 });
        assert_eq!(pending, Some(first));
    }

    #[test]
    fn test_detect_empty_and_unsupported() {
        let mut empty = MemorySource::new(LinkLayer::Radiotap, Vec::new());
        assert!(matches!(HeaderLayout::detect(&mut empty), Err(Error::NoFrames)));

        let mut ethernet = MemorySource::new(LinkLayer::Other(1), vec![beacon()]);
        assert!(matches!(HeaderLayout::detect(&mut ethernet), Err(Error::Capture(_))));
    }

    #[test]
    fn test_session_decodes_first_frame() {
        let frames = vec![
            with_radiotap(&beacon()),
            with_radiotap(&[0xd4, 0x00, 0x00, 0x00, 1, 2, 3, 4, 5, 6]),
            with_radiotap(&beacon()[..30]),
            // injected frame, no radiotap prefix
            beacon(),
        ];
        let counter = MangledCounter::new();
        let source = MemorySource::new(LinkLayer::Radiotap, frames);
        let mut session = CaptureSession::open(source, counter.clone()).unwrap();

        let mut ssids = Vec::new();
        let stats = session
            .run(|outcome| {
                if let Some(m) = outcome.frame().and_then(|f| f.management()) {
                    ssids.push(m.ssid.clone());
                }
                ControlFlow::Continue(())
            })
            .unwrap();

        assert_eq!(ssids, vec!["lab", "lab"]);
        assert_eq!(stats.frames, 4);
        assert_eq!(stats.records, 2);
        assert_eq!(stats.unhandled, 1);
        assert_eq!(stats.malformed, 1);
        assert_eq!(counter.count(), 1);
    }

    #[test]
    fn test_session_handler_can_stop() {
        let frames = vec![beacon(), beacon(), beacon()];
        let source = MemorySource::new(LinkLayer::Ieee80211, frames);
        let mut session = CaptureSession::open(source, MangledCounter::new()).unwrap();
        let stats = session.run(|_| ControlFlow::Break(())).unwrap();
        assert_eq!(stats.frames, 1);
        assert_eq!(session.poll().unwrap().map(|d| d.frame().is_some()), Some(true));
    }

    #[test]
    fn test_poll_after_exhaustion() {
        let source = MemorySource::new(LinkLayer::Ieee80211, vec![beacon()]);
        let mut session = CaptureSession::open(source, MangledCounter::new()).unwrap();
        assert!(session.poll().unwrap().is_some());
        assert!(session.poll().unwrap().is_none());
        assert!(session.poll().unwrap().is_none());
    }

    /// Live-style source: `None` entries are poll timeouts
    struct TimeoutSource {
        polls: VecDeque<Option<Vec<u8>>>,
    }

    impl FrameSource for TimeoutSource {
        fn link_type(&self) -> LinkLayer {
            LinkLayer::Ieee80211
        }

        fn next_frame(&mut self) -> Result<Option<Vec<u8>>> {
            Ok(self.polls.pop_front().flatten())
        }

        fn is_exhausted(&self) -> bool {
            self.polls.is_empty()
        }
    }

    #[test]
    fn test_timeouts_count_as_empty_polls() {
        let source = TimeoutSource {
            polls: VecDeque::from(vec![None, Some(beacon()), None, None, Some(beacon())]),
        };
        let counter = MangledCounter::new();
        let mut session = CaptureSession::open(source, counter.clone()).unwrap();

        let mut outcomes = Vec::new();
        let stats = session
            .run(|outcome| {
                outcomes.push(outcome.clone());
                ControlFlow::Continue(())
            })
            .unwrap();

        assert_eq!(outcomes.len(), 5);
        assert_eq!(outcomes[0], Decoded::NoInput);
        assert!(outcomes[1].frame().is_some());
        assert_eq!(outcomes[2], Decoded::NoInput);
        assert_eq!(stats.empty_polls, 3);
        assert_eq!(stats.frames, 2);
        assert_eq!(stats.records, 2);
        assert_eq!(counter.count(), 0);
        assert!(!counter.is_mangled());
    }
}
