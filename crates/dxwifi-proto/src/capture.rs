//! Capture-side view of a received frame.
//!
//! A monitor-mode capture hands back `[radiotap | mac | payload | fcs]` with
//! a driver-built, variable-length radiotap header. The view trusts nothing
//! but the radiotap length field and the capture length: payload size is
//! always derived from what was actually captured, never from a nominal
//! block size, because the sender injects short final reads as short frames.

use crate::{
    errors::FrameError,
    ieee80211::FCS_SIZE,
    mac::MacHeader,
    radiotap,
};

use zerocopy::FromBytes;

/// Borrowed view of one captured frame.
#[derive(Clone, Copy, Debug)]
pub struct CapturedFrame<'a> {
    /// DxWiFi frame number recovered from addr1.
    pub frame_number: u32,
    /// The MAC header.
    pub mac: &'a MacHeader,
    /// Payload bytes, FCS excluded.
    pub payload: &'a [u8],
}

impl<'a> CapturedFrame<'a> {
    /// Parse a captured buffer.
    ///
    /// # Errors
    ///
    /// - [`FrameError::Truncated`] when the capture cannot hold the radiotap
    ///   header it claims plus a MAC header and FCS
    /// - [`FrameError::BadRadiotapVersion`] on an unknown radiotap version
    pub fn parse(buf: &'a [u8]) -> Result<Self, FrameError> {
        let rtap_len = radiotap::capture_header_len(buf)?;

        let needed = rtap_len + MacHeader::SIZE + FCS_SIZE;
        if buf.len() < needed {
            return Err(FrameError::Truncated { needed, have: buf.len() });
        }

        let (mac, rest) = MacHeader::ref_from_prefix(&buf[rtap_len..])
            .map_err(|_| FrameError::Truncated { needed, have: buf.len() })?;

        let payload = &rest[..rest.len() - FCS_SIZE];

        Ok(Self { frame_number: mac.sequence(), mac, payload })
    }
}

#[cfg(test)]
mod tests {
    use zerocopy::IntoBytes;

    use super::*;
    use crate::{
        frame::{TX_DURATION_ID, TxFrame},
        ieee80211::{FrameControl, MacAddr},
    };

    fn captured(payload: &[u8]) -> Vec<u8> {
        let mut frame = TxFrame::new(512).unwrap();
        frame.write_radiotap(0x10, 1, 0x08);
        frame.write_mac(
            FrameControl::default(),
            TX_DURATION_ID,
            MacAddr::BROADCAST,
            MacAddr::DEFAULT_SENDER,
            MacAddr::BROADCAST,
        );
        frame.set_sequence(99);
        frame.payload_mut()[..payload.len()].copy_from_slice(payload);
        frame.wire_frame(payload.len()).unwrap().to_vec()
    }

    #[test]
    fn parse_recovers_sequence_and_payload() {
        let buf = captured(b"hello dxwifi");
        let view = CapturedFrame::parse(&buf).unwrap();
        assert_eq!(view.frame_number, 99);
        assert_eq!(view.payload, b"hello dxwifi");
        assert_eq!(view.mac.addr2(), MacAddr::DEFAULT_SENDER);
    }

    #[test]
    fn parse_handles_wider_capture_radiotap() {
        // Receive-side radiotap headers are longer than the 12-byte transmit
        // one; splice in a 18-byte header and confirm the offset math holds.
        let tx = captured(b"abc");
        let mut buf = vec![0u8, 0, 18, 0];
        buf.extend_from_slice(&[0u8; 14]);
        buf.extend_from_slice(&tx[12..]);
        let view = CapturedFrame::parse(&buf).unwrap();
        assert_eq!(view.payload, b"abc");
    }

    #[test]
    fn parse_rejects_short_captures() {
        let buf = captured(b"xyz");
        let err = CapturedFrame::parse(&buf[..20]).unwrap_err();
        assert!(matches!(err, FrameError::Truncated { .. }));
    }

    #[test]
    fn short_frames_yield_short_payloads() {
        // A zero-byte payload frame (header + FCS only) parses cleanly.
        let buf = captured(b"");
        let view = CapturedFrame::parse(&buf).unwrap();
        assert!(view.payload.is_empty());
        assert_eq!(view.mac.as_bytes().len(), MacHeader::SIZE);
    }
}
