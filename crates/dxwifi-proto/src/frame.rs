//! The reusable transmit frame slab.
//!
//! One contiguous buffer holds radiotap header, MAC header, payload region
//! and the FCS placeholder the driver fills in. The slab is built once per
//! session, the headers written once, and the payload region rewritten for
//! every frame — the original design, minus the aliasing pointers: all
//! access goes through typed views with explicit endianness.

use zerocopy::{FromBytes, IntoBytes};

use crate::{
    errors::FrameError,
    ieee80211::{FCS_SIZE, FrameControl, MacAddr},
    mac::MacHeader,
    radiotap::RadiotapHeader,
};

/// Combined size of the radiotap and MAC headers on a transmit frame.
pub const TX_HEADER_SIZE: usize = RadiotapHeader::SIZE + MacHeader::SIZE;

/// Exclusive lower bound on the payload block size: a block must be able to
/// outsize a control frame or the classifier could eat data frames.
pub const BLOCK_SIZE_MIN: usize = 256;

/// Inclusive upper bound on the payload block size.
pub const BLOCK_SIZE_MAX: usize = 1400;

/// Default payload block size.
pub const DEFAULT_BLOCK_SIZE: usize = 1024;

/// Duration field value stamped on every transmit frame.
pub const TX_DURATION_ID: u16 = 0xFFFF;

/// Total on-wire length of a frame carrying `payload_size` payload bytes.
#[must_use]
pub fn wire_length(payload_size: usize) -> usize {
    TX_HEADER_SIZE + payload_size + FCS_SIZE
}

/// Validate a payload block size against `(BLOCK_SIZE_MIN, BLOCK_SIZE_MAX]`.
pub fn check_block_size(block_size: usize) -> Result<(), FrameError> {
    if block_size <= BLOCK_SIZE_MIN || block_size > BLOCK_SIZE_MAX {
        return Err(FrameError::InvalidBlockSize {
            requested: block_size,
            min: BLOCK_SIZE_MIN,
            max: BLOCK_SIZE_MAX,
        });
    }
    Ok(())
}

/// A transmit frame slab: `[radiotap | mac | payload | fcs]`.
///
/// The byte stream produced for a given set of header parameters and payload
/// is reproducible bit for bit; nothing in the slab depends on host byte
/// order or allocation state.
pub struct TxFrame {
    buf: Box<[u8]>,
    block_size: usize,
}

impl TxFrame {
    /// Allocate a zeroed slab sized for `block_size` payload bytes.
    ///
    /// # Errors
    ///
    /// [`FrameError::InvalidBlockSize`] when `block_size` falls outside
    /// `(BLOCK_SIZE_MIN, BLOCK_SIZE_MAX]`.
    pub fn new(block_size: usize) -> Result<Self, FrameError> {
        check_block_size(block_size)?;
        Ok(Self {
            buf: vec![0u8; wire_length(block_size)].into_boxed_slice(),
            block_size,
        })
    }

    /// Payload capacity of the slab.
    #[must_use]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Write the radiotap header. `rate_mbps` is in whole Mbps.
    pub fn write_radiotap(&mut self, flags: u8, rate_mbps: u8, tx_flags: u16) {
        let hdr = RadiotapHeader::new(flags, rate_mbps, tx_flags);
        self.buf[..RadiotapHeader::SIZE].copy_from_slice(hdr.as_bytes());
    }

    /// Write the MAC header.
    pub fn write_mac(
        &mut self,
        fctl: FrameControl,
        duration_id: u16,
        addr1: MacAddr,
        addr2: MacAddr,
        addr3: MacAddr,
    ) {
        let hdr = MacHeader::new(fctl, duration_id, addr1, addr2, addr3);
        self.buf[RadiotapHeader::SIZE..TX_HEADER_SIZE].copy_from_slice(hdr.as_bytes());
    }

    /// Typed view of the radiotap header region.
    #[must_use]
    pub fn radiotap(&self) -> &RadiotapHeader {
        let region = &self.buf[..RadiotapHeader::SIZE];
        RadiotapHeader::ref_from_bytes(region)
            .ok()
            .unwrap_or_else(|| unreachable!("radiotap region is exactly RadiotapHeader::SIZE bytes"))
    }

    /// Typed view of the MAC header region.
    #[must_use]
    pub fn mac(&self) -> &MacHeader {
        let region = &self.buf[RadiotapHeader::SIZE..TX_HEADER_SIZE];
        MacHeader::ref_from_bytes(region)
            .ok()
            .unwrap_or_else(|| unreachable!("MAC region is exactly MacHeader::SIZE bytes"))
    }

    /// Mutable typed view of the MAC header region.
    pub fn mac_mut(&mut self) -> &mut MacHeader {
        let region = &mut self.buf[RadiotapHeader::SIZE..TX_HEADER_SIZE];
        MacHeader::mut_from_bytes(region)
            .ok()
            .unwrap_or_else(|| unreachable!("MAC region is exactly MacHeader::SIZE bytes"))
    }

    /// Stamp the frame number into addr1, network byte order, trailing four
    /// octets only.
    pub fn set_sequence(&mut self, frame_no: u32) {
        self.mac_mut().set_sequence(frame_no);
    }

    /// The payload region, full block size.
    pub fn payload_mut(&mut self) -> &mut [u8] {
        &mut self.buf[TX_HEADER_SIZE..TX_HEADER_SIZE + self.block_size]
    }

    /// The payload region, read-only.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.buf[TX_HEADER_SIZE..TX_HEADER_SIZE + self.block_size]
    }

    /// The injectable wire image for a frame carrying `payload_size` bytes:
    /// headers, the used payload prefix, and the FCS placeholder.
    ///
    /// # Errors
    ///
    /// [`FrameError::PayloadTooLarge`] when `payload_size` exceeds the block
    /// size the slab was built for.
    pub fn wire_frame(&self, payload_size: usize) -> Result<&[u8], FrameError> {
        if payload_size > self.block_size {
            return Err(FrameError::PayloadTooLarge {
                size: payload_size,
                block_size: self.block_size,
            });
        }
        Ok(&self.buf[..wire_length(payload_size)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_size_bounds_are_enforced() {
        assert!(TxFrame::new(BLOCK_SIZE_MIN).is_err());
        assert!(TxFrame::new(BLOCK_SIZE_MIN + 1).is_ok());
        assert!(TxFrame::new(BLOCK_SIZE_MAX).is_ok());
        assert!(TxFrame::new(BLOCK_SIZE_MAX + 1).is_err());
        assert!(TxFrame::new(0).is_err());
    }

    #[test]
    fn wire_frame_covers_headers_payload_and_fcs() {
        let mut frame = TxFrame::new(512).unwrap();
        frame.write_radiotap(0x10, 1, 0x08);
        frame.write_mac(
            FrameControl::default(),
            TX_DURATION_ID,
            MacAddr::BROADCAST,
            MacAddr::DEFAULT_SENDER,
            MacAddr::BROADCAST,
        );
        frame.payload_mut()[..4].copy_from_slice(b"data");

        let wire = frame.wire_frame(4).unwrap();
        assert_eq!(wire.len(), TX_HEADER_SIZE + 4 + FCS_SIZE);
        assert_eq!(&wire[TX_HEADER_SIZE..TX_HEADER_SIZE + 4], b"data");
        assert_eq!(&wire[TX_HEADER_SIZE + 4..], &[0, 0, 0, 0]);

        assert!(frame.wire_frame(513).is_err());
    }

    #[test]
    fn headers_survive_payload_rewrites() {
        let mut frame = TxFrame::new(300).unwrap();
        frame.write_radiotap(0, 54, 0);
        frame.write_mac(
            FrameControl::default(),
            TX_DURATION_ID,
            MacAddr::BROADCAST,
            MacAddr::DEFAULT_SENDER,
            MacAddr::BROADCAST,
        );
        frame.set_sequence(41);
        frame.payload_mut().fill(0xEE);
        frame.set_sequence(42);

        assert_eq!(frame.radiotap().rate(), 108);
        assert_eq!(frame.mac().sequence(), 42);
        assert_eq!(frame.mac().duration_id(), TX_DURATION_ID);
    }
}
