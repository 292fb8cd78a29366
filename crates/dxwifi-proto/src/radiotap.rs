//! The fixed transmit radiotap header.
//!
//! Radiotap is the metadata prefix monitor-mode drivers expect in front of an
//! injected 802.11 frame; the driver consumes it and strips it before the
//! frame hits the air. DxWiFi pins the present bitmap to FLAGS + RATE +
//! TX_FLAGS, giving a constant 12-byte header. Fields are strictly ordered
//! and little-endian per the radiotap standard; keep that in mind before
//! touching the layout.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::{
    errors::FrameError,
    ieee80211::{RADIOTAP_VERSION, present},
};

/// The fixed present bitmap for transmit frames.
pub const PRESENT_BITMAP: u32 = present::FLAGS | present::RATE | present::TX_FLAGS;

/// Transmit radiotap header: the 8-byte base header plus the three fields the
/// present bitmap announces.
///
/// Multi-byte fields are stored as little-endian byte arrays so the struct
/// can be cast to and from wire bytes without alignment hazards.
#[repr(C, packed)]
#[derive(Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
pub struct RadiotapHeader {
    it_version: u8,
    it_pad: u8,
    it_len: [u8; 2],     // LE: always 12 for transmit frames
    it_present: [u8; 4], // LE: PRESENT_BITMAP
    flags: u8,
    rate: u8, // units of 500 Kbps
    tx_flags: [u8; 2], // LE
}

impl RadiotapHeader {
    /// Serialized size of the transmit header.
    pub const SIZE: usize = 12;

    /// Build a transmit header.
    ///
    /// `rate_mbps` is taken in whole megabits per second and stored in the
    /// radiotap unit of 500 Kbps, i.e. doubled.
    #[must_use]
    pub fn new(flags: u8, rate_mbps: u8, tx_flags: u16) -> Self {
        Self {
            it_version: RADIOTAP_VERSION,
            it_pad: 0,
            it_len: (Self::SIZE as u16).to_le_bytes(),
            it_present: PRESENT_BITMAP.to_le_bytes(),
            flags,
            rate: rate_mbps.saturating_mul(2),
            tx_flags: tx_flags.to_le_bytes(),
        }
    }

    /// Header length field.
    #[must_use]
    pub fn header_len(&self) -> u16 {
        u16::from_le_bytes(self.it_len)
    }

    /// Present bitmap.
    #[must_use]
    pub fn present(&self) -> u32 {
        u32::from_le_bytes(self.it_present)
    }

    /// Frame flags.
    #[must_use]
    pub fn flags(&self) -> u8 {
        self.flags
    }

    /// Data rate in 500 Kbps units.
    #[must_use]
    pub fn rate(&self) -> u8 {
        self.rate
    }

    /// Transmit flags.
    #[must_use]
    pub fn tx_flags(&self) -> u16 {
        u16::from_le_bytes(self.tx_flags)
    }
}

/// Read the radiotap length field of a captured buffer.
///
/// Captured frames carry a variable-length radiotap header built by the
/// receiving driver, so only the 4-byte base header may be assumed. The
/// length locates the start of the MAC header.
///
/// # Errors
///
/// - [`FrameError::Truncated`] if fewer than four bytes were captured
/// - [`FrameError::BadRadiotapVersion`] on a non-zero version octet
pub fn capture_header_len(buf: &[u8]) -> Result<usize, FrameError> {
    let (&[version, _pad, lo, hi], _) = buf.split_first_chunk::<4>().ok_or(FrameError::Truncated {
        needed: 4,
        have: buf.len(),
    })?;
    if version != RADIOTAP_VERSION {
        return Err(FrameError::BadRadiotapVersion(version));
    }
    Ok(usize::from(u16::from_le_bytes([lo, hi])))
}
