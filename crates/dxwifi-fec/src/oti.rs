//! Object Transmission Information.
//!
//! Every encoded symbol is prefixed by this 16-byte big-endian record. The
//! CRC covers the symbol body that follows, which buys two things: a decoder
//! can blind-scan an arbitrary buffer for the first stride whose claimed CRC
//! verifies, and a stride whose CRC fails is treated as an erasure instead of
//! being fed to the codec as truth.

use crc::{CRC_32_ISO_HDLC, Crc};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// CRC-32 of a symbol body, as stored in the OTI.
#[must_use]
pub fn symbol_crc(body: &[u8]) -> u32 {
    CRC32.checksum(body)
}

/// The per-symbol OTI record. All fields big-endian.
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
pub struct Oti {
    esi: [u8; 4],
    n: [u8; 4],
    k: [u8; 4],
    crc: [u8; 4],
}

impl Oti {
    /// Serialized size of the record.
    pub const SIZE: usize = 16;

    /// Build a record for symbol `esi` of an `(n, k)` session, stamping the
    /// CRC of `body`.
    #[must_use]
    pub fn new(esi: u32, n: u32, k: u32, body: &[u8]) -> Self {
        Self {
            esi: esi.to_be_bytes(),
            n: n.to_be_bytes(),
            k: k.to_be_bytes(),
            crc: symbol_crc(body).to_be_bytes(),
        }
    }

    /// Encoding symbol index.
    #[must_use]
    pub fn esi(&self) -> u32 {
        u32::from_be_bytes(self.esi)
    }

    /// Total symbol count.
    #[must_use]
    pub fn n(&self) -> u32 {
        u32::from_be_bytes(self.n)
    }

    /// Source symbol count.
    #[must_use]
    pub fn k(&self) -> u32 {
        u32::from_be_bytes(self.k)
    }

    /// Claimed CRC-32 of the symbol body.
    #[must_use]
    pub fn crc(&self) -> u32 {
        u32::from_be_bytes(self.crc)
    }

    /// True when `body` matches the claimed CRC.
    #[must_use]
    pub fn verifies(&self, body: &[u8]) -> bool {
        symbol_crc(body) == self.crc()
    }
}

/// Split a stride into its OTI record and symbol body.
///
/// Returns `None` when the stride is shorter than the record.
#[must_use]
pub fn split_stride(stride: &[u8]) -> Option<(&Oti, &[u8])> {
    Oti::ref_from_prefix(stride).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_is_big_endian() {
        let body = [0u8; 8];
        let oti = Oti::new(0x0102_0304, 0x0A0B_0C0D, 0x1112_1314, &body);
        let bytes = oti.as_bytes();
        assert_eq!(&bytes[0..4], &[0x01, 0x02, 0x03, 0x04]);
        assert_eq!(&bytes[4..8], &[0x0A, 0x0B, 0x0C, 0x0D]);
        assert_eq!(&bytes[8..12], &[0x11, 0x12, 0x13, 0x14]);
        assert_eq!(&bytes[12..16], &symbol_crc(&body).to_be_bytes());
    }

    #[test]
    fn verification_tracks_the_body() {
        let body = b"the quick brown fox";
        let oti = Oti::new(1, 15, 10, body);
        assert!(oti.verifies(body));
        assert!(!oti.verifies(b"the quick brown fix"));
    }

    #[test]
    fn split_stride_parses_prefix() {
        let body = [0x55u8; 32];
        let mut stride = Oti::new(7, 15, 10, &body).as_bytes().to_vec();
        stride.extend_from_slice(&body);

        let (oti, rest) = split_stride(&stride).unwrap();
        assert_eq!(oti.esi(), 7);
        assert!(oti.verifies(rest));

        assert!(split_stride(&stride[..8]).is_none());
    }
}
