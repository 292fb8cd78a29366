//! The three-address 802.11 MAC header.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::ieee80211::{FrameControl, MAC_ADDR_LEN, MacAddr};

/// Three-address 802.11 MAC header, 24 bytes.
///
/// Interpretation of the address slots depends on the to-DS/from-DS flags;
/// with the DxWiFi default (to-DS 0, from-DS 1) addr1 is the destination,
/// addr2 the BSSID and addr3 the source.
///
/// # Invariants
///
/// - `frame_control` and `seq_ctrl` are little-endian; `duration_id` is kept
///   in network byte order, the OreSat convention this link inherited.
/// - The first two octets of `addr1` are the sender's short prefix and must
///   never both be zero — see [`MacHeader::set_sequence`].
#[repr(C, packed)]
#[derive(Clone, Copy, Debug, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
pub struct MacHeader {
    frame_control: [u8; 2], // LE
    duration_id: [u8; 2],   // network byte order
    addr1: [u8; MAC_ADDR_LEN],
    addr2: [u8; MAC_ADDR_LEN],
    addr3: [u8; MAC_ADDR_LEN],
    seq_ctrl: [u8; 2], // LE; unused, DxWiFi sequencing lives in addr1
}

impl MacHeader {
    /// Serialized size of the header.
    pub const SIZE: usize = 24;

    /// Build a header from its field values. `seq_ctrl` starts at zero.
    #[must_use]
    pub fn new(
        fctl: FrameControl,
        duration_id: u16,
        addr1: MacAddr,
        addr2: MacAddr,
        addr3: MacAddr,
    ) -> Self {
        Self {
            frame_control: fctl.bits().to_le_bytes(),
            duration_id: duration_id.to_be_bytes(),
            addr1: addr1.octets(),
            addr2: addr2.octets(),
            addr3: addr3.octets(),
            seq_ctrl: [0, 0],
        }
    }

    /// Decoded frame-control field.
    #[must_use]
    pub fn frame_control(&self) -> FrameControl {
        FrameControl::from_bits(u16::from_le_bytes(self.frame_control))
    }

    /// Duration field, read back from network byte order.
    #[must_use]
    pub fn duration_id(&self) -> u16 {
        u16::from_be_bytes(self.duration_id)
    }

    /// Address slot 1.
    #[must_use]
    pub fn addr1(&self) -> MacAddr {
        MacAddr(self.addr1)
    }

    /// Address slot 2.
    #[must_use]
    pub fn addr2(&self) -> MacAddr {
        MacAddr(self.addr2)
    }

    /// Address slot 3.
    #[must_use]
    pub fn addr3(&self) -> MacAddr {
        MacAddr(self.addr3)
    }

    /// Stamp the DxWiFi frame number into the trailing four octets of addr1,
    /// network byte order.
    ///
    /// Only bytes 2..6 are written. The first two octets stay whatever the
    /// configured destination address put there, keeping the sender prefix
    /// non-zero for the BPF filter and the adapter's retransmit quirk.
    pub fn set_sequence(&mut self, frame_no: u32) {
        self.addr1[2..].copy_from_slice(&frame_no.to_be_bytes());
    }

    /// Read the DxWiFi frame number back out of addr1.
    #[must_use]
    pub fn sequence(&self) -> u32 {
        let [.., a, b, c, d] = self.addr1;
        u32::from_be_bytes([a, b, c, d])
    }
}
