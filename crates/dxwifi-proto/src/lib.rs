//! Wire-format layer for the DxWiFi one-way uplink.
//!
//! DxWiFi frames are raw 802.11 data frames carried behind a fixed 12-byte
//! radiotap header. This crate owns the byte-exact layout of both headers,
//! the reusable transmit slab ([`TxFrame`]), the capture-side view of a
//! received frame ([`CapturedFrame`]), and the in-band control-frame
//! sentinels that bracket a session.
//!
//! Layout on the air:
//!
//! ```text
//! [ radiotap header (12) | 802.11 MAC header (24) | payload | FCS (4) ]
//! ```
//!
//! The transmit frame number travels in the trailing four octets of MAC
//! address 1, network byte order. The leading two octets of that address are
//! never written by this crate: they form the sender prefix the default BPF
//! filter matches on, and a zero prefix provokes hardware retransmission on
//! some adapters.

pub mod capture;
pub mod control;
mod errors;
pub mod frame;
pub mod ieee80211;
pub mod mac;
pub mod radiotap;

pub use capture::CapturedFrame;
pub use control::ControlFrame;
pub use errors::FrameError;
pub use frame::TxFrame;
pub use ieee80211::{FrameControl, FrameType, MacAddr};
pub use mac::MacHeader;
pub use radiotap::RadiotapHeader;

/// Convenience result alias for frame codec operations.
pub type Result<T> = std::result::Result<T, FrameError>;
