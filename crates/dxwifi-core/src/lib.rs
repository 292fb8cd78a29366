//! Session layer of the DxWiFi one-way uplink.
//!
//! Two single-threaded control loops built over a narrow link-driver seam:
//! the [`Transmitter`] reads blocks from an input descriptor, packetises
//! them and injects frames bracketed by preamble and EOT sentinels; the
//! [`Receiver`] captures frames, reorders them through a bounded min-heap,
//! fills sequence gaps with noise bytes and writes the reassembled stream to
//! a sink.
//!
//! Both loops suspend only in `poll(2)` over their descriptor plus a
//! self-pipe; a [`StopHandle`] from another thread or a signal handler flips
//! the session flag and wakes the pipe, so cancellation needs no process
//! globals and no driver-specific break calls.

mod errors;
pub mod heap;
mod io;
pub mod link;
pub mod receiver;
pub mod transmitter;
pub(crate) mod util;

#[cfg(test)]
pub(crate) mod test_link;

pub use errors::{RxError, TxError};
pub use io::StopHandle;
pub use link::{LinkDriver, LinkError, LinkStats};
pub use receiver::{Receiver, RxConfig, RxStats};
pub use transmitter::{Transmitter, TxConfig, TxStats};

#[cfg(feature = "pcap")]
pub use link::pcap::{PcapLink, PcapLinkConfig};
