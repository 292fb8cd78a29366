//! The link-driver seam.
//!
//! Everything the control loops need from a packet-capture backend fits in
//! four calls: inject a frame, dispatch a batch of captured frames, expose a
//! pollable descriptor, report capture statistics. The production backend is
//! libpcap behind the `pcap` cargo feature; tests drive the same loops with
//! an in-memory link.

use std::os::fd::BorrowedFd;

use thiserror::Error;

#[cfg(feature = "pcap")]
pub mod pcap;

/// Errors surfaced by a link driver.
#[derive(Error, Debug)]
pub enum LinkError {
    /// The backend refused to open the device.
    #[error("failed to open `{device}`: {reason}")]
    OpenFailed {
        /// Interface name.
        device: String,
        /// Backend diagnostic.
        reason: String,
    },

    /// The BPF program failed to compile or install.
    #[error("invalid filter `{filter}`: {reason}")]
    FilterInvalid {
        /// The filter expression.
        filter: String,
        /// Backend diagnostic.
        reason: String,
    },

    /// A single-frame injection failed.
    #[error("inject failed: {0}")]
    InjectFailed(String),

    /// A capture dispatch failed.
    #[error("capture failed: {0}")]
    CaptureFailed(String),
}

/// Capture counters as reported by the backend.
///
/// Platform capture statistics are notoriously inconsistent; treat these as
/// indicative, not exact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    /// Frames the backend saw.
    pub received: u32,
    /// Frames dropped before user space.
    pub dropped_kernel: u32,
    /// Frames dropped by the interface.
    pub dropped_driver: u32,
}

/// A monitor-mode packet link.
pub trait LinkDriver {
    /// Inject one frame; returns the bytes handed to the device.
    fn inject(&mut self, frame: &[u8]) -> Result<usize, LinkError>;

    /// Deliver up to `max_frames` captured frames to `handler`, returning
    /// how many were delivered. Returning zero is not an error: the backend
    /// may simply have nothing buffered.
    fn dispatch(
        &mut self,
        max_frames: usize,
        handler: &mut dyn FnMut(&[u8]),
    ) -> Result<usize, LinkError>;

    /// Descriptor that polls readable when frames await dispatch, if the
    /// backend has one.
    fn poll_fd(&self) -> Option<BorrowedFd<'_>>;

    /// Capture statistics, when the backend keeps them.
    fn stats(&mut self) -> Option<LinkStats>;
}
