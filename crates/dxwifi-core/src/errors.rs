//! Session error taxonomy.
//!
//! Initialisation failures are the only fatal ones: they prevent a session
//! from starting and bubble to the caller. Steady-state inject and dispatch
//! hiccups are logged, counted in the statistics and the loops continue.

use thiserror::Error;

use dxwifi_proto::FrameError;

use crate::link::LinkError;

/// Transmit-session errors.
#[derive(Error, Debug)]
pub enum TxError {
    /// The frame codec rejected the configuration.
    #[error(transparent)]
    Frame(#[from] FrameError),

    /// The pre-inject handler table is at capacity.
    #[error("pre-inject handler table full ({max} handlers)")]
    HandlerLimit {
        /// The fixed table capacity.
        max: usize,
    },

    /// The link driver failed.
    #[error(transparent)]
    Link(#[from] LinkError),

    /// Stop-pipe plumbing failed.
    #[error("session plumbing: {0}")]
    Io(#[from] std::io::Error),
}

/// Receive-session errors.
#[derive(Error, Debug)]
pub enum RxError {
    /// The staging buffer size falls outside `[min, max]`.
    #[error("packet buffer of {requested} bytes outside [{min}, {max}]")]
    InvalidBufferSize {
        /// The size that was asked for.
        requested: usize,
        /// Inclusive lower bound.
        min: usize,
        /// Inclusive upper bound.
        max: usize,
    },

    /// The link driver cannot hand out a pollable descriptor.
    #[error("link driver offers no pollable descriptor")]
    NotPollable,

    /// The link driver failed.
    #[error(transparent)]
    Link(#[from] LinkError),

    /// The output sink or the stop-pipe plumbing failed.
    #[error("i/o: {0}")]
    Io(#[from] std::io::Error),
}
