//! Frame codec errors.

use thiserror::Error;

/// Errors raised while building or parsing frames.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// Requested payload block size falls outside the permitted range.
    #[error("block size {requested} outside ({min}, {max}]")]
    InvalidBlockSize {
        /// The size that was asked for.
        requested: usize,
        /// Exclusive lower bound.
        min: usize,
        /// Inclusive upper bound.
        max: usize,
    },

    /// A MAC address string failed to parse.
    #[error("invalid mac address `{value}`, expected aa:bb:cc:dd:ee:ff")]
    InvalidAddress {
        /// The offending input.
        value: String,
    },

    /// A payload was larger than the slab's block size.
    #[error("payload of {size} bytes exceeds block size {block_size}")]
    PayloadTooLarge {
        /// Bytes offered.
        size: usize,
        /// The slab's capacity.
        block_size: usize,
    },

    /// A captured buffer was too short to hold the headers it implies.
    #[error("captured frame truncated: need {needed} bytes, have {have}")]
    Truncated {
        /// Minimum bytes the headers require.
        needed: usize,
        /// Bytes actually captured.
        have: usize,
    },

    /// The radiotap version octet was not zero.
    #[error("unsupported radiotap version {0}")]
    BadRadiotapVersion(u8),
}
