//! FEC error taxonomy.

use thiserror::Error;

/// Errors from the erasure-codec seam.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The codec rejected the session parameters.
    #[error("codec refused session parameters: {0}")]
    InitFailed(String),

    /// A symbol index fell outside `[0, n)`.
    #[error("symbol index {esi} outside [0, {n})")]
    BadSymbolIndex {
        /// Offending encoding symbol index.
        esi: u32,
        /// Total symbol count of the session.
        n: u32,
    },

    /// A symbol body had the wrong length.
    #[error("symbol of {size} bytes, session expects {expected}")]
    BadSymbolSize {
        /// Bytes offered.
        size: usize,
        /// The session's symbol size.
        expected: usize,
    },

    /// A repair symbol was requested before every source symbol was set.
    #[error("source symbol {esi} missing, cannot build repair symbols")]
    MissingSource {
        /// First missing source index.
        esi: u32,
    },

    /// Too few symbols survived to complete decoding.
    #[error("{have} symbols received, {needed} needed")]
    NotEnoughSymbols {
        /// Symbols the session holds.
        have: usize,
        /// Symbols decoding requires.
        needed: usize,
    },

    /// The underlying codec refused an operation.
    #[error("codec failure: {0}")]
    Refused(String),
}

/// Errors from encoding or decoding a message.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FecError {
    /// The requested code rate cannot produce the minimum repair count.
    #[error("code rate {code_rate} over {k} source symbols cannot reach the minimum repair count")]
    RateUnrealisable {
        /// Source symbol count of the message.
        k: u32,
        /// The rate that was requested.
        code_rate: f32,
    },

    /// The message needs more symbols than the codec can address.
    #[error("message needs {symbols} symbols, codec limit is {limit}")]
    MessageTooLarge {
        /// Symbols the message would occupy.
        symbols: u32,
        /// The codec's shard limit.
        limit: u32,
    },

    /// Empty messages cannot be encoded.
    #[error("cannot encode an empty message")]
    EmptyMessage,

    /// The encoder was handed more bytes than it was initialised for.
    #[error("message of {len} bytes exceeds the {capacity} bytes the encoder was built for")]
    MessageGrew {
        /// Bytes offered to `encode`.
        len: usize,
        /// Capacity fixed at construction.
        capacity: usize,
    },

    /// No stride of the input carried an OTI whose CRC verified.
    #[error("no valid object transmission information header found")]
    NoValidOti,

    /// Decoding could not complete from the symbols that survived.
    #[error("unrecoverable loss: {received} of {needed} required symbols")]
    UnrecoverableLoss {
        /// Distinct symbols that were fed to the codec.
        received: usize,
        /// Symbols required for completion.
        needed: usize,
    },

    /// The erasure codec failed underneath the session.
    #[error(transparent)]
    Codec(#[from] CodecError),
}
