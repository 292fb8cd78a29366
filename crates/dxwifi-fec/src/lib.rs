//! Forward error correction for the DxWiFi uplink.
//!
//! The air loses whole frames, so the FEC layer is built around
//! self-describing symbols: a message is cut into `k` source symbols,
//! extended with `n − k` repair symbols by a systematic erasure code, and
//! every symbol ships behind a 16-byte Object Transmission Information (OTI)
//! record `{esi, n, k, crc}`. A decoder can blind-scan any byte soup for the
//! first OTI whose CRC verifies, then rebuild the message from any `k`
//! surviving symbols.
//!
//! The erasure code itself sits behind the narrow [`ErasureCodec`] /
//! [`ErasureSession`] seam; the default binding is a GF(2⁸) Reed–Solomon
//! code. An optional inner Reed–Solomon pass additionally repairs byte-level
//! corruption inside a symbol before the erasure layer ever sees it.

pub mod codec;
mod decoder;
mod encoder;
mod errors;
pub mod oti;
mod params;
pub mod reed_solomon;
pub mod rs_inner;

#[cfg(test)]
pub(crate) mod xor;

pub use codec::{ErasureCodec, ErasureSession};
pub use decoder::FecDecoder;
pub use encoder::{FecConfig, FecEncoder};
pub use errors::{CodecError, FecError};
pub use oti::Oti;
pub use params::{FecParameters, derive_seed};

/// Number of inner-RS chunks per FEC frame.
pub const RS_BLOCKS_PER_FRAME: usize = 5;

/// Message bytes per inner-RS chunk.
pub const RS_MAX_MSG_LEN: usize = 223;

/// Parity bytes appended to each inner-RS chunk.
pub const RS_NPAR: usize = 32;

/// Size of an FEC frame on the wire without inner-RS protection:
/// OTI plus symbol body.
pub const LDPC_FRAME_SIZE: usize = RS_BLOCKS_PER_FRAME * RS_MAX_MSG_LEN;

/// Size of the symbol body inside an FEC frame.
pub const FEC_SYMBOL_SIZE: usize = LDPC_FRAME_SIZE - Oti::SIZE;

/// Size of an FEC frame on the wire with inner-RS protection enabled.
pub const RS_LDPC_FRAME_SIZE: usize = LDPC_FRAME_SIZE + RS_BLOCKS_PER_FRAME * RS_NPAR;

/// Minimum permitted repair-symbol count (RFC 6816 N1 lower bound).
pub const N1_MIN: u32 = 3;

/// Maximum permitted repair-symbol count per the N1 clamp.
pub const N1_MAX: u32 = 10;
