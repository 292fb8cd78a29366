//! The erasure-codec seam.
//!
//! The encoder and decoder only ever talk to the code through this narrow
//! session interface, so the actual code — the production Reed–Solomon
//! binding, or a trivial XOR codec in unit tests — is swappable without
//! touching the framing logic.

use crate::{errors::CodecError, params::FecParameters};

/// One encoding or decoding session over a fixed `(n, k, symbol_size)`.
///
/// Encode-side calls: [`set_symbol`](ErasureSession::set_symbol) for every
/// source symbol, then [`build_repair`](ErasureSession::build_repair) for
/// each repair index. Decode-side calls:
/// [`feed`](ErasureSession::feed) for every symbol that survived,
/// [`is_complete`](ErasureSession::is_complete) to stop early,
/// [`finish`](ErasureSession::finish) to force reconstruction, and
/// [`recover`](ErasureSession::recover) for the source symbols.
pub trait ErasureSession {
    /// Install source symbol `esi ∈ [0, k)`.
    fn set_symbol(&mut self, esi: u32, data: &[u8]) -> Result<(), CodecError>;

    /// Compute repair symbol `esi ∈ [k, n)`. Requires every source symbol.
    fn build_repair(&mut self, esi: u32) -> Result<Vec<u8>, CodecError>;

    /// Offer a received symbol, source or repair, `esi ∈ [0, n)`.
    fn feed(&mut self, esi: u32, data: &[u8]) -> Result<(), CodecError>;

    /// True once every source symbol is present without reconstruction.
    fn is_complete(&self) -> bool;

    /// Reconstruct the missing source symbols from whatever was fed.
    fn finish(&mut self) -> Result<(), CodecError>;

    /// The `k` source symbols, in index order.
    fn recover(&mut self) -> Result<Vec<Vec<u8>>, CodecError>;
}

/// Factory for [`ErasureSession`]s.
pub trait ErasureCodec {
    /// Open a session with the given parameters.
    fn create(&self, params: &FecParameters) -> Result<Box<dyn ErasureSession>, CodecError>;
}
