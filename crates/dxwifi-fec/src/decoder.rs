//! Message decoder: scan, feed, finish, recover.

use crate::{
    LDPC_FRAME_SIZE, RS_LDPC_FRAME_SIZE,
    codec::ErasureCodec,
    errors::{CodecError, FecError},
    oti::{Oti, split_stride},
    params::FecParameters,
    reed_solomon::ReedSolomonCodec,
    rs_inner,
};

/// FEC decoder.
///
/// Stateless between messages; the session parameters come off the wire from
/// the first OTI whose CRC verifies.
pub struct FecDecoder {
    codec: Box<dyn ErasureCodec>,
    rs_protection: bool,
}

impl FecDecoder {
    /// Decoder with the default Reed–Solomon codec.
    ///
    /// `rs_protection` must match the encoder, like every other shared codec
    /// parameter.
    #[must_use]
    pub fn new(rs_protection: bool) -> Self {
        Self { codec: Box::new(ReedSolomonCodec), rs_protection }
    }

    /// Decoder bound to a caller-supplied erasure codec.
    #[must_use]
    pub fn with_codec(rs_protection: bool, codec: Box<dyn ErasureCodec>) -> Self {
        Self { codec, rs_protection }
    }

    fn frame_size(&self) -> usize {
        if self.rs_protection { RS_LDPC_FRAME_SIZE } else { LDPC_FRAME_SIZE }
    }

    /// Undo the inner-RS pass on one stride. `None` marks the stride as an
    /// erasure.
    fn restore_stride(&self, stride: &[u8]) -> Option<Vec<u8>> {
        if self.rs_protection {
            rs_inner::restore(stride).ok()
        } else {
            (stride.len() == LDPC_FRAME_SIZE).then(|| stride.to_vec())
        }
    }

    /// Scan the input in frame-sized strides and return the record of the
    /// first stride whose OTI CRC verifies.
    fn find_anchor(&self, encoded: &[u8]) -> Result<Oti, FecError> {
        for stride in encoded.chunks(self.frame_size()) {
            let Some(frame) = self.restore_stride(stride) else { continue };
            if let Some((oti, body)) = split_stride(&frame) {
                if oti.verifies(body) {
                    return Ok(*oti);
                }
            }
        }
        Err(FecError::NoValidOti)
    }

    /// Decode an encoded buffer back to `k * symbol_size` message bytes.
    ///
    /// Strides may arrive in any order, with any subset missing or mangled;
    /// a stride only counts when its OTI parses, matches the anchor's
    /// `(n, k)` and its CRC verifies. Trailing zero padding from encoding is
    /// preserved.
    ///
    /// # Errors
    ///
    /// - [`FecError::NoValidOti`] when no stride's CRC ever verifies
    /// - [`FecError::UnrecoverableLoss`] when fewer than `k` distinct
    ///   symbols survive
    /// - [`FecError::Codec`] when the codec fails beneath the session
    pub fn decode(&self, encoded: &[u8]) -> Result<Vec<u8>, FecError> {
        let anchor = self.find_anchor(encoded)?;
        let n = anchor.n();
        let k = anchor.k();
        if n < k {
            return Err(FecError::NoValidOti);
        }
        let params = FecParameters::from_counts(k, n - k)?;

        let mut session = self.codec.create(&params)?;
        let mut fed = 0usize;
        for stride in encoded.chunks(self.frame_size()) {
            let Some(frame) = self.restore_stride(stride) else { continue };
            let Some((oti, body)) = split_stride(&frame) else { continue };
            if oti.n() != n || oti.k() != k || oti.esi() >= n || !oti.verifies(body) {
                continue;
            }
            // A stride the session rejects (index or size disagreement) is
            // just another erasure on this lossy input.
            if session.feed(oti.esi(), body).is_err() {
                continue;
            }
            fed += 1;
            if session.is_complete() {
                break;
            }
        }

        if !session.is_complete() {
            session.finish().map_err(|err| match err {
                CodecError::NotEnoughSymbols { have, needed } => {
                    FecError::UnrecoverableLoss { received: have, needed }
                }
                other => FecError::Codec(other),
            })?;
        }

        let symbols = session.recover().map_err(|err| match err {
            CodecError::MissingSource { .. } => FecError::UnrecoverableLoss {
                received: fed,
                needed: k as usize,
            },
            other => FecError::Codec(other),
        })?;

        let mut out = Vec::with_capacity(params.capacity());
        for symbol in symbols {
            out.extend_from_slice(&symbol);
        }
        Ok(out)
    }
}
