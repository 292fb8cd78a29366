//! Inner byte-repair layer.
//!
//! The erasure layer treats a symbol as all-or-nothing, so a single flipped
//! bit would cost an entire symbol. When enabled, this pass splits each
//! OTI-framed frame into [`RS_BLOCKS_PER_FRAME`](crate::RS_BLOCKS_PER_FRAME)
//! chunks of [`RS_MAX_MSG_LEN`](crate::RS_MAX_MSG_LEN) bytes and extends each
//! with [`RS_NPAR`](crate::RS_NPAR) Reed–Solomon parity bytes, repairing up
//! to `RS_NPAR / 2` corrupt bytes per chunk before the erasure layer ever
//! sees the frame.

use reed_solomon::{Decoder, Encoder};

use crate::{LDPC_FRAME_SIZE, RS_LDPC_FRAME_SIZE, RS_MAX_MSG_LEN, RS_NPAR, errors::FecError};

/// Expand one `LDPC_FRAME_SIZE` frame to its protected
/// `RS_LDPC_FRAME_SIZE` wire image.
///
/// # Errors
///
/// [`FecError::NoValidOti`] is never returned here; the only failure is a
/// frame of the wrong length, reported as [`FecError::MessageGrew`].
pub fn protect(frame: &[u8]) -> Result<Vec<u8>, FecError> {
    if frame.len() != LDPC_FRAME_SIZE {
        return Err(FecError::MessageGrew { len: frame.len(), capacity: LDPC_FRAME_SIZE });
    }

    let encoder = Encoder::new(RS_NPAR);
    let mut out = Vec::with_capacity(RS_LDPC_FRAME_SIZE);
    for chunk in frame.chunks(RS_MAX_MSG_LEN) {
        let code = encoder.encode(chunk);
        out.extend_from_slice(code.data());
        out.extend_from_slice(code.ecc());
    }
    Ok(out)
}

/// Collapse one protected wire frame back to its `LDPC_FRAME_SIZE` image,
/// repairing byte corruption chunk by chunk.
///
/// # Errors
///
/// [`FecError::UnrecoverableLoss`] when any chunk carries more corruption
/// than its parity can repair — the caller treats the whole frame as an
/// erasure.
pub fn restore(wire: &[u8]) -> Result<Vec<u8>, FecError> {
    if wire.len() != RS_LDPC_FRAME_SIZE {
        return Err(FecError::UnrecoverableLoss { received: wire.len(), needed: RS_LDPC_FRAME_SIZE });
    }

    let decoder = Decoder::new(RS_NPAR);
    let mut out = Vec::with_capacity(LDPC_FRAME_SIZE);
    for chunk in wire.chunks(RS_MAX_MSG_LEN + RS_NPAR) {
        let mut block = chunk.to_vec();
        let recovered = decoder
            .correct(&mut block, None)
            .map_err(|_| FecError::UnrecoverableLoss { received: 0, needed: 1 })?;
        out.extend_from_slice(recovered.data());
    }
    Ok(out)
}
