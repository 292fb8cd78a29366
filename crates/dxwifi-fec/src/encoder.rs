//! Message encoder: partition, extend, frame.

use crate::{
    LDPC_FRAME_SIZE, RS_LDPC_FRAME_SIZE,
    codec::ErasureCodec,
    errors::FecError,
    oti::Oti,
    params::FecParameters,
    reed_solomon::ReedSolomonCodec,
    rs_inner,
};

/// Encoder-side configuration, shared verbatim by the decoder.
#[derive(Debug, Clone, Copy)]
pub struct FecConfig {
    /// Target code rate `k / n`.
    pub code_rate: f32,
    /// Apply the inner byte-repair pass to every frame.
    pub rs_protection: bool,
}

impl Default for FecConfig {
    fn default() -> Self {
        Self { code_rate: 2.0 / 3.0, rs_protection: false }
    }
}

/// FEC encoder for one message length.
pub struct FecEncoder {
    params: FecParameters,
    config: FecConfig,
    codec: Box<dyn ErasureCodec>,
}

impl std::fmt::Debug for FecEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FecEncoder")
            .field("params", &self.params)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl FecEncoder {
    /// Build an encoder for a message of `message_len` bytes with the
    /// default Reed–Solomon codec.
    ///
    /// # Errors
    ///
    /// [`FecError::EmptyMessage`], [`FecError::RateUnrealisable`] or
    /// [`FecError::MessageTooLarge`] when the parameters don't work out.
    pub fn new(message_len: usize, config: FecConfig) -> Result<Self, FecError> {
        Self::with_codec(message_len, config, Box::new(ReedSolomonCodec))
    }

    /// Build an encoder bound to a caller-supplied erasure codec.
    pub fn with_codec(
        message_len: usize,
        config: FecConfig,
        codec: Box<dyn ErasureCodec>,
    ) -> Result<Self, FecError> {
        let params = FecParameters::for_message(message_len, config.code_rate)?;
        Ok(Self { params, config, codec })
    }

    /// The session parameters this encoder settled on.
    #[must_use]
    pub fn params(&self) -> &FecParameters {
        &self.params
    }

    /// On-wire size of one encoded frame under this configuration.
    #[must_use]
    pub fn frame_size(&self) -> usize {
        if self.config.rs_protection { RS_LDPC_FRAME_SIZE } else { LDPC_FRAME_SIZE }
    }

    /// Total encoded output size for this encoder's message.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        self.params.n() as usize * self.frame_size()
    }

    /// Encode `message` into `n` self-describing frames.
    ///
    /// The message is copied into the first `k` symbols, the tail of the
    /// last source symbol zero-padded; padding survives decode and is the
    /// caller's to strip with its own length framing.
    ///
    /// # Errors
    ///
    /// [`FecError::MessageGrew`] if `message` exceeds the length the encoder
    /// was built for; codec failures surface as [`FecError::Codec`].
    pub fn encode(&self, message: &[u8]) -> Result<Vec<u8>, FecError> {
        let capacity = self.params.capacity();
        if message.len() > capacity {
            return Err(FecError::MessageGrew { len: message.len(), capacity });
        }

        let k = self.params.k;
        let n = self.params.n();
        let symbol_size = self.params.symbol_size;

        // Source symbols with zero padding in the tail of symbol k-1.
        let mut source = vec![0u8; capacity];
        source[..message.len()].copy_from_slice(message);

        let mut session = self.codec.create(&self.params)?;
        for (esi, symbol) in source.chunks(symbol_size).enumerate() {
            session.set_symbol(esi as u32, symbol)?;
        }

        let mut out = Vec::with_capacity(self.encoded_len());
        let mut emit = |esi: u32, body: &[u8]| -> Result<(), FecError> {
            let oti = Oti::new(esi, n, k, body);
            let mut frame = Vec::with_capacity(LDPC_FRAME_SIZE);
            frame.extend_from_slice(zerocopy::IntoBytes::as_bytes(&oti));
            frame.extend_from_slice(body);
            if self.config.rs_protection {
                out.extend_from_slice(&rs_inner::protect(&frame)?);
            } else {
                out.extend_from_slice(&frame);
            }
            Ok(())
        };

        for (esi, symbol) in source.chunks(symbol_size).enumerate() {
            emit(esi as u32, symbol)?;
        }
        for esi in k..n {
            let repair = session.build_repair(esi)?;
            emit(esi, &repair)?;
        }

        Ok(out)
    }
}
