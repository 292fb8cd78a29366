//! Production binding of the erasure seam to a GF(2⁸) Reed–Solomon code.
//!
//! The code is MDS: any `k` of the `n` symbols reconstruct the source, which
//! is the strongest possible behaviour behind the seam — a session never
//! fails while `k` distinct symbols survive. The parity PRNG seed and N1
//! parameters ride along in [`FecParameters`] but are not consumed here; the
//! code is fully determined by the symbol counts.

use reed_solomon_erasure::galois_8::ReedSolomon;

use crate::{
    codec::{ErasureCodec, ErasureSession},
    errors::CodecError,
    params::FecParameters,
};

/// The default erasure codec.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReedSolomonCodec;

impl ErasureCodec for ReedSolomonCodec {
    fn create(&self, params: &FecParameters) -> Result<Box<dyn ErasureSession>, CodecError> {
        let rs = ReedSolomon::new(params.k as usize, params.repair as usize)
            .map_err(|e| CodecError::InitFailed(e.to_string()))?;
        Ok(Box::new(ReedSolomonSession {
            rs,
            k: params.k as usize,
            n: params.n() as usize,
            symbol_size: params.symbol_size,
            shards: vec![None; params.n() as usize],
            repairs_built: false,
        }))
    }
}

struct ReedSolomonSession {
    rs: ReedSolomon,
    k: usize,
    n: usize,
    symbol_size: usize,
    shards: Vec<Option<Vec<u8>>>,
    repairs_built: bool,
}

impl ReedSolomonSession {
    fn check_symbol(&self, esi: u32, data: &[u8], limit: usize) -> Result<(), CodecError> {
        if esi as usize >= limit {
            return Err(CodecError::BadSymbolIndex { esi, n: limit as u32 });
        }
        if data.len() != self.symbol_size {
            return Err(CodecError::BadSymbolSize { size: data.len(), expected: self.symbol_size });
        }
        Ok(())
    }

    fn available(&self) -> usize {
        self.shards.iter().filter(|s| s.is_some()).count()
    }

    /// Run the encoder over the full shard set, filling `shards[k..n]`.
    fn build_all_repairs(&mut self) -> Result<(), CodecError> {
        let mut table = Vec::with_capacity(self.n);
        for (esi, shard) in self.shards[..self.k].iter().enumerate() {
            let shard = shard
                .clone()
                .ok_or(CodecError::MissingSource { esi: esi as u32 })?;
            table.push(shard);
        }
        table.resize(self.n, vec![0u8; self.symbol_size]);

        self.rs
            .encode(&mut table)
            .map_err(|e| CodecError::Refused(e.to_string()))?;

        for (slot, shard) in self.shards[self.k..].iter_mut().zip(table.drain(self.k..)) {
            *slot = Some(shard);
        }
        self.repairs_built = true;
        Ok(())
    }
}

impl ErasureSession for ReedSolomonSession {
    fn set_symbol(&mut self, esi: u32, data: &[u8]) -> Result<(), CodecError> {
        self.check_symbol(esi, data, self.k)?;
        self.shards[esi as usize] = Some(data.to_vec());
        self.repairs_built = false;
        Ok(())
    }

    fn build_repair(&mut self, esi: u32) -> Result<Vec<u8>, CodecError> {
        if (esi as usize) < self.k || esi as usize >= self.n {
            return Err(CodecError::BadSymbolIndex { esi, n: self.n as u32 });
        }
        if !self.repairs_built {
            self.build_all_repairs()?;
        }
        self.shards[esi as usize]
            .clone()
            .ok_or(CodecError::BadSymbolIndex { esi, n: self.n as u32 })
    }

    fn feed(&mut self, esi: u32, data: &[u8]) -> Result<(), CodecError> {
        self.check_symbol(esi, data, self.n)?;
        self.shards[esi as usize] = Some(data.to_vec());
        Ok(())
    }

    fn is_complete(&self) -> bool {
        self.shards[..self.k].iter().all(|s| s.is_some())
    }

    fn finish(&mut self) -> Result<(), CodecError> {
        if self.is_complete() {
            return Ok(());
        }
        let have = self.available();
        if have < self.k {
            return Err(CodecError::NotEnoughSymbols { have, needed: self.k });
        }
        self.rs.reconstruct(&mut self.shards).map_err(|e| match e {
            reed_solomon_erasure::Error::TooFewShardsPresent => {
                CodecError::NotEnoughSymbols { have, needed: self.k }
            }
            other => CodecError::Refused(other.to_string()),
        })
    }

    fn recover(&mut self) -> Result<Vec<Vec<u8>>, CodecError> {
        let mut out = Vec::with_capacity(self.k);
        for (esi, shard) in self.shards[..self.k].iter().enumerate() {
            let shard = shard
                .clone()
                .ok_or(CodecError::MissingSource { esi: esi as u32 })?;
            out.push(shard);
        }
        Ok(out)
    }
}
