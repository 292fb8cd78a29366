//! Trivial XOR erasure codec for unit-testing the framing logic.
//!
//! Every repair symbol is the XOR of all source symbols, so the code can
//! repair exactly one lost source symbol. Enough to exercise the seam
//! without dragging the real code into framing tests.

use crate::{
    codec::{ErasureCodec, ErasureSession},
    errors::CodecError,
    params::FecParameters,
};

pub struct XorCodec;

impl ErasureCodec for XorCodec {
    fn create(&self, params: &FecParameters) -> Result<Box<dyn ErasureSession>, CodecError> {
        Ok(Box::new(XorSession {
            k: params.k as usize,
            n: params.n() as usize,
            symbol_size: params.symbol_size,
            symbols: vec![None; params.n() as usize],
        }))
    }
}

struct XorSession {
    k: usize,
    n: usize,
    symbol_size: usize,
    symbols: Vec<Option<Vec<u8>>>,
}

impl XorSession {
    fn parity_of(&self, indices: impl Iterator<Item = usize>) -> Option<Vec<u8>> {
        let mut parity = vec![0u8; self.symbol_size];
        for esi in indices {
            let symbol = self.symbols[esi].as_ref()?;
            for (p, s) in parity.iter_mut().zip(symbol) {
                *p ^= s;
            }
        }
        Some(parity)
    }
}

impl ErasureSession for XorSession {
    fn set_symbol(&mut self, esi: u32, data: &[u8]) -> Result<(), CodecError> {
        if esi as usize >= self.k {
            return Err(CodecError::BadSymbolIndex { esi, n: self.k as u32 });
        }
        self.symbols[esi as usize] = Some(data.to_vec());
        Ok(())
    }

    fn build_repair(&mut self, esi: u32) -> Result<Vec<u8>, CodecError> {
        if (esi as usize) < self.k || esi as usize >= self.n {
            return Err(CodecError::BadSymbolIndex { esi, n: self.n as u32 });
        }
        let parity = self
            .parity_of(0..self.k)
            .ok_or(CodecError::MissingSource { esi: 0 })?;
        self.symbols[esi as usize] = Some(parity.clone());
        Ok(parity)
    }

    fn feed(&mut self, esi: u32, data: &[u8]) -> Result<(), CodecError> {
        if esi as usize >= self.n {
            return Err(CodecError::BadSymbolIndex { esi, n: self.n as u32 });
        }
        self.symbols[esi as usize] = Some(data.to_vec());
        Ok(())
    }

    fn is_complete(&self) -> bool {
        self.symbols[..self.k].iter().all(|s| s.is_some())
    }

    fn finish(&mut self) -> Result<(), CodecError> {
        if self.is_complete() {
            return Ok(());
        }
        let missing: Vec<_> = (0..self.k).filter(|&i| self.symbols[i].is_none()).collect();
        let repair = (self.k..self.n).find(|&i| self.symbols[i].is_some());
        match (missing.as_slice(), repair) {
            (&[lost], Some(repair)) => {
                let mut rebuilt = self.symbols[repair]
                    .clone()
                    .ok_or(CodecError::MissingSource { esi: repair as u32 })?;
                for esi in (0..self.k).filter(|&i| i != lost) {
                    let symbol = self.symbols[esi]
                        .as_ref()
                        .ok_or(CodecError::MissingSource { esi: esi as u32 })?;
                    for (r, s) in rebuilt.iter_mut().zip(symbol) {
                        *r ^= s;
                    }
                }
                self.symbols[lost] = Some(rebuilt);
                Ok(())
            }
            _ => Err(CodecError::NotEnoughSymbols {
                have: self.symbols.iter().filter(|s| s.is_some()).count(),
                needed: self.k,
            }),
        }
    }

    fn recover(&mut self) -> Result<Vec<Vec<u8>>, CodecError> {
        (0..self.k)
            .map(|esi| {
                self.symbols[esi]
                    .clone()
                    .ok_or(CodecError::MissingSource { esi: esi as u32 })
            })
            .collect()
    }
}
