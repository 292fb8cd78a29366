//! Test harness for the DxWiFi uplink.
//!
//! Runs the production transmitter and receiver against an in-memory link
//! ([`SimLink`]) so end-to-end behaviour — session bracketing, reordering,
//! loss, FEC recovery — can be exercised deterministically, with seeded RNG
//! standing in for the air.

mod sim_link;

use std::{
    io::{Seek, Write},
    time::Duration,
};

use rand::{SeedableRng, seq::SliceRandom};
use rand_chacha::ChaCha8Rng;

use dxwifi_core::{Receiver, RxConfig, RxStats, Transmitter, TxConfig, TxStats};

pub use sim_link::SimLink;

/// Run a full transmission of `data` and return the injected frames
/// (preamble and EOT included) with the session counters.
///
/// # Panics
///
/// Panics on harness plumbing failures; test-only code.
#[allow(clippy::expect_used)]
pub fn transmit(data: &[u8], config: TxConfig) -> (Vec<Vec<u8>>, TxStats) {
    let mut input = tempfile::tempfile().expect("input file");
    input.write_all(data).expect("stage input");
    input.rewind().expect("rewind input");

    let mut tx = Transmitter::new(SimLink::new(), config).expect("transmitter");
    let stats = tx.start(&mut input).expect("transmission");
    (tx.into_driver().take_sent(), stats)
}

/// Run a capture over `frames` and return the reassembled bytes with the
/// session counters.
///
/// The capture timeout is short and finite so tests that never deliver an
/// EOT still terminate.
///
/// # Panics
///
/// Panics on harness plumbing failures; test-only code.
#[allow(clippy::expect_used)]
pub fn receive(frames: Vec<Vec<u8>>, config: RxConfig) -> (Vec<u8>, RxStats) {
    let mut link = SimLink::new();
    for frame in frames {
        link.queue_frame(frame);
    }
    let mut rx = Receiver::new(link, config).expect("receiver");
    let mut out = Vec::new();
    let stats = rx.start(&mut out).expect("capture");
    (out, stats)
}

/// A receive configuration suitable for tests: finite timeout, default
/// staging.
#[must_use]
pub fn test_rx_config() -> RxConfig {
    RxConfig { capture_timeout: Some(Duration::from_millis(250)), ..RxConfig::default() }
}

/// Deterministically shuffle `frames` in place with the given seed.
pub fn shuffle_frames(frames: &mut [Vec<u8>], seed: u64) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    frames.shuffle(&mut rng);
}

/// Drop each frame independently with probability `loss`, deterministically
/// for a given seed. Returns the survivors in order.
#[must_use]
pub fn lossy<I: IntoIterator<Item = Vec<u8>>>(frames: I, loss: f64, seed: u64) -> Vec<Vec<u8>> {
    use rand::Rng;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    frames.into_iter().filter(|_| rng.gen_range(0.0..1.0) >= loss).collect()
}
