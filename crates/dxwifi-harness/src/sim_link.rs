//! In-memory link driver for end-to-end tests.
//!
//! Plays both roles: a transmitter's injected frames are recorded in order,
//! and frames queued by a test are handed to a receiver's dispatch exactly
//! like a capture backend would — including a pollable descriptor that goes
//! readable when frames await, so the production loops run unmodified.

use std::{
    collections::VecDeque,
    io::{PipeReader, PipeWriter, Read, Write, pipe},
    os::fd::{AsFd, BorrowedFd},
};

use nix::fcntl::{FcntlArg, OFlag, fcntl};

use dxwifi_core::{LinkDriver, LinkError, LinkStats};

/// The simulated link.
pub struct SimLink {
    sent: Vec<Vec<u8>>,
    queue: VecDeque<Vec<u8>>,
    reader: PipeReader,
    writer: PipeWriter,
    stats: LinkStats,
}

impl SimLink {
    /// A fresh link with nothing in flight.
    ///
    /// # Panics
    ///
    /// Panics when the host refuses an anonymous pipe; test-only code.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        let (reader, writer) = pipe().expect("sim link pipe");
        fcntl(&reader, FcntlArg::F_SETFL(OFlag::O_NONBLOCK)).expect("nonblocking sim pipe");
        Self {
            sent: Vec::new(),
            queue: VecDeque::new(),
            reader,
            writer,
            stats: LinkStats::default(),
        }
    }

    /// Queue a frame for a receiver and mark the descriptor readable.
    pub fn queue_frame(&mut self, frame: impl Into<Vec<u8>>) {
        self.queue.push_back(frame.into());
        self.stats.received += 1;
        let _ = (&self.writer).write_all(&[1]);
    }

    /// Frames a transmitter injected, in order.
    #[must_use]
    pub fn sent(&self) -> &[Vec<u8>] {
        &self.sent
    }

    /// Take ownership of the injected frames.
    pub fn take_sent(&mut self) -> Vec<Vec<u8>> {
        std::mem::take(&mut self.sent)
    }
}

impl Default for SimLink {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkDriver for SimLink {
    fn inject(&mut self, frame: &[u8]) -> Result<usize, LinkError> {
        self.sent.push(frame.to_vec());
        Ok(frame.len())
    }

    fn dispatch(
        &mut self,
        max_frames: usize,
        handler: &mut dyn FnMut(&[u8]),
    ) -> Result<usize, LinkError> {
        let mut delivered = 0;
        while delivered < max_frames {
            let Some(frame) = self.queue.pop_front() else { break };
            let mut tick = [0u8; 1];
            let _ = self.reader.read(&mut tick);
            handler(&frame);
            delivered += 1;
        }
        Ok(delivered)
    }

    fn poll_fd(&self) -> Option<BorrowedFd<'_>> {
        Some(self.reader.as_fd())
    }

    fn stats(&mut self) -> Option<LinkStats> {
        Some(self.stats)
    }
}
