//! Minimal in-memory link driver for unit tests.
//!
//! Injected frames are recorded; queued frames are handed out by `dispatch`
//! with a pipe byte per frame so the production poll loop sees readiness
//! exactly the way it would from a capture descriptor.

use std::{
    collections::VecDeque,
    io::{PipeReader, PipeWriter, Read, Write, pipe},
    os::fd::{AsFd, BorrowedFd},
};

use nix::fcntl::{FcntlArg, OFlag, fcntl};

use crate::link::{LinkDriver, LinkError, LinkStats};

pub(crate) struct TestLink {
    pub(crate) sent: Vec<Vec<u8>>,
    queue: VecDeque<Vec<u8>>,
    reader: PipeReader,
    writer: PipeWriter,
    pub(crate) fail_injects: usize,
}

impl TestLink {
    pub(crate) fn new() -> Self {
        let (reader, writer) = pipe().expect("pipe");
        fcntl(&reader, FcntlArg::F_SETFL(OFlag::O_NONBLOCK)).expect("nonblocking test pipe");
        Self { sent: Vec::new(), queue: VecDeque::new(), reader, writer, fail_injects: 0 }
    }

    /// Queue a frame for the next dispatch and mark the descriptor readable.
    pub(crate) fn queue_frame(&mut self, frame: Vec<u8>) {
        self.queue.push_back(frame);
        (&self.writer).write_all(&[1]).expect("wake byte");
    }
}

impl LinkDriver for TestLink {
    fn inject(&mut self, frame: &[u8]) -> Result<usize, LinkError> {
        if self.fail_injects > 0 {
            self.fail_injects -= 1;
            return Err(LinkError::InjectFailed("test-induced failure".into()));
        }
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
        None
    }
}
