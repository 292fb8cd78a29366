//! Poll plumbing shared by both control loops.
//!
//! Each session owns an anonymous pipe. The loop polls its working
//! descriptor and the pipe's read end together; a [`StopHandle`] clears the
//! session flag and writes a byte, turning cancellation into an ordinary
//! readable event even when the loop is parked in an indefinite poll.

use std::{
    io::{self, Read, Write, pipe},
    os::fd::{AsFd, BorrowedFd},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use nix::{
    errno::Errno,
    fcntl::{FcntlArg, OFlag, fcntl},
    poll::{PollFd, PollFlags, PollTimeout, poll},
};

/// Outcome of one wait on the loop descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Readiness {
    /// The working descriptor is readable.
    Ready,
    /// The wait elapsed with no activity.
    TimedOut,
    /// The stop pipe fired.
    Interrupted,
}

/// Wait for `fd` to become readable, `wake` cutting the wait short.
pub(crate) fn wait_readable(
    fd: BorrowedFd<'_>,
    wake: BorrowedFd<'_>,
    timeout: Option<Duration>,
) -> io::Result<Readiness> {
    let timeout = match timeout {
        None => PollTimeout::NONE,
        Some(d) => {
            let millis = i32::try_from(d.as_millis()).unwrap_or(i32::MAX);
            PollTimeout::try_from(millis).unwrap_or(PollTimeout::MAX)
        }
    };

    loop {
        let mut fds = [
            PollFd::new(fd, PollFlags::POLLIN),
            PollFd::new(wake, PollFlags::POLLIN),
        ];
        match poll(&mut fds, timeout) {
            Ok(0) => return Ok(Readiness::TimedOut),
            Ok(_) => {
                if fds[1].revents().is_some_and(|r| !r.is_empty()) {
                    return Ok(Readiness::Interrupted);
                }
                return Ok(Readiness::Ready);
            }
            Err(Errno::EINTR) => {}
            Err(errno) => return Err(io::Error::from(errno)),
        }
    }
}

/// The session-owned end of the stop plumbing.
pub(crate) struct WakePipe {
    reader: std::io::PipeReader,
    writer: Arc<std::io::PipeWriter>,
    activated: Arc<AtomicBool>,
}

impl WakePipe {
    pub(crate) fn new() -> io::Result<Self> {
        let (reader, writer) = pipe()?;
        // Nonblocking read end: draining stale wake bytes must never park
        // the loop.
        fcntl(&reader, FcntlArg::F_SETFL(OFlag::O_NONBLOCK)).map_err(io::Error::from)?;
        Ok(Self {
            reader,
            writer: Arc::new(writer),
            activated: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Descriptor the loop polls alongside its working descriptor.
    pub(crate) fn wake_fd(&self) -> BorrowedFd<'_> {
        self.reader.as_fd()
    }

    /// Mark the session active and swallow any stale wake bytes.
    pub(crate) fn activate(&mut self) {
        self.activated.store(true, Ordering::SeqCst);
        self.drain();
    }

    pub(crate) fn deactivate(&self) {
        self.activated.store(false, Ordering::SeqCst);
    }

    pub(crate) fn is_active(&self) -> bool {
        self.activated.load(Ordering::SeqCst)
    }

    /// Consume buffered wake bytes so the next poll blocks again.
    pub(crate) fn drain(&mut self) {
        let mut sink = [0u8; 64];
        loop {
            match self.reader.read(&mut sink) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
        }
    }

    pub(crate) fn handle(&self) -> StopHandle {
        StopHandle {
            activated: Arc::clone(&self.activated),
            wake: Arc::clone(&self.writer),
        }
    }
}

/// Asynchronous stopper for a running session.
///
/// Clone-cheap, `Send + Sync`; safe to invoke from a ctrl-c handler thread.
/// Stopping is best-effort: the frame in flight completes and buffered
/// packets are drained before the session closes.
#[derive(Clone)]
pub struct StopHandle {
    activated: Arc<AtomicBool>,
    wake: Arc<std::io::PipeWriter>,
}

impl StopHandle {
    /// Request the session to stop and wake its poll loop.
    pub fn stop(&self) {
        self.activated.store(false, Ordering::SeqCst);
        let _ = (&*self.wake).write_all(&[1]);
    }

    /// True while the session has not been asked to stop.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.activated.load(Ordering::SeqCst)
    }
}
