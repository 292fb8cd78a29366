//! The transmit control loop.
//!
//! Read a block, run the pre-inject handlers, inject, repeat; a preamble
//! control frame opens the session and an EOT control frame closes it on
//! every exit path. The loop owns a single reusable frame slab whose headers
//! are written once — only the payload region and the sequence stamp change
//! per frame.

use std::{
    io::Read,
    os::fd::AsFd,
    time::Duration,
};

use dxwifi_proto::{
    ControlFrame, FrameControl, MacAddr, TxFrame,
    control::CONTROL_DATA_SIZE,
    frame::{DEFAULT_BLOCK_SIZE, TX_DURATION_ID, check_block_size},
    ieee80211::{rtap_flags, tx_flags},
};

use crate::{
    errors::TxError,
    io::{Readiness, StopHandle, WakePipe, wait_readable},
    link::LinkDriver,
    util::hexdump,
};

/// Capacity of the pre-inject handler table.
pub const PREINJECT_HANDLER_MAX: usize = 8;

/// A pre-inject handler: `(frame, frame_no, payload_size)`.
///
/// Handlers run in attachment order after each successful read and may
/// rewrite the payload or headers in place; the frame cannot be resized.
pub type PreinjectHandler = Box<dyn FnMut(&mut TxFrame, u32, usize)>;

/// Transmit-session configuration.
#[derive(Debug, Clone)]
pub struct TxConfig {
    /// Bytes per air frame payload, in `(256, 1400]`.
    pub block_size: usize,
    /// Wait for the next input read; `None` waits indefinitely.
    pub transmit_timeout: Option<Duration>,
    /// Radiotap frame flags.
    pub rtap_flags: u8,
    /// Radiotap data rate, whole Mbps.
    pub rtap_rate_mbps: u8,
    /// Radiotap transmit flags.
    pub rtap_tx_flags: u16,
    /// 802.11 frame-control settings.
    pub fctl: FrameControl,
    /// MAC address slot 1 (destination under the default DS bits). The
    /// leading two octets must stay non-zero; the sequence stamp only ever
    /// touches the trailing four.
    pub addr1: MacAddr,
    /// MAC address slot 2; the default BPF filter matches this one.
    pub addr2: MacAddr,
    /// MAC address slot 3.
    pub addr3: MacAddr,
}

impl Default for TxConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            transmit_timeout: None,
            rtap_flags: rtap_flags::FCS,
            rtap_rate_mbps: 1,
            rtap_tx_flags: tx_flags::NOACK,
            fctl: FrameControl::default(),
            addr1: MacAddr::BROADCAST,
            addr2: MacAddr::DEFAULT_SENDER,
            addr3: MacAddr::BROADCAST,
        }
    }
}

/// Counters accumulated over one transmission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TxStats {
    /// Data frames handed to the link (sequence numbers 0..frames_sent).
    pub frames_sent: u32,
    /// Payload bytes read from the input.
    pub bytes_read: u64,
    /// Wire bytes the link accepted, control frames included.
    pub bytes_sent: u64,
    /// Injections the link refused.
    pub inject_failures: u32,
}

/// The transmit session.
pub struct Transmitter<L: LinkDriver> {
    driver: L,
    config: TxConfig,
    handlers: Vec<PreinjectHandler>,
    wake: WakePipe,
}

impl<L: LinkDriver> Transmitter<L> {
    /// Build a session over `driver`.
    ///
    /// The sequence-number stamper is attached as the first pre-inject
    /// handler; it writes `frame_no` into addr1 in network byte order.
    ///
    /// # Errors
    ///
    /// [`TxError::Frame`] when the block size is out of range.
    pub fn new(driver: L, config: TxConfig) -> Result<Self, TxError> {
        check_block_size(config.block_size)?;
        let mut tx = Self {
            driver,
            config,
            handlers: Vec::with_capacity(PREINJECT_HANDLER_MAX),
            wake: WakePipe::new()?,
        };
        tx.attach_preinject_handler(Box::new(|frame, frame_no, _size| {
            frame.set_sequence(frame_no);
        }))?;
        Ok(tx)
    }

    /// Attach a handler behind the ones already registered.
    ///
    /// # Errors
    ///
    /// [`TxError::HandlerLimit`] once the table holds
    /// [`PREINJECT_HANDLER_MAX`] handlers.
    pub fn attach_preinject_handler(&mut self, handler: PreinjectHandler) -> Result<(), TxError> {
        if self.handlers.len() == PREINJECT_HANDLER_MAX {
            return Err(TxError::HandlerLimit { max: PREINJECT_HANDLER_MAX });
        }
        self.handlers.push(handler);
        Ok(())
    }

    /// Handle for stopping the session from another thread or a signal
    /// handler.
    #[must_use]
    pub fn stop_handle(&self) -> StopHandle {
        self.wake.handle()
    }

    /// Borrow the link driver.
    pub fn driver_mut(&mut self) -> &mut L {
        &mut self.driver
    }

    /// Tear the session down, returning the driver.
    #[must_use]
    pub fn into_driver(self) -> L {
        self.driver
    }

    fn log_configuration(&self) {
        tracing::info!(
            "transmitter settings: block_size={} rate={}Mbps rtap_flags={:#04x} rtap_tx_flags={:#06x} addr2={}",
            self.config.block_size,
            self.config.rtap_rate_mbps,
            self.config.rtap_flags,
            self.config.rtap_tx_flags,
            self.config.addr2,
        );
    }

    fn send_control_frame(&mut self, frame: &mut TxFrame, kind: ControlFrame, stats: &mut TxStats) {
        let size = kind.fill(frame.payload_mut());
        debug_assert_eq!(size, CONTROL_DATA_SIZE);

        let wire = match frame.wire_frame(size) {
            Ok(wire) => wire,
            Err(err) => {
                tracing::error!("control frame exceeds slab: {err}");
                return;
            }
        };
        match self.driver.inject(wire) {
            Ok(sent) => {
                stats.bytes_sent += sent as u64;
                tracing::info!("{kind:?} frame sent ({sent} bytes)");
                tracing::trace!("control frame:\n{}", hexdump(wire));
            }
            Err(err) => {
                stats.inject_failures += 1;
                tracing::error!("{kind:?} frame injection failed: {err}");
            }
        }
    }

    /// Transmit `input` until EOF, timeout or stop.
    ///
    /// Returns the session counters; the frame count is also the next unused
    /// sequence number. Injection failures do not abort the loop — this is a
    /// fire-and-forget uplink — and the EOT sentinel goes out on every exit
    /// path so receivers can terminate cleanly.
    ///
    /// # Errors
    ///
    /// [`TxError::Frame`] only for slab construction; steady-state inject
    /// and read failures are logged and counted instead.
    pub fn start<R: Read + AsFd>(&mut self, input: &mut R) -> Result<TxStats, TxError> {
        let mut stats = TxStats::default();
        let mut frame = TxFrame::new(self.config.block_size)?;

        frame.write_radiotap(
            self.config.rtap_flags,
            self.config.rtap_rate_mbps,
            self.config.rtap_tx_flags,
        );
        frame.write_mac(
            self.config.fctl,
            TX_DURATION_ID,
            self.config.addr1,
            self.config.addr2,
            self.config.addr3,
        );

        self.log_configuration();
        tracing::info!("starting transmission");
        self.wake.activate();

        self.send_control_frame(&mut frame, ControlFrame::Preamble, &mut stats);

        while self.wake.is_active() {
            match wait_readable(input.as_fd(), self.wake.wake_fd(), self.config.transmit_timeout) {
                Ok(Readiness::TimedOut) => {
                    tracing::info!("transmitter timeout");
                    break;
                }
                Ok(Readiness::Interrupted) => break,
                Err(err) => {
                    if self.wake.is_active() {
                        tracing::error!("poll failed: {err}");
                    }
                    break;
                }
                Ok(Readiness::Ready) => {}
            }

            let nbytes = match input.read(frame.payload_mut()) {
                Ok(0) => break, // EOF
                Ok(n) => n,
                Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(err) => {
                    if self.wake.is_active() {
                        tracing::error!("input read failed: {err}");
                    }
                    break;
                }
            };

            let frame_no = stats.frames_sent;
            for handler in &mut self.handlers {
                handler(&mut frame, frame_no, nbytes);
            }

            let wire = frame.wire_frame(nbytes)?;
            match self.driver.inject(wire) {
                Ok(sent) => {
                    stats.bytes_sent += sent as u64;
                    tracing::debug!("frame {frame_no}: read {nbytes}, sent {sent}");
                    tracing::trace!("frame {frame_no}:\n{}", hexdump(wire));
                }
                Err(err) => {
                    stats.inject_failures += 1;
                    tracing::error!("frame {frame_no} injection failed: {err}");
                }
            }
            stats.bytes_read += nbytes as u64;
            stats.frames_sent += 1;
        }

        self.send_control_frame(&mut frame, ControlFrame::Eot, &mut stats);
        self.wake.deactivate();

        tracing::info!(
            "transmission stats: frames={} bytes_read={} bytes_sent={} inject_failures={}",
            stats.frames_sent,
            stats.bytes_read,
            stats.bytes_sent,
            stats.inject_failures,
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Seek, Write};

    use dxwifi_proto::{CapturedFrame, frame::TX_HEADER_SIZE, ieee80211::FCS_SIZE};

    use super::*;
    use crate::test_link::TestLink;

    fn input_file(contents: &[u8]) -> std::fs::File {
        let mut file = tempfile::tempfile().unwrap();
        file.write_all(contents).unwrap();
        file.rewind().unwrap();
        file
    }

    fn config(block_size: usize) -> TxConfig {
        TxConfig { block_size, ..TxConfig::default() }
    }

    fn transmit(contents: &[u8], config: TxConfig) -> (TxStats, Vec<Vec<u8>>) {
        let mut tx = Transmitter::new(TestLink::new(), config).unwrap();
        let mut input = input_file(contents);
        let stats = tx.start(&mut input).unwrap();
        (stats, tx.into_driver().sent)
    }

    #[test]
    fn session_is_bracketed_by_control_frames() {
        let (stats, sent) = transmit(&[0u8; 2048], config(512));

        assert_eq!(stats.frames_sent, 4);
        assert_eq!(stats.bytes_read, 2048);
        assert_eq!(sent.len(), 6); // preamble + 4 data + eot

        let first = CapturedFrame::parse(&sent[0]).unwrap();
        assert_eq!(ControlFrame::classify(first.payload), Some(ControlFrame::Preamble));
        let last = CapturedFrame::parse(&sent[5]).unwrap();
        assert_eq!(ControlFrame::classify(last.payload), Some(ControlFrame::Eot));
    }

    #[test]
    fn sequence_numbers_start_at_zero_and_increase() {
        let (_, sent) = transmit(&[0x41u8; 4 * 300], config(300));
        for (expected, wire) in sent[1..5].iter().enumerate() {
            let view = CapturedFrame::parse(wire).unwrap();
            assert_eq!(view.frame_number, expected as u32);
            assert_eq!(view.payload.len(), 300);
        }
    }

    #[test]
    fn short_final_read_injects_a_short_frame() {
        let (stats, sent) = transmit(&[0x55u8; 700], config(512));

        assert_eq!(stats.frames_sent, 2);
        assert_eq!(sent[1].len(), TX_HEADER_SIZE + 512 + FCS_SIZE);
        assert_eq!(sent[2].len(), TX_HEADER_SIZE + 188 + FCS_SIZE);
        let tail = CapturedFrame::parse(&sent[2]).unwrap();
        assert_eq!(tail.payload, &[0x55u8; 188][..]);
    }

    #[test]
    fn empty_input_still_brackets() {
        let (stats, sent) = transmit(&[], config(512));
        assert_eq!(stats.frames_sent, 0);
        assert_eq!(sent.len(), 2);
    }

    #[test]
    fn user_handlers_run_in_attachment_order_after_the_stamper() {
        let mut tx = Transmitter::new(TestLink::new(), config(300)).unwrap();
        tx.attach_preinject_handler(Box::new(|frame, _, size| {
            for byte in &mut frame.payload_mut()[..size] {
                *byte = byte.wrapping_add(1);
            }
        }))
        .unwrap();
        tx.attach_preinject_handler(Box::new(|frame, _, size| {
            for byte in &mut frame.payload_mut()[..size] {
                *byte = byte.wrapping_mul(2);
            }
        }))
        .unwrap();

        let mut input = input_file(&[10u8; 300]);
        tx.start(&mut input).unwrap();

        let sent = tx.into_driver().sent;
        let view = CapturedFrame::parse(&sent[1]).unwrap();
        // (10 + 1) * 2, not 10 * 2 + 1: attachment order matters.
        assert!(view.payload.iter().all(|&b| b == 22));
        assert_eq!(view.frame_number, 0, "stamper still ran");
    }

    #[test]
    fn handler_table_is_bounded() {
        let mut tx = Transmitter::new(TestLink::new(), config(300)).unwrap();
        for _ in 0..(PREINJECT_HANDLER_MAX - 1) {
            tx.attach_preinject_handler(Box::new(|_, _, _| {})).unwrap();
        }
        let err = tx.attach_preinject_handler(Box::new(|_, _, _| {})).unwrap_err();
        assert!(matches!(err, TxError::HandlerLimit { max: PREINJECT_HANDLER_MAX }));
    }

    #[test]
    fn inject_failures_are_counted_not_fatal() {
        let mut link = TestLink::new();
        link.fail_injects = 2; // swallow the preamble and the first data frame
        let mut tx = Transmitter::new(link, config(512)).unwrap();

        let mut input = input_file(&[1u8; 1024]);
        let stats = tx.start(&mut input).unwrap();

        assert_eq!(stats.frames_sent, 2);
        assert_eq!(stats.inject_failures, 2);
        // Frame 1 and the EOT made it out.
        let sent = tx.into_driver().sent;
        assert_eq!(sent.len(), 2);
        assert_eq!(CapturedFrame::parse(&sent[0]).unwrap().frame_number, 1);
    }

    #[test]
    fn block_size_is_validated_up_front() {
        assert!(Transmitter::new(TestLink::new(), config(256)).is_err());
        assert!(Transmitter::new(TestLink::new(), config(1401)).is_err());
        assert!(Transmitter::new(TestLink::new(), config(1400)).is_ok());
    }

    #[test]
    fn stop_handle_ends_the_session_with_an_eot() {
        // Input is a pipe that never reaches EOF: without the stop handle
        // the session would park in poll indefinitely.
        let (mut reader, mut writer) = std::io::pipe().unwrap();
        writer.write_all(&[9u8; 600]).unwrap();

        let mut tx = Transmitter::new(TestLink::new(), config(512)).unwrap();
        let stop = tx.stop_handle();
        let stopper = std::thread::spawn(move || {
            std::thread::sleep(std::time::Duration::from_millis(200));
            stop.stop();
        });

        let stats = tx.start(&mut reader).unwrap();
        stopper.join().unwrap();

        assert_eq!(stats.frames_sent, 2); // 512 + 88 byte reads
        let sent = tx.into_driver().sent;
        assert_eq!(sent.len(), 4);
        let last = CapturedFrame::parse(&sent[3]).unwrap();
        assert_eq!(ControlFrame::classify(last.payload), Some(ControlFrame::Eot));
    }
}

