//! The capture control loop.
//!
//! Captured frames are classified (control or data), data payloads staged in
//! a byte buffer and indexed through a min-heap keyed by frame number. The
//! heap drains — to the sink, in sequence order — whenever the staging
//! buffer would overflow and once more at session end. Sequence gaps are
//! paid for in noise bytes so downstream length-based framing stays aligned.

use std::{cmp::Ordering, io::Write, time::Duration};

use dxwifi_proto::{CapturedFrame, ControlFrame};

use crate::{
    errors::RxError,
    heap::{BoundedMinHeap, HeapFull},
    io::{Readiness, StopHandle, WakePipe, wait_readable},
    link::{LinkDriver, LinkStats},
    util::hexdump,
};

/// Byte written in place of every lost block.
pub const NOISE_VALUE: u8 = 0xFF;

/// Smallest permitted staging buffer.
pub const PACKET_BUFFER_SIZE_MIN: usize = 1024;

/// Largest permitted staging buffer.
pub const PACKET_BUFFER_SIZE_MAX: usize = 1024 * 1024;

/// Default staging buffer size.
pub const DEFAULT_PACKET_BUFFER_SIZE: usize = 512 * 1024;

/// Default frames per dispatch batch.
pub const DEFAULT_DISPATCH_COUNT: usize = 5;

/// Receive-session configuration.
///
/// Capture-device parameters (interface, BPF filter, snaplen, driver buffer
/// timeout) belong to the link driver's open call; this is the loop itself.
#[derive(Debug, Clone)]
pub struct RxConfig {
    /// Max frames processed per dispatch batch.
    pub dispatch_count: usize,
    /// Wait for capture activity; `None` waits indefinitely.
    pub capture_timeout: Option<Duration>,
    /// Staging buffer size in bytes, within `[1 KiB, 1 MiB]`.
    pub packet_buffer_size: usize,
}

impl Default for RxConfig {
    fn default() -> Self {
        Self {
            dispatch_count: DEFAULT_DISPATCH_COUNT,
            capture_timeout: None,
            packet_buffer_size: DEFAULT_PACKET_BUFFER_SIZE,
        }
    }
}

/// Counters accumulated over one capture session.
#[derive(Debug, Clone, Default)]
pub struct RxStats {
    /// Data frames buffered for reassembly.
    pub frames_captured: u32,
    /// Every frame the dispatch callback saw, control frames included.
    pub packets_processed: u32,
    /// Captures that failed to parse as DxWiFi frames.
    pub malformed_frames: u32,
    /// Blocks synthesised as noise for missing sequence numbers.
    pub blocks_lost: u32,
    /// Payload bytes written to the sink.
    pub bytes_written: u64,
    /// Noise bytes written to the sink (also counted in `bytes_written`).
    pub noise_bytes_written: u64,
    /// Backend capture counters, when available.
    pub link: Option<LinkStats>,
}

/// Descriptor of one staged packet; payload bytes live in the staging
/// buffer until the next drain.
#[derive(Debug)]
struct RxPacket {
    frame_number: u32,
    /// Monotonic arrival tick; breaks frame-number ties so duplicates drain
    /// in capture order, and keeps the ordering total without consulting
    /// the staging offsets.
    arrival: u64,
    start: usize,
    len: usize,
}

impl Ord for RxPacket {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.frame_number, self.arrival).cmp(&(other.frame_number, other.arrival))
    }
}

impl PartialOrd for RxPacket {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for RxPacket {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for RxPacket {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Listening,
    Receiving,
}

/// Reassembly state between captures.
struct FrameController {
    staging: Vec<u8>,
    index: usize,
    heap: BoundedMinHeap<RxPacket>,
    arrival: u64,
    /// Next sequence number the output stream expects. Persists across
    /// drains so gaps straddling a buffer-full drain still get noise-filled.
    expected: Option<u32>,
    state: SessionState,
    eot_seen: bool,
    stats: RxStats,
    write_error: Option<std::io::Error>,
}

impl FrameController {
    fn new(packet_buffer_size: usize) -> Self {
        // Sized so the heap cannot fill before the byte buffer does for any
        // conformant block size; tiny short-read payloads are additionally
        // guarded by the drain-on-full-heap check below.
        let heap_capacity = packet_buffer_size / dxwifi_proto::frame::BLOCK_SIZE_MIN + 1;
        Self {
            staging: vec![0u8; packet_buffer_size],
            index: 0,
            heap: BoundedMinHeap::new(heap_capacity),
            arrival: 0,
            expected: None,
            state: SessionState::Listening,
            eot_seen: false,
            stats: RxStats::default(),
            write_error: None,
        }
    }

    fn enter_receiving(&mut self) {
        if self.state == SessionState::Listening {
            self.state = SessionState::Receiving;
        }
    }

    fn process_frame<W: Write>(&mut self, buf: &[u8], sink: &mut W) {
        self.stats.packets_processed += 1;
        tracing::trace!("captured {} bytes:\n{}", buf.len(), hexdump(buf));

        let view = match CapturedFrame::parse(buf) {
            Ok(view) => view,
            Err(err) => {
                self.stats.malformed_frames += 1;
                tracing::warn!("dropping malformed capture: {err}");
                return;
            }
        };

        match ControlFrame::classify(view.payload) {
            Some(ControlFrame::Preamble) => {
                tracing::info!("uplink established");
                self.enter_receiving();
            }
            Some(ControlFrame::Eot) => {
                tracing::info!("end-of-transmission signalled");
                self.eot_seen = true;
            }
            None => {
                self.enter_receiving();
                self.buffer_packet(&view, sink);
            }
        }
    }

    fn buffer_packet<W: Write>(&mut self, view: &CapturedFrame<'_>, sink: &mut W) {
        let size = view.payload.len();
        if size == 0 {
            return;
        }
        if size > self.staging.len() {
            tracing::warn!(
                "dropping frame {}: payload of {size} bytes exceeds the staging buffer",
                view.frame_number,
            );
            self.stats.malformed_frames += 1;
            return;
        }

        // Drain before appending whenever the next payload would overflow
        // the byte buffer, and likewise when the heap is at capacity.
        if self.index + size > self.staging.len() || self.heap.len() == self.heap.capacity() {
            self.drain(sink);
        }

        let start = self.index;
        self.staging[start..start + size].copy_from_slice(view.payload);
        let packet = RxPacket {
            frame_number: view.frame_number,
            arrival: self.arrival,
            start,
            len: size,
        };
        self.arrival += 1;

        if let Err(HeapFull(_)) = self.heap.push(packet) {
            // Unreachable by construction: the heap was just drained.
            tracing::error!("reorder heap rejected a packet after drain");
            return;
        }
        self.index += size;
        self.stats.frames_captured += 1;
        tracing::debug!("frame {}: buffered {size} bytes", view.frame_number);
    }

    /// Pop everything in ascending sequence order, noise-filling the gaps.
    fn drain<W: Write>(&mut self, sink: &mut W) {
        let mut write = |error: &mut Option<std::io::Error>, bytes: &[u8]| {
            if error.is_some() {
                return;
            }
            if let Err(err) = sink.write_all(bytes) {
                *error = Some(err);
            }
        };

        while let Some(packet) = self.heap.pop() {
            let expected = *self.expected.get_or_insert(packet.frame_number);

            if packet.frame_number > expected {
                let gap = packet.frame_number - expected;
                let noise = vec![NOISE_VALUE; packet.len];
                for _ in 0..gap {
                    write(&mut self.write_error, &noise);
                }
                self.stats.blocks_lost += gap;
                self.stats.noise_bytes_written += u64::from(gap) * packet.len as u64;
                self.stats.bytes_written += u64::from(gap) * packet.len as u64;
                tracing::warn!(
                    "noise-filled {gap} missing block(s) ahead of frame {}",
                    packet.frame_number,
                );
            }

            write(&mut self.write_error, &self.staging[packet.start..packet.start + packet.len]);
            self.stats.bytes_written += packet.len as u64;
            self.expected = Some(expected.max(packet.frame_number.saturating_add(1)));
        }
        self.index = 0;
    }
}

/// The receive session.
pub struct Receiver<L: LinkDriver> {
    driver: L,
    config: RxConfig,
    wake: WakePipe,
}

impl<L: LinkDriver> Receiver<L> {
    /// Build a session over `driver`.
    ///
    /// # Errors
    ///
    /// [`RxError::InvalidBufferSize`] when the staging buffer is outside
    /// `[PACKET_BUFFER_SIZE_MIN, PACKET_BUFFER_SIZE_MAX]`.
    pub fn new(driver: L, config: RxConfig) -> Result<Self, RxError> {
        if config.packet_buffer_size < PACKET_BUFFER_SIZE_MIN
            || config.packet_buffer_size > PACKET_BUFFER_SIZE_MAX
        {
            return Err(RxError::InvalidBufferSize {
                requested: config.packet_buffer_size,
                min: PACKET_BUFFER_SIZE_MIN,
                max: PACKET_BUFFER_SIZE_MAX,
            });
        }
        Ok(Self { driver, config, wake: WakePipe::new()? })
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

    /// Capture until EOT, timeout or stop, writing reassembled payloads to
    /// `sink`.
    ///
    /// The current dispatch batch always completes before an EOT takes
    /// effect, and buffered packets are drained on every exit path.
    ///
    /// # Errors
    ///
    /// [`RxError::NotPollable`] when the driver has no descriptor to wait
    /// on, [`RxError::Io`] when the sink fails; capture hiccups are logged
    /// and end the session without error.
    pub fn start<W: Write>(&mut self, sink: &mut W) -> Result<RxStats, RxError> {
        let mut fc = FrameController::new(self.config.packet_buffer_size);

        tracing::info!(
            "receiver settings: packet_buffer_size={} dispatch_count={} capture_timeout={:?}",
            self.config.packet_buffer_size,
            self.config.dispatch_count,
            self.config.capture_timeout,
        );
        tracing::info!("starting packet capture");
        self.wake.activate();

        while self.wake.is_active() {
            let Some(fd) = self.driver.poll_fd() else {
                self.wake.deactivate();
                return Err(RxError::NotPollable);
            };

            match wait_readable(fd, self.wake.wake_fd(), self.config.capture_timeout) {
                Ok(Readiness::TimedOut) => {
                    tracing::info!("receiver timeout");
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

            let mut handler = |buf: &[u8]| fc.process_frame(buf, sink);
            if let Err(err) = self.driver.dispatch(self.config.dispatch_count, &mut handler) {
                if self.wake.is_active() {
                    tracing::error!("dispatch failed: {err}");
                }
                break;
            }

            if let Some(err) = fc.write_error.take() {
                self.wake.deactivate();
                return Err(RxError::Io(err));
            }
            if fc.eot_seen {
                break;
            }
        }

        fc.drain(sink);
        self.wake.deactivate();
        if let Some(err) = fc.write_error.take() {
            return Err(RxError::Io(err));
        }

        let mut stats = fc.stats;
        stats.link = self.driver.stats();
        if let Some(link) = &stats.link {
            tracing::info!(
                "capture stats: received={} dropped_kernel={} dropped_driver={}",
                link.received,
                link.dropped_kernel,
                link.dropped_driver,
            );
        }
        tracing::info!(
            "session stats: frames={} blocks_lost={} bytes_written={}",
            stats.frames_captured,
            stats.blocks_lost,
            stats.bytes_written,
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use dxwifi_proto::{
        FrameControl, MacAddr, TxFrame,
        control::CONTROL_DATA_SIZE,
        frame::TX_DURATION_ID,
    };

    use super::*;
    use crate::test_link::TestLink;

    fn data_frame(frame_no: u32, payload: &[u8]) -> Vec<u8> {
        let mut frame = TxFrame::new(1024.max(payload.len() + 1)).unwrap();
        frame.write_radiotap(0x10, 1, 0x08);
        frame.write_mac(
            FrameControl::default(),
            TX_DURATION_ID,
            MacAddr::BROADCAST,
            MacAddr::DEFAULT_SENDER,
            MacAddr::BROADCAST,
        );
        frame.set_sequence(frame_no);
        frame.payload_mut()[..payload.len()].copy_from_slice(payload);
        frame.wire_frame(payload.len()).unwrap().to_vec()
    }

    fn control_frame(kind: ControlFrame) -> Vec<u8> {
        let mut frame = TxFrame::new(1024).unwrap();
        frame.write_radiotap(0x10, 1, 0x08);
        frame.write_mac(
            FrameControl::default(),
            TX_DURATION_ID,
            MacAddr::BROADCAST,
            MacAddr::DEFAULT_SENDER,
            MacAddr::BROADCAST,
        );
        let size = kind.fill(frame.payload_mut());
        assert_eq!(size, CONTROL_DATA_SIZE);
        frame.wire_frame(size).unwrap().to_vec()
    }

    fn config(buffer: usize) -> RxConfig {
        RxConfig {
            packet_buffer_size: buffer,
            capture_timeout: Some(Duration::from_millis(200)),
            ..RxConfig::default()
        }
    }

    fn capture(frames: Vec<Vec<u8>>, config: RxConfig) -> (RxStats, Vec<u8>) {
        let mut link = TestLink::new();
        for frame in frames {
            link.queue_frame(frame);
        }
        let mut rx = Receiver::new(link, config).unwrap();
        let mut out = Vec::new();
        let stats = rx.start(&mut out).unwrap();
        (stats, out)
    }

    #[test]
    fn in_order_frames_come_out_verbatim() {
        let payloads: Vec<Vec<u8>> = (0..4u8).map(|i| vec![i; 512]).collect();
        let mut frames: Vec<Vec<u8>> = vec![control_frame(ControlFrame::Preamble)];
        frames.extend(payloads.iter().enumerate().map(|(i, p)| data_frame(i as u32, p)));
        frames.push(control_frame(ControlFrame::Eot));

        let (stats, out) = capture(frames, config(DEFAULT_PACKET_BUFFER_SIZE));

        assert_eq!(stats.frames_captured, 4);
        assert_eq!(stats.blocks_lost, 0);
        assert_eq!(out, payloads.concat());
    }

    #[test]
    fn air_reordering_is_undone() {
        let payloads: Vec<Vec<u8>> = (0..8u8).map(|i| vec![i; 300]).collect();
        let mut frames = Vec::new();
        for i in [3usize, 0, 4, 1, 5, 2, 7, 6] {
            frames.push(data_frame(i as u32, &payloads[i]));
        }
        frames.push(control_frame(ControlFrame::Eot));

        let (stats, out) = capture(frames, config(DEFAULT_PACKET_BUFFER_SIZE));

        assert_eq!(stats.frames_captured, 8);
        assert_eq!(out, payloads.concat());
    }

    #[test]
    fn lost_frames_become_noise_blocks() {
        let mut frames = Vec::new();
        for (i, fill) in [(0u32, 0x11u8), (1, 0x22), (3, 0x44), (4, 0x55)] {
            frames.push(data_frame(i, &vec![fill; 512]));
        }
        frames.push(control_frame(ControlFrame::Eot));

        let (stats, out) = capture(frames, config(DEFAULT_PACKET_BUFFER_SIZE));

        assert_eq!(stats.blocks_lost, 1);
        assert_eq!(stats.noise_bytes_written, 512);
        let mut expected = Vec::new();
        expected.extend_from_slice(&[0x11; 512]);
        expected.extend_from_slice(&[0x22; 512]);
        expected.extend_from_slice(&[NOISE_VALUE; 512]);
        expected.extend_from_slice(&[0x44; 512]);
        expected.extend_from_slice(&[0x55; 512]);
        assert_eq!(out, expected);
    }

    #[test]
    fn gaps_straddling_a_forced_drain_still_noise_fill() {
        // 1 KiB staging fits three 300-byte payloads; the fourth forces a
        // drain mid-session. Frame 4 is lost; the gap crosses the drain
        // boundary and must still be paid for in noise.
        let mut frames = Vec::new();
        for i in [0u32, 1, 2, 3, 5, 6] {
            frames.push(data_frame(i, &vec![i as u8; 300]));
        }
        frames.push(control_frame(ControlFrame::Eot));

        let (stats, out) = capture(frames, config(1024));

        assert_eq!(stats.blocks_lost, 1);
        let mut expected = Vec::new();
        for i in [0u32, 1, 2, 3] {
            expected.extend_from_slice(&vec![i as u8; 300]);
        }
        expected.extend_from_slice(&[NOISE_VALUE; 300]);
        for i in [5u32, 6] {
            expected.extend_from_slice(&vec![i as u8; 300]);
        }
        assert_eq!(out, expected);
    }

    #[test]
    fn duplicate_frames_are_both_drained() {
        let frames = vec![
            data_frame(0, &[0xAB; 300]),
            data_frame(1, &[0xCD; 300]),
            data_frame(1, &[0xCE; 300]),
            control_frame(ControlFrame::Eot),
        ];

        let (stats, out) = capture(frames, config(DEFAULT_PACKET_BUFFER_SIZE));

        assert_eq!(stats.frames_captured, 3);
        assert_eq!(stats.blocks_lost, 0);
        let mut expected = Vec::new();
        expected.extend_from_slice(&[0xAB; 300]);
        expected.extend_from_slice(&[0xCD; 300]);
        expected.extend_from_slice(&[0xCE; 300]);
        assert_eq!(out, expected, "both copies, capture order");
    }

    #[test]
    fn near_sentinel_payloads_are_data() {
        // 140/200 sentinel bytes: under the threshold, so this buffers as
        // data rather than terminating the session.
        let mut payload = vec![0xAAu8; 140];
        payload.extend(std::iter::repeat_n(0x42u8, 60));

        let frames = vec![data_frame(0, &payload), control_frame(ControlFrame::Eot)];
        let (stats, out) = capture(frames, config(DEFAULT_PACKET_BUFFER_SIZE));

        assert_eq!(stats.frames_captured, 1);
        assert_eq!(out, payload);
    }

    #[test]
    fn timeout_ends_an_idle_session() {
        let (stats, out) = capture(
            vec![control_frame(ControlFrame::Preamble)],
            RxConfig {
                capture_timeout: Some(Duration::from_millis(20)),
                ..RxConfig::default()
            },
        );
        assert_eq!(stats.frames_captured, 0);
        assert_eq!(stats.packets_processed, 1);
        assert!(out.is_empty());
    }

    #[test]
    fn buffer_size_bounds_are_enforced() {
        assert!(Receiver::new(TestLink::new(), config(PACKET_BUFFER_SIZE_MIN - 1)).is_err());
        assert!(Receiver::new(TestLink::new(), config(PACKET_BUFFER_SIZE_MAX + 1)).is_err());
        assert!(Receiver::new(TestLink::new(), config(PACKET_BUFFER_SIZE_MIN)).is_ok());
    }

    #[test]
    fn malformed_captures_are_counted_and_skipped() {
        let frames = vec![
            vec![0u8; 3], // shorter than a radiotap base header
            data_frame(0, &[0x77; 300]),
            control_frame(ControlFrame::Eot),
        ];
        let (stats, out) = capture(frames, config(DEFAULT_PACKET_BUFFER_SIZE));
        assert_eq!(stats.malformed_frames, 1);
        assert_eq!(stats.frames_captured, 1);
        assert_eq!(out, vec![0x77; 300]);
    }
}

