//! libpcap-backed link driver.
//!
//! Opens the interface live, pins the datalink to 802.11-plus-radiotap,
//! installs the BPF program and runs nonblocking so the session loop owns
//! all waiting via `poll(2)`.

use std::os::fd::{AsRawFd, BorrowedFd};

use pcap::{Active, Capture, Linktype};

use super::{LinkDriver, LinkError, LinkStats};

/// Maximum bytes captured per frame when the caller does not care.
pub const SNAPLEN_MAX: i32 = 65_535;

/// Parameters for opening a capture handle.
#[derive(Debug, Clone)]
pub struct PcapLinkConfig {
    /// Monitor-mode interface name.
    pub device: String,
    /// Snapshot length in bytes.
    pub snaplen: i32,
    /// Driver buffer flush timeout, milliseconds.
    pub buffer_timeout_ms: i32,
    /// BPF program to install, if any.
    pub filter: Option<String>,
    /// Ask the BPF compiler to optimise the program.
    pub optimize: bool,
}

impl Default for PcapLinkConfig {
    fn default() -> Self {
        Self {
            device: "mon0".to_owned(),
            snaplen: SNAPLEN_MAX,
            buffer_timeout_ms: 20,
            filter: None,
            optimize: true,
        }
    }
}

/// A live libpcap capture/injection handle.
pub struct PcapLink {
    capture: Capture<Active>,
}

impl PcapLink {
    /// Open `config.device` for monitor-mode capture and injection.
    ///
    /// # Errors
    ///
    /// [`LinkError::OpenFailed`] when the device refuses, and
    /// [`LinkError::FilterInvalid`] when the BPF program does not compile or
    /// install.
    pub fn open_monitor(config: &PcapLinkConfig) -> Result<Self, LinkError> {
        let open_failed = |reason: String| LinkError::OpenFailed {
            device: config.device.clone(),
            reason,
        };

        let capture = Capture::from_device(config.device.as_str())
            .map_err(|e| open_failed(e.to_string()))?
            .promisc(true)
            .snaplen(config.snaplen)
            .timeout(config.buffer_timeout_ms)
            .open()
            .map_err(|e| open_failed(e.to_string()))?;

        let mut capture = capture
            .setnonblock()
            .map_err(|e| open_failed(e.to_string()))?;

        capture
            .set_datalink(Linktype::IEEE802_11_RADIOTAP)
            .map_err(|e| open_failed(e.to_string()))?;

        if let Some(filter) = &config.filter {
            capture
                .filter(filter, config.optimize)
                .map_err(|e| LinkError::FilterInvalid {
                    filter: filter.clone(),
                    reason: e.to_string(),
                })?;
        }

        Ok(Self { capture })
    }

    /// Description of the datalink pcap settled on, for the activation log.
    #[must_use]
    pub fn datalink_description(&self) -> String {
        self.capture.get_datalink().get_description().unwrap_or_else(|_| "unknown".to_owned())
    }
}

impl LinkDriver for PcapLink {
    fn inject(&mut self, frame: &[u8]) -> Result<usize, LinkError> {
        self.capture
            .sendpacket(frame)
            .map_err(|e| LinkError::InjectFailed(e.to_string()))?;
        Ok(frame.len())
    }

    fn dispatch(
        &mut self,
        max_frames: usize,
        handler: &mut dyn FnMut(&[u8]),
    ) -> Result<usize, LinkError> {
        let mut delivered = 0;
        while delivered < max_frames {
            match self.capture.next_packet() {
                Ok(packet) => {
                    handler(packet.data);
                    delivered += 1;
                }
                // Nonblocking handle with nothing buffered.
                Err(pcap::Error::TimeoutExpired) | Err(pcap::Error::NoMorePackets) => break,
                Err(e) => return Err(LinkError::CaptureFailed(e.to_string())),
            }
        }
        Ok(delivered)
    }

    #[allow(unsafe_code)]
    fn poll_fd(&self) -> Option<BorrowedFd<'_>> {
        let fd = self.capture.as_raw_fd();
        // SAFETY: the descriptor belongs to the live capture handle, which
        // outlives the returned borrow by construction.
        (fd >= 0).then(|| unsafe { BorrowedFd::borrow_raw(fd) })
    }

    fn stats(&mut self) -> Option<LinkStats> {
        self.capture.stats().ok().map(|s| LinkStats {
            received: s.received,
            dropped_kernel: s.dropped,
            dropped_driver: s.if_dropped,
        })
    }
}
