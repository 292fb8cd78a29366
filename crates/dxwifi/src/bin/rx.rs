//! DxWiFi receiver.
//!
//! Captures frames matching a BPF program on a monitor-mode interface,
//! reorders them by sequence number and writes the reassembled byte stream
//! to a file or stdout, noise-filling any blocks the air lost.

use std::{fs::OpenOptions, io::Write, path::PathBuf};

use clap::Parser;

use dxwifi::{init_logging, timeout_from_secs};
use dxwifi_core::{
    PcapLink, PcapLinkConfig, Receiver, RxConfig,
    link::pcap::SNAPLEN_MAX,
    receiver::{DEFAULT_DISPATCH_COUNT, DEFAULT_PACKET_BUFFER_SIZE},
};

/// Capture frames matching a BPF program and write their payloads out.
#[derive(Parser, Debug)]
#[command(name = "rx", version, about)]
struct Args {
    /// Interface to listen on; must be in monitor mode.
    #[arg(short, long, default_value = "mon0")]
    dev: String,

    /// Seconds to wait for a packet before giving up; <= 0 waits forever.
    #[arg(short, long, default_value_t = -1)]
    timeout: i64,

    /// Packets to process per dispatch batch.
    #[arg(short = 'c', long = "dispatch-count", default_value_t = DEFAULT_DISPATCH_COUNT)]
    dispatch_count: usize,

    /// Bytes of in-memory reorder staging, in [1 KiB, 1 MiB].
    #[arg(long = "buffer-size", default_value_t = DEFAULT_PACKET_BUFFER_SIZE)]
    buffer_size: usize,

    /// Open the output file in append mode.
    #[arg(short, long)]
    append: bool,

    /// Capture snapshot length in bytes.
    #[arg(short, long, default_value_t = SNAPLEN_MAX)]
    snaplen: i32,

    /// Driver packet buffer timeout, milliseconds.
    #[arg(short = 'b', long = "buffer-timeout", default_value_t = 20)]
    buffer_timeout: i32,

    /// Berkeley Packet Filter expression.
    #[arg(short, long, default_value = "wlan addr2 aa:aa:aa:aa:aa:aa")]
    filter: String,

    /// Do not optimise the compiled BPF program.
    #[arg(short = 'o', long = "no-optimize")]
    no_optimize: bool,

    /// Increase verbosity; repeatable.
    #[arg(short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Output file; stdout when omitted.
    output: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(args.verbose);

    let link = PcapLink::open_monitor(&PcapLinkConfig {
        device: args.dev.clone(),
        snaplen: args.snaplen,
        buffer_timeout_ms: args.buffer_timeout,
        filter: Some(args.filter.clone()),
        optimize: !args.no_optimize,
    })?;
    tracing::info!("capturing on {} ({})", args.dev, link.datalink_description());

    let config = RxConfig {
        dispatch_count: args.dispatch_count,
        capture_timeout: timeout_from_secs(args.timeout),
        packet_buffer_size: args.buffer_size,
    };
    let mut rx = Receiver::new(link, config)?;

    let stop = rx.stop_handle();
    ctrlc::set_handler(move || stop.stop()).ok();

    match &args.output {
        Some(path) => {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .append(args.append)
                .truncate(!args.append)
                .open(path)?;
            rx.start(&mut file)?;
            file.flush()?;
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            rx.start(&mut stdout)?;
            stdout.flush()?;
        }
    }

    Ok(())
}
