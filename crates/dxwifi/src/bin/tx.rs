//! DxWiFi transmitter.
//!
//! Reads bytes from a file (or stdin) and injects them as 802.11 data
//! frames over a monitor-mode interface, bracketed by preamble and EOT
//! control frames.

use std::{fs::File, io::Read, os::fd::AsFd, path::PathBuf};

use clap::Parser;

use dxwifi::{init_logging, timeout_from_secs};
use dxwifi_core::{
    LinkDriver, PcapLink, PcapLinkConfig, Transmitter, TxConfig, TxStats,
    link::pcap::SNAPLEN_MAX,
};
use dxwifi_proto::{
    MacAddr,
    frame::DEFAULT_BLOCK_SIZE,
    ieee80211::{rtap_flags, tx_flags},
};

/// Read bytes from a file and inject them over a monitor-mode interface.
#[derive(Parser, Debug)]
#[command(name = "tx", version, about)]
struct Args {
    /// Interface to inject packets onto; must be in monitor mode.
    #[arg(short, long, default_value = "mon0")]
    dev: String,

    /// Payload bytes per frame, in (256, 1400].
    #[arg(short, long, default_value_t = DEFAULT_BLOCK_SIZE)]
    blocksize: usize,

    /// Seconds to wait for input before giving up; <= 0 waits forever.
    #[arg(short, long, default_value_t = -1)]
    timeout: i64,

    /// Radiotap data rate, Mbps.
    #[arg(short, long, default_value_t = 1)]
    rate: u8,

    /// Frame is sent during the contention-free period.
    #[arg(long)]
    cfp: bool,

    /// Frame is sent with a short preamble.
    #[arg(long = "short-preamble")]
    short_preamble: bool,

    /// Frame is sent with WEP encryption.
    #[arg(long)]
    wep: bool,

    /// Frame is sent with fragmentation.
    #[arg(long)]
    frag: bool,

    /// Frame does not include an FCS.
    #[arg(long)]
    nofcs: bool,

    /// Transmission expects an ACK frame.
    #[arg(long)]
    ack: bool,

    /// Transmission carries a preconfigured sequence number.
    #[arg(long)]
    sequence: bool,

    /// Transmission must not be reordered.
    #[arg(long)]
    ordered: bool,

    /// MAC address slot 1 (destination).
    #[arg(long, default_value = "ff:ff:ff:ff:ff:ff")]
    addr1: MacAddr,

    /// MAC address slot 2 (the default receive filter matches this).
    #[arg(long, default_value = "aa:aa:aa:aa:aa:aa")]
    addr2: MacAddr,

    /// MAC address slot 3.
    #[arg(long, default_value = "ff:ff:ff:ff:ff:ff")]
    addr3: MacAddr,

    /// Increase verbosity; repeatable.
    #[arg(short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Input file; stdin when omitted.
    input: Option<PathBuf>,
}

impl Args {
    fn rtap_flags(&self) -> u8 {
        let mut flags = rtap_flags::FCS;
        if self.nofcs {
            flags &= !rtap_flags::FCS;
        }
        if self.cfp {
            flags |= rtap_flags::CFP;
        }
        if self.short_preamble {
            flags |= rtap_flags::SHORTPRE;
        }
        if self.wep {
            flags |= rtap_flags::WEP;
        }
        if self.frag {
            flags |= rtap_flags::FRAG;
        }
        flags
    }

    fn rtap_tx_flags(&self) -> u16 {
        let mut flags = tx_flags::NOACK;
        if self.ack {
            flags &= !tx_flags::NOACK;
        }
        if self.sequence {
            flags |= tx_flags::NOSEQNO;
        }
        if self.ordered {
            flags |= tx_flags::ORDER;
        }
        flags
    }
}

fn transmit<L: LinkDriver, R: Read + AsFd>(
    tx: &mut Transmitter<L>,
    input: &mut R,
) -> Result<TxStats, dxwifi_core::TxError> {
    let stop = tx.stop_handle();
    ctrlc::set_handler(move || stop.stop()).ok();
    tx.start(input)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(args.verbose);

    if args.addr1.octets()[0] == 0 && args.addr1.octets()[1] == 0 {
        tracing::warn!(
            "addr1 prefix is zero; some adapters retransmit such frames and the \
             default receive filter will not match",
        );
    }

    let link = PcapLink::open_monitor(&PcapLinkConfig {
        device: args.dev.clone(),
        snaplen: SNAPLEN_MAX,
        buffer_timeout_ms: 20,
        filter: None,
        optimize: true,
    })?;

    let config = TxConfig {
        block_size: args.blocksize,
        transmit_timeout: timeout_from_secs(args.timeout),
        rtap_flags: args.rtap_flags(),
        rtap_rate_mbps: args.rate,
        rtap_tx_flags: args.rtap_tx_flags(),
        addr1: args.addr1,
        addr2: args.addr2,
        addr3: args.addr3,
        ..TxConfig::default()
    };
    let mut tx = Transmitter::new(link, config)?;

    tracing::info!("transmitting on {}", args.dev);
    match &args.input {
        Some(path) => {
            let mut file = File::open(path)?;
            transmit(&mut tx, &mut file)?;
        }
        None => {
            let mut stdin = std::io::stdin();
            transmit(&mut tx, &mut stdin)?;
        }
    }

    Ok(())
}
