//! DxWiFi FEC decoder.
//!
//! Reads a (possibly lossy, possibly noise-padded) FEC-encoded buffer,
//! locates the symbol framing by OTI CRC scan and rebuilds the original
//! message from whatever symbols survived.

use std::{
    fs::File,
    io::{Read, Write},
    path::PathBuf,
};

use clap::Parser;

use dxwifi::init_logging;
use dxwifi_fec::FecDecoder;

/// Recover a message from its FEC-encoded, possibly degraded form.
#[derive(Parser, Debug)]
#[command(name = "decode", version, about)]
struct Args {
    /// The encoder used the inner Reed-Solomon byte-repair layer.
    #[arg(long)]
    rs: bool,

    /// Output file; stdout when omitted.
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Increase verbosity; repeatable.
    #[arg(short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Input file; stdin when omitted.
    input: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut encoded = Vec::new();
    match &args.input {
        Some(path) => {
            File::open(path)?.read_to_end(&mut encoded)?;
        }
        None => {
            std::io::stdin().read_to_end(&mut encoded)?;
        }
    }

    let decoded = FecDecoder::new(args.rs).decode(&encoded)?;
    tracing::info!("recovered {} bytes from {} encoded", decoded.len(), encoded.len());

    match &args.out {
        Some(path) => File::create(path)?.write_all(&decoded)?,
        None => std::io::stdout().lock().write_all(&decoded)?,
    }
    Ok(())
}
