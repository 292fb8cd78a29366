//! DxWiFi FEC encoder.
//!
//! Reads a whole message from a file (or stdin) and writes its FEC-encoded
//! form: `n` self-describing symbols, each behind a 16-byte OTI record.

use std::{
    fs::File,
    io::{Read, Write},
    path::PathBuf,
};

use clap::Parser;

use dxwifi::init_logging;
use dxwifi_fec::{FecConfig, FecEncoder};

/// FEC-encode a file for transmission over a lossy one-way link.
#[derive(Parser, Debug)]
#[command(name = "encode", version, about)]
struct Args {
    /// Target code rate k/n; lower means more redundancy.
    #[arg(long, default_value_t = 0.667)]
    coderate: f32,

    /// Add the inner Reed-Solomon byte-repair layer to every symbol.
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

    let mut message = Vec::new();
    match &args.input {
        Some(path) => {
            File::open(path)?.read_to_end(&mut message)?;
        }
        None => {
            std::io::stdin().read_to_end(&mut message)?;
        }
    }

    let config = FecConfig { code_rate: args.coderate, rs_protection: args.rs };
    let encoder = FecEncoder::new(message.len(), config)?;
    tracing::info!(
        "encoding {} bytes: k={} n={} symbol_size={}",
        message.len(),
        encoder.params().k,
        encoder.params().n(),
        encoder.params().symbol_size,
    );
    let encoded = encoder.encode(&message)?;

    match &args.out {
        Some(path) => File::create(path)?.write_all(&encoded)?,
        None => std::io::stdout().lock().write_all(&encoded)?,
    }
    Ok(())
}
