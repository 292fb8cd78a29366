//! Shared plumbing for the DxWiFi binaries.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the tracing subscriber.
///
/// `verbosity` is the number of `-v` occurrences: 0 warns, 1 informs, 2
/// debugs, 3 or more traces (frame hexdumps live at trace). `RUST_LOG`
/// overrides the flag entirely. Logs go to stderr — stdout may be carrying
/// the payload stream.
pub fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Map a signed seconds flag to a timeout: zero or negative waits forever.
#[must_use]
pub fn timeout_from_secs(secs: i64) -> Option<std::time::Duration> {
    (secs > 0).then(|| std::time::Duration::from_secs(secs as u64))
}
