//! Tracing subscriber setup for the command-line embedding.
//!
//! The library only emits `tracing` events; installing a subscriber is left to
//! the binary. Logs go to stderr so stdout stays parseable (`--format json`,
//! `--progress`). `RUST_LOG` takes precedence over the requested level, e.g.
//! `RUST_LOG=mmc_sim::engine=trace` prints every processed event.

use tracing_subscriber::{filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("{}={}", env!("CARGO_CRATE_NAME"), level)))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true),
        )
        .with(filter)
        .try_init();
}
