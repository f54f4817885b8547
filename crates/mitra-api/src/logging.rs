//! Tracing subscriber setup for the `mitra` binary.
//!
//! Log lines go to stderr so they never interleave with chat output on
//! stdout. `RUST_LOG`, when set, wins over the verbosity flags.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Default filter directive for the given verbosity flags.
pub fn filter_directive(verbose: u8, quiet: bool) -> &'static str {
    match verbose {
        0 if quiet => "error",
        0 => "warn",
        1 => "info,mitra_core=debug,mitra_infra=debug,mitra_api=debug",
        _ => "trace",
    }
}

/// Install the global subscriber. Plain text, or one JSON object per line.
pub fn init(verbose: u8, quiet: bool, json: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(verbose, quiet)));

    let registry = tracing_subscriber::registry().with(env_filter);

    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}
