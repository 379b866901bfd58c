use std::io;

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Map the `-v` count to a level: warn by default, then info, debug, trace.
pub fn level_for_verbosity(verbose: u8) -> Level {
    match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Install the stderr subscriber. `RUST_LOG` overrides the verbosity flag.
pub fn init_logging(verbose: u8) {
    let filter = build_env_filter(level_for_verbosity(verbose));
    let layer = fmt::layer()
        .compact()
        .with_writer(io::stderr)
        .with_target(false)
        .without_time();

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .init();
}

fn build_env_filter(level: Level) -> EnvFilter {
    let level_str = level.as_str().to_lowercase();

    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        // Dependencies stay at warn
        EnvFilter::new(format!(
            "warn,wellcat={level},wellcat_core={level}",
            level = level_str
        ))
    })
}
