//! # Diagnostics
//!
//! Storage queries print their results as JSON on stdout, so every log line
//! goes to stderr. The filter is scoped to this binary and the
//! `nova_storage` library; `-v` raises the level one step per flag, and
//! `RUST_LOG` replaces the whole filter when set.

use clap::ValueEnum;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Crate that runs the queries. Its decode warnings show up at the default level.
const LIBRARY_TARGET: &str = "nova_storage";

/// Shape of the lines written to stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    Pretty,
    /// One JSON object per event, fields flattened.
    Json,
}

/// Level name for a `-v` count.
fn level_name(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Filter directives used when `RUST_LOG` is unset.
pub fn default_directives(verbosity: u8) -> String {
    let level = level_name(verbosity);
    let binary = env!("CARGO_CRATE_NAME");
    if binary == LIBRARY_TARGET {
        format!("{}={}", binary, level)
    } else {
        format!("{}={},{}={}", binary, level, LIBRARY_TARGET, level)
    }
}

/// Installs the global subscriber. Must run once, before any query starts.
pub fn init_logging(verbosity: u8, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbosity)));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(verbosity > 1),
            )
            .init(),
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_writer(std::io::stderr),
            )
            .init(),
    }

    tracing::debug!(?format, verbosity, "diagnostics on stderr");
}
