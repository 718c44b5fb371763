//! Tracing subscriber setup
//!
//! The library only emits `tracing` events. Binaries (and tests that want
//! output) install a subscriber here; the filter comes from `RUST_LOG` and
//! falls back to `info`.

use std::str::FromStr;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::TestWriter;
use tracing_subscriber::EnvFilter;

/// Output format for log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human readable
    #[default]
    Plain,
    /// One JSON object per line
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "plain" | "text" => Ok(Self::Plain),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format {other:?}, expected plain or json")),
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber, writing to stderr
///
/// Returns `false` if a subscriber was already installed.
pub fn init_tracing(format: LogFormat) -> bool {
    install(format, BoxMakeWriter::new(std::io::stderr))
}

/// Install the global subscriber behind the test harness output capture
///
/// Lines only show up for failing tests (or with `--nocapture`).
pub fn init_test_tracing(format: LogFormat) -> bool {
    install(format, BoxMakeWriter::new(TestWriter::new()))
}

fn install(format: LogFormat, writer: BoxMakeWriter) -> bool {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(writer)
        .with_target(false);
    let installed = match format {
        LogFormat::Plain => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.is_ok()
}
