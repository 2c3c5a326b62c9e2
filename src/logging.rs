//! Logging setup using `tracing` and `tracing-subscriber`.
//!
//! Progress lines (start marker, one line per file, completion marker) are
//! emitted at `info`. Logs go to stderr so stdout stays free for `--json`.

use std::io::IsTerminal;

use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: Level,
    /// Whether to use ANSI colors in output. Off when stderr is not a terminal.
    pub with_ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { level: Level::INFO, with_ansi: std::io::stderr().is_terminal() }
    }
}

impl LogConfig {
    /// - `quiet`: errors only
    /// - 0: info
    /// - 1 (`-v`): debug
    /// - 2+ (`-vv`): trace
    pub fn from_verbosity(verbosity: u8, quiet: bool) -> Self {
        let level = if quiet {
            Level::ERROR
        } else {
            match verbosity {
                0 => Level::INFO,
                1 => Level::DEBUG,
                _ => Level::TRACE,
            }
        };
        Self { level, ..Default::default() }
    }
}

/// `RUST_LOG` wins over the CLI verbosity when it is set.
fn build_env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("metapack={}", level.as_str().to_lowercase())))
}

/// Installs the global subscriber. Calling it twice is harmless; the second
/// call is ignored.
pub fn init(config: &LogConfig) {
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(config.with_ansi)
        .with_target(false)
        .without_time();

    let _ = tracing_subscriber::registry()
        .with(build_env_filter(config.level))
        .with(layer)
        .try_init();
}
