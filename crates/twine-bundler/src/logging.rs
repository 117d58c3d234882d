//! Subscriber setup for applications embedding twine.
//!
//! Only compiled with the `logging` feature. Without it the bundler emits
//! `tracing` events and leaves subscriber installation to the caller: a
//! `debug!` per crawl wave and per generated module (with its requests and
//! dependency keys), `warn!` for cache problems and an `info!` per build.

use std::fmt;
use std::str::FromStr;
use std::sync::Once;

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt as layer_fmt, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Verbosity of twine's log output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Silent,
    Error,
    Warn,
    /// Build summaries.
    #[default]
    Info,
    /// Per-module generation and resolution events.
    Debug,
}

impl LogLevel {
    fn level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Silent => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Silent => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "silent" | "off" => Ok(LogLevel::Silent),
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" | "trace" => Ok(LogLevel::Debug),
            other => Err(format!("Invalid log level: {}", other)),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Install a global subscriber at `level`. `RUST_LOG` directives are layered
/// on top. Only the first call in a process has any effect.
///
/// ```rust,no_run
/// use twine_bundler::logging::{LogLevel, init_logging};
///
/// init_logging(LogLevel::Debug);
/// ```
pub fn init_logging(level: LogLevel) {
    install(|| {
        EnvFilter::builder()
            .with_default_directive(level.level_filter().into())
            .from_env_lossy()
    });
}

/// Install a global subscriber configured by `RUST_LOG` alone, at `info`
/// when it is unset or invalid.
pub fn init_logging_from_env() {
    install(|| {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::default().add_directive(LevelFilter::INFO.into()))
    });
}

fn install(filter: impl FnOnce() -> EnvFilter) {
    INIT.call_once(|| {
        tracing_subscriber::registry()
            .with(filter())
            .with(layer_fmt::layer().compact().with_target(false).without_time())
            .init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_level_names() {
        for (name, level) in [
            ("silent", LogLevel::Silent),
            ("OFF", LogLevel::Silent),
            ("error", LogLevel::Error),
            ("warning", LogLevel::Warn),
            ("Info", LogLevel::Info),
            ("trace", LogLevel::Debug),
        ] {
            assert_eq!(name.parse::<LogLevel>().unwrap(), level, "{name}");
        }
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn displays_as_filter_directive() {
        assert_eq!(LogLevel::default().to_string(), "info");
        assert_eq!(LogLevel::Debug.to_string(), "debug");
        assert_eq!(LogLevel::Silent.to_string(), "off");
    }
}
