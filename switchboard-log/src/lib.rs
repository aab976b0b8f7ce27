//! Switchboard Logging Setup
//!
//! Installs a `tracing` subscriber configured from `SWITCHBOARD_*`
//! environment variables, so the warnings the event bus emits for skipped
//! or degraded handlers end up somewhere useful.
//!
//! # Usage
//!
//! ```rust,no_run
//! // Reads the environment once and installs a global subscriber.
//! switchboard_log::init();
//!
//! tracing::info!("Bus ready");
//! ```
//!
//! # Environment Variables
//!
//! - `SWITCHBOARD_DEBUG=1` - Enable debug logging
//! - `SWITCHBOARD_LOG_LEVEL=trace|debug|info|warn|error|off` - Set log level
//! - `SWITCHBOARD_LOG_FORMAT=pretty|compact|json` - Set output format
//! - `SWITCHBOARD_LOG_COLOR=1|0` - Enable/disable colors
//! - `SWITCHBOARD_LOG_TIMESTAMPS=1|0` - Include timestamps
//! - `SWITCHBOARD_LOG_MODULE=1|0` - Include the module path (target)
//!
//! `RUST_LOG`, when set, takes precedence over the level variables.

use once_cell::sync::Lazy;
use std::env;
use std::str::FromStr;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

// ============================================================================
// Log Levels
// ============================================================================

/// Minimum severity that reaches the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    /// Nothing is logged
    Off,
}

impl Level {
    /// Directive understood by `EnvFilter`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Off => "off",
        }
    }
}

impl FromStr for Level {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            Level::Trace,
            Level::Debug,
            Level::Info,
            Level::Warn,
            Level::Error,
            Level::Off,
        ]
        .into_iter()
        .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()))
        .or_else(|| match s.trim().to_lowercase().as_str() {
            "warning" => Some(Level::Warn),
            "none" => Some(Level::Off),
            _ => None,
        })
        .ok_or_else(|| LogError::UnknownLevel(s.to_string()))
    }
}

impl From<Level> for LevelFilter {
    fn from(level: Level) -> Self {
        match level {
            Level::Trace => LevelFilter::TRACE,
            Level::Debug => LevelFilter::DEBUG,
            Level::Info => LevelFilter::INFO,
            Level::Warn => LevelFilter::WARN,
            Level::Error => LevelFilter::ERROR,
            Level::Off => LevelFilter::OFF,
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Log Format
// ============================================================================

/// Shape of each emitted line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Multi-line, human readable
    Pretty,
    /// One line per event
    Compact,
    /// One JSON object per event
    Json,
}

impl FromStr for Format {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pretty" => Ok(Format::Pretty),
            "compact" => Ok(Format::Compact),
            "json" => Ok(Format::Json),
            other => Err(LogError::UnknownFormat(other.to_string())),
        }
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Global configuration (lazy initialized).
static CONFIG: Lazy<LogConfig> = Lazy::new(LogConfig::from_env);

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Whether debug mode is enabled
    pub debug: bool,
    /// Minimum log level
    pub level: Level,
    /// Output format
    pub format: Format,
    /// Whether colors are enabled
    pub color: bool,
    /// Whether to include timestamps
    pub timestamps: bool,
    /// Whether to include module path
    pub module_path: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            debug: false,
            level: Level::Info,
            format: Format::Compact,
            color: false,
            timestamps: true,
            module_path: true,
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl LogConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Create config from an arbitrary variable source.
    ///
    /// Unset or unparseable values keep their defaults. `SWITCHBOARD_DEBUG`
    /// only changes the level when `SWITCHBOARD_LOG_LEVEL` is not given.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let flag = |name: &str| lookup(name).and_then(|v| parse_flag(&v));

        let debug = flag("SWITCHBOARD_DEBUG").unwrap_or(defaults.debug);

        let level = lookup("SWITCHBOARD_LOG_LEVEL")
            .and_then(|s| s.parse().ok())
            .unwrap_or(if debug { Level::Debug } else { defaults.level });

        let format = lookup("SWITCHBOARD_LOG_FORMAT")
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.format);

        let color = flag("SWITCHBOARD_LOG_COLOR")
            .unwrap_or_else(|| lookup("NO_COLOR").is_none() && lookup("TERM").is_some());

        Self {
            debug,
            level,
            format,
            color,
            timestamps: flag("SWITCHBOARD_LOG_TIMESTAMPS").unwrap_or(defaults.timestamps),
            module_path: flag("SWITCHBOARD_LOG_MODULE").unwrap_or(defaults.module_path),
        }
    }

    /// Filter directive for this configuration.
    ///
    /// Debug mode lowers the level to at least `debug`.
    pub fn directive(&self) -> &'static str {
        self.effective_level().as_str()
    }

    /// Level after applying debug mode.
    pub fn effective_level(&self) -> Level {
        if self.debug {
            self.level.min(Level::Debug)
        } else {
            self.level
        }
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::builder()
                .with_default_directive(LevelFilter::from(self.effective_level()).into())
                .parse_lossy("")
        })
    }

    fn layer(&self) -> Box<dyn Layer<Registry> + Send + Sync> {
        let base = fmt::layer()
            .with_ansi(self.color && self.format != Format::Json)
            .with_target(self.module_path);

        match (self.format, self.timestamps) {
            (Format::Json, true) => base.json().boxed(),
            (Format::Json, false) => base.json().without_time().boxed(),
            (Format::Pretty, true) => base.pretty().boxed(),
            (Format::Pretty, false) => base.pretty().without_time().boxed(),
            (Format::Compact, true) => base.compact().boxed(),
            (Format::Compact, false) => base.compact().without_time().boxed(),
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Logging setup errors
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("Unknown log level: {0}")]
    UnknownLevel(String),

    #[error("Unknown log format: {0}")]
    UnknownFormat(String),

    #[error("A global subscriber is already installed: {0}")]
    AlreadyInitialized(#[from] tracing_subscriber::util::TryInitError),
}

// ============================================================================
// Public API
// ============================================================================

/// Get the global configuration.
pub fn config() -> &'static LogConfig {
    &CONFIG
}

/// Initialize logging from the environment.
///
/// Safe to call more than once; only the first successful call installs
/// a subscriber.
pub fn init() {
    let _ = try_init(config());
}

/// Install a global subscriber for the given configuration.
pub fn try_init(config: &LogConfig) -> Result<(), LogError> {
    tracing_subscriber::registry()
        .with(config.layer().with_filter(config.filter()))
        .try_init()?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
