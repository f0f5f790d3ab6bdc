//! Medi Logging
//!
//! The mediator never writes diagnostics on its own. It talks to an injected
//! [`Logger`] collaborator that exposes two methods, `info` and `warn`, and
//! this crate provides the implementations a host usually wants.
//!
//! # Loggers
//!
//! - [`NoopLogger`] - discards everything (used while logging is disabled)
//! - [`ConsoleLogger`] - console-style lines on stderr (pretty, compact or JSON)
//! - [`MemoryLogger`] - keeps every line in memory, handy in tests
//! - [`FacadeLogger`] - forwards to the `log` crate facade
//! - `TracingLogger` - forwards to `tracing` (requires the `tracing` feature)
//!
//! # Usage
//!
//! ```rust
//! use medi_log::{info, warn, Level, MemoryLogger};
//!
//! let logger = MemoryLogger::new();
//!
//! info!(logger, "Emitting event: \"{}\"", "orders");
//! warn!(logger, "No handlers for channel \"{}\"", "audit");
//!
//! assert_eq!(logger.len(), 2);
//! assert!(logger.contains(Level::Warn, "audit"));
//! ```
//!
//! # Environment Variables
//!
//! Read once by [`config()`] and used by [`ConsoleLogger::new`]:
//!
//! - `MEDI_LOG_LEVEL=info|warn|off` - Set the minimum level
//! - `MEDI_LOG_FORMAT=pretty|json|compact` - Set output format
//! - `MEDI_LOG_COLOR=1|0` - Enable/disable colors
//! - `MEDI_LOG_TIMESTAMPS=1|0` - Enable/disable timestamps

use once_cell::sync::Lazy;
use std::env;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

// ============================================================================
// Log Levels
// ============================================================================

/// Severity of a mediator log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Level {
    /// Informational (dispatch traces)
    Info = 0,
    /// Warning (advisory diagnostics such as missing subscribers)
    Warn = 1,
    /// Off (no logging)
    Off = 2,
}

impl Level {
    /// Get level from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "info" => Some(Level::Info),
            "warn" | "warning" => Some(Level::Warn),
            "off" | "none" => Some(Level::Off),
            _ => None,
        }
    }

    /// Get level name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Off => "OFF",
        }
    }

    /// Get colored level name (if color feature enabled).
    #[cfg(feature = "color")]
    pub fn colored(&self) -> colored::ColoredString {
        use colored::Colorize;
        match self {
            Level::Info => "INFO".green(),
            Level::Warn => "WARN".yellow(),
            Level::Off => "OFF".white(),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Log Format
// ============================================================================

/// Output format for console lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Pretty format with colors (default for TTY)
    Pretty,
    /// Compact single-line format
    Compact,
    /// JSON format for structured logging
    Json,
}

impl Format {
    /// Get format from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pretty" => Some(Format::Pretty),
            "compact" => Some(Format::Compact),
            "json" => Some(Format::Json),
            _ => None,
        }
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Global configuration (lazy initialized from the environment).
static CONFIG: Lazy<LogConfig> = Lazy::new(LogConfig::from_env);

/// Console logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Minimum level that gets written
    pub level: Level,
    /// Output format
    pub format: Format,
    /// Whether colors are enabled
    pub color: bool,
    /// Whether to include timestamps
    pub timestamps: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::Info,
            format: Format::Json,
            color: false, // JSON output doesn't use colors
            timestamps: true,
        }
    }
}

impl LogConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let level = env::var("MEDI_LOG_LEVEL")
            .ok()
            .and_then(|s| Level::from_str(&s))
            .unwrap_or(Level::Info);

        let format = env::var("MEDI_LOG_FORMAT")
            .ok()
            .and_then(|s| Format::from_str(&s))
            .unwrap_or(Format::Json);

        Self {
            level,
            format,
            color: env_flag("MEDI_LOG_COLOR").unwrap_or_else(color_supported),
            timestamps: env_flag("MEDI_LOG_TIMESTAMPS").unwrap_or(true),
        }
    }

    /// Whether a line at `level` passes this configuration.
    #[inline]
    pub fn is_enabled(&self, level: Level) -> bool {
        level != Level::Off && level >= self.level
    }
}

fn env_flag(key: &str) -> Option<bool> {
    env::var(key).ok().and_then(|v| parse_flag(&v))
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Simple check - assume color if not explicitly disabled.
fn color_supported() -> bool {
    env::var("NO_COLOR").is_err() && env::var("TERM").is_ok()
}

/// Get the global configuration.
pub fn config() -> &'static LogConfig {
    &CONFIG
}

// ============================================================================
// Logger Collaborator
// ============================================================================

/// Console-like collaborator the mediator reports through.
///
/// Messages arrive pre-formatted as [`fmt::Arguments`], so an implementation
/// that drops them never pays for rendering the payload.
pub trait Logger: Send + Sync {
    /// Informational line.
    fn info(&self, args: fmt::Arguments<'_>);

    /// Warning line.
    fn warn(&self, args: fmt::Arguments<'_>);
}

impl<L: Logger + ?Sized> Logger for Arc<L> {
    fn info(&self, args: fmt::Arguments<'_>) {
        (**self).info(args)
    }

    fn warn(&self, args: fmt::Arguments<'_>) {
        (**self).warn(args)
    }
}

/// Logger that discards every line.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl Logger for NoopLogger {
    fn info(&self, _args: fmt::Arguments<'_>) {}

    fn warn(&self, _args: fmt::Arguments<'_>) {}
}

// ============================================================================
// Console Output
// ============================================================================

/// Writes lines to stderr the way a browser console would, in the configured
/// [`Format`].
#[derive(Debug, Clone)]
pub struct ConsoleLogger {
    config: LogConfig,
    target: String,
}

impl ConsoleLogger {
    /// Console logger using the global (environment) configuration.
    pub fn new() -> Self {
        Self::with_config(config().clone())
    }

    /// Console logger with an explicit configuration.
    pub fn with_config(config: LogConfig) -> Self {
        Self {
            config,
            target: "medi".to_string(),
        }
    }

    /// Override the target printed next to each line.
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    /// The configuration in use.
    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    /// Render a line without writing it. Returns `None` when the level is filtered out.
    pub fn render(&self, level: Level, message: &str) -> Option<String> {
        if !self.config.is_enabled(level) {
            return None;
        }

        Some(match self.config.format {
            Format::Pretty => render_pretty(level, &self.target, message, &self.config),
            Format::Compact => render_compact(level, &self.target, message, &self.config),
            Format::Json => render_json(level, &self.target, message),
        })
    }

    fn write(&self, level: Level, args: fmt::Arguments<'_>) {
        if !self.config.is_enabled(level) {
            return;
        }

        if let Some(line) = self.render(level, &args.to_string()) {
            eprintln!("{}", line);
        }
    }
}

impl Default for ConsoleLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger for ConsoleLogger {
    fn info(&self, args: fmt::Arguments<'_>) {
        self.write(Level::Info, args);
    }

    fn warn(&self, args: fmt::Arguments<'_>) {
        self.write(Level::Warn, args);
    }
}

fn render_pretty(level: Level, target: &str, message: &str, config: &LogConfig) -> String {
    let mut line = String::new();

    // Timestamp
    if config.timestamps {
        let now = chrono::Local::now();
        line.push_str(&format!("{} ", now.format("%Y-%m-%d %H:%M:%S%.3f")));
    }

    // Level
    #[cfg(feature = "color")]
    if config.color {
        line.push_str(&format!("{:5} ", level.colored()));
    } else {
        line.push_str(&format!("{:5} ", level.as_str()));
    }

    #[cfg(not(feature = "color"))]
    line.push_str(&format!("{:5} ", level.as_str()));

    // Target
    if !target.is_empty() {
        line.push_str(&format!("[{}] ", target));
    }

    line.push_str(message);
    line
}

fn render_compact(level: Level, target: &str, message: &str, config: &LogConfig) -> String {
    let mut line = String::new();

    if config.timestamps {
        let now = chrono::Local::now();
        line.push_str(&format!("{} ", now.format("%H:%M:%S")));
    }

    line.push(level.as_str().chars().next().unwrap_or('?'));
    line.push(' ');

    if !target.is_empty() {
        line.push_str(&format!("{}: ", target));
    }

    line.push_str(message);
    line
}

#[cfg(feature = "json")]
fn render_json(level: Level, target: &str, message: &str) -> String {
    use serde::Serialize;

    #[derive(Serialize)]
    struct LogEntry<'a> {
        timestamp: String,
        level: &'a str,
        target: &'a str,
        message: &'a str,
    }

    let entry = LogEntry {
        timestamp: chrono::Utc::now().to_rfc3339(),
        level: level.as_str(),
        target,
        message,
    };

    serde_json::to_string(&entry).unwrap_or_default()
}

#[cfg(not(feature = "json"))]
fn render_json(level: Level, target: &str, message: &str) -> String {
    // Fallback without serde - manually escape JSON strings
    format!(
        r#"{{"timestamp":"{}","level":"{}","target":"{}","message":"{}"}}"#,
        chrono::Utc::now().to_rfc3339(),
        level.as_str(),
        escape_json(target),
        escape_json(message)
    )
}

#[cfg(not(feature = "json"))]
fn escape_json(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => result.push_str("\\\""),
            '\\' => result.push_str("\\\\"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            c if c.is_control() => {
                result.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => result.push(c),
        }
    }
    result
}

// ============================================================================
// In-Memory Capture
// ============================================================================

/// A single captured line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub level: Level,
    pub message: String,
}

/// Logger that keeps every line. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemoryLogger {
    records: Arc<Mutex<Vec<Record>>>,
}

impl MemoryLogger {
    /// Create an empty memory logger.
    pub fn new() -> Self {
        Self::default()
    }

    /// All captured records, oldest first.
    pub fn records(&self) -> Vec<Record> {
        self.lock().clone()
    }

    /// Messages captured at `level`.
    pub fn messages(&self, level: Level) -> Vec<String> {
        self.lock()
            .iter()
            .filter(|r| r.level == level)
            .map(|r| r.message.clone())
            .collect()
    }

    /// Whether any line at `level` contains `needle`.
    pub fn contains(&self, level: Level, needle: &str) -> bool {
        self.lock()
            .iter()
            .any(|r| r.level == level && r.message.contains(needle))
    }

    /// Number of captured lines.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop all captured lines.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn push(&self, level: Level, args: fmt::Arguments<'_>) {
        self.lock().push(Record {
            level,
            message: args.to_string(),
        });
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Record>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Logger for MemoryLogger {
    fn info(&self, args: fmt::Arguments<'_>) {
        self.push(Level::Info, args);
    }

    fn warn(&self, args: fmt::Arguments<'_>) {
        self.push(Level::Warn, args);
    }
}

// ============================================================================
// `log` Facade
// ============================================================================

/// Forwards lines to whatever `log` implementation the host installed.
#[derive(Debug, Clone, Copy, Default)]
pub struct FacadeLogger;

impl Logger for FacadeLogger {
    fn info(&self, args: fmt::Arguments<'_>) {
        log::info!(target: "medi", "{}", args);
    }

    fn warn(&self, args: fmt::Arguments<'_>) {
        log::warn!(target: "medi", "{}", args);
    }
}

// ============================================================================
// Macros
// ============================================================================

/// Send an info line to a logger.
///
/// The first argument is any expression whose value (or deref target)
/// implements [`Logger`].
///
/// # Example
///
/// ```rust
/// use medi_log::{info, MemoryLogger};
///
/// let logger = MemoryLogger::new();
/// let channel = "orders";
/// info!(logger, "Emitting event: \"{}\"", channel);
/// assert_eq!(logger.len(), 1);
/// ```
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {{
        use $crate::Logger as _;
        $logger.info(format_args!($($arg)+))
    }};
}

/// Send a warning line to a logger.
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {{
        use $crate::Logger as _;
        $logger.warn(format_args!($($arg)+))
    }};
}

// ============================================================================
// Tracing Integration
// ============================================================================

#[cfg(feature = "tracing")]
pub mod tracing_compat {
    //! Tracing compatibility layer.
    //!
    //! When the `tracing` feature is enabled, this module provides a
    //! [`Logger`] that forwards to `tracing` and a subscriber that respects
    //! `MEDI_LOG_LEVEL`.

    use super::*;

    /// Forwards mediator lines to `tracing` under the `medi` target.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct TracingLogger;

    impl Logger for TracingLogger {
        fn info(&self, args: fmt::Arguments<'_>) {
            tracing::info!(target: "medi", "{}", args);
        }

        fn warn(&self, args: fmt::Arguments<'_>) {
            tracing::warn!(target: "medi", "{}", args);
        }
    }

    /// Create a tracing subscriber that respects the medi config.
    pub fn subscriber() -> impl tracing::Subscriber {
        use tracing_subscriber::prelude::*;
        use tracing_subscriber::{fmt, EnvFilter};

        let config = config();
        let level = match config.level {
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Off => "off",
        };

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_ansi(config.color))
    }
}

#[cfg(feature = "tracing")]
pub use tracing_compat::TracingLogger;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(format: Format) -> LogConfig {
        LogConfig {
            level: Level::Info,
            format,
            color: false,
            timestamps: false,
        }
    }

    #[test]
    fn test_level_ordering() {
        assert!(Level::Info < Level::Warn);
        assert!(Level::Warn < Level::Off);
    }

    #[test]
    fn test_level_from_str() {
        assert_eq!(Level::from_str("info"), Some(Level::Info));
        assert_eq!(Level::from_str("INFO"), Some(Level::Info));
        assert_eq!(Level::from_str("warn"), Some(Level::Warn));
        assert_eq!(Level::from_str("warning"), Some(Level::Warn));
        assert_eq!(Level::from_str("none"), Some(Level::Off));
        assert_eq!(Level::from_str("invalid"), None);
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!(Format::from_str("pretty"), Some(Format::Pretty));
        assert_eq!(Format::from_str("compact"), Some(Format::Compact));
        assert_eq!(Format::from_str("json"), Some(Format::Json));
        assert_eq!(Format::from_str("invalid"), None);
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("yes"), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("sometimes"), None);
    }

    #[test]
    fn test_config_level_gate() {
        let config = LogConfig {
            level: Level::Warn,
            ..LogConfig::default()
        };
        assert!(!config.is_enabled(Level::Info));
        assert!(config.is_enabled(Level::Warn));
        assert!(!config.is_enabled(Level::Off));
    }

    #[test]
    fn test_render_pretty() {
        let logger = ConsoleLogger::with_config(plain(Format::Pretty));
        let line = logger.render(Level::Warn, "no handlers").unwrap();
        assert_eq!(line, "WARN  [medi] no handlers");
    }

    #[test]
    fn test_render_compact_with_target() {
        let logger = ConsoleLogger::with_config(plain(Format::Compact)).with_target("bus");
        let line = logger.render(Level::Info, "emitting").unwrap();
        assert_eq!(line, "I bus: emitting");
    }

    #[test]
    fn test_render_json() {
        let logger = ConsoleLogger::with_config(plain(Format::Json));
        let line = logger.render(Level::Info, "say \"hi\"").unwrap();
        assert!(line.contains(r#""level":"INFO""#));
        assert!(line.contains(r#""target":"medi""#));
        assert!(line.contains(r#""message":"say \"hi\"""#));
    }

    #[test]
    fn test_render_filtered_level() {
        let logger = ConsoleLogger::with_config(LogConfig {
            level: Level::Off,
            ..plain(Format::Pretty)
        });
        assert!(logger.render(Level::Warn, "dropped").is_none());
    }

    #[test]
    fn test_memory_logger_records() {
        let logger = MemoryLogger::new();
        let shared = logger.clone();

        info!(logger, "first {}", 1);
        warn!(shared, "second {}", 2);

        assert_eq!(logger.len(), 2);
        assert_eq!(logger.messages(Level::Info), vec!["first 1".to_string()]);
        assert!(logger.contains(Level::Warn, "second"));
        assert!(!logger.contains(Level::Info, "second"));

        logger.clear();
        assert!(shared.is_empty());
    }

    #[test]
    fn test_arc_logger_delegates() {
        let memory = MemoryLogger::new();
        let logger: Arc<dyn Logger> = Arc::new(memory.clone());

        warn!(logger, "through arc");

        assert_eq!(
            memory.records(),
            vec![Record {
                level: Level::Warn,
                message: "through arc".to_string(),
            }]
        );
    }

    #[test]
    fn test_macros_compile() {
        // Just verify macros compile against every logger
        info!(NoopLogger, "noop");
        warn!(FacadeLogger, "facade {}", 1);
        info!(ConsoleLogger::with_config(plain(Format::Compact)), "console");
    }
}
