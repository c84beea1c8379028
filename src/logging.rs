//! Structured logging for the frequency sweep tester
//!
//! Every entry carries a level, the name of the component that wrote it and
//! a map of typed fields. Entries render either as one human-readable line
//! or as a JSON object. Loggers made by one [`LoggerFactory`] share a
//! session id so the lines of a single sweep can be correlated.

use crate::error::{AppError, Result};
use crate::gateway::BandwidthTestRequest;
use crate::models::{Config, QualificationOutcome};
use crate::types::QualificationState;
use chrono::{DateTime, Utc};
use colored::{ColoredString, Colorize};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn label(self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    fn paint(self, text: &str) -> ColoredString {
        match self {
            LogLevel::Debug => text.dimmed(),
            LogLevel::Info => text.green(),
            LogLevel::Warn => text.yellow().bold(),
            LogLevel::Error => text.red().bold(),
        }
    }

    fn goes_to_stderr(self) -> bool {
        self >= LogLevel::Warn
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for LogLevel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        let level = match s.trim().to_ascii_lowercase().as_str() {
            "debug" | "trace" => LogLevel::Debug,
            "info" => LogLevel::Info,
            "warn" | "warning" => LogLevel::Warn,
            "error" | "fatal" => LogLevel::Error,
            other => return Err(AppError::parse(format!("Unknown log level '{}'", other))),
        };
        Ok(level)
    }
}

/// One structured log record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(rename = "ts")]
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    #[serde(rename = "component")]
    pub logger: String,
    #[serde(rename = "msg")]
    pub message: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub fields: BTreeMap<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub source: Option<SourceLocation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// `HH:MM:SS.mmm LEVEL [component] message key=value ...`
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(AppError::config(format!("Unknown log format '{}', expected text or json", other))),
        }
    }
}

/// Named logger. Clones share the session id.
#[derive(Clone)]
pub struct Logger {
    name: String,
    threshold: Option<LogLevel>,
    format: LogFormat,
    use_color: bool,
    show_source: bool,
    session: Arc<RwLock<Option<String>>>,
}

impl Logger {
    /// Logger at info level with colored text output
    pub fn new(name: String) -> Self {
        Self {
            name,
            threshold: Some(LogLevel::Info),
            format: LogFormat::Text,
            use_color: true,
            show_source: false,
            session: Arc::new(RwLock::new(None)),
        }
    }

    /// Level follows `--debug`/`--verbose`; a plain run only shows warnings and errors.
    /// The format comes from `--log-format` or `LOG_FORMAT`.
    pub fn with_config(name: String, config: &Config) -> Self {
        let threshold = match (config.debug, config.verbose) {
            (true, _) => LogLevel::Debug,
            (false, true) => LogLevel::Info,
            (false, false) => LogLevel::Warn,
        };

        Self {
            threshold: Some(threshold),
            format: config.log_format,
            use_color: config.enable_color,
            show_source: config.debug,
            ..Self::new(name)
        }
    }

    pub fn disabled(name: String) -> Self {
        Self {
            threshold: None,
            ..Self::new(name)
        }
    }

    pub fn set_level(&mut self, level: LogLevel) {
        self.threshold = Some(level);
    }

    pub fn set_format(&mut self, format: LogFormat) {
        self.format = format;
    }

    pub fn set_color(&mut self, use_color: bool) {
        self.use_color = use_color;
    }

    pub async fn set_session_id(&self, session_id: String) {
        *self.session.write().await = Some(session_id);
    }

    pub async fn session_id(&self) -> Option<String> {
        self.session.read().await.clone()
    }

    pub fn would_log(&self, level: LogLevel) -> bool {
        self.threshold.is_some_and(|threshold| level >= threshold)
    }

    pub fn log(&self, level: LogLevel, message: &str) -> LogEntryBuilder<'_> {
        LogEntryBuilder {
            logger: self,
            entry: LogEntry {
                timestamp: Utc::now(),
                level,
                logger: self.name.clone(),
                message: message.to_string(),
                fields: BTreeMap::new(),
                source: None,
            },
        }
    }

    pub fn debug(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Debug, message)
    }

    pub fn info(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Info, message)
    }

    pub fn warn(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Warn, message)
    }

    pub fn error(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Error, message)
    }

    /// Render an entry without writing it
    pub fn render(&self, entry: &LogEntry) -> String {
        match self.format {
            LogFormat::Text => self.render_text(entry),
            LogFormat::Json => serde_json::to_string(entry)
                .unwrap_or_else(|e| format!(r#"{{"level":"error","msg":"unserializable log entry: {}"}}"#, e)),
        }
    }

    fn render_text(&self, entry: &LogEntry) -> String {
        let level = format!("{:<5}", entry.level.label());
        let level = if self.use_color {
            entry.level.paint(&level).to_string()
        } else {
            level
        };

        let mut line = format!(
            "{} {} [{}] {}",
            entry.timestamp.format("%H:%M:%S%.3f"),
            level,
            entry.logger,
            entry.message
        );

        // the session id is only useful in machine-readable output
        for (key, value) in entry.fields.iter().filter(|(key, _)| key.as_str() != "session") {
            match value {
                Value::String(text) => line.push_str(&format!(" {}={}", key, text)),
                other => line.push_str(&format!(" {}={}", key, other)),
            }
        }

        if self.show_source {
            if let Some(source) = &entry.source {
                line.push_str(&format!(" ({})", source));
            }
        }
        line
    }

    async fn emit(&self, mut entry: LogEntry) {
        if !self.would_log(entry.level) {
            return;
        }
        if let Some(session) = self.session.read().await.as_ref() {
            entry.fields.insert("session".to_string(), Value::String(session.clone()));
        }

        let line = self.render(&entry);
        // a closed pipe must not take the sweep down
        if entry.level.goes_to_stderr() {
            let _ = writeln!(io::stderr().lock(), "{}", line);
        } else {
            let _ = writeln!(io::stdout().lock(), "{}", line);
        }
    }
}

/// Accumulates fields for one entry; nothing is written until [`log`](Self::log)
pub struct LogEntryBuilder<'a> {
    logger: &'a Logger,
    entry: LogEntry,
}

impl<'a> LogEntryBuilder<'a> {
    /// Fields that fail to serialize are dropped
    pub fn field<T: Serialize>(mut self, key: &str, value: T) -> Self {
        if let Ok(value) = serde_json::to_value(value) {
            self.entry.fields.insert(key.to_string(), value);
        }
        self
    }

    pub fn at(mut self, file: &str, line: u32) -> Self {
        self.entry.source = Some(SourceLocation {
            file: file.to_string(),
            line,
        });
        self
    }

    pub fn error_info(self, error: &AppError) -> Self {
        self.field("error", error.to_string())
            .field("error_category", error.category())
            .field("error_transient", error.is_transient())
    }

    pub fn entry(&self) -> &LogEntry {
        &self.entry
    }

    pub async fn log(self) {
        self.logger.emit(self.entry).await;
    }
}


/// Logger for sweep events: frequency changes, registration, probes,
/// verdicts and bandwidth tests
#[derive(Clone)]
pub struct SweepLogger {
    logger: Logger,
}

impl SweepLogger {
    pub fn new(config: &Config) -> Self {
        Self {
            logger: Logger::with_config("SWEEP".to_string(), config),
        }
    }

    pub fn from_logger(logger: Logger) -> Self {
        Self { logger }
    }

    /// A sweep logger that writes nothing
    pub fn disabled() -> Self {
        Self {
            logger: Logger::disabled("SWEEP".to_string()),
        }
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub async fn log_frequency_set(&self, frequency: u32, interface: &str, result: std::result::Result<(), &AppError>) {
        match result {
            Ok(()) => {
                self.logger
                    .info(&format!("Frequency set to {} MHz on {}", frequency, interface))
                    .field("frequency", frequency)
                    .field("interface", interface)
                    .log()
                    .await
            }
            Err(error) => {
                self.logger
                    .warn(&format!("Could not set frequency {} MHz on {}", frequency, interface))
                    .field("frequency", frequency)
                    .field("interface", interface)
                    .error_info(error)
                    .log()
                    .await
            }
        }
    }

    pub async fn log_interface_listing_failed(&self, frequency: u32, error: &AppError) {
        self.logger
            .warn("Could not list wireless interfaces")
            .field("frequency", frequency)
            .error_info(error)
            .log()
            .await;
    }

    pub async fn log_state_transition(&self, frequency: u32, from: QualificationState, to: QualificationState) {
        self.logger
            .debug(&format!("Qualification {} -> {}", from, to))
            .field("frequency", frequency)
            .field("from", from)
            .field("to", to)
            .log()
            .await;
    }

    pub async fn log_registration_query_failed(&self, frequency: u32, error: &AppError) {
        self.logger
            .warn("Registration table query failed")
            .field("frequency", frequency)
            .error_info(error)
            .log()
            .await;
    }

    pub async fn log_station_registered(&self, frequency: u32, stations: usize, waited_ms: u128) {
        self.logger
            .info("Station registered, waiting for link to settle")
            .field("frequency", frequency)
            .field("stations", stations)
            .field("waited_ms", waited_ms)
            .log()
            .await;
    }

    pub async fn log_ping(&self, frequency: u32, result: std::result::Result<f64, &AppError>) {
        match result {
            Ok(rtt) => {
                self.logger
                    .info(&format!("Average ping {:.2} ms", rtt))
                    .field("frequency", frequency)
                    .field("avg_rtt_ms", rtt)
                    .log()
                    .await
            }
            Err(error) => {
                self.logger
                    .warn("Ping probe failed")
                    .field("frequency", frequency)
                    .error_info(error)
                    .log()
                    .await
            }
        }
    }

    pub async fn log_verdict(&self, frequency: u32, outcome: &QualificationOutcome) {
        let message = if outcome.passed() {
            format!("Frequency {} MHz qualified", frequency)
        } else if outcome.registered() {
            format!("Frequency {} MHz rejected: link quality below thresholds", frequency)
        } else {
            format!("Frequency {} MHz rejected: station did not register", frequency)
        };

        let ping = outcome.average_ping_ms();
        self.logger
            .info(&message)
            .field("frequency", frequency)
            .field("registered", outcome.registered())
            .field("signal_dbm", outcome.signal_strength_dbm())
            .field("avg_rtt_ms", if ping.is_finite() { Some(ping) } else { None })
            .field("passed", outcome.passed())
            .log()
            .await;
    }

    pub async fn log_test_started(&self, frequency: u32, request: &BandwidthTestRequest) {
        self.logger
            .info(&format!("Running bandwidth test for frequency {} MHz", frequency))
            .field("frequency", frequency)
            .field("address", request.address.to_string())
            .field("protocol", &request.protocol)
            .field("direction", &request.direction)
            .field("duration_s", request.duration_seconds)
            .log()
            .await;
    }

    pub async fn log_test_finished(&self, frequency: u32, result: std::result::Result<usize, &AppError>) {
        match result {
            Ok(samples) => {
                self.logger
                    .info("Bandwidth test finished")
                    .field("frequency", frequency)
                    .field("samples", samples)
                    .log()
                    .await
            }
            Err(error) => {
                self.logger
                    .error("Bandwidth test failed")
                    .field("frequency", frequency)
                    .error_info(error)
                    .log()
                    .await
            }
        }
    }

    pub async fn log_post_test_delay(&self, frequency: u32, delay_secs: u64) {
        self.logger
            .debug(&format!("Waiting {}s before the next frequency", delay_secs))
            .field("after_frequency", frequency)
            .log()
            .await;
    }

    pub async fn log_sweep_complete(&self, total: usize, passed: usize, tested: usize) {
        self.logger
            .info("Sweep complete")
            .field("frequencies", total)
            .field("qualified", passed)
            .field("tested", tested)
            .log()
            .await;
    }
}

/// Hands out loggers for one run, all tagged with the same session id
pub struct LoggerFactory {
    config: Config,
    session_id: String,
}

impl LoggerFactory {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            session_id: Uuid::new_v4().to_string(),
        }
    }

    pub async fn create_logger(&self, name: &str) -> Logger {
        let logger = Logger::with_config(name.to_string(), &self.config);
        logger.set_session_id(self.session_id.clone()).await;
        logger
    }

    pub async fn create_sweep_logger(&self) -> SweepLogger {
        SweepLogger::from_logger(self.create_logger("SWEEP").await)
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

/// `log_info!(logger, "fmt", args..)` and friends: format, tag with the call site and write
#[macro_export]
macro_rules! log_at_level {
    ($logger:expr, $level:ident, $($arg:tt)*) => {
        $logger
            .log($crate::logging::LogLevel::$level, &format!($($arg)*))
            .at(file!(), line!())
            .log()
            .await
    };
}

#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($arg:tt)*) => { $crate::log_at_level!($logger, Debug, $($arg)*) };
}

#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($arg:tt)*) => { $crate::log_at_level!($logger, Info, $($arg)*) };
}

#[macro_export]
macro_rules! log_warn {
    ($logger:expr, $($arg:tt)*) => { $crate::log_at_level!($logger, Warn, $($arg)*) };
}

#[macro_export]
macro_rules! log_error {
    ($logger:expr, $($arg:tt)*) => { $crate::log_at_level!($logger, Error, $($arg)*) };
}
