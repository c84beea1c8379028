//! Error handling for the frequency sweep tester
//!
//! One [`AppError`] variant per failure class. The class decides whether a
//! sweep can carry on ([`AppError::is_transient`]) and which exit code the
//! process ends with.

use colored::{Color, Colorize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /// Missing or contradictory settings
    #[error("Configuration error: {0}")]
    Config(String),

    /// The API socket could not be opened or was lost
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    /// A single command came back with `!trap`
    #[error("Device error: {0}")]
    Device(String),

    /// Bytes on the API socket that do not frame into sentences
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Timeout error: {0}")]
    Timeout(String),

    /// A user-supplied value is out of range or malformed
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("I/O error: {0}")]
    Io(String),

    /// A value read from a file, the environment or a device reply did not parse
    #[error("Parsing error: {0}")]
    Parse(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

macro_rules! constructors {
    ($($name:ident => $variant:ident),* $(,)?) => {
        $(
            pub fn $name<S: Into<String>>(message: S) -> Self {
                Self::$variant(message.into())
            }
        )*
    };
}

impl AppError {
    constructors! {
        config => Config,
        connection => Connection,
        auth => Auth,
        device => Device,
        protocol => Protocol,
        timeout => Timeout,
        validation => Validation,
        io => Io,
        parse => Parse,
        internal => Internal,
    }

    /// Upper-case tag used in console output and log fields
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG",
            Self::Connection(_) => "CONNECTION",
            Self::Auth(_) => "AUTH",
            Self::Device(_) => "DEVICE",
            Self::Protocol(_) => "PROTOCOL",
            Self::Timeout(_) => "TIMEOUT",
            Self::Validation(_) => "VALIDATION",
            Self::Io(_) => "IO",
            Self::Parse(_) => "PARSE",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// The message without the category prefix
    pub fn message(&self) -> &str {
        match self {
            Self::Config(m)
            | Self::Connection(m)
            | Self::Auth(m)
            | Self::Device(m)
            | Self::Protocol(m)
            | Self::Timeout(m)
            | Self::Validation(m)
            | Self::Io(m)
            | Self::Parse(m)
            | Self::Internal(m) => m,
        }
    }

    fn message_mut(&mut self) -> &mut String {
        match self {
            Self::Config(m)
            | Self::Connection(m)
            | Self::Auth(m)
            | Self::Device(m)
            | Self::Protocol(m)
            | Self::Timeout(m)
            | Self::Validation(m)
            | Self::Io(m)
            | Self::Parse(m)
            | Self::Internal(m) => m,
        }
    }

    /// Whether a sweep may carry on after this error.
    ///
    /// Device traps, per-command timeouts and unparsable replies only affect
    /// the command that produced them. A dropped connection, a rejected login
    /// or a bad configuration ends the sweep.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Device(_) | Self::Timeout(_) | Self::Parse(_))
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Validation(_) | Self::Parse(_) => 1,
            Self::Connection(_) | Self::Protocol(_) => 2,
            Self::Timeout(_) => 3,
            Self::Auth(_) => 4,
            Self::Io(_) => 5,
            Self::Device(_) => 6,
            Self::Internal(_) => 99,
        }
    }

    /// One-line hint shown under the error in verbose mode
    pub fn hint(&self) -> &'static str {
        match self {
            Self::Config(_) => "check config.json, the .env file and the command line flags",
            Self::Connection(_) => "check the AP address and that the API service listens on the given port",
            Self::Auth(_) => "check the AP username and password",
            Self::Device(_) => "the API user needs write permission and the interface must support the frequency",
            Self::Protocol(_) => "make sure the port is the RouterOS API and not Winbox or SSH",
            Self::Timeout(_) => "check the management link to the access point",
            Self::Validation(_) => "check the format of addresses, ranges and limits",
            Self::Io(_) => "check file permissions and free disk space",
            Self::Parse(_) => "check the values in the config file and environment",
            Self::Internal(_) => "this is a bug, please report it with the message above",
        }
    }

    fn tint(&self) -> Color {
        match self {
            Self::Config(_) | Self::Validation(_) | Self::Parse(_) => Color::Red,
            Self::Connection(_) | Self::Protocol(_) | Self::Device(_) => Color::Yellow,
            Self::Timeout(_) => Color::Blue,
            Self::Auth(_) => Color::Magenta,
            Self::Io(_) => Color::Cyan,
            Self::Internal(_) => Color::BrightRed,
        }
    }

    /// `[CATEGORY] message`, tinted by category when `use_color` is set
    pub fn format_for_console(&self, use_color: bool) -> String {
        let category = self.category();
        let message = self.to_string();
        if !use_color {
            return format!("[{}] {}", category, message);
        }
        let tint = self.tint();
        format!("[{}] {}", category.color(tint).bold(), message.color(tint))
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::io(error.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::parse(format!("invalid JSON: {}", error))
    }
}

impl From<dotenv::Error> for AppError {
    fn from(error: dotenv::Error) -> Self {
        Self::config(format!("cannot load .env: {}", error))
    }
}

macro_rules! parse_error_from {
    ($($source:ty => $what:literal),* $(,)?) => {
        $(
            impl From<$source> for AppError {
                fn from(error: $source) -> Self {
                    Self::parse(format!("{}: {}", $what, error))
                }
            }
        )*
    };
}

parse_error_from! {
    std::num::ParseIntError => "not an integer",
    std::num::ParseFloatError => "not a number",
    std::str::ParseBoolError => "not a boolean",
    std::net::AddrParseError => "not an IP address",
}

impl From<tokio::time::error::Elapsed> for AppError {
    fn from(error: tokio::time::error::Elapsed) -> Self {
        Self::timeout(error.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::internal(format!("{:#}", error))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Prefix an error's message with what was being attempted
pub trait ErrorContext<T> {
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;

    fn context(self, message: &'static str) -> Result<T>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<AppError>,
{
    /// The variant is kept, so `is_transient` and the exit code do not change
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let mut error = e.into();
            let message = error.message_mut();
            *message = format!("{}: {}", f(), message);
            error
        })
    }

    fn context(self, message: &'static str) -> Result<T> {
        self.with_context(|| message.to_string())
    }
}

/// Prints errors to stderr for the user
pub struct ErrorReporter {
    pub use_color: bool,
    pub verbose: bool,
}

impl ErrorReporter {
    pub fn new(use_color: bool, verbose: bool) -> Self {
        Self { use_color, verbose }
    }

    pub fn report_error(&self, error: &AppError) {
        eprintln!("{}", error.format_for_console(self.use_color));
        if self.verbose {
            eprintln!("  hint: {}", error.hint());
        }
    }

    /// Counts per category; verbose mode lists every message
    pub fn format_error_summary(&self, errors: &[AppError]) -> String {
        if errors.is_empty() {
            return "No errors".to_string();
        }

        let mut by_category: BTreeMap<&'static str, Vec<&AppError>> = BTreeMap::new();
        for error in errors {
            by_category.entry(error.category()).or_default().push(error);
        }

        let mut lines = vec![format!("{} error(s):", errors.len())];
        for (category, group) in by_category {
            lines.push(format!("  {:<10} {}", category, group.len()));
            if self.verbose {
                lines.extend(group.iter().map(|error| format!("    - {}", error.message())));
            }
        }
        lines.join("\n")
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}
