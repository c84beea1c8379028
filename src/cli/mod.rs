//! Command-line interface

pub mod prompt;

pub use prompt::InteractivePrompt;

use crate::logging::LogFormat;
use crate::models::{FrequencyRange, ReportFormat};
use crate::types::{Direction, Protocol, RateLimit};
use clap::Parser;
use std::net::IpAddr;
use std::path::PathBuf;

/// Version string shown by `--version`
pub const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_COMMIT"),
    ", built ",
    env!("BUILD_TIME"),
    ", ",
    env!("TARGET_TRIPLE"),
    ")"
);

/// Frequency Sweep Tester - qualify access point frequencies and measure throughput
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "fst")]
#[command(version = LONG_VERSION, about, long_about = None)]
pub struct Cli {
    /// Access point IP address
    #[arg(long, value_name = "IP")]
    pub ap: Option<IpAddr>,

    /// RouterOS API port
    #[arg(long)]
    pub port: Option<u16>,

    /// Access point username
    #[arg(short, long)]
    pub username: Option<String>,

    /// Access point password
    #[arg(short, long)]
    pub password: Option<String>,

    /// Station IP address
    #[arg(long, value_name = "IP")]
    pub station: Option<IpAddr>,

    /// Frequency range in MHz, swept in steps of 5
    #[arg(short, long, value_name = "START-END")]
    pub range: Option<FrequencyRange>,

    /// Seconds to wait for the station to register after each change
    #[arg(short, long, value_name = "SECONDS")]
    pub wait: Option<u64>,

    /// Average ping threshold in milliseconds
    #[arg(long, value_name = "MS")]
    pub max_ping: Option<f64>,

    /// Signal strength threshold in dBm
    #[arg(long, value_name = "DBM", allow_negative_numbers = true)]
    pub signal_threshold: Option<i32>,

    /// Bandwidth test protocol (tcp, udp)
    #[arg(long)]
    pub protocol: Option<Protocol>,

    /// Bandwidth test direction (send, receive, both)
    #[arg(long)]
    pub direction: Option<Direction>,

    /// Local transmit limit in Mbps, or "unlimited"
    #[arg(long, value_name = "MBPS")]
    pub local_limit: Option<RateLimit>,

    /// Remote transmit limit in Mbps, or "unlimited"
    #[arg(long, value_name = "MBPS")]
    pub remote_limit: Option<RateLimit>,

    /// Bandwidth test duration in seconds
    #[arg(short, long, value_name = "SECONDS", value_parser = parse_duration)]
    pub duration: Option<u32>,

    /// JSON config file with thresholds [default: config.json]
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Results file
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Results file format
    #[arg(long, value_enum)]
    pub format: Option<ReportFormat>,

    /// Diagnostic log format (text, json)
    #[arg(long, value_enum, value_name = "FORMAT")]
    pub log_format: Option<LogFormat>,

    /// Write an example .env file and exit [default: .env.example]
    #[arg(long, value_name = "FILE", num_args = 0..=1, default_missing_value = ".env.example")]
    pub create_env: Option<PathBuf>,

    /// List the supported environment variables and exit
    #[arg(long)]
    pub env_help: bool,

    /// Prompt for any setting not given on the command line
    #[arg(short, long)]
    pub interactive: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(long)]
    pub debug: bool,

    /// Print the sweep plan without connecting to the access point
    #[arg(long)]
    pub dry_run: bool,
}

impl Cli {
    /// Validate CLI arguments for conflicts and requirements
    pub fn validate(&self) -> Result<(), String> {
        if self.dry_run && self.interactive {
            return Err("Cannot combine --dry-run with --interactive".to_string());
        }

        if self.create_env.is_some() && self.env_help {
            return Err("Cannot combine --create-env with --env-help".to_string());
        }

        if let Some(ping) = self.max_ping {
            if !ping.is_finite() || ping <= 0.0 {
                return Err(format!("--max-ping must be a positive number, got {}", ping));
            }
        }

        if self.wait == Some(0) {
            return Err("--wait must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Path of the JSON config file and whether the user named it
    pub fn config_path(&self) -> (PathBuf, bool) {
        match &self.config {
            Some(path) => (path.clone(), true),
            None => (PathBuf::from(crate::defaults::DEFAULT_CONFIG_FILE), false),
        }
    }

    /// Check if colors should be enabled
    pub fn use_colors(&self) -> bool {
        !self.no_color && supports_color()
    }
}

/// Parse a test duration in seconds
fn parse_duration(s: &str) -> Result<u32, String> {
    if s.starts_with('+') {
        return Err(format!("Invalid duration: {}", s));
    }

    s.parse::<u32>()
        .map_err(|_| format!("Invalid duration: {}", s))
        .and_then(|secs| {
            if secs == 0 {
                Err("Duration must be greater than 0".to_string())
            } else if secs > 3600 {
                Err("Duration cannot exceed 3600 seconds".to_string())
            } else {
                Ok(secs)
            }
        })
}

/// Check if the terminal supports color output
fn supports_color() -> bool {
    if let Ok(term) = std::env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    #[cfg(target_os = "windows")]
    {
        if std::env::var("ANSICON").is_ok() || std::env::var("ConEmuANSI").is_ok() {
            return true;
        }
    }

    // Default to true on Unix-like systems, false on Windows
    #[cfg(unix)]
    {
        true
    }
    #[cfg(not(unix))]
    {
        false
    }
}
