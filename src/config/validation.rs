//! Configuration validation utilities and rules

use crate::{error::Result, models::Config};
use std::net::IpAddr;
use std::time::Duration;

/// Sweeps estimated to run longer than this get a warning
const LONG_SWEEP: Duration = Duration::from_secs(2 * 60 * 60);

/// Configuration validator with advisory checks beyond [`Config::validate`]
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate configuration and collect non-fatal warnings
    pub fn validate_comprehensive(config: &Config) -> Result<Vec<ValidationWarning>> {
        config.validate()?;

        let mut warnings = Vec::new();
        warnings.extend(Self::validate_addresses(config));
        warnings.extend(Self::validate_thresholds(config));
        warnings.extend(Self::validate_timing(config));
        Ok(warnings)
    }

    fn validate_addresses(config: &Config) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        if let (Some(ap), Some(station)) = (config.ap_address, config.station_address) {
            if ap == station {
                warnings.push(ValidationWarning::new(
                    ValidationLevel::Warning,
                    format!("AP and station share the address {}; the ping and bandwidth test will target the AP itself", ap),
                ));
            }
            if matches!((ap, station), (IpAddr::V4(_), IpAddr::V6(_)) | (IpAddr::V6(_), IpAddr::V4(_))) {
                warnings.push(ValidationWarning::new(
                    ValidationLevel::Warning,
                    "AP and station addresses use different IP versions".to_string(),
                ));
            }
        }

        if config.ap_password.is_empty() {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                format!("Logging in as '{}' with an empty password", config.ap_username),
            ));
        }

        warnings
    }

    fn validate_thresholds(config: &Config) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        let signal = config.signal_threshold_dbm;
        if !(-100..=-30).contains(&signal) {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!("Signal threshold of {} dBm is outside the usual -100..-30 dBm range", signal),
            ));
        }

        if let Some(ping) = config.valid_ping_time_ms {
            if ping < 1.0 {
                warnings.push(ValidationWarning::new(
                    ValidationLevel::Warning,
                    format!("Ping threshold of {} ms is very strict; few frequencies are likely to qualify", ping),
                ));
            } else if ping > 500.0 {
                warnings.push(ValidationWarning::new(
                    ValidationLevel::Info,
                    format!("Ping threshold of {} ms accepts almost any link", ping),
                ));
            }
        }

        warnings
    }

    fn validate_timing(config: &Config) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        if let Some(wait) = config.wait_for_registration {
            let wait = Duration::from_secs(wait);
            if config.timing.poll_interval > wait {
                warnings.push(ValidationWarning::new(
                    ValidationLevel::Info,
                    format!(
                        "Poll interval of {}s is longer than the {}s registration window; the table is checked only at the start and at the deadline",
                        config.timing.poll_interval.as_secs(),
                        wait.as_secs()
                    ),
                ));
            }
            if config.timing.settle_delay >= wait {
                warnings.push(ValidationWarning::new(
                    ValidationLevel::Info,
                    format!(
                        "Settle delay of {}s is not shorter than the {}s registration window",
                        config.timing.settle_delay.as_secs(),
                        wait.as_secs()
                    ),
                ));
            }
        }

        let steps = config.frequency_range.step_count();
        let estimate = config.estimated_duration();
        if estimate > LONG_SWEEP {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!(
                    "Sweeping {} frequencies may take up to {}; consider a narrower --range",
                    steps,
                    format_duration(estimate)
                ),
            ));
        } else if steps > 50 {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                format!("Sweeping {} frequencies, up to {}", steps, format_duration(estimate)),
            ));
        }

        if config.frequency_range.end % 5 != config.frequency_range.start % 5 {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                format!(
                    "Range end {} MHz is off the 5 MHz grid from {} MHz and will not be swept",
                    config.frequency_range.end, config.frequency_range.start
                ),
            ));
        }

        warnings
    }
}

fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let (hours, minutes) = (secs / 3600, (secs % 3600) / 60);
    if hours > 0 {
        format!("{}h {:02}m", hours, minutes)
    } else {
        format!("{}m {:02}s", minutes, secs % 60)
    }
}

/// Validation warning levels
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationLevel {
    Info,
    Warning,
}

impl ValidationLevel {
    /// Get display string for level
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
        }
    }
}

/// Configuration validation warning
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub level: ValidationLevel,
    pub message: String,
}

impl ValidationWarning {
    /// Create a new validation warning
    pub fn new(level: ValidationLevel, message: String) -> Self {
        Self { level, message }
    }

    /// Format warning for display
    pub fn format(&self, use_color: bool) -> String {
        if use_color {
            use colored::Colorize;
            let tag = match self.level {
                ValidationLevel::Info => self.level.as_str().blue(),
                ValidationLevel::Warning => self.level.as_str().yellow(),
            };
            format!("[{}] {}", tag, self.message)
        } else {
            format!("[{}] {}", self.level.as_str(), self.message)
        }
    }
}

/// Convenience function for comprehensive configuration validation
pub fn validate_config(config: &Config) -> Result<Vec<ValidationWarning>> {
    ConfigValidator::validate_comprehensive(config)
}
