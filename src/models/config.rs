//! Configuration data model and validation

use crate::logging::LogFormat;
use crate::types::{AppError, Direction, Protocol, RateLimit, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Spacing between consecutive swept frequencies, in MHz
pub const FREQUENCY_STEP: u32 = 5;

/// Inclusive frequency range swept in steps of [`FREQUENCY_STEP`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequencyRange {
    pub start: u32,
    pub end: u32,
}

impl FrequencyRange {
    pub fn new(start: u32, end: u32) -> Result<Self> {
        let range = Self { start, end };
        range.validate()?;
        Ok(range)
    }

    pub fn validate(&self) -> Result<()> {
        if self.start == 0 {
            return Err(AppError::config("Frequency range must start above 0 MHz"));
        }
        if self.start > self.end {
            return Err(AppError::config(format!(
                "Frequency range start {} is above end {}",
                self.start, self.end
            )));
        }
        Ok(())
    }

    /// Frequencies in ascending order; the end is included only when it
    /// lies on the step grid.
    pub fn frequencies(&self) -> impl Iterator<Item = u32> {
        (self.start..=self.end).step_by(FREQUENCY_STEP as usize)
    }

    /// Number of swept frequencies, `(end - start) / 5 + 1`
    pub fn step_count(&self) -> usize {
        if self.start > self.end {
            return 0;
        }
        ((self.end - self.start) / FREQUENCY_STEP) as usize + 1
    }
}

impl Default for FrequencyRange {
    fn default() -> Self {
        Self {
            start: crate::defaults::DEFAULT_FREQUENCY_START,
            end: crate::defaults::DEFAULT_FREQUENCY_END,
        }
    }
}

impl fmt::Display for FrequencyRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

impl FromStr for FrequencyRange {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        let (start, end) = s
            .split_once('-')
            .ok_or_else(|| AppError::config(format!("Invalid frequency range '{}', expected START-END", s)))?;
        let start: u32 = start
            .trim()
            .parse()
            .map_err(|e| AppError::config(format!("Invalid range start '{}': {}", start.trim(), e)))?;
        let end: u32 = end
            .trim()
            .parse()
            .map_err(|e| AppError::config(format!("Invalid range end '{}': {}", end.trim(), e)))?;
        Self::new(start, end)
    }
}

/// Fixed waits and probe sizes used while sweeping
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepTiming {
    /// Interval between registration table queries
    pub poll_interval: Duration,
    /// Wait after the station registers, before pinging
    pub settle_delay: Duration,
    /// Added to the test duration before moving to the next frequency
    pub post_test_delay: Duration,
    /// Echo requests per ping probe
    pub ping_count: u32,
}

impl Default for SweepTiming {
    fn default() -> Self {
        Self {
            poll_interval: crate::defaults::DEFAULT_POLL_INTERVAL,
            settle_delay: crate::defaults::DEFAULT_SETTLE_DELAY,
            post_test_delay: crate::defaults::DEFAULT_POST_TEST_DELAY,
            ping_count: crate::defaults::DEFAULT_PING_COUNT,
        }
    }
}

/// Parameters of the bandwidth test, fixed for the whole sweep
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandwidthTestParams {
    pub protocol: Protocol,
    pub direction: Direction,
    pub local_limit: RateLimit,
    pub remote_limit: RateLimit,
    pub duration_seconds: u32,
}

impl BandwidthTestParams {
    pub fn duration(&self) -> Duration {
        Duration::from_secs(u64::from(self.duration_seconds))
    }
}

impl Default for BandwidthTestParams {
    fn default() -> Self {
        Self {
            protocol: Protocol::default(),
            direction: Direction::default(),
            local_limit: RateLimit::Unlimited,
            remote_limit: RateLimit::Unlimited,
            duration_seconds: crate::defaults::DEFAULT_TEST_DURATION_SECS,
        }
    }
}

/// Output format of the results file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Table,
    Json,
}

/// Access point login details
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub port: u16,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"********")
            .field("port", &self.port)
            .finish()
    }
}

/// Main application configuration, assembled from defaults, the JSON
/// config document, the environment and the command line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub ap_address: Option<IpAddr>,
    pub ap_port: u16,
    pub ap_username: String,
    #[serde(skip_serializing)]
    pub ap_password: String,
    pub station_address: Option<IpAddr>,
    pub frequency_range: FrequencyRange,

    /// Seconds to wait for the station to register after a frequency change
    pub wait_for_registration: Option<u64>,
    /// Average ping must stay below this many milliseconds
    pub valid_ping_time_ms: Option<f64>,
    /// Signal strength must be above this many dBm
    pub signal_threshold_dbm: i32,
    pub timing: SweepTiming,

    pub bandwidth: BandwidthTestParams,

    pub results_file: PathBuf,
    pub report_format: ReportFormat,
    pub log_format: LogFormat,
    pub enable_color: bool,
    pub verbose: bool,
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ap_address: None,
            ap_port: crate::defaults::DEFAULT_API_PORT,
            ap_username: crate::defaults::DEFAULT_USERNAME.to_string(),
            ap_password: String::new(),
            station_address: None,
            frequency_range: FrequencyRange::default(),
            wait_for_registration: None,
            valid_ping_time_ms: None,
            signal_threshold_dbm: crate::defaults::DEFAULT_SIGNAL_THRESHOLD_DBM,
            timing: SweepTiming::default(),
            bandwidth: BandwidthTestParams::default(),
            results_file: PathBuf::from(crate::defaults::DEFAULT_RESULTS_FILE),
            report_format: ReportFormat::default(),
            log_format: LogFormat::default(),
            enable_color: crate::defaults::DEFAULT_ENABLE_COLOR,
            verbose: false,
            debug: false,
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration and return the first error found
    pub fn validate(&self) -> Result<()> {
        if self.ap_address.is_none() {
            return Err(AppError::config("AP address is required (--ap or AP_ADDRESS)"));
        }
        if self.station_address.is_none() {
            return Err(AppError::config("Station address is required (--station or STATION_ADDRESS)"));
        }
        if self.ap_port == 0 {
            return Err(AppError::config("AP port must be greater than 0"));
        }
        if self.ap_username.is_empty() {
            return Err(AppError::config("AP username cannot be empty"));
        }

        self.frequency_range.validate()?;

        match self.wait_for_registration {
            None => {
                return Err(AppError::config(
                    "Missing 'wait_for_registration' (set it in the config file or WAIT_FOR_REGISTRATION)",
                ))
            }
            Some(0) => return Err(AppError::config("wait_for_registration must be greater than 0")),
            Some(_) => {}
        }

        match self.valid_ping_time_ms {
            None => {
                return Err(AppError::config(
                    "Missing 'valid_ping_time' (set it in the config file or VALID_PING_TIME)",
                ))
            }
            Some(ms) if !ms.is_finite() || ms <= 0.0 => {
                return Err(AppError::config(format!("valid_ping_time must be a positive number, got {}", ms)))
            }
            Some(_) => {}
        }

        if self.timing.poll_interval.is_zero() {
            return Err(AppError::config("Poll interval must be greater than 0"));
        }
        if self.timing.ping_count == 0 {
            return Err(AppError::config("Ping count must be greater than 0"));
        }

        if self.bandwidth.duration_seconds == 0 {
            return Err(AppError::config("Test duration must be greater than 0 seconds"));
        }

        Ok(())
    }

    /// Merge environment variables into this configuration
    pub fn merge_from_env(&mut self) -> Result<()> {
        if let Ok(address) = std::env::var("AP_ADDRESS") {
            self.ap_address = Some(parse_address("AP_ADDRESS", &address)?);
        }

        if let Ok(port) = std::env::var("AP_PORT") {
            self.ap_port = port
                .trim()
                .parse()
                .map_err(|e| AppError::config(format!("Invalid AP_PORT value '{}': {}", port, e)))?;
        }

        if let Ok(username) = std::env::var("AP_USERNAME") {
            self.ap_username = username;
        }

        if let Ok(password) = std::env::var("AP_PASSWORD") {
            self.ap_password = password;
        }

        if let Ok(address) = std::env::var("STATION_ADDRESS") {
            self.station_address = Some(parse_address("STATION_ADDRESS", &address)?);
        }

        if let Ok(range) = std::env::var("FREQUENCY_RANGE") {
            self.frequency_range = range.parse()?;
        }

        if let Ok(wait) = std::env::var("WAIT_FOR_REGISTRATION") {
            self.wait_for_registration = Some(
                wait.trim()
                    .parse()
                    .map_err(|e| AppError::config(format!("Invalid WAIT_FOR_REGISTRATION value '{}': {}", wait, e)))?,
            );
        }

        if let Ok(ping) = std::env::var("VALID_PING_TIME") {
            self.valid_ping_time_ms = Some(
                ping.trim()
                    .parse()
                    .map_err(|e| AppError::config(format!("Invalid VALID_PING_TIME value '{}': {}", ping, e)))?,
            );
        }

        if let Ok(signal) = std::env::var("SIGNAL_THRESHOLD") {
            self.signal_threshold_dbm = signal
                .trim()
                .parse()
                .map_err(|e| AppError::config(format!("Invalid SIGNAL_THRESHOLD value '{}': {}", signal, e)))?;
        }

        if let Ok(path) = std::env::var("RESULTS_FILE") {
            self.results_file = PathBuf::from(path);
        }

        if let Ok(enable_color) = std::env::var("ENABLE_COLOR") {
            self.enable_color = enable_color
                .parse()
                .map_err(|e| AppError::config(format!("Invalid ENABLE_COLOR value '{}': {}", enable_color, e)))?;
        }

        if let Ok(format) = std::env::var("LOG_FORMAT") {
            self.log_format = format.parse()?;
        }

        Ok(())
    }

    /// Estimated worst-case wall time of a full sweep
    pub fn estimated_duration(&self) -> Duration {
        let wait = Duration::from_secs(self.wait_for_registration.unwrap_or(0));
        // test runtime, then the post-test wait of duration + fixed delay
        let per_step = wait
            + self.timing.settle_delay
            + self.bandwidth.duration()
            + self.bandwidth.duration()
            + self.timing.post_test_delay;
        per_step * self.frequency_range.step_count() as u32
    }
}

fn parse_address(key: &str, value: &str) -> Result<IpAddr> {
    value
        .trim()
        .parse()
        .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", key, value, e)))
}

/// Settings the sweep core needs, taken from a validated [`Config`]
#[derive(Debug, Clone, PartialEq)]
pub struct SweepConfig {
    pub frequency_start: u32,
    pub frequency_end: u32,
    pub ap_address: IpAddr,
    pub ap_credentials: Credentials,
    pub station_address: IpAddr,
    pub wait_for_registration: Duration,
    pub valid_ping_threshold_ms: f64,
    pub signal_threshold_dbm: i32,
    pub timing: SweepTiming,
}

impl SweepConfig {
    pub fn frequency_range(&self) -> FrequencyRange {
        FrequencyRange {
            start: self.frequency_start,
            end: self.frequency_end,
        }
    }
}

impl TryFrom<&Config> for SweepConfig {
    type Error = AppError;

    fn try_from(config: &Config) -> Result<Self> {
        config.validate()?;

        // validate() guarantees the options below are populated
        let missing = |name: &str| AppError::internal(format!("{} missing after validation", name));

        Ok(Self {
            frequency_start: config.frequency_range.start,
            frequency_end: config.frequency_range.end,
            ap_address: config.ap_address.ok_or_else(|| missing("ap_address"))?,
            ap_credentials: Credentials {
                username: config.ap_username.clone(),
                password: config.ap_password.clone(),
                port: config.ap_port,
            },
            station_address: config.station_address.ok_or_else(|| missing("station_address"))?,
            wait_for_registration: Duration::from_secs(
                config.wait_for_registration.ok_or_else(|| missing("wait_for_registration"))?,
            ),
            valid_ping_threshold_ms: config.valid_ping_time_ms.ok_or_else(|| missing("valid_ping_time"))?,
            signal_threshold_dbm: config.signal_threshold_dbm,
            timing: config.timing,
        })
    }
}
