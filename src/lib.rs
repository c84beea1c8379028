//! Frequency Sweep Tester
//!
//! Sweeps a frequency range on a RouterOS wireless access point. At each
//! step it waits for the remote station to re-register, checks signal
//! strength and latency against thresholds, and runs a bandwidth test on
//! the frequencies that qualify.

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod models;
pub mod output;
pub mod sweep;
pub mod types;

// Re-export commonly used types
pub use error::{AppError, Result};
pub use gateway::{BandwidthTestRequest, DeviceGateway, RouterOsGateway};
pub use models::{BandwidthSample, Config, FrequencyResult, QualificationOutcome, SampleValue, SweepConfig};
pub use output::{ConsoleReporter, JsonFormatter, ReportFormatter, ResultFileSink, SweepSummary, TableFormatter};
pub use sweep::{qualify, SweepController, TestRunner};

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Default configuration values
pub mod defaults {
    use std::time::Duration;

    pub const DEFAULT_FREQUENCY_START: u32 = 4900;
    pub const DEFAULT_FREQUENCY_END: u32 = 6100;
    pub const DEFAULT_API_PORT: u16 = 8728;
    pub const DEFAULT_USERNAME: &str = "admin";
    pub const DEFAULT_SIGNAL_THRESHOLD_DBM: i32 = -70;
    pub const DEFAULT_RESULTS_FILE: &str = "Results.txt";
    pub const DEFAULT_CONFIG_FILE: &str = "config.json";
    pub const DEFAULT_ENABLE_COLOR: bool = true;

    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
    pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(20);
    pub const DEFAULT_POST_TEST_DELAY: Duration = Duration::from_secs(3);
    pub const DEFAULT_PING_COUNT: u32 = 4;
    pub const DEFAULT_TEST_DURATION_SECS: u32 = 10;

    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
    /// Wait for one reply sentence; a bandwidth test adds its duration to it
    pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(60);
}
