//! Data models and structures for the frequency sweep tester

pub mod config;
pub mod results;

// Re-export main model types
pub use config::{
    BandwidthTestParams, Config, Credentials, FrequencyRange, ReportFormat, SweepConfig, SweepTiming,
    FREQUENCY_STEP,
};
pub use results::{BandwidthSample, FrequencyResult, QualificationOutcome, SampleValue, MISSING_SIGNAL_DBM};
