//! Per-frequency result records produced by a sweep

use crate::types::{QualificationState, RateUnit, TestStatus};
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Signal strength assumed when the registration entry has none
pub const MISSING_SIGNAL_DBM: i32 = -999;

/// Sample fields reported in bits per second by the device
pub const THROUGHPUT_FIELDS: &[&str] = &[
    "tx-current",
    "tx-10-second-average",
    "tx-total-average",
    "rx-current",
    "rx-10-second-average",
    "rx-total-average",
];

const BITS_PER_MEGABIT: f64 = 1_000_000.0;

/// Result of qualifying one frequency.
///
/// `passed` is computed by the constructors and cannot be set on its own.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualificationOutcome {
    registered: bool,
    signal_strength_dbm: Option<i32>,
    #[serde(serialize_with = "finite_or_null")]
    average_ping_ms: f64,
    passed: bool,
}

impl QualificationOutcome {
    /// The station never showed up in the registration table
    pub fn unregistered() -> Self {
        Self {
            registered: false,
            signal_strength_dbm: None,
            average_ping_ms: f64::INFINITY,
            passed: false,
        }
    }

    /// Apply the pass rule to a registered station's measurements
    pub fn evaluate(
        signal_strength_dbm: Option<i32>,
        average_ping_ms: f64,
        signal_threshold_dbm: i32,
        ping_threshold_ms: f64,
    ) -> Self {
        let signal = signal_strength_dbm.unwrap_or(MISSING_SIGNAL_DBM);
        let passed = signal > signal_threshold_dbm && average_ping_ms < ping_threshold_ms;

        Self {
            registered: true,
            signal_strength_dbm,
            average_ping_ms,
            passed,
        }
    }

    pub fn registered(&self) -> bool {
        self.registered
    }

    pub fn signal_strength_dbm(&self) -> Option<i32> {
        self.signal_strength_dbm
    }

    /// Average round-trip time, `f64::INFINITY` when no probe succeeded
    pub fn average_ping_ms(&self) -> f64 {
        self.average_ping_ms
    }

    pub fn passed(&self) -> bool {
        self.passed
    }

    /// Terminal state reached by the qualification loop
    pub fn final_state(&self) -> QualificationState {
        if self.passed {
            QualificationState::Passed
        } else {
            QualificationState::Failed
        }
    }

    /// Short human readable reason for a failed qualification
    pub fn failure_reason(&self, signal_threshold_dbm: i32, ping_threshold_ms: f64) -> Option<String> {
        if self.passed {
            return None;
        }
        if !self.registered {
            return Some("station did not register".to_string());
        }

        let mut reasons = Vec::new();
        match self.signal_strength_dbm {
            None => reasons.push("signal strength not reported".to_string()),
            Some(signal) if signal <= signal_threshold_dbm => {
                reasons.push(format!("signal {} dBm <= {} dBm", signal, signal_threshold_dbm))
            }
            Some(_) => {}
        }
        if !self.average_ping_ms.is_finite() {
            reasons.push("ping failed".to_string());
        } else if self.average_ping_ms >= ping_threshold_ms {
            reasons.push(format!("ping {:.1} ms >= {:.1} ms", self.average_ping_ms, ping_threshold_ms));
        }
        Some(reasons.join(", "))
    }
}

fn finite_or_null<S: Serializer>(value: &f64, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    if value.is_finite() {
        serializer.serialize_some(value)
    } else {
        serializer.serialize_none()
    }
}

/// One field of a bandwidth test sample, classified once at ingestion
#[derive(Debug, Clone, PartialEq)]
pub enum SampleValue {
    Measured(f64),
    Text(String),
    NotApplicable,
}

impl Serialize for SampleValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            SampleValue::Measured(number) => serializer.serialize_f64(*number),
            SampleValue::Text(text) => serializer.serialize_str(text),
            SampleValue::NotApplicable => serializer.serialize_str("-"),
        }
    }
}

impl SampleValue {
    /// Classify a raw device value: `-` or empty means not applicable
    pub fn from_device(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == "-" {
            return SampleValue::NotApplicable;
        }
        match trimmed.parse::<f64>() {
            Ok(number) if number.is_finite() => SampleValue::Measured(number),
            _ => SampleValue::Text(trimmed.to_string()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            SampleValue::Measured(number) => Some(*number),
            _ => None,
        }
    }

    /// Table cell text; not-applicable values render as `-`
    pub fn display(&self) -> String {
        match self {
            SampleValue::Measured(number) => {
                if number.fract() == 0.0 {
                    format!("{}", number)
                } else {
                    format!("{:.3}", number)
                }
            }
            SampleValue::Text(text) => text.clone(),
            SampleValue::NotApplicable => "-".to_string(),
        }
    }
}

/// One sample emitted by the device during a bandwidth test
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandwidthSample {
    unit: RateUnit,
    fields: BTreeMap<String, SampleValue>,
}

impl BandwidthSample {
    /// Ingest a raw device record; throughput fields stay in bits per second
    pub fn from_raw<'a, I>(raw: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        let fields = raw
            .into_iter()
            .map(|(key, value)| (key.clone(), SampleValue::from_device(value)))
            .collect();

        Self {
            unit: RateUnit::BitsPerSecond,
            fields,
        }
    }

    pub fn unit(&self) -> RateUnit {
        self.unit
    }

    pub fn get(&self, field: &str) -> Option<&SampleValue> {
        self.fields.get(field)
    }

    pub fn fields(&self) -> &BTreeMap<String, SampleValue> {
        &self.fields
    }

    /// Convert throughput fields to megabits per second.
    ///
    /// Only `Measured` throughput values change; text and not-applicable
    /// fields are kept as they are. A sample already in Mbps is returned
    /// unchanged.
    pub fn normalized(mut self) -> Self {
        if self.unit == RateUnit::MegabitsPerSecond {
            return self;
        }

        for field in THROUGHPUT_FIELDS {
            if let Some(SampleValue::Measured(bits)) = self.fields.get_mut(*field) {
                *bits /= BITS_PER_MEGABIT;
            }
        }
        self.unit = RateUnit::MegabitsPerSecond;
        self
    }
}

/// Everything recorded for one swept frequency
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencyResult {
    frequency: u32,
    qualification: QualificationOutcome,
    bandwidth_samples: Vec<BandwidthSample>,
    test_status: TestStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    test_error: Option<String>,
    timestamp: DateTime<Utc>,
}

impl FrequencyResult {
    /// Qualification failed; no bandwidth test was run
    pub fn skipped(frequency: u32, qualification: QualificationOutcome) -> Self {
        Self::build(frequency, qualification, Vec::new(), TestStatus::Skipped, None)
    }

    /// Bandwidth test completed with the given (normalized) samples
    pub fn tested(frequency: u32, qualification: QualificationOutcome, samples: Vec<BandwidthSample>) -> Self {
        Self::build(frequency, qualification, samples, TestStatus::Completed, None)
    }

    /// The bandwidth test was attempted but the device reported an error
    pub fn test_failed(frequency: u32, qualification: QualificationOutcome, error: String) -> Self {
        Self::build(frequency, qualification, Vec::new(), TestStatus::Failed, Some(error))
    }

    fn build(
        frequency: u32,
        qualification: QualificationOutcome,
        bandwidth_samples: Vec<BandwidthSample>,
        test_status: TestStatus,
        test_error: Option<String>,
    ) -> Self {
        Self {
            frequency,
            qualification,
            bandwidth_samples,
            test_status,
            test_error,
            timestamp: Utc::now(),
        }
    }

    pub fn frequency(&self) -> u32 {
        self.frequency
    }

    pub fn qualification(&self) -> &QualificationOutcome {
        &self.qualification
    }

    pub fn bandwidth_samples(&self) -> &[BandwidthSample] {
        &self.bandwidth_samples
    }

    pub fn test_status(&self) -> TestStatus {
        self.test_status
    }

    pub fn test_error(&self) -> Option<&str> {
        self.test_error.as_deref()
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Whether a bandwidth test was started for this frequency
    pub fn test_attempted(&self) -> bool {
        self.test_status != TestStatus::Skipped
    }

    /// Value of `field` in the last sample, which carries the device's
    /// totals for the run
    pub fn final_metric(&self, field: &str) -> Option<f64> {
        self.bandwidth_samples
            .iter()
            .rev()
            .find_map(|sample| sample.get(field).and_then(SampleValue::as_number))
    }
}
