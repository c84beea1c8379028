//! Result record formatting for the results file

use super::table::{Column, Table};
use crate::error::{AppError, Result};
use crate::models::{FrequencyResult, ReportFormat, SweepConfig};
use serde::Serialize;
use std::net::IpAddr;

/// Sample fields written to the sample table, in column order
pub const SAMPLE_COLUMNS: &[&str] = &[
    "status",
    "duration",
    "tx-current",
    "tx-10-second-average",
    "tx-total-average",
    "rx-current",
    "rx-10-second-average",
    "rx-total-average",
    "random-data",
    "direction",
    "connection-count",
    ".section",
    "local-cpu-load",
    "remote-cpu-load",
];

/// Sweep-wide values repeated in every record
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReportContext {
    pub ap_address: IpAddr,
    pub station_address: IpAddr,
}

impl From<&SweepConfig> for ReportContext {
    fn from(config: &SweepConfig) -> Self {
        Self {
            ap_address: config.ap_address,
            station_address: config.station_address,
        }
    }
}

/// Turns one frequency result into the text appended to the results file
pub trait ReportFormatter: Send + Sync {
    fn format_record(&self, result: &FrequencyResult, context: &ReportContext) -> Result<String>;
}

/// Parameter table followed by the bandwidth sample table
#[derive(Debug, Default, Clone)]
pub struct TableFormatter;

impl TableFormatter {
    pub fn new() -> Self {
        Self
    }

    fn parameter_table(result: &FrequencyResult, context: &ReportContext) -> Table {
        let qualification = result.qualification();
        let ping = qualification.average_ping_ms();

        let mut table = Table::new(vec![Column::left("Parameter", 23), Column::left("Value", 25)]);
        let mut row = |name: &str, value: String| table.push_row(vec![name.to_string(), value]);

        row("Frequency", format!("{} MHz", result.frequency()));
        row(
            "Average Ping Time",
            if ping.is_finite() {
                format!("{:.2} ms", ping)
            } else {
                "-".to_string()
            },
        );
        row(
            "Signal",
            qualification
                .signal_strength_dbm()
                .map(|dbm| format!("{} dBm", dbm))
                .unwrap_or_else(|| "-".to_string()),
        );
        row("AP IP", context.ap_address.to_string());
        row("Station IP", context.station_address.to_string());
        row("Registered", if qualification.registered() { "yes" } else { "no" }.to_string());
        row("Test Status", result.test_status().to_string());
        if let Some(error) = result.test_error() {
            row("Test Error", error.to_string());
        }
        row("Timestamp", result.timestamp().format("%Y-%m-%d %H:%M:%S UTC").to_string());

        table
    }

    fn sample_table(result: &FrequencyResult) -> Table {
        let mut table = Table::new(SAMPLE_COLUMNS.iter().map(|name| Column::left(name, 0)).collect());
        for sample in result.bandwidth_samples() {
            table.push_row(
                SAMPLE_COLUMNS
                    .iter()
                    .map(|name| sample.get(name).map(|value| value.display()).unwrap_or_else(|| "-".to_string()))
                    .collect(),
            );
        }
        table
    }
}

impl ReportFormatter for TableFormatter {
    fn format_record(&self, result: &FrequencyResult, context: &ReportContext) -> Result<String> {
        let mut output = Self::parameter_table(result, context).render();
        output.push_str("\n\n");

        let samples = Self::sample_table(result);
        if samples.is_empty() {
            output.push_str("No bandwidth samples recorded.\n");
        } else {
            output.push_str(&samples.render());
            output.push('\n');
        }
        output.push('\n');
        Ok(output)
    }
}

/// One JSON object per line
#[derive(Debug, Default, Clone)]
pub struct JsonFormatter;

impl JsonFormatter {
    pub fn new() -> Self {
        Self
    }
}

#[derive(Serialize)]
struct JsonRecord<'a> {
    #[serde(flatten)]
    context: &'a ReportContext,
    #[serde(flatten)]
    result: &'a FrequencyResult,
}

impl ReportFormatter for JsonFormatter {
    fn format_record(&self, result: &FrequencyResult, context: &ReportContext) -> Result<String> {
        let record = JsonRecord { context, result };
        let mut line = serde_json::to_string(&record)
            .map_err(|e| AppError::internal(format!("Failed to serialize result for {} MHz: {}", result.frequency(), e)))?;
        line.push('\n');
        Ok(line)
    }
}

/// Formatter factory keyed by the configured report format
pub struct ReportFormatterFactory;

impl ReportFormatterFactory {
    pub fn create(format: ReportFormat) -> Box<dyn ReportFormatter> {
        match format {
            ReportFormat::Table => Box::new(TableFormatter::new()),
            ReportFormat::Json => Box::new(JsonFormatter::new()),
        }
    }
}
