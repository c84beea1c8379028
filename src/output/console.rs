//! Live console output for a running sweep

use crate::gateway::BandwidthTestRequest;
use crate::models::{BandwidthTestParams, FrequencyResult, SweepConfig};
use crate::types::TestStatus;
use colored::*;
use std::time::Duration;

/// Colors used for console lines
#[derive(Debug, Clone)]
pub struct ColorScheme {
    pub header: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub muted: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            header: Color::Blue,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            muted: Color::BrightBlack,
        }
    }
}

/// Prints the sweep plan, one line per frequency and the closing summary
pub struct ConsoleReporter {
    use_colors: bool,
    verbose: bool,
    scheme: ColorScheme,
}

impl ConsoleReporter {
    pub fn new(use_colors: bool, verbose: bool) -> Self {
        Self {
            use_colors,
            verbose,
            scheme: ColorScheme::default(),
        }
    }

    fn paint(&self, text: &str, color: Color) -> String {
        if self.use_colors {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn bold(&self, text: &str) -> String {
        if self.use_colors {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    }

    /// Header printed before the first frequency
    pub fn format_header(&self, config: &SweepConfig, params: &BandwidthTestParams) -> String {
        let range = config.frequency_range();
        let mut lines = vec![self.paint(&self.bold("Frequency Sweep"), self.scheme.header)];
        lines.push(format!(
            "  AP {} -> station {}, {} MHz ({} frequencies)",
            config.ap_address,
            config.station_address,
            range,
            range.step_count()
        ));
        lines.push(format!(
            "  pass: signal > {} dBm, ping < {} ms within {}s of registration",
            config.signal_threshold_dbm,
            config.valid_ping_threshold_ms,
            config.wait_for_registration.as_secs()
        ));
        lines.push(format!(
            "  test: {} {} for {}s (local {}, remote {})",
            params.protocol, params.direction, params.duration_seconds, params.local_limit, params.remote_limit
        ));
        lines.join("\n")
    }

    /// Dry-run description of what a sweep would do
    pub fn format_plan(
        &self,
        config: &SweepConfig,
        params: &BandwidthTestParams,
        request: &BandwidthTestRequest,
        estimate: Duration,
    ) -> String {
        let mut lines = vec![self.format_header(config, params)];

        let frequencies: Vec<String> = config.frequency_range().frequencies().map(|f| f.to_string()).collect();
        lines.push(format!("  frequencies: {}", frequencies.join(", ")));

        let attributes: Vec<String> = request
            .attributes()
            .into_iter()
            .map(|(name, value)| format!("={}={}", name, value))
            .collect();
        lines.push(format!("  request: /tool/bandwidth-test {}", attributes.join(" ")));
        lines.push(format!("  worst case: {}", format_elapsed(estimate)));
        lines.push(self.paint("Dry run: no connection was made.", self.scheme.muted));
        lines.join("\n")
    }

    /// One line for a finished frequency
    pub fn format_result(&self, result: &FrequencyResult, config: &SweepConfig) -> String {
        let outcome = result.qualification();
        let verdict = if outcome.passed() {
            self.paint("PASS", self.scheme.success)
        } else {
            self.paint("FAIL", self.scheme.error)
        };

        let signal = outcome
            .signal_strength_dbm()
            .map(|dbm| format!("{} dBm", dbm))
            .unwrap_or_else(|| "-".to_string());
        let ping = outcome.average_ping_ms();
        let ping = if ping.is_finite() {
            format!("{:.2} ms", ping)
        } else {
            "-".to_string()
        };

        let mut line = format!(
            "{:>5} MHz  {}  signal {:>8}  ping {:>9}",
            result.frequency(),
            verdict,
            signal,
            ping
        );

        match result.test_status() {
            TestStatus::Skipped => {
                if self.verbose {
                    if let Some(reason) =
                        outcome.failure_reason(config.signal_threshold_dbm, config.valid_ping_threshold_ms)
                    {
                        line.push_str(&self.paint(&format!("  ({})", reason), self.scheme.muted));
                    }
                }
            }
            TestStatus::Completed => {
                let metric = |field: &str| {
                    result
                        .final_metric(field)
                        .map(|mbps| format!("{:.2}", mbps))
                        .unwrap_or_else(|| "-".to_string())
                };
                line.push_str(&format!(
                    "  tx {} / rx {} Mbps",
                    metric("tx-total-average"),
                    metric("rx-total-average")
                ));
            }
            TestStatus::Failed => {
                let error = result.test_error().unwrap_or("unknown error");
                line.push_str(&self.paint(&format!("  test failed: {}", error), self.scheme.warning));
            }
        }

        line
    }

    /// Closing summary
    pub fn format_summary(&self, summary: &SweepSummary) -> String {
        let mut lines = vec![self.paint(&self.bold("Summary"), self.scheme.header)];
        lines.push(format!(
            "  {} frequencies swept, {} qualified, {} tested ({} completed, {} failed)",
            summary.total, summary.qualified, summary.tested, summary.completed, summary.failed
        ));

        match summary.best {
            Some((frequency, mbps)) => lines.push(format!(
                "  best: {} at {:.2} Mbps",
                self.paint(&format!("{} MHz", frequency), self.scheme.success),
                mbps
            )),
            None if summary.qualified == 0 => {
                lines.push(self.paint("  no frequency qualified", self.scheme.warning))
            }
            None => {}
        }

        lines.join("\n")
    }
}

/// Running totals over a sweep
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SweepSummary {
    pub total: usize,
    pub qualified: usize,
    pub tested: usize,
    pub completed: usize,
    pub failed: usize,
    /// Frequency with the highest mean of final tx/rx total averages
    pub best: Option<(u32, f64)>,
}

impl SweepSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_results<'a>(results: impl IntoIterator<Item = &'a FrequencyResult>) -> Self {
        let mut summary = Self::new();
        for result in results {
            summary.record(result);
        }
        summary
    }

    pub fn record(&mut self, result: &FrequencyResult) {
        self.total += 1;
        if result.qualification().passed() {
            self.qualified += 1;
        }

        match result.test_status() {
            TestStatus::Skipped => return,
            TestStatus::Completed => self.completed += 1,
            TestStatus::Failed => self.failed += 1,
        }
        self.tested += 1;

        let totals: Vec<f64> = ["tx-total-average", "rx-total-average"]
            .iter()
            .filter_map(|field| result.final_metric(field))
            .collect();
        if totals.is_empty() {
            return;
        }
        let mean = totals.iter().sum::<f64>() / totals.len() as f64;
        if self.best.map_or(true, |(_, best)| mean > best) {
            self.best = Some((result.frequency(), mean));
        }
    }
}

fn format_elapsed(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{}h {:02}m {:02}s", secs / 3600, (secs % 3600) / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BandwidthSample, Credentials, QualificationOutcome, SweepTiming};
    use crate::sweep::TestRunner;
    use std::collections::BTreeMap;

    fn sweep_config() -> SweepConfig {
        SweepConfig {
            frequency_start: 5000,
            frequency_end: 5010,
            ap_address: "10.0.0.1".parse().unwrap(),
            ap_credentials: Credentials {
                username: "admin".to_string(),
                password: String::new(),
                port: 8728,
            },
            station_address: "10.0.0.2".parse().unwrap(),
            wait_for_registration: Duration::from_secs(30),
            valid_ping_threshold_ms: 15.0,
            signal_threshold_dbm: -70,
            timing: SweepTiming::default(),
        }
    }

    fn tested(frequency: u32, tx: &str, rx: &str) -> FrequencyResult {
        let raw: BTreeMap<String, String> = [("tx-total-average", tx), ("rx-total-average", rx)]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        FrequencyResult::tested(
            frequency,
            QualificationOutcome::evaluate(Some(-60), 4.0, -70, 15.0),
            vec![BandwidthSample::from_raw(&raw).normalized()],
        )
    }

    #[test]
    fn test_summary_counts_and_best() {
        let results = vec![
            FrequencyResult::skipped(5000, QualificationOutcome::unregistered()),
            tested(5005, "40000000", "20000000"),
            tested(5010, "50000000", "30000000"),
            FrequencyResult::test_failed(
                5015,
                QualificationOutcome::evaluate(Some(-60), 4.0, -70, 15.0),
                "interrupted".to_string(),
            ),
        ];

        let summary = SweepSummary::from_results(&results);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.qualified, 3);
        assert_eq!(summary.tested, 3);
        assert_eq!(summary.completed, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.best, Some((5010, 40.0)));
    }

    #[test]
    fn test_summary_with_one_sided_metric() {
        let summary = SweepSummary::from_results(&[tested(5005, "-", "12000000")]);
        assert_eq!(summary.best, Some((5005, 12.0)));
    }

    #[test]
    fn test_result_lines() {
        let reporter = ConsoleReporter::new(false, true);
        let config = sweep_config();

        let line = reporter.format_result(&tested(5005, "40000000", "20000000"), &config);
        assert!(line.contains("5005 MHz"));
        assert!(line.contains("PASS"));
        assert!(line.contains("tx 40.00 / rx 20.00 Mbps"));

        let skipped = FrequencyResult::skipped(5000, QualificationOutcome::unregistered());
        let line = reporter.format_result(&skipped, &config);
        assert!(line.contains("FAIL"));
        assert!(line.contains("station did not register"));
    }

    #[test]
    fn test_plan_lists_frequencies_and_request() {
        let reporter = ConsoleReporter::new(false, false);
        let config = sweep_config();
        let params = BandwidthTestParams::default();
        let request = TestRunner::build_request(&params, config.station_address);

        let plan = reporter.format_plan(&config, &params, &request, Duration::from_secs(3725));
        assert!(plan.contains("frequencies: 5000, 5005, 5010"));
        assert!(plan.contains("=address=10.0.0.2"));
        assert!(plan.contains("1h 02m 05s"));
        assert!(plan.contains("Dry run"));
    }

    #[test]
    fn test_summary_without_qualified_frequency() {
        let reporter = ConsoleReporter::new(false, false);
        let summary = SweepSummary::from_results(&[FrequencyResult::skipped(5000, QualificationOutcome::unregistered())]);
        assert!(reporter.format_summary(&summary).contains("no frequency qualified"));
    }
}
