//! Ordered traversal of the frequency range

use super::qualification::qualify;
use super::runner::TestRunner;
use crate::error::Result;
use crate::gateway::DeviceGateway;
use crate::logging::SweepLogger;
use crate::models::{BandwidthTestParams, FrequencyResult, SweepConfig};
use futures::stream::{self, Stream, TryStreamExt};
use std::time::Duration;
use tokio::time::sleep;

/// Drives qualification and bandwidth tests across the configured range.
///
/// The radio is left on the last frequency that was attempted.
pub struct SweepController {
    config: SweepConfig,
    params: BandwidthTestParams,
    logger: SweepLogger,
}

/// Iteration state carried between stream items
struct SweepState<'a, G: ?Sized> {
    gateway: &'a mut G,
    remaining: std::vec::IntoIter<u32>,
    /// Wait owed before the next frequency, with the frequency that caused it
    pending_delay: Option<(u32, Duration)>,
    emitted: usize,
    qualified: usize,
    tested: usize,
    stopped: bool,
}

impl SweepController {
    pub fn new(config: SweepConfig, params: BandwidthTestParams, logger: SweepLogger) -> Self {
        Self { config, params, logger }
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    pub fn params(&self) -> &BandwidthTestParams {
        &self.params
    }

    /// Frequencies a run visits, in order
    pub fn frequencies(&self) -> Vec<u32> {
        self.config.frequency_range().frequencies().collect()
    }

    /// Wait after a frequency whose bandwidth test was attempted
    pub fn post_test_wait(&self) -> Duration {
        self.params.duration() + self.config.timing.post_test_delay
    }

    /// Sweep the range, yielding one result per frequency as it completes.
    ///
    /// Each call starts again from the first frequency. An error that ends
    /// the session is yielded once and terminates the stream.
    pub fn run<'a, G>(&'a self, gateway: &'a mut G) -> impl Stream<Item = Result<FrequencyResult>> + 'a
    where
        G: DeviceGateway + ?Sized,
    {
        let state = SweepState {
            gateway,
            remaining: self.frequencies().into_iter(),
            pending_delay: None,
            emitted: 0,
            qualified: 0,
            tested: 0,
            stopped: false,
        };

        stream::unfold(state, move |mut state| async move {
            if state.stopped {
                return None;
            }

            let Some(frequency) = state.remaining.next() else {
                self.logger
                    .log_sweep_complete(state.emitted, state.qualified, state.tested)
                    .await;
                return None;
            };

            if let Some((previous, delay)) = state.pending_delay.take() {
                self.logger.log_post_test_delay(previous, delay.as_secs()).await;
                sleep(delay).await;
            }

            match self.sweep_frequency(&mut *state.gateway, frequency).await {
                Ok(result) => {
                    state.emitted += 1;
                    if result.qualification().passed() {
                        state.qualified += 1;
                    }
                    if result.test_attempted() {
                        state.tested += 1;
                        state.pending_delay = Some((frequency, self.post_test_wait()));
                    }
                    Some((Ok(result), state))
                }
                Err(error) => {
                    state.stopped = true;
                    Some((Err(error), state))
                }
            }
        })
    }

    /// Run the whole sweep and gather every result
    pub async fn collect_all<G>(&self, gateway: &mut G) -> Result<Vec<FrequencyResult>>
    where
        G: DeviceGateway + ?Sized,
    {
        self.run(gateway).try_collect().await
    }

    async fn sweep_frequency<G>(&self, gateway: &mut G, frequency: u32) -> Result<FrequencyResult>
    where
        G: DeviceGateway + ?Sized,
    {
        let outcome = qualify(gateway, frequency, &self.config, &self.logger).await?;
        if !outcome.passed() {
            return Ok(FrequencyResult::skipped(frequency, outcome));
        }

        let runner = TestRunner::new(&self.params, &self.logger);
        match runner.run_test(gateway, frequency, self.config.station_address).await {
            Ok(samples) => Ok(FrequencyResult::tested(frequency, outcome, samples)),
            Err(error) if error.is_transient() => Ok(FrequencyResult::test_failed(frequency, outcome, error.to_string())),
            Err(error) => Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Credentials, SweepTiming};

    fn controller(start: u32, end: u32) -> SweepController {
        let config = SweepConfig {
            frequency_start: start,
            frequency_end: end,
            ap_address: "192.168.88.1".parse().unwrap(),
            ap_credentials: Credentials {
                username: "admin".to_string(),
                password: String::new(),
                port: 8728,
            },
            station_address: "192.168.88.2".parse().unwrap(),
            wait_for_registration: Duration::from_secs(30),
            valid_ping_threshold_ms: 15.0,
            signal_threshold_dbm: -70,
            timing: SweepTiming::default(),
        };
        SweepController::new(config, BandwidthTestParams::default(), SweepLogger::disabled())
    }

    #[test]
    fn test_frequencies_step_by_five() {
        assert_eq!(controller(5000, 5010).frequencies(), vec![5000, 5005, 5010]);
        assert_eq!(controller(5000, 5012).frequencies(), vec![5000, 5005, 5010]);
        assert_eq!(controller(5180, 5180).frequencies(), vec![5180]);
    }

    #[test]
    fn test_post_test_wait_adds_duration() {
        // 10 s default test plus the 3 s fixed delay
        assert_eq!(controller(5000, 5010).post_test_wait(), Duration::from_secs(13));
    }
}
