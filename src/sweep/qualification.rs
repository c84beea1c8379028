//! Per-frequency qualification: retune, wait for the station, measure,
//! decide.

use crate::error::{AppError, Result};
use crate::gateway::{DeviceGateway, RegistrationEntry};
use crate::logging::SweepLogger;
use crate::models::{QualificationOutcome, SweepConfig};
use crate::types::QualificationState;
use tokio::time::{sleep, Instant};

/// Move every wireless interface to `frequency`.
///
/// Failures on single interfaces, or on listing them, are logged and
/// swallowed. Only errors that end the session propagate.
pub async fn apply_frequency<G>(gateway: &mut G, frequency: u32, logger: &SweepLogger) -> Result<()>
where
    G: DeviceGateway + ?Sized,
{
    let interfaces = match gateway.wireless_interfaces().await {
        Ok(interfaces) => interfaces,
        Err(error) if error.is_transient() => {
            logger.log_interface_listing_failed(frequency, &error).await;
            return Ok(());
        }
        Err(error) => return Err(error),
    };

    for interface in &interfaces {
        match gateway.set_frequency(&interface.id, frequency).await {
            Ok(()) => logger.log_frequency_set(frequency, &interface.name, Ok(())).await,
            Err(error) if error.is_transient() => {
                logger.log_frequency_set(frequency, &interface.name, Err(&error)).await
            }
            Err(error) => return Err(error),
        }
    }

    Ok(())
}

/// Tracks the qualification state machine for one frequency
struct Qualification<'a> {
    frequency: u32,
    state: QualificationState,
    logger: &'a SweepLogger,
}

impl<'a> Qualification<'a> {
    fn new(frequency: u32, logger: &'a SweepLogger) -> Self {
        Self {
            frequency,
            state: QualificationState::WaitingForRegistration,
            logger,
        }
    }

    async fn advance(&mut self, next: QualificationState) {
        self.logger.log_state_transition(self.frequency, self.state, next).await;
        self.state = next;
    }
}

/// Qualify one frequency.
///
/// Sets the frequency, polls the registration table until a station shows
/// up or `wait_for_registration` runs out, then waits `settle_delay` and
/// sends a single ping probe. The pass rule is applied to the first
/// registration entry's signal and the probe's average round-trip time.
///
/// Transient device errors count as "not passing yet". Only errors that end
/// the session (see [`AppError::is_transient`]) are returned.
pub async fn qualify<G>(
    gateway: &mut G,
    frequency: u32,
    config: &SweepConfig,
    logger: &SweepLogger,
) -> Result<QualificationOutcome>
where
    G: DeviceGateway + ?Sized,
{
    apply_frequency(gateway, frequency, logger).await?;

    let mut machine = Qualification::new(frequency, logger);
    let started = Instant::now();

    let Some(stations) = wait_for_registration(gateway, frequency, config, logger, started).await? else {
        machine.advance(QualificationState::Failed).await;
        let outcome = QualificationOutcome::unregistered();
        logger.log_verdict(frequency, &outcome).await;
        return Ok(outcome);
    };

    logger
        .log_station_registered(frequency, stations.len(), started.elapsed().as_millis())
        .await;
    let signal = stations.first().and_then(|entry| entry.signal_strength_dbm);

    machine.advance(QualificationState::Settling).await;
    sleep(config.timing.settle_delay).await;

    machine.advance(QualificationState::Probing).await;
    let average_ping_ms = probe_latency(gateway, frequency, config, logger).await?;

    let outcome = QualificationOutcome::evaluate(
        signal,
        average_ping_ms,
        config.signal_threshold_dbm,
        config.valid_ping_threshold_ms,
    );
    machine.advance(outcome.final_state()).await;
    logger.log_verdict(frequency, &outcome).await;

    Ok(outcome)
}

/// Poll until the registration table is non-empty or the window closes.
/// The last poll happens at the deadline itself.
async fn wait_for_registration<G>(
    gateway: &mut G,
    frequency: u32,
    config: &SweepConfig,
    logger: &SweepLogger,
    started: Instant,
) -> Result<Option<Vec<RegistrationEntry>>>
where
    G: DeviceGateway + ?Sized,
{
    let deadline = started + config.wait_for_registration;

    loop {
        let stations = match gateway.registered_stations().await {
            Ok(stations) => stations,
            Err(error) if error.is_transient() => {
                logger.log_registration_query_failed(frequency, &error).await;
                Vec::new()
            }
            Err(error) => return Err(error),
        };

        if !stations.is_empty() {
            return Ok(Some(stations));
        }

        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }
        sleep(config.timing.poll_interval.min(deadline - now)).await;
    }
}

/// One ping probe; a transient failure reads as an infinite round trip
async fn probe_latency<G>(gateway: &mut G, frequency: u32, config: &SweepConfig, logger: &SweepLogger) -> Result<f64>
where
    G: DeviceGateway + ?Sized,
{
    match gateway
        .ping(config.ap_address, config.station_address, config.timing.ping_count)
        .await
    {
        Ok(rtt) => {
            logger.log_ping(frequency, Ok(rtt)).await;
            Ok(rtt)
        }
        Err(error) if error.is_transient() => {
            logger.log_ping(frequency, Err(&error)).await;
            Ok(f64::INFINITY)
        }
        Err(error) => Err(session_error(frequency, error)),
    }
}

fn session_error(frequency: u32, error: AppError) -> AppError {
    match error {
        AppError::Connection(message) => {
            AppError::connection(format!("Lost connection while probing {} MHz: {}", frequency, message))
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{BandwidthTestRequest, RawSample, WirelessInterface};
    use crate::models::{Credentials, SweepTiming};
    use async_trait::async_trait;
    use std::net::IpAddr;
    use std::time::Duration;

    /// Gateway whose registration table fills at a fixed offset from creation
    struct ScriptedGateway {
        created: Instant,
        register_after: Option<Duration>,
        signal: Option<i32>,
        ping: Result<f64>,
        fail_set_on: Option<&'static str>,
        registration_error: bool,
        frequencies_set: Vec<(String, u32)>,
        ping_calls: usize,
        registration_polls: usize,
    }

    impl ScriptedGateway {
        fn new(register_after: Option<u64>, signal: Option<i32>, ping: Result<f64>) -> Self {
            Self {
                created: Instant::now(),
                register_after: register_after.map(Duration::from_secs),
                signal,
                ping,
                fail_set_on: None,
                registration_error: false,
                frequencies_set: Vec::new(),
                ping_calls: 0,
                registration_polls: 0,
            }
        }
    }

    #[async_trait]
    impl DeviceGateway for ScriptedGateway {
        async fn wireless_interfaces(&mut self) -> Result<Vec<WirelessInterface>> {
            Ok(vec![
                WirelessInterface {
                    id: "*1".to_string(),
                    name: "wlan1".to_string(),
                },
                WirelessInterface {
                    id: "*2".to_string(),
                    name: "wlan2".to_string(),
                },
            ])
        }

        async fn set_frequency(&mut self, interface_id: &str, frequency: u32) -> Result<()> {
            if self.fail_set_on == Some(interface_id) {
                return Err(AppError::device("frequency not supported"));
            }
            self.frequencies_set.push((interface_id.to_string(), frequency));
            Ok(())
        }

        async fn registered_stations(&mut self) -> Result<Vec<RegistrationEntry>> {
            self.registration_polls += 1;
            if self.registration_error {
                return Err(AppError::device("registration table busy"));
            }
            match self.register_after {
                Some(after) if self.created.elapsed() >= after => Ok(vec![RegistrationEntry {
                    interface: Some("wlan1".to_string()),
                    mac_address: Some("AA:BB:CC:DD:EE:FF".to_string()),
                    signal_strength_dbm: self.signal,
                }]),
                _ => Ok(Vec::new()),
            }
        }

        async fn ping(&mut self, _source: IpAddr, _target: IpAddr, _count: u32) -> Result<f64> {
            self.ping_calls += 1;
            match &self.ping {
                Ok(rtt) => Ok(*rtt),
                Err(error) => Err(AppError::timeout(error.to_string())),
            }
        }

        async fn bandwidth_test(&mut self, _request: &BandwidthTestRequest) -> Result<Vec<RawSample>> {
            Ok(Vec::new())
        }
    }

    fn sweep_config(wait_secs: u64) -> SweepConfig {
        SweepConfig {
            frequency_start: 5000,
            frequency_end: 5010,
            ap_address: "192.168.88.1".parse().unwrap(),
            ap_credentials: Credentials {
                username: "admin".to_string(),
                password: String::new(),
                port: 8728,
            },
            station_address: "192.168.88.2".parse().unwrap(),
            wait_for_registration: Duration::from_secs(wait_secs),
            valid_ping_threshold_ms: 15.0,
            signal_threshold_dbm: -70,
            timing: SweepTiming::default(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_station_registers_and_passes() {
        let mut gateway = ScriptedGateway::new(Some(5), Some(-60), Ok(10.0));
        let logger = SweepLogger::disabled();

        let outcome = qualify(&mut gateway, 5000, &sweep_config(30), &logger).await.unwrap();

        assert!(outcome.registered());
        assert!(outcome.passed());
        assert_eq!(outcome.signal_strength_dbm(), Some(-60));
        assert_eq!(outcome.average_ping_ms(), 10.0);
        assert_eq!(gateway.ping_calls, 1);
        assert_eq!(gateway.registration_polls, 2);
        assert_eq!(
            gateway.frequencies_set,
            vec![("*1".to_string(), 5000), ("*2".to_string(), 5000)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_settle_delay_precedes_ping() {
        let mut gateway = ScriptedGateway::new(Some(0), Some(-60), Ok(10.0));
        let started = Instant::now();

        qualify(&mut gateway, 5000, &sweep_config(30), &SweepLogger::disabled())
            .await
            .unwrap();

        assert!(started.elapsed() >= SweepTiming::default().settle_delay);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_registration_means_no_ping() {
        let mut gateway = ScriptedGateway::new(None, Some(-60), Ok(10.0));
        let started = Instant::now();

        let outcome = qualify(&mut gateway, 5000, &sweep_config(12), &SweepLogger::disabled())
            .await
            .unwrap();

        assert!(!outcome.registered());
        assert!(!outcome.passed());
        assert_eq!(gateway.ping_calls, 0);
        // polls at 0s, 5s, 10s and at the 12s deadline
        assert_eq!(gateway.registration_polls, 4);
        let waited = started.elapsed();
        assert!(waited >= Duration::from_secs(12) && waited < Duration::from_secs(13));
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_signal_fails_regardless_of_ping() {
        let mut gateway = ScriptedGateway::new(Some(0), None, Ok(1.0));

        let outcome = qualify(&mut gateway, 5000, &sweep_config(30), &SweepLogger::disabled())
            .await
            .unwrap();

        assert!(outcome.registered());
        assert!(!outcome.passed());
        assert_eq!(gateway.ping_calls, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_ping_reads_as_infinite() {
        let mut gateway = ScriptedGateway::new(Some(0), Some(-40), Err(AppError::timeout("no replies")));

        let outcome = qualify(&mut gateway, 5000, &sweep_config(30), &SweepLogger::disabled())
            .await
            .unwrap();

        assert!(outcome.average_ping_ms().is_infinite());
        assert!(!outcome.passed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_failure_on_one_interface_continues() {
        let mut gateway = ScriptedGateway::new(Some(0), Some(-60), Ok(5.0));
        gateway.fail_set_on = Some("*1");

        let outcome = qualify(&mut gateway, 5005, &sweep_config(30), &SweepLogger::disabled())
            .await
            .unwrap();

        assert!(outcome.passed());
        assert_eq!(gateway.frequencies_set, vec![("*2".to_string(), 5005)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_registration_errors_count_as_empty() {
        let mut gateway = ScriptedGateway::new(Some(0), Some(-60), Ok(5.0));
        gateway.registration_error = true;

        let outcome = qualify(&mut gateway, 5000, &sweep_config(10), &SweepLogger::disabled())
            .await
            .unwrap();

        assert!(!outcome.registered());
        assert_eq!(gateway.ping_calls, 0);
    }
}
