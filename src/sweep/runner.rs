//! Bandwidth test execution

use crate::error::Result;
use crate::gateway::{BandwidthTestRequest, DeviceGateway};
use crate::logging::SweepLogger;
use crate::models::{BandwidthSample, BandwidthTestParams};
use std::net::IpAddr;

/// Runs the device's bandwidth test against the station and normalises the
/// samples it returns
pub struct TestRunner<'a> {
    params: &'a BandwidthTestParams,
    logger: &'a SweepLogger,
}

impl<'a> TestRunner<'a> {
    pub fn new(params: &'a BandwidthTestParams, logger: &'a SweepLogger) -> Self {
        Self { params, logger }
    }

    /// Translate the sweep's test parameters into the device request
    pub fn build_request(params: &BandwidthTestParams, station: IpAddr) -> BandwidthTestRequest {
        BandwidthTestRequest {
            address: station,
            protocol: params.protocol.as_keyword().to_string(),
            direction: params.direction.as_keyword().to_string(),
            duration_seconds: params.duration_seconds,
            local_tx_speed: params.local_limit.as_attribute(),
            remote_tx_speed: params.remote_limit.as_attribute(),
        }
    }

    /// Run one test. Errors are returned unchanged; no retry.
    pub async fn run_test<G>(&self, gateway: &mut G, frequency: u32, station: IpAddr) -> Result<Vec<BandwidthSample>>
    where
        G: DeviceGateway + ?Sized,
    {
        let request = Self::build_request(self.params, station);
        self.logger.log_test_started(frequency, &request).await;

        match gateway.bandwidth_test(&request).await {
            Ok(raw) => {
                let samples: Vec<BandwidthSample> = raw
                    .iter()
                    .map(|record| BandwidthSample::from_raw(record).normalized())
                    .collect();
                self.logger.log_test_finished(frequency, Ok(samples.len())).await;
                Ok(samples)
            }
            Err(error) => {
                self.logger.log_test_finished(frequency, Err(&error)).await;
                Err(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::gateway::{RawSample, RegistrationEntry, WirelessInterface};
    use crate::models::SampleValue;
    use crate::types::{Direction, Protocol, RateLimit, RateUnit};
    use async_trait::async_trait;

    struct BandwidthOnlyGateway {
        samples: Vec<RawSample>,
        fail: bool,
        requests: Vec<BandwidthTestRequest>,
    }

    #[async_trait]
    impl DeviceGateway for BandwidthOnlyGateway {
        async fn wireless_interfaces(&mut self) -> Result<Vec<WirelessInterface>> {
            Ok(Vec::new())
        }

        async fn set_frequency(&mut self, _interface_id: &str, _frequency: u32) -> Result<()> {
            Ok(())
        }

        async fn registered_stations(&mut self) -> Result<Vec<RegistrationEntry>> {
            Ok(Vec::new())
        }

        async fn ping(&mut self, _source: IpAddr, _target: IpAddr, _count: u32) -> Result<f64> {
            Ok(1.0)
        }

        async fn bandwidth_test(&mut self, request: &BandwidthTestRequest) -> Result<Vec<RawSample>> {
            self.requests.push(request.clone());
            if self.fail {
                return Err(AppError::device("test already running"));
            }
            Ok(self.samples.clone())
        }
    }

    fn raw(pairs: &[(&str, &str)]) -> RawSample {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn station() -> IpAddr {
        "10.0.0.2".parse().unwrap()
    }

    #[test]
    fn test_build_request_maps_direction_and_limits() {
        let params = BandwidthTestParams {
            protocol: Protocol::Udp,
            direction: Direction::Send,
            local_limit: RateLimit::Mbps(50),
            remote_limit: RateLimit::Unlimited,
            duration_seconds: 15,
        };

        let request = TestRunner::build_request(&params, station());
        assert_eq!(request.address, station());
        assert_eq!(request.protocol, "udp");
        assert_eq!(request.direction, "transmit");
        assert_eq!(request.duration_seconds, 15);
        assert_eq!(request.local_tx_speed.as_deref(), Some("50M"));
        assert_eq!(request.remote_tx_speed, None);
    }

    #[test]
    fn test_build_request_unlimited_omits_speeds() {
        let request = TestRunner::build_request(&BandwidthTestParams::default(), station());
        assert_eq!(request.protocol, "tcp");
        assert_eq!(request.direction, "both");
        assert!(request.local_tx_speed.is_none());
        assert!(request.remote_tx_speed.is_none());
    }

    #[tokio::test]
    async fn test_run_test_normalizes_samples() {
        let mut gateway = BandwidthOnlyGateway {
            samples: vec![
                raw(&[("status", "running"), ("tx-current", "25000000"), ("rx-current", "")]),
                raw(&[("status", "done testing"), ("tx-total-average", "48000000"), ("rx-total-average", "12500000")]),
            ],
            fail: false,
            requests: Vec::new(),
        };
        let params = BandwidthTestParams::default();
        let logger = SweepLogger::disabled();

        let samples = TestRunner::new(&params, &logger)
            .run_test(&mut gateway, 5180, station())
            .await
            .unwrap();

        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].unit(), RateUnit::MegabitsPerSecond);
        assert_eq!(samples[0].get("tx-current"), Some(&SampleValue::Measured(25.0)));
        assert_eq!(samples[0].get("rx-current"), Some(&SampleValue::NotApplicable));
        assert_eq!(samples[1].get("tx-total-average"), Some(&SampleValue::Measured(48.0)));
        assert_eq!(samples[1].get("rx-total-average"), Some(&SampleValue::Measured(12.5)));
        assert_eq!(gateway.requests.len(), 1);
    }

    #[tokio::test]
    async fn test_run_test_propagates_error_without_retry() {
        let mut gateway = BandwidthOnlyGateway {
            samples: Vec::new(),
            fail: true,
            requests: Vec::new(),
        };
        let params = BandwidthTestParams::default();
        let logger = SweepLogger::disabled();

        let error = TestRunner::new(&params, &logger)
            .run_test(&mut gateway, 5180, station())
            .await
            .unwrap_err();

        assert!(matches!(error, AppError::Device(_)));
        assert_eq!(gateway.requests.len(), 1);
    }
}
