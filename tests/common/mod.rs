//! Shared in-memory access point for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use freq_sweep_tester::gateway::{
    BandwidthTestRequest, DeviceGateway, RawSample, RegistrationEntry, WirelessInterface,
};
use freq_sweep_tester::models::{BandwidthTestParams, Credentials, SweepConfig, SweepTiming};
use freq_sweep_tester::{AppError, Result};
use std::collections::{BTreeMap, HashSet};
use std::net::IpAddr;
use std::time::Duration;
use tokio::time::Instant;

/// Scripted access point.
///
/// The station re-registers `register_after` after every frequency change
/// unless the current frequency is listed in `never_registers`.
pub struct MockGateway {
    pub register_after: Duration,
    pub signal: Option<i32>,
    pub ping_ms: f64,
    pub never_registers: HashSet<u32>,
    pub ping_fails_on: HashSet<u32>,
    pub test_fails_on: HashSet<u32>,
    /// Interface ids whose frequency change is rejected
    pub rejecting_interfaces: HashSet<String>,
    /// Frequency change that drops the connection
    pub disconnect_on: Option<u32>,
    pub interfaces: Vec<WirelessInterface>,
    pub samples: Vec<RawSample>,

    pub current_frequency: Option<u32>,
    pub retuned_at: Option<Instant>,
    pub frequency_changes: Vec<(String, u32)>,
    pub test_requests: Vec<(u32, Instant, BandwidthTestRequest)>,
    pub ping_calls: usize,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            register_after: Duration::from_secs(5),
            signal: Some(-60),
            ping_ms: 10.0,
            never_registers: HashSet::new(),
            ping_fails_on: HashSet::new(),
            test_fails_on: HashSet::new(),
            rejecting_interfaces: HashSet::new(),
            disconnect_on: None,
            interfaces: vec![WirelessInterface {
                id: "*1".to_string(),
                name: "wlan1".to_string(),
            }],
            samples: vec![
                sample(&[
                    ("status", "running"),
                    ("tx-total-average", "40000000"),
                    ("rx-total-average", "20000000"),
                ]),
                sample(&[
                    ("status", "done testing"),
                    ("tx-total-average", "48000000"),
                    ("rx-total-average", "22000000"),
                ]),
            ],
            current_frequency: None,
            retuned_at: None,
            frequency_changes: Vec::new(),
            test_requests: Vec::new(),
            ping_calls: 0,
        }
    }

    pub fn tested_frequencies(&self) -> Vec<u32> {
        self.test_requests.iter().map(|(frequency, _, _)| *frequency).collect()
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

pub fn sample(pairs: &[(&str, &str)]) -> RawSample {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect::<BTreeMap<_, _>>()
}

#[async_trait]
impl DeviceGateway for MockGateway {
    async fn wireless_interfaces(&mut self) -> Result<Vec<WirelessInterface>> {
        Ok(self.interfaces.clone())
    }

    async fn set_frequency(&mut self, interface_id: &str, frequency: u32) -> Result<()> {
        if self.disconnect_on == Some(frequency) {
            return Err(AppError::connection("connection reset by peer"));
        }
        if self.rejecting_interfaces.contains(interface_id) {
            return Err(AppError::device("failure: frequency not supported"));
        }
        self.frequency_changes.push((interface_id.to_string(), frequency));
        self.current_frequency = Some(frequency);
        self.retuned_at = Some(Instant::now());
        Ok(())
    }

    async fn registered_stations(&mut self) -> Result<Vec<RegistrationEntry>> {
        let (Some(frequency), Some(retuned_at)) = (self.current_frequency, self.retuned_at) else {
            return Ok(Vec::new());
        };
        if self.never_registers.contains(&frequency) || retuned_at.elapsed() < self.register_after {
            return Ok(Vec::new());
        }
        Ok(vec![RegistrationEntry {
            interface: Some("wlan1".to_string()),
            mac_address: Some("4C:5E:0C:11:22:33".to_string()),
            signal_strength_dbm: self.signal,
        }])
    }

    async fn ping(&mut self, _source: IpAddr, _target: IpAddr, _count: u32) -> Result<f64> {
        self.ping_calls += 1;
        match self.current_frequency {
            Some(frequency) if self.ping_fails_on.contains(&frequency) => {
                Err(AppError::timeout("no reply from station"))
            }
            _ => Ok(self.ping_ms),
        }
    }

    async fn bandwidth_test(&mut self, request: &BandwidthTestRequest) -> Result<Vec<RawSample>> {
        let frequency = self.current_frequency.unwrap_or_default();
        self.test_requests.push((frequency, Instant::now(), request.clone()));
        if self.test_fails_on.contains(&frequency) {
            return Err(AppError::device("bandwidth test interrupted"));
        }
        Ok(self.samples.clone())
    }
}

pub fn sweep_config(start: u32, end: u32, wait_secs: u64, ping_threshold_ms: f64) -> SweepConfig {
    SweepConfig {
        frequency_start: start,
        frequency_end: end,
        ap_address: "192.168.88.1".parse().unwrap(),
        ap_credentials: Credentials {
            username: "admin".to_string(),
            password: String::new(),
            port: 8728,
        },
        station_address: "192.168.88.2".parse().unwrap(),
        wait_for_registration: Duration::from_secs(wait_secs),
        valid_ping_threshold_ms: ping_threshold_ms,
        signal_threshold_dbm: -70,
        timing: SweepTiming::default(),
    }
}

pub fn test_params() -> BandwidthTestParams {
    BandwidthTestParams::default()
}
