//! Access point access used by the sweep.
//!
//! [`DeviceGateway`] is the seam between the sweep logic and the device.
//! [`RouterOsGateway`] talks to a RouterOS access point over its API port;
//! tests substitute scripted gateways.

pub mod codec;
pub mod routeros;

pub use codec::Attributes;
pub use routeros::RouterOsGateway;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// One raw sample record returned by a bandwidth test
pub type RawSample = Attributes;

/// A radio interface reported by the access point
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WirelessInterface {
    /// Device identifier used when changing settings (`*1`, `*2`, ...)
    pub id: String,
    pub name: String,
}

/// One row of the registration table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RegistrationEntry {
    pub interface: Option<String>,
    pub mac_address: Option<String>,
    /// `None` when the device did not report a usable value
    pub signal_strength_dbm: Option<i32>,
}

/// Device-facing bandwidth test request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandwidthTestRequest {
    pub address: IpAddr,
    pub protocol: String,
    pub direction: String,
    pub duration_seconds: u32,
    pub local_tx_speed: Option<String>,
    pub remote_tx_speed: Option<String>,
}

impl BandwidthTestRequest {
    /// Attribute pairs in the order they are sent to the device
    pub fn attributes(&self) -> Vec<(&'static str, String)> {
        let mut attributes = vec![
            ("address", self.address.to_string()),
            ("duration", self.duration_seconds.to_string()),
            ("protocol", self.protocol.clone()),
            ("direction", self.direction.clone()),
        ];
        if let Some(speed) = &self.local_tx_speed {
            attributes.push(("local-tx-speed", speed.clone()));
        }
        if let Some(speed) = &self.remote_tx_speed {
            attributes.push(("remote-tx-speed", speed.clone()));
        }
        attributes
    }
}

/// Operations the sweep needs from the access point
#[async_trait]
pub trait DeviceGateway: Send {
    /// List the radio interfaces whose frequency the sweep changes
    async fn wireless_interfaces(&mut self) -> Result<Vec<WirelessInterface>>;

    /// Set the operating frequency (MHz) of one interface
    async fn set_frequency(&mut self, interface_id: &str, frequency: u32) -> Result<()>;

    /// Current registration table
    async fn registered_stations(&mut self) -> Result<Vec<RegistrationEntry>>;

    /// Ping `target` from `source` and return the average round-trip time in
    /// milliseconds. No reply at all is an error.
    async fn ping(&mut self, source: IpAddr, target: IpAddr, count: u32) -> Result<f64>;

    /// Run a bandwidth test and return every sample the device emitted
    async fn bandwidth_test(&mut self, request: &BandwidthTestRequest) -> Result<Vec<RawSample>>;
}
