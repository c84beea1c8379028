//! Type definitions and aliases

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// Re-export commonly used types
pub use crate::error::{AppError, Result};

/// Transport protocol used by the bandwidth test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Tcp,
    Udp,
}

impl Protocol {
    /// Keyword the device expects for the `protocol` attribute
    pub fn as_keyword(&self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_keyword())
    }
}

impl FromStr for Protocol {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "tcp" | "1" => Ok(Protocol::Tcp),
            "udp" | "2" => Ok(Protocol::Udp),
            other => Err(AppError::validation(format!("Unknown protocol '{}', expected tcp or udp", other))),
        }
    }
}

/// Traffic direction as seen from the access point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Send,
    Receive,
    #[default]
    Both,
}

impl Direction {
    /// Keyword the device expects for the `direction` attribute
    pub fn as_keyword(&self) -> &'static str {
        match self {
            Direction::Send => "transmit",
            Direction::Receive => "receive",
            Direction::Both => "both",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Send => f.write_str("send"),
            Direction::Receive => f.write_str("receive"),
            Direction::Both => f.write_str("both"),
        }
    }
}

impl FromStr for Direction {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "send" | "transmit" | "1" => Ok(Direction::Send),
            "receive" | "2" => Ok(Direction::Receive),
            "both" | "3" => Ok(Direction::Both),
            other => Err(AppError::validation(format!(
                "Unknown direction '{}', expected send, receive or both",
                other
            ))),
        }
    }
}

/// Transmit rate limit for one side of the bandwidth test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RateLimit {
    #[default]
    Unlimited,
    /// Limit in megabits per second, always greater than zero
    Mbps(u32),
}

impl RateLimit {
    /// Device attribute value (`"<n>M"`), `None` when unlimited
    pub fn as_attribute(&self) -> Option<String> {
        match self {
            RateLimit::Unlimited => None,
            RateLimit::Mbps(mbps) => Some(format!("{}M", mbps)),
        }
    }
}

impl fmt::Display for RateLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateLimit::Unlimited => f.write_str("unlimited"),
            RateLimit::Mbps(mbps) => write!(f, "{} Mbps", mbps),
        }
    }
}

impl FromStr for RateLimit {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("unlimited") {
            return Ok(RateLimit::Unlimited);
        }

        let digits = trimmed.trim_end_matches(['M', 'm']);
        let mbps: u32 = digits
            .parse()
            .map_err(|_| AppError::validation(format!("Invalid rate limit '{}', expected Mbps or 'unlimited'", s)))?;
        if mbps == 0 {
            return Err(AppError::validation("Rate limit must be greater than 0 Mbps"));
        }
        Ok(RateLimit::Mbps(mbps))
    }
}

/// Outcome of the bandwidth test stage for one frequency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestStatus {
    /// Qualification failed, no test was attempted
    Skipped,
    /// The device returned samples
    Completed,
    /// The device reported an error during the test
    Failed,
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestStatus::Skipped => f.write_str("SKIPPED"),
            TestStatus::Completed => f.write_str("COMPLETED"),
            TestStatus::Failed => f.write_str("FAILED"),
        }
    }
}

/// Per-frequency qualification states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualificationState {
    WaitingForRegistration,
    Settling,
    Probing,
    Passed,
    Failed,
}

impl QualificationState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, QualificationState::Passed | QualificationState::Failed)
    }
}

impl fmt::Display for QualificationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QualificationState::WaitingForRegistration => "waiting-for-registration",
            QualificationState::Settling => "settling",
            QualificationState::Probing => "probing",
            QualificationState::Passed => "passed",
            QualificationState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Unit of the throughput fields in a bandwidth sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RateUnit {
    BitsPerSecond,
    MegabitsPerSecond,
}
