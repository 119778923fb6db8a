//! Core type definitions shared across the scan engine
//!
//! This module defines the data structures that form the contract between the
//! orchestrator, the remote analysis endpoint, and the embedding front end.
//! Wire types keep the exact field names the server speaks (`scanType`,
//! `resultClass`, `cooldownEnd`) so the serde derives are the single source
//! of truth for the protocol.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ScanError;

/// The three scan triggers exposed by the front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanKind {
    Epic,
    Showtime,
    Potw,
}

impl fmt::Display for ScanKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanKind::Epic => write!(f, "Epic"),
            ScanKind::Showtime => write!(f, "Showtime"),
            ScanKind::Potw => write!(f, "POTW"),
        }
    }
}

impl FromStr for ScanKind {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "epic" => Ok(ScanKind::Epic),
            "showtime" => Ok(ScanKind::Showtime),
            "potw" => Ok(ScanKind::Potw),
            other => Err(ScanError::Config(format!("Unknown scan kind: {}", other))),
        }
    }
}

/// User setup selected before any scan may run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(rename = "deviceType")]
    pub device_type: String,
    pub continent: String,
}

/// Lifecycle of a single scan session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    Idle,
    Connecting,
    AwaitingServer,
    Maintenance,
    Success,
    Error,
}

/// Categorical bucket the server assigns to a numeric outcome. The serde
/// names are the CSS-class strings the wire format carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tier {
    #[serde(rename = "result-bad")]
    Bad,
    #[serde(rename = "result-weak")]
    Weak,
    #[serde(rename = "result-medium")]
    Medium,
    #[serde(rename = "result-good")]
    Good,
}

/// Terminal result of a successful scan session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultOutcome {
    pub percentage: u8,
    pub tier: Tier,
    pub message: String,
    /// Server-assigned cooldown deadline, epoch milliseconds.
    pub cooldown_deadline: i64,
}

/// Request body of the single analysis exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    #[serde(rename = "scanType")]
    pub scan_type: String,
    #[serde(rename = "userConfig")]
    pub user_config: UserConfig,
}

/// Response body of the single analysis exchange. All outcome fields are
/// optional on the wire because a maintenance response carries none of them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResponse {
    #[serde(default)]
    pub maintenance: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage: Option<u8>,
    #[serde(rename = "resultMessage", default, skip_serializing_if = "Option::is_none")]
    pub result_message: Option<String>,
    #[serde(rename = "resultClass", default, skip_serializing_if = "Option::is_none")]
    pub result_class: Option<Tier>,
    #[serde(rename = "cooldownEnd", default, skip_serializing_if = "Option::is_none")]
    pub cooldown_end: Option<i64>,
}

impl AnalysisResponse {
    /// Converts a non-maintenance response into a [`ResultOutcome`],
    /// rejecting payloads with missing outcome fields.
    pub fn into_outcome(self) -> Result<ResultOutcome, ScanError> {
        let missing = |field: &str| {
            ScanError::RemoteCall(format!("Analysis response missing field '{}'", field))
        };
        Ok(ResultOutcome {
            percentage: self.percentage.ok_or_else(|| missing("percentage"))?,
            tier: self.result_class.ok_or_else(|| missing("resultClass"))?,
            message: self.result_message.ok_or_else(|| missing("resultMessage"))?,
            cooldown_deadline: self.cooldown_end.ok_or_else(|| missing("cooldownEnd"))?,
        })
    }
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
