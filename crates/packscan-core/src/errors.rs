//! Error types for failure handling across the scan engine
//!
//! No failure in a scan session terminates the process: the orchestrator
//! recovers locally, surfaces an indication through the UI surface, and
//! returns the session to idle. The variants below carry that taxonomy so
//! embedding front ends can react to the specific failure kind instead of
//! string-matching messages.

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ScanError {
    #[error("Connectivity lost, session abandoned")]
    ConnectivityLost,
    #[error("Remote analysis call failed: {0}")]
    RemoteCall(String),
    #[error("Server maintenance window active")]
    MaintenanceActive,
    #[error("Device/continent configuration is not set")]
    ConfigurationMissing,
    #[error("Cooldown still active, {0}s remaining")]
    CooldownActive(i64),
    #[error("Another scan session is already running")]
    SessionActive,
    #[error("Persistence error: {0}")]
    Persistence(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<std::io::Error> for ScanError {
    fn from(err: std::io::Error) -> Self {
        ScanError::Persistence(err.to_string())
    }
}

impl From<reqwest::Error> for ScanError {
    fn from(err: reqwest::Error) -> Self {
        ScanError::RemoteCall(err.to_string())
    }
}
