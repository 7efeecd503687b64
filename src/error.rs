//! Error types for vpnmgr

use std::fmt;
use std::io;

#[derive(Debug)]
pub enum VpnmgrError {
    /// IO error
    Io(io::Error),
    /// Invalid parameter
    InvalidParameter(String),
    /// Session table is at its concurrent-session ceiling
    CapacityExceeded(String),
    /// Unknown session id
    NotFound(u32),
    /// Session is already connected or has a running worker
    AlreadyConnected(u32),
    /// Session has no running connection
    NotConnected(u32),
    /// Configuration error
    ConfigError(String),
    /// Parse error
    ParseError(String),
    /// Tunnel engine operation failed
    EngineError(String),
    /// Worker task error
    TaskError(String),
    /// Invalid state
    InvalidState(String),
    /// Timeout
    Timeout(String),
}

impl fmt::Display for VpnmgrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VpnmgrError::Io(e) => write!(f, "IO error: {}", e),
            VpnmgrError::InvalidParameter(msg) => write!(f, "Invalid parameter: {}", msg),
            VpnmgrError::CapacityExceeded(msg) => write!(f, "Capacity exceeded: {}", msg),
            VpnmgrError::NotFound(id) => write!(f, "Session not found: {}", id),
            VpnmgrError::AlreadyConnected(id) => write!(f, "Session already connected: {}", id),
            VpnmgrError::NotConnected(id) => write!(f, "Session not connected: {}", id),
            VpnmgrError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            VpnmgrError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            VpnmgrError::EngineError(msg) => write!(f, "Engine error: {}", msg),
            VpnmgrError::TaskError(msg) => write!(f, "Task error: {}", msg),
            VpnmgrError::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            VpnmgrError::Timeout(msg) => write!(f, "Timeout: {}", msg),
        }
    }
}

impl std::error::Error for VpnmgrError {}

impl From<io::Error> for VpnmgrError {
    fn from(error: io::Error) -> Self {
        VpnmgrError::Io(error)
    }
}

impl From<serde_json::Error> for VpnmgrError {
    fn from(error: serde_json::Error) -> Self {
        VpnmgrError::ParseError(error.to_string())
    }
}

pub type VpnmgrResult<T> = Result<T, VpnmgrError>;
