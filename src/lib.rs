//! vpnmgr - Multi-Session VPN Connection Manager
//!
//! Async library for creating, driving, monitoring and tearing down many
//! independent VPN client sessions concurrently:
//! - Capacity-bounded session table with process-unique session ids
//! - One lifecycle worker task per session driving the connection state machine
//! - Per-session bounded event queue (overwrite-oldest) plus push callbacks
//! - Statistics, quality and latency sampling delegated to a pluggable
//!   tunnel engine
//!
//! The actual tunnel transport, encryption and protocol negotiation are
//! behind the `TunnelEngine` trait; a simulated engine ships for tests and
//! demos.

pub mod config;
pub mod engine;
pub mod error;
pub mod session;
pub mod validation;

// Re-export commonly used types
pub use error::{VpnmgrError, VpnmgrResult};
pub use config::{
    AuthSection, CertificateSection, ConnectionSection, ProxySection, SessionConfig,
    SettingsSection,
};
pub use engine::{
    ConnectionInfo, EngineHandle, HandshakePhase, LinkSample, SimulatedEngine, TrafficSample,
    TunnelEngine,
};
pub use session::{
    ConnectionState, EventCallback, EventPayload, EventQueue, EventType, QualityMetrics, Session,
    SessionEvent, SessionManager, SessionStats, SessionTable, DEFAULT_SESSION_CAPACITY,
    EVENT_QUEUE_CAPACITY,
};
