//! Tunnel engine contract
//!
//! The component that actually establishes tunnels, negotiates with the
//! remote endpoint, encrypts traffic and moves packets is treated as a black
//! box behind the `TunnelEngine` trait. The session manager and its workers
//! hold an injected `Arc<dyn TunnelEngine>` and never depend on a concrete
//! engine type, so a simulated engine can stand in for tests and demos.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::SessionConfig;
use crate::error::VpnmgrResult;

pub mod sim;

pub use sim::SimulatedEngine;

/// Opaque engine-side identifier for one tunnel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EngineHandle(pub u64);

/// Handshake steps the worker drives, one per iteration, between
/// `Connecting` and `Connected`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakePhase {
    Authenticate,
    FetchConfig,
    AssignAddress,
    InstallRoutes,
}

impl HandshakePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            HandshakePhase::Authenticate => "authentication",
            HandshakePhase::FetchConfig => "configuration fetch",
            HandshakePhase::AssignAddress => "address assignment",
            HandshakePhase::InstallRoutes => "route installation",
        }
    }
}

/// Traffic moved through the tunnel since the previous sample
#[derive(Debug, Clone, Copy, Default)]
pub struct TrafficSample {
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub packets_sent: u64,
    pub packets_received: u64,
}

/// Instantaneous link measurements for one quality sample
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkSample {
    pub packet_loss_pct: u32,
    pub jitter_ms: u32,
    pub bandwidth_up_kbps: u32,
    pub bandwidth_down_kbps: u32,
    /// Signal strength in [0.0, 1.0]
    pub signal_strength: f32,
}

/// Addresses of an established tunnel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionInfo {
    /// Local tunnel address
    pub local_ip: String,
    /// Remote tunnel peer address
    pub remote_ip: String,
    /// Server public address
    pub server_ip: String,
}

/// Interface every tunnel engine must implement
///
/// All instrumentation a worker reports (traffic counters, link quality,
/// latency) originates here, never in the session core.
#[async_trait]
pub trait TunnelEngine: Send + Sync {
    /// Start establishing a tunnel for `config`; returns the handle used by
    /// every subsequent call
    async fn begin(&self, config: &SessionConfig) -> VpnmgrResult<EngineHandle>;

    /// Drive one handshake phase to completion
    async fn advance(&self, handle: EngineHandle, phase: HandshakePhase) -> VpnmgrResult<()>;

    /// Whether the tunnel has fully come up
    async fn is_established(&self, handle: EngineHandle) -> bool;

    /// Traffic moved since the previous sample
    async fn sample_traffic(&self, handle: EngineHandle) -> VpnmgrResult<TrafficSample>;

    /// Current link-quality measurements
    async fn sample_link(&self, handle: EngineHandle) -> VpnmgrResult<LinkSample>;

    /// One round-trip probe through the tunnel, in milliseconds
    async fn probe_latency(&self, handle: EngineHandle) -> VpnmgrResult<u32>;

    /// Tunnel addresses; only meaningful once established
    async fn connection_info(&self, handle: EngineHandle) -> VpnmgrResult<ConnectionInfo>;

    /// Tear the tunnel down and release engine-side resources for `handle`
    async fn teardown(&self, handle: EngineHandle);
}
