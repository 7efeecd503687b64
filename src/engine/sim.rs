//! Simulated tunnel engine
//!
//! Stand-in engine for tests and the demo binary. Handshake phases always
//! succeed unless a failure is injected, and telemetry is randomized within
//! plausible ranges. Production deployments supply a real `TunnelEngine`;
//! nothing in the session core depends on this module.

use async_trait::async_trait;
use rand::Rng;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Mutex;
use tracing::debug;

use crate::config::SessionConfig;
use crate::error::{VpnmgrError, VpnmgrResult};
use super::{ConnectionInfo, EngineHandle, HandshakePhase, LinkSample, TrafficSample, TunnelEngine};

/// Simulated engine with optional handshake-failure injection
pub struct SimulatedEngine {
    next_handle: AtomicU64,
    /// Handles issued by `begin` and not yet torn down
    active: Mutex<HashSet<EngineHandle>>,
    /// Handles whose handshake has fully completed
    established: Mutex<HashSet<EngineHandle>>,
    /// Phase that should fail, if any
    fail_phase: Option<HandshakePhase>,
    /// Remaining number of times `fail_phase` fails
    fail_budget: AtomicU32,
}

impl SimulatedEngine {
    /// Engine whose handshakes always succeed
    pub fn new() -> Self {
        Self {
            next_handle: AtomicU64::new(1),
            active: Mutex::new(HashSet::new()),
            established: Mutex::new(HashSet::new()),
            fail_phase: None,
            fail_budget: AtomicU32::new(0),
        }
    }

    /// Engine that fails `phase` for the first `attempts` attempts, then
    /// succeeds. Pass `u32::MAX` for a persistent failure.
    pub fn failing(phase: HandshakePhase, attempts: u32) -> Self {
        Self {
            fail_phase: Some(phase),
            fail_budget: AtomicU32::new(attempts),
            ..Self::new()
        }
    }

    fn check(&self, handle: EngineHandle) -> VpnmgrResult<()> {
        let active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        if active.contains(&handle) {
            Ok(())
        } else {
            Err(VpnmgrError::EngineError(format!("unknown tunnel handle {}", handle.0)))
        }
    }
}

impl Default for SimulatedEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TunnelEngine for SimulatedEngine {
    async fn begin(&self, config: &SessionConfig) -> VpnmgrResult<EngineHandle> {
        let handle = EngineHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        self.active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(handle);
        debug!("Simulated tunnel {} started for profile '{}'", handle.0, config.profile_name);
        Ok(handle)
    }

    async fn advance(&self, handle: EngineHandle, phase: HandshakePhase) -> VpnmgrResult<()> {
        self.check(handle)?;

        if self.fail_phase == Some(phase) {
            let consumed = self
                .fail_budget
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if consumed {
                return Err(VpnmgrError::EngineError(
                    format!("{} rejected by peer", phase.as_str())
                ));
            }
        }

        if phase == HandshakePhase::InstallRoutes {
            self.established
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .insert(handle);
        }

        Ok(())
    }

    async fn is_established(&self, handle: EngineHandle) -> bool {
        self.established
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&handle)
    }

    async fn sample_traffic(&self, handle: EngineHandle) -> VpnmgrResult<TrafficSample> {
        self.check(handle)?;
        let mut rng = rand::thread_rng();
        Ok(TrafficSample {
            bytes_sent: rng.gen_range(1024..5120),
            bytes_received: rng.gen_range(2048..10240),
            packets_sent: rng.gen_range(1..5),
            packets_received: rng.gen_range(2..9),
        })
    }

    async fn sample_link(&self, handle: EngineHandle) -> VpnmgrResult<LinkSample> {
        self.check(handle)?;
        let mut rng = rand::thread_rng();
        Ok(LinkSample {
            packet_loss_pct: rng.gen_range(0..5),
            jitter_ms: rng.gen_range(1..21),
            bandwidth_up_kbps: rng.gen_range(1_000..10_000),
            bandwidth_down_kbps: rng.gen_range(5_000..50_000),
            signal_strength: rng.gen_range(0.7..1.0),
        })
    }

    async fn probe_latency(&self, handle: EngineHandle) -> VpnmgrResult<u32> {
        self.check(handle)?;
        let mut rng = rand::thread_rng();
        Ok(rng.gen_range(8..45))
    }

    async fn connection_info(&self, handle: EngineHandle) -> VpnmgrResult<ConnectionInfo> {
        self.check(handle)?;
        Ok(ConnectionInfo {
            local_ip: "10.8.0.2".to_string(),
            remote_ip: "10.8.0.1".to_string(),
            server_ip: "203.0.113.1".to_string(),
        })
    }

    async fn teardown(&self, handle: EngineHandle) {
        self.active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&handle);
        self.established
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&handle);
        debug!("Simulated tunnel {} torn down", handle.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> SessionConfig {
        SessionConfig::from_json(r#"{"tunnel_config": "remote sim 1194"}"#).unwrap()
    }

    #[tokio::test]
    async fn test_handshake_succeeds_by_default() {
        let engine = SimulatedEngine::new();
        let handle = engine.begin(&test_config()).await.unwrap();

        for phase in [
            HandshakePhase::Authenticate,
            HandshakePhase::FetchConfig,
            HandshakePhase::AssignAddress,
            HandshakePhase::InstallRoutes,
        ] {
            engine.advance(handle, phase).await.unwrap();
        }

        assert!(engine.is_established(handle).await);
    }

    #[tokio::test]
    async fn test_injected_failure_consumes_budget() {
        let engine = SimulatedEngine::failing(HandshakePhase::Authenticate, 1);
        let handle = engine.begin(&test_config()).await.unwrap();

        assert!(engine.advance(handle, HandshakePhase::Authenticate).await.is_err());
        // Budget exhausted, second attempt succeeds
        assert!(engine.advance(handle, HandshakePhase::Authenticate).await.is_ok());
    }

    #[tokio::test]
    async fn test_torn_down_handle_rejected() {
        let engine = SimulatedEngine::new();
        let handle = engine.begin(&test_config()).await.unwrap();
        engine.teardown(handle).await;

        assert!(engine.sample_traffic(handle).await.is_err());
        assert!(!engine.is_established(handle).await);
    }
}
