//! Session manager façade
//!
//! The public operation surface: create/connect/disconnect/destroy plus the
//! snapshot queries, dispatching into the session table and spawning or
//! stopping lifecycle workers. Operations run synchronously on the caller's
//! task and coordinate with running workers through shared state; deeper
//! failures (a handshake step failing inside a worker) are never returned
//! here, they surface through the session's `Error` state and event channel.

use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::{AuthSection, SessionConfig};
use crate::engine::{ConnectionInfo, TunnelEngine};
use crate::error::{VpnmgrError, VpnmgrResult};
use crate::session::event::{EventCallback, EventPayload, EventType, SessionEvent};
use crate::session::record::{ConnectionState, QualityMetrics, SessionStats, WorkerHandle};
use crate::session::table::{SessionTable, DEFAULT_SESSION_CAPACITY};
use crate::session::worker::LifecycleWorker;

/// Multi-session connection manager
///
/// Owns its session table (injected capacity, no process-global state) and
/// the engine every worker drives. Safe to share behind an `Arc` and call
/// from any number of tasks concurrently.
pub struct SessionManager {
    table: SessionTable,
    engine: Arc<dyn TunnelEngine>,
}

impl SessionManager {
    /// Manager with the default concurrent-session ceiling
    pub fn new(engine: Arc<dyn TunnelEngine>) -> Self {
        Self::with_capacity(engine, DEFAULT_SESSION_CAPACITY)
    }

    pub fn with_capacity(engine: Arc<dyn TunnelEngine>, capacity: usize) -> Self {
        Self {
            table: SessionTable::new(capacity),
            engine,
        }
    }

    /// Create a session in the `Initial` state
    pub async fn create_session(&self, config: SessionConfig) -> VpnmgrResult<u32> {
        self.create_session_with_callback(config, None).await
    }

    /// Create a session with a push callback invoked at every event emission
    /// (in addition to the session's pull queue)
    pub async fn create_session_with_callback(
        &self,
        config: SessionConfig,
        callback: Option<EventCallback>,
    ) -> VpnmgrResult<u32> {
        config.validate()?;

        let session = self.table.allocate(config, callback).await?;
        info!("Created session {} ({})", session.id(), session.config().profile_name);
        session.emit(EventType::StateChange, "Session created", EventPayload::None);

        Ok(session.id())
    }

    /// Spawn the lifecycle worker for a session
    pub async fn connect(&self, id: u32) -> VpnmgrResult<()> {
        let session = self.table.get(id).await?;

        let mut worker_slot = session.worker_slot().lock().await;
        if worker_slot.is_some() || session.is_connected() {
            return Err(VpnmgrError::AlreadyConnected(id));
        }

        {
            let mut state = session.lock_state();
            state.state = ConnectionState::Connecting;
        }
        session.emit(EventType::StateChange, "Connection initiated", EventPayload::None);

        let (stop_tx, stop_rx) = watch::channel(false);
        let worker = LifecycleWorker::new(session.clone(), self.engine.clone(), stop_rx);
        let join = tokio::spawn(worker.run());
        *worker_slot = Some(WorkerHandle { stop_tx, join });

        info!("Connecting session {}", id);
        Ok(())
    }

    /// Stop a session's worker and wait for it to exit.
    ///
    /// On return the worker has fully terminated and the session is
    /// `Disconnected`; no further events will be emitted.
    pub async fn disconnect(&self, id: u32) -> VpnmgrResult<()> {
        let session = self.table.get(id).await?;

        let worker = {
            let mut worker_slot = session.worker_slot().lock().await;
            worker_slot.take()
        };
        let worker = match worker {
            Some(worker) => worker,
            None => return Err(VpnmgrError::NotConnected(id)),
        };

        info!("Disconnecting session {}", id);
        let _ = worker.stop_tx.send(true);
        if let Err(e) = worker.join.await {
            warn!("Session {} worker ended abnormally: {}", id, e);
        }

        Ok(())
    }

    /// Destroy a session, disconnecting first if needed
    pub async fn destroy_session(&self, id: u32) -> VpnmgrResult<()> {
        self.table.get(id).await?;

        match self.disconnect(id).await {
            Ok(()) | Err(VpnmgrError::NotConnected(_)) => {}
            Err(e) => return Err(e),
        }

        self.table.release(id).await?;
        info!("Destroyed session {}", id);
        Ok(())
    }

    /// Current lifecycle state
    pub async fn get_state(&self, id: u32) -> VpnmgrResult<ConnectionState> {
        Ok(self.table.get(id).await?.state())
    }

    /// Statistics snapshot
    pub async fn get_stats(&self, id: u32) -> VpnmgrResult<SessionStats> {
        Ok(self.table.get(id).await?.stats())
    }

    /// Quality metrics snapshot
    pub async fn get_quality(&self, id: u32) -> VpnmgrResult<QualityMetrics> {
        Ok(self.table.get(id).await?.quality())
    }

    /// Configuration snapshot
    pub async fn get_config(&self, id: u32) -> VpnmgrResult<SessionConfig> {
        Ok(self.table.get(id).await?.config())
    }

    /// Ids of all live sessions, ascending
    pub async fn list_sessions(&self) -> Vec<u32> {
        self.table.ids().await
    }

    /// Number of live sessions
    pub async fn session_count(&self) -> usize {
        self.table.len().await
    }

    /// Drain one event from a session's queue
    pub async fn next_event(&self, id: u32) -> VpnmgrResult<Option<SessionEvent>> {
        Ok(self.table.get(id).await?.next_event())
    }

    /// One-shot latency probe; also folds the result into the session's
    /// quality metrics
    pub async fn test_latency(&self, id: u32) -> VpnmgrResult<u32> {
        let session = self.table.get(id).await?;

        let handle = match session.engine_handle() {
            Some(handle) if session.is_connected() => handle,
            _ => return Err(VpnmgrError::NotConnected(id)),
        };

        let latency_ms = self.engine.probe_latency(handle).await?;
        {
            let mut state = session.lock_state();
            state.quality.latency_ms = latency_ms;
            state.quality.last_updated = Some(SystemTime::now());
        }
        session.emit(
            EventType::LatencyUpdate,
            "Latency updated",
            EventPayload::LatencyMs(latency_ms),
        );

        Ok(latency_ms)
    }

    /// Tunnel addresses (local, remote peer, server public)
    pub async fn connection_info(&self, id: u32) -> VpnmgrResult<ConnectionInfo> {
        let session = self.table.get(id).await?;

        let handle = match session.engine_handle() {
            Some(handle) if session.is_connected() => handle,
            _ => return Err(VpnmgrError::NotConnected(id)),
        };

        self.engine.connection_info(handle).await
    }

    /// Replace a session's credentials
    pub async fn update_auth(&self, id: u32, username: &str, password: &str) -> VpnmgrResult<()> {
        if username.is_empty() {
            return Err(VpnmgrError::InvalidParameter("username must not be empty".to_string()));
        }

        let session = self.table.get(id).await?;
        {
            let mut state = session.lock_state();
            state.config.auth = Some(AuthSection {
                username: Some(username.to_string()),
                password: Some(password.to_string()),
            });
        }
        session.emit(
            EventType::AuthRequired,
            "Authentication credentials updated",
            EventPayload::None,
        );

        Ok(())
    }

    /// Enable or disable automatic reconnection
    pub async fn set_auto_reconnect(&self, id: u32, enable: bool) -> VpnmgrResult<()> {
        let session = self.table.get(id).await?;
        let mut state = session.lock_state();
        state.config.connection.auto_reconnect = enable;
        Ok(())
    }

    /// Replace a session's configuration (only allowed while no worker runs)
    pub async fn update_config(&self, id: u32, config: SessionConfig) -> VpnmgrResult<()> {
        config.validate()?;
        let session = self.table.get(id).await?;

        let worker_slot = session.worker_slot().lock().await;
        if worker_slot.is_some() {
            return Err(VpnmgrError::InvalidState(
                "Cannot update configuration while connected".to_string()
            ));
        }

        let mut state = session.lock_state();
        state.config = config;
        debug!("Updated configuration for session {}", id);
        Ok(())
    }

    /// Suspend a session (alias of disconnect; the slot and statistics
    /// survive for a later resume)
    pub async fn pause(&self, id: u32) -> VpnmgrResult<()> {
        self.disconnect(id).await
    }

    /// Resume a paused session
    pub async fn resume(&self, id: u32) -> VpnmgrResult<()> {
        self.connect(id).await
    }

    /// Destroy every live session
    pub async fn shutdown(&self) {
        for id in self.table.ids().await {
            if let Err(e) = self.destroy_session(id).await {
                warn!("Failed to destroy session {}: {}", id, e);
            }
        }
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        // Async drop is not available; callers should invoke shutdown()
        // before dropping so workers are joined deterministically
        debug!("SessionManager dropped");
    }
}
