//! Per-session state: lifecycle states, statistics, quality metrics, and the
//! record the façade and the lifecycle worker coordinate through
//!
//! A record's mutable fields live behind its own mutex, independent of the
//! event queue's lock, so draining events never contends with state updates
//! beyond the brief copy/enqueue moment. All query paths copy data out under
//! the lock; callers never observe a record mid-mutation.

use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};
use std::time::SystemTime;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::SessionConfig;
use crate::engine::EngineHandle;
use crate::session::event::{
    EventCallback, EventPayload, EventQueue, EventType, SessionEvent, EVENT_QUEUE_CAPACITY,
};

/// Connection lifecycle states
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    #[default]
    Initial,
    Connecting,
    Authenticating,
    FetchingConfig,
    AssigningAddress,
    InstallingRoutes,
    Connected,
    Reconnecting,
    Disconnecting,
    Disconnected,
    Error,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Initial => "Initial",
            ConnectionState::Connecting => "Connecting",
            ConnectionState::Authenticating => "Authenticating",
            ConnectionState::FetchingConfig => "Fetching Config",
            ConnectionState::AssigningAddress => "Assigning Address",
            ConnectionState::InstallingRoutes => "Installing Routes",
            ConnectionState::Connected => "Connected",
            ConnectionState::Reconnecting => "Reconnecting",
            ConnectionState::Disconnecting => "Disconnecting",
            ConnectionState::Disconnected => "Disconnected",
            ConnectionState::Error => "Error",
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cumulative connection statistics
///
/// Counters only grow while a connection lives; they reset only when the
/// session is destroyed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionStats {
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub packets_sent: u64,
    pub packets_received: u64,
    /// Number of connections established over the session's lifetime
    pub connection_count: u32,
    pub reconnection_count: u32,
    pub auth_failures: u32,
    pub connected_since: Option<SystemTime>,
    pub last_activity: Option<SystemTime>,
}

/// Most recent network quality sample
///
/// Overwritten on every sampling tick, not cumulative.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityMetrics {
    /// Latest round-trip latency in milliseconds
    pub latency_ms: u32,
    /// Simple moving average over the last 10 non-zero latency samples
    pub avg_latency_ms: u32,
    pub packet_loss_pct: u32,
    pub jitter_ms: u32,
    pub bandwidth_up_kbps: u32,
    pub bandwidth_down_kbps: u32,
    /// Signal strength in [0.0, 1.0]
    pub signal_strength: f32,
    pub last_updated: Option<SystemTime>,
}

/// Mutable fields shared between the façade and the worker
pub(crate) struct SessionState {
    pub state: ConnectionState,
    /// Authoritative only after `state` is set to `Connected`
    pub connected: bool,
    pub stats: SessionStats,
    pub quality: QualityMetrics,
    pub engine_handle: Option<EngineHandle>,
    pub config: SessionConfig,
}

/// Control channel for a running lifecycle worker
pub(crate) struct WorkerHandle {
    pub stop_tx: watch::Sender<bool>,
    pub join: JoinHandle<()>,
}

/// One logical VPN client session
///
/// Holds the identity, shared mutable state, event queue and worker control
/// slot for a single connection lifetime. At most one worker runs per
/// session; the worker is the sole writer of `state` while it runs.
pub struct Session {
    id: u32,
    created_at: SystemTime,
    state: Mutex<SessionState>,
    events: Mutex<EventQueue>,
    callback: Option<EventCallback>,
    worker: tokio::sync::Mutex<Option<WorkerHandle>>,
}

impl Session {
    pub(crate) fn new(id: u32, config: SessionConfig, callback: Option<EventCallback>) -> Self {
        Self {
            id,
            created_at: SystemTime::now(),
            state: Mutex::new(SessionState {
                state: ConnectionState::Initial,
                connected: false,
                stats: SessionStats::default(),
                quality: QualityMetrics::default(),
                engine_handle: None,
                config,
            }),
            events: Mutex::new(EventQueue::new(EVENT_QUEUE_CAPACITY)),
            callback,
            worker: tokio::sync::Mutex::new(None),
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }

    /// Current lifecycle state (snapshot)
    pub fn state(&self) -> ConnectionState {
        self.lock_state().state
    }

    pub fn is_connected(&self) -> bool {
        self.lock_state().connected
    }

    /// Statistics snapshot
    pub fn stats(&self) -> SessionStats {
        self.lock_state().stats.clone()
    }

    /// Quality metrics snapshot
    pub fn quality(&self) -> QualityMetrics {
        self.lock_state().quality.clone()
    }

    /// Configuration snapshot
    pub fn config(&self) -> SessionConfig {
        self.lock_state().config.clone()
    }

    /// Drain one event from the queue, if any
    pub fn next_event(&self) -> Option<SessionEvent> {
        self.lock_events().pop()
    }

    /// Number of undrained events
    pub fn pending_events(&self) -> usize {
        self.lock_events().len()
    }

    pub(crate) fn engine_handle(&self) -> Option<EngineHandle> {
        self.lock_state().engine_handle
    }

    pub(crate) fn take_engine_handle(&self) -> Option<EngineHandle> {
        self.lock_state().engine_handle.take()
    }

    pub(crate) fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_events(&self) -> MutexGuard<'_, EventQueue> {
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn worker_slot(&self) -> &tokio::sync::Mutex<Option<WorkerHandle>> {
        &self.worker
    }

    /// Emit one event: enqueue a copy, then invoke the callback.
    ///
    /// Must not be called while holding the state lock; the emitted state is
    /// read here. The callback runs outside every lock so it may drain the
    /// queue without deadlocking.
    pub(crate) fn emit(&self, event_type: EventType, message: &str, payload: EventPayload) {
        let state = self.state();
        let event = SessionEvent {
            session_id: self.id,
            event_type,
            timestamp: SystemTime::now(),
            state,
            message: message.to_string(),
            payload,
        };

        self.lock_events().push(event.clone());

        if let Some(callback) = &self.callback {
            callback(&event);
        }
    }
}
