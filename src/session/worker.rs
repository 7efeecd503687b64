//! Lifecycle worker
//!
//! One worker task per connecting/connected session. Each loop iteration
//! advances the connection state machine by exactly one step, samples
//! telemetry while connected, and emits events. The worker is the sole
//! writer of the session state while it runs; the façade communicates with
//! it only through the stop channel and the record's locks.

use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::engine::{HandshakePhase, TunnelEngine};
use crate::session::event::{EventPayload, EventType};
use crate::session::record::{ConnectionState, Session};

/// Delay between state-machine iterations
pub(crate) const WORKER_TICK: Duration = Duration::from_millis(100);

/// Number of latency samples in the rolling average window
const LATENCY_WINDOW: usize = 10;

/// Simple moving average over the last `LATENCY_WINDOW` non-zero samples.
/// A zero sample means "no data yet", not a real zero-latency measurement.
#[derive(Debug, Default)]
pub(crate) struct LatencyWindow {
    samples: [u32; LATENCY_WINDOW],
    next: usize,
}

impl LatencyWindow {
    pub fn record(&mut self, sample_ms: u32) {
        self.samples[self.next] = sample_ms;
        self.next = (self.next + 1) % LATENCY_WINDOW;
    }

    pub fn average(&self) -> u32 {
        let mut total: u64 = 0;
        let mut count: u64 = 0;
        for sample in self.samples.iter().filter(|s| **s > 0) {
            total += u64::from(*sample);
            count += 1;
        }
        if count == 0 {
            0
        } else {
            (total / count) as u32
        }
    }
}

pub(crate) struct LifecycleWorker {
    session: Arc<Session>,
    engine: Arc<dyn TunnelEngine>,
    stop_rx: watch::Receiver<bool>,
    latency: LatencyWindow,
    last_stats_event: Instant,
    last_probe: Instant,
}

impl LifecycleWorker {
    pub fn new(
        session: Arc<Session>,
        engine: Arc<dyn TunnelEngine>,
        stop_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            session,
            engine,
            stop_rx,
            latency: LatencyWindow::default(),
            last_stats_event: Instant::now(),
            last_probe: Instant::now(),
        }
    }

    /// Drive the session until the stop signal is observed
    pub async fn run(mut self) {
        debug!("Worker started for session {}", self.session.id());

        loop {
            if *self.stop_rx.borrow() {
                break;
            }

            match self.session.state() {
                ConnectionState::Initial | ConnectionState::Connecting => {
                    self.begin_tunnel().await;
                }
                ConnectionState::Authenticating => {
                    self.handshake_step(
                        HandshakePhase::Authenticate,
                        ConnectionState::FetchingConfig,
                        "Fetching configuration",
                    )
                    .await;
                }
                ConnectionState::FetchingConfig => {
                    self.handshake_step(
                        HandshakePhase::FetchConfig,
                        ConnectionState::AssigningAddress,
                        "Assigning tunnel address",
                    )
                    .await;
                }
                ConnectionState::AssigningAddress => {
                    self.handshake_step(
                        HandshakePhase::AssignAddress,
                        ConnectionState::InstallingRoutes,
                        "Installing routes",
                    )
                    .await;
                }
                ConnectionState::InstallingRoutes => {
                    self.finish_handshake().await;
                }
                ConnectionState::Connected => {
                    self.sample_connected().await;
                }
                ConnectionState::Error => {
                    self.maybe_reconnect().await;
                }
                // Reconnecting is only ever set inside maybe_reconnect();
                // Disconnecting/Disconnected never coexist with a live worker
                _ => {}
            }

            tokio::time::sleep(WORKER_TICK).await;
        }

        self.shutdown().await;
    }

    /// Handle `Connecting`: ask the engine to start tunnel establishment
    async fn begin_tunnel(&self) {
        let config = self.session.config();
        match self.engine.begin(&config).await {
            Ok(handle) => {
                {
                    let mut state = self.session.lock_state();
                    state.engine_handle = Some(handle);
                }
                self.transition(ConnectionState::Authenticating, "Authenticating");
            }
            Err(e) => {
                self.fail(format!("Tunnel setup failed: {}", e), false).await;
            }
        }
    }

    /// Drive one intermediate handshake phase, advancing on success
    async fn handshake_step(&self, phase: HandshakePhase, next: ConnectionState, label: &str) {
        let handle = match self.session.engine_handle() {
            Some(handle) => handle,
            None => {
                self.fail("Engine handle lost during handshake".to_string(), false).await;
                return;
            }
        };

        match self.engine.advance(handle, phase).await {
            Ok(()) => self.transition(next, label),
            Err(e) => {
                let auth_failure = phase == HandshakePhase::Authenticate;
                self.fail(format!("{} failed: {}", phase.as_str(), e), auth_failure).await;
            }
        }
    }

    /// Final handshake phase: install routes, then enter `Connected`
    async fn finish_handshake(&mut self) {
        let handle = match self.session.engine_handle() {
            Some(handle) => handle,
            None => {
                self.fail("Engine handle lost during handshake".to_string(), false).await;
                return;
            }
        };

        if let Err(e) = self.engine.advance(handle, HandshakePhase::InstallRoutes).await {
            self.fail(format!("{} failed: {}", HandshakePhase::InstallRoutes.as_str(), e), false)
                .await;
            return;
        }

        if !self.engine.is_established(handle).await {
            self.fail("Tunnel failed to establish".to_string(), false).await;
            return;
        }

        {
            let mut state = self.session.lock_state();
            // State is authoritative first, then the connected flag
            state.state = ConnectionState::Connected;
            state.connected = true;
            let now = SystemTime::now();
            state.stats.connected_since = Some(now);
            state.stats.last_activity = Some(now);
            state.stats.connection_count += 1;
        }
        self.last_stats_event = Instant::now();
        self.last_probe = Instant::now();
        self.session.emit(EventType::StateChange, "Connected", EventPayload::None);
        debug!("Session {} connected", self.session.id());
    }

    /// One monitoring iteration while connected: accumulate traffic counters
    /// silently, sample link quality, and emit the interval-gated stats and
    /// latency events
    async fn sample_connected(&mut self) {
        let handle = match self.session.engine_handle() {
            Some(handle) => handle,
            None => return,
        };

        let (stats_interval, ping_interval) = {
            let state = self.session.lock_state();
            (
                state.config.settings.stats_interval,
                state.config.connection.ping_interval,
            )
        };

        match self.engine.sample_traffic(handle).await {
            Ok(sample) => {
                let mut state = self.session.lock_state();
                state.stats.bytes_sent += sample.bytes_sent;
                state.stats.bytes_received += sample.bytes_received;
                state.stats.packets_sent += sample.packets_sent;
                state.stats.packets_received += sample.packets_received;
                state.stats.last_activity = Some(SystemTime::now());
            }
            Err(e) => {
                self.fail(format!("Traffic sampling failed: {}", e), false).await;
                return;
            }
        }

        match self.engine.sample_link(handle).await {
            Ok(link) => {
                let quality = {
                    let mut state = self.session.lock_state();
                    let latest = state.quality.latency_ms;
                    self.latency.record(latest);
                    state.quality.packet_loss_pct = link.packet_loss_pct;
                    state.quality.jitter_ms = link.jitter_ms;
                    state.quality.bandwidth_up_kbps = link.bandwidth_up_kbps;
                    state.quality.bandwidth_down_kbps = link.bandwidth_down_kbps;
                    state.quality.signal_strength = link.signal_strength;
                    state.quality.avg_latency_ms = self.latency.average();
                    state.quality.last_updated = Some(SystemTime::now());
                    state.quality.clone()
                };
                self.session.emit(
                    EventType::QualityUpdate,
                    "Quality metrics updated",
                    EventPayload::Quality(quality),
                );
            }
            Err(e) => {
                self.fail(format!("Quality sampling failed: {}", e), false).await;
                return;
            }
        }

        if self.last_stats_event.elapsed() >= Duration::from_secs(u64::from(stats_interval)) {
            let stats = self.session.stats();
            self.session.emit(
                EventType::StatsUpdate,
                "Statistics updated",
                EventPayload::Stats(stats),
            );
            self.last_stats_event = Instant::now();
        }

        if self.last_probe.elapsed() >= Duration::from_secs(u64::from(ping_interval)) {
            match self.engine.probe_latency(handle).await {
                Ok(latency_ms) => {
                    {
                        let mut state = self.session.lock_state();
                        state.quality.latency_ms = latency_ms;
                        state.quality.last_updated = Some(SystemTime::now());
                    }
                    self.session.emit(
                        EventType::LatencyUpdate,
                        "Latency updated",
                        EventPayload::LatencyMs(latency_ms),
                    );
                }
                Err(e) => {
                    warn!("Session {} latency probe failed: {}", self.session.id(), e);
                }
            }
            self.last_probe = Instant::now();
        }
    }

    /// Enter the `Error` state and release engine-side resources. A later
    /// reconnect starts the handshake from scratch.
    async fn fail(&self, message: String, auth_failure: bool) {
        {
            let mut state = self.session.lock_state();
            state.state = ConnectionState::Error;
            state.connected = false;
            if auth_failure {
                state.stats.auth_failures += 1;
            }
        }
        warn!("Session {} error: {}", self.session.id(), message);
        self.session.emit(EventType::Error, &message, EventPayload::None);

        if let Some(handle) = self.session.take_engine_handle() {
            self.engine.teardown(handle).await;
        }
    }

    /// Handle the `Error` state: wait out the reconnect interval and go back
    /// to `Connecting`, unless a stop arrives during the wait. Without
    /// auto-reconnect the session parks in `Error` until stopped.
    async fn maybe_reconnect(&mut self) {
        let (auto_reconnect, reconnect_interval) = {
            let state = self.session.lock_state();
            (
                state.config.connection.auto_reconnect,
                state.config.connection.reconnect_interval,
            )
        };

        if !auto_reconnect {
            return;
        }

        self.transition(ConnectionState::Reconnecting, "Reconnecting");

        // Cancellable wait: a disconnect during the interval is honored
        // immediately, not after the full wait elapses
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(u64::from(reconnect_interval))) => {}
            _ = self.stop_rx.changed() => {}
        }
        if *self.stop_rx.borrow() {
            return;
        }

        {
            let mut state = self.session.lock_state();
            state.state = ConnectionState::Connecting;
            state.stats.reconnection_count += 1;
        }
        self.session.emit(EventType::Reconnect, "Auto-reconnecting", EventPayload::None);
        debug!("Session {} auto-reconnecting", self.session.id());
    }

    /// Stop observed: tear the tunnel down and leave the session disconnected
    async fn shutdown(self) {
        {
            let mut state = self.session.lock_state();
            state.state = ConnectionState::Disconnecting;
        }
        self.session.emit(EventType::StateChange, "Disconnecting", EventPayload::None);

        if let Some(handle) = self.session.take_engine_handle() {
            self.engine.teardown(handle).await;
        }

        {
            let mut state = self.session.lock_state();
            state.connected = false;
            state.state = ConnectionState::Disconnected;
        }
        self.session.emit(EventType::StateChange, "Disconnected", EventPayload::None);
        debug!("Worker exited for session {}", self.session.id());
    }

    fn transition(&self, next: ConnectionState, label: &str) {
        {
            let mut state = self.session.lock_state();
            state.state = next;
        }
        self.session.emit(EventType::StateChange, label, EventPayload::None);
    }
}
