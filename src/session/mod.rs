//! Session management
//!
//! This module drives many independent VPN client sessions concurrently,
//! each progressing through a connection lifecycle state machine and each
//! emitting observable events through a per-session bounded queue.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │     Session Manager (façade)        │
//! └──────────────┬──────────────────────┘
//!                │
//!        ┌───────▼────────┐
//!        │ Session Table  │  <- capacity-bounded registry
//!        └───────┬────────┘
//!                │ one per session
//!        ┌───────▼────────┐     ┌───────────────┐
//!        │ Session Record │────▶│  Event Queue  │
//!        └───────┬────────┘     └───────────────┘
//!                │ at most one
//!        ┌───────▼──────────┐
//!        │ Lifecycle Worker │  <- drives the state machine,
//!        └──────────────────┘     samples the tunnel engine
//! ```
//!
//! The façade's operations run on the caller's task; each connected or
//! connecting session additionally owns one worker task. Workers push
//! events into the queue (and into an optional callback); callers drain
//! the queue and take state/stats/quality snapshots at any time.
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use libvpnmgr::{SessionConfig, SessionManager, SimulatedEngine};
//!
//! # async fn run() -> libvpnmgr::VpnmgrResult<()> {
//! let manager = SessionManager::new(Arc::new(SimulatedEngine::new()));
//!
//! let config = SessionConfig::from_json(r#"{"tunnel_config": "remote vpn.example.com 1194"}"#)?;
//! let id = manager.create_session(config).await?;
//! manager.connect(id).await?;
//!
//! while let Some(event) = manager.next_event(id).await? {
//!     println!("[{}] {}: {}", event.session_id, event.event_type, event.message);
//! }
//!
//! manager.destroy_session(id).await?;
//! # Ok(())
//! # }
//! ```

pub mod event;
pub mod manager;
pub mod record;
pub mod table;
pub mod worker;

pub use event::{EventCallback, EventPayload, EventQueue, EventType, SessionEvent, EVENT_QUEUE_CAPACITY};
pub use manager::SessionManager;
pub use record::{ConnectionState, QualityMetrics, Session, SessionStats};
pub use table::{SessionTable, DEFAULT_SESSION_CAPACITY};
