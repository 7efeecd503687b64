//! Capacity-bounded session registry
//!
//! Maps session ids to records, owns slot allocation/reclamation, and
//! enforces the global concurrent-session ceiling. Ids are assigned
//! monotonically and never reused for the process lifetime, so a stale id
//! held after destroy can never alias a newer session.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::config::SessionConfig;
use crate::error::{VpnmgrError, VpnmgrResult};
use crate::session::event::EventCallback;
use crate::session::record::Session;

/// Default concurrent-session ceiling
pub const DEFAULT_SESSION_CAPACITY: usize = 64;

/// Registry of live sessions
pub struct SessionTable {
    capacity: usize,
    next_id: AtomicU32,
    sessions: RwLock<HashMap<u32, Arc<Session>>>,
}

impl SessionTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            next_id: AtomicU32::new(1),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Allocate a slot and build a record for `config`.
    ///
    /// Fails with `CapacityExceeded` when the table is full, leaving the
    /// table unchanged.
    pub async fn allocate(
        &self,
        config: SessionConfig,
        callback: Option<EventCallback>,
    ) -> VpnmgrResult<Arc<Session>> {
        let mut sessions = self.sessions.write().await;
        if sessions.len() >= self.capacity {
            return Err(VpnmgrError::CapacityExceeded(
                format!("session table full ({} sessions)", self.capacity)
            ));
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let session = Arc::new(Session::new(id, config, callback));
        sessions.insert(id, session.clone());
        debug!("Allocated session slot {}", id);

        Ok(session)
    }

    /// Look up a live session
    pub async fn get(&self, id: u32) -> VpnmgrResult<Arc<Session>> {
        let sessions = self.sessions.read().await;
        sessions.get(&id).cloned().ok_or(VpnmgrError::NotFound(id))
    }

    /// Reclaim a slot. Only valid once the session's worker has been
    /// stopped and joined.
    pub async fn release(&self, id: u32) -> VpnmgrResult<()> {
        let mut sessions = self.sessions.write().await;
        match sessions.remove(&id) {
            Some(_) => {
                debug!("Released session slot {}", id);
                Ok(())
            }
            None => Err(VpnmgrError::NotFound(id)),
        }
    }

    /// Snapshot of all live session ids, ascending
    pub async fn ids(&self) -> Vec<u32> {
        let sessions = self.sessions.read().await;
        let mut ids: Vec<u32> = sessions.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Number of occupied slots
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
