//! Session events and the per-session bounded delivery queue
//!
//! Every observable change (state transition, statistics update, quality
//! sample, latency probe, reconnect, error) is emitted once through the
//! optional push callback and once into the session's queue. The queue is a
//! fixed-capacity ring: pushing never blocks and never fails; when full, the
//! oldest unread event is silently dropped. The queue is the authoritative
//! record; the callback is a side-channel notification.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::SystemTime;

use crate::session::record::{ConnectionState, QualityMetrics, SessionStats};

/// Queue capacity shared by every session
pub const EVENT_QUEUE_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    StateChange,
    StatsUpdate,
    QualityUpdate,
    LatencyUpdate,
    Reconnect,
    AuthRequired,
    Error,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::StateChange => "State Change",
            EventType::StatsUpdate => "Stats Update",
            EventType::QualityUpdate => "Quality Update",
            EventType::LatencyUpdate => "Latency Update",
            EventType::Reconnect => "Reconnect",
            EventType::AuthRequired => "Auth Required",
            EventType::Error => "Error",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed payload attached to an event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventPayload {
    None,
    Stats(SessionStats),
    Quality(QualityMetrics),
    LatencyMs(u32),
}

/// Immutable record of one observable session change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEvent {
    pub session_id: u32,
    pub event_type: EventType,
    pub timestamp: SystemTime,
    /// Session state at the moment of emission
    pub state: ConnectionState,
    pub message: String,
    pub payload: EventPayload,
}

/// Callback invoked synchronously at emission, on the worker's task.
/// Must be fast and non-blocking.
pub type EventCallback = Arc<dyn Fn(&SessionEvent) + Send + Sync>;

/// Fixed-capacity ring of session events
///
/// Owned exclusively by one session record; never shared between sessions.
#[derive(Debug)]
pub struct EventQueue {
    capacity: usize,
    events: VecDeque<SessionEvent>,
}

impl EventQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            events: VecDeque::with_capacity(capacity),
        }
    }

    /// Insert an event, evicting the oldest unread event when full.
    /// Never blocks, never fails.
    pub fn push(&mut self, event: SessionEvent) {
        if self.capacity == 0 {
            return;
        }
        if self.events.len() == self.capacity {
            let _ = self.events.pop_front();
        }
        self.events.push_back(event);
    }

    /// Remove and return the oldest unread event, if any
    pub fn pop(&mut self) -> Option<SessionEvent> {
        self.events.pop_front()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(n: u32) -> SessionEvent {
        SessionEvent {
            session_id: 1,
            event_type: EventType::StateChange,
            timestamp: SystemTime::now(),
            state: ConnectionState::Initial,
            message: format!("event {}", n),
            payload: EventPayload::None,
        }
    }

    #[test]
    fn test_push_pop_fifo() {
        let mut queue = EventQueue::new(8);
        queue.push(event(1));
        queue.push(event(2));

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.pop().unwrap().message, "event 1");
        assert_eq!(queue.pop().unwrap().message, "event 2");
        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_full_queue_drops_oldest() {
        let capacity = 4;
        let mut queue = EventQueue::new(capacity);
        for n in 0..10 {
            queue.push(event(n));
        }

        // Exactly the N most recent events survive, oldest first
        assert_eq!(queue.len(), capacity);
        for n in 6..10 {
            assert_eq!(queue.pop().unwrap().message, format!("event {}", n));
        }
        assert!(queue.is_empty());
    }

    #[test]
    fn test_zero_capacity_discards_everything() {
        let mut queue = EventQueue::new(0);
        queue.push(event(1));
        assert!(queue.is_empty());
        assert!(queue.pop().is_none());
    }
}
