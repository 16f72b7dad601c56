use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};

/// Progress counters written by the relay loop and read by the heartbeat
#[derive(Debug)]
pub struct RelayStats {
    started_at: DateTime<Utc>,
    recorded: AtomicUsize,
    last_relay: Mutex<Option<DateTime<Utc>>>,
}

/// Point-in-time copy of [`RelayStats`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub uptime: chrono::Duration,
    /// Message ids the dispatch guard has recorded
    pub recorded: usize,
    /// Last time at least one target received a message
    pub last_relay: Option<DateTime<Utc>>,
}

impl RelayStats {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            recorded: AtomicUsize::new(0),
            last_relay: Mutex::new(None),
        }
    }

    pub fn set_recorded(&self, recorded: usize) {
        self.recorded.store(recorded, Ordering::Relaxed);
    }

    pub fn mark_relayed(&self, at: DateTime<Utc>) {
        *self.last_relay.lock().unwrap_or_else(|e| e.into_inner()) = Some(at);
    }

    pub fn snapshot(&self, now: DateTime<Utc>) -> StatsSnapshot {
        StatsSnapshot {
            uptime: now - self.started_at,
            recorded: self.recorded.load(Ordering::Relaxed),
            last_relay: *self.last_relay.lock().unwrap_or_else(|e| e.into_inner()),
        }
    }
}
