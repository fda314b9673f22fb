//! Aggregate player activity.
//!
//! # Responsibilities
//! - Track the number of connected players across all backend servers
//! - Record the instant the count last dropped to zero
//! - Count how often the count left zero, so a player who came and went
//!   between two observations still ends the idle episode
//!
//! # Design Decisions
//! - Count and zero timestamp live in one mutex so a snapshot never pairs
//!   a fresh count with a stale timestamp
//! - Decrements floor at zero; duplicate disconnects are absorbed
//! - Uses `tokio::time::Instant` so paused-clock tests control idle time

use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::time::Instant;

/// Point-in-time copy of the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityState {
    /// Players currently connected.
    pub current_player_count: usize,
    /// Set exactly while `current_player_count == 0`.
    pub zero_since: Option<Instant>,
    /// Number of zero → positive transitions so far.
    pub reconnects: u64,
}

impl ActivityState {
    /// Time spent at zero players as of `now`, or zero while players are online.
    pub fn idle_elapsed(&self, now: Instant) -> std::time::Duration {
        self.zero_since
            .map(|since| now.saturating_duration_since(since))
            .unwrap_or_default()
    }
}

/// Thread-safe player counter fed by the event adapter.
#[derive(Debug)]
pub struct ActivityTracker {
    state: Mutex<ActivityState>,
}

impl ActivityTracker {
    /// Create a tracker with no players online. The idle clock starts now.
    pub fn new() -> Self {
        Self::with_initial_count(0)
    }

    /// Create a tracker seeded with players already on the proxy.
    pub fn with_initial_count(count: usize) -> Self {
        Self {
            state: Mutex::new(ActivityState {
                current_player_count: count,
                zero_since: (count == 0).then(Instant::now),
                reconnects: 0,
            }),
        }
    }

    pub fn on_player_connected(&self) {
        let mut state = self.lock();
        if state.current_player_count == 0 {
            state.reconnects += 1;
        }
        state.current_player_count += 1;
        state.zero_since = None;
    }

    pub fn on_player_disconnected(&self) {
        let mut state = self.lock();
        state.current_player_count = state.current_player_count.saturating_sub(1);
        if state.current_player_count == 0 && state.zero_since.is_none() {
            state.zero_since = Some(Instant::now());
        }
    }

    pub fn snapshot(&self) -> ActivityState {
        *self.lock()
    }

    // A panic elsewhere cannot leave the record half-written, so a poisoned
    // lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, ActivityState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ActivityTracker {
    fn default() -> Self {
        Self::new()
    }
}
