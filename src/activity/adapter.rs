//! Host connection events → activity tracker.
//!
//! # Responsibilities
//! - Implement the host's listener port
//! - Forward each distinct (server, player) connect/disconnect exactly once
//! - Absorb redelivered or out-of-order notifications
//!
//! # Design Decisions
//! - Callbacks only touch two short mutex sections; nothing here blocks,
//!   awaits, or can fail back into the host
//! - Players online before the adapter existed are "unattributed"; a
//!   disconnect for an unknown pair consumes one of them

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::activity::tracker::ActivityTracker;
use crate::host::{ConnectionListener, PlayerId, ServerId};
use crate::observability::metrics;

#[derive(Debug, Default)]
struct SessionTable {
    online: HashSet<(ServerId, PlayerId)>,
    unattributed: usize,
}

/// Listener registered with the host's event bus.
#[derive(Debug)]
pub struct EventAdapter {
    tracker: Arc<ActivityTracker>,
    sessions: Mutex<SessionTable>,
}

impl EventAdapter {
    /// Create an adapter. `already_online` is the host's player count at
    /// registration time and must match the tracker's seed.
    pub fn new(tracker: Arc<ActivityTracker>, already_online: usize) -> Self {
        Self {
            tracker,
            sessions: Mutex::new(SessionTable {
                online: HashSet::new(),
                unattributed: already_online,
            }),
        }
    }

    /// Number of sessions the adapter currently attributes to a player.
    pub fn tracked_sessions(&self) -> usize {
        self.lock().online.len()
    }

    fn lock(&self) -> MutexGuard<'_, SessionTable> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ConnectionListener for EventAdapter {
    fn player_connected(&self, server: &ServerId, player: PlayerId) {
        let mut sessions = self.lock();
        if !sessions.online.insert((server.clone(), player)) {
            tracing::debug!(server = %server, player = %player, "Duplicate connect ignored");
            return;
        }
        self.tracker.on_player_connected();
        tracing::trace!(server = %server, player = %player, "Player connected");
        metrics::record_player_count(self.tracker.snapshot().current_player_count);
    }

    fn player_disconnected(&self, server: &ServerId, player: PlayerId) {
        let mut sessions = self.lock();
        if !sessions.online.remove(&(server.clone(), player)) {
            if sessions.unattributed == 0 {
                tracing::debug!(server = %server, player = %player, "Disconnect for unknown session ignored");
                return;
            }
            sessions.unattributed -= 1;
        }
        self.tracker.on_player_disconnected();
        tracing::trace!(server = %server, player = %player, "Player disconnected");
        metrics::record_player_count(self.tracker.snapshot().current_player_count);
    }
}
