//! Startup orchestration.
//!
//! # Responsibilities
//! - Seed activity tracking from the host's current player count
//! - Register the event adapter with the host
//! - Build the coordinator and start the idle timer

use std::sync::Arc;

use tokio::sync::watch;

use crate::activity::{ActivityTracker, EventAdapter};
use crate::config::ShutdownConfig;
use crate::coordinator::{NoticeSink, ShutdownCoordinator, ShutdownState};
use crate::host::{ConnectionEvents, PlayerCount, ShutdownHook};
use crate::observability::metrics;
use crate::timer::{IdleTimer, Scheduler};

/// Everything the coordinator needs from the host proxy.
#[derive(Clone)]
pub struct HostPorts {
    pub events: Arc<dyn ConnectionEvents>,
    pub players: Arc<dyn PlayerCount>,
    pub hook: Arc<dyn ShutdownHook>,
    pub notices: Arc<dyn NoticeSink>,
}

/// A running idle-shutdown service.
pub struct AutoShutdown {
    config: Arc<ShutdownConfig>,
    tracker: Arc<ActivityTracker>,
    adapter: Arc<EventAdapter>,
    timer: Arc<IdleTimer>,
}

impl AutoShutdown {
    /// Wire the components together and schedule the idle timer.
    ///
    /// `config` must already be validated.
    pub fn start(config: Arc<ShutdownConfig>, ports: HostPorts, scheduler: &dyn Scheduler) -> Self {
        let online = ports.players.online_players();
        let tracker = Arc::new(ActivityTracker::with_initial_count(online));
        let adapter = Arc::new(EventAdapter::new(tracker.clone(), online));
        ports.events.register(adapter.clone());
        metrics::record_player_count(online);

        let coordinator = ShutdownCoordinator::new(&config, ports.hook, ports.notices);
        let timer = Arc::new(IdleTimer::new(tracker.clone(), coordinator, config.check_interval()));
        timer.start(scheduler);

        tracing::info!(
            players_online = online,
            idle_timeout_secs = config.idle_timeout_seconds,
            check_interval_secs = config.check_interval_seconds,
            warn_before_secs = config.warn_before_seconds,
            "Idle shutdown coordinator started"
        );

        Self {
            config,
            tracker,
            adapter,
            timer,
        }
    }

    pub fn config(&self) -> &ShutdownConfig {
        &self.config
    }

    pub fn tracker(&self) -> &Arc<ActivityTracker> {
        &self.tracker
    }

    pub fn adapter(&self) -> &Arc<EventAdapter> {
        &self.adapter
    }

    pub fn timer(&self) -> &Arc<IdleTimer> {
        &self.timer
    }

    pub fn state(&self) -> ShutdownState {
        self.timer.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<ShutdownState> {
        self.timer.subscribe()
    }

    /// Resolve once the host accepted a shutdown request.
    pub async fn wait_for_shutdown(&self) {
        let mut state = self.timer.subscribe();
        if state.wait_for(|s| s.phase.is_terminal()).await.is_err() {
            tracing::warn!("Coordinator dropped before reaching shutdown");
        }
    }

    /// Stop the idle timer and wait for any in-flight evaluation.
    pub async fn stop(&self) {
        self.timer.stop();
        self.timer.join().await;
    }
}
