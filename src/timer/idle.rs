//! Periodic idle evaluation.
//!
//! # Responsibilities
//! - Read the activity snapshot on every tick
//! - Compute idle time and hand it to the coordinator
//! - Stop itself once the coordinator reaches ShuttingDown
//!
//! # Design Decisions
//! - Purely a clock source; all decisions live in the coordinator
//! - In-flight guard skips (never queues) a tick that arrives while the
//!   previous evaluation is still running, e.g. during a slow hook call.
//!   `TokioScheduler` already runs ticks back to back and drops the ones an
//!   overrun missed, so the guard only trips for callers that invoke `tick`
//!   directly or through a scheduler that overlaps ticks

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures_util::FutureExt;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::activity::ActivityTracker;
use crate::coordinator::{Phase, ShutdownCoordinator, ShutdownState};
use crate::observability::metrics;
use crate::timer::scheduler::{RepeatingTask, Scheduler, TaskHandle};

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The coordinator ran and ended in this phase.
    Evaluated(Phase),
    /// A previous evaluation was still running.
    Skipped,
    /// The timer has been stopped.
    Stopped,
}

pub struct IdleTimer {
    tracker: Arc<ActivityTracker>,
    coordinator: tokio::sync::Mutex<ShutdownCoordinator>,
    state: watch::Receiver<ShutdownState>,
    interval: Duration,
    handle: Mutex<Option<TaskHandle>>,
    stopped: AtomicBool,
}

impl IdleTimer {
    pub fn new(
        tracker: Arc<ActivityTracker>,
        coordinator: ShutdownCoordinator,
        interval: Duration,
    ) -> Self {
        let state = coordinator.subscribe();
        Self {
            tracker,
            coordinator: tokio::sync::Mutex::new(coordinator),
            state,
            interval,
            handle: Mutex::new(None),
            stopped: AtomicBool::new(false),
        }
    }

    /// Schedule the recurring tick. Returns false if the timer was already
    /// started or has been stopped.
    pub fn start(self: &Arc<Self>, scheduler: &dyn Scheduler) -> bool {
        let mut slot = self.lock_handle();
        if slot.is_some() || self.stopped.load(Ordering::SeqCst) {
            tracing::warn!("Idle timer already started, ignoring");
            return false;
        }

        let timer = Arc::downgrade(self);
        let task: RepeatingTask = Box::new(move || {
            let timer = timer.clone();
            async move {
                if let Some(timer) = timer.upgrade() {
                    timer.tick().await;
                }
            }
            .boxed()
        });

        *slot = Some(scheduler.schedule_repeating(self.interval, task));
        tracing::info!(interval_secs = self.interval.as_secs(), "Idle timer started");
        true
    }

    /// Evaluate idle state once.
    pub async fn tick(&self) -> TickOutcome {
        if self.stopped.load(Ordering::SeqCst) {
            return TickOutcome::Stopped;
        }

        let Ok(mut coordinator) = self.coordinator.try_lock() else {
            tracing::debug!("Previous idle evaluation still running, skipping tick");
            metrics::record_skipped_ticks(1);
            return TickOutcome::Skipped;
        };

        let snapshot = self.tracker.snapshot();
        let idle_elapsed = snapshot.idle_elapsed(Instant::now());
        tracing::trace!(
            player_count = snapshot.current_player_count,
            idle_secs = idle_elapsed.as_secs(),
            "Idle tick"
        );

        let phase = coordinator
            .evaluate(snapshot.current_player_count, idle_elapsed, snapshot.reconnects)
            .await;
        drop(coordinator);

        if phase.is_terminal() {
            self.stop();
        }
        TickOutcome::Evaluated(phase)
    }

    /// Cancel further ticks. An evaluation already running completes.
    pub fn stop(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(handle) = self.lock_handle().as_ref() {
            handle.cancel();
        }
        tracing::info!("Idle timer stopped");
    }

    /// Wait for the scheduled task to exit. Must not be called from a tick.
    pub async fn join(&self) {
        let handle = self.lock_handle().take();
        if let Some(handle) = handle {
            handle.cancel();
            handle.join().await;
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> ShutdownState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ShutdownState> {
        self.state.clone()
    }

    fn lock_handle(&self) -> MutexGuard<'_, Option<TaskHandle>> {
        self.handle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
