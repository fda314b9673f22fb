//! Scheduling port for periodic callbacks.
//!
//! # Responsibilities
//! - Run a task repeatedly at a fixed cadence until cancelled
//! - Hand back a handle that cancels and joins the task
//!
//! # Design Decisions
//! - Ticks of one task never overlap: the next tick waits for the previous
//!   future to finish, and missed ticks are skipped, not bunched
//! - Cancellation is observed between ticks, never in the middle of one
//! - Intervals a tick overran are counted as skipped ticks
//! - An interval too long for the clock never fires and only waits for
//!   cancellation
//! - `ManualScheduler` fires ticks on demand for hosts with their own clock
//!   and for deterministic tests

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::observability::metrics;

/// One invocation of a repeating task.
pub type Tick = BoxFuture<'static, ()>;

/// Factory producing the future for each tick.
pub type RepeatingTask = Box<dyn FnMut() -> Tick + Send>;

/// Capability to schedule periodic work.
pub trait Scheduler: Send + Sync {
    /// Run `task` every `interval`, first after one full interval.
    fn schedule_repeating(&self, interval: Duration, task: RepeatingTask) -> TaskHandle;
}

/// Handle to a scheduled task. Dropping it also stops the task.
#[derive(Debug)]
pub struct TaskHandle {
    cancel: watch::Sender<bool>,
    join: Option<JoinHandle<()>>,
}

impl TaskHandle {
    pub fn new(cancel: watch::Sender<bool>, join: Option<JoinHandle<()>>) -> Self {
        Self { cancel, join }
    }

    /// Stop the task after its current tick, if any.
    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    /// Wait for the task to finish. Call `cancel` first.
    pub async fn join(mut self) {
        if let Some(join) = self.join.take() {
            if let Err(e) = join.await {
                tracing::error!(error = %e, "Scheduled task terminated abnormally");
            }
        }
    }
}

/// Scheduler backed by a Tokio interval. Must be used inside a runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

impl Scheduler for TokioScheduler {
    fn schedule_repeating(&self, interval: Duration, mut task: RepeatingTask) -> TaskHandle {
        let (cancel, mut cancelled) = watch::channel(false);

        let join = tokio::spawn(async move {
            let Some(first) = Instant::now().checked_add(interval) else {
                tracing::warn!(interval = ?interval, "Interval out of range for the clock, task will never run");
                let _ = cancelled.wait_for(|cancelled| *cancelled).await;
                return;
            };
            let mut ticker = time::interval_at(first, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let started = Instant::now();
                        task().await;
                        let missed = missed_ticks(started.elapsed(), interval);
                        if missed > 0 {
                            tracing::debug!(missed, "Tick overran its interval, skipping missed ticks");
                            metrics::record_skipped_ticks(missed);
                        }
                    }
                    // Err means the handle was dropped.
                    changed = cancelled.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
                if *cancelled.borrow() {
                    break;
                }
            }
        });

        TaskHandle::new(cancel, Some(join))
    }
}

/// Whole intervals that passed while a tick was running.
fn missed_ticks(ran_for: Duration, interval: Duration) -> u64 {
    if interval.is_zero() {
        return 0;
    }
    u64::try_from(ran_for.as_nanos() / interval.as_nanos()).unwrap_or(u64::MAX)
}

struct ManualTask {
    interval: Duration,
    cancelled: watch::Receiver<bool>,
    task: RepeatingTask,
}

impl ManualTask {
    fn is_live(&self) -> bool {
        !*self.cancelled.borrow() && self.cancelled.has_changed().is_ok()
    }
}

/// Scheduler whose ticks are fired explicitly with [`ManualScheduler::fire`].
#[derive(Default)]
pub struct ManualScheduler {
    tasks: Mutex<Vec<ManualTask>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one tick of every live task, in scheduling order. Returns the
    /// number of tasks that ran.
    pub async fn fire(&self) -> usize {
        let mut batch = std::mem::take(&mut *self.lock());
        let mut ran = 0;

        for entry in batch.iter_mut().filter(|t| t.is_live()) {
            (entry.task)().await;
            ran += 1;
        }

        batch.retain(ManualTask::is_live);
        let mut tasks = self.lock();
        // Keep tasks scheduled while the batch was running.
        batch.append(&mut tasks);
        *tasks = batch;
        ran
    }

    /// Intervals of the tasks that are still live.
    pub fn live_intervals(&self) -> Vec<Duration> {
        self.lock().iter().filter(|t| t.is_live()).map(|t| t.interval).collect()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ManualTask>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_repeating(&self, interval: Duration, task: RepeatingTask) -> TaskHandle {
        let (cancel, cancelled) = watch::channel(false);
        self.lock().push(ManualTask { interval, cancelled, task });
        TaskHandle::new(cancel, None)
    }
}
