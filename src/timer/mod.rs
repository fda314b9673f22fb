//! Idle timer subsystem.
//!
//! # Data Flow
//! ```text
//! Scheduler (tokio interval or manual)
//!     → idle.rs tick
//!         → ActivityTracker::snapshot()
//!         → ShutdownCoordinator::evaluate(count, idle_elapsed, reconnects)
//!     → cancelled at ShuttingDown or on process shutdown
//! ```

pub mod idle;
pub mod scheduler;

pub use idle::{IdleTimer, TickOutcome};
pub use scheduler::{ManualScheduler, RepeatingTask, Scheduler, TaskHandle, TokioScheduler};
