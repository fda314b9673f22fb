//! Shutdown coordination subsystem.
//!
//! # Data Flow
//! ```text
//! Idle timer tick (player_count, idle_elapsed)
//!     → state.rs (pure transition + action)
//!     → engine.rs (apply: publish notice / call hook)
//!     → notice.rs (structured notice to the sink)
//!     → host ShutdownHook (once per idle episode)
//! ```
//!
//! # Design Decisions
//! - Decisions never read the clock; elapsed time is an input
//! - ShuttingDown is entered only after the hook succeeds and is never left
//! - A failed hook latches the episode; only a return to Active re-arms it

pub mod engine;
pub mod notice;
pub mod state;

pub use engine::ShutdownCoordinator;
pub use notice::{Notice, NoticeKind, NoticeSink, TracingNoticeSink};
pub use state::{Phase, ShutdownState, Thresholds};
