//! Player activity subsystem.
//!
//! # Data Flow
//! ```text
//! Host connect/disconnect callback
//!     → adapter.rs (dedupe per server/player pair)
//!     → tracker.rs (count + zero_since, one critical section)
//!     → snapshot() read by the idle timer each tick
//! ```

pub mod adapter;
pub mod tracker;

pub use adapter::EventAdapter;
pub use tracker::{ActivityState, ActivityTracker};
