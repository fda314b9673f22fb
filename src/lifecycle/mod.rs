//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validated config → Query host player count → Seed tracker
//!     → Register event adapter → Start idle timer
//!
//! Shutdown (shutdown.rs):
//!     Idle shutdown or signal → Stop background tasks → Join timer → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger process shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then tracking, then the timer
//! - Config errors are fatal before anything is registered with the host
//! - The timer task is joined before exit so an in-flight hook completes

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{AutoShutdown, HostPorts};
