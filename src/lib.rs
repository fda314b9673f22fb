//! Idle auto-shutdown coordinator for game proxies.

pub mod activity;
pub mod config;
pub mod coordinator;
pub mod host;
pub mod lifecycle;
pub mod observability;
pub mod timer;

pub use config::ShutdownConfig;
pub use coordinator::{Phase, ShutdownCoordinator};
pub use lifecycle::{AutoShutdown, HostPorts, Shutdown};
