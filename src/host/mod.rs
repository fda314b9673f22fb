//! Host proxy ports.
//!
//! # Data Flow
//! ```text
//! Host proxy                         Coordinator
//!     ConnectionEvents ──register──▶ ConnectionListener (activity::adapter)
//!     PlayerCount      ◀──query───── lifecycle::startup (seeding)
//!     ShutdownHook     ◀──invoke──── coordinator (once per idle episode)
//! ```
//!
//! # Design Decisions
//! - The core never talks to a concrete proxy; hosts implement these traits
//! - Listener callbacks are synchronous and infallible so nothing can
//!   propagate back into the host's connection handling path
//! - stdio.rs and command.rs are the sidecar binary's host implementation

pub mod command;
pub mod stdio;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Name of a backend server behind the proxy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerId(pub String);

impl From<&str> for ServerId {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl fmt::Display for ServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique player identity as issued by the proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub Uuid);

impl From<Uuid> for PlayerId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Receiver of the host's connection notifications.
pub trait ConnectionListener: Send + Sync {
    fn player_connected(&self, server: &ServerId, player: PlayerId);
    fn player_disconnected(&self, server: &ServerId, player: PlayerId);
}

/// The host's connection-event bus.
pub trait ConnectionEvents: Send + Sync {
    /// Deliver every future connect/disconnect to `listener`.
    fn register(&self, listener: Arc<dyn ConnectionListener>);
}

/// Query for the number of players currently on the proxy.
pub trait PlayerCount: Send + Sync {
    fn online_players(&self) -> usize;
}

/// Errors returned by a shutdown hook.
#[derive(Debug, Error)]
pub enum HookError {
    /// The host refused or failed to start the shutdown.
    #[error("host rejected shutdown request: {0}")]
    Rejected(String),

    /// The hook did not return within the configured deadline.
    #[error("shutdown hook timed out after {0:?}")]
    TimedOut(Duration),

    #[error("shutdown hook I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Operation that asks the host proxy to shut down.
#[async_trait]
pub trait ShutdownHook: Send + Sync {
    async fn request_proxy_shutdown(&self) -> Result<(), HookError>;
}
