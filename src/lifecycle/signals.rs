//! OS signal handling.
//!
//! # Responsibilities
//! - Wait for SIGINT/SIGTERM (ctrl-c elsewhere)
//! - Report which signal arrived so the caller can trigger shutdown
//! - Keep waiting for the idle shutdown if signals cannot be installed

use std::future::Future;
use std::io;

/// Exit reason reported when the idle shutdown completes first.
pub const IDLE_SHUTDOWN: &str = "idle timeout reached";

/// Resolve when the process is asked to terminate.
#[cfg(unix)]
pub async fn wait_for_signal() -> io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result.map(|_| "SIGINT"),
        _ = terminate.recv() => Ok("SIGTERM"),
    }
}

#[cfg(not(unix))]
pub async fn wait_for_signal() -> io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("ctrl-c")
}

/// Wait for the idle shutdown or a termination signal and return the reason.
///
/// A signal listener that fails to install is logged, and only the idle
/// shutdown is awaited from then on.
pub async fn wait_for_exit<I, S>(idle: I, signal: S) -> &'static str
where
    I: Future<Output = ()>,
    S: Future<Output = io::Result<&'static str>>,
{
    tokio::pin!(idle);
    tokio::select! {
        _ = &mut idle => IDLE_SHUTDOWN,
        signal = signal => match signal {
            Ok(name) => name,
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for signals, waiting for idle shutdown only");
                idle.await;
                IDLE_SHUTDOWN
            }
        },
    }
}
