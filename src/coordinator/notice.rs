//! Structured notices emitted by the coordinator.
//!
//! The coordinator only produces `Notice` values; sinks decide how (and
//! whether) to render them for players or operators.

use serde::Serialize;

use crate::config::NoticeConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NoticeKind {
    /// The proxy will shut down unless a player joins.
    Warning,
    /// A player returned before any warning went out.
    IdleCancelled,
    /// A player returned after the warning.
    ShutdownCancelled,
    /// The host accepted the shutdown request.
    ShuttingDown,
    /// The shutdown hook failed; no retry until the next idle episode.
    HookFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Notice {
    pub kind: NoticeKind,
    pub seconds_remaining: u64,
}

impl Notice {
    pub fn new(kind: NoticeKind, seconds_remaining: u64) -> Self {
        Self { kind, seconds_remaining }
    }
}

/// Receiver of coordinator notices. Must not block.
pub trait NoticeSink: Send + Sync {
    fn publish(&self, notice: Notice);
}

impl NoticeConfig {
    /// Render a notice with its template. `IdleCancelled` has no
    /// player-facing text and renders to `None`.
    pub fn render(&self, notice: &Notice) -> Option<String> {
        let template = match notice.kind {
            NoticeKind::Warning => &self.warning,
            NoticeKind::ShutdownCancelled => &self.cancelled,
            NoticeKind::ShuttingDown => &self.shutdown,
            NoticeKind::HookFailed => &self.hook_failed,
            NoticeKind::IdleCancelled => return None,
        };
        Some(template.replace("{seconds}", &notice.seconds_remaining.to_string()))
    }
}

/// Sink that writes notices to the log.
#[derive(Debug, Clone, Default)]
pub struct TracingNoticeSink {
    templates: NoticeConfig,
}

impl TracingNoticeSink {
    pub fn new(templates: NoticeConfig) -> Self {
        Self { templates }
    }
}

impl NoticeSink for TracingNoticeSink {
    fn publish(&self, notice: Notice) {
        let Some(message) = self.templates.render(&notice) else {
            tracing::debug!(kind = ?notice.kind, "Idle episode cancelled before warning");
            return;
        };
        match notice.kind {
            NoticeKind::Warning | NoticeKind::HookFailed => tracing::warn!(
                kind = ?notice.kind,
                seconds_remaining = notice.seconds_remaining,
                "{}",
                message
            ),
            _ => tracing::info!(
                kind = ?notice.kind,
                seconds_remaining = notice.seconds_remaining,
                "{}",
                message
            ),
        }
    }
}
