//! Shutdown decision engine.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time;

use crate::config::ShutdownConfig;
use crate::coordinator::notice::{Notice, NoticeKind, NoticeSink};
use crate::coordinator::state::{Action, Phase, ShutdownState, Thresholds};
use crate::host::{HookError, ShutdownHook};
use crate::observability::metrics;

/// Owns the idle state machine and performs its side effects.
///
/// `evaluate` takes `&mut self`; the idle timer serializes calls.
pub struct ShutdownCoordinator {
    thresholds: Thresholds,
    hook_timeout: Duration,
    hook: Arc<dyn ShutdownHook>,
    notices: Arc<dyn NoticeSink>,
    state: watch::Sender<ShutdownState>,
    /// Set when the hook has been called in the current idle episode.
    fired: bool,
    /// Tracker reconnect count seen by the last evaluation.
    reconnects: u64,
}

impl ShutdownCoordinator {
    pub fn new(
        config: &ShutdownConfig,
        hook: Arc<dyn ShutdownHook>,
        notices: Arc<dyn NoticeSink>,
    ) -> Self {
        let (state, _) = watch::channel(ShutdownState::new(Phase::Active));
        Self {
            thresholds: Thresholds::from_config(config),
            hook_timeout: config.hook_timeout(),
            hook,
            notices,
            state,
            fired: false,
            reconnects: 0,
        }
    }

    pub fn state(&self) -> ShutdownState {
        *self.state.borrow()
    }

    /// Watch phase changes.
    pub fn subscribe(&self) -> watch::Receiver<ShutdownState> {
        self.state.subscribe()
    }

    /// Advance the state machine for one observation.
    ///
    /// `reconnects` is the tracker's count of zero → positive transitions.
    /// If it moved since the last call, a player returned in between and
    /// the running idle episode is cancelled before the observation is
    /// applied, even if the proxy is empty again by now.
    ///
    /// The action-free Active → IdlePending step is followed by a second
    /// step in the same call; every other transition takes one call.
    pub async fn evaluate(
        &mut self,
        player_count: usize,
        idle_elapsed: Duration,
        reconnects: u64,
    ) -> Phase {
        if reconnects != self.reconnects {
            self.reconnects = reconnects;
            match self.state().phase {
                Phase::IdlePending => self.cancel(player_count, false),
                Phase::Warned => self.cancel(player_count, true),
                Phase::Active | Phase::ShuttingDown => {}
            }
        }

        let current = self.state().phase;
        let mut step = self.thresholds.step(current, player_count, idle_elapsed);

        if current == Phase::Active && step.next == Phase::IdlePending {
            self.enter(Phase::IdlePending);
            step = self.thresholds.step(Phase::IdlePending, player_count, idle_elapsed);
        }

        match step.action {
            Action::None => {}
            Action::Warn => {
                self.enter(Phase::Warned);
                let remaining = self.thresholds.seconds_remaining(idle_elapsed);
                tracing::info!(
                    idle_secs = idle_elapsed.as_secs(),
                    seconds_remaining = remaining,
                    "Proxy idle, shutdown warning issued"
                );
                self.notices.publish(Notice::new(NoticeKind::Warning, remaining));
            }
            Action::Cancel { warned } => self.cancel(player_count, warned),
            Action::InvokeHook => self.invoke_hook(idle_elapsed).await,
        }

        self.state().phase
    }

    fn cancel(&mut self, player_count: usize, warned: bool) {
        self.enter(Phase::Active);
        self.fired = false;
        tracing::info!(player_count, warned, "Player activity resumed, idle shutdown cancelled");
        let kind = if warned {
            NoticeKind::ShutdownCancelled
        } else {
            NoticeKind::IdleCancelled
        };
        self.notices.publish(Notice::new(kind, 0));
    }

    async fn invoke_hook(&mut self, idle_elapsed: Duration) {
        if self.fired {
            tracing::trace!("Shutdown hook already called this idle episode");
            return;
        }
        self.fired = true;

        tracing::info!(idle_secs = idle_elapsed.as_secs(), "Idle timeout reached, requesting proxy shutdown");

        let outcome = match time::timeout(self.hook_timeout, self.hook.request_proxy_shutdown()).await {
            Ok(result) => result,
            Err(_) => Err(HookError::TimedOut(self.hook_timeout)),
        };

        match outcome {
            Ok(()) => {
                metrics::record_hook_invocation(true);
                self.enter(Phase::ShuttingDown);
                self.notices.publish(Notice::new(NoticeKind::ShuttingDown, 0));
            }
            Err(e) => {
                metrics::record_hook_invocation(false);
                tracing::error!(
                    error = %e,
                    phase = %self.state().phase,
                    "Shutdown hook failure; no retry until a new idle episode"
                );
                self.notices.publish(Notice::new(NoticeKind::HookFailed, 0));
            }
        }
    }

    fn enter(&mut self, phase: Phase) {
        let from = self.state().phase;
        if from == phase {
            return;
        }
        self.state.send_replace(ShutdownState::new(phase));
        metrics::record_transition(phase);
        tracing::debug!(from = %from, to = %phase, "Shutdown state transition");
    }
}
