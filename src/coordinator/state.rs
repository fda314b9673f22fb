//! Idle shutdown state machine.
//!
//! # States
//! - Active: players online, nothing scheduled
//! - IdlePending: zero players observed, waiting for the warning threshold
//! - Warned: warning published, waiting for the timeout
//! - ShuttingDown: hook succeeded (terminal)
//!
//! # State Transitions
//! ```text
//! Active → IdlePending: player_count == 0
//! IdlePending → Active: player_count > 0
//! IdlePending → Warned: idle ≥ timeout - warn, warn > 0
//! IdlePending → ShuttingDown: idle ≥ timeout, warn == 0
//! Warned → Active: player_count > 0
//! Warned → ShuttingDown: idle ≥ timeout
//! ```
//!
//! `step` is pure: it maps (phase, inputs) to the next phase and the side
//! effect the coordinator must perform. It never looks at the clock.

use std::fmt;
use std::time::Duration;

use tokio::time::Instant;

use crate::config::ShutdownConfig;

/// Coordinator phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Active,
    IdlePending,
    Warned,
    ShuttingDown,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Active => "active",
            Phase::IdlePending => "idle_pending",
            Phase::Warned => "warned",
            Phase::ShuttingDown => "shutting_down",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::ShuttingDown)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current phase and the instant it was entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownState {
    pub phase: Phase,
    pub entered_at: Instant,
}

impl ShutdownState {
    pub fn new(phase: Phase) -> Self {
        Self {
            phase,
            entered_at: Instant::now(),
        }
    }
}

/// Side effect attached to a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    /// Publish the shutdown warning.
    Warn,
    /// Episode cancelled by a returning player. `warned` tells whether a
    /// warning had already gone out.
    Cancel { warned: bool },
    /// Call the host shutdown hook.
    InvokeHook,
}

/// Result of one state machine step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub next: Phase,
    pub action: Action,
}

impl Step {
    fn stay(phase: Phase) -> Self {
        Self { next: phase, action: Action::None }
    }

    fn to(next: Phase, action: Action) -> Self {
        Self { next, action }
    }
}

/// Timing thresholds the state machine compares idle time against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    pub idle_timeout: Duration,
    pub warn_before: Duration,
}

impl Thresholds {
    pub fn from_config(config: &ShutdownConfig) -> Self {
        Self {
            idle_timeout: config.idle_timeout(),
            warn_before: config.warn_before(),
        }
    }

    /// Idle time at which the warning goes out.
    pub fn warn_at(&self) -> Duration {
        self.idle_timeout.saturating_sub(self.warn_before)
    }

    /// Whole seconds left until the timeout, rounded up.
    pub fn seconds_remaining(&self, idle_elapsed: Duration) -> u64 {
        let left = self.idle_timeout.saturating_sub(idle_elapsed);
        left.as_secs() + u64::from(left.subsec_nanos() > 0)
    }

    pub fn step(&self, phase: Phase, player_count: usize, idle_elapsed: Duration) -> Step {
        let warns = !self.warn_before.is_zero();
        match phase {
            Phase::ShuttingDown => Step::stay(phase),
            Phase::Active if player_count > 0 => Step::stay(phase),
            Phase::Active => Step::to(Phase::IdlePending, Action::None),
            Phase::IdlePending if player_count > 0 => {
                Step::to(Phase::Active, Action::Cancel { warned: false })
            }
            Phase::IdlePending if warns && idle_elapsed >= self.warn_at() => {
                Step::to(Phase::Warned, Action::Warn)
            }
            Phase::IdlePending if !warns && idle_elapsed >= self.idle_timeout => {
                Step::to(Phase::ShuttingDown, Action::InvokeHook)
            }
            Phase::IdlePending => Step::stay(phase),
            Phase::Warned if player_count > 0 => {
                Step::to(Phase::Active, Action::Cancel { warned: true })
            }
            Phase::Warned if idle_elapsed >= self.idle_timeout => {
                Step::to(Phase::ShuttingDown, Action::InvokeHook)
            }
            Phase::Warned => Step::stay(phase),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thresholds(timeout: u64, warn: u64) -> Thresholds {
        Thresholds {
            idle_timeout: Duration::from_secs(timeout),
            warn_before: Duration::from_secs(warn),
        }
    }

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn active_stays_active_with_players() {
        let t = thresholds(60, 10);
        assert_eq!(t.step(Phase::Active, 3, secs(0)), Step::stay(Phase::Active));
    }

    #[test]
    fn active_moves_to_pending_without_action() {
        let t = thresholds(60, 10);
        assert_eq!(
            t.step(Phase::Active, 0, secs(0)),
            Step::to(Phase::IdlePending, Action::None)
        );
    }

    #[test]
    fn warning_threshold_is_inclusive() {
        let t = thresholds(60, 10);
        assert_eq!(t.step(Phase::IdlePending, 0, secs(49)), Step::stay(Phase::IdlePending));
        assert_eq!(
            t.step(Phase::IdlePending, 0, secs(50)),
            Step::to(Phase::Warned, Action::Warn)
        );
    }

    #[test]
    fn timeout_threshold_is_inclusive_without_warning() {
        let t = thresholds(120, 0);
        assert_eq!(t.step(Phase::IdlePending, 0, secs(119)), Step::stay(Phase::IdlePending));
        assert_eq!(
            t.step(Phase::IdlePending, 0, secs(120)),
            Step::to(Phase::ShuttingDown, Action::InvokeHook)
        );
    }

    #[test]
    fn pending_never_skips_warning() {
        let t = thresholds(60, 10);
        assert_eq!(
            t.step(Phase::IdlePending, 0, secs(500)),
            Step::to(Phase::Warned, Action::Warn)
        );
    }

    #[test]
    fn warned_fires_at_timeout() {
        let t = thresholds(60, 10);
        assert_eq!(t.step(Phase::Warned, 0, secs(59)), Step::stay(Phase::Warned));
        assert_eq!(
            t.step(Phase::Warned, 0, secs(60)),
            Step::to(Phase::ShuttingDown, Action::InvokeHook)
        );
    }

    #[test]
    fn reconnect_cancels() {
        let t = thresholds(60, 10);
        assert_eq!(
            t.step(Phase::IdlePending, 1, secs(0)),
            Step::to(Phase::Active, Action::Cancel { warned: false })
        );
        assert_eq!(
            t.step(Phase::Warned, 1, secs(0)),
            Step::to(Phase::Active, Action::Cancel { warned: true })
        );
    }

    #[test]
    fn shutting_down_is_terminal() {
        let t = thresholds(60, 10);
        for count in [0, 5] {
            assert_eq!(t.step(Phase::ShuttingDown, count, secs(999)), Step::stay(Phase::ShuttingDown));
        }
    }

    #[test]
    fn remaining_seconds_round_up() {
        let t = thresholds(60, 10);
        assert_eq!(t.seconds_remaining(secs(50)), 10);
        assert_eq!(t.seconds_remaining(Duration::from_millis(50_500)), 10);
        assert_eq!(t.seconds_remaining(secs(90)), 0);
    }
}
