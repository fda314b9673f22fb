//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! coordinator. All types derive Serde traits for deserialization from
//! YAML or TOML files. Keys are kebab-case; unknown keys are ignored.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the idle shutdown coordinator.
///
/// Durations are kept as signed integers so that a negative value in the
/// file reaches validation (and is reported as an invalid duration) instead
/// of failing deserialization.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ShutdownConfig {
    /// Seconds with zero players before the proxy is shut down.
    pub idle_timeout_seconds: i64,

    /// Seconds between idle evaluations.
    pub check_interval_seconds: i64,

    /// Seconds before shutdown at which players are warned (0 disables).
    pub warn_before_seconds: i64,

    /// Shutdown hook settings.
    pub hook: HookConfig,

    /// Notice message templates.
    pub notices: NoticeConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            idle_timeout_seconds: 600,
            check_interval_seconds: 30,
            warn_before_seconds: 60,
            hook: HookConfig::default(),
            notices: NoticeConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl ShutdownConfig {
    /// Build a config with the three core timings and defaults elsewhere.
    pub fn with_timings(idle_timeout: i64, check_interval: i64, warn_before: i64) -> Self {
        Self {
            idle_timeout_seconds: idle_timeout,
            check_interval_seconds: check_interval,
            warn_before_seconds: warn_before,
            ..Self::default()
        }
    }

    pub fn idle_timeout(&self) -> Duration {
        secs(self.idle_timeout_seconds)
    }

    pub fn check_interval(&self) -> Duration {
        secs(self.check_interval_seconds)
    }

    pub fn warn_before(&self) -> Duration {
        secs(self.warn_before_seconds)
    }

    pub fn hook_timeout(&self) -> Duration {
        secs(self.hook.timeout_seconds)
    }
}

/// Negative values only exist in unvalidated configs; clamp them to zero.
fn secs(value: i64) -> Duration {
    Duration::from_secs(u64::try_from(value).unwrap_or(0))
}

/// Shutdown hook configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct HookConfig {
    /// Deadline for a single hook invocation in seconds.
    pub timeout_seconds: i64,

    /// Program and arguments run by the sidecar binary's command hook.
    /// Empty means the shutdown request is written to stdout instead.
    pub command: Vec<String>,
}

impl Default for HookConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            command: Vec::new(),
        }
    }
}

/// Message templates used by notice sinks. `{seconds}` is replaced with
/// the remaining seconds of the notice.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct NoticeConfig {
    pub warning: String,
    pub cancelled: String,
    pub shutdown: String,
    pub hook_failed: String,
}

impl Default for NoticeConfig {
    fn default() -> Self {
        Self {
            warning: "No players online. Proxy shutting down in {seconds} seconds.".to_string(),
            cancelled: "A player joined. Proxy shutdown cancelled.".to_string(),
            shutdown: "Proxy idle, shutting down now.".to_string(),
            hook_failed: "Proxy shutdown request failed; staying online.".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9464".to_string(),
        }
    }
}
