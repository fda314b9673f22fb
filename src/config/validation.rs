//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate duration ranges and their relative ordering
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ShutdownConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;

use crate::config::schema::ShutdownConfig;

/// Longest accepted duration: one year.
pub const MAX_DURATION_SECONDS: i64 = 365 * 24 * 60 * 60;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must be greater than zero (got {value})")]
    NotPositive { field: &'static str, value: i64 },

    #[error("{field} must be at most {max} seconds (got {value})")]
    TooLarge { field: &'static str, value: i64, max: i64 },

    #[error("{field} must not be negative (got {value})")]
    Negative { field: &'static str, value: i64 },

    #[error("warn-before-seconds ({warn_before}) must be less than idle-timeout-seconds ({idle_timeout})")]
    WarningNotBeforeTimeout { warn_before: i64, idle_timeout: i64 },

    #[error("check-interval-seconds ({check_interval}) must not exceed idle-timeout-seconds ({idle_timeout})")]
    IntervalExceedsTimeout { check_interval: i64, idle_timeout: i64 },
}

/// Check every duration field of `config`.
pub fn validate_config(config: &ShutdownConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let positive = [
        ("idle-timeout-seconds", config.idle_timeout_seconds),
        ("check-interval-seconds", config.check_interval_seconds),
        ("hook.timeout-seconds", config.hook.timeout_seconds),
    ];
    for (field, value) in positive {
        if value <= 0 {
            errors.push(ValidationError::NotPositive { field, value });
        }
    }

    let bounded = [
        ("idle-timeout-seconds", config.idle_timeout_seconds),
        ("check-interval-seconds", config.check_interval_seconds),
        ("warn-before-seconds", config.warn_before_seconds),
        ("hook.timeout-seconds", config.hook.timeout_seconds),
    ];
    for (field, value) in bounded {
        if value > MAX_DURATION_SECONDS {
            errors.push(ValidationError::TooLarge { field, value, max: MAX_DURATION_SECONDS });
        }
    }

    if config.warn_before_seconds < 0 {
        errors.push(ValidationError::Negative {
            field: "warn-before-seconds",
            value: config.warn_before_seconds,
        });
    }

    if config.warn_before_seconds >= config.idle_timeout_seconds {
        errors.push(ValidationError::WarningNotBeforeTimeout {
            warn_before: config.warn_before_seconds,
            idle_timeout: config.idle_timeout_seconds,
        });
    }

    if config.check_interval_seconds > config.idle_timeout_seconds {
        errors.push(ValidationError::IntervalExceedsTimeout {
            check_interval: config.check_interval_seconds,
            idle_timeout: config.idle_timeout_seconds,
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
