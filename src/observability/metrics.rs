//! Metrics collection and exposition.
//!
//! # Metrics
//! - `auto_shutdown_online_players` (gauge): aggregate connected players
//! - `auto_shutdown_transitions_total` (counter): phase entries, by `to`
//! - `auto_shutdown_ticks_skipped_total` (counter): ticks lost to an overrunning
//!   tick under the Tokio scheduler, or dropped by the idle timer's in-flight guard
//! - `auto_shutdown_hook_invocations_total` (counter): hook calls, by `outcome`

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::coordinator::Phase;

/// Install the Prometheus recorder and its HTTP listener.
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_player_count(count: usize) {
    metrics::gauge!("auto_shutdown_online_players").set(count as f64);
}

pub fn record_transition(to: Phase) {
    metrics::counter!("auto_shutdown_transitions_total", "to" => to.as_str()).increment(1);
}

pub fn record_skipped_ticks(count: u64) {
    metrics::counter!("auto_shutdown_ticks_skipped_total").increment(count);
}

pub fn record_hook_invocation(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    metrics::counter!("auto_shutdown_hook_invocations_total", "outcome" => outcome).increment(1);
}
