//! Idle auto-shutdown sidecar for a game proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!   Proxy                          ┌───────────────────────────────────────────────┐
//!   (plugin / wrapper)             │               AUTO-PROXY-SHUTDOWN             │
//!                                  │                                               │
//!   connect/disconnect  ── stdin ──┼─▶ host::stdio ──▶ activity::adapter           │
//!   JSON lines                     │                        │                      │
//!                                  │                        ▼                      │
//!                                  │                 activity::tracker             │
//!                                  │                        │ snapshot             │
//!                                  │                        ▼                      │
//!                                  │   timer::scheduler ─▶ timer::idle (tick)      │
//!                                  │                        │                      │
//!                                  │                        ▼                      │
//!   notices / shutdown  ◀─ stdout ─┼── host::stdio ◀── coordinator (state machine) │
//!   request                        │   host::command ◀──────┘                      │
//!                                  └───────────────────────────────────────────────┘
//! ```

use std::error::Error;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use auto_proxy_shutdown::config::load_or_init_config;
use auto_proxy_shutdown::host::command::CommandShutdownHook;
use auto_proxy_shutdown::host::stdio::{read_lines, JsonLinesNoticeSink, LineWriter, StdioBridge, StdoutShutdownHook};
use auto_proxy_shutdown::host::ShutdownHook;
use auto_proxy_shutdown::lifecycle::signals::{wait_for_exit, wait_for_signal};
use auto_proxy_shutdown::observability::{logging, metrics};
use auto_proxy_shutdown::timer::TokioScheduler;
use auto_proxy_shutdown::{AutoShutdown, HostPorts, Shutdown};

#[derive(Parser)]
#[command(name = "auto-proxy-shutdown")]
#[command(about = "Shut a game proxy down after it has been empty for a while", long_about = None)]
struct Cli {
    /// Path to the YAML (or .toml) configuration file. Created with
    /// defaults if missing.
    #[arg(short, long, default_value = "auto-shutdown.yml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let loaded = load_or_init_config(&cli.config);
    let level = loaded
        .as_ref()
        .map(|c| c.observability.log_level.clone())
        .unwrap_or_else(|_| "info".to_string());
    logging::init_logging(&level)?;

    let config = match loaded {
        Ok(config) => Arc::new(config),
        Err(e) => {
            tracing::error!(path = ?cli.config, error = %e, "Configuration rejected, not starting");
            return Err(e.into());
        }
    };

    tracing::info!(
        path = ?cli.config,
        idle_timeout_secs = config.idle_timeout_seconds,
        check_interval_secs = config.check_interval_seconds,
        warn_before_secs = config.warn_before_seconds,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics endpoint");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let out = LineWriter::stdout();
    let hook: Arc<dyn ShutdownHook> = match CommandShutdownHook::from_argv(&config.hook.command) {
        Some(command) => Arc::new(command),
        None => Arc::new(StdoutShutdownHook::new(out.clone())),
    };
    let bridge = Arc::new(StdioBridge::new());
    let ports = HostPorts {
        events: bridge.clone(),
        players: bridge.clone(),
        hook,
        notices: Arc::new(JsonLinesNoticeSink::new(config.notices.clone(), out)),
    };

    let shutdown = Shutdown::new();
    let service = AutoShutdown::start(config, ports, &TokioScheduler);

    let reader = tokio::spawn({
        let bridge = bridge.clone();
        let lines = read_lines(std::io::BufReader::new(std::io::stdin()));
        let stop = shutdown.subscribe();
        async move { bridge.run(lines, stop).await }
    });

    let reason = wait_for_exit(service.wait_for_shutdown(), wait_for_signal()).await;
    shutdown.trigger(reason);

    service.stop().await;
    if let Err(e) = reader.await {
        tracing::error!(error = %e, "Bridge reader task failed");
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
