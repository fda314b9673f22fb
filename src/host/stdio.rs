//! JSON-lines bridge between a proxy and the sidecar binary.
//!
//! # Protocol
//! ```text
//! stdin  {"event":"connected","server":"lobby","player":"<uuid>"}
//! stdin  {"event":"disconnected","server":"lobby","player":"<uuid>"}
//! stdout {"notice":"warning","seconds-remaining":60,"message":"..."}
//! stdout {"request":"shutdown"}
//! ```
//!
//! # Design Decisions
//! - Stdin is read on a plain thread and forwarded over an unbounded
//!   channel, so a blocked read never holds up runtime shutdown
//! - Malformed lines are logged and skipped
//! - The bridge has seen nobody at startup, so it reports zero players

use std::io::{self, BufRead, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};

use crate::config::NoticeConfig;
use crate::coordinator::{Notice, NoticeKind, NoticeSink, TracingNoticeSink};
use crate::host::{
    ConnectionEvents, ConnectionListener, HookError, PlayerCount, PlayerId, ServerId, ShutdownHook,
};

/// One line of bridge input.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum BridgeEvent {
    Connected { server: ServerId, player: PlayerId },
    Disconnected { server: ServerId, player: PlayerId },
}

/// Host event source fed from JSON lines.
#[derive(Default)]
pub struct StdioBridge {
    listeners: RwLock<Vec<Arc<dyn ConnectionListener>>>,
}

impl StdioBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse one line and deliver it to every listener. Blank lines are
    /// ignored.
    pub fn dispatch_line(&self, line: &str) -> Result<(), serde_json::Error> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(());
        }
        let event: BridgeEvent = serde_json::from_str(line)?;
        self.dispatch(&event);
        Ok(())
    }

    pub fn dispatch(&self, event: &BridgeEvent) {
        let listeners = self.listeners.read().unwrap_or_else(PoisonError::into_inner);
        for listener in listeners.iter() {
            match event {
                BridgeEvent::Connected { server, player } => listener.player_connected(server, *player),
                BridgeEvent::Disconnected { server, player } => {
                    listener.player_disconnected(server, *player)
                }
            }
        }
    }

    /// Consume lines until the stream ends or shutdown is signalled.
    pub async fn run(
        &self,
        mut lines: mpsc::UnboundedReceiver<String>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                line = lines.recv() => match line {
                    Some(line) => {
                        if let Err(e) = self.dispatch_line(&line) {
                            tracing::warn!(error = %e, line = %line, "Skipping malformed bridge event");
                        }
                    }
                    None => {
                        tracing::info!("Bridge input closed; no further connection events");
                        break;
                    }
                },
                _ = shutdown.recv() => {
                    tracing::debug!("Bridge reader received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}

impl ConnectionEvents for StdioBridge {
    fn register(&self, listener: Arc<dyn ConnectionListener>) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }
}

impl PlayerCount for StdioBridge {
    fn online_players(&self) -> usize {
        0
    }
}

/// Read `reader` line by line on a background thread.
pub fn read_lines<R>(reader: R) -> mpsc::UnboundedReceiver<String>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in reader.lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to read bridge input");
                    break;
                }
            }
        }
    });
    rx
}

/// Shared, line-oriented JSON writer.
#[derive(Clone)]
pub struct LineWriter {
    out: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl LineWriter {
    pub fn new(out: impl Write + Send + 'static) -> Self {
        let out: Box<dyn Write + Send> = Box::new(out);
        Self {
            out: Arc::new(Mutex::new(out)),
        }
    }

    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    pub fn write_json<T: Serialize>(&self, value: &T) -> io::Result<()> {
        let mut line = serde_json::to_vec(value)?;
        line.push(b'\n');
        let mut out = self.lock();
        out.write_all(&line)?;
        out.flush()
    }

    fn lock(&self) -> MutexGuard<'_, Box<dyn Write + Send>> {
        self.out.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
struct NoticeLine<'a> {
    notice: NoticeKind,
    seconds_remaining: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
}

/// Notice sink that logs each notice and writes it as a JSON line.
pub struct JsonLinesNoticeSink {
    templates: NoticeConfig,
    log: TracingNoticeSink,
    out: LineWriter,
}

impl JsonLinesNoticeSink {
    pub fn new(templates: NoticeConfig, out: LineWriter) -> Self {
        Self {
            log: TracingNoticeSink::new(templates.clone()),
            templates,
            out,
        }
    }
}

impl NoticeSink for JsonLinesNoticeSink {
    fn publish(&self, notice: Notice) {
        self.log.publish(notice);
        let message = self.templates.render(&notice);
        let line = NoticeLine {
            notice: notice.kind,
            seconds_remaining: notice.seconds_remaining,
            message: message.as_deref(),
        };
        if let Err(e) = self.out.write_json(&line) {
            tracing::error!(error = %e, "Failed to write notice to bridge output");
        }
    }
}

/// Shutdown hook that asks the proxy over the bridge output.
pub struct StdoutShutdownHook {
    out: LineWriter,
}

impl StdoutShutdownHook {
    pub fn new(out: LineWriter) -> Self {
        Self { out }
    }
}

#[async_trait]
impl ShutdownHook for StdoutShutdownHook {
    async fn request_proxy_shutdown(&self) -> Result<(), HookError> {
        self.out.write_json(&serde_json::json!({ "request": "shutdown" }))?;
        Ok(())
    }
}
