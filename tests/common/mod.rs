//! Shared fakes for integration tests: a synthetic host proxy, a
//! recording shutdown hook and a recording notice sink.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use auto_proxy_shutdown::coordinator::{Notice, NoticeKind, NoticeSink};
use auto_proxy_shutdown::host::{
    ConnectionEvents, ConnectionListener, HookError, PlayerCount, PlayerId, ServerId, ShutdownHook,
};
use auto_proxy_shutdown::HostPorts;
use uuid::Uuid;

/// Deterministic player id.
pub fn player(n: u128) -> PlayerId {
    PlayerId(Uuid::from_u128(n))
}

pub fn server(name: &str) -> ServerId {
    ServerId::from(name)
}

/// In-memory stand-in for the proxy's event bus.
#[derive(Default)]
pub struct SyntheticHost {
    online_at_start: usize,
    listeners: Mutex<Vec<Arc<dyn ConnectionListener>>>,
}

impl SyntheticHost {
    pub fn new(online_at_start: usize) -> Arc<Self> {
        Arc::new(Self {
            online_at_start,
            listeners: Mutex::new(Vec::new()),
        })
    }

    pub fn connect(&self, server: &ServerId, player: PlayerId) {
        for listener in self.listeners.lock().unwrap().iter() {
            listener.player_connected(server, player);
        }
    }

    pub fn disconnect(&self, server: &ServerId, player: PlayerId) {
        for listener in self.listeners.lock().unwrap().iter() {
            listener.player_disconnected(server, player);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().unwrap().len()
    }
}

impl ConnectionEvents for SyntheticHost {
    fn register(&self, listener: Arc<dyn ConnectionListener>) {
        self.listeners.lock().unwrap().push(listener);
    }
}

impl PlayerCount for SyntheticHost {
    fn online_players(&self) -> usize {
        self.online_at_start
    }
}

/// Hook that counts calls and replays scripted outcomes (success once the
/// script runs out).
#[derive(Default)]
pub struct RecordingHook {
    calls: AtomicUsize,
    script: Mutex<VecDeque<bool>>,
}

impl RecordingHook {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// `outcomes[i]` is whether call `i` succeeds.
    pub fn scripted(outcomes: &[bool]) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            script: Mutex::new(outcomes.iter().copied().collect()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ShutdownHook for RecordingHook {
    async fn request_proxy_shutdown(&self) -> Result<(), HookError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.script.lock().unwrap().pop_front() {
            Some(false) => Err(HookError::Rejected("scripted failure".into())),
            _ => Ok(()),
        }
    }
}

/// Sink that keeps every notice.
#[derive(Default)]
pub struct RecordingSink {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }

    pub fn kinds(&self) -> Vec<NoticeKind> {
        self.notices().into_iter().map(|n| n.kind).collect()
    }
}

impl NoticeSink for RecordingSink {
    fn publish(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}

pub fn ports(
    host: &Arc<SyntheticHost>,
    hook: &Arc<RecordingHook>,
    sink: &Arc<RecordingSink>,
) -> HostPorts {
    HostPorts {
        events: host.clone(),
        players: host.clone(),
        hook: hook.clone(),
        notices: sink.clone(),
    }
}
