//! End-to-end idle scenarios driven by a manual scheduler and a paused clock.

use std::sync::Arc;
use std::time::Duration;

use auto_proxy_shutdown::coordinator::{Notice, NoticeKind};
use auto_proxy_shutdown::timer::ManualScheduler;
use auto_proxy_shutdown::{AutoShutdown, Phase, ShutdownConfig};

mod common;

use common::{player, ports, server, RecordingHook, RecordingSink, SyntheticHost};

struct Harness {
    host: Arc<SyntheticHost>,
    hook: Arc<RecordingHook>,
    sink: Arc<RecordingSink>,
    scheduler: ManualScheduler,
    service: AutoShutdown,
}

impl Harness {
    fn start(config: ShutdownConfig, hook: Arc<RecordingHook>) -> Self {
        let host = SyntheticHost::new(0);
        let sink = RecordingSink::new();
        let scheduler = ManualScheduler::new();
        let service = AutoShutdown::start(Arc::new(config), ports(&host, &hook, &sink), &scheduler);
        Self { host, hook, sink, scheduler, service }
    }

    /// Advance the clock by `secs` and fire one tick.
    async fn tick_after(&self, secs: u64) -> Phase {
        tokio::time::advance(Duration::from_secs(secs)).await;
        self.scheduler.fire().await;
        self.service.state().phase
    }
}

#[tokio::test(start_paused = true)]
async fn shutdown_fires_once_at_timeout() {
    let h = Harness::start(ShutdownConfig::with_timings(120, 30, 0), RecordingHook::new());
    assert_eq!(h.host.listener_count(), 1);

    // One player comes and goes; the count drops to zero at t=0.
    h.host.connect(&server("lobby"), player(1));
    h.host.disconnect(&server("lobby"), player(1));

    assert_eq!(h.tick_after(30).await, Phase::IdlePending);
    assert_eq!(h.tick_after(30).await, Phase::IdlePending);
    assert_eq!(h.tick_after(30).await, Phase::IdlePending);
    assert_eq!(h.hook.calls(), 0);

    assert_eq!(h.tick_after(30).await, Phase::ShuttingDown);
    assert_eq!(h.hook.calls(), 1);
    assert_eq!(h.sink.kinds(), vec![NoticeKind::ShuttingDown]);

    // The timer cancelled itself.
    assert!(h.service.timer().is_stopped());
    assert_eq!(h.scheduler.fire().await, 0);
    assert_eq!(h.hook.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn reconnect_before_timeout_cancels() {
    let h = Harness::start(ShutdownConfig::with_timings(120, 30, 0), RecordingHook::new());

    assert_eq!(h.tick_after(30).await, Phase::IdlePending);
    assert_eq!(h.tick_after(30).await, Phase::IdlePending);
    assert_eq!(h.tick_after(30).await, Phase::IdlePending);

    tokio::time::advance(Duration::from_secs(10)).await;
    h.host.connect(&server("survival"), player(7));

    assert_eq!(h.tick_after(20).await, Phase::Active);
    for _ in 0..5 {
        assert_eq!(h.tick_after(30).await, Phase::Active);
    }

    assert_eq!(h.hook.calls(), 0);
    assert_eq!(h.sink.kinds(), vec![NoticeKind::IdleCancelled]);
}

#[tokio::test(start_paused = true)]
async fn blip_between_ticks_is_debounced() {
    let h = Harness::start(ShutdownConfig::with_timings(120, 30, 0), RecordingHook::new());
    h.host.connect(&server("lobby"), player(1));
    assert_eq!(h.tick_after(30).await, Phase::Active);

    // Player hops servers; the host reports the leave before the join.
    h.host.disconnect(&server("lobby"), player(1));
    h.host.connect(&server("minigames"), player(1));

    assert_eq!(h.tick_after(30).await, Phase::Active);
    assert!(h.sink.notices().is_empty());
}

#[tokio::test(start_paused = true)]
async fn warning_then_shutdown() {
    let h = Harness::start(ShutdownConfig::with_timings(60, 10, 10), RecordingHook::new());

    for _ in 0..4 {
        h.tick_after(10).await;
    }
    assert_eq!(h.service.state().phase, Phase::IdlePending);
    assert!(h.sink.notices().is_empty());

    assert_eq!(h.tick_after(10).await, Phase::Warned);
    assert_eq!(h.sink.notices(), vec![Notice::new(NoticeKind::Warning, 10)]);

    assert_eq!(h.tick_after(10).await, Phase::ShuttingDown);
    assert_eq!(h.hook.calls(), 1);
    assert_eq!(h.sink.kinds(), vec![NoticeKind::Warning, NoticeKind::ShuttingDown]);
}

#[tokio::test(start_paused = true)]
async fn reconnect_after_warning_sends_one_cancellation() {
    let h = Harness::start(ShutdownConfig::with_timings(60, 10, 20), RecordingHook::new());

    for _ in 0..4 {
        h.tick_after(10).await;
    }
    assert_eq!(h.service.state().phase, Phase::Warned);

    h.host.connect(&server("lobby"), player(3));
    assert_eq!(h.tick_after(10).await, Phase::Active);
    assert_eq!(h.tick_after(10).await, Phase::Active);

    assert_eq!(h.hook.calls(), 0);
    assert_eq!(h.sink.kinds(), vec![NoticeKind::Warning, NoticeKind::ShutdownCancelled]);
}

#[tokio::test(start_paused = true)]
async fn failed_hook_retries_only_in_a_new_episode() {
    let h = Harness::start(
        ShutdownConfig::with_timings(60, 30, 0),
        RecordingHook::scripted(&[false, true]),
    );

    assert_eq!(h.tick_after(30).await, Phase::IdlePending);
    assert_eq!(h.tick_after(30).await, Phase::IdlePending);
    assert_eq!(h.hook.calls(), 1);
    assert_eq!(h.sink.kinds(), vec![NoticeKind::HookFailed]);

    // Still idle: no tight retry loop against the host.
    for _ in 0..4 {
        assert_eq!(h.tick_after(30).await, Phase::IdlePending);
    }
    assert_eq!(h.hook.calls(), 1);

    // A player visits and leaves, starting a fresh episode.
    h.host.connect(&server("lobby"), player(9));
    assert_eq!(h.tick_after(30).await, Phase::Active);
    h.host.disconnect(&server("lobby"), player(9));

    assert_eq!(h.tick_after(30).await, Phase::IdlePending);
    assert_eq!(h.tick_after(30).await, Phase::ShuttingDown);
    assert_eq!(h.hook.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn visit_between_ticks_rearms_failed_hook() {
    let h = Harness::start(
        ShutdownConfig::with_timings(60, 30, 0),
        RecordingHook::scripted(&[false, true]),
    );

    assert_eq!(h.tick_after(30).await, Phase::IdlePending);
    assert_eq!(h.tick_after(30).await, Phase::IdlePending);
    assert_eq!(h.hook.calls(), 1);

    // A player drops in at t=65 and is gone before the next tick.
    tokio::time::advance(Duration::from_secs(5)).await;
    h.host.connect(&server("lobby"), player(4));
    h.host.disconnect(&server("lobby"), player(4));

    assert_eq!(h.tick_after(25).await, Phase::IdlePending);
    assert_eq!(h.sink.kinds(), vec![NoticeKind::HookFailed, NoticeKind::IdleCancelled]);
    assert_eq!(h.tick_after(30).await, Phase::IdlePending);
    assert_eq!(h.hook.calls(), 1);

    // Idle for 85s since the visit.
    assert_eq!(h.tick_after(30).await, Phase::ShuttingDown);
    assert_eq!(h.hook.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn visit_between_ticks_cancels_warning() {
    let h = Harness::start(ShutdownConfig::with_timings(60, 10, 10), RecordingHook::new());

    for _ in 0..4 {
        h.tick_after(10).await;
    }
    assert_eq!(h.tick_after(10).await, Phase::Warned);

    // Online from t=53 to t=56 only.
    tokio::time::advance(Duration::from_secs(3)).await;
    h.host.connect(&server("lobby"), player(5));
    tokio::time::advance(Duration::from_secs(3)).await;
    h.host.disconnect(&server("lobby"), player(5));

    assert_eq!(h.tick_after(4).await, Phase::IdlePending);
    assert_eq!(h.sink.kinds(), vec![NoticeKind::Warning, NoticeKind::ShutdownCancelled]);
    assert_eq!(h.hook.calls(), 0);

    // A fresh countdown from t=56: warning at 110, shutdown at 120.
    for _ in 0..4 {
        assert_eq!(h.tick_after(10).await, Phase::IdlePending);
    }
    assert_eq!(h.tick_after(10).await, Phase::Warned);
    assert_eq!(h.tick_after(10).await, Phase::ShuttingDown);
    assert_eq!(
        h.sink.notices(),
        vec![
            Notice::new(NoticeKind::Warning, 10),
            Notice::new(NoticeKind::ShutdownCancelled, 0),
            Notice::new(NoticeKind::Warning, 6),
            Notice::new(NoticeKind::ShuttingDown, 0),
        ]
    );
    assert_eq!(h.hook.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn event_storm_keeps_tracker_consistent() {
    let h = Harness::start(ShutdownConfig::with_timings(600, 30, 60), RecordingHook::new());
    let servers = [server("lobby"), server("survival"), server("creative")];

    // Small LCG so the sequence is reproducible.
    let mut seed: u64 = 0x2545_f491;
    let mut next = move || {
        seed = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
        seed >> 33
    };

    for _ in 0..2_000 {
        let server = &servers[(next() % 3) as usize];
        let player = player(u128::from(next() % 8));
        if next() % 2 == 0 {
            h.host.connect(server, player);
        } else {
            h.host.disconnect(server, player);
        }

        let snap = h.service.tracker().snapshot();
        assert_eq!(snap.zero_since.is_some(), snap.current_player_count == 0);
        assert_eq!(snap.current_player_count, h.service.adapter().tracked_sessions());
    }
}
