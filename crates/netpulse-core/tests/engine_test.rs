#![allow(clippy::unwrap_used)]
// Engine behaviour against a scripted in-memory backend.
//
// All tests run on paused tokio time: per-device latencies are `sleep`s, so
// the order in which responses land is fully deterministic.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use pretty_assertions::assert_eq;
use tokio::time::Instant;

use netpulse_core::{
    Alert, CoreError, Device, MetricKind, MetricPoint, MonitorApi, NotificationLevel,
    RefreshOutcome, Severity, SyncEngine, SyncOptions, SyncPhase, ViewState, ViewStateStream,
};

// ── Scripted backend ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Devices,
    Metric(String, MetricKind),
    Alerts,
    Poll,
    Ack(String),
}

#[derive(Default)]
struct Script {
    devices: Vec<Device>,
    devices_error: Option<CoreError>,
    delays: HashMap<String, Duration>,
    values: HashMap<(String, MetricKind), f64>,
    alerts: Vec<Alert>,
    fail_metric: Option<MetricKind>,
    fail_poll: bool,
    calls: Vec<Call>,
}

#[derive(Clone, Default)]
struct FakeApi {
    script: Arc<Mutex<Script>>,
}

impl FakeApi {
    fn with_devices(ids: &[&str]) -> Self {
        let api = Self::default();
        api.script().devices = ids.iter().map(|id| Device::new(*id)).collect();
        api
    }

    fn script(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap()
    }

    fn delay(&self, device_id: &str, delay: Duration) -> &Self {
        self.script().delays.insert(device_id.into(), delay);
        self
    }

    fn value(&self, device_id: &str, kind: MetricKind, value: f64) -> &Self {
        self.script().values.insert((device_id.into(), kind), value);
        self
    }

    fn calls(&self) -> Vec<Call> {
        self.script().calls.clone()
    }

    fn metric_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Metric(..)))
            .count()
    }

    fn record(&self, call: Call) {
        self.script().calls.push(call);
    }
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 10, 30, 0).unwrap()
}

impl MonitorApi for FakeApi {
    async fn list_devices(&self) -> Result<Vec<Device>, CoreError> {
        self.record(Call::Devices);
        let script = self.script();
        match &script.devices_error {
            Some(err) => Err(err.clone()),
            None => Ok(script.devices.clone()),
        }
    }

    async fn metric_series(
        &self,
        device_id: &str,
        kind: MetricKind,
        _minutes: u32,
    ) -> Result<Vec<MetricPoint>, CoreError> {
        self.record(Call::Metric(device_id.into(), kind));
        let (delay, fail, value) = {
            let script = self.script();
            (
                script.delays.get(device_id).copied().unwrap_or_default(),
                script.fail_metric == Some(kind),
                script
                    .values
                    .get(&(device_id.to_owned(), kind))
                    .copied()
                    .unwrap_or_default(),
            )
        };
        tokio::time::sleep(delay).await;
        if fail {
            return Err(CoreError::Network {
                message: "connection reset".into(),
            });
        }
        Ok(vec![MetricPoint {
            timestamp: t0(),
            value,
        }])
    }

    async fn list_alerts(&self, limit: u32) -> Result<Vec<Alert>, CoreError> {
        self.record(Call::Alerts);
        let mut alerts = self.script().alerts.clone();
        alerts.truncate(limit as usize);
        Ok(alerts)
    }

    async fn trigger_poll(&self) -> Result<Option<String>, CoreError> {
        self.record(Call::Poll);
        let fail = self.script().fail_poll;
        tokio::time::sleep(Duration::from_millis(200)).await;
        if fail {
            Err(CoreError::Network {
                message: "HTTP 500: collector crashed".into(),
            })
        } else {
            Ok(Some("2024-05-01T12:00:30".into()))
        }
    }

    async fn acknowledge_alert(&self, alert_id: &str) -> Result<(), CoreError> {
        self.record(Call::Ack(alert_id.into()));
        Ok(())
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

/// Options with a timer far enough out that it never fires by accident.
fn quiet() -> SyncOptions {
    SyncOptions {
        refresh_interval: Duration::from_secs(3600),
        ..SyncOptions::default()
    }
}

async fn wait_for(
    views: &mut ViewStateStream,
    what: &str,
    pred: impl Fn(&ViewState) -> bool,
) -> Arc<ViewState> {
    let latest = views.latest();
    if pred(&latest) {
        return latest;
    }
    tokio::time::timeout(Duration::from_secs(600), async {
        loop {
            let view = views.changed().await.expect("engine dropped");
            if pred(&view) {
                return view;
            }
        }
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for {what}"))
}

async fn wait_ready(engine: &SyncEngine) -> Arc<ViewState> {
    let mut views = engine.subscribe();
    wait_for(&mut views, "first applied cycle", |v| {
        v.phase == SyncPhase::Ready && !v.refreshing
    })
    .await
}

fn cpu(view: &ViewState) -> f64 {
    view.series.cpu[0].value
}

// ── Startup ─────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn auto_selects_first_device_and_applies_cycle() {
    let api = FakeApi::with_devices(&["r1", "r2"]);
    api.value("r1", MetricKind::Cpu, 12.5)
        .value("r1", MetricKind::Memory, 40.0)
        .value("r1", MetricKind::PacketLoss, 0.0);

    let engine = SyncEngine::start(api.clone(), quiet());
    let view = wait_ready(&engine).await;

    assert_eq!(view.devices.len(), 2);
    assert_eq!(view.selected_device_id.as_deref(), Some("r1"));
    assert_eq!(view.series_device_id.as_deref(), Some("r1"));
    assert_eq!(
        view.series.cpu,
        vec![MetricPoint {
            timestamp: t0(),
            value: 12.5
        }]
    );
    assert_eq!(
        view.series.memory,
        vec![MetricPoint {
            timestamp: t0(),
            value: 40.0
        }]
    );
    assert_eq!(
        view.series.packet_loss,
        vec![MetricPoint {
            timestamp: t0(),
            value: 0.0
        }]
    );
    assert!(view.alerts.is_empty());
    assert!(view.last_update.is_some());
    assert!(view.last_error.is_none());

    assert_eq!(api.calls()[0], Call::Devices);
    assert_eq!(api.metric_calls(), 3);

    engine.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn empty_device_list_stays_idle() {
    let api = FakeApi::with_devices(&[]);
    let engine = SyncEngine::start(api.clone(), quiet());
    let mut notes = engine.notifications();

    let note = notes.recv().await.unwrap();
    assert_eq!(note.level, NotificationLevel::Warning);

    let view = engine.snapshot();
    assert_eq!(view.phase, SyncPhase::Idle);
    assert!(view.selected_device_id.is_none());
    assert_eq!(engine.refresh_now().await, Err(CoreError::NoDeviceSelected));
    assert_eq!(engine.poll_now().await, Err(CoreError::NoDeviceSelected));
    assert_eq!(api.calls(), vec![Call::Devices]);
}

#[tokio::test(start_paused = true)]
async fn failed_device_listing_recovers_on_reload() {
    let api = FakeApi::with_devices(&["r1", "r2"]);
    api.script().devices_error = Some(CoreError::Auth {
        message: "Unauthorized".into(),
    });

    let engine = SyncEngine::start(api.clone(), quiet());
    let mut notes = engine.notifications();
    let note = notes.recv().await.unwrap();
    assert_eq!(note.level, NotificationLevel::Error);
    assert!(note.message.contains("Unauthorized"), "{}", note.message);
    assert_eq!(engine.snapshot().phase, SyncPhase::Idle);

    api.script().devices_error = None;
    assert_eq!(engine.reload_devices().await, Ok(2));

    let view = wait_ready(&engine).await;
    assert_eq!(view.selected_device_id.as_deref(), Some("r1"));
    assert!(view.last_error.is_none());
}

// ── Selection ───────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn late_response_for_previous_selection_is_discarded() {
    let api = FakeApi::with_devices(&["r1", "r2"]);
    api.delay("r1", Duration::from_secs(5))
        .delay("r2", Duration::from_secs(1))
        .value("r1", MetricKind::Cpu, 12.5)
        .value("r2", MetricKind::Cpu, 77.0);

    let engine = SyncEngine::start(api.clone(), quiet());
    let mut views = engine.subscribe();
    wait_for(&mut views, "r1 cycle in flight", |v| {
        v.selected_device_id.as_deref() == Some("r1") && v.refreshing
    })
    .await;

    assert_eq!(engine.select_device("r2").await, Ok(RefreshOutcome::Applied));
    assert_eq!(cpu(&engine.snapshot()), 77.0);

    // Let the r1 responses arrive.
    tokio::time::sleep(Duration::from_secs(10)).await;

    let view = engine.snapshot();
    assert_eq!(view.selected_device_id.as_deref(), Some("r2"));
    assert_eq!(view.series_device_id.as_deref(), Some("r2"));
    assert_eq!(cpu(&view), 77.0);
    assert!(!view.refreshing);
    assert!(
        api.calls()
            .contains(&Call::Metric("r1".into(), MetricKind::Cpu))
    );
}

#[tokio::test(start_paused = true)]
async fn rapid_selection_ends_on_last_device() {
    // Slowest response belongs to the last selection, and the reverse.
    for delays in [[1, 2, 3], [3, 2, 1]] {
        let api = FakeApi::with_devices(&["r1", "r2", "r3"]);
        for (id, secs) in ["r1", "r2", "r3"].iter().zip(delays) {
            api.delay(id, Duration::from_secs(secs));
        }
        api.value("r1", MetricKind::Cpu, 1.0)
            .value("r2", MetricKind::Cpu, 2.0)
            .value("r3", MetricKind::Cpu, 3.0);

        let engine = SyncEngine::start(api.clone(), quiet());
        let mut views = engine.subscribe();
        wait_for(&mut views, "devices", |v| v.selected_device_id.is_some()).await;

        let (a, b, c) = tokio::join!(
            engine.select_device("r1"),
            engine.select_device("r2"),
            engine.select_device("r3"),
        );
        assert_eq!(a, Ok(RefreshOutcome::Superseded));
        assert_eq!(b, Ok(RefreshOutcome::Superseded));
        assert_eq!(c, Ok(RefreshOutcome::Applied));

        tokio::time::sleep(Duration::from_secs(10)).await;
        let view = engine.snapshot();
        assert_eq!(view.series_device_id.as_deref(), Some("r3"));
        assert_eq!(cpu(&view), 3.0);

        engine.shutdown().await;
    }
}

#[tokio::test(start_paused = true)]
async fn selecting_unknown_device_is_rejected() {
    let api = FakeApi::with_devices(&["r1"]);
    let engine = SyncEngine::start(api.clone(), quiet());
    wait_ready(&engine).await;
    let before = api.calls().len();

    let result = engine.select_device("ghost").await;

    assert_eq!(
        result,
        Err(CoreError::NotFound {
            identifier: "ghost".into()
        })
    );
    assert_eq!(engine.snapshot().selected_device_id.as_deref(), Some("r1"));
    assert_eq!(api.calls().len(), before);
}

#[tokio::test(start_paused = true)]
async fn previous_series_stay_visible_while_new_selection_loads() {
    let api = FakeApi::with_devices(&["r1", "r2"]);
    api.delay("r2", Duration::from_secs(5))
        .value("r1", MetricKind::Cpu, 12.5);

    let engine = SyncEngine::start(api.clone(), quiet());
    wait_ready(&engine).await;

    let select = tokio::spawn({
        let engine = engine.clone();
        async move { engine.select_device("r2").await }
    });
    let mut views = engine.subscribe();
    let loading = wait_for(&mut views, "r2 loading", |v| {
        v.selected_device_id.as_deref() == Some("r2")
    })
    .await;

    assert_eq!(loading.phase, SyncPhase::Loading);
    assert!(loading.series_are_stale());
    assert_eq!(cpu(&loading), 12.5);

    assert_eq!(select.await.unwrap(), Ok(RefreshOutcome::Applied));
    assert_eq!(engine.snapshot().series_device_id.as_deref(), Some("r2"));
}

// ── Failures ────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn failed_cycle_leaves_snapshot_untouched() {
    let api = FakeApi::with_devices(&["r1"]);
    api.value("r1", MetricKind::Cpu, 12.5);
    api.script().alerts = vec![Alert {
        id: "7".into(),
        device_id: "r1".into(),
        metric_type: "cpu".into(),
        value: Some(91.0),
        severity: Severity::High,
        message: None,
        timestamp: t0(),
        acknowledged: false,
    }];

    let engine = SyncEngine::start(api.clone(), quiet());
    let before = wait_ready(&engine).await;
    let mut notes = engine.notifications();

    api.script().fail_metric = Some(MetricKind::Memory);
    let result = engine.refresh_now().await;

    assert!(matches!(result, Err(CoreError::Network { .. })));
    let after = engine.snapshot();
    assert_eq!(after.series, before.series);
    assert_eq!(after.alerts, before.alerts);
    assert_eq!(after.last_update, before.last_update);
    assert_eq!(after.phase, SyncPhase::Ready);
    assert!(!after.refreshing);
    assert!(after.last_error.as_deref().unwrap().contains("connection reset"));
    assert_eq!(notes.recv().await.unwrap().level, NotificationLevel::Error);

    // Next good cycle clears the error.
    api.script().fail_metric = None;
    assert_eq!(engine.refresh_now().await, Ok(RefreshOutcome::Applied));
    assert!(engine.snapshot().last_error.is_none());
}

// ── Manual poll ─────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn poll_triggers_before_refresh_fetches() {
    let api = FakeApi::with_devices(&["r1"]);
    let engine = SyncEngine::start(api.clone(), quiet());
    wait_ready(&engine).await;
    let baseline = api.calls().len();

    let mut views = engine.subscribe();
    let poll = tokio::spawn({
        let engine = engine.clone();
        async move { engine.poll_now().await }
    });
    wait_for(&mut views, "poll pending", |v| v.poll_pending).await;

    assert_eq!(poll.await.unwrap(), Ok(RefreshOutcome::Applied));
    let after = engine.snapshot();
    assert!(!after.poll_pending);
    assert_eq!(after.last_poll_at.as_deref(), Some("2024-05-01T12:00:30"));

    let calls = api.calls()[baseline..].to_vec();
    assert_eq!(calls.len(), 5);
    assert_eq!(calls[0], Call::Poll);
    assert_eq!(
        calls[1..]
            .iter()
            .filter(|c| matches!(c, Call::Metric(..)))
            .count(),
        3
    );
    assert!(calls[1..].contains(&Call::Alerts));
}

#[tokio::test(start_paused = true)]
async fn failed_poll_issues_no_refresh() {
    let api = FakeApi::with_devices(&["r1"]);
    let engine = SyncEngine::start(api.clone(), quiet());
    let before = wait_ready(&engine).await;
    let mut notes = engine.notifications();
    let baseline = api.calls().len();

    api.script().fail_poll = true;
    let result = engine.poll_now().await;

    assert!(matches!(result, Err(CoreError::Network { .. })));
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(api.calls()[baseline..].to_vec(), vec![Call::Poll]);

    let note = notes.recv().await.unwrap();
    assert_eq!(note.level, NotificationLevel::Error);
    assert!(note.message.contains("collector crashed"), "{}", note.message);

    let after = engine.snapshot();
    assert!(!after.poll_pending);
    assert_eq!(after.last_poll_at, None);
    assert_eq!(after.last_update, before.last_update);
}

// ── Single-flight / timer ───────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn concurrent_refresh_requests_share_one_cycle() {
    let api = FakeApi::with_devices(&["r1"]);
    api.delay("r1", Duration::from_secs(2));
    let engine = SyncEngine::start(api.clone(), quiet());
    wait_ready(&engine).await;
    let baseline = api.metric_calls();

    let (refresh, poll) = tokio::join!(engine.refresh_now(), engine.poll_now());

    assert_eq!(refresh, Ok(RefreshOutcome::Applied));
    assert_eq!(poll, Ok(RefreshOutcome::Applied));
    assert_eq!(api.metric_calls() - baseline, 3);
}

#[tokio::test(start_paused = true)]
async fn timer_refreshes_on_interval() {
    let api = FakeApi::with_devices(&["r1"]);
    let options = SyncOptions {
        refresh_interval: Duration::from_secs(10),
        ..SyncOptions::default()
    };
    let engine = SyncEngine::start(api.clone(), options);
    wait_ready(&engine).await;
    assert_eq!(api.metric_calls(), 3);

    tokio::time::sleep(Duration::from_secs(25)).await;

    assert_eq!(api.metric_calls(), 9);
    assert_eq!(engine.snapshot().phase, SyncPhase::Ready);
}

#[tokio::test(start_paused = true)]
async fn timer_tick_and_poll_at_same_instant_issue_one_cycle() {
    let start = Instant::now();
    let api = FakeApi::with_devices(&["r1"]);
    api.delay("r1", Duration::from_secs(3));
    let options = SyncOptions {
        refresh_interval: Duration::from_secs(10),
        ..SyncOptions::default()
    };
    let engine = SyncEngine::start(api.clone(), options);
    wait_ready(&engine).await;
    assert_eq!(api.metric_calls(), 3);

    tokio::time::sleep_until(start + Duration::from_secs(10)).await;
    assert_eq!(engine.poll_now().await, Ok(RefreshOutcome::Applied));

    assert_eq!(api.metric_calls(), 6);
    let polls = api.calls().iter().filter(|c| **c == Call::Poll).count();
    assert_eq!(polls, 1);
}

#[tokio::test(start_paused = true)]
async fn reselect_rearms_timer() {
    let start = Instant::now();
    let api = FakeApi::with_devices(&["r1", "r2"]);
    let options = SyncOptions {
        refresh_interval: Duration::from_secs(10),
        ..SyncOptions::default()
    };
    let engine = SyncEngine::start(api.clone(), options);
    wait_ready(&engine).await;

    tokio::time::sleep_until(start + Duration::from_secs(8)).await;
    engine.select_device("r2").await.unwrap();
    assert_eq!(api.metric_calls(), 6);

    // The r1 timer would have fired at t=10; the re-armed one fires at t=18.
    tokio::time::sleep_until(start + Duration::from_secs(15)).await;
    assert_eq!(api.metric_calls(), 6);

    tokio::time::sleep_until(start + Duration::from_secs(19)).await;
    assert_eq!(api.metric_calls(), 9);
    // Devices, then three cycles of four calls each.
    let tick_cycle = api.calls()[9..].to_vec();
    assert_eq!(tick_cycle.len(), 4);
    assert!(
        tick_cycle
            .iter()
            .all(|c| !matches!(c, Call::Metric(id, _) if id == "r1"))
    );
}

// ── Alerts / lifecycle ──────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn acknowledge_then_refresh() {
    let api = FakeApi::with_devices(&["r1"]);
    let engine = SyncEngine::start(api.clone(), quiet());
    wait_ready(&engine).await;
    let baseline = api.calls().len();

    assert_eq!(
        engine.acknowledge_alert("42").await,
        Ok(RefreshOutcome::Applied)
    );

    let calls = api.calls()[baseline..].to_vec();
    assert_eq!(calls[0], Call::Ack("42".into()));
    assert_eq!(calls.len(), 5);
}

#[tokio::test(start_paused = true)]
async fn intents_fail_after_shutdown() {
    let api = FakeApi::with_devices(&["r1"]);
    let engine = SyncEngine::start(api, quiet());
    wait_ready(&engine).await;

    engine.shutdown().await;

    assert!(!engine.is_running());
    assert_eq!(engine.refresh_now().await, Err(CoreError::EngineStopped));
    assert_eq!(
        engine.select_device("r1").await,
        Err(CoreError::EngineStopped)
    );
}
