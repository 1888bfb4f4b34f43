// ── Engine actor ──
//
// A single task owns all mutable sync state and processes intents, timer
// ticks and the completions of spawned network work one at a time. Network
// calls never run on this task, so intents are handled while a cycle is in
// flight.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::cycle::{CycleTag, Epoch, fetch_cycle};
use super::{Notification, NotificationLevel, RefreshOutcome};
use crate::api::MonitorApi;
use crate::config::SyncOptions;
use crate::error::CoreError;
use crate::model::Device;
use crate::store::{CycleSnapshot, ViewStore};

pub(crate) type Reply<T> = oneshot::Sender<Result<T, CoreError>>;

/// Requests from the `SyncEngine` handle.
pub(crate) enum Intent {
    SelectDevice {
        device_id: String,
        reply: Reply<RefreshOutcome>,
    },
    Refresh {
        reply: Reply<RefreshOutcome>,
    },
    PollNow {
        reply: Reply<RefreshOutcome>,
    },
    ReloadDevices {
        reply: Reply<usize>,
    },
    AcknowledgeAlert {
        alert_id: String,
        reply: Reply<RefreshOutcome>,
    },
}

/// Results reported back by tasks the actor spawned.
enum Completion {
    Devices {
        result: Result<Vec<Device>, CoreError>,
        reply: Option<Reply<usize>>,
    },
    Cycle {
        tag: CycleTag,
        result: Result<CycleSnapshot, CoreError>,
    },
    PollTriggered {
        result: Result<Option<String>, CoreError>,
        reply: Reply<RefreshOutcome>,
    },
    Acknowledged {
        alert_id: String,
        result: Result<(), CoreError>,
        reply: Reply<RefreshOutcome>,
    },
}

/// The one cycle allowed in flight, plus everyone waiting on it.
struct InFlight {
    tag: CycleTag,
    waiters: Vec<Reply<RefreshOutcome>>,
}

pub(crate) struct EngineActor<A> {
    api: Arc<A>,
    options: SyncOptions,
    store: Arc<ViewStore>,
    notifications: broadcast::Sender<Notification>,
    intents: mpsc::Receiver<Intent>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
    cancel: CancellationToken,

    devices: Arc<Vec<Device>>,
    /// `None` while Idle.
    epoch: Option<Epoch>,
    next_seq: u64,
    next_cycle: u64,
    in_flight: Option<InFlight>,
    /// Only ever one interval; replaced on every selection.
    timer: Option<Interval>,
    pending_polls: usize,
}

impl<A: MonitorApi> EngineActor<A> {
    pub(crate) fn new(
        api: Arc<A>,
        options: SyncOptions,
        store: Arc<ViewStore>,
        notifications: broadcast::Sender<Notification>,
        intents: mpsc::Receiver<Intent>,
        cancel: CancellationToken,
    ) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            api,
            options,
            store,
            notifications,
            intents,
            completions_tx,
            completions_rx,
            cancel,
            devices: Arc::new(Vec::new()),
            epoch: None,
            next_seq: 0,
            next_cycle: 0,
            in_flight: None,
            timer: None,
            pending_polls: 0,
        }
    }

    pub(crate) async fn run(mut self) {
        info!(
            interval_secs = self.options.refresh_interval.as_secs(),
            window_minutes = self.options.metric_window_minutes,
            "sync engine started"
        );
        self.spawn_device_load(None);

        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => break,
                Some(done) = self.completions_rx.recv() => self.on_completion(done),
                intent = self.intents.recv() => match intent {
                    Some(intent) => self.on_intent(intent),
                    None => break,
                },
                _ = next_tick(self.timer.as_mut()) => {
                    debug!("refresh timer fired");
                    self.request_refresh(None);
                }
            }
        }

        // Pending replies are dropped here; their callers see `EngineStopped`.
        self.timer = None;
        info!("sync engine stopped");
    }

    // ── Intents ──────────────────────────────────────────────────────

    fn on_intent(&mut self, intent: Intent) {
        match intent {
            Intent::SelectDevice { device_id, reply } => {
                if self.devices.iter().any(|d| d.id == device_id) {
                    self.select(device_id, Some(reply));
                } else {
                    debug!(device = %device_id, "rejecting selection of unknown device");
                    let _ = reply.send(Err(CoreError::NotFound {
                        identifier: device_id,
                    }));
                }
            }
            Intent::Refresh { reply } => self.request_refresh(Some(reply)),
            Intent::PollNow { reply } => self.poll_now(reply),
            Intent::ReloadDevices { reply } => self.spawn_device_load(Some(reply)),
            Intent::AcknowledgeAlert { alert_id, reply } => self.acknowledge(alert_id, reply),
        }
    }

    /// Start a new epoch for `device_id`: supersede whatever is in flight,
    /// re-arm the timer, and fetch immediately.
    fn select(&mut self, device_id: String, reply: Option<Reply<RefreshOutcome>>) {
        self.next_seq += 1;
        let epoch = Epoch {
            device_id,
            seq: self.next_seq,
        };
        info!(device = %epoch.device_id, seq = epoch.seq, "device selected");

        if let Some(stale) = self.in_flight.take() {
            debug!(
                device = %stale.tag.epoch.device_id,
                cycle = stale.tag.cycle,
                "in-flight cycle superseded"
            );
            for waiter in stale.waiters {
                let _ = waiter.send(Ok(RefreshOutcome::Superseded));
            }
        }

        self.store.select(&epoch.device_id);
        self.epoch = Some(epoch.clone());
        self.arm_timer();
        self.start_cycle(epoch, reply);
    }

    /// Single-flight: join the in-flight cycle if there is one.
    fn request_refresh(&mut self, reply: Option<Reply<RefreshOutcome>>) {
        let Some(epoch) = self.epoch.clone() else {
            if let Some(reply) = reply {
                let _ = reply.send(Err(CoreError::NoDeviceSelected));
            }
            return;
        };

        if let Some(flight) = self.in_flight.as_mut() {
            debug!(cycle = flight.tag.cycle, "refresh coalesced into in-flight cycle");
            flight.waiters.extend(reply);
            return;
        }

        self.start_cycle(epoch, reply);
    }

    fn poll_now(&mut self, reply: Reply<RefreshOutcome>) {
        if self.epoch.is_none() {
            let _ = reply.send(Err(CoreError::NoDeviceSelected));
            return;
        }

        self.pending_polls += 1;
        self.store.set_poll_pending(true);

        let api = Arc::clone(&self.api);
        let tx = self.completions_tx.clone();
        tokio::spawn(async move {
            let result = api.trigger_poll().await;
            let _ = tx.send(Completion::PollTriggered { result, reply });
        });
    }

    fn acknowledge(&mut self, alert_id: String, reply: Reply<RefreshOutcome>) {
        let api = Arc::clone(&self.api);
        let tx = self.completions_tx.clone();
        tokio::spawn(async move {
            let result = api.acknowledge_alert(&alert_id).await;
            let _ = tx.send(Completion::Acknowledged {
                alert_id,
                result,
                reply,
            });
        });
    }

    fn spawn_device_load(&mut self, reply: Option<Reply<usize>>) {
        let api = Arc::clone(&self.api);
        let tx = self.completions_tx.clone();
        tokio::spawn(async move {
            let result = api.list_devices().await;
            let _ = tx.send(Completion::Devices { result, reply });
        });
    }

    // ── Cycles ───────────────────────────────────────────────────────

    fn start_cycle(&mut self, epoch: Epoch, reply: Option<Reply<RefreshOutcome>>) {
        self.next_cycle += 1;
        let tag = CycleTag {
            epoch,
            cycle: self.next_cycle,
        };
        debug!(
            device = %tag.epoch.device_id,
            seq = tag.epoch.seq,
            cycle = tag.cycle,
            "refresh cycle started"
        );

        self.in_flight = Some(InFlight {
            tag: tag.clone(),
            waiters: reply.into_iter().collect(),
        });
        self.store.cycle_started();

        let api = Arc::clone(&self.api);
        let tx = self.completions_tx.clone();
        let SyncOptions {
            metric_window_minutes,
            alert_limit,
            ..
        } = self.options;
        tokio::spawn(async move {
            let result = fetch_cycle(
                api.as_ref(),
                &tag.epoch.device_id,
                metric_window_minutes,
                alert_limit,
            )
            .await;
            let _ = tx.send(Completion::Cycle { tag, result });
        });
    }

    fn arm_timer(&mut self) {
        let period = self.options.refresh_interval;
        if period.is_zero() {
            self.timer = None;
            return;
        }
        let mut timer = tokio::time::interval_at(Instant::now() + period, period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        self.timer = Some(timer);
    }

    // ── Completions ──────────────────────────────────────────────────

    fn on_completion(&mut self, done: Completion) {
        match done {
            Completion::Devices { result, reply } => self.on_devices(result, reply),
            Completion::Cycle { tag, result } => self.on_cycle(&tag, result),
            Completion::PollTriggered { result, reply } => self.on_poll_triggered(result, reply),
            Completion::Acknowledged {
                alert_id,
                result,
                reply,
            } => match result {
                Ok(()) => {
                    info!(alert = %alert_id, "alert acknowledged");
                    self.request_refresh(Some(reply));
                }
                Err(e) => {
                    warn!(alert = %alert_id, error = %e, "acknowledge failed");
                    self.notify(NotificationLevel::Error, format!("Acknowledge failed: {e}"));
                    let _ = reply.send(Err(e));
                }
            },
        }
    }

    fn on_devices(&mut self, result: Result<Vec<Device>, CoreError>, reply: Option<Reply<usize>>) {
        match result {
            Ok(devices) => {
                let count = devices.len();
                info!(count, "device list loaded");
                let first = devices.first().map(|d| d.id.clone());
                self.devices = Arc::new(devices);
                self.store.set_devices(Arc::clone(&self.devices));
                if let Some(reply) = reply {
                    let _ = reply.send(Ok(count));
                }

                if self.epoch.is_none() {
                    match first {
                        Some(id) => self.select(id, None),
                        None => self.notify(NotificationLevel::Warning, "No devices configured".into()),
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "device listing failed");
                self.store.set_error(format!("Device list unavailable: {e}"));
                self.notify(
                    NotificationLevel::Error,
                    format!("Could not load devices: {e}"),
                );
                if let Some(reply) = reply {
                    let _ = reply.send(Err(e));
                }
            }
        }
    }

    /// Apply a cycle result if it is still the in-flight cycle. A selection
    /// change clears `in_flight`, so a matching tag also means the epoch is
    /// current.
    fn on_cycle(&mut self, tag: &CycleTag, result: Result<CycleSnapshot, CoreError>) {
        let flight = match self.in_flight.take() {
            Some(flight) if flight.tag == *tag => flight,
            other => {
                self.in_flight = other;
                debug!(
                    device = %tag.epoch.device_id,
                    seq = tag.epoch.seq,
                    cycle = tag.cycle,
                    "discarding stale cycle result"
                );
                return;
            }
        };

        match result {
            Ok(snap) => {
                debug!(
                    device = %tag.epoch.device_id,
                    cycle = tag.cycle,
                    alerts = snap.alerts.len(),
                    "cycle applied"
                );
                self.store
                    .apply_cycle(&tag.epoch.device_id, snap, Utc::now());
                for waiter in flight.waiters {
                    let _ = waiter.send(Ok(RefreshOutcome::Applied));
                }
            }
            Err(e) => {
                warn!(device = %tag.epoch.device_id, error = %e, "refresh cycle failed");
                self.store.cycle_failed(e.to_string());
                self.notify(NotificationLevel::Error, format!("Refresh failed: {e}"));
                for waiter in flight.waiters {
                    let _ = waiter.send(Err(e.clone()));
                }
            }
        }
    }

    /// The trigger has finished, so the follow-up refresh sees the new
    /// measurement.
    fn on_poll_triggered(
        &mut self,
        result: Result<Option<String>, CoreError>,
        reply: Reply<RefreshOutcome>,
    ) {
        self.pending_polls = self.pending_polls.saturating_sub(1);
        if self.pending_polls == 0 {
            self.store.set_poll_pending(false);
        }

        match result {
            Ok(polled_at) => {
                debug!(?polled_at, "poll accepted, requesting refresh");
                if let Some(at) = polled_at {
                    self.store.set_last_poll(at);
                }
                self.request_refresh(Some(reply));
            }
            Err(e) => {
                warn!(error = %e, "poll trigger failed");
                self.notify(NotificationLevel::Error, format!("Poll failed: {e}"));
                let _ = reply.send(Err(e));
            }
        }
    }

    fn notify(&self, level: NotificationLevel, message: String) {
        // No subscribers is fine.
        let _ = self.notifications.send(Notification { level, message });
    }
}

async fn next_tick(timer: Option<&mut Interval>) -> Instant {
    match timer {
        Some(timer) => timer.tick().await,
        None => std::future::pending().await,
    }
}
