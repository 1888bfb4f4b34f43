// ── Sync engine ──
//
// Cheap-to-clone handle to the engine actor. Every intent is a message
// with a oneshot reply; snapshots go out through the view store's watch
// channel and notifications through a broadcast channel.

mod actor;
mod cycle;

use std::sync::Arc;

use strum::Display;
use tokio::sync::{Mutex, broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use self::actor::{EngineActor, Intent, Reply};
use crate::api::{self, MonitorApi};
use crate::config::{EngineConfig, SyncOptions};
use crate::error::CoreError;
use crate::store::{ViewState, ViewStore};
use crate::stream::ViewStateStream;

const INTENT_CHANNEL_SIZE: usize = 64;
const NOTIFICATION_CHANNEL_SIZE: usize = 64;

/// How an awaited refresh ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The cycle's data is in the current snapshot.
    Applied,
    /// A selection change overtook the cycle; its data was dropped.
    Superseded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

/// Transient message for the status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

/// Handle to a running sync engine.
#[derive(Clone)]
pub struct SyncEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    intents: mpsc::Sender<Intent>,
    store: Arc<ViewStore>,
    notifications: broadcast::Sender<Notification>,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl SyncEngine {
    /// Build the HTTP client from `config` and start syncing.
    pub fn connect(config: &EngineConfig) -> Result<Self, CoreError> {
        let client = api::connect(config)?;
        Ok(Self::start(client, config.sync_options()))
    }

    /// Spawn the actor on the current runtime. The device list is requested
    /// right away and the first device is selected when it arrives.
    pub fn start<A: MonitorApi>(api: A, options: SyncOptions) -> Self {
        let store = Arc::new(ViewStore::new());
        let (intent_tx, intent_rx) = mpsc::channel(INTENT_CHANNEL_SIZE);
        let (notify_tx, _) = broadcast::channel(NOTIFICATION_CHANNEL_SIZE);
        let cancel = CancellationToken::new();

        let actor = EngineActor::new(
            Arc::new(api),
            options,
            Arc::clone(&store),
            notify_tx.clone(),
            intent_rx,
            cancel.clone(),
        );
        let task = tokio::spawn(actor.run());

        Self {
            inner: Arc::new(EngineInner {
                intents: intent_tx,
                store,
                notifications: notify_tx,
                cancel,
                task: Mutex::new(Some(task)),
            }),
        }
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn subscribe(&self) -> ViewStateStream {
        self.inner.store.subscribe()
    }

    pub fn snapshot(&self) -> Arc<ViewState> {
        self.inner.store.snapshot()
    }

    pub fn notifications(&self) -> broadcast::Receiver<Notification> {
        self.inner.notifications.subscribe()
    }

    // ── Intents ──────────────────────────────────────────────────────

    /// Switch to `device_id` and fetch its data immediately. Ids not in the
    /// current device list are rejected with `NotFound`.
    pub async fn select_device(
        &self,
        device_id: impl Into<String>,
    ) -> Result<RefreshOutcome, CoreError> {
        let device_id = device_id.into();
        self.request(|reply| Intent::SelectDevice { device_id, reply })
            .await
    }

    /// Ask the backend to measure now, then refresh once it has accepted.
    pub async fn poll_now(&self) -> Result<RefreshOutcome, CoreError> {
        self.request(|reply| Intent::PollNow { reply }).await
    }

    /// Refresh without triggering a measurement. Joins the in-flight cycle
    /// if there is one.
    pub async fn refresh_now(&self) -> Result<RefreshOutcome, CoreError> {
        self.request(|reply| Intent::Refresh { reply }).await
    }

    /// Re-fetch the device list. Returns how many devices the backend
    /// reported.
    pub async fn reload_devices(&self) -> Result<usize, CoreError> {
        self.request(|reply| Intent::ReloadDevices { reply }).await
    }

    pub async fn acknowledge_alert(
        &self,
        alert_id: impl Into<String>,
    ) -> Result<RefreshOutcome, CoreError> {
        let alert_id = alert_id.into();
        self.request(|reply| Intent::AcknowledgeAlert { alert_id, reply })
            .await
    }

    /// Stop the timer and the actor. In-flight requests are left to finish
    /// on their own; their results are never applied.
    pub async fn shutdown(&self) {
        debug!("shutting down sync engine");
        self.inner.cancel.cancel();
        let handle = self.inner.task.lock().await.take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    pub fn is_running(&self) -> bool {
        !self.inner.cancel.is_cancelled()
    }

    async fn request<T: Send>(
        &self,
        intent: impl FnOnce(Reply<T>) -> Intent + Send,
    ) -> Result<T, CoreError> {
        let (reply, rx) = oneshot::channel();
        self.inner
            .intents
            .send(intent(reply))
            .await
            .map_err(|_| CoreError::EngineStopped)?;
        rx.await.map_err(|_| CoreError::EngineStopped)?
    }
}
