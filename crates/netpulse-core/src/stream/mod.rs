// ── Snapshot subscription ──
//
// Presentation tasks consume `ViewState` snapshots through this wrapper
// around the store's watch channel.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::store::ViewState;

/// A subscription to dashboard snapshots.
///
/// Intermediate snapshots may be skipped if the consumer is slow; the
/// latest one is always observed.
pub struct ViewStateStream {
    current: Arc<ViewState>,
    receiver: watch::Receiver<Arc<ViewState>>,
}

impl ViewStateStream {
    pub(crate) fn new(receiver: watch::Receiver<Arc<ViewState>>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// The snapshot captured at creation time or by the last `changed()`.
    pub fn current(&self) -> &Arc<ViewState> {
        &self.current
    }

    /// The latest published snapshot.
    pub fn latest(&self) -> Arc<ViewState> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next snapshot. `None` once the engine is gone.
    pub async fn changed(&mut self) -> Option<Arc<ViewState>> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = Arc::clone(&snap);
        Some(snap)
    }

    pub fn into_stream(self) -> ViewStateWatchStream {
        ViewStateWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter yielding each new snapshot, starting with the current
/// one.
pub struct ViewStateWatchStream {
    inner: WatchStream<Arc<ViewState>>,
}

impl Stream for ViewStateWatchStream {
    type Item = Arc<ViewState>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
