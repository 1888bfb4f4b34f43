// ── View store ──
//
// Holds the latest immutable `ViewState` behind a watch channel. Only the
// engine actor writes; any number of presentation tasks subscribe.

mod refresh;
mod view_state;

use std::sync::Arc;

use tokio::sync::watch;

use crate::stream::ViewStateStream;

pub(crate) use refresh::CycleSnapshot;
pub use view_state::{SyncPhase, ViewState};

pub struct ViewStore {
    state: watch::Sender<Arc<ViewState>>,
}

impl ViewStore {
    pub fn new() -> Self {
        let (state, _) = watch::channel(Arc::new(ViewState::default()));
        Self { state }
    }

    /// The snapshot as of right now.
    pub fn snapshot(&self) -> Arc<ViewState> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> ViewStateStream {
        ViewStateStream::new(self.state.subscribe())
    }

    /// Publish a new snapshot derived from the current one.
    ///
    /// Collections are `Arc`-shared, so the copy only clones what `f`
    /// actually replaces.
    pub(crate) fn update(&self, f: impl FnOnce(&mut ViewState)) {
        self.state.send_modify(|current| {
            let mut next = ViewState::clone(current);
            f(&mut next);
            *current = Arc::new(next);
        });
    }
}

impl Default for ViewStore {
    fn default() -> Self {
        Self::new()
    }
}
