//! Data bridge: forwards engine snapshots and notifications to the TUI
//! action loop.

use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use netpulse_core::SyncEngine;

use crate::action::Action;

/// Runs until `cancel` fires or the engine goes away. The current
/// snapshot is sent first so the screen has something to draw.
pub async fn spawn_data_bridge(
    engine: SyncEngine,
    action_tx: mpsc::UnboundedSender<Action>,
    cancel: CancellationToken,
) {
    let mut views = engine.subscribe();
    let mut notes = engine.notifications();

    let _ = action_tx.send(Action::ViewUpdated(views.current().clone()));

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => break,

            view = views.changed() => {
                let Some(view) = view else {
                    debug!("snapshot channel closed");
                    break;
                };
                if action_tx.send(Action::ViewUpdated(view)).is_err() {
                    break;
                }
            }

            note = notes.recv() => match note {
                Ok(note) => {
                    let _ = action_tx.send(Action::Notify(note));
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "notification subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    debug!("data bridge shut down");
}
