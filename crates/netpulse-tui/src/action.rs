//! Every state transition in the TUI is expressed as an Action.

use std::sync::Arc;

use netpulse_core::{Notification, ViewState};

#[derive(Debug, Clone)]
pub enum Action {
    // ── Lifecycle ──────────────────────────────────────────────────
    Quit,
    Tick,
    Render,

    // ── Data Events (from the sync engine) ────────────────────────
    ViewUpdated(Arc<ViewState>),
    Notify(Notification),

    // ── Engine Intents ────────────────────────────────────────────
    SelectDevice(String),
    PollNow,
    RefreshNow,
    ReloadDevices,
    AcknowledgeAlert(String),

    // ── Alert Table ───────────────────────────────────────────────
    CursorUp,
    CursorDown,

    // ── Help ──────────────────────────────────────────────────────
    ToggleHelp,
}
