use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::Display;

use crate::model::{Alert, Device, SeriesSet};

/// Coarse engine lifecycle shown in the status line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Display)]
pub enum SyncPhase {
    /// No device selected: none loaded yet, or the backend has none.
    #[default]
    Idle,
    /// A cycle is in flight and nothing has been applied for this
    /// selection yet.
    Loading,
    Ready,
}

/// One immutable dashboard snapshot.
///
/// `series` and `alerts` only ever change together, on a fully successful
/// cycle, and `series` always belongs to a single device
/// (`series_device_id`).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ViewState {
    pub devices: Arc<Vec<Device>>,
    pub selected_device_id: Option<String>,
    pub series_device_id: Option<String>,
    pub series: Arc<SeriesSet>,
    pub alerts: Arc<Vec<Alert>>,
    pub last_update: Option<DateTime<Utc>>,
    pub phase: SyncPhase,
    pub refreshing: bool,
    pub poll_pending: bool,
    /// Backend stamp of the last accepted poll, verbatim from the wire.
    pub last_poll_at: Option<String>,
    pub last_error: Option<String>,
}

impl ViewState {
    pub fn selected_device(&self) -> Option<&Device> {
        let id = self.selected_device_id.as_deref()?;
        self.devices.iter().find(|d| d.id == id)
    }

    pub fn selected_index(&self) -> Option<usize> {
        let id = self.selected_device_id.as_deref()?;
        self.devices.iter().position(|d| d.id == id)
    }

    /// Whether the series on screen belong to a device other than the one
    /// now selected (the previous device's data stays up until the first
    /// cycle for the new selection lands).
    pub fn series_are_stale(&self) -> bool {
        self.series_device_id.is_some() && self.series_device_id != self.selected_device_id
    }
}
