// ── Snapshot transitions ──
//
// Every mutation the actor makes to the published view goes through one of
// these, so the lifecycle rules live in one place.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::{SyncPhase, ViewStore};
use crate::model::{Alert, Device, SeriesSet};

/// Everything one successful cycle fetched for one device.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CycleSnapshot {
    pub series: SeriesSet,
    pub alerts: Vec<Alert>,
}

impl ViewStore {
    pub(crate) fn set_devices(&self, devices: Arc<Vec<Device>>) {
        self.update(|v| v.devices = devices);
    }

    /// Record a new selection. Series and alerts from the previous device
    /// stay visible until the new device's first cycle lands.
    pub(crate) fn select(&self, device_id: &str) {
        self.update(|v| {
            v.selected_device_id = Some(device_id.to_owned());
        });
    }

    pub(crate) fn cycle_started(&self) {
        self.update(|v| {
            v.refreshing = true;
            if v.series_device_id != v.selected_device_id || v.last_update.is_none() {
                v.phase = SyncPhase::Loading;
            }
        });
    }

    /// Replace series and alerts wholesale.
    pub(crate) fn apply_cycle(&self, device_id: &str, snap: CycleSnapshot, at: DateTime<Utc>) {
        self.update(|v| {
            v.series = Arc::new(snap.series);
            v.alerts = Arc::new(snap.alerts);
            v.series_device_id = Some(device_id.to_owned());
            v.last_update = Some(at);
            v.last_error = None;
            v.refreshing = false;
            v.phase = SyncPhase::Ready;
        });
    }

    /// A failed cycle leaves series, alerts and `last_update` untouched.
    pub(crate) fn cycle_failed(&self, message: String) {
        self.update(|v| {
            v.last_error = Some(message);
            v.refreshing = false;
            v.phase = SyncPhase::Ready;
        });
    }

    pub(crate) fn set_poll_pending(&self, pending: bool) {
        self.update(|v| v.poll_pending = pending);
    }

    pub(crate) fn set_last_poll(&self, polled_at: String) {
        self.update(|v| v.last_poll_at = Some(polled_at));
    }

    pub(crate) fn set_error(&self, message: String) {
        self.update(|v| v.last_error = Some(message));
    }
}
