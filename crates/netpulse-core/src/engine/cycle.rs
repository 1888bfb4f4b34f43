// ── Refresh cycle ──

use crate::api::MonitorApi;
use crate::error::CoreError;
use crate::model::{MetricKind, SeriesSet};
use crate::store::CycleSnapshot;

/// One selection of one device. `seq` increases with every selection, so a
/// re-select of the same device is a new epoch too.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct Epoch {
    pub device_id: String,
    pub seq: u64,
}

/// Identifies a single refresh cycle within an epoch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CycleTag {
    pub epoch: Epoch,
    pub cycle: u64,
}

/// Fetch the three series and the alert list for one device.
///
/// Fail-fast: the first error aborts the join and the remaining responses
/// are ignored.
pub(crate) async fn fetch_cycle<A: MonitorApi>(
    api: &A,
    device_id: &str,
    window_minutes: u32,
    alert_limit: u32,
) -> Result<CycleSnapshot, CoreError> {
    let (cpu, memory, packet_loss, mut alerts) = tokio::try_join!(
        api.metric_series(device_id, MetricKind::Cpu, window_minutes),
        api.metric_series(device_id, MetricKind::Memory, window_minutes),
        api.metric_series(device_id, MetricKind::PacketLoss, window_minutes),
        api.list_alerts(alert_limit),
    )?;

    alerts.truncate(usize::try_from(alert_limit).unwrap_or(usize::MAX));

    Ok(CycleSnapshot {
        series: SeriesSet {
            cpu,
            memory,
            packet_loss,
        },
        alerts,
    })
}
