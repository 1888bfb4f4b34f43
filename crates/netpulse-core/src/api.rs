// ── Backend seam ──
//
// The engine talks to the backend only through `MonitorApi`, so the actor
// can be driven by `MonitorClient` in production and by a scripted fake in
// tests.

use std::future::Future;

use netpulse_api::{MonitorClient, TransportConfig};

use crate::config::EngineConfig;
use crate::convert::{alerts_from_entries, series_from_samples};
use crate::error::CoreError;
use crate::model::{Alert, Device, MetricKind, MetricPoint};

/// Backend operations the sync engine needs, already in domain types.
pub trait MonitorApi: Send + Sync + 'static {
    fn list_devices(&self) -> impl Future<Output = Result<Vec<Device>, CoreError>> + Send;

    fn metric_series(
        &self,
        device_id: &str,
        kind: MetricKind,
        minutes: u32,
    ) -> impl Future<Output = Result<Vec<MetricPoint>, CoreError>> + Send;

    /// Most recent alerts across all devices, newest first.
    fn list_alerts(&self, limit: u32) -> impl Future<Output = Result<Vec<Alert>, CoreError>> + Send;

    /// Ask the backend to measure now. Resolves once the request is
    /// accepted, with the backend's `polled_at` stamp passed through as-is.
    fn trigger_poll(&self) -> impl Future<Output = Result<Option<String>, CoreError>> + Send;

    fn acknowledge_alert(&self, alert_id: &str)
    -> impl Future<Output = Result<(), CoreError>> + Send;
}

impl MonitorApi for MonitorClient {
    async fn list_devices(&self) -> Result<Vec<Device>, CoreError> {
        let entries = MonitorClient::list_devices(self).await?;
        Ok(entries.into_iter().map(Device::from).collect())
    }

    async fn metric_series(
        &self,
        device_id: &str,
        kind: MetricKind,
        minutes: u32,
    ) -> Result<Vec<MetricPoint>, CoreError> {
        let samples = MonitorClient::metric_series(self, device_id, kind.as_str(), minutes).await?;
        series_from_samples(samples)
    }

    async fn list_alerts(&self, limit: u32) -> Result<Vec<Alert>, CoreError> {
        let entries = MonitorClient::list_alerts(self, limit).await?;
        alerts_from_entries(entries)
    }

    async fn trigger_poll(&self) -> Result<Option<String>, CoreError> {
        let summary = MonitorClient::trigger_poll(self).await?;
        tracing::debug!(polled_at = ?summary.polled_at, "backend accepted poll");
        Ok(summary.polled_at)
    }

    async fn acknowledge_alert(&self, alert_id: &str) -> Result<(), CoreError> {
        MonitorClient::acknowledge_alert(self, alert_id).await?;
        Ok(())
    }
}

/// Build the production client from validated configuration.
pub fn connect(config: &EngineConfig) -> Result<MonitorClient, CoreError> {
    config.validate()?;
    let transport = TransportConfig {
        timeout: config.timeout,
        ..TransportConfig::default()
    };
    Ok(MonitorClient::new(
        config.base_url.clone(),
        &config.api_key,
        &transport,
    )?)
}
