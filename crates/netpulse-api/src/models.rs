// Backend response types
//
// Wire models for the monitoring backend's JSON API. Timestamps stay as raw
// strings here; `netpulse-core` parses them into instants and owns the
// validation policy. Optional fields use `#[serde(default)]` because older
// backends omit them.

use serde::{Deserialize, Serialize};

// ── Devices ──────────────────────────────────────────────────────────

/// Entry from `GET /api/devices`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceEntry {
    pub id: String,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

// ── Metrics ──────────────────────────────────────────────────────────

/// One sample from `GET /api/metrics/{device_id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub timestamp: String,
    pub value: f64,
    #[serde(default)]
    pub metric_type: Option<String>,
}

// ── Alerts ───────────────────────────────────────────────────────────

/// Entry from `GET /api/alerts`.
///
/// `id` is numeric on current backends but treated as opaque; `value` may
/// be `null` for alerts raised without a measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEntry {
    pub id: serde_json::Value,
    pub device_id: String,
    #[serde(default)]
    pub metric_type: String,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    pub timestamp: String,
    #[serde(default)]
    pub acknowledged: bool,
}

// ── Commands ─────────────────────────────────────────────────────────

/// Body of a successful `POST /api/poll`. Every field is optional: the
/// engine only cares that the request was accepted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PollSummary {
    #[serde(default)]
    pub polled_at: Option<String>,
    #[serde(default)]
    pub devices: Vec<serde_json::Value>,
}

/// Body of `POST /api/alerts/{id}/ack`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AckResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub id: serde_json::Value,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    #[serde(default)]
    pub simulation: bool,
}

/// Error body the backend attaches to 4xx responses: `{"error": "..."}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: Option<String>,
}
