// ── Alert types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Alert severity as reported by the backend.
///
/// Anything the backend sends that isn't one of the known levels lands in
/// `Unknown` rather than failing the cycle.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Severity {
    Info,
    Warning,
    High,
    Critical,
    #[default]
    Unknown,
}

impl Severity {
    pub fn from_wire(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("warn") => Self::Warning,
            Some(s) => s.parse().unwrap_or(Self::Unknown),
            None => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Opaque id; numeric wire ids are rendered as their decimal string.
    pub id: String,
    pub device_id: String,
    pub metric_type: String,
    /// `None` when the alert was raised without a measurement.
    pub value: Option<f64>,
    pub severity: Severity,
    pub message: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub acknowledged: bool,
}
