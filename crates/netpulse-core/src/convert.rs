// ── Wire → domain conversions ──
//
// Timestamp parsing is strict: a sample or alert whose timestamp can't be
// read fails the whole conversion with `CoreError::Validation`.

use chrono::{DateTime, NaiveDateTime, Utc};
use netpulse_api::{AlertEntry, DeviceEntry, MetricSample};

use crate::error::CoreError;
use crate::model::{Alert, Device, MetricPoint, Severity};

// ── Helpers ──────────────────────────────────────────────────────────

/// Naive layouts the backend emits, read as UTC.
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse an ISO-8601 timestamp: RFC 3339 with offset, or a naive
/// `YYYY-MM-DDTHH:MM:SS[.ffffff]` interpreted as UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, CoreError> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| CoreError::Validation {
            message: format!("unparseable timestamp: {raw:?}"),
        })
}

/// Render an opaque JSON id as a string. Strings lose their quotes,
/// everything else uses its JSON form.
fn id_to_string(raw: &serde_json::Value) -> String {
    match raw {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ── Device ───────────────────────────────────────────────────────────

impl From<DeviceEntry> for Device {
    fn from(entry: DeviceEntry) -> Self {
        Device {
            id: entry.id,
            host: entry.host,
            name: entry.name,
        }
    }
}

// ── Metrics ──────────────────────────────────────────────────────────

impl TryFrom<MetricSample> for MetricPoint {
    type Error = CoreError;

    fn try_from(sample: MetricSample) -> Result<Self, Self::Error> {
        Ok(MetricPoint {
            timestamp: parse_timestamp(&sample.timestamp)?,
            value: sample.value,
        })
    }
}

pub(crate) fn series_from_samples(samples: Vec<MetricSample>) -> Result<Vec<MetricPoint>, CoreError> {
    samples.into_iter().map(MetricPoint::try_from).collect()
}

// ── Alerts ───────────────────────────────────────────────────────────

impl TryFrom<AlertEntry> for Alert {
    type Error = CoreError;

    fn try_from(entry: AlertEntry) -> Result<Self, Self::Error> {
        Ok(Alert {
            id: id_to_string(&entry.id),
            device_id: entry.device_id,
            metric_type: entry.metric_type,
            value: entry.value,
            severity: Severity::from_wire(entry.severity.as_deref()),
            message: entry.message,
            timestamp: parse_timestamp(&entry.timestamp)?,
            acknowledged: entry.acknowledged,
        })
    }
}

pub(crate) fn alerts_from_entries(entries: Vec<AlertEntry>) -> Result<Vec<Alert>, CoreError> {
    entries.into_iter().map(Alert::try_from).collect()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_naive_timestamps_as_utc() {
        let expected = Utc.with_ymd_and_hms(2024, 6, 15, 10, 30, 0).single();
        assert_eq!(parse_timestamp("2024-06-15T10:30:00").ok(), expected);
        assert_eq!(parse_timestamp("2024-06-15 10:30:00").ok(), expected);

        let frac = parse_timestamp("2024-06-15T10:30:00.250000").ok();
        assert_eq!(
            frac.map(|t| t.timestamp_subsec_millis()),
            Some(250),
        );
    }

    #[test]
    fn parses_rfc3339_with_offset() {
        let parsed = parse_timestamp("2024-06-15T06:30:00-04:00").ok();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 6, 15, 10, 30, 0).single());
    }

    #[test]
    fn rejects_garbage_timestamps() {
        for raw in ["", "yesterday", "2024-13-45T99:00:00"] {
            assert!(
                matches!(parse_timestamp(raw), Err(CoreError::Validation { .. })),
                "{raw:?} should not parse"
            );
        }
    }

    #[test]
    fn alert_ids_are_normalized() {
        assert_eq!(id_to_string(&json!(42)), "42");
        assert_eq!(id_to_string(&json!("a-7")), "a-7");
    }

    #[test]
    fn alert_conversion_keeps_null_value() {
        let entry = AlertEntry {
            id: json!(7),
            device_id: "r1".into(),
            metric_type: "packet_loss".into(),
            value: None,
            severity: Some("critical".into()),
            message: None,
            timestamp: "2024-06-15T10:30:00".into(),
            acknowledged: false,
        };
        let alert = Alert::try_from(entry).ok();
        let alert = alert.as_ref();
        assert_eq!(alert.map(|a| a.id.as_str()), Some("7"));
        assert_eq!(alert.and_then(|a| a.value), None);
        assert_eq!(alert.map(|a| a.severity), Some(Severity::Critical));
    }

    #[test]
    fn one_bad_sample_fails_the_series() {
        let samples = vec![
            MetricSample {
                timestamp: "2024-06-15T10:30:00".into(),
                value: 1.0,
                metric_type: None,
            },
            MetricSample {
                timestamp: "not a time".into(),
                value: 2.0,
                metric_type: None,
            },
        ];
        assert!(matches!(
            series_from_samples(samples),
            Err(CoreError::Validation { .. })
        ));
    }
}
