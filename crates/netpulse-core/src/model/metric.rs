// ── Metric series ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// The three series charted per device.
///
/// The `Display`/`FromStr` form is the wire name sent as `?metric=`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MetricKind {
    Cpu,
    Memory,
    PacketLoss,
}

impl MetricKind {
    pub const ALL: [MetricKind; 3] = [Self::Cpu, Self::Memory, Self::PacketLoss];

    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// Chart title.
    pub fn label(self) -> &'static str {
        match self {
            Self::Cpu => "CPU %",
            Self::Memory => "Memory %",
            Self::PacketLoss => "Packet Loss %",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Samples for one kind, in the order the backend returned them.
/// Duplicate timestamps are kept.
pub type MetricSeries = Vec<MetricPoint>;

/// All three series for one device, replaced wholesale per cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesSet {
    pub cpu: MetricSeries,
    pub memory: MetricSeries,
    pub packet_loss: MetricSeries,
}

impl SeriesSet {
    pub fn get(&self, kind: MetricKind) -> &[MetricPoint] {
        match kind {
            MetricKind::Cpu => &self.cpu,
            MetricKind::Memory => &self.memory,
            MetricKind::PacketLoss => &self.packet_loss,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cpu.is_empty() && self.memory.is_empty() && self.packet_loss.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn wire_names_are_snake_case() {
        assert_eq!(MetricKind::PacketLoss.as_str(), "packet_loss");
        assert_eq!(MetricKind::Cpu.to_string(), "cpu");
        assert_eq!(MetricKind::from_str("memory").ok(), Some(MetricKind::Memory));
        assert!(MetricKind::from_str("disk").is_err());
    }

    #[test]
    fn series_set_lookup_by_kind() {
        let point = MetricPoint {
            timestamp: DateTime::<Utc>::UNIX_EPOCH,
            value: 3.5,
        };
        let set = SeriesSet {
            memory: vec![point],
            ..SeriesSet::default()
        };
        assert!(set.get(MetricKind::Cpu).is_empty());
        assert_eq!(set.get(MetricKind::Memory), &[point]);
        assert!(!set.is_empty());
        assert!(SeriesSet::default().is_empty());
    }
}
