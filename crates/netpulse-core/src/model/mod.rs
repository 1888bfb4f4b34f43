// ── Domain model ──
//
// Canonical types the engine publishes. Wire shapes live in `netpulse-api`;
// `crate::convert` turns them into these.

pub mod alert;
pub mod device;
pub mod metric;

pub use alert::{Alert, Severity};
pub use device::Device;
pub use metric::{MetricKind, MetricPoint, MetricSeries, SeriesSet};
