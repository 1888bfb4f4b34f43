// netpulse-api: Async Rust client for the netpulse monitoring backend

pub mod client;
pub mod error;
pub mod models;
pub mod transport;

pub use client::MonitorClient;
pub use error::Error;
pub use models::{AckResponse, AlertEntry, DeviceEntry, Health, MetricSample, PollSummary};
pub use transport::{API_KEY_HEADER, TransportConfig};
