//! Synchronization engine for the netpulse dashboard.
//!
//! `SyncEngine` keeps an immutable [`ViewState`] snapshot in step with the
//! monitoring backend: it loads the device list, tracks the selected
//! device, refreshes its metric series and the alert list on a timer or on
//! demand, and guarantees that a snapshot never mixes data from two
//! selections.
//!
//! ```no_run
//! # async fn demo(config: netpulse_core::EngineConfig) -> Result<(), netpulse_core::CoreError> {
//! let engine = netpulse_core::SyncEngine::connect(&config)?;
//! let mut views = engine.subscribe();
//! while let Some(view) = views.changed().await {
//!     println!("{:?} {:?}", view.phase, view.last_update);
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod convert;
pub mod engine;
pub mod error;
pub mod model;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use api::MonitorApi;
pub use config::{EngineConfig, SyncOptions};
pub use engine::{Notification, NotificationLevel, RefreshOutcome, SyncEngine};
pub use error::CoreError;
pub use store::{SyncPhase, ViewState};
pub use stream::{ViewStateStream, ViewStateWatchStream};

// ── Model re-exports ────────────────────────────────────────────────
pub use model::{Alert, Device, MetricKind, MetricPoint, MetricSeries, SeriesSet, Severity};
