//! Platform-agnostic types for the greenhouse monitoring client.
//!
//! This crate defines the data model shared by the engine and any
//! frontend: sensor snapshots, threshold configurations, per-metric
//! status classifications, history points, and time ranges. It carries
//! no I/O and no async code.
//!
//! # Example
//!
//! ```
//! use greenhouse_types::{SensorSnapshot, Status};
//!
//! let snapshot = SensorSnapshot {
//!     temp: Some(24.5),
//!     hum: Some(61.0),
//!     ..Default::default()
//! };
//! assert_eq!(snapshot.temp, Some(24.5));
//! assert!(Status::Danger > Status::Warning);
//! ```

pub mod types;

pub use types::{
    HistoryPoint, Metric, SensorSnapshot, Status, StatusMap, ThresholdConfig, TimeRange,
};
