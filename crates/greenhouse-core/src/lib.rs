//! Client engine for the greenhouse monitoring service.
//!
//! This crate implements the session, evaluation, and orchestration
//! layer of the greenhouse dashboard: everything between the remote
//! HTTP API and a rendering frontend.
//!
//! # Features
//!
//! - **Session lifecycle**: token hydration, login, logout, and
//!   change-notification via a watch channel
//! - **Threshold evaluation**: pure per-metric classification of
//!   sensor snapshots into `ok`/`warning`/`danger`/`alert`
//! - **Live data coordination**: concurrent snapshot + settings
//!   fetches applied atomically, re-run on session change and on
//!   saved settings
//! - **History queries**: validated time ranges reshaped into
//!   chartable series, with last-write-wins fencing across
//!   overlapping queries
//! - **Settings sync**: load/save of threshold configurations with
//!   local validation before any network call
//! - **Password policy**: local validation and bounded random
//!   suggestion
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use greenhouse_core::api::{ApiClient, SensorApi};
//! use greenhouse_core::events::EventDispatcher;
//! use greenhouse_core::live::LiveDataCoordinator;
//! use greenhouse_core::session::{FileTokenStore, SessionStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let api: Arc<dyn SensorApi> = Arc::new(ApiClient::new("http://localhost:8000")?);
//!     let session = Arc::new(SessionStore::new(FileTokenStore::new()));
//!     session.hydrate();
//!
//!     let events = EventDispatcher::default();
//!     let live = LiveDataCoordinator::new(api, session, events);
//!     live.refresh().await?;
//!
//!     if let Some(view) = live.view().await {
//!         println!("{:?}", view.status);
//!     }
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod error;
pub mod events;
pub mod history;
pub mod live;
pub mod mock;
pub mod password;
pub mod session;
pub mod settings;
pub mod thresholds;

// Core exports
pub use api::{ApiClient, LoginResponse, SensorApi};
pub use error::{Error, Result};
pub use events::{AppEvent, EventDispatcher, EventReceiver, EventSender, FaultContext};
pub use history::{ChartSeries, HistoryQueryEngine, QueryOutcome, TRACKED_METRICS};
pub use live::{LiveDataCoordinator, LiveView};
pub use mock::MockApi;
pub use password::{
    PasswordIssue, require_valid_password, suggest_password, validate_password,
};
pub use session::{FileTokenStore, MemoryTokenStore, SessionStore, TokenStore, sign_out};
pub use settings::SettingsSync;
pub use thresholds::evaluate;

// Re-export the shared data model
pub use greenhouse_types as types;
pub use greenhouse_types::{
    HistoryPoint, Metric, SensorSnapshot, Status, StatusMap, ThresholdConfig, TimeRange,
};
