//! Mock backend implementation for testing.
//!
//! This module provides a programmable [`SensorApi`] implementation
//! so the coordinator, history engine, and settings sync can be
//! exercised without a running backend.
//!
//! # Features
//!
//! - **Failure injection**: fail specific operations on demand
//! - **Latency simulation**: add artificial delays to expose races
//!   (stale responses, logout mid-flight)
//! - **Call counting**: assert that validation short-circuits before
//!   any network call

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use greenhouse_types::{HistoryPoint, SensorSnapshot, ThresholdConfig};

use crate::api::{LoginResponse, SensorApi};
use crate::error::{Error, Result};

/// A mock greenhouse backend.
///
/// # Example
///
/// ```
/// use greenhouse_core::api::SensorApi;
/// use greenhouse_core::mock::MockApi;
///
/// #[tokio::main]
/// async fn main() {
///     let api = MockApi::new();
///     let session = api.login("admin", "secret").await.unwrap();
///     let snapshot = api.latest_snapshot(&session.access_token).await.unwrap();
///     assert!(snapshot.is_some());
/// }
/// ```
pub struct MockApi {
    snapshot: RwLock<Option<SensorSnapshot>>,
    settings: RwLock<ThresholdConfig>,
    history: RwLock<Vec<HistoryPoint>>,
    first_login: AtomicBool,
    fail_snapshot: AtomicBool,
    fail_settings: AtomicBool,
    fail_history: AtomicBool,
    fail_save: AtomicBool,
    fail_logout: AtomicBool,
    /// Simulated latency for the live pair (snapshot + settings), ms.
    live_latency_ms: AtomicU64,
    /// Simulated latency for history fetches, ms.
    history_latency_ms: AtomicU64,
    snapshot_calls: AtomicU32,
    settings_calls: AtomicU32,
    history_calls: AtomicU32,
    save_calls: AtomicU32,
    logout_calls: AtomicU32,
}

impl std::fmt::Debug for MockApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockApi")
            .field("history_calls", &self.history_calls.load(Ordering::Relaxed))
            .field("save_calls", &self.save_calls.load(Ordering::Relaxed))
            .finish()
    }
}

impl MockApi {
    /// Create a mock backend with a plausible default snapshot and an
    /// empty threshold configuration.
    pub fn new() -> Self {
        Self {
            snapshot: RwLock::new(Some(Self::default_snapshot())),
            settings: RwLock::new(ThresholdConfig::default()),
            history: RwLock::new(Vec::new()),
            first_login: AtomicBool::new(false),
            fail_snapshot: AtomicBool::new(false),
            fail_settings: AtomicBool::new(false),
            fail_history: AtomicBool::new(false),
            fail_save: AtomicBool::new(false),
            fail_logout: AtomicBool::new(false),
            live_latency_ms: AtomicU64::new(0),
            history_latency_ms: AtomicU64::new(0),
            snapshot_calls: AtomicU32::new(0),
            settings_calls: AtomicU32::new(0),
            history_calls: AtomicU32::new(0),
            save_calls: AtomicU32::new(0),
            logout_calls: AtomicU32::new(0),
        }
    }

    fn default_snapshot() -> SensorSnapshot {
        SensorSnapshot {
            temp: Some(23.5),
            hum: Some(58.0),
            soil: Some(420.0),
            light: Some(850.0),
            dist: Some(14.0),
            motion: Some(false),
            acc_x: Some(0.02),
            acc_y: Some(-0.01),
            acc_z: Some(9.81),
        }
    }

    /// Replace the snapshot returned by `latest_snapshot`.
    pub async fn set_snapshot(&self, snapshot: SensorSnapshot) {
        *self.snapshot.write().await = Some(snapshot);
    }

    /// Make `latest_snapshot` return no readings.
    pub async fn clear_snapshot(&self) {
        *self.snapshot.write().await = None;
    }

    /// Replace the stored threshold configuration.
    pub async fn set_settings(&self, config: ThresholdConfig) {
        *self.settings.write().await = config;
    }

    /// Replace the stored history readings.
    pub async fn set_history(&self, points: Vec<HistoryPoint>) {
        *self.history.write().await = points;
    }

    /// Route the next login through the change-password flow.
    pub fn set_first_login(&self, first: bool) {
        self.first_login.store(first, Ordering::SeqCst);
    }

    /// Fail `latest_snapshot` calls.
    pub fn set_fail_snapshot(&self, fail: bool) {
        self.fail_snapshot.store(fail, Ordering::SeqCst);
    }

    /// Fail `settings` calls.
    pub fn set_fail_settings(&self, fail: bool) {
        self.fail_settings.store(fail, Ordering::SeqCst);
    }

    /// Fail `history` calls.
    pub fn set_fail_history(&self, fail: bool) {
        self.fail_history.store(fail, Ordering::SeqCst);
    }

    /// Fail `save_settings` calls.
    pub fn set_fail_save(&self, fail: bool) {
        self.fail_save.store(fail, Ordering::SeqCst);
    }

    /// Fail `logout` calls.
    pub fn set_fail_logout(&self, fail: bool) {
        self.fail_logout.store(fail, Ordering::SeqCst);
    }

    /// Delay `latest_snapshot` and `settings` responses.
    pub fn set_live_latency(&self, latency: Duration) {
        self.live_latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    /// Delay `history` responses.
    pub fn set_history_latency(&self, latency: Duration) {
        self.history_latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    /// Number of `latest_snapshot` calls made.
    pub fn snapshot_calls(&self) -> u32 {
        self.snapshot_calls.load(Ordering::SeqCst)
    }

    /// Number of `settings` calls made.
    pub fn settings_calls(&self) -> u32 {
        self.settings_calls.load(Ordering::SeqCst)
    }

    /// Number of `history` calls made.
    pub fn history_calls(&self) -> u32 {
        self.history_calls.load(Ordering::SeqCst)
    }

    /// Number of `save_settings` calls made.
    pub fn save_calls(&self) -> u32 {
        self.save_calls.load(Ordering::SeqCst)
    }

    /// Number of `logout` calls made.
    pub fn logout_calls(&self) -> u32 {
        self.logout_calls.load(Ordering::SeqCst)
    }

    fn failure() -> Error {
        Error::api(500, "mock failure")
    }

    async fn simulate_latency(ms: u64) {
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }
}

impl Default for MockApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SensorApi for MockApi {
    async fn login(&self, _username: &str, _password: &str) -> Result<LoginResponse> {
        Ok(LoginResponse {
            access_token: "mock-token".to_string(),
            is_first_login: self.first_login.load(Ordering::SeqCst),
        })
    }

    async fn change_password(
        &self,
        _token: &str,
        _new_password: &str,
        _confirm_password: &str,
    ) -> Result<()> {
        Ok(())
    }

    async fn logout(&self, _token: &str) -> Result<()> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_logout.load(Ordering::SeqCst) {
            return Err(Self::failure());
        }
        Ok(())
    }

    async fn latest_snapshot(&self, _token: &str) -> Result<Option<SensorSnapshot>> {
        self.snapshot_calls.fetch_add(1, Ordering::SeqCst);
        let latency = self.live_latency_ms.load(Ordering::SeqCst);
        Self::simulate_latency(latency).await;
        if self.fail_snapshot.load(Ordering::SeqCst) {
            return Err(Self::failure());
        }
        Ok(*self.snapshot.read().await)
    }

    async fn history(
        &self,
        _token: &str,
        from: OffsetDateTime,
        to: OffsetDateTime,
    ) -> Result<Vec<HistoryPoint>> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        let latency = self.history_latency_ms.load(Ordering::SeqCst);
        Self::simulate_latency(latency).await;
        if self.fail_history.load(Ordering::SeqCst) {
            return Err(Self::failure());
        }
        let points = self.history.read().await;
        Ok(points
            .iter()
            .filter(|p| p.timestamp >= from && p.timestamp <= to)
            .copied()
            .collect())
    }

    async fn settings(&self, _token: &str) -> Result<ThresholdConfig> {
        self.settings_calls.fetch_add(1, Ordering::SeqCst);
        let latency = self.live_latency_ms.load(Ordering::SeqCst);
        Self::simulate_latency(latency).await;
        if self.fail_settings.load(Ordering::SeqCst) {
            return Err(Self::failure());
        }
        Ok(self.settings.read().await.clone())
    }

    async fn save_settings(&self, _token: &str, config: &ThresholdConfig) -> Result<()> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_save.load(Ordering::SeqCst) {
            return Err(Self::failure());
        }
        *self.settings.write().await = config.clone();
        Ok(())
    }
}
