//! History range queries and chart series reshaping.
//!
//! The [`HistoryQueryEngine`] validates a requested time window,
//! fetches the readings inside it, and reshapes them into one shared
//! timestamp axis with a parallel value array per tracked metric,
//! the layout charting frontends consume directly.
//!
//! Overlapping queries follow a cancel-and-replace discipline: every
//! request is tagged with a monotonically increasing id, and a
//! response whose id is no longer the latest issued is dropped. A
//! stale response can therefore never overwrite a newer one,
//! regardless of arrival order.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use time::OffsetDateTime;
use tokio::sync::RwLock;
use tracing::debug;

use greenhouse_types::{HistoryPoint, Metric, TimeRange};

use crate::api::SensorApi;
use crate::error::Result;
use crate::events::{AppEvent, EventDispatcher, FaultContext};
use crate::session::SessionStore;

/// Metrics included in history charts. Raw readings may carry more
/// fields; anything not listed here is omitted from the series.
pub const TRACKED_METRICS: [Metric; 4] = [Metric::Temp, Metric::Hum, Metric::Light, Metric::Soil];

/// A history series reshaped for charting: one label axis and one
/// value array per tracked metric, all the same length.
///
/// Timestamps keep the backend's order; an empty series is a valid
/// result for a range with no readings.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChartSeries {
    /// Shared label axis.
    pub timestamps: Vec<OffsetDateTime>,
    /// Temperature values, aligned with `timestamps`.
    pub temp: Vec<Option<f64>>,
    /// Humidity values, aligned with `timestamps`.
    pub hum: Vec<Option<f64>>,
    /// Light values, aligned with `timestamps`.
    pub light: Vec<Option<f64>>,
    /// Soil moisture values, aligned with `timestamps`.
    pub soil: Vec<Option<f64>>,
}

impl ChartSeries {
    /// Reshape ordered readings into parallel per-metric arrays.
    #[must_use]
    pub fn from_points(points: &[HistoryPoint]) -> Self {
        let mut series = Self {
            timestamps: Vec::with_capacity(points.len()),
            temp: Vec::with_capacity(points.len()),
            hum: Vec::with_capacity(points.len()),
            light: Vec::with_capacity(points.len()),
            soil: Vec::with_capacity(points.len()),
        };
        for point in points {
            series.timestamps.push(point.timestamp);
            series.temp.push(point.values.temp);
            series.hum.push(point.values.hum);
            series.light.push(point.values.light);
            series.soil.push(point.values.soil);
        }
        series
    }

    /// Number of points in the series.
    #[must_use]
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Whether the series has no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// The value array for a tracked metric, or `None` for metrics
    /// not tracked in history.
    #[must_use]
    pub fn values(&self, metric: Metric) -> Option<&[Option<f64>]> {
        match metric {
            Metric::Temp => Some(&self.temp),
            Metric::Hum => Some(&self.hum),
            Metric::Light => Some(&self.light),
            Metric::Soil => Some(&self.soil),
            _ => None,
        }
    }
}

/// How a history query concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOutcome {
    /// The fetched series replaced the stored one.
    Applied,
    /// The range was incomplete/inverted or there is no session; no
    /// request was issued and the stored series is unchanged.
    Skipped,
    /// A newer query was issued while this one was in flight; the
    /// response was dropped and the stored series is unchanged.
    Superseded,
}

/// Validates time ranges, fetches history, and stores the latest
/// chart series.
pub struct HistoryQueryEngine {
    api: Arc<dyn SensorApi>,
    session: Arc<SessionStore>,
    events: EventDispatcher,
    next_id: AtomicU64,
    state: RwLock<Option<ChartSeries>>,
}

impl HistoryQueryEngine {
    /// Create an engine over the given backend and session.
    pub fn new(
        api: Arc<dyn SensorApi>,
        session: Arc<SessionStore>,
        events: EventDispatcher,
    ) -> Self {
        Self {
            api,
            session,
            events,
            next_id: AtomicU64::new(0),
            state: RwLock::new(None),
        }
    }

    /// The most recently applied series, if any.
    pub async fn series(&self) -> Option<ChartSeries> {
        self.state.read().await.clone()
    }

    /// Query the readings inside `range` and store the reshaped
    /// series.
    ///
    /// An incomplete or inverted range, or a missing session token,
    /// skips the query entirely: this is an incomplete user
    /// selection, not a fault, so no error is surfaced. A fetch
    /// failure surfaces an [`AppEvent::Fault`] and leaves the prior
    /// series unchanged.
    pub async fn query(&self, range: TimeRange) -> Result<QueryOutcome> {
        let Some((from, to)) = range.bounds() else {
            return Ok(QueryOutcome::Skipped);
        };
        // Epoch strictly before token, so a logout interleaved between
        // the two reads either skips the fetch or fails the apply
        // check below.
        let epoch = self.session.epoch();
        let Some(token) = self.session.token() else {
            return Ok(QueryOutcome::Skipped);
        };

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;

        let points = match self.api.history(&token, from, to).await {
            Ok(points) => points,
            Err(e) => {
                self.events.fault(FaultContext::History, e.to_string());
                return Err(e);
            }
        };

        let mut state = self.state.write().await;
        // Last-write-wins: only the most recently issued query may
        // apply, and never across a session change.
        if self.next_id.load(Ordering::SeqCst) != id || self.session.epoch() != epoch {
            debug!("Dropping superseded history response (id {})", id);
            return Ok(QueryOutcome::Superseded);
        }
        *state = Some(ChartSeries::from_points(&points));
        drop(state);

        self.events.send(AppEvent::HistoryUpdated);
        Ok(QueryOutcome::Applied)
    }
}
