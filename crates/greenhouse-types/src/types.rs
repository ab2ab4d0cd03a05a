//! Core types for greenhouse sensor data.

use core::fmt;
use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use time::OffsetDateTime;

/// A sensor metric tracked by the dashboard.
///
/// Variant names serialize to the wire keys used by the backend
/// (`temp`, `hum`, `acc_x`, ...).
///
/// This enum is marked `#[non_exhaustive]` to allow adding new metrics
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[non_exhaustive]
pub enum Metric {
    /// Air temperature (°C).
    Temp,
    /// Relative humidity (%).
    Hum,
    /// Soil moisture (raw ADC units).
    Soil,
    /// Light level (lx).
    Light,
    /// Distance (cm), e.g. water tank level.
    Dist,
    /// Motion detected.
    Motion,
    /// Accelerometer X axis.
    AccX,
    /// Accelerometer Y axis.
    AccY,
    /// Accelerometer Z axis.
    AccZ,
}

impl Metric {
    /// All metrics, in display order.
    pub const ALL: [Metric; 9] = [
        Metric::Temp,
        Metric::Hum,
        Metric::Soil,
        Metric::Light,
        Metric::Dist,
        Metric::Motion,
        Metric::AccX,
        Metric::AccY,
        Metric::AccZ,
    ];

    /// The wire key for this metric.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Temp => "temp",
            Metric::Hum => "hum",
            Metric::Soil => "soil",
            Metric::Light => "light",
            Metric::Dist => "dist",
            Metric::Motion => "motion",
            Metric::AccX => "acc_x",
            Metric::AccY => "acc_y",
            Metric::AccZ => "acc_z",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Metric::Temp => "Temperature",
            Metric::Hum => "Humidity",
            Metric::Soil => "Soil Moisture",
            Metric::Light => "Light",
            Metric::Dist => "Distance",
            Metric::Motion => "Motion",
            Metric::AccX => "Accel X",
            Metric::AccY => "Accel Y",
            Metric::AccZ => "Accel Z",
        }
    }

    /// Display unit, if the metric has one.
    #[must_use]
    pub fn unit(&self) -> Option<&'static str> {
        match self {
            Metric::Temp => Some("°C"),
            Metric::Hum => Some("%"),
            Metric::Light => Some("lx"),
            Metric::Dist => Some("cm"),
            _ => None,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-metric status classification.
///
/// # Ordering
///
/// Status values are ordered by escalation: `Ok < Warning < Danger <
/// Alert`. This allows comparisons like `if status >= Status::Danger`.
///
/// Serde serialization uses the lowercase wire names (`"ok"`,
/// `"warning"`, `"danger"`, `"alert"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[repr(u8)]
pub enum Status {
    /// Reading is within configured bounds.
    Ok = 0,
    /// Reading is outside the comfortable range.
    Warning = 1,
    /// Reading violates a hard threshold.
    Danger = 2,
    /// Event-style notification (e.g. motion detected).
    Alert = 3,
}

impl Status {
    /// Whether the status requires no attention.
    #[must_use]
    pub fn is_nominal(&self) -> bool {
        matches!(self, Status::Ok)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Ok => write!(f, "ok"),
            Status::Warning => write!(f, "warning"),
            Status::Danger => write!(f, "danger"),
            Status::Alert => write!(f, "alert"),
        }
    }
}

/// Derived mapping from metric to status.
///
/// Always recomputed wholesale from a `(SensorSnapshot,
/// ThresholdConfig)` pair, never mutated in place.
pub type StatusMap = BTreeMap<Metric, Status>;

/// The most recent reading from the greenhouse sensor array.
///
/// Every field is optional: an absent field means the backend has no
/// value for it ("unknown"), which is a normal state, not an error.
/// Snapshots are replaced wholesale by the next fetch, never merged
/// field-by-field.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SensorSnapshot {
    /// Air temperature (°C).
    pub temp: Option<f64>,
    /// Relative humidity (%).
    pub hum: Option<f64>,
    /// Soil moisture (raw ADC units).
    pub soil: Option<f64>,
    /// Light level (lx).
    pub light: Option<f64>,
    /// Distance (cm).
    pub dist: Option<f64>,
    /// Motion detected.
    pub motion: Option<bool>,
    /// Accelerometer X axis.
    pub acc_x: Option<f64>,
    /// Accelerometer Y axis.
    pub acc_y: Option<f64>,
    /// Accelerometer Z axis.
    pub acc_z: Option<f64>,
}

impl SensorSnapshot {
    /// Numeric value for a metric, if present.
    ///
    /// `motion` is reported as 1.0/0.0 so charts and tables can treat
    /// all metrics uniformly.
    #[must_use]
    pub fn value(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Temp => self.temp,
            Metric::Hum => self.hum,
            Metric::Soil => self.soil,
            Metric::Light => self.light,
            Metric::Dist => self.dist,
            Metric::Motion => self.motion.map(|m| if m { 1.0 } else { 0.0 }),
            Metric::AccX => self.acc_x,
            Metric::AccY => self.acc_y,
            Metric::AccZ => self.acc_z,
        }
    }
}

/// User-defined threshold configuration.
///
/// One instance is active per session. Bounds are optional while the
/// user is editing; [`ThresholdConfig::missing_fields`] lists what is
/// still required before the configuration can be saved.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ThresholdConfig {
    /// Owning user, assigned by the backend.
    pub owner: Option<String>,
    /// Configuration name.
    pub name: Option<String>,
    /// Minimum temperature (°C).
    pub temp_min: Option<f64>,
    /// Maximum temperature (°C).
    pub temp_max: Option<f64>,
    /// Minimum humidity (%).
    pub hum_min: Option<f64>,
    /// Maximum humidity (%).
    pub hum_max: Option<f64>,
    /// Minimum light level (lx).
    pub light_min: Option<f64>,
    /// Maximum light level (lx).
    pub light_max: Option<f64>,
    /// Minimum soil moisture.
    pub soil_min: Option<f64>,
}

impl ThresholdConfig {
    /// Names of required fields that are still missing.
    ///
    /// `name` must be present and non-empty; all seven numeric bounds
    /// must be present. `owner` is backend-assigned and never
    /// required from the caller.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.name.as_deref().is_none_or(str::is_empty) {
            missing.push("name");
        }
        let bounds: [(&'static str, Option<f64>); 7] = [
            ("temp_min", self.temp_min),
            ("temp_max", self.temp_max),
            ("hum_min", self.hum_min),
            ("hum_max", self.hum_max),
            ("light_min", self.light_min),
            ("light_max", self.light_max),
            ("soil_min", self.soil_min),
        ];
        for (field, value) in bounds {
            if value.is_none() {
                missing.push(field);
            }
        }
        missing
    }

    /// Whether every required field is present.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }
}

/// A single timestamped reading in a history series.
///
/// The sensor fields are flattened alongside the timestamp, matching
/// the backend's wire format.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HistoryPoint {
    /// When the reading was captured (RFC 3339 on the wire).
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    pub timestamp: OffsetDateTime,
    /// The sensor values at that instant.
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub values: SensorSnapshot,
}

/// A closed time interval selected for a history query.
///
/// Both bounds are optional while the user is still filling in the
/// selection; [`TimeRange::bounds`] yields concrete endpoints only for
/// a complete, correctly ordered range.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TimeRange {
    /// Start of the interval, inclusive.
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339::option"))]
    pub from: Option<OffsetDateTime>,
    /// End of the interval, inclusive.
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339::option"))]
    pub to: Option<OffsetDateTime>,
}

impl TimeRange {
    /// Create a complete range.
    #[must_use]
    pub fn new(from: OffsetDateTime, to: OffsetDateTime) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
        }
    }

    /// The concrete `(from, to)` endpoints, if the range is complete
    /// and `from <= to`. An incomplete or inverted range yields
    /// `None`; callers treat that as "nothing to query", not a fault.
    #[must_use]
    pub fn bounds(&self) -> Option<(OffsetDateTime, OffsetDateTime)> {
        match (self.from, self.to) {
            (Some(from), Some(to)) if from <= to => Some((from, to)),
            _ => None,
        }
    }

    /// Whether the range can be queried.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.bounds().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_metric_wire_names() {
        assert_eq!(Metric::Temp.as_str(), "temp");
        assert_eq!(Metric::AccX.as_str(), "acc_x");
        assert_eq!(Metric::ALL.len(), 9);
    }

    #[test]
    fn test_status_ordering() {
        assert!(Status::Ok < Status::Warning);
        assert!(Status::Warning < Status::Danger);
        assert!(Status::Danger < Status::Alert);
        assert!(Status::Ok.is_nominal());
        assert!(!Status::Danger.is_nominal());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_status_serde_wire_names() {
        assert_eq!(serde_json::to_string(&Status::Ok).unwrap(), "\"ok\"");
        assert_eq!(serde_json::to_string(&Status::Alert).unwrap(), "\"alert\"");
        let status: Status = serde_json::from_str("\"danger\"").unwrap();
        assert_eq!(status, Status::Danger);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_snapshot_missing_fields_deserialize_as_none() {
        let snapshot: SensorSnapshot =
            serde_json::from_str(r#"{"temp": 21.5, "motion": true}"#).unwrap();
        assert_eq!(snapshot.temp, Some(21.5));
        assert_eq!(snapshot.motion, Some(true));
        assert_eq!(snapshot.hum, None);
        assert_eq!(snapshot.acc_z, None);
    }

    #[test]
    fn test_snapshot_value_accessor() {
        let snapshot = SensorSnapshot {
            soil: Some(340.0),
            motion: Some(true),
            ..Default::default()
        };
        assert_eq!(snapshot.value(Metric::Soil), Some(340.0));
        assert_eq!(snapshot.value(Metric::Motion), Some(1.0));
        assert_eq!(snapshot.value(Metric::Temp), None);
    }

    #[test]
    fn test_missing_fields() {
        let mut config = ThresholdConfig {
            name: Some("Tomatoes".to_string()),
            temp_min: Some(10.0),
            temp_max: Some(30.0),
            hum_min: Some(40.0),
            hum_max: Some(80.0),
            light_min: Some(200.0),
            light_max: Some(10_000.0),
            soil_min: Some(300.0),
            ..Default::default()
        };
        assert!(config.is_complete());
        assert!(config.missing_fields().is_empty());

        config.soil_min = None;
        config.name = Some(String::new());
        assert_eq!(config.missing_fields(), vec!["name", "soil_min"]);
    }

    #[test]
    fn test_time_range_bounds() {
        let t1 = datetime!(2025-06-01 00:00 UTC);
        let t2 = datetime!(2025-06-02 00:00 UTC);

        assert_eq!(TimeRange::new(t1, t2).bounds(), Some((t1, t2)));
        // Equal endpoints are a valid (instantaneous) range.
        assert!(TimeRange::new(t1, t1).is_valid());
        // Inverted range is not queryable.
        assert_eq!(TimeRange::new(t2, t1).bounds(), None);
        // Incomplete range is not queryable.
        let partial = TimeRange {
            from: Some(t1),
            to: None,
        };
        assert!(!partial.is_valid());
        assert!(!TimeRange::default().is_valid());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_history_point_flattened_wire_format() {
        let json = r#"{"timestamp": "2025-06-01T12:00:00Z", "temp": 23.0, "soil": 410.0}"#;
        let point: HistoryPoint = serde_json::from_str(json).unwrap();
        assert_eq!(point.timestamp, datetime!(2025-06-01 12:00 UTC));
        assert_eq!(point.values.temp, Some(23.0));
        assert_eq!(point.values.soil, Some(410.0));
        assert_eq!(point.values.light, None);
    }
}
