//! Threshold evaluation of sensor snapshots.
//!
//! This module classifies each metric of a [`SensorSnapshot`] against
//! a [`ThresholdConfig`] into an actionable [`Status`].
//!
//! Evaluation is a pure function: identical inputs always produce an
//! identical [`StatusMap`], and the map is always recomputed wholesale
//! rather than patched.
//!
//! # Example
//!
//! ```
//! use greenhouse_core::thresholds::evaluate;
//! use greenhouse_types::{Metric, SensorSnapshot, Status, ThresholdConfig};
//!
//! let snapshot = SensorSnapshot { temp: Some(35.0), ..Default::default() };
//! let config = ThresholdConfig { temp_max: Some(30.0), ..Default::default() };
//!
//! let status = evaluate(Some(&snapshot), Some(&config));
//! assert_eq!(status[&Metric::Temp], Status::Danger);
//! ```

use greenhouse_types::{Metric, SensorSnapshot, Status, StatusMap, ThresholdConfig};

/// Width of the soil moisture dead band above `soil_min`: readings in
/// `(soil_min, soil_min + SOIL_DEAD_BAND]` are a warning, not ok.
const SOIL_DEAD_BAND: f64 = 100.0;

/// `true` when both operands are present and the value is below the
/// bound. A missing value or bound is "no violation".
fn below(value: Option<f64>, bound: Option<f64>) -> bool {
    matches!((value, bound), (Some(v), Some(b)) if v < b)
}

/// `true` when both operands are present and the value is above the
/// bound. A missing value or bound is "no violation".
fn above(value: Option<f64>, bound: Option<f64>) -> bool {
    matches!((value, bound), (Some(v), Some(b)) if v > b)
}

/// Classify every metric of a snapshot against a configuration.
///
/// If either argument is absent there is nothing to classify and the
/// result is empty; callers treat missing keys as "unknown" for
/// display. Otherwise the result contains exactly the keys of
/// [`Metric::ALL`], with these rules:
///
/// - `temp`: `danger` outside `[temp_min, temp_max]`, else `ok`.
/// - `hum`: `warning` outside `[hum_min, hum_max]`, else `ok`.
/// - `soil`: `danger` below `soil_min`; `ok` above
///   `soil_min + 100`; `warning` in the dead band between.
/// - `light`: `warning` outside `[light_min, light_max]`, else `ok`.
/// - `motion`: `alert` when detected, else `ok`.
/// - `dist`, `acc_x`, `acc_y`, `acc_z`: always `ok` (reserved for
///   future thresholds, but never omitted from the output).
///
/// Comparisons involving a missing value or a missing bound count as
/// "no violation", so partially configured thresholds degrade to `ok`
/// rather than producing nondeterministic results.
#[must_use]
pub fn evaluate(
    snapshot: Option<&SensorSnapshot>,
    config: Option<&ThresholdConfig>,
) -> StatusMap {
    let mut map = StatusMap::new();
    let (Some(s), Some(c)) = (snapshot, config) else {
        return map;
    };

    for metric in Metric::ALL {
        let status = match metric {
            Metric::Temp => {
                if above(s.temp, c.temp_max) || below(s.temp, c.temp_min) {
                    Status::Danger
                } else {
                    Status::Ok
                }
            }
            Metric::Hum => {
                if below(s.hum, c.hum_min) || above(s.hum, c.hum_max) {
                    Status::Warning
                } else {
                    Status::Ok
                }
            }
            Metric::Soil => {
                if below(s.soil, c.soil_min) {
                    Status::Danger
                } else if above(s.soil, c.soil_min.map(|min| min + SOIL_DEAD_BAND)) {
                    Status::Ok
                } else if s.soil.is_some() && c.soil_min.is_some() {
                    Status::Warning
                } else {
                    Status::Ok
                }
            }
            Metric::Light => {
                if below(s.light, c.light_min) || above(s.light, c.light_max) {
                    Status::Warning
                } else {
                    Status::Ok
                }
            }
            Metric::Motion => {
                if s.motion == Some(true) {
                    Status::Alert
                } else {
                    Status::Ok
                }
            }
            // Reserved: no thresholds defined for these yet.
            Metric::Dist | Metric::AccX | Metric::AccY | Metric::AccZ => Status::Ok,
            // `Metric` is `#[non_exhaustive]`; unreachable for `Metric::ALL`.
            _ => Status::Ok,
        };
        map.insert(metric, status);
    }

    map
}
