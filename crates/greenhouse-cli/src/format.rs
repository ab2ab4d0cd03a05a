//! Output formatting for text and JSON output.

use anyhow::Result;
use owo_colors::OwoColorize;
use serde::Serialize;
use time::format_description::well_known::Rfc3339;

use greenhouse_core::history::{ChartSeries, TRACKED_METRICS};
use greenhouse_core::live::LiveView;
use greenhouse_types::{Metric, SensorSnapshot, Status, ThresholdConfig};

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable tables.
    Text,
    /// Machine-readable JSON.
    Json,
}

/// Formatting options for output.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatOptions {
    /// Disable colored output.
    pub no_color: bool,
    /// Use compact JSON output (no pretty-printing).
    pub compact: bool,
}

impl FormatOptions {
    pub fn new(no_color: bool) -> Self {
        Self {
            no_color,
            compact: false,
        }
    }

    /// Serialize value to JSON string, respecting the compact option.
    pub fn as_json<T: Serialize>(&self, value: &T) -> Result<String> {
        let json = if self.compact {
            serde_json::to_string(value)?
        } else {
            serde_json::to_string_pretty(value)?
        };
        Ok(json + "\n")
    }
}

/// Format a threshold status with color.
#[must_use]
pub fn format_status(status: Status, no_color: bool) -> String {
    let label = match status {
        Status::Ok => "OK",
        Status::Warning => "WARNING",
        Status::Danger => "DANGER",
        Status::Alert => "ALERT",
    };

    if no_color {
        format!("[{}]", label)
    } else {
        match status {
            Status::Ok => format!("[{}]", label.green()),
            Status::Warning => format!("[{}]", label.yellow()),
            Status::Danger => format!("[{}]", label.red()),
            Status::Alert => format!("[{}]", label.magenta()),
        }
    }
}

/// Format a metric reading for display. Absent values show as "N/A".
#[must_use]
pub fn format_metric_value(snapshot: &SensorSnapshot, metric: Metric) -> String {
    if metric == Metric::Motion {
        return match snapshot.motion {
            Some(true) => "detected".to_string(),
            Some(false) => "none".to_string(),
            None => "N/A".to_string(),
        };
    }
    match snapshot.value(metric) {
        Some(value) => match metric.unit() {
            Some(unit) => format!("{:.1} {}", value, unit),
            None => format!("{:.1}", value),
        },
        None => "N/A".to_string(),
    }
}

// ============================================================================
// Live view formatting
// ============================================================================

#[must_use]
pub fn format_live_text(view: &LiveView, opts: &FormatOptions) -> String {
    let mut output = String::new();

    let title = view.settings.name.as_deref().unwrap_or("Greenhouse");
    if opts.no_color {
        output.push_str(&format!("{}\n\n", title));
    } else {
        output.push_str(&format!("{}\n\n", title.cyan().bold()));
    }

    let Some(snapshot) = view.snapshot else {
        output.push_str("No readings available yet.\n");
        return output;
    };

    for metric in Metric::ALL {
        let value = format_metric_value(&snapshot, metric);
        let status = view
            .status
            .get(&metric)
            .map(|s| format_status(*s, opts.no_color))
            .unwrap_or_default();
        output.push_str(&format!("{:<14} {:>14}  {}\n", format!("{}:", metric.label()), value, status));
    }

    output
}

pub fn format_live_json(view: &LiveView, opts: &FormatOptions) -> Result<String> {
    #[derive(Serialize)]
    struct MetricJson {
        metric: &'static str,
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        unit: Option<&'static str>,
        #[serde(skip_serializing_if = "Option::is_none")]
        status: Option<Status>,
    }

    #[derive(Serialize)]
    struct LiveJson<'a> {
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<&'a str>,
        has_readings: bool,
        metrics: Vec<MetricJson>,
    }

    let metrics = view
        .snapshot
        .map(|snapshot| {
            Metric::ALL
                .iter()
                .map(|&metric| MetricJson {
                    metric: metric.as_str(),
                    value: snapshot.value(metric),
                    unit: metric.unit(),
                    status: view.status.get(&metric).copied(),
                })
                .collect()
        })
        .unwrap_or_default();

    let json = LiveJson {
        name: view.settings.name.as_deref(),
        has_readings: view.snapshot.is_some(),
        metrics,
    };

    opts.as_json(&json)
}

// ============================================================================
// History formatting
// ============================================================================

#[must_use]
pub fn format_history_text(series: &ChartSeries, opts: &FormatOptions) -> String {
    if series.is_empty() {
        return "No readings in the selected range.\n".to_string();
    }

    const MAX_ROWS: usize = 20;

    let count_display = if opts.no_color {
        series.len().to_string()
    } else {
        format!("{}", series.len().green().bold())
    };
    let mut output = format!("History ({} readings):\n\n", count_display);
    output.push_str(&format!(
        "{:<22} {:>10} {:>10} {:>10} {:>10}\n",
        "Timestamp", "Temp", "Hum", "Light", "Soil"
    ));

    for i in 0..series.len().min(MAX_ROWS) {
        let ts = series.timestamps[i]
            .format(&Rfc3339)
            .unwrap_or_else(|_| "Unknown".to_string());
        output.push_str(&format!("{:<22}", ts));
        for metric in TRACKED_METRICS {
            let cell = series
                .values(metric)
                .and_then(|values| values[i])
                .map(|v| format!("{:.1}", v))
                .unwrap_or_else(|| "-".to_string());
            output.push_str(&format!(" {:>10}", cell));
        }
        output.push('\n');
    }

    if series.len() > MAX_ROWS {
        output.push_str(&format!("... and {} more readings\n", series.len() - MAX_ROWS));
        output.push_str("(Use --format json for full data)\n");
    }

    output
}

pub fn format_history_json(series: &ChartSeries, opts: &FormatOptions) -> Result<String> {
    #[derive(Serialize)]
    struct SeriesJson {
        count: usize,
        timestamps: Vec<String>,
        temp: Vec<Option<f64>>,
        hum: Vec<Option<f64>>,
        light: Vec<Option<f64>>,
        soil: Vec<Option<f64>>,
    }

    let timestamps = series
        .timestamps
        .iter()
        .map(|ts| ts.format(&Rfc3339).unwrap_or_default())
        .collect();

    let json = SeriesJson {
        count: series.len(),
        timestamps,
        temp: series.temp.clone(),
        hum: series.hum.clone(),
        light: series.light.clone(),
        soil: series.soil.clone(),
    };

    opts.as_json(&json)
}

// ============================================================================
// Settings formatting
// ============================================================================

#[must_use]
pub fn format_settings_text(config: &ThresholdConfig, opts: &FormatOptions) -> String {
    let field = |value: Option<f64>| {
        value
            .map(|v| format!("{}", v))
            .unwrap_or_else(|| "(unset)".to_string())
    };

    let name = config.name.as_deref().unwrap_or("(unset)");
    let name_display = if opts.no_color {
        name.to_string()
    } else {
        format!("{}", name.cyan())
    };

    let mut output = format!("Name:        {}\n", name_display);
    output.push_str(&format!("Temperature: {} .. {} °C\n", field(config.temp_min), field(config.temp_max)));
    output.push_str(&format!("Humidity:    {} .. {} %\n", field(config.hum_min), field(config.hum_max)));
    output.push_str(&format!("Light:       {} .. {} lx\n", field(config.light_min), field(config.light_max)));
    output.push_str(&format!("Soil min:    {}\n", field(config.soil_min)));

    let missing = config.missing_fields();
    if !missing.is_empty() {
        output.push_str(&format!("\nIncomplete: missing {}\n", missing.join(", ")));
    }

    output
}

pub fn format_settings_json(config: &ThresholdConfig, opts: &FormatOptions) -> Result<String> {
    opts.as_json(config)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use greenhouse_core::thresholds::evaluate;
    use time::macros::datetime;

    fn test_opts() -> FormatOptions {
        FormatOptions {
            no_color: true,
            compact: false,
        }
    }

    fn complete_config() -> ThresholdConfig {
        ThresholdConfig {
            name: Some("Tomatoes".to_string()),
            temp_min: Some(10.0),
            temp_max: Some(30.0),
            hum_min: Some(40.0),
            hum_max: Some(80.0),
            light_min: Some(200.0),
            light_max: Some(10_000.0),
            soil_min: Some(300.0),
            ..Default::default()
        }
    }

    fn make_view() -> LiveView {
        let snapshot = SensorSnapshot {
            temp: Some(35.0),
            hum: Some(55.0),
            motion: Some(true),
            ..Default::default()
        };
        let settings = complete_config();
        let status = evaluate(Some(&snapshot), Some(&settings));
        LiveView {
            snapshot: Some(snapshot),
            settings,
            status,
        }
    }

    #[test]
    fn test_format_status_no_color() {
        assert_eq!(format_status(Status::Ok, true), "[OK]");
        assert_eq!(format_status(Status::Danger, true), "[DANGER]");
    }

    #[test]
    fn test_format_status_with_color_contains_label() {
        assert!(format_status(Status::Warning, false).contains("WARNING"));
        assert!(format_status(Status::Alert, false).contains("ALERT"));
    }

    #[test]
    fn test_format_metric_value() {
        let snapshot = SensorSnapshot {
            temp: Some(21.52),
            motion: Some(false),
            ..Default::default()
        };
        assert_eq!(format_metric_value(&snapshot, Metric::Temp), "21.5 °C");
        assert_eq!(format_metric_value(&snapshot, Metric::Motion), "none");
        assert_eq!(format_metric_value(&snapshot, Metric::Hum), "N/A");
    }

    #[test]
    fn test_format_live_text() {
        let result = format_live_text(&make_view(), &test_opts());
        assert!(result.contains("Tomatoes"));
        assert!(result.contains("35.0 °C"));
        assert!(result.contains("[DANGER]"));
        assert!(result.contains("detected"));
        assert!(result.contains("[ALERT]"));
        assert!(result.contains("N/A"));
    }

    #[test]
    fn test_format_live_text_without_readings() {
        let mut view = make_view();
        view.snapshot = None;
        view.status.clear();
        let result = format_live_text(&view, &test_opts());
        assert!(result.contains("No readings available yet."));
    }

    #[test]
    fn test_format_live_json_structure() {
        let result = format_live_json(&make_view(), &test_opts()).unwrap();
        assert!(result.contains("\"name\": \"Tomatoes\""));
        assert!(result.contains("\"metric\": \"temp\""));
        assert!(result.contains("\"status\": \"danger\""));
        assert!(result.contains("\"has_readings\": true"));
    }

    #[test]
    fn test_format_history_text_empty() {
        let result = format_history_text(&ChartSeries::default(), &test_opts());
        assert_eq!(result, "No readings in the selected range.\n");
    }

    #[test]
    fn test_format_history_text_rows() {
        let series = ChartSeries {
            timestamps: vec![datetime!(2025-06-01 12:00 UTC)],
            temp: vec![Some(21.0)],
            hum: vec![None],
            light: vec![Some(800.0)],
            soil: vec![Some(410.0)],
        };
        let result = format_history_text(&series, &test_opts());
        assert!(result.contains("History (1 readings)"));
        assert!(result.contains("2025-06-01T12:00:00Z"));
        assert!(result.contains("21.0"));
        assert!(result.contains("-"));
    }

    #[test]
    fn test_format_history_json_structure() {
        let series = ChartSeries {
            timestamps: vec![datetime!(2025-06-01 12:00 UTC)],
            temp: vec![Some(21.0)],
            hum: vec![Some(50.0)],
            light: vec![None],
            soil: vec![None],
        };
        let result = format_history_json(&series, &test_opts()).unwrap();
        assert!(result.contains("\"count\": 1"));
        assert!(result.contains("\"2025-06-01T12:00:00Z\""));
    }

    #[test]
    fn test_format_settings_text_flags_missing_fields() {
        let mut config = complete_config();
        config.soil_min = None;
        let result = format_settings_text(&config, &test_opts());
        assert!(result.contains("Tomatoes"));
        assert!(result.contains("10 .. 30 °C"));
        assert!(result.contains("missing soil_min"));
    }
}
