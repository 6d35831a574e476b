//! Core types for the trackstat pipeline
//!
//! This module defines the data model shared by the sampling pipeline, the
//! storage boundary and the statistic factories: data points, tracker
//! metadata, and the per-statistic configuration records.

use chrono::{DateTime, Duration, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::timehelper::Period;

/// Identity of a user-defined series producing data points.
pub type FeatureId = u64;

/// Identity of the tracker backing a feature.
pub type TrackerId = u64;

/// Identity of a stored graph or stat configuration.
pub type GraphStatId = u64;

/// One observation as it flows through the sampling pipeline.
///
/// For duration-typed features `value` is a count of seconds. Synthetic
/// padding points are of this shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub timestamp: DateTime<FixedOffset>,
    pub value: f64,
    pub label: String,
}

/// One stored observation row, as yielded by a storage cursor.
///
/// Carries the fields the pipeline itself does not need (the note text and
/// the owning feature) so that consumers of raw sampled points, such as a
/// notes overlay, can reach them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDataPoint {
    pub timestamp: DateTime<FixedOffset>,
    pub feature_id: FeatureId,
    pub value: f64,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub note: String,
}

impl RawDataPoint {
    pub fn as_data_point(&self) -> DataPoint {
        DataPoint {
            timestamp: self.timestamp,
            value: self.value,
            label: self.label.clone(),
        }
    }
}

/// Whether a tracker records plain numbers or durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackerValueKind {
    Numeric,
    Duration,
}

/// Metadata of the tracker backing a feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tracker {
    pub id: TrackerId,
    pub feature_id: FeatureId,
    pub name: String,
    pub value_kind: TrackerValueKind,
}

/// The statistic kinds this engine can compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphStatKind {
    TimeSinceLast,
    AverageTimeBetween,
    LineGraph,
    PieChart,
}

/// A stored graph or stat configuration header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphOrStat {
    pub id: GraphStatId,
    pub name: String,
    pub kind: GraphStatKind,
}

/// Configuration for a "time since last data point" statistic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSinceLastConfig {
    pub feature_id: FeatureId,
    #[serde(default)]
    pub filter_by_labels: bool,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub filter_by_range: bool,
    #[serde(default)]
    pub from_value: f64,
    #[serde(default)]
    pub to_value: f64,
}

/// Configuration for an "average time between data points" statistic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AverageTimeBetweenConfig {
    pub feature_id: FeatureId,
    #[serde(default)]
    pub filter_by_labels: bool,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub filter_by_range: bool,
    #[serde(default)]
    pub from_value: f64,
    #[serde(default)]
    pub to_value: f64,
    /// Length of the sampled window in seconds; absent means all data.
    #[serde(default)]
    pub window_seconds: Option<i64>,
    /// End of the sampled window; absent means the current instant.
    #[serde(default)]
    pub end_date: Option<DateTime<FixedOffset>>,
}

impl AverageTimeBetweenConfig {
    pub fn window(&self) -> Option<Duration> {
        self.window_seconds.map(Duration::seconds)
    }
}

/// Configuration for a pie chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PieChartConfig {
    pub feature_id: FeatureId,
    /// Length of the sampled window in seconds; absent means all data.
    #[serde(default)]
    pub window_seconds: Option<i64>,
    /// End of the sampled window; absent means the current instant.
    #[serde(default)]
    pub end_date: Option<DateTime<FixedOffset>>,
}

impl PieChartConfig {
    pub fn window(&self) -> Option<Duration> {
        self.window_seconds.map(Duration::seconds)
    }
}

/// One plotted feature within a line graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineGraphFeature {
    pub feature_id: FeatureId,
    pub name: String,
    /// Added to every plotted value after scaling.
    #[serde(default)]
    pub offset: f64,
    /// Multiplier applied to every plotted value.
    #[serde(default = "default_scale")]
    pub scale: f64,
    /// Moving-average window in seconds; absent plots raw values.
    #[serde(default)]
    pub averaging_seconds: Option<i64>,
    /// When set, values are totalled per period instead of plotted directly.
    #[serde(default)]
    pub plot_totals: Option<Period>,
}

impl LineGraphFeature {
    pub fn averaging(&self) -> Option<Duration> {
        self.averaging_seconds.map(Duration::seconds)
    }
}

fn default_scale() -> f64 {
    1.0
}

/// Configuration for a line graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineGraphConfig {
    pub features: Vec<LineGraphFeature>,
    /// Length of the plotted window in seconds; absent means all data.
    #[serde(default)]
    pub window_seconds: Option<i64>,
    /// End of the plotted window; absent means the current instant.
    #[serde(default)]
    pub end_date: Option<DateTime<FixedOffset>>,
    /// Fixed lower bound for the y axis; absent means fit to data.
    #[serde(default)]
    pub y_from: Option<f64>,
    /// Fixed upper bound for the y axis; absent means fit to data.
    #[serde(default)]
    pub y_to: Option<f64>,
}

impl LineGraphConfig {
    pub fn window(&self) -> Option<Duration> {
        self.window_seconds.map(Duration::seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn raw_point_converts_to_pipeline_point() {
        let raw = RawDataPoint {
            timestamp: "2024-03-15T08:00:00+00:00".parse().unwrap(),
            feature_id: 7,
            value: 2.5,
            label: "morning".to_string(),
            note: "slept badly".to_string(),
        };
        let point = raw.as_data_point();
        assert_eq!(point.timestamp, raw.timestamp);
        assert_eq!(point.value, 2.5);
        assert_eq!(point.label, "morning");
    }

    #[test]
    fn line_graph_feature_defaults() {
        let feature: LineGraphFeature =
            serde_json::from_str(r#"{"feature_id": 1, "name": "weight"}"#).unwrap();
        assert_eq!(feature.offset, 0.0);
        assert_eq!(feature.scale, 1.0);
        assert_eq!(feature.averaging(), None);
        assert_eq!(feature.plot_totals, None);
    }

    #[test]
    fn config_serde_round_trip() {
        let config = AverageTimeBetweenConfig {
            feature_id: 3,
            filter_by_labels: true,
            labels: vec!["a".to_string()],
            filter_by_range: false,
            from_value: 0.0,
            to_value: 0.0,
            window_seconds: Some(86_400 * 30),
            end_date: None,
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: AverageTimeBetweenConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
        assert_eq!(back.window(), Some(Duration::days(30)));
    }
}
