//! Renderable results for graph and stat computations
//!
//! One [`ViewData`] variant per statistic kind plus the common loading and
//! error states, exhaustively matchable by the presentation layer and
//! consumable without further I/O. A view data is immutable once
//! constructed; a new computation produces a new value rather than patching
//! the old one.

use chrono::{DateTime, FixedOffset};

use crate::error::GraphStatError;
use crate::types::{GraphOrStat, RawDataPoint};

/// The lifecycle state a view data is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewDataState {
    Loading,
    Ready,
    Error,
}

/// The computed, renderable result (or typed failure) for one statistic
/// configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewData {
    /// Computation still running; a placeholder for the presentation layer.
    Loading { graph_stat: GraphOrStat },
    TimeSinceLast(TimeSinceLastData),
    AverageTimeBetween(AverageTimeBetweenData),
    LineGraph(LineGraphData),
    PieChart(PieChartData),
    Error {
        graph_stat: GraphOrStat,
        error: GraphStatError,
    },
}

impl ViewData {
    pub fn loading(graph_stat: GraphOrStat) -> Self {
        ViewData::Loading { graph_stat }
    }

    pub fn error(graph_stat: GraphOrStat, error: impl Into<GraphStatError>) -> Self {
        ViewData::Error {
            graph_stat,
            error: error.into(),
        }
    }

    pub fn state(&self) -> ViewDataState {
        match self {
            ViewData::Loading { .. } => ViewDataState::Loading,
            ViewData::Error { .. } => ViewDataState::Error,
            _ => ViewDataState::Ready,
        }
    }

    pub fn graph_stat(&self) -> &GraphOrStat {
        match self {
            ViewData::Loading { graph_stat } => graph_stat,
            ViewData::TimeSinceLast(data) => &data.graph_stat,
            ViewData::AverageTimeBetween(data) => &data.graph_stat,
            ViewData::LineGraph(data) => &data.graph_stat,
            ViewData::PieChart(data) => &data.graph_stat,
            ViewData::Error { graph_stat, .. } => graph_stat,
        }
    }

    /// The failure cause, for error states.
    pub fn error_cause(&self) -> Option<&GraphStatError> {
        match self {
            ViewData::Error { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Payload of a ready "time since last data point" statistic.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSinceLastData {
    pub graph_stat: GraphOrStat,
    /// The newest surviving row, with its note for the overlay.
    pub last_point: RawDataPoint,
}

/// Payload of a ready "average time between data points" statistic.
#[derive(Debug, Clone, PartialEq)]
pub struct AverageTimeBetweenData {
    pub graph_stat: GraphOrStat,
    /// Mean gap between consecutive points, in milliseconds.
    pub average_millis: f64,
}

/// One plotted point of a line graph series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlottedPoint {
    pub timestamp: DateTime<FixedOffset>,
    pub value: f64,
}

/// One named line of a line graph, points in ascending render order.
#[derive(Debug, Clone, PartialEq)]
pub struct PlottedSeries {
    pub name: String,
    pub points: Vec<PlottedPoint>,
}

/// Payload of a ready line graph.
#[derive(Debug, Clone, PartialEq)]
pub struct LineGraphData {
    pub graph_stat: GraphOrStat,
    pub series: Vec<PlottedSeries>,
    /// Plotted y bounds, after any configured overrides.
    pub y_range: (f64, f64),
    /// Whether values count seconds and should be rendered as durations.
    pub duration_based_range: bool,
    /// The resolved end of the plotted window.
    pub end_time: DateTime<FixedOffset>,
}

/// One weighted slice of a pie chart.
#[derive(Debug, Clone, PartialEq)]
pub struct PieSegment {
    pub label: String,
    pub value: f64,
    pub percentage: f64,
}

/// Payload of a ready pie chart.
#[derive(Debug, Clone, PartialEq)]
pub struct PieChartData {
    pub graph_stat: GraphOrStat,
    /// Slices in descending weight order.
    pub segments: Vec<PieSegment>,
}
