//! Storage boundary consumed by the sampling pipeline
//!
//! The pipeline never owns persistence: it reads tracker metadata, point
//! cursors and stat configurations through the [`DataStore`] trait and leaves
//! schema and query concerns to the implementation behind it. An in-memory
//! implementation is provided for tests and the CLI.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::types::{
    AverageTimeBetweenConfig, FeatureId, GraphOrStat, GraphStatId, LineGraphConfig, PieChartConfig,
    RawDataPoint, TimeSinceLastConfig, Tracker, TrackerId,
};

mod memory;

pub use memory::InMemoryStore;

/// A disposable read cursor over one feature's stored rows, newest first.
///
/// Cursors hold backing resources until closed; the sampling layer guarantees
/// `close` runs on every exit path, including early abandonment.
pub trait PointCursor: Send {
    /// Pull the next row, or `None` once exhausted.
    fn next_point(&mut self) -> Option<RawDataPoint>;

    /// Release backing resources. Called at most once by the pipeline.
    fn close(&mut self);
}

/// Read-side storage operations the pipeline depends on.
///
/// Implementations must allow concurrent read cursors; the pipeline runs
/// multiple statistic computations at once against the same store.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Tracker metadata for a feature, or `None` when the feature is not
    /// backed by a raw tracked series.
    async fn tracker_for_feature(
        &self,
        feature_id: FeatureId,
    ) -> Result<Option<Tracker>, StoreError>;

    /// Open a fresh cursor over the feature's rows, newest first.
    async fn open_point_cursor(
        &self,
        feature_id: FeatureId,
    ) -> Result<Box<dyn PointCursor>, StoreError>;

    /// Distinct labels recorded against a tracker, without reading point rows.
    async fn labels_for_tracker(&self, tracker_id: TrackerId) -> Result<Vec<String>, StoreError>;

    async fn graph_stat(&self, id: GraphStatId) -> Result<Option<GraphOrStat>, StoreError>;

    async fn time_since_last_config(
        &self,
        id: GraphStatId,
    ) -> Result<Option<TimeSinceLastConfig>, StoreError>;

    async fn average_time_between_config(
        &self,
        id: GraphStatId,
    ) -> Result<Option<AverageTimeBetweenConfig>, StoreError>;

    async fn line_graph_config(&self, id: GraphStatId)
        -> Result<Option<LineGraphConfig>, StoreError>;

    async fn pie_chart_config(&self, id: GraphStatId)
        -> Result<Option<PieChartConfig>, StoreError>;
}
