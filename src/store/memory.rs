//! In-memory data store
//!
//! A complete [`DataStore`] kept in process memory, backing the test suite and
//! the CLI's JSON datasets. Rows are held newest first, matching the delivery
//! order the pipeline expects from storage cursors. Cursor closes are counted
//! so disposal behavior can be observed from outside.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::error::StoreError;
use crate::store::{DataStore, PointCursor};
use crate::types::{
    AverageTimeBetweenConfig, FeatureId, GraphOrStat, GraphStatId, LineGraphConfig, PieChartConfig,
    RawDataPoint, TimeSinceLastConfig, Tracker, TrackerId,
};

#[derive(Default)]
struct State {
    trackers: Vec<Tracker>,
    points: HashMap<FeatureId, Vec<RawDataPoint>>,
    graph_stats: HashMap<GraphStatId, GraphOrStat>,
    time_since_last: HashMap<GraphStatId, TimeSinceLastConfig>,
    average_time_between: HashMap<GraphStatId, AverageTimeBetweenConfig>,
    line_graphs: HashMap<GraphStatId, LineGraphConfig>,
    pie_charts: HashMap<GraphStatId, PieChartConfig>,
}

/// In-memory [`DataStore`] implementation.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
    cursor_closes: Arc<AtomicUsize>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_tracker(&self, tracker: Tracker) {
        self.state().trackers.push(tracker);
    }

    /// Insert a row, keeping the feature's rows ordered newest first.
    pub fn insert_data_point(&self, point: RawDataPoint) {
        let mut state = self.state();
        let rows = state.points.entry(point.feature_id).or_default();
        let position = rows
            .iter()
            .position(|existing| existing.timestamp <= point.timestamp)
            .unwrap_or(rows.len());
        rows.insert(position, point);
    }

    pub fn insert_graph_stat(&self, graph_stat: GraphOrStat) {
        self.state().graph_stats.insert(graph_stat.id, graph_stat);
    }

    pub fn insert_time_since_last(&self, id: GraphStatId, config: TimeSinceLastConfig) {
        self.state().time_since_last.insert(id, config);
    }

    pub fn insert_average_time_between(&self, id: GraphStatId, config: AverageTimeBetweenConfig) {
        self.state().average_time_between.insert(id, config);
    }

    pub fn insert_line_graph(&self, id: GraphStatId, config: LineGraphConfig) {
        self.state().line_graphs.insert(id, config);
    }

    pub fn insert_pie_chart(&self, id: GraphStatId, config: PieChartConfig) {
        self.state().pie_charts.insert(id, config);
    }

    /// How many cursors have been closed so far.
    pub fn cursor_close_count(&self) -> usize {
        self.cursor_closes.load(Ordering::SeqCst)
    }

    fn state(&self) -> MutexGuard<'_, State> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl DataStore for InMemoryStore {
    async fn tracker_for_feature(
        &self,
        feature_id: FeatureId,
    ) -> Result<Option<Tracker>, StoreError> {
        Ok(self
            .state()
            .trackers
            .iter()
            .find(|t| t.feature_id == feature_id)
            .cloned())
    }

    async fn open_point_cursor(
        &self,
        feature_id: FeatureId,
    ) -> Result<Box<dyn PointCursor>, StoreError> {
        let rows = self
            .state()
            .points
            .get(&feature_id)
            .cloned()
            .unwrap_or_default();
        Ok(Box::new(MemoryCursor {
            rows: rows.into_iter(),
            closed: false,
            closes: Arc::clone(&self.cursor_closes),
        }))
    }

    async fn labels_for_tracker(&self, tracker_id: TrackerId) -> Result<Vec<String>, StoreError> {
        let state = self.state();
        let feature_id = match state.trackers.iter().find(|t| t.id == tracker_id) {
            Some(tracker) => tracker.feature_id,
            None => return Ok(Vec::new()),
        };
        let mut labels: Vec<String> = state
            .points
            .get(&feature_id)
            .map(|rows| rows.iter().map(|r| r.label.clone()).collect())
            .unwrap_or_default();
        labels.sort();
        labels.dedup();
        labels.retain(|label| !label.is_empty());
        Ok(labels)
    }

    async fn graph_stat(&self, id: GraphStatId) -> Result<Option<GraphOrStat>, StoreError> {
        Ok(self.state().graph_stats.get(&id).cloned())
    }

    async fn time_since_last_config(
        &self,
        id: GraphStatId,
    ) -> Result<Option<TimeSinceLastConfig>, StoreError> {
        Ok(self.state().time_since_last.get(&id).cloned())
    }

    async fn average_time_between_config(
        &self,
        id: GraphStatId,
    ) -> Result<Option<AverageTimeBetweenConfig>, StoreError> {
        Ok(self.state().average_time_between.get(&id).cloned())
    }

    async fn line_graph_config(
        &self,
        id: GraphStatId,
    ) -> Result<Option<LineGraphConfig>, StoreError> {
        Ok(self.state().line_graphs.get(&id).cloned())
    }

    async fn pie_chart_config(
        &self,
        id: GraphStatId,
    ) -> Result<Option<PieChartConfig>, StoreError> {
        Ok(self.state().pie_charts.get(&id).cloned())
    }
}

struct MemoryCursor {
    rows: std::vec::IntoIter<RawDataPoint>,
    closed: bool,
    closes: Arc<AtomicUsize>,
}

impl PointCursor for MemoryCursor {
    fn next_point(&mut self) -> Option<RawDataPoint> {
        if self.closed {
            return None;
        }
        self.rows.next()
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TrackerValueKind;
    use chrono::{DateTime, FixedOffset};
    use pretty_assertions::assert_eq;

    fn at(s: &str) -> DateTime<FixedOffset> {
        s.parse().unwrap()
    }

    fn row(feature_id: FeatureId, timestamp: &str, label: &str) -> RawDataPoint {
        RawDataPoint {
            timestamp: at(timestamp),
            feature_id,
            value: 1.0,
            label: label.to_string(),
            note: String::new(),
        }
    }

    #[tokio::test]
    async fn cursor_delivers_rows_newest_first() {
        let store = InMemoryStore::new();
        store.insert_data_point(row(1, "2024-03-10T08:00:00+00:00", "a"));
        store.insert_data_point(row(1, "2024-03-12T08:00:00+00:00", "b"));
        store.insert_data_point(row(1, "2024-03-11T08:00:00+00:00", "c"));

        let mut cursor = store.open_point_cursor(1).await.unwrap();
        let mut labels = Vec::new();
        while let Some(point) = cursor.next_point() {
            labels.push(point.label);
        }
        assert_eq!(labels, vec!["b", "c", "a"]);
    }

    #[tokio::test]
    async fn labels_are_distinct_sorted_and_non_empty() {
        let store = InMemoryStore::new();
        store.insert_tracker(Tracker {
            id: 10,
            feature_id: 1,
            name: "mood".to_string(),
            value_kind: TrackerValueKind::Numeric,
        });
        store.insert_data_point(row(1, "2024-03-10T08:00:00+00:00", "b"));
        store.insert_data_point(row(1, "2024-03-11T08:00:00+00:00", "a"));
        store.insert_data_point(row(1, "2024-03-12T08:00:00+00:00", "a"));
        store.insert_data_point(row(1, "2024-03-13T08:00:00+00:00", ""));

        let labels = store.labels_for_tracker(10).await.unwrap();
        assert_eq!(labels, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn closed_cursor_stops_yielding_and_counts_once() {
        let store = InMemoryStore::new();
        store.insert_data_point(row(1, "2024-03-10T08:00:00+00:00", "a"));
        store.insert_data_point(row(1, "2024-03-11T08:00:00+00:00", "b"));

        let mut cursor = store.open_point_cursor(1).await.unwrap();
        assert!(cursor.next_point().is_some());
        cursor.close();
        cursor.close();
        assert!(cursor.next_point().is_none());
        assert_eq!(store.cursor_close_count(), 1);
    }
}
