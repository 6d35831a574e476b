//! Boundary adapter producing data samples from storage
//!
//! The sampler resolves tracker metadata and opens point cursors through the
//! [`DataStore`] trait, wrapping them into fresh [`DataSample`]s. Metadata
//! reads never touch point rows. Features that no tracker backs degrade to an
//! empty, already-satisfied sample; derived/computed features are a future
//! second producer behind the same sample boundary.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::StoreError;
use crate::sampling::cursor::{CursorPoints, RawPointObserver};
use crate::sampling::data_sample::{DataSample, DataSampleProperties};
use crate::store::DataStore;
use crate::types::{FeatureId, TrackerValueKind};

pub struct DataSampler {
    store: Arc<dyn DataStore>,
    cancellation: CancellationToken,
}

impl DataSampler {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self::with_cancellation(store, CancellationToken::new())
    }

    /// Sampler whose cursors stop pulling once `cancellation` fires.
    pub fn with_cancellation(store: Arc<dyn DataStore>, cancellation: CancellationToken) -> Self {
        Self {
            store,
            cancellation,
        }
    }

    /// Open a fresh sample over the feature's stored rows, newest first.
    ///
    /// Rows pulled through the sample are reported to `observer` as they
    /// stream through. The returned sample owns the storage cursor and
    /// releases it on disposal or drop.
    pub async fn data_sample_for_feature(
        &self,
        feature_id: FeatureId,
        observer: Option<RawPointObserver>,
    ) -> Result<DataSample, StoreError> {
        let tracker = match self.store.tracker_for_feature(feature_id).await? {
            Some(tracker) => tracker,
            None => {
                debug!(feature_id, "no tracker backs feature, returning empty sample");
                return Ok(DataSample::empty());
            }
        };
        let cursor = self.store.open_point_cursor(feature_id).await?;
        let points = CursorPoints::new(cursor, self.cancellation.clone(), observer);
        let raw_points = points.raw_points_accessor();
        let disposer = points.disposer();
        Ok(DataSample::from_sequence(
            points,
            DataSampleProperties {
                regularity: None,
                is_duration: tracker.value_kind == TrackerValueKind::Duration,
            },
            raw_points,
            Some(disposer),
        ))
    }

    /// Distinct labels recorded for the feature. Metadata-only.
    pub async fn labels_for_feature(&self, feature_id: FeatureId) -> Result<Vec<String>, StoreError> {
        match self.store.tracker_for_feature(feature_id).await? {
            Some(tracker) => self.store.labels_for_tracker(tracker.id).await,
            None => Ok(Vec::new()),
        }
    }

    /// Sampling properties of the feature's data, without opening a cursor.
    pub async fn sample_properties_for_feature(
        &self,
        feature_id: FeatureId,
    ) -> Result<Option<DataSampleProperties>, StoreError> {
        Ok(self
            .store
            .tracker_for_feature(feature_id)
            .await?
            .map(|tracker| DataSampleProperties {
                regularity: None,
                is_duration: tracker.value_kind == TrackerValueKind::Duration,
            }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use crate::types::{RawDataPoint, Tracker};
    use pretty_assertions::assert_eq;

    fn store_with_tracker(kind: TrackerValueKind) -> InMemoryStore {
        let store = InMemoryStore::new();
        store.insert_tracker(Tracker {
            id: 10,
            feature_id: 1,
            name: "meditation".to_string(),
            value_kind: kind,
        });
        store
    }

    fn row(timestamp: &str, value: f64, label: &str) -> RawDataPoint {
        RawDataPoint {
            timestamp: timestamp.parse().unwrap(),
            feature_id: 1,
            value,
            label: label.to_string(),
            note: String::new(),
        }
    }

    #[tokio::test]
    async fn unknown_feature_yields_empty_satisfied_sample() {
        let store = Arc::new(InMemoryStore::new());
        let sampler = DataSampler::new(Arc::clone(&store) as Arc<dyn DataStore>);
        let mut sample = sampler.data_sample_for_feature(99, None).await.unwrap();
        assert!(sample.next().is_none());
        sample.dispose();
        assert_eq!(store.cursor_close_count(), 0);
    }

    #[tokio::test]
    async fn duration_trackers_tag_sample_properties() {
        let store = Arc::new(store_with_tracker(TrackerValueKind::Duration));
        let sampler = DataSampler::new(Arc::clone(&store) as Arc<dyn DataStore>);
        let sample = sampler.data_sample_for_feature(1, None).await.unwrap();
        assert!(sample.properties().is_duration);
        assert_eq!(sample.properties().regularity, None);

        let properties = sampler.sample_properties_for_feature(1).await.unwrap();
        assert_eq!(properties, Some(sample.properties()));
        // metadata reads never open a cursor
        drop(sample);
        assert_eq!(store.cursor_close_count(), 1);
    }

    #[tokio::test]
    async fn sample_pulls_rows_and_releases_cursor_on_drop() {
        let store = Arc::new(store_with_tracker(TrackerValueKind::Numeric));
        store.insert_data_point(row("2024-03-15T08:00:00+00:00", 1.0, "a"));
        store.insert_data_point(row("2024-03-14T08:00:00+00:00", 2.0, "b"));
        let sampler = DataSampler::new(Arc::clone(&store) as Arc<dyn DataStore>);

        let mut sample = sampler.data_sample_for_feature(1, None).await.unwrap();
        assert_eq!(sample.next().map(|p| p.value), Some(1.0));
        assert_eq!(sample.raw_data_points().len(), 1);
        drop(sample);
        assert_eq!(store.cursor_close_count(), 1);
    }

    #[tokio::test]
    async fn labels_resolve_through_tracker() {
        let store = Arc::new(store_with_tracker(TrackerValueKind::Numeric));
        store.insert_data_point(row("2024-03-15T08:00:00+00:00", 1.0, "evening"));
        store.insert_data_point(row("2024-03-14T08:00:00+00:00", 2.0, "morning"));
        let sampler = DataSampler::new(Arc::clone(&store) as Arc<dyn DataStore>);

        let labels = sampler.labels_for_feature(1).await.unwrap();
        assert_eq!(labels, vec!["evening", "morning"]);
        assert!(sampler.labels_for_feature(42).await.unwrap().is_empty());
        assert_eq!(store.cursor_close_count(), 0);
    }
}
