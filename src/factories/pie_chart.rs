//! Pie chart computation

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::clock::Clock;
use crate::error::GraphStatError;
use crate::factories::common::FactoryContext;
use crate::functions::{DataClippingFunction, DataSampleFunction};
use crate::sampling::RawPointObserver;
use crate::store::DataStore;
use crate::timehelper::TimeHelper;
use crate::types::{GraphOrStat, PieChartConfig};
use crate::viewdata::{PieChartData, PieSegment, ViewData};

/// Computes one weighted segment per label over the sampled window.
pub struct PieChartFactory {
    context: FactoryContext,
}

impl PieChartFactory {
    pub fn new(store: Arc<dyn DataStore>, clock: Arc<dyn Clock>, time_helper: TimeHelper) -> Self {
        Self::with_cancellation(store, clock, time_helper, CancellationToken::new())
    }

    pub fn with_cancellation(
        store: Arc<dyn DataStore>,
        clock: Arc<dyn Clock>,
        time_helper: TimeHelper,
        cancellation: CancellationToken,
    ) -> Self {
        Self {
            context: FactoryContext::new(store, clock, time_helper, cancellation),
        }
    }

    /// Resolve the chart configuration from the store and compute.
    pub async fn create_view_data(
        &self,
        graph_stat: GraphOrStat,
        observer: RawPointObserver,
    ) -> ViewData {
        let config = match self.context.store.pie_chart_config(graph_stat.id).await {
            Ok(Some(config)) => config,
            Ok(None) => return ViewData::error(graph_stat, GraphStatError::GraphNotFound),
            Err(error) => return ViewData::error(graph_stat, error),
        };
        self.create_view_data_with_config(graph_stat, &config, observer)
            .await
    }

    pub async fn create_view_data_with_config(
        &self,
        graph_stat: GraphOrStat,
        config: &PieChartConfig,
        observer: RawPointObserver,
    ) -> ViewData {
        match self.compute(config, observer).await {
            Ok(segments) => ViewData::PieChart(PieChartData {
                graph_stat,
                segments,
            }),
            Err(error) => {
                warn!(graph_stat_id = graph_stat.id, %error, "pie chart computation failed");
                ViewData::error(graph_stat, error)
            }
        }
    }

    async fn compute(
        &self,
        config: &PieChartConfig,
        observer: RawPointObserver,
    ) -> Result<Vec<PieSegment>, GraphStatError> {
        let end_time = config
            .end_date
            .unwrap_or_else(|| self.context.clock.now());
        let sample = self
            .context
            .sampler
            .data_sample_for_feature(config.feature_id, Some(observer))
            .await?;
        let clip = DataClippingFunction::new(end_time, config.window());
        let mut sample = clip.map_sample(sample).await?;

        let mut totals: BTreeMap<String, f64> = BTreeMap::new();
        for point in sample.by_ref() {
            *totals.entry(point.label).or_insert(0.0) += point.value;
        }
        sample.dispose();

        if totals.is_empty() {
            return Err(GraphStatError::NotEnoughData(0));
        }
        let total: f64 = totals.values().sum();
        let mut segments: Vec<PieSegment> = totals
            .into_iter()
            .map(|(label, value)| PieSegment {
                label,
                value,
                percentage: if total != 0.0 {
                    value / total * 100.0
                } else {
                    0.0
                },
            })
            .collect();
        segments.sort_by(|a, b| {
            b.value
                .partial_cmp(&a.value)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::store::InMemoryStore;
    use crate::types::{GraphStatKind, RawDataPoint, Tracker, TrackerValueKind};
    use crate::viewdata::ViewDataState;
    use pretty_assertions::assert_eq;

    fn graph_stat() -> GraphOrStat {
        GraphOrStat {
            id: 4,
            name: "activity split".to_string(),
            kind: GraphStatKind::PieChart,
        }
    }

    fn store_with_labelled_points() -> Arc<InMemoryStore> {
        let store = Arc::new(InMemoryStore::new());
        store.insert_tracker(Tracker {
            id: 10,
            feature_id: 5,
            name: "exercise".to_string(),
            value_kind: TrackerValueKind::Numeric,
        });
        for (timestamp, value, label) in [
            ("2024-03-15T08:00:00+00:00", 3.0, "run"),
            ("2024-03-14T08:00:00+00:00", 1.0, "swim"),
            ("2024-03-13T08:00:00+00:00", 1.0, "run"),
            ("2024-03-01T08:00:00+00:00", 10.0, "row"),
        ] {
            store.insert_data_point(RawDataPoint {
                timestamp: timestamp.parse().unwrap(),
                feature_id: 5,
                value,
                label: label.to_string(),
                note: String::new(),
            });
        }
        store
    }

    fn factory(store: Arc<InMemoryStore>) -> PieChartFactory {
        let clock = Arc::new(FixedClock("2024-03-15T12:00:00+00:00".parse().unwrap()));
        PieChartFactory::new(store, clock, TimeHelper::utc())
    }

    #[tokio::test]
    async fn sums_values_per_label_within_the_window() {
        let store = store_with_labelled_points();
        let config = PieChartConfig {
            feature_id: 5,
            window_seconds: Some(7 * 86_400),
            end_date: None,
        };
        let view_data = factory(store)
            .create_view_data_with_config(graph_stat(), &config, Arc::new(|_| {}))
            .await;
        match view_data {
            ViewData::PieChart(data) => {
                // the row entry falls outside the window
                let segments: Vec<(String, f64, f64)> = data
                    .segments
                    .iter()
                    .map(|s| (s.label.clone(), s.value, s.percentage))
                    .collect();
                assert_eq!(
                    segments,
                    vec![
                        ("run".to_string(), 4.0, 80.0),
                        ("swim".to_string(), 1.0, 20.0),
                    ]
                );
            }
            other => panic!("expected ready pie chart, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_window_reports_not_enough_data() {
        let store = store_with_labelled_points();
        let config = PieChartConfig {
            feature_id: 5,
            window_seconds: Some(3600),
            end_date: Some("2023-01-01T00:00:00+00:00".parse().unwrap()),
        };
        let view_data = factory(store)
            .create_view_data_with_config(graph_stat(), &config, Arc::new(|_| {}))
            .await;
        assert_eq!(view_data.state(), ViewDataState::Error);
        assert_eq!(
            view_data.error_cause(),
            Some(&GraphStatError::NotEnoughData(0))
        );
    }

    #[tokio::test]
    async fn missing_config_reports_graph_not_found() {
        let store = Arc::new(InMemoryStore::new());
        let view_data = factory(store)
            .create_view_data(graph_stat(), Arc::new(|_| {}))
            .await;
        assert_eq!(
            view_data.error_cause(),
            Some(&GraphStatError::GraphNotFound)
        );
    }
}
