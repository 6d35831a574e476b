//! "Average time between data points" statistic

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::clock::Clock;
use crate::error::GraphStatError;
use crate::factories::common::{self, FactoryContext};
use crate::functions::{CompositeFunction, DataClippingFunction, DataSampleFunction};
use crate::sampling::RawPointObserver;
use crate::store::DataStore;
use crate::timehelper::TimeHelper;
use crate::types::{AverageTimeBetweenConfig, DataPoint, GraphOrStat};
use crate::viewdata::{AverageTimeBetweenData, ViewData};

/// Computes the mean gap between consecutive points in the sampled window.
pub struct AverageTimeBetweenFactory {
    context: FactoryContext,
}

impl AverageTimeBetweenFactory {
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

    /// Resolve the stat configuration from the store and compute.
    pub async fn create_view_data(
        &self,
        graph_stat: GraphOrStat,
        observer: RawPointObserver,
    ) -> ViewData {
        let config = match self
            .context
            .store
            .average_time_between_config(graph_stat.id)
            .await
        {
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
        config: &AverageTimeBetweenConfig,
        observer: RawPointObserver,
    ) -> ViewData {
        match self.compute(config, observer).await {
            Ok(average_millis) => ViewData::AverageTimeBetween(AverageTimeBetweenData {
                graph_stat,
                average_millis,
            }),
            Err(error) => {
                warn!(graph_stat_id = graph_stat.id, %error, "average time between computation failed");
                ViewData::error(graph_stat, error)
            }
        }
    }

    async fn compute(
        &self,
        config: &AverageTimeBetweenConfig,
        observer: RawPointObserver,
    ) -> Result<f64, GraphStatError> {
        let end_time = config
            .end_date
            .unwrap_or_else(|| self.context.clock.now());
        let sample = self
            .context
            .sampler
            .data_sample_for_feature(config.feature_id, Some(observer))
            .await?;
        let mut functions: Vec<Box<dyn DataSampleFunction>> =
            vec![Box::new(DataClippingFunction::new(end_time, config.window()))];
        functions.extend(common::filter_functions(
            config.filter_by_labels,
            &config.labels,
            config.filter_by_range,
            config.from_value,
            config.to_value,
        ));
        let mut sample = CompositeFunction::new(functions).map_sample(sample).await?;
        let points: Vec<DataPoint> = sample.by_ref().collect();
        sample.dispose();

        if points.len() < 2 {
            return Err(GraphStatError::NotEnoughData(points.len()));
        }
        // points are newest first
        let newest = points[0].timestamp;
        let oldest = points[points.len() - 1].timestamp;
        let total = newest.signed_duration_since(oldest);
        Ok(total.num_milliseconds() as f64 / (points.len() - 1) as f64)
    }
}
