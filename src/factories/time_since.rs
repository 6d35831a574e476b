//! "Time since last data point" statistic

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::clock::Clock;
use crate::error::GraphStatError;
use crate::factories::common::{self, FactoryContext};
use crate::sampling::RawPointObserver;
use crate::store::DataStore;
use crate::timehelper::TimeHelper;
use crate::types::{GraphOrStat, TimeSinceLastConfig};
use crate::viewdata::{TimeSinceLastData, ViewData};

/// Computes the newest data point surviving the configured filters.
pub struct TimeSinceLastFactory {
    context: FactoryContext,
}

impl TimeSinceLastFactory {
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
        let config = match self.context.store.time_since_last_config(graph_stat.id).await {
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
        config: &TimeSinceLastConfig,
        observer: RawPointObserver,
    ) -> ViewData {
        match self.compute(config, observer).await {
            Ok(last_point) => ViewData::TimeSinceLast(TimeSinceLastData {
                graph_stat,
                last_point,
            }),
            Err(error) => {
                warn!(graph_stat_id = graph_stat.id, %error, "time since last computation failed");
                ViewData::error(graph_stat, error)
            }
        }
    }

    async fn compute(
        &self,
        config: &TimeSinceLastConfig,
        observer: RawPointObserver,
    ) -> Result<crate::types::RawDataPoint, GraphStatError> {
        let functions = common::filter_functions(
            config.filter_by_labels,
            &config.labels,
            config.filter_by_range,
            config.from_value,
            config.to_value,
        );
        common::last_filtered_point(&self.context, config.feature_id, functions, observer)
            .await?
            .ok_or(GraphStatError::NotEnoughData(0))
    }
}
