//! Line graph computation

use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::clock::Clock;
use crate::error::GraphStatError;
use crate::factories::common::FactoryContext;
use crate::functions::{
    Aggregation, CompositeFunction, DataClippingFunction, DataPaddingFunction, DataSampleFunction,
    MovingAverageFunction, PeriodAggregationFunction,
};
use crate::sampling::RawPointObserver;
use crate::store::DataStore;
use crate::timehelper::TimeHelper;
use crate::types::{GraphOrStat, LineGraphConfig, LineGraphFeature};
use crate::viewdata::{LineGraphData, PlottedPoint, PlottedSeries, ViewData};

/// Computes one plotted series per configured feature.
///
/// Each feature's sample is clipped to the plotted window, then either
/// totalled per period and padded across the window (plot totals) or moving
/// averaged, and finally scaled and offset.
pub struct LineGraphFactory {
    context: FactoryContext,
}

impl LineGraphFactory {
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

    /// Resolve the graph configuration from the store and compute.
    pub async fn create_view_data(
        &self,
        graph_stat: GraphOrStat,
        observer: RawPointObserver,
    ) -> ViewData {
        let config = match self.context.store.line_graph_config(graph_stat.id).await {
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
        config: &LineGraphConfig,
        observer: RawPointObserver,
    ) -> ViewData {
        match self.compute(config, observer).await {
            Ok((series, y_range, duration_based_range, end_time)) => {
                ViewData::LineGraph(LineGraphData {
                    graph_stat,
                    series,
                    y_range,
                    duration_based_range,
                    end_time,
                })
            }
            Err(error) => {
                warn!(graph_stat_id = graph_stat.id, %error, "line graph computation failed");
                ViewData::error(graph_stat, error)
            }
        }
    }

    async fn compute(
        &self,
        config: &LineGraphConfig,
        observer: RawPointObserver,
    ) -> Result<
        (
            Vec<PlottedSeries>,
            (f64, f64),
            bool,
            DateTime<FixedOffset>,
        ),
        GraphStatError,
    > {
        let end_time = config
            .end_date
            .unwrap_or_else(|| self.context.clock.now());
        let mut series = Vec::with_capacity(config.features.len());
        let mut duration_based_range = false;

        for feature in &config.features {
            let sample = self
                .context
                .sampler
                .data_sample_for_feature(feature.feature_id, Some(Arc::clone(&observer)))
                .await?;
            let functions = self.feature_functions(feature, config, end_time);
            let mut sample = CompositeFunction::new(functions).map_sample(sample).await?;
            duration_based_range |= sample.properties().is_duration;
            let mut points: Vec<PlottedPoint> = sample
                .by_ref()
                .map(|point| PlottedPoint {
                    timestamp: point.timestamp,
                    value: point.value * feature.scale + feature.offset,
                })
                .collect();
            sample.dispose();
            points.reverse();
            series.push(PlottedSeries {
                name: feature.name.clone(),
                points,
            });
        }

        if series.iter().all(|s| s.points.is_empty()) {
            return Err(GraphStatError::NotEnoughData(0));
        }

        let mut low = f64::INFINITY;
        let mut high = f64::NEG_INFINITY;
        for point in series.iter().flat_map(|s| &s.points) {
            low = low.min(point.value);
            high = high.max(point.value);
        }
        let y_range = (
            config.y_from.unwrap_or(low),
            config.y_to.unwrap_or(high),
        );

        Ok((series, y_range, duration_based_range, end_time))
    }

    fn feature_functions(
        &self,
        feature: &LineGraphFeature,
        config: &LineGraphConfig,
        end_time: DateTime<FixedOffset>,
    ) -> Vec<Box<dyn DataSampleFunction>> {
        let mut functions: Vec<Box<dyn DataSampleFunction>> =
            vec![Box::new(DataClippingFunction::new(end_time, config.window()))];
        if let Some(period) = feature.plot_totals {
            functions.push(Box::new(PeriodAggregationFunction::new(
                self.context.time_helper,
                period,
                Aggregation::Sum,
            )));
            if let Some(window) = config.window() {
                functions.push(Box::new(DataPaddingFunction::with_window(
                    self.context.time_helper,
                    end_time,
                    window,
                    0.0,
                    String::new(),
                )));
            }
        } else if let Some(averaging) = feature.averaging() {
            functions.push(Box::new(MovingAverageFunction::new(averaging)));
        }
        functions
    }
}
