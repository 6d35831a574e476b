//! Graph stat dispatch

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::clock::Clock;
use crate::error::GraphStatError;
use crate::factories::{
    AverageTimeBetweenFactory, LineGraphFactory, PieChartFactory, TimeSinceLastFactory,
};
use crate::sampling::RawPointObserver;
use crate::store::DataStore;
use crate::timehelper::TimeHelper;
use crate::types::{GraphStatId, GraphStatKind};
use crate::viewdata::ViewData;

/// Bundles one factory per statistic kind behind a single entry point.
///
/// Each call is an independent unit of work: callers may spawn several
/// computations concurrently on the runtime's worker pool, and cancelling the
/// engine's token stops all of their storage iteration promptly.
pub struct GraphStatEngine {
    store: Arc<dyn DataStore>,
    time_since: TimeSinceLastFactory,
    average_time_between: AverageTimeBetweenFactory,
    line_graph: LineGraphFactory,
    pie_chart: PieChartFactory,
}

impl GraphStatEngine {
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
            store: Arc::clone(&store),
            time_since: TimeSinceLastFactory::with_cancellation(
                Arc::clone(&store),
                Arc::clone(&clock),
                time_helper,
                cancellation.clone(),
            ),
            average_time_between: AverageTimeBetweenFactory::with_cancellation(
                Arc::clone(&store),
                Arc::clone(&clock),
                time_helper,
                cancellation.clone(),
            ),
            line_graph: LineGraphFactory::with_cancellation(
                Arc::clone(&store),
                Arc::clone(&clock),
                time_helper,
                cancellation.clone(),
            ),
            pie_chart: PieChartFactory::with_cancellation(store, clock, time_helper, cancellation),
        }
    }

    /// Compute the view data for a stored graph or stat configuration.
    ///
    /// Fails only when the configuration header itself cannot be resolved;
    /// every computation failure is delivered as an error view data instead.
    pub async fn view_data(
        &self,
        graph_stat_id: GraphStatId,
        observer: RawPointObserver,
    ) -> Result<ViewData, GraphStatError> {
        let graph_stat = self
            .store
            .graph_stat(graph_stat_id)
            .await?
            .ok_or(GraphStatError::GraphNotFound)?;
        debug!(graph_stat_id, kind = ?graph_stat.kind, "computing view data");
        Ok(match graph_stat.kind {
            GraphStatKind::TimeSinceLast => {
                self.time_since.create_view_data(graph_stat, observer).await
            }
            GraphStatKind::AverageTimeBetween => {
                self.average_time_between
                    .create_view_data(graph_stat, observer)
                    .await
            }
            GraphStatKind::LineGraph => {
                self.line_graph.create_view_data(graph_stat, observer).await
            }
            GraphStatKind::PieChart => {
                self.pie_chart.create_view_data(graph_stat, observer).await
            }
        })
    }
}
