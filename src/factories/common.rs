//! Shared machinery for the view data factories

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::clock::Clock;
use crate::error::GraphStatError;
use crate::functions::{
    CompositeFunction, DataSampleFunction, FilterLabelFunction, FilterValueFunction,
};
use crate::sampling::{DataSampler, RawPointObserver};
use crate::store::DataStore;
use crate::timehelper::TimeHelper;
use crate::types::{FeatureId, RawDataPoint};

/// The collaborators every factory computes with.
pub(crate) struct FactoryContext {
    pub(crate) store: Arc<dyn DataStore>,
    pub(crate) sampler: DataSampler,
    pub(crate) time_helper: TimeHelper,
    pub(crate) clock: Arc<dyn Clock>,
}

impl FactoryContext {
    pub(crate) fn new(
        store: Arc<dyn DataStore>,
        clock: Arc<dyn Clock>,
        time_helper: TimeHelper,
        cancellation: CancellationToken,
    ) -> Self {
        let sampler = DataSampler::with_cancellation(Arc::clone(&store), cancellation);
        Self {
            store,
            sampler,
            time_helper,
            clock,
        }
    }
}

/// Filter chain for a config's label and value-range filter switches.
pub(crate) fn filter_functions(
    filter_by_labels: bool,
    labels: &[String],
    filter_by_range: bool,
    from_value: f64,
    to_value: f64,
) -> Vec<Box<dyn DataSampleFunction>> {
    let mut functions: Vec<Box<dyn DataSampleFunction>> = Vec::new();
    if filter_by_labels {
        functions.push(Box::new(FilterLabelFunction::new(labels.iter().cloned())));
    }
    if filter_by_range {
        functions.push(Box::new(FilterValueFunction::new(from_value, to_value)));
    }
    functions
}

/// The newest stored row surviving the given transformation chain.
pub(crate) async fn last_filtered_point(
    context: &FactoryContext,
    feature_id: FeatureId,
    functions: Vec<Box<dyn DataSampleFunction>>,
    observer: RawPointObserver,
) -> Result<Option<RawDataPoint>, GraphStatError> {
    let sample = context
        .sampler
        .data_sample_for_feature(feature_id, Some(observer))
        .await?;
    let mut sample = CompositeFunction::new(functions).map_sample(sample).await?;
    let point = sample.next();
    let raw = match point {
        Some(point) => {
            // filters pull rows until one passes, so the row recorded last is
            // the surviving point
            sample.raw_data_points().pop().or(Some(RawDataPoint {
                timestamp: point.timestamp,
                feature_id,
                value: point.value,
                label: point.label,
                note: String::new(),
            }))
        }
        None => None,
    };
    sample.dispose();
    Ok(raw)
}
