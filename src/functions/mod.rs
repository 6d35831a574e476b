//! Composable sample transformations
//!
//! Each function consumes a [`DataSample`] and produces a new lazy one:
//! padding to a time span, clipping to a window, filtering by label or value
//! range, bucketing into calendar periods, moving averaging. Functions are
//! stateless per invocation and compose; every function documents whether it
//! preserves the newest-first input order and the sample's regularity.

use async_trait::async_trait;

use crate::error::SamplingError;
use crate::sampling::DataSample;

mod aggregation;
mod clipping;
mod composite;
mod filtering;
mod moving_average;
mod padding;

pub use aggregation::{Aggregation, PeriodAggregationFunction};
pub use clipping::DataClippingFunction;
pub use composite::CompositeFunction;
pub use filtering::{FilterLabelFunction, FilterValueFunction};
pub use moving_average::MovingAverageFunction;
pub use padding::DataPaddingFunction;

/// A transformation from one data sample to another.
#[async_trait]
pub trait DataSampleFunction: Send + Sync {
    /// Consume `sample` and produce the transformed sample.
    ///
    /// The input sample is owned by the output's lazy sequence, so disposing
    /// the output releases the input's backing resources too.
    async fn map_sample(&self, sample: DataSample) -> Result<DataSample, SamplingError>;
}
