//! Clipping samples to a time window

use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset};

use crate::error::SamplingError;
use crate::functions::DataSampleFunction;
use crate::sampling::DataSample;
use crate::timehelper::far_past;

/// Restricts a sample to the window ending at `end_time`.
///
/// Points newer than the end time are skipped, and once a point older than
/// `end_time - window` appears iteration stops, so the underlying producer is
/// never drained past the window. Without a window only the upper bound
/// applies. Preserves the newest-first order and the sample's properties: a
/// contiguous window of a regular series is still regular.
pub struct DataClippingFunction {
    end_time: DateTime<FixedOffset>,
    window: Option<Duration>,
}

impl DataClippingFunction {
    pub fn new(end_time: DateTime<FixedOffset>, window: Option<Duration>) -> Self {
        Self { end_time, window }
    }
}

#[async_trait]
impl DataSampleFunction for DataClippingFunction {
    async fn map_sample(&self, sample: DataSample) -> Result<DataSample, SamplingError> {
        let properties = sample.properties();
        let raw_points = sample.raw_points_accessor();
        let end_time = self.end_time;
        let start_time = self
            .window
            .map(|window| end_time.checked_sub_signed(window).unwrap_or_else(far_past));
        let clipped = sample
            .skip_while(move |point| point.timestamp > end_time)
            .take_while(move |point| start_time.map_or(true, |start| point.timestamp >= start));
        Ok(DataSample::from_sequence(
            clipped, properties, raw_points, None,
        ))
    }
}
