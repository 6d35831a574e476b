//! Moving averaging over a trailing time window

use std::collections::VecDeque;

use async_trait::async_trait;
use chrono::Duration;

use crate::error::SamplingError;
use crate::functions::DataSampleFunction;
use crate::sampling::DataSample;
use crate::timehelper::far_past;
use crate::types::DataPoint;

/// Replaces each point's value with the mean of itself and every older point
/// within the trailing window `(t - window, t]`.
///
/// Timestamps and labels are unchanged, so order and regularity are
/// preserved. Lazy, with lookahead buffering bounded by the number of points
/// falling inside one window.
pub struct MovingAverageFunction {
    window: Duration,
}

impl MovingAverageFunction {
    pub fn new(window: Duration) -> Self {
        Self { window }
    }
}

#[async_trait]
impl DataSampleFunction for MovingAverageFunction {
    async fn map_sample(&self, sample: DataSample) -> Result<DataSample, SamplingError> {
        let properties = sample.properties();
        let raw_points = sample.raw_points_accessor();
        let averaged = AveragedPoints {
            inner: sample,
            buffer: VecDeque::new(),
            window: self.window,
            exhausted: false,
        };
        Ok(DataSample::from_sequence(
            averaged, properties, raw_points, None,
        ))
    }
}

struct AveragedPoints {
    inner: DataSample,
    buffer: VecDeque<DataPoint>,
    window: Duration,
    exhausted: bool,
}

impl Iterator for AveragedPoints {
    type Item = DataPoint;

    fn next(&mut self) -> Option<DataPoint> {
        let target = match self.buffer.pop_front() {
            Some(point) => point,
            None => self.inner.next()?,
        };
        let cutoff = target
            .timestamp
            .checked_sub_signed(self.window)
            .unwrap_or_else(far_past);

        // pull older points until one falls out of the target's window
        while !self.exhausted
            && self
                .buffer
                .back()
                .map_or(true, |point| point.timestamp > cutoff)
        {
            match self.inner.next() {
                Some(point) => self.buffer.push_back(point),
                None => self.exhausted = true,
            }
        }

        let mut sum = target.value;
        let mut count = 1usize;
        for point in &self.buffer {
            if point.timestamp > cutoff {
                sum += point.value;
                count += 1;
            } else {
                // buffer is newest first; everything further back is older
                break;
            }
        }

        Some(DataPoint {
            timestamp: target.timestamp,
            value: sum / count as f64,
            label: target.label,
        })
    }
}
