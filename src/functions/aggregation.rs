//! Aggregation of samples into calendar-period buckets

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::error::SamplingError;
use crate::functions::DataSampleFunction;
use crate::sampling::DataSample;
use crate::timehelper::{Period, TimeHelper};
use crate::types::DataPoint;

/// How the values falling into one bucket are folded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    Sum,
    Average,
    Max,
    Min,
    Count,
}

impl Aggregation {
    fn apply(&self, values: &[f64]) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        match self {
            Aggregation::Sum => values.iter().sum(),
            Aggregation::Average => values.iter().sum::<f64>() / values.len() as f64,
            Aggregation::Max => values.iter().fold(f64::NEG_INFINITY, |a, b| a.max(*b)),
            Aggregation::Min => values.iter().fold(f64::INFINITY, |a, b| a.min(*b)),
            Aggregation::Count => values.len() as f64,
        }
    }
}

/// Buckets a sample into dense calendar-period bins.
///
/// One point is emitted per period from the bin of the newest input point
/// down to the bin of the oldest, newest first; bins with no input points
/// emit the neutral value 0. Bucket timestamps are the aligned bin
/// beginnings and labels are empty, so bucket ordering and spacing are even:
/// the output declares `regularity = Some(period)`. An empty input stays
/// empty.
pub struct PeriodAggregationFunction {
    time_helper: TimeHelper,
    period: Period,
    aggregation: Aggregation,
}

impl PeriodAggregationFunction {
    pub fn new(time_helper: TimeHelper, period: Period, aggregation: Aggregation) -> Self {
        Self {
            time_helper,
            period,
            aggregation,
        }
    }
}

#[async_trait]
impl DataSampleFunction for PeriodAggregationFunction {
    async fn map_sample(&self, sample: DataSample) -> Result<DataSample, SamplingError> {
        let mut properties = sample.properties();
        properties.regularity = Some(self.period);
        let raw_points = sample.raw_points_accessor();
        let buckets = BucketedPoints {
            inner: sample.peekable(),
            time_helper: self.time_helper,
            period: self.period,
            aggregation: self.aggregation,
            current_bin: None,
            started: false,
        };
        Ok(DataSample::from_sequence(
            buckets, properties, raw_points, None,
        ))
    }
}

struct BucketedPoints {
    inner: std::iter::Peekable<DataSample>,
    time_helper: TimeHelper,
    period: Period,
    aggregation: Aggregation,
    current_bin: Option<DateTime<FixedOffset>>,
    started: bool,
}

impl Iterator for BucketedPoints {
    type Item = DataPoint;

    fn next(&mut self) -> Option<DataPoint> {
        if !self.started {
            self.started = true;
            let first = self.inner.peek()?.timestamp;
            self.current_bin = Some(
                self.time_helper
                    .find_beginning_of_period(first, self.period),
            );
        }
        let bin = self.current_bin?;

        let mut values = Vec::new();
        while let Some(point) = self.inner.peek() {
            let point_bin = self
                .time_helper
                .find_beginning_of_period(point.timestamp, self.period);
            if point_bin != bin {
                break;
            }
            if let Some(point) = self.inner.next() {
                values.push(point.value);
            }
        }

        self.current_bin = if self.inner.peek().is_some() {
            Some(self.period.step_back(bin))
        } else {
            None
        };

        Some(DataPoint {
            timestamp: bin,
            value: self.aggregation.apply(&values),
            label: String::new(),
        })
    }
}
