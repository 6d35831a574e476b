//! Padding of regular samples to a requested time span

use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset};

use crate::error::SamplingError;
use crate::functions::DataSampleFunction;
use crate::sampling::DataSample;
use crate::timehelper::{far_past, Period, TimeHelper};
use crate::types::DataPoint;

/// Ensures a regular sample at least covers a requested time span.
///
/// The output contains data up to the end time and down to the start time.
/// No clipping is performed: if the input already extends beyond the span it
/// passes through unmodified, and no synthetic point is ever inserted between
/// two real points. An empty input produces synthetic points across the whole
/// aligned span. Synthetic points use the configured default value and label.
///
/// Requires regular input; mapping a sample without a declared regularity
/// fails with [`SamplingError::InvalidRegularity`]. Preserves the newest-first
/// order and the sample's properties.
pub struct DataPaddingFunction {
    time_helper: TimeHelper,
    end_time: DateTime<FixedOffset>,
    start_time: DateTime<FixedOffset>,
    default_value: f64,
    default_label: String,
}

impl DataPaddingFunction {
    pub fn new(
        time_helper: TimeHelper,
        end_time: DateTime<FixedOffset>,
        start_time: DateTime<FixedOffset>,
        default_value: f64,
        default_label: String,
    ) -> Self {
        Self {
            time_helper,
            end_time,
            start_time,
            default_value,
            default_label,
        }
    }

    /// Pad the window of the given length ending at `end_time`.
    pub fn with_window(
        time_helper: TimeHelper,
        end_time: DateTime<FixedOffset>,
        window: Duration,
        default_value: f64,
        default_label: String,
    ) -> Self {
        let start_time = end_time.checked_sub_signed(window).unwrap_or_else(far_past);
        Self::new(time_helper, end_time, start_time, default_value, default_label)
    }
}

#[async_trait]
impl DataSampleFunction for DataPaddingFunction {
    async fn map_sample(&self, sample: DataSample) -> Result<DataSample, SamplingError> {
        let properties = sample.properties();
        let period = properties
            .regularity
            .ok_or(SamplingError::InvalidRegularity)?;
        let raw_points = sample.raw_points_accessor();
        let padded = PaddedPoints {
            inner: sample.peekable(),
            time_helper: self.time_helper,
            period,
            start_time: self.start_time,
            end_time: self.end_time,
            default_value: self.default_value,
            default_label: self.default_label.clone(),
            current: far_past(),
            state: PadState::Start,
        };
        Ok(DataSample::from_sequence(padded, properties, raw_points, None))
    }
}

#[derive(Clone, Copy)]
enum PadState {
    Start,
    /// Synthetic points from the aligned end boundary down to the first real
    /// point.
    Head {
        first: DateTime<FixedOffset>,
    },
    /// Real points passed through unchanged.
    Body,
    /// Synthetic points from one period below the last real point down to the
    /// start time.
    Tail,
    /// The whole aligned span, for an empty input.
    FullRange {
        stop: DateTime<FixedOffset>,
    },
    Done,
}

struct PaddedPoints {
    inner: std::iter::Peekable<DataSample>,
    time_helper: TimeHelper,
    period: Period,
    start_time: DateTime<FixedOffset>,
    end_time: DateTime<FixedOffset>,
    default_value: f64,
    default_label: String,
    current: DateTime<FixedOffset>,
    state: PadState,
}

impl PaddedPoints {
    fn synthetic(&self, timestamp: DateTime<FixedOffset>) -> DataPoint {
        DataPoint {
            timestamp,
            value: self.default_value,
            label: self.default_label.clone(),
        }
    }
}

impl Iterator for PaddedPoints {
    type Item = DataPoint;

    fn next(&mut self) -> Option<DataPoint> {
        loop {
            match self.state {
                PadState::Start => match self.inner.peek() {
                    Some(first) => {
                        let first = first.timestamp;
                        self.current = self
                            .time_helper
                            .find_beginning_of_period(self.end_time, self.period);
                        self.state = PadState::Head { first };
                    }
                    None => {
                        self.current = self
                            .time_helper
                            .find_beginning_of_period(self.end_time, self.period);
                        let stop = self
                            .time_helper
                            .find_end_of_period(self.start_time, self.period);
                        self.state = PadState::FullRange { stop };
                    }
                },
                PadState::Head { first } => {
                    if self.current > first {
                        let point = self.synthetic(self.current);
                        self.current = self.period.step_back(self.current);
                        return Some(point);
                    }
                    self.state = PadState::Body;
                }
                PadState::Body => match self.inner.next() {
                    Some(point) => {
                        if self.inner.peek().is_none() {
                            self.current = self.period.step_back(point.timestamp);
                            self.state = PadState::Tail;
                        }
                        return Some(point);
                    }
                    None => self.state = PadState::Tail,
                },
                PadState::Tail => {
                    if self.current > self.start_time {
                        let point = self.synthetic(self.current);
                        self.current = self.period.step_back(self.current);
                        return Some(point);
                    }
                    self.state = PadState::Done;
                }
                PadState::FullRange { stop } => {
                    if self.current >= stop {
                        let point = self.synthetic(self.current);
                        self.current = self.period.step_back(self.current);
                        return Some(point);
                    }
                    self.state = PadState::Done;
                }
                PadState::Done => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampling::DataSampleProperties;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn at(s: &str) -> DateTime<FixedOffset> {
        s.parse().unwrap()
    }

    fn point(timestamp: &str, value: f64) -> DataPoint {
        DataPoint {
            timestamp: at(timestamp),
            value,
            label: "real".to_string(),
        }
    }

    fn regular_sample(points: Vec<DataPoint>) -> DataSample {
        DataSample::from_sequence(
            points.into_iter(),
            DataSampleProperties {
                regularity: Some(Period::Day),
                is_duration: false,
            },
            Arc::new(Vec::new),
            None,
        )
    }

    fn irregular_sample() -> DataSample {
        DataSample::from_sequence(
            std::iter::empty(),
            DataSampleProperties::default(),
            Arc::new(Vec::new),
            None,
        )
    }

    fn padding(end: &str, start: &str) -> DataPaddingFunction {
        DataPaddingFunction::new(TimeHelper::utc(), at(end), at(start), 0.0, String::new())
    }

    #[tokio::test]
    async fn irregular_sample_is_rejected() {
        let function = padding("2024-03-15T12:00:00+00:00", "2024-03-08T12:00:00+00:00");
        let result = function.map_sample(irregular_sample()).await;
        assert!(matches!(result, Err(SamplingError::InvalidRegularity)));
    }

    #[tokio::test]
    async fn pads_head_between_and_tail_without_touching_reals() {
        // reals at day -2 and day -5 of a 7 day window ending day 0
        let reals = vec![
            point("2024-03-13T09:00:00+00:00", 1.0),
            point("2024-03-10T08:00:00+00:00", 2.0),
        ];
        let function = padding("2024-03-15T12:00:00+00:00", "2024-03-08T12:00:00+00:00");
        let padded: Vec<DataPoint> = function
            .map_sample(regular_sample(reals))
            .await
            .unwrap()
            .collect();

        let timestamps: Vec<_> = padded.iter().map(|p| p.timestamp.to_rfc3339()).collect();
        assert_eq!(
            timestamps,
            vec![
                // head: aligned boundaries down to the first real point
                "2024-03-15T00:00:00+00:00",
                "2024-03-14T00:00:00+00:00",
                // reals pass through unchanged, nothing synthetic between them
                "2024-03-13T09:00:00+00:00",
                "2024-03-10T08:00:00+00:00",
                // tail: stepping back from the last real point to the start
                "2024-03-09T08:00:00+00:00",
            ]
        );
        assert_eq!(padded[2].value, 1.0);
        assert_eq!(padded[2].label, "real");
        assert_eq!(padded[3].value, 2.0);
        // no duplicate timestamps
        let mut unique = timestamps.clone();
        unique.dedup();
        assert_eq!(unique, timestamps);
    }

    #[tokio::test]
    async fn original_points_survive_as_ordered_subsequence() {
        let reals = vec![
            point("2024-03-14T10:00:00+00:00", 1.0),
            point("2024-03-13T10:00:00+00:00", 2.0),
            point("2024-03-11T10:00:00+00:00", 3.0),
        ];
        let function = padding("2024-03-15T12:00:00+00:00", "2024-03-08T12:00:00+00:00");
        let padded: Vec<DataPoint> = function
            .map_sample(regular_sample(reals.clone()))
            .await
            .unwrap()
            .collect();

        let surviving: Vec<DataPoint> = padded
            .into_iter()
            .filter(|p| p.label == "real")
            .collect();
        assert_eq!(surviving, reals);
    }

    #[tokio::test]
    async fn empty_sample_fills_the_aligned_span_with_defaults() {
        let function = DataPaddingFunction::new(
            TimeHelper::utc(),
            at("2024-03-15T12:00:00+00:00"),
            at("2024-03-08T12:00:00+00:00"),
            7.5,
            "filler".to_string(),
        );
        let padded: Vec<DataPoint> = function
            .map_sample(regular_sample(Vec::new()))
            .await
            .unwrap()
            .collect();

        let timestamps: Vec<_> = padded.iter().map(|p| p.timestamp.to_rfc3339()).collect();
        assert_eq!(
            timestamps,
            vec![
                "2024-03-15T00:00:00+00:00",
                "2024-03-14T00:00:00+00:00",
                "2024-03-13T00:00:00+00:00",
                "2024-03-12T00:00:00+00:00",
                "2024-03-11T00:00:00+00:00",
                "2024-03-10T00:00:00+00:00",
                "2024-03-09T00:00:00+00:00",
            ]
        );
        assert!(padded.iter().all(|p| p.value == 7.5 && p.label == "filler"));
    }

    #[tokio::test]
    async fn degenerate_span_adds_nothing_below_existing_data() {
        let reals = vec![point("2024-03-15T09:00:00+00:00", 1.0)];
        let end = "2024-03-15T12:00:00+00:00";
        let function = padding(end, end);
        let padded: Vec<DataPoint> = function
            .map_sample(regular_sample(reals.clone()))
            .await
            .unwrap()
            .collect();
        // the aligned head boundary is older than the real point and the tail
        // never reaches below the start, so nothing synthetic is added
        assert_eq!(padded, reals);
    }

    #[tokio::test]
    async fn data_beyond_the_span_is_not_clipped() {
        let reals = vec![
            point("2024-03-20T09:00:00+00:00", 1.0),
            point("2024-03-01T09:00:00+00:00", 2.0),
        ];
        let function = padding("2024-03-15T12:00:00+00:00", "2024-03-08T12:00:00+00:00");
        let padded: Vec<DataPoint> = function
            .map_sample(regular_sample(reals.clone()))
            .await
            .unwrap()
            .collect();
        // both out-of-span reals survive; no head synthetics (first real is
        // newer than the aligned end boundary), no tail synthetics (last real
        // is older than the start)
        assert_eq!(padded, reals);
    }

    #[tokio::test]
    async fn disposal_chains_through_to_the_input_sample() {
        let disposals = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&disposals);
        let inner = DataSample::from_sequence(
            vec![point("2024-03-14T10:00:00+00:00", 1.0)].into_iter(),
            DataSampleProperties {
                regularity: Some(Period::Day),
                is_duration: false,
            },
            Arc::new(Vec::new),
            Some(Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })),
        );
        let function = padding("2024-03-15T12:00:00+00:00", "2024-03-08T12:00:00+00:00");
        let mut padded = function.map_sample(inner).await.unwrap();
        assert!(padded.next().is_some());
        padded.dispose();
        assert_eq!(disposals.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn head_synthetics_are_period_aligned() {
        let reals = vec![point("2024-03-10T08:00:00+00:00", 2.0)];
        let helper = TimeHelper::utc();
        let end = at("2024-03-15T17:30:00+00:00");
        let function =
            DataPaddingFunction::new(helper, end, at("2024-03-08T12:00:00+00:00"), 0.0, String::new());
        let padded: Vec<DataPoint> = function
            .map_sample(regular_sample(reals))
            .await
            .unwrap()
            .collect();
        let boundary = helper.find_beginning_of_period(end, Period::Day);
        for (k, synthetic) in padded.iter().take_while(|p| p.label.is_empty()).enumerate() {
            let mut expected = boundary;
            for _ in 0..k {
                expected = Period::Day.step_back(expected);
            }
            assert_eq!(synthetic.timestamp, expected);
        }
    }
}
