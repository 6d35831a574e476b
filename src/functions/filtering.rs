//! Label and value-range filters

use std::collections::HashSet;

use async_trait::async_trait;

use crate::error::SamplingError;
use crate::functions::DataSampleFunction;
use crate::sampling::DataSample;

/// Keeps only points whose label is in the configured set.
///
/// Preserves the newest-first order. Dropping points breaks even spacing, so
/// the output's regularity is cleared.
pub struct FilterLabelFunction {
    labels: HashSet<String>,
}

impl FilterLabelFunction {
    pub fn new(labels: impl IntoIterator<Item = String>) -> Self {
        Self {
            labels: labels.into_iter().collect(),
        }
    }
}

#[async_trait]
impl DataSampleFunction for FilterLabelFunction {
    async fn map_sample(&self, sample: DataSample) -> Result<DataSample, SamplingError> {
        let mut properties = sample.properties();
        properties.regularity = None;
        let raw_points = sample.raw_points_accessor();
        let labels = self.labels.clone();
        let filtered = sample.filter(move |point| labels.contains(&point.label));
        Ok(DataSample::from_sequence(
            filtered, properties, raw_points, None,
        ))
    }
}

/// Keeps only points whose value lies in `[from_value, to_value]`.
///
/// Preserves the newest-first order; clears regularity.
pub struct FilterValueFunction {
    from_value: f64,
    to_value: f64,
}

impl FilterValueFunction {
    pub fn new(from_value: f64, to_value: f64) -> Self {
        Self {
            from_value,
            to_value,
        }
    }
}

#[async_trait]
impl DataSampleFunction for FilterValueFunction {
    async fn map_sample(&self, sample: DataSample) -> Result<DataSample, SamplingError> {
        let mut properties = sample.properties();
        properties.regularity = None;
        let raw_points = sample.raw_points_accessor();
        let from_value = self.from_value;
        let to_value = self.to_value;
        let filtered =
            sample.filter(move |point| point.value >= from_value && point.value <= to_value);
        Ok(DataSample::from_sequence(
            filtered, properties, raw_points, None,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampling::DataSampleProperties;
    use crate::timehelper::Period;
    use crate::types::DataPoint;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn point(timestamp: &str, value: f64, label: &str) -> DataPoint {
        DataPoint {
            timestamp: timestamp.parse().unwrap(),
            value,
            label: label.to_string(),
        }
    }

    fn regular_sample(points: Vec<DataPoint>) -> DataSample {
        DataSample::from_sequence(
            points.into_iter(),
            DataSampleProperties {
                regularity: Some(Period::Day),
                is_duration: true,
            },
            Arc::new(Vec::new),
            None,
        )
    }

    #[tokio::test]
    async fn label_filter_keeps_matches_and_clears_regularity() {
        let points = vec![
            point("2024-03-15T08:00:00+00:00", 1.0, "run"),
            point("2024-03-14T08:00:00+00:00", 2.0, "swim"),
            point("2024-03-13T08:00:00+00:00", 3.0, "run"),
        ];
        let function = FilterLabelFunction::new(["run".to_string()]);
        let sample = function.map_sample(regular_sample(points)).await.unwrap();
        assert_eq!(sample.properties().regularity, None);
        assert!(sample.properties().is_duration);
        let values: Vec<f64> = sample.map(|p| p.value).collect();
        assert_eq!(values, vec![1.0, 3.0]);
    }

    #[tokio::test]
    async fn value_filter_bounds_are_inclusive() {
        let points = vec![
            point("2024-03-15T08:00:00+00:00", 0.5, ""),
            point("2024-03-14T08:00:00+00:00", 1.0, ""),
            point("2024-03-13T08:00:00+00:00", 2.0, ""),
            point("2024-03-12T08:00:00+00:00", 3.5, ""),
        ];
        let function = FilterValueFunction::new(1.0, 2.0);
        let sample = function.map_sample(regular_sample(points)).await.unwrap();
        assert_eq!(sample.properties().regularity, None);
        let values: Vec<f64> = sample.map(|p| p.value).collect();
        assert_eq!(values, vec![1.0, 2.0]);
    }
}
