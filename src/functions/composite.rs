//! Chaining of sample functions

use async_trait::async_trait;

use crate::error::SamplingError;
use crate::functions::DataSampleFunction;
use crate::sampling::DataSample;

/// Applies an ordered list of functions, feeding each output into the next.
///
/// Short-circuits on the first failing function. An empty composite is the
/// identity transformation.
pub struct CompositeFunction {
    functions: Vec<Box<dyn DataSampleFunction>>,
}

impl CompositeFunction {
    pub fn new(functions: Vec<Box<dyn DataSampleFunction>>) -> Self {
        Self { functions }
    }
}

#[async_trait]
impl DataSampleFunction for CompositeFunction {
    async fn map_sample(&self, sample: DataSample) -> Result<DataSample, SamplingError> {
        let mut sample = sample;
        for function in &self.functions {
            sample = function.map_sample(sample).await?;
        }
        Ok(sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::{FilterLabelFunction, FilterValueFunction};
    use crate::sampling::DataSampleProperties;
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

    fn sample(points: Vec<DataPoint>) -> DataSample {
        DataSample::from_sequence(
            points.into_iter(),
            DataSampleProperties::default(),
            Arc::new(Vec::new),
            None,
        )
    }

    #[tokio::test]
    async fn applies_functions_in_order() {
        let points = vec![
            point("2024-03-15T08:00:00+00:00", 1.0, "run"),
            point("2024-03-14T08:00:00+00:00", 9.0, "run"),
            point("2024-03-13T08:00:00+00:00", 2.0, "swim"),
        ];
        let composite = CompositeFunction::new(vec![
            Box::new(FilterLabelFunction::new(["run".to_string()])),
            Box::new(FilterValueFunction::new(0.0, 5.0)),
        ]);
        let values: Vec<f64> = composite
            .map_sample(sample(points))
            .await
            .unwrap()
            .map(|p| p.value)
            .collect();
        assert_eq!(values, vec![1.0]);
    }

    #[tokio::test]
    async fn empty_composite_is_identity() {
        let points = vec![point("2024-03-15T08:00:00+00:00", 1.0, "")];
        let composite = CompositeFunction::new(Vec::new());
        let values: Vec<f64> = composite
            .map_sample(sample(points))
            .await
            .unwrap()
            .map(|p| p.value)
            .collect();
        assert_eq!(values, vec![1.0]);
    }
}
