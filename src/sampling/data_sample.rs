//! Lazy data samples with scoped resource release
//!
//! A [`DataSample`] is a single-use, forward-only sequence of data points plus
//! its sampling properties. Points are pulled on demand from the underlying
//! producer, which may be a storage cursor; the sample owns an optional
//! disposer for those backing resources and releases them on drop, so every
//! exit path (completion, early break, error propagation, cancellation)
//! reaches the release.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::timehelper::Period;
use crate::types::{DataPoint, RawDataPoint};

/// Properties describing how a sample was produced.
///
/// Every transformation either propagates these or recomputes them; a
/// transformation that cannot preserve `regularity` clears it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSampleProperties {
    /// The calendar period between points, when known to be even.
    pub regularity: Option<Period>,
    /// Whether values count seconds rather than plain numbers.
    pub is_duration: bool,
}

/// Shared accessor for the unmodified rows pulled through a sample so far.
pub type RawPointsAccessor = Arc<dyn Fn() -> Vec<RawDataPoint> + Send + Sync>;

/// Resource release hook attached to a sample.
pub type Disposer = Box<dyn FnOnce() + Send>;

/// A single-use, lazily produced, ordered sequence of data points.
///
/// Iterate it at most once in full; partial iteration is legal and still
/// releases backing resources. Not safe for concurrent consumption.
pub struct DataSample {
    source: Box<dyn Iterator<Item = DataPoint> + Send>,
    properties: DataSampleProperties,
    raw_points: RawPointsAccessor,
    disposer: Option<Disposer>,
}

impl DataSample {
    /// Wrap a produces-once sequence together with its properties, the
    /// accessor for raw consumed rows, and an optional resource disposer.
    pub fn from_sequence(
        source: impl Iterator<Item = DataPoint> + Send + 'static,
        properties: DataSampleProperties,
        raw_points: RawPointsAccessor,
        disposer: Option<Disposer>,
    ) -> Self {
        Self {
            source: Box::new(source),
            properties,
            raw_points,
            disposer,
        }
    }

    /// An already-exhausted sample with default properties and nothing to
    /// dispose.
    pub fn empty() -> Self {
        Self::from_sequence(
            std::iter::empty(),
            DataSampleProperties::default(),
            Arc::new(Vec::new),
            None,
        )
    }

    pub fn properties(&self) -> DataSampleProperties {
        self.properties
    }

    /// The unmodified rows pulled through this sample so far.
    pub fn raw_data_points(&self) -> Vec<RawDataPoint> {
        (self.raw_points)()
    }

    /// Share the raw-points accessor with a derived sample, so the final
    /// consumer of a transformation chain still reaches the original rows.
    pub fn raw_points_accessor(&self) -> RawPointsAccessor {
        Arc::clone(&self.raw_points)
    }

    /// Release backing resources.
    ///
    /// Idempotent, and safe to call without ever having iterated. Also drops
    /// the source iterator, so samples owned by chained transformations
    /// release transitively.
    pub fn dispose(&mut self) {
        if let Some(dispose) = self.disposer.take() {
            dispose();
        }
        self.source = Box::new(std::iter::empty());
    }
}

impl Iterator for DataSample {
    type Item = DataPoint;

    fn next(&mut self) -> Option<DataPoint> {
        self.source.next()
    }
}

impl Drop for DataSample {
    fn drop(&mut self) {
        self.dispose();
    }
}
