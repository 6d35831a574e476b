//! Data sampling
//!
//! The lazy sample abstraction, the storage cursor adapter behind it, and the
//! sampler that produces fresh samples per query.

mod cursor;
mod data_sample;
mod sampler;

pub use cursor::RawPointObserver;
pub use data_sample::{DataSample, DataSampleProperties, Disposer, RawPointsAccessor};
pub use sampler::DataSampler;
