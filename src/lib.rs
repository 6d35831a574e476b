//! Trackstat - statistics compute engine for tracked time-series features
//!
//! Trackstat turns per-feature, time-stamped observations into derived
//! statistics and chart-ready series through a lazy, resource-safe pipeline:
//! storage cursor → data sample → transformation functions → per-statistic
//! factories.
//!
//! ## Modules
//!
//! - **sampling**: lazy, single-use data samples with scoped resource release
//! - **functions**: composable sample transformations (padding, clipping,
//!   filtering, aggregation, averaging)
//! - **factories**: per-statistic view data computation
//! - **store**: the storage boundary the pipeline consumes

pub mod clock;
pub mod error;
pub mod factories;
pub mod functions;
pub mod sampling;
pub mod store;
pub mod timehelper;
pub mod types;
pub mod viewdata;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{GraphStatError, SamplingError, StoreError};
pub use factories::GraphStatEngine;
pub use sampling::{DataSample, DataSampleProperties, DataSampler, RawPointObserver};
pub use timehelper::{Period, TimeHelper};
pub use viewdata::{ViewData, ViewDataState};

/// Trackstat version reported by the CLI.
pub const TRACKSTAT_VERSION: &str = env!("CARGO_PKG_VERSION");
