pub mod classifier;
pub mod dataset;
pub mod error;
pub mod metrics;
pub mod model;
pub mod prediction;
