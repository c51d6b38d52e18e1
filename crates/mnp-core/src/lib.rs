// Library root: statistical aggregation and comparative analysis for pinball
// league score data. Presentation layers (CLI, web) sit on top of the
// `analysis` entry points and a `Store` implementation.

pub mod analysis;
pub mod catalog;
pub mod cohort;
pub mod compare;
pub mod config;
pub mod db;
pub mod error;
pub mod memory;
pub mod model;
pub mod stats;
pub mod store;

#[cfg(test)]
mod testing;

pub use error::AnalysisError;
pub use store::{Store, StoreError};
