//! Descriptive statistics over an enriched trip dataset.
//!
//! Every analysis borrows the dataset immutably and returns one number, so
//! [`report::run_all`] can evaluate them side by side.

pub mod hourly_surprise;
pub mod relocation;
pub mod report;
pub mod scalar;
pub mod station_visits;
pub mod utility;

pub use report::{Analysis, AnalysisReport, run_all};
