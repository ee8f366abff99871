pub mod analyzers;
pub mod config;
pub mod distance;
pub mod error;
pub mod ingest;
pub mod model;
pub mod snapshot;
