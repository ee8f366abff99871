//! Error type shared by ingestion and the analyses.

use thiserror::Error;

/// Failures that abort ingestion or an analysis.
///
/// Per-row problems never show up here: a malformed row is dropped during
/// parsing and only counted (see [`crate::ingest::IngestSummary`]).
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// A partition's header does not carry the same field set as the first one.
    #[error(
        "schema mismatch in partition '{partition}': missing [{}], unexpected [{}]",
        .missing.join(", "),
        .unexpected.join(", ")
    )]
    SchemaMismatch {
        partition: String,
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    /// An analysis would divide by zero records or zero bikes.
    #[error("'{analysis}' needs at least one record, dataset is empty")]
    EmptyDataset { analysis: &'static str },

    #[error("failed to retrieve partition '{source_name}': {message}")]
    Fetch {
        source_name: String,
        message: String,
    },

    /// A zip partition holds no CSV entry.
    #[error("zip partition '{partition}' contains no CSV file")]
    EmptyArchive { partition: String },

    #[error("background task failed: {0}")]
    Task(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
