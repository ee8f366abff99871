//! Partition retrieval, CSV decoding and merge.
//!
//! Partitions are fetched and decoded concurrently, then merged strictly in
//! the order they were given. Enrichment (trip length) happens afterwards in
//! [`crate::model::Dataset::enrich`].

pub mod merge;
pub mod parser;
pub mod source;

pub use merge::merge;
pub use parser::{Partition, parse_partition};
pub use source::{
    DefaultFetcher, Packing, PartitionFetcher, PartitionSource, decode, expand_sources,
};

use serde::Serialize;
use std::sync::Arc;
use tracing::{Instrument, info};

use crate::error::{AnalysisError, Result};
use crate::model::Dataset;

/// Counters reported alongside the analyses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    pub partitions: usize,
    pub records: usize,
    pub malformed: usize,
}

/// Fetches, decodes and merges `sources`, then derives trip lengths.
#[tracing::instrument(skip_all, fields(partitions = sources.len()))]
pub async fn ingest(
    fetcher: Arc<dyn PartitionFetcher>,
    sources: Vec<PartitionSource>,
) -> Result<(Dataset, IngestSummary)> {
    let mut tasks = Vec::with_capacity(sources.len());

    for source in sources {
        let fetcher = fetcher.clone();
        let span = tracing::info_span!("partition", name = %source.name());

        tasks.push(tokio::spawn(
            async move {
                let raw = fetcher.fetch(&source).await?;
                info!(bytes = raw.len(), "Partition retrieved");
                tokio::task::spawn_blocking(move || {
                    let text = decode(&source, raw)?;
                    parse_partition(&source.name(), &text)
                })
                .await
                .map_err(|e| AnalysisError::Task(e.to_string()))?
            }
            .instrument(span),
        ));
    }

    // Awaiting in spawn order keeps the merge in partition order.
    let mut partitions = Vec::with_capacity(tasks.len());
    for task in tasks {
        partitions.push(task.await.map_err(|e| AnalysisError::Task(e.to_string()))??);
    }

    let partition_count = partitions.len();
    let merged = merge(partitions)?;
    let summary = IngestSummary {
        partitions: partition_count,
        records: merged.records.len(),
        malformed: merged.malformed,
    };

    let dataset = tokio::task::spawn_blocking(move || Dataset::enrich(merged.records))
        .await
        .map_err(|e| AnalysisError::Task(e.to_string()))?;
    info!(records = dataset.len(), "Trip lengths derived");

    Ok((dataset, summary))
}
