//! Concatenation of partitions into one homogeneous batch.

use tracing::{debug, info};

use crate::error::{AnalysisError, Result};
use crate::ingest::parser::Partition;

/// Concatenates partitions in the given order.
///
/// Row order inside each partition is kept and nothing is deduplicated. The
/// result is itself a [`Partition`] (named `a+b+...`), so merging `[p1, p2]`
/// and then `[merged, p3]` equals merging `[p1, p2, p3]` in one go.
///
/// # Errors
///
/// [`AnalysisError::SchemaMismatch`] when a partition's field set differs from
/// the first partition's.
pub fn merge(partitions: Vec<Partition>) -> Result<Partition> {
    let mut iter = partitions.into_iter();
    let Some(mut merged) = iter.next() else {
        return Ok(Partition {
            name: String::new(),
            fields: Default::default(),
            records: Vec::new(),
            malformed: 0,
        });
    };

    for part in iter {
        if part.fields != merged.fields {
            return Err(AnalysisError::SchemaMismatch {
                missing: merged.fields.difference(&part.fields).cloned().collect(),
                unexpected: part.fields.difference(&merged.fields).cloned().collect(),
                partition: part.name,
            });
        }
        debug!(partition = %part.name, records = part.records.len(), "Appending partition");
        merged.name.push('+');
        merged.name.push_str(&part.name);
        merged.records.extend(part.records);
        merged.malformed += part.malformed;
    }

    info!(
        records = merged.records.len(),
        malformed = merged.malformed,
        "Partitions merged"
    );
    Ok(merged)
}
