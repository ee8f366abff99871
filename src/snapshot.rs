//! Persistence of the enriched dataset and of finished reports.
//!
//! A snapshot is a CSV file of [`Trip`] rows. Loading one skips partition
//! retrieval, merge and trip-length derivation.

use serde::Serialize;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

use crate::analyzers::AnalysisReport;
use crate::error::Result;
use crate::ingest::IngestSummary;
use crate::model::{Dataset, Trip};

/// Writes every trip of `dataset` to `path`, replacing any existing file.
pub fn write_snapshot(path: &Path, dataset: &Dataset) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for trip in dataset.iter() {
        writer.serialize(trip)?;
    }
    writer.flush()?;

    info!(path = %path.display(), trips = dataset.len(), "Snapshot written");
    Ok(())
}

/// Reads a snapshot written by [`write_snapshot`].
///
/// Unlike partition parsing, a bad row here is fatal: snapshots are produced
/// from already validated data.
pub fn read_snapshot(path: &Path) -> Result<Dataset> {
    let file = File::open(path)?;
    let mut rdr = csv::Reader::from_reader(file);

    let mut trips = Vec::new();
    for result in rdr.deserialize() {
        let trip: Trip = result?;
        trips.push(trip);
    }

    debug!(path = %path.display(), trips = trips.len(), "Snapshot loaded");
    Ok(Dataset::from_trips(trips))
}

#[derive(Serialize)]
struct ReportDocument<'a> {
    generated_at: chrono::DateTime<chrono::Utc>,
    ingest: Option<&'a IngestSummary>,
    analyses: &'a AnalysisReport,
}

/// Writes the report, and the ingest counters when known, as pretty JSON.
pub fn write_report_json(
    path: &Path,
    report: &AnalysisReport,
    summary: Option<&IngestSummary>,
) -> Result<()> {
    let doc = ReportDocument {
        generated_at: chrono::Utc::now(),
        ingest: summary,
        analyses: report,
    };
    let body = serde_json::to_string_pretty(&doc).map_err(std::io::Error::from)?;
    std::fs::write(path, body)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::run_all;
    use crate::error::AnalysisError;
    use crate::config::AnalysisConfig;
    use crate::model::UserType;
    use crate::model::test_support::{dataset, trip_at};

    #[test]
    fn test_snapshot_reads_back_identical_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("2015-prepared.csv");

        let mut customer = trip_at(2, 3, 4, (11, 30, 23, 59), 61);
        customer.user_type = UserType::Customer;
        customer.trip_length_km = 1.234_567_891_234;
        let mut other = trip_at(3, 1, 1, (2, 1, 0, 0), 5);
        other.user_type = UserType::Other(String::new());
        let ds = dataset(vec![trip_at(1, 1, 2, (1, 1, 8, 0), 60), customer, other]);

        write_snapshot(&path, &ds).unwrap();
        let loaded = read_snapshot(&path).unwrap();
        assert_eq!(loaded, ds);
    }

    #[test]
    fn test_snapshot_header_uses_feed_column_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snap.csv");
        write_snapshot(&path, &dataset(vec![trip_at(1, 1, 2, (1, 1, 8, 0), 60)])).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let header = content.lines().next().unwrap();
        assert!(header.contains("start station id"));
        assert!(header.contains("trip length"));
        assert!(!header.contains("latitude"));
    }

    #[test]
    fn test_read_missing_snapshot_is_io_error() {
        let err = read_snapshot(Path::new("/nonexistent/snap.csv")).unwrap_err();
        assert!(matches!(err, AnalysisError::Io(_)));
    }

    #[test]
    fn test_report_json_contains_analyses_and_counters() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let ds = dataset(vec![trip_at(1, 1, 2, (1, 1, 8, 0), 60)]);
        let report = run_all(&ds, &AnalysisConfig::default()).unwrap();
        let summary = IngestSummary {
            partitions: 1,
            records: 1,
            malformed: 2,
        };

        write_report_json(&path, &report, Some(&summary)).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["ingest"]["malformed"], 2);
        assert_eq!(json["analyses"]["mean_relocations_per_bike"], 0.0);
        assert!(json["generated_at"].is_string());
    }
}
