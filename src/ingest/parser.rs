//! CSV decoding of a single partition into validated [`TripRecord`]s.
//!
//! Rows that cannot be turned into a well-formed record (negative duration,
//! null or non-numeric identifiers, unparseable timestamps or coordinates)
//! are dropped and counted, never patched up.

use chrono::NaiveDateTime;
use csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use std::collections::BTreeSet;
use tracing::{debug, warn};

use crate::error::{AnalysisError, Result};
use crate::model::{BikeId, Coordinate, StationId, TripRecord, UserType};

/// Columns every partition must provide.
pub const REQUIRED_COLUMNS: &[&str] = &[
    "tripduration",
    "starttime",
    "stoptime",
    "start station id",
    "start station latitude",
    "start station longitude",
    "end station id",
    "end station latitude",
    "end station longitude",
    "bikeid",
    "usertype",
];

/// The feed switched timestamp layouts during 2015; try each in turn.
const TIMESTAMP_FORMATS: &[&str] = &[
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// A decoded partition: its field set, surviving records and drop count.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    pub name: String,
    pub fields: BTreeSet<String>,
    pub records: Vec<TripRecord>,
    pub malformed: usize,
}

#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(rename = "tripduration")]
    trip_duration: Option<String>,
    #[serde(rename = "starttime")]
    start_time: Option<String>,
    #[serde(rename = "stoptime")]
    stop_time: Option<String>,
    #[serde(rename = "start station id")]
    start_station_id: Option<String>,
    #[serde(rename = "start station latitude")]
    start_lat: Option<String>,
    #[serde(rename = "start station longitude")]
    start_lon: Option<String>,
    #[serde(rename = "end station id")]
    end_station_id: Option<String>,
    #[serde(rename = "end station latitude")]
    end_lat: Option<String>,
    #[serde(rename = "end station longitude")]
    end_lon: Option<String>,
    #[serde(rename = "bikeid")]
    bike_id: Option<String>,
    #[serde(rename = "usertype")]
    user_type: Option<String>,
}

/// Decodes one partition's CSV text.
///
/// # Errors
///
/// [`AnalysisError::SchemaMismatch`] if a required column is missing from the
/// header; [`AnalysisError::Csv`] if the header itself cannot be read.
pub fn parse_partition(name: &str, csv_text: &[u8]) -> Result<Partition> {
    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(csv_text);

    let fields: BTreeSet<String> = rdr.headers()?.iter().map(str::to_string).collect();
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|c| !fields.contains(**c))
        .map(|c| c.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(AnalysisError::SchemaMismatch {
            partition: name.to_string(),
            missing,
            unexpected: Vec::new(),
        });
    }

    let headers = rdr.byte_headers()?.clone();
    let mut records = Vec::new();
    let mut malformed = 0usize;

    // Byte records so that only the columns in `RawRow` need to be UTF-8;
    // station names in older dumps are Latin-1.
    for result in rdr.byte_records() {
        let row = result
            .ok()
            .and_then(|record| record.deserialize::<RawRow>(Some(&headers)).ok());
        match row.and_then(validate) {
            Some(record) => records.push(record),
            None => malformed += 1,
        }
    }

    if malformed > 0 {
        warn!(partition = name, malformed, "Dropped malformed rows");
    }
    debug!(partition = name, records = records.len(), "Partition parsed");

    Ok(Partition {
        name: name.to_string(),
        fields,
        records,
        malformed,
    })
}

fn validate(row: RawRow) -> Option<TripRecord> {
    let duration: i64 = row.trip_duration.as_deref()?.parse().ok()?;
    let trip_duration_secs = u32::try_from(duration).ok()?;

    Some(TripRecord {
        start_time: parse_timestamp(row.start_time.as_deref())?,
        stop_time: parse_timestamp(row.stop_time.as_deref())?,
        trip_duration_secs,
        start_station: StationId(parse_id(row.start_station_id.as_deref())?),
        end_station: StationId(parse_id(row.end_station_id.as_deref())?),
        start_coord: parse_coordinate(row.start_lat.as_deref(), row.start_lon.as_deref())?,
        end_coord: parse_coordinate(row.end_lat.as_deref(), row.end_lon.as_deref())?,
        bike_id: BikeId(parse_id(row.bike_id.as_deref())?),
        user_type: UserType::from(row.user_type.unwrap_or_default()),
    })
}

/// Parses a feed timestamp in any of the known layouts.
pub fn parse_timestamp(s: Option<&str>) -> Option<NaiveDateTime> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

/// Numeric identifier; empty and `NULL` cells yield `None`.
fn parse_id(s: Option<&str>) -> Option<u32> {
    let s = s?.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("null") {
        return None;
    }
    s.parse().ok()
}

fn parse_coordinate(lat: Option<&str>, lon: Option<&str>) -> Option<Coordinate> {
    let lat: f64 = lat?.trim().parse().ok()?;
    let lon: f64 = lon?.trim().parse().ok()?;
    if !lat.is_finite() || !lon.is_finite() {
        return None;
    }
    Some(Coordinate::new(lat, lon))
}
