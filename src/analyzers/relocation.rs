//! Detection of bikes moved between trips by the operator.
//!
//! A bike counts as moved before a trip when that trip starts somewhere other
//! than where the same bike's previous trip (by start time) ended. A bike's
//! first trip is never a move.

use std::collections::HashMap;

use crate::analyzers::utility::mean;
use crate::error::{AnalysisError, Result};
use crate::model::{BikeId, StationId, Trip};

/// Moved flag for each trip of one bike, in chronological order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BikeRelocations {
    pub bike_id: BikeId,
    pub moved: Vec<bool>,
}

impl BikeRelocations {
    pub fn moved_count(&self) -> usize {
        self.moved.iter().filter(|m| **m).count()
    }
}

/// Flags the trips of a single bike, which must already be in time order.
pub fn scan_bike(trips: &[&Trip]) -> Vec<bool> {
    let mut previous_end: Option<StationId> = None;
    trips
        .iter()
        .map(|t| {
            let moved = previous_end.is_some_and(|end| end != t.start_station);
            previous_end = Some(t.end_station);
            moved
        })
        .collect()
}

/// Per-bike moved flags, bikes ordered by id.
///
/// Each bike's trips are stably sorted by start time, so trips sharing a start
/// time stay in dataset order.
pub fn relocation_flags(trips: &[Trip]) -> Vec<BikeRelocations> {
    let mut by_bike: HashMap<BikeId, Vec<&Trip>> = HashMap::new();
    for t in trips {
        by_bike.entry(t.bike_id).or_default().push(t);
    }

    let mut result: Vec<BikeRelocations> = by_bike
        .into_iter()
        .map(|(bike_id, mut history)| {
            history.sort_by_key(|t| t.start_time);
            BikeRelocations {
                bike_id,
                moved: scan_bike(&history),
            }
        })
        .collect();
    result.sort_by_key(|r| r.bike_id);
    result
}

/// Mean number of relocations per bike.
pub fn mean_relocations_per_bike(trips: &[Trip]) -> Result<f64> {
    let counts: Vec<f64> = relocation_flags(trips)
        .iter()
        .map(|b| b.moved_count() as f64)
        .collect();
    mean(&counts).ok_or(AnalysisError::EmptyDataset {
        analysis: "mean_relocations_per_bike",
    })
}
