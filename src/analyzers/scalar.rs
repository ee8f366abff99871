//! Single-pass reductions over the whole dataset.

use chrono::Datelike;

use crate::analyzers::utility::{mean, median};
use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::model::Trip;

fn non_empty(trips: &[Trip], analysis: &'static str) -> Result<usize> {
    if trips.is_empty() {
        Err(AnalysisError::EmptyDataset { analysis })
    } else {
        Ok(trips.len())
    }
}

/// Median trip duration in seconds.
pub fn median_trip_duration(trips: &[Trip]) -> Result<f64> {
    median(trips.iter().map(|t| t.trip_duration_secs).collect()).ok_or(
        AnalysisError::EmptyDataset {
            analysis: "median_trip_duration",
        },
    )
}

/// Share of rides that return to the station they left from.
pub fn same_station_fraction(trips: &[Trip]) -> Result<f64> {
    let total = non_empty(trips, "same_station_fraction")?;
    let same = trips
        .iter()
        .filter(|t| t.start_station == t.end_station)
        .count();
    Ok(same as f64 / total as f64)
}

/// Mean great-circle trip length in km, ignoring zero-length trips.
///
/// A trip is zero-length when its endpoints coincide, which is not the same
/// thing as starting and ending at the same station id.
pub fn mean_trip_length(trips: &[Trip]) -> Result<f64> {
    let lengths: Vec<f64> = trips
        .iter()
        .map(|t| t.trip_length_km)
        .filter(|km| *km > 0.0)
        .collect();
    mean(&lengths).ok_or(AnalysisError::EmptyDataset {
        analysis: "mean_trip_length",
    })
}

/// Difference between the largest and smallest monthly mean duration.
///
/// Months are taken from the start time; months without trips are skipped.
pub fn monthly_duration_spread(trips: &[Trip]) -> Result<f64> {
    non_empty(trips, "monthly_duration_spread")?;

    let mut sums = [(0u64, 0usize); 12];
    for t in trips {
        let slot = &mut sums[t.start_time.month0() as usize];
        slot.0 += t.trip_duration_secs as u64;
        slot.1 += 1;
    }

    let (min, max) = sums
        .iter()
        .filter(|(_, n)| *n > 0)
        .map(|(sum, n)| *sum as f64 / *n as f64)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), m| {
            (lo.min(m), hi.max(m))
        });
    Ok(max - min)
}

/// Share of all rides that ran past their rider's free allowance.
///
/// Rides of unknown user type count toward the total but never as overages.
pub fn time_limit_exceeded_fraction(trips: &[Trip], config: &AnalysisConfig) -> Result<f64> {
    let total = non_empty(trips, "time_limit_exceeded_fraction")?;
    let exceeded = trips
        .iter()
        .filter(|t| {
            config
                .allowance_for(&t.user_type)
                .is_some_and(|limit| t.trip_duration_secs > limit)
        })
        .count();
    Ok(exceeded as f64 / total as f64)
}
