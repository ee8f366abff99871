//! How evenly bikes spread across the station network.

use std::collections::{HashMap, HashSet};

use crate::analyzers::utility::population_stddev;
use crate::error::{AnalysisError, Result};
use crate::model::{BikeId, StationId, Trip};

/// Number of distinct stations (start or end) each bike touched.
pub fn distinct_stations_per_bike(trips: &[Trip]) -> HashMap<BikeId, usize> {
    let mut visited: HashMap<BikeId, HashSet<StationId>> = HashMap::new();
    for t in trips {
        let stations = visited.entry(t.bike_id).or_default();
        stations.insert(t.start_station);
        stations.insert(t.end_station);
    }
    visited
        .into_iter()
        .map(|(bike, stations)| (bike, stations.len()))
        .collect()
}

/// Population standard deviation of the distinct-station count per bike.
pub fn station_visit_stddev(trips: &[Trip]) -> Result<f64> {
    let counts: Vec<f64> = distinct_stations_per_bike(trips)
        .into_values()
        .map(|n| n as f64)
        .collect();
    population_stddev(&counts).ok_or(AnalysisError::EmptyDataset {
        analysis: "station_visit_stddev",
    })
}
