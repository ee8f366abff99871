//! Station-hour pairs whose traffic share departs most from the system's.
//!
//! For a station `s` and hour `h` the surprise ratio is
//!
//! ```text
//!        count(h, s) / count(s)
//! r = ---------------------------
//!        count(h)    / count(*)
//! ```
//!
//! A ratio of 1.0 means the station is used in that hour exactly as often,
//! relatively, as the system as a whole.

use chrono::Timelike;
use std::collections::HashMap;

use crate::model::{StationId, Trip};

/// Surprise ratio of one station-hour pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StationHourRatio {
    pub hour: u32,
    pub station: StationId,
    pub ratio: f64,
}

/// Ratios for every station-hour pair that saw at least one departure.
pub fn station_hour_ratios(trips: &[Trip]) -> Vec<StationHourRatio> {
    let total = trips.len();
    let mut station_totals: HashMap<StationId, usize> = HashMap::new();
    let mut hour_totals = [0usize; 24];
    let mut pair_counts: HashMap<(u32, StationId), usize> = HashMap::new();

    for t in trips {
        let hour = t.start_time.hour();
        *station_totals.entry(t.start_station).or_default() += 1;
        hour_totals[hour as usize] += 1;
        *pair_counts.entry((hour, t.start_station)).or_default() += 1;
    }

    // Every pair with a count implies a non-zero station total and hour total.
    pair_counts
        .into_iter()
        .map(|((hour, station), count)| {
            let station_fraction = count as f64 / station_totals[&station] as f64;
            let system_fraction = hour_totals[hour as usize] as f64 / total as f64;
            StationHourRatio {
                hour,
                station,
                ratio: station_fraction / system_fraction,
            }
        })
        .collect()
}

/// The pair with the largest ratio, if any trip exists.
pub fn most_surprising(trips: &[Trip]) -> Option<StationHourRatio> {
    station_hour_ratios(trips)
        .into_iter()
        .max_by(|a, b| a.ratio.total_cmp(&b.ratio))
}

/// Largest surprise ratio over all pairs.
///
/// Floors at 0.0: an empty dataset yields 0.0 instead of an error, unlike the
/// other analyses.
pub fn max_surprise_ratio(trips: &[Trip]) -> f64 {
    station_hour_ratios(trips)
        .iter()
        .fold(0.0, |best, r| f64::max(best, r.ratio))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_support::trip_at;

    const EPS: f64 = 1e-12;

    #[test]
    fn test_empty_dataset_floors_at_zero() {
        assert_eq!(max_surprise_ratio(&[]), 0.0);
        assert!(most_surprising(&[]).is_none());
    }

    #[test]
    fn test_single_station_matches_system() {
        // Only one station, so its hourly profile is the system's.
        let trips = vec![
            trip_at(1, 7, 8, (1, 1, 8, 0), 60),
            trip_at(2, 7, 8, (1, 1, 8, 30), 60),
            trip_at(3, 7, 8, (1, 1, 17, 0), 60),
        ];
        assert!((max_surprise_ratio(&trips) - 1.0).abs() < EPS);
        for r in station_hour_ratios(&trips) {
            assert!((r.ratio - 1.0).abs() < EPS);
        }
    }

    #[test]
    fn test_hour_concentrated_station() {
        // Station 1 only departs at 08h; station 2 departs at 08h and 3 times at 18h.
        //   system share of 08h = 2/5
        //   station 1 at 08h: 1/1 -> ratio 2.5
        //   station 2 at 18h: 3/4 over 3/5 -> 1.25
        let trips = vec![
            trip_at(1, 1, 9, (1, 1, 8, 0), 60),
            trip_at(2, 2, 9, (1, 1, 8, 10), 60),
            trip_at(3, 2, 9, (1, 1, 18, 0), 60),
            trip_at(4, 2, 9, (1, 2, 18, 0), 60),
            trip_at(5, 2, 9, (1, 3, 18, 0), 60),
        ];
        let best = most_surprising(&trips).unwrap();
        assert_eq!(best.station, StationId(1));
        assert_eq!(best.hour, 8);
        assert!((best.ratio - 2.5).abs() < EPS);
        assert!((max_surprise_ratio(&trips) - 2.5).abs() < EPS);

        let evening = station_hour_ratios(&trips)
            .into_iter()
            .find(|r| r.station == StationId(2) && r.hour == 18)
            .unwrap();
        assert!((evening.ratio - 1.25).abs() < EPS);
    }

    #[test]
    fn test_only_departures_count() {
        // Station 9 is only ever an end station, so it gets no pairs.
        let trips = vec![
            trip_at(1, 1, 9, (1, 1, 8, 0), 60),
            trip_at(2, 2, 9, (1, 1, 9, 0), 60),
        ];
        assert!(
            station_hour_ratios(&trips)
                .iter()
                .all(|r| r.station != StationId(9))
        );
    }
}
