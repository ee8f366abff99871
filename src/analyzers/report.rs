//! Runs every analysis over one dataset and collects the results.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::info;

use crate::analyzers::{hourly_surprise, relocation, scalar, station_visits};
use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::model::Dataset;

/// The eight reported statistics, in reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Analysis {
    MedianTripDuration,
    SameStationFraction,
    StationVisitStddev,
    MeanTripLength,
    MonthlyDurationSpread,
    MaxSurpriseRatio,
    TimeLimitExceededFraction,
    MeanRelocationsPerBike,
}

impl Analysis {
    pub const ALL: [Analysis; 8] = [
        Analysis::MedianTripDuration,
        Analysis::SameStationFraction,
        Analysis::StationVisitStddev,
        Analysis::MeanTripLength,
        Analysis::MonthlyDurationSpread,
        Analysis::MaxSurpriseRatio,
        Analysis::TimeLimitExceededFraction,
        Analysis::MeanRelocationsPerBike,
    ];

    /// Human readable label with unit.
    pub fn label(self) -> &'static str {
        match self {
            Analysis::MedianTripDuration => "Median trip duration (s)",
            Analysis::SameStationFraction => "Fraction of rides starting and ending at the same station",
            Analysis::StationVisitStddev => "Std-dev of distinct stations visited per bike",
            Analysis::MeanTripLength => "Mean trip length, zero-length trips excluded (km)",
            Analysis::MonthlyDurationSpread => "Max minus min monthly mean trip duration (s)",
            Analysis::MaxSurpriseRatio => "Largest station-hour to system-hour usage ratio",
            Analysis::TimeLimitExceededFraction => "Fraction of rides exceeding their time limit",
            Analysis::MeanRelocationsPerBike => "Mean relocations per bike",
        }
    }

    /// Computes this statistic over `dataset`.
    pub fn compute(self, dataset: &Dataset, config: &AnalysisConfig) -> Result<f64> {
        match self {
            Analysis::MedianTripDuration => scalar::median_trip_duration(dataset),
            Analysis::SameStationFraction => scalar::same_station_fraction(dataset),
            Analysis::StationVisitStddev => station_visits::station_visit_stddev(dataset),
            Analysis::MeanTripLength => scalar::mean_trip_length(dataset),
            Analysis::MonthlyDurationSpread => scalar::monthly_duration_spread(dataset),
            Analysis::MaxSurpriseRatio => Ok(hourly_surprise::max_surprise_ratio(dataset)),
            Analysis::TimeLimitExceededFraction => {
                scalar::time_limit_exceeded_fraction(dataset, config)
            }
            Analysis::MeanRelocationsPerBike => relocation::mean_relocations_per_bike(dataset),
        }
    }
}

impl fmt::Display for Analysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One value per analysis, iterated in reporting order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AnalysisReport {
    values: BTreeMap<Analysis, f64>,
}

impl AnalysisReport {
    pub fn get(&self, analysis: Analysis) -> Option<f64> {
        self.values.get(&analysis).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Analysis, f64)> + '_ {
        self.values.iter().map(|(a, v)| (*a, *v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Computes all analyses concurrently on the rayon pool.
///
/// The analyses only read the dataset, so they share it without locking. The
/// first failing analysis (in reporting order) fails the whole report.
#[tracing::instrument(skip_all, fields(trips = dataset.len()))]
pub fn run_all(dataset: &Dataset, config: &AnalysisConfig) -> Result<AnalysisReport> {
    let mut slots: Vec<Option<Result<f64>>> = Analysis::ALL.iter().map(|_| None).collect();

    rayon::scope(|s| {
        for (analysis, slot) in Analysis::ALL.into_iter().zip(slots.iter_mut()) {
            s.spawn(move |_| *slot = Some(analysis.compute(dataset, config)));
        }
    });

    let mut values = BTreeMap::new();
    for (analysis, slot) in Analysis::ALL.into_iter().zip(slots) {
        if let Some(result) = slot {
            let value = result?;
            info!(analysis = ?analysis, value, "Analysis complete");
            values.insert(analysis, value);
        }
    }
    Ok(AnalysisReport { values })
}
