//! Trip records as ingested, and the enriched dataset the analyses read.

use chrono::NaiveDateTime;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

use crate::distance::haversine_km;

/// Dock station identifier as published in the trip feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StationId(pub u32);

/// Bicycle identifier as published in the trip feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BikeId(pub u32);

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for BikeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Latitude/longitude in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Rider category; decides the free-ride allowance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum UserType {
    Customer,
    Subscriber,
    Other(String),
}

impl From<String> for UserType {
    fn from(s: String) -> Self {
        match s.trim() {
            "Customer" => UserType::Customer,
            "Subscriber" => UserType::Subscriber,
            other => UserType::Other(other.to_string()),
        }
    }
}

impl From<UserType> for String {
    fn from(u: UserType) -> Self {
        match u {
            UserType::Customer => "Customer".into(),
            UserType::Subscriber => "Subscriber".into(),
            UserType::Other(s) => s,
        }
    }
}

/// One ride exactly as read from a partition, coordinates included.
#[derive(Debug, Clone, PartialEq)]
pub struct TripRecord {
    pub start_time: NaiveDateTime,
    pub stop_time: NaiveDateTime,
    pub trip_duration_secs: u32,
    pub start_station: StationId,
    pub end_station: StationId,
    pub start_coord: Coordinate,
    pub end_coord: Coordinate,
    pub bike_id: BikeId,
    pub user_type: UserType,
}

impl TripRecord {
    /// Drops the coordinates in favor of the great-circle length between them.
    pub fn into_trip(self) -> Trip {
        let trip_length_km = haversine_km(self.start_coord, self.end_coord);
        Trip {
            start_time: self.start_time,
            stop_time: self.stop_time,
            trip_duration_secs: self.trip_duration_secs,
            start_station: self.start_station,
            end_station: self.end_station,
            bike_id: self.bike_id,
            user_type: self.user_type,
            trip_length_km,
        }
    }
}

/// An enriched ride. This is also the row layout of a dataset snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    #[serde(rename = "starttime")]
    pub start_time: NaiveDateTime,
    #[serde(rename = "stoptime")]
    pub stop_time: NaiveDateTime,
    #[serde(rename = "tripduration")]
    pub trip_duration_secs: u32,
    #[serde(rename = "start station id")]
    pub start_station: StationId,
    #[serde(rename = "end station id")]
    pub end_station: StationId,
    #[serde(rename = "bikeid")]
    pub bike_id: BikeId,
    #[serde(rename = "usertype")]
    pub user_type: UserType,
    #[serde(rename = "trip length")]
    pub trip_length_km: f64,
}

/// The merged, enriched and from here on read-only set of trips.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    trips: Vec<Trip>,
}

impl Dataset {
    /// Computes `trip_length_km` for every record in parallel, keeping row order.
    pub fn enrich(records: Vec<TripRecord>) -> Self {
        let trips = records.into_par_iter().map(TripRecord::into_trip).collect();
        Self { trips }
    }

    /// Wraps trips that are already enriched, e.g. read back from a snapshot.
    pub fn from_trips(trips: Vec<Trip>) -> Self {
        Self { trips }
    }

    pub fn trips(&self) -> &[Trip] {
        &self.trips
    }
}

impl Deref for Dataset {
    type Target = [Trip];

    fn deref(&self) -> &[Trip] {
        &self.trips
    }
}
