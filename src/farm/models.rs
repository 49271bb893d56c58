//! Sensor record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// GPS position and named zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub zone: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Health {
    /// healthy, sick or injured
    pub status: String,
    /// Celsius
    pub temperature: f64,
    /// Beats per minute
    pub heart_rate: u32,
    /// grazing, resting or moving
    pub activity: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CowSensors {
    pub temperature: f64,
    pub heart_rate: u32,
    pub activity: String,
    /// Percent
    pub battery_level: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cow {
    pub id: i64,
    pub name: String,
    pub tag: String,
    pub location: Location,
    pub health: Health,
    pub sensors: CowSensors,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoboDogSensors {
    pub temperature: f64,
    pub humidity: f64,
    pub motion_detected: bool,
    pub camera_status: String,
    pub audio_level: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoboDog {
    pub id: i64,
    pub name: String,
    /// active, idle, charging or maintenance
    pub status: String,
    pub location: Location,
    pub sensors: RoboDogSensors,
    pub battery_level: u8,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroneSensors {
    pub temperature: f64,
    pub humidity: f64,
    /// km/h
    pub wind_speed: f64,
    pub camera_status: String,
    /// Meters
    pub gps_accuracy: f64,
    /// AQI
    pub air_quality: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drone {
    pub id: i64,
    pub name: String,
    /// flying, landed, charging or maintenance
    pub status: String,
    pub location: Location,
    /// Meters
    pub altitude: f64,
    pub sensors: DroneSensors,
    pub battery_level: u8,
    pub last_updated: DateTime<Utc>,
}

/// Herd and fleet summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FarmState {
    pub total_cows: usize,
    pub healthy_cows: usize,
    pub sick_cows: usize,
    pub robodog_status: String,
    pub drone_status: String,
    pub last_updated: DateTime<Utc>,
}
