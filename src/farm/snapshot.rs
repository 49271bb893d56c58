//! In-memory telemetry snapshot.

use chrono::{DateTime, Utc};

use crate::farm::models::{
    Cow, CowSensors, Drone, DroneSensors, FarmState, Health, Location, RoboDog, RoboDogSensors,
};

/// Every record the service can serve, captured once at startup.
#[derive(Debug, Clone)]
pub struct FarmSnapshot {
    pub cows: Vec<Cow>,
    pub robodog: RoboDog,
    pub drone: Drone,
}

fn location(latitude: f64, longitude: f64, zone: &str) -> Location {
    Location {
        latitude,
        longitude,
        zone: zone.to_string(),
    }
}

struct CowReading {
    status: &'static str,
    temperature: f64,
    heart_rate: u32,
    activity: &'static str,
    battery_level: u8,
}

fn cow(id: i64, name: &str, at: Location, r: CowReading, now: DateTime<Utc>) -> Cow {
    Cow {
        id,
        name: name.to_string(),
        tag: format!("COW-{id:03}"),
        location: at,
        health: Health {
            status: r.status.to_string(),
            temperature: r.temperature,
            heart_rate: r.heart_rate,
            activity: r.activity.to_string(),
        },
        sensors: CowSensors {
            temperature: r.temperature,
            heart_rate: r.heart_rate,
            activity: r.activity.to_string(),
            battery_level: r.battery_level,
        },
        last_updated: now,
    }
}

impl FarmSnapshot {
    /// The demo herd and fleet, stamped with `now`.
    pub fn mock(now: DateTime<Utc>) -> Self {
        let cows = vec![
            cow(
                1,
                "Bessie",
                location(40.7128, -74.0060, "Pasture A"),
                CowReading { status: "healthy", temperature: 38.5, heart_rate: 65, activity: "grazing", battery_level: 85 },
                now,
            ),
            cow(
                2,
                "Daisy",
                location(40.7130, -74.0062, "Pasture A"),
                CowReading { status: "healthy", temperature: 38.7, heart_rate: 70, activity: "resting", battery_level: 92 },
                now,
            ),
            cow(
                3,
                "Moo",
                location(40.7125, -74.0058, "Pasture B"),
                CowReading { status: "sick", temperature: 39.8, heart_rate: 85, activity: "resting", battery_level: 78 },
                now,
            ),
            cow(
                4,
                "Clover",
                location(40.7135, -74.0065, "Pasture B"),
                CowReading { status: "healthy", temperature: 38.4, heart_rate: 62, activity: "moving", battery_level: 88 },
                now,
            ),
            cow(
                5,
                "Buttercup",
                location(40.7120, -74.0063, "Pasture A"),
                CowReading { status: "healthy", temperature: 38.6, heart_rate: 68, activity: "grazing", battery_level: 90 },
                now,
            ),
        ];

        let robodog = RoboDog {
            id: 1,
            name: "Rex".to_string(),
            status: "active".to_string(),
            location: location(40.7129, -74.0061, "Central Area"),
            sensors: RoboDogSensors {
                temperature: 22.5,
                humidity: 65.0,
                motion_detected: true,
                camera_status: "active".to_string(),
                audio_level: 45.2,
            },
            battery_level: 72,
            last_updated: now,
        };

        let drone = Drone {
            id: 1,
            name: "SkyEye".to_string(),
            status: "flying".to_string(),
            location: location(40.7132, -74.0059, "Airspace"),
            altitude: 150.0,
            sensors: DroneSensors {
                temperature: 18.3,
                humidity: 58.0,
                wind_speed: 12.5,
                camera_status: "active".to_string(),
                gps_accuracy: 2.5,
                air_quality: 45.0,
            },
            battery_level: 68,
            last_updated: now,
        };

        Self { cows, robodog, drone }
    }

    pub fn cow(&self, id: i64) -> Option<&Cow> {
        self.cows.iter().find(|c| c.id == id)
    }

    pub fn state(&self, now: DateTime<Utc>) -> FarmState {
        let count = |status: &str| self.cows.iter().filter(|c| c.health.status == status).count();
        FarmState {
            total_cows: self.cows.len(),
            healthy_cows: count("healthy"),
            sick_cows: count("sick"),
            robodog_status: self.robodog.status.clone(),
            drone_status: self.drone.status.clone(),
            last_updated: now,
        }
    }
}
