use crate::models::telemetry::TelemetryReading;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a fleet vehicle, e.g. `V-101`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VehicleId(pub String);

impl VehicleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<VehicleId> for String {
    fn from(id: VehicleId) -> Self {
        id.0
    }
}

impl From<&str> for VehicleId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Different classes of vehicles in the fleet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleClass {
    LightDelivery,
    Van,
    HeavyFreight,
}

impl fmt::Display for VehicleClass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            VehicleClass::LightDelivery => write!(f, "light delivery"),
            VehicleClass::Van => write!(f, "van"),
            VehicleClass::HeavyFreight => write!(f, "heavy freight"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleStatus {
    #[default]
    Active,
    Idle,
    Maintenance,
}

impl fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            VehicleStatus::Active => write!(f, "active"),
            VehicleStatus::Idle => write!(f, "idle"),
            VehicleStatus::Maintenance => write!(f, "maintenance"),
        }
    }
}

/// Immutable identity of a fleet vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: VehicleId,
    pub name: String,
    pub class: VehicleClass,
}

impl Vehicle {
    pub fn new(id: impl Into<String>, name: impl Into<String>, class: VehicleClass) -> Self {
        Self {
            id: VehicleId::new(id),
            name: name.into(),
            class,
        }
    }
}

/// Latest known metrics for one vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleSnapshot {
    pub vehicle_id: VehicleId,
    /// Cumulative carbon emitted (kg CO2).
    pub carbon_kg: f64,
    /// Latest fuel efficiency estimate (km/L).
    pub fuel_efficiency: f64,
    /// Running mean of all speed readings (km/h).
    pub avg_speed_kmh: f64,
    pub trip_count: u32,
    /// Lifetime number of alerts raised for this vehicle.
    pub alert_count: u32,
    pub status: VehicleStatus,
    pub speed_samples: u64,
    /// Timestamp of the last applied telemetry (ms since epoch).
    pub last_updated_ms: u64,
    /// Bumped on every mutation; keys the evaluation cache.
    pub version: u64,
}

impl VehicleSnapshot {
    /// Fresh snapshot for a newly registered vehicle.
    pub fn new(vehicle_id: VehicleId, registered_at_ms: u64) -> Self {
        Self {
            vehicle_id,
            carbon_kg: 0.0,
            fuel_efficiency: 0.0,
            avg_speed_kmh: 0.0,
            trip_count: 0,
            alert_count: 0,
            status: VehicleStatus::Active,
            speed_samples: 0,
            last_updated_ms: registered_at_ms,
            version: 0,
        }
    }

    /// Fold one validated telemetry reading into the snapshot.
    pub fn apply(&mut self, reading: &TelemetryReading, timestamp_ms: u64, emission_factor: f64) {
        let samples = self.speed_samples as f64;
        self.avg_speed_kmh = (self.avg_speed_kmh * samples + reading.speed_kmh) / (samples + 1.0);
        self.speed_samples += 1;

        self.fuel_efficiency = reading.fuel_efficiency;
        self.carbon_kg += reading.fuel_litres * emission_factor;

        if let Some(status) = reading.status {
            self.status = status;
        }
        if reading.trip_completed {
            self.trip_count += 1;
        }
        self.last_updated_ms = self.last_updated_ms.max(timestamp_ms);
        self.version += 1;
    }

    pub fn record_alert(&mut self) {
        self.alert_count += 1;
        self.version += 1;
    }
}
