use crate::models::vehicle::{VehicleId, VehicleStatus};
use serde::{Deserialize, Serialize};

/// Ambient weather reported alongside a telemetry sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    Clear,
    Cloudy,
    Rain,
    Wind,
    Fog,
    Snow,
    Storm,
}

impl WeatherCondition {
    /// Conditions that make operating the vehicle dangerous.
    pub fn is_severe(self) -> bool {
        matches!(
            self,
            WeatherCondition::Storm | WeatherCondition::Snow | WeatherCondition::Fog
        )
    }

    /// Conditions that degrade but do not stop operations.
    pub fn is_adverse(self) -> bool {
        matches!(self, WeatherCondition::Rain | WeatherCondition::Wind)
    }
}

/// Metric deltas carried by one telemetry event, as received from ingestion.
///
/// Speed and fuel efficiency are required; everything else is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryDelta {
    pub speed_kmh: Option<f64>,
    pub fuel_efficiency: Option<f64>,
    /// Fuel burned since the previous event (L).
    pub fuel_litres: Option<f64>,
    pub route_deviation_km: Option<f64>,
    pub weather: Option<WeatherCondition>,
    pub status: Option<VehicleStatus>,
    pub trip_completed: bool,
}

/// A validated delta: every required metric present, finite and non-negative.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryReading {
    pub speed_kmh: f64,
    pub fuel_efficiency: f64,
    pub fuel_litres: f64,
    pub route_deviation_km: Option<f64>,
    pub weather: Option<WeatherCondition>,
    pub status: Option<VehicleStatus>,
    pub trip_completed: bool,
}

fn usable(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

impl TelemetryDelta {
    /// Returns `None` for malformed deltas.
    pub fn validate(&self) -> Option<TelemetryReading> {
        let speed_kmh = self.speed_kmh.filter(|v| usable(*v))?;
        let fuel_efficiency = self.fuel_efficiency.filter(|v| usable(*v))?;
        let fuel_litres = match self.fuel_litres {
            Some(v) if !usable(v) => return None,
            Some(v) => v,
            None => 0.0,
        };
        if let Some(km) = self.route_deviation_km {
            if !usable(km) {
                return None;
            }
        }

        Some(TelemetryReading {
            speed_kmh,
            fuel_efficiency,
            fuel_litres,
            route_deviation_km: self.route_deviation_km,
            weather: self.weather,
            status: self.status,
            trip_completed: self.trip_completed,
        })
    }
}

/// One telemetry update event from the ingestion collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryEvent {
    pub vehicle_id: VehicleId,
    pub timestamp_ms: u64,
    pub delta: TelemetryDelta,
}

impl TelemetryEvent {
    pub fn new(vehicle_id: impl Into<String>, timestamp_ms: u64, delta: TelemetryDelta) -> Self {
        Self {
            vehicle_id: VehicleId::new(vehicle_id),
            timestamp_ms,
            delta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> TelemetryDelta {
        TelemetryDelta {
            speed_kmh: Some(72.0),
            fuel_efficiency: Some(5.8),
            fuel_litres: Some(1.2),
            ..Default::default()
        }
    }

    #[test]
    fn test_complete_delta_validates() {
        let reading = complete().validate().unwrap();
        assert!((reading.speed_kmh - 72.0).abs() < f64::EPSILON);
        assert!((reading.fuel_litres - 1.2).abs() < f64::EPSILON);
    }

    #[test]
    fn test_missing_required_metric_is_rejected() {
        let mut delta = complete();
        delta.speed_kmh = None;
        assert!(delta.validate().is_none());

        let mut delta = complete();
        delta.fuel_efficiency = None;
        assert!(delta.validate().is_none());
    }

    #[test]
    fn test_non_finite_or_negative_values_are_rejected() {
        let mut delta = complete();
        delta.speed_kmh = Some(f64::NAN);
        assert!(delta.validate().is_none());

        let mut delta = complete();
        delta.fuel_litres = Some(-3.0);
        assert!(delta.validate().is_none());

        let mut delta = complete();
        delta.route_deviation_km = Some(f64::INFINITY);
        assert!(delta.validate().is_none());
    }

    #[test]
    fn test_missing_fuel_defaults_to_zero() {
        let mut delta = complete();
        delta.fuel_litres = None;
        assert_eq!(delta.validate().unwrap().fuel_litres, 0.0);
    }

    #[test]
    fn test_event_deserializes_from_json() {
        let json = r#"{
            "vehicle_id": "V-104",
            "timestamp_ms": 1000,
            "delta": { "speed_kmh": 40.0, "fuel_efficiency": 4.2, "weather": "storm" }
        }"#;
        let event: TelemetryEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.vehicle_id.as_str(), "V-104");
        assert_eq!(event.delta.weather, Some(WeatherCondition::Storm));
        assert!(!event.delta.trip_completed);
    }

    #[test]
    fn test_weather_classes() {
        assert!(WeatherCondition::Storm.is_severe());
        assert!(!WeatherCondition::Rain.is_severe());
        assert!(WeatherCondition::Rain.is_adverse());
        assert!(!WeatherCondition::Clear.is_adverse());
    }
}
