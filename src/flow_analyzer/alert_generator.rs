use crate::config::AlertConfig;
use crate::models::{
    Alert, AlertType, Severity, TelemetryDelta, TelemetryReading, VehicleId, VehicleStatus,
};

/// Why an alert was raised. Each cause maps to a fixed type and severity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AlertCause {
    SevereWeather,
    RouteDeviation { deviation_km: f64 },
    SpeedAnomaly { speed_kmh: f64 },
    LowEfficiency { efficiency: f64 },
    AdverseWeather,
    IdleAnomaly { speed_kmh: f64 },
}

impl AlertCause {
    pub fn alert_type(&self) -> AlertType {
        match self {
            AlertCause::SevereWeather | AlertCause::AdverseWeather => AlertType::Weather,
            AlertCause::RouteDeviation { .. } => AlertType::Deviation,
            AlertCause::SpeedAnomaly { .. } | AlertCause::IdleAnomaly { .. } => AlertType::Anomaly,
            AlertCause::LowEfficiency { .. } => AlertType::Inefficiency,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            AlertCause::SevereWeather => Severity::Critical,
            AlertCause::RouteDeviation { .. } | AlertCause::SpeedAnomaly { .. } => Severity::High,
            AlertCause::LowEfficiency { .. } | AlertCause::AdverseWeather => Severity::Medium,
            AlertCause::IdleAnomaly { .. } => Severity::Low,
        }
    }
}

/// Classifies telemetry readings into typed alerts.
#[derive(Debug, Clone)]
pub struct AlertGenerator {
    config: AlertConfig,
}

impl AlertGenerator {
    pub fn new(config: AlertConfig) -> Self {
        Self { config }
    }

    /// First matching cause, most severe checks first.
    pub fn classify_cause(
        &self,
        status: VehicleStatus,
        reading: &TelemetryReading,
    ) -> Option<AlertCause> {
        let cfg = &self.config;

        if reading.weather.is_some_and(|w| w.is_severe()) {
            return Some(AlertCause::SevereWeather);
        }
        if let Some(deviation_km) = reading.route_deviation_km {
            if deviation_km > cfg.route_bounds_km {
                return Some(AlertCause::RouteDeviation { deviation_km });
            }
        }
        if reading.speed_kmh > cfg.max_speed_kmh {
            return Some(AlertCause::SpeedAnomaly {
                speed_kmh: reading.speed_kmh,
            });
        }
        // Zero efficiency means no fuel was burned in the sample, not an inefficiency.
        if reading.fuel_efficiency > 0.0 && reading.fuel_efficiency < cfg.min_efficiency_km_per_l
        {
            return Some(AlertCause::LowEfficiency {
                efficiency: reading.fuel_efficiency,
            });
        }
        if reading.weather.is_some_and(|w| w.is_adverse()) {
            return Some(AlertCause::AdverseWeather);
        }
        let effective_status = reading.status.unwrap_or(status);
        if effective_status == VehicleStatus::Active && reading.speed_kmh < cfg.idle_speed_kmh {
            return Some(AlertCause::IdleAnomaly {
                speed_kmh: reading.speed_kmh,
            });
        }
        None
    }

    /// Produce at most one alert for a validated reading. `next_id` is only
    /// called when an alert is actually raised.
    pub fn classify(
        &self,
        vehicle_id: &VehicleId,
        status: VehicleStatus,
        reading: &TelemetryReading,
        timestamp_ms: u64,
        next_id: impl FnOnce() -> u64,
    ) -> Option<Alert> {
        let cause = self.classify_cause(status, reading)?;
        Some(Alert {
            id: next_id(),
            vehicle_id: vehicle_id.clone(),
            alert_type: cause.alert_type(),
            severity: cause.severity(),
            message: describe(vehicle_id, &cause, reading),
            timestamp_ms,
        })
    }

    /// Validate a raw delta and classify it. Malformed deltas yield no alert.
    pub fn classify_delta(
        &self,
        vehicle_id: &VehicleId,
        status: VehicleStatus,
        delta: &TelemetryDelta,
        timestamp_ms: u64,
        next_id: impl FnOnce() -> u64,
    ) -> Option<Alert> {
        let reading = delta.validate()?;
        self.classify(vehicle_id, status, &reading, timestamp_ms, next_id)
    }
}

fn describe(vehicle_id: &VehicleId, cause: &AlertCause, reading: &TelemetryReading) -> String {
    match cause {
        AlertCause::SevereWeather => format!(
            "Vehicle {} operating in severe weather ({:?})",
            vehicle_id,
            reading.weather
        ),
        AlertCause::RouteDeviation { deviation_km } => format!(
            "Vehicle {} is {:.1} km from its expected route",
            vehicle_id, deviation_km
        ),
        AlertCause::SpeedAnomaly { speed_kmh } => format!(
            "Vehicle {} speed threshold exceeded: {:.0} km/h",
            vehicle_id, speed_kmh
        ),
        AlertCause::LowEfficiency { efficiency } => format!(
            "Vehicle {} fuel efficiency below threshold: {:.1} km/L",
            vehicle_id, efficiency
        ),
        AlertCause::AdverseWeather => format!(
            "Vehicle {} operating in adverse weather ({:?})",
            vehicle_id,
            reading.weather
        ),
        AlertCause::IdleAnomaly { speed_kmh } => format!(
            "Vehicle {} idling while active ({:.1} km/h)",
            vehicle_id, speed_kmh
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WeatherCondition;

    fn reading(speed: f64, efficiency: f64) -> TelemetryReading {
        TelemetryReading {
            speed_kmh: speed,
            fuel_efficiency: efficiency,
            fuel_litres: 1.0,
            route_deviation_km: None,
            weather: None,
            status: None,
            trip_completed: false,
        }
    }

    fn generator() -> AlertGenerator {
        AlertGenerator::new(AlertConfig::default())
    }

    #[test]
    fn test_normal_reading_raises_nothing() {
        let cause = generator().classify_cause(VehicleStatus::Active, &reading(70.0, 6.0));
        assert!(cause.is_none());
    }

    #[test]
    fn test_severe_weather_is_critical() {
        let mut r = reading(70.0, 6.0);
        r.weather = Some(WeatherCondition::Storm);
        let alert = generator()
            .classify(&VehicleId::from("V-101"), VehicleStatus::Active, &r, 10, || 7)
            .unwrap();
        assert_eq!(alert.alert_type, AlertType::Weather);
        assert_eq!(alert.severity, Severity::Critical);
        assert_eq!(alert.id, 7);
        assert_eq!(alert.timestamp_ms, 10);
    }

    #[test]
    fn test_severe_weather_wins_over_deviation() {
        let mut r = reading(150.0, 2.0);
        r.weather = Some(WeatherCondition::Snow);
        r.route_deviation_km = Some(20.0);
        let cause = generator().classify_cause(VehicleStatus::Active, &r).unwrap();
        assert_eq!(cause, AlertCause::SevereWeather);
    }

    #[test]
    fn test_route_deviation_over_bounds() {
        let mut r = reading(70.0, 6.0);
        r.route_deviation_km = Some(5.0);
        assert!(generator().classify_cause(VehicleStatus::Active, &r).is_none());

        r.route_deviation_km = Some(5.5);
        let cause = generator().classify_cause(VehicleStatus::Active, &r).unwrap();
        assert_eq!(cause.alert_type(), AlertType::Deviation);
        assert_eq!(cause.severity(), Severity::High);
    }

    #[test]
    fn test_speed_and_efficiency_thresholds() {
        let g = generator();
        let speed = g.classify_cause(VehicleStatus::Active, &reading(130.0, 6.0)).unwrap();
        assert_eq!(speed.alert_type(), AlertType::Anomaly);
        assert_eq!(speed.severity(), Severity::High);

        let eff = g.classify_cause(VehicleStatus::Active, &reading(60.0, 2.4)).unwrap();
        assert_eq!(eff.alert_type(), AlertType::Inefficiency);
        assert_eq!(eff.severity(), Severity::Medium);

        assert!(g.classify_cause(VehicleStatus::Active, &reading(60.0, 0.0)).is_none());
    }

    #[test]
    fn test_idle_only_for_active_vehicles() {
        let g = generator();
        let idle = g.classify_cause(VehicleStatus::Active, &reading(2.0, 6.0)).unwrap();
        assert_eq!(idle.severity(), Severity::Low);
        assert!(g.classify_cause(VehicleStatus::Idle, &reading(2.0, 6.0)).is_none());

        let mut parked = reading(0.0, 6.0);
        parked.status = Some(VehicleStatus::Maintenance);
        assert!(g.classify_cause(VehicleStatus::Active, &parked).is_none());
    }

    #[test]
    fn test_malformed_delta_is_skipped_without_consuming_an_id() {
        let delta = TelemetryDelta {
            speed_kmh: None,
            fuel_efficiency: Some(1.0),
            ..Default::default()
        };
        let mut ids_taken = 0;
        let alert = generator().classify_delta(
            &VehicleId::from("V-101"),
            VehicleStatus::Active,
            &delta,
            0,
            || {
                ids_taken += 1;
                1
            },
        );
        assert!(alert.is_none());
        assert_eq!(ids_taken, 0);
    }
}
