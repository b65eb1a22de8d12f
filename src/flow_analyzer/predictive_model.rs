use crate::config::PredictionConfig;
use crate::global_variables::{
    CARBON_ACCUMULATION_MINUTES, ESCALATION_SENSITIVITY, FORECAST_HORIZON_MINUTES,
    NEGLIGIBLE_FUEL_RATE_L_PER_MIN,
};
use crate::models::{VehicleId, VehicleSnapshot};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Minutes until the usable fuel budget runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FuelEta {
    Minutes(u64),
    /// Consumption is negligible; no meaningful ETA.
    Safe,
}

impl fmt::Display for FuelEta {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FuelEta::Minutes(m) => write!(f, "{} min", m),
            FuelEta::Safe => write!(f, "safe"),
        }
    }
}

/// Short-horizon forecast for one vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub vehicle_id: VehicleId,
    pub current_carbon_kg: f64,
    pub predicted_carbon_10min: f64,
    pub current_risk_score: f64,
    pub predicted_risk_score: f64,
    pub escalation_probability: f64,
    pub fuel_exhaustion: FuelEta,
}

impl Prediction {
    pub fn carbon_growing(&self) -> bool {
        self.predicted_carbon_10min > self.current_carbon_kg
    }
}

pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Carbon expected after the forecast horizon, extrapolating the implied per-minute rate.
pub fn predict_carbon(carbon_kg: f64, avg_speed_kmh: f64, efficiency: f64) -> f64 {
    let rate = carbon_kg / CARBON_ACCUMULATION_MINUTES;
    let speed_factor = 1.0 + (avg_speed_kmh - 60.0).max(0.0) / 100.0;
    let efficiency_penalty = ((5.0 - efficiency) / 5.0).max(0.0);
    let adjusted_rate = rate * speed_factor * (1.0 + 0.3 * efficiency_penalty);
    carbon_kg + FORECAST_HORIZON_MINUTES * adjusted_rate
}

pub fn predict_risk(current_risk: f64, alert_count: usize, carbon_kg: f64, avg_speed_kmh: f64) -> f64 {
    let alerts = alert_count as f64;
    let raw = 0.55 * current_risk
        + (8.0 * alerts).min(30.0)
        + (0.5 * carbon_kg).min(20.0)
        + (0.25 * (avg_speed_kmh - 90.0)).max(0.0);
    raw.clamp(0.0, 100.0)
}

pub fn escalation_probability(current_risk: f64, predicted_risk: f64, alert_count: usize) -> f64 {
    let alert_pressure = (5.0 * alert_count as f64).min(25.0);
    sigmoid(ESCALATION_SENSITIVITY * ((predicted_risk - current_risk) + alert_pressure))
}

pub fn fuel_exhaustion(carbon_kg: f64, config: &PredictionConfig) -> FuelEta {
    let litres_per_min = (carbon_kg / config.emission_factor) / CARBON_ACCUMULATION_MINUTES;
    if litres_per_min.is_nan() || litres_per_min <= NEGLIGIBLE_FUEL_RATE_L_PER_MIN {
        return FuelEta::Safe;
    }
    FuelEta::Minutes((config.usable_fuel_litres / litres_per_min).round().max(0.0) as u64)
}

/// Forecast from the snapshot, the number of recent alerts and the current risk score.
pub fn predict(
    snapshot: &VehicleSnapshot,
    recent_alert_count: usize,
    current_risk: f64,
    config: &PredictionConfig,
) -> Prediction {
    let predicted_risk_score = predict_risk(
        current_risk,
        recent_alert_count,
        snapshot.carbon_kg,
        snapshot.avg_speed_kmh,
    );

    Prediction {
        vehicle_id: snapshot.vehicle_id.clone(),
        current_carbon_kg: snapshot.carbon_kg,
        predicted_carbon_10min: predict_carbon(
            snapshot.carbon_kg,
            snapshot.avg_speed_kmh,
            snapshot.fuel_efficiency,
        ),
        current_risk_score: current_risk,
        predicted_risk_score,
        escalation_probability: escalation_probability(
            current_risk,
            predicted_risk_score,
            recent_alert_count,
        ),
        fuel_exhaustion: fuel_exhaustion(snapshot.carbon_kg, config),
    }
}

/// Descending escalation probability, ties by vehicle id ascending.
pub fn escalation_order(a: &Prediction, b: &Prediction) -> Ordering {
    b.escalation_probability
        .total_cmp(&a.escalation_probability)
        .then_with(|| a.vehicle_id.cmp(&b.vehicle_id))
}

pub fn rank_by_escalation(predictions: &mut [Prediction]) {
    predictions.sort_by(escalation_order);
}
