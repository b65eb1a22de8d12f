//! Engine configuration.

use crate::error::{FleetError, Result};
use crate::global_variables::{
    ALERT_LOG_CAPACITY, DEFAULT_USABLE_FUEL_LITRES, DIESEL_KG_CO2_PER_LITRE,
    RECENT_ALERT_WINDOW_MS, REPORT_HISTORY_CAPACITY, REPORT_WINDOW_MS,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Master configuration for the fleet engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Alert classification thresholds and log retention.
    pub alerts: AlertConfig,

    /// Forecasting parameters.
    pub prediction: PredictionConfig,

    /// Fleet report window and retention.
    pub report: ReportConfig,

    /// Crisis perturbation multipliers.
    pub crisis: CrisisMultipliers,
}

impl EngineConfig {
    /// Parse a configuration from a JSON string. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| FleetError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects factors and windows the engine cannot divide or step by.
    pub fn validate(&self) -> Result<()> {
        let factors = [
            ("prediction.emission_factor", self.prediction.emission_factor),
            ("crisis.carbon_rate", self.crisis.carbon_rate),
            ("crisis.fuel_burn", self.crisis.fuel_burn),
            ("crisis.deviation", self.crisis.deviation),
        ];
        for (name, value) in factors {
            if !(value.is_finite() && value > 0.0) {
                return Err(FleetError::Config(format!("{} must be positive, got {}", name, value)));
            }
        }
        if !(self.prediction.usable_fuel_litres.is_finite() && self.prediction.usable_fuel_litres >= 0.0) {
            return Err(FleetError::Config(format!(
                "prediction.usable_fuel_litres must be non-negative, got {}",
                self.prediction.usable_fuel_litres
            )));
        }
        if self.report.window_ms == 0 {
            return Err(FleetError::Config("report.window_ms must be positive".to_string()));
        }
        if self.alerts.log_capacity == 0 {
            return Err(FleetError::Config("alerts.log_capacity must be positive".to_string()));
        }
        Ok(())
    }

    /// Load a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())
            .map_err(|e| FleetError::Config(format!("{}: {}", path.as_ref().display(), e)))?;
        Self::from_json(&raw)
    }
}

/// Alert generator thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Speed above which a reading is a speed anomaly (km/h).
    pub max_speed_kmh: f64,

    /// Efficiency below which a reading is flagged inefficient (km/L).
    pub min_efficiency_km_per_l: f64,

    /// Distance from the planned route that counts as a deviation (km).
    pub route_bounds_km: f64,

    /// Speed below which an active vehicle is reported idle (km/h).
    pub idle_speed_kmh: f64,

    /// Alerts retained per vehicle before FIFO eviction.
    pub log_capacity: usize,

    /// Look-back window for "recent" alerts, ending at the snapshot's last update.
    pub recent_window_ms: u64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            max_speed_kmh: 120.0,
            min_efficiency_km_per_l: 3.0,
            route_bounds_km: 5.0,
            idle_speed_kmh: 5.0,
            log_capacity: ALERT_LOG_CAPACITY,
            recent_window_ms: RECENT_ALERT_WINDOW_MS,
        }
    }
}

/// Forecasting parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionConfig {
    /// Fuel available before the reserve is reached, for every vehicle class.
    pub usable_fuel_litres: f64,

    /// kg CO2 emitted per litre burned.
    pub emission_factor: f64,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            usable_fuel_litres: DEFAULT_USABLE_FUEL_LITRES,
            emission_factor: DIESEL_KG_CO2_PER_LITRE,
        }
    }
}

/// Fleet report settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Tumbling window length (ms).
    pub window_ms: u64,

    /// Reports retained in history.
    pub history_capacity: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            window_ms: REPORT_WINDOW_MS,
            history_capacity: REPORT_HISTORY_CAPACITY,
        }
    }
}

/// Multipliers applied to the crisis vehicle's inputs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrisisMultipliers {
    /// Scales the carbon total seen by the scorer and predictor.
    pub carbon_rate: f64,

    /// Divides fuel efficiency (more litres burned per km).
    pub fuel_burn: f64,

    /// Scales route deviation distance before classification.
    pub deviation: f64,

    /// Classify invocations per ingested event.
    pub alert_frequency: u32,
}

impl Default for CrisisMultipliers {
    fn default() -> Self {
        Self {
            carbon_rate: 1.8,
            fuel_burn: 1.5,
            deviation: 3.0,
            alert_frequency: 2,
        }
    }
}
