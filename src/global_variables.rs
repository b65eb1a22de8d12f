// Risk formula weights. Every consumer reads these, never its own copy.
pub const WEIGHT_ALERTS: f64 = 0.35;
pub const WEIGHT_EFFICIENCY: f64 = 0.25;
pub const WEIGHT_CARBON: f64 = 0.25;
pub const WEIGHT_STATUS: f64 = 0.15;

pub const RISK_FORMULA: &str = "0.35(alerts) + 0.25(efficiency) + 0.25(carbon) + 0.15(status)";

// Risk sub-score inputs
pub const ALERT_POINTS_PER_ALERT: f64 = 18.0;
pub const CARBON_SATURATION_KG: f64 = 500.0;

// State machine thresholds
pub const CRITICAL_EFFICIENCY_KM_PER_L: f64 = 2.5;
pub const CRITICAL_RECENT_ALERTS: usize = 3;
pub const HIGH_EMISSION_KG: f64 = 300.0;
pub const IDLE_SPEED_KMH: f64 = 5.0;
pub const EFFICIENT_KM_PER_L: f64 = 6.5;

// Windows (milliseconds)
pub const RECENT_ALERT_WINDOW_MS: u64 = 5 * 60 * 1000;
pub const REPORT_WINDOW_MS: u64 = 5 * 60 * 1000;

// Predictive model
pub const CARBON_ACCUMULATION_MINUTES: f64 = 5.0;
pub const FORECAST_HORIZON_MINUTES: f64 = 10.0;
pub const ESCALATION_SENSITIVITY: f64 = 0.08;
pub const DIESEL_KG_CO2_PER_LITRE: f64 = 2.68;
pub const DEFAULT_USABLE_FUEL_LITRES: f64 = 30.0;
pub const NEGLIGIBLE_FUEL_RATE_L_PER_MIN: f64 = 0.01;

// Retention
pub const ALERT_LOG_CAPACITY: usize = 50;
pub const REPORT_HISTORY_CAPACITY: usize = 5;
pub const DEFAULT_ALERT_QUERY_LIMIT: usize = 50;
