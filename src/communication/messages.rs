// Response payloads returned by the engine's query surface.
use crate::control_system::VehicleState;
use crate::flow_analyzer::RiskBreakdown;
use crate::models::VehicleId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrisisStatus {
    Enabled,
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrisisResponse {
    pub status: CrisisStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_id: Option<VehicleId>,
}

impl CrisisResponse {
    pub fn enabled(vehicle_id: VehicleId) -> Self {
        Self {
            status: CrisisStatus::Enabled,
            vehicle_id: Some(vehicle_id),
        }
    }

    pub fn disabled() -> Self {
        Self {
            status: CrisisStatus::Disabled,
            vehicle_id: None,
        }
    }
}

/// A breakdown travels with the formula it was computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskBreakdownResponse {
    pub formula: String,
    pub breakdowns: Vec<RiskBreakdown>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateExplanation {
    pub vehicle_id: VehicleId,
    pub previous_state: VehicleState,
    pub current_state: VehicleState,
    pub transition: String,
    pub reason: String,
    pub risk_score: f64,
    pub recent_alert_count: usize,
    pub escalation_probability: f64,
    pub carbon_slope_positive: bool,
}

impl StateExplanation {
    pub fn to_text(&self) -> String {
        format!(
            "{} {}. {}. Risk score {:.1}, {} recent alerts, escalation probability {:.0}%, carbon trend {}.",
            self.vehicle_id,
            self.transition,
            self.reason,
            self.risk_score,
            self.recent_alert_count,
            self.escalation_probability * 100.0,
            if self.carbon_slope_positive {
                "rising"
            } else {
                "flat"
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crisis_response_json() {
        let on = serde_json::to_value(CrisisResponse::enabled(VehicleId::from("V-104"))).unwrap();
        assert_eq!(on["status"], "enabled");
        assert_eq!(on["vehicle_id"], "V-104");

        let off = serde_json::to_value(CrisisResponse::disabled()).unwrap();
        assert_eq!(off["status"], "disabled");
        assert!(off.get("vehicle_id").is_none());
    }
}
