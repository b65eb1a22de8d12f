//! Weighted, explainable risk score.
//!
//! ```text
//! risk = 0.35 * alert_raw + 0.25 * efficiency_raw + 0.25 * carbon_raw + 0.15 * status_raw
//! ```
//!
//! Each factor's share of the score is reported as a percentage so the
//! breakdown can be shown next to the formula.

use crate::global_variables::{
    ALERT_POINTS_PER_ALERT, CARBON_SATURATION_KG, RISK_FORMULA, WEIGHT_ALERTS, WEIGHT_CARBON,
    WEIGHT_EFFICIENCY, WEIGHT_STATUS,
};
use crate::models::{Alert, VehicleId, VehicleSnapshot, VehicleStatus};
use serde::{Deserialize, Serialize};

/// Un-weighted factor sub-scores, each in [0, 100].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskFactors {
    pub alerts: f64,
    pub efficiency: f64,
    pub carbon: f64,
    pub status: f64,
}

impl RiskFactors {
    pub fn weighted(&self) -> RiskFactors {
        RiskFactors {
            alerts: WEIGHT_ALERTS * self.alerts,
            efficiency: WEIGHT_EFFICIENCY * self.efficiency,
            carbon: WEIGHT_CARBON * self.carbon,
            status: WEIGHT_STATUS * self.status,
        }
    }

    pub fn total(&self) -> f64 {
        self.alerts + self.efficiency + self.carbon + self.status
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskBreakdown {
    pub vehicle_id: VehicleId,
    pub risk_score: f64,
    pub raw: RiskFactors,
    pub weighted: RiskFactors,
    pub alert_impact_pct: f64,
    pub efficiency_impact_pct: f64,
    pub carbon_impact_pct: f64,
    pub status_impact_pct: f64,
    pub recent_alert_count: usize,
    pub formula: String,
}

impl RiskBreakdown {
    pub fn impact_total_pct(&self) -> f64 {
        self.alert_impact_pct + self.efficiency_impact_pct + self.carbon_impact_pct
            + self.status_impact_pct
    }
}

pub fn alert_sub_score(recent_alerts: usize) -> f64 {
    (recent_alerts as f64 * ALERT_POINTS_PER_ALERT).min(100.0)
}

pub fn efficiency_sub_score(efficiency: f64) -> f64 {
    if efficiency < 4.0 {
        80.0
    } else if efficiency < 5.5 {
        55.0
    } else {
        20.0
    }
}

pub fn carbon_sub_score(carbon_kg: f64) -> f64 {
    (carbon_kg / CARBON_SATURATION_KG * 100.0).min(100.0)
}

pub fn status_sub_score(status: VehicleStatus) -> f64 {
    match status {
        VehicleStatus::Maintenance => 70.0,
        VehicleStatus::Idle => 35.0,
        VehicleStatus::Active => 15.0,
    }
}

fn share(part: f64, total: f64) -> f64 {
    if total == 0.0 {
        0.0
    } else {
        part / total * 100.0
    }
}

/// Score a snapshot against its recent alerts.
pub fn score(snapshot: &VehicleSnapshot, recent_alerts: &[Alert]) -> RiskBreakdown {
    let raw = RiskFactors {
        alerts: alert_sub_score(recent_alerts.len()),
        efficiency: efficiency_sub_score(snapshot.fuel_efficiency),
        carbon: carbon_sub_score(snapshot.carbon_kg),
        status: status_sub_score(snapshot.status),
    };
    let weighted = raw.weighted();
    let risk_score = weighted.total();

    RiskBreakdown {
        vehicle_id: snapshot.vehicle_id.clone(),
        risk_score,
        raw,
        weighted,
        alert_impact_pct: share(weighted.alerts, risk_score),
        efficiency_impact_pct: share(weighted.efficiency, risk_score),
        carbon_impact_pct: share(weighted.carbon, risk_score),
        status_impact_pct: share(weighted.status, risk_score),
        recent_alert_count: recent_alerts.len(),
        formula: RISK_FORMULA.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AlertType, Severity};
    use approx::assert_relative_eq;

    fn snapshot(carbon: f64, efficiency: f64, status: VehicleStatus) -> VehicleSnapshot {
        let mut s = VehicleSnapshot::new(VehicleId::from("V-101"), 0);
        s.carbon_kg = carbon;
        s.fuel_efficiency = efficiency;
        s.status = status;
        s
    }

    fn alerts(n: usize) -> Vec<Alert> {
        (0..n)
            .map(|i| Alert {
                id: i as u64,
                vehicle_id: VehicleId::from("V-101"),
                alert_type: AlertType::Anomaly,
                severity: Severity::High,
                message: String::new(),
                timestamp_ms: 0,
            })
            .collect()
    }

    #[test]
    fn test_quiet_vehicle_scores_7_25() {
        let b = score(&snapshot(0.0, 6.0, VehicleStatus::Active), &[]);
        assert_relative_eq!(b.risk_score, 7.25, epsilon = 1e-9);
        assert_relative_eq!(b.carbon_impact_pct, 0.0);
        assert_relative_eq!(b.impact_total_pct(), 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_worst_case_scores_87() {
        let b = score(&snapshot(500.0, 3.0, VehicleStatus::Maintenance), &alerts(5));
        assert_relative_eq!(b.raw.alerts, 90.0);
        assert_relative_eq!(b.raw.efficiency, 80.0);
        assert_relative_eq!(b.raw.carbon, 100.0);
        assert_relative_eq!(b.raw.status, 70.0);
        assert_relative_eq!(b.risk_score, 87.0, epsilon = 1e-9);
    }

    #[test]
    fn test_sub_score_bands() {
        assert_relative_eq!(alert_sub_score(6), 100.0);
        assert_relative_eq!(efficiency_sub_score(3.99), 80.0);
        assert_relative_eq!(efficiency_sub_score(4.0), 55.0);
        assert_relative_eq!(efficiency_sub_score(5.5), 20.0);
        assert_relative_eq!(carbon_sub_score(250.0), 50.0);
        assert_relative_eq!(carbon_sub_score(1_000.0), 100.0);
        assert_relative_eq!(status_sub_score(VehicleStatus::Idle), 35.0);
    }

    #[test]
    fn test_percentages_sum_to_100_across_inputs() {
        for carbon in [0.0, 12.5, 180.0, 499.0, 900.0] {
            for eff in [0.0, 2.0, 4.5, 7.0] {
                for n in [0, 1, 3, 8] {
                    for status in [
                        VehicleStatus::Active,
                        VehicleStatus::Idle,
                        VehicleStatus::Maintenance,
                    ] {
                        let b = score(&snapshot(carbon, eff, status), &alerts(n));
                        assert!(b.risk_score > 0.0);
                        assert_relative_eq!(b.impact_total_pct(), 100.0, epsilon = 1e-9);
                    }
                }
            }
        }
    }

    #[test]
    fn test_score_is_idempotent() {
        let s = snapshot(321.0, 4.2, VehicleStatus::Idle);
        let a = alerts(2);
        assert_eq!(score(&s, &a), score(&s, &a));
    }

    #[test]
    fn test_formula_is_attached() {
        let b = score(&snapshot(0.0, 6.0, VehicleStatus::Active), &[]);
        assert_eq!(
            b.formula,
            "0.35(alerts) + 0.25(efficiency) + 0.25(carbon) + 0.15(status)"
        );
    }

    #[test]
    fn test_zero_score_reports_zero_percentages() {
        assert_relative_eq!(share(0.0, 0.0), 0.0);
    }
}
