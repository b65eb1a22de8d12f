use crate::error::{FleetError, Result};
use crate::models::{VehicleId, VehicleStatus};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::VecDeque;
use std::fmt;

const ELEVATED_CARBON_KG: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FleetHealth {
    Healthy,
    Degraded,
    Critical,
}

impl FleetHealth {
    pub fn from_alert_count(total_alerts: usize) -> Self {
        if total_alerts > 12 {
            FleetHealth::Critical
        } else if total_alerts > 6 {
            FleetHealth::Degraded
        } else {
            FleetHealth::Healthy
        }
    }

    fn recommendation(self) -> &'static str {
        match self {
            FleetHealth::Critical => "Immediate intervention recommended.",
            FleetHealth::Degraded => "Monitor closely.",
            FleetHealth::Healthy => "Operations nominal.",
        }
    }
}

impl fmt::Display for FleetHealth {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FleetHealth::Healthy => write!(f, "healthy"),
            FleetHealth::Degraded => write!(f, "degraded"),
            FleetHealth::Critical => write!(f, "critical"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SustainabilityGrade {
    A,
    B,
    C,
    D,
}

impl SustainabilityGrade {
    pub fn from_score(score: f64) -> Self {
        if score > 75.0 {
            SustainabilityGrade::A
        } else if score > 55.0 {
            SustainabilityGrade::B
        } else if score > 35.0 {
            SustainabilityGrade::C
        } else {
            SustainabilityGrade::D
        }
    }
}

impl fmt::Display for SustainabilityGrade {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// `100 - 0.5*risk - 25*(alerts/20) + 3*efficiency`, clamped to [0, 100].
pub fn sustainability_score(avg_risk: f64, alert_count: usize, avg_efficiency: f64) -> f64 {
    let raw = 100.0 - 0.5 * avg_risk - 25.0 * (alert_count as f64 / 20.0) + 3.0 * avg_efficiency;
    raw.clamp(0.0, 100.0)
}

/// One vehicle's contribution to a report, copied out of its unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleReportInput {
    pub vehicle_id: VehicleId,
    pub carbon_kg: f64,
    pub fuel_efficiency: f64,
    pub status: VehicleStatus,
    pub alert_count: usize,
    pub risk_score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopOffenders {
    pub highest_carbon: Option<VehicleId>,
    pub least_efficient: Option<VehicleId>,
    pub most_alerts: Option<VehicleId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetReport {
    pub window_start_ms: u64,
    pub window_end_ms: u64,
    pub generated_at_ms: u64,
    pub total_carbon_kg: f64,
    pub active_vehicles: usize,
    pub total_alerts: usize,
    pub avg_risk_score: f64,
    pub avg_fuel_efficiency: f64,
    pub sustainability_score: f64,
    pub fleet_health: FleetHealth,
    pub sustainability_grade: SustainabilityGrade,
    pub emission_trend_elevated: bool,
    pub top_offenders: TopOffenders,
    pub executive_summary: String,
}

// Picks the vehicle that sorts first under `cmp`, ties by id ascending.
fn pick<F>(vehicles: &[VehicleReportInput], cmp: F) -> Option<VehicleId>
where
    F: Fn(&VehicleReportInput, &VehicleReportInput) -> Ordering,
{
    vehicles
        .iter()
        .min_by(|a, b| cmp(a, b).then_with(|| a.vehicle_id.cmp(&b.vehicle_id)))
        .map(|v| v.vehicle_id.clone())
}

pub fn top_offenders(vehicles: &[VehicleReportInput]) -> TopOffenders {
    TopOffenders {
        highest_carbon: pick(vehicles, |a, b| b.carbon_kg.total_cmp(&a.carbon_kg)),
        least_efficient: pick(vehicles, |a, b| a.fuel_efficiency.total_cmp(&b.fuel_efficiency)),
        most_alerts: pick(vehicles, |a, b| b.alert_count.cmp(&a.alert_count)),
    }
}

fn executive_summary(report: &FleetReport) -> String {
    let range = if report.emission_trend_elevated {
        "above"
    } else {
        "within"
    };
    let mut summary = format!(
        "Fleet report for the last {} minutes. Total carbon output: {:.1} kg across {} active vehicles, {} normal operating range. \
         Fleet health status: {} with {} alerts. Sustainability grade: {} (score {:.0}/100). Average fleet risk score: {:.0}/100.",
        report.window_end_ms.saturating_sub(report.window_start_ms) / 60_000,
        report.total_carbon_kg,
        report.active_vehicles,
        range,
        report.fleet_health.to_string().to_uppercase(),
        report.total_alerts,
        report.sustainability_grade,
        report.sustainability_score,
        report.avg_risk_score,
    );
    if let Some(id) = &report.top_offenders.highest_carbon {
        summary.push_str(&format!(" Vehicle {} recorded the highest emissions.", id));
    }
    summary.push(' ');
    summary.push_str(report.fleet_health.recommendation());
    summary
}

/// Aggregate per-vehicle copies into a report for `[window_start_ms, window_end_ms]`.
pub fn build_report(
    window_start_ms: u64,
    window_end_ms: u64,
    generated_at_ms: u64,
    vehicles: &[VehicleReportInput],
) -> FleetReport {
    let count = vehicles.len();
    let total_carbon_kg: f64 = vehicles.iter().map(|v| v.carbon_kg).sum();
    let total_alerts: usize = vehicles.iter().map(|v| v.alert_count).sum();
    let active_vehicles = vehicles
        .iter()
        .filter(|v| v.status == VehicleStatus::Active)
        .count();

    let (avg_risk_score, avg_fuel_efficiency) = if count == 0 {
        (0.0, 0.0)
    } else {
        (
            vehicles.iter().map(|v| v.risk_score).sum::<f64>() / count as f64,
            vehicles.iter().map(|v| v.fuel_efficiency).sum::<f64>() / count as f64,
        )
    };

    let sustainability = sustainability_score(avg_risk_score, total_alerts, avg_fuel_efficiency);

    let mut report = FleetReport {
        window_start_ms,
        window_end_ms,
        generated_at_ms,
        total_carbon_kg,
        active_vehicles,
        total_alerts,
        avg_risk_score,
        avg_fuel_efficiency,
        sustainability_score: sustainability,
        fleet_health: FleetHealth::from_alert_count(total_alerts),
        sustainability_grade: SustainabilityGrade::from_score(sustainability),
        emission_trend_elevated: total_carbon_kg > ELEVATED_CARBON_KG,
        top_offenders: top_offenders(vehicles),
        executive_summary: String::new(),
    };
    report.executive_summary = executive_summary(&report);
    report
}

/// Bounded report history, oldest evicted first.
///
/// Windows tumble: once the first report is in, every later window end sits a
/// whole number of `window_ms` after the previous one.
#[derive(Debug, Clone)]
pub struct ReportHistory {
    capacity: usize,
    window_ms: u64,
    reports: VecDeque<FleetReport>,
}

impl ReportHistory {
    pub fn new(capacity: usize, window_ms: u64) -> Self {
        Self {
            capacity: capacity.max(1),
            window_ms: window_ms.max(1),
            reports: VecDeque::with_capacity(capacity.max(1)),
        }
    }

    /// Window end a new report has to exceed.
    pub fn last_window_end(&self) -> Option<u64> {
        self.reports.back().map(|r| r.window_end_ms)
    }

    pub fn check_window(&self, window_end_ms: u64) -> Result<()> {
        match self.last_window_end() {
            Some(previous_end_ms) if window_end_ms <= previous_end_ms => {
                Err(FleetError::NonMonotonicWindow {
                    window_end_ms,
                    previous_end_ms,
                })
            }
            Some(previous_end_ms) if (window_end_ms - previous_end_ms) % self.window_ms != 0 => {
                Err(FleetError::OffGridWindow {
                    window_end_ms,
                    previous_end_ms,
                    window_ms: self.window_ms,
                })
            }
            _ => Ok(()),
        }
    }

    pub fn push(&mut self, report: FleetReport) -> Result<()> {
        self.check_window(report.window_end_ms)?;
        if self.reports.len() == self.capacity {
            self.reports.pop_front();
        }
        self.reports.push_back(report);
        Ok(())
    }

    pub fn latest(&self) -> Option<&FleetReport> {
        self.reports.back()
    }

    /// Oldest first.
    pub fn to_vec(&self) -> Vec<FleetReport> {
        self.reports.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn input(id: &str, carbon: f64, eff: f64, alerts: usize, risk: f64) -> VehicleReportInput {
        VehicleReportInput {
            vehicle_id: VehicleId::from(id),
            carbon_kg: carbon,
            fuel_efficiency: eff,
            status: VehicleStatus::Active,
            alert_count: alerts,
            risk_score: risk,
        }
    }

    #[test]
    fn test_health_thresholds() {
        assert_eq!(FleetHealth::from_alert_count(13), FleetHealth::Critical);
        assert_eq!(FleetHealth::from_alert_count(12), FleetHealth::Degraded);
        assert_eq!(FleetHealth::from_alert_count(7), FleetHealth::Degraded);
        assert_eq!(FleetHealth::from_alert_count(6), FleetHealth::Healthy);
        assert_eq!(FleetHealth::from_alert_count(4), FleetHealth::Healthy);
    }

    #[test]
    fn test_grade_bands() {
        assert_eq!(SustainabilityGrade::from_score(75.1), SustainabilityGrade::A);
        assert_eq!(SustainabilityGrade::from_score(75.0), SustainabilityGrade::B);
        assert_eq!(SustainabilityGrade::from_score(55.0), SustainabilityGrade::C);
        assert_eq!(SustainabilityGrade::from_score(35.0), SustainabilityGrade::D);
    }

    #[test]
    fn test_sustainability_is_clamped() {
        assert_relative_eq!(sustainability_score(0.0, 0, 10.0), 100.0);
        assert_relative_eq!(sustainability_score(100.0, 200, 0.0), 0.0);
        // 100 - 10 - 5 + 15
        assert_relative_eq!(sustainability_score(20.0, 4, 5.0), 100.0);
        // 100 - 30 - 12.5 + 9
        assert_relative_eq!(sustainability_score(60.0, 10, 3.0), 66.5, epsilon = 1e-9);
    }

    #[test]
    fn test_report_aggregates() {
        let mut parked = input("V-103", 10.0, 6.0, 0, 10.0);
        parked.status = VehicleStatus::Maintenance;
        let vehicles = vec![
            input("V-101", 120.0, 4.0, 5, 40.0),
            input("V-102", 30.0, 5.0, 3, 20.0),
            parked,
        ];
        let report = build_report(0, 300_000, 300_000, &vehicles);

        assert_relative_eq!(report.total_carbon_kg, 160.0);
        assert_eq!(report.active_vehicles, 2);
        assert_eq!(report.total_alerts, 8);
        assert_eq!(report.fleet_health, FleetHealth::Degraded);
        assert_relative_eq!(report.avg_risk_score, 70.0 / 3.0, epsilon = 1e-9);
        assert_relative_eq!(report.avg_fuel_efficiency, 5.0, epsilon = 1e-9);
        assert!(report.emission_trend_elevated);
        assert_eq!(report.top_offenders.highest_carbon, Some(VehicleId::from("V-101")));
        assert_eq!(report.top_offenders.least_efficient, Some(VehicleId::from("V-101")));
        assert_eq!(report.top_offenders.most_alerts, Some(VehicleId::from("V-101")));
        assert!(report.executive_summary.contains("DEGRADED"));
        assert!(report.executive_summary.ends_with("Monitor closely."));
    }

    #[test]
    fn test_offender_ties_break_by_id() {
        let vehicles = vec![
            input("V-105", 50.0, 4.0, 2, 0.0),
            input("V-102", 50.0, 4.0, 2, 0.0),
            input("V-104", 50.0, 4.0, 2, 0.0),
        ];
        let offenders = top_offenders(&vehicles);
        assert_eq!(offenders.highest_carbon, Some(VehicleId::from("V-102")));
        assert_eq!(offenders.least_efficient, Some(VehicleId::from("V-102")));
        assert_eq!(offenders.most_alerts, Some(VehicleId::from("V-102")));
    }

    #[test]
    fn test_empty_fleet_report() {
        let report = build_report(0, 300_000, 300_000, &[]);
        assert_eq!(report.total_alerts, 0);
        assert_relative_eq!(report.avg_risk_score, 0.0);
        assert_eq!(report.top_offenders, TopOffenders::default());
        assert!(report.executive_summary.ends_with("Operations nominal."));
    }

    #[test]
    fn test_summary_is_deterministic() {
        let vehicles = vec![input("V-101", 12.0, 6.0, 1, 9.0)];
        assert_eq!(
            build_report(0, 300_000, 1, &vehicles).executive_summary,
            build_report(0, 300_000, 1, &vehicles).executive_summary
        );
    }

    #[test]
    fn test_history_caps_and_rejects_stale_windows() {
        let mut history = ReportHistory::new(5, 300_000);
        for i in 1..=7u64 {
            history
                .push(build_report((i - 1) * 300_000, i * 300_000, i * 300_000, &[]))
                .unwrap();
        }
        assert_eq!(history.len(), 5);
        assert_eq!(history.to_vec()[0].window_end_ms, 3 * 300_000);
        assert_eq!(history.latest().unwrap().window_end_ms, 7 * 300_000);

        let stale = build_report(0, 7 * 300_000, 0, &[]);
        let err = history.push(stale).unwrap_err();
        assert!(matches!(err, FleetError::NonMonotonicWindow { .. }));
        assert_eq!(history.len(), 5);
    }

    #[test]
    fn test_history_rejects_overlapping_windows() {
        let mut history = ReportHistory::new(5, 300_000);
        history.push(build_report(150_000, 450_000, 0, &[])).unwrap();

        let err = history
            .push(build_report(300_000, 600_000, 0, &[]))
            .unwrap_err();
        assert!(matches!(
            err,
            FleetError::OffGridWindow {
                window_end_ms: 600_000,
                previous_end_ms: 450_000,
                window_ms: 300_000
            }
        ));

        // Skipping a window keeps the grid.
        history.push(build_report(750_000, 1_050_000, 0, &[])).unwrap();
        let ends: Vec<u64> = history.to_vec().iter().map(|r| r.window_end_ms).collect();
        assert_eq!(ends, vec![450_000, 1_050_000]);
    }

    #[test]
    fn test_inverted_window_does_not_panic() {
        let report = build_report(600_000, 300_000, 0, &[]);
        assert!(report.executive_summary.starts_with("Fleet report for the last 0 minutes."));
    }
}
