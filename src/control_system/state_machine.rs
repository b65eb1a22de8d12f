use crate::global_variables::{
    CRITICAL_EFFICIENCY_KM_PER_L, CRITICAL_RECENT_ALERTS, EFFICIENT_KM_PER_L, HIGH_EMISSION_KG,
    IDLE_SPEED_KMH,
};
use crate::models::{Alert, AlertType, VehicleId, VehicleSnapshot, VehicleStatus};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Operational state of a vehicle. Re-derived on every snapshot update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleState {
    Normal,
    Efficient,
    HighEmission,
    RouteDeviation,
    Idle,
    CriticalRisk,
}

impl VehicleState {
    /// Higher is more severe. Used to order vehicles and alerts by state.
    pub fn priority(self) -> u8 {
        match self {
            VehicleState::CriticalRisk => 5,
            VehicleState::RouteDeviation => 4,
            VehicleState::HighEmission => 3,
            VehicleState::Idle => 2,
            VehicleState::Normal => 1,
            VehicleState::Efficient => 0,
        }
    }

    pub fn risk_level(self) -> RiskLevel {
        match self {
            VehicleState::CriticalRisk => RiskLevel::Critical,
            VehicleState::HighEmission | VehicleState::RouteDeviation => RiskLevel::High,
            VehicleState::Idle => RiskLevel::Medium,
            VehicleState::Normal => RiskLevel::Low,
            VehicleState::Efficient => RiskLevel::Minimal,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VehicleState::Normal => "NORMAL",
            VehicleState::Efficient => "EFFICIENT",
            VehicleState::HighEmission => "HIGH_EMISSION",
            VehicleState::RouteDeviation => "ROUTE_DEVIATION",
            VehicleState::Idle => "IDLE",
            VehicleState::CriticalRisk => "CRITICAL_RISK",
        }
    }
}

impl fmt::Display for VehicleState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Minimal,
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            RiskLevel::Minimal => "minimal",
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        };
        f.write_str(s)
    }
}

/// The rule that produced a state, with the threshold crossed and the measured value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum TransitionReason {
    Registered,
    CriticalRisk {
        efficiency: f64,
        efficiency_threshold: f64,
        recent_alerts: usize,
        alert_threshold: usize,
    },
    RouteDeviation {
        deviation_alerts: usize,
    },
    HighEmission {
        carbon_kg: f64,
        threshold_kg: f64,
    },
    Idle {
        status: VehicleStatus,
        avg_speed_kmh: f64,
        threshold_kmh: f64,
    },
    Efficient {
        efficiency: f64,
        threshold: f64,
    },
    WithinNormalRange,
}

impl fmt::Display for TransitionReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TransitionReason::Registered => write!(f, "Vehicle registered"),
            TransitionReason::CriticalRisk {
                efficiency,
                efficiency_threshold,
                recent_alerts,
                alert_threshold,
            } => write!(
                f,
                "Fuel efficiency {:.1} km/L below {} with {} recent alerts (>= {})",
                efficiency, efficiency_threshold, recent_alerts, alert_threshold
            ),
            TransitionReason::RouteDeviation { deviation_alerts } => write!(
                f,
                "{} route deviation alert(s) in the recent window",
                deviation_alerts
            ),
            TransitionReason::HighEmission {
                carbon_kg,
                threshold_kg,
            } => write!(
                f,
                "Carbon emissions {:.1} kg exceed threshold of {} kg",
                carbon_kg, threshold_kg
            ),
            TransitionReason::Idle {
                status,
                avg_speed_kmh,
                threshold_kmh,
            } => write!(
                f,
                "Status {} with average speed {:.1} km/h (idle below {} km/h)",
                status, avg_speed_kmh, threshold_kmh
            ),
            TransitionReason::Efficient {
                efficiency,
                threshold,
            } => write!(
                f,
                "Fuel efficiency {:.1} km/L above {} with no recent alerts",
                efficiency, threshold
            ),
            TransitionReason::WithinNormalRange => {
                write!(f, "All metrics within normal operating range")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateRecord {
    pub vehicle_id: VehicleId,
    pub state: VehicleState,
    pub previous_state: VehicleState,
    pub reason: TransitionReason,
    pub risk_level: RiskLevel,
    pub risk_score: f64,
    pub timestamp_ms: u64,
}

/// Classify a snapshot. First matching rule wins.
pub fn evaluate(snapshot: &VehicleSnapshot, recent_alerts: &[Alert]) -> (VehicleState, TransitionReason) {
    let efficiency = snapshot.fuel_efficiency;

    if efficiency < CRITICAL_EFFICIENCY_KM_PER_L && recent_alerts.len() >= CRITICAL_RECENT_ALERTS {
        return (
            VehicleState::CriticalRisk,
            TransitionReason::CriticalRisk {
                efficiency,
                efficiency_threshold: CRITICAL_EFFICIENCY_KM_PER_L,
                recent_alerts: recent_alerts.len(),
                alert_threshold: CRITICAL_RECENT_ALERTS,
            },
        );
    }

    let deviation_alerts = recent_alerts
        .iter()
        .filter(|a| a.alert_type == AlertType::Deviation)
        .count();
    if deviation_alerts > 0 {
        return (
            VehicleState::RouteDeviation,
            TransitionReason::RouteDeviation { deviation_alerts },
        );
    }

    if snapshot.carbon_kg > HIGH_EMISSION_KG {
        return (
            VehicleState::HighEmission,
            TransitionReason::HighEmission {
                carbon_kg: snapshot.carbon_kg,
                threshold_kg: HIGH_EMISSION_KG,
            },
        );
    }

    if snapshot.status == VehicleStatus::Idle || snapshot.avg_speed_kmh < IDLE_SPEED_KMH {
        return (
            VehicleState::Idle,
            TransitionReason::Idle {
                status: snapshot.status,
                avg_speed_kmh: snapshot.avg_speed_kmh,
                threshold_kmh: IDLE_SPEED_KMH,
            },
        );
    }

    if efficiency > EFFICIENT_KM_PER_L && recent_alerts.is_empty() {
        return (
            VehicleState::Efficient,
            TransitionReason::Efficient {
                efficiency,
                threshold: EFFICIENT_KM_PER_L,
            },
        );
    }

    (VehicleState::Normal, TransitionReason::WithinNormalRange)
}

/// Per-vehicle state tracker with an append-only transition history.
///
/// The next state never depends on the history; only the record's
/// `previous_state` does.
#[derive(Debug, Clone)]
pub struct VehicleStateMachine {
    current: StateRecord,
    history: Vec<StateRecord>,
}

impl VehicleStateMachine {
    pub fn new(vehicle_id: VehicleId, registered_at_ms: u64) -> Self {
        let initial = StateRecord {
            vehicle_id,
            state: VehicleState::Normal,
            previous_state: VehicleState::Normal,
            reason: TransitionReason::Registered,
            risk_level: VehicleState::Normal.risk_level(),
            risk_score: 0.0,
            timestamp_ms: registered_at_ms,
        };
        Self {
            current: initial.clone(),
            history: vec![initial],
        }
    }

    /// Latest evaluation.
    pub fn current(&self) -> &StateRecord {
        &self.current
    }

    /// Re-evaluate and record. A history entry is appended only when the state changes.
    pub fn update(
        &mut self,
        snapshot: &VehicleSnapshot,
        recent_alerts: &[Alert],
        risk_score: f64,
    ) -> &StateRecord {
        let (state, reason) = evaluate(snapshot, recent_alerts);
        // An unchanged state keeps pointing at the state it was entered from.
        let previous_state = if state == self.current.state {
            self.current.previous_state
        } else {
            self.current.state
        };

        let record = StateRecord {
            vehicle_id: snapshot.vehicle_id.clone(),
            state,
            previous_state,
            reason,
            risk_level: state.risk_level(),
            risk_score,
            timestamp_ms: snapshot.last_updated_ms,
        };

        if state != self.current.state {
            log::info!(
                "Vehicle {} transitioned {} -> {}: {}",
                record.vehicle_id,
                previous_state,
                state,
                record.reason
            );
            self.history.push(record.clone());
        }
        self.current = record;
        &self.current
    }

    /// Full history, oldest first.
    pub fn history(&self) -> &[StateRecord] {
        &self.history
    }

    pub fn history_page(&self, offset: usize, limit: usize) -> Vec<StateRecord> {
        self.history.iter().skip(offset).take(limit).cloned().collect()
    }
}
