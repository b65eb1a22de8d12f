//! The fleet engine: per-vehicle units plus the shared crisis register and
//! report history.
//!
//! Each vehicle lives in its own `Mutex`, so different vehicles are ingested
//! and evaluated concurrently while updates to one vehicle are serialized.
//! Everything derived from a snapshot (risk, state, prediction) is computed
//! on demand from the snapshot and its alert log, and cached until the
//! snapshot version or the vehicle's crisis flag changes.

use crate::communication::{CrisisResponse, RiskBreakdownResponse, StateExplanation};
use crate::config::{CrisisMultipliers, EngineConfig};
use crate::control_system::{
    perturb_reading, perturb_snapshot, CrisisRegister, CrisisState, StateRecord,
    VehicleStateMachine,
};
use crate::error::{FleetError, Result};
use crate::flow_analyzer::{predict, rank_by_escalation, score, AlertGenerator, Prediction, RiskBreakdown};
use crate::global_variables::RISK_FORMULA;
use crate::models::{Alert, AlertLog, TelemetryEvent, Vehicle, VehicleId, VehicleSnapshot};
use crate::monitoring::context::render_context;
use crate::monitoring::fleet_report::{build_report, FleetReport, ReportHistory, VehicleReportInput};
use crate::monitoring::leaderboard::{build_leaderboard, Leaderboard};
use crate::shared_data::{current_timestamp, lock, read, write};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

/// Everything derived from one vehicle at one snapshot version.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    /// Snapshot as the scorer saw it (crisis multipliers applied, if any).
    pub snapshot: VehicleSnapshot,
    pub recent_alerts: Vec<Alert>,
    pub logged_alerts: usize,
    pub risk: RiskBreakdown,
    pub state: StateRecord,
    pub prediction: Prediction,
    pub in_crisis: bool,
}

impl Evaluation {
    pub fn report_input(&self) -> VehicleReportInput {
        VehicleReportInput {
            vehicle_id: self.snapshot.vehicle_id.clone(),
            carbon_kg: self.snapshot.carbon_kg,
            fuel_efficiency: self.snapshot.fuel_efficiency,
            status: self.snapshot.status,
            alert_count: self.logged_alerts,
            risk_score: self.risk.risk_score,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStats {
    pub events_ingested: u64,
    pub events_dropped: u64,
    pub alerts_raised: u64,
    pub reports_generated: u64,
    pub registered_vehicles: usize,
    pub crisis_active: bool,
}

#[derive(Debug, Default)]
struct Counters {
    events_ingested: AtomicU64,
    events_dropped: AtomicU64,
    alerts_raised: AtomicU64,
    reports_generated: AtomicU64,
}

#[derive(Debug)]
struct CachedEvaluation {
    version: u64,
    in_crisis: bool,
    evaluation: Evaluation,
}

#[derive(Debug)]
struct VehicleUnit {
    vehicle: Vehicle,
    snapshot: VehicleSnapshot,
    alerts: AlertLog,
    state: VehicleStateMachine,
    cache: Option<CachedEvaluation>,
}

impl VehicleUnit {
    fn new(vehicle: Vehicle, registered_at_ms: u64, log_capacity: usize) -> Self {
        let snapshot = VehicleSnapshot::new(vehicle.id.clone(), registered_at_ms);
        let state = VehicleStateMachine::new(vehicle.id.clone(), registered_at_ms);
        Self {
            vehicle,
            snapshot,
            alerts: AlertLog::new(log_capacity),
            state,
            cache: None,
        }
    }

    fn evaluate(&mut self, crisis: Option<&CrisisMultipliers>, config: &EngineConfig) -> Evaluation {
        let in_crisis = crisis.is_some();
        if let Some(cached) = &self.cache {
            if cached.version == self.snapshot.version && cached.in_crisis == in_crisis {
                return cached.evaluation.clone();
            }
        }

        let effective = match crisis {
            Some(m) => perturb_snapshot(&self.snapshot, m),
            None => self.snapshot.clone(),
        };
        let recent_alerts = self
            .alerts
            .recent(effective.last_updated_ms, config.alerts.recent_window_ms);
        let risk = score(&effective, &recent_alerts);
        let state = self
            .state
            .update(&effective, &recent_alerts, risk.risk_score)
            .clone();
        let prediction = predict(
            &effective,
            recent_alerts.len(),
            risk.risk_score,
            &config.prediction,
        );

        log::debug!(
            "Vehicle {} v{} scored {:.2} ({}){}",
            effective.vehicle_id,
            effective.version,
            risk.risk_score,
            state.state,
            if in_crisis { " [crisis]" } else { "" }
        );

        let evaluation = Evaluation {
            snapshot: effective,
            recent_alerts,
            logged_alerts: self.alerts.len(),
            risk,
            state,
            prediction,
            in_crisis,
        };
        self.cache = Some(CachedEvaluation {
            version: self.snapshot.version,
            in_crisis,
            evaluation: evaluation.clone(),
        });
        evaluation
    }
}

pub struct FleetEngine {
    config: EngineConfig,
    generator: AlertGenerator,
    units: RwLock<BTreeMap<VehicleId, Arc<Mutex<VehicleUnit>>>>,
    crisis: CrisisRegister,
    reports: Mutex<ReportHistory>,
    next_alert_id: AtomicU64,
    counters: Counters,
}

impl Default for FleetEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl FleetEngine {
    pub fn new(config: EngineConfig) -> Self {
        let generator = AlertGenerator::new(config.alerts.clone());
        let reports = ReportHistory::new(config.report.history_capacity, config.report.window_ms);
        Self {
            config,
            generator,
            units: RwLock::new(BTreeMap::new()),
            crisis: CrisisRegister::new(),
            reports: Mutex::new(reports),
            next_alert_id: AtomicU64::new(1),
            counters: Counters::default(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn register_vehicle(&self, vehicle: Vehicle, registered_at_ms: u64) -> Result<()> {
        let mut units = write(&self.units);
        if units.contains_key(&vehicle.id) {
            return Err(FleetError::VehicleAlreadyRegistered(vehicle.id.to_string()));
        }
        log::info!(
            "Registered vehicle {} ({}, {})",
            vehicle.id,
            vehicle.name,
            vehicle.class
        );
        let id = vehicle.id.clone();
        let unit = VehicleUnit::new(vehicle, registered_at_ms, self.config.alerts.log_capacity);
        units.insert(id, Arc::new(Mutex::new(unit)));
        Ok(())
    }

    pub fn vehicles(&self) -> Vec<Vehicle> {
        self.all_units()
            .iter()
            .map(|unit| lock(unit).vehicle.clone())
            .collect()
    }

    fn unit(&self, vehicle_id: &VehicleId) -> Result<Arc<Mutex<VehicleUnit>>> {
        read(&self.units)
            .get(vehicle_id)
            .cloned()
            .ok_or_else(|| FleetError::VehicleNotFound(vehicle_id.to_string()))
    }

    // Ordered by vehicle id. The map lock is released before any unit is locked.
    fn all_units(&self) -> Vec<Arc<Mutex<VehicleUnit>>> {
        read(&self.units).values().cloned().collect()
    }

    fn multipliers(crisis: &Option<CrisisState>, vehicle_id: &VehicleId) -> Option<CrisisMultipliers> {
        crisis
            .as_ref()
            .filter(|c| c.applies_to(vehicle_id))
            .map(|c| c.multipliers)
    }

    fn allocate_alert_id(&self) -> u64 {
        self.next_alert_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Apply one telemetry event. Returns the alerts it raised.
    ///
    /// Malformed deltas are dropped and counted; they are not an error.
    pub fn ingest(&self, event: TelemetryEvent) -> Result<Vec<Alert>> {
        let unit = match self.unit(&event.vehicle_id) {
            Ok(unit) => unit,
            Err(e) => {
                self.counters.events_dropped.fetch_add(1, Ordering::Relaxed);
                log::warn!("Dropping telemetry: {}", e);
                return Err(e);
            }
        };

        let Some(reading) = event.delta.validate() else {
            self.counters.events_dropped.fetch_add(1, Ordering::Relaxed);
            log::warn!(
                "Dropping malformed telemetry for vehicle {} at {}: {:?}",
                event.vehicle_id,
                event.timestamp_ms,
                event.delta
            );
            return Ok(Vec::new());
        };

        let crisis = self.crisis.multipliers_for(&event.vehicle_id);
        let mut unit = lock(&unit);

        let status_before = unit.snapshot.status;
        unit.snapshot
            .apply(&reading, event.timestamp_ms, self.config.prediction.emission_factor);

        let (classified, rounds) = match &crisis {
            Some(m) => (perturb_reading(&reading, m), m.alert_frequency.max(1)),
            None => (reading, 1),
        };

        let mut raised = Vec::new();
        for _ in 0..rounds {
            let alert = self.generator.classify(
                &event.vehicle_id,
                status_before,
                &classified,
                event.timestamp_ms,
                || self.allocate_alert_id(),
            );
            if let Some(alert) = alert {
                log::info!(
                    "[Alert] {} {} ({}): {}",
                    alert.vehicle_id,
                    alert.alert_type,
                    alert.severity,
                    alert.message
                );
                unit.alerts.push(alert.clone());
                unit.snapshot.record_alert();
                raised.push(alert);
            }
        }

        self.counters.events_ingested.fetch_add(1, Ordering::Relaxed);
        self.counters
            .alerts_raised
            .fetch_add(raised.len() as u64, Ordering::Relaxed);

        // Every snapshot update re-runs the state machine.
        unit.evaluate(crisis.as_ref(), &self.config);
        Ok(raised)
    }

    pub fn evaluate(&self, vehicle_id: &VehicleId) -> Result<Evaluation> {
        let unit = self.unit(vehicle_id)?;
        let crisis = self.crisis.multipliers_for(vehicle_id);
        let mut unit = lock(&unit);
        Ok(unit.evaluate(crisis.as_ref(), &self.config))
    }

    /// Evaluate every vehicle as of one instant.
    ///
    /// All unit locks are taken in id order and held until every vehicle is
    /// evaluated, so no ingest lands halfway through the view. No other path
    /// holds more than one unit lock.
    pub fn evaluate_all(&self) -> Vec<Evaluation> {
        let units = self.all_units();
        let mut guards: Vec<_> = units.iter().map(|unit| lock(unit)).collect();
        let crisis = self.crisis.current();
        guards
            .iter_mut()
            .map(|unit| {
                let multipliers = Self::multipliers(&crisis, &unit.vehicle.id);
                unit.evaluate(multipliers.as_ref(), &self.config)
            })
            .collect()
    }

    /// Stored snapshot. Crisis multipliers are never applied to it.
    pub fn get_snapshot(&self, vehicle_id: &VehicleId) -> Result<VehicleSnapshot> {
        let unit = self.unit(vehicle_id)?;
        let snapshot = lock(&unit).snapshot.clone();
        Ok(snapshot)
    }

    pub fn list_snapshots(&self) -> Vec<VehicleSnapshot> {
        self.all_units()
            .iter()
            .map(|unit| lock(unit).snapshot.clone())
            .collect()
    }

    /// Most recent alerts across the fleet, newest first.
    pub fn get_alerts(&self, limit: usize) -> Vec<Alert> {
        let mut alerts: Vec<Alert> = self
            .all_units()
            .iter()
            .flat_map(|unit| lock(unit).alerts.to_vec())
            .collect();
        alerts.sort_by(|a, b| {
            b.timestamp_ms
                .cmp(&a.timestamp_ms)
                .then_with(|| b.id.cmp(&a.id))
        });
        alerts.truncate(limit);
        alerts
    }

    pub fn get_vehicle_alerts(&self, vehicle_id: &VehicleId, limit: usize) -> Result<Vec<Alert>> {
        let unit = self.unit(vehicle_id)?;
        let unit = lock(&unit);
        Ok(unit.alerts.iter().rev().take(limit).cloned().collect())
    }

    pub fn get_risk_breakdown(&self, vehicle_id: &VehicleId) -> Result<RiskBreakdown> {
        Ok(self.evaluate(vehicle_id)?.risk)
    }

    pub fn list_risk_breakdowns(&self) -> RiskBreakdownResponse {
        RiskBreakdownResponse {
            formula: RISK_FORMULA.to_string(),
            breakdowns: self.evaluate_all().into_iter().map(|e| e.risk).collect(),
        }
    }

    pub fn get_state(&self, vehicle_id: &VehicleId) -> Result<StateRecord> {
        Ok(self.evaluate(vehicle_id)?.state)
    }

    /// A page of the vehicle's transition history, oldest first.
    pub fn get_state_history(
        &self,
        vehicle_id: &VehicleId,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<StateRecord>> {
        let unit = self.unit(vehicle_id)?;
        let crisis = self.crisis.multipliers_for(vehicle_id);
        let mut unit = lock(&unit);
        unit.evaluate(crisis.as_ref(), &self.config);
        Ok(unit.state.history_page(offset, limit))
    }

    pub fn get_prediction(&self, vehicle_id: &VehicleId) -> Result<Prediction> {
        Ok(self.evaluate(vehicle_id)?.prediction)
    }

    /// Predictions ranked by descending escalation probability.
    pub fn list_predictions(&self) -> Vec<Prediction> {
        let mut predictions: Vec<Prediction> = self
            .evaluate_all()
            .into_iter()
            .map(|e| e.prediction)
            .collect();
        rank_by_escalation(&mut predictions);
        predictions
    }

    pub fn report_inputs(&self) -> Vec<VehicleReportInput> {
        self.evaluate_all()
            .iter()
            .map(Evaluation::report_input)
            .collect()
    }

    /// Close the window ending at `window_end_ms` and append its report.
    pub fn generate_report(&self, window_end_ms: u64) -> Result<FleetReport> {
        let mut history = lock(&self.reports);
        history.check_window(window_end_ms)?;

        let window_start_ms = window_end_ms.saturating_sub(self.config.report.window_ms);
        let inputs = self.report_inputs();
        let report = build_report(window_start_ms, window_end_ms, current_timestamp(), &inputs);
        history.push(report.clone())?;
        self.counters.reports_generated.fetch_add(1, Ordering::Relaxed);

        log::info!(
            "[Report] Window ending {}: {} alerts, health {}, grade {}",
            window_end_ms,
            report.total_alerts,
            report.fleet_health,
            report.sustainability_grade
        );
        Ok(report)
    }

    pub fn get_latest_report(&self) -> Result<FleetReport> {
        lock(&self.reports).latest().cloned().ok_or(FleetError::NoReport)
    }

    /// Oldest first.
    pub fn get_report_history(&self) -> Vec<FleetReport> {
        lock(&self.reports).to_vec()
    }

    pub fn start_crisis(&self, vehicle_id: &VehicleId) -> Result<CrisisResponse> {
        self.unit(vehicle_id)?;
        self.crisis
            .start(vehicle_id.clone(), self.config.crisis, current_timestamp());
        log::info!("[Crisis] Enabled for vehicle {}", vehicle_id);
        Ok(CrisisResponse::enabled(vehicle_id.clone()))
    }

    pub fn stop_crisis(&self) -> CrisisResponse {
        if let Some(previous) = self.crisis.stop() {
            log::info!("[Crisis] Disabled for vehicle {}", previous.vehicle_id);
        }
        CrisisResponse::disabled()
    }

    pub fn crisis_state(&self) -> Option<CrisisState> {
        self.crisis.current()
    }

    /// Why the vehicle is in its current state, in plain terms.
    pub fn explain_state(&self, vehicle_id: &VehicleId) -> Result<StateExplanation> {
        let unit = self.unit(vehicle_id)?;
        let crisis = self.crisis.multipliers_for(vehicle_id);
        let mut unit = lock(&unit);
        let evaluation = unit.evaluate(crisis.as_ref(), &self.config);

        let entered = unit
            .state
            .history()
            .last()
            .cloned()
            .unwrap_or_else(|| evaluation.state.clone());
        let transition = if entered.previous_state == entered.state {
            format!("is {}", entered.state)
        } else {
            format!("moved from {} -> {}", entered.previous_state, entered.state)
        };

        Ok(StateExplanation {
            vehicle_id: vehicle_id.clone(),
            previous_state: entered.previous_state,
            current_state: evaluation.state.state,
            transition,
            reason: evaluation.state.reason.to_string(),
            risk_score: evaluation.risk.risk_score,
            recent_alert_count: evaluation.recent_alerts.len(),
            escalation_probability: evaluation.prediction.escalation_probability,
            carbon_slope_positive: evaluation.prediction.carbon_growing(),
        })
    }

    pub fn leaderboard(&self) -> Leaderboard {
        build_leaderboard(&self.report_inputs())
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            events_ingested: self.counters.events_ingested.load(Ordering::Relaxed),
            events_dropped: self.counters.events_dropped.load(Ordering::Relaxed),
            alerts_raised: self.counters.alerts_raised.load(Ordering::Relaxed),
            reports_generated: self.counters.reports_generated.load(Ordering::Relaxed),
            registered_vehicles: read(&self.units).len(),
            crisis_active: self.crisis.is_active(),
        }
    }

    /// Plain-text dump of alerts, vehicle metrics and the latest report.
    pub fn context_text(&self) -> String {
        let alerts = self.get_alerts(self.config.alerts.log_capacity);
        let evaluations = self.evaluate_all();
        let latest = lock(&self.reports).latest().cloned();
        render_context(&alerts, &evaluations, latest.as_ref())
    }
}
