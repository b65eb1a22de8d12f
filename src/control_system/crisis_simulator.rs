//! Single-vehicle crisis injection.
//!
//! At most one vehicle is in crisis at a time. The vehicle's stored snapshot
//! is never modified: the multipliers are applied to a copy each time the
//! scorer, state machine or predictor looks at it, and to each incoming
//! reading before it is classified. Stopping the crisis therefore restores
//! every derived figure exactly.

use crate::config::CrisisMultipliers;
use crate::models::{TelemetryReading, VehicleId, VehicleSnapshot};
use crate::shared_data::{read, write};
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrisisState {
    pub vehicle_id: VehicleId,
    pub started_at_ms: u64,
    pub multipliers: CrisisMultipliers,
}

impl CrisisState {
    pub fn applies_to(&self, vehicle_id: &VehicleId) -> bool {
        &self.vehicle_id == vehicle_id
    }
}

/// Holds the active crisis, if any. Activation swaps the whole slot under one
/// write lock, so readers see either the old crisis or the new one.
#[derive(Debug, Default)]
pub struct CrisisRegister {
    slot: RwLock<Option<CrisisState>>,
}

impl CrisisRegister {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put `vehicle_id` in crisis. Returns the crisis it replaced.
    pub fn start(
        &self,
        vehicle_id: VehicleId,
        multipliers: CrisisMultipliers,
        now_ms: u64,
    ) -> Option<CrisisState> {
        let next = CrisisState {
            vehicle_id,
            started_at_ms: now_ms,
            multipliers,
        };
        let previous = write(&self.slot).replace(next);
        if let Some(prev) = &previous {
            log::info!("[Crisis] Replacing crisis on vehicle {}", prev.vehicle_id);
        }
        previous
    }

    /// Clear the crisis. Idempotent.
    pub fn stop(&self) -> Option<CrisisState> {
        write(&self.slot).take()
    }

    /// Copy of the active crisis. Callers read this once per evaluation.
    pub fn current(&self) -> Option<CrisisState> {
        read(&self.slot).clone()
    }

    pub fn is_active(&self) -> bool {
        read(&self.slot).is_some()
    }

    /// Multipliers for `vehicle_id`, if it is the vehicle in crisis.
    pub fn multipliers_for(&self, vehicle_id: &VehicleId) -> Option<CrisisMultipliers> {
        read(&self.slot)
            .as_ref()
            .filter(|c| c.applies_to(vehicle_id))
            .map(|c| c.multipliers)
    }
}

/// The snapshot as derived views see it during a crisis.
pub fn perturb_snapshot(snapshot: &VehicleSnapshot, m: &CrisisMultipliers) -> VehicleSnapshot {
    let mut effective = snapshot.clone();
    effective.carbon_kg *= m.carbon_rate;
    if m.fuel_burn > 0.0 {
        effective.fuel_efficiency /= m.fuel_burn;
    }
    effective
}

/// The reading as the alert generator sees it during a crisis.
pub fn perturb_reading(reading: &TelemetryReading, m: &CrisisMultipliers) -> TelemetryReading {
    let mut effective = reading.clone();
    effective.route_deviation_km = reading.route_deviation_km.map(|d| d * m.deviation);
    if m.fuel_burn > 0.0 {
        effective.fuel_efficiency /= m.fuel_burn;
    }
    effective
}
