use crate::models::VehicleId;
use crate::monitoring::fleet_report::{sustainability_score, VehicleReportInput};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub vehicle_id: VehicleId,
    pub carbon_kg: f64,
    pub fuel_efficiency: f64,
    pub sustainability_score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Leaderboard {
    /// Lowest total carbon first.
    pub carbon: Vec<LeaderboardEntry>,
    /// Highest sustainability first.
    pub sustainability: Vec<LeaderboardEntry>,
}

fn entries(vehicles: &[VehicleReportInput]) -> Vec<LeaderboardEntry> {
    vehicles
        .iter()
        .map(|v| LeaderboardEntry {
            rank: 0,
            vehicle_id: v.vehicle_id.clone(),
            carbon_kg: v.carbon_kg,
            fuel_efficiency: v.fuel_efficiency,
            sustainability_score: sustainability_score(v.risk_score, v.alert_count, v.fuel_efficiency),
        })
        .collect()
}

fn assign_ranks(mut ranked: Vec<LeaderboardEntry>) -> Vec<LeaderboardEntry> {
    for (i, entry) in ranked.iter_mut().enumerate() {
        entry.rank = i + 1;
    }
    ranked
}

pub fn carbon_ranking(vehicles: &[VehicleReportInput]) -> Vec<LeaderboardEntry> {
    let mut ranked = entries(vehicles);
    ranked.sort_by(|a, b| {
        a.carbon_kg
            .total_cmp(&b.carbon_kg)
            .then_with(|| a.vehicle_id.cmp(&b.vehicle_id))
    });
    assign_ranks(ranked)
}

pub fn sustainability_ranking(vehicles: &[VehicleReportInput]) -> Vec<LeaderboardEntry> {
    let mut ranked = entries(vehicles);
    ranked.sort_by(|a, b| {
        b.sustainability_score
            .total_cmp(&a.sustainability_score)
            .then_with(|| a.vehicle_id.cmp(&b.vehicle_id))
    });
    assign_ranks(ranked)
}

pub fn build_leaderboard(vehicles: &[VehicleReportInput]) -> Leaderboard {
    Leaderboard {
        carbon: carbon_ranking(vehicles),
        sustainability: sustainability_ranking(vehicles),
    }
}
