// simulation.rs
use crate::engine::FleetEngine;
use crate::models::{TelemetryDelta, TelemetryEvent, Vehicle, VehicleStatus, WeatherCondition};
use crate::shared_data::current_timestamp;
use crate::simulation_engine::fleet::ClassProfile;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval, Duration, MissedTickBehavior};

/// Minutes of driving covered by one simulated reading.
const MINUTES_PER_READING: f64 = 1.0;

/// Seeded telemetry source. Same seed, same stream.
pub struct TelemetryGenerator {
    rng: StdRng,
}

impl TelemetryGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn weather(&mut self) -> Option<WeatherCondition> {
        let roll: f64 = self.rng.random_range(0.0..1.0);
        if roll < 0.02 {
            Some(match self.rng.random_range(0..3) {
                0 => WeatherCondition::Storm,
                1 => WeatherCondition::Snow,
                _ => WeatherCondition::Fog,
            })
        } else if roll < 0.08 {
            Some(if self.rng.random_bool(0.5) {
                WeatherCondition::Rain
            } else {
                WeatherCondition::Wind
            })
        } else if roll < 0.30 {
            Some(WeatherCondition::Cloudy)
        } else {
            Some(WeatherCondition::Clear)
        }
    }

    /// One reading for `vehicle`. A small share are deliberately malformed.
    pub fn next_delta(&mut self, vehicle: &Vehicle) -> TelemetryDelta {
        let profile = ClassProfile::for_class(vehicle.class);

        if self.rng.random_bool(0.01) {
            return TelemetryDelta {
                speed_kmh: Some(self.rng.random_range(profile.min_speed_kmh..profile.max_speed_kmh)),
                fuel_efficiency: None,
                ..Default::default()
            };
        }

        let idle = self.rng.random_bool(0.03);
        let speed_kmh = if idle {
            self.rng.random_range(0.0..3.0)
        } else if self.rng.random_bool(0.03) {
            self.rng.random_range(125.0..150.0)
        } else {
            self.rng.random_range(profile.min_speed_kmh..profile.max_speed_kmh)
        };

        let fuel_efficiency = if self.rng.random_bool(0.05) {
            self.rng.random_range(1.5..2.9)
        } else {
            self.rng.random_range(profile.min_efficiency..profile.max_efficiency)
        };

        let distance_km = speed_kmh * MINUTES_PER_READING / 60.0;
        let fuel_litres = distance_km / fuel_efficiency;

        let route_deviation_km = if self.rng.random_bool(0.04) {
            self.rng.random_range(5.5..12.0)
        } else {
            self.rng.random_range(0.0..2.0)
        };

        TelemetryDelta {
            speed_kmh: Some(speed_kmh),
            fuel_efficiency: Some(fuel_efficiency),
            fuel_litres: Some(fuel_litres),
            route_deviation_km: Some(route_deviation_km),
            weather: self.weather(),
            status: Some(if idle {
                VehicleStatus::Idle
            } else {
                VehicleStatus::Active
            }),
            trip_completed: self.rng.random_bool(0.05),
        }
    }
}

/// Emits one reading per vehicle every `tick` until shutdown or the receiver closes.
pub async fn produce_telemetry(
    vehicles: Vec<Vehicle>,
    tx: mpsc::Sender<TelemetryEvent>,
    tick: Duration,
    seed: u64,
    mut shutdown: watch::Receiver<bool>,
) -> u64 {
    let mut generator = TelemetryGenerator::new(seed);
    let mut ticker = interval(tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut sent: u64 = 0;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let now = current_timestamp();
                for vehicle in &vehicles {
                    let event = TelemetryEvent::new(vehicle.id.clone(), now, generator.next_delta(vehicle));
                    if tx.send(event).await.is_err() {
                        log::warn!("[Simulation] Telemetry receiver closed");
                        return sent;
                    }
                    sent += 1;
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }
    log::info!("[Simulation] Producer stopped after {} events", sent);
    sent
}

/// Feeds events into the engine until the channel closes.
pub async fn consume_telemetry(engine: Arc<FleetEngine>, mut rx: mpsc::Receiver<TelemetryEvent>) -> u64 {
    let mut applied: u64 = 0;
    while let Some(event) = rx.recv().await {
        match engine.ingest(event) {
            Ok(_) => applied += 1,
            Err(e) => log::warn!("[Simulation] {}", e),
        }
    }
    applied
}

/// Register `vehicles` and stream simulated telemetry into `engine` until shutdown.
pub async fn run_simulation(
    engine: Arc<FleetEngine>,
    vehicles: Vec<Vehicle>,
    tick: Duration,
    seed: u64,
    shutdown: watch::Receiver<bool>,
) -> u64 {
    let now = current_timestamp();
    for vehicle in &vehicles {
        if let Err(e) = engine.register_vehicle(vehicle.clone(), now) {
            log::warn!("[Simulation] {}", e);
        }
    }

    let (tx, rx) = mpsc::channel(256);
    let consumer = tokio::spawn(consume_telemetry(Arc::clone(&engine), rx));
    produce_telemetry(vehicles, tx, tick, seed, shutdown).await;

    // Sender dropped above; the consumer drains what is left and exits.
    match consumer.await {
        Ok(applied) => applied,
        Err(e) => {
            log::error!("[Simulation] Consumer task failed: {}", e);
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation_engine::fleet::demo_fleet;

    #[test]
    fn test_same_seed_same_stream() {
        let fleet = demo_fleet();
        let mut a = TelemetryGenerator::new(7);
        let mut b = TelemetryGenerator::new(7);
        for _ in 0..50 {
            for v in &fleet {
                assert_eq!(a.next_delta(v), b.next_delta(v));
            }
        }
    }

    #[test]
    fn test_most_readings_are_valid() {
        let fleet = demo_fleet();
        let mut generator = TelemetryGenerator::new(42);
        let total = 600;
        let valid = (0..total)
            .filter(|i| generator.next_delta(&fleet[i % fleet.len()]).validate().is_some())
            .count();
        assert!(valid > total * 9 / 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulation_feeds_engine_until_shutdown() {
        let engine = Arc::new(FleetEngine::default());
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(run_simulation(
            Arc::clone(&engine),
            demo_fleet(),
            Duration::from_secs(1),
            3,
            rx,
        ));

        tokio::time::sleep(Duration::from_millis(4_500)).await;
        tx.send(true).unwrap();
        let applied = handle.await.unwrap();

        let stats = engine.stats();
        assert_eq!(stats.registered_vehicles, 6);
        assert_eq!(applied, stats.events_ingested + stats.events_dropped);
        assert!(stats.events_ingested > 0);
    }
}
