use approx::assert_relative_eq;
use fleet_intelligence::config::EngineConfig;
use fleet_intelligence::control_system::VehicleState;
use fleet_intelligence::engine::FleetEngine;
use fleet_intelligence::error::FleetError;
use fleet_intelligence::models::{
    AlertType, TelemetryDelta, TelemetryEvent, Vehicle, VehicleClass, VehicleId, VehicleStatus,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

fn engine_with(config: EngineConfig, ids: &[&str]) -> FleetEngine {
    let engine = FleetEngine::new(config);
    for id in ids {
        engine
            .register_vehicle(Vehicle::new(*id, format!("Unit {}", id), VehicleClass::Van), 0)
            .unwrap();
    }
    engine
}

fn delta(speed: f64, efficiency: f64, litres: f64) -> TelemetryDelta {
    TelemetryDelta {
        speed_kmh: Some(speed),
        fuel_efficiency: Some(efficiency),
        fuel_litres: Some(litres),
        ..Default::default()
    }
}

#[test]
fn test_quiet_vehicle_scores_7_25_and_is_normal() {
    let engine = engine_with(EngineConfig::default(), &["V-101"]);
    let id = VehicleId::from("V-101");
    let raised = engine
        .ingest(TelemetryEvent::new("V-101", 1_000, delta(60.0, 6.0, 0.0)))
        .unwrap();
    assert!(raised.is_empty());

    let breakdown = engine.get_risk_breakdown(&id).unwrap();
    assert_relative_eq!(breakdown.risk_score, 7.25, epsilon = 1e-9);
    assert_eq!(engine.get_state(&id).unwrap().state, VehicleState::Normal);
}

#[test]
fn test_worst_case_scores_87_and_is_high_emission() {
    let mut config = EngineConfig::default();
    config.prediction.emission_factor = 2.5;
    let engine = engine_with(config, &["V-101"]);
    let id = VehicleId::from("V-101");

    for i in 1..=5u64 {
        let mut d = delta(150.0, 3.0, 40.0);
        if i == 5 {
            d.status = Some(VehicleStatus::Maintenance);
        }
        let raised = engine
            .ingest(TelemetryEvent::new("V-101", i * 1_000, d))
            .unwrap();
        assert_eq!(raised.len(), 1);
        assert_eq!(raised[0].alert_type, AlertType::Anomaly);
    }

    let snapshot = engine.get_snapshot(&id).unwrap();
    assert_relative_eq!(snapshot.carbon_kg, 500.0, epsilon = 1e-9);
    assert_eq!(snapshot.status, VehicleStatus::Maintenance);

    let breakdown = engine.get_risk_breakdown(&id).unwrap();
    assert_relative_eq!(breakdown.risk_score, 87.0, epsilon = 1e-9);
    assert_eq!(breakdown.recent_alert_count, 5);
    assert_eq!(engine.get_state(&id).unwrap().state, VehicleState::HighEmission);
}

#[test]
fn test_low_efficiency_with_three_alerts_is_critical() {
    let engine = engine_with(EngineConfig::default(), &["V-101"]);
    for i in 1..=3u64 {
        let raised = engine
            .ingest(TelemetryEvent::new("V-101", i * 1_000, delta(60.0, 2.0, 1.0)))
            .unwrap();
        assert_eq!(raised[0].alert_type, AlertType::Inefficiency);
    }
    let record = engine.get_state(&VehicleId::from("V-101")).unwrap();
    assert_eq!(record.state, VehicleState::CriticalRisk);
    assert_eq!(record.previous_state, VehicleState::Normal);
}

#[test]
fn test_alerts_outside_recent_window_stop_counting() {
    let engine = engine_with(EngineConfig::default(), &["V-101"]);
    let id = VehicleId::from("V-101");
    engine
        .ingest(TelemetryEvent::new("V-101", 1_000, delta(150.0, 6.0, 0.0)))
        .unwrap();
    assert_eq!(engine.get_risk_breakdown(&id).unwrap().recent_alert_count, 1);

    engine
        .ingest(TelemetryEvent::new("V-101", 1_000 + 400_000, delta(60.0, 6.0, 0.0)))
        .unwrap();
    let breakdown = engine.get_risk_breakdown(&id).unwrap();
    assert_eq!(breakdown.recent_alert_count, 0);
    assert_relative_eq!(breakdown.raw.alerts, 0.0);
}

#[test]
fn test_alert_log_is_capped_but_lifetime_count_is_not() {
    let engine = engine_with(EngineConfig::default(), &["V-101"]);
    for i in 1..=60u64 {
        engine
            .ingest(TelemetryEvent::new("V-101", i, delta(150.0, 6.0, 0.0)))
            .unwrap();
    }
    let alerts = engine.get_alerts(usize::MAX);
    assert_eq!(alerts.len(), 50);
    assert_eq!(alerts[0].timestamp_ms, 60);
    assert_eq!(alerts[49].timestamp_ms, 11);
    assert_eq!(
        engine.get_snapshot(&VehicleId::from("V-101")).unwrap().alert_count,
        60
    );
    assert_eq!(engine.stats().alerts_raised, 60);
}

#[test]
fn test_breakdown_percentages_sum_to_100() {
    let engine = engine_with(EngineConfig::default(), &["V-101", "V-102", "V-103"]);
    let readings = [
        ("V-101", delta(150.0, 2.0, 12.0)),
        ("V-102", delta(3.0, 7.0, 0.5)),
        ("V-103", delta(80.0, 4.5, 30.0)),
    ];
    for (id, d) in readings {
        engine.ingest(TelemetryEvent::new(id, 1_000, d)).unwrap();
    }

    let response = engine.list_risk_breakdowns();
    assert_eq!(
        response.formula,
        "0.35(alerts) + 0.25(efficiency) + 0.25(carbon) + 0.15(status)"
    );
    assert_eq!(response.breakdowns.len(), 3);
    for b in response.breakdowns {
        assert!(b.risk_score > 0.0);
        assert_relative_eq!(b.impact_total_pct(), 100.0, epsilon = 1e-9);
    }
}

#[test]
fn test_predictions_are_idempotent_and_ranked() {
    let engine = engine_with(EngineConfig::default(), &["V-101", "V-102", "V-103"]);
    engine
        .ingest(TelemetryEvent::new("V-102", 1_000, delta(150.0, 2.0, 20.0)))
        .unwrap();
    engine
        .ingest(TelemetryEvent::new("V-101", 1_000, delta(60.0, 6.0, 1.0)))
        .unwrap();
    engine
        .ingest(TelemetryEvent::new("V-103", 1_000, delta(60.0, 6.0, 1.0)))
        .unwrap();

    let id = VehicleId::from("V-102");
    assert_eq!(engine.get_prediction(&id).unwrap(), engine.get_prediction(&id).unwrap());

    let ranked = engine.list_predictions();
    let ids: Vec<&str> = ranked.iter().map(|p| p.vehicle_id.as_str()).collect();
    assert_eq!(ids, vec!["V-102", "V-101", "V-103"]);
    for pair in ranked.windows(2) {
        assert!(pair[0].escalation_probability >= pair[1].escalation_probability);
    }
}

#[test]
fn test_explain_state_describes_transition() {
    let engine = engine_with(EngineConfig::default(), &["V-101"]);
    engine
        .ingest(TelemetryEvent::new("V-101", 1_000, delta(60.0, 6.0, 0.0)))
        .unwrap();
    let mut d = delta(60.0, 6.0, 120.0);
    d.trip_completed = true;
    engine.ingest(TelemetryEvent::new("V-101", 2_000, d)).unwrap();

    let explanation = engine.explain_state(&VehicleId::from("V-101")).unwrap();
    assert_eq!(explanation.current_state, VehicleState::HighEmission);
    assert_eq!(explanation.previous_state, VehicleState::Normal);
    assert!(explanation.transition.contains("moved from NORMAL -> HIGH_EMISSION"));
    assert!(explanation.carbon_slope_positive);
    assert!(explanation.to_text().contains("V-101"));
}

#[test]
fn test_unknown_vehicle_queries_fail() {
    let engine = engine_with(EngineConfig::default(), &["V-101"]);
    let missing = VehicleId::from("V-404");
    assert!(matches!(engine.get_state(&missing), Err(FleetError::VehicleNotFound(_))));
    assert!(matches!(
        engine.get_state_history(&missing, 0, 10),
        Err(FleetError::VehicleNotFound(_))
    ));
    assert!(matches!(engine.get_prediction(&missing), Err(FleetError::VehicleNotFound(_))));
    assert!(matches!(engine.explain_state(&missing), Err(FleetError::VehicleNotFound(_))));
}

#[test]
fn test_leaderboard_and_context() {
    let engine = engine_with(EngineConfig::default(), &["V-101", "V-102"]);
    engine
        .ingest(TelemetryEvent::new("V-101", 1_000, delta(150.0, 2.0, 30.0)))
        .unwrap();
    engine
        .ingest(TelemetryEvent::new("V-102", 1_000, delta(60.0, 7.0, 2.0)))
        .unwrap();

    let board = engine.leaderboard();
    assert_eq!(board.carbon[0].vehicle_id.as_str(), "V-102");
    assert_eq!(board.sustainability[0].vehicle_id.as_str(), "V-102");

    let text = engine.context_text();
    assert!(text.contains("V-101"));
    assert!(text.contains("No report yet"));
}

#[test]
fn test_concurrent_ingest_across_vehicles() {
    let ids = ["V-101", "V-102", "V-103", "V-104"];
    let engine = Arc::new(engine_with(EngineConfig::default(), &ids));

    thread::scope(|scope| {
        for id in ids {
            let engine = Arc::clone(&engine);
            scope.spawn(move || {
                for i in 1..=25u64 {
                    engine
                        .ingest(TelemetryEvent::new(id, i * 1_000, delta(150.0, 6.0, 1.0)))
                        .unwrap();
                }
            });
        }
    });

    for id in ids {
        let snapshot = engine.get_snapshot(&VehicleId::from(id)).unwrap();
        // 25 readings plus 25 alerts
        assert_eq!(snapshot.version, 50);
        assert_eq!(snapshot.speed_samples, 25);
    }
    let alert_ids: HashSet<u64> = engine.get_alerts(usize::MAX).iter().map(|a| a.id).collect();
    assert_eq!(alert_ids.len(), 100);
    assert_eq!(engine.stats().events_ingested, 100);
}

#[test]
fn test_report_inputs_are_a_single_point_in_time() {
    let engine = engine_with(EngineConfig::default(), &["V-101", "V-102"]);
    let done = AtomicBool::new(false);

    thread::scope(|scope| {
        scope.spawn(|| {
            for i in 1..=5_000u64 {
                for id in ["V-101", "V-102"] {
                    engine
                        .ingest(TelemetryEvent::new(id, i * 1_000, delta(60.0, 6.0, 1.0)))
                        .unwrap();
                }
            }
            done.store(true, Ordering::Release);
        });

        let mut torn = 0;
        while !done.load(Ordering::Acquire) {
            let inputs = engine.report_inputs();
            // V-101 is always fed first, so it can never trail V-102.
            if inputs[0].carbon_kg < inputs[1].carbon_kg {
                torn += 1;
            }
        }
        assert_eq!(torn, 0);
    });
}
