use crate::engine::FleetEngine;
use crate::global_variables::DEFAULT_ALERT_QUERY_LIMIT;
use crate::models::VehicleId;
use crate::monitoring::export::{export_alerts, export_reports, ALERTS_CSV, REPORTS_CSV};
use crate::shared_data::format_timestamp;
use std::io::{stdin, stdout, BufRead, Write};
use std::sync::Arc;

fn prompt(label: &str) -> Option<String> {
    print!("{}", label);
    let _ = stdout().flush();
    let mut input = String::new();
    match stdin().lock().read_line(&mut input) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(input.trim().to_string()),
    }
}

fn prompt_vehicle() -> Option<VehicleId> {
    prompt("Enter vehicle ID: ").map(VehicleId::new)
}

fn show_alerts(engine: &FleetEngine) {
    let alerts = engine.get_alerts(DEFAULT_ALERT_QUERY_LIMIT);
    println!("Recent alerts ({}):", alerts.len());
    for a in alerts {
        println!(
            "  #{} [{}] {} {} {}: {}",
            a.id,
            format_timestamp(a.timestamp_ms),
            a.vehicle_id, a.alert_type, a.severity, a.message
        );
    }
}

fn show_risk(engine: &FleetEngine) {
    let response = engine.list_risk_breakdowns();
    println!("Risk = {}", response.formula);
    for b in response.breakdowns {
        println!(
            "  {}: {:.1} (alerts {:.0}%, efficiency {:.0}%, carbon {:.0}%, status {:.0}%)",
            b.vehicle_id,
            b.risk_score,
            b.alert_impact_pct,
            b.efficiency_impact_pct,
            b.carbon_impact_pct,
            b.status_impact_pct
        );
    }
}

fn show_predictions(engine: &FleetEngine) {
    for p in engine.list_predictions() {
        println!(
            "  {}: escalation {:.0}%, risk {:.1} -> {:.1}, carbon {:.1} -> {:.1} kg, fuel {}",
            p.vehicle_id,
            p.escalation_probability * 100.0,
            p.current_risk_score,
            p.predicted_risk_score,
            p.current_carbon_kg,
            p.predicted_carbon_10min,
            p.fuel_exhaustion
        );
    }
}

fn show_report(engine: &FleetEngine) {
    match engine.get_latest_report() {
        Ok(report) => println!("{}", report.executive_summary),
        Err(e) => eprintln!("Error displaying report: {}", e),
    }
}

fn show_report_history(engine: &FleetEngine) {
    let history = engine.get_report_history();
    if history.is_empty() {
        println!("No reports yet.");
    }
    for r in history {
        println!(
            "  {} to {}: {:.1} kg, {} alerts, health {}, grade {}",
            format_timestamp(r.window_start_ms),
            format_timestamp(r.window_end_ms),
            r.total_carbon_kg,
            r.total_alerts,
            r.fleet_health,
            r.sustainability_grade
        );
    }
}

fn explain(engine: &FleetEngine) {
    let Some(id) = prompt_vehicle() else { return };
    match engine.explain_state(&id) {
        Ok(explanation) => println!("{}", explanation.to_text()),
        Err(e) => eprintln!("Error explaining state: {}", e),
    }
}

fn toggle_crisis(engine: &FleetEngine) {
    if let Some(active) = engine.crisis_state() {
        println!("Crisis active on {}; stopping.", active.vehicle_id);
        let response = engine.stop_crisis();
        println!("Crisis {:?}", response.status);
        return;
    }
    let Some(id) = prompt_vehicle() else { return };
    match engine.start_crisis(&id) {
        Ok(response) => println!("Crisis {:?} for {}", response.status, id),
        Err(e) => eprintln!("Error starting crisis: {}", e),
    }
}

fn export(engine: &FleetEngine) {
    match export_alerts(ALERTS_CSV, &engine.get_alerts(usize::MAX)) {
        Ok(n) => println!("Wrote {} alerts to {}", n, ALERTS_CSV),
        Err(e) => eprintln!("Error exporting alerts: {}", e),
    }
    match export_reports(REPORTS_CSV, &engine.get_report_history()) {
        Ok(n) => println!("Wrote {} reports to {}", n, REPORTS_CSV),
        Err(e) => eprintln!("Error exporting reports: {}", e),
    }
}

/// Numbered admin menu over the engine. Returns when the operator exits or stdin closes.
pub async fn run_cli(engine: Arc<FleetEngine>) {
    loop {
        println!("\nFleet Intelligence Admin CLI");
        println!("1. Display Recent Alerts");
        println!("2. Display Risk Breakdown");
        println!("3. Display Predictions");
        println!("4. Display Latest Report");
        println!("5. Display Report History");
        println!("6. Explain Vehicle State");
        println!("7. Start/Stop Crisis");
        println!("8. Export Alerts and Reports to CSV");
        println!("9. Engine Stats");
        println!("10. Exit");

        let Ok(Some(input)) = tokio::task::spawn_blocking(|| prompt("Enter your choice: ")).await
        else {
            break;
        };
        let choice = input.parse::<u32>().unwrap_or(0);

        match choice {
            1 => show_alerts(&engine),
            2 => show_risk(&engine),
            3 => show_predictions(&engine),
            4 => show_report(&engine),
            5 => show_report_history(&engine),
            6 => explain(&engine),
            7 => toggle_crisis(&engine),
            8 => export(&engine),
            9 => println!("{:#?}", engine.stats()),
            10 => {
                println!("Exiting CLI.");
                break;
            }
            _ => println!("Invalid choice. Try again."),
        }
    }
}
