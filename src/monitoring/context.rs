use crate::engine::Evaluation;
use crate::models::Alert;
use crate::monitoring::fleet_report::FleetReport;
use crate::shared_data::format_timestamp;
use std::fmt::Write;

/// Render the fleet's current picture as plain text, one fact per line.
pub fn render_context(
    alerts: &[Alert],
    evaluations: &[Evaluation],
    latest_report: Option<&FleetReport>,
) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "== Vehicles ({}) ==", evaluations.len());
    for e in evaluations {
        let _ = writeln!(
            out,
            "{}: state {} | risk {:.1} | carbon {:.1} kg | efficiency {:.1} km/L | avg speed {:.1} km/h | escalation {:.0}% | fuel {}{}",
            e.snapshot.vehicle_id,
            e.state.state,
            e.risk.risk_score,
            e.snapshot.carbon_kg,
            e.snapshot.fuel_efficiency,
            e.snapshot.avg_speed_kmh,
            e.prediction.escalation_probability * 100.0,
            e.prediction.fuel_exhaustion,
            if e.in_crisis { " | CRISIS" } else { "" }
        );
    }

    let _ = writeln!(out, "== Alerts ({}) ==", alerts.len());
    for a in alerts {
        let _ = writeln!(
            out,
            "[{}] {} {} {}: {}",
            format_timestamp(a.timestamp_ms),
            a.vehicle_id, a.alert_type, a.severity, a.message
        );
    }

    out.push_str("== Latest report ==\n");
    match latest_report {
        Some(report) => {
            let _ = writeln!(
                out,
                "Window {} to {}",
                format_timestamp(report.window_start_ms),
                format_timestamp(report.window_end_ms)
            );
            let _ = writeln!(out, "{}", report.executive_summary);
        }
        None => out.push_str("No report yet\n"),
    }
    out
}
