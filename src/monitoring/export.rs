use crate::error::Result;
use crate::models::Alert;
use crate::monitoring::fleet_report::FleetReport;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::path::Path;

pub const ALERTS_CSV: &str = "fleet_alerts.csv";
pub const REPORTS_CSV: &str = "fleet_reports.csv";

/// Flat row for one fleet report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRecord {
    pub window_start_ms: u64,
    pub window_end_ms: u64,
    pub total_carbon_kg: f64,
    pub active_vehicles: usize,
    pub total_alerts: usize,
    pub avg_risk_score: f64,
    pub avg_fuel_efficiency: f64,
    pub sustainability_score: f64,
    pub fleet_health: String,
    pub sustainability_grade: String,
    pub highest_carbon: Option<String>,
    pub least_efficient: Option<String>,
    pub most_alerts: Option<String>,
    pub executive_summary: String,
}

impl From<&FleetReport> for ReportRecord {
    fn from(report: &FleetReport) -> Self {
        let offenders = &report.top_offenders;
        Self {
            window_start_ms: report.window_start_ms,
            window_end_ms: report.window_end_ms,
            total_carbon_kg: report.total_carbon_kg,
            active_vehicles: report.active_vehicles,
            total_alerts: report.total_alerts,
            avg_risk_score: report.avg_risk_score,
            avg_fuel_efficiency: report.avg_fuel_efficiency,
            sustainability_score: report.sustainability_score,
            fleet_health: report.fleet_health.to_string(),
            sustainability_grade: report.sustainability_grade.to_string(),
            highest_carbon: offenders.highest_carbon.as_ref().map(|id| id.to_string()),
            least_efficient: offenders.least_efficient.as_ref().map(|id| id.to_string()),
            most_alerts: offenders.most_alerts.as_ref().map(|id| id.to_string()),
            executive_summary: report.executive_summary.clone(),
        }
    }
}

/// Append one record to a CSV file, writing the header only when the file is new.
pub fn log_to_csv<T: Serialize>(path: impl AsRef<Path>, record: &T) -> Result<()> {
    let path = path.as_ref();
    let file_exists = path.exists();
    let file = OpenOptions::new().append(true).create(true).open(path)?;
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(!file_exists)
        .from_writer(file);
    wtr.serialize(record)?;
    wtr.flush()?;
    Ok(())
}

/// Replace `path` with `records`. Returns the number of rows written.
pub fn write_csv<T: Serialize>(path: impl AsRef<Path>, records: &[T]) -> Result<usize> {
    let mut wtr = csv::Writer::from_path(path.as_ref())?;
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(records.len())
}

pub fn read_csv<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<Vec<T>> {
    let file = File::open(path.as_ref())?;
    let mut rdr = csv::Reader::from_reader(file);
    let mut records = Vec::new();
    for result in rdr.deserialize() {
        records.push(result?);
    }
    Ok(records)
}

pub fn export_alerts(path: impl AsRef<Path>, alerts: &[Alert]) -> Result<usize> {
    write_csv(path, alerts)
}

pub fn export_reports(path: impl AsRef<Path>, reports: &[FleetReport]) -> Result<usize> {
    let records: Vec<ReportRecord> = reports.iter().map(ReportRecord::from).collect();
    write_csv(path, &records)
}

/// Append a report as it is generated.
pub fn log_report(path: impl AsRef<Path>, report: &FleetReport) {
    if let Err(e) = log_to_csv(path, &ReportRecord::from(report)) {
        log::error!("Error logging fleet report: {}", e);
    }
}
