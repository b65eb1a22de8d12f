pub mod admin_cli;
pub mod context;
pub mod export;
pub mod fleet_report;
pub mod leaderboard;
pub mod report_scheduler;

pub use fleet_report::{
    build_report, FleetHealth, FleetReport, ReportHistory, SustainabilityGrade, TopOffenders,
    VehicleReportInput,
};
pub use leaderboard::{Leaderboard, LeaderboardEntry};
pub use report_scheduler::ReportScheduler;
