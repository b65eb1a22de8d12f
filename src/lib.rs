//! Fleet risk and state intelligence engine.
//!
//! Telemetry flows into [`engine::FleetEngine`], which raises alerts,
//! scores risk, tracks each vehicle's operational state, forecasts
//! escalation and builds periodic fleet reports.

pub mod communication;
pub mod config;
pub mod control_system;
pub mod engine;
pub mod error;
pub mod flow_analyzer;
pub mod global_variables;
pub mod models;
pub mod monitoring;
pub mod shared_data;
pub mod simulation_engine;

pub use config::EngineConfig;
pub use engine::{EngineStats, FleetEngine};
pub use error::{FleetError, Result};
