//! Error types for the fleet engine.

use thiserror::Error;

/// Errors surfaced to callers of the engine.
///
/// Malformed telemetry is not an error: it is dropped at the alert generator
/// boundary and counted in [`EngineStats`](crate::engine::EngineStats).
#[derive(Error, Debug)]
pub enum FleetError {
    /// Unknown vehicle id on a per-vehicle query or crisis start.
    #[error("Vehicle not found: {0}")]
    VehicleNotFound(String),

    /// A vehicle with this id is already registered.
    #[error("Vehicle already registered: {0}")]
    VehicleAlreadyRegistered(String),

    /// Report window does not advance past the previous one.
    #[error("Report window ending at {window_end_ms} does not follow previous window ending at {previous_end_ms}")]
    NonMonotonicWindow {
        window_end_ms: u64,
        previous_end_ms: u64,
    },

    /// Report window would overlap the previous one or straddle two windows.
    #[error("Report window ending at {window_end_ms} is not a whole number of {window_ms} ms windows after {previous_end_ms}")]
    OffGridWindow {
        window_end_ms: u64,
        previous_end_ms: u64,
        window_ms: u64,
    },

    /// No report has been generated yet.
    #[error("No fleet report generated yet")]
    NoReport,

    /// Configuration could not be read or parsed.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// CSV export failure.
    #[error("Export failed: {0}")]
    Export(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, FleetError>;
