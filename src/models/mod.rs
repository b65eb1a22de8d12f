pub mod alert;
pub mod telemetry;
pub mod vehicle;

pub use alert::{Alert, AlertLog, AlertType, Severity};
pub use telemetry::{TelemetryDelta, TelemetryEvent, TelemetryReading, WeatherCondition};
pub use vehicle::{Vehicle, VehicleClass, VehicleId, VehicleSnapshot, VehicleStatus};
