pub mod fleet_engine;

pub use fleet_engine::{EngineStats, Evaluation, FleetEngine};
