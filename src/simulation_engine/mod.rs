// simulation_engine/mod.rs
pub mod fleet;
pub mod simulation;
