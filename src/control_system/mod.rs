pub mod crisis_simulator;
pub mod state_machine;

pub use crisis_simulator::{perturb_reading, perturb_snapshot, CrisisRegister, CrisisState};
pub use state_machine::{
    evaluate, RiskLevel, StateRecord, TransitionReason, VehicleState, VehicleStateMachine,
};
