pub mod messages;

pub use messages::{CrisisResponse, CrisisStatus, RiskBreakdownResponse, StateExplanation};
