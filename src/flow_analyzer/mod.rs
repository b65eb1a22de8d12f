pub mod alert_generator;
pub mod predictive_model;
pub mod risk_scorer;

// Re-export the items consumers reach for most
pub use alert_generator::{AlertCause, AlertGenerator};
pub use predictive_model::{predict, rank_by_escalation, FuelEta, Prediction};
pub use risk_scorer::{score, RiskBreakdown, RiskFactors};
