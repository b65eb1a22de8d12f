use crate::models::vehicle::VehicleId;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    Anomaly,
    Inefficiency,
    Deviation,
    Weather,
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AlertType::Anomaly => write!(f, "anomaly"),
            AlertType::Inefficiency => write!(f, "inefficiency"),
            AlertType::Deviation => write!(f, "deviation"),
            AlertType::Weather => write!(f, "weather"),
        }
    }
}

/// Alert severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: u64,
    pub vehicle_id: VehicleId,
    pub alert_type: AlertType,
    pub severity: Severity,
    pub message: String,
    pub timestamp_ms: u64,
}

/// Bounded rolling alert log. Oldest entries are evicted first.
#[derive(Debug, Clone)]
pub struct AlertLog {
    capacity: usize,
    entries: VecDeque<Alert>,
}

impl AlertLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: VecDeque::with_capacity(capacity.max(1)),
        }
    }

    pub fn push(&mut self, alert: Alert) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(alert);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Oldest-first iteration.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Alert> {
        self.entries.iter()
    }

    /// Alerts with `window_end_ms - window_ms <= timestamp <= window_end_ms`, oldest first.
    pub fn recent(&self, window_end_ms: u64, window_ms: u64) -> Vec<Alert> {
        let window_start = window_end_ms.saturating_sub(window_ms);
        self.entries
            .iter()
            .filter(|a| a.timestamp_ms >= window_start && a.timestamp_ms <= window_end_ms)
            .cloned()
            .collect()
    }

    pub fn to_vec(&self) -> Vec<Alert> {
        self.entries.iter().cloned().collect()
    }
}
