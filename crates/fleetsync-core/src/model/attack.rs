// ── Attack job domain types ──

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity_id::EntityId;

/// Lifecycle state of an attack job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AttackStatus {
    Planning,
    Pending,
    Running,
    Stopped,
    Completed,
    Failed,
    Unknown(String),
}

impl AttackStatus {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// No further state changes are expected.
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Stopped | Self::Completed | Self::Failed)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Planning => "planning",
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Stopped => "stopped",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Unknown(raw) => raw,
        }
    }
}

impl From<&str> for AttackStatus {
    fn from(raw: &str) -> Self {
        match raw {
            "planning" => Self::Planning,
            "pending" => Self::Pending,
            "running" => Self::Running,
            "stopped" => Self::Stopped,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            other => Self::Unknown(other.to_owned()),
        }
    }
}

impl From<String> for AttackStatus {
    fn from(raw: String) -> Self {
        Self::from(raw.as_str())
    }
}

impl From<AttackStatus> for String {
    fn from(status: AttackStatus) -> Self {
        match status {
            AttackStatus::Unknown(raw) => raw,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for AttackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An attack job and its live counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackJob {
    pub id: EntityId,
    pub name: String,
    pub target_ip: String,
    pub target_port: u16,
    /// 0 means unlimited.
    pub duration_secs: u64,
    /// 0 means unlimited.
    pub packets_per_second: u64,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: AttackStatus,
    pub servers: Vec<EntityId>,
    pub total_packets_sent: u64,
    /// Packets per second, never negative.
    pub current_rate: f64,
}

impl AttackJob {
    /// Minimal job with only identity and status, counters at zero.
    pub fn new(id: impl Into<EntityId>, status: AttackStatus) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            target_ip: String::new(),
            target_port: 0,
            duration_secs: 0,
            packets_per_second: 0,
            start_time: None,
            end_time: None,
            status,
            servers: Vec::new(),
            total_packets_sent: 0,
            current_rate: 0.0,
        }
    }

    pub fn target(&self) -> String {
        format!("{}:{}", self.target_ip, self.target_port)
    }
}

/// Clamp a reported rate into the valid range: finite and non-negative.
pub(crate) fn sanitize_rate(rate: f64) -> f64 {
    if rate.is_finite() && rate > 0.0 { rate } else { 0.0 }
}
