// Wire records exchanged with the panel.
//
// Field names follow the panel's camelCase JSON. Every descriptive field has
// a default so partial payloads (push events carry whatever the panel had at
// the time) still decode; unknown fields are kept in `extra`. Integers are
// signed 64-bit as the panel sends them, unvalidated; range checks happen
// when converting to domain types.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier as it appears on the wire: the panel uses integers, but
/// string ids are accepted too.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(u64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<u64> for RecordId {
    fn from(n: u64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

/// A server as reported by the panel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerRecord {
    pub id: RecordId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub port: i64,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub last_seen: Option<DateTime<Utc>>,
    #[serde(default)]
    pub packets_sent: i64,
    #[serde(default)]
    pub packets_rate: i64,

    /// All remaining fields the panel sends.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// An attack job as reported by the panel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttackRecord {
    pub id: RecordId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub target_ip: String,
    #[serde(default)]
    pub target_port: i64,
    /// Seconds; 0 means unlimited.
    #[serde(default)]
    pub duration: i64,
    /// 0 means unlimited.
    #[serde(default)]
    pub packets_per_second: i64,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub servers: Vec<RecordId>,
    #[serde(default)]
    pub total_packets_sent: i64,
    #[serde(default)]
    pub current_rate: f64,

    /// All remaining fields the panel sends.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Request body for registering a server.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewServer {
    pub name: String,
    pub ip: String,
    pub port: u16,
}

/// Request body for creating an attack job.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAttack {
    pub name: String,
    pub target_ip: String,
    pub target_port: u16,
    pub duration: u64,
    pub packets_per_second: u64,
    pub servers: Vec<RecordId>,
}
