// ── Server domain types ──

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity_id::EntityId;

/// Server liveness as reported by the panel.
///
/// Unrecognized strings are kept verbatim in `Unknown` so a newer panel
/// never makes a server disappear from the view.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ServerStatus {
    Online,
    Offline,
    Busy,
    Unknown(String),
}

impl ServerStatus {
    pub fn is_online(&self) -> bool {
        matches!(self, Self::Online)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
            Self::Busy => "busy",
            Self::Unknown(raw) => raw,
        }
    }
}

impl From<&str> for ServerStatus {
    fn from(raw: &str) -> Self {
        match raw {
            "online" => Self::Online,
            "offline" => Self::Offline,
            "busy" => Self::Busy,
            other => Self::Unknown(other.to_owned()),
        }
    }
}

impl From<String> for ServerStatus {
    fn from(raw: String) -> Self {
        Self::from(raw.as_str())
    }
}

impl From<ServerStatus> for String {
    fn from(status: ServerStatus) -> Self {
        match status {
            ServerStatus::Unknown(raw) => raw,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A remote server in the fleet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub id: EntityId,
    pub name: String,
    pub ip: String,
    pub port: u16,
    pub status: ServerStatus,
    pub last_seen: Option<DateTime<Utc>>,
    pub packets_sent: u64,
    pub packets_rate: u64,
}

impl Server {
    /// Minimal server with only identity and status, the rest defaulted.
    pub fn new(id: impl Into<EntityId>, status: ServerStatus) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            ip: String::new(),
            port: 0,
            status,
            last_seen: None,
            packets_sent: 0,
            packets_rate: 0,
        }
    }

    /// `ip:port`, or just the ip when no port is known.
    pub fn address(&self) -> String {
        if self.port == 0 {
            self.ip.clone()
        } else {
            format!("{}:{}", self.ip, self.port)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_status_round_trips() {
        let status = ServerStatus::from("draining");
        assert_eq!(status, ServerStatus::Unknown("draining".into()));
        assert_eq!(String::from(status), "draining");
    }

    #[test]
    fn address_omits_zero_port() {
        let mut server = Server::new(1_u64, ServerStatus::Online);
        server.ip = "10.0.0.1".into();
        assert_eq!(server.address(), "10.0.0.1");
        server.port = 8081;
        assert_eq!(server.address(), "10.0.0.1:8081");
    }
}
