// ── Filter predicates for store snapshots ──
//
// Used by the store's derived queries and by the CLI to narrow listings
// without another round trip to the panel.

use crate::model::{AttackJob, AttackStatus, Server, ServerStatus};

/// Filter predicate for server collections.
pub enum ServerFilter {
    All,
    Online,
    /// Anything that is not `online`.
    Offline,
    ByStatus(ServerStatus),
    Custom(Box<dyn Fn(&Server) -> bool + Send + Sync>),
}

impl ServerFilter {
    pub fn matches(&self, server: &Server) -> bool {
        match self {
            Self::All => true,
            Self::Online => server.status.is_online(),
            Self::Offline => !server.status.is_online(),
            Self::ByStatus(status) => server.status == *status,
            Self::Custom(f) => f(server),
        }
    }
}

/// Filter predicate for attack job collections.
pub enum AttackFilter {
    All,
    /// Jobs currently `running`.
    Active,
    ByStatus(AttackStatus),
    Custom(Box<dyn Fn(&AttackJob) -> bool + Send + Sync>),
}

impl AttackFilter {
    pub fn matches(&self, job: &AttackJob) -> bool {
        match self {
            Self::All => true,
            Self::Active => job.status.is_running(),
            Self::ByStatus(status) => job.status == *status,
            Self::Custom(f) => f(job),
        }
    }
}
