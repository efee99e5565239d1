// ── Command API ──
//
// All panel actions flow through one `Command` enum. The session routes
// each variant to a `PanelClient` call and applies the result to the store.

use std::sync::Arc;

use fleetsync_api::models::{NewAttack, NewServer};

use crate::model::{AttackJob, EntityId, Server};

/// Every action a consumer can invoke against the panel.
#[derive(Debug, Clone)]
pub enum Command {
    // ── Servers ──────────────────────────────────────────────────────
    /// Fetch all servers and replace the store's collection.
    LoadServers,
    /// Register a server; the panel's record is appended to the store.
    AddServer(NewServer),
    /// Delete a server; removed from the store once the panel accepts.
    DeleteServer { id: EntityId },

    // ── Attack jobs ──────────────────────────────────────────────────
    /// Fetch all jobs and replace the store's collection.
    LoadAttacks,
    /// Create a job; the panel's record is appended to the store.
    CreateAttack(NewAttack),
    /// Ask the panel to stop a job. The store is not touched: the
    /// resulting status arrives as a push event.
    StopAttack { id: EntityId },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::LoadServers => "load_servers",
            Self::AddServer(_) => "add_server",
            Self::DeleteServer { .. } => "delete_server",
            Self::LoadAttacks => "load_attacks",
            Self::CreateAttack(_) => "create_attack",
            Self::StopAttack { .. } => "stop_attack",
        }
    }
}

/// Result of a command execution.
#[derive(Debug)]
pub enum CommandResult {
    Ok,
    Server(Arc<Server>),
    Servers(Vec<Arc<Server>>),
    Attack(Arc<AttackJob>),
    Attacks(Vec<Arc<AttackJob>>),
}
