// ── Domain model ──
//
// Canonical representation of the panel's entities. Wire records from
// `fleetsync_api` are converted into these types in `crate::convert`;
// consumers (CLI, tests) only ever see these.

pub mod attack;
pub mod entity_id;
pub mod server;

pub use attack::{AttackJob, AttackStatus};
pub use entity_id::EntityId;
pub use server::{Server, ServerStatus};

/// An entity with a stable identity inside its collection.
pub trait Identified {
    fn id(&self) -> &EntityId;
}

impl Identified for Server {
    fn id(&self) -> &EntityId {
        &self.id
    }
}

impl Identified for AttackJob {
    fn id(&self) -> &EntityId {
        &self.id
    }
}
