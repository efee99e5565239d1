// ── Reactive data store ──
//
// Snapshot-based entity storage with push-based change notification.

mod collection;
mod data_store;
mod snapshot;

pub use data_store::DataStore;
pub use snapshot::{Aggregates, AttackStats, ServerStats, StoreSnapshot};
