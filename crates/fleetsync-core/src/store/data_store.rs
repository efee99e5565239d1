// ── Central reactive data store ──
//
// Holds the client-side view of servers and attack jobs. Every mutation
// runs inside one `watch::Sender::send_if_modified` call, so the
// collection change and the aggregate re-scan are a single atomic step.
// Subscribers are only woken when something actually changed.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use super::snapshot::{Aggregates, AttackStats, ServerStats, StoreSnapshot};
use super::collection::EntityCollection;
use crate::model::attack::sanitize_rate;
use crate::model::{AttackJob, EntityId, Server};
use crate::stream::{AttackFilter, ServerFilter, StoreStream};

/// Reactive store for servers, attack jobs, and their aggregates.
///
/// Thread-safe: mutations take `&self` and serialize on the watch
/// channel's internal lock. Reads are cheap `Arc` clones of the latest
/// snapshot. No mutation fails; a missing target is a no-op.
pub struct DataStore {
    state: watch::Sender<Arc<StoreSnapshot>>,
    last_push_event: watch::Sender<Option<DateTime<Utc>>>,
    last_initial_state: watch::Sender<Option<DateTime<Utc>>>,
}

impl DataStore {
    pub fn new() -> Self {
        let (state, _) = watch::channel(Arc::new(StoreSnapshot::default()));
        let (last_push_event, _) = watch::channel(None);
        let (last_initial_state, _) = watch::channel(None);

        Self {
            state,
            last_push_event,
            last_initial_state,
        }
    }

    /// Run `f` against a writable copy of the state. If it reports a
    /// change, aggregates are re-derived and the new snapshot published.
    fn mutate(&self, f: impl FnOnce(&mut StoreSnapshot) -> bool) -> bool {
        self.state.send_if_modified(|current| {
            let mut next = StoreSnapshot::clone(current);
            if !f(&mut next) {
                return false;
            }
            next.recompute();
            *current = Arc::new(next);
            true
        })
    }

    // ── Server mutations ─────────────────────────────────────────────

    /// Replace the whole server collection.
    pub fn set_servers(&self, servers: impl IntoIterator<Item = Server>) -> bool {
        let next = EntityCollection::from_items(servers);
        self.mutate(|s| {
            if s.servers.same_as(&next) {
                return false;
            }
            s.servers = next;
            true
        })
    }

    /// Append a server unless its id is already present.
    pub fn add_server(&self, server: Server) -> bool {
        self.mutate(|s| s.servers.insert_new(server))
    }

    /// Replace the server with the same id in place.
    pub fn update_server(&self, server: Server) -> bool {
        self.mutate(|s| s.servers.replace(server))
    }

    pub fn remove_server(&self, id: &EntityId) -> bool {
        self.mutate(|s| s.servers.remove(id))
    }

    // ── Attack job mutations ─────────────────────────────────────────

    /// Replace the whole attack job collection.
    pub fn set_attacks(&self, attacks: impl IntoIterator<Item = AttackJob>) -> bool {
        let next = EntityCollection::from_items(attacks);
        self.mutate(|s| {
            if s.attacks.same_as(&next) {
                return false;
            }
            s.attacks = next;
            true
        })
    }

    /// Append a job unless its id is already present.
    pub fn add_attack(&self, job: AttackJob) -> bool {
        self.mutate(|s| s.attacks.insert_new(job))
    }

    /// Replace the job with the same id in place.
    pub fn update_attack(&self, job: AttackJob) -> bool {
        self.mutate(|s| s.attacks.replace(job))
    }

    pub fn remove_attack(&self, id: &EntityId) -> bool {
        self.mutate(|s| s.attacks.remove(id))
    }

    /// Set the live counters of one job. Global packet totals and the
    /// average rate are re-derived from the whole collection either way.
    pub fn update_attack_stats(&self, id: &EntityId, packets: u64, rate: f64) -> bool {
        let rate = sanitize_rate(rate);
        self.mutate(|s| {
            s.attacks.modify(id, |job| {
                #[allow(clippy::float_cmp)]
                let same = job.total_packets_sent == packets && job.current_rate == rate;
                job.total_packets_sent = packets;
                job.current_rate = rate;
                !same
            })
        })
    }

    // ── Connection / lifecycle ───────────────────────────────────────

    pub fn set_connection_status(&self, connected: bool) -> bool {
        self.mutate(|s| {
            if s.aggregates.connection_status == connected {
                return false;
            }
            s.aggregates.connection_status = connected;
            true
        })
    }

    /// Drop both collections. Connection status is left as is.
    pub fn clear(&self) -> bool {
        self.mutate(|s| {
            let servers = s.servers.clear();
            let attacks = s.attacks.clear();
            servers || attacks
        })
    }

    // ── Snapshot accessors ───────────────────────────────────────────

    /// The whole current state as one consistent view.
    pub fn snapshot(&self) -> Arc<StoreSnapshot> {
        self.state.borrow().clone()
    }

    pub fn all_servers(&self) -> Vec<Arc<Server>> {
        self.snapshot().servers()
    }

    pub fn online_servers(&self) -> Vec<Arc<Server>> {
        self.snapshot().servers_matching(&ServerFilter::Online)
    }

    pub fn server_by_id(&self, id: &EntityId) -> Option<Arc<Server>> {
        self.snapshot().server(id)
    }

    pub fn all_attacks(&self) -> Vec<Arc<AttackJob>> {
        self.snapshot().attacks()
    }

    pub fn attack_by_id(&self, id: &EntityId) -> Option<Arc<AttackJob>> {
        self.snapshot().attack(id)
    }

    pub fn active_attack_list(&self) -> Vec<Arc<AttackJob>> {
        self.snapshot().attacks_matching(&AttackFilter::Active)
    }

    pub fn server_stats(&self) -> ServerStats {
        self.snapshot().server_stats()
    }

    pub fn attack_stats(&self) -> AttackStats {
        self.snapshot().attack_stats()
    }

    pub fn aggregates(&self) -> Aggregates {
        self.snapshot().aggregates()
    }

    pub fn connection_status(&self) -> bool {
        self.state.borrow().aggregates.connection_status
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn subscribe(&self) -> StoreStream {
        StoreStream::new(self.state.subscribe())
    }

    // ── Metadata ─────────────────────────────────────────────────────

    pub(crate) fn mark_push_event(&self) {
        self.last_push_event.send_replace(Some(Utc::now()));
    }

    pub(crate) fn mark_initial_state(&self) {
        self.last_initial_state.send_replace(Some(Utc::now()));
    }

    pub fn last_push_event(&self) -> Option<DateTime<Utc>> {
        *self.last_push_event.borrow()
    }

    pub fn last_initial_state(&self) -> Option<DateTime<Utc>> {
        *self.last_initial_state.borrow()
    }

    /// How long ago the last initial snapshot arrived, or `None` if never.
    pub fn data_age(&self) -> Option<chrono::Duration> {
        self.last_initial_state().map(|t| Utc::now() - t)
    }
}

impl Default for DataStore {
    fn default() -> Self {
        Self::new()
    }
}
