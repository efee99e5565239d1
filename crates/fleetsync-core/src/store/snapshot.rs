// ── Consistent store snapshot ──
//
// One immutable view of both collections plus the aggregates derived from
// them. The store publishes a new `Arc<StoreSnapshot>` per mutation, so a
// reader can never see aggregates that disagree with the collections.

use std::sync::Arc;

use serde::Serialize;

use super::collection::EntityCollection;
use crate::model::{AttackJob, EntityId, Server};
use crate::stream::{AttackFilter, ServerFilter};

/// Derived statistics, recomputed by a full scan after every mutation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Aggregates {
    pub total_servers: usize,
    /// Servers whose status is `online`.
    pub active_servers: usize,
    /// Attack jobs whose status is `running`.
    pub active_attacks: usize,
    /// Sum of `total_packets_sent` over all jobs, saturating.
    pub total_packets: u64,
    /// Floor of the mean `current_rate` over running jobs; 0 if none run.
    pub avg_packet_rate: u64,
    /// Event channel liveness.
    pub connection_status: bool,
}

impl Aggregates {
    fn compute(
        servers: &EntityCollection<Server>,
        attacks: &EntityCollection<AttackJob>,
        connection_status: bool,
    ) -> Self {
        let active_servers = servers.iter().filter(|s| s.status.is_online()).count();

        let mut total_packets: u64 = 0;
        let mut running: u32 = 0;
        let mut rate_sum = 0.0_f64;
        for job in attacks.iter() {
            total_packets = total_packets.saturating_add(job.total_packets_sent);
            if job.status.is_running() {
                running = running.saturating_add(1);
                rate_sum += job.current_rate;
            }
        }

        Self {
            total_servers: servers.len(),
            active_servers,
            active_attacks: attacks.iter().filter(|j| j.status.is_running()).count(),
            total_packets,
            avg_packet_rate: floor_mean(rate_sum, running),
            connection_status,
        }
    }
}

#[allow(clippy::as_conversions, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn floor_mean(sum: f64, count: u32) -> u64 {
    if count == 0 {
        return 0;
    }
    // Rates are clamped non-negative on the way in; `as` saturates.
    (sum / f64::from(count)).floor() as u64
}

/// Server counts as shown on the dashboard header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ServerStats {
    pub total: usize,
    pub active: usize,
    /// `total - active`: anything not online counts as offline here.
    pub offline: usize,
}

/// Attack job counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AttackStats {
    pub total: usize,
    pub active: usize,
    pub total_packets: u64,
    pub avg_rate: u64,
}

/// Immutable, internally consistent view of the store.
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    pub(crate) servers: EntityCollection<Server>,
    pub(crate) attacks: EntityCollection<AttackJob>,
    pub(crate) aggregates: Aggregates,
}

impl StoreSnapshot {
    /// Re-derive every aggregate from the collections.
    pub(crate) fn recompute(&mut self) {
        self.aggregates = Aggregates::compute(
            &self.servers,
            &self.attacks,
            self.aggregates.connection_status,
        );
    }

    // ── Servers ──────────────────────────────────────────────────────

    pub fn servers(&self) -> Vec<Arc<Server>> {
        self.servers.to_vec()
    }

    pub fn servers_matching(&self, filter: &ServerFilter) -> Vec<Arc<Server>> {
        self.servers
            .iter()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect()
    }

    pub fn server(&self, id: &EntityId) -> Option<Arc<Server>> {
        self.servers.get(id)
    }

    pub fn server_stats(&self) -> ServerStats {
        let a = &self.aggregates;
        ServerStats {
            total: a.total_servers,
            active: a.active_servers,
            offline: a.total_servers.saturating_sub(a.active_servers),
        }
    }

    // ── Attack jobs ──────────────────────────────────────────────────

    pub fn attacks(&self) -> Vec<Arc<AttackJob>> {
        self.attacks.to_vec()
    }

    pub fn attacks_matching(&self, filter: &AttackFilter) -> Vec<Arc<AttackJob>> {
        self.attacks
            .iter()
            .filter(|j| filter.matches(j))
            .cloned()
            .collect()
    }

    pub fn attack(&self, id: &EntityId) -> Option<Arc<AttackJob>> {
        self.attacks.get(id)
    }

    pub fn attack_stats(&self) -> AttackStats {
        let a = &self.aggregates;
        AttackStats {
            total: self.attacks.len(),
            active: a.active_attacks,
            total_packets: a.total_packets,
            avg_rate: a.avg_packet_rate,
        }
    }

    // ── Aggregates ───────────────────────────────────────────────────

    pub fn aggregates(&self) -> Aggregates {
        self.aggregates
    }
}
