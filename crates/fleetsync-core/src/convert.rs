// ── API-to-domain type conversions ──
//
// Bridges `fleetsync_api` wire records into `fleetsync_core::model` types.
// Status strings become enums (unknown values preserved), rates are
// clamped to be non-negative, out-of-range integers fall back to 0, and
// numeric string ids become numbers, the same rule `EntityId::from_str`
// applies to user input.

use fleetsync_api::models::{AttackRecord, RecordId, ServerRecord};

use crate::model::attack::sanitize_rate;
use crate::model::{AttackJob, AttackStatus, EntityId, Server, ServerStatus};

// ── Identity ───────────────────────────────────────────────────────

impl From<RecordId> for EntityId {
    fn from(id: RecordId) -> Self {
        match id {
            RecordId::Number(n) => Self::Number(n),
            RecordId::Text(s) => Self::from(s),
        }
    }
}

impl From<&EntityId> for RecordId {
    fn from(id: &EntityId) -> Self {
        match id {
            EntityId::Number(n) => Self::Number(*n),
            EntityId::Text(s) => Self::Text(s.clone()),
        }
    }
}

// ── Numbers ────────────────────────────────────────────────────────

fn port(raw: i64) -> u16 {
    u16::try_from(raw).unwrap_or(0)
}

fn count(raw: i64) -> u64 {
    u64::try_from(raw).unwrap_or(0)
}

// ── Server ─────────────────────────────────────────────────────────

impl From<ServerRecord> for Server {
    fn from(r: ServerRecord) -> Self {
        Self {
            id: r.id.into(),
            name: r.name,
            ip: r.ip,
            port: port(r.port),
            status: ServerStatus::from(r.status),
            last_seen: r.last_seen,
            packets_sent: count(r.packets_sent),
            packets_rate: count(r.packets_rate),
        }
    }
}

// ── Attack job ─────────────────────────────────────────────────────

impl From<AttackRecord> for AttackJob {
    fn from(r: AttackRecord) -> Self {
        Self {
            id: r.id.into(),
            name: r.name,
            target_ip: r.target_ip,
            target_port: port(r.target_port),
            duration_secs: count(r.duration),
            packets_per_second: count(r.packets_per_second),
            start_time: r.start_time,
            end_time: r.end_time,
            status: AttackStatus::from(r.status),
            servers: r.servers.into_iter().map(EntityId::from).collect(),
            total_packets_sent: count(r.total_packets_sent),
            current_rate: sanitize_rate(r.current_rate),
        }
    }
}
