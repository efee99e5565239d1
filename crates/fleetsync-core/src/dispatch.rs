// ── Push event dispatcher ──
//
// Classifies decoded push messages by their `type` and routes each to
// exactly one store mutation. Unknown types and malformed payloads are
// logged and dropped; nothing here can fail the channel.

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use fleetsync_api::models::{AttackRecord, RecordId, ServerRecord};
use fleetsync_api::websocket::{ChannelEvent, RawEvent};

use crate::model::{AttackJob, EntityId, Identified, Server};
use crate::store::DataStore;

// ── PushEvent ────────────────────────────────────────────────────────

/// A classified push message, ready to apply.
#[derive(Debug, Clone, PartialEq)]
pub enum PushEvent {
    /// Full snapshot sent once per connection. A missing (or `null`)
    /// collection leaves the current one untouched.
    InitialState {
        servers: Option<Vec<Server>>,
        attacks: Option<Vec<AttackJob>>,
    },
    ServerAdded(Server),
    ServerUpdated(Server),
    ServerDeleted(EntityId),
    AttackCreated(AttackJob),
    AttackStarted(AttackJob),
    AttackStopped(AttackJob),
    AttackStatsUpdate {
        id: EntityId,
        packets: u64,
        rate: f64,
    },
}

/// Why a push message was not applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Ignored {
    #[error("unrecognized event type '{0}'")]
    UnknownType(String),

    #[error("malformed '{event_type}' payload: {reason}")]
    Malformed { event_type: String, reason: String },
}

/// What happened to one dispatched message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Routed to a mutation; `changed` is false for no-ops such as a
    /// duplicate add or a delete of an absent id.
    Applied {
        event_type: &'static str,
        changed: bool,
    },
    Ignored(Ignored),
}

impl PushEvent {
    /// Classify a raw message by its `type` discriminator.
    pub fn classify(raw: &RawEvent) -> Result<Self, Ignored> {
        let body = &raw.body;
        let ty = raw.event_type.as_str();

        let event = match ty {
            "initial_state" => Self::InitialState {
                servers: collection::<ServerRecord, Server>(ty, "servers", body.get("servers")),
                attacks: collection::<AttackRecord, AttackJob>(ty, "attacks", body.get("attacks")),
            },
            "server_added" => Self::ServerAdded(entity::<ServerRecord, Server>(ty, body, "server")?),
            "server_updated" => {
                Self::ServerUpdated(entity::<ServerRecord, Server>(ty, body, "server")?)
            }
            "server_deleted" => Self::ServerDeleted(field::<RecordId>(ty, body, "id")?.into()),
            "attack_created" => {
                Self::AttackCreated(entity::<AttackRecord, AttackJob>(ty, body, "attack")?)
            }
            "attack_started" => {
                Self::AttackStarted(entity::<AttackRecord, AttackJob>(ty, body, "attack")?)
            }
            "attack_stopped" => {
                Self::AttackStopped(entity::<AttackRecord, AttackJob>(ty, body, "attack")?)
            }
            "attack_stats_update" => Self::AttackStatsUpdate {
                id: field::<RecordId>(ty, body, "id")?.into(),
                packets: field(ty, body, "packets")?,
                rate: field(ty, body, "rate")?,
            },
            other => return Err(Ignored::UnknownType(other.to_owned())),
        };

        Ok(event)
    }

    /// The wire `type` this event was classified from.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::InitialState { .. } => "initial_state",
            Self::ServerAdded(_) => "server_added",
            Self::ServerUpdated(_) => "server_updated",
            Self::ServerDeleted(_) => "server_deleted",
            Self::AttackCreated(_) => "attack_created",
            Self::AttackStarted(_) => "attack_started",
            Self::AttackStopped(_) => "attack_stopped",
            Self::AttackStatsUpdate { .. } => "attack_stats_update",
        }
    }
}

// ── Applying ─────────────────────────────────────────────────────────

/// Apply a classified event to the store. Returns whether state changed.
pub fn apply(store: &DataStore, event: PushEvent) -> bool {
    match event {
        PushEvent::InitialState { servers, attacks } => {
            let servers_changed = servers.is_some_and(|list| store.set_servers(list));
            let attacks_changed = attacks.is_some_and(|list| store.set_attacks(list));
            store.mark_initial_state();
            servers_changed || attacks_changed
        }
        PushEvent::ServerAdded(server) => store.add_server(server),
        PushEvent::ServerUpdated(server) => store.update_server(server),
        PushEvent::ServerDeleted(id) => store.remove_server(&id),
        PushEvent::AttackCreated(job) => store.add_attack(job),
        PushEvent::AttackStarted(job) | PushEvent::AttackStopped(job) => store.update_attack(job),
        PushEvent::AttackStatsUpdate { id, packets, rate } => {
            store.update_attack_stats(&id, packets, rate)
        }
    }
}

/// Classify and apply one raw message.
pub fn dispatch(store: &DataStore, raw: &RawEvent) -> DispatchOutcome {
    store.mark_push_event();

    match PushEvent::classify(raw) {
        Ok(event) => {
            let event_type = event.event_type();
            let changed = apply(store, event);
            debug!(event_type, changed, "push event applied");
            DispatchOutcome::Applied {
                event_type,
                changed,
            }
        }
        Err(ignored) => {
            debug!(reason = %ignored, "push event ignored");
            DispatchOutcome::Ignored(ignored)
        }
    }
}

/// Fold one channel lifecycle event into the store: liveness on connect
/// and disconnect, dispatch for messages.
pub fn handle_channel_event(store: &DataStore, event: &ChannelEvent) {
    match event {
        ChannelEvent::Connected => {
            store.set_connection_status(true);
        }
        ChannelEvent::Disconnected { reason } => {
            debug!(reason, "event channel down");
            store.set_connection_status(false);
        }
        ChannelEvent::Message(raw) => {
            dispatch(store, raw);
        }
    }
}

// ── Payload helpers ──────────────────────────────────────────────────

fn malformed(event_type: &str, reason: impl Into<String>) -> Ignored {
    Ignored::Malformed {
        event_type: event_type.to_owned(),
        reason: reason.into(),
    }
}

fn field<T: DeserializeOwned>(event_type: &str, body: &Value, name: &str) -> Result<T, Ignored> {
    let value = body
        .get(name)
        .ok_or_else(|| malformed(event_type, format!("missing '{name}'")))?;
    T::deserialize(value).map_err(|e| malformed(event_type, format!("'{name}': {e}")))
}

fn entity<R, T>(event_type: &str, body: &Value, name: &str) -> Result<T, Ignored>
where
    R: DeserializeOwned,
    T: From<R>,
{
    field::<R>(event_type, body, name).map(T::from)
}

/// Decode a snapshot collection sent either as a list or as an object
/// keyed by id. Object entries are ordered by id.
///
/// Records are decoded one at a time: a record that does not decode is
/// logged and skipped, the rest still apply. A value that is neither a
/// list nor an object counts as absent.
fn collection<R, T>(event_type: &str, name: &str, value: Option<&Value>) -> Option<Vec<T>>
where
    R: DeserializeOwned,
    T: From<R> + Identified,
{
    let decode = |v: &Value| match R::deserialize(v) {
        Ok(record) => Some(T::from(record)),
        Err(e) => {
            warn!(event_type, collection = name, error = %e, "skipping undecodable record");
            None
        }
    };

    match value {
        None | Some(Value::Null) => None,
        Some(Value::Array(items)) => Some(items.iter().filter_map(decode).collect()),
        Some(Value::Object(map)) => {
            let mut items: Vec<T> = map.values().filter_map(decode).collect();
            items.sort_by(|a, b| a.id().cmp(b.id()));
            Some(items)
        }
        Some(other) => {
            debug!(event_type, collection = name, value = %other, "expected a list or an object");
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::model::{AttackStatus, ServerStatus};

    fn raw(body: Value) -> RawEvent {
        RawEvent {
            event_type: body["type"].as_str().unwrap().to_owned(),
            body,
        }
    }

    #[test]
    fn server_added_increments_totals() {
        let store = DataStore::new();
        let before = store.aggregates();

        let outcome = dispatch(
            &store,
            &raw(json!({ "type": "server_added", "server": { "id": "a", "status": "online" } })),
        );

        assert_eq!(
            outcome,
            DispatchOutcome::Applied {
                event_type: "server_added",
                changed: true
            }
        );
        let after = store.aggregates();
        assert_eq!(after.total_servers, before.total_servers + 1);
        assert_eq!(after.active_servers, before.active_servers + 1);
    }

    #[test]
    fn unknown_event_changes_nothing() {
        let store = DataStore::new();
        store.add_server(Server::new(1_u64, ServerStatus::Online));
        let before = store.snapshot();

        let outcome = dispatch(&store, &raw(json!({ "type": "unknown_event" })));

        assert_eq!(
            outcome,
            DispatchOutcome::Ignored(Ignored::UnknownType("unknown_event".into()))
        );
        assert!(Arc::ptr_eq(&before, &store.snapshot()));
    }

    #[test]
    fn repeated_delete_is_idempotent() {
        let store = DataStore::new();
        store.add_server(Server::new(4_u64, ServerStatus::Offline));
        let delete = raw(json!({ "type": "server_deleted", "id": 4 }));

        assert!(matches!(
            dispatch(&store, &delete),
            DispatchOutcome::Applied { changed: true, .. }
        ));
        let after_first = store.snapshot();
        assert!(matches!(
            dispatch(&store, &delete),
            DispatchOutcome::Applied { changed: false, .. }
        ));
        assert!(Arc::ptr_eq(&after_first, &store.snapshot()));
        assert_eq!(store.aggregates().total_servers, 0);
    }

    #[test]
    fn malformed_payload_is_ignored() {
        let store = DataStore::new();
        let outcome = dispatch(
            &store,
            &raw(json!({ "type": "attack_stats_update", "id": 1, "packets": "lots" })),
        );
        assert!(matches!(
            outcome,
            DispatchOutcome::Ignored(Ignored::Malformed { .. })
        ));

        let outcome = dispatch(&store, &raw(json!({ "type": "server_added" })));
        assert!(matches!(
            outcome,
            DispatchOutcome::Ignored(Ignored::Malformed { .. })
        ));
    }

    #[test]
    fn initial_state_accepts_id_keyed_objects() {
        let store = DataStore::new();
        dispatch(
            &store,
            &raw(json!({
                "type": "initial_state",
                "servers": {
                    "10": { "id": 10, "status": "online" },
                    "2": { "id": 2, "status": "offline" }
                },
                "attacks": [
                    { "id": 1, "status": "running", "totalPacketsSent": 50, "currentRate": 7.9 }
                ]
            })),
        );

        let ids: Vec<EntityId> = store.all_servers().iter().map(|s| s.id.clone()).collect();
        assert_eq!(ids, vec![EntityId::Number(2), EntityId::Number(10)]);

        let agg = store.aggregates();
        assert_eq!(agg.total_servers, 2);
        assert_eq!(agg.active_servers, 1);
        assert_eq!(agg.active_attacks, 1);
        assert_eq!(agg.total_packets, 50);
        assert_eq!(agg.avg_packet_rate, 7);
        assert!(store.last_initial_state().is_some());
    }

    #[test]
    fn initial_state_skips_undecodable_records() {
        let store = DataStore::new();
        let outcome = dispatch(
            &store,
            &raw(json!({
                "type": "initial_state",
                "servers": {
                    "1": { "id": 1, "port": 70000, "status": "online" },
                    "2": { "id": 2, "port": 22, "status": "online" },
                    "3": { "id": -3, "status": "online" }
                },
                "attacks": {
                    "1": { "id": 1, "duration": -1, "status": "running" },
                    "2": { "id": 2, "status": ["not", "a", "string"] }
                }
            })),
        );

        assert_eq!(
            outcome,
            DispatchOutcome::Applied {
                event_type: "initial_state",
                changed: true
            }
        );
        let ids: Vec<EntityId> = store.all_servers().iter().map(|s| s.id.clone()).collect();
        assert_eq!(ids, vec![EntityId::Number(1), EntityId::Number(2)]);
        assert_eq!(store.server_by_id(&EntityId::Number(1)).unwrap().port, 0);
        assert_eq!(store.server_by_id(&EntityId::Number(2)).unwrap().port, 22);

        let job = store.attack_by_id(&EntityId::Number(1)).unwrap();
        assert_eq!(job.duration_secs, 0);
        assert_eq!(store.aggregates().active_attacks, 1);
    }

    #[test]
    fn initial_state_with_bad_collection_still_applies_the_other() {
        let store = DataStore::new();
        dispatch(
            &store,
            &raw(json!({
                "type": "initial_state",
                "servers": "garbage",
                "attacks": [{ "id": 9, "status": "running" }]
            })),
        );

        assert!(store.all_servers().is_empty());
        assert_eq!(store.aggregates().active_attacks, 1);
    }

    #[test]
    fn server_added_with_unchecked_port_is_stored() {
        let store = DataStore::new();
        dispatch(
            &store,
            &raw(json!({ "type": "server_added", "server": { "id": 5, "port": -1, "status": "online" } })),
        );
        assert_eq!(store.aggregates().total_servers, 1);
        assert_eq!(store.server_by_id(&EntityId::Number(5)).unwrap().port, 0);
    }

    #[test]
    fn string_ids_resolve_through_parsed_lookups() {
        let store = DataStore::new();
        dispatch(
            &store,
            &raw(json!({ "type": "server_added", "server": { "id": "10", "status": "online" } })),
        );

        let lookup: EntityId = "10".parse().unwrap();
        assert!(store.server_by_id(&lookup).is_some());

        dispatch(&store, &raw(json!({ "type": "server_deleted", "id": 10 })));
        assert!(store.all_servers().is_empty());
    }

    #[test]
    fn initial_state_without_attacks_keeps_them() {
        let store = DataStore::new();
        store.add_attack(AttackJob::new(1_u64, AttackStatus::Running));

        dispatch(
            &store,
            &raw(json!({ "type": "initial_state", "servers": [], "attacks": null })),
        );

        assert_eq!(store.all_attacks().len(), 1);
        assert_eq!(store.all_servers().len(), 0);
    }

    #[test]
    fn attack_lifecycle_events() {
        let store = DataStore::new();
        dispatch(
            &store,
            &raw(json!({ "type": "attack_created", "attack": { "id": 3, "status": "planning" } })),
        );
        assert_eq!(store.aggregates().active_attacks, 0);

        dispatch(
            &store,
            &raw(json!({ "type": "attack_started", "attack": { "id": 3, "status": "running" } })),
        );
        assert_eq!(store.aggregates().active_attacks, 1);

        dispatch(
            &store,
            &raw(json!({ "type": "attack_stats_update", "id": 3, "packets": 120000, "rate": 100500 })),
        );
        let job = store.attack_by_id(&EntityId::Number(3)).unwrap();
        assert_eq!(job.total_packets_sent, 120_000);
        assert_eq!(store.aggregates().avg_packet_rate, 100_500);

        dispatch(
            &store,
            &raw(json!({ "type": "attack_stopped", "attack": { "id": 3, "status": "stopped" } })),
        );
        let agg = store.aggregates();
        assert_eq!(agg.active_attacks, 0);
        assert_eq!(agg.avg_packet_rate, 0);
    }

    #[test]
    fn channel_events_toggle_connection_status() {
        let store = DataStore::new();
        let mut seen = vec![store.connection_status()];

        for event in [
            ChannelEvent::Connected,
            ChannelEvent::Disconnected {
                reason: "closed".into(),
            },
            ChannelEvent::Connected,
        ] {
            handle_channel_event(&store, &event);
            seen.push(store.connection_status());
        }

        assert_eq!(seen, vec![false, true, false, true]);
    }

    #[test]
    fn server_deleted_with_text_id() {
        let event = PushEvent::classify(&raw(json!({ "type": "server_deleted", "id": "edge-b" })))
            .unwrap();
        assert_eq!(event, PushEvent::ServerDeleted(EntityId::Text("edge-b".into())));
    }
}
