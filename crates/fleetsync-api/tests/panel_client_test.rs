// Integration tests for `PanelClient` using wiremock.

#![allow(clippy::unwrap_used)]

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use fleetsync_api::{Error, NewAttack, NewServer, PanelClient, RecordId, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, PanelClient) {
    let server = MockServer::start().await;
    let client = PanelClient::new(
        Url::parse(&server.uri()).unwrap(),
        &TransportConfig::default(),
    )
    .unwrap();
    (server, client)
}

async fn setup_with_token(token: &str) -> (MockServer, PanelClient) {
    let server = MockServer::start().await;
    let transport = TransportConfig {
        admin_token: Some(SecretString::from(token.to_owned())),
        ..TransportConfig::default()
    };
    let client = PanelClient::new(Url::parse(&server.uri()).unwrap(), &transport).unwrap();
    (server, client)
}

// ── Happy-path tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_list_servers() {
    let (server, client) = setup().await;

    let body = json!([
        { "id": 1, "name": "edge-1", "ip": "10.0.0.1", "port": 8081, "status": "online",
          "lastSeen": "2026-03-01T12:00:00Z", "packetsSent": 1200, "packetsRate": 40 },
        { "id": 2, "name": "edge-2", "ip": "10.0.0.2", "port": 8081, "status": "offline" },
    ]);

    Mock::given(method("GET"))
        .and(path("/api/servers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let servers = client.list_servers().await.unwrap();

    assert_eq!(servers.len(), 2);
    assert_eq!(servers[0].id, RecordId::Number(1));
    assert_eq!(servers[0].packets_sent, 1200);
    assert_eq!(servers[1].status, "offline");
    assert!(servers[1].last_seen.is_none());
}

#[tokio::test]
async fn test_create_server_posts_json() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/servers"))
        .and(body_json(json!({ "name": "edge-3", "ip": "10.0.0.3", "port": 9000 })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 3, "name": "edge-3", "ip": "10.0.0.3", "port": 9000, "status": "offline"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let created = client
        .create_server(&NewServer {
            name: "edge-3".into(),
            ip: "10.0.0.3".into(),
            port: 9000,
        })
        .await
        .unwrap();

    assert_eq!(created.id, RecordId::Number(3));
    assert_eq!(created.name, "edge-3");
}

#[tokio::test]
async fn test_delete_server() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/servers/7"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client.delete_server(&RecordId::Number(7)).await.unwrap();
}

#[tokio::test]
async fn test_list_and_create_attacks() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/attacks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 10, "name": "drill", "targetIp": "192.0.2.10", "targetPort": 80,
              "duration": 60, "packetsPerSecond": 1000, "status": "running",
              "servers": [1, 2], "totalPacketsSent": 5000, "currentRate": 950.5 }
        ])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/attacks"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 11, "name": "drill-2", "status": "planning", "servers": [1]
        })))
        .mount(&server)
        .await;

    let attacks = client.list_attacks().await.unwrap();
    assert_eq!(attacks.len(), 1);
    assert_eq!(attacks[0].servers, vec![RecordId::Number(1), RecordId::Number(2)]);
    assert_eq!(attacks[0].total_packets_sent, 5000);

    let created = client
        .create_attack(&NewAttack {
            name: "drill-2".into(),
            target_ip: "192.0.2.11".into(),
            target_port: 443,
            duration: 0,
            packets_per_second: 0,
            servers: vec![RecordId::Number(1)],
        })
        .await
        .unwrap();
    assert_eq!(created.id, RecordId::Number(11));
    assert_eq!(created.status, "planning");
}

#[tokio::test]
async fn test_stop_attack() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/attacks/10/stop"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client.stop_attack(&RecordId::Number(10)).await.unwrap();
}

#[tokio::test]
async fn test_admin_token_header_is_sent() {
    let (server, client) = setup_with_token("panel-admin").await;

    Mock::given(method("GET"))
        .and(path("/api/servers"))
        .and(header("X-Admin-Token", "panel-admin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let servers = client.list_servers().await.unwrap();
    assert!(servers.is_empty());
}

// ── Error-path tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_unauthorized_maps_to_authentication() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/servers/1"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "error": "Invalid admin token" })),
        )
        .mount(&server)
        .await;

    let err = client.delete_server(&RecordId::Number(1)).await.unwrap_err();
    match err {
        Error::Authentication { ref message } => assert_eq!(message, "Invalid admin token"),
        ref other => panic!("expected Authentication, got {other:?}"),
    }
    assert!(err.is_auth_expired());
}

#[tokio::test]
async fn test_server_error_is_transient() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/attacks"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let err = client.list_attacks().await.unwrap_err();
    match err {
        Error::Api {
            status,
            ref message,
        } => {
            assert_eq!(status, 503);
            assert_eq!(message, "maintenance");
        }
        ref other => panic!("expected Api, got {other:?}"),
    }
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_not_found() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/attacks/99/stop"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "error": "Attack not found" })))
        .mount(&server)
        .await;

    let err = client.stop_attack(&RecordId::Number(99)).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_malformed_body_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/servers"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy</html>"))
        .mount(&server)
        .await;

    let err = client.list_servers().await.unwrap_err();
    match err {
        Error::Deserialization { body, .. } => assert_eq!(body, "<html>proxy</html>"),
        other => panic!("expected Deserialization, got {other:?}"),
    }
}
