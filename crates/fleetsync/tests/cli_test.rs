//! Integration tests for the `fleetsync` CLI binary.
//!
//! Argument parsing, config handling, and error exits run without a
//! panel; listing and watch commands run against wiremock and a local
//! WebSocket server.
#![allow(clippy::unwrap_used)]

use std::path::Path;
use std::time::Duration;

use assert_cmd::cargo::cargo_bin_cmd;
use futures_util::{SinkExt, StreamExt};
use predicates::prelude::*;
use serde_json::json;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `fleetsync` binary with env isolation.
///
/// Clears all `FLEETSYNC_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn fleetsync_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("fleetsync");
    cmd.env("HOME", "/tmp/fleetsync-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/fleetsync-cli-test-nonexistent")
        .env("NO_COLOR", "1")
        .env_remove("FLEETSYNC_CONFIG")
        .env_remove("FLEETSYNC_PROFILE")
        .env_remove("FLEETSYNC_PANEL")
        .env_remove("FLEETSYNC_ADMIN_TOKEN")
        .env_remove("FLEETSYNC_OUTPUT")
        .env_remove("RUST_LOG")
        .timeout(Duration::from_secs(30));
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn servers_body() -> serde_json::Value {
    json!([
        { "id": 1, "name": "edge-1", "ip": "10.0.0.1", "port": 8081, "status": "online" },
        { "id": 2, "name": "edge-2", "ip": "10.0.0.2", "port": 8081, "status": "offline" },
    ])
}

fn attacks_body() -> serde_json::Value {
    json!([
        { "id": "job-1", "name": "soak", "targetIp": "192.0.2.10", "targetPort": 443,
          "status": "running", "servers": [1], "totalPacketsSent": 300, "currentRate": 50 },
        { "id": "job-2", "name": "burst", "targetIp": "192.0.2.11", "targetPort": 80,
          "status": "completed", "servers": [1, 2], "totalPacketsSent": 700 },
    ])
}

async fn mock_panel() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/servers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(servers_body()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/attacks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(attacks_body()))
        .mount(&server)
        .await;
    server
}

/// Run the binary off the async runtime so mock servers keep serving.
async fn run(args: Vec<String>) -> std::process::Output {
    tokio::task::spawn_blocking(move || fleetsync_cmd().args(args).output().unwrap())
        .await
        .unwrap()
}

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(ToString::to_string).collect()
}

fn write_config(path: &Path, body: &str) {
    std::fs::write(path, body).unwrap();
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = fleetsync_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    fleetsync_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("fleet control panel")
            .and(predicate::str::contains("servers"))
            .and(predicate::str::contains("attacks"))
            .and(predicate::str::contains("watch")),
    );
}

#[test]
fn test_version_flag() {
    fleetsync_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("fleetsync"));
}

#[test]
fn test_invalid_output_format_is_usage_error() {
    fleetsync_cmd()
        .args(["servers", "list", "-o", "xml"])
        .assert()
        .code(2);
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_honors_flag() {
    fleetsync_cmd()
        .args(["config", "path", "--config", "/tmp/somewhere/fleetsync.toml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/tmp/somewhere/fleetsync.toml"));
}

#[test]
fn test_config_init_then_show() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = dir.path().join("config.toml");
    let cfg_str = cfg.to_str().unwrap();

    fleetsync_cmd()
        .args(["--config", cfg_str, "-p", "lab", "config", "init"])
        .args(["--url", "http://10.0.0.5:31457", "--admin-token-env", "LAB_TOKEN"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Profile 'lab' written"));

    fleetsync_cmd()
        .args(["--config", cfg_str, "config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("default_profile = \"lab\"")
                .and(predicate::str::contains("[profiles.lab]"))
                .and(predicate::str::contains("admin_token_env = \"LAB_TOKEN\"")),
        );
}

#[test]
fn test_config_show_masks_plaintext_token() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = dir.path().join("config.toml");
    write_config(
        &cfg,
        "[profiles.default]\npanel = \"http://panel.local\"\nadmin_token = \"hunter2\"\n",
    );

    fleetsync_cmd()
        .args(["--config", cfg.to_str().unwrap(), "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("****").and(predicate::str::contains("hunter2").not()));
}

#[test]
fn test_config_init_rejects_bad_url() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = dir.path().join("config.toml");

    fleetsync_cmd()
        .args(["--config", cfg.to_str().unwrap(), "config", "init", "--url", "not a url"])
        .assert()
        .code(2);
    assert!(!cfg.exists());
}

// ── Error exits ─────────────────────────────────────────────────────

#[test]
fn test_missing_config_suggests_init() {
    let output = fleetsync_cmd().args(["servers", "list"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(text.contains("config init"), "Expected init hint in:\n{text}");
}

#[test]
fn test_unknown_profile_lists_available() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = dir.path().join("config.toml");
    write_config(&cfg, "[profiles.lab]\npanel = \"http://panel.local\"\n");

    let output = fleetsync_cmd()
        .args(["--config", cfg.to_str().unwrap(), "-p", "prod", "stats"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(text.contains("prod") && text.contains("lab"), "{text}");
}

#[test]
fn test_unreachable_panel_is_connection_error() {
    fleetsync_cmd()
        .args(["--panel", "http://127.0.0.1:9", "servers", "list"])
        .assert()
        .code(7);
}

// ── Against a mock panel ────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_servers_list_json() {
    let server = mock_panel().await;

    let output = run(args(&["--panel", &server.uri(), "servers", "list", "-o", "json"])).await;
    assert!(output.status.success(), "{}", combined_output(&output));

    let servers: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(servers.as_array().unwrap().len(), 2);
    assert_eq!(servers[0]["name"], "edge-1");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_servers_list_online_plain() {
    let server = mock_panel().await;

    let output = run(args(&[
        "--panel",
        &server.uri(),
        "servers",
        "list",
        "--online",
        "-o",
        "plain",
    ]))
    .await;
    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "1");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_attacks_list_table() {
    let server = mock_panel().await;

    let output = run(args(&["--panel", &server.uri(), "attacks", "list", "--active"])).await;
    assert!(output.status.success(), "{}", combined_output(&output));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("soak"), "{stdout}");
    assert!(!stdout.contains("burst"), "{stdout}");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stats_json() {
    let server = mock_panel().await;

    let output = run(args(&["--panel", &server.uri(), "stats", "-o", "json"])).await;
    assert!(output.status.success(), "{}", combined_output(&output));

    let stats: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(stats["servers"]["total"], 2);
    assert_eq!(stats["servers"]["offline"], 1);
    assert_eq!(stats["attacks"]["active"], 1);
    assert_eq!(stats["aggregates"]["total_packets"], 1000);
    assert_eq!(stats["aggregates"]["avg_packet_rate"], 50);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_missing_server_is_not_found() {
    let server = mock_panel().await;

    let output = run(args(&["--panel", &server.uri(), "servers", "get", "99"])).await;
    assert_eq!(output.status.code(), Some(4), "{}", combined_output(&output));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_server_get_matches_string_ids() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/servers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "10", "name": "edge-10", "ip": "10.0.0.10", "port": 8081, "status": "online" }
        ])))
        .mount(&server)
        .await;

    let output = run(args(&[
        "--panel",
        &server.uri(),
        "servers",
        "get",
        "10",
        "-o",
        "json",
    ]))
    .await;
    assert!(output.status.success(), "{}", combined_output(&output));

    let found: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(found["name"], "edge-10");
    assert_eq!(found["id"], 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_rejected_token_is_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/attacks"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "error": "Unauthorized" })))
        .mount(&server)
        .await;

    let output = run(args(&[
        "--panel",
        &server.uri(),
        "--admin-token",
        "wrong",
        "attacks",
        "list",
    ]))
    .await;
    assert_eq!(output.status.code(), Some(3), "{}", combined_output(&output));
    assert!(combined_output(&output).contains("admin token"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_profile_token_from_env() {
    let server = mock_panel().await;
    let dir = tempfile::tempdir().unwrap();
    let cfg = dir.path().join("config.toml");
    write_config(
        &cfg,
        &format!(
            "default_profile = \"lab\"\n[profiles.lab]\npanel = \"{}\"\nadmin_token_env = \"LAB_TOKEN\"\n",
            server.uri()
        ),
    );

    let cfg_str = cfg.to_str().unwrap().to_owned();
    let output = tokio::task::spawn_blocking(move || {
        fleetsync_cmd()
            .env("LAB_TOKEN", "panel-admin")
            .args(["--config", &cfg_str, "stats", "-o", "plain"])
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    assert!(output.status.success(), "{}", combined_output(&output));
    let requests = server.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| {
        r.headers
            .get("x-admin-token")
            .is_some_and(|v| v.as_bytes() == b"panel-admin")
    }));
}

// ── Watch ───────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_watch_prints_store_updates() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await else {
                    return;
                };
                let initial = json!({
                    "type": "initial_state",
                    "servers": servers_body(),
                    "attacks": attacks_body(),
                });
                if ws.send(Message::text(initial.to_string())).await.is_err() {
                    return;
                }
                for packets in 301_u64.. {
                    let update = json!({
                        "type": "attack_stats_update",
                        "id": "job-1",
                        "packets": packets,
                        "rate": 50,
                    });
                    if ws.send(Message::text(update.to_string())).await.is_err() {
                        return;
                    }
                    tokio::time::sleep(Duration::from_millis(50)).await;
                }
                while ws.next().await.is_some() {}
            });
        }
    });

    let output = run(args(&[
        "--panel",
        &format!("http://{addr}"),
        "watch",
        "--count",
        "3",
        "-o",
        "json-compact",
    ]))
    .await;
    assert!(output.status.success(), "{}", combined_output(&output));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<serde_json::Value> = stdout
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 3, "{stdout}");

    let last = lines.last().unwrap();
    assert_eq!(last["total_servers"], 2);
    assert_eq!(last["connection_status"], true);
}
