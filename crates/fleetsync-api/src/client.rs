// Panel REST client
//
// Wraps `reqwest::Client` with panel-specific URL construction and status
// handling. Every method returns the decoded payload; non-success statuses
// become typed errors so callers never inspect HTTP codes themselves.

use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::models::{AttackRecord, NewAttack, NewServer, RecordId, ServerRecord};
use crate::transport::TransportConfig;

/// Error body shape the panel uses for rejected requests.
#[derive(serde::Deserialize)]
struct PanelErrorBody {
    error: Option<String>,
}

/// HTTP client for the panel's `/api` endpoints.
pub struct PanelClient {
    http: reqwest::Client,
    base_url: Url,
}

impl PanelClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// `base_url` is the panel root (e.g. `http://panel.local:31457`); the
    /// `/api` prefix is added per request.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self { http, base_url })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// The panel base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Servers ──────────────────────────────────────────────────────

    /// `GET /api/servers`
    pub async fn list_servers(&self) -> Result<Vec<ServerRecord>, Error> {
        self.request(Method::GET, "servers", None::<&()>).await
    }

    /// `POST /api/servers`
    pub async fn create_server(&self, server: &NewServer) -> Result<ServerRecord, Error> {
        self.request(Method::POST, "servers", Some(server)).await
    }

    /// `DELETE /api/servers/{id}`
    pub async fn delete_server(&self, id: &RecordId) -> Result<(), Error> {
        self.request_empty(Method::DELETE, &format!("servers/{id}"))
            .await
    }

    // ── Attack jobs ──────────────────────────────────────────────────

    /// `GET /api/attacks`
    pub async fn list_attacks(&self) -> Result<Vec<AttackRecord>, Error> {
        self.request(Method::GET, "attacks", None::<&()>).await
    }

    /// `POST /api/attacks`
    pub async fn create_attack(&self, attack: &NewAttack) -> Result<AttackRecord, Error> {
        self.request(Method::POST, "attacks", Some(attack)).await
    }

    /// `POST /api/attacks/{id}/stop`
    ///
    /// The panel answers 204; the resulting state change is pushed over the
    /// event channel rather than returned here.
    pub async fn stop_attack(&self, id: &RecordId) -> Result<(), Error> {
        self.request_empty(Method::POST, &format!("attacks/{id}/stop"))
            .await
    }

    // ── Request plumbing ─────────────────────────────────────────────

    /// Build `{base}/api/{path}`, tolerating a base URL with or without a
    /// trailing slash or path prefix.
    fn api_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/api/{path}"))?)
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<reqwest::Response, Error> {
        let url = self.api_url(path)?;
        debug!(%method, %url, "panel request");

        let mut builder = self.http.request(method, url);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let response = builder.send().await?;
        check_status(response).await
    }

    async fn request<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T, Error>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(method, path, body).await?;
        let text = response.text().await?;
        trace!(body_len = text.len(), "panel response");
        serde_json::from_str(&text).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body: text,
        })
    }

    async fn request_empty(&self, method: Method, path: &str) -> Result<(), Error> {
        self.send(method, path, None::<&()>).await?;
        Ok(())
    }
}

/// Map non-success statuses to typed errors, passing successes through.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, Error> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body, status);

    if status == StatusCode::UNAUTHORIZED {
        return Err(Error::Authentication { message });
    }
    Err(Error::Api {
        status: status.as_u16(),
        message,
    })
}

/// Prefer the panel's `{"error": "..."}` message, then the raw body, then
/// the canonical status reason.
fn error_message(body: &str, status: StatusCode) -> String {
    if let Ok(PanelErrorBody { error: Some(msg) }) = serde_json::from_str(body) {
        return msg;
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_owned()
    } else {
        trimmed.to_owned()
    }
}
