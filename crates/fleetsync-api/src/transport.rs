// Shared transport configuration for building reqwest::Client instances.
//
// TLS, timeout, and credential injection live here so the REST client and
// any future surfaces build their HTTP clients the same way.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};

use crate::error::Error;

/// Header carrying the panel's admin credential.
pub const ADMIN_TOKEN_HEADER: &str = "X-Admin-Token";

/// TLS verification mode (api-level mirror of core's `TlsVerification`).
#[derive(Debug, Clone)]
pub enum TlsMode {
    /// Use the system certificate store.
    System,
    /// Use a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate (for self-signed panels).
    DangerAcceptInvalid,
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub timeout: Duration,
    /// Injected as `X-Admin-Token` on every request when present.
    pub admin_token: Option<SecretString>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            timeout: Duration::from_secs(10),
            admin_token: None,
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("fleetsync/", env!("CARGO_PKG_VERSION")))
            .default_headers(self.default_headers()?);

        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path)
                    .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }

    /// Headers sent on every request: JSON content type plus the admin
    /// token, marked sensitive so it never shows up in debug output.
    pub fn default_headers(&self) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(
            reqwest::header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        if let Some(value) = self.admin_token_header()? {
            headers.insert(ADMIN_TOKEN_HEADER, value);
        }
        Ok(headers)
    }

    /// The admin token as a sensitive header value, if configured.
    pub fn admin_token_header(&self) -> Result<Option<HeaderValue>, Error> {
        let Some(token) = self.admin_token.as_ref() else {
            return Ok(None);
        };
        let mut value = HeaderValue::from_str(token.expose_secret())
            .map_err(|e| Error::InvalidToken(e.to_string()))?;
        value.set_sensitive(true);
        Ok(Some(value))
    }
}
