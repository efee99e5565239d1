use thiserror::Error;

/// Top-level error type for the `fleetsync-api` crate.
///
/// Covers every failure mode of the panel surfaces: authentication,
/// transport, REST responses, and the push event channel.
/// `fleetsync-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The panel rejected the admin token (HTTP 401).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// The admin token cannot be sent as an HTTP header.
    #[error("Invalid admin token: {0}")]
    InvalidToken(String),

    // ── Panel API ───────────────────────────────────────────────────
    /// Non-success response from the panel.
    #[error("Panel API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    // ── Event channel ───────────────────────────────────────────────
    /// Event channel connection failed.
    #[error("WebSocket connection failed: {0}")]
    WebSocketConnect(String),

    /// Event channel closed with an error frame.
    #[error("WebSocket closed (code {code}): {reason}")]
    WebSocketClosed { code: u16, reason: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the credential has expired or was rejected
    /// and the host should invalidate it.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status, .. } => *status >= 500,
            Self::WebSocketConnect(_) | Self::WebSocketClosed { .. } => true,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Api { status: 404, .. } => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_errors_are_auth_expired() {
        let err = Error::Authentication {
            message: "invalid token".into(),
        };
        assert!(err.is_auth_expired());
        assert!(!err.is_transient());
    }

    #[test]
    fn server_errors_are_transient() {
        let err = Error::Api {
            status: 503,
            message: "unavailable".into(),
        };
        assert!(err.is_transient());
        assert!(!err.is_not_found());
    }

    #[test]
    fn not_found_is_detected() {
        let err = Error::Api {
            status: 404,
            message: "missing".into(),
        };
        assert!(err.is_not_found());
        assert!(!err.is_auth_expired());
    }
}
