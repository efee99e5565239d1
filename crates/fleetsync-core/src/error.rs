// ── Core error types ──
//
// User-facing errors from fleetsync-core. Consumers never match on HTTP
// status codes or JSON parse failures directly; the
// `From<fleetsync_api::Error>` impl translates transport-layer errors into
// domain-appropriate variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to panel at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Panel request timed out")]
    Timeout,

    #[error("Session is shut down")]
    SessionClosed,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::AuthenticationFailed { .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<fleetsync_api::Error> for CoreError {
    fn from(err: fleetsync_api::Error) -> Self {
        match err {
            fleetsync_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            fleetsync_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            fleetsync_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            fleetsync_api::Error::InvalidToken(reason) => CoreError::Config {
                message: format!("Invalid admin token: {reason}"),
            },
            fleetsync_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            fleetsync_api::Error::Api { status: 404, message } => CoreError::NotFound {
                entity_type: "Resource".into(),
                identifier: message,
            },
            fleetsync_api::Error::Api { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            fleetsync_api::Error::WebSocketConnect(reason) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("WebSocket connection failed: {reason}"),
            },
            fleetsync_api::Error::WebSocketClosed { code, reason } => {
                CoreError::ConnectionFailed {
                    url: String::new(),
                    reason: format!("WebSocket closed (code {code}): {reason}"),
                }
            }
            fleetsync_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_error_maps_to_authentication_failed() {
        let err = CoreError::from(fleetsync_api::Error::Authentication {
            message: "Invalid admin token".into(),
        });
        assert!(err.is_auth_failure());
    }

    #[test]
    fn api_404_maps_to_not_found() {
        let err = CoreError::from(fleetsync_api::Error::Api {
            status: 404,
            message: "Attack not found".into(),
        });
        assert!(matches!(err, CoreError::NotFound { .. }));
    }

    #[test]
    fn api_500_keeps_status() {
        let err = CoreError::from(fleetsync_api::Error::Api {
            status: 500,
            message: "boom".into(),
        });
        assert!(matches!(err, CoreError::Api { status: Some(500), .. }));
    }
}
