// ── Runtime session configuration ──
//
// These types describe *how* to talk to a panel. They carry the credential
// and connection tuning, but never touch disk: the CLI builds a
// `SessionConfig` (via fleetsync-config) and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use fleetsync_api::transport::{TlsMode, TransportConfig};
use fleetsync_api::websocket::{ReconnectConfig, event_channel_url};

use crate::error::CoreError;

/// Default path of the push event endpoint, relative to the panel root.
pub const DEFAULT_EVENT_PATH: &str = "/ws";

/// Default fixed delay between event channel reconnection attempts.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed panels).
    DangerAcceptInvalid,
}

/// Configuration for one panel session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Panel root URL (e.g., `http://panel.local:31457`).
    pub base_url: Url,
    /// Sent as `X-Admin-Token`. Read-only endpoints work without it.
    pub admin_token: Option<SecretString>,
    pub tls: TlsVerification,
    /// Request timeout.
    pub timeout: Duration,
    /// Fixed delay before every reconnection attempt.
    pub reconnect_delay: Duration,
    /// Event channel path, appended to the base URL.
    pub event_path: String,
    /// Start the push event channel on `Session::start`.
    pub event_channel_enabled: bool,
}

impl SessionConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            admin_token: None,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(10),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            event_path: DEFAULT_EVENT_PATH.into(),
            event_channel_enabled: true,
        }
    }

    /// The `ws://` / `wss://` URL of the event channel.
    pub fn event_url(&self) -> Result<Url, CoreError> {
        event_channel_url(&self.base_url, &self.event_path).map_err(|e| CoreError::Config {
            message: e.to_string(),
        })
    }

    pub(crate) fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: match &self.tls {
                TlsVerification::SystemDefaults => TlsMode::System,
                TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
                TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
            },
            timeout: self.timeout,
            admin_token: self.admin_token.clone(),
        }
    }

    pub(crate) fn reconnect(&self) -> ReconnectConfig {
        ReconnectConfig {
            delay: self.reconnect_delay,
        }
    }
}
