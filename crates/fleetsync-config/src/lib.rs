//! Shared configuration for fleetsync consumers.
//!
//! TOML profiles merged with `FLEETSYNC_` environment overrides, admin
//! token resolution (env + keyring + plaintext), and translation to
//! `fleetsync_core::SessionConfig`. The CLI layers flag overrides on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use fleetsync_core::{SessionConfig, TlsVerification};

const KEYRING_SERVICE: &str = "fleetsync";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{profile}' not found in configuration")]
    UnknownProfile { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named panel profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Look up a profile by name, falling back to `default_profile`.
    pub fn profile(&self, name: Option<&str>) -> Result<(&str, &Profile), ConfigError> {
        let name = name
            .or(self.default_profile.as_deref())
            .unwrap_or("default");
        self.profiles
            .get_key_value(name)
            .map(|(k, v)| (k.as_str(), v))
            .ok_or_else(|| ConfigError::UnknownProfile {
                profile: name.into(),
            })
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Event channel reconnect delay in seconds.
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
            reconnect_delay: default_reconnect_delay(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    10
}
fn default_reconnect_delay() -> u64 {
    fleetsync_core::config::DEFAULT_RECONNECT_DELAY.as_secs()
}

/// A named panel profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Panel base URL (e.g., "http://panel.local:31457").
    pub panel: String,

    /// Admin token (plaintext, prefer keyring or env var).
    pub admin_token: Option<String>,

    /// Environment variable name containing the admin token.
    pub admin_token_env: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override request timeout (seconds).
    pub timeout: Option<u64>,

    /// Override reconnect delay (seconds).
    pub reconnect_delay: Option<u64>,

    /// Override event channel path.
    pub event_path: Option<String>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("io", "fleetsync", "fleetsync").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("fleetsync");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from `path` + environment. A missing file
/// yields the defaults.
///
/// Environment keys nest with a double underscore, e.g.
/// `FLEETSYNC_DEFAULTS__TIMEOUT=30`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");

    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("FLEETSYNC_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Admin token resolution ──────────────────────────────────────────

/// Resolve the admin token: profile's env var, then system keyring, then
/// plaintext. `None` when nothing is configured; read-only endpoints
/// work without a token.
pub fn resolve_admin_token(profile: &Profile, profile_name: &str) -> Option<SecretString> {
    resolve_token_chain(
        profile,
        |name| std::env::var(name).ok(),
        || {
            keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/admin-token"))
                .and_then(|entry| entry.get_password())
                .ok()
        },
    )
}

fn resolve_token_chain(
    profile: &Profile,
    env: impl Fn(&str) -> Option<String>,
    keyring: impl FnOnce() -> Option<String>,
) -> Option<SecretString> {
    // 1. Profile's admin_token_env → env var lookup
    if let Some(val) = profile.admin_token_env.as_deref().and_then(&env) {
        return Some(SecretString::from(val));
    }

    // 2. System keyring
    if let Some(secret) = keyring() {
        return Some(SecretString::from(secret));
    }

    // 3. Plaintext in config
    profile.admin_token.clone().map(SecretString::from)
}

// ── Translation ─────────────────────────────────────────────────────

/// Build a `SessionConfig` from a profile and the global defaults.
///
/// This is the single boundary where config types cross into core types.
/// The token is passed in already resolved so callers can layer their own
/// overrides on top of [`resolve_admin_token`].
pub fn session_config(
    profile: &Profile,
    defaults: &Defaults,
    admin_token: Option<SecretString>,
) -> Result<SessionConfig, ConfigError> {
    let base_url: url::Url = profile.panel.parse().map_err(|_| ConfigError::Validation {
        field: "panel".into(),
        reason: format!("invalid URL: {}", profile.panel),
    })?;
    if !matches!(base_url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: "panel".into(),
            reason: format!("expected an http or https URL, got '{}'", base_url.scheme()),
        });
    }

    let reconnect_secs = profile.reconnect_delay.unwrap_or(defaults.reconnect_delay);
    if reconnect_secs == 0 {
        return Err(ConfigError::Validation {
            field: "reconnect_delay".into(),
            reason: "must be at least 1 second".into(),
        });
    }

    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    let mut config = SessionConfig::new(base_url);
    config.admin_token = admin_token;
    config.tls = tls;
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    config.reconnect_delay = Duration::from_secs(reconnect_secs);
    if let Some(ref path) = profile.event_path {
        config.event_path.clone_from(path);
    }
    Ok(config)
}
