//! CLI-side configuration: profile selection and flag overrides on top
//! of `fleetsync_config`.
//!
//! Core never sees these types; it receives a pre-built `SessionConfig`.

use std::path::PathBuf;

use secrecy::SecretString;

use fleetsync_config::{Config, ConfigError, Profile};
use fleetsync_core::SessionConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// The config file this invocation reads and writes.
pub fn config_file(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(fleetsync_config::config_path)
}

pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    Ok(fleetsync_config::load_config_from(&config_file(global))?)
}

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build a `SessionConfig` from the config file, profile, and CLI overrides.
///
/// Precedence: flag > env > profile > defaults. With no matching profile,
/// `--panel` alone is enough.
pub fn build_session_config(global: &GlobalOpts) -> Result<SessionConfig, CliError> {
    let cfg = load(global)?;
    let profile_name = active_profile_name(global, &cfg);

    let (mut profile, stored_token) = match cfg.profile(Some(&profile_name)) {
        Ok((name, profile)) => (
            profile.clone(),
            fleetsync_config::resolve_admin_token(profile, name),
        ),
        Err(ConfigError::UnknownProfile { .. }) if global.panel.is_some() => {
            (Profile::default(), None)
        }
        Err(ConfigError::UnknownProfile { profile }) if global.profile.is_some() => {
            let mut names: Vec<&str> = cfg.profiles.keys().map(String::as_str).collect();
            names.sort_unstable();
            return Err(CliError::ProfileNotFound {
                name: profile,
                available: if names.is_empty() {
                    "(none)".into()
                } else {
                    names.join(", ")
                },
            });
        }
        Err(ConfigError::UnknownProfile { .. }) => {
            return Err(CliError::NoConfig {
                path: config_file(global).display().to_string(),
            });
        }
        Err(other) => return Err(other.into()),
    };

    if let Some(ref panel) = global.panel {
        profile.panel.clone_from(panel);
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }

    let token = global
        .admin_token
        .clone()
        .map(SecretString::from)
        .or(stored_token);

    Ok(fleetsync_config::session_config(
        &profile,
        &cfg.defaults,
        token,
    )?)
}
