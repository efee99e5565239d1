//! Config subcommand handlers.

use std::fmt::Write;

use fleetsync_config::{Config, Profile};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

/// Format config for display, masking the plaintext token.
fn format_config_redacted(cfg: &Config) -> String {
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);
    let _ = writeln!(out, "insecure = {}", cfg.defaults.insecure);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);
    let _ = writeln!(out, "reconnect_delay = {}", cfg.defaults.reconnect_delay);

    let mut profiles: Vec<_> = cfg.profiles.iter().collect();
    profiles.sort_by_key(|(name, _)| name.as_str());
    for (name, p) in profiles {
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "panel = \"{}\"", p.panel);
        if p.admin_token.is_some() {
            let _ = writeln!(out, "admin_token = \"****\"");
        }
        if let Some(ref env) = p.admin_token_env {
            let _ = writeln!(out, "admin_token_env = \"{env}\"");
        }
        if let Some(ref ca) = p.ca_cert {
            let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
        }
        if let Some(insecure) = p.insecure {
            let _ = writeln!(out, "insecure = {insecure}");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
        if let Some(delay) = p.reconnect_delay {
            let _ = writeln!(out, "reconnect_delay = {delay}");
        }
        if let Some(ref path) = p.event_path {
            let _ = writeln!(out, "event_path = \"{path}\"");
        }
    }

    out
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            output::print_output(&config::config_file(global).display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = config::load(global)?;
            output::print_output(format_config_redacted(&cfg).trim_end(), global.quiet);
            Ok(())
        }

        ConfigCommand::Init {
            url,
            admin_token_env,
            default,
        } => {
            let base: url::Url = url.parse().map_err(|_| CliError::Validation {
                field: "url".into(),
                reason: format!("invalid URL: {url}"),
            })?;
            if !matches!(base.scheme(), "http" | "https") {
                return Err(CliError::Validation {
                    field: "url".into(),
                    reason: "expected an http or https URL".into(),
                });
            }

            let path = config::config_file(global);
            let mut cfg = fleetsync_config::load_config_from(&path)?;
            let name = global.profile.clone().unwrap_or_else(|| "default".into());

            cfg.profiles.insert(
                name.clone(),
                Profile {
                    panel: url,
                    admin_token_env,
                    insecure: global.insecure.then_some(true),
                    timeout: global.timeout,
                    ..Profile::default()
                },
            );
            if default || cfg.profiles.len() == 1 {
                cfg.default_profile = Some(name.clone());
            }

            fleetsync_config::save_config_to(&cfg, &path)?;
            output::print_output(
                &format!("Profile '{name}' written to {}", path.display()),
                global.quiet,
            );
            Ok(())
        }
    }
}
