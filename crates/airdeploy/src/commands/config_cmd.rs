//! Config subcommand handlers. None of these contact a controller.

use std::fmt::Write;
use std::io::IsTerminal;

use secrecy::SecretString;

use airdeploy_config::{self as config, Config};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

/// Format config for display, masking sensitive fields.
fn format_config_redacted(cfg: &Config) -> String {
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "insecure = {}", cfg.defaults.insecure);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);
    let _ = writeln!(out, "batch_size = {}", cfg.defaults.batch_size);
    if let Some(ref state) = cfg.defaults.state_file {
        let _ = writeln!(out, "state_file = \"{}\"", state.display());
    }

    let mut names: Vec<_> = cfg.profiles.keys().collect();
    names.sort();
    for name in names {
        let p = &cfg.profiles[name];
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "controller = \"{}\"", p.controller);
        if p.api_key.is_some() {
            let _ = writeln!(out, "api_key = \"****\"");
        }
        if let Some(ref env) = p.api_key_env {
            let _ = writeln!(out, "api_key_env = \"{env}\"");
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
    }

    out.trim_end().to_owned()
}

fn available_profiles(cfg: &Config) -> String {
    let mut names: Vec<&str> = cfg.profiles.keys().map(String::as_str).collect();
    names.sort_unstable();
    if names.is_empty() {
        "(none)".into()
    } else {
        names.join(", ")
    }
}

fn prompt_api_key(profile_name: &str) -> Result<SecretString, CliError> {
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: "config set-api-key (pass --api-key)".into(),
        });
    }
    let key = dialoguer::Password::new()
        .with_prompt(format!("API key for '{profile_name}'"))
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    if key.trim().is_empty() {
        return Err(CliError::Validation {
            field: "api-key".into(),
            reason: "must not be empty".into(),
        });
    }
    Ok(SecretString::from(key))
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            println!("{}", config::config_path().display());
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = config::load_config()?;
            let out = output::render_single(&global.output, &RedactedConfig(&cfg), |c| {
                format_config_redacted(c.0)
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Expected at: {}", config::config_path().display());
                return Ok(());
            }
            let default = cfg.active_profile_name(None);
            let mut names: Vec<&String> = cfg.profiles.keys().collect();
            names.sort();
            for name in names {
                let marker = if *name == default { " *" } else { "" };
                println!("{name}{marker}");
            }
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: available_profiles(&cfg),
                    name,
                });
            }
            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;
            eprintln!("Default profile set to '{name}'");
            Ok(())
        }

        ConfigCommand::SetApiKey => {
            let cfg = config::load_config_or_default();
            let profile_name = cfg.active_profile_name(global.profile.as_deref());
            let key = match global.api_key {
                Some(ref key) => SecretString::from(key.clone()),
                None => prompt_api_key(&profile_name)?,
            };
            config::store_api_key(&profile_name, &key)?;
            eprintln!("API key for '{profile_name}' stored in the system keyring");
            Ok(())
        }
    }
}

/// Serializes a config with every secret replaced by `****`.
struct RedactedConfig<'a>(&'a Config);

impl serde::Serialize for RedactedConfig<'_> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let profiles: std::collections::BTreeMap<&str, serde_json::Value> = self
            .0
            .profiles
            .iter()
            .map(|(name, p)| {
                let mut value = serde_json::json!({ "controller": p.controller });
                if p.api_key.is_some() {
                    value["api_key"] = "****".into();
                }
                if let Some(ref env) = p.api_key_env {
                    value["api_key_env"] = env.as_str().into();
                }
                if let Some(ref ca) = p.ca_cert {
                    value["ca_cert"] = ca.display().to_string().into();
                }
                if let Some(insecure) = p.insecure {
                    value["insecure"] = insecure.into();
                }
                if let Some(timeout) = p.timeout {
                    value["timeout"] = timeout.into();
                }
                (name.as_str(), value)
            })
            .collect();

        let mut s = serializer.serialize_struct("Config", 3)?;
        s.serialize_field("default_profile", &self.0.default_profile)?;
        s.serialize_field("defaults", &self.0.defaults)?;
        s.serialize_field("profiles", &profiles)?;
        s.end()
    }
}
