//! CLI configuration: a thin layer over `airdeploy_config`.
//!
//! Applies `GlobalOpts` flag overrides (--controller, --api-key,
//! --insecure, --timeout, --batch-size, --state-file) on top of the
//! active profile and the `[defaults]` table.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use airdeploy_config::{Config, Profile};
use airdeploy_core::{ControllerConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Build the controller connection from the active profile plus flags.
///
/// Without a matching profile, `--controller` and `--api-key` alone are
/// enough. Naming a profile that does not exist is an error.
pub fn build_controller_config(global: &GlobalOpts, cfg: &Config) -> Result<ControllerConfig, CliError> {
    let profile_name = cfg.active_profile_name(global.profile.as_deref());

    if let Some(profile) = cfg.profiles.get(&profile_name) {
        return resolve_profile(profile, &profile_name, global, cfg);
    }

    if global.profile.is_some() {
        let mut available: Vec<&str> = cfg.profiles.keys().map(String::as_str).collect();
        available.sort_unstable();
        return Err(CliError::ProfileNotFound {
            name: profile_name,
            available: if available.is_empty() {
                "(none)".into()
            } else {
                available.join(", ")
            },
        });
    }

    let Some(ref controller) = global.controller else {
        return Err(CliError::NoConfig {
            path: airdeploy_config::config_path().display().to_string(),
        });
    };
    let url = airdeploy_config::parse_controller_url(controller)?;
    let Some(ref key) = global.api_key else {
        return Err(CliError::NoCredentials {
            profile: profile_name,
        });
    };

    Ok(ControllerConfig {
        url,
        api_key: SecretString::from(key.clone()),
        tls: if global.insecure || cfg.defaults.insecure {
            TlsVerification::DangerAcceptInvalid
        } else {
            TlsVerification::SystemDefaults
        },
        timeout: Duration::from_secs(global.timeout.unwrap_or(cfg.defaults.timeout)),
    })
}

/// Translate a `Profile` + global flags into a `ControllerConfig`.
///
/// Flag overrides take priority over profile values.
fn resolve_profile(
    profile: &Profile,
    profile_name: &str,
    global: &GlobalOpts,
    cfg: &Config,
) -> Result<ControllerConfig, CliError> {
    let mut controller = if global.controller.is_none() && global.api_key.is_none() {
        airdeploy_config::profile_to_controller_config(profile, profile_name, &cfg.defaults)?
    } else {
        let url_str = global.controller.as_deref().unwrap_or(&profile.controller);
        let api_key = match global.api_key {
            Some(ref key) => SecretString::from(key.clone()),
            None => airdeploy_config::resolve_api_key(profile, profile_name)?,
        };
        ControllerConfig {
            url: airdeploy_config::parse_controller_url(url_str)?,
            api_key,
            tls: if profile.insecure.unwrap_or(cfg.defaults.insecure) {
                TlsVerification::DangerAcceptInvalid
            } else {
                profile
                    .ca_cert
                    .clone()
                    .map_or(TlsVerification::SystemDefaults, TlsVerification::CustomCa)
            },
            timeout: Duration::from_secs(profile.timeout.unwrap_or(cfg.defaults.timeout)),
        }
    };

    if global.insecure {
        controller.tls = TlsVerification::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        controller.timeout = Duration::from_secs(secs);
    }
    Ok(controller)
}

/// Assignment state file: flag > `[defaults].state_file` > data dir.
pub fn state_path(global: &GlobalOpts, cfg: &Config) -> PathBuf {
    global
        .state_file
        .clone()
        .or_else(|| cfg.defaults.state_file.clone())
        .unwrap_or_else(airdeploy_config::default_state_path)
}

/// Batch size: flag > `[defaults].batch_size`.
pub fn batch_size(global: &GlobalOpts, cfg: &Config) -> Result<usize, CliError> {
    match global.batch_size.unwrap_or(cfg.defaults.batch_size) {
        0 => Err(CliError::Validation {
            field: "batch-size".into(),
            reason: "must be at least 1".into(),
        }),
        n => Ok(n),
    }
}
