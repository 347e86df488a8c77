//! CLI configuration: thin wrapper around `vchs_config`.
//!
//! Re-exports the shared types and adds CLI-specific resolution that
//! respects `GlobalOpts` flag overrides and prompts for a missing password.

use std::io::IsTerminal;

use secrecy::SecretString;
use tracing::debug;

use vchs_core::config::DEFAULT_URL;
use vchs_core::{Credentials, PollPolicy, WorkflowConfig};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use vchs_config::{Config, Profile, config_path, load_config_or_default};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Comma-separated profile names for diagnostics.
pub fn available_profiles(config: &Config) -> String {
    let mut names: Vec<_> = config.profiles.keys().cloned().collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort();
    names.join(", ")
}

/// Build a `WorkflowConfig` from the config file, the active profile and
/// CLI overrides (flag > env > profile > defaults).
pub fn build_workflow_config(global: &GlobalOpts) -> Result<WorkflowConfig, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    let mut profile = match cfg.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        // An explicitly requested profile must exist
        None if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: available_profiles(&cfg),
            });
        }
        None => Profile {
            url: DEFAULT_URL.into(),
            ..Profile::default()
        },
    };
    overlay_flags(&mut profile, global);
    debug!(profile = %profile_name, url = %profile.url, "resolved profile");

    let credentials = resolve_credentials(&profile, &profile_name, global)?;
    let mut config = vchs_config::workflow_config(&profile, &cfg.defaults, credentials)?;
    if global.unbounded_polls {
        config.polling.provision = PollPolicy::unbounded(config.polling.provision.interval);
    }
    Ok(config)
}

/// Apply flag values on top of the profile's own settings.
fn overlay_flags(profile: &mut Profile, global: &GlobalOpts) {
    if let Some(ref url) = global.url {
        profile.url.clone_from(url);
    }
    if let Some(ref username) = global.username {
        profile.username = Some(username.clone());
    }
    if let Some(ref version) = global.vchs_version {
        profile.vchs_version = Some(version.clone());
    }
    if let Some(ref version) = global.vcloud_version {
        profile.vcloud_version = Some(version.clone());
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    profile.timeout = global.timeout.or(profile.timeout);
    profile.poll_interval = global.poll_interval.or(profile.poll_interval);
    profile.max_polls = global.max_polls.or(profile.max_polls);
}

/// Username from flags or profile; password from the flag, then the shared
/// chain (env, keyring, plaintext), then an interactive prompt.
fn resolve_credentials(
    profile: &Profile,
    profile_name: &str,
    global: &GlobalOpts,
) -> Result<Credentials, CliError> {
    let username = vchs_config::resolve_username(profile, profile_name)?;

    let password = if let Some(ref pw) = global.password {
        SecretString::from(pw.clone())
    } else {
        match vchs_config::resolve_password(profile, profile_name) {
            Ok(secret) => secret,
            Err(vchs_config::ConfigError::NoCredentials { .. })
                if std::io::stdin().is_terminal() =>
            {
                prompt_password(&username)?
            }
            Err(e) => return Err(e.into()),
        }
    };

    Ok(Credentials { username, password })
}

fn prompt_password(username: &str) -> Result<SecretString, CliError> {
    let password = rpassword::prompt_password(format!("Password for {username}: "))?;
    if password.is_empty() {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "password cannot be empty".into(),
        });
    }
    Ok(SecretString::from(password))
}
