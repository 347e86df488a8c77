//! Shared configuration for vchs tools.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to `vchs_core::WorkflowConfig`. The CLI layers its
//! flag overrides and the interactive password prompt on top.

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

use vchs_core::config::{DEFAULT_API_VERSION, DEFAULT_MAX_POLLS, DEFAULT_POLL_INTERVAL, DEFAULT_URL};
use vchs_core::{
    ApiEndpoint, Credentials, PollPolicy, PollSettings, TlsVerification, WorkflowConfig,
};

/// Keyring service name; entries are keyed `{profile}/password`.
pub const KEYRING_SERVICE: &str = "vchs";
/// Environment variable consulted before the keyring.
pub const PASSWORD_ENV: &str = "VCHS_PASSWORD";
/// Environment variable used when a profile names no user.
pub const USERNAME_ENV: &str = "VCHS_USERNAME";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
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

    /// Named vCHS profiles.
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
    /// The profile selected by `name`, else by `default_profile`.
    pub fn profile(&self, name: Option<&str>) -> Option<(&str, &Profile)> {
        let name = name.or(self.default_profile.as_deref())?;
        self.profiles
            .get_key_value(name)
            .map(|(k, v)| (k.as_str(), v))
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

    /// Seconds between two task polls.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,

    /// Attempt ceiling of the provisioning waits.
    #[serde(default = "default_max_polls")]
    pub max_polls: u32,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
            poll_interval: default_poll_interval(),
            max_polls: default_max_polls(),
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
    30
}
fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL.as_secs()
}
fn default_max_polls() -> u32 {
    DEFAULT_MAX_POLLS
}

/// A named vCHS account profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// vCHS service URL (e.g., "https://vchs.vmware.com").
    #[serde(default = "default_url")]
    pub url: String,

    /// vCHS login (usually an email address).
    pub username: Option<String>,

    /// Password (plaintext, prefer keyring or env var).
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// vCHS public API version.
    pub vchs_version: Option<String>,

    /// vCloud API version.
    pub vcloud_version: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override timeout.
    pub timeout: Option<u64>,

    /// Override poll interval.
    pub poll_interval: Option<u64>,

    /// Override attempt ceiling.
    pub max_polls: Option<u32>,
}

fn default_url() -> String {
    DEFAULT_URL.into()
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "vchs", "vchs").map_or_else(
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
    p.push("vchs");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the Config from `path` + environment.
///
/// Nested keys come from `VCHS_`-prefixed variables with `__` as the
/// separator, e.g. `VCHS_DEFAULTS__TIMEOUT=60`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("VCHS_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Credential resolution (without CLI flags) ───────────────────────

/// The login name: profile first, then `VCHS_USERNAME`.
pub fn resolve_username(profile: &Profile, profile_name: &str) -> Result<String, ConfigError> {
    profile
        .username
        .clone()
        .or_else(|| std::env::var(USERNAME_ENV).ok())
        .ok_or_else(|| ConfigError::NoCredentials {
            profile: profile_name.into(),
        })
}

/// Resolve the password from the credential chain (no CLI flag step).
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    // 1. Profile's password_env, then the global env var
    let env_names = profile.password_env.iter().map(String::as_str).chain([PASSWORD_ENV]);
    for env_name in env_names {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. System keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password")) {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Parse a service URL, dropping a trailing `/`.
pub fn parse_url(raw: &str) -> Result<url::Url, ConfigError> {
    raw.trim_end_matches('/')
        .parse()
        .map_err(|e| ConfigError::Validation {
            field: "url".into(),
            reason: format!("invalid URL '{raw}': {e}"),
        })
}

/// Build a `WorkflowConfig` from a profile and the global defaults, no CLI
/// flag overrides.
pub fn profile_to_workflow_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<WorkflowConfig, ConfigError> {
    let credentials = Credentials {
        username: resolve_username(profile, profile_name)?,
        password: resolve_password(profile, profile_name)?,
    };
    workflow_config(profile, defaults, credentials)
}

/// Build a `WorkflowConfig` from a profile with credentials resolved by
/// the caller.
pub fn workflow_config(
    profile: &Profile,
    defaults: &Defaults,
    credentials: Credentials,
) -> Result<WorkflowConfig, ConfigError> {
    let endpoint = ApiEndpoint {
        url: parse_url(&profile.url)?,
        vchs_version: profile
            .vchs_version
            .clone()
            .unwrap_or_else(|| DEFAULT_API_VERSION.into()),
        vcloud_version: profile
            .vcloud_version
            .clone()
            .unwrap_or_else(|| DEFAULT_API_VERSION.into()),
    };

    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    let interval = Duration::from_secs(profile.poll_interval.unwrap_or(defaults.poll_interval));
    let polling = PollSettings {
        provision: PollPolicy::bounded(interval, profile.max_polls.unwrap_or(defaults.max_polls)),
        gateway: PollPolicy::unbounded(interval),
    };

    let mut config = WorkflowConfig::new(endpoint, credentials);
    config.tls = tls;
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    config.polling = polling;
    Ok(config)
}
