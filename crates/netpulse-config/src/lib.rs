//! Configuration for the netpulse dashboard.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext), and
//! translation to `netpulse_core::EngineConfig`. CLI flags arrive as
//! [`Overrides`] and win over anything in the file.

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
use url::Url;

use netpulse_core::EngineConfig;
use netpulse_core::config::{
    DEFAULT_ALERT_LIMIT, DEFAULT_METRIC_WINDOW_MINUTES, DEFAULT_REFRESH_INTERVAL, DEFAULT_TIMEOUT,
};

/// Env var checked after a profile's own `api_key_env`.
pub const API_KEY_ENV: &str = "NETPULSE_API_KEY";
const ENV_PREFIX: &str = "NETPULSE_";
const KEYRING_SERVICE: &str = "netpulse";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{name}' not found in {}", .path.display())]
    UnknownProfile { name: String, path: PathBuf },

    #[error("no backend URL configured; pass --url or add a profile to {}", .path.display())]
    NoBackend { path: PathBuf },

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
    /// Profile used when `--profile` is not given.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named backend profiles.
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

/// Values every profile inherits unless it sets its own.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,

    #[serde(default = "default_metric_window")]
    pub metric_window_minutes: u32,

    #[serde(default = "default_alert_limit")]
    pub alert_limit: u32,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            refresh_interval_secs: default_refresh_interval(),
            metric_window_minutes: default_metric_window(),
            alert_limit: default_alert_limit(),
        }
    }
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}
fn default_refresh_interval() -> u64 {
    DEFAULT_REFRESH_INTERVAL.as_secs()
}
fn default_metric_window() -> u32 {
    DEFAULT_METRIC_WINDOW_MINUTES
}
fn default_alert_limit() -> u32 {
    DEFAULT_ALERT_LIMIT
}

/// A named monitoring backend.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Backend base URL (e.g., "http://127.0.0.1:3000").
    pub base_url: String,

    /// API key (plaintext; prefer keyring or env var).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Environment variable name containing the API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_interval_secs: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric_window_minutes: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert_limit: Option<u32>,
}

/// Values from command-line flags. `Some` wins over the profile.
#[derive(Debug, Default)]
pub struct Overrides {
    pub profile: Option<String>,
    pub base_url: Option<String>,
    pub api_key: Option<SecretString>,
    pub timeout_secs: Option<u64>,
    pub refresh_interval_secs: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("dev", "netpulse", "netpulse").map_or_else(
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
    p.push("netpulse");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` (missing file is fine) merged with `NETPULSE_*` env
/// vars. Nested keys use a double underscore, e.g.
/// `NETPULSE_DEFAULTS__ALERT_LIMIT=50`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    Ok(figment.extract()?)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`, creating parent
/// directories.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

/// Write a starter config with one `default` profile pointing at
/// `base_url`. The key is read from `NETPULSE_API_KEY`, never stored.
pub fn init_config(path: &Path, base_url: &str) -> Result<Config, ConfigError> {
    parse_base_url(base_url)?;
    let mut cfg = Config::default();
    cfg.profiles.insert(
        "default".into(),
        Profile {
            base_url: base_url.into(),
            api_key_env: Some(API_KEY_ENV.into()),
            ..Profile::default()
        },
    );
    save_config_to(&cfg, path)?;
    Ok(cfg)
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve the API key for `profile_name`.
///
/// Order: the profile's `api_key_env` → `NETPULSE_API_KEY` → system
/// keyring (`netpulse` / `{profile}/api-key`) → plaintext `api_key`.
pub fn resolve_api_key(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    resolve_api_key_with(
        profile,
        profile_name,
        |name| std::env::var(name).ok(),
        keyring_lookup,
    )
}

/// Credential chain with injectable lookups.
pub fn resolve_api_key_with(
    profile: &Profile,
    profile_name: &str,
    env: impl Fn(&str) -> Option<String>,
    keyring: impl Fn(&str) -> Option<String>,
) -> Result<SecretString, ConfigError> {
    // 1. Profile's api_key_env → env var lookup
    if let Some(val) = profile.api_key_env.as_deref().and_then(&env) {
        debug!(profile = profile_name, "api key from profile env var");
        return Ok(SecretString::from(val));
    }

    // 2. Well-known env var
    if let Some(val) = env(API_KEY_ENV) {
        debug!(profile = profile_name, "api key from {API_KEY_ENV}");
        return Ok(SecretString::from(val));
    }

    // 3. System keyring
    if let Some(secret) = keyring(&format!("{profile_name}/api-key")) {
        debug!(profile = profile_name, "api key from keyring");
        return Ok(SecretString::from(secret));
    }

    // 4. Plaintext in config
    if let Some(key) = profile.api_key.as_ref().filter(|k| !k.is_empty()) {
        return Ok(SecretString::from(key.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

fn keyring_lookup(user: &str) -> Option<String> {
    keyring::Entry::new(KEYRING_SERVICE, user)
        .and_then(|entry| entry.get_password())
        .ok()
}

// ── Translation to EngineConfig ─────────────────────────────────────

/// Build an `EngineConfig` from the file config plus CLI overrides.
///
/// With no profile in the file, `--url` alone is enough to describe an
/// ad-hoc backend.
pub fn resolve_engine_config(
    cfg: &Config,
    overrides: &Overrides,
    path: &Path,
) -> Result<EngineConfig, ConfigError> {
    let name = overrides
        .profile
        .clone()
        .or_else(|| cfg.default_profile.clone())
        .unwrap_or_else(|| "default".into());

    let profile = match cfg.profiles.get(&name) {
        Some(profile) => profile.clone(),
        None if overrides.profile.is_some() => {
            return Err(ConfigError::UnknownProfile {
                name,
                path: path.to_path_buf(),
            });
        }
        None => match &overrides.base_url {
            Some(url) => Profile {
                base_url: url.clone(),
                ..Profile::default()
            },
            None => {
                return Err(ConfigError::NoBackend {
                    path: path.to_path_buf(),
                });
            }
        },
    };

    profile_to_engine_config(&profile, &name, &cfg.defaults, overrides)
}

/// Build an `EngineConfig` from a single profile.
pub fn profile_to_engine_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
    overrides: &Overrides,
) -> Result<EngineConfig, ConfigError> {
    let raw_url = overrides.base_url.as_deref().unwrap_or(&profile.base_url);
    let base_url = parse_base_url(raw_url)?;

    let api_key = match &overrides.api_key {
        Some(key) => key.clone(),
        None => resolve_api_key(profile, profile_name)?,
    };

    let timeout_secs = overrides
        .timeout_secs
        .or(profile.timeout_secs)
        .unwrap_or(defaults.timeout_secs);
    let refresh_secs = overrides
        .refresh_interval_secs
        .or(profile.refresh_interval_secs)
        .unwrap_or(defaults.refresh_interval_secs);
    let metric_window_minutes = profile
        .metric_window_minutes
        .unwrap_or(defaults.metric_window_minutes);
    let alert_limit = profile.alert_limit.unwrap_or(defaults.alert_limit);

    positive("timeout_secs", timeout_secs)?;
    positive("refresh_interval_secs", refresh_secs)?;
    positive("metric_window_minutes", u64::from(metric_window_minutes))?;
    positive("alert_limit", u64::from(alert_limit))?;

    let mut config = EngineConfig::new(base_url, api_key);
    config.timeout = Duration::from_secs(timeout_secs);
    config.refresh_interval = Duration::from_secs(refresh_secs);
    config.metric_window_minutes = metric_window_minutes;
    config.alert_limit = alert_limit;
    Ok(config)
}

fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let url: Url = raw.parse().map_err(|_| ConfigError::Validation {
        field: "base_url".into(),
        reason: format!("invalid URL: {raw}"),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: "base_url".into(),
            reason: format!("expected http or https, got '{}'", url.scheme()),
        });
    }
    Ok(url)
}

fn positive(field: &str, value: u64) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::Validation {
            field: field.into(),
            reason: "must be greater than zero".into(),
        });
    }
    Ok(())
}
