// src/config/models.rs
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use super::profiles::builtin_profiles;
use crate::storage::Credentials;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("profile `{0}` is not defined")]
    UnknownProfile(String),

    #[error("profile `{profile}`: route `{route}` must start with '/'")]
    InvalidRoute { profile: String, route: String },

    #[error("profile `{0}` has no status groups")]
    NoGroups(String),

    #[error("group `{0}` has no checks")]
    EmptyGroup(String),

    #[error("group `{group}`: {reason}")]
    InvalidCheck { group: String, reason: String },

    #[error("metrics port {0} collides with the listen address")]
    MetricsPortInUse(u16),

    #[error("environment variable {0} is not set")]
    MissingEnv(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnv { var: String, reason: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub listen: SocketAddr,
    /// Name of the profile served on this deployment.
    pub profile: String,
    /// Run every probe of a report concurrently instead of one after another.
    pub fan_out: bool,
    pub metrics: MetricsConfig,
    pub profiles: BTreeMap<String, ProfileConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([0, 0, 0, 0], 8080)),
            profile: "dxetech".to_string(),
            fan_out: false,
            metrics: MetricsConfig::default(),
            profiles: builtin_profiles(),
        }
    }
}

impl Config {
    pub fn active_profile(&self) -> Result<&ProfileConfig, ConfigError> {
        self.profiles
            .get(&self.profile)
            .ok_or_else(|| ConfigError::UnknownProfile(self.profile.clone()))
    }

    /// Apply `VITALS_PROFILE` / `VITALS_LISTEN` on top of the file values.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(profile) = std::env::var("VITALS_PROFILE") {
            self.profile = profile;
        }
        if let Ok(listen) = std::env::var("VITALS_LISTEN") {
            self.listen = listen.parse().map_err(|e: std::net::AddrParseError| {
                ConfigError::InvalidEnv {
                    var: "VITALS_LISTEN".to_string(),
                    reason: e.to_string(),
                }
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let profile = self.active_profile()?;

        if !profile.route.starts_with('/') {
            return Err(ConfigError::InvalidRoute {
                profile: self.profile.clone(),
                route: profile.route.clone(),
            });
        }
        if profile.groups.is_empty() {
            return Err(ConfigError::NoGroups(self.profile.clone()));
        }
        for group in &profile.groups {
            group.validate()?;
        }

        if self.metrics.enabled && self.metrics.port == self.listen.port() {
            return Err(ConfigError::MetricsPortInUse(self.metrics.port));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub port: u16,
    pub path: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: 9090,
            path: "/metrics".to_string(),
        }
    }
}

/// One deployable variant: the route it answers on and its ordered groups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileConfig {
    pub route: String,
    pub groups: Vec<GroupConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupConfig {
    pub name: String,
    pub checks: Vec<CheckConfig>,
}

impl GroupConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.checks.is_empty() {
            return Err(ConfigError::EmptyGroup(self.name.clone()));
        }
        let invalid = |reason: &str| ConfigError::InvalidCheck {
            group: self.name.clone(),
            reason: reason.to_string(),
        };

        for check in &self.checks {
            match check {
                CheckConfig::HttpStatus(c) if c.timeout_secs == 0 => {
                    return Err(invalid("timeout_secs must be positive"));
                }
                CheckConfig::JsonField(c) if c.target.timeout_secs == 0 => {
                    return Err(invalid("timeout_secs must be positive"));
                }
                CheckConfig::JsonField(c) if c.field.is_empty() => {
                    return Err(invalid("field must not be empty"));
                }
                CheckConfig::JsonRecords(c) if c.target.timeout_secs == 0 => {
                    return Err(invalid("timeout_secs must be positive"));
                }
                CheckConfig::JsonRecords(c) if c.fields.is_empty() => {
                    return Err(invalid("fields must not be empty"));
                }
                CheckConfig::FileFreshness(c) if c.window_secs == 0 => {
                    return Err(invalid("window_secs must be positive"));
                }
                CheckConfig::BackupFreshness(c) if c.window_secs == 0 => {
                    return Err(invalid("window_secs must be positive"));
                }
                CheckConfig::BackupFreshness(c) if c.timeout_secs == 0 => {
                    return Err(invalid("timeout_secs must be positive"));
                }
                CheckConfig::BackupFreshness(c) if c.bucket.is_empty() => {
                    return Err(invalid("bucket must not be empty"));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CheckConfig {
    HttpStatus(HttpTargetConfig),
    JsonField(JsonFieldConfig),
    JsonRecords(JsonRecordsConfig),
    FileFreshness(FileFreshnessConfig),
    BackupFreshness(BackupFreshnessConfig),
}

/// Where and how long to wait for an HTTP probe, plus the wording knobs
/// its vitals carry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpTargetConfig {
    pub url: Url,
    #[serde(default)]
    pub query: BTreeMap<String, String>,
    pub timeout_secs: u64,
    /// Inserted before "HTTP Response Code" in success vitals, e.g. `map`.
    #[serde(default)]
    pub label: Option<String>,
    /// Appended to "Request Timed Out", e.g. `after 1 second`.
    #[serde(default)]
    pub timeout_note: Option<String>,
}

impl HttpTargetConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonFieldConfig {
    #[serde(flatten)]
    pub target: HttpTargetConfig,
    pub field: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRecordsConfig {
    #[serde(flatten)]
    pub target: HttpTargetConfig,
    pub collection: String,
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileFreshnessConfig {
    pub path: PathBuf,
    /// Name used in "unable to read ..."; defaults to the file name.
    #[serde(default)]
    pub display_name: Option<String>,
    pub window_secs: u64,
}

impl FileFreshnessConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    pub fn display_name(&self) -> String {
        self.display_name.clone().unwrap_or_else(|| {
            self.path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.path.display().to_string())
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupFreshnessConfig {
    pub bucket: String,
    /// Directory the backups live in, without the trailing '/'.
    pub prefix: String,
    /// chrono format of the object name below `prefix`.
    #[serde(default = "default_key_pattern")]
    pub key_pattern: String,
    pub window_secs: u64,
    #[serde(default = "default_storage_endpoint")]
    pub endpoint: Url,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default = "default_storage_timeout")]
    pub timeout_secs: u64,
    pub access_key_env: String,
    pub secret_key_env: String,
}

impl BackupFreshnessConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Read the storage credentials named by this check from the environment.
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        let read = |var: &str| {
            std::env::var(var).map_err(|_| ConfigError::MissingEnv(var.to_string()))
        };
        Ok(Credentials::new(
            read(&self.access_key_env)?,
            read(&self.secret_key_env)?,
        ))
    }
}

fn default_key_pattern() -> String {
    "base_backup_%Y-%m-%d_%H:%M:%S.zip".to_string()
}

pub(crate) fn default_storage_endpoint() -> Url {
    Url::parse("https://s3.amazonaws.com").expect("static endpoint URL is valid")
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_storage_timeout() -> u64 {
    10
}
