//! Webhook configuration
//!
//! Layered with the `config` crate: built-in defaults, then an optional TOML
//! file, then `ACMEHOOK__SECTION__KEY` environment variables. The API group
//! comes from `GROUP_NAME`, the variable cert-manager deployments set.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

/// Environment variable holding the webhook's API group
pub const GROUP_NAME_ENV: &str = "GROUP_NAME";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Top-level webhook configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// API group the solvers are served under
    #[serde(default)]
    pub group_name: String,
    /// Server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// DNS provider settings
    #[serde(default)]
    pub providers: ProvidersConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Emit logs as JSON lines
    #[serde(default)]
    pub json_logs: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub namesilo: NameSiloConfig,
    #[serde(default)]
    pub netactuate: NetActuateConfig,
}

/// NameSilo solver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NameSiloConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_namesilo_url")]
    pub base_url: String,
    /// TTL of created TXT records in seconds
    #[serde(default = "default_ttl")]
    pub ttl: u32,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// NetActuate solver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetActuateConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_netactuate_url")]
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_bind_addr() -> SocketAddr {
    ([0, 0, 0, 0], 8443).into()
}

fn default_log_level() -> String {
    "info".to_string()
}

const fn default_true() -> bool {
    true
}

fn default_namesilo_url() -> String {
    acmehook_providers::namesilo::NAMESILO_API_BASE.to_string()
}

fn default_netactuate_url() -> String {
    acmehook_providers::netactuate::NETACTUATE_API_BASE.to_string()
}

const fn default_ttl() -> u32 {
    acmehook_providers::namesilo::DEFAULT_TTL
}

const fn default_timeout() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            log_level: default_log_level(),
            json_logs: false,
        }
    }
}

impl Default for NameSiloConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            base_url: default_namesilo_url(),
            ttl: default_ttl(),
            timeout_secs: default_timeout(),
        }
    }
}

impl Default for NetActuateConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: default_netactuate_url(),
            timeout_secs: default_timeout(),
        }
    }
}

impl NameSiloConfig {
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl NetActuateConfig {
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl WebhookConfig {
    /// Load configuration, reading `path` if given or the default locations otherwise
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path));
        } else {
            for candidate in ["acmehook.toml", "/etc/acmehook/acmehook.toml"] {
                if Path::new(candidate).exists() {
                    builder = builder.add_source(File::with_name(candidate).required(false));
                }
            }
        }

        builder = builder
            .add_source(
                Environment::with_prefix("ACMEHOOK")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("group_name", std::env::var(GROUP_NAME_ENV).ok())?;

        builder.build()?.try_deserialize()
    }

    /// Check invariants the server relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.group_name.trim().is_empty() {
            return Err(ConfigError::Message(format!(
                "group_name: {GROUP_NAME_ENV} must be set to the webhook's API group"
            )));
        }

        validators::validate_log_level(&self.server.log_level, "server.log_level")?;

        let namesilo = &self.providers.namesilo;
        if namesilo.enabled {
            validators::validate_url(&namesilo.base_url, "providers.namesilo.base_url")?;
            if namesilo.ttl == 0 {
                return Err(ConfigError::Message(
                    "providers.namesilo.ttl: must be greater than zero".to_string(),
                ));
            }
        }

        let netactuate = &self.providers.netactuate;
        if netactuate.enabled {
            validators::validate_url(&netactuate.base_url, "providers.netactuate.base_url")?;
        }

        if !namesilo.enabled && !netactuate.enabled {
            return Err(ConfigError::Message(
                "providers: at least one provider must be enabled".to_string(),
            ));
        }

        Ok(())
    }
}

pub mod validators {
    use super::LOG_LEVELS;
    use config::ConfigError;

    /// Validate URL format
    pub fn validate_url(url: &str, field: &str) -> Result<(), ConfigError> {
        url::Url::parse(url)
            .map_err(|e| ConfigError::Message(format!("{field}: invalid URL - {e}")))?;
        Ok(())
    }

    /// Accept one of the plain `tracing` level names
    pub fn validate_log_level(level: &str, field: &str) -> Result<(), ConfigError> {
        if LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str()) {
            Ok(())
        } else {
            Err(ConfigError::Message(format!(
                "{field}: unknown log level '{level}', expected one of {}",
                LOG_LEVELS.join(", ")
            )))
        }
    }
}
