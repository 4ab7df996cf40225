use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::PathBuf;

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::Deserialize;

pub const CONFIG_FILE: &str = "svl.toml";
pub const ENV_PREFIX: &str = "SVL_";

#[derive(Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct RemoteConfig {
    /// Spreadsheet script endpoint. Sync is disabled when unset.
    pub url: Option<String>,
    /// Upper bound for a single remote call. Unset means wait forever.
    pub timeout_secs: Option<u64>,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct Config {
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
    /// Directory for the local records. In-memory storage when unset.
    #[serde(default)]
    pub storage_dir: Option<PathBuf>,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default = "default_rooms")]
    pub rooms: u32,
    #[serde(default = "default_hourly_rate")]
    pub hourly_rate: f64,
    /// Printed at the top of receipts.
    #[serde(default = "default_lodge_name")]
    pub lodge_name: String,
    #[serde(default)]
    pub remote: RemoteConfig,
}

const fn default_listen() -> SocketAddr {
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 3000))
}

fn default_namespace() -> String {
    "sv_lodge".to_owned()
}

fn default_lodge_name() -> String {
    "Sri Venkateswara Lodge".to_owned()
}

const fn default_rooms() -> u32 {
    30
}

const fn default_hourly_rate() -> f64 {
    50.0
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            storage_dir: None,
            namespace: default_namespace(),
            rooms: default_rooms(),
            hourly_rate: default_hourly_rate(),
            lodge_name: default_lodge_name(),
            remote: RemoteConfig::default(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("config error: {0}")]
    Figment(#[from] Box<figment::Error>),
    #[error("invalid config value `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl From<figment::Error> for ConfigError {
    fn from(value: figment::Error) -> Self {
        Self::Figment(Box::new(value))
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rooms == 0 {
            return Err(ConfigError::Invalid {
                key: "rooms",
                reason: "the lodge needs at least one room".to_owned(),
            });
        }
        if !self.hourly_rate.is_finite() || self.hourly_rate < 0.0 {
            return Err(ConfigError::Invalid {
                key: "hourly_rate",
                reason: format!("{} is not a non-negative amount", self.hourly_rate),
            });
        }
        if self.namespace.is_empty() {
            return Err(ConfigError::Invalid {
                key: "namespace",
                reason: "must not be empty".to_owned(),
            });
        }
        Ok(())
    }
}

/// `svl.toml` in the working directory, overridden by `SVL_` variables.
/// Nested keys use a double underscore, e.g. `SVL_REMOTE__URL`.
#[must_use]
pub fn figment() -> Figment {
    Figment::new()
        .merge(Toml::file(CONFIG_FILE))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
}

pub fn get_config() -> Result<Config, ConfigError> {
    let config: Config = figment().extract()?;
    config.validate()?;
    Ok(config)
}
