use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};
use uuid::Uuid;

pub const DEFAULT_CONFIG_PATH: &str = "etc/conf.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file {path} was not found; copy etc/conf.toml.sample to {path} and update its contents")]
    NotFound { path: String },
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid [ail] {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeederConfig {
    pub ail: AilConfig,
}

/// Connection settings for the AIL instance receiving the events
#[derive(Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AilConfig {
    pub feeder_uuid: String,
    pub url: String,
    pub apikey: String,
    #[serde(default = "default_true")]
    pub verifycert: bool,
}

// Keeps the API key out of logs.
impl std::fmt::Debug for AilConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AilConfig")
            .field("feeder_uuid", &self.feeder_uuid)
            .field("url", &self.url)
            .field("apikey", &"<redacted>")
            .field("verifycert", &self.verifycert)
            .finish()
    }
}

fn default_true() -> bool {
    true
}

impl FeederConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: FeederConfig = toml::from_str(raw)?;
        config.ail.validate()?;
        Ok(config)
    }
}

impl AilConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        Uuid::parse_str(self.feeder_uuid.trim()).map_err(|e| ConfigError::Invalid {
            key: "feeder_uuid",
            reason: format!("'{}' is not a UUID: {}", self.feeder_uuid, e),
        })?;

        if !(self.url.starts_with("http://") || self.url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                key: "url",
                reason: format!("'{}' must be an http(s) URL", self.url),
            });
        }

        if self.apikey.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "apikey",
                reason: "must not be empty".to_string(),
            });
        }

        Ok(())
    }
}

pub fn load_config(path: impl AsRef<Path>) -> Result<FeederConfig, ConfigError> {
    let path = path.as_ref();
    debug!("Loading config from {}", path.display());

    let raw = std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ConfigError::NotFound {
                path: path.display().to_string(),
            }
        } else {
            ConfigError::Io {
                path: path.display().to_string(),
                source,
            }
        }
    })?;

    let config = FeederConfig::from_toml_str(&raw)?;
    info!("Loaded config for feeder {} -> {}", config.ail.feeder_uuid, config.ail.url);
    Ok(config)
}
