use std::path::Path;

use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};

use super::backend::BackendConfig;
use super::logging::LoggingConfig;
use super::store::SessionStoreConfig;

/// The version assumed when the file does not name one.
pub const CURRENT_VERSION: &str = "1.0.0";

/// Prefix of environment variables that override file settings,
/// e.g. `SPAI_BACKEND__BASE_URL`.
pub const ENV_PREFIX: &str = "SPAI_";

/// A top-level enum for versioned configurations.
#[derive(Deserialize, Serialize, JsonSchema)]
#[serde(tag = "version")]
pub enum Config {
    #[serde(rename = "1.0.0")]
    ConfigV1(ConfigV1),
}

/// Main config for v1.0.0: backend, session store and logging.
#[derive(Deserialize, Serialize, Debug, JsonSchema, Clone, Default, PartialEq, Eq)]
pub struct ConfigV1 {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub session: SessionStoreConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("error loading configuration: {0}")]
    Load(#[from] Box<figment::Error>),
    #[error("invalid logging.level '{0}'. Valid values: trace, debug, info, warn, error")]
    InvalidLogLevel(String),
    #[error("could not install the log subscriber: {0}")]
    Logging(String),
}

/// The layered configuration sources: built-in version, the YAML file at
/// `path` (optional), then `SPAI_`-prefixed environment variables.
pub fn figment(path: &Path) -> Figment {
    Figment::from(Serialized::default("version", CURRENT_VERSION))
        .merge(Yaml::file(path))
        .merge(
            Env::prefixed(ENV_PREFIX)
                .ignore(&["config", "password", "confirm_password"])
                .split("__"),
        )
}

/// Extract a configuration from any figment, handling version migration.
pub fn extract_config(figment: &Figment) -> Result<ConfigV1, ConfigError> {
    let config = figment.extract::<Config>().map_err(Box::new)?;
    match config {
        Config::ConfigV1(c) => Ok(c),
    }
    // handle configuration migration between versions here when necessary
}

/// Load config from the YAML file at `path`, overridden by the environment.
pub fn load_config(path: &Path) -> Result<ConfigV1, ConfigError> {
    extract_config(&figment(path))
}

/// The JSON schema for the configuration file.
pub fn schema_json() -> Result<String, serde_json::Error> {
    let schema = schema_for!(Config);
    serde_json::to_string_pretty(&schema)
}
