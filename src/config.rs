//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/genesis-init/genesis-init.toml`
//! 3. Explicit config file passed with `--config`
//! 4. Environment variables: `GENESIS_INIT_<KEY>`, `__` between nested keys
//!    (e.g. `GENESIS_INIT_CHAIN__CHAIN_ID`)

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::{ChainParams, DEFAULT_NODE_BINARY};

/// Environment variable prefix for overrides.
pub const ENV_PREFIX: &str = "GENESIS_INIT";

/// Raw chain parameters for intermediate parsing (`None` = not specified).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawChainParams {
    pub genesis_file: Option<PathBuf>,
    pub chain_id: Option<String>,
    pub staking_file: Option<PathBuf>,
    pub epoch_interval: Option<u64>,
    pub timeout_commit: Option<String>,
    pub empty_block_interval: Option<String>,
    pub max_tx_size: Option<String>,
    pub backend: Option<String>,
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub node_binary: Option<String>,
    pub sort_entities: Option<bool>,
    #[serde(default)]
    pub chain: RawChainParams,
}

/// Unified configuration for genesis-init.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Node binary, resolved through `PATH` unless it contains a separator
    pub node_binary: String,
    /// Sort entities by name for a reproducible argument order
    pub sort_entities: bool,
    /// Chain bootstrap parameters
    pub chain: ChainParams,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            node_binary: DEFAULT_NODE_BINARY.into(),
            sort_entities: true,
            chain: ChainParams::default(),
        }
    }
}

/// Get the XDG config directory for genesis-init.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "genesis-init").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("genesis-init.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl ChainParams {
    /// Overlay wins field by field where specified.
    fn merge(&self, overlay: &RawChainParams) -> Self {
        Self {
            genesis_file: overlay
                .genesis_file
                .clone()
                .unwrap_or_else(|| self.genesis_file.clone()),
            chain_id: overlay
                .chain_id
                .clone()
                .unwrap_or_else(|| self.chain_id.clone()),
            staking_file: overlay
                .staking_file
                .clone()
                .unwrap_or_else(|| self.staking_file.clone()),
            epoch_interval: overlay.epoch_interval.unwrap_or(self.epoch_interval),
            timeout_commit: overlay
                .timeout_commit
                .clone()
                .unwrap_or_else(|| self.timeout_commit.clone()),
            empty_block_interval: overlay
                .empty_block_interval
                .clone()
                .unwrap_or_else(|| self.empty_block_interval.clone()),
            max_tx_size: overlay
                .max_tx_size
                .clone()
                .unwrap_or_else(|| self.max_tx_size.clone()),
            backend: overlay
                .backend
                .clone()
                .unwrap_or_else(|| self.backend.clone()),
        }
    }
}

impl Settings {
    /// Merge overlay config onto self (base). Scalars: overlay wins if Some.
    pub fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            node_binary: overlay
                .node_binary
                .clone()
                .unwrap_or_else(|| self.node_binary.clone()),
            sort_entities: overlay.sort_entities.unwrap_or(self.sort_entities),
            chain: self.chain.merge(&overlay.chain),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `config_file` - Optional explicit config file; it must exist
    ///
    /// # Precedence (lowest to highest)
    /// 1. Compiled defaults
    /// 2. Global config: `$XDG_CONFIG_HOME/genesis-init/genesis-init.toml`
    /// 3. `config_file`
    /// 4. Environment variables: `GENESIS_INIT_*`
    pub fn load(config_file: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        if let Some(path) = config_file {
            let raw = load_raw_settings(path)?;
            current = current.merge_with(&raw);
        }

        current = Self::apply_env_overrides(current)?;

        current.expand_paths()?;

        Ok(current)
    }

    /// Apply GENESIS_INIT_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("node_binary") {
            settings.node_binary = val;
        }
        if let Ok(val) = config.get_bool("sort_entities") {
            settings.sort_entities = val;
        }
        if let Ok(val) = config.get_string("chain.genesis_file") {
            settings.chain.genesis_file = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("chain.chain_id") {
            settings.chain.chain_id = val;
        }
        if let Ok(val) = config.get_string("chain.staking_file") {
            settings.chain.staking_file = PathBuf::from(val);
        }
        if let Ok(val) = config.get::<u64>("chain.epoch_interval") {
            settings.chain.epoch_interval = val;
        }
        if let Ok(val) = config.get_string("chain.timeout_commit") {
            settings.chain.timeout_commit = val;
        }
        if let Ok(val) = config.get_string("chain.empty_block_interval") {
            settings.chain.empty_block_interval = val;
        }
        if let Ok(val) = config.get_string("chain.max_tx_size") {
            settings.chain.max_tx_size = val;
        }
        if let Ok(val) = config.get_string("chain.backend") {
            settings.chain.backend = val;
        }

        Ok(settings)
    }

    /// Expand `~`, `$VAR` and `${VAR}` in path-like fields.
    fn expand_paths(&mut self) -> Result<(), ApplicationError> {
        self.node_binary = expand(&self.node_binary)?;
        self.chain.genesis_file = PathBuf::from(expand(&self.chain.genesis_file.to_string_lossy())?);
        self.chain.staking_file = PathBuf::from(expand(&self.chain.staking_file.to_string_lossy())?);
        Ok(())
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }
}

fn expand(value: &str) -> Result<String, ApplicationError> {
    shellexpand::full(value)
        .map(|v| v.into_owned())
        .map_err(|e| ApplicationError::Config {
            message: format!("expand {value}: {e}"),
        })
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
