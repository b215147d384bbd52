//! Configuration for the key-value storage layer.
//!
//! Values are loaded with the following priority (lowest first):
//! 1. Default values (hardcoded)
//! 2. Optional TOML file
//! 3. Environment variables prefixed with `KVSTORE__` (highest priority)
//!
//! Tuning knobs only affect performance and space usage, never correctness.

mod engine;
pub use engine::*;


//---
use std::path::PathBuf;

use config::Config;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::constants::CONFIG_ENV_PREFIX;
use crate::Error;
use crate::Result;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct KvConfig {
    /// Which engine backs the store
    #[serde(default)]
    pub engine: EngineKind,

    /// Primary data directory handed to the engine
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Optional separate write-ahead-log directory, e.g. on a faster device.
    /// Engines without a relocatable WAL ignore it.
    #[serde(default)]
    pub wal_dir: Option<PathBuf>,

    /// RocksDB tuning knobs
    #[serde(default)]
    pub rocksdb: RocksDbTuning,

    /// Sled tuning knobs
    #[serde(default)]
    pub sled: SledTuning,
}

impl Default for KvConfig {
    fn default() -> Self {
        Self {
            engine: EngineKind::default(),
            data_dir: default_data_dir(),
            wal_dir: None,
            rocksdb: RocksDbTuning::default(),
            sled: SledTuning::default(),
        }
    }
}

impl KvConfig {
    /// Load configuration from defaults, an optional TOML file and
    /// `KVSTORE__*` environment variables, then validate it.
    ///
    /// # Arguments
    /// * `config_path` - Optional path to a TOML file; required to exist when given
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = config_path {
            debug!("loading kv config from {}", path);
            builder = builder.add_source(File::with_name(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(CONFIG_ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .ignore_empty(true)
                .try_parsing(true),
        );

        let config: KvConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validates directory layout and every engine's tuning section
    pub fn validate(&self) -> Result<()> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(Error::Config(ConfigError::Message(
                "data_dir must not be empty".into(),
            )));
        }

        if let Some(wal_dir) = &self.wal_dir {
            if wal_dir == &self.data_dir {
                return Err(Error::Config(ConfigError::Message(format!(
                    "wal_dir must differ from data_dir ({})",
                    wal_dir.display()
                ))));
            }
        }

        self.rocksdb.validate()?;
        self.sled.validate()?;

        Ok(())
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./db/kv")
}
