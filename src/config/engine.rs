use std::fmt;

use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::constants::MEMORY_ENGINE_NAME;
use crate::constants::ROCKSDB_ENGINE_NAME;
use crate::constants::SLED_ENGINE_NAME;
use crate::Error;
use crate::Result;

/// Storage engine selected at construction time
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// Embedded B-tree engine; experimental
    #[default]
    Sled,
    /// LSM engine, requires the `rocksdb` cargo feature
    RocksDb,
    /// Volatile `BTreeMap` engine for tests and ephemeral nodes
    Memory,
}

impl EngineKind {
    pub fn name(&self) -> &'static str {
        match self {
            EngineKind::Sled => SLED_ENGINE_NAME,
            EngineKind::RocksDb => ROCKSDB_ENGINE_NAME,
            EngineKind::Memory => MEMORY_ENGINE_NAME,
        }
    }

    /// Engines that print a one-time "do not use in production" warning
    pub fn is_experimental(&self) -> bool {
        matches!(self, EngineKind::Sled)
    }
}

impl fmt::Display for EngineKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// RocksDB options sourced from settings. Sizes are in bytes.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RocksDbTuning {
    #[serde(default = "default_write_buffer_size")]
    pub write_buffer_size: usize,

    #[serde(default = "default_max_write_buffer_number")]
    pub max_write_buffer_number: i32,

    #[serde(default = "default_l0_file_num_compaction_trigger")]
    pub level0_file_num_compaction_trigger: i32,

    #[serde(default = "default_l0_slowdown_writes_trigger")]
    pub level0_slowdown_writes_trigger: i32,

    #[serde(default = "default_l0_stop_writes_trigger")]
    pub level0_stop_writes_trigger: i32,

    #[serde(default = "default_max_bytes_for_level_base")]
    pub max_bytes_for_level_base: u64,

    /// Target SST size on level 1; each following level doubles it
    #[serde(default = "default_target_file_size_base")]
    pub target_file_size_base: u64,

    #[serde(default = "default_target_file_size_multiplier")]
    pub target_file_size_multiplier: i32,

    #[serde(default = "default_block_size")]
    pub block_size: usize,

    #[serde(default = "default_max_manifest_file_size")]
    pub max_manifest_file_size: usize,
}

impl Default for RocksDbTuning {
    fn default() -> Self {
        Self {
            write_buffer_size: default_write_buffer_size(),
            max_write_buffer_number: default_max_write_buffer_number(),
            level0_file_num_compaction_trigger: default_l0_file_num_compaction_trigger(),
            level0_slowdown_writes_trigger: default_l0_slowdown_writes_trigger(),
            level0_stop_writes_trigger: default_l0_stop_writes_trigger(),
            max_bytes_for_level_base: default_max_bytes_for_level_base(),
            target_file_size_base: default_target_file_size_base(),
            target_file_size_multiplier: default_target_file_size_multiplier(),
            block_size: default_block_size(),
            max_manifest_file_size: default_max_manifest_file_size(),
        }
    }
}

impl RocksDbTuning {
    pub(super) fn validate(&self) -> Result<()> {
        if self.write_buffer_size == 0 {
            return Err(Error::Config(ConfigError::Message(
                "rocksdb.write_buffer_size must be greater than 0".into(),
            )));
        }

        if self.max_write_buffer_number < 1 {
            return Err(Error::Config(ConfigError::Message(
                "rocksdb.max_write_buffer_number must be at least 1".into(),
            )));
        }

        if self.level0_file_num_compaction_trigger < 1
            || self.level0_file_num_compaction_trigger > self.level0_slowdown_writes_trigger
            || self.level0_slowdown_writes_trigger > self.level0_stop_writes_trigger
        {
            return Err(Error::Config(ConfigError::Message(format!(
                "rocksdb level0 triggers must satisfy 1 <= compaction({}) <= slowdown({}) <= stop({})",
                self.level0_file_num_compaction_trigger,
                self.level0_slowdown_writes_trigger,
                self.level0_stop_writes_trigger
            ))));
        }

        if self.max_bytes_for_level_base == 0 || self.target_file_size_base == 0 {
            return Err(Error::Config(ConfigError::Message(
                "rocksdb level sizes must be greater than 0".into(),
            )));
        }

        if self.target_file_size_multiplier < 1 {
            return Err(Error::Config(ConfigError::Message(
                "rocksdb.target_file_size_multiplier must be at least 1".into(),
            )));
        }

        if self.block_size == 0 {
            return Err(Error::Config(ConfigError::Message(
                "rocksdb.block_size must be greater than 0".into(),
            )));
        }

        Ok(())
    }
}

fn default_write_buffer_size() -> usize {
    256 * 1024 * 1024
}
fn default_max_write_buffer_number() -> i32 {
    8
}
fn default_l0_file_num_compaction_trigger() -> i32 {
    8
}
fn default_l0_slowdown_writes_trigger() -> i32 {
    17
}
fn default_l0_stop_writes_trigger() -> i32 {
    24
}
fn default_max_bytes_for_level_base() -> u64 {
    4 * 1024 * 1024 * 1024
}
fn default_target_file_size_base() -> u64 {
    16 * 1024 * 1024
}
fn default_target_file_size_multiplier() -> i32 {
    2
}
fn default_block_size() -> usize {
    32 * 1024
}
fn default_max_manifest_file_size() -> usize {
    128 * 1024 * 1024
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SledTuning {
    /// Page cache size in bytes
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: u64,

    #[serde(default)]
    pub use_compression: bool,
}

impl Default for SledTuning {
    fn default() -> Self {
        Self {
            cache_capacity: default_cache_capacity(),
            use_compression: false,
        }
    }
}

impl SledTuning {
    pub(super) fn validate(&self) -> Result<()> {
        if self.cache_capacity == 0 {
            return Err(Error::Config(ConfigError::Message(
                "sled.cache_capacity must be greater than 0".into(),
            )));
        }
        Ok(())
    }
}

fn default_cache_capacity() -> u64 {
    512 * 1024 * 1024
}
