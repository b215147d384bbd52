//! Engine selection.
//!
//! [`KvEngine`] is the single store type handed to the log database. The
//! engine is picked once from [`KvConfig`] and every call is dispatched by
//! `match`, so batches and cursors stay tagged with the engine that made them.

use std::path::Path;

use bytes::Bytes;
#[cfg(not(feature = "rocksdb"))]
use config::ConfigError;
use tracing::info;

use crate::constants::MEMORY_ENGINE_NAME;
#[cfg(feature = "rocksdb")]
use crate::constants::ROCKSDB_ENGINE_NAME;
use crate::constants::SLED_ENGINE_NAME;
use crate::storage::EXPERIMENTAL_ENGINE_NOTICE;
use crate::EngineKind;
#[cfg(not(feature = "rocksdb"))]
use crate::Error;
use crate::KvConfig;
use crate::KvIterator;
use crate::KvStore;
use crate::MemKvIterator;
use crate::MemKvStore;
use crate::MemWriteBatch;
use crate::Result;
#[cfg(feature = "rocksdb")]
use crate::RocksDbKvIterator;
#[cfg(feature = "rocksdb")]
use crate::RocksDbKvStore;
#[cfg(feature = "rocksdb")]
use crate::RocksDbWriteBatch;
use crate::SledKvIterator;
use crate::SledKvStore;
use crate::SledWriteBatch;
use crate::StorageError;
use crate::WriteBatch;

/// A store backed by whichever engine the configuration names.
#[derive(Debug)]
pub enum KvEngine {
    Memory(MemKvStore),
    Sled(SledKvStore),
    #[cfg(feature = "rocksdb")]
    RocksDb(RocksDbKvStore),
}

/// Write batch of a [`KvEngine`], tagged with its engine
#[derive(Debug)]
pub enum AnyWriteBatch {
    Memory(MemWriteBatch),
    Sled(SledWriteBatch),
    #[cfg(feature = "rocksdb")]
    RocksDb(RocksDbWriteBatch),
}

/// Cursor of a [`KvEngine`]
pub enum AnyKvIterator<'a> {
    Memory(MemKvIterator<'a>),
    Sled(SledKvIterator<'a>),
    #[cfg(feature = "rocksdb")]
    RocksDb(RocksDbKvIterator<'a>),
}

impl KvEngine {
    /// Opens the engine named by `config.engine` at `dir`.
    ///
    /// On-disk engines get `dir` created first. `wal_dir` is forwarded to the
    /// engine, which may ignore it. Opening an experimental engine logs a
    /// warning once per process.
    pub fn open(
        config: &KvConfig,
        dir: impl AsRef<Path>,
        wal_dir: Option<&Path>,
    ) -> Result<Self> {
        let dir = dir.as_ref();
        let engine = match config.engine {
            EngineKind::Memory => KvEngine::Memory(MemKvStore::new()),
            EngineKind::Sled => {
                std::fs::create_dir_all(dir).map_err(StorageError::from)?;
                KvEngine::Sled(SledKvStore::open(dir, wal_dir, &config.sled)?)
            }
            #[cfg(feature = "rocksdb")]
            EngineKind::RocksDb => {
                std::fs::create_dir_all(dir).map_err(StorageError::from)?;
                KvEngine::RocksDb(RocksDbKvStore::open(dir, wal_dir, &config.rocksdb)?)
            }
            #[cfg(not(feature = "rocksdb"))]
            EngineKind::RocksDb => {
                return Err(Error::Config(ConfigError::Message(
                    "the rocksdb engine requires the `rocksdb` cargo feature".into(),
                )));
            }
        };

        if config.engine.is_experimental() {
            EXPERIMENTAL_ENGINE_NOTICE.warn_once(config.engine.name());
        }
        info!("kv store ready with {} engine", engine.name());
        Ok(engine)
    }

    /// Opens the configured engine at `config.data_dir` and `config.wal_dir`.
    pub fn from_config(config: &KvConfig) -> Result<Self> {
        config.validate()?;
        Self::open(config, &config.data_dir, config.wal_dir.as_deref())
    }

    pub fn kind(&self) -> EngineKind {
        match self {
            KvEngine::Memory(_) => EngineKind::Memory,
            KvEngine::Sled(_) => EngineKind::Sled,
            #[cfg(feature = "rocksdb")]
            KvEngine::RocksDb(_) => EngineKind::RocksDb,
        }
    }
}

impl AnyWriteBatch {
    fn engine_name(&self) -> &'static str {
        match self {
            AnyWriteBatch::Memory(_) => MEMORY_ENGINE_NAME,
            AnyWriteBatch::Sled(_) => SLED_ENGINE_NAME,
            #[cfg(feature = "rocksdb")]
            AnyWriteBatch::RocksDb(_) => ROCKSDB_ENGINE_NAME,
        }
    }
}

fn foreign_batch(
    store: &KvEngine,
    batch: &AnyWriteBatch,
) -> ! {
    panic!(
        "write batch from the {} engine committed to the {} engine",
        batch.engine_name(),
        store.name()
    )
}

impl KvStore for KvEngine {
    type Batch = AnyWriteBatch;
    type Iter<'a> = AnyKvIterator<'a>;

    fn name(&self) -> &'static str {
        match self {
            KvEngine::Memory(s) => s.name(),
            KvEngine::Sled(s) => s.name(),
            #[cfg(feature = "rocksdb")]
            KvEngine::RocksDb(s) => s.name(),
        }
    }

    fn close(&mut self) -> Result<()> {
        match self {
            KvEngine::Memory(s) => s.close(),
            KvEngine::Sled(s) => s.close(),
            #[cfg(feature = "rocksdb")]
            KvEngine::RocksDb(s) => s.close(),
        }
    }

    fn iter(&self) -> Self::Iter<'_> {
        match self {
            KvEngine::Memory(s) => AnyKvIterator::Memory(s.iter()),
            KvEngine::Sled(s) => AnyKvIterator::Sled(s.iter()),
            #[cfg(feature = "rocksdb")]
            KvEngine::RocksDb(s) => AnyKvIterator::RocksDb(s.iter()),
        }
    }

    fn get(
        &self,
        key: &[u8],
    ) -> Result<Option<Bytes>> {
        match self {
            KvEngine::Memory(s) => s.get(key),
            KvEngine::Sled(s) => s.get(key),
            #[cfg(feature = "rocksdb")]
            KvEngine::RocksDb(s) => s.get(key),
        }
    }

    fn put(
        &self,
        key: &[u8],
        value: &[u8],
    ) -> Result<()> {
        match self {
            KvEngine::Memory(s) => s.put(key, value),
            KvEngine::Sled(s) => s.put(key, value),
            #[cfg(feature = "rocksdb")]
            KvEngine::RocksDb(s) => s.put(key, value),
        }
    }

    fn delete(
        &self,
        key: &[u8],
    ) -> Result<()> {
        match self {
            KvEngine::Memory(s) => s.delete(key),
            KvEngine::Sled(s) => s.delete(key),
            #[cfg(feature = "rocksdb")]
            KvEngine::RocksDb(s) => s.delete(key),
        }
    }

    fn new_write_batch(&self) -> Self::Batch {
        match self {
            KvEngine::Memory(s) => AnyWriteBatch::Memory(s.new_write_batch()),
            KvEngine::Sled(s) => AnyWriteBatch::Sled(s.new_write_batch()),
            #[cfg(feature = "rocksdb")]
            KvEngine::RocksDb(s) => AnyWriteBatch::RocksDb(s.new_write_batch()),
        }
    }

    /// # Panics
    /// If `batch` was created by a different engine.
    fn commit(
        &self,
        batch: &mut Self::Batch,
    ) -> Result<()> {
        match (self, batch) {
            (KvEngine::Memory(s), AnyWriteBatch::Memory(b)) => s.commit(b),
            (KvEngine::Sled(s), AnyWriteBatch::Sled(b)) => s.commit(b),
            #[cfg(feature = "rocksdb")]
            (KvEngine::RocksDb(s), AnyWriteBatch::RocksDb(b)) => s.commit(b),
            (store, batch) => foreign_batch(store, batch),
        }
    }

    fn compact_storage(
        &self,
        from: &[u8],
        to: &[u8],
    ) -> Result<()> {
        match self {
            KvEngine::Memory(s) => s.compact_storage(from, to),
            KvEngine::Sled(s) => s.compact_storage(from, to),
            #[cfg(feature = "rocksdb")]
            KvEngine::RocksDb(s) => s.compact_storage(from, to),
        }
    }
}

impl WriteBatch for AnyWriteBatch {
    fn put(
        &mut self,
        key: &[u8],
        value: &[u8],
    ) {
        match self {
            AnyWriteBatch::Memory(b) => b.put(key, value),
            AnyWriteBatch::Sled(b) => b.put(key, value),
            #[cfg(feature = "rocksdb")]
            AnyWriteBatch::RocksDb(b) => b.put(key, value),
        }
    }

    fn delete(
        &mut self,
        key: &[u8],
    ) {
        match self {
            AnyWriteBatch::Memory(b) => b.delete(key),
            AnyWriteBatch::Sled(b) => b.delete(key),
            #[cfg(feature = "rocksdb")]
            AnyWriteBatch::RocksDb(b) => b.delete(key),
        }
    }

    fn count(&self) -> usize {
        match self {
            AnyWriteBatch::Memory(b) => b.count(),
            AnyWriteBatch::Sled(b) => b.count(),
            #[cfg(feature = "rocksdb")]
            AnyWriteBatch::RocksDb(b) => b.count(),
        }
    }

    fn clear(&mut self) {
        match self {
            AnyWriteBatch::Memory(b) => b.clear(),
            AnyWriteBatch::Sled(b) => b.clear(),
            #[cfg(feature = "rocksdb")]
            AnyWriteBatch::RocksDb(b) => b.clear(),
        }
    }
}

impl KvIterator for AnyKvIterator<'_> {
    fn seek(
        &mut self,
        key: &[u8],
    ) {
        match self {
            AnyKvIterator::Memory(i) => i.seek(key),
            AnyKvIterator::Sled(i) => i.seek(key),
            #[cfg(feature = "rocksdb")]
            AnyKvIterator::RocksDb(i) => i.seek(key),
        }
    }

    fn valid(&self) -> bool {
        match self {
            AnyKvIterator::Memory(i) => i.valid(),
            AnyKvIterator::Sled(i) => i.valid(),
            #[cfg(feature = "rocksdb")]
            AnyKvIterator::RocksDb(i) => i.valid(),
        }
    }

    fn next(&mut self) {
        match self {
            AnyKvIterator::Memory(i) => i.next(),
            AnyKvIterator::Sled(i) => i.next(),
            #[cfg(feature = "rocksdb")]
            AnyKvIterator::RocksDb(i) => i.next(),
        }
    }

    fn key(&self) -> &[u8] {
        match self {
            AnyKvIterator::Memory(i) => i.key(),
            AnyKvIterator::Sled(i) => i.key(),
            #[cfg(feature = "rocksdb")]
            AnyKvIterator::RocksDb(i) => i.key(),
        }
    }

    fn value(&self) -> &[u8] {
        match self {
            AnyKvIterator::Memory(i) => i.value(),
            AnyKvIterator::Sled(i) => i.value(),
            #[cfg(feature = "rocksdb")]
            AnyKvIterator::RocksDb(i) => i.value(),
        }
    }

    fn status(&self) -> Result<()> {
        match self {
            AnyKvIterator::Memory(i) => i.status(),
            AnyKvIterator::Sled(i) => i.status(),
            #[cfg(feature = "rocksdb")]
            AnyKvIterator::RocksDb(i) => i.status(),
        }
    }
}
