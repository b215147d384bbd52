use std::path::Path;
use std::path::PathBuf;

use bytes::Bytes;
use rocksdb::BlockBasedOptions;
use rocksdb::DBCompressionType;
use rocksdb::DBRawIterator;
use rocksdb::Options;
use rocksdb::WriteOptions;
use rocksdb::DB;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::instrument;
use tracing::trace;
use tracing::warn;

use crate::constants::ROCKSDB_ENGINE_NAME;
use crate::KvIterator;
use crate::KvStore;
use crate::Result;
use crate::RocksDbTuning;
use crate::StorageError;
use crate::WriteBatch;

/// RocksDB-based key-value store.
///
/// All writes go through `WriteOptions::set_sync(true)`, so the WAL is
/// fsynced before a put, delete or commit returns.
pub struct RocksDbKvStore {
    db: Option<DB>,
    path: PathBuf,
    wal_dir: Option<PathBuf>,
}

/// Batch for [`RocksDbKvStore`]
#[derive(Default)]
pub struct RocksDbWriteBatch {
    pub(crate) batch: rocksdb::WriteBatch,
    count: usize,
}

/// Cursor for [`RocksDbKvStore`] over a raw RocksDB iterator, which pins an
/// implicit snapshot for its lifetime.
pub struct RocksDbKvIterator<'a> {
    inner: DBRawIterator<'a>,
}

#[inline]
fn sync_write_options() -> WriteOptions {
    let mut wo = WriteOptions::default();
    wo.set_sync(true);
    wo
}

fn build_options(
    wal_dir: Option<&Path>,
    tuning: &RocksDbTuning,
) -> Options {
    let mut opts = Options::default();
    opts.create_if_missing(true);

    // Memory and write buffers
    opts.set_write_buffer_size(tuning.write_buffer_size);
    opts.set_max_write_buffer_number(tuning.max_write_buffer_number);

    // Level 0 pressure
    opts.set_level_zero_file_num_compaction_trigger(tuning.level0_file_num_compaction_trigger);
    opts.set_level_zero_slowdown_writes_trigger(tuning.level0_slowdown_writes_trigger);
    opts.set_level_zero_stop_writes_trigger(tuning.level0_stop_writes_trigger);

    // Leveled compaction: file size doubles per level
    opts.set_max_bytes_for_level_base(tuning.max_bytes_for_level_base);
    opts.set_target_file_size_base(tuning.target_file_size_base);
    opts.set_target_file_size_multiplier(tuning.target_file_size_multiplier);
    opts.set_max_manifest_file_size(tuning.max_manifest_file_size);

    // Log entries are already compact; skip compression
    opts.set_compression_type(DBCompressionType::None);
    let mut table = BlockBasedOptions::default();
    table.set_block_size(tuning.block_size);
    opts.set_block_based_table_factory(&table);

    if let Some(wal_dir) = wal_dir {
        opts.set_wal_dir(wal_dir);
    }
    opts
}

impl RocksDbKvStore {
    /// Opens or creates a RocksDB store rooted at `dir`, placing the WAL in
    /// `wal_dir` when given.
    pub fn open(
        dir: impl AsRef<Path>,
        wal_dir: Option<&Path>,
        tuning: &RocksDbTuning,
    ) -> Result<Self> {
        let path = dir.as_ref();
        debug!("open rocksdb kv store from path: {:?}, wal_dir: {:?}", path, wal_dir);

        let opts = build_options(wal_dir, tuning);
        let db = DB::open(&opts, path).map_err(|e| {
            warn!("Try to open DB at this location: {:?} and failed: {:?}", path, e);
            StorageError::Open {
                engine: ROCKSDB_ENGINE_NAME,
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        })?;
        info!("opened rocksdb kv store at {:?}", path);

        Ok(Self {
            db: Some(db),
            path: path.to_path_buf(),
            wal_dir: wal_dir.map(Path::to_path_buf),
        })
    }

    fn db(&self) -> &DB {
        match &self.db {
            Some(db) => db,
            None => panic!("rocksdb kv store at {:?} used after close", self.path),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn wal_dir(&self) -> Option<&Path> {
        self.wal_dir.as_deref()
    }
}

impl KvStore for RocksDbKvStore {
    type Batch = RocksDbWriteBatch;
    type Iter<'a> = RocksDbKvIterator<'a>;

    fn name(&self) -> &'static str {
        ROCKSDB_ENGINE_NAME
    }

    fn close(&mut self) -> Result<()> {
        if let Some(db) = self.db.take() {
            db.flush().map_err(|e| StorageError::Write(e.to_string()))?;
            drop(db);
            info!("closed rocksdb kv store at {:?}", self.path);
        }
        Ok(())
    }

    fn iter(&self) -> Self::Iter<'_> {
        RocksDbKvIterator {
            inner: self.db().raw_iterator(),
        }
    }

    #[instrument(skip(self))]
    fn get(
        &self,
        key: &[u8],
    ) -> Result<Option<Bytes>> {
        let value = self
            .db()
            .get(key)
            .map_err(|e| StorageError::Read(e.to_string()))?;
        Ok(value.map(Bytes::from))
    }

    #[instrument(skip(self, value))]
    fn put(
        &self,
        key: &[u8],
        value: &[u8],
    ) -> Result<()> {
        self.db()
            .put_opt(key, value, &sync_write_options())
            .map_err(|e| StorageError::Write(e.to_string()))?;
        Ok(())
    }

    #[instrument(skip(self))]
    fn delete(
        &self,
        key: &[u8],
    ) -> Result<()> {
        self.db()
            .delete_opt(key, &sync_write_options())
            .map_err(|e| StorageError::Write(e.to_string()))?;
        Ok(())
    }

    fn new_write_batch(&self) -> Self::Batch {
        RocksDbWriteBatch::default()
    }

    #[instrument(skip(self, batch), fields(count = batch.count))]
    fn commit(
        &self,
        batch: &mut Self::Batch,
    ) -> Result<()> {
        let staged = std::mem::take(&mut batch.batch);
        if std::mem::take(&mut batch.count) == 0 {
            return Ok(());
        }

        self.db()
            .write_opt(staged, &sync_write_options())
            .map_err(|e| {
                error!("write batch failed: {:?}", e);
                StorageError::Commit(e.to_string())
            })?;
        Ok(())
    }

    fn compact_storage(
        &self,
        from: &[u8],
        to: &[u8],
    ) -> Result<()> {
        trace!("rocksdb compact_range");
        let db = self.db();
        db.compact_range(Some(from), Some(to));
        // compact_range swallows background errors; a failed flush is the
        // only fault left to surface
        db.flush()
            .map_err(|e| StorageError::Compaction(e.to_string()))?;
        Ok(())
    }
}

impl std::fmt::Debug for RocksDbKvStore {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("RocksDbKvStore")
            .field("path", &self.path)
            .field("wal_dir", &self.wal_dir)
            .field("open", &self.db.is_some())
            .finish()
    }
}

impl WriteBatch for RocksDbWriteBatch {
    fn put(
        &mut self,
        key: &[u8],
        value: &[u8],
    ) {
        self.batch.put(key, value);
        self.count += 1;
    }

    fn delete(
        &mut self,
        key: &[u8],
    ) {
        self.batch.delete(key);
        self.count += 1;
    }

    fn count(&self) -> usize {
        self.count
    }

    fn clear(&mut self) {
        self.batch.clear();
        self.count = 0;
    }
}

impl std::fmt::Debug for RocksDbWriteBatch {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("RocksDbWriteBatch")
            .field("count", &self.count)
            .finish()
    }
}

impl KvIterator for RocksDbKvIterator<'_> {
    fn seek(
        &mut self,
        key: &[u8],
    ) {
        self.inner.seek(key);
    }

    fn valid(&self) -> bool {
        self.inner.valid()
    }

    fn next(&mut self) {
        self.inner.next();
    }

    fn key(&self) -> &[u8] {
        self.inner.key().unwrap_or_default()
    }

    fn value(&self) -> &[u8] {
        self.inner.value().unwrap_or_default()
    }

    fn status(&self) -> Result<()> {
        self.inner
            .status()
            .map_err(|e| StorageError::Read(e.to_string()).into())
    }
}
