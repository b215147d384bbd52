use std::path::Path;
use std::path::PathBuf;

use bytes::Bytes;
use parking_lot::RwLock;
use parking_lot::RwLockReadGuard;
use sled::Batch;
use sled::IVec;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::instrument;
use tracing::trace;
use tracing::warn;

use crate::constants::SLED_ENGINE_NAME;
use crate::constants::SLED_KV_TREE;
use crate::KvIterator;
use crate::KvStore;
use crate::Result;
use crate::SledTuning;
use crate::StorageError;
use crate::WriteBatch;

struct SledHandle {
    db: sled::Db,
    tree: sled::Tree,
}

/// Sled-based key-value store.
///
/// Every point write and commit is followed by a `flush`, which fsyncs the
/// sled log before returning. Sled keeps its log next to its data, so a
/// separate WAL directory is not supported.
///
/// `sled::Tree::range` has no point-in-time view, so each cursor holds the
/// read side of `commit_gate` and `commit` applies under the write side.
/// A scan sees a batch entirely or not at all. A visitor may do point writes
/// but must not commit a batch to the store it is scanning.
pub struct SledKvStore {
    handle: Option<SledHandle>,
    commit_gate: RwLock<()>,
    path: PathBuf,
}

/// Batch for [`SledKvStore`], applied with `Tree::apply_batch`
#[derive(Debug, Default)]
pub struct SledWriteBatch {
    batch: Batch,
    count: usize,
}

/// Cursor for [`SledKvStore`].
///
/// Wraps a lazy `Tree::range` scan. A scan fault is kept and reported by
/// `status()`. Batch commits wait until the cursor is dropped.
pub struct SledKvIterator<'a> {
    _commit_gate: RwLockReadGuard<'a, ()>,
    tree: sled::Tree,
    iter: Option<sled::Iter>,
    current: Option<(IVec, IVec)>,
    error: Option<String>,
}

fn open_error(
    path: &Path,
    e: sled::Error,
) -> StorageError {
    warn!("Try to open DB at this location: {:?} and failed: {:?}", path, e);
    StorageError::Open {
        engine: SLED_ENGINE_NAME,
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}

/// A failed flush after the data is already applied: the change is visible
/// but may not survive a crash.
pub(crate) fn durability_error(e: sled::Error) -> StorageError {
    error!("sled flush failed: {:?}", e);
    StorageError::Write(format!("applied but not durable: {}", e))
}

impl SledKvStore {
    /// Opens or creates a sled store rooted at `dir`.
    pub fn open(
        dir: impl AsRef<Path>,
        wal_dir: Option<&Path>,
        tuning: &SledTuning,
    ) -> Result<Self> {
        let path = dir.as_ref();
        debug!("open sled kv store from path: {:?}", path);

        if let Some(wal_dir) = wal_dir {
            warn!(
                "sled keeps its log inside {:?}, ignoring wal_dir {:?}",
                path, wal_dir
            );
        }

        let db = sled::Config::default()
            .path(path)
            .cache_capacity(tuning.cache_capacity)
            .use_compression(tuning.use_compression)
            .open()
            .map_err(|e| open_error(path, e))?;
        let tree = db.open_tree(SLED_KV_TREE).map_err(|e| open_error(path, e))?;

        info!("opened sled kv store at {:?}", path);

        Ok(Self {
            handle: Some(SledHandle { db, tree }),
            commit_gate: RwLock::new(()),
            path: path.to_path_buf(),
        })
    }

    fn tree(&self) -> &sled::Tree {
        match &self.handle {
            Some(handle) => &handle.tree,
            None => panic!("sled kv store at {:?} used after close", self.path),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KvStore for SledKvStore {
    type Batch = SledWriteBatch;
    type Iter<'a> = SledKvIterator<'a>;

    fn name(&self) -> &'static str {
        SLED_ENGINE_NAME
    }

    fn close(&mut self) -> Result<()> {
        if let Some(handle) = self.handle.take() {
            handle
                .db
                .flush()
                .map_err(|e| StorageError::Write(e.to_string()))?;
            info!("closed sled kv store at {:?}", self.path);
        }
        Ok(())
    }

    fn iter(&self) -> Self::Iter<'_> {
        let tree = self.tree().clone();
        SledKvIterator {
            // recursive so nested scans on one thread never queue behind a commit
            _commit_gate: self.commit_gate.read_recursive(),
            tree,
            iter: None,
            current: None,
            error: None,
        }
    }

    #[instrument(skip(self))]
    fn get(
        &self,
        key: &[u8],
    ) -> Result<Option<Bytes>> {
        match self
            .tree()
            .get(key)
            .map_err(|e| StorageError::Read(e.to_string()))?
        {
            Some(ivec) => Ok(Some(Bytes::copy_from_slice(ivec.as_ref()))),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, value))]
    fn put(
        &self,
        key: &[u8],
        value: &[u8],
    ) -> Result<()> {
        let tree = self.tree();
        tree.insert(key, value)
            .map_err(|e| StorageError::Write(e.to_string()))?;
        tree.flush().map_err(durability_error)?;
        Ok(())
    }

    #[instrument(skip(self))]
    fn delete(
        &self,
        key: &[u8],
    ) -> Result<()> {
        let tree = self.tree();
        tree.remove(key)
            .map_err(|e| StorageError::Write(e.to_string()))?;
        tree.flush().map_err(durability_error)?;
        Ok(())
    }

    fn new_write_batch(&self) -> Self::Batch {
        SledWriteBatch::default()
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

        let tree = self.tree();
        {
            let _gate = self.commit_gate.write();
            tree.apply_batch(staged).map_err(|e| {
                error!("apply_batch failed: {:?}", e);
                StorageError::Commit(e.to_string())
            })?;
        }
        tree.flush().map_err(durability_error)?;
        Ok(())
    }

    fn compact_storage(
        &self,
        from: &[u8],
        to: &[u8],
    ) -> Result<()> {
        // sled merges and frees pages by itself; persisting is all we can ask
        trace!(
            "sled compact_storage [{} bytes, {} bytes]",
            from.len(),
            to.len()
        );
        self.tree()
            .flush()
            .map_err(|e| StorageError::Compaction(e.to_string()))?;
        Ok(())
    }
}

impl std::fmt::Debug for SledKvStore {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("SledKvStore")
            .field("path", &self.path)
            .field("open", &self.handle.is_some())
            .finish()
    }
}

impl Drop for SledKvStore {
    fn drop(&mut self) {
        if let Some(handle) = &self.handle {
            match handle.db.flush() {
                Ok(_) => trace!("flushed sled kv store on drop"),
                Err(e) => error!(?e, "Failed to flush sled kv store on drop"),
            }
        }
    }
}

impl WriteBatch for SledWriteBatch {
    fn put(
        &mut self,
        key: &[u8],
        value: &[u8],
    ) {
        self.batch.insert(key, value);
        self.count += 1;
    }

    fn delete(
        &mut self,
        key: &[u8],
    ) {
        self.batch.remove(key);
        self.count += 1;
    }

    fn count(&self) -> usize {
        self.count
    }

    fn clear(&mut self) {
        self.batch = Batch::default();
        self.count = 0;
    }
}

impl SledKvIterator<'_> {
    fn advance(&mut self) {
        self.current = None;
        match self.iter.as_mut().and_then(|iter| iter.next()) {
            Some(Ok(pair)) => self.current = Some(pair),
            Some(Err(e)) => {
                error!("sled range scan failed: {:?}", e);
                self.error = Some(e.to_string());
            }
            None => {}
        }
    }
}

impl KvIterator for SledKvIterator<'_> {
    fn seek(
        &mut self,
        key: &[u8],
    ) {
        self.error = None;
        self.iter = Some(self.tree.range(key.to_vec()..));
        self.advance();
    }

    fn valid(&self) -> bool {
        self.current.is_some()
    }

    fn next(&mut self) {
        self.advance();
    }

    fn key(&self) -> &[u8] {
        self.current.as_ref().map(|(k, _)| k.as_ref()).unwrap_or_default()
    }

    fn value(&self) -> &[u8] {
        self.current.as_ref().map(|(_, v)| v.as_ref()).unwrap_or_default()
    }

    fn status(&self) -> Result<()> {
        match &self.error {
            Some(reason) => Err(StorageError::Read(reason.clone()).into()),
            None => Ok(()),
        }
    }
}
