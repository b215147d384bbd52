use bytes::Bytes;
#[cfg(test)]
use mockall::automock;
use tracing::debug;

use super::full_key_range;
use super::iterate_range;
use super::stage_range_deletes;
use super::KvIterator;
use crate::Result;

/// Durable ordered key-value store backing a Raft log database.
///
/// Design principles:
/// - Static dispatch: each engine names its own batch and cursor types, so a
///   batch can only ever be committed to the engine that created it
/// - Every point write, delete and batch commit is synchronous and durable
///   before returning `Ok`
/// - Range operations are built from the ordered cursor and a write batch;
///   engines only implement the primitives
///
/// # Caller contract
/// After [`KvStore::close`] the store must not be used again. Doing so is a
/// programming error and panics.
pub trait KvStore: Send + Sync + 'static {
    /// Engine-specific staging area for atomic commits
    type Batch: WriteBatch;

    /// Engine-specific forward cursor
    type Iter<'a>: KvIterator
    where
        Self: 'a;

    /// Engine name, e.g. `"sled"`
    fn name(&self) -> &'static str;

    /// Releases the engine. A second call is a no-op.
    fn close(&mut self) -> Result<()>;

    /// Fresh, unpositioned cursor. Call [`KvIterator::seek`] before reading.
    fn iter(&self) -> Self::Iter<'_>;

    /// Point read. A missing key is `Ok(None)`, not an error.
    fn get(
        &self,
        key: &[u8],
    ) -> Result<Option<Bytes>>;

    /// Durable point write
    fn put(
        &self,
        key: &[u8],
        value: &[u8],
    ) -> Result<()>;

    /// Durable point delete. Deleting a missing key succeeds.
    fn delete(
        &self,
        key: &[u8],
    ) -> Result<()>;

    fn new_write_batch(&self) -> Self::Batch;

    /// Atomically and durably applies every staged operation in insertion
    /// order.
    ///
    /// The batch is drained by the call, success or not, and can be refilled
    /// right away.
    ///
    /// # Errors
    /// - [`StorageError::Commit`]: nothing was applied; the store is unchanged.
    /// - [`StorageError::Write`]: the batch was applied and is visible, but
    ///   syncing it to disk failed, so it may not survive a crash.
    ///
    /// [`StorageError::Commit`]: crate::StorageError::Commit
    /// [`StorageError::Write`]: crate::StorageError::Write
    fn commit(
        &self,
        batch: &mut Self::Batch,
    ) -> Result<()>;

    /// Asks the engine to reclaim space for `[from, to]`. Advisory: data is
    /// never affected, only space and read amplification.
    fn compact_storage(
        &self,
        from: &[u8],
        to: &[u8],
    ) -> Result<()>;

    /// Callback-style point read; `op` receives `None` for a missing key and
    /// its error is returned unchanged.
    fn get_value<F>(
        &self,
        key: &[u8],
        op: F,
    ) -> Result<()>
    where
        F: FnOnce(Option<&[u8]>) -> Result<()>,
    {
        let value = self.get(key)?;
        op(value.as_deref())
    }

    /// Returns the batch cached in `slot` (cleared) or a new one.
    fn get_write_batch(
        &self,
        slot: Option<&mut BatchSlot<Self::Batch>>,
    ) -> Self::Batch {
        match slot.and_then(BatchSlot::take) {
            Some(mut batch) => {
                batch.clear();
                batch
            }
            None => self.new_write_batch(),
        }
    }

    /// Visits every pair with `from <= key` and `key <= to` (inclusive) or
    /// `key < to` (exclusive), in byte order. `op` returns `Ok(false)` to stop
    /// early; its error stops the scan and is returned unchanged.
    fn iterate<F>(
        &self,
        from: &[u8],
        to: &[u8],
        inclusive: bool,
        op: F,
    ) -> Result<()>
    where
        F: FnMut(&[u8], &[u8]) -> Result<bool>,
    {
        let mut iter = self.iter();
        iterate_range(&mut iter, from, to, inclusive, op)
    }

    /// Removes every key in `[from, to)` with a single atomic commit.
    /// An empty range is a no-op.
    fn delete_range(
        &self,
        from: &[u8],
        to: &[u8],
    ) -> Result<()> {
        let mut batch = self.new_write_batch();
        {
            let mut iter = self.iter();
            stage_range_deletes(&mut iter, from, to, &mut batch)?;
        }

        if batch.count() == 0 {
            return Ok(());
        }

        debug!(engine = self.name(), count = batch.count(), "delete_range");
        self.commit(&mut batch)
    }

    /// Extension point for engine-specific bulk deletion of `[from, to)`.
    /// No engine implements a fast path yet; callers must not rely on it
    /// removing anything.
    fn bulk_remove_entries(
        &self,
        _from: &[u8],
        _to: &[u8],
    ) -> Result<()> {
        Ok(())
    }

    /// Deletes `[from, to)` and then compacts that range.
    fn compact_range(
        &self,
        from: &[u8],
        to: &[u8],
    ) -> Result<()> {
        self.delete_range(from, to)?;
        self.compact_storage(from, to)
    }

    /// Compacts the whole key space between the all-zero and all-0xFF keys of
    /// [`crate::MAX_KEY_LENGTH`] bytes.
    fn full_compaction(&self) -> Result<()> {
        let (first, last) = full_key_range();
        debug!(engine = self.name(), "full_compaction");
        self.compact_storage(&first, &last)
    }
}

/// Staged mutations for one atomic commit.
///
/// Staging never fails for valid input; an engine that cannot stage an
/// operation panics. Dropping the batch releases its resources.
#[cfg_attr(test, automock)]
pub trait WriteBatch: Send {
    fn put(
        &mut self,
        key: &[u8],
        value: &[u8],
    );

    fn delete(
        &mut self,
        key: &[u8],
    );

    /// Number of staged operations
    fn count(&self) -> usize;

    /// Drops staged operations while keeping the batch for reuse
    fn clear(&mut self);
}

/// Holds a write batch between transactions so a hot append path does not
/// allocate a new one per commit.
#[derive(Debug)]
pub struct BatchSlot<B> {
    batch: Option<B>,
}

impl<B> Default for BatchSlot<B> {
    fn default() -> Self {
        Self { batch: None }
    }
}

impl<B> BatchSlot<B> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_back(
        &mut self,
        batch: B,
    ) {
        self.batch = Some(batch);
    }

    pub fn take(&mut self) -> Option<B> {
        self.batch.take()
    }

    pub fn is_empty(&self) -> bool {
        self.batch.is_none()
    }
}
