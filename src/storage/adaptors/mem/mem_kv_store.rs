use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::RwLock;
use tracing::info;
use tracing::trace;

use crate::constants::MEMORY_ENGINE_NAME;
use crate::KvIterator;
use crate::KvStore;
use crate::Result;
use crate::WriteBatch;

type MemTable = BTreeMap<Vec<u8>, Vec<u8>>;

/// Volatile key-value store on a `BTreeMap`.
///
/// The table is copy-on-write: cursors pin the current `Arc` at `seek`, and a
/// commit applies all its ops under one write lock, cloning the table first
/// if a cursor still holds it. A scan therefore sees a commit entirely or not
/// at all. Durability is not provided: data lives as long as the store.
#[derive(Debug, Default)]
pub struct MemKvStore {
    data: RwLock<Arc<MemTable>>,
    closed: AtomicBool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum MemOp {
    Put(Vec<u8>, Vec<u8>),
    Delete(Vec<u8>),
}

/// Batch for [`MemKvStore`]; `clear` keeps the allocated capacity.
#[derive(Debug, Default)]
pub struct MemWriteBatch {
    pub(crate) ops: Vec<MemOp>,
}

/// Cursor for [`MemKvStore`].
///
/// Reads from the table snapshot taken by the last `seek`. No lock is held
/// between steps, so visitors may write to the same store; those writes are
/// not visible to the running scan.
#[derive(Debug)]
pub struct MemKvIterator<'a> {
    data: &'a RwLock<Arc<MemTable>>,
    snapshot: Option<Arc<MemTable>>,
    current: Option<(Vec<u8>, Vec<u8>)>,
}

impl MemKvStore {
    pub fn new() -> Self {
        info!("open in-memory kv store");
        Self::default()
    }

    fn ensure_open(&self) {
        if self.closed.load(Ordering::Acquire) {
            panic!("memory kv store used after close");
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.data.read().len()
    }
}

impl KvStore for MemKvStore {
    type Batch = MemWriteBatch;
    type Iter<'a> = MemKvIterator<'a>;

    fn name(&self) -> &'static str {
        MEMORY_ENGINE_NAME
    }

    fn close(&mut self) -> Result<()> {
        if !self.closed.swap(true, Ordering::AcqRel) {
            *self.data.write() = Arc::default();
            info!("closed in-memory kv store");
        }
        Ok(())
    }

    fn iter(&self) -> Self::Iter<'_> {
        self.ensure_open();
        MemKvIterator {
            data: &self.data,
            snapshot: None,
            current: None,
        }
    }

    fn get(
        &self,
        key: &[u8],
    ) -> Result<Option<Bytes>> {
        self.ensure_open();
        Ok(self.data.read().get(key).map(|v| Bytes::copy_from_slice(v)))
    }

    fn put(
        &self,
        key: &[u8],
        value: &[u8],
    ) -> Result<()> {
        self.ensure_open();
        Arc::make_mut(&mut self.data.write()).insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(
        &self,
        key: &[u8],
    ) -> Result<()> {
        self.ensure_open();
        Arc::make_mut(&mut self.data.write()).remove(key);
        Ok(())
    }

    fn new_write_batch(&self) -> Self::Batch {
        MemWriteBatch::default()
    }

    fn commit(
        &self,
        batch: &mut Self::Batch,
    ) -> Result<()> {
        self.ensure_open();
        trace!("commit {} ops", batch.ops.len());

        let mut guard = self.data.write();
        let data = Arc::make_mut(&mut guard);
        for op in batch.ops.drain(..) {
            match op {
                MemOp::Put(key, value) => {
                    data.insert(key, value);
                }
                MemOp::Delete(key) => {
                    data.remove(&key);
                }
            }
        }
        Ok(())
    }

    fn compact_storage(
        &self,
        _from: &[u8],
        _to: &[u8],
    ) -> Result<()> {
        self.ensure_open();
        trace!("MemKvStore compact_storage (no-op)");
        Ok(())
    }
}

impl WriteBatch for MemWriteBatch {
    fn put(
        &mut self,
        key: &[u8],
        value: &[u8],
    ) {
        self.ops.push(MemOp::Put(key.to_vec(), value.to_vec()));
    }

    fn delete(
        &mut self,
        key: &[u8],
    ) {
        self.ops.push(MemOp::Delete(key.to_vec()));
    }

    fn count(&self) -> usize {
        self.ops.len()
    }

    fn clear(&mut self) {
        self.ops.clear();
    }
}

impl MemKvIterator<'_> {
    fn position(
        &mut self,
        lower: Bound<&[u8]>,
    ) {
        self.current = self.snapshot.as_ref().and_then(|data| {
            data.range::<[u8], _>((lower, Bound::Unbounded))
                .next()
                .map(|(k, v)| (k.clone(), v.clone()))
        });
    }
}

impl KvIterator for MemKvIterator<'_> {
    fn seek(
        &mut self,
        key: &[u8],
    ) {
        self.snapshot = Some(self.data.read().clone());
        self.position(Bound::Included(key));
    }

    fn valid(&self) -> bool {
        self.current.is_some()
    }

    fn next(&mut self) {
        if let Some((key, _)) = self.current.take() {
            self.position(Bound::Excluded(key.as_slice()));
        }
    }

    fn key(&self) -> &[u8] {
        match &self.current {
            Some((key, _)) => key,
            None => &[],
        }
    }

    fn value(&self) -> &[u8] {
        match &self.current {
            Some((_, value)) => value,
            None => &[],
        }
    }

    fn status(&self) -> Result<()> {
        Ok(())
    }
}
