use super::*;
use crate::storage::kv_store_test::KvStoreBuilder;
use crate::storage::kv_store_test::KvStoreTestSuite;
use crate::Error;
use crate::KvIterator;
use crate::KvStore;
use crate::WriteBatch;

struct MemKvStoreBuilder;

impl KvStoreBuilder for MemKvStoreBuilder {
    type Store = MemKvStore;

    fn build(&self) -> Result<Self::Store, Error> {
        Ok(MemKvStore::new())
    }
}

#[test]
fn test_mem_kv_store_contract() -> Result<(), Error> {
    KvStoreTestSuite::run_all_tests(&MemKvStoreBuilder)
}

#[test]
fn test_batch_records_ops_in_insertion_order() {
    let store = MemKvStore::new();
    let mut batch = store.new_write_batch();
    batch.put(b"a", b"1");
    batch.delete(b"a");

    assert_eq!(
        batch.ops,
        vec![MemOp::Put(b"a".to_vec(), b"1".to_vec()), MemOp::Delete(b"a".to_vec())]
    );
}

#[test]
fn test_clear_keeps_capacity() {
    let store = MemKvStore::new();
    let mut batch = store.new_write_batch();
    for i in 0..64u8 {
        batch.put(&[i], &[i]);
    }
    let capacity = batch.ops.capacity();

    batch.clear();
    assert_eq!(batch.count(), 0);
    assert_eq!(batch.ops.capacity(), capacity);
}

#[test]
fn test_cursor_reads_from_seek_snapshot() {
    let store = MemKvStore::new();
    store.put(b"a", b"1").unwrap();
    store.put(b"c", b"3").unwrap();

    let mut iter = store.iter();
    iter.seek(b"a");
    assert!(iter.valid());
    assert_eq!(iter.key(), b"a");

    // writes after seek go to a fresh copy of the table
    store.put(b"b", b"2").unwrap();
    store.put(b"c", b"30").unwrap();
    iter.next();
    assert!(iter.valid());
    assert_eq!(iter.key(), b"c");
    assert_eq!(iter.value(), b"3");
    iter.next();
    assert!(!iter.valid());
    assert!(iter.status().is_ok());

    assert_eq!(store.get(b"b").unwrap().as_deref(), Some(&b"2"[..]));

    // a new seek picks up the latest table
    iter.seek(b"b");
    assert_eq!(iter.key(), b"b");
    iter.next();
    assert_eq!(iter.value(), b"30");
}

#[test]
fn test_commit_while_cursor_open_keeps_cursor_view() {
    let store = MemKvStore::new();
    let mut batch = store.new_write_batch();
    for i in 0..10u8 {
        batch.put(&[i], b"old");
    }
    store.commit(&mut batch).unwrap();

    let mut iter = store.iter();
    iter.seek(&[0]);
    for i in 0..10u8 {
        batch.put(&[i], b"new");
    }
    store.commit(&mut batch).unwrap();

    let mut seen = 0;
    while iter.valid() {
        assert_eq!(iter.value(), b"old");
        seen += 1;
        iter.next();
    }
    assert_eq!(seen, 10);
    assert_eq!(store.get(&[9]).unwrap().as_deref(), Some(&b"new"[..]));
}

#[test]
fn test_close_is_idempotent() {
    let mut store = MemKvStore::new();
    store.put(b"k", b"v").unwrap();
    assert_eq!(store.len(), 1);

    store.close().unwrap();
    store.close().unwrap();
}

#[test]
#[should_panic(expected = "used after close")]
fn test_use_after_close_panics() {
    let mut store = MemKvStore::new();
    store.close().unwrap();
    let _ = store.get(b"k");
}
