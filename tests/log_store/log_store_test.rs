use logdb_kv::BatchSlot;
use logdb_kv::EngineKind;
use logdb_kv::KvStore;
use logdb_kv::WriteBatch;
use tempfile::TempDir;

use crate::common::engines;
use crate::common::entry_index;
use crate::common::entry_key;
use crate::common::open_engine;
use crate::common::HARD_STATE_KEY;

#[test]
fn test_put_iterate_delete_range_scenario() {
    for kind in engines() {
        let dir = TempDir::new().unwrap();
        let store = open_engine(kind, dir.path()).unwrap();

        store.put(b"k1", b"v1").unwrap();
        store.put(b"k2", b"v2").unwrap();
        store.put(b"k3", b"v3").unwrap();

        let mut visited = Vec::new();
        store
            .iterate(b"k1", b"k3", true, |k, v| {
                visited.push((k.to_vec(), v.to_vec()));
                Ok(true)
            })
            .unwrap();
        assert_eq!(
            visited,
            vec![
                (b"k1".to_vec(), b"v1".to_vec()),
                (b"k2".to_vec(), b"v2".to_vec()),
                (b"k3".to_vec(), b"v3".to_vec()),
            ],
            "engine {}",
            kind
        );

        store.delete_range(b"k1", b"k3").unwrap();
        assert!(store.get(b"k1").unwrap().is_none(), "engine {}", kind);
        assert!(store.get(b"k2").unwrap().is_none(), "engine {}", kind);
        assert_eq!(store.get(b"k3").unwrap().as_deref(), Some(&b"v3"[..]), "engine {}", kind);
    }
}

#[test]
fn test_batch_put_then_delete_same_key() {
    for kind in engines() {
        let dir = TempDir::new().unwrap();
        let store = open_engine(kind, dir.path()).unwrap();

        let mut batch = store.new_write_batch();
        batch.put(b"key", b"value");
        batch.delete(b"key");
        assert_eq!(batch.count(), 2);
        store.commit(&mut batch).unwrap();

        assert!(store.get(b"key").unwrap().is_none(), "engine {}", kind);
    }
}

#[test]
fn test_append_and_truncate_log_prefix() {
    for kind in engines() {
        let dir = TempDir::new().unwrap();
        let store = open_engine(kind, dir.path()).unwrap();
        let mut slot = BatchSlot::new();

        // three appends of ten entries, each with the hard state in the same batch
        for round in 0..3u64 {
            let mut batch = store.get_write_batch(Some(&mut slot));
            for index in round * 10 + 1..=round * 10 + 10 {
                batch.put(&entry_key(index), format!("entry-{}", index).as_bytes());
            }
            batch.put(HARD_STATE_KEY, &(round * 10 + 10).to_be_bytes());
            store.commit(&mut batch).unwrap();
            slot.put_back(batch);
        }

        // snapshot covers up to index 15
        store.compact_range(&entry_key(1), &entry_key(16)).unwrap();

        let mut indexes = Vec::new();
        store
            .iterate(&entry_key(0), &entry_key(u64::MAX), true, |k, v| {
                let index = entry_index(k);
                assert_eq!(v, format!("entry-{}", index).as_bytes());
                indexes.push(index);
                Ok(true)
            })
            .unwrap();
        assert_eq!(indexes, (16..=30).collect::<Vec<_>>(), "engine {}", kind);

        store
            .get_value(HARD_STATE_KEY, |v| {
                assert_eq!(v, Some(&30u64.to_be_bytes()[..]));
                Ok(())
            })
            .unwrap();

        store.full_compaction().unwrap();
        assert!(store.get(&entry_key(16)).unwrap().is_some());
    }
}

#[test]
fn test_read_from_index_stops_early() {
    for kind in engines() {
        let dir = TempDir::new().unwrap();
        let store = open_engine(kind, dir.path()).unwrap();

        let mut batch = store.new_write_batch();
        for index in 1..=100u64 {
            batch.put(&entry_key(index), b"payload");
        }
        store.commit(&mut batch).unwrap();

        let mut read = Vec::new();
        store
            .iterate(&entry_key(40), &entry_key(u64::MAX), true, |k, _| {
                read.push(entry_index(k));
                Ok(read.len() < 5)
            })
            .unwrap();
        assert_eq!(read, vec![40, 41, 42, 43, 44], "engine {}", kind);
    }
}

#[test]
fn test_persistent_engines_survive_reopen() {
    for kind in engines().into_iter().filter(|k| *k != EngineKind::Memory) {
        let dir = TempDir::new().unwrap();

        {
            let mut store = open_engine(kind, dir.path()).unwrap();
            let mut batch = store.new_write_batch();
            for index in 1..=20u64 {
                batch.put(&entry_key(index), b"payload");
            }
            store.commit(&mut batch).unwrap();
            store.delete_range(&entry_key(1), &entry_key(6)).unwrap();
            store.close().unwrap();
        }

        let store = open_engine(kind, dir.path()).unwrap();
        let mut count = 0;
        store
            .iterate(&entry_key(0), &entry_key(u64::MAX), true, |k, _| {
                assert!(entry_index(k) >= 6);
                count += 1;
                Ok(true)
            })
            .unwrap();
        assert_eq!(count, 15, "engine {}", kind);
    }
}
