use std::path::Path;

use logdb_kv::EngineKind;
use logdb_kv::KvConfig;
use logdb_kv::KvEngine;
use logdb_kv::Result;
use logdb_kv::SledTuning;

/// Key prefix for log entries, as laid out by the log database
pub const ENTRY_PREFIX: u8 = 0x01;
/// Key of the persisted hard state
pub const HARD_STATE_KEY: &[u8] = b"\x00hard_state";

/// Log entry key: prefix byte followed by the big-endian index
pub fn entry_key(index: u64) -> [u8; 9] {
    let mut key = [0u8; 9];
    key[0] = ENTRY_PREFIX;
    key[1..].copy_from_slice(&index.to_be_bytes());
    key
}

pub fn entry_index(key: &[u8]) -> u64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&key[1..9]);
    u64::from_be_bytes(raw)
}

/// Engines exercised by every integration test
pub fn engines() -> Vec<EngineKind> {
    let mut kinds = vec![EngineKind::Memory, EngineKind::Sled];
    if cfg!(feature = "rocksdb") {
        kinds.push(EngineKind::RocksDb);
    }
    kinds
}

pub fn test_config(engine: EngineKind) -> KvConfig {
    KvConfig {
        engine,
        sled: SledTuning {
            cache_capacity: 8 * 1024 * 1024,
            use_compression: false,
        },
        ..KvConfig::default()
    }
}

pub fn open_engine(
    engine: EngineKind,
    dir: &Path,
) -> Result<KvEngine> {
    KvEngine::open(&test_config(engine), dir.join(engine.name()), None)
}
