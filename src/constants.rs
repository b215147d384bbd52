/// Upper bound on key length; also the width of the full-keyspace sentinels.
pub const MAX_KEY_LENGTH: usize = 1024;

/// Engine names reported by `KvStore::name`
pub(crate) const SLED_ENGINE_NAME: &str = "sled";
pub(crate) const ROCKSDB_ENGINE_NAME: &str = "rocksdb";
pub(crate) const MEMORY_ENGINE_NAME: &str = "memory";

/// Sled tree holding all key-value pairs of a store
pub(crate) const SLED_KV_TREE: &str = "_logdb_kv";

/// Prefix for environment variable overrides, e.g. `KVSTORE__ENGINE=memory`
pub(crate) const CONFIG_ENV_PREFIX: &str = "KVSTORE";
