mod rocksdb_kv_store;

pub use rocksdb_kv_store::*;
