//! Engine adaptors behind [`crate::KvStore`].

/// Volatile `BTreeMap` engine
pub mod mem;
pub use mem::*;

/// Sled engine; experimental
pub mod sled;
pub use sled::*;

/// RocksDB engine
#[cfg(feature = "rocksdb")]
pub mod rocksdb;

#[cfg(feature = "rocksdb")]
pub use rocksdb::*;
