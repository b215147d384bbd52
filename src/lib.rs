//! Pluggable key-value storage for a Raft log database.
//!
//! The log database stores entries, hard state and snapshot metadata as
//! ordered byte keys. This crate provides the store underneath it:
//!
//! - [`KvStore`]: durable point operations, atomic [`WriteBatch`] commits,
//!   ordered range iteration, range deletion and compaction
//! - Engines: [`SledKvStore`] (default, experimental), [`RocksDbKvStore`]
//!   (`rocksdb` feature) and [`MemKvStore`]
//! - [`KvEngine`]: the engine picked from a [`KvConfig`]
//!
//! ```ignore
//! use logdb_kv::{KvConfig, KvEngine, KvStore, WriteBatch};
//!
//! let config = KvConfig::load(Some("config/kv.toml"))?;
//! let store = KvEngine::from_config(&config)?;
//!
//! let mut batch = store.new_write_batch();
//! batch.put(b"entry-1", b"payload");
//! store.commit(&mut batch)?;
//! store.compact_range(b"entry-0", b"entry-1")?;
//! ```

mod config;
mod constants;
mod errors;
mod storage;


pub use config::*;
pub use constants::MAX_KEY_LENGTH;
pub use errors::*;
pub use storage::*;
