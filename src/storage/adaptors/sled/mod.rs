mod sled_kv_store;

pub use sled_kv_store::*;
