mod mem_kv_store;

pub use mem_kv_store::*;

#[cfg(test)]
mod mem_kv_store_test;
