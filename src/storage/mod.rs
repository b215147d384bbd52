mod adaptors;
mod engine;
mod experimental;
mod kv_iterator;
mod kv_store;

#[cfg(test)]
mod experimental_test;

pub use adaptors::*;
pub use engine::*;
pub(crate) use experimental::EXPERIMENTAL_ENGINE_NOTICE;
pub use kv_iterator::*;
pub use kv_store::*;
