//! Response cache implementations.

pub mod inmemory;

pub use inmemory::InMemoryResponseCache;
