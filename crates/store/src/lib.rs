//! Durable key-value storage and the TTL cache wrapper on top of it.

pub mod kv;
pub mod ttl;

pub use kv::{FileStore, KvStore, MemoryStore};
pub use ttl::{wall_clock_ms, Clock, TtlCache};
