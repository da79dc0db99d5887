//! Broker の実装
//!
//! - `in_process`: `tokio::sync::broadcast` による単一プロセス実装
//! - `redis_pubsub`: Redis Pub/Sub による複数プロセス実装（`redis` feature）

pub mod in_process;
#[cfg(feature = "redis")]
pub mod redis_pubsub;

pub use in_process::{DEFAULT_BROKER_CAPACITY, InProcessBroker};
#[cfg(feature = "redis")]
pub use redis_pubsub::RedisBroker;
