//! インメモリ実装

pub mod event;
pub mod message_store;
pub mod user;

pub use event::InMemoryEventRepository;
pub use message_store::InMemoryMessageStore;
pub use user::InMemoryUserRepository;
