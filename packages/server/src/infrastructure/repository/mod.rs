//! Repository / MessageStore の実装
//!
//! - `inmemory`: プロセス内メモリ
//! - `file`: JSON Lines ファイル（メッセージログのみ）

pub mod file;
pub mod inmemory;

pub use file::FileMessageStore;
pub use inmemory::{InMemoryEventRepository, InMemoryMessageStore, InMemoryUserRepository};
