//! Event chat server UI layer (HTTP / WebSocket).

pub mod handler;
pub mod middleware;
pub mod server;
pub mod session;
mod signal;
pub mod state;

pub use server::{Server, ServerError, build_router};
pub use session::{ChatSession, SessionState};
pub use state::{AppDependencies, AppState, ChatConfig, HistoryConfig};
