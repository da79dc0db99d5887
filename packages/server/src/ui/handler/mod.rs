//! Request handlers.

pub mod http;
pub mod websocket;

pub use http::{
    ApiError, create_event, get_event, health_check, join_event, leave_event, list_events, login,
    register_user,
};
pub use websocket::chat_handler;
