//! Tsudoi server: event catalog and real-time event chat.
//!
//! - `domain`: value objects, entities and the traits the core depends on
//! - `usecase`: one use case per operation
//! - `infrastructure`: stores, brokers, connection registry, dispatcher, auth, cache, DTOs
//! - `ui`: axum router, middleware, WebSocket chat sessions

pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
