//! Infrastructure layer: adapters for the domain traits.

pub mod auth;
pub mod broker;
pub mod cache;
pub mod dto;
pub mod message_pusher;
pub mod repository;
