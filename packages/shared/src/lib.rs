//! Shared utilities for the Tsudoi packages.

pub mod logger;
pub mod time;
