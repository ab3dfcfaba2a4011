//! WebSocket host for round sessions

pub mod handler;
pub mod protocol;
pub mod sink;
