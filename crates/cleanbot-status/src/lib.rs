//! Liveness surface: a tiny read-only HTTP status server and the periodic
//! self-ping that keeps hosted instances awake.

pub mod keepalive;
pub mod server;

pub use keepalive::KeepAlive;
pub use server::{router, serve, StatusState};
