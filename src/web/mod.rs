//! HTTP gateway over the execution dispatcher

pub mod handlers;
pub mod models;
pub mod server;
