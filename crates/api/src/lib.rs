//! HTTP API: router, session verification, and request/response mapping.

pub mod app;
pub mod context;
pub mod middleware;
