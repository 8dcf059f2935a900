//! Infrastructure layer: document stores, outbound mail, configuration, and
//! the application services composed from them.

pub mod config;
pub mod mailer;
pub mod services;
pub mod store;
