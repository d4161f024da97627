//! Pushbeam server library
//!
//! Router construction and the HTTP push provider live here so the binary
//! stays a thin entry point and integration tests can drive the real routes.

pub mod provider;
pub mod routes;

pub use provider::HttpPushProvider;
pub use routes::{router, AppState};
