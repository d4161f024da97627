//! Pushbeam client library
//!
//! Offline-tolerant HTTP client for devices talking to a pushbeam server (or
//! any HTTP API): POSTs that fail at the transport layer are captured into
//! the durable outbox and replayed, in order, on the next sync trigger.

pub mod capture;
pub mod transport;

pub use capture::{OfflineClient, SubmitStatus};
pub use transport::HttpReplayTransport;
