//! Pushbeam Core Library
//!
//! Push message delivery with offline replay.
//!
//! ## Overview
//!
//! Pushbeam delivers notifications to every device a user has registered and
//! guarantees that client requests composed while offline are not lost but
//! replayed once connectivity returns. Two engines share this crate:
//!
//! - **Server side**: a durable [`SubscriptionRegistry`] (user → endpoint
//!   set) and a concurrent fan-out [`Dispatcher`] that delivers through a
//!   black-box [`PushProvider`] and prunes endpoints the provider reports as
//!   permanently gone.
//! - **Client side**: a durable [`OutboxStore`] of captured requests and a
//!   [`ReplayController`] that drains it, in enqueue order, when a sync
//!   trigger fires.
//!
//! ## Core Principles
//!
//! - **At-least-once**: delivery to a device may repeat; it is never lost
//!   silently
//! - **Partial success is normal**: per-endpoint failures are report entries,
//!   not call errors
//! - **Nothing removed speculatively**: outbox entries and subscriptions only
//!   disappear on confirmed outcomes
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use pushbeam_core::{
//!     Dispatcher, Identity, NotificationPayload, PushSubscription, Storage,
//!     SubscriptionKeys, SubscriptionRegistry,
//! };
//!
//! let storage = Storage::new("~/.pushbeam/server.redb")?;
//! let registry = Arc::new(SubscriptionRegistry::new(storage));
//! let dispatcher = Dispatcher::new(registry.clone(), provider);
//!
//! let alice = Identity::new("alice");
//! registry
//!     .register(&alice, PushSubscription::new(endpoint, SubscriptionKeys::default()))
//!     .await?;
//!
//! let report = dispatcher
//!     .notify_user(&alice, &NotificationPayload::new("Hi", "you have mail"))
//!     .await?;
//! println!("{}/{} delivered", report.delivered, report.attempted);
//! ```

pub mod error;
pub mod fanout;
pub mod outbox;
pub mod registry;
pub mod storage;
pub mod types;

// Re-exports
pub use error::{PushError, PushResult};
pub use fanout::{Dispatcher, FanoutConfig, PushProvider, SendFailure, GONE_STATUSES};
pub use outbox::{
    DrainOutcome, DrainSummary, OutboxStore, ReplayController, ReplayTransport, OUTBOX_SYNC_TAG,
};
pub use registry::SubscriptionRegistry;
pub use storage::Storage;
pub use types::*;
