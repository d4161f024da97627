//! Fan-out delivery - concurrent push dispatch with endpoint pruning
//!
//! Given a target set (one user or everybody), the dispatcher delivers a
//! message to every endpoint concurrently, collects per-endpoint outcomes,
//! and feeds endpoints the provider reports as permanently gone back to the
//! registry for pruning.

mod dispatcher;
mod provider;

pub use dispatcher::{Dispatcher, FanoutConfig};
pub use provider::{PushProvider, SendFailure, GONE_STATUSES};
