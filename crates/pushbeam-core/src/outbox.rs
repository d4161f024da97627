//! Durable client-side outbox with replay
//!
//! Requests that could not reach the network are persisted here and
//! resubmitted in enqueue order when a sync trigger fires. An entry exists
//! from the moment of capture until a replay of that exact entry is
//! confirmed; nothing is removed speculatively.

mod replay;
mod store;

pub use replay::{
    DrainOutcome, DrainSummary, ReplayController, ReplayTransport, OUTBOX_SYNC_TAG,
};
pub use store::OutboxStore;
