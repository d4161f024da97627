//! Persistent server-side storage using redb.
//!
//! This module provides ACID-compliant storage for:
//! - User accounts (credential digests, consulted for identity resolution)
//! - Push subscriptions (per-user endpoint sets)
//!
//! The client-side outbox lives in its own database; see
//! [`crate::outbox::OutboxStore`].

use crate::error::PushError;
use parking_lot::RwLock;
use redb::Database;
use std::path::Path;
use std::sync::Arc;

// Submodules
mod subscriptions;
mod users;

// Table handles needed for initialization in Storage::new
use subscriptions::SUBSCRIPTIONS_TABLE;
use users::USERS_TABLE;

/// Storage layer using redb for ACID-compliant persistence
#[derive(Clone)]
pub struct Storage {
    db: Arc<RwLock<Database>>,
}

impl Storage {
    /// Get a reference to the shared database handle
    ///
    /// Components that outlive a single call (like the registry) share the
    /// same database connection instead of opening the file twice.
    pub fn db_handle(&self) -> Arc<RwLock<Database>> {
        self.db.clone()
    }

    /// Create a new storage instance at the given path.
    ///
    /// This will:
    /// - Create the database directory if it doesn't exist
    /// - Initialize the database file
    /// - Create all required tables
    pub fn new(path: impl AsRef<Path>) -> Result<Self, PushError> {
        let path = path.as_ref();

        // Create parent directory if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Open/create database
        let db = Database::create(path)?;

        // Initialize all tables
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(USERS_TABLE)?;
            let _ = write_txn.open_table(SUBSCRIPTIONS_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self {
            db: Arc::new(RwLock::new(db)),
        })
    }
}
