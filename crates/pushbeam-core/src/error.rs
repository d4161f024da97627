//! Error types for Pushbeam

use thiserror::Error;

/// Main error type for Pushbeam operations
#[derive(Error, Debug)]
pub enum PushError {
    /// Identity does not resolve to a known user
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// Identity is known but has no registered endpoints
    #[error("No subscriptions for user: {0}")]
    NoSubscriptions(String),

    /// Broadcast requested while zero subscriptions exist system-wide
    #[error("No recipients registered")]
    NoRecipients,

    /// Error during storage operations (redb)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Database creation/opening error
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    /// Transaction error
    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    /// Table error
    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    /// Storage operation error
    #[error("Storage operation error: {0}")]
    StorageOp(#[from] redb::StorageError),

    /// Commit error
    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    /// Error during serialization/deserialization
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// General I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Fan-out task did not run to completion
    #[error("Fanout error: {0}")]
    Fanout(String),

    /// Replay transport could not confirm acceptance
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Result type alias using PushError
pub type PushResult<T> = Result<T, PushError>;
