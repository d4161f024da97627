//! Core types for Pushbeam

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{PushError, PushResult};

/// Opaque stable key identifying one user
///
/// An identity must resolve to an existing [`UserRecord`](UserRecord) before
/// any subscription can be registered under it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Create an identity from any string-like key
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the underlying string key
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Identity {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Credential bundle the push platform hands to the client alongside an
/// endpoint URL. Opaque to the registry; consumed by the delivery provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionKeys {
    /// Client public key (base64url, as delivered by the browser)
    pub p256dh: String,
    /// Shared authentication secret (base64url)
    pub auth: String,
}

/// One device's push channel: endpoint address plus credential bundle
///
/// Within one user's set, `endpoint` values are unique; registering an
/// identical endpoint again is a silent no-op.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushSubscription {
    /// Opaque endpoint URL provided by the platform's push service
    pub endpoint: String,
    /// Credential bundle for the delivery provider
    pub keys: SubscriptionKeys,
    /// Unix timestamp of registration
    pub created_at: i64,
}

impl PushSubscription {
    /// Create a subscription stamped with the current time
    pub fn new(endpoint: impl Into<String>, keys: SubscriptionKeys) -> Self {
        Self {
            endpoint: endpoint.into(),
            keys,
            created_at: chrono::Utc::now().timestamp(),
        }
    }
}

/// User account record
///
/// Credential storage proper is an external concern; this record exists so
/// identities can be resolved and so the supplemental register/login routes
/// have something to check against. Passwords are stored as sha-256 digests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Unique username, doubles as the identity key
    pub username: String,
    /// Hex sha-256 digest of the password
    pub password_digest: String,
    /// Unix timestamp of account creation
    pub created_at: i64,
}

impl UserRecord {
    /// Create a record for a new account, digesting the password
    pub fn new(username: impl Into<String>, password: &str) -> Self {
        Self {
            username: username.into(),
            password_digest: password_digest(password),
            created_at: chrono::Utc::now().timestamp(),
        }
    }

    /// Check a password attempt against the stored digest
    pub fn verify_password(&self, password: &str) -> bool {
        self.password_digest == password_digest(password)
    }
}

/// Hex sha-256 digest of a password
pub fn password_digest(password: &str) -> String {
    let digest = Sha256::digest(password.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Message handed to the fan-out dispatcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,
}

impl NotificationPayload {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }

    /// Serialize once per fan-out; every endpoint receives the same bytes
    pub fn to_bytes(&self) -> PushResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| PushError::Serialization(e.to_string()))
    }
}

/// Result of a subscription registration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// Endpoint was new for this user and has been stored
    Added,
    /// Identical endpoint already present; set unchanged
    AlreadyPresent,
}

/// Outcome of one delivery attempt to one endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    /// Provider confirmed acceptance
    Delivered,
    /// Retryable failure; endpoint retained, no automatic retry
    TransientFailure { reason: String },
    /// Provider reported the endpoint permanently gone; it has been pruned
    PermanentFailure { code: u16 },
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered)
    }

    pub fn is_permanent(&self) -> bool {
        matches!(self, DeliveryOutcome::PermanentFailure { .. })
    }
}

impl std::fmt::Display for DeliveryOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryOutcome::Delivered => write!(f, "delivered"),
            DeliveryOutcome::TransientFailure { reason } => {
                write!(f, "transient failure: {}", reason)
            }
            DeliveryOutcome::PermanentFailure { code } => {
                write!(f, "permanent failure ({})", code)
            }
        }
    }
}

/// One outcome record per (user, endpoint) attempted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointOutcome {
    pub identity: Identity,
    pub endpoint: String,
    pub outcome: DeliveryOutcome,
}

/// Aggregated result of one `notify_all` / `notify_user` call
///
/// Partial success is the normal case: individual endpoint failures are
/// entries here, never an overall error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FanoutReport {
    pub attempted: usize,
    pub delivered: usize,
    pub transient: usize,
    pub pruned: usize,
    pub outcomes: Vec<EndpointOutcome>,
}

impl FanoutReport {
    /// Build a report from per-endpoint outcomes, deriving the counters
    pub fn from_outcomes(outcomes: Vec<EndpointOutcome>) -> Self {
        let attempted = outcomes.len();
        let delivered = outcomes.iter().filter(|o| o.outcome.is_delivered()).count();
        let pruned = outcomes.iter().filter(|o| o.outcome.is_permanent()).count();
        let transient = attempted - delivered - pruned;
        Self {
            attempted,
            delivered,
            transient,
            pruned,
            outcomes,
        }
    }
}

/// One captured request awaiting replay
///
/// Created when an outbound request could not reach the network; destroyed
/// only after a confirmed successful replay; never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboxEntry {
    /// Locally-unique monotonic key
    pub id: u64,
    /// Where the request was headed
    pub target_url: String,
    /// Opaque request body
    pub body: Vec<u8>,
    /// Unix timestamp of capture
    pub enqueued_at: i64,
}
