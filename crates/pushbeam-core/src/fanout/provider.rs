//! Delivery provider boundary
//!
//! The push service is a black box behind one send primitive that returns
//! success or a typed failure. Only the two "gone" statuses (endpoint expired
//! or not found) are permanent; everything else is transient and leaves the
//! endpoint registered.

use std::fmt;

use async_trait::async_trait;

use crate::types::PushSubscription;

/// Provider statuses meaning the endpoint will never accept another delivery
pub const GONE_STATUSES: [u16; 2] = [404, 410];

/// Typed failure reported by a push provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendFailure {
    /// The endpoint is permanently gone (provider-reported 404 or 410)
    Gone { status: u16 },
    /// Any other failure; retry is the caller's prerogative on a later notify
    Transient { reason: String },
}

impl SendFailure {
    /// Classify a provider response status
    pub fn from_status(status: u16, reason: impl Into<String>) -> Self {
        if GONE_STATUSES.contains(&status) {
            SendFailure::Gone { status }
        } else {
            SendFailure::Transient {
                reason: reason.into(),
            }
        }
    }
}

impl fmt::Display for SendFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendFailure::Gone { status } => write!(f, "endpoint gone ({})", status),
            SendFailure::Transient { reason } => write!(f, "transient: {}", reason),
        }
    }
}

/// Black-box send primitive of the push delivery provider
///
/// Authentication of the sending server to the provider (key-pair
/// configuration) is external setup and not part of this contract.
#[async_trait]
pub trait PushProvider: Send + Sync {
    /// Deliver one payload to one endpoint
    async fn send(&self, subscription: &PushSubscription, payload: &[u8])
        -> Result<(), SendFailure>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gone_statuses_classify_as_permanent() {
        assert_eq!(
            SendFailure::from_status(404, "not found"),
            SendFailure::Gone { status: 404 }
        );
        assert_eq!(
            SendFailure::from_status(410, "gone"),
            SendFailure::Gone { status: 410 }
        );
    }

    #[test]
    fn test_other_statuses_classify_as_transient() {
        for status in [400, 401, 413, 429, 500, 503] {
            assert!(matches!(
                SendFailure::from_status(status, "err"),
                SendFailure::Transient { .. }
            ));
        }
    }
}
