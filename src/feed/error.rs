// Error taxonomy for remote calls.
//
// FetchError aborts a whole load. ActionError splits into soft outcomes
// (expected races with remote state, the item is skipped) and hard failures
// (the reconcile batch stops).

use std::time::Duration;

use thiserror::Error;

/// Failure while fetching a page of the feed.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request never produced a response (DNS, TLS, connection reset, timeout).
    #[error("feed request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("feed API returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The API refused the request because the quota is exhausted.
    #[error("feed API rate limited ({status}), resume in {}s", retry_after.as_secs())]
    RateLimited { status: u16, retry_after: Duration },

    /// The response body was not a valid page.
    #[error("failed to decode feed page: {0}")]
    Decode(String),
}

impl FetchError {
    /// Suggested delay before the next attempt, for rate-limit failures.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            FetchError::RateLimited { retry_after, .. } => Some(*retry_after),
            _ => None,
        }
    }
}

/// Failure of an amplify or un-amplify call.
#[derive(Debug, Error)]
pub enum ActionError {
    /// We already amplified the item (remote code 327).
    #[error("item is already amplified")]
    AlreadyDone,

    /// The remote side does not allow amplifying the item (remote code 328).
    #[error("amplifying this item is not permitted")]
    NotPermitted,

    /// Any other API-level failure.
    #[error("action failed ({status}): {message}")]
    Failed { status: u16, message: String },

    #[error("action request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ActionError {
    /// Soft errors skip a single item; everything else halts the batch.
    pub fn is_soft(&self) -> bool {
        matches!(self, ActionError::AlreadyDone | ActionError::NotPermitted)
    }
}
