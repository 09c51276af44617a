//! Outbound HTTP delivery of user events.
//!
//! [`HttpDeliveryClient`] performs a single attempt against one subscriber.
//! [`RetryingSender`] repeats attempts with a fixed delay until one succeeds
//! or the attempt budget runs out.

pub mod client;
pub mod retry;

pub use client::{DeliveryTransport, HttpDeliveryClient};
pub use retry::RetryingSender;

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Why a single attempt did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FailureReason {
    /// Connection refused, DNS failure, timeout and the like.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The subscriber answered with something other than 200.
    #[error("subscriber returned HTTP {0}")]
    UnsuccessfulStatus(u16),
}

/// Result of one delivery attempt. Only an exact 200 counts as success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Success { status: u16 },
    Failure(FailureReason),
}

impl DeliveryOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DeliveryOutcome::Success { .. })
    }
}

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for event delivery.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    /// Every attempt in the budget failed.
    #[error("delivery failed after {attempts} attempts: {last}")]
    AttemptsExhausted {
        attempts: u32,
        #[source]
        last: FailureReason,
    },
}
