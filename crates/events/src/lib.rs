//! Outbound user lifecycle events.
//!
//! When a user record is created or deleted, the configured subscriber
//! endpoints are notified over HTTP:
//!
//! - [`EventsConfig`] — targets per event kind and the retry policy.
//! - [`HttpDeliveryClient`] / [`RetryingSender`] — one attempt, and a
//!   fixed-delay retry loop around it.
//! - [`Publisher`] — the real fan-out publisher or the null stand-in,
//!   chosen once at startup.
//! - [`UserEventHandler`] / [`UserEventListener`] — post-commit hooks that
//!   feed mutations to the publisher.
//!
//! Delivery is best-effort and at-least-once. Failures are logged, never
//! returned to the code that committed the mutation.

pub mod bus;
pub mod config;
pub mod delivery;
pub mod kind;
pub mod publisher;
pub mod trigger;

pub use bus::{MutationBus, MutationReceiver, UserMutation};
pub use config::{DeliveryConfig, EventsConfig};
pub use delivery::{
    DeliveryError, DeliveryOutcome, DeliveryTransport, FailureReason, HttpDeliveryClient,
    RetryingSender,
};
pub use kind::{EventKind, EventPayload};
pub use publisher::{EventPublisher, HttpEventPublisher, NullEventPublisher, Publisher, PublishReport};
pub use trigger::{UserEventHandler, UserEventListener};
