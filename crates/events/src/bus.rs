//! Hand-off queue for committed user mutations.
//!
//! The persistence layer sends a [`UserMutation`] through [`MutationBus`]
//! once a create or delete has been committed, and
//! [`UserEventListener`](crate::trigger::UserEventListener) drains the
//! matching [`MutationReceiver`]. The queue is unbounded: nothing is
//! overwritten, and mutations sent before the listener starts wait in the
//! queue. Rolled-back mutations must never be sent.

use authsvc_core::user::User;
use tokio::sync::mpsc;

/// Receiving half handed to the listener.
pub type MutationReceiver = mpsc::UnboundedReceiver<UserMutation>;

// ---------------------------------------------------------------------------
// UserMutation
// ---------------------------------------------------------------------------

/// A committed change to a user record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserMutation {
    Created(User),
    Deleted(User),
}

impl UserMutation {
    pub fn user(&self) -> &User {
        match self {
            UserMutation::Created(user) | UserMutation::Deleted(user) => user,
        }
    }
}

// ---------------------------------------------------------------------------
// MutationBus
// ---------------------------------------------------------------------------

/// Sending side of the mutation queue. Cheap to clone.
///
/// ```rust
/// use authsvc_core::user::User;
/// use authsvc_events::bus::{MutationBus, UserMutation};
///
/// let (bus, mut rx) = MutationBus::new();
/// bus.publish(UserMutation::Created(User::new(uuid::Uuid::nil())));
/// assert!(rx.try_recv().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct MutationBus {
    sender: mpsc::UnboundedSender<UserMutation>,
}

impl MutationBus {
    /// Create the bus together with its only receiver.
    pub fn new() -> (Self, MutationReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Queue a committed mutation for publishing.
    ///
    /// Fails only once the receiver is gone; the mutation is handed back
    /// and the loss is logged at error.
    pub fn publish(&self, mutation: UserMutation) -> Result<(), UserMutation> {
        self.sender.send(mutation).map_err(|e| {
            let mutation = e.0;
            tracing::error!(
                user_id = %mutation.user().id,
                ?mutation,
                "User event listener is gone, committed mutation not published"
            );
            mutation
        })
    }

    /// Whether the receiving side has been dropped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
