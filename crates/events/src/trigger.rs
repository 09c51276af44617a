//! Turns committed user mutations into outbound events.

use std::sync::Arc;

use authsvc_core::user::User;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::bus::{MutationReceiver, UserMutation};
use crate::publisher::{EventPublisher, Publisher};

// ---------------------------------------------------------------------------
// UserEventHandler
// ---------------------------------------------------------------------------

/// Post-commit hooks for the `users` table.
///
/// Each hook calls the publisher exactly once. Publishing is infallible
/// from here, so delivery problems can never reach the commit path.
pub struct UserEventHandler<P: ?Sized = Publisher> {
    publisher: Arc<P>,
}

impl<P: EventPublisher + ?Sized> UserEventHandler<P> {
    pub fn new(publisher: Arc<P>) -> Self {
        Self { publisher }
    }

    pub async fn handle_after_insert(&self, user: &User) {
        tracing::info!(user_id = %user.id, "DB event triggered, user created");
        self.publisher
            .publish_user_created(&user.id_string(), user.email.as_deref())
            .await;
    }

    pub async fn handle_after_delete(&self, user: &User) {
        tracing::info!(user_id = %user.id, "DB event triggered, user deleted");
        self.publisher.publish_user_deleted(&user.id_string()).await;
    }

    pub async fn handle(&self, mutation: &UserMutation) {
        match mutation {
            UserMutation::Created(user) => self.handle_after_insert(user).await,
            UserMutation::Deleted(user) => self.handle_after_delete(user).await,
        }
    }
}

impl<P: ?Sized> Clone for UserEventHandler<P> {
    fn clone(&self) -> Self {
        Self {
            publisher: Arc::clone(&self.publisher),
        }
    }
}

// ---------------------------------------------------------------------------
// UserEventListener
// ---------------------------------------------------------------------------

/// Background task feeding [`MutationBus`](crate::bus::MutationBus) traffic into a handler.
pub struct UserEventListener;

impl UserEventListener {
    /// Spawn the listener loop over `receiver`.
    pub fn register<P>(
        handler: UserEventHandler<P>,
        receiver: MutationReceiver,
        cancel: CancellationToken,
    ) -> JoinHandle<()>
    where
        P: EventPublisher + ?Sized + 'static,
    {
        tracing::info!("Registered user event listener");
        tokio::spawn(Self::run(handler, receiver, cancel))
    }

    /// Run the listener loop.
    ///
    /// Exits once every [`MutationBus`](crate::bus::MutationBus) is dropped and the queue is empty.
    /// When `cancel` fires the queue is closed to new mutations, and the
    /// ones already queued are still published before returning.
    pub async fn run<P>(
        handler: UserEventHandler<P>,
        mut receiver: MutationReceiver,
        cancel: CancellationToken,
    ) where
        P: EventPublisher + ?Sized,
    {
        loop {
            let received = tokio::select! {
                _ = cancel.cancelled() => {
                    receiver.close();
                    let mut drained = 0usize;
                    while let Some(mutation) = receiver.recv().await {
                        handler.handle(&mutation).await;
                        drained += 1;
                    }
                    tracing::info!(drained, "User event listener cancelled");
                    break;
                }
                received = receiver.recv() => received,
            };

            match received {
                Some(mutation) => handler.handle(&mutation).await,
                None => {
                    tracing::info!("Mutation bus closed, user event listener shutting down");
                    break;
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
