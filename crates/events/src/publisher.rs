//! User event publishers.
//!
//! [`Publisher`] is chosen once from [`EventsConfig`] and then shared for
//! the lifetime of the process:
//!
//! - [`HttpEventPublisher`] fans each event out to every configured target,
//!   retrying each independently.
//! - [`NullEventPublisher`] only logs what it would have sent.
//!
//! Publishing never fails from the caller's point of view. Delivery
//! problems end up in the log and nowhere else.

use async_trait::async_trait;
use futures::future::join_all;

use crate::config::{DeliveryConfig, EventsConfig};
use crate::delivery::{DeliveryError, DeliveryTransport, HttpDeliveryClient, RetryingSender};
use crate::kind::{EventKind, EventPayload};

// ---------------------------------------------------------------------------
// EventPublisher
// ---------------------------------------------------------------------------

/// The operations a mutation trigger needs from a publisher.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish_user_created(&self, id: &str, email: Option<&str>);

    async fn publish_user_deleted(&self, id: &str);
}

// ---------------------------------------------------------------------------
// PublishReport
// ---------------------------------------------------------------------------

/// Per-target result of one [`HttpEventPublisher::publish`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub delivered: Vec<String>,
    pub failed: Vec<String>,
}

// ---------------------------------------------------------------------------
// HttpEventPublisher
// ---------------------------------------------------------------------------

/// Delivers events over HTTP to every target configured for their kind.
pub struct HttpEventPublisher<T = HttpDeliveryClient> {
    config: DeliveryConfig,
    sender: RetryingSender<T>,
}

impl HttpEventPublisher {
    /// Create a publisher with the default HTTP client.
    pub fn new(config: DeliveryConfig) -> Result<Self, DeliveryError> {
        Ok(Self::with_transport(config, HttpDeliveryClient::new()?))
    }
}

impl<T: DeliveryTransport> HttpEventPublisher<T> {
    pub fn with_transport(config: DeliveryConfig, transport: T) -> Self {
        let sender = RetryingSender::from_config(transport, &config);
        Self { config, sender }
    }

    pub fn config(&self) -> &DeliveryConfig {
        &self.config
    }

    /// Send `payload` to every target registered for its kind.
    ///
    /// Targets are delivered concurrently and each runs its own retry loop
    /// to completion. A failing target is logged and does not affect the
    /// others.
    pub async fn publish(&self, payload: &EventPayload) -> PublishReport {
        let kind = payload.kind();
        let targets = self.config.targets(kind);
        if targets.is_empty() {
            tracing::warn!(event = %kind, "No target services configured for event");
            return PublishReport::default();
        }

        let method = kind.method();
        let max_attempts = self.sender.max_attempts();
        let method = &method;

        let deliveries = targets.iter().map(|url| async move {
            match self.sender.send(url, payload, method).await {
                Ok(status) => {
                    tracing::info!(event = %kind, url = %url, status, "Event delivered");
                    Ok(url.clone())
                }
                Err(e) => {
                    tracing::error!(
                        event = %kind,
                        url = %url,
                        max_attempts,
                        error = %e,
                        "Failed to deliver event"
                    );
                    Err(url.clone())
                }
            }
        });

        let mut report = PublishReport::default();
        for result in join_all(deliveries).await {
            match result {
                Ok(url) => report.delivered.push(url),
                Err(url) => report.failed.push(url),
            }
        }
        report
    }
}

#[async_trait]
impl<T: DeliveryTransport> EventPublisher for HttpEventPublisher<T> {
    async fn publish_user_created(&self, id: &str, email: Option<&str>) {
        let payload = EventPayload::user_created(id, email.map(str::to_owned));
        self.publish(&payload).await;
    }

    async fn publish_user_deleted(&self, id: &str) {
        let payload = EventPayload::user_deleted(id);
        self.publish(&payload).await;
    }
}

// ---------------------------------------------------------------------------
// NullEventPublisher
// ---------------------------------------------------------------------------

/// Stand-in used when event publishing is switched off.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullEventPublisher;

#[async_trait]
impl EventPublisher for NullEventPublisher {
    async fn publish_user_created(&self, id: &str, _email: Option<&str>) {
        tracing::info!(event = %EventKind::Created, id, "[NullEventPublisher] Would publish event");
    }

    async fn publish_user_deleted(&self, id: &str) {
        tracing::info!(event = %EventKind::Deleted, id, "[NullEventPublisher] Would publish event");
    }
}

// ---------------------------------------------------------------------------
// Publisher
// ---------------------------------------------------------------------------

/// The publisher selected at startup.
pub enum Publisher {
    Http(HttpEventPublisher),
    Null(NullEventPublisher),
}

impl Publisher {
    /// Pick the real or null publisher based on `config.enabled`.
    pub fn from_config(config: &EventsConfig) -> Result<Self, DeliveryError> {
        if config.enabled {
            tracing::info!(
                max_attempts = config.delivery.max_attempts(),
                retry_delay = ?config.delivery.retry_delay(),
                "Event publishing enabled"
            );
            Ok(Publisher::Http(HttpEventPublisher::new(config.delivery.clone())?))
        } else {
            tracing::info!("Event publishing disabled, using null publisher");
            Ok(Publisher::Null(NullEventPublisher))
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, Publisher::Http(_))
    }
}

#[async_trait]
impl EventPublisher for Publisher {
    async fn publish_user_created(&self, id: &str, email: Option<&str>) {
        match self {
            Publisher::Http(p) => p.publish_user_created(id, email).await,
            Publisher::Null(p) => p.publish_user_created(id, email).await,
        }
    }

    async fn publish_user_deleted(&self, id: &str) {
        match self {
            Publisher::Http(p) => p.publish_user_deleted(id).await,
            Publisher::Null(p) => p.publish_user_deleted(id).await,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
