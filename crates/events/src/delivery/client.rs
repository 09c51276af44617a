//! Single-attempt HTTP delivery to one subscriber.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, Response};

use super::{DeliveryError, DeliveryOutcome, FailureReason};
use crate::kind::EventPayload;

/// HTTP request timeout for a single delivery attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// DeliveryTransport
// ---------------------------------------------------------------------------

/// Performs one delivery attempt and reports how it went.
///
/// Implementations never fail outright: every problem is folded into
/// [`DeliveryOutcome::Failure`] so the retry layer can decide what to do.
#[async_trait]
pub trait DeliveryTransport: Send + Sync {
    async fn attempt(&self, url: &str, payload: &EventPayload, method: &Method)
        -> DeliveryOutcome;
}

// ---------------------------------------------------------------------------
// HttpDeliveryClient
// ---------------------------------------------------------------------------

/// [`DeliveryTransport`] backed by a shared `reqwest` client.
///
/// The inner client pools connections and is safe to use from many
/// concurrent deliveries.
#[derive(Debug, Clone)]
pub struct HttpDeliveryClient {
    client: reqwest::Client,
}

impl HttpDeliveryClient {
    /// Create a client with the standard 5 second per-attempt timeout.
    pub fn new() -> Result<Self, DeliveryError> {
        Self::with_timeout(REQUEST_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// DELETE carries the id as a query parameter. Everything else sends
    /// the payload as a JSON body.
    async fn send_request(
        &self,
        url: &str,
        payload: &EventPayload,
        method: &Method,
    ) -> Result<Response, reqwest::Error> {
        let request = if *method == Method::DELETE {
            self.client
                .delete(url)
                .query(&[("id", payload.id.as_str())])
        } else {
            self.client.request(method.clone(), url).json(payload)
        };
        request.send().await
    }
}

#[async_trait]
impl DeliveryTransport for HttpDeliveryClient {
    async fn attempt(
        &self,
        url: &str,
        payload: &EventPayload,
        method: &Method,
    ) -> DeliveryOutcome {
        tracing::debug!(url, %method, ?payload, "Sending event request");

        match self.send_request(url, payload, method).await {
            Ok(response) if response.status().as_u16() == 200 => {
                DeliveryOutcome::Success { status: 200 }
            }
            Ok(response) => {
                let status = response.status().as_u16();
                tracing::error!(url, status, "Received non-200 status from subscriber");
                DeliveryOutcome::Failure(FailureReason::UnsuccessfulStatus(status))
            }
            Err(e) => {
                tracing::warn!(url, error = %e, "Event request failed");
                DeliveryOutcome::Failure(FailureReason::Transport(e.to_string()))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
