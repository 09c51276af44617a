//! Fixed-delay retry around a [`DeliveryTransport`].

use std::time::Duration;

use reqwest::Method;

use super::{DeliveryError, DeliveryOutcome, DeliveryTransport, HttpDeliveryClient};
use crate::config::DeliveryConfig;
use crate::kind::EventPayload;

/// Repeats delivery attempts until one succeeds or the budget is spent.
///
/// A transport failure and a non-200 status are retried alike. The wait
/// between attempts is constant, so the worst case for one target costs
/// `(max_attempts - 1) * delay` on top of the request time.
#[derive(Debug, Clone)]
pub struct RetryingSender<T = HttpDeliveryClient> {
    transport: T,
    max_attempts: u32,
    delay: Duration,
}

impl<T: DeliveryTransport> RetryingSender<T> {
    /// `max_attempts` is clamped to at least one.
    pub fn new(transport: T, max_attempts: u32, delay: Duration) -> Self {
        Self {
            transport,
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    pub fn from_config(transport: T, config: &DeliveryConfig) -> Self {
        Self::new(transport, config.max_attempts(), config.retry_delay())
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Deliver `payload` to `url`, returning the success status code.
    ///
    /// Returns [`DeliveryError::AttemptsExhausted`] carrying the last
    /// failure once every attempt has failed.
    pub async fn send(
        &self,
        url: &str,
        payload: &EventPayload,
        method: &Method,
    ) -> Result<u16, DeliveryError> {
        let mut attempt = 1;
        loop {
            match self.transport.attempt(url, payload, method).await {
                DeliveryOutcome::Success { status } => return Ok(status),
                DeliveryOutcome::Failure(reason) if attempt >= self.max_attempts => {
                    return Err(DeliveryError::AttemptsExhausted {
                        attempts: attempt,
                        last: reason,
                    });
                }
                DeliveryOutcome::Failure(reason) => {
                    tracing::warn!(
                        url,
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %reason,
                        "Event delivery attempt failed, retrying"
                    );
                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use assert_matches::assert_matches;
    use async_trait::async_trait;

    use super::*;
    use crate::delivery::FailureReason;

    /// Replays a fixed script of outcomes, then fails with 500 forever.
    struct ScriptedTransport {
        script: Mutex<VecDeque<DeliveryOutcome>>,
        calls: Mutex<Vec<tokio::time::Instant>>,
    }

    impl ScriptedTransport {
        fn new(script: impl IntoIterator<Item = DeliveryOutcome>) -> Self {
            Self {
                script: Mutex::new(script.into_iter().collect()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn call_times(&self) -> Vec<tokio::time::Instant> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DeliveryTransport for ScriptedTransport {
        async fn attempt(&self, _: &str, _: &EventPayload, _: &Method) -> DeliveryOutcome {
            self.calls.lock().unwrap().push(tokio::time::Instant::now());
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(DeliveryOutcome::Failure(FailureReason::UnsuccessfulStatus(500)))
        }
    }

    fn fail_500() -> DeliveryOutcome {
        DeliveryOutcome::Failure(FailureReason::UnsuccessfulStatus(500))
    }

    #[tokio::test]
    async fn first_success_makes_one_attempt() {
        let sender = RetryingSender::new(
            ScriptedTransport::new([DeliveryOutcome::Success { status: 200 }]),
            5,
            Duration::ZERO,
        );
        let status = sender
            .send("http://sub/", &EventPayload::user_deleted("1"), &Method::DELETE)
            .await
            .expect("should succeed");

        assert_eq!(status, 200);
        assert_eq!(sender.transport().call_times().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_on_kth_attempt_with_fixed_spacing() {
        let delay = Duration::from_secs(2);
        let sender = RetryingSender::new(
            ScriptedTransport::new([
                fail_500(),
                DeliveryOutcome::Failure(FailureReason::Transport("refused".into())),
                DeliveryOutcome::Success { status: 200 },
            ]),
            5,
            delay,
        );

        sender
            .send("http://sub/", &EventPayload::user_created("1", None), &Method::POST)
            .await
            .expect("third attempt succeeds");

        let calls = sender.transport().call_times();
        assert_eq!(calls.len(), 3);
        for pair in calls.windows(2) {
            assert_eq!(pair[1] - pair[0], delay);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_budget_and_reports_last_failure() {
        let sender = RetryingSender::new(
            ScriptedTransport::new([]),
            5,
            Duration::from_secs(1),
        );
        let started = tokio::time::Instant::now();

        let err = sender
            .send("http://sub/", &EventPayload::user_deleted("1"), &Method::DELETE)
            .await
            .unwrap_err();

        assert_matches!(
            err,
            DeliveryError::AttemptsExhausted {
                attempts: 5,
                last: FailureReason::UnsuccessfulStatus(500),
            }
        );
        assert_eq!(sender.transport().call_times().len(), 5);
        assert_eq!(started.elapsed(), Duration::from_secs(4));
    }

    #[tokio::test]
    async fn zero_attempts_is_clamped_to_one() {
        let sender = RetryingSender::new(ScriptedTransport::new([]), 0, Duration::ZERO);
        assert_eq!(sender.max_attempts(), 1);

        let err = sender
            .send("http://sub/", &EventPayload::user_deleted("1"), &Method::DELETE)
            .await
            .unwrap_err();
        assert_matches!(err, DeliveryError::AttemptsExhausted { attempts: 1, .. });
    }

    #[test]
    fn from_config_copies_policy() {
        let config = DeliveryConfig::new(3, Duration::from_millis(10)).expect("valid config");
        let sender = RetryingSender::from_config(ScriptedTransport::new([]), &config);
        assert_eq!(sender.max_attempts(), 3);
    }
}
