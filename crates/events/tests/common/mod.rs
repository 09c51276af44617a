//! Shared helpers for authsvc-events integration tests.
//!
//! Provides a JSON log capture for asserting on emitted diagnostics and
//! wiremock responders that model flaky subscribers.

#![allow(dead_code)]

use std::io;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use authsvc_events::{DeliveryConfig, EventKind};
use tracing::subscriber::DefaultGuard;
use wiremock::{Request, Respond, ResponseTemplate};

// ---------------------------------------------------------------------------
// LogCapture
// ---------------------------------------------------------------------------

/// Collects JSON-formatted log lines emitted while its guard is alive.
#[derive(Clone, Default)]
pub struct LogCapture {
    buf: Arc<Mutex<Vec<u8>>>,
}

struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

impl io::Write for CaptureWriter {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl LogCapture {
    /// Install a thread-local subscriber writing into this capture.
    ///
    /// Only valid with the current-thread test runtime, which is the
    /// `#[tokio::test]` default.
    pub fn install(&self) -> DefaultGuard {
        let buf = Arc::clone(&self.buf);
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(move || CaptureWriter(Arc::clone(&buf)))
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    /// Every captured record emitted by this crate.
    pub fn records(&self) -> Vec<serde_json::Value> {
        let buf = self.buf.lock().unwrap();
        String::from_utf8_lossy(&buf)
            .lines()
            .filter_map(|line| serde_json::from_str::<serde_json::Value>(line).ok())
            .filter(|record| {
                record["target"]
                    .as_str()
                    .is_some_and(|t| t.starts_with("authsvc_events"))
            })
            .collect()
    }

    /// Count records at `level` (e.g. `"WARN"`) whose target starts with
    /// `target`.
    pub fn count(&self, level: &str, target: &str) -> usize {
        self.records()
            .iter()
            .filter(|r| r["level"] == level)
            .filter(|r| r["target"].as_str().is_some_and(|t| t.starts_with(target)))
            .count()
    }
}

pub const PUBLISHER: &str = "authsvc_events::publisher";
pub const CLIENT: &str = "authsvc_events::delivery::client";
pub const ANY: &str = "authsvc_events";

// ---------------------------------------------------------------------------
// FlakyResponder
// ---------------------------------------------------------------------------

/// Answers 500 for the first `failures` requests, 200 afterwards.
#[derive(Clone)]
pub struct FlakyResponder {
    failures: u32,
    seen: Arc<AtomicU32>,
}

impl FlakyResponder {
    pub fn fail_times(failures: u32) -> Self {
        Self {
            failures,
            seen: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn attempt_count(&self) -> u32 {
        self.seen.load(Ordering::SeqCst)
    }
}

impl Respond for FlakyResponder {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let n = self.seen.fetch_add(1, Ordering::SeqCst);
        if n < self.failures {
            ResponseTemplate::new(500)
        } else {
            ResponseTemplate::new(200)
        }
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Retry policy with no waiting between attempts.
pub fn immediate_retries(max_attempts: u32) -> DeliveryConfig {
    DeliveryConfig::new(max_attempts, Duration::ZERO).expect("valid delivery config")
}

/// Same as [`immediate_retries`] with `urls` registered for `kind`.
pub fn targets(max_attempts: u32, kind: EventKind, urls: &[String]) -> DeliveryConfig {
    immediate_retries(max_attempts).with_targets(kind, urls.iter().cloned())
}
