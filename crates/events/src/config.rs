//! Delivery configuration for outbound user events.
//!
//! [`EventsConfig`] is read once at startup and handed to
//! [`Publisher::from_config`](crate::publisher::Publisher::from_config).
//! Nothing in the delivery path looks settings up on its own.

use std::collections::HashMap;
use std::time::Duration;

use authsvc_core::error::CoreError;

use crate::kind::EventKind;

/// Attempt budget per target when `EVENT_MAX_ATTEMPTS` is not set.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Pause between attempts when `EVENT_RETRY_DELAY` is not set.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Subscriber used for both kinds when `EVENT_TARGETS` is not set.
pub const DEFAULT_TARGET: &str = "http://localhost:8000/users/";

// ---------------------------------------------------------------------------
// DeliveryConfig
// ---------------------------------------------------------------------------

/// Subscriber targets per event kind plus the retry policy.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryConfig {
    targets: HashMap<EventKind, Vec<String>>,
    max_attempts: u32,
    retry_delay: Duration,
}

impl DeliveryConfig {
    /// Create a config with no targets.
    ///
    /// Fails if `max_attempts` is zero.
    pub fn new(max_attempts: u32, retry_delay: Duration) -> Result<Self, CoreError> {
        if max_attempts == 0 {
            return Err(CoreError::config("EVENT_MAX_ATTEMPTS", "must be at least 1"));
        }
        Ok(Self {
            targets: HashMap::new(),
            max_attempts,
            retry_delay,
        })
    }

    /// Replace the target list for one kind.
    pub fn with_targets<I, S>(mut self, kind: EventKind, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.targets
            .insert(kind, urls.into_iter().map(Into::into).collect());
        self
    }

    /// Targets for `kind`, in configuration order. Empty if none.
    pub fn targets(&self, kind: EventKind) -> &[String] {
        self.targets.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn retry_delay(&self) -> Duration {
        self.retry_delay
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            targets: EventKind::ALL
                .into_iter()
                .map(|kind| (kind, vec![DEFAULT_TARGET.to_string()]))
                .collect(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

// ---------------------------------------------------------------------------
// EventsConfig
// ---------------------------------------------------------------------------

/// Top-level event publishing settings.
#[derive(Debug, Clone, PartialEq)]
pub struct EventsConfig {
    /// When `false` a null publisher is used and nothing leaves the process.
    pub enabled: bool,
    pub delivery: DeliveryConfig,
}

impl EventsConfig {
    /// Settings with publishing switched off.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            delivery: DeliveryConfig::default(),
        }
    }

    /// Load `./.env` if present, then read the environment.
    pub fn load() -> Result<Self, CoreError> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    /// Read settings from environment variables.
    ///
    /// | Env Var              | Default                                   |
    /// |----------------------|-------------------------------------------|
    /// | `EVENTS_ENABLED`     | `true`                                    |
    /// | `EVENT_TARGETS`      | both kinds → `http://localhost:8000/users/` |
    /// | `EVENT_MAX_ATTEMPTS` | `5`                                       |
    /// | `EVENT_RETRY_DELAY`  | `1` (seconds, fractions allowed)          |
    ///
    /// `EVENT_TARGETS` is a JSON object keyed by event name, e.g.
    /// `{"user_created": ["http://a/hook"], "user_deleted": []}`.
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let enabled = match get("EVENTS_ENABLED") {
            Some(raw) => parse_bool("EVENTS_ENABLED", &raw)?,
            None => true,
        };

        let max_attempts = match get("EVENT_MAX_ATTEMPTS") {
            Some(raw) => raw.trim().parse::<u32>().map_err(|e| {
                CoreError::config("EVENT_MAX_ATTEMPTS", format!("{raw:?} is not a count: {e}"))
            })?,
            None => DEFAULT_MAX_ATTEMPTS,
        };

        let retry_delay = match get("EVENT_RETRY_DELAY") {
            Some(raw) => parse_delay(&raw)?,
            None => DEFAULT_RETRY_DELAY,
        };

        let mut delivery = DeliveryConfig::new(max_attempts, retry_delay)?;
        match get("EVENT_TARGETS") {
            Some(raw) => {
                for (kind, urls) in parse_targets(&raw)? {
                    delivery = delivery.with_targets(kind, urls);
                }
            }
            None => {
                for kind in EventKind::ALL {
                    delivery = delivery.with_targets(kind, [DEFAULT_TARGET]);
                }
            }
        }

        Ok(Self { enabled, delivery })
    }
}

fn parse_bool(key: &'static str, raw: &str) -> Result<bool, CoreError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(CoreError::config(key, format!("{other:?} is not a boolean"))),
    }
}

fn parse_delay(raw: &str) -> Result<Duration, CoreError> {
    let secs: f64 = raw.trim().parse().map_err(|e| {
        CoreError::config("EVENT_RETRY_DELAY", format!("{raw:?} is not a number: {e}"))
    })?;
    Duration::try_from_secs_f64(secs).map_err(|_| {
        CoreError::config("EVENT_RETRY_DELAY", format!("{secs} is not a valid delay"))
    })
}

fn parse_targets(raw: &str) -> Result<Vec<(EventKind, Vec<String>)>, CoreError> {
    let by_name: HashMap<String, Vec<String>> = serde_json::from_str(raw)
        .map_err(|e| CoreError::config("EVENT_TARGETS", format!("invalid JSON: {e}")))?;

    let mut targets = Vec::with_capacity(by_name.len());
    for (name, urls) in by_name {
        let Some(kind) = EventKind::from_name(&name) else {
            tracing::warn!(event = %name, "Ignoring targets for unknown event");
            continue;
        };
        for url in &urls {
            reqwest::Url::parse(url).map_err(|e| {
                CoreError::config("EVENT_TARGETS", format!("invalid URL {url:?}: {e}"))
            })?;
        }
        targets.push((kind, urls));
    }
    Ok(targets)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
