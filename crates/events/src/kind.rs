//! Event kinds and the payloads subscribers receive.

use std::fmt;

use reqwest::Method;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// EventKind
// ---------------------------------------------------------------------------

/// The lifecycle transition an event reports.
///
/// Serialized as the wire name (`"user_created"` / `"user_deleted"`), which
/// is also the key used in the `EVENT_TARGETS` setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "user_created")]
    Created,
    #[serde(rename = "user_deleted")]
    Deleted,
}

impl EventKind {
    pub const ALL: [EventKind; 2] = [EventKind::Created, EventKind::Deleted];

    /// Wire name of the event.
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Created => "user_created",
            EventKind::Deleted => "user_deleted",
        }
    }

    /// Parse a wire name back into a kind.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }

    /// HTTP method used to notify subscribers of this kind.
    pub fn method(self) -> Method {
        match self {
            EventKind::Created => Method::POST,
            EventKind::Deleted => Method::DELETE,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// EventPayload
// ---------------------------------------------------------------------------

/// Body of a user lifecycle notification.
///
/// Created events go out as this JSON object. Deleted events only put
/// [`id`](Self::id) on the query string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventPayload {
    pub event: EventKind,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl EventPayload {
    pub fn user_created(id: impl Into<String>, email: Option<String>) -> Self {
        Self {
            event: EventKind::Created,
            id: id.into(),
            email,
        }
    }

    pub fn user_deleted(id: impl Into<String>) -> Self {
        Self {
            event: EventKind::Deleted,
            id: id.into(),
            email: None,
        }
    }

    pub fn kind(&self) -> EventKind {
        self.event
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
