//! The user record as seen by lifecycle hooks.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::UserId;

/// Snapshot of a user row taken after a committed insert or delete.
///
/// Only the fields downstream subscribers care about are carried; the
/// persistence layer owns the full row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: Option<String>,
}

impl User {
    pub fn new(id: UserId) -> Self {
        Self { id, email: None }
    }

    /// Attach an email address, rejecting obviously malformed values.
    pub fn with_email(mut self, email: impl Into<String>) -> Result<Self, CoreError> {
        let email = email.into();
        if !email.contains('@') || email.trim() != email {
            return Err(CoreError::Validation(format!(
                "invalid email address: {email:?}"
            )));
        }
        self.email = Some(email);
        Ok(self)
    }

    /// String form of the primary key, as sent on the wire.
    pub fn id_string(&self) -> String {
        self.id.to_string()
    }
}
