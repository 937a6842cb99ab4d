//! Records kept locally when a database write fails.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A contact form submission that could not be saved remotely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSubmission {
    /// Sender name.
    pub name: String,
    /// Sender email.
    pub email: String,
    /// Message body.
    pub message: String,
    /// When the submission was attempted.
    pub submitted_at: DateTime<Utc>,
}

impl ContactSubmission {
    /// Creates a submission stamped with the current time.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            message: message.into(),
            submitted_at: Utc::now(),
        }
    }
}
