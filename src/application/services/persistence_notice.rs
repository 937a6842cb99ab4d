//! Locally kept records of failed database writes, surfaced to admins.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::entities::ContactSubmission;
use crate::domain::errors::StorageError;
use crate::domain::ports::KeyValuePort;

/// Local storage flag marking the visitor as an admin.
pub const ADMIN_FLAG_KEY: &str = "isAdmin";
/// Local storage key for contact submissions that failed to save.
pub const CONTACT_SUBMISSIONS_KEY: &str = "contactSubmissions";
/// Session storage key for the last order snapshot.
pub const LAST_ORDER_KEY: &str = "lastOrder";

/// Reads and records pending submissions across local and session storage.
pub struct PersistenceNotice {
    local: Arc<dyn KeyValuePort>,
    session: Arc<dyn KeyValuePort>,
}

impl std::fmt::Debug for PersistenceNotice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceNotice").finish_non_exhaustive()
    }
}

impl PersistenceNotice {
    /// Creates a notice over local and session storage.
    #[must_use]
    pub fn new(local: Arc<dyn KeyValuePort>, session: Arc<dyn KeyValuePort>) -> Self {
        Self { local, session }
    }

    /// Returns true when the admin flag is set to `"true"`.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        matches!(self.local.get(ADMIN_FLAG_KEY), Ok(Some(v)) if v == "true")
    }

    /// Contact submissions waiting to be saved. Malformed entries are
    /// skipped.
    #[must_use]
    pub fn pending_contacts(&self) -> Vec<ContactSubmission> {
        self.stored_contacts()
            .into_iter()
            .filter_map(|entry| serde_json::from_value(entry).ok())
            .collect()
    }

    /// Raw stored entries, including ones this crate cannot read.
    fn stored_contacts(&self) -> Vec<serde_json::Value> {
        let raw = match self.local.get(CONTACT_SUBMISSIONS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(error = %e, "Failed to read pending contact submissions");
                return Vec::new();
            }
        };
        serde_json::from_str(&raw)
            .inspect_err(|e| warn!(error = %e, "Pending contact submissions are not a JSON array"))
            .unwrap_or_default()
    }

    /// The last order snapshot from this session, if any.
    #[must_use]
    pub fn last_order(&self) -> Option<serde_json::Value> {
        let raw = self.session.get(LAST_ORDER_KEY).ok().flatten()?;
        serde_json::from_str(&raw)
            .inspect_err(|e| warn!(error = %e, "Stored order snapshot is malformed"))
            .ok()
    }

    /// Appends a contact submission whose remote save failed. Stored
    /// entries of another shape are kept as they are.
    ///
    /// # Errors
    /// Returns `StorageError` if local storage cannot be written.
    pub fn record_failed_contact(&self, submission: ContactSubmission) -> Result<(), StorageError> {
        let mut pending = self.stored_contacts();
        pending.push(serde_json::to_value(submission)?);
        self.local
            .set(CONTACT_SUBMISSIONS_KEY, &serde_json::to_string(&pending)?)?;
        debug!(count = pending.len(), "Recorded failed contact submission");
        Ok(())
    }

    /// Keeps an order snapshot whose remote save failed.
    ///
    /// # Errors
    /// Returns `StorageError` if session storage cannot be written.
    pub fn record_failed_order(&self, order: &serde_json::Value) -> Result<(), StorageError> {
        self.session
            .set(LAST_ORDER_KEY, &serde_json::to_string(order)?)?;
        debug!("Recorded failed order snapshot");
        Ok(())
    }

    /// Number of pending records.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending_contacts().len() + usize::from(self.last_order().is_some())
    }

    /// Whether the database-error banner should be shown.
    #[must_use]
    pub fn should_show_banner(&self) -> bool {
        self.is_admin() && self.pending_count() > 0
    }

    /// Clears every pending record.
    ///
    /// # Errors
    /// Returns `StorageError` if either storage cannot be written.
    pub fn dismiss(&self) -> Result<(), StorageError> {
        self.local.remove(CONTACT_SUBMISSIONS_KEY)?;
        self.session.remove(LAST_ORDER_KEY)?;
        Ok(())
    }
}
