//! Secret credential value object.

use std::fmt;

use zeroize::Zeroizing;

/// A backend credential such as the storage service-role key. The value is
/// wiped from memory on drop and masked in debug output.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey {
    value: Zeroizing<String>,
}

impl SecretKey {
    /// Wraps a key, returning `None` for blank input.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into().trim().to_string();
        if value.is_empty() {
            return None;
        }
        Some(Self {
            value: Zeroizing::new(value),
        })
    }

    /// Returns the key for use in a request header.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.value
    }

    /// Returns masked key for display.
    #[must_use]
    pub fn masked(&self) -> String {
        if self.value.len() <= 10 {
            return "*".repeat(self.value.len());
        }

        let visible_prefix = &self.value[..4];
        let visible_suffix = &self.value[self.value.len() - 4..];
        format!("{visible_prefix}...{visible_suffix}")
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretKey")
            .field("value", &self.masked())
            .finish()
    }
}
