//! Current site language.

use parking_lot::RwLock;
use tracing::debug;

use crate::domain::entities::Language;

/// Tab-scoped language preference. Not persisted; a fresh store starts in
/// Bulgarian. Passed explicitly to whatever renders localized content.
#[derive(Debug, Default)]
pub struct LanguageStore {
    current: RwLock<Language>,
}

impl LanguageStore {
    /// Creates a store starting in `language`.
    #[must_use]
    pub const fn new(language: Language) -> Self {
        Self {
            current: RwLock::new(language),
        }
    }

    /// Returns the current language.
    #[must_use]
    pub fn language(&self) -> Language {
        *self.current.read()
    }

    /// Sets the current language.
    pub fn set_language(&self, language: Language) {
        debug!(%language, "Language changed");
        *self.current.write() = language;
    }

    /// Switches to the other language and returns it.
    pub fn toggle(&self) -> Language {
        let mut current = self.current.write();
        *current = current.other();
        debug!(language = %*current, "Language toggled");
        *current
    }

    /// Picks the variant of a bilingual pair for the current language.
    #[must_use]
    pub fn pick<'a>(&self, bg: &'a str, en: &'a str) -> &'a str {
        self.language().pick(bg, en)
    }
}
