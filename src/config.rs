//! Configuration options for GEDCOM import.
//!
//! This module provides the [`ImportConfig`] struct which controls character
//! decoding, continuation handling, error recovery and vendor tag translation.
//! A configuration is built once and passed by reference into the parser; it
//! is never mutated during a run.

use crate::encoding::GedcomEncoding;
use crate::recovery::RecoveryMode;
use crate::tags::TagTable;

/// Producers known to drop the space at a `CONC` split.
pub const DEFAULT_BROKEN_CONC_PRODUCERS: [&str; 2] = ["FTW", "FTM"];

/// Configuration for a GEDCOM import.
///
/// # Examples
///
/// ```
/// use gdrc::{ImportConfig, RecoveryMode};
///
/// // Default configuration (detect encoding, lenient recovery)
/// let config = ImportConfig::default();
///
/// // Strict import with a provenance namespace
/// let config = ImportConfig {
///     recovery_mode: RecoveryMode::Strict,
///     origin: "family-tree.ged".into(),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct ImportConfig {
    // === Decoding ===
    /// Force a character encoding.
    ///
    /// When `None` (default), the encoding comes from a byte-order mark or
    /// the header's `CHAR` line, falling back to the 8-bit default.
    pub encoding: Option<GedcomEncoding>,

    /// Join `CONC` segments with a space.
    ///
    /// When `None` (default), enabled automatically if the header's producer
    /// (`HEAD.SOUR`) is listed in [`broken_conc_producers`](Self::broken_conc_producers).
    pub broken_conc: Option<bool>,

    /// Producers for which `broken_conc` is enabled automatically.
    pub broken_conc_producers: Vec<String>,

    // === Error Handling ===
    /// What to do with malformed lines and unrecognized tags.
    pub recovery_mode: RecoveryMode,

    // === Identity ===
    /// Namespace mixed into every origin key.
    ///
    /// Importing the same file twice with the same namespace updates records
    /// in place; a different namespace imports them as new records.
    pub origin: String,

    // === Vocabulary ===
    /// Vendor tag translations.
    pub tag_table: TagTable,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            encoding: None,
            broken_conc: None,
            broken_conc_producers: DEFAULT_BROKEN_CONC_PRODUCERS
                .iter()
                .map(|p| (*p).to_string())
                .collect(),
            recovery_mode: RecoveryMode::default(),
            origin: String::new(),
            tag_table: TagTable::default(),
        }
    }
}

impl ImportConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Forces the character encoding.
    #[must_use]
    pub fn with_encoding(mut self, encoding: GedcomEncoding) -> Self {
        self.encoding = Some(encoding);
        self
    }

    /// Forces `CONC` joining on or off.
    #[must_use]
    pub fn with_broken_conc(mut self, enabled: bool) -> Self {
        self.broken_conc = Some(enabled);
        self
    }

    /// Sets the recovery mode.
    #[must_use]
    pub fn with_recovery_mode(mut self, mode: RecoveryMode) -> Self {
        self.recovery_mode = mode;
        self
    }

    /// Sets the origin namespace.
    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    /// Replaces the vendor tag table.
    #[must_use]
    pub fn with_tag_table(mut self, table: TagTable) -> Self {
        self.tag_table = table;
        self
    }

    /// Whether `CONC` joining applies to a file from `producer`.
    #[must_use]
    pub fn broken_conc_for(&self, producer: Option<&str>) -> bool {
        if let Some(forced) = self.broken_conc {
            return forced;
        }
        producer.is_some_and(|producer| {
            let producer = producer.trim();
            self.broken_conc_producers
                .iter()
                .any(|known| producer.eq_ignore_ascii_case(known))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ImportConfig::default();
        assert!(config.encoding.is_none());
        assert!(config.broken_conc.is_none());
        assert_eq!(config.recovery_mode, RecoveryMode::Lenient);
        assert!(config.origin.is_empty());
        assert!(!config.tag_table.is_empty());
    }

    #[test]
    fn test_broken_conc_auto_detect() {
        let config = ImportConfig::default();
        assert!(config.broken_conc_for(Some("FTW")));
        assert!(config.broken_conc_for(Some(" ftm ")));
        assert!(!config.broken_conc_for(Some("GRAMPS")));
        assert!(!config.broken_conc_for(None));
    }

    #[test]
    fn test_broken_conc_forced() {
        let config = ImportConfig::new().with_broken_conc(false);
        assert!(!config.broken_conc_for(Some("FTW")));
        let config = ImportConfig::new().with_broken_conc(true);
        assert!(config.broken_conc_for(None));
    }

    #[test]
    fn test_builder_chain() {
        let config = ImportConfig::new()
            .with_encoding(GedcomEncoding::Ansel)
            .with_recovery_mode(RecoveryMode::Strict)
            .with_origin("tree");
        assert_eq!(config.encoding, Some(GedcomEncoding::Ansel));
        assert_eq!(config.recovery_mode, RecoveryMode::Strict);
        assert_eq!(config.origin, "tree");
    }
}
