//! Sources, citations, and repositories.

use crate::date::Date;
use crate::handle::Handle;
use crate::media::MediaRef;
use crate::place::Address;
use serde::{Deserialize, Serialize};

/// Citation confidence on a five-level scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum Confidence {
    /// 0
    VeryLow,
    /// 1
    Low,
    /// 2 (default)
    #[default]
    Normal,
    /// 3
    High,
    /// 4
    VeryHigh,
}

impl Confidence {
    /// Map a GEDCOM `QUAY` value (0-3) onto the five-level scale.
    ///
    /// Values above 1 are shifted up by one, so 0→VeryLow, 1→Low, 2→High,
    /// 3→VeryHigh; `Normal` is never produced from `QUAY`. Returns `None` for
    /// anything that is not an integer 0-3.
    #[must_use]
    pub fn from_quay(value: &str) -> Option<Self> {
        let raw: u8 = value.trim().parse().ok()?;
        let level = if raw > 1 { raw + 1 } else { raw };
        Self::from_level(level)
    }

    /// Confidence from its stored level (0-4).
    #[must_use]
    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            0 => Some(Confidence::VeryLow),
            1 => Some(Confidence::Low),
            2 => Some(Confidence::Normal),
            3 => Some(Confidence::High),
            4 => Some(Confidence::VeryHigh),
            _ => None,
        }
    }

    /// Stored level (0-4).
    #[must_use]
    pub fn level(&self) -> u8 {
        *self as u8
    }
}

/// A citation of a source, attached to the citing object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    /// The cited source
    pub source: Handle,
    /// Where in the source (PAGE)
    pub page: String,
    /// Date of the entry in the source (DATA.DATE)
    pub date: Option<Date>,
    /// Confidence
    pub confidence: Confidence,
    /// Transcribed text (TEXT, DATA.TEXT)
    pub text: String,
    /// Attached notes
    pub notes: Vec<Handle>,
    /// Media references
    pub media_refs: Vec<MediaRef>,
}

impl SourceRef {
    /// A citation with default confidence and no detail.
    #[must_use]
    pub fn new(source: Handle) -> Self {
        SourceRef {
            source,
            page: String::new(),
            date: None,
            confidence: Confidence::Normal,
            text: String::new(),
            notes: Vec::new(),
            media_refs: Vec::new(),
        }
    }
}

/// A reference from a source to the repository holding it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoRef {
    /// The repository
    pub repository: Handle,
    /// Call number (CALN)
    pub call_number: String,
    /// Medium (CALN.MEDI)
    pub media_type: String,
    /// Attached notes
    pub notes: Vec<Handle>,
}

/// A source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    /// Storage handle
    pub handle: Handle,
    /// Human-readable id (`S0001`)
    pub gramps_id: String,
    /// Import provenance key
    pub origin: Option<String>,
    /// Title (TITL)
    pub title: String,
    /// Author (AUTH)
    pub author: String,
    /// Publication facts (PUBL)
    pub pubinfo: String,
    /// Abbreviation (ABBR)
    pub abbrev: String,
    /// Repositories holding the source
    pub repo_refs: Vec<RepoRef>,
    /// Media references
    pub media_refs: Vec<MediaRef>,
    /// Attached notes
    pub notes: Vec<Handle>,
}

impl Source {
    /// Create an empty source.
    #[must_use]
    pub fn new(handle: Handle, gramps_id: impl Into<String>) -> Self {
        Source {
            handle,
            gramps_id: gramps_id.into(),
            origin: None,
            title: String::new(),
            author: String::new(),
            pubinfo: String::new(),
            abbrev: String::new(),
            repo_refs: Vec::new(),
            media_refs: Vec::new(),
            notes: Vec::new(),
        }
    }
}

/// A repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    /// Storage handle
    pub handle: Handle,
    /// Human-readable id (`R0001`)
    pub gramps_id: String,
    /// Import provenance key
    pub origin: Option<String>,
    /// Name
    pub name: String,
    /// Postal address
    pub address: Option<Address>,
    /// Web addresses and e-mail
    pub urls: Vec<String>,
    /// Attached notes
    pub notes: Vec<Handle>,
}

impl Repository {
    /// Create an empty repository.
    #[must_use]
    pub fn new(handle: Handle, gramps_id: impl Into<String>) -> Self {
        Repository {
            handle,
            gramps_id: gramps_id.into(),
            origin: None,
            name: String::new(),
            address: None,
            urls: Vec::new(),
            notes: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quay_shift_above_one() {
        assert_eq!(Confidence::from_quay("0"), Some(Confidence::VeryLow));
        assert_eq!(Confidence::from_quay("1"), Some(Confidence::Low));
        assert_eq!(Confidence::from_quay("2"), Some(Confidence::High));
        assert_eq!(Confidence::from_quay("3"), Some(Confidence::VeryHigh));
    }

    #[test]
    fn test_quay_stored_levels() {
        let levels: Vec<u8> = ["0", "1", "2", "3"]
            .iter()
            .map(|q| Confidence::from_quay(q).unwrap().level())
            .collect();
        assert_eq!(levels, vec![0, 1, 3, 4]);
    }

    #[test]
    fn test_quay_rejects_out_of_range() {
        assert_eq!(Confidence::from_quay("4"), None);
        assert_eq!(Confidence::from_quay("high"), None);
        assert_eq!(Confidence::from_quay(""), None);
    }
}
