//! Attributes and LDS ordinances shared by people, families and events.

use crate::date::Date;
use crate::handle::Handle;
use crate::source::SourceRef;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Type of an [`Attribute`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeType {
    /// CAST
    Caste,
    /// DSCR - physical description
    Description,
    /// IDNO - national id number
    IdNumber,
    /// NATI
    Nationality,
    /// NCHI
    NumChildren,
    /// NMR
    NumMarriages,
    /// SSN
    SocialSecurityNumber,
    /// Age of a participant in an event (from `AGE`)
    Age,
    /// Responsible agency (from `AGNC`)
    Agency,
    /// Any other label
    Custom(String),
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Caste => write!(f, "Caste"),
            Self::Description => write!(f, "Description"),
            Self::IdNumber => write!(f, "Identification Number"),
            Self::Nationality => write!(f, "Nationality"),
            Self::NumChildren => write!(f, "Number of Children"),
            Self::NumMarriages => write!(f, "Number of Marriages"),
            Self::SocialSecurityNumber => write!(f, "Social Security Number"),
            Self::Age => write!(f, "Age"),
            Self::Agency => write!(f, "Agency"),
            Self::Custom(label) => write!(f, "{label}"),
        }
    }
}

/// A typed value attached to a person, family or event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    /// Attribute type
    pub attr_type: AttributeType,
    /// Attribute value
    pub value: String,
    /// Supporting citations
    pub citations: Vec<SourceRef>,
    /// Attached notes
    pub notes: Vec<Handle>,
}

impl Attribute {
    /// Create an attribute with no citations or notes.
    #[must_use]
    pub fn new(attr_type: AttributeType, value: impl Into<String>) -> Self {
        Attribute {
            attr_type,
            value: value.into(),
            citations: Vec::new(),
            notes: Vec::new(),
        }
    }
}

/// Kind of LDS ordinance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LdsKind {
    /// BAPL
    Baptism,
    /// CONL
    Confirmation,
    /// ENDL
    Endowment,
    /// SLGC - sealed to parents
    SealedToParents,
    /// SLGS - sealed to spouse
    SealedToSpouse,
}

/// An LDS ordinance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LdsOrd {
    /// Ordinance kind
    pub kind: LdsKind,
    /// Date, when it could be parsed
    pub date: Option<Date>,
    /// Temple code (TEMP)
    pub temple: String,
    /// Place handle
    pub place: Option<Handle>,
    /// Status text (STAT)
    pub status: String,
    /// Family for SLGC
    pub family: Option<Handle>,
    /// Supporting citations
    pub citations: Vec<SourceRef>,
    /// Attached notes
    pub notes: Vec<Handle>,
}

impl LdsOrd {
    /// Create an empty ordinance of the given kind.
    #[must_use]
    pub fn new(kind: LdsKind) -> Self {
        LdsOrd {
            kind,
            date: None,
            temple: String::new(),
            place: None,
            status: String::new(),
            family: None,
            citations: Vec::new(),
            notes: Vec::new(),
        }
    }
}
