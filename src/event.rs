//! Events and event references.

use crate::attribute::Attribute;
use crate::date::Date;
use crate::handle::Handle;
use crate::media::MediaRef;
use crate::source::SourceRef;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Type of an [`Event`].
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    Birth,
    Death,
    Baptism,
    Christening,
    AdultChristening,
    Burial,
    Cremation,
    Adopted,
    BarMitzvah,
    BasMitzvah,
    Blessing,
    Confirmation,
    FirstCommunion,
    Ordination,
    Naturalization,
    Emigration,
    Immigration,
    Census,
    Probate,
    Will,
    Graduation,
    Retirement,
    Residence,
    Occupation,
    Education,
    Religion,
    Property,
    NobilityTitle,
    Degree,
    Elected,
    Marriage,
    Divorce,
    DivorceFiling,
    Engagement,
    MarriageBanns,
    MarriageContract,
    MarriageLicense,
    MarriageSettlement,
    Annulment,
    /// Anything else, with its label
    Custom(String),
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Birth => "Birth",
            Self::Death => "Death",
            Self::Baptism => "Baptism",
            Self::Christening => "Christening",
            Self::AdultChristening => "Adult Christening",
            Self::Burial => "Burial",
            Self::Cremation => "Cremation",
            Self::Adopted => "Adopted",
            Self::BarMitzvah => "Bar Mitzvah",
            Self::BasMitzvah => "Bas Mitzvah",
            Self::Blessing => "Blessing",
            Self::Confirmation => "Confirmation",
            Self::FirstCommunion => "First Communion",
            Self::Ordination => "Ordination",
            Self::Naturalization => "Naturalization",
            Self::Emigration => "Emigration",
            Self::Immigration => "Immigration",
            Self::Census => "Census",
            Self::Probate => "Probate",
            Self::Will => "Will",
            Self::Graduation => "Graduation",
            Self::Retirement => "Retirement",
            Self::Residence => "Residence",
            Self::Occupation => "Occupation",
            Self::Education => "Education",
            Self::Religion => "Religion",
            Self::Property => "Property",
            Self::NobilityTitle => "Nobility Title",
            Self::Degree => "Degree",
            Self::Elected => "Elected",
            Self::Marriage => "Marriage",
            Self::Divorce => "Divorce",
            Self::DivorceFiling => "Divorce Filing",
            Self::Engagement => "Engagement",
            Self::MarriageBanns => "Marriage Banns",
            Self::MarriageContract => "Marriage Contract",
            Self::MarriageLicense => "Marriage License",
            Self::MarriageSettlement => "Marriage Settlement",
            Self::Annulment => "Annulment",
            Self::Custom(label) => label,
        };
        f.write_str(label)
    }
}

/// Someone who witnessed an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Witness {
    /// A person in the tree
    Person(Handle),
    /// A name given only as text
    Named(String),
}

/// An event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Storage handle
    pub handle: Handle,
    /// Human-readable id (`E0001`)
    pub gramps_id: String,
    /// Import provenance key
    pub origin: Option<String>,
    /// Event type
    pub event_type: EventType,
    /// Structured date; text-only when the date could not be parsed
    pub date: Option<Date>,
    /// Place
    pub place: Option<Handle>,
    /// Free-text description
    pub description: String,
    /// Cause (CAUS)
    pub cause: String,
    /// Attributes such as age and agency
    pub attributes: Vec<Attribute>,
    /// Supporting citations
    pub citations: Vec<SourceRef>,
    /// Attached notes
    pub notes: Vec<Handle>,
    /// Media references
    pub media_refs: Vec<MediaRef>,
    /// Witnesses
    pub witnesses: Vec<Witness>,
}

impl Event {
    /// Create an event of the given type.
    #[must_use]
    pub fn new(handle: Handle, gramps_id: impl Into<String>, event_type: EventType) -> Self {
        Event {
            handle,
            gramps_id: gramps_id.into(),
            origin: None,
            event_type,
            date: None,
            place: None,
            description: String::new(),
            cause: String::new(),
            attributes: Vec::new(),
            citations: Vec::new(),
            notes: Vec::new(),
            media_refs: Vec::new(),
            witnesses: Vec::new(),
        }
    }
}

/// Role of the referencing object in an event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EventRole {
    /// The person the event is about
    #[default]
    Primary,
    /// The family the event is about
    Family,
    /// Any other role
    Custom(String),
}

/// Reference from a person or family to an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRef {
    /// The event
    pub event: Handle,
    /// Role of the referencing object
    pub role: EventRole,
}

impl EventRef {
    /// Create an event reference.
    #[must_use]
    pub fn new(event: Handle, role: EventRole) -> Self {
        EventRef { event, role }
    }
}
