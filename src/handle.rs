//! Stable handles and object kinds.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque, process-stable identifier of a stored object.
///
/// Handles are minted by the storage collaborator and never reused. Entities
/// refer to each other only through handles, which keeps Person↔Family and
/// other reference cycles out of the ownership graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Handle(String);

impl Handle {
    /// Wrap an already-minted handle string.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Handle(value.into())
    }

    /// The handle text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The kind of a stored object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    /// [`Person`](crate::person::Person)
    Person,
    /// [`Family`](crate::family::Family)
    Family,
    /// [`Event`](crate::event::Event)
    Event,
    /// [`Source`](crate::source::Source)
    Source,
    /// [`Repository`](crate::source::Repository)
    Repository,
    /// [`Place`](crate::place::Place)
    Place,
    /// [`MediaObject`](crate::media::MediaObject)
    Media,
    /// [`Note`](crate::note::Note)
    Note,
}

impl ObjectKind {
    /// All kinds, in storage order.
    pub const ALL: [ObjectKind; 8] = [
        ObjectKind::Person,
        ObjectKind::Family,
        ObjectKind::Event,
        ObjectKind::Source,
        ObjectKind::Repository,
        ObjectKind::Place,
        ObjectKind::Media,
        ObjectKind::Note,
    ];

    /// Prefix used for human-readable ids of this kind (`I0001`, `F0001`, ...).
    #[must_use]
    pub const fn id_prefix(&self) -> &'static str {
        match self {
            ObjectKind::Person => "I",
            ObjectKind::Family => "F",
            ObjectKind::Event => "E",
            ObjectKind::Source => "S",
            ObjectKind::Repository => "R",
            ObjectKind::Place => "P",
            ObjectKind::Media => "O",
            ObjectKind::Note => "N",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObjectKind::Person => "person",
            ObjectKind::Family => "family",
            ObjectKind::Event => "event",
            ObjectKind::Source => "source",
            ObjectKind::Repository => "repository",
            ObjectKind::Place => "place",
            ObjectKind::Media => "media",
            ObjectKind::Note => "note",
        };
        f.write_str(name)
    }
}
