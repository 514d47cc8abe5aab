//! Common interface over all stored entity kinds.
//!
//! [`GenealogyObject`] gives uniform access to identity fields, and [`Object`]
//! is the tagged union handed to the storage collaborator.

use crate::event::Event;
use crate::family::Family;
use crate::handle::{Handle, ObjectKind};
use crate::media::MediaObject;
use crate::note::Note;
use crate::person::Person;
use crate::place::Place;
use crate::source::{Repository, Source};
use crate::{impl_genealogy_object, with_object};
use serde::{Deserialize, Serialize};

/// Identity shared by every stored entity.
pub trait GenealogyObject {
    /// Kind of entity.
    fn kind(&self) -> ObjectKind;

    /// Storage handle.
    fn handle(&self) -> &Handle;

    /// Human-readable id.
    fn gramps_id(&self) -> &str;

    /// Import provenance key, if the entity came from an import.
    fn origin(&self) -> Option<&str>;

    /// Replace the provenance key.
    fn set_origin(&mut self, origin: Option<String>);
}

/// Any stored entity.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Object {
    Person(Person),
    Family(Family),
    Event(Event),
    Source(Source),
    Repository(Repository),
    Place(Place),
    Media(MediaObject),
    Note(Note),
}

impl_genealogy_object!(Person, Person);
impl_genealogy_object!(Family, Family);
impl_genealogy_object!(Event, Event);
impl_genealogy_object!(Source, Source);
impl_genealogy_object!(Repository, Repository);
impl_genealogy_object!(Place, Place);
impl_genealogy_object!(MediaObject, Media);
impl_genealogy_object!(Note, Note);

impl GenealogyObject for Object {
    fn kind(&self) -> ObjectKind {
        with_object!(self, inner => inner.kind())
    }

    fn handle(&self) -> &Handle {
        with_object!(self, inner => inner.handle())
    }

    fn gramps_id(&self) -> &str {
        with_object!(self, inner => inner.gramps_id())
    }

    fn origin(&self) -> Option<&str> {
        with_object!(self, inner => inner.origin())
    }

    fn set_origin(&mut self, origin: Option<String>) {
        with_object!(self, inner => inner.set_origin(origin));
    }
}

impl Object {
    /// The person, if this is one.
    #[must_use]
    pub fn as_person(&self) -> Option<&Person> {
        match self {
            Object::Person(p) => Some(p),
            _ => None,
        }
    }

    /// The family, if this is one.
    #[must_use]
    pub fn as_family(&self) -> Option<&Family> {
        match self {
            Object::Family(f) => Some(f),
            _ => None,
        }
    }

    /// The event, if this is one.
    #[must_use]
    pub fn as_event(&self) -> Option<&Event> {
        match self {
            Object::Event(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_identity_dispatch() {
        let mut person = Person::new(Handle::new("p1"), "I0001");
        person.set_origin(Some("@I1@".to_string()));
        let object = Object::from(person);
        assert_eq!(object.kind(), ObjectKind::Person);
        assert_eq!(object.handle().as_str(), "p1");
        assert_eq!(object.origin(), Some("@I1@"));
        assert!(object.as_person().is_some());
        assert!(object.as_family().is_none());
    }
}
