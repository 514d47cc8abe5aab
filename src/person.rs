//! Person records and their names.

use crate::attribute::{Attribute, LdsOrd};
use crate::event::EventRef;
use crate::family::ChildRelation;
use crate::handle::Handle;
use crate::media::MediaRef;
use crate::place::Address;
use crate::source::SourceRef;
use serde::{Deserialize, Serialize};

/// Biological sex as recorded by `SEX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Gender {
    /// M
    Male,
    /// F
    Female,
    /// U, or missing
    #[default]
    Unknown,
}

impl Gender {
    /// Interpret a `SEX` value. Only the first letter matters.
    #[must_use]
    pub fn from_sex_value(value: &str) -> Self {
        match value.trim().chars().next().map(|c| c.to_ascii_uppercase()) {
            Some('M') => Gender::Male,
            Some('F') => Gender::Female,
            _ => Gender::Unknown,
        }
    }
}

/// Kind of a [`Name`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NameType {
    /// Name given at birth (default)
    #[default]
    Birth,
    /// Also-known-as
    Aka,
    /// Name taken at marriage
    Married,
    /// Any other label from `NAME.TYPE`
    Custom(String),
}

impl NameType {
    /// Interpret a `NAME.TYPE` value.
    #[must_use]
    pub fn from_type_value(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "birth" => NameType::Birth,
            "aka" | "also known as" | "nickname" => NameType::Aka,
            "married" => NameType::Married,
            _ => NameType::Custom(value.trim().to_string()),
        }
    }
}

/// A personal name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Name {
    /// Given names (GIVN, or text before the first `/`)
    pub first_name: String,
    /// Surname (SURN, or text between `/`)
    pub surname: String,
    /// Surname prefix such as "van" (SPFX)
    pub surname_prefix: String,
    /// Title such as "Dr." (NPFX)
    pub title: String,
    /// Suffix such as "Jr." (NSFX, or text after the closing `/`)
    pub suffix: String,
    /// Nickname (NICK)
    pub nickname: String,
    /// Name type
    pub name_type: NameType,
    /// Supporting citations
    pub citations: Vec<SourceRef>,
    /// Attached notes
    pub notes: Vec<Handle>,
}

impl Name {
    /// Split a GEDCOM `NAME` value (`Given /Surname/ Suffix`).
    ///
    /// Without slashes the whole value is taken as the given name.
    #[must_use]
    pub fn from_gedcom(value: &str) -> Self {
        let mut name = Name::default();
        let value = value.trim();
        match value.find('/') {
            Some(open) => {
                name.first_name = value[..open].trim().to_string();
                let rest = &value[open + 1..];
                match rest.find('/') {
                    Some(close) => {
                        name.surname = rest[..close].trim().to_string();
                        name.suffix = rest[close + 1..].trim().to_string();
                    },
                    None => name.surname = rest.trim().to_string(),
                }
            },
            None => name.first_name = value.to_string(),
        }
        name
    }

    /// Whether nothing at all has been filled in.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.first_name.is_empty()
            && self.surname.is_empty()
            && self.title.is_empty()
            && self.suffix.is_empty()
            && self.nickname.is_empty()
    }

    /// "Given Surname" for display.
    #[must_use]
    pub fn full_name(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        for part in [
            self.title.as_str(),
            self.first_name.as_str(),
            self.surname_prefix.as_str(),
            self.surname.as_str(),
            self.suffix.as_str(),
        ] {
            if !part.is_empty() {
                parts.push(part);
            }
        }
        parts.join(" ")
    }
}

/// A person's membership in a parent family, as seen from the child.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentFamily {
    /// The parent family
    pub family: Handle,
    /// Relation to the mother
    pub mother_relation: ChildRelation,
    /// Relation to the father
    pub father_relation: ChildRelation,
}

/// An association with another person (ASSO, ALIA).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonRef {
    /// The associated person
    pub person: Handle,
    /// Relationship description (RELA)
    pub relation: String,
    /// Supporting citations
    pub citations: Vec<SourceRef>,
    /// Attached notes
    pub notes: Vec<Handle>,
}

/// A person.
///
/// The first entry of [`parent_family_list`](Self::parent_family_list) is the
/// main parent family; the others are alternates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    /// Storage handle
    pub handle: Handle,
    /// Human-readable id (`I0001`)
    pub gramps_id: String,
    /// Import provenance key
    pub origin: Option<String>,
    /// Primary name
    pub primary_name: Name,
    /// Additional names
    pub alternate_names: Vec<Name>,
    /// Sex
    pub gender: Gender,
    /// Index into `event_refs` of the canonical birth
    pub birth_ref_index: Option<usize>,
    /// Index into `event_refs` of the canonical death
    pub death_ref_index: Option<usize>,
    /// All event references
    pub event_refs: Vec<EventRef>,
    /// Families in which this person is a spouse
    pub family_list: Vec<Handle>,
    /// Families in which this person is a child
    pub parent_family_list: Vec<ParentFamily>,
    /// Residential addresses
    pub addresses: Vec<Address>,
    /// Attributes
    pub attributes: Vec<Attribute>,
    /// Media references
    pub media_refs: Vec<MediaRef>,
    /// LDS ordinances
    pub lds_ords: Vec<LdsOrd>,
    /// Supporting citations
    pub citations: Vec<SourceRef>,
    /// Attached notes
    pub notes: Vec<Handle>,
    /// Associations with other people
    pub person_refs: Vec<PersonRef>,
    /// Web addresses and e-mail
    pub urls: Vec<String>,
}

impl Person {
    /// Create an empty person.
    #[must_use]
    pub fn new(handle: Handle, gramps_id: impl Into<String>) -> Self {
        Person {
            handle,
            gramps_id: gramps_id.into(),
            origin: None,
            primary_name: Name::default(),
            alternate_names: Vec::new(),
            gender: Gender::Unknown,
            birth_ref_index: None,
            death_ref_index: None,
            event_refs: Vec::new(),
            family_list: Vec::new(),
            parent_family_list: Vec::new(),
            addresses: Vec::new(),
            attributes: Vec::new(),
            media_refs: Vec::new(),
            lds_ords: Vec::new(),
            citations: Vec::new(),
            notes: Vec::new(),
            person_refs: Vec::new(),
            urls: Vec::new(),
        }
    }

    /// Add a name: the first becomes primary, the rest alternates.
    pub fn add_name(&mut self, name: Name) {
        if self.primary_name.is_empty() {
            self.primary_name = name;
        } else {
            self.alternate_names.push(name);
        }
    }

    /// Add a family in which this person is a spouse (no duplicates).
    pub fn add_family(&mut self, family: Handle) {
        if !self.family_list.contains(&family) {
            self.family_list.push(family);
        }
    }

    /// Add or update a parent family link.
    ///
    /// An existing link to the same family has its relations replaced.
    pub fn add_parent_family(
        &mut self,
        family: Handle,
        mother_relation: ChildRelation,
        father_relation: ChildRelation,
    ) {
        if let Some(link) = self
            .parent_family_list
            .iter_mut()
            .find(|link| link.family == family)
        {
            link.mother_relation = mother_relation;
            link.father_relation = father_relation;
            return;
        }
        self.parent_family_list.push(ParentFamily {
            family,
            mother_relation,
            father_relation,
        });
    }

    /// Make `family` the main parent family, if it is linked at all.
    pub fn set_main_parent_family(&mut self, family: &Handle) -> bool {
        match self
            .parent_family_list
            .iter()
            .position(|link| &link.family == family)
        {
            Some(index) => {
                let link = self.parent_family_list.remove(index);
                self.parent_family_list.insert(0, link);
                true
            },
            None => false,
        }
    }

    /// The main parent family, if any.
    #[must_use]
    pub fn main_parent_family(&self) -> Option<&Handle> {
        self.parent_family_list.first().map(|link| &link.family)
    }

    /// Add an event reference, returning its index.
    pub fn add_event_ref(&mut self, event_ref: EventRef) -> usize {
        if let Some(index) = self
            .event_refs
            .iter()
            .position(|existing| existing.event == event_ref.event)
        {
            self.event_refs[index] = event_ref;
            return index;
        }
        self.event_refs.push(event_ref);
        self.event_refs.len() - 1
    }

    /// The canonical birth reference.
    #[must_use]
    pub fn birth_ref(&self) -> Option<&EventRef> {
        self.birth_ref_index.and_then(|i| self.event_refs.get(i))
    }

    /// The canonical death reference.
    #[must_use]
    pub fn death_ref(&self) -> Option<&EventRef> {
        self.death_ref_index.and_then(|i| self.event_refs.get(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_from_gedcom() {
        let name = Name::from_gedcom("John Quincy /Adams/ Jr.");
        assert_eq!(name.first_name, "John Quincy");
        assert_eq!(name.surname, "Adams");
        assert_eq!(name.suffix, "Jr.");
    }

    #[test]
    fn test_name_without_slashes_is_given_name() {
        let name = Name::from_gedcom("Cher");
        assert_eq!(name.first_name, "Cher");
        assert!(name.surname.is_empty());
    }

    #[test]
    fn test_name_with_unclosed_surname() {
        let name = Name::from_gedcom("Jane /Doe");
        assert_eq!(name.first_name, "Jane");
        assert_eq!(name.surname, "Doe");
    }

    #[test]
    fn test_full_name() {
        let mut name = Name::from_gedcom("Jane /Doe/");
        name.title = "Dr.".to_string();
        assert_eq!(name.full_name(), "Dr. Jane Doe");
    }

    #[test]
    fn test_gender_from_sex_value() {
        assert_eq!(Gender::from_sex_value("M"), Gender::Male);
        assert_eq!(Gender::from_sex_value("female"), Gender::Female);
        assert_eq!(Gender::from_sex_value("X"), Gender::Unknown);
        assert_eq!(Gender::from_sex_value(""), Gender::Unknown);
    }

    #[test]
    fn test_parent_family_main_and_update() {
        let mut person = Person::new(Handle::new("h1"), "I0001");
        let f1 = Handle::new("f1");
        let f2 = Handle::new("f2");
        person.add_parent_family(f1.clone(), ChildRelation::Birth, ChildRelation::Birth);
        person.add_parent_family(f2.clone(), ChildRelation::Adopted, ChildRelation::Adopted);
        assert_eq!(person.main_parent_family(), Some(&f1));

        assert!(person.set_main_parent_family(&f2));
        assert_eq!(person.main_parent_family(), Some(&f2));
        assert_eq!(person.parent_family_list.len(), 2);

        person.add_parent_family(f1.clone(), ChildRelation::Foster, ChildRelation::Birth);
        assert_eq!(person.parent_family_list.len(), 2);
        assert_eq!(
            person.parent_family_list[1].mother_relation,
            ChildRelation::Foster
        );
    }

    #[test]
    fn test_add_family_is_idempotent() {
        let mut person = Person::new(Handle::new("h1"), "I0001");
        person.add_family(Handle::new("f1"));
        person.add_family(Handle::new("f1"));
        assert_eq!(person.family_list.len(), 1);
    }
}
