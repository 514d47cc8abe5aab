//! Updating stored entities from a re-import.
//!
//! A file only restates what it knows about a record. When an entity already
//! exists in storage, the freshly parsed one is folded into the stored copy:
//! fields the file fills in replace the stored values, lists gain the entries
//! they are missing, and everything else is left alone.

use crate::event::Event;
use crate::family::{Family, FamilyRelType};
use crate::media::MediaObject;
use crate::note::Note;
use crate::object::Object;
use crate::person::{Gender, Person};
use crate::place::Place;
use crate::source::{Repository, Source};

/// Fold a newer copy of an entity into the stored one.
pub trait Update {
    /// Apply everything `newer` carries onto `self`. Identity fields
    /// (`handle`, `gramps_id`) stay as stored.
    fn update_from(&mut self, newer: Self);
}

fn merge_list<T: PartialEq>(into: &mut Vec<T>, from: Vec<T>) {
    for item in from {
        if !into.contains(&item) {
            into.push(item);
        }
    }
}

fn merge_text(into: &mut String, from: String) {
    if !from.is_empty() {
        *into = from;
    }
}

fn merge_option<T>(into: &mut Option<T>, from: Option<T>) {
    if from.is_some() {
        *into = from;
    }
}

impl Update for Person {
    fn update_from(&mut self, newer: Self) {
        // Canonical birth/death are re-pointed by event handle
        let birth = newer.birth_ref().map(|r| r.event.clone());
        let death = newer.death_ref().map(|r| r.event.clone());

        merge_option(&mut self.origin, newer.origin);
        if !newer.primary_name.is_empty() {
            let previous = std::mem::replace(&mut self.primary_name, newer.primary_name);
            if previous != self.primary_name && !previous.is_empty() {
                merge_list(&mut self.alternate_names, vec![previous]);
            }
        }
        self.alternate_names.retain(|name| *name != self.primary_name);
        merge_list(&mut self.alternate_names, newer.alternate_names);
        if newer.gender != Gender::Unknown {
            self.gender = newer.gender;
        }

        for event_ref in newer.event_refs {
            self.add_event_ref(event_ref);
        }
        if let Some(birth) = birth {
            self.birth_ref_index = self.event_refs.iter().position(|r| r.event == birth);
        }
        if let Some(death) = death {
            self.death_ref_index = self.event_refs.iter().position(|r| r.event == death);
        }

        for family in newer.family_list {
            self.add_family(family);
        }
        let main = newer.parent_family_list.first().map(|link| link.family.clone());
        for link in newer.parent_family_list {
            self.add_parent_family(link.family, link.mother_relation, link.father_relation);
        }
        if let Some(main) = main {
            self.set_main_parent_family(&main);
        }

        merge_list(&mut self.addresses, newer.addresses);
        merge_list(&mut self.attributes, newer.attributes);
        merge_list(&mut self.media_refs, newer.media_refs);
        merge_list(&mut self.lds_ords, newer.lds_ords);
        merge_list(&mut self.citations, newer.citations);
        merge_list(&mut self.notes, newer.notes);
        merge_list(&mut self.person_refs, newer.person_refs);
        merge_list(&mut self.urls, newer.urls);
    }
}

impl Update for Family {
    fn update_from(&mut self, newer: Self) {
        merge_option(&mut self.origin, newer.origin);
        merge_option(&mut self.father, newer.father);
        merge_option(&mut self.mother, newer.mother);
        for child in newer.child_ref_list {
            if let Some(existing) = self.child_ref_list.iter_mut().find(|c| c.person == child.person) {
                existing.mother_relation = child.mother_relation;
                existing.father_relation = child.father_relation;
                merge_list(&mut existing.citations, child.citations);
                merge_list(&mut existing.notes, child.notes);
            } else {
                self.child_ref_list.push(child);
            }
        }
        if newer.rel_type != FamilyRelType::Unknown {
            self.rel_type = newer.rel_type;
        }
        merge_list(&mut self.event_refs, newer.event_refs);
        merge_list(&mut self.attributes, newer.attributes);
        merge_list(&mut self.lds_ords, newer.lds_ords);
        merge_list(&mut self.media_refs, newer.media_refs);
        merge_list(&mut self.citations, newer.citations);
        merge_list(&mut self.notes, newer.notes);
    }
}

impl Update for Event {
    fn update_from(&mut self, newer: Self) {
        merge_option(&mut self.origin, newer.origin);
        self.event_type = newer.event_type;
        merge_option(&mut self.date, newer.date);
        merge_option(&mut self.place, newer.place);
        merge_text(&mut self.description, newer.description);
        merge_text(&mut self.cause, newer.cause);
        merge_list(&mut self.attributes, newer.attributes);
        merge_list(&mut self.citations, newer.citations);
        merge_list(&mut self.notes, newer.notes);
        merge_list(&mut self.media_refs, newer.media_refs);
        merge_list(&mut self.witnesses, newer.witnesses);
    }
}

impl Update for Source {
    fn update_from(&mut self, newer: Self) {
        merge_option(&mut self.origin, newer.origin);
        merge_text(&mut self.title, newer.title);
        merge_text(&mut self.author, newer.author);
        merge_text(&mut self.pubinfo, newer.pubinfo);
        merge_text(&mut self.abbrev, newer.abbrev);
        merge_list(&mut self.repo_refs, newer.repo_refs);
        merge_list(&mut self.media_refs, newer.media_refs);
        merge_list(&mut self.notes, newer.notes);
    }
}

impl Update for Repository {
    fn update_from(&mut self, newer: Self) {
        merge_option(&mut self.origin, newer.origin);
        merge_text(&mut self.name, newer.name);
        merge_option(&mut self.address, newer.address);
        merge_list(&mut self.urls, newer.urls);
        merge_list(&mut self.notes, newer.notes);
    }
}

impl Update for Place {
    fn update_from(&mut self, newer: Self) {
        merge_option(&mut self.origin, newer.origin);
        merge_text(&mut self.title, newer.title);
        if !newer.location.is_empty() {
            self.location = newer.location;
        }
        merge_list(&mut self.alt_locations, newer.alt_locations);
        merge_text(&mut self.latitude, newer.latitude);
        merge_text(&mut self.longitude, newer.longitude);
        merge_list(&mut self.citations, newer.citations);
        merge_list(&mut self.notes, newer.notes);
    }
}

impl Update for MediaObject {
    fn update_from(&mut self, newer: Self) {
        merge_option(&mut self.origin, newer.origin);
        merge_text(&mut self.path, newer.path);
        merge_text(&mut self.mime, newer.mime);
        merge_text(&mut self.description, newer.description);
        merge_list(&mut self.citations, newer.citations);
        merge_list(&mut self.notes, newer.notes);
    }
}

impl Update for Note {
    fn update_from(&mut self, newer: Self) {
        merge_option(&mut self.origin, newer.origin);
        merge_text(&mut self.text, newer.text);
        merge_list(&mut self.citations, newer.citations);
    }
}

impl Update for Object {
    /// Objects of different kinds never share a handle; a mismatch replaces
    /// the stored object outright.
    fn update_from(&mut self, newer: Self) {
        match (self, newer) {
            (Object::Person(stored), Object::Person(newer)) => stored.update_from(newer),
            (Object::Family(stored), Object::Family(newer)) => stored.update_from(newer),
            (Object::Event(stored), Object::Event(newer)) => stored.update_from(newer),
            (Object::Source(stored), Object::Source(newer)) => stored.update_from(newer),
            (Object::Repository(stored), Object::Repository(newer)) => stored.update_from(newer),
            (Object::Place(stored), Object::Place(newer)) => stored.update_from(newer),
            (Object::Media(stored), Object::Media(newer)) => stored.update_from(newer),
            (Object::Note(stored), Object::Note(newer)) => stored.update_from(newer),
            (stored, newer) => *stored = newer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventRef, EventRole, EventType};
    use crate::handle::Handle;
    use crate::person::Name;

    #[test]
    fn test_person_keeps_fields_the_file_omits() {
        let mut stored = Person::new(Handle::new("p1"), "I0001");
        stored.gender = Gender::Male;
        stored.urls.push("https://example.org/john".to_string());
        stored.primary_name = Name::from_gedcom("Johnny /Smith/");

        let mut newer = Person::new(Handle::new("p1"), "I0001");
        newer.primary_name = Name::from_gedcom("John /Smith/");
        stored.update_from(newer);

        assert_eq!(stored.gender, Gender::Male);
        assert_eq!(stored.urls, vec!["https://example.org/john".to_string()]);
        assert_eq!(stored.primary_name.first_name, "John");
        assert_eq!(stored.alternate_names[0].first_name, "Johnny");
    }

    #[test]
    fn test_person_birth_index_follows_handle() {
        let mut stored = Person::new(Handle::new("p1"), "I0001");
        stored.add_event_ref(EventRef::new(Handle::new("e-old"), EventRole::Primary));

        let mut newer = Person::new(Handle::new("p1"), "I0001");
        newer.add_event_ref(EventRef::new(Handle::new("e-birth"), EventRole::Primary));
        newer.birth_ref_index = Some(0);
        stored.update_from(newer);

        assert_eq!(stored.event_refs.len(), 2);
        assert_eq!(stored.birth_ref().map(|r| r.event.as_str()), Some("e-birth"));
    }

    #[test]
    fn test_lists_are_not_duplicated() {
        let mut stored = Event::new(Handle::new("e1"), "E0001", EventType::Birth);
        stored.notes.push(Handle::new("n1"));
        let mut newer = Event::new(Handle::new("e1"), "E0001", EventType::Birth);
        newer.notes.push(Handle::new("n1"));
        newer.description = "at home".to_string();
        stored.update_from(newer);
        assert_eq!(stored.notes.len(), 1);
        assert_eq!(stored.description, "at home");
    }

    #[test]
    fn test_kind_mismatch_replaces() {
        let mut stored = Object::from(Note::new(Handle::new("x"), "N0001", "old"));
        stored.update_from(Object::from(Source::new(Handle::new("x"), "S0001")));
        assert!(matches!(stored, Object::Source(_)));
    }
}
