//! Family records and child links.

use crate::attribute::{Attribute, LdsOrd};
use crate::event::EventRef;
use crate::handle::Handle;
use crate::media::MediaRef;
use crate::source::SourceRef;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Relation between a child and one parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ChildRelation {
    /// Biological child (default when nothing says otherwise)
    #[default]
    Birth,
    /// Adopted child
    Adopted,
    /// Foster child
    Foster,
    /// Step child
    Step,
    /// Explicitly unknown
    Unknown,
}

impl ChildRelation {
    /// Map pedigree text (`PEDI`, `_FREL`, `_MREL`, `_STAT`) to a relation.
    ///
    /// Returns `None` for text that names none of the relations, such as the
    /// proof statuses some programs write into `_STAT`.
    #[must_use]
    pub fn from_pedigree(value: &str) -> Option<Self> {
        let relation = match value.trim().to_ascii_lowercase().as_str() {
            "birth" | "natural" | "biological" | "birth child" => ChildRelation::Birth,
            "adopted" | "adoption" | "adopted child" => ChildRelation::Adopted,
            "foster" | "foster child" => ChildRelation::Foster,
            "step" | "stepchild" | "step child" | "stepson" | "stepdaughter" => ChildRelation::Step,
            "unknown" | "private" => ChildRelation::Unknown,
            _ => return None,
        };
        Some(relation)
    }
}

impl fmt::Display for ChildRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Birth => write!(f, "Birth"),
            Self::Adopted => write!(f, "Adopted"),
            Self::Foster => write!(f, "Foster"),
            Self::Step => write!(f, "Stepchild"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// A child's membership in a family, as seen from the family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildRef {
    /// The child
    pub person: Handle,
    /// Relation to the mother
    pub mother_relation: ChildRelation,
    /// Relation to the father
    pub father_relation: ChildRelation,
    /// Supporting citations
    pub citations: Vec<SourceRef>,
    /// Attached notes
    pub notes: Vec<Handle>,
}

impl ChildRef {
    /// Create a child reference.
    #[must_use]
    pub fn new(
        person: Handle,
        mother_relation: ChildRelation,
        father_relation: ChildRelation,
    ) -> Self {
        ChildRef {
            person,
            mother_relation,
            father_relation,
            citations: Vec::new(),
            notes: Vec::new(),
        }
    }
}

/// Kind of union.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FamilyRelType {
    /// Married couple
    Married,
    /// Unmarried partners
    Unmarried,
    /// Civil union
    CivilUnion,
    /// Nothing recorded
    #[default]
    Unknown,
    /// Any other label
    Other(String),
}

/// A family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Family {
    /// Storage handle
    pub handle: Handle,
    /// Human-readable id (`F0001`)
    pub gramps_id: String,
    /// Import provenance key
    pub origin: Option<String>,
    /// Father / husband
    pub father: Option<Handle>,
    /// Mother / wife
    pub mother: Option<Handle>,
    /// Children, in file order
    pub child_ref_list: Vec<ChildRef>,
    /// Kind of union
    pub rel_type: FamilyRelType,
    /// Event references
    pub event_refs: Vec<EventRef>,
    /// Attributes
    pub attributes: Vec<Attribute>,
    /// LDS sealings
    pub lds_ords: Vec<LdsOrd>,
    /// Media references
    pub media_refs: Vec<MediaRef>,
    /// Supporting citations
    pub citations: Vec<SourceRef>,
    /// Attached notes
    pub notes: Vec<Handle>,
}

impl Family {
    /// Create an empty family.
    #[must_use]
    pub fn new(handle: Handle, gramps_id: impl Into<String>) -> Self {
        Family {
            handle,
            gramps_id: gramps_id.into(),
            origin: None,
            father: None,
            mother: None,
            child_ref_list: Vec::new(),
            rel_type: FamilyRelType::Unknown,
            event_refs: Vec::new(),
            attributes: Vec::new(),
            lds_ords: Vec::new(),
            media_refs: Vec::new(),
            citations: Vec::new(),
            notes: Vec::new(),
        }
    }

    /// Add a child, or update the relations of one already present.
    ///
    /// Returns the index of the child reference.
    pub fn add_child(&mut self, child: ChildRef) -> usize {
        if let Some(index) = self
            .child_ref_list
            .iter()
            .position(|existing| existing.person == child.person)
        {
            let existing = &mut self.child_ref_list[index];
            existing.mother_relation = child.mother_relation;
            existing.father_relation = child.father_relation;
            existing.citations.extend(child.citations);
            existing.notes.extend(child.notes);
            return index;
        }
        self.child_ref_list.push(child);
        self.child_ref_list.len() - 1
    }

    /// Whether `person` is listed as a child.
    #[must_use]
    pub fn has_child(&self, person: &Handle) -> bool {
        self.child_ref_list.iter().any(|c| &c.person == person)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_relation_from_pedigree() {
        assert_eq!(ChildRelation::from_pedigree("birth"), Some(ChildRelation::Birth));
        assert_eq!(ChildRelation::from_pedigree("Adopted"), Some(ChildRelation::Adopted));
        assert_eq!(ChildRelation::from_pedigree(" FOSTER "), Some(ChildRelation::Foster));
        assert_eq!(ChildRelation::from_pedigree("step"), Some(ChildRelation::Step));
        assert_eq!(ChildRelation::from_pedigree("unknown"), Some(ChildRelation::Unknown));
        assert_eq!(ChildRelation::from_pedigree("proven"), None);
    }

    #[test]
    fn test_add_child_updates_existing() {
        let mut family = Family::new(Handle::new("f1"), "F0001");
        let child = Handle::new("c1");
        family.add_child(ChildRef::new(child.clone(), ChildRelation::Birth, ChildRelation::Birth));
        let index =
            family.add_child(ChildRef::new(child.clone(), ChildRelation::Birth, ChildRelation::Step));
        assert_eq!(index, 0);
        assert_eq!(family.child_ref_list.len(), 1);
        assert_eq!(family.child_ref_list[0].father_relation, ChildRelation::Step);
        assert!(family.has_child(&child));
    }
}
