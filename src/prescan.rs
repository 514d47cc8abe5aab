//! Stage One: a single forward scan before the main parse.
//!
//! The scan works on physical lines without folding or transcoding. It
//! detects the declared character set and producer, counts lines and records
//! for progress reporting, and harvests the person↔family linkage from both
//! sides of the file. Many producers write only one side (`CHIL` without the
//! matching `FAMC`, or the reverse), so the main parse consults these maps to
//! build both sides consistently.
//!
//! The result is read-only once the scan finishes.

use crate::encoding::GedcomEncoding;
use crate::error::{GedcomError, Result};
use crate::family::ChildRelation;
use crate::person::Gender;
use crate::reader::{pointer_token, Physical, PhysicalLines, RawLine};
use crate::tags::Tag;
use indexmap::IndexMap;
use smallvec::SmallVec;
use std::collections::HashMap;
use tracing::debug;

/// A short list of xrefs, usually one or two entries.
pub type XrefList = SmallVec<[String; 2]>;

const MAX_TRACKED_DEPTH: usize = 4;

/// Relation annotations for one child in one family, merged in file order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RelationNote {
    /// Relation to the father, if any annotation named it
    pub father: Option<ChildRelation>,
    /// Relation to the mother, if any annotation named it
    pub mother: Option<ChildRelation>,
    /// `_PRIMARY Y` was seen on the link
    pub primary: bool,
}

impl RelationNote {
    fn set_both(&mut self, relation: ChildRelation) {
        self.father = Some(relation);
        self.mother = Some(relation);
    }
}

/// Everything Stage One learns about a file.
#[derive(Debug, Clone, Default)]
pub struct Prescan {
    /// `HEAD.CHAR` value as written
    pub char_value: Option<String>,
    /// `HEAD.SOUR` value (the producing program)
    pub producer: Option<String>,
    /// Family → children, from `CHIL`
    pub family_children: IndexMap<String, XrefList>,
    /// Family → spouses, from `HUSB`/`WIFE`
    pub family_spouses: IndexMap<String, XrefList>,
    /// Family → last `HUSB`
    pub family_husband: HashMap<String, String>,
    /// Family → last `WIFE`
    pub family_wife: HashMap<String, String>,
    /// Person → families as child, from `FAMC`
    pub person_famc: IndexMap<String, XrefList>,
    /// Person → families as spouse, from `FAMS`
    pub person_fams: IndexMap<String, XrefList>,
    /// Person → sex
    pub person_sex: HashMap<String, Gender>,
    /// (family, child) → relation annotations
    pub relations: HashMap<(String, String), RelationNote>,
    /// Physical lines in the file
    pub line_count: usize,
    /// Level-0 records, header and trailer included
    pub record_count: usize,
    /// `INDI` records
    pub person_count: usize,
    /// Whether a `0 TRLR` line was seen
    pub has_trailer: bool,
    spouse_in: IndexMap<String, XrefList>,
    child_in: IndexMap<String, XrefList>,
    famc_members: IndexMap<String, XrefList>,
    fams_members: IndexMap<String, XrefList>,
}

/// Spouse placement for one family, decided once from both sides of the file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpouseSlots<'a> {
    /// Person in the father slot
    pub father: Option<&'a str>,
    /// Person in the mother slot
    pub mother: Option<&'a str>,
    /// `FAMS` claimants for whom no slot was free
    pub unplaced: Vec<&'a str>,
}

impl SpouseSlots<'_> {
    /// Whether `person` is the family's father or mother.
    #[must_use]
    pub fn holds(&self, person: &str) -> bool {
        self.father == Some(person) || self.mother == Some(person)
    }
}

#[derive(Debug, Clone)]
struct Frame {
    tag: Tag,
    pointer: Option<String>,
}

fn push_unique(map: &mut IndexMap<String, XrefList>, key: &str, value: &str) {
    let list = map.entry(key.to_string()).or_default();
    if !list.iter().any(|v| v == value) {
        list.push(value.to_string());
    }
}

fn union<'a>(first: Option<&'a XrefList>, second: Option<&'a XrefList>) -> Vec<&'a str> {
    let mut out: Vec<&str> = Vec::new();
    for xref in first.into_iter().chain(second).flatten() {
        if !out.contains(&xref.as_str()) {
            out.push(xref);
        }
    }
    out
}

fn tag_of(raw: &RawLine<'_>) -> Tag {
    std::str::from_utf8(raw.tag).map_or(Tag::Unknown, Tag::from_text)
}

impl Prescan {
    /// Scan `data`, which must already be ASCII-compatible.
    ///
    /// # Errors
    ///
    /// Returns [`GedcomError::BadHeader`] if the first line is not `0 HEAD`.
    pub fn scan(data: &[u8]) -> Result<Prescan> {
        let mut scan = Prescan::default();
        let mut lines = PhysicalLines::new(data);

        match lines.next() {
            Some(Physical::Line(first)) if first.level == 0 && tag_of(&first) == Tag::Head => {
                scan.record_count = 1;
            },
            Some(Physical::Line(first)) => {
                return Err(GedcomError::BadHeader(format!(
                    "expected '0 HEAD' on line {}, found level {} tag '{}'",
                    first.line_no,
                    first.level,
                    String::from_utf8_lossy(first.tag)
                )));
            },
            Some(Physical::Malformed { line_no, reason }) => {
                return Err(GedcomError::BadHeader(format!(
                    "expected '0 HEAD' on line {line_no}: {reason}"
                )));
            },
            None => return Err(GedcomError::BadHeader("empty file".to_string())),
        }

        let mut frames: [Option<Frame>; MAX_TRACKED_DEPTH] = Default::default();
        frames[0] = Some(Frame {
            tag: Tag::Head,
            pointer: None,
        });

        while let Some(physical) = lines.next() {
            let Physical::Line(raw) = physical else {
                continue;
            };
            let tag = tag_of(&raw);
            let value = String::from_utf8_lossy(raw.value);
            let text = value.trim();
            let pointer = pointer_token(text).map(str::to_string);

            if raw.level == 0 {
                scan.record_count += 1;
                match tag {
                    Tag::Indi => scan.person_count += 1,
                    Tag::Trlr => scan.has_trailer = true,
                    _ => {},
                }
                frames = Default::default();
                frames[0] = Some(Frame {
                    tag,
                    pointer: raw.xref.map(|x| String::from_utf8_lossy(x).into_owned()),
                });
                continue;
            }
            if raw.level >= MAX_TRACKED_DEPTH {
                continue;
            }
            for frame in frames.iter_mut().skip(raw.level + 1) {
                *frame = None;
            }
            frames[raw.level] = Some(Frame {
                tag,
                pointer: pointer.clone(),
            });
            scan.observe(&frames, raw.level, tag, text, pointer.as_deref());
        }

        scan.line_count = lines.line_no();
        scan.invert();
        debug!(
            lines = scan.line_count,
            records = scan.record_count,
            persons = scan.person_count,
            families = scan.family_children.len().max(scan.family_spouses.len()),
            "prescan complete"
        );
        Ok(scan)
    }

    fn observe(
        &mut self,
        frames: &[Option<Frame>; MAX_TRACKED_DEPTH],
        level: usize,
        tag: Tag,
        text: &str,
        pointer: Option<&str>,
    ) {
        let Some(record) = frames[0].as_ref() else {
            return;
        };
        let frame_at = |depth: usize| frames[depth].as_ref();

        match (record.tag, level) {
            (Tag::Head, 1) => match tag {
                Tag::Sour => self.producer = Some(text.to_string()),
                Tag::Char => self.char_value = Some(text.to_string()),
                _ => {},
            },
            (Tag::Indi, _) => {
                let Some(person) = record.pointer.as_deref() else {
                    return;
                };
                match (level, tag, pointer) {
                    (1, Tag::Famc, Some(family)) => push_unique(&mut self.person_famc, person, family),
                    (1, Tag::Fams, Some(family)) => push_unique(&mut self.person_fams, person, family),
                    (1, Tag::Sex, _) => {
                        self.person_sex
                            .insert(person.to_string(), Gender::from_sex_value(text));
                    },
                    (2, _, _) => {
                        if let Some(Frame {
                            tag: Tag::Famc,
                            pointer: Some(family),
                        }) = frame_at(1)
                        {
                            self.annotate(family, person, tag, text);
                        } else if let (Some(Frame { tag: Tag::Adop, .. }), Tag::Famc, Some(family)) =
                            (frame_at(1), tag, pointer)
                        {
                            push_unique(&mut self.person_famc, person, family);
                            self.note_mut(family, person).set_both(ChildRelation::Adopted);
                        }
                    },
                    (3, Tag::Adop, _) => {
                        if let (
                            Some(Frame { tag: Tag::Adop, .. }),
                            Some(Frame {
                                tag: Tag::Famc,
                                pointer: Some(family),
                            }),
                        ) = (frame_at(1), frame_at(2))
                        {
                            let note = self.note_mut(family, person);
                            match text.to_ascii_uppercase().as_str() {
                                "HUSB" => {
                                    note.father = Some(ChildRelation::Adopted);
                                    note.mother = Some(ChildRelation::Birth);
                                },
                                "WIFE" => {
                                    note.father = Some(ChildRelation::Birth);
                                    note.mother = Some(ChildRelation::Adopted);
                                },
                                _ => note.set_both(ChildRelation::Adopted),
                            }
                        }
                    },
                    _ => {},
                }
            },
            (Tag::Fam, _) => {
                let Some(family) = record.pointer.as_deref() else {
                    return;
                };
                match (level, tag, pointer) {
                    (1, Tag::Chil, Some(child)) => {
                        push_unique(&mut self.family_children, family, child);
                    },
                    (1, Tag::Husb | Tag::Wife, Some(spouse)) => {
                        push_unique(&mut self.family_spouses, family, spouse);
                        let slot = if tag == Tag::Husb {
                            &mut self.family_husband
                        } else {
                            &mut self.family_wife
                        };
                        slot.insert(family.to_string(), spouse.to_string());
                    },
                    (2, _, _) => {
                        if let Some(Frame {
                            tag: Tag::Chil,
                            pointer: Some(child),
                        }) = frame_at(1)
                        {
                            self.annotate(family, child, tag, text);
                        }
                    },
                    _ => {},
                }
            },
            _ => {},
        }
    }

    fn note_mut(&mut self, family: &str, child: &str) -> &mut RelationNote {
        self.relations
            .entry((family.to_string(), child.to_string()))
            .or_default()
    }

    /// Apply one relation annotation on a child-to-family link.
    fn annotate(&mut self, family: &str, child: &str, tag: Tag, text: &str) {
        match tag {
            Tag::Pedi | Tag::VendorStatus => {
                if let Some(relation) = ChildRelation::from_pedigree(text) {
                    self.note_mut(family, child).set_both(relation);
                }
            },
            Tag::Frel => {
                if let Some(relation) = ChildRelation::from_pedigree(text) {
                    self.note_mut(family, child).father = Some(relation);
                }
            },
            Tag::Mrel => {
                if let Some(relation) = ChildRelation::from_pedigree(text) {
                    self.note_mut(family, child).mother = Some(relation);
                }
            },
            Tag::Primary => {
                if text.to_ascii_uppercase().starts_with('Y') {
                    self.note_mut(family, child).primary = true;
                }
            },
            _ => {},
        }
    }

    fn invert(&mut self) {
        for (family, spouses) in &self.family_spouses {
            for spouse in spouses {
                push_unique(&mut self.spouse_in, spouse, family);
            }
        }
        for (family, children) in &self.family_children {
            for child in children {
                push_unique(&mut self.child_in, child, family);
            }
        }
        for (person, families) in &self.person_famc {
            for family in families {
                push_unique(&mut self.famc_members, family, person);
            }
        }
        for (person, families) in &self.person_fams {
            for family in families {
                push_unique(&mut self.fams_members, family, person);
            }
        }
    }

    /// Encoding declared by `HEAD.CHAR`, if any.
    #[must_use]
    pub fn declared_encoding(&self) -> Option<GedcomEncoding> {
        self.char_value
            .as_deref()
            .map(GedcomEncoding::from_char_value)
    }

    /// Families in which `person` is a spouse: own `FAMS` first, then families
    /// naming the person as `HUSB`/`WIFE`.
    #[must_use]
    pub fn families_as_spouse(&self, person: &str) -> Vec<&str> {
        union(self.person_fams.get(person), self.spouse_in.get(person))
    }

    /// Families in which `person` is a child: own `FAMC` first, then families
    /// listing the person as `CHIL`.
    #[must_use]
    pub fn families_as_child(&self, person: &str) -> Vec<&str> {
        union(self.person_famc.get(person), self.child_in.get(person))
    }

    /// Children of `family`: `CHIL` first, then persons naming it in `FAMC`.
    #[must_use]
    pub fn children_of(&self, family: &str) -> Vec<&str> {
        union(self.family_children.get(family), self.famc_members.get(family))
    }

    /// Persons naming `family` in their `FAMS`.
    #[must_use]
    pub fn spouses_claiming(&self, family: &str) -> Vec<&str> {
        union(self.fams_members.get(family), None)
    }

    /// Father and mother of `family` as the import records them.
    ///
    /// The family's own `HUSB` and `WIFE` come first. Persons naming the
    /// family in `FAMS` then fill a free slot by sex (unknown sex takes the
    /// father slot if it is free); claimants left without a slot are
    /// returned in `unplaced`.
    #[must_use]
    pub fn spouse_slots(&self, family: &str) -> SpouseSlots<'_> {
        let mut slots = SpouseSlots {
            father: self.family_husband.get(family).map(String::as_str),
            mother: self.family_wife.get(family).map(String::as_str),
            unplaced: Vec::new(),
        };
        for person in self.spouses_claiming(family) {
            if slots.holds(person) {
                continue;
            }
            let slot = match self.sex(person) {
                Gender::Male => &mut slots.father,
                Gender::Female => &mut slots.mother,
                Gender::Unknown if slots.father.is_none() => &mut slots.father,
                Gender::Unknown => &mut slots.mother,
            };
            if slot.is_none() {
                *slot = Some(person);
            } else {
                slots.unplaced.push(person);
            }
        }
        slots
    }

    /// Relations of `child` in `family` as (mother, father), defaulting to birth.
    #[must_use]
    pub fn relation(&self, family: &str, child: &str) -> (ChildRelation, ChildRelation) {
        self.relations
            .get(&(family.to_string(), child.to_string()))
            .map_or((ChildRelation::Birth, ChildRelation::Birth), |note| {
                (
                    note.mother.unwrap_or_default(),
                    note.father.unwrap_or_default(),
                )
            })
    }

    /// Whether the link was marked `_PRIMARY Y`.
    #[must_use]
    pub fn is_primary(&self, family: &str, child: &str) -> bool {
        self.relations
            .get(&(family.to_string(), child.to_string()))
            .is_some_and(|note| note.primary)
    }

    /// Recorded sex of `person`.
    #[must_use]
    pub fn sex(&self, person: &str) -> Gender {
        self.person_sex.get(person).copied().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINKED: &[u8] = b"0 HEAD\n1 SOUR FTW\n1 CHAR ANSEL\n\
0 @I1@ INDI\n1 SEX M\n1 FAMS @F1@\n\
0 @I2@ INDI\n1 SEX F\n\
0 @I3@ INDI\n1 FAMC @F1@\n2 PEDI adopted\n\
0 @I4@ INDI\n\
0 @F1@ FAM\n1 HUSB @I1@\n1 WIFE @I2@\n1 CHIL @I4@\n2 _FREL Step\n2 _MREL Birth\n\
0 TRLR\n";

    #[test]
    fn test_header_fields_and_counts() {
        let scan = Prescan::scan(LINKED).unwrap();
        assert_eq!(scan.producer.as_deref(), Some("FTW"));
        assert_eq!(scan.declared_encoding(), Some(GedcomEncoding::Ansel));
        assert_eq!(scan.person_count, 4);
        assert_eq!(scan.record_count, 7);
        assert_eq!(scan.line_count, 19);
        assert!(scan.has_trailer);
    }

    #[test]
    fn test_linkage_from_both_sides() {
        let scan = Prescan::scan(LINKED).unwrap();
        assert_eq!(scan.families_as_spouse("I1"), vec!["F1"]);
        // I2 has no FAMS; only the family names her
        assert_eq!(scan.families_as_spouse("I2"), vec!["F1"]);
        assert_eq!(scan.children_of("F1"), vec!["I4", "I3"]);
        assert_eq!(scan.families_as_child("I3"), vec!["F1"]);
        assert_eq!(scan.spouses_claiming("F1"), vec!["I1"]);
        assert_eq!(scan.sex("I2"), Gender::Female);
    }

    #[test]
    fn test_relation_annotations() {
        let scan = Prescan::scan(LINKED).unwrap();
        assert_eq!(
            scan.relation("F1", "I3"),
            (ChildRelation::Adopted, ChildRelation::Adopted)
        );
        assert_eq!(
            scan.relation("F1", "I4"),
            (ChildRelation::Birth, ChildRelation::Step)
        );
        assert_eq!(
            scan.relation("F9", "I9"),
            (ChildRelation::Birth, ChildRelation::Birth)
        );
    }

    #[test]
    fn test_adoption_side_from_adop_event() {
        let data = b"0 HEAD\n0 @I1@ INDI\n1 ADOP\n2 FAMC @F1@\n3 ADOP WIFE\n0 TRLR\n";
        let scan = Prescan::scan(data).unwrap();
        assert_eq!(
            scan.relation("F1", "I1"),
            (ChildRelation::Adopted, ChildRelation::Birth)
        );
        assert_eq!(scan.families_as_child("I1"), vec!["F1"]);
    }

    #[test]
    fn test_last_annotation_wins() {
        let data = b"0 HEAD\n0 @I1@ INDI\n1 FAMC @F1@\n2 PEDI foster\n\
0 @F1@ FAM\n1 CHIL @I1@\n2 _MREL Birth\n0 TRLR\n";
        let scan = Prescan::scan(data).unwrap();
        assert_eq!(
            scan.relation("F1", "I1"),
            (ChildRelation::Birth, ChildRelation::Foster)
        );
    }

    #[test]
    fn test_primary_flag() {
        let data = b"0 HEAD\n0 @I1@ INDI\n1 FAMC @F2@\n2 _PRIMARY Y\n0 TRLR\n";
        let scan = Prescan::scan(data).unwrap();
        assert!(scan.is_primary("F2", "I1"));
        assert!(!scan.is_primary("F1", "I1"));
    }

    #[test]
    fn test_bad_header() {
        assert!(matches!(
            Prescan::scan(b"0 @I1@ INDI\n0 TRLR\n"),
            Err(GedcomError::BadHeader(_))
        ));
        assert!(matches!(Prescan::scan(b""), Err(GedcomError::BadHeader(_))));
        assert!(matches!(
            Prescan::scan(b"garbage\n0 HEAD\n"),
            Err(GedcomError::BadHeader(_))
        ));
    }

    #[test]
    fn test_missing_trailer_detected() {
        let scan = Prescan::scan(b"0 HEAD\n0 @F1@ FAM\n1 HUSB @I1@\n").unwrap();
        assert!(!scan.has_trailer);
    }

    #[test]
    fn test_spouse_slots_from_both_sides() {
        let scan = Prescan::scan(
            b"0 HEAD\n0 @I1@ INDI\n1 SEX M\n1 FAMS @F1@\n0 @I2@ INDI\n1 SEX F\n1 FAMS @F1@\n\
0 @I3@ INDI\n1 SEX M\n1 FAMS @F1@\n0 @F1@ FAM\n1 HUSB @I1@\n0 TRLR\n",
        )
        .unwrap();
        let slots = scan.spouse_slots("F1");
        assert_eq!(slots.father, Some("I1"));
        assert_eq!(slots.mother, Some("I2"));
        assert_eq!(slots.unplaced, vec!["I3"]);
        assert!(!slots.holds("I3"));
    }
}
