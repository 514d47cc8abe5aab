//! `FAM` records.

use super::structures::{citation, ignore, media, note, standard_attribute};
use super::{DispatchTable, GedcomParser, TopLevel};
use crate::error::Result;
use crate::event::{EventRef, EventRole, EventType};
use crate::family::{ChildRef, Family, FamilyRelType};
use crate::handle::ObjectKind;
use crate::reader::Line;
use crate::recovery::IssueKind;
use crate::tags::{Tag, TagMeaning};

/// A family being parsed.
#[derive(Debug)]
pub(super) struct FamilyState {
    pub(super) family: Family,
}

static FAMILY_TABLE: DispatchTable<FamilyState> = DispatchTable::new(
    "FAM",
    &[
        (Tag::Husb, spouse),
        (Tag::Wife, spouse),
        (Tag::Chil, child),
        (Tag::Marr, event),
        (Tag::Div, event),
        (Tag::Divf, event),
        (Tag::Enga, event),
        (Tag::Marb, event),
        (Tag::Marc, event),
        (Tag::Marl, event),
        (Tag::Mars, event),
        (Tag::Anul, event),
        (Tag::Cens, event),
        (Tag::Resi, event),
        (Tag::Even, event),
        (Tag::VendorStatus, status),
        (Tag::NotMarried, not_married),
        (Tag::Nchi, attribute),
        (Tag::Refn, attribute),
        (Tag::Rfn, attribute),
        (Tag::Uid, attribute),
        (Tag::Fact, attribute),
        (Tag::Slgs, sealing),
        (Tag::Sour, citation::<FamilyState>),
        (Tag::Note, note::<FamilyState>),
        (Tag::Obje, media::<FamilyState>),
        (Tag::Subm, ignore),
        (Tag::Rin, ignore),
        (Tag::Chan, ignore),
        (Tag::Unknown, vendor_tag),
    ],
);

pub(super) fn family_record(p: &mut GedcomParser<'_>, line: &Line, _top: &mut TopLevel) -> Result<()> {
    let (resolution, xref) = p.open_record(ObjectKind::Family, line)?;
    let mut family = Family::new(resolution.handle, resolution.gramps_id);
    family.origin = Some(resolution.origin);

    let mut state = FamilyState { family };
    p.parse_level(1, &FAMILY_TABLE, &mut state)?;

    let mut family = state.family;
    if let Some(xref) = xref {
        p.link_family(&mut family, &xref)?;
    }
    p.commit(family.into())
}

fn spouse(p: &mut GedcomParser<'_>, line: &Line, state: &mut FamilyState) -> Result<()> {
    if let Some(xref) = p.pointer_or_warn(line)? {
        let handle = p.resolve(ObjectKind::Person, xref);
        if line.tag == Tag::Husb {
            state.family.father = Some(handle);
        } else {
            state.family.mother = Some(handle);
        }
    }
    p.skip_quietly(line)
}

fn child(p: &mut GedcomParser<'_>, line: &Line, _state: &mut FamilyState) -> Result<()> {
    // Children are listed from the prescan, which also knows their PEDI
    if let Some(xref) = p.pointer_or_warn(line)? {
        p.resolve(ObjectKind::Person, xref);
    }
    p.skip_quietly(line)
}

fn event(p: &mut GedcomParser<'_>, line: &Line, state: &mut FamilyState) -> Result<()> {
    let event_type = line
        .tag
        .event_type()
        .unwrap_or_else(|| EventType::Custom(String::new()));
    p.family_event(line, event_type, state)
}

fn status(p: &mut GedcomParser<'_>, line: &Line, state: &mut FamilyState) -> Result<()> {
    let text = line.text();
    state.family.rel_type = match text.to_ascii_uppercase().as_str() {
        "NOT MARRIED" | "NEVER MARRIED" | "UNMARRIED" => FamilyRelType::Unmarried,
        "MARRIED" => FamilyRelType::Married,
        "CIVIL UNION" | "PARTNERS" => FamilyRelType::CivilUnion,
        "" => state.family.rel_type.clone(),
        _ => FamilyRelType::Other(text.to_string()),
    };
    p.end_leaf(line)
}

fn not_married(p: &mut GedcomParser<'_>, line: &Line, state: &mut FamilyState) -> Result<()> {
    if !line.text().eq_ignore_ascii_case("N") {
        state.family.rel_type = FamilyRelType::Unmarried;
    }
    p.end_leaf(line)
}

fn attribute(p: &mut GedcomParser<'_>, line: &Line, state: &mut FamilyState) -> Result<()> {
    let attribute = p.parse_attribute(line, standard_attribute(line.tag))?;
    state.family.attributes.push(attribute);
    Ok(())
}

fn sealing(p: &mut GedcomParser<'_>, line: &Line, state: &mut FamilyState) -> Result<()> {
    let ord = p.parse_lds(line)?;
    state.family.lds_ords.push(ord);
    Ok(())
}

fn vendor_tag(p: &mut GedcomParser<'_>, line: &Line, state: &mut FamilyState) -> Result<()> {
    match p.vendor_meaning(&line.raw_tag) {
        Some(TagMeaning::Event(event_type)) => p.family_event(line, event_type, state),
        Some(TagMeaning::Attribute(attr_type)) => {
            let attribute = p.parse_attribute(line, attr_type)?;
            state.family.attributes.push(attribute);
            Ok(())
        },
        _ => p.not_recognized(line),
    }
}

/// Kind of union implied by the `TYPE` of a marriage.
fn rel_type_from_marriage(type_text: Option<&str>) -> FamilyRelType {
    let text = type_text.unwrap_or("").to_ascii_lowercase();
    if text.contains("civil") {
        FamilyRelType::CivilUnion
    } else if ["partner", "unmarried", "common law"]
        .iter()
        .any(|word| text.contains(word))
    {
        FamilyRelType::Unmarried
    } else {
        FamilyRelType::Married
    }
}

impl GedcomParser<'_> {
    fn family_event(&mut self, line: &Line, event_type: EventType, state: &mut FamilyState) -> Result<()> {
        let is_marriage = event_type == EventType::Marriage;
        let (handle, type_text) = self.parse_event(line, event_type)?;
        // An explicit _STAT wins over the marriage type
        if is_marriage && state.family.rel_type == FamilyRelType::Unknown {
            state.family.rel_type = rel_type_from_marriage(type_text.as_deref());
        }
        state
            .family
            .event_refs
            .push(EventRef::new(handle, EventRole::Family));
        Ok(())
    }

    /// Fill a family's children and spouses from both sides of the file.
    ///
    /// Spouse placement comes from the prescan so the person side agrees
    /// with it; a `FAMS` claimant with no free slot is reported and left out
    /// of both sides.
    pub(super) fn link_family(&mut self, family: &mut Family, xref: &str) -> Result<()> {
        let prescan = self.prescan;
        for child in prescan.children_of(xref) {
            let handle = self.resolve(ObjectKind::Person, child);
            let (mother, father) = prescan.relation(xref, child);
            family.add_child(ChildRef::new(handle, mother, father));
        }

        let slots = prescan.spouse_slots(xref);
        family.father = slots.father.map(|person| self.resolve(ObjectKind::Person, person));
        family.mother = slots.mother.map(|person| self.resolve(ObjectKind::Person, person));
        for person in slots.unplaced {
            self.recovery.recover::<()>(
                IssueKind::InvalidValue,
                0,
                format!("@{person}@ names @{xref}@ in FAMS but its spouse slot is taken"),
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rel_type_from_marriage() {
        assert_eq!(rel_type_from_marriage(None), FamilyRelType::Married);
        assert_eq!(rel_type_from_marriage(Some("Religious")), FamilyRelType::Married);
        assert_eq!(rel_type_from_marriage(Some("Civil")), FamilyRelType::CivilUnion);
        assert_eq!(rel_type_from_marriage(Some("Common Law")), FamilyRelType::Unmarried);
        assert_eq!(rel_type_from_marriage(Some("Partners")), FamilyRelType::Unmarried);
    }
}
