//! `INDI` records.

use super::structures::{citation, ignore, media, note, standard_attribute};
use super::{DispatchTable, GedcomParser, TopLevel};
use crate::error::Result;
use crate::event::{EventRef, EventRole, EventType};
use crate::handle::ObjectKind;
use crate::person::{Gender, Name, NameType, Person, PersonRef};
use crate::place::Address;
use crate::reader::Line;
use crate::tags::{Tag, TagMeaning};
use tracing::debug;

/// A person being parsed.
#[derive(Debug)]
pub(super) struct PersonState {
    pub(super) person: Person,
}

/// A name being parsed, plus any alternate names nested under it
/// (`_MARNM`, `_AKA`).
#[derive(Debug)]
pub(super) struct NameState {
    pub(super) name: Name,
    extra: Vec<Name>,
}

static PERSON_TABLE: DispatchTable<PersonState> = DispatchTable::new(
    "INDI",
    &[
        (Tag::Name, name),
        (Tag::Sex, sex),
        (Tag::Birt, event),
        (Tag::Chr, event),
        (Tag::Deat, event),
        (Tag::Buri, event),
        (Tag::Crem, event),
        (Tag::Adop, event),
        (Tag::Bapm, event),
        (Tag::Barm, event),
        (Tag::Basm, event),
        (Tag::Bles, event),
        (Tag::Chra, event),
        (Tag::Conf, event),
        (Tag::Fcom, event),
        (Tag::Ordn, event),
        (Tag::Natu, event),
        (Tag::Emig, event),
        (Tag::Immi, event),
        (Tag::Cens, event),
        (Tag::Prob, event),
        (Tag::Will, event),
        (Tag::Grad, event),
        (Tag::Reti, event),
        (Tag::Resi, event),
        (Tag::Occu, event),
        (Tag::Educ, event),
        (Tag::Reli, event),
        (Tag::Prop, event),
        (Tag::Titl, event),
        (Tag::Even, event),
        (Tag::Cast, attribute),
        (Tag::Dscr, attribute),
        (Tag::Idno, attribute),
        (Tag::Nati, attribute),
        (Tag::Nchi, attribute),
        (Tag::Nmr, attribute),
        (Tag::Ssn, attribute),
        (Tag::Fact, attribute),
        (Tag::Refn, attribute),
        (Tag::Rfn, attribute),
        (Tag::Afn, attribute),
        (Tag::Uid, attribute),
        (Tag::Famc, family_link),
        (Tag::Fams, family_link),
        (Tag::Asso, association),
        (Tag::Alia, alias),
        (Tag::Addr, address),
        (Tag::Phon, phone),
        (Tag::Email, url),
        (Tag::Www, url),
        (Tag::Bapl, lds),
        (Tag::Conl, lds),
        (Tag::Endl, lds),
        (Tag::Slgc, lds),
        (Tag::Sour, citation::<PersonState>),
        (Tag::Note, note::<PersonState>),
        (Tag::Obje, media::<PersonState>),
        (Tag::Subm, ignore),
        (Tag::Fax, ignore),
        (Tag::Rin, ignore),
        (Tag::Chan, ignore),
        (Tag::Unknown, vendor_tag),
    ],
);

static NAME_TABLE: DispatchTable<NameState> = DispatchTable::new(
    "NAME",
    &[
        (Tag::Npfx, name_piece),
        (Tag::Givn, name_piece),
        (Tag::Nick, name_piece),
        (Tag::Spfx, name_piece),
        (Tag::Surn, name_piece),
        (Tag::Nsfx, name_piece),
        (Tag::Type, name_type),
        (Tag::Sour, citation::<NameState>),
        (Tag::Note, note::<NameState>),
        (Tag::Romn, ignore),
        (Tag::Fone, ignore),
        (Tag::Unknown, name_vendor_tag),
    ],
);

static ASSOCIATION_TABLE: DispatchTable<PersonRef> = DispatchTable::new(
    "ASSO",
    &[
        (Tag::Rela, relation),
        (Tag::Sour, citation::<PersonRef>),
        (Tag::Note, note::<PersonRef>),
        (Tag::Type, ignore),
    ],
);

pub(super) fn person_record(p: &mut GedcomParser<'_>, line: &Line, _top: &mut TopLevel) -> Result<()> {
    let (resolution, xref) = p.open_record(ObjectKind::Person, line)?;
    let mut person = Person::new(resolution.handle, resolution.gramps_id);
    person.origin = Some(resolution.origin);

    let mut state = PersonState { person };
    p.parse_level(1, &PERSON_TABLE, &mut state)?;

    let mut person = state.person;
    if let Some(xref) = xref {
        p.link_person(&mut person, &xref);
    }
    p.commit(person.into())
}

fn name(p: &mut GedcomParser<'_>, line: &Line, state: &mut PersonState) -> Result<()> {
    let (name, extra) = p.parse_name(line, None)?;
    state.person.add_name(name);
    state.person.alternate_names.extend(extra);
    Ok(())
}

fn name_piece(p: &mut GedcomParser<'_>, line: &Line, state: &mut NameState) -> Result<()> {
    let text = line.text().to_string();
    let name = &mut state.name;
    match line.tag {
        Tag::Npfx => name.title = text,
        Tag::Givn => name.first_name = text,
        Tag::Nick => name.nickname = text,
        Tag::Spfx => name.surname_prefix = text,
        Tag::Surn => name.surname = text,
        _ => name.suffix = text,
    }
    p.end_leaf(line)
}

fn name_type(p: &mut GedcomParser<'_>, line: &Line, state: &mut NameState) -> Result<()> {
    state.name.name_type = NameType::from_type_value(line.text());
    p.end_leaf(line)
}

fn name_vendor_tag(p: &mut GedcomParser<'_>, line: &Line, state: &mut NameState) -> Result<()> {
    let Some(TagMeaning::Name(name_type)) = p.vendor_meaning(&line.raw_tag) else {
        return p.not_recognized(line);
    };
    // `2 _MARNM Smith` gives only the new surname
    let mut alternate = Name::from_gedcom(line.text());
    if !line.text().contains('/') {
        alternate.surname = std::mem::take(&mut alternate.first_name);
        alternate.first_name = state.name.first_name.clone();
    }
    alternate.name_type = name_type;
    state.extra.push(alternate);
    p.skip_quietly(line)
}

fn sex(p: &mut GedcomParser<'_>, line: &Line, state: &mut PersonState) -> Result<()> {
    state.person.gender = Gender::from_sex_value(line.text());
    p.end_leaf(line)
}

fn event(p: &mut GedcomParser<'_>, line: &Line, state: &mut PersonState) -> Result<()> {
    let event_type = line
        .tag
        .event_type()
        .unwrap_or_else(|| EventType::Custom(String::new()));
    p.person_event(line, event_type, state)
}

fn attribute(p: &mut GedcomParser<'_>, line: &Line, state: &mut PersonState) -> Result<()> {
    let attribute = p.parse_attribute(line, standard_attribute(line.tag))?;
    state.person.attributes.push(attribute);
    Ok(())
}

fn family_link(p: &mut GedcomParser<'_>, line: &Line, _state: &mut PersonState) -> Result<()> {
    // The links themselves, with PEDI and friends, come from the prescan
    if let Some(xref) = p.pointer_or_warn(line)? {
        p.resolve(ObjectKind::Family, xref);
    }
    p.skip_quietly(line)
}

fn association(p: &mut GedcomParser<'_>, line: &Line, state: &mut PersonState) -> Result<()> {
    let Some(xref) = p.pointer_or_warn(line)? else {
        return p.skip_quietly(line);
    };
    let mut association = PersonRef {
        person: p.resolve(ObjectKind::Person, xref),
        relation: String::new(),
        citations: Vec::new(),
        notes: Vec::new(),
    };
    p.parse_level(line.level + 1, &ASSOCIATION_TABLE, &mut association)?;
    state.person.person_refs.push(association);
    Ok(())
}

fn relation(p: &mut GedcomParser<'_>, line: &Line, association: &mut PersonRef) -> Result<()> {
    association.relation = line.text().to_string();
    p.end_leaf(line)
}

fn alias(p: &mut GedcomParser<'_>, line: &Line, state: &mut PersonState) -> Result<()> {
    match line.pointer() {
        Some(xref) => {
            let person = p.resolve(ObjectKind::Person, xref);
            state.person.person_refs.push(PersonRef {
                person,
                relation: "Alias".to_string(),
                citations: Vec::new(),
                notes: Vec::new(),
            });
        },
        None if !line.text().is_empty() => {
            let mut name = Name::from_gedcom(line.text());
            name.name_type = NameType::Aka;
            state.person.alternate_names.push(name);
        },
        None => {},
    }
    p.end_leaf(line)
}

fn address(p: &mut GedcomParser<'_>, line: &Line, state: &mut PersonState) -> Result<()> {
    let address = p.parse_address(line)?;
    state.person.addresses.push(address);
    Ok(())
}

fn phone(p: &mut GedcomParser<'_>, line: &Line, state: &mut PersonState) -> Result<()> {
    let phone = line.text().to_string();
    match state.person.addresses.last_mut() {
        Some(address) if address.phone.is_empty() => address.phone = phone,
        _ => state.person.addresses.push(Address {
            phone,
            ..Address::default()
        }),
    }
    p.end_leaf(line)
}

fn url(p: &mut GedcomParser<'_>, line: &Line, state: &mut PersonState) -> Result<()> {
    let text = line.text();
    if !text.is_empty() {
        let url = if line.tag == Tag::Email && !text.starts_with("mailto:") {
            format!("mailto:{text}")
        } else {
            text.to_string()
        };
        state.person.urls.push(url);
    }
    p.end_leaf(line)
}

fn lds(p: &mut GedcomParser<'_>, line: &Line, state: &mut PersonState) -> Result<()> {
    let ord = p.parse_lds(line)?;
    state.person.lds_ords.push(ord);
    Ok(())
}

fn vendor_tag(p: &mut GedcomParser<'_>, line: &Line, state: &mut PersonState) -> Result<()> {
    match p.vendor_meaning(&line.raw_tag) {
        Some(TagMeaning::Event(event_type)) => p.person_event(line, event_type, state),
        Some(TagMeaning::Attribute(attr_type)) => {
            let attribute = p.parse_attribute(line, attr_type)?;
            state.person.attributes.push(attribute);
            Ok(())
        },
        Some(TagMeaning::Name(name_type)) => {
            let (name, extra) = p.parse_name(line, Some(name_type))?;
            state.person.alternate_names.push(name);
            state.person.alternate_names.extend(extra);
            Ok(())
        },
        None => p.not_recognized(line),
    }
}

impl GedcomParser<'_> {
    fn parse_name(&mut self, line: &Line, name_type: Option<NameType>) -> Result<(Name, Vec<Name>)> {
        let mut state = NameState {
            name: Name::from_gedcom(line.text()),
            extra: Vec::new(),
        };
        if let Some(name_type) = name_type {
            state.name.name_type = name_type;
        }
        self.parse_level(line.level + 1, &NAME_TABLE, &mut state)?;
        Ok((state.name, state.extra))
    }

    /// Attach an event to a person. The first birth and the first death
    /// become the canonical ones.
    fn person_event(&mut self, line: &Line, event_type: EventType, state: &mut PersonState) -> Result<()> {
        let (handle, _) = self.parse_event(line, event_type.clone())?;
        let person = &mut state.person;
        let index = person.add_event_ref(EventRef::new(handle, EventRole::Primary));
        match event_type {
            EventType::Birth if person.birth_ref_index.is_none() => person.birth_ref_index = Some(index),
            EventType::Death if person.death_ref_index.is_none() => person.death_ref_index = Some(index),
            _ => {},
        }
        Ok(())
    }

    /// Fill a person's family links from both sides of the file.
    pub(super) fn link_person(&mut self, person: &mut Person, xref: &str) {
        let prescan = self.prescan;
        for family in prescan.families_as_spouse(xref) {
            if !prescan.spouse_slots(family).holds(xref) {
                continue;
            }
            let handle = self.resolve(ObjectKind::Family, family);
            person.add_family(handle);
        }

        let mut main = None;
        for family in prescan.families_as_child(xref) {
            let handle = self.resolve(ObjectKind::Family, family);
            let (mother, father) = prescan.relation(family, xref);
            if prescan.is_primary(family, xref) {
                main = Some(handle.clone());
            }
            person.add_parent_family(handle, mother, father);
        }
        if let Some(main) = main {
            person.set_main_parent_family(&main);
            debug!(person = xref, "main parent family set by _PRIMARY");
        }
    }
}
