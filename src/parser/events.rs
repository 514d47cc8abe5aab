//! The event-detail structure, shared by every individual and family event.

use super::structures::{citation, ignore, media, note};
use super::{DispatchTable, GedcomParser};
use crate::attribute::{Attribute, AttributeType};
use crate::error::Result;
use crate::event::{Event, EventType, Witness};
use crate::handle::{Handle, ObjectKind};
use crate::reader::Line;
use crate::tags::Tag;

/// An event being parsed.
#[derive(Debug)]
pub(super) struct EventState {
    pub(super) event: Event,
    type_text: Option<String>,
}

static EVENT_TABLE: DispatchTable<EventState> = DispatchTable::new(
    "event",
    &[
        (Tag::Date, date),
        (Tag::Plac, place),
        (Tag::Addr, address),
        (Tag::Age, detail_attribute),
        (Tag::Agnc, detail_attribute),
        (Tag::Caus, cause),
        (Tag::Type, event_type),
        (Tag::Witn, witness),
        (Tag::Husb, spouse_age),
        (Tag::Wife, spouse_age),
        (Tag::Sour, citation::<EventState>),
        (Tag::Note, note::<EventState>),
        (Tag::Obje, media::<EventState>),
        // Linkage under BIRT/CHR/ADOP is taken from the prescan
        (Tag::Famc, ignore),
        (Tag::Phon, ignore),
        (Tag::Email, ignore),
        (Tag::Fax, ignore),
        (Tag::Www, ignore),
        (Tag::Uid, ignore),
        (Tag::Rin, ignore),
        (Tag::Chan, ignore),
    ],
);

static SPOUSE_AGE_TABLE: DispatchTable<Option<String>> =
    DispatchTable::new("spouse", &[(Tag::Age, spouse_age_value)]);

fn date(p: &mut GedcomParser<'_>, line: &Line, state: &mut EventState) -> Result<()> {
    state.event.date = Some(p.parse_date(line));
    p.end_leaf(line)
}

fn place(p: &mut GedcomParser<'_>, line: &Line, state: &mut EventState) -> Result<()> {
    if let Some(handle) = p.parse_place(line)? {
        state.event.place = Some(handle);
    }
    Ok(())
}

fn address(p: &mut GedcomParser<'_>, line: &Line, state: &mut EventState) -> Result<()> {
    let address = p.parse_address(line)?;
    if state.event.place.is_none() {
        state.event.place = p.place_from_address(&address);
    }
    Ok(())
}

fn detail_attribute(p: &mut GedcomParser<'_>, line: &Line, state: &mut EventState) -> Result<()> {
    let attr_type = if line.tag == Tag::Age {
        AttributeType::Age
    } else {
        AttributeType::Agency
    };
    state
        .event
        .attributes
        .push(Attribute::new(attr_type, line.text()));
    p.end_leaf(line)
}

fn cause(p: &mut GedcomParser<'_>, line: &Line, state: &mut EventState) -> Result<()> {
    state.event.cause = line.text().to_string();
    p.end_leaf(line)
}

fn event_type(p: &mut GedcomParser<'_>, line: &Line, state: &mut EventState) -> Result<()> {
    state.type_text = Some(line.text().to_string());
    p.end_leaf(line)
}

fn witness(p: &mut GedcomParser<'_>, line: &Line, state: &mut EventState) -> Result<()> {
    let witness = match line.pointer() {
        Some(xref) => Witness::Person(p.resolve(ObjectKind::Person, xref)),
        None => Witness::Named(line.text().to_string()),
    };
    state.event.witnesses.push(witness);
    p.skip_quietly(line)
}

fn spouse_age(p: &mut GedcomParser<'_>, line: &Line, state: &mut EventState) -> Result<()> {
    let mut age = None;
    p.parse_level(line.level + 1, &SPOUSE_AGE_TABLE, &mut age)?;
    if let Some(age) = age {
        let label = if line.tag == Tag::Husb {
            "Husband Age"
        } else {
            "Wife Age"
        };
        state
            .event
            .attributes
            .push(Attribute::new(AttributeType::Custom(label.to_string()), age));
    }
    Ok(())
}

fn spouse_age_value(p: &mut GedcomParser<'_>, line: &Line, age: &mut Option<String>) -> Result<()> {
    *age = Some(line.text().to_string());
    p.end_leaf(line)
}

impl GedcomParser<'_> {
    /// Parse one event, commit it, and return its handle together with the
    /// `TYPE` text, which some owners interpret further.
    ///
    /// A value other than `Y` becomes the description. A custom event without
    /// a label takes it from `TYPE`; on a standard event `TYPE` fills an
    /// empty description instead.
    pub(super) fn parse_event(
        &mut self,
        line: &Line,
        event_type: EventType,
    ) -> Result<(Handle, Option<String>)> {
        let key = self.derived_key('E');
        let resolution = self.resolve_derived(ObjectKind::Event, &key);
        let handle = resolution.handle.clone();

        let mut event = Event::new(resolution.handle, resolution.gramps_id, event_type);
        event.origin = Some(resolution.origin);
        let value = line.text();
        if !value.is_empty() && !value.eq_ignore_ascii_case("Y") {
            event.description = value.to_string();
        }

        let mut state = EventState {
            event,
            type_text: None,
        };
        self.parse_level(line.level + 1, &EVENT_TABLE, &mut state)?;
        let EventState {
            mut event,
            type_text,
        } = state;

        let unlabelled = matches!(&event.event_type, EventType::Custom(label) if label.is_empty());
        if unlabelled {
            let label = type_text
                .clone()
                .filter(|text| !text.is_empty())
                .unwrap_or_else(|| "Event".to_string());
            event.event_type = EventType::Custom(label);
        } else if let Some(text) = &type_text {
            if event.description.is_empty() && event.event_type != EventType::Marriage {
                event.description = text.clone();
            }
        }

        self.commit(event.into())?;
        Ok((handle, type_text))
    }
}
