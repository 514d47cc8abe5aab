//! Sub-structures shared by several records: citations, notes and media links
//! attached to anything, addresses, places, LDS ordinances and attributes.
//! Also the `OBJE` and `NOTE` top-level records.

use super::{DispatchTable, GedcomParser, HasCitations, HasMedia, HasNotes, TopLevel};
use crate::attribute::{Attribute, AttributeType, LdsKind, LdsOrd};
use crate::error::Result;
use crate::handle::{Handle, ObjectKind};
use crate::media::{mime_for, MediaObject, MediaRef};
use crate::note::Note;
use crate::place::{Address, Jurisdiction, Location, Place};
use crate::reader::Line;
use crate::source::SourceRef;
use crate::tags::Tag;

// === Generic handlers ===

pub(super) fn citation<S: HasCitations>(
    p: &mut GedcomParser<'_>,
    line: &Line,
    state: &mut S,
) -> Result<()> {
    let citation = p.parse_citation(line)?;
    state.citations().push(citation);
    Ok(())
}

pub(super) fn note<S: HasNotes>(p: &mut GedcomParser<'_>, line: &Line, state: &mut S) -> Result<()> {
    let handle = p.parse_note_ref(line)?;
    state.notes().push(handle);
    Ok(())
}

pub(super) fn media<S: HasMedia>(p: &mut GedcomParser<'_>, line: &Line, state: &mut S) -> Result<()> {
    let media = p.parse_media_link(line)?;
    state.media_refs().push(media);
    Ok(())
}

/// Known tags with nothing to import (`CHAN`, `RIN`, ...).
pub(super) fn ignore<S>(p: &mut GedcomParser<'_>, line: &Line, _state: &mut S) -> Result<()> {
    p.skip_quietly(line)
}

pub(super) fn parse_form(text: &str) -> Vec<Option<Jurisdiction>> {
    text.split(',')
        .map(|entry| Jurisdiction::from_form_entry(entry.trim()))
        .collect()
}

// === Address ===

static ADDRESS_TABLE: DispatchTable<Address> = DispatchTable::new(
    "ADDR",
    &[
        (Tag::Adr1, address_line),
        (Tag::Adr2, address_line),
        (Tag::Adr3, address_line),
        (Tag::City, address_field),
        (Tag::Stae, address_field),
        (Tag::Post, address_field),
        (Tag::Ctry, address_field),
        (Tag::Phon, address_field),
        (Tag::Date, address_field),
        (Tag::Sour, citation::<Address>),
        (Tag::Note, note::<Address>),
        (Tag::Email, ignore),
        (Tag::Fax, ignore),
        (Tag::Www, ignore),
    ],
);

fn address_line(p: &mut GedcomParser<'_>, line: &Line, address: &mut Address) -> Result<()> {
    let text = line.text();
    // ADR1 often repeats the first line of the ADDR value
    if !address.street.lines().any(|existing| existing.trim() == text) {
        address.push_line(text);
    }
    p.end_leaf(line)
}

fn address_field(p: &mut GedcomParser<'_>, line: &Line, address: &mut Address) -> Result<()> {
    let field = match line.tag {
        Tag::City => &mut address.city,
        Tag::Stae => &mut address.state,
        Tag::Post => &mut address.postal,
        Tag::Ctry => &mut address.country,
        Tag::Phon => &mut address.phone,
        _ => &mut address.date_text,
    };
    *field = line.text().to_string();
    p.end_leaf(line)
}

// === Place ===

/// Sub-tags of a `PLAC` line, merged into the deduplicated place afterwards.
#[derive(Debug, Default)]
pub(super) struct PlaceDetail {
    pub(super) form: Option<String>,
    pub(super) latitude: String,
    pub(super) longitude: String,
    pub(super) citations: Vec<SourceRef>,
    pub(super) notes: Vec<Handle>,
}

static PLACE_TABLE: DispatchTable<PlaceDetail> = DispatchTable::new(
    "PLAC",
    &[
        (Tag::Form, place_form),
        (Tag::Map, place_map),
        (Tag::Lati, coordinate),
        (Tag::Long, coordinate),
        (Tag::Sour, citation::<PlaceDetail>),
        (Tag::Note, note::<PlaceDetail>),
        (Tag::Romn, ignore),
        (Tag::Fone, ignore),
    ],
);

static MAP_TABLE: DispatchTable<PlaceDetail> = DispatchTable::new(
    "MAP",
    &[(Tag::Lati, coordinate), (Tag::Long, coordinate)],
);

fn place_form(p: &mut GedcomParser<'_>, line: &Line, detail: &mut PlaceDetail) -> Result<()> {
    detail.form = Some(line.text().to_string());
    p.end_leaf(line)
}

fn place_map(p: &mut GedcomParser<'_>, line: &Line, detail: &mut PlaceDetail) -> Result<()> {
    p.parse_level(line.level + 1, &MAP_TABLE, detail)
}

fn coordinate(p: &mut GedcomParser<'_>, line: &Line, detail: &mut PlaceDetail) -> Result<()> {
    let value = line.text().to_string();
    if line.tag == Tag::Lati {
        detail.latitude = value;
    } else {
        detail.longitude = value;
    }
    p.end_leaf(line)
}

impl GedcomParser<'_> {
    /// The place titled `title`, created on first use within the run.
    pub(super) fn place_for(&mut self, title: &str) -> Handle {
        if let Some(place) = self.places.get(title) {
            return place.handle.clone();
        }
        let resolution = self.resolve_derived(ObjectKind::Place, &format!("PLAC:{title}"));
        let mut place = Place::new(resolution.handle.clone(), resolution.gramps_id, title);
        place.origin = Some(resolution.origin);
        place.location = Location::from_title(title, &self.place_form);
        self.places.insert(title.to_string(), place);
        resolution.handle
    }

    /// Parse a `PLAC` structure.
    pub(super) fn parse_place(&mut self, line: &Line) -> Result<Option<Handle>> {
        let mut detail = PlaceDetail::default();
        self.parse_level(line.level + 1, &PLACE_TABLE, &mut detail)?;
        let title = line.text();
        if title.is_empty() {
            return Ok(None);
        }

        let handle = self.place_for(title);
        if let Some(place) = self.places.get_mut(title) {
            if let Some(form) = &detail.form {
                place.location = Location::from_title(title, &parse_form(form));
            }
            if !detail.latitude.is_empty() {
                place.latitude = detail.latitude;
            }
            if !detail.longitude.is_empty() {
                place.longitude = detail.longitude;
            }
            place.citations.extend(detail.citations);
            for note in detail.notes {
                if !place.notes.contains(&note) {
                    place.notes.push(note);
                }
            }
        }
        Ok(Some(handle))
    }

    /// A place standing for a postal address, used by events that give an
    /// `ADDR` but no `PLAC`.
    pub(super) fn place_from_address(&mut self, address: &Address) -> Option<Handle> {
        let street = address.street.lines().collect::<Vec<_>>().join(", ");
        let parts = [
            street.as_str(),
            address.city.as_str(),
            address.state.as_str(),
            address.postal.as_str(),
            address.country.as_str(),
        ];
        let title = parts
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(", ");
        if title.is_empty() {
            return None;
        }

        let handle = self.place_for(&title);
        if let Some(place) = self.places.get_mut(&title) {
            place.location = Location {
                street,
                city: address.city.clone(),
                state: address.state.clone(),
                country: address.country.clone(),
                postal: address.postal.clone(),
                phone: address.phone.clone(),
                ..Location::default()
            };
        }
        Some(handle)
    }

    /// Parse an `ADDR` structure.
    pub(super) fn parse_address(&mut self, line: &Line) -> Result<Address> {
        let mut address = Address::default();
        for part in line.text().lines() {
            address.push_line(part);
        }
        self.parse_level(line.level + 1, &ADDRESS_TABLE, &mut address)?;
        Ok(address)
    }
}

// === Notes ===

static NOTE_TABLE: DispatchTable<Note> = DispatchTable::new(
    "NOTE",
    &[
        (Tag::Sour, citation::<Note>),
        (Tag::Refn, ignore),
        (Tag::Rin, ignore),
        (Tag::Chan, ignore),
    ],
);

pub(super) fn note_record(p: &mut GedcomParser<'_>, line: &Line, _top: &mut TopLevel) -> Result<()> {
    let (resolution, _) = p.open_record(ObjectKind::Note, line)?;
    let mut note = Note::new(resolution.handle, resolution.gramps_id, line.value.trim_end());
    note.origin = Some(resolution.origin);
    p.parse_level(1, &NOTE_TABLE, &mut note)?;
    p.commit(note.into())
}

impl GedcomParser<'_> {
    /// A `NOTE` under any structure: a pointer to a note record, or inline
    /// text that becomes a note of its own.
    pub(super) fn parse_note_ref(&mut self, line: &Line) -> Result<Handle> {
        if let Some(xref) = line.pointer() {
            let handle = self.resolve(ObjectKind::Note, xref);
            self.skip_quietly(line)?;
            return Ok(handle);
        }
        let key = self.derived_key('N');
        let resolution = self.resolve_derived(ObjectKind::Note, &key);
        let handle = resolution.handle.clone();
        let mut note = Note::new(resolution.handle, resolution.gramps_id, line.value.trim_end());
        note.origin = Some(resolution.origin);
        self.parse_level(line.level + 1, &NOTE_TABLE, &mut note)?;
        self.commit(note.into())?;
        Ok(handle)
    }

    /// A note holding `text`, for tags such as `SOUR.TEXT` that carry
    /// free text but have no field of their own.
    pub(super) fn text_note(&mut self, text: &str) -> Result<Handle> {
        let key = self.derived_key('N');
        let resolution = self.resolve_derived(ObjectKind::Note, &key);
        let handle = resolution.handle.clone();
        let mut note = Note::new(resolution.handle, resolution.gramps_id, text);
        note.origin = Some(resolution.origin);
        self.commit(note.into())?;
        Ok(handle)
    }
}

// === Media ===

/// Fields of an `OBJE` record or inline media link.
#[derive(Debug, Default)]
pub(super) struct MediaDetail {
    pub(super) path: String,
    pub(super) form: String,
    pub(super) title: String,
    pub(super) citations: Vec<SourceRef>,
    pub(super) notes: Vec<Handle>,
}

impl MediaDetail {
    fn apply(self, media: &mut MediaObject) {
        media.mime = mime_for(&self.form, &self.path);
        media.path = self.path;
        if !self.title.is_empty() {
            media.description = self.title;
        }
        media.citations.extend(self.citations);
        media.notes.extend(self.notes);
    }
}

static MEDIA_TABLE: DispatchTable<MediaDetail> = DispatchTable::new(
    "OBJE",
    &[
        (Tag::File, media_file),
        (Tag::Form, media_form),
        (Tag::Titl, media_title),
        (Tag::Sour, citation::<MediaDetail>),
        (Tag::Note, note::<MediaDetail>),
        (Tag::Blob, ignore),
        (Tag::Refn, ignore),
        (Tag::Rin, ignore),
        (Tag::Chan, ignore),
    ],
);

static MEDIA_FILE_TABLE: DispatchTable<MediaDetail> = DispatchTable::new(
    "FILE",
    &[(Tag::Form, media_form), (Tag::Titl, media_title)],
);

fn media_file(p: &mut GedcomParser<'_>, line: &Line, detail: &mut MediaDetail) -> Result<()> {
    detail.path = line.text().to_string();
    p.parse_level(line.level + 1, &MEDIA_FILE_TABLE, detail)
}

fn media_form(p: &mut GedcomParser<'_>, line: &Line, detail: &mut MediaDetail) -> Result<()> {
    detail.form = line.text().to_string();
    // FORM.TYPE / FORM.MEDI describe the carrier, not the file
    p.skip_quietly(line)
}

fn media_title(p: &mut GedcomParser<'_>, line: &Line, detail: &mut MediaDetail) -> Result<()> {
    detail.title = line.text().to_string();
    p.end_leaf(line)
}

pub(super) fn media_record(p: &mut GedcomParser<'_>, line: &Line, _top: &mut TopLevel) -> Result<()> {
    let (resolution, _) = p.open_record(ObjectKind::Media, line)?;
    let mut detail = MediaDetail::default();
    p.parse_level(1, &MEDIA_TABLE, &mut detail)?;
    let mut media = MediaObject::new(resolution.handle, resolution.gramps_id);
    media.origin = Some(resolution.origin);
    detail.apply(&mut media);
    p.commit(media.into())
}

impl GedcomParser<'_> {
    /// An `OBJE` link: a pointer to a media record, or an inline description
    /// that becomes a media object keyed by its file path.
    pub(super) fn parse_media_link(&mut self, line: &Line) -> Result<MediaRef> {
        if let Some(xref) = line.pointer() {
            let media = self.resolve(ObjectKind::Media, xref);
            self.skip_quietly(line)?;
            return Ok(MediaRef { media });
        }

        let mut detail = MediaDetail::default();
        self.parse_level(line.level + 1, &MEDIA_TABLE, &mut detail)?;
        let key = if detail.path.is_empty() {
            self.derived_key('O')
        } else {
            format!("OBJE:{}", detail.path)
        };

        if let Some(existing) = self.media.get_mut(&key) {
            detail.apply(existing);
            return Ok(MediaRef {
                media: existing.handle.clone(),
            });
        }
        let resolution = self.resolve_derived(ObjectKind::Media, &key);
        let mut media = MediaObject::new(resolution.handle.clone(), resolution.gramps_id);
        media.origin = Some(resolution.origin);
        detail.apply(&mut media);
        self.media.insert(key, media);
        Ok(MediaRef {
            media: resolution.handle,
        })
    }
}

// === LDS ordinances ===

static LDS_TABLE: DispatchTable<LdsOrd> = DispatchTable::new(
    "LDS",
    &[
        (Tag::Date, lds_date),
        (Tag::Temp, lds_temple),
        (Tag::Plac, lds_place),
        (Tag::Stat, lds_status),
        (Tag::Famc, lds_family),
        (Tag::Sour, citation::<LdsOrd>),
        (Tag::Note, note::<LdsOrd>),
    ],
);

fn lds_date(p: &mut GedcomParser<'_>, line: &Line, ord: &mut LdsOrd) -> Result<()> {
    ord.date = Some(p.parse_date(line));
    p.end_leaf(line)
}

fn lds_temple(p: &mut GedcomParser<'_>, line: &Line, ord: &mut LdsOrd) -> Result<()> {
    ord.temple = line.text().to_string();
    p.end_leaf(line)
}

fn lds_place(p: &mut GedcomParser<'_>, line: &Line, ord: &mut LdsOrd) -> Result<()> {
    ord.place = p.parse_place(line)?;
    Ok(())
}

fn lds_status(p: &mut GedcomParser<'_>, line: &Line, ord: &mut LdsOrd) -> Result<()> {
    ord.status = line.text().to_string();
    // STAT.DATE is the date the status was recorded
    p.skip_quietly(line)
}

fn lds_family(p: &mut GedcomParser<'_>, line: &Line, ord: &mut LdsOrd) -> Result<()> {
    if let Some(xref) = p.pointer_or_warn(line)? {
        ord.family = Some(p.resolve(ObjectKind::Family, xref));
    }
    p.end_leaf(line)
}

impl GedcomParser<'_> {
    pub(super) fn parse_lds(&mut self, line: &Line) -> Result<LdsOrd> {
        let kind = match line.tag {
            Tag::Bapl => LdsKind::Baptism,
            Tag::Conl => LdsKind::Confirmation,
            Tag::Endl => LdsKind::Endowment,
            Tag::Slgc => LdsKind::SealedToParents,
            _ => LdsKind::SealedToSpouse,
        };
        let mut ord = LdsOrd::new(kind);
        self.parse_level(line.level + 1, &LDS_TABLE, &mut ord)?;
        Ok(ord)
    }
}

// === Attributes ===

#[derive(Debug)]
pub(super) struct AttributeState {
    pub(super) attribute: Attribute,
    is_fact: bool,
}

static ATTRIBUTE_TABLE: DispatchTable<AttributeState> = DispatchTable::new(
    "attribute",
    &[
        (Tag::Type, attribute_type),
        (Tag::Sour, citation::<AttributeState>),
        (Tag::Note, note::<AttributeState>),
        (Tag::Date, ignore),
        (Tag::Plac, ignore),
        (Tag::Addr, ignore),
        (Tag::Age, ignore),
        (Tag::Agnc, ignore),
        (Tag::Caus, ignore),
        (Tag::Chan, ignore),
    ],
);

fn attribute_type(p: &mut GedcomParser<'_>, line: &Line, state: &mut AttributeState) -> Result<()> {
    // Only FACT takes its label from TYPE; REFN.TYPE and friends qualify the value
    if state.is_fact && !line.text().is_empty() {
        state.attribute.attr_type = AttributeType::Custom(line.text().to_string());
    }
    p.end_leaf(line)
}

impl GedcomParser<'_> {
    /// Parse an attribute line of the given type; the line value is the
    /// attribute value.
    pub(super) fn parse_attribute(&mut self, line: &Line, attr_type: AttributeType) -> Result<Attribute> {
        let mut state = AttributeState {
            attribute: Attribute::new(attr_type, line.text()),
            is_fact: line.tag == Tag::Fact,
        };
        self.parse_level(line.level + 1, &ATTRIBUTE_TABLE, &mut state)?;
        Ok(state.attribute)
    }
}

/// Attribute type of a standard attribute tag; `FACT` starts as a generic
/// custom attribute until its `TYPE` names it.
pub(super) fn standard_attribute(tag: Tag) -> AttributeType {
    tag.attribute_type()
        .unwrap_or_else(|| AttributeType::Custom("Fact".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_form() {
        let form = parse_form("City, County, State, Country");
        assert_eq!(
            form,
            vec![
                Some(Jurisdiction::City),
                Some(Jurisdiction::County),
                Some(Jurisdiction::State),
                Some(Jurisdiction::Country)
            ]
        );
        let odd = parse_form("Township, County");
        assert_eq!(odd[0], None);
        assert_eq!(odd[1], Some(Jurisdiction::County));
    }

    #[test]
    fn test_standard_attribute() {
        assert_eq!(standard_attribute(Tag::Ssn), AttributeType::SocialSecurityNumber);
        assert_eq!(
            standard_attribute(Tag::Fact),
            AttributeType::Custom("Fact".to_string())
        );
    }
}
