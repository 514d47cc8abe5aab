//! The `HEAD` record, `SUBM` records and the `_SCHEMA` tag declarations.

use super::structures::{ignore, parse_form};
use super::{DispatchTable, GedcomParser, TopLevel};
use crate::error::Result;
use crate::place::Address;
use crate::reader::Line;
use crate::tags::Tag;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// What the file says about itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderInfo {
    /// Producing system id (`HEAD.SOUR`)
    pub producer: String,
    /// `HEAD.SOUR.VERS`
    pub producer_version: String,
    /// `HEAD.SOUR.NAME`
    pub producer_name: String,
    /// `HEAD.SOUR.CORP`
    pub corporation: String,
    /// `HEAD.DEST`
    pub destination: String,
    /// `HEAD.DATE` with its `TIME`, as text
    pub date: String,
    /// `HEAD.FILE`
    pub file: String,
    /// `HEAD.COPR`
    pub copyright: String,
    /// `HEAD.GEDC.VERS`
    pub gedcom_version: String,
    /// `HEAD.GEDC.FORM`
    pub gedcom_form: String,
    /// Declared character set (`HEAD.CHAR`)
    pub charset: String,
    /// `HEAD.LANG`
    pub language: String,
    /// Xref of the submitter the header points to
    pub submitter: Option<String>,
    /// `HEAD.PLAC.FORM`
    pub place_form: String,
    /// `HEAD.NOTE`
    pub note: String,
}

/// The submitter of the file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Submitter {
    /// Record xref
    pub xref: Option<String>,
    /// Submitter name
    pub name: String,
    /// Postal address
    pub address: Option<Address>,
    /// Phone
    pub phone: String,
    /// E-mail
    pub email: String,
    /// Preferred language
    pub language: String,
}

static HEADER_TABLE: DispatchTable<HeaderInfo> = DispatchTable::new(
    "HEAD",
    &[
        (Tag::Sour, producer),
        (Tag::Dest, header_field),
        (Tag::Date, header_date),
        (Tag::Subm, header_submitter),
        (Tag::File, header_field),
        (Tag::Copr, header_field),
        (Tag::Gedc, gedcom),
        (Tag::Char, charset),
        (Tag::Lang, header_field),
        (Tag::Plac, header_place),
        (Tag::Note, header_note),
        (Tag::Schema, schema),
        (Tag::Subn, ignore),
    ],
);

static PRODUCER_TABLE: DispatchTable<HeaderInfo> = DispatchTable::new(
    "HEAD.SOUR",
    &[
        (Tag::Vers, producer_field),
        (Tag::Name, producer_field),
        (Tag::Corp, producer_field),
        (Tag::Data, ignore),
    ],
);

static HEADER_DATE_TABLE: DispatchTable<HeaderInfo> =
    DispatchTable::new("HEAD.DATE", &[(Tag::Time, header_time)]);

static GEDCOM_TABLE: DispatchTable<HeaderInfo> = DispatchTable::new(
    "GEDC",
    &[(Tag::Vers, gedcom_field), (Tag::Form, gedcom_field)],
);

static HEADER_PLACE_TABLE: DispatchTable<HeaderInfo> =
    DispatchTable::new("HEAD.PLAC", &[(Tag::Form, header_place_form)]);

static SCHEMA_TABLE: DispatchTable<()> = DispatchTable::new(
    "_SCHEMA",
    &[
        (Tag::Indi, schema_record),
        (Tag::Fam, schema_record),
        (Tag::Unknown, schema_record),
    ],
);

static SCHEMA_TAG_TABLE: DispatchTable<()> =
    DispatchTable::new("_SCHEMA record", &[(Tag::Unknown, schema_tag)]);

static SCHEMA_DEFN_TABLE: DispatchTable<Option<String>> =
    DispatchTable::new("_SCHEMA tag", &[(Tag::Defn, schema_label)]);

/// Parse the header structure under `0 HEAD`.
pub(super) fn parse_header(p: &mut GedcomParser<'_>, _line: &Line) -> Result<()> {
    let mut header = std::mem::take(&mut p.header);
    p.parse_level(1, &HEADER_TABLE, &mut header)?;
    debug!(
        producer = %header.producer,
        version = %header.gedcom_version,
        charset = %header.charset,
        "header parsed"
    );
    p.header = header;
    Ok(())
}

fn producer(p: &mut GedcomParser<'_>, line: &Line, header: &mut HeaderInfo) -> Result<()> {
    header.producer = line.text().to_string();
    p.parse_level(line.level + 1, &PRODUCER_TABLE, header)
}

fn producer_field(p: &mut GedcomParser<'_>, line: &Line, header: &mut HeaderInfo) -> Result<()> {
    let text = line.text().to_string();
    match line.tag {
        Tag::Vers => header.producer_version = text,
        Tag::Name => header.producer_name = text,
        _ => {
            header.corporation = text;
            // The corporation's address is of no use here
            return p.skip_quietly(line);
        },
    }
    p.end_leaf(line)
}

fn header_field(p: &mut GedcomParser<'_>, line: &Line, header: &mut HeaderInfo) -> Result<()> {
    let text = line.text().to_string();
    match line.tag {
        Tag::Dest => header.destination = text,
        Tag::File => header.file = text,
        Tag::Copr => header.copyright = text,
        _ => header.language = text,
    }
    p.end_leaf(line)
}

fn header_date(p: &mut GedcomParser<'_>, line: &Line, header: &mut HeaderInfo) -> Result<()> {
    header.date = line.text().to_string();
    p.parse_level(line.level + 1, &HEADER_DATE_TABLE, header)
}

fn header_time(p: &mut GedcomParser<'_>, line: &Line, header: &mut HeaderInfo) -> Result<()> {
    if !line.text().is_empty() {
        header.date = format!("{} {}", header.date, line.text()).trim().to_string();
    }
    p.end_leaf(line)
}

fn header_submitter(p: &mut GedcomParser<'_>, line: &Line, header: &mut HeaderInfo) -> Result<()> {
    if let Some(xref) = p.pointer_or_warn(line)? {
        header.submitter = Some(xref.to_string());
    }
    p.end_leaf(line)
}

fn gedcom(p: &mut GedcomParser<'_>, line: &Line, header: &mut HeaderInfo) -> Result<()> {
    p.parse_level(line.level + 1, &GEDCOM_TABLE, header)
}

fn gedcom_field(p: &mut GedcomParser<'_>, line: &Line, header: &mut HeaderInfo) -> Result<()> {
    if line.tag == Tag::Vers {
        header.gedcom_version = line.text().to_string();
        p.end_leaf(line)
    } else {
        header.gedcom_form = line.text().to_string();
        // GEDC.FORM.VERS repeats the version
        p.skip_quietly(line)
    }
}

fn charset(p: &mut GedcomParser<'_>, line: &Line, header: &mut HeaderInfo) -> Result<()> {
    // The encoding itself was settled before this pass started
    header.charset = line.text().to_string();
    p.skip_quietly(line)
}

fn header_place(p: &mut GedcomParser<'_>, line: &Line, header: &mut HeaderInfo) -> Result<()> {
    p.parse_level(line.level + 1, &HEADER_PLACE_TABLE, header)
}

fn header_place_form(p: &mut GedcomParser<'_>, line: &Line, header: &mut HeaderInfo) -> Result<()> {
    header.place_form = line.text().to_string();
    p.place_form = parse_form(&header.place_form);
    p.end_leaf(line)
}

fn header_note(p: &mut GedcomParser<'_>, line: &Line, header: &mut HeaderInfo) -> Result<()> {
    header.note = line.value.trim_end().to_string();
    p.end_leaf(line)
}

fn schema(p: &mut GedcomParser<'_>, line: &Line, _header: &mut HeaderInfo) -> Result<()> {
    p.parse_level(line.level + 1, &SCHEMA_TABLE, &mut ())
}

fn schema_record(p: &mut GedcomParser<'_>, line: &Line, _state: &mut ()) -> Result<()> {
    p.parse_level(line.level + 1, &SCHEMA_TAG_TABLE, &mut ())
}

/// One declared tag, e.g. `3 _MILT` with `4 _DEFN Military Service`.
fn schema_tag(p: &mut GedcomParser<'_>, line: &Line, _state: &mut ()) -> Result<()> {
    let mut label = None;
    p.parse_level(line.level + 1, &SCHEMA_DEFN_TABLE, &mut label)?;
    let label = label
        .filter(|label: &String| !label.is_empty())
        .unwrap_or_else(|| line.raw_tag.trim_start_matches('_').to_string());
    debug!(tag = %line.raw_tag, %label, "schema tag declared");
    p.overlay.define(line.raw_tag.clone(), label);
    Ok(())
}

fn schema_label(p: &mut GedcomParser<'_>, line: &Line, label: &mut Option<String>) -> Result<()> {
    *label = Some(line.text().to_string());
    p.end_leaf(line)
}

// === SUBM record ===

static SUBMITTER_TABLE: DispatchTable<Submitter> = DispatchTable::new(
    "SUBM",
    &[
        (Tag::Name, submitter_field),
        (Tag::Addr, submitter_address),
        (Tag::Phon, submitter_field),
        (Tag::Email, submitter_field),
        (Tag::Lang, submitter_field),
        (Tag::Obje, ignore),
        (Tag::Fax, ignore),
        (Tag::Www, ignore),
        (Tag::Rfn, ignore),
        (Tag::Rin, ignore),
        (Tag::Note, ignore),
        (Tag::Chan, ignore),
    ],
);

pub(super) fn submitter_record(p: &mut GedcomParser<'_>, line: &Line, _top: &mut TopLevel) -> Result<()> {
    let mut submitter = Submitter {
        xref: line.xref.clone(),
        ..Submitter::default()
    };
    p.parse_level(1, &SUBMITTER_TABLE, &mut submitter)?;

    let referenced = p.header.submitter.is_some() && p.header.submitter == submitter.xref;
    if referenced || p.submitter.is_none() {
        p.submitter = Some(submitter);
    }
    Ok(())
}

fn submitter_field(p: &mut GedcomParser<'_>, line: &Line, submitter: &mut Submitter) -> Result<()> {
    let text = line.text().to_string();
    match line.tag {
        Tag::Name => submitter.name = text,
        Tag::Phon => submitter.phone = text,
        Tag::Email => submitter.email = text,
        _ => submitter.language = text,
    }
    p.end_leaf(line)
}

fn submitter_address(p: &mut GedcomParser<'_>, line: &Line, submitter: &mut Submitter) -> Result<()> {
    submitter.address = Some(p.parse_address(line)?);
    Ok(())
}
