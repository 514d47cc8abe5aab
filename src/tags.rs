//! GEDCOM tag vocabulary and vendor tag translation.
//!
//! [`Tag`] is the closed set of tags the parser dispatches on; anything else
//! lexes as [`Tag::Unknown`] with its raw text preserved on the line.
//!
//! Vendor extensions (`_MILT`, `_DEG`, `_MARNM`, ...) are translated through a
//! [`TagTable`], an immutable value carried in the import configuration.
//! Per-file declarations from the header's `_SCHEMA` block live in a
//! [`SchemaOverlay`] owned by a single run and consulted first.

use crate::attribute::AttributeType;
use crate::event::EventType;
use crate::person::NameType;
use indexmap::IndexMap;
use lazy_static::lazy_static;
use std::collections::HashMap;

/// A recognised GEDCOM tag.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    // Records and continuation
    Head,
    Trlr,
    Indi,
    Fam,
    Sour,
    Repo,
    Obje,
    Note,
    Subm,
    Subn,
    Cont,
    Conc,
    // Header
    Char,
    Vers,
    Name,
    Corp,
    Dest,
    Date,
    Time,
    File,
    Copr,
    Gedc,
    Form,
    Lang,
    Plac,
    Schema,
    Defn,
    Data,
    // Name pieces
    Npfx,
    Givn,
    Nick,
    Spfx,
    Surn,
    Nsfx,
    Type,
    Romn,
    Fone,
    Alia,
    // Person links
    Sex,
    Famc,
    Fams,
    Asso,
    Rela,
    Pedi,
    Frel,
    Mrel,
    Primary,
    Stat,
    VendorStatus,
    // Individual events
    Birt,
    Chr,
    Deat,
    Buri,
    Crem,
    Adop,
    Bapm,
    Barm,
    Basm,
    Bles,
    Chra,
    Conf,
    Fcom,
    Ordn,
    Natu,
    Emig,
    Immi,
    Cens,
    Prob,
    Will,
    Grad,
    Reti,
    Even,
    Resi,
    Occu,
    Educ,
    Reli,
    Prop,
    Titl,
    // Family events
    Marr,
    Div,
    Divf,
    Enga,
    Marb,
    Marc,
    Marl,
    Mars,
    Anul,
    // Attributes and identifiers
    Cast,
    Dscr,
    Idno,
    Nati,
    Nchi,
    Nmr,
    Ssn,
    Fact,
    Refn,
    Rfn,
    Afn,
    Rin,
    Uid,
    Chan,
    // Family members
    Husb,
    Wife,
    Chil,
    NotMarried,
    // Event detail
    Age,
    Agnc,
    Caus,
    Witn,
    Addr,
    Adr1,
    Adr2,
    Adr3,
    City,
    Stae,
    Post,
    Ctry,
    Phon,
    Email,
    Fax,
    Www,
    Map,
    Lati,
    Long,
    // Citation and source
    Page,
    Quay,
    Text,
    Auth,
    Publ,
    Abbr,
    Caln,
    Medi,
    // LDS ordinances
    Bapl,
    Conl,
    Endl,
    Slgc,
    Slgs,
    Temp,
    // Multimedia
    Blob,
    /// Anything not listed above
    Unknown,
}

lazy_static! {
    static ref TAG_NAMES: HashMap<&'static str, Tag> = {
        use Tag::*;
        let entries: &[(&str, Tag)] = &[
            ("HEAD", Head), ("TRLR", Trlr), ("INDI", Indi), ("FAM", Fam),
            ("SOUR", Sour), ("REPO", Repo), ("OBJE", Obje), ("NOTE", Note),
            ("SUBM", Subm), ("SUBN", Subn), ("CONT", Cont), ("CONC", Conc),
            ("CHAR", Char), ("VERS", Vers), ("NAME", Name), ("CORP", Corp),
            ("DEST", Dest), ("DATE", Date), ("TIME", Time), ("FILE", File),
            ("COPR", Copr), ("GEDC", Gedc), ("FORM", Form), ("LANG", Lang),
            ("PLAC", Plac), ("_SCHEMA", Schema), ("_DEFN", Defn), ("DATA", Data),
            ("NPFX", Npfx), ("GIVN", Givn), ("NICK", Nick), ("SPFX", Spfx),
            ("SURN", Surn), ("NSFX", Nsfx), ("TYPE", Type), ("ROMN", Romn),
            ("FONE", Fone), ("ALIA", Alia),
            ("SEX", Sex), ("FAMC", Famc), ("FAMS", Fams), ("ASSO", Asso),
            ("RELA", Rela), ("PEDI", Pedi), ("_FREL", Frel), ("_MREL", Mrel),
            ("_PRIMARY", Primary), ("STAT", Stat), ("_STAT", VendorStatus),
            ("BIRT", Birt), ("CHR", Chr), ("DEAT", Deat), ("BURI", Buri),
            ("CREM", Crem), ("ADOP", Adop), ("BAPM", Bapm), ("BARM", Barm),
            ("BASM", Basm), ("BLES", Bles), ("CHRA", Chra), ("CONF", Conf),
            ("FCOM", Fcom), ("ORDN", Ordn), ("NATU", Natu), ("EMIG", Emig),
            ("IMMI", Immi), ("CENS", Cens), ("PROB", Prob), ("WILL", Will),
            ("GRAD", Grad), ("RETI", Reti), ("EVEN", Even), ("RESI", Resi),
            ("OCCU", Occu), ("EDUC", Educ), ("RELI", Reli), ("PROP", Prop),
            ("TITL", Titl),
            ("MARR", Marr), ("DIV", Div), ("DIVF", Divf), ("ENGA", Enga),
            ("MARB", Marb), ("MARC", Marc), ("MARL", Marl), ("MARS", Mars),
            ("ANUL", Anul),
            ("CAST", Cast), ("DSCR", Dscr), ("IDNO", Idno), ("NATI", Nati),
            ("NCHI", Nchi), ("NMR", Nmr), ("SSN", Ssn), ("FACT", Fact),
            ("REFN", Refn), ("RFN", Rfn), ("AFN", Afn), ("RIN", Rin),
            ("_UID", Uid), ("CHAN", Chan),
            ("HUSB", Husb), ("WIFE", Wife), ("CHIL", Chil),
            ("_NMR", NotMarried), ("_NMAR", NotMarried),
            ("AGE", Age), ("AGNC", Agnc), ("CAUS", Caus), ("WITN", Witn),
            ("_WITN", Witn), ("ADDR", Addr), ("ADR1", Adr1), ("ADR2", Adr2),
            ("ADR3", Adr3), ("CITY", City), ("STAE", Stae), ("POST", Post),
            ("CTRY", Ctry), ("PHON", Phon), ("EMAIL", Email), ("_EMAIL", Email),
            ("FAX", Fax), ("WWW", Www), ("_URL", Www), ("MAP", Map),
            ("LATI", Lati), ("LONG", Long),
            ("PAGE", Page), ("QUAY", Quay), ("TEXT", Text), ("AUTH", Auth),
            ("PUBL", Publ), ("ABBR", Abbr), ("CALN", Caln), ("MEDI", Medi),
            ("BAPL", Bapl), ("CONL", Conl), ("ENDL", Endl), ("SLGC", Slgc),
            ("SLGS", Slgs), ("TEMP", Temp),
            ("BLOB", Blob),
        ];
        entries.iter().copied().collect()
    };
}

impl Tag {
    /// Classify raw tag text. Matching is case-insensitive.
    #[must_use]
    pub fn from_text(raw: &str) -> Tag {
        if let Some(tag) = TAG_NAMES.get(raw) {
            return *tag;
        }
        let upper = raw.to_ascii_uppercase();
        TAG_NAMES.get(upper.as_str()).copied().unwrap_or(Tag::Unknown)
    }

    /// Event type for a standard individual or family event tag.
    #[must_use]
    pub fn event_type(self) -> Option<EventType> {
        let event = match self {
            Tag::Birt => EventType::Birth,
            Tag::Chr => EventType::Christening,
            Tag::Deat => EventType::Death,
            Tag::Buri => EventType::Burial,
            Tag::Crem => EventType::Cremation,
            Tag::Adop => EventType::Adopted,
            Tag::Bapm => EventType::Baptism,
            Tag::Barm => EventType::BarMitzvah,
            Tag::Basm => EventType::BasMitzvah,
            Tag::Bles => EventType::Blessing,
            Tag::Chra => EventType::AdultChristening,
            Tag::Conf => EventType::Confirmation,
            Tag::Fcom => EventType::FirstCommunion,
            Tag::Ordn => EventType::Ordination,
            Tag::Natu => EventType::Naturalization,
            Tag::Emig => EventType::Emigration,
            Tag::Immi => EventType::Immigration,
            Tag::Cens => EventType::Census,
            Tag::Prob => EventType::Probate,
            Tag::Will => EventType::Will,
            Tag::Grad => EventType::Graduation,
            Tag::Reti => EventType::Retirement,
            Tag::Resi => EventType::Residence,
            Tag::Occu => EventType::Occupation,
            Tag::Educ => EventType::Education,
            Tag::Reli => EventType::Religion,
            Tag::Prop => EventType::Property,
            Tag::Titl => EventType::NobilityTitle,
            Tag::Marr => EventType::Marriage,
            Tag::Div => EventType::Divorce,
            Tag::Divf => EventType::DivorceFiling,
            Tag::Enga => EventType::Engagement,
            Tag::Marb => EventType::MarriageBanns,
            Tag::Marc => EventType::MarriageContract,
            Tag::Marl => EventType::MarriageLicense,
            Tag::Mars => EventType::MarriageSettlement,
            Tag::Anul => EventType::Annulment,
            _ => return None,
        };
        Some(event)
    }

    /// Attribute type for a standard attribute or identifier tag.
    #[must_use]
    pub fn attribute_type(self) -> Option<AttributeType> {
        let attr = match self {
            Tag::Cast => AttributeType::Caste,
            Tag::Dscr => AttributeType::Description,
            Tag::Idno => AttributeType::IdNumber,
            Tag::Nati => AttributeType::Nationality,
            Tag::Nchi => AttributeType::NumChildren,
            Tag::Nmr => AttributeType::NumMarriages,
            Tag::Ssn => AttributeType::SocialSecurityNumber,
            Tag::Refn => AttributeType::Custom("REFN".to_string()),
            Tag::Rfn => AttributeType::Custom("RFN".to_string()),
            Tag::Afn => AttributeType::Custom("AFN".to_string()),
            Tag::Uid => AttributeType::Custom("_UID".to_string()),
            _ => return None,
        };
        Some(attr)
    }
}

/// What a vendor tag translates to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagMeaning {
    /// Parse the subtree as an event of this type
    Event(EventType),
    /// Parse the subtree as an attribute of this type
    Attribute(AttributeType),
    /// Parse the subtree as an alternate name of this type
    Name(NameType),
}

/// Immutable vendor-tag translation table.
///
/// Loaded once (the default covers common desktop-program extensions) and
/// shared by reference with the parser. Lookups are by exact raw tag text.
#[derive(Debug, Clone)]
pub struct TagTable {
    entries: IndexMap<String, TagMeaning>,
}

impl Default for TagTable {
    fn default() -> Self {
        let custom_event = |label: &str| TagMeaning::Event(EventType::Custom(label.to_string()));
        let custom_attr =
            |label: &str| TagMeaning::Attribute(AttributeType::Custom(label.to_string()));

        let mut entries = IndexMap::new();
        entries.insert("_MILT".to_string(), custom_event("Military Service"));
        entries.insert("_MILTSVC".to_string(), custom_event("Military Service"));
        entries.insert("_DEG".to_string(), TagMeaning::Event(EventType::Degree));
        entries.insert("_ELEC".to_string(), TagMeaning::Event(EventType::Elected));
        entries.insert("_EMPLOY".to_string(), custom_event("Employment"));
        entries.insert("_EXCM".to_string(), custom_event("Excommunication"));
        entries.insert("_FUN".to_string(), custom_event("Funeral"));
        entries.insert("_MISN".to_string(), custom_event("Mission"));
        entries.insert("_MDCL".to_string(), custom_attr("Medical Information"));
        entries.insert("_HEIG".to_string(), custom_attr("Height"));
        entries.insert("_WEIG".to_string(), custom_attr("Weight"));
        entries.insert("_MARNM".to_string(), TagMeaning::Name(NameType::Married));
        entries.insert("_AKA".to_string(), TagMeaning::Name(NameType::Aka));
        entries.insert("_AKAN".to_string(), TagMeaning::Name(NameType::Aka));
        TagTable { entries }
    }
}

impl TagTable {
    /// An empty table: every vendor tag is unrecognised.
    #[must_use]
    pub fn empty() -> Self {
        TagTable {
            entries: IndexMap::new(),
        }
    }

    /// Add or replace one translation.
    #[must_use]
    pub fn with_entry(mut self, raw_tag: impl Into<String>, meaning: TagMeaning) -> Self {
        self.entries.insert(raw_tag.into(), meaning);
        self
    }

    /// Translation for a raw tag, if any.
    #[must_use]
    pub fn lookup(&self, raw_tag: &str) -> Option<&TagMeaning> {
        self.entries.get(raw_tag)
    }

    /// Number of translations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no translations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Per-file custom tag declarations from `HEAD._SCHEMA`.
///
/// Maps a custom tag to its declared label; declared tags are parsed as
/// custom events carrying that label.
#[derive(Debug, Clone, Default)]
pub struct SchemaOverlay {
    definitions: IndexMap<String, String>,
}

impl SchemaOverlay {
    /// Declare a custom tag.
    pub fn define(&mut self, raw_tag: impl Into<String>, label: impl Into<String>) {
        self.definitions.insert(raw_tag.into(), label.into());
    }

    /// Resolve a raw tag against this overlay, then against `table`.
    #[must_use]
    pub fn resolve(&self, raw_tag: &str, table: &TagTable) -> Option<TagMeaning> {
        if let Some(label) = self.definitions.get(raw_tag) {
            return Some(TagMeaning::Event(EventType::Custom(label.clone())));
        }
        table.lookup(raw_tag).cloned()
    }

    /// Number of declared tags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Whether nothing has been declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_text() {
        assert_eq!(Tag::from_text("INDI"), Tag::Indi);
        assert_eq!(Tag::from_text("indi"), Tag::Indi);
        assert_eq!(Tag::from_text("_FREL"), Tag::Frel);
        assert_eq!(Tag::from_text("_WITN"), Tag::Witn);
        assert_eq!(Tag::from_text("_SOMETHING"), Tag::Unknown);
    }

    #[test]
    fn test_event_and_attribute_types() {
        assert_eq!(Tag::Birt.event_type(), Some(EventType::Birth));
        assert_eq!(Tag::Marr.event_type(), Some(EventType::Marriage));
        assert_eq!(Tag::Name.event_type(), None);
        assert_eq!(Tag::Nati.attribute_type(), Some(AttributeType::Nationality));
    }

    #[test]
    fn test_default_table_translates_vendor_tags() {
        let table = TagTable::default();
        assert_eq!(table.lookup("_DEG"), Some(&TagMeaning::Event(EventType::Degree)));
        assert_eq!(
            table.lookup("_MARNM"),
            Some(&TagMeaning::Name(NameType::Married))
        );
        assert!(table.lookup("_NOPE").is_none());
    }

    #[test]
    fn test_schema_overlay_takes_precedence() {
        let table = TagTable::default();
        let mut overlay = SchemaOverlay::default();
        overlay.define("_DEG", "Diploma");
        assert_eq!(
            overlay.resolve("_DEG", &table),
            Some(TagMeaning::Event(EventType::Custom("Diploma".to_string())))
        );
        assert_eq!(
            overlay.resolve("_ELEC", &table),
            Some(TagMeaning::Event(EventType::Elected))
        );
    }
}
