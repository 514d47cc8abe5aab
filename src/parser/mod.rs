//! Level-dispatch parser: the second pass over a GEDCOM file.
//!
//! Every structure is parsed by [`GedcomParser::parse_level`] with a
//! [`DispatchTable`] that maps tags to handlers. A handler usually recurses
//! into `parse_level` one level deeper with a nested table, so the grammar is
//! spelled out by the tables themselves:
//!
//! | Table | Module |
//! |-------|--------|
//! | records, header, submitter | [`header`] and this module |
//! | `INDI`, name, association | [`individual`] |
//! | `FAM` | [`family`] |
//! | event detail | [`events`] |
//! | `SOUR`/`REPO` records, citations | [`sources`] |
//! | address, place, note, media, LDS, attribute | [`structures`] |
//!
//! A line whose level is lower than the structure being parsed is pushed back
//! and closes that structure; this is the only way a structure ends, so a
//! level-0 line closes every open structure at once. Tags without a handler
//! go through the recovery policy and have their whole subtree skipped.

mod events;
mod family;
mod header;
mod individual;
mod sources;
mod structures;

pub use header::{HeaderInfo, Submitter};

use crate::attribute::LdsOrd;
use crate::config::ImportConfig;
use crate::date::{self, Date, DateParser};
use crate::encoding::GedcomEncoding;
use crate::error::{GedcomError, Result};
use crate::event::{Event, EventType};
use crate::family::Family;
use crate::handle::{Handle, ObjectKind};
use crate::id_mapper::{IdMapper, Resolution};
use crate::importer::ProgressSink;
use crate::media::{MediaObject, MediaRef};
use crate::note::Note;
use crate::object::{GenealogyObject, Object};
use crate::person::{Person, PersonRef};
use crate::place::{Address, Jurisdiction, Place, DEFAULT_PLACE_FORM};
use crate::prescan::Prescan;
use crate::reader::{Line, LineReader};
use crate::recovery::{IssueKind, RecoveryContext};
use crate::source::{RepoRef, Repository, Source, SourceRef};
use crate::storage::{Storage, Transaction};
use crate::tags::{SchemaOverlay, Tag, TagMeaning};
use crate::update::Update;
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, trace};

use events::EventState;
use family::FamilyState;
use individual::{NameState, PersonState};
use structures::{AttributeState, MediaDetail, PlaceDetail};

/// A tag handler. It receives the line that selected it and the state of the
/// structure being built, and must consume every line nested under it.
pub(crate) type Handler<S> = fn(&mut GedcomParser<'_>, &Line, &mut S) -> Result<()>;

/// Tag → handler map for one structure.
pub(crate) struct DispatchTable<S: 'static> {
    name: &'static str,
    entries: &'static [(Tag, Handler<S>)],
}

impl<S: 'static> DispatchTable<S> {
    pub(crate) const fn new(name: &'static str, entries: &'static [(Tag, Handler<S>)]) -> Self {
        DispatchTable { name, entries }
    }

    fn lookup(&self, tag: Tag) -> Option<Handler<S>> {
        self.entries
            .iter()
            .find(|(entry, _)| *entry == tag)
            .map(|(_, handler)| *handler)
    }
}

/// Structures that carry citations.
pub(crate) trait HasCitations {
    fn citations(&mut self) -> &mut Vec<SourceRef>;
}

/// Structures that carry note references.
pub(crate) trait HasNotes {
    fn notes(&mut self) -> &mut Vec<Handle>;
}

/// Structures that carry media references.
pub(crate) trait HasMedia {
    fn media_refs(&mut self) -> &mut Vec<MediaRef>;
}

macro_rules! attach {
    ($trait:ident, $method:ident, $item:ty: $($owner:ty => $($field:ident).+),+ $(,)?) => {
        $(
            impl $trait for $owner {
                fn $method(&mut self) -> &mut Vec<$item> {
                    &mut self.$($field).+
                }
            }
        )+
    };
}

attach!(HasCitations, citations, SourceRef:
    PersonState => person.citations,
    FamilyState => family.citations,
    EventState => event.citations,
    NameState => name.citations,
    AttributeState => attribute.citations,
    PlaceDetail => citations,
    MediaDetail => citations,
    Address => citations,
    LdsOrd => citations,
    PersonRef => citations,
    Note => citations,
);

attach!(HasNotes, notes, Handle:
    PersonState => person.notes,
    FamilyState => family.notes,
    EventState => event.notes,
    NameState => name.notes,
    AttributeState => attribute.notes,
    PlaceDetail => notes,
    MediaDetail => notes,
    Address => notes,
    LdsOrd => notes,
    PersonRef => notes,
    SourceRef => notes,
    RepoRef => notes,
    Source => notes,
    Repository => notes,
);

attach!(HasMedia, media_refs, MediaRef:
    PersonState => person.media_refs,
    FamilyState => family.media_refs,
    EventState => event.media_refs,
    SourceRef => media_refs,
    Source => media_refs,
);

/// Result of a completed parse.
#[derive(Debug)]
pub(crate) struct ParseOutcome {
    pub header: HeaderInfo,
    pub submitter: Option<Submitter>,
    pub counts: IndexMap<ObjectKind, usize>,
    pub issues: RecoveryContext,
    pub encoding: GedcomEncoding,
}

/// State of the top-level loop.
#[derive(Debug, Default)]
pub(crate) struct TopLevel {
    done: bool,
}

static RECORD_TABLE: DispatchTable<TopLevel> = DispatchTable::new(
    "record",
    &[
        (Tag::Indi, individual::person_record),
        (Tag::Fam, family::family_record),
        (Tag::Sour, sources::source_record),
        (Tag::Repo, sources::repository_record),
        (Tag::Obje, structures::media_record),
        (Tag::Note, structures::note_record),
        (Tag::Subm, header::submitter_record),
        (Tag::Subn, structures::ignore),
        (Tag::Trlr, trailer),
    ],
);

/// Nothing is expected under a leaf line.
static LEAF_TABLE: DispatchTable<()> = DispatchTable::new("leaf", &[]);

fn trailer(p: &mut GedcomParser<'_>, _line: &Line, top: &mut TopLevel) -> Result<()> {
    p.finish()?;
    top.done = true;
    Ok(())
}

/// The second-pass parser for one import run.
pub(crate) struct GedcomParser<'a> {
    reader: LineReader<'a>,
    prescan: &'a Prescan,
    config: &'a ImportConfig,
    store: &'a mut dyn Storage,
    txn: &'a mut Transaction,
    date_parser: &'a dyn DateParser,
    progress: Option<&'a mut dyn ProgressSink>,
    last_percent: Option<u8>,
    mapper: IdMapper,
    recovery: RecoveryContext,
    overlay: SchemaOverlay,
    place_form: Vec<Option<Jurisdiction>>,
    // Entities without a record of their own, committed at the trailer
    places: IndexMap<String, Place>,
    sources: IndexMap<String, Source>,
    repositories: IndexMap<String, Repository>,
    media: IndexMap<String, MediaObject>,
    // Key of the open top-level record, for derived origin keys
    record_key: String,
    derived: HashMap<char, usize>,
    header: HeaderInfo,
    submitter: Option<Submitter>,
    counts: IndexMap<ObjectKind, usize>,
    committed: HashSet<Handle>,
}

impl<'a> GedcomParser<'a> {
    pub(crate) fn new(
        reader: LineReader<'a>,
        prescan: &'a Prescan,
        config: &'a ImportConfig,
        store: &'a mut dyn Storage,
        txn: &'a mut Transaction,
        date_parser: &'a dyn DateParser,
    ) -> Self {
        GedcomParser {
            reader,
            prescan,
            config,
            store,
            txn,
            date_parser,
            progress: None,
            last_percent: None,
            mapper: IdMapper::new(config.origin.clone()),
            recovery: RecoveryContext::new(config.recovery_mode),
            overlay: SchemaOverlay::default(),
            place_form: DEFAULT_PLACE_FORM.iter().copied().map(Some).collect(),
            places: IndexMap::new(),
            sources: IndexMap::new(),
            repositories: IndexMap::new(),
            media: IndexMap::new(),
            record_key: String::new(),
            derived: HashMap::new(),
            header: HeaderInfo::default(),
            submitter: None,
            counts: IndexMap::new(),
            committed: HashSet::new(),
        }
    }

    pub(crate) fn with_progress(mut self, progress: Option<&'a mut dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    /// Parse the whole file, from `0 HEAD` to `0 TRLR`.
    pub(crate) fn run(mut self) -> Result<ParseOutcome> {
        let encoding = self.reader.encoding();
        info!(%encoding, lines = self.prescan.line_count, "parsing records");

        let head = self
            .next_line()?
            .ok_or_else(|| GedcomError::BadHeader("empty file".to_string()))?;
        if head.level != 0 || head.tag != Tag::Head {
            return Err(GedcomError::BadHeader(format!(
                "expected '0 HEAD' on line {}, found '{} {}'",
                head.line_no, head.level, head.raw_tag
            )));
        }
        header::parse_header(&mut self, &head)?;

        let mut top = TopLevel::default();
        while !top.done {
            let Some(line) = self.next_line()? else {
                return Err(GedcomError::TruncatedFile(
                    "end of input before '0 TRLR'".to_string(),
                ));
            };
            if line.level > 0 {
                self.not_recognized(&line)?;
                continue;
            }
            match RECORD_TABLE.lookup(line.tag) {
                Some(handler) => handler(&mut self, &line, &mut top)?,
                None => self.not_recognized(&line)?,
            }
        }

        Ok(self.into_outcome(encoding))
    }

    fn into_outcome(mut self, encoding: GedcomEncoding) -> ParseOutcome {
        let mut issues = self.reader.take_issues();
        issues.absorb(self.recovery);
        // Issues not tied to a line (missing records) go last
        issues
            .issues
            .sort_by_key(|issue| if issue.line == 0 { usize::MAX } else { issue.line });
        ParseOutcome {
            header: self.header,
            submitter: self.submitter,
            counts: self.counts,
            issues,
            encoding,
        }
    }

    fn next_line(&mut self) -> Result<Option<Line>> {
        let line = self.reader.next_line()?;
        self.report_progress();
        Ok(line)
    }

    fn report_progress(&mut self) {
        let Some(sink) = self.progress.as_deref_mut() else {
            return;
        };
        let total = self.prescan.line_count.max(1);
        let read = self.reader.physical_lines_read().min(total);
        let percent = u8::try_from(read * 100 / total).unwrap_or(100);
        if self.last_percent != Some(percent) {
            self.last_percent = Some(percent);
            sink.report(percent);
        }
    }

    /// Dispatch every line nested at `level` or deeper through `table`.
    ///
    /// Returns when a line above `level` is seen; that line is pushed back for
    /// the caller.
    ///
    /// # Errors
    ///
    /// [`GedcomError::TruncatedFile`] when input ends inside the structure,
    /// plus anything a handler or the recovery policy raises.
    pub(crate) fn parse_level<S: 'static>(
        &mut self,
        level: usize,
        table: &DispatchTable<S>,
        state: &mut S,
    ) -> Result<()> {
        loop {
            let Some(line) = self.next_line()? else {
                return Err(GedcomError::TruncatedFile(format!(
                    "end of input inside {} structure",
                    table.name
                )));
            };
            if line.level < level {
                self.reader.push_back(line);
                return Ok(());
            }
            match table.lookup(line.tag) {
                Some(handler) => handler(self, &line, state)?,
                None => self.not_recognized(&line)?,
            }
        }
    }

    /// Default handler: report the tag and skip its subtree.
    pub(crate) fn not_recognized(&mut self, line: &Line) -> Result<()> {
        self.recovery
            .recover::<()>(IssueKind::UnrecognizedTag, line.line_no, line.raw_tag.clone())?;
        let skipped = self.reader.skip_subordinates(line.level)?;
        trace!(line = line.line_no, tag = %line.raw_tag, skipped, "skipped subtree");
        Ok(())
    }

    /// Close a line that takes no subordinates; anything nested under it is
    /// unrecognized.
    pub(crate) fn end_leaf(&mut self, line: &Line) -> Result<()> {
        self.parse_level(line.level + 1, &LEAF_TABLE, &mut ())
    }

    /// Skip a subtree without reporting it.
    pub(crate) fn skip_quietly(&mut self, line: &Line) -> Result<()> {
        self.reader.skip_subordinates(line.level)?;
        Ok(())
    }

    /// The pointer of a line that must carry one.
    pub(crate) fn pointer_or_warn<'l>(&mut self, line: &'l Line) -> Result<Option<&'l str>> {
        if let Some(xref) = line.pointer() {
            return Ok(Some(xref));
        }
        self.recovery.recover::<()>(
            IssueKind::InvalidValue,
            line.line_no,
            format!("{} expects a cross-reference, found '{}'", line.raw_tag, line.value),
        )?;
        Ok(None)
    }

    /// Vendor or schema-declared meaning of a custom tag.
    pub(crate) fn vendor_meaning(&self, raw_tag: &str) -> Option<TagMeaning> {
        self.overlay.resolve(raw_tag, &self.config.tag_table)
    }

    /// Parse a `DATE` value. Unparsable text is kept as a text-only date and
    /// reported, never fatal.
    pub(crate) fn parse_date(&mut self, line: &Line) -> Date {
        let text = line.text();
        match date::recognize(text, self.date_parser) {
            Ok(date) => date,
            Err(err) => {
                self.recovery
                    .note(IssueKind::DateError, line.line_no, err.to_string());
                Date::text_only(text)
            },
        }
    }

    // === Identity ===

    /// Resolve and claim the xref of a top-level record.
    pub(crate) fn open_record(
        &mut self,
        kind: ObjectKind,
        line: &Line,
    ) -> Result<(Resolution, Option<String>)> {
        self.derived.clear();
        match line.xref.as_deref() {
            Some(xref) => {
                if self.mapper.is_defined(kind, xref) {
                    self.recovery.recover::<()>(
                        IssueKind::InvalidValue,
                        line.line_no,
                        format!("{kind} @{xref}@ is defined more than once"),
                    )?;
                }
                self.record_key = format!("{}@{xref}@", kind.id_prefix());
                let resolution = self.mapper.resolve(kind, xref, &mut *self.store);
                self.mapper.mark_defined(kind, xref);
                Ok((resolution, Some(xref.to_string())))
            },
            None => {
                self.record_key = format!("{}#{}", kind.id_prefix(), line.line_no);
                let key = self.record_key.clone();
                Ok((self.mapper.resolve_derived(kind, &key, &mut *self.store), None))
            },
        }
    }

    /// Next derived key under the open record, e.g. `I@I1@/E3`.
    pub(crate) fn derived_key(&mut self, letter: char) -> String {
        let ordinal = self.derived.entry(letter).or_insert(0);
        *ordinal += 1;
        format!("{}/{}{}", self.record_key, letter, *ordinal)
    }

    pub(crate) fn resolve(&mut self, kind: ObjectKind, xref: &str) -> Handle {
        self.mapper.resolve(kind, xref, &mut *self.store).handle
    }

    pub(crate) fn resolve_derived(&mut self, kind: ObjectKind, key: &str) -> Resolution {
        self.mapper.resolve_derived(kind, key, &mut *self.store)
    }

    // === Commit ===

    /// Store `object`. An entity already in storage, from an earlier import
    /// or an earlier definition in this file, is updated rather than replaced.
    pub(crate) fn commit(&mut self, object: Object) -> Result<()> {
        let kind = object.kind();
        let handle = object.handle().clone();
        let object = match self.store.find_by_handle(kind, &handle) {
            Some(mut stored) => {
                stored.update_from(object);
                stored
            },
            None => object,
        };
        debug!(%kind, id = object.gramps_id(), "commit");
        self.store.commit(object, &mut *self.txn)?;
        if self.committed.insert(handle) {
            *self.counts.entry(kind).or_insert(0) += 1;
        }
        Ok(())
    }

    /// Commit everything still pending once the trailer is reached.
    fn finish(&mut self) -> Result<()> {
        let places = std::mem::take(&mut self.places);
        for place in places.into_values() {
            self.commit(place.into())?;
        }
        let sources = std::mem::take(&mut self.sources);
        for source in sources.into_values() {
            self.commit(source.into())?;
        }
        let repositories = std::mem::take(&mut self.repositories);
        for repository in repositories.into_values() {
            self.commit(repository.into())?;
        }
        let media = std::mem::take(&mut self.media);
        for object in media.into_values() {
            self.commit(object.into())?;
        }
        self.commit_placeholders()
    }

    /// Give every referenced-but-undefined xref a placeholder entity.
    fn commit_placeholders(&mut self) -> Result<()> {
        let mut seen: HashSet<(ObjectKind, String)> = HashSet::new();
        loop {
            let pending: Vec<_> = self
                .mapper
                .dangling()
                .into_iter()
                .filter(|(kind, xref, _)| !seen.contains(&(*kind, xref.clone())))
                .collect();
            if pending.is_empty() {
                return Ok(());
            }
            for (kind, xref, resolution) in pending {
                seen.insert((kind, xref.clone()));
                self.recovery.recover::<()>(
                    IssueKind::MissingRecord,
                    0,
                    format!("{kind} @{xref}@ is referenced but never defined"),
                )?;
                // An earlier import still holds the real record
                if resolution.existed {
                    continue;
                }
                let placeholder = self.placeholder(kind, &xref, resolution)?;
                self.commit(placeholder)?;
            }
        }
    }

    fn placeholder(&mut self, kind: ObjectKind, xref: &str, resolution: Resolution) -> Result<Object> {
        let Resolution {
            handle,
            gramps_id,
            origin,
            ..
        } = resolution;
        let mut object: Object = match kind {
            ObjectKind::Person => {
                let mut person = Person::new(handle, gramps_id);
                self.link_person(&mut person, xref);
                person.into()
            },
            ObjectKind::Family => {
                let mut family = Family::new(handle, gramps_id);
                self.link_family(&mut family, xref)?;
                family.into()
            },
            ObjectKind::Event => {
                Event::new(handle, gramps_id, EventType::Custom("Event".to_string())).into()
            },
            ObjectKind::Source => Source::new(handle, gramps_id).into(),
            ObjectKind::Repository => Repository::new(handle, gramps_id).into(),
            ObjectKind::Place => Place::new(handle, gramps_id, "").into(),
            ObjectKind::Media => MediaObject::new(handle, gramps_id).into(),
            ObjectKind::Note => Note::new(handle, gramps_id, "").into(),
        };
        object.set_origin(Some(origin));
        Ok(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date::BasicDateParser;
    use crate::storage::MemoryStore;

    fn parse(data: &[u8]) -> (Result<ParseOutcome>, MemoryStore) {
        let prescan = Prescan::scan(data).unwrap();
        let config = ImportConfig::default();
        let mut store = MemoryStore::new();
        let mut txn = store.transaction_begin("test").unwrap();
        let outcome = {
            let reader = LineReader::new(data);
            let parser = GedcomParser::new(
                reader,
                &prescan,
                &config,
                &mut store,
                &mut txn,
                &BasicDateParser,
            );
            parser.run()
        };
        store.transaction_commit(txn).unwrap();
        (outcome, store)
    }

    #[test]
    fn test_dispatch_table_lookup() {
        assert!(RECORD_TABLE.lookup(Tag::Indi).is_some());
        assert!(RECORD_TABLE.lookup(Tag::Trlr).is_some());
        assert!(RECORD_TABLE.lookup(Tag::Name).is_none());
        assert!(LEAF_TABLE.lookup(Tag::Date).is_none());
    }

    #[test]
    fn test_unknown_record_skipped_with_warning() {
        let data = b"0 HEAD\n0 @X1@ _CUSTOMREC\n1 FOO bar\n2 BAZ\n0 @I1@ INDI\n1 SEX M\n0 TRLR\n";
        let (outcome, store) = parse(data);
        let outcome = outcome.unwrap();
        assert_eq!(outcome.issues.count(IssueKind::UnrecognizedTag), 1);
        assert_eq!(store.count(ObjectKind::Person), 1);
    }

    #[test]
    fn test_leaf_with_children_reports_them() {
        let data = b"0 HEAD\n0 @I1@ INDI\n1 SEX M\n2 _ODD x\n1 NAME A /B/\n0 TRLR\n";
        let (outcome, store) = parse(data);
        let outcome = outcome.unwrap();
        assert_eq!(outcome.issues.count(IssueKind::UnrecognizedTag), 1);
        let person = store.people().next().unwrap();
        assert_eq!(person.primary_name.surname, "B");
    }

    #[test]
    fn test_missing_trailer_is_truncation() {
        let data = b"0 HEAD\n0 @F1@ FAM\n1 HUSB @I1@\n";
        let (outcome, _) = parse(data);
        assert!(matches!(outcome, Err(GedcomError::TruncatedFile(_))));
    }

    #[test]
    fn test_dangling_reference_gets_placeholder() {
        let data = b"0 HEAD\n0 @F1@ FAM\n1 HUSB @I9@\n0 TRLR\n";
        let (outcome, store) = parse(data);
        let outcome = outcome.unwrap();
        assert_eq!(outcome.issues.count(IssueKind::MissingRecord), 1);
        let person = store.people().next().unwrap();
        assert_eq!(person.gramps_id, "I0009");
        assert_eq!(person.family_list.len(), 1);
        assert_eq!(outcome.issues.issues.last().unwrap().line, 0);
    }

    #[test]
    fn test_derived_keys_are_per_record() {
        let data = b"0 HEAD\n0 @I1@ INDI\n1 BIRT\n1 DEAT\n0 @I2@ INDI\n1 BIRT\n0 TRLR\n";
        let (outcome, store) = parse(data);
        outcome.unwrap();
        let origins: Vec<_> = store
            .events()
            .map(|e| e.origin.clone().unwrap())
            .collect();
        assert_eq!(origins, vec!["I@I1@/E1", "I@I1@/E2", "I@I2@/E1"]);
    }
}
