//! `SOUR` and `REPO` records, and source citations.

use super::structures::{ignore, media, note};
use super::{DispatchTable, GedcomParser, TopLevel};
use crate::error::Result;
use crate::handle::{Handle, ObjectKind};
use crate::place::Address;
use crate::reader::Line;
use crate::recovery::IssueKind;
use crate::source::{Confidence, RepoRef, Repository, Source, SourceRef};
use crate::tags::Tag;

// === Citations ===

static CITATION_TABLE: DispatchTable<SourceRef> = DispatchTable::new(
    "citation",
    &[
        (Tag::Page, page),
        (Tag::Data, data),
        (Tag::Date, citation_date),
        (Tag::Quay, quality),
        (Tag::Text, citation_text),
        (Tag::Note, note::<SourceRef>),
        (Tag::Obje, media::<SourceRef>),
        (Tag::Even, ignore),
        (Tag::Chan, ignore),
    ],
);

static CITATION_DATA_TABLE: DispatchTable<SourceRef> = DispatchTable::new(
    "DATA",
    &[(Tag::Date, citation_date), (Tag::Text, citation_text)],
);

fn page(p: &mut GedcomParser<'_>, line: &Line, citation: &mut SourceRef) -> Result<()> {
    citation.page = line.text().to_string();
    p.end_leaf(line)
}

fn data(p: &mut GedcomParser<'_>, line: &Line, citation: &mut SourceRef) -> Result<()> {
    p.parse_level(line.level + 1, &CITATION_DATA_TABLE, citation)
}

fn citation_date(p: &mut GedcomParser<'_>, line: &Line, citation: &mut SourceRef) -> Result<()> {
    citation.date = Some(p.parse_date(line));
    p.end_leaf(line)
}

fn quality(p: &mut GedcomParser<'_>, line: &Line, citation: &mut SourceRef) -> Result<()> {
    match Confidence::from_quay(line.text()) {
        Some(confidence) => citation.confidence = confidence,
        None => {
            p.recovery.recover::<()>(
                IssueKind::InvalidValue,
                line.line_no,
                format!("QUAY must be 0-3, found '{}'", line.text()),
            )?;
        },
    }
    p.end_leaf(line)
}

fn citation_text(p: &mut GedcomParser<'_>, line: &Line, citation: &mut SourceRef) -> Result<()> {
    append_text(&mut citation.text, line.value.trim_end());
    p.end_leaf(line)
}

fn append_text(target: &mut String, text: &str) {
    if text.is_empty() {
        return;
    }
    if !target.is_empty() {
        target.push('\n');
    }
    target.push_str(text);
}

impl GedcomParser<'_> {
    /// A `SOUR` under any structure. A pointer cites a source record; text
    /// cites a source created from the text's first line.
    pub(super) fn parse_citation(&mut self, line: &Line) -> Result<SourceRef> {
        let mut citation = match line.pointer() {
            Some(xref) => SourceRef::new(self.resolve(ObjectKind::Source, xref)),
            None => {
                let text = line.value.trim_end();
                let title = text.lines().next().unwrap_or("").trim();
                let mut citation = SourceRef::new(self.synthetic_source(title));
                if text.contains('\n') {
                    citation.text = text.to_string();
                }
                citation
            },
        };
        self.parse_level(line.level + 1, &CITATION_TABLE, &mut citation)?;
        Ok(citation)
    }

    /// The source titled `title`, for citations that give only text.
    pub(super) fn synthetic_source(&mut self, title: &str) -> Handle {
        let key = format!("SOUR:{title}");
        if let Some(source) = self.sources.get(&key) {
            return source.handle.clone();
        }
        let resolution = self.resolve_derived(ObjectKind::Source, &key);
        let mut source = Source::new(resolution.handle.clone(), resolution.gramps_id);
        source.origin = Some(resolution.origin);
        source.title = title.to_string();
        self.sources.insert(key, source);
        resolution.handle
    }

    /// The repository named `name`, for `REPO` links that give only text.
    pub(super) fn synthetic_repository(&mut self, name: &str) -> Handle {
        let key = format!("REPO:{name}");
        if let Some(repository) = self.repositories.get(&key) {
            return repository.handle.clone();
        }
        let resolution = self.resolve_derived(ObjectKind::Repository, &key);
        let mut repository = Repository::new(resolution.handle.clone(), resolution.gramps_id);
        repository.origin = Some(resolution.origin);
        repository.name = name.to_string();
        self.repositories.insert(key, repository);
        resolution.handle
    }
}

// === SOUR record ===

static SOURCE_TABLE: DispatchTable<Source> = DispatchTable::new(
    "SOUR",
    &[
        (Tag::Titl, source_field),
        (Tag::Auth, source_field),
        (Tag::Publ, source_field),
        (Tag::Abbr, source_field),
        (Tag::Text, source_text),
        (Tag::Repo, repository_link),
        (Tag::Note, note::<Source>),
        (Tag::Obje, media::<Source>),
        (Tag::Data, ignore),
        (Tag::Refn, ignore),
        (Tag::Rin, ignore),
        (Tag::Chan, ignore),
        (Tag::Uid, ignore),
    ],
);

static REPO_LINK_TABLE: DispatchTable<RepoRef> = DispatchTable::new(
    "REPO",
    &[
        (Tag::Caln, call_number),
        (Tag::Medi, medium),
        (Tag::Note, note::<RepoRef>),
    ],
);

static CALL_NUMBER_TABLE: DispatchTable<RepoRef> =
    DispatchTable::new("CALN", &[(Tag::Medi, medium)]);

pub(super) fn source_record(p: &mut GedcomParser<'_>, line: &Line, _top: &mut TopLevel) -> Result<()> {
    let (resolution, _) = p.open_record(ObjectKind::Source, line)?;
    let mut source = Source::new(resolution.handle, resolution.gramps_id);
    source.origin = Some(resolution.origin);
    p.parse_level(1, &SOURCE_TABLE, &mut source)?;
    p.commit(source.into())
}

fn source_field(p: &mut GedcomParser<'_>, line: &Line, source: &mut Source) -> Result<()> {
    let text = line.value.trim_end().to_string();
    match line.tag {
        Tag::Titl => source.title = text,
        Tag::Auth => source.author = text,
        Tag::Publ => source.pubinfo = text,
        _ => source.abbrev = text,
    }
    p.end_leaf(line)
}

fn source_text(p: &mut GedcomParser<'_>, line: &Line, source: &mut Source) -> Result<()> {
    let text = line.value.trim_end();
    if !text.is_empty() {
        let note = p.text_note(text)?;
        source.notes.push(note);
    }
    p.end_leaf(line)
}

fn repository_link(p: &mut GedcomParser<'_>, line: &Line, source: &mut Source) -> Result<()> {
    let repository = match line.pointer() {
        Some(xref) => p.resolve(ObjectKind::Repository, xref),
        None if !line.text().is_empty() => p.synthetic_repository(line.text()),
        None => {
            // `1 REPO` with only a CALN under it
            p.recovery.recover::<()>(
                IssueKind::InvalidValue,
                line.line_no,
                "REPO without a repository".to_string(),
            )?;
            return p.skip_quietly(line);
        },
    };
    let mut link = RepoRef {
        repository,
        call_number: String::new(),
        media_type: String::new(),
        notes: Vec::new(),
    };
    p.parse_level(line.level + 1, &REPO_LINK_TABLE, &mut link)?;
    source.repo_refs.push(link);
    Ok(())
}

fn call_number(p: &mut GedcomParser<'_>, line: &Line, link: &mut RepoRef) -> Result<()> {
    link.call_number = line.text().to_string();
    p.parse_level(line.level + 1, &CALL_NUMBER_TABLE, link)
}

fn medium(p: &mut GedcomParser<'_>, line: &Line, link: &mut RepoRef) -> Result<()> {
    link.media_type = line.text().to_string();
    p.end_leaf(line)
}

// === REPO record ===

static REPOSITORY_TABLE: DispatchTable<Repository> = DispatchTable::new(
    "REPO",
    &[
        (Tag::Name, repository_name),
        (Tag::Addr, repository_address),
        (Tag::Phon, repository_phone),
        (Tag::Email, repository_url),
        (Tag::Www, repository_url),
        (Tag::Note, note::<Repository>),
        (Tag::Fax, ignore),
        (Tag::Refn, ignore),
        (Tag::Rin, ignore),
        (Tag::Chan, ignore),
    ],
);

pub(super) fn repository_record(p: &mut GedcomParser<'_>, line: &Line, _top: &mut TopLevel) -> Result<()> {
    let (resolution, _) = p.open_record(ObjectKind::Repository, line)?;
    let mut repository = Repository::new(resolution.handle, resolution.gramps_id);
    repository.origin = Some(resolution.origin);
    p.parse_level(1, &REPOSITORY_TABLE, &mut repository)?;
    p.commit(repository.into())
}

fn repository_name(p: &mut GedcomParser<'_>, line: &Line, repository: &mut Repository) -> Result<()> {
    repository.name = line.text().to_string();
    p.end_leaf(line)
}

fn repository_address(p: &mut GedcomParser<'_>, line: &Line, repository: &mut Repository) -> Result<()> {
    let mut address = p.parse_address(line)?;
    if let Some(previous) = repository.address.take() {
        if address.phone.is_empty() {
            address.phone = previous.phone;
        }
    }
    repository.address = Some(address);
    Ok(())
}

fn repository_phone(p: &mut GedcomParser<'_>, line: &Line, repository: &mut Repository) -> Result<()> {
    repository
        .address
        .get_or_insert_with(Address::default)
        .phone = line.text().to_string();
    p.end_leaf(line)
}

fn repository_url(p: &mut GedcomParser<'_>, line: &Line, repository: &mut Repository) -> Result<()> {
    let text = line.text();
    if !text.is_empty() {
        if line.tag == Tag::Email && !text.starts_with("mailto:") {
            repository.urls.push(format!("mailto:{text}"));
        } else {
            repository.urls.push(text.to_string());
        }
    }
    p.end_leaf(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_text() {
        let mut text = String::new();
        append_text(&mut text, "");
        assert_eq!(text, "");
        append_text(&mut text, "first");
        append_text(&mut text, "second");
        assert_eq!(text, "first\nsecond");
    }
}
