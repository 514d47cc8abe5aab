//! The import entry point.
//!
//! [`Importer`] runs both passes over a file: the prescan, which settles the
//! encoding and collects the linkage maps, and the level-dispatch parse, which
//! builds and commits entities. The whole parse runs inside one storage
//! transaction; a fatal error rolls it back so the store is left exactly as it
//! was.
//!
//! # Examples
//!
//! ```
//! use gdrc::{Importer, MemoryStore, ObjectKind};
//!
//! let data = b"0 HEAD\n1 CHAR UTF-8\n0 @I1@ INDI\n1 NAME John /Smith/\n0 TRLR\n";
//! let mut store = MemoryStore::new();
//! let summary = Importer::new().import_bytes(data, &mut store)?;
//! assert_eq!(summary.count(ObjectKind::Person), 1);
//! # Ok::<(), gdrc::GedcomError>(())
//! ```

use crate::config::ImportConfig;
use crate::date::{BasicDateParser, DateParser};
use crate::encoding::{normalize_source, GedcomEncoding};
use crate::error::Result;
use crate::handle::ObjectKind;
use crate::parser::{GedcomParser, HeaderInfo, Submitter};
use crate::prescan::Prescan;
use crate::reader::LineReader;
use crate::recovery::{ImportIssue, IssueKind};
use crate::storage::Storage;
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

/// Receives progress while a file is parsed.
///
/// Called only when the integer percentage changes. Implemented for any
/// `FnMut(u8)` closure.
pub trait ProgressSink {
    /// Report progress in percent, 0 to 100.
    fn report(&mut self, percent: u8);
}

impl<F: FnMut(u8)> ProgressSink for F {
    fn report(&mut self, percent: u8) {
        self(percent);
    }
}

/// Outcome of a completed import.
#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    /// Entities committed per kind
    pub counts: IndexMap<ObjectKind, usize>,
    /// Recoverable problems, in line order; problems not tied to a line last
    pub issues: Vec<ImportIssue>,
    /// Problems dropped without a record (permissive mode)
    pub suppressed: usize,
    /// What the header says about the file
    pub header: HeaderInfo,
    /// The file's submitter, if it has a `SUBM` record
    pub submitter: Option<Submitter>,
    /// Encoding used to decode values
    pub encoding: GedcomEncoding,
    /// Whether `CONC` segments were joined with a space
    pub broken_conc: bool,
    /// Physical lines in the file
    pub lines: usize,
}

impl ImportSummary {
    /// Entities of `kind` committed.
    #[must_use]
    pub fn count(&self, kind: ObjectKind) -> usize {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    /// Issues of one kind.
    pub fn issues_of(&self, kind: IssueKind) -> impl Iterator<Item = &ImportIssue> {
        self.issues.iter().filter(move |issue| issue.kind == kind)
    }

    /// Number of problems skipped or warned about, recorded or not.
    #[must_use]
    pub fn warnings(&self) -> usize {
        self.issues.len() + self.suppressed
    }
}

impl fmt::Display for ImportSummary {
    // A summary only exists for a completed run, so nothing was fatal
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} records skipped/warned, 0 fatal", self.warnings())
    }
}

/// Imports GEDCOM files into a [`Storage`].
///
/// # Examples
///
/// ```
/// use gdrc::{ImportConfig, Importer, MemoryStore, RecoveryMode};
///
/// let mut percents = Vec::new();
/// let mut importer = Importer::new()
///     .with_config(ImportConfig::new().with_recovery_mode(RecoveryMode::Permissive))
///     .with_progress(|percent| percents.push(percent));
/// let mut store = MemoryStore::new();
/// importer.import_bytes(b"0 HEAD\n0 TRLR\n", &mut store)?;
/// drop(importer);
/// assert_eq!(percents.last(), Some(&100));
/// # Ok::<(), gdrc::GedcomError>(())
/// ```
pub struct Importer<'p> {
    config: ImportConfig,
    date_parser: Box<dyn DateParser + 'p>,
    progress: Option<Box<dyn ProgressSink + 'p>>,
}

impl fmt::Debug for Importer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Importer")
            .field("config", &self.config)
            .field("progress", &self.progress.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for Importer<'_> {
    fn default() -> Self {
        Importer {
            config: ImportConfig::default(),
            date_parser: Box::new(BasicDateParser),
            progress: None,
        }
    }
}

impl<'p> Importer<'p> {
    /// An importer with the default configuration and date parser.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the configuration.
    #[must_use]
    pub fn with_config(mut self, config: ImportConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the date parser.
    #[must_use]
    pub fn with_date_parser(mut self, parser: impl DateParser + 'p) -> Self {
        self.date_parser = Box::new(parser);
        self
    }

    /// Report progress to `sink`.
    #[must_use]
    pub fn with_progress(mut self, sink: impl ProgressSink + 'p) -> Self {
        self.progress = Some(Box::new(sink));
        self
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    /// Import the file at `path`.
    ///
    /// # Errors
    ///
    /// [`GedcomError::IoError`](crate::GedcomError::IoError) if the file cannot
    /// be read, otherwise as [`import_bytes`](Self::import_bytes).
    pub fn import_path(&mut self, path: impl AsRef<Path>, store: &mut dyn Storage) -> Result<ImportSummary> {
        let path = path.as_ref();
        info!(path = %path.display(), "importing file");
        let file = File::open(path)?;
        self.import_reader(file, store)
    }

    /// Import everything `reader` yields.
    ///
    /// # Errors
    ///
    /// [`GedcomError::IoError`](crate::GedcomError::IoError) on a read failure,
    /// otherwise as [`import_bytes`](Self::import_bytes).
    pub fn import_reader<R: Read>(&mut self, mut reader: R, store: &mut dyn Storage) -> Result<ImportSummary> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        self.import_bytes(&data, store)
    }

    /// Import a complete file held in memory.
    ///
    /// # Errors
    ///
    /// - [`GedcomError::BadHeader`](crate::GedcomError::BadHeader) if the
    ///   file does not start with `0 HEAD`; nothing is written.
    /// - [`GedcomError::TruncatedFile`](crate::GedcomError::TruncatedFile) if
    ///   input ends before `0 TRLR`.
    /// - In strict mode, the first recoverable problem.
    /// - Any storage error.
    ///
    /// After an error raised during the parse, the transaction has been
    /// rolled back.
    pub fn import_bytes(&mut self, data: &[u8], store: &mut dyn Storage) -> Result<ImportSummary> {
        let started = Instant::now();
        let source = normalize_source(data);
        let prescan = Prescan::scan(&source.bytes)?;

        let encoding = self
            .config
            .encoding
            .or(source.detected)
            .or_else(|| prescan.declared_encoding())
            .unwrap_or_default();
        let broken_conc = self.config.broken_conc_for(prescan.producer.as_deref());
        info!(
            %encoding,
            broken_conc,
            records = prescan.record_count,
            lines = prescan.line_count,
            "prescan complete"
        );

        let reader = LineReader::new(&source.bytes)
            .with_encoding(encoding)
            .with_broken_conc(broken_conc)
            .with_recovery_mode(self.config.recovery_mode);

        let mut txn = store.transaction_begin("GEDCOM import")?;
        let parsed = GedcomParser::new(
            reader,
            &prescan,
            &self.config,
            &mut *store,
            &mut txn,
            self.date_parser.as_ref(),
        )
        .with_progress(
            self.progress
                .as_deref_mut()
                .map(|sink| sink as &mut dyn ProgressSink),
        )
        .run();

        let outcome = match parsed {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(error = %err, "import failed, rolling back");
                if let Err(rollback) = store.transaction_rollback(txn) {
                    warn!(error = %rollback, "rollback failed");
                }
                return Err(err);
            },
        };
        store.transaction_commit(txn)?;

        let summary = ImportSummary {
            counts: outcome.counts,
            suppressed: outcome.issues.suppressed,
            issues: outcome.issues.issues,
            header: outcome.header,
            submitter: outcome.submitter,
            encoding: outcome.encoding,
            broken_conc,
            lines: prescan.line_count,
        };
        info!(
            elapsed_ms = started.elapsed().as_millis(),
            warnings = summary.warnings(),
            "import complete: {summary}"
        );
        Ok(summary)
    }
}

/// Import the file at `path` with the default settings.
///
/// # Errors
///
/// As [`Importer::import_path`].
pub fn import_file(path: impl AsRef<Path>, store: &mut dyn Storage) -> Result<ImportSummary> {
    Importer::new().import_path(path, store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GedcomError;
    use crate::storage::MemoryStore;

    #[test]
    fn test_summary_display() {
        let data = b"0 HEAD\n0 @I1@ INDI\n1 _ODD x\n0 TRLR\n";
        let mut store = MemoryStore::new();
        let summary = Importer::new().import_bytes(data, &mut store).unwrap();
        assert_eq!(summary.to_string(), "1 records skipped/warned, 0 fatal");
        assert_eq!(summary.issues_of(IssueKind::UnrecognizedTag).count(), 1);
    }

    #[test]
    fn test_bad_header_writes_nothing() {
        let mut store = MemoryStore::new();
        let err = Importer::new()
            .import_bytes(b"0 @I1@ INDI\n0 TRLR\n", &mut store)
            .unwrap_err();
        assert!(matches!(err, GedcomError::BadHeader(_)));
        assert_eq!(store.total(), 0);
    }

    #[test]
    fn test_encoding_precedence() {
        let data = b"0 HEAD\n1 CHAR ANSEL\n0 TRLR\n";
        let mut store = MemoryStore::new();
        let summary = Importer::new().import_bytes(data, &mut store).unwrap();
        assert_eq!(summary.encoding, GedcomEncoding::Ansel);

        let mut forced = Importer::new().with_config(ImportConfig::new().with_encoding(GedcomEncoding::Utf8));
        let summary = forced.import_bytes(data, &mut store).unwrap();
        assert_eq!(summary.encoding, GedcomEncoding::Utf8);

        let summary = Importer::new().import_bytes(b"0 HEAD\n0 TRLR\n", &mut store).unwrap();
        assert_eq!(summary.encoding, GedcomEncoding::default());
    }

    #[test]
    fn test_producer_enables_broken_conc() {
        let data = b"0 HEAD\n1 SOUR FTW\n0 TRLR\n";
        let mut store = MemoryStore::new();
        let summary = Importer::new().import_bytes(data, &mut store).unwrap();
        assert!(summary.broken_conc);
        assert_eq!(summary.header.producer, "FTW");
    }
}
