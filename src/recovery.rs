//! Recovery strategies for malformed and unrecognized GEDCOM input.
//!
//! An import never stops because of a single bad line. Instead, each problem is
//! recorded as an [`ImportIssue`] in a [`RecoveryContext`] and surfaced once in
//! the final summary. The [`RecoveryMode`] decides whether problems are
//! recorded, silently dropped, or promoted to fatal errors.

use crate::error::{GedcomError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// Strategy for handling malformed or unrecognized input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RecoveryMode {
    /// Strict mode: every recoverable problem aborts the import
    Strict,
    /// Lenient mode: skip the offending subtree and record a warning (default)
    #[default]
    Lenient,
    /// Permissive mode: skip the offending subtree without recording anything
    Permissive,
}

/// Category of a recoverable problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssueKind {
    /// Level or tag could not be parsed; the line was dropped
    MalformedLine,
    /// Tag not understood in its context; its subtree was skipped
    UnrecognizedTag,
    /// Date text could not be parsed; the text was kept without a structured value
    DateError,
    /// A value was present but unusable (bad pointer, bad confidence, ...)
    InvalidValue,
    /// An xref was referenced but its record never appeared
    MissingRecord,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedLine => write!(f, "malformed line"),
            Self::UnrecognizedTag => write!(f, "unrecognized tag"),
            Self::DateError => write!(f, "date error"),
            Self::InvalidValue => write!(f, "invalid value"),
            Self::MissingRecord => write!(f, "missing record"),
        }
    }
}

/// A single recoverable problem found during import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportIssue {
    /// Problem category
    pub kind: IssueKind,
    /// Physical line number (1-based), 0 when not tied to a line
    pub line: usize,
    /// Human-readable description
    pub message: String,
}

impl fmt::Display for ImportIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line == 0 {
            write!(f, "{}: {}", self.kind, self.message)
        } else {
            write!(f, "line {}: {}: {}", self.line, self.kind, self.message)
        }
    }
}

/// Recovery context accumulating problems for one import run.
#[derive(Debug, Default)]
pub struct RecoveryContext {
    /// Current recovery mode
    pub mode: RecoveryMode,
    /// Recorded problems, in the order found
    pub issues: Vec<ImportIssue>,
    /// Number of problems dropped without a record (permissive mode)
    pub suppressed: usize,
}

impl RecoveryContext {
    /// Create a new recovery context with the given mode
    #[must_use]
    pub fn new(mode: RecoveryMode) -> Self {
        RecoveryContext {
            mode,
            issues: Vec::new(),
            suppressed: 0,
        }
    }

    /// Whether any problem was recorded or suppressed.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.issues.is_empty() || self.suppressed > 0
    }

    /// Number of recorded issues of one kind.
    #[must_use]
    pub fn count(&self, kind: IssueKind) -> usize {
        self.issues.iter().filter(|i| i.kind == kind).count()
    }

    /// Record a problem according to the recovery mode.
    ///
    /// # Errors
    ///
    /// Returns the matching [`GedcomError`] in strict mode; otherwise records
    /// (or drops) the problem and returns `Ok(None)`.
    pub fn recover<T>(
        &mut self,
        kind: IssueKind,
        line: usize,
        message: impl Into<String>,
    ) -> Result<Option<T>> {
        let message = message.into();
        match self.mode {
            RecoveryMode::Strict => Err(Self::as_error(kind, line, message)),
            RecoveryMode::Lenient => {
                warn!(line, %kind, "{message}");
                self.issues.push(ImportIssue {
                    kind,
                    line,
                    message,
                });
                Ok(None)
            },
            RecoveryMode::Permissive => {
                debug!(line, %kind, "{message}");
                self.suppressed += 1;
                Ok(None)
            },
        }
    }

    /// Record a problem that never aborts the run, whatever the mode.
    ///
    /// Used for field-level failures such as unparsable dates, where the
    /// owning value is kept in degraded form.
    pub fn note(&mut self, kind: IssueKind, line: usize, message: impl Into<String>) {
        let message = message.into();
        if self.mode == RecoveryMode::Permissive {
            self.suppressed += 1;
            return;
        }
        warn!(line, %kind, "{message}");
        self.issues.push(ImportIssue {
            kind,
            line,
            message,
        });
    }

    /// Move another context's findings into this one.
    pub fn absorb(&mut self, other: RecoveryContext) {
        self.issues.extend(other.issues);
        self.suppressed += other.suppressed;
    }

    fn as_error(kind: IssueKind, line: usize, message: String) -> GedcomError {
        match kind {
            IssueKind::UnrecognizedTag => GedcomError::UnrecognizedTag { line, tag: message },
            _ => GedcomError::MalformedLine { line, message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recovery_context_default() {
        let ctx = RecoveryContext::default();
        assert_eq!(ctx.mode, RecoveryMode::Lenient);
        assert!(!ctx.has_errors());
        assert!(ctx.issues.is_empty());
    }

    #[test]
    fn test_recovery_mode_lenient() {
        let mut ctx = RecoveryContext::new(RecoveryMode::Lenient);
        let result: Result<Option<()>> = ctx.recover(IssueKind::MalformedLine, 3, "bad level");
        assert!(result.is_ok());
        assert!(ctx.has_errors());
        assert_eq!(ctx.count(IssueKind::MalformedLine), 1);
        assert_eq!(ctx.issues[0].to_string(), "line 3: malformed line: bad level");
    }

    #[test]
    fn test_recovery_mode_strict() {
        let mut ctx = RecoveryContext::new(RecoveryMode::Strict);
        let result: Result<Option<()>> = ctx.recover(IssueKind::UnrecognizedTag, 7, "_FOO");
        match result {
            Err(GedcomError::UnrecognizedTag { line, tag }) => {
                assert_eq!(line, 7);
                assert_eq!(tag, "_FOO");
            },
            other => panic!("expected unrecognized tag error, got {other:?}"),
        }
    }

    #[test]
    fn test_recovery_mode_permissive_counts_but_does_not_record() {
        let mut ctx = RecoveryContext::new(RecoveryMode::Permissive);
        let _: Option<()> = ctx.recover(IssueKind::UnrecognizedTag, 1, "_X").unwrap();
        assert!(ctx.issues.is_empty());
        assert_eq!(ctx.suppressed, 1);
        assert!(ctx.has_errors());
    }

    #[test]
    fn test_note_never_fails_in_strict_mode() {
        let mut ctx = RecoveryContext::new(RecoveryMode::Strict);
        ctx.note(IssueKind::DateError, 4, "unparsable date 'sometime'");
        assert_eq!(ctx.count(IssueKind::DateError), 1);
    }
}
