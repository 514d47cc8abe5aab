//! Error types for GEDCOM import operations.
//!
//! This module provides the [`GedcomError`] type for all fatal import failures
//! and the [`Result`] convenience type. Recoverable problems never surface as
//! errors; they are collected as [`ImportIssue`](crate::recovery::ImportIssue)s.

use thiserror::Error;

/// Error type for all GEDCOM library operations.
///
/// Only conditions that stop an import are represented here. When an import
/// returns one of these, the storage transaction has already been rolled back.
#[derive(Error, Debug)]
pub enum GedcomError {
    /// The first line of the file is not `0 HEAD`.
    #[error("Bad header: {0}")]
    BadHeader(String),

    /// End of input reached while a structure (or the file itself) was still open.
    #[error("Truncated file: {0}")]
    TruncatedFile(String),

    /// A line whose level or tag could not be parsed (fatal only in strict mode).
    #[error("Malformed line {line}: {message}")]
    MalformedLine {
        /// Physical line number (1-based)
        line: usize,
        /// Description of the problem
        message: String,
    },

    /// A tag not understood in its context (fatal only in strict mode).
    #[error("Unrecognized tag '{tag}' at line {line}")]
    UnrecognizedTag {
        /// Physical line number (1-based)
        line: usize,
        /// The raw tag text
        tag: String,
    },

    /// Error related to character encoding conversion.
    #[error("Encoding error: {0}")]
    EncodingError(String),

    /// Error reported by the storage collaborator.
    #[error("Storage error: {0}")]
    Storage(String),

    /// A transaction is already open against the store.
    #[error("Another import transaction is already in progress")]
    TransactionInProgress,

    /// IO error from the underlying source.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Convenience type alias for [`std::result::Result`] with [`GedcomError`].
pub type Result<T> = std::result::Result<T, GedcomError>;

/// Failure reported by a [`DateParser`](crate::date::DateParser).
///
/// Never fatal: the owning event keeps the original text without a
/// structured value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot parse date '{text}': {reason}")]
pub struct DateError {
    /// The text that was offered to the parser
    pub text: String,
    /// What was wrong with it
    pub reason: String,
}

impl DateError {
    /// Create a date error.
    #[must_use]
    pub fn new(text: impl Into<String>, reason: impl Into<String>) -> Self {
        DateError {
            text: text.into(),
            reason: reason.into(),
        }
    }
}
