//! Reading logical GEDCOM lines from a byte buffer.
//!
//! GEDCOM is line oriented: `<level> [@xref@] <tag> [value]`. This module
//! provides [`LineReader`], which turns raw bytes into [`Line`]s, folding
//! `CONT`/`CONC` continuations into the value of the line they extend and
//! transcoding each value from the file's character encoding.
//!
//! # Examples
//!
//! ```
//! use gdrc::LineReader;
//!
//! let data = b"0 HEAD\n1 NOTE a\n2 CONT b\n2 CONC ,c\n0 TRLR\n";
//! let mut reader = LineReader::new(data);
//!
//! let head = reader.next_line()?.unwrap();
//! assert_eq!(head.raw_tag, "HEAD");
//! let note = reader.next_line()?.unwrap();
//! assert_eq!(note.value, "a\nb,c");
//! # Ok::<(), gdrc::GedcomError>(())
//! ```

use crate::encoding::{decode_bytes, GedcomEncoding};
use crate::error::Result;
use crate::recovery::{IssueKind, RecoveryContext, RecoveryMode};
use crate::tags::Tag;
use std::borrow::Cow;

const MAX_LEVEL_DIGITS: usize = 2;

/// One logical line: a physical line plus any continuations folded into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// Nesting level
    pub level: usize,
    /// Cross-reference id declared on the line (without the `@`s)
    pub xref: Option<String>,
    /// Classified tag
    pub tag: Tag,
    /// Tag text as written
    pub raw_tag: String,
    /// Decoded value with continuations folded in
    pub value: String,
    /// Physical line number (1-based) where the line starts
    pub line_no: usize,
}

impl Line {
    /// The inner token if the value is a pointer (`@X@`).
    #[must_use]
    pub fn pointer(&self) -> Option<&str> {
        pointer_token(&self.value)
    }

    /// The value with surrounding whitespace removed.
    #[must_use]
    pub fn text(&self) -> &str {
        self.value.trim()
    }
}

/// The inner token of a `@X@` pointer value.
///
/// `@#D...@` calendar escapes are not pointers.
pub(crate) fn pointer_token(value: &str) -> Option<&str> {
    let value = value.trim();
    let inner = value.strip_prefix('@')?.strip_suffix('@')?;
    if inner.is_empty() || inner.starts_with('#') || inner.contains('@') {
        return None;
    }
    Some(inner)
}

/// A physical line split into its fields, still as raw bytes.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RawLine<'a> {
    pub level: usize,
    pub xref: Option<&'a [u8]>,
    pub tag: &'a [u8],
    pub value: &'a [u8],
    pub line_no: usize,
}

impl RawLine<'_> {
    pub fn tag_is(&self, name: &str) -> bool {
        self.tag.eq_ignore_ascii_case(name.as_bytes())
    }

    fn is_continuation(&self) -> bool {
        self.tag_is("CONT") || self.tag_is("CONC")
    }
}

/// A physical line as seen by the scanner.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Physical<'a> {
    Line(RawLine<'a>),
    Malformed { line_no: usize, reason: &'static str },
}

/// Iterator over the non-blank physical lines of a buffer.
///
/// Accepts `\n`, `\r\n` and bare `\r` terminators.
#[derive(Debug, Clone)]
pub(crate) struct PhysicalLines<'a> {
    data: &'a [u8],
    pos: usize,
    line_no: usize,
}

impl<'a> PhysicalLines<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        PhysicalLines {
            data,
            pos: 0,
            line_no: 0,
        }
    }

    /// Physical lines consumed so far, blank lines included.
    pub fn line_no(&self) -> usize {
        self.line_no
    }

    fn next_raw(&mut self) -> Option<&'a [u8]> {
        if self.pos >= self.data.len() {
            return None;
        }
        let rest = &self.data[self.pos..];
        self.line_no += 1;
        match memchr::memchr2(b'\n', b'\r', rest) {
            Some(end) => {
                let mut advance = end + 1;
                if rest[end] == b'\r' && rest.get(end + 1) == Some(&b'\n') {
                    advance += 1;
                }
                self.pos += advance;
                Some(&rest[..end])
            },
            None => {
                self.pos = self.data.len();
                Some(rest)
            },
        }
    }
}

impl<'a> Iterator for PhysicalLines<'a> {
    type Item = Physical<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let text = self.next_raw()?;
            if text.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            return Some(split_line(text, self.line_no));
        }
    }
}

fn skip_blanks(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| *b != b' ' && *b != b'\t')
        .unwrap_or(bytes.len());
    &bytes[start..]
}

/// Split one physical line into level, xref, tag and value.
fn split_line(text: &[u8], line_no: usize) -> Physical<'_> {
    let malformed = |reason| Physical::Malformed { line_no, reason };

    let text = skip_blanks(text);
    let digits = text.iter().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 {
        return malformed("missing level number");
    }
    if digits > MAX_LEVEL_DIGITS {
        return malformed("level number out of range");
    }
    let level = text[..digits]
        .iter()
        .fold(0usize, |acc, d| acc * 10 + usize::from(d - b'0'));

    let after_level = &text[digits..];
    if !after_level.first().is_some_and(|b| *b == b' ' || *b == b'\t') {
        return malformed("missing delimiter after level");
    }
    let mut rest = skip_blanks(after_level);

    let mut xref = None;
    if rest.first() == Some(&b'@') {
        match memchr::memchr(b'@', &rest[1..]) {
            Some(close) if close > 0 => {
                xref = Some(&rest[1..=close]);
                rest = skip_blanks(&rest[close + 2..]);
            },
            _ => return malformed("unterminated cross-reference"),
        }
    }

    let tag_end = rest
        .iter()
        .position(|b| *b == b' ' || *b == b'\t')
        .unwrap_or(rest.len());
    if tag_end == 0 {
        return malformed("missing tag");
    }
    let tag = &rest[..tag_end];
    let value = if tag_end < rest.len() {
        &rest[tag_end + 1..]
    } else {
        &[][..]
    };

    Physical::Line(RawLine {
        level,
        xref,
        tag,
        value,
        line_no,
    })
}

/// Reader producing logical GEDCOM lines.
///
/// `LineReader` owns a single line of push-back: a parser that reads a line
/// belonging to an enclosing structure hands it back with
/// [`push_back`](Self::push_back), and the next call to
/// [`next_line`](Self::next_line) returns it again.
///
/// Malformed physical lines and orphaned continuations are reported through
/// the reader's own [`RecoveryContext`] and dropped; in strict mode they are
/// returned as errors.
#[derive(Debug)]
pub struct LineReader<'a> {
    lines: PhysicalLines<'a>,
    lookahead: Option<Physical<'a>>,
    pushed_back: Option<Line>,
    encoding: GedcomEncoding,
    broken_conc: bool,
    recovery: RecoveryContext,
    lines_returned: usize,
}

impl<'a> LineReader<'a> {
    /// Create a reader over ASCII-compatible bytes.
    ///
    /// UTF-16 input must go through
    /// [`normalize_source`](crate::encoding::normalize_source) first.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        LineReader {
            lines: PhysicalLines::new(data),
            lookahead: None,
            pushed_back: None,
            encoding: GedcomEncoding::Utf8,
            broken_conc: false,
            recovery: RecoveryContext::default(),
            lines_returned: 0,
        }
    }

    /// Set the encoding used to decode values.
    #[must_use]
    pub fn with_encoding(mut self, encoding: GedcomEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Join `CONC` segments with a space, for producers that strip the
    /// trailing space of the segment before a split.
    #[must_use]
    pub fn with_broken_conc(mut self, broken_conc: bool) -> Self {
        self.broken_conc = broken_conc;
        self
    }

    /// Set the recovery mode for malformed lines.
    #[must_use]
    pub fn with_recovery_mode(mut self, mode: RecoveryMode) -> Self {
        self.recovery.mode = mode;
        self
    }

    /// Encoding used to decode values.
    #[must_use]
    pub fn encoding(&self) -> GedcomEncoding {
        self.encoding
    }

    /// Physical lines consumed so far.
    #[must_use]
    pub fn physical_lines_read(&self) -> usize {
        self.lines.line_no()
    }

    /// Logical lines returned so far (a pushed-back line counts once).
    #[must_use]
    pub fn lines_returned(&self) -> usize {
        self.lines_returned
    }

    /// Hand a line back; the next [`next_line`](Self::next_line) returns it.
    ///
    /// Only one line can be pushed back at a time. A second push-back replaces
    /// the first, which would lose a line, so callers never do that.
    pub fn push_back(&mut self, line: Line) {
        debug_assert!(self.pushed_back.is_none(), "push-back slot already in use");
        self.pushed_back = Some(line);
    }

    /// Problems recorded by the reader so far, leaving an empty context with
    /// the same mode behind.
    pub fn take_issues(&mut self) -> RecoveryContext {
        let mode = self.recovery.mode;
        std::mem::replace(&mut self.recovery, RecoveryContext::new(mode))
    }

    fn next_physical(&mut self) -> Option<Physical<'a>> {
        self.lookahead.take().or_else(|| self.lines.next())
    }

    /// Read the next logical line.
    ///
    /// Returns `Ok(None)` at end of input.
    ///
    /// # Errors
    ///
    /// In strict mode, returns [`GedcomError::MalformedLine`](crate::GedcomError::MalformedLine)
    /// for an unparsable line or an orphaned continuation.
    pub fn next_line(&mut self) -> Result<Option<Line>> {
        if let Some(line) = self.pushed_back.take() {
            return Ok(Some(line));
        }

        let raw = loop {
            match self.next_physical() {
                None => return Ok(None),
                Some(Physical::Malformed { line_no, reason }) => {
                    self.recovery
                        .recover::<()>(IssueKind::MalformedLine, line_no, reason)?;
                },
                Some(Physical::Line(raw)) if raw.is_continuation() => {
                    self.recovery.recover::<()>(
                        IssueKind::MalformedLine,
                        raw.line_no,
                        "continuation line without a line to continue",
                    )?;
                },
                Some(Physical::Line(raw)) => break raw,
            }
        };

        let mut value: Cow<'a, [u8]> = Cow::Borrowed(raw.value);
        loop {
            match self.next_physical() {
                Some(Physical::Line(next)) if next.is_continuation() => {
                    if next.level <= raw.level {
                        self.recovery.recover::<()>(
                            IssueKind::MalformedLine,
                            next.line_no,
                            "continuation line is not nested under the line it continues",
                        )?;
                        continue;
                    }
                    let folded = value.to_mut();
                    if next.tag_is("CONT") {
                        folded.push(b'\n');
                    } else if self.broken_conc {
                        folded.push(b' ');
                    }
                    folded.extend_from_slice(next.value);
                },
                other => {
                    self.lookahead = other;
                    break;
                },
            }
        }

        let raw_tag = String::from_utf8_lossy(raw.tag).into_owned();
        let line = Line {
            level: raw.level,
            xref: raw
                .xref
                .map(|x| String::from_utf8_lossy(x).into_owned()),
            tag: Tag::from_text(&raw_tag),
            raw_tag,
            value: decode_bytes(&value, self.encoding),
            line_no: raw.line_no,
        };
        self.lines_returned += 1;
        Ok(Some(line))
    }

    /// Skip every line nested deeper than `level`, pushing back the first line
    /// at or above it. Returns the number of lines skipped.
    ///
    /// # Errors
    ///
    /// Propagates strict-mode errors from [`next_line`](Self::next_line).
    pub fn skip_subordinates(&mut self, level: usize) -> Result<usize> {
        let mut skipped = 0;
        while let Some(line) = self.next_line()? {
            if line.level <= level {
                self.push_back(line);
                break;
            }
            skipped += 1;
        }
        Ok(skipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GedcomError;

    fn read_all(data: &[u8]) -> Vec<Line> {
        let mut reader = LineReader::new(data);
        let mut lines = Vec::new();
        while let Some(line) = reader.next_line().unwrap() {
            lines.push(line);
        }
        lines
    }

    #[test]
    fn test_split_fields() {
        let lines = read_all(b"0 @I1@ INDI\n1 NAME John /Smith/\n1 FAMS @F1@\n");
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].level, 0);
        assert_eq!(lines[0].xref.as_deref(), Some("I1"));
        assert_eq!(lines[0].tag, Tag::Indi);
        assert_eq!(lines[1].value, "John /Smith/");
        assert_eq!(lines[2].pointer(), Some("F1"));
        assert_eq!(lines[2].line_no, 3);
    }

    #[test]
    fn test_cont_conc_folding() {
        let lines = read_all(b"1 NOTE a\n2 CONT b\n2 CONC ,c\n1 SEX F\n");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].value, "a\nb,c");
        assert_eq!(lines[1].tag, Tag::Sex);
    }

    #[test]
    fn test_broken_conc_inserts_space() {
        let mut reader = LineReader::new(b"1 NOTE a\n2 CONT b\n2 CONC ,c\n").with_broken_conc(true);
        assert_eq!(reader.next_line().unwrap().unwrap().value, "a\nb ,c");
    }

    #[test]
    fn test_line_terminators() {
        let lines = read_all(b"0 HEAD\r\n1 CHAR UTF-8\r0 TRLR");
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1].value, "UTF-8");
        assert_eq!(lines[2].tag, Tag::Trlr);
    }

    #[test]
    fn test_blank_lines_and_leading_whitespace() {
        let lines = read_all(b"0 HEAD\n\n   \n  1 CHAR ANSEL\n");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].level, 1);
    }

    #[test]
    fn test_push_back_returns_same_line() {
        let mut reader = LineReader::new(b"0 HEAD\n0 TRLR\n");
        let head = reader.next_line().unwrap().unwrap();
        reader.push_back(head.clone());
        assert_eq!(reader.next_line().unwrap().unwrap(), head);
        assert_eq!(reader.next_line().unwrap().unwrap().tag, Tag::Trlr);
        assert!(reader.next_line().unwrap().is_none());
    }

    #[test]
    fn test_malformed_line_dropped_and_recorded() {
        let mut reader = LineReader::new(b"0 HEAD\nnot a line\n0 TRLR\n");
        assert_eq!(reader.next_line().unwrap().unwrap().tag, Tag::Head);
        assert_eq!(reader.next_line().unwrap().unwrap().tag, Tag::Trlr);
        let issues = reader.take_issues();
        assert_eq!(issues.count(IssueKind::MalformedLine), 1);
        assert_eq!(issues.issues[0].line, 2);
    }

    #[test]
    fn test_malformed_line_strict() {
        let mut reader =
            LineReader::new(b"0 HEAD\nnot a line\n").with_recovery_mode(RecoveryMode::Strict);
        reader.next_line().unwrap();
        assert!(matches!(
            reader.next_line(),
            Err(GedcomError::MalformedLine { line: 2, .. })
        ));
    }

    #[test]
    fn test_orphan_continuation_dropped() {
        let mut reader = LineReader::new(b"1 NOTE a\n1 CONC b\n1 SEX M\n");
        assert_eq!(reader.next_line().unwrap().unwrap().value, "a");
        assert_eq!(reader.next_line().unwrap().unwrap().tag, Tag::Sex);
        assert_eq!(reader.take_issues().count(IssueKind::MalformedLine), 1);
    }

    #[test]
    fn test_conc_split_inside_ansel_sequence() {
        // 0xE2 (acute) precedes its base letter in ANSEL; the split falls between them
        let mut reader =
            LineReader::new(b"1 NOTE Jos\xE2\n2 CONC e\n").with_encoding(GedcomEncoding::Ansel);
        assert_eq!(reader.next_line().unwrap().unwrap().value, "Jos\u{e9}");
    }

    #[test]
    fn test_skip_subordinates() {
        let mut reader = LineReader::new(b"1 _X a\n2 B b\n3 C c\n1 SEX F\n");
        let unknown = reader.next_line().unwrap().unwrap();
        assert_eq!(reader.skip_subordinates(unknown.level).unwrap(), 2);
        assert_eq!(reader.next_line().unwrap().unwrap().tag, Tag::Sex);
    }

    #[test]
    fn test_pointer_token() {
        assert_eq!(pointer_token(" @I12@ "), Some("I12"));
        assert_eq!(pointer_token("@#DJULIAN@"), None);
        assert_eq!(pointer_token("@@"), None);
        assert_eq!(pointer_token("plain"), None);
    }
}
