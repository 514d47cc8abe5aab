//! Date text recognition.
//!
//! GEDCOM `DATE` values wrap a plain calendar date in several layers of
//! syntax: a calendar escape (`@#DJULIAN@`), a range (`BET .. AND ..`), a span
//! (`FROM .. TO ..`), a qualifier (`ABT`, `BEF`, `AFT`, `EST`, `CAL`), an
//! interpreted date with a phrase (`INT .. (..)`), or a bare `(phrase)`.
//!
//! [`recognize`] peels those layers off and hands each remaining fragment to a
//! [`DateParser`], which owns all calendrical knowledge. [`BasicDateParser`]
//! is the parser used when the caller supplies none.

use crate::error::DateError;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Calendar a date is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Calendar {
    /// Gregorian (default)
    #[default]
    Gregorian,
    /// Julian
    Julian,
    /// Hebrew
    Hebrew,
    /// French Republican
    FrenchRepublican,
    /// Roman (declared but not interpreted)
    Roman,
    /// Declared as unknown
    Unknown,
}

impl Calendar {
    /// Interpret the name inside a `@#D...@` escape.
    #[must_use]
    pub fn from_escape(name: &str) -> Option<Self> {
        let calendar = match name.trim().to_ascii_uppercase().as_str() {
            "GREGORIAN" => Calendar::Gregorian,
            "JULIAN" => Calendar::Julian,
            "HEBREW" => Calendar::Hebrew,
            "FRENCH R" => Calendar::FrenchRepublican,
            "ROMAN" => Calendar::Roman,
            "UNKNOWN" => Calendar::Unknown,
            _ => return None,
        };
        Some(calendar)
    }
}

/// How the date relates to the actual event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DateModifier {
    /// A single date
    #[default]
    Exact,
    /// ABT
    About,
    /// BEF, or a span with only an end (`TO x`)
    Before,
    /// AFT, or a span with only a start (`FROM x`)
    After,
    /// BET x AND y
    Range,
    /// FROM x TO y
    Span,
    /// Free text with no structured value
    TextOnly,
}

/// Confidence in how the date was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DateQuality {
    /// As recorded
    #[default]
    Regular,
    /// EST
    Estimated,
    /// CAL
    Calculated,
}

/// A calendar date as returned by a [`DateParser`]. Zero day or month means
/// "not given".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct StructuredDate {
    /// Day of month, 0 if absent
    pub day: u8,
    /// Month number within the calendar, 0 if absent
    pub month: u8,
    /// Year; negative for B.C.
    pub year: i32,
    /// Whether the year was written as a dual year (`1750/51`)
    pub dual_year: bool,
}

/// A recognised date value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Date {
    /// Calendar of the date (taken from the first fragment)
    pub calendar: Calendar,
    /// Single, range, span or qualified
    pub modifier: DateModifier,
    /// Estimated / calculated
    pub quality: DateQuality,
    /// First (or only) date
    pub start: Option<StructuredDate>,
    /// Second date of a range or span
    pub stop: Option<StructuredDate>,
    /// Phrase from `INT .. (phrase)` or `(phrase)`
    pub phrase: String,
    /// Original text
    pub text: String,
}

impl Date {
    /// A date carrying only its text.
    #[must_use]
    pub fn text_only(text: impl Into<String>) -> Self {
        Date {
            modifier: DateModifier::TextOnly,
            text: text.into(),
            ..Date::default()
        }
    }

    /// Whether there is no structured value.
    #[must_use]
    pub fn is_text_only(&self) -> bool {
        self.start.is_none()
    }
}

/// Converts the text of one date fragment into a [`StructuredDate`].
pub trait DateParser {
    /// Parse `text` (qualifiers and calendar escapes already removed).
    ///
    /// # Errors
    ///
    /// Returns [`DateError`] when the text is not a date in `calendar`.
    fn parse(&self, text: &str, calendar: Calendar) -> Result<StructuredDate, DateError>;
}

impl<F> DateParser for F
where
    F: Fn(&str, Calendar) -> Result<StructuredDate, DateError>,
{
    fn parse(&self, text: &str, calendar: Calendar) -> Result<StructuredDate, DateError> {
        self(text, calendar)
    }
}

const GREGORIAN_MONTHS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

const HEBREW_MONTHS: [&str; 13] = [
    "TSH", "CSH", "KSL", "TVT", "SHV", "ADR", "ADS", "NSN", "IYR", "SVN", "TMZ", "AAV", "ELL",
];

const FRENCH_MONTHS: [&str; 13] = [
    "VEND", "BRUM", "FRIM", "NIVO", "PLUV", "VENT", "GERM", "FLOR", "PRAI", "MESS", "THER",
    "FRUC", "COMP",
];

/// `[day] [month] year[/yy] [B.C.]` with the standard month codes of each
/// calendar. Gregorian month names may also be spelled out.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicDateParser;

impl BasicDateParser {
    fn month_number(token: &str, calendar: Calendar) -> Option<u8> {
        let upper = token.trim_end_matches('.').to_ascii_uppercase();
        let table: &[&str] = match calendar {
            Calendar::Hebrew => &HEBREW_MONTHS,
            Calendar::FrenchRepublican => &FRENCH_MONTHS,
            _ => &GREGORIAN_MONTHS,
        };
        if let Some(index) = table.iter().position(|m| *m == upper) {
            return u8::try_from(index + 1).ok();
        }
        // Spelled-out Gregorian month names ("January", "Sept")
        if matches!(calendar, Calendar::Gregorian | Calendar::Julian)
            && upper.len() >= 3
            && upper.chars().all(|c| c.is_ascii_alphabetic())
        {
            let prefix = &upper[..3];
            if GREGORIAN_MONTHS.contains(&prefix) {
                return GREGORIAN_MONTHS
                    .iter()
                    .position(|m| *m == prefix)
                    .and_then(|i| u8::try_from(i + 1).ok());
            }
        }
        None
    }

    fn parse_year(token: &str) -> Option<(i32, bool)> {
        match token.split_once('/') {
            Some((year, alt)) => {
                let year = year.parse().ok()?;
                if alt.is_empty() || !alt.chars().all(|c| c.is_ascii_digit()) {
                    return None;
                }
                Some((year, true))
            },
            None => token.parse().ok().map(|year| (year, false)),
        }
    }
}

impl DateParser for BasicDateParser {
    fn parse(&self, text: &str, calendar: Calendar) -> Result<StructuredDate, DateError> {
        if matches!(calendar, Calendar::Roman | Calendar::Unknown) {
            return Err(DateError::new(text, "calendar not supported"));
        }

        let mut tokens: Vec<&str> = text.split_whitespace().collect();
        let mut bc = false;
        if let Some(last) = tokens.last() {
            let marker = last.to_ascii_uppercase();
            if matches!(marker.as_str(), "B.C." | "BC" | "BCE" | "(B.C.)") {
                bc = true;
                tokens.pop();
            }
        }

        let (year_token, rest) = tokens
            .split_last()
            .ok_or_else(|| DateError::new(text, "empty date"))?;
        let (year, dual_year) =
            Self::parse_year(year_token).ok_or_else(|| DateError::new(text, "no year"))?;

        let mut date = StructuredDate {
            day: 0,
            month: 0,
            year: if bc { -year } else { year },
            dual_year,
        };

        match rest {
            [] => {},
            [month] => {
                date.month = Self::month_number(month, calendar)
                    .ok_or_else(|| DateError::new(text, format!("unknown month '{month}'")))?;
            },
            [day, month] => {
                date.month = Self::month_number(month, calendar)
                    .ok_or_else(|| DateError::new(text, format!("unknown month '{month}'")))?;
                date.day = day
                    .parse()
                    .ok()
                    .filter(|d| (1..=31).contains(d))
                    .ok_or_else(|| DateError::new(text, format!("bad day '{day}'")))?;
            },
            _ => return Err(DateError::new(text, "too many components")),
        }
        Ok(date)
    }
}

lazy_static! {
    static ref CALENDAR_ESCAPE: Regex = Regex::new(r"^@#D([A-Za-z ]+)@\s*(.*)$").unwrap();
    static ref RANGE: Regex = Regex::new(r"(?i)^BET\.?\s+(.+?)\s+AND\s+(.+)$").unwrap();
    static ref SPAN: Regex = Regex::new(r"(?i)^FROM\s+(.+?)\s+TO\s+(.+)$").unwrap();
    static ref FROM_ONLY: Regex = Regex::new(r"(?i)^FROM\s+(.+)$").unwrap();
    static ref TO_ONLY: Regex = Regex::new(r"(?i)^TO\s+(.+)$").unwrap();
    static ref QUALIFIED: Regex =
        Regex::new(r"(?i)^(ABT|ABOUT|EST|CAL|BEF|BEFORE|AFT|AFTER)\.?\s+(.+)$").unwrap();
    static ref INTERPRETED: Regex = Regex::new(r"(?i)^INT\.?\s+(.+?)\s*\((.*)\)\s*$").unwrap();
    static ref PHRASE: Regex = Regex::new(r"^\((.*)\)$").unwrap();
}

/// Split a leading calendar escape off a fragment.
fn split_calendar(fragment: &str, default: Calendar) -> Result<(Calendar, &str), DateError> {
    match CALENDAR_ESCAPE.captures(fragment) {
        Some(caps) => {
            let name = caps.get(1).map_or("", |m| m.as_str());
            let calendar = Calendar::from_escape(name)
                .ok_or_else(|| DateError::new(fragment, format!("unknown calendar '{name}'")))?;
            let rest = caps.get(2).map_or("", |m| m.as_str());
            Ok((calendar, rest.trim()))
        },
        None => Ok((default, fragment.trim())),
    }
}

fn parse_fragment(
    fragment: &str,
    default: Calendar,
    parser: &dyn DateParser,
) -> Result<(Calendar, StructuredDate), DateError> {
    let (calendar, text) = split_calendar(fragment, default)?;
    let date = parser.parse(text, calendar)?;
    Ok((calendar, date))
}

/// Recognise the syntax of a `DATE` value and parse its fragments.
///
/// # Errors
///
/// Returns [`DateError`] when the parser rejects any fragment. Callers keep the
/// text with [`Date::text_only`] in that case.
pub fn recognize(text: &str, parser: &dyn DateParser) -> Result<Date, DateError> {
    let original = text.trim();
    let mut date = Date {
        text: original.to_string(),
        ..Date::default()
    };

    if let Some(caps) = PHRASE.captures(original) {
        date.modifier = DateModifier::TextOnly;
        date.phrase = caps[1].trim().to_string();
        return Ok(date);
    }

    // A leading escape applies to every fragment that does not carry its own.
    let (calendar, body) = split_calendar(original, Calendar::Gregorian)?;
    date.calendar = calendar;

    if let Some(caps) = RANGE.captures(body) {
        let (cal, start) = parse_fragment(&caps[1], calendar, parser)?;
        let (_, stop) = parse_fragment(&caps[2], cal, parser)?;
        date.calendar = cal;
        date.modifier = DateModifier::Range;
        date.start = Some(start);
        date.stop = Some(stop);
        return Ok(date);
    }
    if let Some(caps) = SPAN.captures(body) {
        let (cal, start) = parse_fragment(&caps[1], calendar, parser)?;
        let (_, stop) = parse_fragment(&caps[2], cal, parser)?;
        date.calendar = cal;
        date.modifier = DateModifier::Span;
        date.start = Some(start);
        date.stop = Some(stop);
        return Ok(date);
    }
    if let Some(caps) = INTERPRETED.captures(body) {
        let (cal, start) = parse_fragment(&caps[1], calendar, parser)?;
        date.calendar = cal;
        date.start = Some(start);
        date.phrase = caps[2].trim().to_string();
        return Ok(date);
    }

    let (modifier, quality, fragment) = if let Some(caps) = FROM_ONLY.captures(body) {
        (DateModifier::After, DateQuality::Regular, caps.get(1))
    } else if let Some(caps) = TO_ONLY.captures(body) {
        (DateModifier::Before, DateQuality::Regular, caps.get(1))
    } else if let Some(caps) = QUALIFIED.captures(body) {
        let (modifier, quality) = match caps[1].to_ascii_uppercase().as_str() {
            "ABT" | "ABOUT" => (DateModifier::About, DateQuality::Regular),
            "EST" => (DateModifier::Exact, DateQuality::Estimated),
            "CAL" => (DateModifier::Exact, DateQuality::Calculated),
            "BEF" | "BEFORE" => (DateModifier::Before, DateQuality::Regular),
            _ => (DateModifier::After, DateQuality::Regular),
        };
        (modifier, quality, caps.get(2))
    } else {
        (DateModifier::Exact, DateQuality::Regular, None)
    };

    let fragment = fragment.map_or(body, |m| m.as_str());
    let (cal, start) = parse_fragment(fragment, calendar, parser)?;
    date.calendar = cal;
    date.modifier = modifier;
    date.quality = quality;
    date.start = Some(start);
    Ok(date)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Date, DateError> {
        recognize(text, &BasicDateParser)
    }

    #[test]
    fn test_simple_date() {
        let date = parse("12 MAR 1845").unwrap();
        assert_eq!(date.modifier, DateModifier::Exact);
        assert_eq!(
            date.start,
            Some(StructuredDate {
                day: 12,
                month: 3,
                year: 1845,
                dual_year: false
            })
        );
        assert_eq!(date.text, "12 MAR 1845");
    }

    #[test]
    fn test_year_only_and_month_year() {
        assert_eq!(parse("1900").unwrap().start.unwrap().year, 1900);
        let date = parse("Jun 1901").unwrap();
        assert_eq!(date.start.unwrap().month, 6);
    }

    #[test]
    fn test_range_and_span() {
        let range = parse("BET 1850 AND 1860").unwrap();
        assert_eq!(range.modifier, DateModifier::Range);
        assert_eq!(range.start.unwrap().year, 1850);
        assert_eq!(range.stop.unwrap().year, 1860);

        let span = parse("FROM 1 JAN 1900 TO 31 DEC 1910").unwrap();
        assert_eq!(span.modifier, DateModifier::Span);
        assert_eq!(span.stop.unwrap().day, 31);
    }

    #[test]
    fn test_qualifiers() {
        assert_eq!(parse("ABT 1800").unwrap().modifier, DateModifier::About);
        assert_eq!(parse("BEF 1800").unwrap().modifier, DateModifier::Before);
        assert_eq!(parse("AFT 1800").unwrap().modifier, DateModifier::After);
        assert_eq!(parse("EST 1800").unwrap().quality, DateQuality::Estimated);
        assert_eq!(parse("CAL 1800").unwrap().quality, DateQuality::Calculated);
        assert_eq!(parse("TO 1800").unwrap().modifier, DateModifier::Before);
        assert_eq!(parse("FROM 1800").unwrap().modifier, DateModifier::After);
    }

    #[test]
    fn test_calendar_escapes() {
        let julian = parse("@#DJULIAN@ 11 FEB 1731/32").unwrap();
        assert_eq!(julian.calendar, Calendar::Julian);
        assert!(julian.start.unwrap().dual_year);

        let french = parse("@#DFRENCH R@ 1 VEND 12").unwrap();
        assert_eq!(french.calendar, Calendar::FrenchRepublican);
        assert_eq!(french.start.unwrap().month, 1);

        let hebrew = parse("@#DHEBREW@ 5 NSN 5600").unwrap();
        assert_eq!(hebrew.calendar, Calendar::Hebrew);
        assert_eq!(hebrew.start.unwrap().month, 8);
    }

    #[test]
    fn test_escape_inside_range() {
        let date = parse("BET @#DJULIAN@ 1700 AND 1710").unwrap();
        assert_eq!(date.calendar, Calendar::Julian);
        assert_eq!(date.modifier, DateModifier::Range);
    }

    #[test]
    fn test_interpreted_and_phrase() {
        let int = parse("INT 1850 (about the time of the flood)").unwrap();
        assert_eq!(int.start.unwrap().year, 1850);
        assert_eq!(int.phrase, "about the time of the flood");

        let phrase = parse("(stillborn)").unwrap();
        assert!(phrase.is_text_only());
        assert_eq!(phrase.phrase, "stillborn");
    }

    #[test]
    fn test_bc_year() {
        assert_eq!(parse("44 B.C.").unwrap().start.unwrap().year, -44);
    }

    #[test]
    fn test_unparsable_date_is_error() {
        let err = parse("sometime in spring").unwrap_err();
        assert_eq!(err.text, "sometime in spring");
        assert!(parse("32 JAN 1900").is_err());
        assert!(parse("@#DKLINGON@ 1900").is_err());
    }

    #[test]
    fn test_custom_parser_closure() {
        let fixed = |_: &str, _: Calendar| {
            Ok::<_, DateError>(StructuredDate {
                year: 2000,
                ..StructuredDate::default()
            })
        };
        let date = recognize("whatever", &fixed).unwrap();
        assert_eq!(date.start.unwrap().year, 2000);
    }
}
