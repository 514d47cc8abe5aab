//! Property-based tests for continuation folding and subtree skipping

mod common;

use common::{gedcom, import_str, person};
use gdrc::{Gender, IssueKind, LineReader, Tag};
use proptest::prelude::*;

fn segment() -> impl Strategy<Value = String> {
    "[A-Za-z0-9,.;]{1,12}"
}

/// A NOTE whose value is split over CONT and CONC lines.
fn split_note(paragraphs: &[Vec<String>]) -> String {
    let mut data = String::new();
    for (p, pieces) in paragraphs.iter().enumerate() {
        for (i, piece) in pieces.iter().enumerate() {
            let line = match (p, i) {
                (0, 0) => format!("1 NOTE {piece}\n"),
                (_, 0) => format!("2 CONT {piece}\n"),
                _ => format!("2 CONC {piece}\n"),
            };
            data.push_str(&line);
        }
    }
    data.push_str("1 SEX M\n");
    data
}

proptest! {
    #[test]
    fn prop_folding_reconstructs_value(
        paragraphs in prop::collection::vec(prop::collection::vec(segment(), 1..5), 1..5)
    ) {
        let data = split_note(&paragraphs);
        let mut reader = LineReader::new(data.as_bytes());
        let note = reader.next_line().unwrap().unwrap();
        let expected: Vec<String> = paragraphs.iter().map(|pieces| pieces.concat()).collect();
        prop_assert_eq!(note.value, expected.join("\n"));

        let sibling = reader.next_line().unwrap().unwrap();
        prop_assert_eq!(sibling.tag, Tag::Sex);
        prop_assert!(reader.next_line().unwrap().is_none());
        prop_assert!(reader.take_issues().issues.is_empty());
    }

    #[test]
    fn prop_broken_conc_joins_with_space(pieces in prop::collection::vec(segment(), 1..6)) {
        let data = split_note(&[pieces.clone()]);
        let mut reader = LineReader::new(data.as_bytes()).with_broken_conc(true);
        let note = reader.next_line().unwrap().unwrap();
        prop_assert_eq!(note.value, pieces.join(" "));
    }

    #[test]
    fn prop_unknown_subtree_skipped_whole(depth in 1usize..8, width in 1usize..4) {
        let mut body = String::from("0 @I1@ INDI\n1 NAME Jane /Doe/\n1 _UNKNOWN x\n");
        for level in 2..=depth + 1 {
            for _ in 0..width {
                body.push_str(&format!("{level} _NESTED y\n"));
            }
        }
        body.push_str("1 SEX F\n");

        let (summary, store) = import_str(&gedcom(&body));
        prop_assert_eq!(summary.issues_of(IssueKind::UnrecognizedTag).count(), 1);
        prop_assert_eq!(person(&store, "I0001").gender, Gender::Female);
    }
}
