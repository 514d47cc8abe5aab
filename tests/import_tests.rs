//! End-to-end import tests

mod common;

use common::{gedcom, import_into, import_str, import_with, notes, person};
use gdrc::{
    ChildRelation, EventType, FamilyRelType, GedcomError, Gender, GenealogyObject, ImportConfig,
    Importer, IssueKind, MemoryStore, NameType, ObjectKind, Person, RecoveryMode, Storage,
};

const SCENARIO: &str = "0 HEAD
1 CHAR UTF-8
0 @I1@ INDI
1 NAME John /Smith/
1 FAMS @F1@
0 @F1@ FAM
1 HUSB @I1@
0 TRLR
";

#[test]
fn test_person_and_family_cross_resolve() {
    let (summary, store) = import_str(SCENARIO);
    assert_eq!(summary.count(ObjectKind::Person), 1);
    assert_eq!(summary.count(ObjectKind::Family), 1);
    assert!(summary.issues.is_empty());

    let john = store.people().next().unwrap();
    assert_eq!(john.primary_name.first_name, "John");
    assert_eq!(john.primary_name.surname, "Smith");

    let family = store.families().next().unwrap();
    assert_eq!(john.family_list, vec![family.handle.clone()]);
    assert_eq!(family.father.as_ref(), Some(&john.handle));
    assert_eq!(family.mother, None);
}

#[test]
fn test_one_sided_links_are_made_reciprocal() {
    // The family never names its members; only the people do
    let data = gedcom(
        "0 @I1@ INDI\n1 SEX F\n1 FAMS @F1@\n\
         0 @I2@ INDI\n1 FAMC @F1@\n\
         0 @F1@ FAM\n",
    );
    let (_, store) = import_str(&data);
    let mother = person(&store, "I0001");
    let child = person(&store, "I0002");
    let family = store.families().next().unwrap();

    assert_eq!(family.mother.as_ref(), Some(&mother.handle));
    assert_eq!(family.father, None);
    assert!(family.has_child(&child.handle));
    assert_eq!(child.main_parent_family(), Some(&family.handle));
}

#[test]
fn test_spouse_without_free_slot_left_out_of_both_sides() {
    let data = gedcom(
        "0 @I1@ INDI\n1 SEX M\n1 FAMS @F1@\n\
         0 @I3@ INDI\n1 SEX M\n1 FAMS @F1@\n\
         0 @F1@ FAM\n1 HUSB @I1@\n",
    );
    let (summary, store) = import_str(&data);
    let husband = person(&store, "I0001");
    let claimant = person(&store, "I0003");
    let family = store.families().next().unwrap();

    assert_eq!(family.father.as_ref(), Some(&husband.handle));
    assert_eq!(family.mother, None);
    assert_eq!(husband.family_list, vec![family.handle.clone()]);
    assert!(claimant.family_list.is_empty());
    assert_eq!(summary.issues_of(IssueKind::InvalidValue).count(), 1);

    // Every family a person lists names that person as a spouse
    for someone in store.people() {
        for handle in &someone.family_list {
            let family = store.family(handle).unwrap();
            assert!(
                family.father.as_ref() == Some(&someone.handle)
                    || family.mother.as_ref() == Some(&someone.handle)
            );
        }
    }
}

#[test]
fn test_first_birth_and_death_are_canonical() {
    let data = gedcom(
        "0 @I1@ INDI\n1 NAME Ada /Byron/\n\
         1 BIRT\n2 DATE 10 DEC 1815\n\
         1 BIRT\n2 DATE 1816\n\
         1 DEAT\n2 DATE 27 NOV 1852\n\
         1 DEAT\n2 DATE 1853\n",
    );
    let (_, store) = import_str(&data);
    let ada = person(&store, "I0001");
    assert_eq!(ada.event_refs.len(), 4);

    let birth = ada.birth_ref().unwrap();
    assert_eq!(birth.event, ada.event_refs[0].event);
    let alternate_birth = &ada.event_refs[1];
    assert_ne!(alternate_birth.event, birth.event);
    assert_eq!(store.event(&alternate_birth.event).unwrap().event_type, EventType::Birth);

    let death = ada.death_ref().unwrap();
    assert_eq!(death.event, ada.event_refs[2].event);
    let alternate_death = &ada.event_refs[3];
    assert_ne!(alternate_death.event, death.event);
    assert_eq!(store.event(&alternate_death.event).unwrap().event_type, EventType::Death);
}

#[test]
fn test_reimport_creates_no_duplicates() {
    let mut store = MemoryStore::new();
    let data = std::fs::read_to_string("tests/data/sample.ged").unwrap();
    import_into(&mut store, &data).unwrap();
    let first: Vec<usize> = ObjectKind::ALL.iter().map(|kind| store.count(*kind)).collect();
    let john = person(&store, "I0001").clone();

    import_into(&mut store, &data).unwrap();
    let second: Vec<usize> = ObjectKind::ALL.iter().map(|kind| store.count(*kind)).collect();
    assert_eq!(first, second);
    // Updated in place: same handle, no list entries doubled
    assert_eq!(person(&store, "I0001"), &john);
}

#[test]
fn test_reimport_updates_stored_record() {
    let mut store = MemoryStore::new();
    let mut txn = store.transaction_begin("seed").unwrap();
    let mut seeded = Person::new(store.create_id(), "I0001");
    seeded.origin = Some("@I1@".to_string());
    seeded.gender = Gender::Male;
    seeded.urls.push("https://example.org/john".to_string());
    store.commit(seeded.clone().into(), &mut txn).unwrap();
    store.transaction_commit(txn).unwrap();

    let summary = import_into(&mut store, &gedcom("0 @I1@ INDI\n1 NAME John /Smith/\n")).unwrap();
    assert_eq!(summary.count(ObjectKind::Person), 1);
    assert_eq!(store.count(ObjectKind::Person), 1);

    let john = person(&store, "I0001");
    assert_eq!(john.handle, seeded.handle);
    assert_eq!(john.primary_name.full_name(), "John Smith");
    assert_eq!(john.gender, Gender::Male);
    assert_eq!(john.urls, seeded.urls);
}

#[test]
fn test_duplicate_record_counted_once() {
    let data = gedcom("0 @I1@ INDI\n1 NAME Ann /Lee/\n0 @I1@ INDI\n1 SEX F\n");
    let (summary, store) = import_str(&data);
    assert_eq!(summary.count(ObjectKind::Person), 1);
    assert_eq!(store.count(ObjectKind::Person), 1);
    assert_eq!(summary.issues_of(IssueKind::InvalidValue).count(), 1);

    let ann = person(&store, "I0001");
    assert_eq!(ann.primary_name.surname, "Lee");
    assert_eq!(ann.gender, Gender::Female);
}

#[test]
fn test_id_collision_leaves_existing_record_alone() {
    let mut store = MemoryStore::new();
    let mut txn = store.transaction_begin("seed").unwrap();
    let mut existing = Person::new(store.create_id(), "I0001");
    existing.primary_name.first_name = "Unrelated".to_string();
    store.commit(existing.clone().into(), &mut txn).unwrap();
    store.transaction_commit(txn).unwrap();

    import_into(&mut store, SCENARIO).unwrap();

    assert_eq!(store.person(&existing.handle), Some(&existing));
    assert_eq!(store.count(ObjectKind::Person), 2);
    let john = store
        .people()
        .find(|p| p.primary_name.first_name == "John")
        .unwrap();
    assert_ne!(john.gramps_id, "I0001");
    assert_ne!(john.handle, existing.handle);
}

#[test]
fn test_cont_conc_folding_is_exact() {
    let data = gedcom("0 @I1@ INDI\n1 NOTE a\n2 CONT b\n2 CONC ,c\n");
    let (_, store) = import_str(&data);
    assert_eq!(notes(&store)[0].text, "a\nb,c");

    let (_, store) = import_with(&data, ImportConfig::new().with_broken_conc(true));
    assert_eq!(notes(&store)[0].text, "a\nb ,c");
}

#[test]
fn test_unrecognized_subtree_skipped_without_disturbing_siblings() {
    let data = gedcom("0 @I1@ INDI\n1 NAME Jane /Doe/\n1 _UNKNOWNTAG x\n2 CUSTOM y\n1 SEX F\n");
    let (summary, store) = import_str(&data);
    let jane = person(&store, "I0001");
    assert_eq!(jane.primary_name.full_name(), "Jane Doe");
    assert_eq!(jane.gender, Gender::Female);
    assert_eq!(summary.issues.len(), 1);
    assert_eq!(summary.issues[0].kind, IssueKind::UnrecognizedTag);
    assert_eq!(summary.issues[0].line, 5);
}

#[test]
fn test_level_zero_closes_malformed_record() {
    let data = gedcom("0 @I1@ INDI\n1 NAME Ann /Lee/\n1 BIRT\n2 DATE 1900\n??? broken\n");
    let (summary, store) = import_str(&data);
    let ann = person(&store, "I0001");
    assert_eq!(ann.primary_name.surname, "Lee");
    assert!(ann.birth_ref().is_some());
    assert_eq!(summary.issues_of(IssueKind::MalformedLine).count(), 1);
}

#[test]
fn test_truncation_rolls_back() {
    let mut store = MemoryStore::new();
    import_into(&mut store, SCENARIO).unwrap();
    let before = store.to_json().unwrap();

    let truncated = "0 HEAD\n0 @I2@ INDI\n1 NAME Late /Comer/\n0 @F2@ FAM\n1 HUSB @I2@\n";
    let err = import_into(&mut store, truncated).unwrap_err();
    assert!(matches!(err, GedcomError::TruncatedFile(_)));
    assert_eq!(store.to_json().unwrap(), before);

    // The store accepts a new transaction afterwards
    import_into(&mut store, SCENARIO).unwrap();
}

#[test]
fn test_strict_mode_stops_at_first_problem() {
    let data = gedcom("0 @I1@ INDI\n1 _ODD x\n");
    let mut store = MemoryStore::new();
    let err = Importer::new()
        .with_config(ImportConfig::new().with_recovery_mode(RecoveryMode::Strict))
        .import_bytes(data.as_bytes(), &mut store)
        .unwrap_err();
    assert!(matches!(err, GedcomError::UnrecognizedTag { line: 4, .. }));
    assert_eq!(store.total(), 0);
}

#[test]
fn test_permissive_mode_counts_silently() {
    let data = gedcom("0 @I1@ INDI\n1 _ODD x\n1 _ODDER y\n");
    let (summary, _) = import_with(&data, ImportConfig::new().with_recovery_mode(RecoveryMode::Permissive));
    assert!(summary.issues.is_empty());
    assert_eq!(summary.suppressed, 2);
    assert_eq!(summary.to_string(), "2 records skipped/warned, 0 fatal");
}

#[test]
fn test_sample_file() {
    let mut store = MemoryStore::new();
    let summary = gdrc::import_file("tests/data/sample.ged", &mut store).unwrap();
    assert!(summary.issues.is_empty(), "{:?}", summary.issues);

    assert_eq!(summary.header.producer, "FamTree");
    assert_eq!(summary.header.producer_version, "5.2");
    assert_eq!(summary.header.gedcom_version, "5.5.1");
    assert_eq!(summary.header.date, "12 MAR 2021 10:15:00");
    let submitter = summary.submitter.as_ref().unwrap();
    assert_eq!(submitter.name, "Ada Archivist");

    assert_eq!(summary.count(ObjectKind::Person), 3);
    assert_eq!(summary.count(ObjectKind::Family), 1);
    assert_eq!(summary.count(ObjectKind::Place), 1);
    assert_eq!(summary.count(ObjectKind::Source), 1);
    assert_eq!(summary.count(ObjectKind::Repository), 1);

    let john = person(&store, "I0001");
    assert_eq!(john.gender, Gender::Male);
    assert_eq!(john.primary_name.citations[0].page, "p. 12");
    let birth = store.event(&john.birth_ref().unwrap().event).unwrap();
    assert_eq!(birth.event_type, EventType::Birth);
    assert!(!birth.date.as_ref().unwrap().is_text_only());
    let death = store.event(&john.death_ref().unwrap().event).unwrap();
    assert_eq!(death.cause, "Pneumonia");
    assert_eq!(death.place, birth.place);
    let event_types: Vec<_> = john
        .event_refs
        .iter()
        .map(|r| store.event(&r.event).unwrap().event_type.clone())
        .collect();
    assert!(event_types.contains(&EventType::Custom("Military Service".to_string())));
    assert!(event_types.contains(&EventType::Occupation));

    let mary = person(&store, "I0002");
    assert_eq!(mary.alternate_names[0].name_type, NameType::Married);
    assert_eq!(mary.alternate_names[0].surname, "Smith");
    assert_eq!(mary.alternate_names[0].first_name, "Mary");

    let thomas = person(&store, "I0003");
    assert_eq!(thomas.parent_family_list[0].mother_relation, ChildRelation::Adopted);
    assert_eq!(thomas.person_refs[0].relation, "Godfather");
    assert_eq!(thomas.person_refs[0].person, john.handle);

    let family = store.families().next().unwrap();
    assert_eq!(family.rel_type, FamilyRelType::Married);
    assert_eq!(family.child_ref_list[0].father_relation, ChildRelation::Adopted);
    assert_eq!(family.mother.as_ref(), Some(&mary.handle));

    let note = notes(&store)
        .into_iter()
        .find(|n| n.gramps_id == "N0001")
        .unwrap();
    assert_eq!(note.text, "Served as\ntown smith for forty years.");
    assert_eq!(john.notes, vec![note.handle.clone()]);
}

#[test]
fn test_dangling_reference_placeholder() {
    let data = gedcom("0 @F1@ FAM\n1 HUSB @I7@\n1 CHIL @I8@\n");
    let (summary, store) = import_str(&data);
    assert_eq!(summary.issues_of(IssueKind::MissingRecord).count(), 2);
    let father = person(&store, "I0007");
    let child = person(&store, "I0008");
    let family = store.families().next().unwrap();
    assert_eq!(father.family_list, vec![family.handle.clone()]);
    assert_eq!(child.main_parent_family(), Some(&family.handle));
    assert!(father.origin().is_some());
}

#[test]
fn test_inline_sources_and_places_deduplicated() {
    let data = gedcom(
        "0 @I1@ INDI\n1 BIRT\n2 PLAC Boston\n2 SOUR Town records\n\
         0 @I2@ INDI\n1 BIRT\n2 PLAC Boston\n2 SOUR Town records\n3 PAGE 4\n",
    );
    let (summary, store) = import_str(&data);
    assert_eq!(summary.count(ObjectKind::Place), 1);
    assert_eq!(summary.count(ObjectKind::Source), 1);
    let places: Vec<_> = store.events().map(|e| e.place.clone()).collect();
    assert_eq!(places[0], places[1]);
    assert!(places[0].is_some());
}

#[test]
fn test_progress_reaches_completion() {
    let mut seen = Vec::new();
    {
        let mut importer = Importer::new().with_progress(|percent: u8| seen.push(percent));
        let mut store = MemoryStore::new();
        importer.import_bytes(SCENARIO.as_bytes(), &mut store).unwrap();
    }
    assert!(seen.windows(2).all(|pair| pair[0] < pair[1]));
    assert_eq!(seen.last(), Some(&100));
}

#[test]
fn test_ansel_file() {
    let data = b"0 HEAD\n1 CHAR ANSEL\n0 @I1@ INDI\n1 NAME Ren\xE2e /M\xE8uller/\n0 TRLR\n";
    let mut store = MemoryStore::new();
    Importer::new().import_bytes(data, &mut store).unwrap();
    let name = &store.people().next().unwrap().primary_name;
    assert_eq!(name.first_name, "Ren\u{e9}");
    assert_eq!(name.surname, "M\u{fc}ller");
}

#[test]
fn test_utf16_with_bom() {
    let text = "0 HEAD\n1 CHAR UNICODE\n0 @I1@ INDI\n1 NAME Zo\u{eb} /Brun/\n0 TRLR\n";
    let mut data = vec![0xFF, 0xFE];
    for unit in text.encode_utf16() {
        data.extend_from_slice(&unit.to_le_bytes());
    }
    let mut store = MemoryStore::new();
    let summary = Importer::new().import_bytes(&data, &mut store).unwrap();
    assert_eq!(summary.encoding, gdrc::GedcomEncoding::Utf16);
    assert_eq!(store.people().next().unwrap().primary_name.first_name, "Zo\u{eb}");
}

#[test]
fn test_import_path_with_tempfile() {
    use std::io::Write;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(SCENARIO.as_bytes()).unwrap();
    let mut store = MemoryStore::new();
    let summary = Importer::new().import_path(file.path(), &mut store).unwrap();
    assert_eq!(summary.count(ObjectKind::Person), 1);

    let missing = file.path().with_extension("missing");
    assert!(matches!(
        Importer::new().import_path(missing, &mut store),
        Err(GedcomError::IoError(_))
    ));
}
