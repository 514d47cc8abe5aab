//! Common test helpers and utilities shared across test suite.

use gdrc::{
    GedcomError, ImportConfig, ImportSummary, Importer, MemoryStore, Note, Object, ObjectKind,
    Person,
};
use std::sync::Once;

static INIT: Once = Once::new();

/// Route library logs to the test output. `RUST_LOG=gdrc=debug` shows commits.
pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Import `data` into `store` with the default configuration.
#[allow(dead_code)]
pub fn import_into(store: &mut MemoryStore, data: &str) -> Result<ImportSummary, GedcomError> {
    init_tracing();
    Importer::new().import_bytes(data.as_bytes(), store)
}

/// Import `data` into a fresh store, expecting success.
pub fn import_str(data: &str) -> (ImportSummary, MemoryStore) {
    import_with(data, ImportConfig::default())
}

/// Import `data` into a fresh store with `config`, expecting success.
#[allow(dead_code)]
pub fn import_with(data: &str, config: ImportConfig) -> (ImportSummary, MemoryStore) {
    init_tracing();
    let mut store = MemoryStore::new();
    let summary = Importer::new()
        .with_config(config)
        .import_bytes(data.as_bytes(), &mut store)
        .expect("import failed");
    (summary, store)
}

/// Wrap record lines in a header and trailer.
pub fn gedcom(body: &str) -> String {
    format!("0 HEAD\n1 CHAR UTF-8\n{body}0 TRLR\n")
}

/// The person with the given id (`I0001`).
pub fn person<'s>(store: &'s MemoryStore, gramps_id: &str) -> &'s Person {
    store
        .by_gramps_id(ObjectKind::Person, gramps_id)
        .and_then(Object::as_person)
        .unwrap_or_else(|| panic!("no person {gramps_id}"))
}

/// Every note, in commit order.
#[allow(dead_code)]
pub fn notes(store: &MemoryStore) -> Vec<&Note> {
    store
        .iter_kind(ObjectKind::Note)
        .filter_map(|object| match object {
            Object::Note(note) => Some(note),
            _ => None,
        })
        .collect()
}
