//! The storage collaborator.
//!
//! The importer talks to storage only through the [`Storage`] trait: minting
//! handles and ids, looking up existing objects, and committing objects inside
//! a [`Transaction`]. [`MemoryStore`] is an in-memory implementation with
//! undo-log transactions, used by the tests and by callers that only need
//! the imported object graph.

use crate::error::{GedcomError, Result};
use crate::event::Event;
use crate::family::Family;
use crate::handle::{Handle, ObjectKind};
use crate::object::{GenealogyObject, Object};
use crate::person::Person;
use indexmap::IndexMap;
use std::collections::HashMap;
use tracing::{debug, info};

/// Storage operations consumed by the importer.
pub trait Storage {
    /// Mint a fresh, never-used handle.
    fn create_id(&mut self) -> Handle;

    /// The next unused human-readable id for `kind` (`I0001`, `F0002`, ...).
    fn find_next_id(&mut self, kind: ObjectKind) -> String;

    /// Whether an object of `kind` already uses `gramps_id`.
    fn has_id(&self, kind: ObjectKind, gramps_id: &str) -> bool;

    /// The object of `kind` whose import provenance key is `origin`.
    fn find_by_origin(&self, kind: ObjectKind, origin: &str) -> Option<Object>;

    /// The object of `kind` stored under `handle`.
    fn find_by_handle(&self, kind: ObjectKind, handle: &Handle) -> Option<Object>;

    /// Open a transaction.
    ///
    /// # Errors
    ///
    /// Returns [`GedcomError::TransactionInProgress`] if one is already open.
    fn transaction_begin(&mut self, description: &str) -> Result<Transaction>;

    /// Insert or replace `object` as part of `txn`.
    ///
    /// # Errors
    ///
    /// Returns [`GedcomError::Storage`] if the object cannot be stored.
    fn commit(&mut self, object: Object, txn: &mut Transaction) -> Result<()>;

    /// Make every change in `txn` permanent.
    ///
    /// # Errors
    ///
    /// Returns [`GedcomError::Storage`] if `txn` is not the open transaction.
    fn transaction_commit(&mut self, txn: Transaction) -> Result<()>;

    /// Undo every change in `txn`, restoring the store to its state at
    /// [`transaction_begin`](Self::transaction_begin).
    ///
    /// # Errors
    ///
    /// Returns [`GedcomError::Storage`] if `txn` is not the open transaction.
    fn transaction_rollback(&mut self, txn: Transaction) -> Result<()>;
}

#[derive(Debug, Clone)]
enum Undo {
    Inserted(ObjectKind, Handle),
    Replaced(Box<Object>),
}

#[derive(Debug, Clone, Default)]
struct Counters {
    next_handle: u64,
    next_ids: HashMap<ObjectKind, u32>,
}

/// An open unit of work against a store.
#[derive(Debug)]
pub struct Transaction {
    serial: u64,
    description: String,
    undo: Vec<Undo>,
    counters: Counters,
}

impl Transaction {
    /// Description given at begin.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Number of commits made so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.undo.len()
    }

    /// Whether nothing has been committed yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.undo.is_empty()
    }
}

/// In-memory store.
///
/// Objects are kept per kind in insertion order, so snapshots are
/// deterministic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: IndexMap<ObjectKind, IndexMap<Handle, Object>>,
    origins: HashMap<(ObjectKind, String), Handle>,
    ids: HashMap<(ObjectKind, String), Handle>,
    counters: Counters,
    open_serial: Option<u64>,
    serials: u64,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The object of `kind` stored under `handle`, by reference.
    #[must_use]
    pub fn get(&self, kind: ObjectKind, handle: &Handle) -> Option<&Object> {
        self.objects.get(&kind).and_then(|m| m.get(handle))
    }

    /// All objects of `kind`, in insertion order.
    pub fn iter_kind(&self, kind: ObjectKind) -> impl Iterator<Item = &Object> {
        self.objects.get(&kind).into_iter().flat_map(|m| m.values())
    }

    /// Number of objects of `kind`.
    #[must_use]
    pub fn count(&self, kind: ObjectKind) -> usize {
        self.objects.get(&kind).map_or(0, IndexMap::len)
    }

    /// Number of objects of every kind.
    #[must_use]
    pub fn total(&self) -> usize {
        self.objects.values().map(IndexMap::len).sum()
    }

    /// All people.
    pub fn people(&self) -> impl Iterator<Item = &Person> {
        self.iter_kind(ObjectKind::Person).filter_map(Object::as_person)
    }

    /// All families.
    pub fn families(&self) -> impl Iterator<Item = &Family> {
        self.iter_kind(ObjectKind::Family).filter_map(Object::as_family)
    }

    /// All events.
    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.iter_kind(ObjectKind::Event).filter_map(Object::as_event)
    }

    /// The person stored under `handle`.
    #[must_use]
    pub fn person(&self, handle: &Handle) -> Option<&Person> {
        self.get(ObjectKind::Person, handle).and_then(Object::as_person)
    }

    /// The family stored under `handle`.
    #[must_use]
    pub fn family(&self, handle: &Handle) -> Option<&Family> {
        self.get(ObjectKind::Family, handle).and_then(Object::as_family)
    }

    /// The event stored under `handle`.
    #[must_use]
    pub fn event(&self, handle: &Handle) -> Option<&Event> {
        self.get(ObjectKind::Event, handle).and_then(Object::as_event)
    }

    /// The object of `kind` with human-readable id `gramps_id`.
    #[must_use]
    pub fn by_gramps_id(&self, kind: ObjectKind, gramps_id: &str) -> Option<&Object> {
        self.ids
            .get(&(kind, gramps_id.to_string()))
            .and_then(|handle| self.get(kind, handle))
    }

    /// Serialize the whole store as pretty-printed JSON, grouped by kind.
    ///
    /// # Errors
    ///
    /// Returns [`GedcomError::Storage`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        let snapshot: IndexMap<String, Vec<&Object>> = ObjectKind::ALL
            .iter()
            .map(|kind| (kind.to_string(), self.iter_kind(*kind).collect()))
            .collect();
        serde_json::to_string_pretty(&snapshot).map_err(|e| GedcomError::Storage(e.to_string()))
    }

    fn index(&mut self, object: &Object) {
        let kind = object.kind();
        let handle = object.handle().clone();
        if let Some(origin) = object.origin() {
            self.origins
                .insert((kind, origin.to_string()), handle.clone());
        }
        self.ids
            .insert((kind, object.gramps_id().to_string()), handle);
    }

    fn unindex(&mut self, object: &Object) {
        let kind = object.kind();
        if let Some(origin) = object.origin() {
            let key = (kind, origin.to_string());
            if self.origins.get(&key) == Some(object.handle()) {
                self.origins.remove(&key);
            }
        }
        let key = (kind, object.gramps_id().to_string());
        if self.ids.get(&key) == Some(object.handle()) {
            self.ids.remove(&key);
        }
    }

    fn check_open(&self, txn: &Transaction) -> Result<()> {
        if self.open_serial == Some(txn.serial) {
            Ok(())
        } else {
            Err(GedcomError::Storage(format!(
                "transaction '{}' is not open on this store",
                txn.description
            )))
        }
    }
}

impl Storage for MemoryStore {
    fn create_id(&mut self) -> Handle {
        self.counters.next_handle += 1;
        Handle::new(format!("h{:012x}", self.counters.next_handle))
    }

    fn find_next_id(&mut self, kind: ObjectKind) -> String {
        let next = self.counters.next_ids.entry(kind).or_insert(1);
        loop {
            let candidate = format!("{}{:04}", kind.id_prefix(), next);
            *next += 1;
            if !self.ids.contains_key(&(kind, candidate.clone())) {
                return candidate;
            }
        }
    }

    fn has_id(&self, kind: ObjectKind, gramps_id: &str) -> bool {
        self.ids.contains_key(&(kind, gramps_id.to_string()))
    }

    fn find_by_origin(&self, kind: ObjectKind, origin: &str) -> Option<Object> {
        self.origins
            .get(&(kind, origin.to_string()))
            .and_then(|handle| self.get(kind, handle))
            .cloned()
    }

    fn find_by_handle(&self, kind: ObjectKind, handle: &Handle) -> Option<Object> {
        self.get(kind, handle).cloned()
    }

    fn transaction_begin(&mut self, description: &str) -> Result<Transaction> {
        if self.open_serial.is_some() {
            return Err(GedcomError::TransactionInProgress);
        }
        self.serials += 1;
        self.open_serial = Some(self.serials);
        debug!(description, "transaction begin");
        Ok(Transaction {
            serial: self.serials,
            description: description.to_string(),
            undo: Vec::new(),
            counters: self.counters.clone(),
        })
    }

    fn commit(&mut self, object: Object, txn: &mut Transaction) -> Result<()> {
        self.check_open(txn)?;
        if object.handle().as_str().is_empty() {
            return Err(GedcomError::Storage(format!(
                "{} '{}' has no handle",
                object.kind(),
                object.gramps_id()
            )));
        }
        let kind = object.kind();
        let handle = object.handle().clone();
        self.index(&object);
        let previous = self.objects.entry(kind).or_default().insert(handle.clone(), object);
        match previous {
            Some(old) => {
                // The new object was indexed first; drop only stale keys.
                self.unindex_stale(&old, kind, &handle);
                txn.undo.push(Undo::Replaced(Box::new(old)));
            },
            None => txn.undo.push(Undo::Inserted(kind, handle)),
        }
        Ok(())
    }

    fn transaction_commit(&mut self, txn: Transaction) -> Result<()> {
        self.check_open(&txn)?;
        self.open_serial = None;
        info!(description = %txn.description, objects = txn.undo.len(), "transaction committed");
        Ok(())
    }

    fn transaction_rollback(&mut self, txn: Transaction) -> Result<()> {
        self.check_open(&txn)?;
        let undone = txn.undo.len();
        for step in txn.undo.into_iter().rev() {
            match step {
                Undo::Inserted(kind, handle) => {
                    let removed = self
                        .objects
                        .get_mut(&kind)
                        .and_then(|m| m.shift_remove(&handle));
                    if let Some(object) = removed {
                        self.unindex(&object);
                    }
                },
                Undo::Replaced(old) => {
                    let kind = old.kind();
                    let handle = old.handle().clone();
                    if let Some(current) = self.objects.get(&kind).and_then(|m| m.get(&handle)).cloned() {
                        self.unindex(&current);
                    }
                    self.index(&old);
                    self.objects.entry(kind).or_default().insert(handle, *old);
                },
            }
        }
        self.objects.retain(|_, m| !m.is_empty());
        self.counters = txn.counters;
        self.open_serial = None;
        info!(description = %txn.description, objects = undone, "transaction rolled back");
        Ok(())
    }
}

impl MemoryStore {
    fn unindex_stale(&mut self, old: &Object, kind: ObjectKind, handle: &Handle) {
        let current = self.get(kind, handle).cloned();
        let (cur_origin, cur_id) = match &current {
            Some(obj) => (obj.origin().map(str::to_string), obj.gramps_id().to_string()),
            None => (None, String::new()),
        };
        if let Some(origin) = old.origin() {
            if cur_origin.as_deref() != Some(origin) {
                self.origins.remove(&(kind, origin.to_string()));
            }
        }
        if old.gramps_id() != cur_id {
            let key = (kind, old.gramps_id().to_string());
            if self.ids.get(&key) == Some(handle) {
                self.ids.remove(&key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::Note;

    fn note(store: &mut MemoryStore, id: &str, origin: Option<&str>) -> Note {
        let mut note = Note::new(store.create_id(), id, "text");
        note.origin = origin.map(str::to_string);
        note
    }

    #[test]
    fn test_commit_and_find() {
        let mut store = MemoryStore::new();
        let mut txn = store.transaction_begin("test").unwrap();
        let n = note(&mut store, "N0001", Some("@N1@"));
        let handle = n.handle.clone();
        store.commit(n.into(), &mut txn).unwrap();
        store.transaction_commit(txn).unwrap();

        assert!(store.has_id(ObjectKind::Note, "N0001"));
        assert_eq!(
            store.find_by_origin(ObjectKind::Note, "@N1@").map(|o| o.handle().clone()),
            Some(handle.clone())
        );
        assert!(store.find_by_handle(ObjectKind::Note, &handle).is_some());
        assert!(store.find_by_handle(ObjectKind::Person, &handle).is_none());
    }

    #[test]
    fn test_single_open_transaction() {
        let mut store = MemoryStore::new();
        let txn = store.transaction_begin("first").unwrap();
        assert!(matches!(
            store.transaction_begin("second"),
            Err(GedcomError::TransactionInProgress)
        ));
        store.transaction_commit(txn).unwrap();
        assert!(store.transaction_begin("third").is_ok());
    }

    #[test]
    fn test_rollback_restores_previous_state() {
        let mut store = MemoryStore::new();
        let mut txn = store.transaction_begin("seed").unwrap();
        let original = note(&mut store, "N0001", Some("@N1@"));
        let handle = original.handle.clone();
        store.commit(original.clone().into(), &mut txn).unwrap();
        store.transaction_commit(txn).unwrap();

        let mut txn = store.transaction_begin("import").unwrap();
        let mut changed = original.clone();
        changed.text = "changed".to_string();
        store.commit(changed.into(), &mut txn).unwrap();
        let extra = note(&mut store, "N0002", Some("@N2@"));
        store.commit(extra.into(), &mut txn).unwrap();
        store.transaction_rollback(txn).unwrap();

        assert_eq!(store.count(ObjectKind::Note), 1);
        assert_eq!(
            store.get(ObjectKind::Note, &handle),
            Some(&Object::Note(original))
        );
        assert!(!store.has_id(ObjectKind::Note, "N0002"));
        assert!(store.find_by_origin(ObjectKind::Note, "@N2@").is_none());
    }

    #[test]
    fn test_find_next_id_skips_used() {
        let mut store = MemoryStore::new();
        let mut txn = store.transaction_begin("seed").unwrap();
        let n = note(&mut store, "N0001", None);
        store.commit(n.into(), &mut txn).unwrap();
        store.transaction_commit(txn).unwrap();
        assert_eq!(store.find_next_id(ObjectKind::Note), "N0002");
        assert_eq!(store.find_next_id(ObjectKind::Note), "N0003");
        assert_eq!(store.find_next_id(ObjectKind::Person), "I0001");
    }

    #[test]
    fn test_to_json_groups_by_kind() {
        let mut store = MemoryStore::new();
        let mut txn = store.transaction_begin("seed").unwrap();
        let n = note(&mut store, "N0001", None);
        store.commit(n.into(), &mut txn).unwrap();
        store.transaction_commit(txn).unwrap();
        let json: serde_json::Value = serde_json::from_str(&store.to_json().unwrap()).unwrap();
        assert_eq!(json["note"].as_array().map(Vec::len), Some(1));
        assert_eq!(json["person"].as_array().map(Vec::len), Some(0));
    }
}
