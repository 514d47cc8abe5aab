//! Mapping file-local xrefs to stable handles and ids.
//!
//! Each entity created by an import carries an origin key that identifies
//! where it came from (`{origin}@I1@` for records, derived keys for events,
//! notes and synthetic sources or places). Resolution of a key goes:
//!
//! 1. a key already resolved in this run returns the same handle;
//! 2. an object in storage with the same origin key is reused, so importing
//!    the same file again updates records in place;
//! 3. otherwise a new handle is minted, and the human-readable id derived from
//!    the xref (`I1` → `I0001`) is used unless storage or this run already has
//!    it, in which case a fresh id is taken from storage.

use crate::handle::{Handle, ObjectKind};
use crate::object::GenealogyObject;
use crate::storage::Storage;
use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;
use tracing::debug;

lazy_static! {
    static ref NUMBERED_XREF: Regex = Regex::new(r"^[A-Za-z]*(\d+)$").unwrap();
}

/// The outcome of resolving one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Storage handle
    pub handle: Handle,
    /// Human-readable id
    pub gramps_id: String,
    /// Origin key recorded on the entity
    pub origin: String,
    /// Whether storage already held an object with this origin
    pub existed: bool,
}

#[derive(Debug, Clone)]
struct Entry {
    resolution: Resolution,
    xref: Option<String>,
}

/// Maps xrefs and derived keys to handles for one import run.
#[derive(Debug, Default)]
pub struct IdMapper {
    namespace: String,
    entries: IndexMap<(ObjectKind, String), Entry>,
    claimed: HashSet<(ObjectKind, String)>,
    defined: HashSet<(ObjectKind, String)>,
}

impl IdMapper {
    /// Create a mapper whose origin keys start with `namespace`.
    #[must_use]
    pub fn new(namespace: impl Into<String>) -> Self {
        IdMapper {
            namespace: namespace.into(),
            ..IdMapper::default()
        }
    }

    /// Origin key for a record xref.
    #[must_use]
    pub fn origin_for(&self, xref: &str) -> String {
        format!("{}@{}@", self.namespace, xref)
    }

    /// Origin key for a derived entity (an event, an inline note, ...).
    #[must_use]
    pub fn derived_origin(&self, key: &str) -> String {
        format!("{}{}", self.namespace, key)
    }

    /// Human-readable id suggested by an xref: numbered xrefs are
    /// re-prefixed and zero padded (`P12` → `I0012` for people), anything
    /// else is kept as written.
    #[must_use]
    pub fn format_id(kind: ObjectKind, xref: &str) -> String {
        match NUMBERED_XREF
            .captures(xref)
            .and_then(|caps| caps[1].parse::<u64>().ok())
        {
            Some(number) => format!("{}{:04}", kind.id_prefix(), number),
            None => xref.to_string(),
        }
    }

    /// Resolve a record xref. Idempotent within a run.
    pub fn resolve(&mut self, kind: ObjectKind, xref: &str, store: &mut dyn Storage) -> Resolution {
        let origin = self.origin_for(xref);
        let preferred = Self::format_id(kind, xref);
        self.resolve_origin(kind, origin, Some(preferred), Some(xref), store)
    }

    /// Resolve a derived key (no xref). The id is always taken from storage
    /// unless an object with this origin already exists.
    pub fn resolve_derived(
        &mut self,
        kind: ObjectKind,
        key: &str,
        store: &mut dyn Storage,
    ) -> Resolution {
        let origin = self.derived_origin(key);
        self.resolve_origin(kind, origin, None, None, store)
    }

    fn resolve_origin(
        &mut self,
        kind: ObjectKind,
        origin: String,
        preferred_id: Option<String>,
        xref: Option<&str>,
        store: &mut dyn Storage,
    ) -> Resolution {
        let key = (kind, origin.clone());
        if let Some(entry) = self.entries.get(&key) {
            return entry.resolution.clone();
        }

        let resolution = match store.find_by_origin(kind, &origin) {
            Some(existing) => Resolution {
                handle: existing.handle().clone(),
                gramps_id: existing.gramps_id().to_string(),
                origin,
                existed: true,
            },
            None => {
                let gramps_id = match preferred_id {
                    Some(id) if !store.has_id(kind, &id) && !self.claimed.contains(&(kind, id.clone())) => id,
                    Some(id) => {
                        let fresh = self.mint_id(kind, store);
                        debug!(%kind, wanted = %id, assigned = %fresh, "id collision, minted new id");
                        fresh
                    },
                    None => self.mint_id(kind, store),
                };
                Resolution {
                    handle: store.create_id(),
                    gramps_id,
                    origin,
                    existed: false,
                }
            },
        };

        self.claimed.insert((kind, resolution.gramps_id.clone()));
        self.entries.insert(
            key,
            Entry {
                resolution: resolution.clone(),
                xref: xref.map(str::to_string),
            },
        );
        resolution
    }

    fn mint_id(&self, kind: ObjectKind, store: &mut dyn Storage) -> String {
        loop {
            let id = store.find_next_id(kind);
            if !self.claimed.contains(&(kind, id.clone())) {
                return id;
            }
        }
    }

    /// The resolution of an xref, if it has been resolved.
    #[must_use]
    pub fn lookup(&self, kind: ObjectKind, xref: &str) -> Option<&Resolution> {
        self.entries
            .get(&(kind, self.origin_for(xref)))
            .map(|entry| &entry.resolution)
    }

    /// Record that the defining record of an xref has been parsed.
    pub fn mark_defined(&mut self, kind: ObjectKind, xref: &str) {
        self.defined.insert((kind, xref.to_string()));
    }

    /// Whether the defining record of an xref has been parsed.
    #[must_use]
    pub fn is_defined(&self, kind: ObjectKind, xref: &str) -> bool {
        self.defined.contains(&(kind, xref.to_string()))
    }

    /// Xrefs that were referenced but whose record never appeared, in order
    /// of first reference.
    #[must_use]
    pub fn dangling(&self) -> Vec<(ObjectKind, String, Resolution)> {
        self.entries
            .iter()
            .filter_map(|((kind, _), entry)| {
                let xref = entry.xref.as_ref()?;
                if self.defined.contains(&(*kind, xref.clone())) {
                    None
                } else {
                    Some((*kind, xref.clone(), entry.resolution.clone()))
                }
            })
            .collect()
    }

    /// Number of keys resolved in this run.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been resolved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
