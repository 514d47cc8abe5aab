#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

//! # GDRC: GEDCOM Rust Crate
//!
//! A library for importing GEDCOM genealogical interchange files into a
//! cross-referenced record store.
//!
//! ## Quick Start
//!
//! ```
//! use gdrc::{Importer, MemoryStore};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let data = b"0 HEAD\n1 CHAR UTF-8\n\
//! 0 @I1@ INDI\n1 NAME John /Smith/\n1 FAMS @F1@\n\
//! 0 @F1@ FAM\n1 HUSB @I1@\n0 TRLR\n";
//!
//! let mut store = MemoryStore::new();
//! let summary = Importer::new().import_bytes(data, &mut store)?;
//! println!("{summary}");
//!
//! let john = store.people().next().unwrap();
//! let family = store.families().next().unwrap();
//! assert_eq!(john.primary_name.surname, "Smith");
//! assert_eq!(family.father.as_ref(), Some(&john.handle));
//! assert_eq!(john.family_list, vec![family.handle.clone()]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`importer`] - The entry point: [`Importer`] and [`ImportSummary`]
//! - [`reader`] - Line lexer with `CONT`/`CONC` folding and one-line push-back
//! - [`prescan`] - First pass: encoding, producer and linkage maps
//! - [`id_mapper`] - Xref to handle/id resolution and origin keys
//! - [`storage`] - The [`Storage`] trait and the in-memory [`MemoryStore`]
//! - [`update`] - Folding re-imported entities into stored ones
//! - [`person`], [`family`], [`event`], [`source`], [`place`], [`media`],
//!   [`note`], [`attribute`] - The entity model
//! - [`tags`] - Tag vocabulary and vendor tag translation
//! - [`date`] - Date text recognition and the [`DateParser`] collaborator
//! - [`encoding`] - Character sets (ANSEL, UTF-8, UTF-16, 8-bit)
//! - [`config`] - Import configuration
//! - [`recovery`] - Recoverable problem handling
//! - [`error`] - Error types and result type

pub mod ansel_tables;
pub mod attribute;
pub mod config;
pub mod date;
pub mod encoding;
pub mod error;
pub mod event;
pub mod family;
pub mod handle;
pub mod id_mapper;
pub mod importer;
pub mod macros;
pub mod media;
pub mod note;
pub mod object;
mod parser;
pub mod person;
pub mod place;
pub mod prescan;
pub mod reader;
pub mod recovery;
pub mod source;
pub mod storage;
pub mod tags;
pub mod update;

pub use attribute::{Attribute, AttributeType, LdsKind, LdsOrd};
pub use config::ImportConfig;
pub use date::{BasicDateParser, Calendar, Date, DateParser, StructuredDate};
pub use encoding::GedcomEncoding;
pub use error::{DateError, GedcomError, Result};
pub use event::{Event, EventRef, EventRole, EventType, Witness};
pub use family::{ChildRef, ChildRelation, Family, FamilyRelType};
pub use handle::{Handle, ObjectKind};
pub use importer::{import_file, ImportSummary, Importer, ProgressSink};
pub use media::{MediaObject, MediaRef};
pub use note::Note;
pub use object::{GenealogyObject, Object};
pub use parser::{HeaderInfo, Submitter};
pub use person::{Gender, Name, NameType, Person, PersonRef};
pub use place::{Address, Location, Place};
pub use prescan::{Prescan, SpouseSlots};
pub use reader::{Line, LineReader};
pub use recovery::{ImportIssue, IssueKind, RecoveryContext, RecoveryMode};
pub use source::{Confidence, RepoRef, Repository, Source, SourceRef};
pub use storage::{MemoryStore, Storage, Transaction};
pub use tags::{Tag, TagMeaning, TagTable};
pub use update::Update;
