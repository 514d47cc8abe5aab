//! Notes.

use crate::handle::Handle;
use crate::source::SourceRef;
use serde::{Deserialize, Serialize};

/// A note, shared (`0 @N1@ NOTE`) or inline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// Storage handle
    pub handle: Handle,
    /// Human-readable id (`N0001`)
    pub gramps_id: String,
    /// Import provenance key
    pub origin: Option<String>,
    /// Note text, continuation lines folded
    pub text: String,
    /// Supporting citations
    pub citations: Vec<SourceRef>,
}

impl Note {
    /// Create a note.
    #[must_use]
    pub fn new(handle: Handle, gramps_id: impl Into<String>, text: impl Into<String>) -> Self {
        Note {
            handle,
            gramps_id: gramps_id.into(),
            origin: None,
            text: text.into(),
            citations: Vec::new(),
        }
    }
}
