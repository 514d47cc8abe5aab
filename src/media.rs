//! Multimedia objects and references to them.

use crate::handle::Handle;
use crate::source::SourceRef;
use serde::{Deserialize, Serialize};

/// A multimedia object (`OBJE` record or inline link).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaObject {
    /// Storage handle
    pub handle: Handle,
    /// Human-readable id (`O0001`)
    pub gramps_id: String,
    /// Import provenance key
    pub origin: Option<String>,
    /// File path or URL (FILE)
    pub path: String,
    /// MIME type, derived from `FORM`
    pub mime: String,
    /// Description (TITL)
    pub description: String,
    /// Supporting citations
    pub citations: Vec<SourceRef>,
    /// Attached notes
    pub notes: Vec<Handle>,
}

impl MediaObject {
    /// Create an empty media object.
    #[must_use]
    pub fn new(handle: Handle, gramps_id: impl Into<String>) -> Self {
        MediaObject {
            handle,
            gramps_id: gramps_id.into(),
            origin: None,
            path: String::new(),
            mime: String::new(),
            description: String::new(),
            citations: Vec::new(),
            notes: Vec::new(),
        }
    }
}

/// Reference from any entity to a media object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    /// The referenced media object
    pub media: Handle,
}

/// Guess a MIME type from a `FORM` value or, failing that, the file extension.
#[must_use]
pub fn mime_for(form: &str, path: &str) -> String {
    let key = if form.trim().is_empty() {
        path.rsplit_once('.').map_or("", |(_, ext)| ext)
    } else {
        form.trim()
    };
    let mime = match key.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "pdf" => "application/pdf",
        "wav" => "audio/wav",
        "mp3" => "audio/mpeg",
        "avi" => "video/x-msvideo",
        "mpg" | "mpeg" => "video/mpeg",
        "txt" => "text/plain",
        "htm" | "html" => "text/html",
        "" => "unknown",
        other if other.contains('/') => return other.to_string(),
        _ => "unknown",
    };
    mime.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_from_form() {
        assert_eq!(mime_for("JPEG", "x"), "image/jpeg");
        assert_eq!(mime_for("image/webp", ""), "image/webp");
    }

    #[test]
    fn test_mime_from_extension() {
        assert_eq!(mime_for("", "scans/letter.PDF"), "application/pdf");
        assert_eq!(mime_for("", "noext"), "unknown");
    }
}
