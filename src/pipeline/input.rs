//! Input resolution: validate the user-supplied path and classify its media type.
//!
//! ## Why extension-based classification?
//!
//! Every branch the dispatcher takes is keyed on the declared media type, and
//! the external tools are the only components that ever look inside a
//! document. Guessing from the file name keeps classification a pure function
//! of the path: cheap, deterministic, and identical on every call.

use crate::error::Doc2TxtError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const PDF_MIME_TYPE: &str = "application/pdf";
pub const DJVU_MIME_TYPE: &str = "image/vnd.djvu";
pub const EPUB_MIME_TYPE: &str = "application/epub+zip";
pub const LEGACY_WORD_MIME_TYPE: &str = "application/msword";
pub const PLAIN_TEXT_MIME_TYPE: &str = "text/plain";

/// Coarse format classification that drives tool selection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "mime", rename_all = "kebab-case")]
pub enum MediaType {
    Pdf,
    Djvu,
    Epub,
    LegacyWord,
    PlainText,
    /// Any `image/*` type other than DjVu.
    Image(String),
    /// A recognised type without a specialised adapter.
    Other(String),
    /// No type could be inferred from the file name.
    Unknown,
}

impl MediaType {
    /// Map a MIME type string onto a classification.
    pub fn from_mime(mime: &str) -> Self {
        let mime = mime.trim().to_ascii_lowercase();
        if mime.starts_with(DJVU_MIME_TYPE) {
            MediaType::Djvu
        } else if mime.starts_with(EPUB_MIME_TYPE) {
            MediaType::Epub
        } else if mime == LEGACY_WORD_MIME_TYPE {
            MediaType::LegacyWord
        } else if mime == PDF_MIME_TYPE {
            MediaType::Pdf
        } else if mime == PLAIN_TEXT_MIME_TYPE {
            MediaType::PlainText
        } else if mime.starts_with("image/") {
            MediaType::Image(mime)
        } else {
            MediaType::Other(mime)
        }
    }

    /// The MIME type this classification stands for, if any.
    pub fn mime(&self) -> Option<&str> {
        match self {
            MediaType::Pdf => Some(PDF_MIME_TYPE),
            MediaType::Djvu => Some(DJVU_MIME_TYPE),
            MediaType::Epub => Some(EPUB_MIME_TYPE),
            MediaType::LegacyWord => Some(LEGACY_WORD_MIME_TYPE),
            MediaType::PlainText => Some(PLAIN_TEXT_MIME_TYPE),
            MediaType::Image(m) | MediaType::Other(m) => Some(m),
            MediaType::Unknown => None,
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime().unwrap_or("unknown"))
    }
}

/// Classify a path by its extension. Never touches the file system.
pub fn classify(path: &Path) -> MediaType {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    // mime_guess tables have shipped without DjVu before; pin it here.
    if matches!(ext.as_deref(), Some("djvu") | Some("djv")) {
        return MediaType::Djvu;
    }

    match mime_guess::from_path(path).first_raw() {
        Some(mime) => MediaType::from_mime(mime),
        None => MediaType::Unknown,
    }
}

/// A validated input file together with its classification.
#[derive(Debug, Clone)]
pub struct ResolvedInput {
    pub path: PathBuf,
    pub media_type: MediaType,
}

/// Check the input exists and classify it.
pub fn resolve_input(path: &Path) -> Result<ResolvedInput, Doc2TxtError> {
    if !path.is_file() {
        return Err(Doc2TxtError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let media_type = classify(path);
    debug!("mime type: {} ({})", media_type, path.display());

    Ok(ResolvedInput {
        path: path.to_path_buf(),
        media_type,
    })
}
