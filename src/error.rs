//! Error types for the edgequake-doc2txt library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Doc2TxtError`] — **Fatal**: the conversion cannot produce a valid text
//!   file (bad output extension, unsupported image, tool failure, output
//!   without any text). Returned as `Err(Doc2TxtError)` from the top-level
//!   `convert*` functions.
//!
//! * [`PageError`] — **Non-fatal**: a single page of a paged PDF extraction
//!   failed but the other pages are fine. Stored inside
//!   [`crate::output::PageResult`] so callers can inspect partial success
//!   rather than losing the whole document to one bad page.
//!
//! A preferred tool that is simply not installed is neither: the dispatcher
//! falls back to `ebook-convert` and only logs the substitution.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-doc2txt library.
#[derive(Debug, Error)]
pub enum Doc2TxtError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// The input is an ordinary image; only DjVu images carry a text layer
    /// that the tools can extract.
    #[error("'{path}' looks like a normal image ({mime}); images cannot be converted to txt")]
    UnsupportedFormat { path: PathBuf, mime: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// A caller-supplied output path does not end in `.txt`.
    #[error("The output file needs to have a .txt extension: '{path}'")]
    InvalidOutputExtension { path: PathBuf },

    /// The page specification could not be parsed.
    #[error("Invalid page specification '{spec}': {reason}\nExpected e.g. 5, 1-10 or 1,3,99-4.")]
    InvalidPageSpec { spec: String, reason: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Tool errors ───────────────────────────────────────────────────────
    /// The selected program could not be found when launching it.
    #[error("'{program}' is not installed or not on PATH")]
    ToolUnavailable { program: String },

    /// The selected program exists but could not be started.
    #[error("Failed to launch '{program}': {source}")]
    ToolSpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The external tool exited with a non-zero status.
    #[error("{tool} failed with {} (output: {size} bytes): {stderr}", describe_status(*.status))]
    ToolFailed {
        tool: String,
        status: Option<i32>,
        stderr: String,
        size: u64,
    },

    /// Every page of a paged PDF extraction failed.
    #[error("All {total} requested pages failed to convert.\nFirst error: {first_error}")]
    AllPagesFailed { total: usize, first_error: String },

    // ── Validation errors ─────────────────────────────────────────────────
    /// The tool succeeded but produced a zero-byte file.
    #[error("The converted file is empty: '{path}'")]
    EmptyOutput { path: PathBuf },

    /// The tool produced bytes, but not a single letter or digit.
    #[error("The converted txt with size {size} bytes does not seem to contain text: '{path}'")]
    NoTextFound { path: PathBuf, size: u64 },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output text file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not read an input or intermediate file.
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single page.
///
/// Stored alongside [`crate::output::PageResult`] when a page fails.
/// The overall conversion continues unless ALL pages fail.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// pdftotext exited with a non-zero status for this page.
    #[error("Page {page}: {tool} failed with {}: {stderr}", describe_status(*.status))]
    ToolFailed {
        page: u32,
        tool: String,
        status: Option<i32>,
        stderr: String,
    },

    /// The tool could not be launched for this page.
    #[error("Page {page}: could not launch {tool}: {detail}")]
    LaunchFailed {
        page: u32,
        tool: String,
        detail: String,
    },

    /// The per-page temporary file could not be created or read back.
    #[error("Page {page}: temporary file error: {detail}")]
    ReadFailed { page: u32, detail: String },
}

impl PageError {
    /// The 1-indexed page this error belongs to.
    pub fn page(&self) -> u32 {
        match self {
            PageError::ToolFailed { page, .. }
            | PageError::LaunchFailed { page, .. }
            | PageError::ReadFailed { page, .. } => *page,
        }
    }
}

fn describe_status(status: Option<i32>) -> String {
    match status {
        Some(code) => format!("exit status {code}"),
        None => "no exit status (terminated by signal)".to_string(),
    }
}
