//! Result types returned by the conversion entry points.

use crate::error::PageError;
use crate::pipeline::input::MediaType;
use crate::pipeline::tools::Tool;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Full result of a conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// Extracted text. Empty when the output was written to a persistent path.
    pub text: String,
    /// The persistent output file, if one was requested.
    pub output_path: Option<PathBuf>,
    /// Per-page outcomes for paged PDF extraction (empty otherwise).
    pub pages: Vec<PageResult>,
    /// Non-fatal conditions worth telling the user about.
    pub warnings: Vec<String>,
    pub stats: ConversionStats,
}

/// Outcome of extracting one entry of a page plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResult {
    /// 1-indexed page number in the document.
    pub page_num: u32,
    /// Bytes of text the page contributed (0 on failure).
    pub bytes: usize,
    /// The pdftotext command line run for this page; empty if it never launched.
    pub args: Vec<String>,
    pub error: Option<PageError>,
}

/// Summary statistics for one conversion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionStats {
    pub media_type: Option<MediaType>,
    /// `None` when the input was already plain text.
    pub tool: Option<Tool>,
    /// Size of the validated output file in bytes.
    pub output_bytes: u64,
    /// Entries in the page plan (0 when converting the whole document).
    pub requested_pages: usize,
    pub extracted_pages: usize,
    pub failed_pages: usize,
    pub total_duration_ms: u64,
}
