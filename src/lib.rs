//! # edgequake-doc2txt
//!
//! Convert PDF, DjVu, EPUB and legacy Word documents to plain text by
//! delegating to the best extraction tool installed on the machine.
//!
//! ## Why shell out?
//!
//! Mature extractors already exist for every format: poppler's `pdftotext`,
//! DjVuLibre's `djvutxt`, `catdoc`, macOS `textutil`, and calibre's
//! `ebook-convert` as a catch-all. This crate never parses a document
//! itself. It classifies the input, picks a tool, optionally walks a page
//! plan one page at a time, and refuses any output that does not contain a
//! single letter or digit.
//!
//! ## Pipeline Overview
//!
//! ```text
//! document
//!  │
//!  ├─ 1. Classify  media type from the file extension (mime_guess)
//!  ├─ 2. Select    specialised tool if installed, else ebook-convert
//!  ├─ 3. Extract   one run, or one pdftotext run per planned page
//!  ├─ 4. Validate  at least one alphanumeric character
//!  └─ 5. Output    text in memory, or left in the requested .txt file
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_doc2txt::{convert, ConversionConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::builder().pages("1,3,10-8").build()?;
//!     let output = convert("paper.pdf", &config)?;
//!     println!("{}", output.text);
//!     eprintln!("{} pages extracted, {} failed",
//!         output.stats.extracted_pages,
//!         output.stats.failed_pages);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `doc2txt` binary (clap + anyhow + tracing-subscriber + tokio) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! edgequake-doc2txt = { version = "0.1", default-features = false }
//! ```
//!
//! ## Tools by Format
//!
//! | Format | Preferred | Fallback |
//! |--------|-----------|----------|
//! | PDF    | `pdftotext` (page plans supported) | `ebook-convert` |
//! | DjVu   | `djvutxt` (page plans supported)   | `ebook-convert` |
//! | EPUB   | `unzip -c` (raw archive listing)   | `ebook-convert` |
//! | `.doc` | `catdoc`, then `textutil`          | `ebook-convert` |
//! | other  | n/a                                | `ebook-convert` |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pages;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    ConversionConfig, ConversionConfigBuilder, DjvuMethod, EpubMethod, MswordMethod, PdfMethod,
};
pub use convert::{convert, convert_to_file, select_tool, ToolSelection};
pub use error::{Doc2TxtError, PageError};
pub use output::{ConversionOutput, ConversionStats, PageResult};
pub use pages::PagePlan;
pub use pipeline::input::{classify, MediaType};
pub use pipeline::tools::{SystemRunner, Tool, ToolInvocationResult, ToolRunner};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
