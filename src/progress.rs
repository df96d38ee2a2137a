//! Progress-callback trait for conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as the dispatcher picks a tool and, for paged PDF extraction,
//! works through each page.
//!
//! # Why callbacks instead of a quiet flag?
//!
//! The library never prints. Whatever the caller wants to show (a terminal
//! progress bar, a log line, nothing at all) lives behind this trait, so
//! verbosity is decided by whoever builds the [`crate::ConversionConfig`]
//! rather than by process-wide state.
//!
//! # Example
//!
//! ```rust
//! use edgequake_doc2txt::{ConversionProgressCallback, ConversionConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     failed: Arc<AtomicUsize>,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_page_error(&self, page: u32, _position: usize, _total: usize, error: &str) {
//!         self.failed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("page {page} skipped: {error}");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback {
//!     failed: Arc::new(AtomicUsize::new(0)),
//! });
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::output::ConversionStats;
use crate::pipeline::input::MediaType;
use crate::pipeline::tools::Tool;
use std::sync::Arc;

/// Called by the dispatcher as a conversion progresses.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Pages are processed strictly in plan order on the
/// calling thread; `Send + Sync` is required so a config can be moved onto a
/// worker thread.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once the input is classified and a tool is chosen.
    ///
    /// `tool` is `None` when the input is already plain text.
    fn on_conversion_start(&self, media_type: &MediaType, tool: Option<Tool>) {
        let _ = (media_type, tool);
    }

    /// Called before pdftotext runs for one page of a page plan.
    ///
    /// # Arguments
    /// * `page`     — 1-indexed page number in the document
    /// * `position` — 1-indexed position in the plan
    /// * `total`    — number of entries in the plan
    fn on_page_start(&self, page: u32, position: usize, total: usize) {
        let _ = (page, position, total);
    }

    /// Called when a page was extracted; `bytes` is the size of its text.
    fn on_page_complete(&self, page: u32, position: usize, total: usize, bytes: usize) {
        let _ = (page, position, total, bytes);
    }

    /// Called when a page failed and was skipped.
    fn on_page_error(&self, page: u32, position: usize, total: usize, error: &str) {
        let _ = (page, position, total, error);
    }

    /// Called once after the output has been validated.
    fn on_conversion_complete(&self, stats: &ConversionStats) {
        let _ = stats;
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// Equivalent to configuring no callback at all.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
