//! Pipeline stages for document-to-text conversion.
//!
//! Each submodule implements exactly one step. The dispatcher in
//! [`crate::convert`] strings them together; none of them knows about the
//! others' internals.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ tools ──▶ validate
//! (classify) (external program) (alphanumeric check, cleanup)
//! ```
//!
//! 1. [`input`]    — check the path exists and classify it by extension
//! 2. [`tools`]    — one adapter per external utility, all behind the
//!    [`tools::ToolRunner`] seam so tests can substitute fakes
//! 3. [`validate`] — decide whether the tool really produced text, and own
//!    the lifetime of the output file

pub mod input;
pub mod tools;
pub mod validate;
