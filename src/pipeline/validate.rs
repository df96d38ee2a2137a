//! Output validation and artifact lifecycle.
//!
//! A tool that exits with status 0 has not necessarily produced text:
//! scanned PDFs yield pages of form feeds, broken archives yield nothing at
//! all. The validator accepts an output file only if it contains at least one
//! letter or digit, and reports the byte size otherwise so "empty" and
//! "garbage" outputs can be told apart.
//!
//! ## Why RAII for temporaries?
//!
//! When the caller wants the text in memory the output lives in a
//! [`tempfile::TempPath`]. Dropping it deletes the file, so every early
//! return (`?`) cleans up without an explicit removal on each path.

use crate::error::Doc2TxtError;
use crate::pipeline::tools::ToolInvocationResult;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tracing::{debug, warn};

/// Where the extracted text is written.
#[derive(Debug)]
pub enum OutputArtifact {
    /// Caller-supplied path; never removed by the library.
    Persistent(PathBuf),
    /// Process-temporary path; removed when dropped.
    Temporary(TempPath),
}

impl OutputArtifact {
    /// Validate and prepare a caller-supplied output path.
    ///
    /// The path must end in `.txt`. A missing file is created empty; an
    /// existing one is kept untouched until the conversion writes to it.
    /// Returns the artifact plus a warning if the file already existed.
    pub fn persistent(path: &Path) -> Result<(Self, Option<String>), Doc2TxtError> {
        check_txt_extension(path)?;

        let mut warning = None;
        if path.exists() {
            let msg = format!(
                "Output text file already exists: {}",
                path.file_name().unwrap_or(path.as_os_str()).to_string_lossy()
            );
            warn!("{}", msg);
            debug!("Full path of output text file: '{}'", path.display());
            warning = Some(msg);
        } else {
            debug!("Creating file: '{}'", path.display());
            touch(path)?;
        }
        Ok((OutputArtifact::Persistent(path.to_path_buf()), warning))
    }

    /// Create a fresh, uniquely named temporary `.txt` file.
    pub fn temporary() -> Result<Self, Doc2TxtError> {
        let path = new_temp_txt()?;
        debug!("Using tmp file {}", path.display());
        Ok(OutputArtifact::Temporary(path))
    }

    pub fn path(&self) -> &Path {
        match self {
            OutputArtifact::Persistent(p) => p.as_path(),
            OutputArtifact::Temporary(p) => &**p,
        }
    }

    pub fn is_temporary(&self) -> bool {
        matches!(self, OutputArtifact::Temporary(_))
    }
}

/// Reject output paths without a `.txt` extension.
pub fn check_txt_extension(path: &Path) -> Result<(), Doc2TxtError> {
    if path.extension().and_then(|e| e.to_str()) == Some("txt") {
        Ok(())
    } else {
        Err(Doc2TxtError::InvalidOutputExtension {
            path: path.to_path_buf(),
        })
    }
}

/// A new empty temporary `.txt` file, deleted when the returned path is dropped.
pub fn new_temp_txt() -> Result<TempPath, Doc2TxtError> {
    tempfile::Builder::new()
        .prefix("doc2txt-")
        .suffix(".txt")
        .tempfile()
        .map(|f| f.into_temp_path())
        .map_err(|e| Doc2TxtError::Internal(format!("tempfile: {e}")))
}

fn touch(path: &Path) -> Result<(), Doc2TxtError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map(|_| ())
        .map_err(|e| Doc2TxtError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })
}

/// Check a tool's result and the file it produced.
///
/// Returns the output size in bytes on success.
pub fn check_output(
    tool: &str,
    result: &ToolInvocationResult,
    path: &Path,
) -> Result<u64, Doc2TxtError> {
    let size = file_size(path);

    if !result.success() {
        return Err(Doc2TxtError::ToolFailed {
            tool: tool.to_string(),
            status: result.status,
            stderr: result.stderr.trim().to_string(),
            size,
        });
    }

    debug!("Checking converted text...");
    let has_text = contains_alphanumeric(path).map_err(|e| Doc2TxtError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    if has_text {
        debug!("Converted text is valid!");
        Ok(size)
    } else if size == 0 {
        Err(Doc2TxtError::EmptyOutput {
            path: path.to_path_buf(),
        })
    } else {
        Err(Doc2TxtError::NoTextFound {
            path: path.to_path_buf(),
            size,
        })
    }
}

fn file_size(path: &Path) -> u64 {
    fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

/// Whether the file holds at least one alphanumeric character.
///
/// Reads in chunks and stops at the first match. Bytes that are not valid
/// UTF-8 are skipped; a multi-byte sequence split across chunks is carried
/// over to the next read.
pub fn contains_alphanumeric(path: &Path) -> io::Result<bool> {
    let mut file = File::open(path)?;
    let mut chunk = [0u8; 8192];
    let mut pending: Vec<u8> = Vec::new();

    loop {
        let n = file.read(&mut chunk)?;
        if n == 0 {
            return Ok(false);
        }
        pending.extend_from_slice(&chunk[..n]);

        let mut found = false;
        let consumed = for_each_valid_str(&pending, |s| {
            if s.chars().any(char::is_alphanumeric) {
                found = true;
            }
            !found
        });
        if found {
            return Ok(true);
        }
        pending.drain(..consumed);
    }
}

/// Decode bytes as UTF-8, dropping anything undecodable.
pub fn decode_permissive(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    // A truncated sequence at the very end is dropped as well.
    for_each_valid_str(bytes, |s| {
        out.push_str(s);
        true
    });
    out
}

/// Feed every valid UTF-8 run of `bytes` to `f`, skipping invalid sequences.
///
/// Stops early when `f` returns false. Returns how many bytes were consumed;
/// an incomplete trailing sequence is left unconsumed.
fn for_each_valid_str(bytes: &[u8], mut f: impl FnMut(&str) -> bool) -> usize {
    let mut rest = bytes;
    let mut consumed = 0;
    loop {
        match std::str::from_utf8(rest) {
            Ok(s) => {
                f(s);
                return consumed + rest.len();
            }
            Err(e) => {
                let valid = e.valid_up_to();
                let s = std::str::from_utf8(&rest[..valid]).unwrap_or_default();
                if !f(s) {
                    return consumed + valid;
                }
                match e.error_len() {
                    Some(bad) => {
                        consumed += valid + bad;
                        rest = &rest[valid + bad..];
                    }
                    None => return consumed + valid,
                }
            }
        }
    }
}

/// Read a text file permissively.
pub fn read_text(path: &Path) -> Result<String, Doc2TxtError> {
    fs::read(path)
        .map(|bytes| decode_permissive(&bytes))
        .map_err(|e| Doc2TxtError::Io {
            path: path.to_path_buf(),
            source: e,
        })
}
