//! Tool adapters: one thin wrapper per external extraction utility.
//!
//! Every adapter builds an explicit argument vector (no shell, no quoting),
//! runs the program through a [`ToolRunner`], and hands back a
//! [`ToolInvocationResult`]. A non-zero exit status is returned as data; the
//! dispatcher and the validator decide what it means.
//!
//! | Adapter         | Command line                                   |
//! |-----------------|------------------------------------------------|
//! | `pdftotext`     | `pdftotext IN OUT [-f N -l N]`                 |
//! | `djvutxt`       | `djvutxt IN OUT [--page=SPEC]`                 |
//! | `epubtxt`       | `unzip -c IN` (stdout written to OUT)          |
//! | `catdoc`        | `catdoc IN` (stdout written to OUT)            |
//! | `textutil`      | `textutil -convert txt IN -output OUT`         |
//! | `ebook-convert` | `ebook-convert IN OUT`                         |

use crate::error::Doc2TxtError;
use crate::pages::PagePlan;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

/// The external utilities the dispatcher knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tool {
    Pdftotext,
    Djvutxt,
    Epubtxt,
    Catdoc,
    Textutil,
    EbookConvert,
}

impl Tool {
    /// The executable that must be resolvable for this adapter.
    pub fn program(self) -> &'static str {
        match self {
            Tool::Pdftotext => "pdftotext",
            Tool::Djvutxt => "djvutxt",
            Tool::Epubtxt => "unzip",
            Tool::Catdoc => "catdoc",
            Tool::Textutil => "textutil",
            Tool::EbookConvert => "ebook-convert",
        }
    }

    /// The name users select the adapter by.
    pub fn name(self) -> &'static str {
        match self {
            Tool::Pdftotext => "pdftotext",
            Tool::Djvutxt => "djvutxt",
            Tool::Epubtxt => "epubtxt",
            Tool::Catdoc => "catdoc",
            Tool::Textutil => "textutil",
            Tool::EbookConvert => "ebook-convert",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Normalised outcome of one external process run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocationResult {
    /// Program followed by its arguments, as passed to the OS.
    pub args: Vec<String>,
    /// Raw standard output; written verbatim by stdout-based adapters.
    pub stdout: Vec<u8>,
    pub stderr: String,
    /// `None` when the process was terminated by a signal.
    pub status: Option<i32>,
}

impl ToolInvocationResult {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// A synthetic successful result, used when the dispatcher assembled the
    /// output itself (paged extraction). `args` is empty since no single
    /// command produced the file; each page's command line is kept on its
    /// [`PageResult`](crate::output::PageResult).
    pub fn assembled() -> Self {
        Self {
            args: Vec::new(),
            stdout: Vec::new(),
            stderr: String::new(),
            status: Some(0),
        }
    }
}

impl fmt::Display for ToolInvocationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "stdout={}, stderr={}, returncode={:?}, args={:?}",
            String::from_utf8_lossy(&self.stdout).trim(),
            self.stderr.trim(),
            self.status,
            self.args
        )
    }
}

/// Seam between the dispatcher and the operating system.
///
/// [`SystemRunner`] is the production implementation; tests substitute a
/// fake that records invocations and writes canned output files.
pub trait ToolRunner: Send + Sync {
    /// Whether `program` can be resolved to an executable.
    fn is_available(&self, program: &str) -> bool;

    /// Run `program` with `args`, blocking until it exits.
    ///
    /// Returns `Err` only when the process could not be started at all.
    fn run(&self, program: &str, args: &[OsString]) -> io::Result<ToolInvocationResult>;
}

/// Runs tools as real child processes, resolved on `PATH` (or a custom search path).
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    search_path: Option<OsString>,
}

impl SystemRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve programs in `paths` (a `PATH`-style list) instead of `$PATH`.
    pub fn with_search_path(paths: impl Into<OsString>) -> Self {
        Self {
            search_path: Some(paths.into()),
        }
    }

    fn resolve(&self, program: &str) -> Option<PathBuf> {
        match &self.search_path {
            None => which::which(program).ok(),
            Some(paths) => {
                let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
                which::which_in(program, Some(paths), cwd).ok()
            }
        }
    }
}

impl ToolRunner for SystemRunner {
    fn is_available(&self, program: &str) -> bool {
        self.resolve(program).is_some()
    }

    fn run(&self, program: &str, args: &[OsString]) -> io::Result<ToolInvocationResult> {
        let executable = self.resolve(program).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("{program}: command not found"))
        })?;

        let output = Command::new(&executable)
            .args(args)
            .stdin(Stdio::null())
            .output()?;

        Ok(ToolInvocationResult {
            args: render_args(program, args),
            stdout: output.stdout,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            status: output.status.code(),
        })
    }
}

/// `program arg1 arg2 …` as lossy strings, for logs and results.
pub fn render_args(program: &str, args: &[OsString]) -> Vec<String> {
    std::iter::once(program.to_string())
        .chain(args.iter().map(|a| a.to_string_lossy().into_owned()))
        .collect()
}

// ── Adapters ─────────────────────────────────────────────────────────────

/// Extract text with poppler's `pdftotext`, optionally limited to one page.
pub fn pdftotext(
    runner: &dyn ToolRunner,
    input: &Path,
    output: &Path,
    page: Option<u32>,
) -> Result<ToolInvocationResult, Doc2TxtError> {
    invoke(runner, Tool::Pdftotext, &pdftotext_args(input, output, page))
}

/// Extract the hidden text layer of a DjVu file with `djvutxt`.
pub fn djvutxt(
    runner: &dyn ToolRunner,
    input: &Path,
    output: &Path,
    pages: Option<&PagePlan>,
) -> Result<ToolInvocationResult, Doc2TxtError> {
    invoke(runner, Tool::Djvutxt, &djvutxt_args(input, output, pages))
}

/// Dump every member of the EPUB archive with `unzip -c`.
///
/// The listing (markup included) is accepted as-is; it is only written to
/// `output` when unzip reported nothing on stderr.
pub fn epubtxt(
    runner: &dyn ToolRunner,
    input: &Path,
    output: &Path,
) -> Result<ToolInvocationResult, Doc2TxtError> {
    let args = vec![OsString::from("-c"), input.as_os_str().to_owned()];
    let result = invoke(runner, Tool::Epubtxt, &args)?;
    if result.stderr.is_empty() {
        write_stdout(&result, output)?;
    }
    Ok(result)
}

/// Convert a legacy Word document with `catdoc`, which prints to stdout.
pub fn catdoc(
    runner: &dyn ToolRunner,
    input: &Path,
    output: &Path,
) -> Result<ToolInvocationResult, Doc2TxtError> {
    let args = vec![input.as_os_str().to_owned()];
    let result = invoke(runner, Tool::Catdoc, &args)?;
    if result.success() {
        write_stdout(&result, output)?;
    }
    Ok(result)
}

/// macOS equivalent for catdoc.
pub fn textutil(
    runner: &dyn ToolRunner,
    input: &Path,
    output: &Path,
) -> Result<ToolInvocationResult, Doc2TxtError> {
    let args = vec![
        OsString::from("-convert"),
        OsString::from("txt"),
        input.as_os_str().to_owned(),
        OsString::from("-output"),
        output.as_os_str().to_owned(),
    ];
    invoke(runner, Tool::Textutil, &args)
}

/// Calibre's general-purpose converter, used whenever no specialised adapter applies.
pub fn ebook_convert(
    runner: &dyn ToolRunner,
    input: &Path,
    output: &Path,
) -> Result<ToolInvocationResult, Doc2TxtError> {
    let args = vec![input.as_os_str().to_owned(), output.as_os_str().to_owned()];
    invoke(runner, Tool::EbookConvert, &args)
}

fn pdftotext_args(input: &Path, output: &Path, page: Option<u32>) -> Vec<OsString> {
    let mut args = vec![input.as_os_str().to_owned(), output.as_os_str().to_owned()];
    if let Some(page) = page {
        let page = page.to_string();
        args.extend([
            OsString::from("-f"),
            OsString::from(&page),
            OsString::from("-l"),
            OsString::from(&page),
        ]);
    }
    args
}

fn djvutxt_args(input: &Path, output: &Path, pages: Option<&PagePlan>) -> Vec<OsString> {
    let mut args = vec![input.as_os_str().to_owned(), output.as_os_str().to_owned()];
    if let Some(plan) = pages {
        args.push(OsString::from(format!("--page={}", plan.spec())));
    }
    args
}

fn invoke(
    runner: &dyn ToolRunner,
    tool: Tool,
    args: &[OsString],
) -> Result<ToolInvocationResult, Doc2TxtError> {
    let program = tool.program();
    debug!("Running {:?}", render_args(program, args));

    let result = runner.run(program, args).map_err(|e| launch_error(program, e))?;
    debug!("Result of '{}': {}", tool, result);
    Ok(result)
}

fn launch_error(program: &str, e: io::Error) -> Doc2TxtError {
    if e.kind() == io::ErrorKind::NotFound {
        Doc2TxtError::ToolUnavailable {
            program: program.to_string(),
        }
    } else {
        Doc2TxtError::ToolSpawnFailed {
            program: program.to_string(),
            source: e,
        }
    }
}

fn write_stdout(result: &ToolInvocationResult, output: &Path) -> Result<(), Doc2TxtError> {
    std::fs::write(output, &result.stdout).map_err(|e| Doc2TxtError::OutputWriteFailed {
        path: output.to_path_buf(),
        source: e,
    })
}
