//! Conversion entry points and the tool-selection dispatcher.
//!
//! A conversion walks through the same states every time:
//!
//! ```text
//! pre-flight ─► classify ─► select tool ─► single-shot | per-page ─► validate ─► finalize
//! ```
//!
//! Pre-flight rejects a bad output extension and a missing input before any
//! tool is considered. The page plan was already parsed when the
//! [`ConversionConfig`] was built.
//!
//! ## Why fall back instead of failing?
//!
//! The specialised tools (pdftotext, djvutxt, unzip, catdoc, textutil) are
//! fast and faithful but often not installed. calibre's `ebook-convert`
//! handles nearly everything, so a missing preferred tool only changes which
//! program runs; it is logged, never reported as an error.

use crate::config::{ConversionConfig, DjvuMethod, EpubMethod, MswordMethod, PdfMethod};
use crate::error::{Doc2TxtError, PageError};
use crate::output::{ConversionOutput, ConversionStats, PageResult};
use crate::pages::PagePlan;
use crate::pipeline::input::{self, MediaType};
use crate::pipeline::tools::{self, Tool, ToolInvocationResult, ToolRunner};
use crate::pipeline::validate::{self, OutputArtifact};
use crate::progress::ConversionProgressCallback;
use std::fs;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// What the dispatcher decided to do with an input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolSelection {
    /// The input already is plain text; no tool runs.
    PlainText,
    /// An ordinary image: nothing can extract text from it.
    Unsupported { mime: String },
    /// Run this adapter.
    Run(Tool),
}

/// Pick the adapter for `media_type`.
///
/// First match wins:
/// 1. plain text bypasses every adapter
/// 2. DjVu with the djvutxt method, if `djvutxt` is installed
/// 3. EPUB with the epubtxt method, if `unzip` is installed
/// 4. legacy Word with the catdoc or textutil method: catdoc if installed,
///    else textutil if installed
/// 5. PDF with the pdftotext method, if `pdftotext` is installed
/// 6. any other image is unsupported
/// 7. everything else goes to `ebook-convert`
pub fn select_tool(
    media_type: &MediaType,
    config: &ConversionConfig,
    runner: &dyn ToolRunner,
) -> ToolSelection {
    let available = |tool: Tool| {
        let found = runner.is_available(tool.program());
        if !found {
            debug!("{} not found, trying the next option", tool.program());
        }
        found
    };

    match media_type {
        MediaType::PlainText => return ToolSelection::PlainText,
        MediaType::Djvu => {
            if config.djvu_method == DjvuMethod::Djvutxt && available(Tool::Djvutxt) {
                return ToolSelection::Run(Tool::Djvutxt);
            }
        }
        MediaType::Epub => {
            if config.epub_method == EpubMethod::Epubtxt && available(Tool::Epubtxt) {
                return ToolSelection::Run(Tool::Epubtxt);
            }
        }
        MediaType::LegacyWord => {
            if matches!(
                config.msword_method,
                MswordMethod::Catdoc | MswordMethod::Textutil
            ) {
                if available(Tool::Catdoc) {
                    return ToolSelection::Run(Tool::Catdoc);
                }
                if available(Tool::Textutil) {
                    return ToolSelection::Run(Tool::Textutil);
                }
            }
        }
        MediaType::Pdf => {
            if config.pdf_method == PdfMethod::Pdftotext && available(Tool::Pdftotext) {
                return ToolSelection::Run(Tool::Pdftotext);
            }
        }
        MediaType::Image(mime) => {
            return ToolSelection::Unsupported { mime: mime.clone() };
        }
        MediaType::Other(_) | MediaType::Unknown => {}
    }

    ToolSelection::Run(Tool::EbookConvert)
}

/// Convert a document and return its text.
///
/// The tool writes into a temporary file that is removed before this
/// function returns, whether the conversion succeeded or not.
///
/// # Errors
/// Returns `Err(Doc2TxtError)` for fatal errors only: missing input,
/// unsupported image, tool failure, output without text, or every page of a
/// page plan failing. Individual page failures are reported in
/// `output.pages` and `output.warnings`.
///
/// # Example
/// ```rust,no_run
/// use edgequake_doc2txt::{convert, ConversionConfig};
///
/// let config = ConversionConfig::builder().pages("1-3").build()?;
/// let output = convert("paper.pdf", &config)?;
/// println!("{}", output.text);
/// # Ok::<(), edgequake_doc2txt::Doc2TxtError>(())
/// ```
pub fn convert(
    input: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Doc2TxtError> {
    run(input.as_ref(), None, config)
}

/// Convert a document into `output`, which must end in `.txt`.
///
/// A missing output file is created before the tool runs. The file is never
/// removed, so on failure it may be left empty or holding partial output.
/// `output.text` is empty; the text lives in the file.
pub fn convert_to_file(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Doc2TxtError> {
    run(input.as_ref(), Some(output.as_ref()), config)
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn run(
    input_path: &Path,
    output_path: Option<&Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Doc2TxtError> {
    let start = Instant::now();
    info!("Starting document conversion to txt...");

    // ── Step 1: Pre-flight ───────────────────────────────────────────────
    // Plain text is never written anywhere, so its output name is not checked.
    if let Some(out) = output_path {
        if input::classify(input_path) != MediaType::PlainText {
            validate::check_txt_extension(out)?;
        }
    }
    let resolved = input::resolve_input(input_path)?;
    let media_type = resolved.media_type;

    // ── Step 2: Select tool ──────────────────────────────────────────────
    let runner = config.runner();
    let tool = match select_tool(&media_type, config, runner.as_ref()) {
        ToolSelection::PlainText => {
            return passthrough(&resolved.path, output_path, media_type, config, start);
        }
        ToolSelection::Unsupported { mime } => {
            return Err(Doc2TxtError::UnsupportedFormat {
                path: resolved.path,
                mime,
            });
        }
        ToolSelection::Run(tool) => tool,
    };
    debug!("Selected {} for {}", tool, media_type);

    let mut warnings = Vec::new();

    // ── Step 3: Prepare the artifact ─────────────────────────────────────
    let artifact = match output_path {
        Some(out) => {
            let (artifact, warning) = OutputArtifact::persistent(out)?;
            warnings.extend(warning);
            artifact
        }
        None => OutputArtifact::temporary()?,
    };

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_start(&media_type, Some(tool));
    }

    let honours_pages = matches!(tool, Tool::Pdftotext | Tool::Djvutxt);
    if let Some(plan) = config.pages.as_ref().filter(|_| !honours_pages) {
        let msg = format!(
            "{} converts the whole document; page selection '{}' is ignored",
            tool,
            plan.spec()
        );
        warn!("{}", msg);
        warnings.push(msg);
    }

    // ── Step 4: Extract ──────────────────────────────────────────────────
    let input_path = resolved.path.as_path();
    let out = artifact.path();
    let mut pages = Vec::new();
    let result = match tool {
        Tool::Pdftotext => match &config.pages {
            Some(plan) => {
                let (result, page_results) =
                    extract_pages(runner.as_ref(), input_path, plan, out, config)?;
                pages = page_results;
                result
            }
            None => tools::pdftotext(runner.as_ref(), input_path, out, None)?,
        },
        Tool::Djvutxt => tools::djvutxt(runner.as_ref(), input_path, out, config.pages.as_ref())?,
        Tool::Epubtxt => tools::epubtxt(runner.as_ref(), input_path, out)?,
        Tool::Catdoc => tools::catdoc(runner.as_ref(), input_path, out)?,
        Tool::Textutil => tools::textutil(runner.as_ref(), input_path, out)?,
        Tool::EbookConvert => tools::ebook_convert(runner.as_ref(), input_path, out)?,
    };

    for page in pages.iter().filter_map(|p| p.error.as_ref()) {
        warnings.push(page.to_string());
    }

    // ── Step 5: Validate ─────────────────────────────────────────────────
    let output_bytes = validate::check_output(tool.name(), &result, out)?;

    let text = if artifact.is_temporary() {
        validate::read_text(out)?
    } else {
        String::new()
    };

    // ── Step 6: Finalize ─────────────────────────────────────────────────
    let failed_pages = pages.iter().filter(|p| p.error.is_some()).count();
    let stats = ConversionStats {
        media_type: Some(media_type),
        tool: Some(tool),
        output_bytes,
        requested_pages: if honours_pages {
            config.pages.as_ref().map_or(0, PagePlan::len)
        } else {
            0
        },
        extracted_pages: pages.len() - failed_pages,
        failed_pages,
        total_duration_ms: start.elapsed().as_millis() as u64,
    };

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_complete(&stats);
    }
    info!("Conversion successful!");

    Ok(ConversionOutput {
        text,
        output_path: output_path.map(Path::to_path_buf),
        pages,
        warnings,
        stats,
    })
}

/// Plain text needs no conversion: hand the content back, or leave the
/// requested output file alone.
fn passthrough(
    input_path: &Path,
    output_path: Option<&Path>,
    media_type: MediaType,
    config: &ConversionConfig,
    start: Instant,
) -> Result<ConversionOutput, Doc2TxtError> {
    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_start(&media_type, None);
    }

    let mut warnings = vec![format!(
        "The file is already in .txt: {}",
        input_path.display()
    )];
    warn!("{}", warnings[0]);

    let text = match output_path {
        None => validate::read_text(input_path)?,
        Some(out) => {
            let msg = format!("Nothing was written to '{}'", out.display());
            warn!("{}", msg);
            warnings.push(msg);
            String::new()
        }
    };

    let stats = ConversionStats {
        media_type: Some(media_type),
        tool: None,
        output_bytes: text.len() as u64,
        total_duration_ms: start.elapsed().as_millis() as u64,
        ..ConversionStats::default()
    };
    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_complete(&stats);
    }

    Ok(ConversionOutput {
        text,
        output_path: None,
        pages: Vec::new(),
        warnings,
        stats,
    })
}

/// Run pdftotext once per planned page and concatenate the pages in plan
/// order into `output`.
///
/// Failing pages are logged and skipped. Fails only when every page failed.
fn extract_pages(
    runner: &dyn ToolRunner,
    input_path: &Path,
    plan: &PagePlan,
    output: &Path,
    config: &ConversionConfig,
) -> Result<(ToolInvocationResult, Vec<PageResult>), Doc2TxtError> {
    let total = plan.len();
    let cb = config.progress_callback.as_deref();
    let mut buffer: Vec<u8> = Vec::new();
    let mut results = Vec::with_capacity(total);

    for (i, &page) in plan.pages().iter().enumerate() {
        let position = i + 1;
        if let Some(cb) = cb {
            cb.on_page_start(page, position, total);
        }
        debug!("Extracting page {} ({}/{})", page, position, total);

        let (args, outcome) = extract_page(runner, input_path, page);
        match outcome {
            Ok(bytes) => {
                if let Some(cb) = cb {
                    cb.on_page_complete(page, position, total, bytes.len());
                }
                results.push(PageResult {
                    page_num: page,
                    bytes: bytes.len(),
                    args,
                    error: None,
                });
                buffer.extend_from_slice(&bytes);
            }
            Err(e) => {
                warn!("Skipping page: {}", e);
                report_page_error(cb, position, total, &e);
                results.push(PageResult {
                    page_num: page,
                    bytes: 0,
                    args,
                    error: Some(e),
                });
            }
        }
    }

    if results.iter().all(|r| r.error.is_some()) {
        let first_error = results
            .iter()
            .find_map(|r| r.error.as_ref())
            .map(|e| e.to_string())
            .unwrap_or_else(|| "Unknown error".to_string());
        return Err(Doc2TxtError::AllPagesFailed { total, first_error });
    }

    fs::write(output, &buffer).map_err(|e| Doc2TxtError::OutputWriteFailed {
        path: output.to_path_buf(),
        source: e,
    })?;

    Ok((ToolInvocationResult::assembled(), results))
}

fn report_page_error(
    cb: Option<&dyn ConversionProgressCallback>,
    position: usize,
    total: usize,
    error: &PageError,
) {
    if let Some(cb) = cb {
        cb.on_page_error(error.page(), position, total, &error.to_string());
    }
}

/// Extract one page into its own temporary file and return its bytes,
/// together with the command line that ran (empty if pdftotext never launched).
fn extract_page(
    runner: &dyn ToolRunner,
    input_path: &Path,
    page: u32,
) -> (Vec<String>, Result<Vec<u8>, PageError>) {
    let tool = Tool::Pdftotext.name().to_string();
    let tmp = match validate::new_temp_txt() {
        Ok(tmp) => tmp,
        Err(e) => {
            let err = PageError::ReadFailed {
                page,
                detail: e.to_string(),
            };
            return (Vec::new(), Err(err));
        }
    };

    let result = match tools::pdftotext(runner, input_path, &tmp, Some(page)) {
        Ok(result) => result,
        Err(e) => {
            let err = PageError::LaunchFailed {
                page,
                tool,
                detail: e.to_string(),
            };
            return (Vec::new(), Err(err));
        }
    };

    if !result.success() {
        let err = PageError::ToolFailed {
            page,
            tool,
            status: result.status,
            stderr: result.stderr.trim().to_string(),
        };
        return (result.args, Err(err));
    }

    let bytes = fs::read(&tmp).map_err(|e| PageError::ReadFailed {
        page,
        detail: e.to_string(),
    });
    (result.args, bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::tools::render_args;
    use std::collections::HashSet;
    use std::ffi::OsString;
    use std::io;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Pretends to be a set of installed tools.
    ///
    /// File-writing tools write `body` to their output argument; pdftotext
    /// with `-f N` writes `page N`. Pages listed in `failing_pages` exit 99.
    struct FakeRunner {
        available: HashSet<&'static str>,
        body: String,
        failing_pages: Vec<u32>,
        calls: Mutex<Vec<Vec<String>>>,
    }

    impl FakeRunner {
        fn new(available: &[&'static str]) -> Self {
            Self {
                available: available.iter().copied().collect(),
                body: "Hello world\n".to_string(),
                failing_pages: Vec::new(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn body(mut self, body: &str) -> Self {
            self.body = body.to_string();
            self
        }

        fn failing_pages(mut self, pages: &[u32]) -> Self {
            self.failing_pages = pages.to_vec();
            self
        }

        fn calls(&self) -> Vec<Vec<String>> {
            self.calls.lock().unwrap().clone()
        }

        fn programs(&self) -> Vec<String> {
            self.calls().into_iter().map(|c| c[0].clone()).collect()
        }
    }

    impl ToolRunner for FakeRunner {
        fn is_available(&self, program: &str) -> bool {
            self.available.contains(program)
        }

        fn run(&self, program: &str, args: &[OsString]) -> io::Result<ToolInvocationResult> {
            if !self.available.contains(program) {
                return Err(io::Error::new(io::ErrorKind::NotFound, program.to_string()));
            }
            let rendered = render_args(program, args);
            self.calls.lock().unwrap().push(rendered.clone());

            let mut result = ToolInvocationResult {
                args: rendered.clone(),
                stdout: Vec::new(),
                stderr: String::new(),
                status: Some(0),
            };
            match program {
                "unzip" | "catdoc" => result.stdout = self.body.clone().into_bytes(),
                "pdftotext" => {
                    let page = rendered
                        .iter()
                        .position(|a| a == "-f")
                        .map(|i| rendered[i + 1].parse::<u32>().unwrap());
                    match page {
                        Some(p) if self.failing_pages.contains(&p) => {
                            result.status = Some(99);
                            result.stderr = format!("Wrong page range given: {p}\n");
                        }
                        Some(p) => fs::write(&args[1], format!("page {p}\n"))?,
                        None => fs::write(&args[1], &self.body)?,
                    }
                }
                "textutil" => fs::write(&args[4], &self.body)?,
                _ => fs::write(&args[1], &self.body)?,
            }
            Ok(result)
        }
    }

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
        completed: AtomicUsize,
    }

    impl ConversionProgressCallback for Recorder {
        fn on_page_complete(&self, page: u32, position: usize, total: usize, _bytes: usize) {
            self.events.lock().unwrap().push(format!("ok {page} {position}/{total}"));
        }

        fn on_page_error(&self, page: u32, position: usize, total: usize, _error: &str) {
            self.events.lock().unwrap().push(format!("err {page} {position}/{total}"));
        }

        fn on_conversion_complete(&self, _stats: &ConversionStats) {
            self.completed.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn config_with(runner: &Arc<FakeRunner>) -> crate::config::ConversionConfigBuilder {
        ConversionConfig::builder().runner(Arc::clone(runner) as Arc<dyn ToolRunner>)
    }

    fn input_file(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let p = dir.path().join(name);
        fs::write(&p, content).unwrap();
        p
    }

    /// The output path of the single recorded call to `program`.
    fn recorded_output(runner: &FakeRunner, program: &str) -> PathBuf {
        let call = runner
            .calls()
            .into_iter()
            .find(|c| c[0] == program)
            .expect("program was not called");
        PathBuf::from(&call[2])
    }

    // ── Selection ────────────────────────────────────────────────────────

    #[test]
    fn selection_prefers_specialised_tools_when_installed() {
        let runner = FakeRunner::new(&["pdftotext", "djvutxt", "unzip", "catdoc", "textutil"]);
        let cfg = ConversionConfig::default();
        assert_eq!(select_tool(&MediaType::Pdf, &cfg, &runner), ToolSelection::Run(Tool::Pdftotext));
        assert_eq!(select_tool(&MediaType::Djvu, &cfg, &runner), ToolSelection::Run(Tool::Djvutxt));
        assert_eq!(select_tool(&MediaType::Epub, &cfg, &runner), ToolSelection::Run(Tool::Epubtxt));
        assert_eq!(select_tool(&MediaType::LegacyWord, &cfg, &runner), ToolSelection::Run(Tool::Catdoc));
    }

    #[test]
    fn missing_preferred_tool_falls_back_to_ebook_convert() {
        let runner = FakeRunner::new(&[]);
        let cfg = ConversionConfig::default();
        for media in [MediaType::Pdf, MediaType::Djvu, MediaType::Epub, MediaType::LegacyWord] {
            assert_eq!(
                select_tool(&media, &cfg, &runner),
                ToolSelection::Run(Tool::EbookConvert),
                "{media}"
            );
        }
    }

    #[test]
    fn ebook_convert_method_overrides_installed_tools() {
        let runner = FakeRunner::new(&["pdftotext", "djvutxt", "unzip", "catdoc", "textutil"]);
        let cfg = ConversionConfig::builder()
            .pdf_method(PdfMethod::EbookConvert)
            .djvu_method(DjvuMethod::EbookConvert)
            .epub_method(EpubMethod::EbookConvert)
            .msword_method(MswordMethod::EbookConvert)
            .build()
            .unwrap();
        for media in [MediaType::Pdf, MediaType::Djvu, MediaType::Epub, MediaType::LegacyWord] {
            assert_eq!(select_tool(&media, &cfg, &runner), ToolSelection::Run(Tool::EbookConvert));
        }
    }

    #[test]
    fn word_methods_share_catdoc_then_textutil() {
        let only_textutil = FakeRunner::new(&["textutil"]);
        let cfg = ConversionConfig::builder()
            .msword_method(MswordMethod::Catdoc)
            .build()
            .unwrap();
        assert_eq!(
            select_tool(&MediaType::LegacyWord, &cfg, &only_textutil),
            ToolSelection::Run(Tool::Textutil)
        );
    }

    #[test]
    fn plain_text_images_and_unknown_types() {
        let runner = FakeRunner::new(&["pdftotext"]);
        let cfg = ConversionConfig::default();
        assert_eq!(select_tool(&MediaType::PlainText, &cfg, &runner), ToolSelection::PlainText);
        assert_eq!(
            select_tool(&MediaType::Image("image/png".into()), &cfg, &runner),
            ToolSelection::Unsupported { mime: "image/png".into() }
        );
        assert_eq!(select_tool(&MediaType::Unknown, &cfg, &runner), ToolSelection::Run(Tool::EbookConvert));
        assert_eq!(
            select_tool(&MediaType::Other("application/x-mobipocket-ebook".into()), &cfg, &runner),
            ToolSelection::Run(Tool::EbookConvert)
        );
    }

    // ── Pre-flight ───────────────────────────────────────────────────────

    #[test]
    fn output_extension_is_checked_before_input() {
        let runner = Arc::new(FakeRunner::new(&["ebook-convert"]));
        let cfg = config_with(&runner).build().unwrap();
        let err = convert_to_file("/nonexistent/book.mobi", "/tmp/out.md", &cfg).unwrap_err();
        assert!(matches!(err, Doc2TxtError::InvalidOutputExtension { .. }), "got {err:?}");
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn plain_text_input_skips_output_extension_check() {
        let dir = tempfile::tempdir().unwrap();
        let input = input_file(&dir, "notes.txt", "already text\n");
        let target = dir.path().join("notes.md");
        let runner = Arc::new(FakeRunner::new(&["ebook-convert"]));
        let cfg = config_with(&runner).build().unwrap();

        let out = convert_to_file(&input, &target, &cfg).unwrap();

        assert!(out.warnings[0].contains("already in .txt"));
        assert!(!target.exists());
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn missing_input_is_reported() {
        let runner = Arc::new(FakeRunner::new(&["ebook-convert"]));
        let cfg = config_with(&runner).build().unwrap();
        let err = convert("/nonexistent/book.mobi", &cfg).unwrap_err();
        assert!(matches!(err, Doc2TxtError::FileNotFound { .. }), "got {err:?}");
    }

    // ── Bypass and rejection ─────────────────────────────────────────────

    #[test]
    fn plain_text_is_returned_unchanged_without_tools() {
        let dir = tempfile::tempdir().unwrap();
        let input = input_file(&dir, "notes.txt", "already text\n");
        let runner = Arc::new(FakeRunner::new(&["ebook-convert", "pdftotext"]));
        let cfg = config_with(&runner).build().unwrap();

        let out = convert(&input, &cfg).unwrap();

        assert_eq!(out.text, "already text\n");
        assert!(out.stats.tool.is_none());
        assert!(out.warnings[0].contains("already in .txt"));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn plain_text_with_output_path_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = input_file(&dir, "notes.txt", "already text\n");
        let target = dir.path().join("copy.txt");
        let runner = Arc::new(FakeRunner::new(&["ebook-convert"]));
        let cfg = config_with(&runner).build().unwrap();

        let out = convert_to_file(&input, &target, &cfg).unwrap();

        assert!(out.text.is_empty());
        assert!(!target.exists());
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn images_are_rejected_without_tools() {
        let dir = tempfile::tempdir().unwrap();
        let input = input_file(&dir, "photo.png", "\u{89}PNG");
        let target = dir.path().join("photo.txt");
        let runner = Arc::new(FakeRunner::new(&["ebook-convert"]));
        let cfg = config_with(&runner).build().unwrap();

        let err = convert_to_file(&input, &target, &cfg).unwrap_err();

        match err {
            Doc2TxtError::UnsupportedFormat { mime, .. } => assert_eq!(mime, "image/png"),
            other => panic!("expected UnsupportedFormat, got {other:?}"),
        }
        assert!(runner.calls().is_empty());
        assert!(!target.exists());
    }

    // ── Single-shot ──────────────────────────────────────────────────────

    #[test]
    fn whole_pdf_goes_through_pdftotext() {
        let dir = tempfile::tempdir().unwrap();
        let input = input_file(&dir, "paper.pdf", "%PDF-1.7");
        let runner = Arc::new(FakeRunner::new(&["pdftotext"]));
        let cfg = config_with(&runner).build().unwrap();

        let out = convert(&input, &cfg).unwrap();

        assert_eq!(out.text, "Hello world\n");
        assert_eq!(out.stats.tool, Some(Tool::Pdftotext));
        assert_eq!(out.stats.output_bytes, 12);
        assert_eq!(runner.calls()[0].len(), 3);
    }

    #[test]
    fn djvutxt_receives_the_page_spec() {
        let dir = tempfile::tempdir().unwrap();
        let input = input_file(&dir, "scan.djvu", "AT&TFORM");
        let runner = Arc::new(FakeRunner::new(&["djvutxt"]));
        let cfg = config_with(&runner).pages("1,3,99-4").build().unwrap();

        convert(&input, &cfg).unwrap();

        let call = &runner.calls()[0];
        assert_eq!(call.last().unwrap(), "--page=1,3,99-4");
    }

    #[test]
    fn djvutxt_receives_a_normalised_page_spec() {
        let dir = tempfile::tempdir().unwrap();
        let input = input_file(&dir, "scan.djvu", "AT&TFORM");
        let runner = Arc::new(FakeRunner::new(&["djvutxt"]));
        let cfg = config_with(&runner).pages(" 1 , 4 - 2 ").build().unwrap();

        convert(&input, &cfg).unwrap();

        assert_eq!(runner.calls()[0].last().unwrap(), "--page=1,4-2");
    }

    #[test]
    fn epub_listing_is_accepted_as_text() {
        let dir = tempfile::tempdir().unwrap();
        let input = input_file(&dir, "novel.epub", "PK");
        let runner = Arc::new(FakeRunner::new(&["unzip"]).body("Archive: novel.epub\n<p>Call me</p>"));
        let cfg = config_with(&runner).build().unwrap();

        let out = convert(&input, &cfg).unwrap();

        assert_eq!(out.stats.tool, Some(Tool::Epubtxt));
        assert!(out.text.contains("<p>Call me</p>"));
    }

    #[test]
    fn fallback_warns_that_pages_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let input = input_file(&dir, "paper.pdf", "%PDF-1.7");
        let runner = Arc::new(FakeRunner::new(&["ebook-convert"]));
        let cfg = config_with(&runner).pages("2-3").build().unwrap();

        let out = convert(&input, &cfg).unwrap();

        assert_eq!(runner.programs(), vec!["ebook-convert"]);
        assert!(out.warnings.iter().any(|w| w.contains("'2-3' is ignored")));
        assert_eq!(out.stats.requested_pages, 0);
    }

    // ── Paged extraction ─────────────────────────────────────────────────

    #[test]
    fn pages_are_concatenated_in_plan_order_skipping_failures() {
        let dir = tempfile::tempdir().unwrap();
        let input = input_file(&dir, "paper.pdf", "%PDF-1.7");
        let runner = Arc::new(FakeRunner::new(&["pdftotext"]).failing_pages(&[2]));
        let recorder = Arc::new(Recorder::default());
        let cfg = config_with(&runner)
            .pages("3-1")
            .progress_callback(Arc::clone(&recorder) as Arc<dyn ConversionProgressCallback>)
            .build()
            .unwrap();

        let out = convert(&input, &cfg).unwrap();

        assert_eq!(out.text, "page 3\npage 1\n");
        assert_eq!(out.stats.requested_pages, 3);
        assert_eq!(out.stats.extracted_pages, 2);
        assert_eq!(out.stats.failed_pages, 1);
        assert_eq!(out.pages[1].page_num, 2);
        assert!(out.pages[1].error.is_some());
        assert!(out.warnings.iter().any(|w| w.starts_with("Page 2:")));

        let pages_run: Vec<String> = runner.calls().iter().map(|c| c[4].clone()).collect();
        assert_eq!(pages_run, vec!["3", "2", "1"]);

        assert_eq!(
            *recorder.events.lock().unwrap(),
            vec!["ok 3 1/3", "err 2 2/3", "ok 1 3/3"]
        );
        assert_eq!(recorder.completed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn page_results_carry_the_command_that_ran() {
        let dir = tempfile::tempdir().unwrap();
        let input = input_file(&dir, "paper.pdf", "%PDF-1.7");
        let runner = Arc::new(FakeRunner::new(&["pdftotext"]).failing_pages(&[2]));
        let cfg = config_with(&runner).pages("1-2").build().unwrap();

        let out = convert(&input, &cfg).unwrap();

        for (page, expected) in out.pages.iter().zip(["1", "2"]) {
            assert_eq!(page.args[0], "pdftotext");
            assert_eq!(&page.args[3..], ["-f", expected, "-l", expected]);
            assert!(!page.args.iter().any(|a| a.starts_with("--pages")));
        }
        assert_eq!(runner.calls(), out.pages.iter().map(|p| p.args.clone()).collect::<Vec<_>>());
    }

    #[test]
    fn repeated_pages_are_extracted_each_time() {
        let dir = tempfile::tempdir().unwrap();
        let input = input_file(&dir, "paper.pdf", "%PDF-1.7");
        let runner = Arc::new(FakeRunner::new(&["pdftotext"]));
        let cfg = config_with(&runner).pages("1,1").build().unwrap();

        let out = convert(&input, &cfg).unwrap();

        assert_eq!(out.text, "page 1\npage 1\n");
        assert_eq!(runner.calls().len(), 2);
    }

    #[test]
    fn every_page_failing_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let input = input_file(&dir, "paper.pdf", "%PDF-1.7");
        let runner = Arc::new(FakeRunner::new(&["pdftotext"]).failing_pages(&[1, 2]));
        let cfg = config_with(&runner).pages("1-2").build().unwrap();

        match convert(&input, &cfg).unwrap_err() {
            Doc2TxtError::AllPagesFailed { total, first_error } => {
                assert_eq!(total, 2);
                assert!(first_error.contains("Page 1"), "got {first_error}");
            }
            other => panic!("expected AllPagesFailed, got {other:?}"),
        }
    }

    #[test]
    fn per_page_temporaries_are_removed() {
        let dir = tempfile::tempdir().unwrap();
        let input = input_file(&dir, "paper.pdf", "%PDF-1.7");
        let runner = Arc::new(FakeRunner::new(&["pdftotext"]));
        let cfg = config_with(&runner).pages("1-2").build().unwrap();

        convert(&input, &cfg).unwrap();

        for call in runner.calls() {
            assert!(!Path::new(&call[2]).exists(), "{} left behind", call[2]);
        }
    }

    // ── Artifacts ────────────────────────────────────────────────────────

    #[test]
    fn temporary_artifact_is_gone_after_success() {
        let dir = tempfile::tempdir().unwrap();
        let input = input_file(&dir, "book.mobi", "BOOKMOBI");
        let runner = Arc::new(FakeRunner::new(&["ebook-convert"]));
        let cfg = config_with(&runner).build().unwrap();

        let out = convert(&input, &cfg).unwrap();

        assert_eq!(out.text, "Hello world\n");
        assert!(!recorded_output(&runner, "ebook-convert").exists());
    }

    #[test]
    fn temporary_artifact_is_gone_after_validation_failure() {
        let dir = tempfile::tempdir().unwrap();
        let input = input_file(&dir, "book.mobi", "BOOKMOBI");
        let runner = Arc::new(FakeRunner::new(&["ebook-convert"]).body(" \n\x0c"));
        let cfg = config_with(&runner).build().unwrap();

        let err = convert(&input, &cfg).unwrap_err();

        assert!(matches!(err, Doc2TxtError::NoTextFound { size: 3, .. }), "got {err:?}");
        assert!(!recorded_output(&runner, "ebook-convert").exists());
    }

    #[test]
    fn persistent_artifact_survives_success_and_failure() {
        let dir = tempfile::tempdir().unwrap();
        let input = input_file(&dir, "book.mobi", "BOOKMOBI");
        let target = dir.path().join("book.txt");

        let runner = Arc::new(FakeRunner::new(&["ebook-convert"]));
        let cfg = config_with(&runner).build().unwrap();
        let out = convert_to_file(&input, &target, &cfg).unwrap();
        assert!(out.text.is_empty());
        assert_eq!(out.output_path.as_deref(), Some(target.as_path()));
        assert_eq!(fs::read_to_string(&target).unwrap(), "Hello world\n");

        let runner = Arc::new(FakeRunner::new(&["ebook-convert"]).body(""));
        let cfg = config_with(&runner).build().unwrap();
        let err = convert_to_file(&input, &target, &cfg).unwrap_err();
        assert!(matches!(err, Doc2TxtError::EmptyOutput { .. }), "got {err:?}");
        assert!(target.exists());
    }

    #[test]
    fn existing_output_file_is_warned_about() {
        let dir = tempfile::tempdir().unwrap();
        let input = input_file(&dir, "book.mobi", "BOOKMOBI");
        let target = input_file(&dir, "book.txt", "stale");
        let runner = Arc::new(FakeRunner::new(&["ebook-convert"]));
        let cfg = config_with(&runner).build().unwrap();

        let out = convert_to_file(&input, &target, &cfg).unwrap();

        assert!(out.warnings.iter().any(|w| w.contains("already exists")));
        assert_eq!(fs::read_to_string(&target).unwrap(), "Hello world\n");
    }

    #[test]
    fn tool_failure_carries_status_and_stderr() {
        struct Failing;
        impl ToolRunner for Failing {
            fn is_available(&self, _program: &str) -> bool {
                true
            }
            fn run(&self, program: &str, args: &[OsString]) -> io::Result<ToolInvocationResult> {
                Ok(ToolInvocationResult {
                    args: render_args(program, args),
                    stdout: Vec::new(),
                    stderr: "Syntax Error\n".into(),
                    status: Some(1),
                })
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let input = input_file(&dir, "paper.pdf", "%PDF-1.7");
        let cfg = ConversionConfig::builder().runner(Arc::new(Failing)).build().unwrap();

        match convert(&input, &cfg).unwrap_err() {
            Doc2TxtError::ToolFailed { tool, status, stderr, size } => {
                assert_eq!(tool, "pdftotext");
                assert_eq!(status, Some(1));
                assert_eq!(stderr, "Syntax Error");
                assert_eq!(size, 0);
            }
            other => panic!("expected ToolFailed, got {other:?}"),
        }
    }
}
