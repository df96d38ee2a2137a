//! CLI binary for edgequake-doc2txt.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_doc2txt::{
    convert, convert_to_file, ConversionConfig, ConversionOutput, ConversionProgressCallback,
    ConversionStats, DjvuMethod, EpubMethod, MediaType, MswordMethod, PdfMethod, ProgressCallback,
    Tool,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::{Duration, Instant};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

const DEFAULT_OUTPUT: &str = "output.txt";

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback. The bar only appears once a page plan starts
/// running; whole-document conversions are a single tool run with nothing
/// to count.
struct CliProgressCallback {
    bar: OnceLock<ProgressBar>,
    /// Wall-clock start of the page currently being extracted.
    page_started: Mutex<Option<Instant>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            bar: OnceLock::new(),
            page_started: Mutex::new(None),
            errors: AtomicUsize::new(0),
        })
    }

    fn bar(&self, total: usize) -> &ProgressBar {
        self.bar.get_or_init(|| {
            let style = ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  \
                 [{bar:42.green/238}] {pos:>3}/{len} pages  \
                 ⏱ {elapsed_precise}  {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

            let bar = ProgressBar::new(total as u64);
            bar.set_style(style);
            bar.set_prefix("Extracting");
            bar.enable_steady_tick(Duration::from_millis(80));
            bar
        })
    }

    fn page_elapsed_secs(&self) -> f64 {
        self.page_started
            .lock()
            .ok()
            .and_then(|mut started| started.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, media_type: &MediaType, tool: Option<Tool>) {
        if let Some(tool) = tool {
            eprintln!(
                "{} {}",
                cyan("◆"),
                bold(&format!("Converting {media_type} with {tool}…"))
            );
        }
    }

    fn on_page_start(&self, page: u32, _position: usize, total: usize) {
        if let Ok(mut started) = self.page_started.lock() {
            *started = Some(Instant::now());
        }
        self.bar(total).set_message(format!("page {page}"));
    }

    fn on_page_complete(&self, page: u32, position: usize, total: usize, bytes: usize) {
        let elapsed = self.page_elapsed_secs();
        let bar = self.bar(total);
        bar.println(format!(
            "  {} Page {:>4}  {:>3}/{:<3}  {:<8}  {}",
            green("✓"),
            page,
            position,
            total,
            dim(&format!("{bytes:>6} bytes")),
            dim(&format!("{elapsed:.1}s")),
        ));
        bar.inc(1);
    }

    fn on_page_error(&self, page: u32, position: usize, total: usize, error: &str) {
        let elapsed = self.page_elapsed_secs();
        self.errors.fetch_add(1, Ordering::SeqCst);

        // Truncate very long error messages to keep output tidy.
        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };

        let bar = self.bar(total);
        bar.println(format!(
            "  {} Page {:>4}  {:>3}/{:<3}  {}  {}",
            red("✗"),
            page,
            position,
            total,
            red(&msg),
            dim(&format!("{elapsed:.1}s")),
        ));
        bar.inc(1);
    }

    fn on_conversion_complete(&self, stats: &ConversionStats) {
        let Some(bar) = self.bar.get() else {
            return;
        };
        bar.finish_and_clear();

        let failed = self.errors.load(Ordering::SeqCst);
        if failed == 0 {
            eprintln!(
                "{} {} pages extracted",
                green("✔"),
                bold(&stats.extracted_pages.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} pages extracted  ({} failed)",
                yellow("⚠"),
                bold(&stats.extracted_pages.to_string()),
                stats.requested_pages,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert to output.txt in the current directory
  doc2txt book.pdf

  # Convert to a chosen file
  doc2txt book.djvu book.txt

  # Print the text instead of writing a file
  doc2txt --stdout novel.epub | less

  # Pages 1 and 3, then 10 down to 8, in that order
  doc2txt --pages 1,3,10-8 paper.pdf paper.txt

  # Force calibre for a Word document
  doc2txt --msword ebook-convert letter.doc letter.txt

  # Conversion statistics as JSON
  doc2txt --json -q paper.pdf paper.txt

TOOLS:
  Format   Preferred                       Fallback
  ──────   ──────────────────────────────  ─────────────
  pdf      pdftotext (poppler-utils)       ebook-convert
  djvu     djvutxt (djvulibre-bin)         ebook-convert
  epub     unzip -c (raw archive listing)  ebook-convert
  doc      catdoc, then textutil (macOS)   ebook-convert
  other    none                            ebook-convert

  A preferred tool that is not installed silently falls back to
  ebook-convert (calibre). Ordinary images (png, jpg, …) are rejected.
  --pages is honoured by pdftotext and djvutxt only.

EXIT CODES:
  0  success
  1  conversion failed
  2  interrupted, or invalid command-line usage

ENVIRONMENT VARIABLES:
  RUST_LOG                Overrides --log-level (tracing EnvFilter syntax)
  DOC2TXT_*               Every option below can also be set from the
                          environment, e.g. DOC2TXT_PAGES=1-10
"#;

/// Convert documents (pdf, djvu, epub, word) to txt.
#[derive(Parser, Debug)]
#[command(
    name = "doc2txt",
    version,
    about = "Convert documents (pdf, djvu, epub, word) to txt",
    long_about = "Convert documents (pdf, djvu, epub, word) to plain text using the best \
extraction tool installed on this machine: pdftotext, djvutxt, unzip, catdoc, textutil, or \
calibre's ebook-convert as a fallback.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Path of the file (pdf, djvu, epub, word) that will be converted to txt.
    input: PathBuf,

    /// Path of the output txt file [default: output.txt].
    #[arg(env = "DOC2TXT_OUTPUT", conflicts_with = "stdout")]
    output: Option<PathBuf>,

    /// Print the text to stdout instead of writing a file.
    #[arg(long, env = "DOC2TXT_STDOUT")]
    stdout: bool,

    /// Pages to extract, e.g. 5, 1-10 or 1,3,99-4 (descending ranges run backwards).
    #[arg(
        short,
        long,
        env = "DOC2TXT_PAGES",
        long_help = "Specify which pages should be processed. When this option is not \
          specified, the text of all pages is concatenated into the output file. PAGES \
          contains one or more comma-separated page ranges. A page range is either a page \
          number, or two page numbers separated by a dash. For instance, 1-10 outputs pages \
          1 to 10, and 1,3,99-4 outputs pages 1 and 3, followed by pages 99 down to 4."
    )]
    pages: Option<String>,

    /// Conversion method for djvu documents.
    #[arg(long, env = "DOC2TXT_DJVU", value_enum, default_value = "djvutxt")]
    djvu: DjvuArg,

    /// Conversion method for epub documents.
    #[arg(long, env = "DOC2TXT_EPUB", value_enum, default_value = "epubtxt")]
    epub: EpubArg,

    /// Conversion method for msword documents.
    #[arg(long, env = "DOC2TXT_MSWORD", value_enum, default_value = "textutil")]
    msword: MswordArg,

    /// Conversion method for pdf documents.
    #[arg(long, env = "DOC2TXT_PDF", value_enum, default_value = "pdftotext")]
    pdf: PdfArg,

    /// Print conversion results as JSON on stdout (stats, or the full output with --stdout).
    #[arg(long, env = "DOC2TXT_JSON")]
    json: bool,

    /// Disable the page progress bar.
    #[arg(long, env = "DOC2TXT_NO_PROGRESS")]
    no_progress: bool,

    /// Enable quiet mode: only errors are printed.
    #[arg(short, long, env = "DOC2TXT_QUIET")]
    quiet: bool,

    /// Print debugging information.
    #[arg(long, env = "DOC2TXT_VERBOSE")]
    verbose: bool,

    /// Logging level.
    #[arg(long, env = "DOC2TXT_LOG_LEVEL", value_enum, default_value = "info")]
    log_level: LogLevel,

    /// Logging format.
    #[arg(long, env = "DOC2TXT_LOG_FORMAT", value_enum, default_value = "only_msg")]
    log_format: LogFormat,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum DjvuArg {
    Djvutxt,
    EbookConvert,
}

impl From<DjvuArg> for DjvuMethod {
    fn from(v: DjvuArg) -> Self {
        match v {
            DjvuArg::Djvutxt => DjvuMethod::Djvutxt,
            DjvuArg::EbookConvert => DjvuMethod::EbookConvert,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum EpubArg {
    Epubtxt,
    EbookConvert,
}

impl From<EpubArg> for EpubMethod {
    fn from(v: EpubArg) -> Self {
        match v {
            EpubArg::Epubtxt => EpubMethod::Epubtxt,
            EpubArg::EbookConvert => EpubMethod::EbookConvert,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum MswordArg {
    Textutil,
    Catdoc,
    EbookConvert,
}

impl From<MswordArg> for MswordMethod {
    fn from(v: MswordArg) -> Self {
        match v {
            MswordArg::Textutil => MswordMethod::Textutil,
            MswordArg::Catdoc => MswordMethod::Catdoc,
            MswordArg::EbookConvert => MswordMethod::EbookConvert,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum PdfArg {
    Pdftotext,
    EbookConvert,
}

impl From<PdfArg> for PdfMethod {
    fn from(v: PdfArg) -> Self {
        match v {
            PdfArg::Pdftotext => PdfMethod::Pdftotext,
            PdfArg::EbookConvert => PdfMethod::EbookConvert,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum LogFormat {
    /// `target | LEVEL message`
    Console,
    /// The message alone.
    #[value(name = "only_msg")]
    OnlyMsg,
    /// `LEVEL message`
    Simple,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);
    let quiet = cli.quiet;

    // The conversion blocks on child processes, so it runs on the blocking
    // pool while this task waits for either completion or Ctrl-C.
    let exit_code = tokio::select! {
        res = run(cli) => match res {
            Ok(()) => 0,
            Err(e) => {
                error!("{}", red(&format!("{e:#}")));
                1
            }
        },
        _ = tokio::signal::ctrl_c() => {
            if !quiet {
                eprintln!("{}", yellow("\nProgram stopped!"));
            }
            show_exit_code(2);
            // Dropping the runtime would wait for the blocking conversion.
            std::process::exit(2);
        }
    };

    show_exit_code(exit_code);
    ExitCode::from(exit_code)
}

fn init_logging(cli: &Cli) {
    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        match cli.log_level {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error => "error",
        }
    };

    let (show_level, show_target) = match cli.log_format {
        LogFormat::Console => (true, true),
        LogFormat::OnlyMsg => (false, false),
        LogFormat::Simple => (true, false),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .without_time()
        .with_level(show_level)
        .with_target(show_target)
        .init();
}

fn show_exit_code(exit_code: u8) {
    let msg = format!("Program exited with {exit_code}");
    if exit_code == 1 {
        error!("{}", red(&msg));
    } else {
        debug!("{}", msg);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;

    let target = if cli.stdout {
        None
    } else {
        Some(
            cli.output
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT)),
        )
    };

    // ── Run conversion ───────────────────────────────────────────────────
    let input = cli.input.clone();
    let job_target = target.clone();
    let output = tokio::task::spawn_blocking(move || match job_target {
        Some(path) => convert_to_file(&input, &path, &config),
        None => convert(&input, &config),
    })
    .await
    .context("Conversion task panicked")?
    .context("Conversion failed")?;

    // ── Print results ────────────────────────────────────────────────────
    if cli.json {
        let json = if target.is_some() {
            serde_json::to_string_pretty(&output.stats)
        } else {
            serde_json::to_string_pretty(&output)
        }
        .context("Failed to serialise output")?;
        println!("{json}");
    } else if target.is_none() {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(output.text.as_bytes())
            .context("Failed to write to stdout")?;
        // Ensure a trailing newline on stdout.
        if !output.text.is_empty() && !output.text.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }
    }

    if !cli.quiet && !cli.json {
        print_summary(&output);
    }

    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .djvu_method(cli.djvu.into())
        .epub_method(cli.epub.into())
        .msword_method(cli.msword.into())
        .pdf_method(cli.pdf.into());

    if let Some(ref pages) = cli.pages {
        builder = builder.pages(pages.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn print_summary(output: &ConversionOutput) {
    let stats = &output.stats;
    let Some(tool) = stats.tool else {
        // Plain-text input: the library already explained why nothing ran.
        return;
    };

    let destination = output
        .output_path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "stdout".to_string());

    eprintln!(
        "{}  {}  {} bytes  {}ms  →  {}",
        if stats.failed_pages == 0 {
            green("✔")
        } else {
            yellow("⚠")
        },
        dim(tool.name()),
        stats.output_bytes,
        stats.total_duration_ms,
        bold(&destination),
    );
}
