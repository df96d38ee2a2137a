//! Configuration types for document-to-text conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. Each format family has its own
//! method enum whose default favours the specialised, lightweight tool;
//! choosing `EbookConvert` forces calibre's general-purpose converter.
//!
//! The page specification is parsed when the config is built, so a malformed
//! specification is rejected before any file is touched.

use crate::error::Doc2TxtError;
use crate::pages::PagePlan;
use crate::pipeline::tools::{SystemRunner, ToolRunner};
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Configuration for a conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_doc2txt::{ConversionConfig, PdfMethod};
///
/// let config = ConversionConfig::builder()
///     .pages("1,3,10-8")
///     .pdf_method(PdfMethod::Pdftotext)
///     .build()
///     .unwrap();
/// assert_eq!(config.pages.unwrap().pages(), &[1, 3, 10, 9, 8]);
/// ```
#[derive(Clone, Default)]
pub struct ConversionConfig {
    /// Pages to extract, in order. Default: all pages.
    ///
    /// Honoured by pdftotext (page by page) and djvutxt (`--page`); the
    /// other tools always convert the whole document.
    pub pages: Option<PagePlan>,

    /// Conversion method for DjVu documents. Default: djvutxt.
    pub djvu_method: DjvuMethod,

    /// Conversion method for EPUB documents. Default: epubtxt.
    pub epub_method: EpubMethod,

    /// Conversion method for legacy Word documents. Default: textutil.
    ///
    /// Both `textutil` and `catdoc` select the same adapter pair: catdoc
    /// when installed, textutil otherwise.
    pub msword_method: MswordMethod,

    /// Conversion method for PDF documents. Default: pdftotext.
    pub pdf_method: PdfMethod,

    /// Runs the external tools. Default: [`SystemRunner`] on `$PATH`.
    pub runner: Option<Arc<dyn ToolRunner>>,

    /// Receives progress events. Default: none.
    pub progress_callback: Option<ProgressCallback>,
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("pages", &self.pages)
            .field("djvu_method", &self.djvu_method)
            .field("epub_method", &self.epub_method)
            .field("msword_method", &self.msword_method)
            .field("pdf_method", &self.pdf_method)
            .field("runner", &self.runner.as_ref().map(|_| "<dyn ToolRunner>"))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
            pages_spec: None,
        }
    }

    /// The configured runner, or a [`SystemRunner`] on `$PATH`.
    pub(crate) fn runner(&self) -> Arc<dyn ToolRunner> {
        match &self.runner {
            Some(r) => Arc::clone(r),
            None => Arc::new(SystemRunner::new()),
        }
    }
}

/// Builder for [`ConversionConfig`].
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
    pages_spec: Option<String>,
}

impl fmt::Debug for ConversionConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfigBuilder")
            .field("config", &self.config)
            .field("pages_spec", &self.pages_spec)
            .finish()
    }
}

impl ConversionConfigBuilder {
    /// Page specification such as `"1-10"` or `"1,3,99-4"`; validated in [`build`](Self::build).
    pub fn pages(mut self, spec: impl Into<String>) -> Self {
        self.pages_spec = Some(spec.into());
        self
    }

    pub fn djvu_method(mut self, method: DjvuMethod) -> Self {
        self.config.djvu_method = method;
        self
    }

    pub fn epub_method(mut self, method: EpubMethod) -> Self {
        self.config.epub_method = method;
        self
    }

    pub fn msword_method(mut self, method: MswordMethod) -> Self {
        self.config.msword_method = method;
        self
    }

    pub fn pdf_method(mut self, method: PdfMethod) -> Self {
        self.config.pdf_method = method;
        self
    }

    pub fn runner(mut self, runner: Arc<dyn ToolRunner>) -> Self {
        self.config.runner = Some(runner);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, parsing the page specification.
    pub fn build(mut self) -> Result<ConversionConfig, Doc2TxtError> {
        if let Some(spec) = self.pages_spec.take() {
            self.config.pages = PagePlan::parse_optional(Some(&spec))?;
        }
        Ok(self.config)
    }
}

// ── Method enums ─────────────────────────────────────────────────────────

macro_rules! method_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $label:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $text)] $variant ),+
        }

        impl $name {
            /// All accepted names, in declaration order.
            pub const NAMES: &'static [&'static str] = &[$($text),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $text ),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = Doc2TxtError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $( $text => Ok($name::$variant), )+
                    other => Err(Doc2TxtError::InvalidConfig(format!(
                        "unknown {} conversion method '{}' (expected one of: {})",
                        $label,
                        other,
                        Self::NAMES.join(", ")
                    ))),
                }
            }
        }
    };
}

method_enum! {
    /// How DjVu documents are converted.
    DjvuMethod, "djvu" {
        #[default]
        Djvutxt => "djvutxt",
        EbookConvert => "ebook-convert",
    }
}

method_enum! {
    /// How EPUB documents are converted.
    EpubMethod, "epub" {
        #[default]
        Epubtxt => "epubtxt",
        EbookConvert => "ebook-convert",
    }
}

method_enum! {
    /// How legacy Word (`.doc`) documents are converted.
    MswordMethod, "msword" {
        #[default]
        Textutil => "textutil",
        Catdoc => "catdoc",
        EbookConvert => "ebook-convert",
    }
}

method_enum! {
    /// How PDF documents are converted.
    PdfMethod, "pdf" {
        #[default]
        Pdftotext => "pdftotext",
        EbookConvert => "ebook-convert",
    }
}
