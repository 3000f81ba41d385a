//! Configuration types for batch e-book conversion.
//!
//! All batch behaviour is controlled through [`BatchConfig`], built via its
//! [`BatchConfigBuilder`]. Defaults mirror the conventional layout of the
//! tool: read from `input/`, write to `output/`, journal failures to
//! `conversion_errors.log` in the working directory.

use crate::error::Ebook2TxtError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Default directory scanned for e-books.
pub const DEFAULT_INPUT_DIR: &str = "input";

/// Default directory receiving `<stem>.txt` files.
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Default append-only failure log.
pub const DEFAULT_JOURNAL_PATH: &str = "conversion_errors.log";

/// Configuration for one batch run.
///
/// Built via [`BatchConfig::builder()`] or using [`BatchConfig::default()`].
///
/// # Example
/// ```rust
/// use ebook2txt::{BatchConfig, PageSeparator};
///
/// let config = BatchConfig::builder()
///     .input_dir("books")
///     .output_dir("books-txt")
///     .page_separator(PageSeparator::FormFeed)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct BatchConfig {
    /// Directory whose regular files are converted (non-recursive). Default: `input`.
    pub input_dir: PathBuf,

    /// Directory receiving `<stem>.txt`. Created if absent. Default: `output`.
    pub output_dir: PathBuf,

    /// Append-only failure log. Default: `conversion_errors.log`.
    pub journal_path: PathBuf,

    /// Separator placed between PDF pages. Default: a blank line.
    pub page_separator: PageSeparator,

    /// PDF user password for encrypted documents.
    ///
    /// Applied to every PDF in the batch; PDFs without encryption ignore it.
    pub password: Option<String>,

    /// Optional per-file progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from(DEFAULT_INPUT_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            journal_path: PathBuf::from(DEFAULT_JOURNAL_PATH),
            page_separator: PageSeparator::default(),
            password: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for BatchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchConfig")
            .field("input_dir", &self.input_dir)
            .field("output_dir", &self.output_dir)
            .field("journal_path", &self.journal_path)
            .field("page_separator", &self.page_separator)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl BatchConfig {
    /// Create a new builder for `BatchConfig`.
    pub fn builder() -> BatchConfigBuilder {
        BatchConfigBuilder {
            config: Self::default(),
        }
    }

    /// Path of the text file written for a document with the given stem.
    pub fn output_path_for(&self, stem: &str) -> PathBuf {
        self.output_dir.join(format!("{stem}.txt"))
    }
}

/// Builder for [`BatchConfig`].
pub struct BatchConfigBuilder {
    config: BatchConfig,
}

impl fmt::Debug for BatchConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl BatchConfigBuilder {
    pub fn input_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.input_dir = dir.into();
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn journal_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.journal_path = path.into();
        self
    }

    pub fn page_separator(mut self, sep: PageSeparator) -> Self {
        self.config.page_separator = sep;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<BatchConfig, Ebook2TxtError> {
        let c = &self.config;
        if c.input_dir.as_os_str().is_empty() {
            return Err(Ebook2TxtError::InvalidConfig(
                "input directory must not be empty".into(),
            ));
        }
        if c.output_dir.as_os_str().is_empty() {
            return Err(Ebook2TxtError::InvalidConfig(
                "output directory must not be empty".into(),
            ));
        }
        if same_dir(&c.input_dir, &c.output_dir) {
            return Err(Ebook2TxtError::InvalidConfig(format!(
                "input and output directory are the same: {}",
                c.input_dir.display()
            )));
        }
        Ok(self.config)
    }
}

/// Compare two directory paths, resolving them when they exist.
fn same_dir(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// How to separate pages in the text assembled from a PDF.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSeparator {
    /// Blank line between pages. (default)
    #[default]
    BlankLine,
    /// Form feed on its own line, as `pdftotext` emits.
    FormFeed,
    /// Custom string placed on its own line between pages.
    Custom(String),
}

impl PageSeparator {
    /// Render the separator string inserted between two pages.
    pub fn render(&self) -> String {
        match self {
            PageSeparator::BlankLine => "\n\n".to_string(),
            PageSeparator::FormFeed => "\n\u{000C}\n".to_string(),
            PageSeparator::Custom(s) => format!("\n{}\n", s),
        }
    }

    /// Parse the CLI spelling: `blank`, `ff`, or any custom string.
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "blank" | "none" | "" => PageSeparator::BlankLine,
            "ff" | "formfeed" => PageSeparator::FormFeed,
            _ => PageSeparator::Custom(s.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_conventional_layout() {
        let c = BatchConfig::default();
        assert_eq!(c.input_dir, PathBuf::from("input"));
        assert_eq!(c.output_dir, PathBuf::from("output"));
        assert_eq!(c.journal_path, PathBuf::from("conversion_errors.log"));
        assert_eq!(c.page_separator, PageSeparator::BlankLine);
    }

    #[test]
    fn output_path_uses_stem_and_txt() {
        let c = BatchConfig::builder().output_dir("out").build().unwrap();
        assert_eq!(c.output_path_for("book"), PathBuf::from("out/book.txt"));
    }

    #[test]
    fn same_input_and_output_rejected() {
        let err = BatchConfig::builder()
            .input_dir("books")
            .output_dir("books")
            .build()
            .unwrap_err();
        assert!(matches!(err, Ebook2TxtError::InvalidConfig(_)));
    }

    #[test]
    fn empty_dir_rejected() {
        let err = BatchConfig::builder().output_dir("").build().unwrap_err();
        assert!(err.to_string().contains("output directory"));
    }

    #[test]
    fn debug_redacts_password() {
        let c = BatchConfig::builder().password("hunter2").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("hunter2"));
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    fn separator_parsing() {
        assert_eq!(PageSeparator::parse("blank"), PageSeparator::BlankLine);
        assert_eq!(PageSeparator::parse("FF"), PageSeparator::FormFeed);
        assert_eq!(
            PageSeparator::parse("* * *"),
            PageSeparator::Custom("* * *".into())
        );
        assert_eq!(PageSeparator::FormFeed.render(), "\n\u{c}\n");
        assert_eq!(PageSeparator::Custom("--".into()).render(), "\n--\n");
    }
}
