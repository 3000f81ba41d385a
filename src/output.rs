//! Result types produced by the batch dispatcher and the PDF engine.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What happened to one classified input file.
///
/// Exactly one outcome exists per PDF/EPUB/MOBI file in the input directory;
/// files of unknown format never produce one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionOutcome {
    /// Original file name (no directory).
    pub file_name: String,
    pub success: bool,
    /// The reason journaled for a failed conversion.
    pub error: Option<String>,
    /// The `<stem>.txt` written on success.
    pub output: Option<PathBuf>,
    /// Character count of the written text (0 on failure).
    pub chars: usize,
}

impl ConversionOutcome {
    pub fn converted(file_name: impl Into<String>, output: PathBuf, chars: usize) -> Self {
        Self {
            file_name: file_name.into(),
            success: true,
            error: None,
            output: Some(output),
            chars,
        }
    }

    pub fn failed(file_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            success: false,
            error: Some(reason.into()),
            output: None,
            chars: 0,
        }
    }
}

/// Outcomes of a whole batch, in processing order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    pub outcomes: Vec<ConversionOutcome>,
    /// Wall-clock duration of the run.
    pub total_duration_ms: u64,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.success).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.success).count()
    }

    /// Look up the outcome for a file name.
    pub fn outcome(&self, file_name: &str) -> Option<&ConversionOutcome> {
        self.outcomes.iter().find(|o| o.file_name == file_name)
    }
}

/// Document-level metadata read from a PDF's info dictionary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub modification_date: Option<String>,
    pub page_count: usize,
    pub pdf_version: String,
}
