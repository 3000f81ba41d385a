//! Append-only journal of failed conversions.
//!
//! The file-backed journal is opened in append mode for every entry, so it
//! survives restarts, never truncates earlier runs, and needs no handle held
//! across the batch. Re-running a batch that fails again adds the same lines
//! a second time.

use crate::error::Ebook2TxtError;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One failed conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalEntry {
    pub file_name: String,
    pub reason: String,
}

impl JournalEntry {
    pub fn new(file_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            reason: reason.into(),
        }
    }

    /// Render as `"<file name>: <reason>\n"`.
    ///
    /// Line breaks inside the reason are folded into spaces so one entry
    /// always occupies exactly one line.
    pub fn to_line(&self) -> String {
        let reason = self
            .reason
            .split(['\r', '\n'])
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        format!("{}: {}\n", self.file_name, reason)
    }
}

/// Durable sink for failed conversions.
pub trait ErrorJournal {
    fn record(&mut self, entry: &JournalEntry) -> Result<(), Ebook2TxtError>;
}

/// Journal backed by a UTF-8 text file.
#[derive(Debug, Clone)]
pub struct FileJournal {
    path: PathBuf,
}

impl FileJournal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ErrorJournal for FileJournal {
    fn record(&mut self, entry: &JournalEntry) -> Result<(), Ebook2TxtError> {
        let fail = |source| Ebook2TxtError::JournalWriteFailed {
            path: self.path.clone(),
            source,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(fail)?;
        file.write_all(entry.to_line().as_bytes()).map_err(fail)?;

        debug!("Journaled failure for {} in {}", entry.file_name, self.path.display());
        Ok(())
    }
}

/// In-memory journal, for tests and embedders that report failures themselves.
#[derive(Debug, Clone, Default)]
pub struct MemoryJournal {
    entries: Vec<JournalEntry>,
}

impl MemoryJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    /// The journal as it would appear on disk.
    pub fn lines(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|e| e.to_line().trim_end_matches('\n').to_string())
            .collect()
    }
}

impl ErrorJournal for MemoryJournal {
    fn record(&mut self, entry: &JournalEntry) -> Result<(), Ebook2TxtError> {
        self.entries.push(entry.clone());
        Ok(())
    }
}
