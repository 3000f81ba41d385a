//! Batch dispatcher: convert every e-book in a directory, one at a time.
//!
//! Files are processed in file-name order. A failure of one file (bad
//! container, decode error, unwritable output, even a panicking extractor)
//! is journaled and the batch moves on. Only run-level problems stop it:
//! an unreadable input directory, an output directory that cannot be
//! created, or a journal that cannot be appended to.

use crate::config::BatchConfig;
use crate::error::Ebook2TxtError;
use crate::extract::{Extractor, ExtractorSet};
use crate::format::{list_sources, SourceDocument};
use crate::journal::{ErrorJournal, FileJournal, JournalEntry};
use crate::output::{BatchReport, ConversionOutcome};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Converts a directory of e-books, journaling failures to `J`.
pub struct BatchDispatcher<J: ErrorJournal = FileJournal> {
    config: BatchConfig,
    extractors: ExtractorSet,
    journal: J,
}

impl BatchDispatcher<FileJournal> {
    /// Standard extractors, journal at `config.journal_path`.
    pub fn new(config: BatchConfig) -> Self {
        let journal = FileJournal::new(config.journal_path.clone());
        let extractors = ExtractorSet::standard(&config);
        Self::with_parts(config, extractors, journal)
    }
}

impl<J: ErrorJournal> BatchDispatcher<J> {
    pub fn with_parts(config: BatchConfig, extractors: ExtractorSet, journal: J) -> Self {
        Self {
            config,
            extractors,
            journal,
        }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    pub fn journal(&self) -> &J {
        &self.journal
    }

    pub fn into_journal(self) -> J {
        self.journal
    }

    /// Convert every supported file in the input directory.
    ///
    /// # Errors
    /// Per-file failures never surface here; they are in the report and the
    /// journal. Returns `Err` only for `InputDirUnreadable`,
    /// `OutputDirFailed` and `JournalWriteFailed`.
    pub async fn run(&mut self) -> Result<BatchReport, Ebook2TxtError> {
        let total_start = Instant::now();

        // ── Step 1: Enumerate and classify ───────────────────────────────
        let sources = list_sources(&self.config.input_dir).await?;
        let (supported, unknown): (Vec<SourceDocument>, Vec<SourceDocument>) = sources
            .into_iter()
            .partition(|source| source.format().is_supported());
        for source in &unknown {
            debug!("Skipping {}: unsupported format", source.file_name());
        }

        // ── Step 2: Prepare output ───────────────────────────────────────
        tokio::fs::create_dir_all(&self.config.output_dir)
            .await
            .map_err(|source| Ebook2TxtError::OutputDirFailed {
                path: self.config.output_dir.clone(),
                source,
            })?;

        let total = supported.len();
        info!(
            "Converting {} files from {} to {}",
            total,
            self.config.input_dir.display(),
            self.config.output_dir.display()
        );

        let progress = self.config.progress_callback.clone();
        if let Some(ref cb) = progress {
            cb.on_batch_start(total);
        }

        // ── Step 3: Convert sequentially ─────────────────────────────────
        let mut outcomes = Vec::with_capacity(total);
        let mut written: HashSet<PathBuf> = HashSet::new();

        for (i, source) in supported.iter().enumerate() {
            let index = i + 1;
            let name = source.file_name();
            info!("Processing {} ({}/{}, {})", name, index, total, source.format());
            if let Some(ref cb) = progress {
                cb.on_file_start(&name, index, total);
            }

            match self.convert_one(source).await {
                Ok((output, chars)) => {
                    info!("Successfully converted {} ({} chars)", name, chars);
                    if !written.insert(output.clone()) {
                        warn!(
                            "{} overwrote {} written earlier in this batch",
                            name,
                            output.display()
                        );
                    }
                    if let Some(ref cb) = progress {
                        cb.on_file_complete(&name, index, total, chars);
                    }
                    outcomes.push(ConversionOutcome::converted(name, output, chars));
                }
                Err(e) => {
                    let reason = e.to_string();
                    error!("Error converting {}: {}", name, reason);
                    self.journal.record(&JournalEntry::new(name.as_str(), reason.as_str()))?;
                    if let Some(ref cb) = progress {
                        cb.on_file_error(&name, index, total, &reason);
                    }
                    outcomes.push(ConversionOutcome::failed(name, reason));
                }
            }
        }

        let report = BatchReport {
            outcomes,
            total_duration_ms: total_start.elapsed().as_millis() as u64,
        };

        info!(
            "Batch complete: {}/{} converted, {} failed, {}ms",
            report.succeeded(),
            report.total(),
            report.failed(),
            report.total_duration_ms
        );
        if let Some(ref cb) = progress {
            cb.on_batch_complete(report.total(), report.succeeded());
        }

        Ok(report)
    }

    /// Extract one file and write `<stem>.txt`.
    async fn convert_one(
        &self,
        source: &SourceDocument,
    ) -> Result<(PathBuf, usize), Ebook2TxtError> {
        let extractor = self.extractors.for_format(source.format()).ok_or_else(|| {
            Ebook2TxtError::UnsupportedFormat {
                path: source.path().to_path_buf(),
            }
        })?;

        let text = extract_blocking(extractor, source.path()).await?;
        let output = self.config.output_path_for(source.stem());
        write_atomic(&output, &text).await?;

        Ok((output, text.chars().count()))
    }
}

/// Run an extractor on the blocking thread pool.
///
/// A panic inside the extractor becomes [`Ebook2TxtError::Internal`].
pub(crate) async fn extract_blocking(
    extractor: Arc<dyn Extractor>,
    path: &Path,
) -> Result<String, Ebook2TxtError> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || extractor.extract(&path))
        .await
        .map_err(|e| Ebook2TxtError::Internal(format!("Extraction task panicked: {}", e)))?
}

/// Write `text` to `path` via a sibling temp file and a rename, so a reader
/// never sees a partial file.
pub(crate) async fn write_atomic(path: &Path, text: &str) -> Result<(), Ebook2TxtError> {
    let fail = |source| Ebook2TxtError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let tmp_path = path.with_extension("txt.tmp");
    if let Err(e) = tokio::fs::write(&tmp_path, text).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(fail(e));
    }

    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(fail(e));
    }
    Ok(())
}
