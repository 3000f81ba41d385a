//! Progress-callback trait for per-file batch events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::BatchConfigBuilder::progress_callback`] to receive events
//! as the dispatcher works through the input directory.
//!
//! # Example
//!
//! ```rust
//! use ebook2txt::{BatchConfig, ConversionProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     converted: AtomicUsize,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_file_complete(&self, file_name: &str, index: usize, total: usize, chars: usize) {
//!         self.converted.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{file_name} ({index}/{total}): {chars} chars");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { converted: AtomicUsize::new(0) });
//!
//! let config = BatchConfig::builder()
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the batch dispatcher as it processes each file.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Files are processed one at a time, but the trait is
/// `Send + Sync` so a callback can be shared with other threads (a UI, a
/// channel forwarder).
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once after enumeration, before the first file is converted.
    ///
    /// # Arguments
    /// * `total_files`: number of files with a supported format
    fn on_batch_start(&self, total_files: usize) {
        let _ = total_files;
    }

    /// Called just before a file is handed to its extractor.
    ///
    /// # Arguments
    /// * `file_name`: original file name (no directory)
    /// * `index`: 1-indexed position in the batch
    /// * `total`: number of files in the batch
    fn on_file_start(&self, file_name: &str, index: usize, total: usize) {
        let _ = (file_name, index, total);
    }

    /// Called when a file's text has been written.
    ///
    /// `chars` is the character count of the written text.
    fn on_file_complete(&self, file_name: &str, index: usize, total: usize, chars: usize) {
        let _ = (file_name, index, total, chars);
    }

    /// Called when a file fails; `error` is the reason written to the journal.
    fn on_file_error(&self, file_name: &str, index: usize, total: usize, error: &str) {
        let _ = (file_name, index, total, error);
    }

    /// Called once after every file has been attempted.
    fn on_batch_complete(&self, total_files: usize, success_count: usize) {
        let _ = (total_files, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::BatchConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
