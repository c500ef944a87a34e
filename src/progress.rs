//! Progress-callback trait for per-file batch events.
//!
//! Inject an [`Arc<dyn ConvertProgressCallback>`] via
//! [`crate::config::ConverterConfigBuilder::progress_callback`] to receive
//! events as [`crate::convert::Converter::convert_folder`] works through a
//! batch.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers
//! can forward events to a terminal progress bar, a log aggregator, or a
//! database record without the library knowing anything about how the host
//! application communicates.

use std::sync::Arc;

/// Called by the batch loop as it processes each file.
///
/// Batches run strictly sequentially, so methods are invoked one at a time
/// and in order; the `Send + Sync` bound exists because the callback is
/// stored in a shareable config. All methods have default no-op
/// implementations so callers only override what they care about.
pub trait ConvertProgressCallback: Send + Sync {
    /// Called once before any file is converted.
    ///
    /// # Arguments
    /// * `total_files` — number of matching files found in the input folder
    fn on_batch_start(&self, total_files: usize) {
        let _ = total_files;
    }

    /// Called just before a file's conversion begins.
    ///
    /// # Arguments
    /// * `name`  — file name of the source PDF
    /// * `index` — 1-indexed position within the batch
    /// * `total` — total files in the batch
    fn on_file_start(&self, name: &str, index: usize, total: usize) {
        let _ = (name, index, total);
    }

    /// Called when a file converts successfully.
    ///
    /// `bytes` is the size of the Markdown written, useful for summaries.
    fn on_file_complete(&self, name: &str, index: usize, total: usize, bytes: usize) {
        let _ = (name, index, total, bytes);
    }

    /// Called when a file is skipped because its destination already
    /// exists and overwrite was not requested.
    fn on_file_skipped(&self, name: &str, index: usize, total: usize) {
        let _ = (name, index, total);
    }

    /// Called when a file's conversion fails. The batch continues with the
    /// remaining files.
    fn on_file_error(&self, name: &str, index: usize, total: usize, error: String) {
        let _ = (name, index, total, error);
    }

    /// Called once after every file has been attempted.
    ///
    /// # Arguments
    /// * `total_files` — total files in the batch
    /// * `converted`   — files actually written in this run
    fn on_batch_complete(&self, total_files: usize, converted: usize) {
        let _ = (total_files, converted);
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgressCallback;

impl ConvertProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConverterConfig`].
pub type ProgressCallback = Arc<dyn ConvertProgressCallback>;
