//! Progress-callback trait for per-document processing events.
//!
//! Inject an [`Arc<dyn BatchProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to follow a
//! batch as each document moves through its stages. The library never prints;
//! the CLI forwards these events to an indicatif progress bar.
//!
//! # Example
//!
//! ```rust
//! use mistral_pdf2md::{BatchProgressCallback, ConversionConfig, Stage};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct StageCounter {
//!     stages: AtomicUsize,
//! }
//!
//! impl BatchProgressCallback for StageCounter {
//!     fn on_stage(&self, _index: usize, _stage: Stage) {
//!         self.stages.fetch_add(1, Ordering::SeqCst);
//!     }
//! }
//!
//! let counter = Arc::new(StageCounter { stages: AtomicUsize::new(0) });
//! let config = ConversionConfig::builder()
//!     .api_key("sk-test")
//!     .progress_callback(counter as Arc<dyn BatchProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// The processing stage a document has entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Remote OCR request(s) in flight.
    Converting,
    /// Heading scan over the returned Markdown.
    ExtractingOutline,
    /// Remote summarisation request in flight.
    Summarizing,
    /// Artifacts being written to disk.
    Writing,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Converting => "converting",
            Stage::ExtractingOutline => "extracting outline",
            Stage::Summarizing => "summarizing",
            Stage::Writing => "writing",
        };
        f.write_str(s)
    }
}

/// Called by the converter as it processes documents.
///
/// Documents are processed one at a time, so callbacks never overlap for a
/// single converter. Implementations still need `Send + Sync` because the
/// config holding them is shared across tasks. Every method has a no-op
/// default.
///
/// `index` is the 0-based position of the document within the batch; a
/// single-document call reports index 0 of 1.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once before the first document.
    fn on_batch_start(&self, total_documents: usize) {
        let _ = total_documents;
    }

    /// Called when a document is picked up.
    fn on_document_start(&self, index: usize, total: usize, input: &str) {
        let _ = (index, total, input);
    }

    /// Called when a document enters a new stage.
    fn on_stage(&self, index: usize, stage: Stage) {
        let _ = (index, stage);
    }

    /// Called when a document finished with all artifacts written.
    ///
    /// * `outline_len` — number of headings extracted
    fn on_document_complete(&self, index: usize, total: usize, outline_len: usize) {
        let _ = (index, total, outline_len);
    }

    /// Called when a document failed; the batch moves on.
    fn on_document_error(&self, index: usize, total: usize, error: &str) {
        let _ = (index, total, error);
    }

    /// Called once after every document has been attempted.
    fn on_batch_complete(&self, total_documents: usize, success_count: usize) {
        let _ = (total_documents, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;
