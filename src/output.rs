//! Result types returned by the converter.
//!
//! Every type here is `Serialize` so the CLI's `--json` mode can print them
//! directly. Image payloads never appear in serialised output; only the
//! paths they were written to do.

use crate::error::{ErrorCategory, Pdf2MdError};
use crate::pipeline::outline::Outline;
use serde::Serialize;
use std::path::PathBuf;

/// Document-level metadata read with lopdf, without any OCR.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DocumentMetadata {
    pub page_count: usize,
    pub pdf_version: String,
    pub is_encrypted: bool,
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
}

/// One page as returned by the OCR endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct PageResult {
    /// 1-indexed page number.
    pub page_num: usize,
    pub markdown: String,
    /// Image ids referenced from this page's Markdown.
    pub image_ids: Vec<String>,
}

/// An image extracted by the OCR endpoint, decoded and ready to write.
#[derive(Debug, Clone)]
pub struct ExtractedImage {
    pub id: String,
    pub bytes: Vec<u8>,
}

/// Counters and timings for a single conversion.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConversionStats {
    pub pages_processed: usize,
    /// Number of OCR requests issued (more than one when chunking).
    pub ocr_requests: usize,
    pub doc_size_bytes: Option<u64>,
    pub images_extracted: usize,
    pub ocr_duration_ms: u64,
    pub summary_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Result of converting one document, before anything touches disk.
#[derive(Debug, Clone)]
pub struct ConversionOutput {
    /// Pages joined with the configured separator.
    pub markdown: String,
    pub pages: Vec<PageResult>,
    pub images: Vec<ExtractedImage>,
    pub stats: ConversionStats,
}

/// Paths of the artifacts written for one document.
#[derive(Debug, Clone, Serialize)]
pub struct OutputFiles {
    pub markdown: PathBuf,
    pub toc: PathBuf,
    pub summary: Option<PathBuf>,
    pub images_dir: Option<PathBuf>,
}

/// Everything produced for one successfully processed document.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedDocument {
    /// The input as given by the caller.
    pub source: String,
    pub outline: Outline,
    pub summary: Option<String>,
    pub files: OutputFiles,
    pub stats: ConversionStats,
}

/// A document that failed, with its error flattened for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct FailedDocument {
    pub input: String,
    pub category: ErrorCategory,
    pub error: String,
}

impl FailedDocument {
    pub fn new(input: impl Into<String>, error: &Pdf2MdError) -> Self {
        Self {
            input: input.into(),
            category: error.category(),
            error: error.to_string(),
        }
    }
}

/// Outcome of a batch run. A failed document never aborts the batch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub succeeded: Vec<ProcessedDocument>,
    pub failed: Vec<FailedDocument>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    /// `true` when every document in the batch succeeded.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}
