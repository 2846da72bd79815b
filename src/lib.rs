//! # mistral-pdf2md
//!
//! Convert PDF documents to Markdown with Mistral OCR, then derive a heading
//! outline (table of contents) and a short summary from the result.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF (path or URL)
//!  │
//!  ├─ 1. Input    read + validate a local file, or pass the URL through
//!  ├─ 2. OCR      POST /v1/ocr, optionally in page chunks
//!  ├─ 3. Outline  scan the Markdown for `#` headings (local, cannot fail)
//!  ├─ 4. Write    <stem>.md + <stem>_toc.md (+ <stem>_images/)
//!  ├─ 5. Summary  chat completion over the first N characters
//!  └─ 6. Write    <stem>_summary.md
//! ```
//!
//! Documents are processed one at a time. When a batch is given, a failing
//! document is reported and the rest still run.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mistral_pdf2md::{ConversionConfig, Converter};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads MISTRAL_API_KEY (and optional overrides) from the environment
//!     let config = ConversionConfig::from_env().build()?;
//!     let converter = Converter::from_config(config)?;
//!     let report = converter.process_batch(&["a.pdf", "b.pdf"], None).await;
//!     for doc in &report.succeeded {
//!         println!("{}: {} headings", doc.source, doc.outline.len());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Outline extraction on its own needs no network:
//!
//! ```rust
//! use mistral_pdf2md::extract_outline;
//!
//! let outline = extract_outline("# Intro\ntext\n## Background");
//! assert_eq!(outline.len(), 2);
//! assert_eq!(outline.entries()[1].level(), 2);
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2md` binary (clap + anyhow + tracing-subscriber + indicatif + dotenvy) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! mistral-pdf2md = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, PageSelection, PageSeparator};
pub use convert::{inspect, Converter};
pub use error::{ErrorCategory, Pdf2MdError};
pub use output::{
    BatchReport, ConversionOutput, ConversionStats, DocumentMetadata, ExtractedImage,
    FailedDocument, OutputFiles, PageResult, ProcessedDocument,
};
pub use pipeline::input::DocumentSource;
pub use pipeline::ocr::{MistralOcrClient, OcrProvider, OcrRequest, OcrResult};
pub use pipeline::outline::{extract_outline, HeadingEntry, Outline};
pub use pipeline::summary::{LlmSummarizer, Summarizer};
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback, Stage};
