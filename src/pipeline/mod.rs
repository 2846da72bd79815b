//! Pipeline stages for PDF-to-Markdown conversion.
//!
//! Each submodule implements exactly one step, so each is testable on its own
//! and the two network-facing stages sit behind traits.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ encode ──▶ ocr ──▶ outline ──▶ write ──▶ summary ──▶ write
//! (path/URL) (data URI) (HTTP)  (headings)  (md+toc)   (chat)     (summary)
//! ```
//!
//! 1. [`input`]   — read and validate a local PDF, or pass a URL through
//! 2. [`encode`]  — base64-wrap local bytes as a `data:` URI
//! 3. [`ocr`]     — one or more requests to the OCR endpoint
//! 4. [`outline`] — scan the Markdown for headings; pure and infallible
//! 5. [`write`]   — atomic artifact writes
//! 6. [`summary`] — chat completion over a bounded prefix of the Markdown

pub mod encode;
pub mod input;
pub mod ocr;
pub mod outline;
pub mod summary;
pub mod write;
