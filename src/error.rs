//! Error types for the mistral-pdf2md library.
//!
//! A single enum, [`Pdf2MdError`], covers every failure surface. Variants are
//! grouped by where they originate, and [`Pdf2MdError::category`] folds them
//! into the coarse [`ErrorCategory`] that callers use to decide policy:
//!
//! * **Configuration** — fatal, raised before any document is touched.
//! * **Input** — the document itself is missing, unreadable or not a PDF.
//! * **Service** — the OCR or summarization call failed.
//! * **Output** — an artifact could not be written.
//!
//! Outline extraction has no error type: it cannot fail.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification of a [`Pdf2MdError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Configuration,
    Input,
    Service,
    Output,
    Internal,
}

/// All errors returned by the mistral-pdf2md library.
#[derive(Debug, Error)]
pub enum Pdf2MdError {
    // ── Configuration errors ──────────────────────────────────────────────
    /// No API key was supplied and none was found in the environment.
    #[error("Mistral API key is missing.\nSet MISTRAL_API_KEY or pass --api-key <KEY>.")]
    MissingApiKey,

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The summarization provider could not be constructed.
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is neither a usable path nor an HTTP/HTTPS URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// lopdf could not parse the document structure.
    #[error("PDF '{path}' could not be parsed: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// Selected page numbers exceed the actual page count.
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    // ── Service errors ────────────────────────────────────────────────────
    /// The OCR endpoint answered with a non-success status.
    #[error("OCR API returned HTTP {status}: {body}")]
    OcrApiError { status: u16, body: String },

    /// The OCR request never produced a response (DNS, TLS, connection reset).
    #[error("OCR request failed: {0}")]
    OcrRequestFailed(String),

    /// The remote service rejected the credentials (401/403).
    #[error("Authentication error from {service}: {detail}\nCheck that MISTRAL_API_KEY is valid.")]
    AuthError { service: String, detail: String },

    /// HTTP 429 from the remote service.
    ///
    /// `retry_after_secs` carries the server-specified delay when present.
    /// Nothing in this crate retries; the caller decides.
    #[error("Rate limit exceeded for {service}")]
    RateLimitExceeded {
        service: String,
        retry_after_secs: Option<u64>,
    },

    /// The remote call exceeded the configured request timeout.
    #[error("{service} call timed out after {secs}s\nIncrease --timeout.")]
    ApiTimeout { service: String, secs: u64 },

    /// The response body did not match the expected schema.
    #[error("Malformed response from {service}: {detail}")]
    MalformedResponse { service: String, detail: String },

    /// The summarization provider returned an error.
    #[error("Summary generation failed: {0}")]
    SummaryFailed(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output artifact.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Pdf2MdError {
    /// Classify this error for policy decisions (abort vs. continue a batch).
    pub fn category(&self) -> ErrorCategory {
        use Pdf2MdError::*;
        match self {
            MissingApiKey | InvalidConfig(_) | ProviderNotConfigured { .. } => {
                ErrorCategory::Configuration
            }
            FileNotFound { .. }
            | PermissionDenied { .. }
            | InvalidInput { .. }
            | NotAPdf { .. }
            | CorruptPdf { .. }
            | PageOutOfRange { .. } => ErrorCategory::Input,
            OcrApiError { .. }
            | OcrRequestFailed(_)
            | AuthError { .. }
            | RateLimitExceeded { .. }
            | ApiTimeout { .. }
            | MalformedResponse { .. }
            | SummaryFailed(_) => ErrorCategory::Service,
            OutputWriteFailed { .. } => ErrorCategory::Output,
            Internal(_) => ErrorCategory::Internal,
        }
    }

    /// `true` when processing further documents cannot succeed either.
    pub fn is_fatal(&self) -> bool {
        self.category() == ErrorCategory::Configuration
    }
}
