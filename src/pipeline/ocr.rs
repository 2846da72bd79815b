//! Remote OCR: the document goes out, per-page Markdown comes back.
//!
//! [`OcrProvider`] is the seam between the converter and the network. The
//! production implementation, [`MistralOcrClient`], posts to Mistral's
//! `/v1/ocr` endpoint; tests substitute an in-memory provider.
//!
//! ## Request layout
//!
//! ```json
//! {
//!   "model": "mistral-ocr-latest",
//!   "document": { "type": "document_url", "document_url": "data:application/pdf;base64,…" },
//!   "pages": [0, 1, 2],
//!   "include_image_base64": false
//! }
//! ```
//!
//! `pages` is omitted when the whole document is wanted. Large local
//! documents can be split into several requests of at most
//! `pages_per_request` pages each; see [`plan_requests`].

use crate::config::{ConversionConfig, PageSelection};
use crate::error::Pdf2MdError;
use crate::pipeline::encode::to_data_uri;
use crate::pipeline::input::{inspect_bytes, DocumentSource};
use crate::pipeline::summary::truncate_chars;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Service label used in error messages.
pub const OCR_SERVICE: &str = "mistral-ocr";

/// Longest error body kept from a failed response.
const MAX_ERROR_BODY_CHARS: usize = 500;

// ── Wire types ───────────────────────────────────────────────────────────

/// Body of a `POST /v1/ocr` request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OcrRequest {
    pub model: String,
    pub document: DocumentChunk,
    /// 0-indexed pages to process; `None` means all.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<Vec<usize>>,
    pub include_image_base64: bool,
}

/// The `document` field of an [`OcrRequest`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DocumentChunk {
    /// A `data:` URI carrying the bytes, or a public HTTP(S) URL.
    DocumentUrl { document_url: String },
}

/// Parsed `POST /v1/ocr` response.
#[derive(Debug, Clone, Deserialize)]
pub struct OcrResult {
    pub pages: Vec<OcrPage>,
    #[serde(default)]
    pub model: String,
    #[serde(default, rename = "usage_info")]
    pub usage: Option<UsageInfo>,
}

/// One page of OCR output.
#[derive(Debug, Clone, Deserialize)]
pub struct OcrPage {
    /// 0-indexed page number within the source document.
    pub index: usize,
    #[serde(default)]
    pub markdown: String,
    #[serde(default)]
    pub images: Vec<OcrImage>,
    #[serde(default)]
    pub dimensions: Option<PageDimensions>,
}

/// An image the OCR endpoint cut out of a page.
///
/// `image_base64` is only present when the request set
/// `include_image_base64`; the Markdown refers to the image by `id`.
#[derive(Debug, Clone, Deserialize)]
pub struct OcrImage {
    pub id: String,
    #[serde(default)]
    pub image_base64: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageDimensions {
    pub dpi: u32,
    pub height: u32,
    pub width: u32,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct UsageInfo {
    pub pages_processed: usize,
    #[serde(default)]
    pub doc_size_bytes: Option<u64>,
}

// ── Provider seam ────────────────────────────────────────────────────────

/// Anything that can turn an [`OcrRequest`] into per-page Markdown.
#[async_trait]
pub trait OcrProvider: Send + Sync {
    /// Run one OCR request. Implementations must not retry internally.
    async fn process(&self, request: &OcrRequest) -> Result<OcrResult, Pdf2MdError>;
}

/// HTTP client for Mistral's OCR endpoint.
pub struct MistralOcrClient {
    client: reqwest::Client,
    url: String,
    api_key: String,
    timeout_secs: u64,
}

impl MistralOcrClient {
    /// Build a client from a validated config.
    pub fn new(config: &ConversionConfig) -> Result<Self, Pdf2MdError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| Pdf2MdError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: config.ocr_url(),
            api_key: config.api_key().to_string(),
            timeout_secs: config.request_timeout_secs,
        })
    }
}

#[async_trait]
impl OcrProvider for MistralOcrClient {
    async fn process(&self, request: &OcrRequest) -> Result<OcrResult, Pdf2MdError> {
        debug!(
            "POST {} model={} pages={:?}",
            self.url, request.model, request.pages
        );

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Pdf2MdError::ApiTimeout {
                        service: OCR_SERVICE.to_string(),
                        secs: self.timeout_secs,
                    }
                } else {
                    Pdf2MdError::OcrRequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok());
            let body = response.text().await.unwrap_or_default();
            warn!("OCR request failed with HTTP {}", status);
            return Err(status_error(status, &body, retry_after));
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                Pdf2MdError::ApiTimeout {
                    service: OCR_SERVICE.to_string(),
                    secs: self.timeout_secs,
                }
            } else {
                Pdf2MdError::OcrRequestFailed(e.to_string())
            }
        })?;
        parse_response(&body)
    }
}

/// Map a non-success HTTP status to the matching error variant.
pub fn status_error(status: StatusCode, body: &str, retry_after: Option<u64>) -> Pdf2MdError {
    let body = truncate_chars(body.trim(), MAX_ERROR_BODY_CHARS).to_string();
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Pdf2MdError::AuthError {
            service: OCR_SERVICE.to_string(),
            detail: format!("HTTP {}: {}", status.as_u16(), body),
        },
        StatusCode::TOO_MANY_REQUESTS => Pdf2MdError::RateLimitExceeded {
            service: OCR_SERVICE.to_string(),
            retry_after_secs: retry_after,
        },
        _ => Pdf2MdError::OcrApiError {
            status: status.as_u16(),
            body,
        },
    }
}

/// Parse a response body, rejecting anything without a `pages` array.
pub fn parse_response(body: &str) -> Result<OcrResult, Pdf2MdError> {
    serde_json::from_str::<OcrResult>(body).map_err(|e| Pdf2MdError::MalformedResponse {
        service: OCR_SERVICE.to_string(),
        detail: e.to_string(),
    })
}

// ── Request planning ─────────────────────────────────────────────────────

/// Build the OCR requests for one document.
///
/// Returns a single request unless `pages_per_request` is set, in which case
/// the selected pages are split into consecutive chunks. The page count of a
/// local document is read with lopdf only when a selection or chunking needs
/// it. Remote documents can be chunked only when the selection names its
/// pages explicitly, since their length is unknown.
pub fn plan_requests(
    source: &DocumentSource,
    config: &ConversionConfig,
) -> Result<Vec<OcrRequest>, Pdf2MdError> {
    let (document_url, selected) = match source {
        DocumentSource::Local { path, bytes } => {
            let needs_count =
                config.pages_per_request.is_some() || config.pages != PageSelection::All;
            let selected = if needs_count {
                let total = inspect_bytes(path, bytes)?.page_count;
                let indices = config.pages.to_indices(total);
                if indices.is_empty() {
                    let page = config
                        .pages
                        .explicit_indices()
                        .and_then(|v| v.first().copied())
                        .map_or(0, |i| i + 1);
                    return Err(Pdf2MdError::PageOutOfRange { page, total });
                }
                Some(indices)
            } else {
                None
            };
            (to_data_uri(bytes), selected)
        }
        DocumentSource::Remote { url } => {
            let selected = config.pages.explicit_indices();
            if matches!(&selected, Some(v) if v.is_empty()) {
                return Err(Pdf2MdError::PageOutOfRange { page: 0, total: 0 });
            }
            (url.clone(), selected)
        }
    };

    let request = |pages: Option<Vec<usize>>| OcrRequest {
        model: config.ocr_model.clone(),
        document: DocumentChunk::DocumentUrl {
            document_url: document_url.clone(),
        },
        pages,
        include_image_base64: config.include_images,
    };

    let requests = match (config.pages_per_request, selected) {
        (Some(chunk), Some(indices)) if indices.len() > chunk => indices
            .chunks(chunk)
            .map(|c| request(Some(c.to_vec())))
            .collect(),
        (_, selected) => vec![request(selected)],
    };

    if requests.len() > 1 {
        info!(
            "Splitting {} into {} OCR requests",
            source.display(),
            requests.len()
        );
    }
    Ok(requests)
}
