//! Configuration types for OCR conversion, outline extraction and summaries.
//!
//! All behaviour is controlled through [`ConversionConfig`], built via its
//! [`ConversionConfigBuilder`]. The API key is an explicit value on the
//! config: [`ConversionConfigBuilder::build`] refuses to produce a config
//! without one, so a missing credential surfaces at startup rather than on
//! the first network call.

use crate::error::Pdf2MdError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Default Mistral REST base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.mistral.ai/v1";
/// Default OCR model.
pub const DEFAULT_OCR_MODEL: &str = "mistral-ocr-latest";
/// Default chat model used for summaries.
pub const DEFAULT_SUMMARY_MODEL: &str = "mistral-small-latest";
/// Number of leading Markdown characters sent for summarisation by default.
pub const DEFAULT_SUMMARY_CHAR_LIMIT: usize = 4000;

/// Configuration for converting and summarising documents.
///
/// # Example
/// ```rust
/// use mistral_pdf2md::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .api_key("sk-test")
///     .summary_max_tokens(300)
///     .pages_per_request(30)
///     .build()
///     .unwrap();
/// assert_eq!(config.summary_max_tokens, 300);
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Mistral API key. Always `Some` on a config returned by `build()`.
    pub api_key: Option<String>,

    /// REST base URL, without trailing slash. Default: [`DEFAULT_BASE_URL`].
    pub base_url: String,

    /// OCR model identifier. Default: `mistral-ocr-latest`.
    pub ocr_model: String,

    /// Chat model used for the summary. Default: `mistral-small-latest`.
    pub summary_model: String,

    /// Pre-constructed chat provider for summaries. Takes precedence over
    /// `summary_model` when set.
    pub summary_provider: Option<Arc<dyn LLMProvider>>,

    /// Token ceiling for the generated summary. Default: 500.
    pub summary_max_tokens: usize,

    /// Only the first N characters of the Markdown are sent for summarisation.
    /// `None` sends the whole document. Default: `Some(4000)`.
    pub summary_char_limit: Option<usize>,

    /// Sampling temperature for the summary completion. Default: 0.3.
    pub temperature: f32,

    /// Per-request timeout for remote calls in seconds. Default: 120.
    pub request_timeout_secs: u64,

    /// Page selection forwarded to the OCR endpoint. Default: all pages.
    pub pages: PageSelection,

    /// Split local documents into OCR requests of at most this many pages.
    /// `None` sends the whole selection in one request. Default: `None`.
    pub pages_per_request: Option<usize>,

    /// How pages are joined in the assembled Markdown. Default: [`PageSeparator::Comment`].
    pub page_separator: PageSeparator,

    /// Ask the OCR endpoint for embedded images and save them next to the
    /// Markdown. Default: false.
    pub include_images: bool,

    /// Skip the summarisation request and the summary artifact. Default: false.
    pub skip_summary: bool,

    /// Optional per-document progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            ocr_model: DEFAULT_OCR_MODEL.to_string(),
            summary_model: DEFAULT_SUMMARY_MODEL.to_string(),
            summary_provider: None,
            summary_max_tokens: 500,
            summary_char_limit: Some(DEFAULT_SUMMARY_CHAR_LIMIT),
            temperature: 0.3,
            request_timeout_secs: 120,
            pages: PageSelection::default(),
            pages_per_request: None,
            page_separator: PageSeparator::default(),
            include_images: false,
            skip_summary: false,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("ocr_model", &self.ocr_model)
            .field("summary_model", &self.summary_model)
            .field(
                "summary_provider",
                &self.summary_provider.as_ref().map(|_| "<dyn LLMProvider>"),
            )
            .field("summary_max_tokens", &self.summary_max_tokens)
            .field("summary_char_limit", &self.summary_char_limit)
            .field("temperature", &self.temperature)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("pages", &self.pages)
            .field("pages_per_request", &self.pages_per_request)
            .field("page_separator", &self.page_separator)
            .field("include_images", &self.include_images)
            .field("skip_summary", &self.skip_summary)
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Builder pre-seeded from the process environment.
    ///
    /// Reads `MISTRAL_API_KEY`, `MISTRAL_API_URL`, `PDF2MD_OCR_MODEL` and
    /// `PDF2MD_SUMMARY_MODEL`. Empty values are ignored.
    pub fn from_env() -> ConversionConfigBuilder {
        let mut builder = Self::builder();
        if let Some(key) = non_empty_env("MISTRAL_API_KEY") {
            builder = builder.api_key(key);
        }
        if let Some(url) = non_empty_env("MISTRAL_API_URL") {
            builder = builder.base_url(url);
        }
        if let Some(model) = non_empty_env("PDF2MD_OCR_MODEL") {
            builder = builder.ocr_model(model);
        }
        if let Some(model) = non_empty_env("PDF2MD_SUMMARY_MODEL") {
            builder = builder.summary_model(model);
        }
        builder
    }

    /// The validated API key. Empty only on hand-assembled configs.
    pub fn api_key(&self) -> &str {
        self.api_key.as_deref().unwrap_or_default()
    }

    /// Full URL of the OCR endpoint.
    pub fn ocr_url(&self) -> String {
        format!("{}/ocr", self.base_url)
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn ocr_model(mut self, model: impl Into<String>) -> Self {
        self.config.ocr_model = model.into();
        self
    }

    pub fn summary_model(mut self, model: impl Into<String>) -> Self {
        self.config.summary_model = model.into();
        self
    }

    pub fn summary_provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.summary_provider = Some(provider);
        self
    }

    pub fn summary_max_tokens(mut self, n: usize) -> Self {
        self.config.summary_max_tokens = n.max(1);
        self
    }

    /// `0` means no limit.
    pub fn summary_char_limit(mut self, chars: usize) -> Self {
        self.config.summary_char_limit = (chars > 0).then_some(chars);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs.max(1);
        self
    }

    pub fn pages(mut self, selection: PageSelection) -> Self {
        self.config.pages = selection;
        self
    }

    pub fn pages_per_request(mut self, n: usize) -> Self {
        self.config.pages_per_request = Some(n);
        self
    }

    pub fn page_separator(mut self, sep: PageSeparator) -> Self {
        self.config.page_separator = sep;
        self
    }

    pub fn include_images(mut self, v: bool) -> Self {
        self.config.include_images = v;
        self
    }

    pub fn skip_summary(mut self, v: bool) -> Self {
        self.config.skip_summary = v;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Pdf2MdError> {
        let c = &self.config;
        match c.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => {}
            _ => return Err(Pdf2MdError::MissingApiKey),
        }
        if !(c.base_url.starts_with("http://") || c.base_url.starts_with("https://")) {
            return Err(Pdf2MdError::InvalidConfig(format!(
                "base URL must be http(s), got '{}'",
                c.base_url
            )));
        }
        if c.ocr_model.trim().is_empty() {
            return Err(Pdf2MdError::InvalidConfig("OCR model must not be empty".into()));
        }
        if c.pages_per_request == Some(0) {
            return Err(Pdf2MdError::InvalidConfig(
                "pages per request must be ≥ 1".into(),
            ));
        }
        if let PageSelection::Range(start, end) = c.pages {
            if start == 0 || start > end {
                return Err(Pdf2MdError::InvalidConfig(format!(
                    "invalid page range {start}-{end}"
                )));
            }
            if start > MAX_PAGE_NUMBER {
                return Err(Pdf2MdError::InvalidConfig(format!(
                    "page range {start}-{end} starts past page {MAX_PAGE_NUMBER}"
                )));
            }
        }
        Ok(self.config)
    }
}

/// Highest page the OCR service accepts in one document. Open-ended ranges
/// are capped here when the page count is unknown.
pub const MAX_PAGE_NUMBER: usize = 1000;

// ── Enums ────────────────────────────────────────────────────────────────

/// Specifies which pages of the PDF to send for OCR.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSelection {
    /// All pages (default).
    #[default]
    All,
    /// A single page (1-indexed).
    Single(usize),
    /// A contiguous range of pages (1-indexed, inclusive).
    Range(usize, usize),
    /// Specific pages (1-indexed, deduplicated).
    Set(Vec<usize>),
}

impl PageSelection {
    /// Expand the selection into a sorted, deduplicated list of 0-indexed
    /// page numbers, clipped to `total_pages`.
    pub fn to_indices(&self, total_pages: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = match self {
            PageSelection::All => (0..total_pages).collect(),
            PageSelection::Range(start, end) => {
                ((*start).max(1) - 1..(*end).min(total_pages)).collect()
            }
            _ => self
                .explicit_indices()
                .unwrap_or_default()
                .into_iter()
                .filter(|&i| i < total_pages)
                .collect(),
        };
        indices.sort_unstable();
        indices.dedup();
        indices
    }

    /// 0-indexed pages named by the selection when the page count is unknown
    /// (e.g. URL inputs). `None` for [`PageSelection::All`].
    pub fn explicit_indices(&self) -> Option<Vec<usize>> {
        let mut indices: Vec<usize> = match self {
            PageSelection::All => return None,
            PageSelection::Single(p) => (*p >= 1).then(|| p - 1).into_iter().collect(),
            PageSelection::Range(start, end) => {
                ((*start).max(1) - 1..(*end).min(MAX_PAGE_NUMBER)).collect()
            }
            PageSelection::Set(pages) => pages.iter().filter(|&&p| p >= 1).map(|p| p - 1).collect(),
        };
        indices.sort_unstable();
        indices.dedup();
        Some(indices)
    }
}

/// How pages are laid out in the assembled Markdown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSeparator {
    /// Pages joined with a blank line.
    None,
    /// Horizontal rule between pages: "\n\n---\n\n".
    HorizontalRule,
    /// `<!-- Page N -->` marker before every page. (default)
    #[default]
    Comment,
    /// `Page N` footer followed by a rule after every page.
    Footer,
    /// Custom string inserted between pages.
    Custom(String),
}

impl PageSeparator {
    /// Join per-page Markdown. `pages` holds `(page_num, markdown)` with
    /// 1-indexed page numbers, already in document order.
    pub fn join<'a, I>(&self, pages: I) -> String
    where
        I: IntoIterator<Item = (usize, &'a str)>,
    {
        let mut out = String::new();
        for (i, (page_num, markdown)) in pages.into_iter().enumerate() {
            match self {
                PageSeparator::Comment => {
                    if i > 0 {
                        out.push('\n');
                    }
                    out.push_str(&format!("<!-- Page {page_num} -->\n{markdown}\n"));
                }
                PageSeparator::Footer => {
                    out.push_str(markdown);
                    out.push_str(&format!("\n\nPage {page_num}\n\n---\n\n"));
                }
                PageSeparator::None | PageSeparator::HorizontalRule | PageSeparator::Custom(_) => {
                    if i > 0 {
                        out.push_str(&self.between());
                    }
                    out.push_str(markdown);
                }
            }
        }
        out
    }

    fn between(&self) -> String {
        match self {
            PageSeparator::HorizontalRule => "\n\n---\n\n".to_string(),
            PageSeparator::Custom(s) => format!("\n\n{}\n\n", s),
            _ => "\n\n".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_without_key_is_configuration_error() {
        let err = ConversionConfig::builder().build().unwrap_err();
        assert!(matches!(err, Pdf2MdError::MissingApiKey));
    }

    #[test]
    fn blank_key_is_rejected() {
        let err = ConversionConfig::builder().api_key("   ").build().unwrap_err();
        assert!(matches!(err, Pdf2MdError::MissingApiKey));
    }

    #[test]
    fn defaults_follow_documented_values() {
        let c = ConversionConfig::builder().api_key("k").build().unwrap();
        assert_eq!(c.ocr_model, "mistral-ocr-latest");
        assert_eq!(c.summary_model, "mistral-small-latest");
        assert_eq!(c.summary_max_tokens, 500);
        assert_eq!(c.summary_char_limit, Some(4000));
        assert_eq!(c.request_timeout_secs, 120);
        assert_eq!(c.ocr_url(), "https://api.mistral.ai/v1/ocr");
        assert_eq!(c.page_separator, PageSeparator::Comment);
    }

    #[test]
    fn debug_redacts_key() {
        let c = ConversionConfig::builder().api_key("sk-secret").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("sk-secret"));
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let c = ConversionConfig::builder()
            .api_key("k")
            .base_url("http://localhost:8080/v1/")
            .build()
            .unwrap();
        assert_eq!(c.ocr_url(), "http://localhost:8080/v1/ocr");
    }

    #[test]
    fn zero_pages_per_request_rejected() {
        let err = ConversionConfig::builder()
            .api_key("k")
            .pages_per_request(0)
            .build()
            .unwrap_err();
        assert!(matches!(err, Pdf2MdError::InvalidConfig(_)));
    }

    #[test]
    fn zero_char_limit_means_unbounded() {
        let c = ConversionConfig::builder()
            .api_key("k")
            .summary_char_limit(0)
            .build()
            .unwrap();
        assert_eq!(c.summary_char_limit, None);
    }

    #[test]
    fn page_selection_to_indices() {
        assert_eq!(PageSelection::All.to_indices(3), vec![0, 1, 2]);
        assert_eq!(PageSelection::Single(2).to_indices(3), vec![1]);
        assert!(PageSelection::Single(9).to_indices(3).is_empty());
        assert_eq!(PageSelection::Range(2, 10).to_indices(4), vec![1, 2, 3]);
        assert_eq!(PageSelection::Set(vec![3, 1, 3]).to_indices(5), vec![0, 2]);
    }

    #[test]
    fn open_ended_range_is_clipped_without_expanding() {
        assert_eq!(PageSelection::Range(1, usize::MAX).to_indices(3), vec![0, 1, 2]);
        assert!(PageSelection::Range(7, usize::MAX).to_indices(3).is_empty());
        let capped = PageSelection::Range(1, usize::MAX).explicit_indices().unwrap();
        assert_eq!(capped.len(), MAX_PAGE_NUMBER);
        assert_eq!(capped.last(), Some(&(MAX_PAGE_NUMBER - 1)));
    }

    #[test]
    fn range_starting_past_page_limit_rejected() {
        let err = ConversionConfig::builder()
            .api_key("k")
            .pages(PageSelection::Range(MAX_PAGE_NUMBER + 1, usize::MAX))
            .build()
            .unwrap_err();
        assert!(matches!(err, Pdf2MdError::InvalidConfig(_)));
        assert!(ConversionConfig::builder()
            .api_key("k")
            .pages(PageSelection::Range(1, usize::MAX))
            .build()
            .is_ok());
    }

    #[test]
    fn explicit_indices_without_page_count() {
        assert_eq!(PageSelection::All.explicit_indices(), None);
        assert_eq!(PageSelection::Range(1, 3).explicit_indices(), Some(vec![0, 1, 2]));
        assert_eq!(PageSelection::Set(vec![0, 4]).explicit_indices(), Some(vec![3]));
    }

    #[test]
    fn comment_separator_marks_every_page() {
        let md = PageSeparator::Comment.join([(1, "# A"), (2, "B")]);
        assert_eq!(md, "<!-- Page 1 -->\n# A\n\n<!-- Page 2 -->\nB\n");
    }

    #[test]
    fn footer_separator_follows_every_page() {
        let md = PageSeparator::Footer.join([(3, "text")]);
        assert_eq!(md, "text\n\nPage 3\n\n---\n\n");
    }

    #[test]
    fn rule_and_custom_separators_only_between_pages() {
        assert_eq!(PageSeparator::HorizontalRule.join([(1, "a"), (2, "b")]), "a\n\n---\n\nb");
        assert_eq!(PageSeparator::None.join([(1, "a"), (2, "b")]), "a\n\nb");
        assert_eq!(
            PageSeparator::Custom("***".into()).join([(1, "a"), (2, "b")]),
            "a\n\n***\n\nb"
        );
    }
}
