//! Document processing entry points.
//!
//! [`Converter`] owns the configuration plus the two remote capabilities
//! (OCR and summarization) and drives every document through the same
//! sequence:
//!
//! ```text
//! resolve ─▶ OCR ─▶ outline ─▶ write .md + _toc.md ─▶ summarize ─▶ write _summary.md
//! ```
//!
//! The Markdown and TOC are written before the summary request goes out, so
//! a failing summary still leaves them on disk. Documents in a batch run one
//! after another; a failure is recorded in the [`BatchReport`] and the next
//! document is attempted.

use crate::config::ConversionConfig;
use crate::error::Pdf2MdError;
use crate::output::{
    BatchReport, ConversionOutput, ConversionStats, DocumentMetadata, ExtractedImage,
    FailedDocument, OutputFiles, PageResult, ProcessedDocument,
};
use crate::pipeline::encode::decode_data_uri;
use crate::pipeline::input::{self, DocumentSource};
use crate::pipeline::ocr::{plan_requests, MistralOcrClient, OcrPage, OcrProvider};
use crate::pipeline::outline::{self, Outline};
use crate::pipeline::summary::{truncate_chars, LlmSummarizer, Summarizer};
use crate::pipeline::write::{self, ArtifactPaths};
use crate::progress::Stage;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Converts documents and writes their artifacts.
///
/// # Example
/// ```rust,no_run
/// use mistral_pdf2md::{ConversionConfig, Converter};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ConversionConfig::from_env().build()?;
/// let converter = Converter::from_config(config)?;
/// let doc = converter.process_document("paper.pdf", None).await?;
/// for entry in &doc.outline {
///     println!("{} {}", "#".repeat(entry.level()), entry.title());
/// }
/// # Ok(())
/// # }
/// ```
pub struct Converter {
    config: ConversionConfig,
    ocr: Arc<dyn OcrProvider>,
    summarizer: Arc<dyn Summarizer>,
}

impl Converter {
    /// Build a converter around caller-supplied capabilities.
    pub fn new(
        config: ConversionConfig,
        ocr: Arc<dyn OcrProvider>,
        summarizer: Arc<dyn Summarizer>,
    ) -> Self {
        Self {
            config,
            ocr,
            summarizer,
        }
    }

    /// Build a converter that talks to the Mistral API.
    ///
    /// With `skip_summary` set no chat provider is created at all.
    pub fn from_config(config: ConversionConfig) -> Result<Self, Pdf2MdError> {
        let ocr: Arc<dyn OcrProvider> = Arc::new(MistralOcrClient::new(&config)?);
        let summarizer: Arc<dyn Summarizer> = if config.skip_summary {
            Arc::new(SummaryDisabled)
        } else {
            Arc::new(LlmSummarizer::from_config(&config)?)
        };
        Ok(Self::new(config, ocr, summarizer))
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// OCR one document into Markdown without writing anything.
    pub async fn convert_document(&self, input: &str) -> Result<ConversionOutput, Pdf2MdError> {
        let source = input::resolve_input(input).await?;
        self.convert_source(&source).await
    }

    /// Blocking wrapper around [`Converter::convert_document`].
    pub fn convert_sync(&self, input: &str) -> Result<ConversionOutput, Pdf2MdError> {
        tokio::runtime::Runtime::new()
            .map_err(|e| Pdf2MdError::Internal(format!("Failed to create tokio runtime: {}", e)))?
            .block_on(self.convert_document(input))
    }

    /// Heading outline of `markdown`. Never fails.
    pub fn extract_outline(&self, markdown: &str) -> Outline {
        outline::extract_outline(markdown)
    }

    /// Summarise `markdown`, sending at most `summary_char_limit` characters.
    pub async fn summarize(&self, markdown: &str) -> Result<String, Pdf2MdError> {
        let text = match self.config.summary_char_limit {
            Some(limit) => truncate_chars(markdown, limit),
            None => markdown,
        };
        debug!(
            "Summarizing {} of {} characters",
            text.chars().count(),
            markdown.chars().count()
        );
        self.summarizer
            .summarize(text, self.config.summary_max_tokens)
            .await
    }

    /// Convert one document and write its artifacts.
    ///
    /// Artifacts go to `output_dir`, or next to a local input (the current
    /// directory for URLs) when `None`.
    pub async fn process_document(
        &self,
        input: &str,
        output_dir: Option<&Path>,
    ) -> Result<ProcessedDocument, Pdf2MdError> {
        self.run_one(0, 1, input, output_dir).await
    }

    /// Blocking wrapper around [`Converter::process_document`].
    ///
    /// Creates a temporary tokio runtime; do not call from async code.
    pub fn process_document_sync(
        &self,
        input: &str,
        output_dir: Option<&Path>,
    ) -> Result<ProcessedDocument, Pdf2MdError> {
        tokio::runtime::Runtime::new()
            .map_err(|e| Pdf2MdError::Internal(format!("Failed to create tokio runtime: {}", e)))?
            .block_on(self.process_document(input, output_dir))
    }

    /// Process `inputs` one after another. A failed document is recorded and
    /// the batch moves on.
    pub async fn process_batch<S: AsRef<str>>(
        &self,
        inputs: &[S],
        output_dir: Option<&Path>,
    ) -> BatchReport {
        let total = inputs.len();
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_batch_start(total);
        }

        let mut report = BatchReport::default();
        for (index, input) in inputs.iter().enumerate() {
            let input = input.as_ref();
            match self.run_one(index, total, input, output_dir).await {
                Ok(doc) => report.succeeded.push(doc),
                Err(e) => {
                    error!("Failed to process {}: {}", input, e);
                    report.failed.push(FailedDocument::new(input, &e));
                }
            }
        }

        info!(
            "Batch complete: {}/{} documents succeeded",
            report.succeeded.len(),
            total
        );
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_batch_complete(total, report.succeeded.len());
        }
        report
    }

    // ── Internals ────────────────────────────────────────────────────────

    async fn run_one(
        &self,
        index: usize,
        total: usize,
        input: &str,
        output_dir: Option<&Path>,
    ) -> Result<ProcessedDocument, Pdf2MdError> {
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_document_start(index, total, input);
        }
        let result = self.process_inner(index, input, output_dir).await;
        if let Some(ref cb) = self.config.progress_callback {
            match &result {
                Ok(doc) => cb.on_document_complete(index, total, doc.outline.len()),
                Err(e) => cb.on_document_error(index, total, &e.to_string()),
            }
        }
        result
    }

    async fn process_inner(
        &self,
        index: usize,
        input: &str,
        output_dir: Option<&Path>,
    ) -> Result<ProcessedDocument, Pdf2MdError> {
        let total_start = Instant::now();
        info!("Processing: {}", input);

        // ── Step 1: Resolve + OCR ────────────────────────────────────────
        self.stage(index, Stage::Converting);
        let source = input::resolve_input(input).await?;
        let mut output = self.convert_source(&source).await?;

        // ── Step 2: Outline ──────────────────────────────────────────────
        self.stage(index, Stage::ExtractingOutline);
        let outline = self.extract_outline(&output.markdown);
        info!(
            "Extracted {} headings (max depth {})",
            outline.len(),
            outline.max_depth()
        );

        // ── Step 3: Markdown + TOC ───────────────────────────────────────
        self.stage(index, Stage::Writing);
        let dir = output_dir
            .map(Path::to_path_buf)
            .unwrap_or_else(|| source.default_output_dir());
        let paths = ArtifactPaths::new(&dir, &source.stem());
        let images = std::mem::take(&mut output.images);
        let saved = write::write_document(
            &paths,
            output.markdown.clone(),
            outline.render(),
            images,
        )
        .await?;

        let mut files = OutputFiles {
            markdown: paths.markdown.clone(),
            toc: paths.toc.clone(),
            summary: None,
            images_dir: (saved > 0).then(|| paths.images_dir.clone()),
        };
        let mut stats = output.stats;
        stats.images_extracted = saved;

        // ── Step 4: Summary ──────────────────────────────────────────────
        let summary = if self.config.skip_summary {
            debug!("Summary skipped for {}", source.display());
            None
        } else {
            self.stage(index, Stage::Summarizing);
            let summary_start = Instant::now();
            let summary = self.summarize(&output.markdown).await?;
            stats.summary_duration_ms = summary_start.elapsed().as_millis() as u64;

            self.stage(index, Stage::Writing);
            write::write_summary(&paths.summary, &summary).await?;
            files.summary = Some(paths.summary.clone());
            Some(summary)
        };

        stats.total_duration_ms = total_start.elapsed().as_millis() as u64;
        info!(
            "Finished {} in {}ms → {}",
            source.display(),
            stats.total_duration_ms,
            files.markdown.display()
        );

        Ok(ProcessedDocument {
            source: input.to_string(),
            outline,
            summary,
            files,
            stats,
        })
    }

    async fn convert_source(&self, source: &DocumentSource) -> Result<ConversionOutput, Pdf2MdError> {
        let requests = plan_requests(source, &self.config)?;

        let ocr_start = Instant::now();
        let mut ocr_pages: Vec<OcrPage> = Vec::new();
        let mut doc_size_bytes = None;
        for (i, request) in requests.iter().enumerate() {
            debug!("OCR request {}/{}", i + 1, requests.len());
            let result = self.ocr.process(request).await?;
            if doc_size_bytes.is_none() {
                doc_size_bytes = result.usage.and_then(|u| u.doc_size_bytes);
            }
            ocr_pages.extend(result.pages);
        }
        let ocr_duration_ms = ocr_start.elapsed().as_millis() as u64;

        let dropped = sort_and_dedup_pages(&mut ocr_pages);
        if dropped > 0 {
            warn!(
                "OCR returned {} duplicate page(s) for {}; kept the first copy of each",
                dropped,
                source.display()
            );
        }
        if ocr_pages.is_empty() {
            warn!("OCR returned no pages for {}", source.display());
        }

        let images_dir = write::images_dir_name(&source.stem());
        let mut images = Vec::new();
        let pages: Vec<PageResult> = ocr_pages
            .into_iter()
            .map(|page| {
                let image_ids = if self.config.include_images {
                    collect_images(&page, &mut images)
                } else {
                    Vec::new()
                };
                let markdown = write::rewrite_image_links(&page.markdown, &image_ids, &images_dir);
                PageResult {
                    page_num: page.index + 1,
                    markdown,
                    image_ids,
                }
            })
            .collect();

        let markdown = self
            .config
            .page_separator
            .join(pages.iter().map(|p| (p.page_num, p.markdown.as_str())));

        info!(
            "OCR complete: {} pages in {} request(s), {}ms",
            pages.len(),
            requests.len(),
            ocr_duration_ms
        );

        Ok(ConversionOutput {
            markdown,
            stats: ConversionStats {
                pages_processed: pages.len(),
                ocr_requests: requests.len(),
                doc_size_bytes,
                images_extracted: images.len(),
                ocr_duration_ms,
                ..ConversionStats::default()
            },
            pages,
            images,
        })
    }

    fn stage(&self, index: usize, stage: Stage) {
        debug!("Document {}: {}", index, stage);
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_stage(index, stage);
        }
    }
}

/// Order pages by index and drop repeated indices, keeping the first copy.
/// Returns how many pages were dropped.
fn sort_and_dedup_pages(pages: &mut Vec<OcrPage>) -> usize {
    let before = pages.len();
    pages.sort_by_key(|p| p.index);
    pages.dedup_by_key(|p| p.index);
    before - pages.len()
}

/// Decode the images of `page` into `out`; returns the ids that decoded.
fn collect_images(page: &OcrPage, out: &mut Vec<ExtractedImage>) -> Vec<String> {
    let mut ids = Vec::new();
    for image in &page.images {
        let Some(ref data) = image.image_base64 else {
            continue;
        };
        match decode_data_uri(data) {
            Ok(bytes) => {
                ids.push(image.id.clone());
                out.push(ExtractedImage {
                    id: image.id.clone(),
                    bytes,
                });
            }
            Err(e) => warn!(
                "Page {}: could not decode image '{}': {}",
                page.index + 1,
                image.id,
                e
            ),
        }
    }
    ids
}

/// Read page count and metadata without converting content.
///
/// Does not require an API key. URLs are downloaded for this.
pub async fn inspect(input: &str, timeout_secs: u64) -> Result<DocumentMetadata, Pdf2MdError> {
    let (path, bytes) = match input::resolve_input(input).await? {
        DocumentSource::Local { path, bytes } => (path, bytes),
        DocumentSource::Remote { url } => {
            let bytes = input::fetch_bytes(&url, timeout_secs).await?;
            (url.into(), bytes)
        }
    };
    tokio::task::spawn_blocking(move || input::inspect_bytes(&path, &bytes))
        .await
        .map_err(|e| Pdf2MdError::Internal(format!("inspect task panicked: {e}")))?
}

/// Stand-in used when summaries are switched off.
struct SummaryDisabled;

#[async_trait]
impl Summarizer for SummaryDisabled {
    async fn summarize(&self, _text: &str, _max_tokens: usize) -> Result<String, Pdf2MdError> {
        Err(Pdf2MdError::InvalidConfig(
            "summarization is disabled for this converter".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ocr::OcrImage;

    fn page(index: usize, images: Vec<OcrImage>) -> OcrPage {
        OcrPage {
            index,
            markdown: String::new(),
            images,
            dimensions: None,
        }
    }

    #[test]
    fn duplicate_pages_are_counted_and_dropped() {
        let mut pages = vec![page(2, vec![]), page(0, vec![]), page(2, vec![]), page(1, vec![])];
        pages[0].markdown = "first".into();
        pages[2].markdown = "second".into();

        assert_eq!(sort_and_dedup_pages(&mut pages), 1);
        let indices: Vec<_> = pages.iter().map(|p| p.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(pages[2].markdown, "first");

        assert_eq!(sort_and_dedup_pages(&mut pages), 0);
    }

    #[test]
    fn images_without_payload_are_ignored() {
        let mut out = Vec::new();
        let p = page(
            0,
            vec![OcrImage {
                id: "img-0.jpeg".into(),
                image_base64: None,
            }],
        );
        assert!(collect_images(&p, &mut out).is_empty());
        assert!(out.is_empty());
    }

    #[test]
    fn undecodable_images_are_skipped() {
        let mut out = Vec::new();
        let p = page(
            2,
            vec![
                OcrImage {
                    id: "good.png".into(),
                    image_base64: Some("data:image/png;base64,aGVsbG8=".into()),
                },
                OcrImage {
                    id: "bad.png".into(),
                    image_base64: Some("data:image/png;base64,@@".into()),
                },
            ],
        );
        let ids = collect_images(&p, &mut out);
        assert_eq!(ids, vec!["good.png".to_string()]);
        assert_eq!(out[0].bytes, b"hello");
    }

    #[tokio::test]
    async fn disabled_summarizer_refuses() {
        let err = SummaryDisabled.summarize("x", 10).await.unwrap_err();
        assert!(matches!(err, Pdf2MdError::InvalidConfig(_)));
    }
}
