//! CLI binary for mistral-pdf2md.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConversionConfig`, runs the batch and prints per-document previews.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use mistral_pdf2md::pipeline::outline::render_entry;
use mistral_pdf2md::{
    extract_outline, inspect, BatchProgressCallback, BatchReport, ConversionConfig, Converter,
    PageSelection, PageSeparator, ProcessedDocument, ProgressCallback, Stage,
};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// TOC entries shown per document after processing.
const TOC_PREVIEW_ENTRIES: usize = 10;
/// Summary lines shown per document after processing.
const SUMMARY_PREVIEW_LINES: usize = 5;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// One bar for the whole batch; the message shows the current document and
/// stage, and finished documents are logged above the bar.
struct CliProgressCallback {
    bar: ProgressBar,
    current: std::sync::Mutex<String>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:32.green/238}] {pos:>3}/{len} documents  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Processing");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            current: std::sync::Mutex::new(String::new()),
            errors: AtomicUsize::new(0),
        })
    }

    fn current_name(&self) -> String {
        self.current
            .lock()
            .map(|name| name.clone())
            .unwrap_or_default()
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_documents: usize) {
        self.bar.set_length(total_documents as u64);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Processing {total_documents} document(s)…"))
        ));
    }

    fn on_document_start(&self, _index: usize, _total: usize, input: &str) {
        if let Ok(mut name) = self.current.lock() {
            *name = display_name(input);
        }
        self.bar.set_message(display_name(input));
    }

    fn on_stage(&self, _index: usize, stage: Stage) {
        self.bar
            .set_message(format!("{}  {}", self.current_name(), dim(&stage.to_string())));
    }

    fn on_document_complete(&self, index: usize, total: usize, outline_len: usize) {
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}",
            green("✓"),
            index + 1,
            total,
            self.current_name(),
            dim(&format!("{outline_len} headings")),
        ));
        self.bar.inc(1);
    }

    fn on_document_error(&self, index: usize, total: usize, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);
        let first_line = error.lines().next().unwrap_or_default();
        let msg = match first_line.char_indices().nth(80) {
            Some((cut, _)) => format!("{}\u{2026}", &first_line[..cut]),
            None => first_line.to_string(),
        };
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}",
            red("✗"),
            index + 1,
            total,
            self.current_name(),
            red(&msg),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_documents: usize, success_count: usize) {
        self.bar.finish_and_clear();
        let failed = self.errors.load(Ordering::SeqCst);
        if failed == 0 {
            eprintln!(
                "{} {} document(s) processed successfully",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} document(s) processed  ({} failed)",
                if success_count == 0 { red("✘") } else { cyan("⚠") },
                bold(&success_count.to_string()),
                total_documents,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r##"EXAMPLES:
  # Convert one document; artifacts land next to it
  pdf2md paper.pdf

  # Several documents into one directory
  pdf2md a.pdf b.pdf c.pdf -o out/

  # Convert from URL (the OCR service fetches it)
  pdf2md https://arxiv.org/pdf/1706.03762 -o attention/

  # Large document, 30 pages per OCR request, pages 1-120 only
  pdf2md --pages 1-120 --pages-per-request 30 book.pdf

  # Markdown and TOC only, no summary request
  pdf2md --no-summary report.pdf

  # Keep extracted figures under <stem>_images/
  pdf2md --include-images slides.pdf

  # Table of contents of an existing Markdown file (no API key needed)
  pdf2md --toc-only notes.md

  # Inspect PDF metadata (no API key needed)
  pdf2md --inspect-only document.pdf

  # Machine-readable batch report
  pdf2md --json a.pdf b.pdf > report.json

OUTPUT FILES (per document <stem>):
  <stem>.md            Full Markdown from OCR
  <stem>_toc.md        "# Table of Contents" + nested bullet list
  <stem>_summary.md    "# Document Summary" + summary text
  <stem>_images/       Extracted images (with --include-images)

ENVIRONMENT VARIABLES:
  MISTRAL_API_KEY       Mistral API key (required for conversion)
  MISTRAL_API_URL       Override the API base URL (default https://api.mistral.ai/v1)
  PDF2MD_OCR_MODEL      OCR model (default mistral-ocr-latest)
  PDF2MD_SUMMARY_MODEL  Chat model for summaries (default mistral-small-latest)
  RUST_LOG              Log filter, e.g. mistral_pdf2md=debug

  A .env file in the working directory is loaded on startup.
"##;

/// Convert PDF files and URLs to Markdown with Mistral OCR, plus a TOC and summary.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2md",
    version,
    about = "Convert PDF files and URLs to Markdown with Mistral OCR, plus TOC and summary",
    long_about = "Convert PDF documents (local files or URLs) to Markdown using the Mistral OCR \
API. For each document a table of contents is built from the Markdown headings and a short \
summary is generated with a Mistral chat model. Documents are processed one after another; \
a failing document does not stop the others.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF paths or HTTP/HTTPS URLs (Markdown files with --toc-only).
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Directory for output files. Default: next to each input.
    #[arg(short, long, env = "PDF2MD_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Mistral API key.
    #[arg(long, env = "MISTRAL_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// API base URL.
    #[arg(long, env = "MISTRAL_API_URL")]
    endpoint: Option<String>,

    /// OCR model ID.
    #[arg(long, env = "PDF2MD_OCR_MODEL")]
    ocr_model: Option<String>,

    /// Chat model ID used for summaries.
    #[arg(long, env = "PDF2MD_SUMMARY_MODEL")]
    summary_model: Option<String>,

    /// Token ceiling for each summary.
    #[arg(long, env = "PDF2MD_SUMMARY_MAX_TOKENS", default_value_t = 500)]
    summary_max_tokens: usize,

    /// Leading characters of Markdown sent for summarization (0 = all).
    #[arg(long, env = "PDF2MD_SUMMARY_CHARS", default_value_t = 4000)]
    summary_chars: usize,

    /// Skip summarization; write only Markdown and TOC.
    #[arg(long, env = "PDF2MD_NO_SUMMARY")]
    no_summary: bool,

    /// Page selection: all, 5, 3-15, or 1,3,5,7.
    #[arg(long, env = "PDF2MD_PAGES", default_value = "all")]
    pages: String,

    /// Split local documents into OCR requests of at most N pages.
    #[arg(long, env = "PDF2MD_PAGES_PER_REQUEST")]
    pages_per_request: Option<usize>,

    /// Page separator: none, hr, comment, footer, or a custom string.
    #[arg(long, env = "PDF2MD_SEPARATOR", default_value = "comment")]
    separator: String,

    /// Save images returned by OCR and link them from the Markdown.
    #[arg(long, env = "PDF2MD_INCLUDE_IMAGES")]
    include_images: bool,

    /// Per-request timeout in seconds.
    #[arg(long, env = "PDF2MD_TIMEOUT", default_value_t = 120)]
    timeout: u64,

    /// Print the table of contents of existing Markdown files; no API calls.
    #[arg(long, conflicts_with = "inspect_only")]
    toc_only: bool,

    /// Print PDF metadata only, no conversion.
    #[arg(long)]
    inspect_only: bool,

    /// Output structured JSON instead of previews.
    #[arg(long, env = "PDF2MD_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF2MD_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2MD_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2MD_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Values from .env act as defaults for the `env =` fallbacks below.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    if cli.toc_only {
        return run_toc_only(&cli).await;
    }
    if cli.inspect_only {
        return run_inspect_only(&cli).await;
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn BatchProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;
    let converter = Converter::from_config(config).context("Failed to set up Mistral clients")?;

    // ── Run batch ────────────────────────────────────────────────────────
    let report = converter
        .process_batch(cli.inputs.as_slice(), cli.output_dir.as_deref())
        .await;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialise report")?
        );
    } else if !cli.quiet {
        print_report(&report);
    }

    if !report.is_success() {
        anyhow::bail!(
            "{} of {} document(s) failed",
            report.failed.len(),
            report.total()
        );
    }
    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let pages = parse_pages(&cli.pages)?;
    let separator = parse_separator(&cli.separator);

    let mut builder = ConversionConfig::builder()
        .summary_max_tokens(cli.summary_max_tokens)
        .summary_char_limit(cli.summary_chars)
        .skip_summary(cli.no_summary)
        .pages(pages)
        .page_separator(separator)
        .include_images(cli.include_images)
        .request_timeout_secs(cli.timeout);

    if let Some(ref key) = cli.api_key {
        builder = builder.api_key(key.clone());
    }
    if let Some(ref url) = cli.endpoint {
        builder = builder.base_url(url.clone());
    }
    if let Some(ref model) = cli.ocr_model {
        builder = builder.ocr_model(model.clone());
    }
    if let Some(ref model) = cli.summary_model {
        builder = builder.summary_model(model.clone());
    }
    if let Some(n) = cli.pages_per_request {
        builder = builder.pages_per_request(n);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

// ── Modes ────────────────────────────────────────────────────────────────────

async fn run_toc_only(cli: &Cli) -> Result<()> {
    let mut failed = 0;
    for input in &cli.inputs {
        let markdown = match tokio::fs::read_to_string(input).await {
            Ok(md) => md,
            Err(e) => {
                eprintln!("{} {}: {}", red("✗"), input, e);
                failed += 1;
                continue;
            }
        };
        let outline = extract_outline(&markdown);
        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&outline).context("Failed to serialise outline")?
            );
        } else {
            if cli.inputs.len() > 1 {
                println!("{}", bold(input));
            }
            print!("{}", outline.render());
        }
    }
    if failed > 0 {
        anyhow::bail!("{failed} file(s) could not be read");
    }
    Ok(())
}

async fn run_inspect_only(cli: &Cli) -> Result<()> {
    for input in &cli.inputs {
        let meta = inspect(input, cli.timeout)
            .await
            .with_context(|| format!("Failed to inspect {input}"))?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&meta).context("Failed to serialize metadata")?
            );
        } else {
            println!("File:         {}", input);
            if let Some(ref t) = meta.title {
                println!("Title:        {}", t);
            }
            if let Some(ref a) = meta.author {
                println!("Author:       {}", a);
            }
            if let Some(ref s) = meta.subject {
                println!("Subject:      {}", s);
            }
            println!("Pages:        {}", meta.page_count);
            println!("PDF Version:  {}", meta.pdf_version);
            println!("Encrypted:    {}", meta.is_encrypted);
            if let Some(ref p) = meta.producer {
                println!("Producer:     {}", p);
            }
            if let Some(ref c) = meta.creator {
                println!("Creator:      {}", c);
            }
        }
    }
    Ok(())
}

// ── Reporting ────────────────────────────────────────────────────────────────

fn print_report(report: &BatchReport) {
    for doc in &report.succeeded {
        print_document(doc);
    }
    for failed in &report.failed {
        println!("{} {}", red("✗"), bold(&failed.input));
        println!("  {}", red(&failed.error));
        println!();
    }
}

fn print_document(doc: &ProcessedDocument) {
    println!("{} {}", green("✓"), bold(&doc.source));
    println!(
        "  {} {}",
        dim("markdown:"),
        doc.files.markdown.display()
    );
    println!("  {} {}", dim("toc:     "), doc.files.toc.display());
    if let Some(ref path) = doc.files.summary {
        println!("  {} {}", dim("summary: "), path.display());
    }
    if let Some(ref path) = doc.files.images_dir {
        println!(
            "  {} {} ({} files)",
            dim("images:  "),
            path.display(),
            doc.stats.images_extracted
        );
    }

    println!();
    println!("  {}", cyan("Table of Contents"));
    if doc.outline.is_empty() {
        println!("  {}", dim("(no headings found)"));
    }
    for entry in doc.outline.iter().take(TOC_PREVIEW_ENTRIES) {
        println!("  {}", render_entry(entry));
    }
    if doc.outline.len() > TOC_PREVIEW_ENTRIES {
        println!(
            "  {}",
            dim(&format!(
                "… {} more entries",
                doc.outline.len() - TOC_PREVIEW_ENTRIES
            ))
        );
    }

    if let Some(ref summary) = doc.summary {
        println!();
        println!("  {}", cyan("Summary"));
        let lines: Vec<&str> = summary.lines().filter(|l| !l.trim().is_empty()).collect();
        for line in lines.iter().take(SUMMARY_PREVIEW_LINES) {
            println!("  {line}");
        }
        if lines.len() > SUMMARY_PREVIEW_LINES {
            println!("  {}", dim("…"));
        }
    }

    println!(
        "\n  {}",
        dim(&format!(
            "{} pages  {} OCR request(s)  {}ms",
            doc.stats.pages_processed, doc.stats.ocr_requests, doc.stats.total_duration_ms
        ))
    );
    println!();
}

/// Short label for progress lines: the file name, or the URL as given.
fn display_name(input: &str) -> String {
    if input.starts_with("http://") || input.starts_with("https://") {
        return input.to_string();
    }
    Path::new(input)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| input.to_string())
}

// ── Argument parsing ─────────────────────────────────────────────────────────

/// Parse `--pages` string into `PageSelection`.
fn parse_pages(s: &str) -> Result<PageSelection> {
    let s = s.trim().to_lowercase();

    if s == "all" {
        return Ok(PageSelection::All);
    }

    // Range: "3-15"
    if let Some((start, end)) = s.split_once('-') {
        let start: usize = start
            .trim()
            .parse()
            .context("Invalid start page in range")?;
        let end: usize = end.trim().parse().context("Invalid end page in range")?;

        if start < 1 {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", start);
        }
        if start > end {
            anyhow::bail!(
                "Invalid page range '{}-{}': start must be <= end",
                start,
                end
            );
        }

        return Ok(PageSelection::Range(start, end));
    }

    // Set: "1,3,5,7"
    if s.contains(',') {
        let pages: Vec<usize> = s
            .split(',')
            .map(|p| {
                p.trim()
                    .parse::<usize>()
                    .with_context(|| format!("Invalid page number: '{}'", p.trim()))
            })
            .collect::<Result<Vec<_>>>()?;

        if let Some(&p) = pages.iter().find(|&&p| p < 1) {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", p);
        }

        return Ok(PageSelection::Set(pages));
    }

    // Single page: "5"
    let page: usize = s.parse().context("Invalid page number")?;
    if page < 1 {
        anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", page);
    }

    Ok(PageSelection::Single(page))
}

/// Parse `--separator` string into `PageSeparator`.
fn parse_separator(s: &str) -> PageSeparator {
    match s.to_lowercase().as_str() {
        "none" => PageSeparator::None,
        "hr" | "---" => PageSeparator::HorizontalRule,
        "comment" => PageSeparator::Comment,
        "footer" => PageSeparator::Footer,
        _ => PageSeparator::Custom(s.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_all_single_range_set() {
        assert_eq!(parse_pages("all").unwrap(), PageSelection::All);
        assert_eq!(parse_pages(" ALL ").unwrap(), PageSelection::All);
        assert_eq!(parse_pages("5").unwrap(), PageSelection::Single(5));
        assert_eq!(parse_pages("3-15").unwrap(), PageSelection::Range(3, 15));
        assert_eq!(
            parse_pages("1, 3,5").unwrap(),
            PageSelection::Set(vec![1, 3, 5])
        );
    }

    #[test]
    fn pages_rejects_bad_input() {
        assert!(parse_pages("0").is_err());
        assert!(parse_pages("5-2").is_err());
        assert!(parse_pages("0-2").is_err());
        assert!(parse_pages("1,x").is_err());
        assert!(parse_pages("abc").is_err());
    }

    #[test]
    fn separators() {
        assert_eq!(parse_separator("none"), PageSeparator::None);
        assert_eq!(parse_separator("HR"), PageSeparator::HorizontalRule);
        assert_eq!(parse_separator("comment"), PageSeparator::Comment);
        assert_eq!(parse_separator("footer"), PageSeparator::Footer);
        assert_eq!(
            parse_separator("* * *"),
            PageSeparator::Custom("* * *".into())
        );
    }

    #[test]
    fn display_name_prefers_file_name() {
        assert_eq!(display_name("docs/a.pdf"), "a.pdf");
        assert_eq!(
            display_name("https://example.com/a.pdf"),
            "https://example.com/a.pdf"
        );
    }

    #[test]
    fn cli_parses_batch_and_flags() {
        let cli = Cli::try_parse_from([
            "pdf2md",
            "a.pdf",
            "b.pdf",
            "-o",
            "out",
            "--no-summary",
            "--pages-per-request",
            "30",
        ])
        .unwrap();
        assert_eq!(cli.inputs, vec!["a.pdf", "b.pdf"]);
        assert_eq!(cli.output_dir, Some(PathBuf::from("out")));
        assert!(cli.no_summary);
        assert_eq!(cli.pages_per_request, Some(30));
    }

    #[test]
    fn help_mentions_artifact_headings() {
        assert!(AFTER_HELP.contains("\"# Table of Contents\""));
        assert!(AFTER_HELP.contains("\"# Document Summary\""));
        assert!(AFTER_HELP.trim_end().ends_with("loaded on startup."));
    }

    #[test]
    fn huge_page_range_is_clipped_to_document() {
        let pages = parse_pages("1-99999999999").unwrap();
        assert_eq!(pages.to_indices(3), vec![0, 1, 2]);
    }
}
