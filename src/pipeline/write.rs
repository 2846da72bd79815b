//! Artifact writer: the files produced for each processed document.
//!
//! For a document with stem `<stem>` the output directory receives
//!
//! ```text
//! <stem>.md            full Markdown
//! <stem>_toc.md        rendered table of contents
//! <stem>_summary.md    "# Document Summary" + summary text
//! <stem>_images/<id>   extracted images (only with include_images)
//! ```
//!
//! Every file is written to a temp file in the target directory and then
//! renamed into place, so a crash never leaves a half-written artifact.
//! Filesystem work is blocking and runs under `spawn_blocking`.

use crate::error::Pdf2MdError;
use crate::output::ExtractedImage;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Heading at the top of every summary artifact.
pub const SUMMARY_HEADING: &str = "# Document Summary";

static RE_LINK_TARGET: Lazy<Regex> = Lazy::new(|| Regex::new(r"\]\(([^)\s]+)\)").unwrap());

/// Paths of every artifact a document may produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub markdown: PathBuf,
    pub toc: PathBuf,
    pub summary: PathBuf,
    pub images_dir: PathBuf,
}

impl ArtifactPaths {
    pub fn new(dir: &Path, stem: &str) -> Self {
        Self {
            markdown: dir.join(format!("{stem}.md")),
            toc: dir.join(format!("{stem}_toc.md")),
            summary: dir.join(format!("{stem}_summary.md")),
            images_dir: dir.join(images_dir_name(stem)),
        }
    }
}

/// Name of the image directory relative to the Markdown file.
pub fn images_dir_name(stem: &str) -> String {
    format!("{stem}_images")
}

/// Body of the summary artifact.
pub fn summary_document(summary: &str) -> String {
    format!("{SUMMARY_HEADING}\n\n{summary}")
}

/// Point `](id)` links for known image ids at `<images_dir>/<id>`.
///
/// Links to anything else are left alone.
pub fn rewrite_image_links(markdown: &str, ids: &[String], images_dir: &str) -> String {
    if ids.is_empty() {
        return markdown.to_string();
    }
    let known: HashSet<&str> = ids.iter().map(String::as_str).collect();
    RE_LINK_TARGET
        .replace_all(markdown, |caps: &Captures<'_>| {
            let target = &caps[1];
            if known.contains(target) {
                format!("]({images_dir}/{target})")
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}

/// Write `contents` to `path` through a sibling temp file and rename.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), Pdf2MdError> {
    let fail = |source: std::io::Error| Pdf2MdError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(fail)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(fail)?;
    tmp.write_all(contents).map_err(fail)?;
    tmp.as_file().sync_all().map_err(fail)?;
    tmp.persist(path).map_err(|e| fail(e.error))?;
    debug!("Wrote {} ({} bytes)", path.display(), contents.len());
    Ok(())
}

/// Save decoded images into `dir`, one file per image id.
///
/// Ids that would escape `dir` are skipped with a warning.
pub fn save_images(dir: &Path, images: &[ExtractedImage]) -> Result<usize, Pdf2MdError> {
    let mut saved = 0;
    for image in images {
        let Some(name) = Path::new(&image.id).file_name() else {
            warn!("Skipping image with unusable id '{}'", image.id);
            continue;
        };
        if name != image.id.as_str() {
            warn!("Skipping image with unusable id '{}'", image.id);
            continue;
        }
        write_atomic(&dir.join(name), &image.bytes)?;
        saved += 1;
    }
    Ok(saved)
}

/// Write the Markdown, TOC and images for one document.
///
/// Returns the number of images saved.
pub async fn write_document(
    paths: &ArtifactPaths,
    markdown: String,
    toc: String,
    images: Vec<ExtractedImage>,
) -> Result<usize, Pdf2MdError> {
    let paths = paths.clone();
    run_blocking(move || {
        write_atomic(&paths.markdown, markdown.as_bytes())?;
        write_atomic(&paths.toc, toc.as_bytes())?;
        if images.is_empty() {
            Ok(0)
        } else {
            save_images(&paths.images_dir, &images)
        }
    })
    .await
}

/// Write the summary artifact.
pub async fn write_summary(path: &Path, summary: &str) -> Result<(), Pdf2MdError> {
    let path = path.to_path_buf();
    let body = summary_document(summary);
    run_blocking(move || write_atomic(&path, body.as_bytes())).await
}

async fn run_blocking<T, F>(f: F) -> Result<T, Pdf2MdError>
where
    F: FnOnce() -> Result<T, Pdf2MdError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Pdf2MdError::Internal(format!("write task panicked: {e}")))?
}
