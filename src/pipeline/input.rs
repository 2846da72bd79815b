//! Input resolution: normalise a user-supplied path or URL to a [`DocumentSource`].
//!
//! Local files are read fully into memory and validated against the PDF magic
//! bytes (`%PDF`) so callers get a meaningful error before any network call.
//! URLs are not downloaded for conversion: the OCR endpoint fetches them
//! itself. [`inspect_bytes`] reads page count and the Info dictionary with
//! lopdf, which is how page chunking learns the document length.

use crate::error::Pdf2MdError;
use crate::output::DocumentMetadata;
use lopdf::Document;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Where the document bytes come from.
#[derive(Debug, Clone)]
pub enum DocumentSource {
    /// A local file, already read and validated.
    Local { path: PathBuf, bytes: Vec<u8> },
    /// An HTTP/HTTPS URL forwarded to the OCR endpoint as-is.
    Remote { url: String },
}

impl DocumentSource {
    /// Base name used for output artifacts (`<stem>.md`, `<stem>_toc.md`, …).
    pub fn stem(&self) -> String {
        match self {
            DocumentSource::Local { path, .. } => path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "document".to_string()),
            DocumentSource::Remote { url } => url_stem(url),
        }
    }

    /// Directory artifacts land in when the caller gives none.
    pub fn default_output_dir(&self) -> PathBuf {
        match self {
            DocumentSource::Local { path, .. } => match path.parent() {
                Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
                _ => PathBuf::from("."),
            },
            DocumentSource::Remote { .. } => PathBuf::from("."),
        }
    }

    /// Display form of the input.
    pub fn display(&self) -> String {
        match self {
            DocumentSource::Local { path, .. } => path.display().to_string(),
            DocumentSource::Remote { url } => url.clone(),
        }
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to a [`DocumentSource`].
pub async fn resolve_input(input: &str) -> Result<DocumentSource, Pdf2MdError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(Pdf2MdError::InvalidInput {
            input: input.to_string(),
        });
    }
    if is_url(input) {
        if reqwest::Url::parse(input).is_err() {
            return Err(Pdf2MdError::InvalidInput {
                input: input.to_string(),
            });
        }
        debug!("Remote document: {}", input);
        return Ok(DocumentSource::Remote {
            url: input.to_string(),
        });
    }
    resolve_local(Path::new(input)).await
}

/// Read a local file, validating existence, permissions and PDF magic bytes.
async fn resolve_local(path: &Path) -> Result<DocumentSource, Pdf2MdError> {
    let path = path.to_path_buf();

    let bytes = match tokio::fs::read(&path).await {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(Pdf2MdError::PermissionDenied { path });
        }
        Err(_) => return Err(Pdf2MdError::FileNotFound { path }),
    };

    check_magic(&path, &bytes)?;
    debug!("Resolved local PDF: {} ({} bytes)", path.display(), bytes.len());
    Ok(DocumentSource::Local { path, bytes })
}

fn check_magic(path: &Path, bytes: &[u8]) -> Result<(), Pdf2MdError> {
    if !bytes.starts_with(b"%PDF") {
        let mut magic = [0u8; 4];
        let n = bytes.len().min(4);
        magic[..n].copy_from_slice(&bytes[..n]);
        return Err(Pdf2MdError::NotAPdf {
            path: path.to_path_buf(),
            magic,
        });
    }
    Ok(())
}

/// Fetch a remote PDF into memory. Only `inspect` needs the bytes of a URL.
pub async fn fetch_bytes(url: &str, timeout_secs: u64) -> Result<Vec<u8>, Pdf2MdError> {
    info!("Downloading PDF from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| Pdf2MdError::Internal(format!("HTTP client: {e}")))?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            Pdf2MdError::ApiTimeout {
                service: "download".to_string(),
                secs: timeout_secs,
            }
        } else {
            Pdf2MdError::InvalidInput {
                input: format!("{url} ({e})"),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(Pdf2MdError::InvalidInput {
            input: format!("{url} (HTTP {})", response.status()),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| Pdf2MdError::InvalidInput {
            input: format!("{url} ({e})"),
        })?;
    check_magic(Path::new(url), &bytes)?;
    Ok(bytes.to_vec())
}

/// Read page count and Info-dictionary metadata without converting content.
pub fn inspect_bytes(path: &Path, bytes: &[u8]) -> Result<DocumentMetadata, Pdf2MdError> {
    let doc = Document::load_mem(bytes).map_err(|e| Pdf2MdError::CorruptPdf {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;

    let mut meta = DocumentMetadata {
        page_count: doc.get_pages().len(),
        pdf_version: doc.version.clone(),
        is_encrypted: doc.trailer.get(b"Encrypt").is_ok(),
        ..DocumentMetadata::default()
    };

    let info = doc
        .trailer
        .get(b"Info")
        .and_then(|o| o.as_reference())
        .and_then(|id| doc.get_dictionary(id));
    if let Ok(dict) = info {
        meta.title = info_field(dict, b"Title");
        meta.author = info_field(dict, b"Author");
        meta.subject = info_field(dict, b"Subject");
        meta.creator = info_field(dict, b"Creator");
        meta.producer = info_field(dict, b"Producer");
    }

    Ok(meta)
}

fn info_field(dict: &lopdf::Dictionary, key: &[u8]) -> Option<String> {
    dict.get(key)
        .and_then(|o| o.as_str())
        .ok()
        .map(|s| String::from_utf8_lossy(s).trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Last path segment of a URL without its extension.
fn url_stem(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|mut s| s.next_back().map(str::to_string))
        })
        .filter(|last| !last.is_empty())
        .map(|last| {
            let stem = match last.rsplit_once('.') {
                Some((stem, _)) if !stem.is_empty() => stem,
                _ => last.as_str(),
            };
            stem.to_string()
        })
        .unwrap_or_else(|| "document".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/doc.pdf"));
        assert!(is_url("http://example.com/doc.pdf"));
        assert!(!is_url("/tmp/doc.pdf"));
        assert!(!is_url("doc.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn url_stem_uses_last_segment() {
        assert_eq!(url_stem("https://arxiv.org/pdf/1706.03762"), "1706");
        assert_eq!(url_stem("https://example.com/papers/report.pdf"), "report");
        assert_eq!(url_stem("https://example.com/"), "document");
    }

    #[test]
    fn local_stem_and_output_dir() {
        let src = DocumentSource::Local {
            path: PathBuf::from("papers/report.v2.pdf"),
            bytes: Vec::new(),
        };
        assert_eq!(src.stem(), "report.v2");
        assert_eq!(src.default_output_dir(), PathBuf::from("papers"));

        let bare = DocumentSource::Local {
            path: PathBuf::from("report.pdf"),
            bytes: Vec::new(),
        };
        assert_eq!(bare.default_output_dir(), PathBuf::from("."));
    }

    #[tokio::test]
    async fn missing_file_is_input_error() {
        let err = resolve_input("/definitely/not/here.pdf").await.unwrap_err();
        assert!(matches!(err, Pdf2MdError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn non_pdf_is_rejected() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"PK\x03\x04zip").unwrap();
        let err = resolve_input(tmp.path().to_str().unwrap()).await.unwrap_err();
        assert!(matches!(err, Pdf2MdError::NotAPdf { magic, .. } if &magic == b"PK\x03\x04"));
    }

    #[tokio::test]
    async fn empty_file_is_not_a_pdf() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let err = resolve_input(tmp.path().to_str().unwrap()).await.unwrap_err();
        assert!(matches!(err, Pdf2MdError::NotAPdf { magic, .. } if magic == [0u8; 4]));
    }

    #[tokio::test]
    async fn local_pdf_bytes_are_loaded() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"%PDF-1.4\n%%EOF\n").unwrap();
        let src = resolve_input(tmp.path().to_str().unwrap()).await.unwrap();
        match src {
            DocumentSource::Local { bytes, .. } => assert!(bytes.starts_with(b"%PDF")),
            other => panic!("expected local source, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn url_is_not_downloaded() {
        let src = resolve_input("https://example.com/a.pdf").await.unwrap();
        assert!(matches!(src, DocumentSource::Remote { ref url } if url == "https://example.com/a.pdf"));
    }

    #[test]
    fn inspect_rejects_garbage() {
        let err = inspect_bytes(Path::new("x.pdf"), b"%PDF-1.4 nonsense").unwrap_err();
        assert!(matches!(err, Pdf2MdError::CorruptPdf { .. }));
    }
}
