//! Document encoding: raw PDF bytes → base64 data URI for the OCR request.
//!
//! The OCR endpoint takes the document inside the JSON body as a
//! `document_url`. A `data:` URI lets a local file travel the same field a
//! remote URL would, so the request shape does not depend on the input kind.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::debug;

/// MIME type declared for every uploaded document.
pub const PDF_MIME: &str = "application/pdf";

/// Base64-encode the raw document bytes (standard alphabet, padded).
pub fn encode_document(bytes: &[u8]) -> String {
    let b64 = STANDARD.encode(bytes);
    debug!("Encoded document → {} bytes base64", b64.len());
    b64
}

/// Wrap the document in a `data:application/pdf;base64,…` URI.
pub fn to_data_uri(bytes: &[u8]) -> String {
    format!("data:{PDF_MIME};base64,{}", encode_document(bytes))
}

/// Decode the payload of a `data:<mime>;base64,<payload>` URI, or a bare
/// base64 string. Used for images returned by the OCR endpoint.
pub fn decode_data_uri(data: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let payload = match data.split_once(";base64,") {
        Some((_, payload)) => payload,
        None => data,
    };
    STANDARD.decode(payload.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_known_bytes() {
        assert_eq!(encode_document(b"test pdf content"), "dGVzdCBwZGYgY29udGVudA==");
    }

    #[test]
    fn data_uri_has_pdf_prefix() {
        let uri = to_data_uri(b"%PDF-1.7");
        assert!(uri.starts_with("data:application/pdf;base64,"));
        assert_eq!(decode_data_uri(&uri).unwrap(), b"%PDF-1.7");
    }

    #[test]
    fn decodes_bare_base64() {
        assert_eq!(decode_data_uri("aGVsbG8=").unwrap(), b"hello");
    }

    #[test]
    fn rejects_garbage() {
        assert!(decode_data_uri("data:image/png;base64,@@@").is_err());
    }
}
