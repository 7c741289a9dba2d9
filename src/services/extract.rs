//! Text extraction from uploaded bytes.
//!
//! Dispatch is by filename suffix first, declared media type second.
//! Recognized text formats decode as UTF-8; PDF pages are extracted and
//! concatenated in document order. Anything else gets a best-effort
//! UTF-8 decode before being rejected as unsupported.

use tracing::debug;

use crate::error::ExtractError;
use crate::utils::has_meaningful_content;

/// Filename suffixes decoded directly as UTF-8 text.
const TEXT_SUFFIXES: &[&str] = &[".txt", ".md", ".markdown", ".csv"];

/// Produce normalized UTF-8 text from raw uploaded bytes.
///
/// Fails with [`ExtractError::UnsupportedFormat`] when the bytes are
/// neither a recognized format nor valid UTF-8, and with
/// [`ExtractError::EmptyDocument`] when extraction yields nothing but
/// whitespace; ingestion must never silently produce zero chunks.
pub fn extract_text(
    bytes: &[u8],
    filename: &str,
    media_type: &str,
) -> Result<String, ExtractError> {
    let filename_lower = filename.to_lowercase();

    let text = if filename_lower.ends_with(".pdf") || media_type.contains("pdf") {
        extract_pdf(bytes)?
    } else if TEXT_SUFFIXES.iter().any(|s| filename_lower.ends_with(s))
        || media_type.starts_with("text/")
    {
        decode_utf8(bytes, media_type)?
    } else {
        // Unknown type: accept it if it happens to be valid text
        decode_utf8(bytes, media_type)?
    };

    if !has_meaningful_content(&text) {
        return Err(ExtractError::EmptyDocument);
    }

    debug!(filename, chars = text.chars().count(), "extracted text");
    Ok(text)
}

fn decode_utf8(bytes: &[u8], media_type: &str) -> Result<String, ExtractError> {
    String::from_utf8(bytes.to_vec())
        .map_err(|_| ExtractError::UnsupportedFormat(media_type.to_string()))
}

/// Pages are concatenated in document order; `pdf-extract` separates
/// them with newlines.
fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_passthrough() {
        let text = extract_text(b"hello world", "notes.txt", "text/plain").unwrap();
        assert_eq!(text, "hello world");
    }

    #[test]
    fn test_markdown_and_csv_suffixes() {
        assert!(extract_text(b"# Title", "readme.md", "application/octet-stream").is_ok());
        assert!(extract_text(b"a,b,c", "data.csv", "application/octet-stream").is_ok());
    }

    #[test]
    fn test_unknown_type_valid_utf8_is_accepted() {
        let text = extract_text(b"plain enough", "log.weird", "application/x-custom").unwrap();
        assert_eq!(text, "plain enough");
    }

    #[test]
    fn test_unknown_type_invalid_utf8_is_unsupported() {
        let err = extract_text(&[0xff, 0xfe, 0x00, 0x01], "blob.bin", "application/x-custom")
            .unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_empty_document_rejected() {
        let err = extract_text(b"", "empty.txt", "text/plain").unwrap_err();
        assert!(matches!(err, ExtractError::EmptyDocument));

        let err = extract_text(b"   \n\t  \n", "blank.txt", "text/plain").unwrap_err();
        assert!(matches!(err, ExtractError::EmptyDocument));
    }

    #[test]
    fn test_invalid_pdf_reports_pdf_error() {
        let err = extract_text(b"not a pdf", "broken.pdf", "application/pdf").unwrap_err();
        assert!(matches!(err, ExtractError::Pdf(_)));
    }
}
