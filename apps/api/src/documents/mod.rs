//! Document-to-text adapter for uploaded resumes.
//!
//! PDFs are extracted page by page and joined with blank lines; anything else is
//! read as UTF-8 text.

use thiserror::Error;
use tracing::debug;

pub mod handlers;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("document is empty")]
    Empty,

    #[error("failed to extract text from PDF: {0}")]
    Pdf(String),

    #[error("document is not valid UTF-8 text")]
    Encoding(#[from] std::string::FromUtf8Error),
}

const PDF_MAGIC: &[u8] = b"%PDF";

/// True when the upload should go through the PDF extractor.
pub fn is_pdf(file_name: &str, content_type: Option<&str>, bytes: &[u8]) -> bool {
    content_type == Some("application/pdf")
        || file_name.to_ascii_lowercase().ends_with(".pdf")
        || bytes.starts_with(PDF_MAGIC)
}

/// Extracts plain text from an uploaded document.
pub fn extract_text(
    file_name: &str,
    content_type: Option<&str>,
    bytes: &[u8],
) -> Result<String, DocumentError> {
    if bytes.is_empty() {
        return Err(DocumentError::Empty);
    }

    let text = if is_pdf(file_name, content_type, bytes) {
        let pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
            .map_err(|e| DocumentError::Pdf(e.to_string()))?;
        debug!("Extracted {} PDF pages from {}", pages.len(), file_name);
        join_pages(&pages)
    } else {
        String::from_utf8(bytes.to_vec())?
    };

    if text.trim().is_empty() {
        return Err(DocumentError::Empty);
    }
    Ok(text)
}

/// Each page is followed by a blank line.
fn join_pages(pages: &[String]) -> String {
    pages.iter().fold(String::new(), |mut out, page| {
        out.push_str(page.trim_end());
        out.push_str("\n\n");
        out
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_passthrough() {
        let text = extract_text("resume.txt", Some("text/plain"), b"Jane Doe\nRust engineer").unwrap();
        assert_eq!(text, "Jane Doe\nRust engineer");
    }

    #[test]
    fn test_empty_upload_is_rejected() {
        assert!(matches!(
            extract_text("resume.txt", None, b""),
            Err(DocumentError::Empty)
        ));
        assert!(matches!(
            extract_text("resume.txt", None, b"   \n"),
            Err(DocumentError::Empty)
        ));
    }

    #[test]
    fn test_invalid_utf8_is_rejected() {
        let err = extract_text("resume.txt", None, &[0xff, 0xfe, 0x00]).unwrap_err();
        assert!(matches!(err, DocumentError::Encoding(_)));
    }

    #[test]
    fn test_pdf_detection() {
        assert!(is_pdf("cv.PDF", None, b""));
        assert!(is_pdf("upload", Some("application/pdf"), b""));
        assert!(is_pdf("upload", None, b"%PDF-1.7"));
        assert!(!is_pdf("cv.txt", Some("text/plain"), b"hello"));
    }

    #[test]
    fn test_corrupt_pdf_surfaces_extraction_error() {
        let err = extract_text("cv.pdf", Some("application/pdf"), b"%PDF-1.4 garbage").unwrap_err();
        assert!(matches!(err, DocumentError::Pdf(_)));
    }

    #[test]
    fn test_join_pages_separates_with_blank_lines() {
        let pages = vec!["Page one  ".to_string(), "Page two".to_string()];
        assert_eq!(join_pages(&pages), "Page one\n\nPage two\n\n");
    }
}
