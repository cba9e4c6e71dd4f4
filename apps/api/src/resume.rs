//! Resume text extraction from uploaded PDF bytes.

use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, warn};

const PDF_MAGIC: &[u8] = b"%PDF";

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("the uploaded file is not a readable PDF: {0}")]
    Unreadable(String),

    #[error("no text could be extracted from the uploaded resume")]
    Empty,
}

/// Extracts the text layer of a PDF. Runs the parser on the blocking pool.
///
/// Whitespace-only output is treated the same as no text.
pub async fn extract_text(bytes: Bytes) -> Result<String, DocumentError> {
    if !looks_like_pdf(&bytes) {
        return Err(DocumentError::Unreadable("missing PDF header".to_string()));
    }

    let size = bytes.len();
    // pdf-extract panics on some malformed inputs; a panicked task surfaces as a JoinError.
    let text = tokio::task::spawn_blocking(move || {
        pdf_extract::extract_text_from_mem(&bytes).map_err(|e| e.to_string())
    })
    .await
    .map_err(|e| {
        warn!("PDF parser aborted: {e}");
        DocumentError::Unreadable("the PDF parser could not process this file".to_string())
    })?
    .map_err(DocumentError::Unreadable)?;

    debug!("Extracted {} characters from {} byte PDF", text.len(), size);
    require_text(text)
}

fn looks_like_pdf(bytes: &[u8]) -> bool {
    // The header may be preceded by a little junk; readers accept it within the first 1 KiB.
    let window = &bytes[..bytes.len().min(1024)];
    window.windows(PDF_MAGIC.len()).any(|w| w == PDF_MAGIC)
}

fn require_text(text: String) -> Result<String, DocumentError> {
    if text.trim().is_empty() {
        return Err(DocumentError::Empty);
    }
    Ok(text)
}
