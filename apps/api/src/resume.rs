//! Resume file validation and text extraction.
//!
//! Validation failures reject the upload; extraction failures never do.
//! The caller stores the file regardless and reports the extraction error
//! back to the client.

use tracing::warn;

/// Maximum accepted upload size: 10 MiB.
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

const ALLOWED_EXTENSIONS: &[&str] = &["pdf", "doc", "docx"];

const ALLOWED_CONTENT_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    // Browsers occasionally fall back to this for local files.
    "application/octet-stream",
];

/// Checks extension, declared content type and payload size.
/// Returns a human-readable rejection reason on failure.
pub fn validate_file(
    bytes: &[u8],
    filename: &str,
    content_type: Option<&str>,
) -> Result<(), String> {
    if bytes.is_empty() {
        return Err("Uploaded file is empty".to_string());
    }
    if bytes.len() > MAX_FILE_SIZE {
        return Err(format!(
            "File too large: {} bytes (maximum is {} bytes)",
            bytes.len(),
            MAX_FILE_SIZE
        ));
    }

    let ext = extension(filename);
    match ext {
        Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => {}
        Some(ext) => {
            return Err(format!(
                "Unsupported file type '.{ext}'. Allowed types: PDF, DOC, DOCX"
            ))
        }
        None => {
            return Err("Filename has no extension. Allowed types: PDF, DOC, DOCX".to_string())
        }
    }

    if let Some(ct) = content_type {
        let ct = ct.split(';').next().unwrap_or(ct).trim();
        if !ALLOWED_CONTENT_TYPES.contains(&ct) {
            return Err(format!("Unsupported content type '{ct}'"));
        }
    }

    Ok(())
}

/// Extracts plain text from a recognized document format.
///
/// Returns `(text, extraction_error)`; at most one side is `Some`. An error
/// here is informational only — the upload has already been accepted.
pub fn extract_text(bytes: &[u8], filename: &str) -> (Option<String>, Option<String>) {
    match extension(filename).as_deref() {
        Some("pdf") => match pdf_extract::extract_text_from_mem(bytes) {
            Ok(text) => {
                let text = text.trim().to_string();
                if text.is_empty() {
                    (
                        None,
                        Some("PDF contained no extractable text".to_string()),
                    )
                } else {
                    (Some(text), None)
                }
            }
            Err(e) => {
                warn!("PDF text extraction failed for '{filename}': {e}");
                (None, Some(format!("PDF text extraction failed: {e}")))
            }
        },
        Some("doc") | Some("docx") => (
            None,
            Some("Text extraction is not supported for DOC/DOCX; file stored without inline text"
                .to_string()),
        ),
        other => (
            None,
            Some(format!(
                "No text extractor for file type '{}'",
                other.unwrap_or("<none>")
            )),
        ),
    }
}

fn extension(filename: &str) -> Option<String> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
}
