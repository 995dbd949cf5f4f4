use crate::error::{ExtractionError, ExtractionResult};

/// Deterministic text extraction. PDFs go through `pdf-extract`; anything
/// else (county HTML, plaintext feeds) is assumed to already be text.
pub fn extract_text(bytes: &[u8], content_type_hint: Option<&str>) -> ExtractionResult<String> {
    let looks_like_pdf = bytes.starts_with(b"%PDF") || content_type_hint == Some("application/pdf");
    if looks_like_pdf {
        pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractionError::TextExtractionFailed(e.to_string()))
    } else {
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_pdf_bytes_pass_through_as_text() {
        let text = extract_text(b"Case 25-CV-1 debt $1,000", None).unwrap();
        assert!(text.contains("25-CV-1"));
    }
}
