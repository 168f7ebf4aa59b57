use crate::utils::error::AppError;
use docx_rust::document::{BodyContent, ParagraphContent, RunContent};
use docx_rust::DocxFile;
use std::fs;
use std::path::Path;

pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Extracts plain text from an uploaded file, dispatching on the declared
/// media type only. The declared type is trusted as-is: a mismatched
/// declaration yields garbage text, not an error (content sniffing is an
/// explicit non-goal). Unreadable or corrupt input is an `ExtractionFailed`,
/// never an empty string pretending to be success.
pub fn extract(file_path: &Path, media_type: &str) -> Result<String, AppError> {
    match media_type {
        "application/pdf" => extract_pdf(file_path),
        DOCX_MIME => extract_docx(file_path),
        m if m.starts_with("image/") => extract_image(file_path),
        _ => fs::read_to_string(file_path)
            .map_err(|e| AppError::ExtractionFailed(format!("not valid UTF-8 text: {}", e))),
    }
}

// Concatenated text of every page. A well-formed PDF with no text layer is a
// legal empty result.
fn extract_pdf(file_path: &Path) -> Result<String, AppError> {
    let doc = lopdf::Document::load(file_path)
        .map_err(|e| AppError::ExtractionFailed(format!("unreadable PDF: {}", e)))?;

    let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
    if pages.is_empty() {
        return Ok(String::new());
    }

    doc.extract_text(&pages)
        .map_err(|e| AppError::ExtractionFailed(format!("PDF text extraction failed: {}", e)))
}

fn extract_docx(file_path: &Path) -> Result<String, AppError> {
    let docx_file = DocxFile::from_file(file_path)
        .map_err(|e| AppError::ExtractionFailed(format!("unreadable DOCX: {:?}", e)))?;
    let docx = docx_file
        .parse()
        .map_err(|e| AppError::ExtractionFailed(format!("DOCX parse failed: {:?}", e)))?;

    let mut text = String::new();
    for content in &docx.document.body.content {
        if let BodyContent::Paragraph(paragraph) = content {
            for paragraph_content in &paragraph.content {
                if let ParagraphContent::Run(run) = paragraph_content {
                    for run_content in &run.content {
                        if let RunContent::Text(t) = run_content {
                            text.push_str(&t.text);
                        }
                    }
                }
            }
            text.push('\n');
        }
    }

    Ok(text)
}

// OCR with a fixed English language model
fn extract_image(file_path: &Path) -> Result<String, AppError> {
    // Decode up front so a broken image fails here, not inside the OCR engine
    image::open(file_path)
        .map_err(|e| AppError::ExtractionFailed(format!("unreadable image: {}", e)))?;

    let img = rusty_tesseract::Image::from_path(file_path)
        .map_err(|e| AppError::ExtractionFailed(format!("OCR input rejected: {:?}", e)))?;

    let args = rusty_tesseract::Args {
        lang: "eng".to_string(),
        ..rusty_tesseract::Args::default()
    };

    rusty_tesseract::image_to_string(&img, &args)
        .map_err(|e| AppError::ExtractionFailed(format!("OCR failed: {:?}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    fn temp_file(name: &str, bytes: &[u8]) -> PathBuf {
        let path = std::env::temp_dir().join(format!("{}_{}", uuid::Uuid::new_v4(), name));
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(bytes).unwrap();
        path
    }

    #[test]
    fn test_plain_text_passthrough_is_verbatim() {
        let content = "Hemoglobin: 13.5 g/dL\nGlucose: 92 mg/dL\ncafé ☕\n";
        let path = temp_file("report.txt", content.as_bytes());

        let extracted = extract(&path, "text/plain").unwrap();
        assert_eq!(extracted, content);

        fs::remove_file(path).ok();
    }

    #[test]
    fn test_unknown_media_type_falls_back_to_text() {
        let content = "just bytes";
        let path = temp_file("report.bin", content.as_bytes());

        let extracted = extract(&path, "application/octet-stream").unwrap();
        assert_eq!(extracted, content);

        fs::remove_file(path).ok();
    }

    #[test]
    fn test_missing_file_is_extraction_failed() {
        let path = std::env::temp_dir().join("does_not_exist_7f3a.txt");
        let err = extract(&path, "text/plain").unwrap_err();
        assert!(matches!(err, AppError::ExtractionFailed(_)));
    }

    #[test]
    fn test_corrupt_pdf_is_extraction_failed() {
        let path = temp_file("broken.pdf", b"this is not a pdf");
        let err = extract(&path, "application/pdf").unwrap_err();
        assert!(matches!(err, AppError::ExtractionFailed(_)));
        fs::remove_file(path).ok();
    }

    #[test]
    fn test_corrupt_docx_is_extraction_failed() {
        let path = temp_file("broken.docx", b"this is not a zip package");
        let err = extract(&path, DOCX_MIME).unwrap_err();
        assert!(matches!(err, AppError::ExtractionFailed(_)));
        fs::remove_file(path).ok();
    }

    #[test]
    fn test_unreadable_image_is_extraction_failed() {
        let path = temp_file("broken.png", b"this is not an image");
        let err = extract(&path, "image/png").unwrap_err();
        assert!(matches!(err, AppError::ExtractionFailed(_)));
        fs::remove_file(path).ok();
    }

    #[test]
    fn test_non_utf8_text_is_extraction_failed() {
        let path = temp_file("latin1.txt", &[0xff, 0xfe, 0x41]);
        let err = extract(&path, "text/plain").unwrap_err();
        assert!(matches!(err, AppError::ExtractionFailed(_)));
        fs::remove_file(path).ok();
    }
}
