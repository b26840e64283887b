//! PDF text extraction.

use crate::error::{PrimerError, Result};
use tracing::{debug, instrument, warn};

/// Text of a single PDF page.
#[derive(Debug, Clone)]
pub struct PdfPage {
    /// 1-based page number.
    pub number: u32,
    pub text: String,
}

/// Extract text from a PDF, one entry per page that has any text.
///
/// Pages are read with lopdf. If no page yields text (unusual fonts or
/// encodings) the whole document is run through pdf-extract instead and split
/// on form feeds.
#[instrument(skip(bytes), fields(size = bytes.len()))]
pub fn extract_pages(bytes: &[u8]) -> Result<Vec<PdfPage>> {
    let doc = lopdf::Document::load_mem(bytes)
        .map_err(|e| PrimerError::PdfExtraction(format!("Could not parse PDF: {}", e)))?;

    let mut pages = Vec::new();
    for number in doc.get_pages().keys() {
        match doc.extract_text(&[*number]) {
            Ok(text) if !text.trim().is_empty() => pages.push(PdfPage {
                number: *number,
                text,
            }),
            Ok(_) => debug!("Page {} has no text", number),
            Err(e) => debug!("Failed to extract page {}: {}", number, e),
        }
    }

    if pages.is_empty() {
        warn!("No text found page by page, falling back to whole-document extraction");
        let text = pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| PrimerError::PdfExtraction(e.to_string()))?;

        pages = text
            .split('\u{c}')
            .enumerate()
            .filter(|(_, t)| !t.trim().is_empty())
            .map(|(i, t)| PdfPage {
                number: i as u32 + 1,
                text: t.to_string(),
            })
            .collect();
    }

    if pages.is_empty() {
        return Err(PrimerError::InvalidInput(
            "No extractable text found in PDF".to_string(),
        ));
    }

    Ok(pages)
}

/// Whether a file name has a `.pdf` extension (case-insensitive).
pub fn is_pdf_file_name(name: &str) -> bool {
    name.to_lowercase().ends_with(".pdf")
}

/// Reduce an uploaded file name to its final path component.
pub fn sanitize_file_name(name: &str) -> Option<String> {
    let last = name.rsplit(['/', '\\']).next()?.trim();
    if last.is_empty() || last == "." || last == ".." {
        return None;
    }
    Some(last.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    fn hello_pdf() -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 48.into()]),
                Operation::new("Td", vec![100.into(), 600.into()]),
                Operation::new("Tj", vec![Object::string_literal("Hello World!")]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    #[test]
    fn test_extract_pages() {
        let pages = extract_pages(&hello_pdf()).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].number, 1);
        assert!(pages[0].text.contains("Hello World!"));
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(extract_pages(b"definitely not a pdf").is_err());
    }

    #[test]
    fn test_pdf_file_name() {
        assert!(is_pdf_file_name("notes.pdf"));
        assert!(is_pdf_file_name("NOTES.PDF"));
        assert!(!is_pdf_file_name("notes.txt"));
        assert!(!is_pdf_file_name("pdf"));
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("lecture.pdf").as_deref(), Some("lecture.pdf"));
        assert_eq!(sanitize_file_name("../../etc/passwd.pdf").as_deref(), Some("passwd.pdf"));
        assert_eq!(sanitize_file_name("C:\\Users\\me\\a.pdf").as_deref(), Some("a.pdf"));
        assert_eq!(sanitize_file_name("dir/.."), None);
        assert_eq!(sanitize_file_name(""), None);
    }
}
