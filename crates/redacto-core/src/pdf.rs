//! PDF validation and info extraction
//!
//! Used before upload to reject files that are not PDFs, and after burn to
//! confirm the sanitized document no longer carries document metadata.

use lopdf::{Dictionary, Document, Object};
use serde::Serialize;

use crate::error::RedactError;

/// PDF file information
#[derive(Debug, Clone, Serialize, Default, PartialEq, Eq)]
pub struct PdfInfo {
    /// Number of pages in the document
    pub page_count: u32,
    /// PDF version string (e.g., "1.7")
    pub version: String,
    pub encrypted: bool,
    pub size_bytes: usize,
    /// Whether the trailer references an Info dictionary with any entries
    pub has_info_metadata: bool,
    /// Whether the catalog references an XMP metadata stream
    pub has_xmp_metadata: bool,
    pub title: Option<String>,
    pub author: Option<String>,
}

impl PdfInfo {
    /// True when neither an Info dictionary nor XMP metadata is present
    pub fn metadata_stripped(&self) -> bool {
        !self.has_info_metadata && !self.has_xmp_metadata
    }
}

const HEADER: &[u8] = b"%PDF-";
const EOF_MARKER: &[u8] = b"%%EOF";
/// Writers may append padding or an incremental-update tail after the marker
const EOF_SEARCH_WINDOW: usize = 1024;

/// Structural check run before a document is sent for analysis.
///
/// Only the header and the end-of-file marker are examined; nothing is parsed.
pub fn quick_validate(bytes: &[u8]) -> Result<(), RedactError> {
    if !bytes.starts_with(HEADER) {
        return Err(RedactError::Pdf(
            "document does not start with a %PDF- header".to_string(),
        ));
    }

    let tail = &bytes[bytes.len().saturating_sub(EOF_SEARCH_WINDOW)..];
    if !tail.windows(EOF_MARKER.len()).any(|w| w == EOF_MARKER) {
        return Err(RedactError::Pdf(
            "no %%EOF marker near the end of the document; it looks truncated".to_string(),
        ));
    }

    Ok(())
}

/// Parse a PDF and report its structure and metadata
pub fn inspect(bytes: &[u8]) -> Result<PdfInfo, RedactError> {
    quick_validate(bytes)?;

    let document = Document::load_mem(bytes).map_err(|e| RedactError::Pdf(e.to_string()))?;

    let info_dict = info_dictionary(&document);
    let (title, author) = match info_dict {
        Some(dict) => (string_entry(dict, b"Title"), string_entry(dict, b"Author")),
        None => (None, None),
    };

    Ok(PdfInfo {
        page_count: document.get_pages().len() as u32,
        version: document.version.clone(),
        encrypted: document.is_encrypted(),
        size_bytes: bytes.len(),
        has_info_metadata: info_dict.map(|d| !d.is_empty()).unwrap_or(false),
        has_xmp_metadata: has_xmp_stream(&document),
        title,
        author,
    })
}

fn resolve_dict<'a>(document: &'a Document, object: &'a Object) -> Option<&'a Dictionary> {
    match object {
        Object::Reference(id) => document.objects.get(id)?.as_dict().ok(),
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

fn info_dictionary(document: &Document) -> Option<&Dictionary> {
    let info = document.trailer.get(b"Info").ok()?;
    resolve_dict(document, info)
}

fn has_xmp_stream(document: &Document) -> bool {
    document
        .trailer
        .get(b"Root")
        .ok()
        .and_then(|root| resolve_dict(document, root))
        .map(|catalog| catalog.has(b"Metadata"))
        .unwrap_or(false)
}

fn string_entry(dict: &Dictionary, key: &[u8]) -> Option<String> {
    let bytes = dict.get(key).ok()?.as_str().ok()?;
    let decoded = String::from_utf8_lossy(bytes);
    if decoded.is_empty() {
        None
    } else {
        Some(decoded.into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{content::Content, content::Operation, Stream, StringFormat};

    /// Build a test PDF with `num_pages` pages, optionally carrying an Info dictionary
    fn create_test_pdf(num_pages: u32, with_info: bool) -> Vec<u8> {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();

        let mut page_ids = Vec::new();
        for i in 0..num_pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new(
                        "Tf",
                        vec![Object::Name(b"F1".to_vec()), Object::Integer(12)],
                    ),
                    Operation::new("Td", vec![Object::Integer(100), Object::Integer(700)]),
                    Operation::new(
                        "Tj",
                        vec![Object::String(
                            format!("Call Jane Doe at 555-0100, page {}", i + 1).into_bytes(),
                            StringFormat::Literal,
                        )],
                    ),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id =
                doc.add_object(Stream::new(Dictionary::new(), content.encode().unwrap()));

            let page = Dictionary::from_iter(vec![
                ("Type", Object::Name(b"Page".to_vec())),
                ("Parent", Object::Reference(pages_id)),
                (
                    "MediaBox",
                    Object::Array(vec![
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::Integer(612),
                        Object::Integer(792),
                    ]),
                ),
                ("Contents", Object::Reference(content_id)),
            ]);
            page_ids.push(doc.add_object(page));
        }

        let pages = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Count", Object::Integer(num_pages as i64)),
            (
                "Kids",
                Object::Array(page_ids.iter().map(|id| Object::Reference(*id)).collect()),
            ),
        ]);
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]);
        let catalog_id = doc.add_object(catalog);
        doc.trailer.set("Root", Object::Reference(catalog_id));

        if with_info {
            let info = Dictionary::from_iter(vec![
                (
                    "Title",
                    Object::String(b"Lease Agreement".to_vec(), StringFormat::Literal),
                ),
                (
                    "Author",
                    Object::String(b"Jane Doe".to_vec(), StringFormat::Literal),
                ),
            ]);
            let info_id = doc.add_object(info);
            doc.trailer.set("Info", Object::Reference(info_id));
        }

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).unwrap();
        buffer
    }

    #[test]
    fn test_quick_validate_rejects_non_pdf() {
        assert!(quick_validate(b"not a pdf file").is_err());
    }

    #[test]
    fn test_quick_validate_rejects_small_file() {
        assert!(quick_validate(b"tiny").is_err());
    }

    #[test]
    fn test_quick_validate_rejects_truncated() {
        let pdf = create_test_pdf(1, false);
        let truncated = &pdf[..pdf.len() - 10];
        assert!(quick_validate(truncated).is_err());
    }

    #[test]
    fn test_quick_validate_accepts_valid_pdf() {
        let pdf = create_test_pdf(1, false);
        assert!(quick_validate(&pdf).is_ok());
    }

    #[test]
    fn test_inspect_reports_metadata() {
        let pdf = create_test_pdf(3, true);
        let info = inspect(&pdf).unwrap();

        assert_eq!(info.page_count, 3);
        assert_eq!(info.version, "1.7");
        assert!(info.has_info_metadata);
        assert!(!info.metadata_stripped());
        assert_eq!(info.title.as_deref(), Some("Lease Agreement"));
        assert_eq!(info.author.as_deref(), Some("Jane Doe"));
    }

    #[test]
    fn test_inspect_stripped_document() {
        let pdf = create_test_pdf(2, false);
        let info = inspect(&pdf).unwrap();

        assert_eq!(info.page_count, 2);
        assert!(info.metadata_stripped());
        assert!(info.title.is_none());
        assert_eq!(info.size_bytes, pdf.len());
    }

    #[test]
    fn test_inspect_rejects_invalid_data() {
        assert!(inspect(b"not a valid pdf").is_err());
    }

    #[test]
    fn test_quick_validate_allows_data_after_eof() {
        let mut pdf = create_test_pdf(1, false);
        pdf.extend_from_slice(&[b'\n'; 200]);
        assert!(quick_validate(&pdf).is_ok());
    }
}
