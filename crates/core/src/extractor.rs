use crate::error::ExtractError;
use base64::{engine::general_purpose::STANDARD, Engine};
use lopdf::Document;
use scraper::Html;
use tracing::{debug, warn};

/// Substituted when a PDF is encrypted and the empty password does not open it.
pub const PDF_ENCRYPTED_TEXT: &str = "The PDF is encrypted and couldn't be decrypted.";
/// Substituted when the backing file is missing or cannot be decoded.
pub const TEXT_NOT_FOUND: &str = "Text file not found";
/// Substituted when the upstream record lists no text artifact at all.
pub const NO_TEXT_AVAILABLE: &str = "No text available";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Html,
    Pdf,
    PlainText,
}

pub trait PdfExtractor {
    fn extract_pdf(&self, bytes: &[u8]) -> Result<String, ExtractError>;
}

#[derive(Default)]
pub struct LopdfExtractor;

impl PdfExtractor for LopdfExtractor {
    fn extract_pdf(&self, bytes: &[u8]) -> Result<String, ExtractError> {
        let mut document =
            Document::load_mem(bytes).map_err(|error| ExtractError::PdfParse(error.to_string()))?;

        if document.is_encrypted() && document.decrypt("").is_err() {
            return Err(ExtractError::PdfEncrypted);
        }

        let mut text = String::new();
        for page_no in document.get_pages().keys() {
            match document.extract_text(&[*page_no]) {
                Ok(page_text) => text.push_str(&page_text),
                Err(error) => debug!(page = page_no, %error, "pdf page has no extractable text"),
            }
        }

        Ok(text)
    }
}

/// Converts source bytes into plain text. Never fails: undecodable input
/// resolves to [`TEXT_NOT_FOUND`] so a batch always has something to scan.
pub fn extract_text(bytes: &[u8], format: SourceFormat) -> String {
    extract_text_with(bytes, format, &LopdfExtractor)
}

/// [`extract_text`] with a caller-supplied PDF backend. Encrypted PDFs
/// resolve to [`PDF_ENCRYPTED_TEXT`].
pub fn extract_text_with(bytes: &[u8], format: SourceFormat, pdf: &dyn PdfExtractor) -> String {
    match format {
        SourceFormat::Html => html_to_text(&String::from_utf8_lossy(bytes)),
        SourceFormat::PlainText => String::from_utf8_lossy(bytes).into_owned(),
        SourceFormat::Pdf => match pdf.extract_pdf(bytes) {
            Ok(text) => text,
            Err(ExtractError::PdfEncrypted) => {
                warn!("encrypted pdf, substituting placeholder text");
                PDF_ENCRYPTED_TEXT.to_string()
            }
            Err(error) => {
                warn!(%error, "unreadable pdf, substituting placeholder text");
                TEXT_NOT_FOUND.to_string()
            }
        },
    }
}

/// Same as [`extract_text`] for payloads shipped as base64 strings.
pub fn extract_base64_text(encoded: &str, format: SourceFormat) -> String {
    match decode_base64(encoded) {
        Ok(bytes) => extract_text(&bytes, format),
        Err(error) => {
            warn!(%error, "undecodable text artifact, substituting placeholder text");
            TEXT_NOT_FOUND.to_string()
        }
    }
}

fn decode_base64(encoded: &str) -> Result<Vec<u8>, ExtractError> {
    let compact: String = encoded.split_whitespace().collect();
    Ok(STANDARD.decode(compact)?)
}

/// Visible text of an HTML document. Script and style content is dropped,
/// runs separated by two spaces become separate lines and blank lines are
/// removed.
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut raw = String::new();

    for node in document.tree.root().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };

        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|element| matches!(element.name(), "script" | "style"))
        });

        if !hidden {
            raw.push_str(text);
        }
    }

    raw.lines()
        .map(str::trim)
        .flat_map(|line| line.split("  "))
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream};

    fn single_page_pdf(line: &str) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![100.into(), 600.into()]),
                Operation::new("Tj", vec![Object::string_literal(line)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)?;
        Ok(bytes)
    }

    #[test]
    fn html_drops_script_and_style_content() {
        let html = "<html><head><style>p { color: red; }</style>\
                    <script>var ai = 'machine learning';</script></head>\
                    <body><p>Section 1.</p><p>Artificial intelligence   systems</p></body></html>";

        let text = html_to_text(html);

        assert!(!text.contains("color"));
        assert!(!text.contains("var ai"));
        assert!(text.contains("Section 1."));
        assert!(text.contains("Artificial intelligence"));
    }

    #[test]
    fn html_splits_double_spaced_runs_and_drops_blank_lines() {
        let html = "<body><pre>Title  Subtitle\n\n   \nBody line</pre></body>";

        let text = html_to_text(html);

        assert_eq!(text, "Title\nSubtitle\nBody line");
    }

    #[test]
    fn html_round_trip_recovers_visible_lines() {
        let lines = ["An act relating to automated decisions", "Section 2. Definitions"];
        let rendered = format!(
            "<html><body><script>hidden()</script>{}</body></html>",
            lines
                .iter()
                .map(|line| format!("<p>{line}</p>\n"))
                .collect::<String>()
        );

        assert_eq!(html_to_text(&rendered), lines.join("\n"));
    }

    #[test]
    fn pdf_text_is_extracted_page_by_page() -> Result<(), Box<dyn std::error::Error>> {
        let bytes = single_page_pdf("Neural network oversight")?;

        let text = extract_text(&bytes, SourceFormat::Pdf);

        assert!(text.contains("Neural network oversight"));
        Ok(())
    }

    struct LockedPdf;

    impl PdfExtractor for LockedPdf {
        fn extract_pdf(&self, _bytes: &[u8]) -> Result<String, ExtractError> {
            Err(ExtractError::PdfEncrypted)
        }
    }

    #[test]
    fn encrypted_pdf_resolves_to_encryption_placeholder() {
        let text = extract_text_with(b"%PDF-1.4", SourceFormat::Pdf, &LockedPdf);
        assert_eq!(text, PDF_ENCRYPTED_TEXT);
        assert_eq!(text, "The PDF is encrypted and couldn't be decrypted.");
    }

    #[test]
    fn pdf_backend_is_only_used_for_pdfs() {
        let text = extract_text_with(b"Chatbot notice", SourceFormat::PlainText, &LockedPdf);
        assert_eq!(text, "Chatbot notice");
    }

    #[test]
    fn corrupt_pdf_resolves_to_placeholder() {
        let text = extract_text(b"%PDF-1.4\n%broken", SourceFormat::Pdf);
        assert_eq!(text, TEXT_NOT_FOUND);
    }

    #[test]
    fn base64_html_payload_is_decoded_before_extraction() {
        let encoded = STANDARD.encode("<p>Chatbot disclosure</p>");
        assert_eq!(
            extract_base64_text(&encoded, SourceFormat::Html),
            "Chatbot disclosure"
        );
    }

    #[test]
    fn invalid_base64_resolves_to_placeholder() {
        assert_eq!(
            extract_base64_text("***not base64***", SourceFormat::Html),
            TEXT_NOT_FOUND
        );
    }
}
