//! Text extraction from uploaded documents.
//!
//! The declared MIME type picks the path:
//! - Plain text is decoded as UTF-8
//! - DOCX body paragraphs are read with docx-rs
//! - PDFs use their text layer, falling back to OCR of rasterized pages when
//!   the text layer yields too little
//! - PNG and JPEG images are always OCR'd
//!
//! Anything else is rejected as unsupported, which callers report as a
//! warning rather than an error.

mod docx;
mod pdf;

pub use docx::{extract_docx, paragraphs as docx_paragraphs};
pub use pdf::{split_pages, PageImages, PdfBackend, PopplerBackend};

use image::RgbImage;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::models::{DocumentKind, UploadedDocument};
use crate::ocr::{text::image_text, OcrError, OcrSlot};

/// Minimum text-layer length (in characters) below which a PDF is treated
/// as scanned.
pub const DEFAULT_OCR_FALLBACK_MIN_CHARS: usize = 50;

/// Errors that can occur during text extraction.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("Text is not valid UTF-8: {0}")]
    Decode(#[from] std::str::Utf8Error),

    #[error("Failed to read DOCX: {0}")]
    Docx(String),

    #[error("Failed to read PDF: {0}")]
    Pdf(String),

    #[error("Failed to decode image: {0}")]
    Image(String),

    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    #[error("External tool not found: {0}")]
    ToolNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractionError {
    /// Whether this should be shown as a warning instead of an error.
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::UnsupportedFileType(_))
    }
}

/// Method used to extract text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// Plain text decoded as-is.
    Direct,
    /// PDF text layer.
    TextLayer,
    /// DOCX body paragraphs.
    Docx,
    /// OCR of a single image.
    Ocr,
    /// PDF text layer was too short; pages were rasterized and OCR'd.
    TextLayerWithOcrFallback,
}

impl ExtractionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::TextLayer => "text_layer",
            Self::Docx => "docx",
            Self::Ocr => "ocr",
            Self::TextLayerWithOcrFallback => "text_layer_with_ocr_fallback",
        }
    }
}

impl std::fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of text extraction.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionResult {
    /// Extracted text content.
    pub text: String,
    /// Method used for extraction.
    pub method: ExtractionMethod,
    /// Number of pages processed (for PDFs and images).
    pub page_count: Option<usize>,
}

impl ExtractionResult {
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Dispatches documents to the right extraction path.
pub struct TextExtractor {
    pdf: Box<dyn PdfBackend>,
    ocr_fallback_min_chars: usize,
}

impl TextExtractor {
    pub fn new(pdf: Box<dyn PdfBackend>) -> Self {
        Self {
            pdf,
            ocr_fallback_min_chars: DEFAULT_OCR_FALLBACK_MIN_CHARS,
        }
    }

    /// Set the text-layer length below which PDFs are OCR'd.
    pub fn with_ocr_fallback_min_chars(mut self, min_chars: usize) -> Self {
        self.ocr_fallback_min_chars = min_chars;
        self
    }

    /// Extract text from a document, using `ocr` for any recognition needed.
    pub fn extract(
        &self,
        doc: &UploadedDocument,
        ocr: &mut OcrSlot,
    ) -> Result<ExtractionResult, ExtractionError> {
        let kind = doc.kind();
        debug!(
            "Extracting {} as {} ({}, {} bytes)",
            doc.filename(),
            kind,
            doc.mime_type(),
            doc.len()
        );

        match kind {
            DocumentKind::PlainText => Ok(ExtractionResult {
                text: std::str::from_utf8(doc.bytes())?.to_string(),
                method: ExtractionMethod::Direct,
                page_count: None,
            }),
            DocumentKind::Docx => Ok(ExtractionResult {
                text: extract_docx(doc.bytes())?,
                method: ExtractionMethod::Docx,
                page_count: None,
            }),
            DocumentKind::Pdf => self.extract_pdf(doc.bytes(), ocr),
            DocumentKind::Image(format) => {
                debug!("Decoding {:?} image", format);
                let image = image::load_from_memory(doc.bytes())
                    .map_err(|e| ExtractionError::Image(e.to_string()))?
                    .to_rgb8();
                Ok(ExtractionResult {
                    text: recognize(ocr, &image)?,
                    method: ExtractionMethod::Ocr,
                    page_count: Some(1),
                })
            }
            DocumentKind::Unsupported => Err(ExtractionError::UnsupportedFileType(
                doc.mime_type().to_string(),
            )),
        }
    }

    fn extract_pdf(
        &self,
        bytes: &[u8],
        ocr: &mut OcrSlot,
    ) -> Result<ExtractionResult, ExtractionError> {
        let (text, page_count) = match self.pdf.text_layer(bytes) {
            Ok(pages) => (pages.join("\n").trim().to_string(), Some(pages.len())),
            Err(e) => {
                debug!("Text layer unavailable, treating as empty: {}", e);
                (String::new(), None)
            }
        };

        let chars = text.chars().count();
        if chars >= self.ocr_fallback_min_chars {
            return Ok(ExtractionResult {
                text,
                method: ExtractionMethod::TextLayer,
                page_count,
            });
        }

        info!(
            "PDF text layer has {} chars (< {}), running OCR",
            chars, self.ocr_fallback_min_chars
        );
        let pages = self.pdf.rasterize(bytes)?;
        let total = pages.len();
        let mut texts = Vec::with_capacity(total);
        for (i, page) in pages.enumerate() {
            debug!("OCR page {}/{}", i + 1, total);
            texts.push(recognize(ocr, &page?)?);
        }

        Ok(ExtractionResult {
            text: texts.join("\n").trim().to_string(),
            method: ExtractionMethod::TextLayerWithOcrFallback,
            page_count: Some(total),
        })
    }
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self::new(Box::new(PopplerBackend::default()))
    }
}

impl std::fmt::Debug for TextExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextExtractor")
            .field("ocr_fallback_min_chars", &self.ocr_fallback_min_chars)
            .finish()
    }
}

/// OCR one image and normalize the result.
fn recognize(ocr: &mut OcrSlot, image: &RgbImage) -> Result<String, ExtractionError> {
    let result = ocr.engine()?.recognize(image)?;
    debug!(
        "{} OCR took {}ms",
        result.backend, result.processing_time_ms
    );
    Ok(image_text(&result.text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::{OcrBackend, OcrBackendType, OcrResult};
    use crate::utils::mime::DOCX_MIME;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// PDF backend returning canned pages; page images encode the page index
    /// in their width so the fake OCR can tell them apart. `rendered` counts
    /// the pages handed out so far.
    struct FakePdf {
        text_pages: Result<Vec<String>, ()>,
        page_count: u32,
        rendered: Arc<AtomicUsize>,
    }

    impl PdfBackend for FakePdf {
        fn text_layer(&self, _pdf: &[u8]) -> Result<Vec<String>, ExtractionError> {
            self.text_pages
                .clone()
                .map_err(|_| ExtractionError::ToolNotFound("pdftotext".to_string()))
        }

        fn rasterize(&self, _pdf: &[u8]) -> Result<PageImages, ExtractionError> {
            let rendered = Arc::clone(&self.rendered);
            Ok(PageImages::new(
                self.page_count as usize,
                (1..=self.page_count).map(move |i| {
                    rendered.fetch_add(1, Ordering::SeqCst);
                    Ok(RgbImage::new(i, 1))
                }),
            ))
        }
    }

    /// OCR engine that records how many pages had been rendered at each call.
    struct RenderWatchOcr {
        rendered: Arc<AtomicUsize>,
        seen: Arc<Mutex<Vec<usize>>>,
    }

    impl OcrBackend for RenderWatchOcr {
        fn backend_type(&self) -> OcrBackendType {
            OcrBackendType::Tesseract
        }

        fn is_available(&self) -> bool {
            true
        }

        fn availability_hint(&self) -> String {
            String::new()
        }

        fn recognize(&self, image: &RgbImage) -> Result<OcrResult, OcrError> {
            self.seen
                .lock()
                .unwrap()
                .push(self.rendered.load(Ordering::SeqCst));
            Ok(OcrResult {
                text: format!("page {}", image.width()),
                confidence: None,
                backend: OcrBackendType::Tesseract,
                processing_time_ms: 0,
            })
        }
    }

    struct SpyOcr {
        calls: Arc<AtomicUsize>,
        fail_on_width: Option<u32>,
    }

    impl OcrBackend for SpyOcr {
        fn backend_type(&self) -> OcrBackendType {
            OcrBackendType::Tesseract
        }

        fn is_available(&self) -> bool {
            true
        }

        fn availability_hint(&self) -> String {
            String::new()
        }

        fn recognize(&self, image: &RgbImage) -> Result<OcrResult, OcrError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if Some(image.width()) == self.fail_on_width {
                return Err(OcrError::OcrFailed("unreadable page".to_string()));
            }
            Ok(OcrResult {
                text: format!("page {}\nline two\n\nsecond block\n", image.width()),
                confidence: None,
                backend: OcrBackendType::Tesseract,
                processing_time_ms: 0,
            })
        }
    }

    fn spy_slot(fail_on_width: Option<u32>) -> (OcrSlot, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let slot = OcrSlot::new(move || {
            Ok(Box::new(SpyOcr {
                calls: Arc::clone(&counter),
                fail_on_width,
            }) as Box<dyn OcrBackend>)
        });
        (slot, calls)
    }

    fn pdf_extractor(text_pages: Result<Vec<&str>, ()>, page_count: u32) -> TextExtractor {
        counting_pdf_extractor(text_pages, page_count).0
    }

    fn counting_pdf_extractor(
        text_pages: Result<Vec<&str>, ()>,
        page_count: u32,
    ) -> (TextExtractor, Arc<AtomicUsize>) {
        let rendered = Arc::new(AtomicUsize::new(0));
        let extractor = TextExtractor::new(Box::new(FakePdf {
            text_pages: text_pages.map(|p| p.into_iter().map(str::to_string).collect()),
            page_count,
            rendered: Arc::clone(&rendered),
        }));
        (extractor, rendered)
    }

    fn pdf_doc() -> UploadedDocument {
        UploadedDocument::new("scan.pdf", "application/pdf", b"%PDF-1.4".to_vec())
    }

    #[test]
    fn test_plain_text_decoded() {
        let (mut slot, calls) = spy_slot(None);
        let doc = UploadedDocument::new("a.txt", "text/plain", "héllo\n".as_bytes().to_vec());

        let result = TextExtractor::default().extract(&doc, &mut slot).unwrap();
        assert_eq!(result.text, "héllo\n");
        assert_eq!(result.method, ExtractionMethod::Direct);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_plain_text_invalid_utf8() {
        let (mut slot, _) = spy_slot(None);
        let doc = UploadedDocument::new("a.txt", "text/plain", vec![0xff, 0xfe, 0x00]);

        let err = TextExtractor::default().extract(&doc, &mut slot).unwrap_err();
        assert!(matches!(err, ExtractionError::Decode(_)));
        assert!(!err.is_warning());
    }

    #[test]
    fn test_pdf_text_layer_above_threshold_skips_ocr() {
        let long = "This page has a perfectly readable text layer with plenty of characters.";
        let extractor = pdf_extractor(Ok(vec![long, "Second page.\n"]), 2);
        let (mut slot, calls) = spy_slot(None);

        let result = extractor.extract(&pdf_doc(), &mut slot).unwrap();
        assert_eq!(result.text, format!("{}\nSecond page.", long));
        assert_eq!(result.method, ExtractionMethod::TextLayer);
        assert_eq!(result.page_count, Some(2));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(!slot.is_initialized());
    }

    #[test]
    fn test_pdf_short_text_layer_falls_back_to_ocr_per_page() {
        let extractor = pdf_extractor(Ok(vec!["  12  ", ""]), 3);
        let (mut slot, calls) = spy_slot(None);

        let result = extractor.extract(&pdf_doc(), &mut slot).unwrap();
        assert_eq!(
            result.text,
            "page 1 line two second block\npage 2 line two second block\npage 3 line two second block"
        );
        assert_eq!(result.method, ExtractionMethod::TextLayerWithOcrFallback);
        assert_eq!(result.page_count, Some(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(slot.initializations(), 1);
    }

    #[test]
    fn test_pdf_threshold_is_configurable() {
        let extractor = pdf_extractor(Ok(vec!["short"]), 1).with_ocr_fallback_min_chars(5);
        let (mut slot, calls) = spy_slot(None);

        let result = extractor.extract(&pdf_doc(), &mut slot).unwrap();
        assert_eq!(result.method, ExtractionMethod::TextLayer);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_pdf_text_layer_failure_counts_as_empty() {
        let extractor = pdf_extractor(Err(()), 1);
        let (mut slot, calls) = spy_slot(None);

        let result = extractor.extract(&pdf_doc(), &mut slot).unwrap();
        assert_eq!(result.text, "page 1 line two second block");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_pdf_ocr_page_failure_fails_extraction() {
        let (extractor, rendered) = counting_pdf_extractor(Ok(vec![""]), 3);
        let (mut slot, calls) = spy_slot(Some(2));

        let err = extractor.extract(&pdf_doc(), &mut slot).unwrap_err();
        assert!(matches!(err, ExtractionError::Ocr(OcrError::OcrFailed(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        // Page 3 is never rendered once page 2 fails
        assert_eq!(rendered.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_pdf_pages_rendered_one_at_a_time() {
        let (extractor, rendered) = counting_pdf_extractor(Ok(vec![""]), 3);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let ocr_rendered = Arc::clone(&rendered);
        let ocr_seen = Arc::clone(&seen);
        let mut slot = OcrSlot::new(move || {
            Ok(Box::new(RenderWatchOcr {
                rendered: Arc::clone(&ocr_rendered),
                seen: Arc::clone(&ocr_seen),
            }) as Box<dyn OcrBackend>)
        });

        let result = extractor.extract(&pdf_doc(), &mut slot).unwrap();
        assert_eq!(result.text, "page 1\npage 2\npage 3");
        assert_eq!(result.page_count, Some(3));
        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_pdf_page_decode_failure_fails_extraction() {
        struct BrokenPages;

        impl PdfBackend for BrokenPages {
            fn text_layer(&self, _pdf: &[u8]) -> Result<Vec<String>, ExtractionError> {
                Ok(Vec::new())
            }

            fn rasterize(&self, _pdf: &[u8]) -> Result<PageImages, ExtractionError> {
                Ok(PageImages::new(
                    2,
                    vec![
                        Ok(RgbImage::new(1, 1)),
                        Err(ExtractionError::Image("page-2.png: truncated".to_string())),
                    ]
                    .into_iter(),
                ))
            }
        }

        let extractor = TextExtractor::new(Box::new(BrokenPages));
        let (mut slot, calls) = spy_slot(None);

        let err = extractor.extract(&pdf_doc(), &mut slot).unwrap_err();
        assert!(matches!(err, ExtractionError::Image(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_image_ocr_called_once() {
        let mut png = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(RgbImage::new(7, 3))
            .write_to(&mut png, image::ImageFormat::Png)
            .unwrap();
        let doc = UploadedDocument::new("photo.png", "image/png", png.into_inner());
        let (mut slot, calls) = spy_slot(None);

        let result = TextExtractor::default().extract(&doc, &mut slot).unwrap();
        assert_eq!(result.text, "page 7 line two second block");
        assert_eq!(result.method, ExtractionMethod::Ocr);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_image_decode_failure() {
        let doc = UploadedDocument::new("photo.jpg", "image/jpeg", b"not a jpeg".to_vec());
        let (mut slot, calls) = spy_slot(None);

        let err = TextExtractor::default().extract(&doc, &mut slot).unwrap_err();
        assert!(matches!(err, ExtractionError::Image(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_docx_dispatch() {
        let mut buf = Cursor::new(Vec::new());
        docx_rs::Docx::new()
            .add_paragraph(
                docx_rs::Paragraph::new().add_run(docx_rs::Run::new().add_text("Hello docx")),
            )
            .build()
            .pack(&mut buf)
            .unwrap();
        let doc = UploadedDocument::new("a.docx", DOCX_MIME, buf.into_inner());
        let (mut slot, _) = spy_slot(None);

        let result = TextExtractor::default().extract(&doc, &mut slot).unwrap();
        assert_eq!(result.text, "Hello docx");
        assert_eq!(result.method, ExtractionMethod::Docx);
    }

    #[test]
    fn test_unsupported_type_is_warning() {
        let doc = UploadedDocument::new("data.csv", "text/csv", b"a,b".to_vec());
        let (mut slot, calls) = spy_slot(None);

        let err = TextExtractor::default().extract(&doc, &mut slot).unwrap_err();
        assert!(err.is_warning());
        assert_eq!(err.to_string(), "Unsupported file type: text/csv");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
