//! PDF access through Poppler's command-line tools.
//!
//! `pdftotext` reads the text layer (pages separated by form feeds) and
//! `pdftoppm` rasterizes pages for OCR. Both tools only read files, so the
//! upload is written to a temporary directory first.
//!
//! Rendered pages stay on disk as PNGs and are decoded one at a time while
//! the OCR loop consumes them.

use std::path::{Path, PathBuf};
use std::process::Command;

use image::RgbImage;
use tempfile::TempDir;
use tracing::debug;

use super::ExtractionError;

/// Handle command output, extracting stdout on success or returning appropriate error.
fn handle_cmd_output(
    result: std::io::Result<std::process::Output>,
    tool_name: &str,
    error_prefix: &str,
) -> Result<String, ExtractionError> {
    match result {
        Ok(output) => {
            if output.status.success() {
                Ok(String::from_utf8_lossy(&output.stdout).to_string())
            } else {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(ExtractionError::Pdf(format!(
                    "{}: {}",
                    error_prefix,
                    stderr.trim()
                )))
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ExtractionError::ToolNotFound(tool_name.to_string()))
        }
        Err(e) => Err(ExtractionError::Io(e)),
    }
}

/// Check command status, returning appropriate error on failure.
fn check_cmd_status(
    result: std::io::Result<std::process::ExitStatus>,
    tool_name: &str,
    error_msg: &str,
) -> Result<(), ExtractionError> {
    match result {
        Ok(s) if s.success() => Ok(()),
        Ok(_) => Err(ExtractionError::Pdf(error_msg.to_string())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ExtractionError::ToolNotFound(tool_name.to_string()))
        }
        Err(e) => Err(ExtractionError::Io(e)),
    }
}

/// Source of PDF page text and page images.
pub trait PdfBackend: Send + Sync {
    /// Text layer of each page, in page order.
    fn text_layer(&self, pdf: &[u8]) -> Result<Vec<String>, ExtractionError>;

    /// Every page rendered, in page order.
    fn rasterize(&self, pdf: &[u8]) -> Result<PageImages, ExtractionError>;
}

/// Rendered pages of a PDF, yielded in page order.
///
/// Each item is produced on demand, so only the page being processed has to
/// be held in memory.
pub struct PageImages {
    count: usize,
    pages: Box<dyn Iterator<Item = Result<RgbImage, ExtractionError>> + Send>,
}

impl PageImages {
    pub fn new<I>(count: usize, pages: I) -> Self
    where
        I: Iterator<Item = Result<RgbImage, ExtractionError>> + Send + 'static,
    {
        Self {
            count,
            pages: Box::new(pages),
        }
    }

    /// Number of rendered pages.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

impl Iterator for PageImages {
    type Item = Result<RgbImage, ExtractionError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.pages.next()
    }
}

impl std::fmt::Debug for PageImages {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageImages").field("count", &self.count).finish()
    }
}

/// PNG files written by `pdftoppm`, decoded lazily. Owns the temporary
/// directory so the files outlive the iteration.
struct RenderedPngs {
    _temp_dir: TempDir,
    paths: std::vec::IntoIter<PathBuf>,
}

impl Iterator for RenderedPngs {
    type Item = Result<RgbImage, ExtractionError>;

    fn next(&mut self) -> Option<Self::Item> {
        let path = self.paths.next()?;
        debug!("Decoding {}", path.display());
        Some(
            image::open(&path)
                .map(|img| img.to_rgb8())
                .map_err(|e| ExtractionError::Image(format!("{}: {}", path.display(), e))),
        )
    }
}

/// [`PdfBackend`] backed by `pdftotext` and `pdftoppm`.
#[derive(Debug, Clone)]
pub struct PopplerBackend {
    dpi: u32,
}

impl PopplerBackend {
    pub fn new(dpi: u32) -> Self {
        Self { dpi }
    }

    /// Write the PDF bytes where the Poppler tools can read them.
    fn stage(pdf: &[u8]) -> Result<(TempDir, PathBuf), ExtractionError> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("document.pdf");
        std::fs::write(&path, pdf)?;
        Ok((temp_dir, path))
    }

    fn run_pdftotext(&self, file_path: &Path) -> Result<String, ExtractionError> {
        let output = Command::new("pdftotext")
            .args(["-enc", "UTF-8"])
            .arg(file_path)
            .arg("-") // Output to stdout
            .output();

        handle_cmd_output(output, "pdftotext (install poppler-utils)", "pdftotext failed")
    }
}

impl Default for PopplerBackend {
    fn default() -> Self {
        Self::new(300)
    }
}

impl PdfBackend for PopplerBackend {
    fn text_layer(&self, pdf: &[u8]) -> Result<Vec<String>, ExtractionError> {
        let (_temp_dir, path) = Self::stage(pdf)?;
        debug!("Running pdftotext on {} byte PDF", pdf.len());
        let text = self.run_pdftotext(&path)?;
        Ok(split_pages(&text))
    }

    fn rasterize(&self, pdf: &[u8]) -> Result<PageImages, ExtractionError> {
        let (temp_dir, path) = Self::stage(pdf)?;
        let output_prefix = temp_dir.path().join("page");

        debug!("Rasterizing PDF at {} dpi", self.dpi);
        let status = Command::new("pdftoppm")
            .args(["-png", "-r", &self.dpi.to_string()])
            .arg(&path)
            .arg(&output_prefix)
            .status();

        check_cmd_status(
            status,
            "pdftoppm (install poppler-utils)",
            "pdftoppm failed to convert PDF",
        )?;

        // pdftoppm names files page-1.png or page-01.png depending on page count
        let mut images: Vec<_> = std::fs::read_dir(temp_dir.path())?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().map(|ext| ext == "png").unwrap_or(false))
            .collect();
        images.sort_by_key(|p| page_number(p));

        if images.is_empty() {
            return Err(ExtractionError::Pdf(
                "No images generated from PDF".to_string(),
            ));
        }

        let count = images.len();
        Ok(PageImages::new(
            count,
            RenderedPngs {
                _temp_dir: temp_dir,
                paths: images.into_iter(),
            },
        ))
    }
}

/// Split `pdftotext` output into pages on form feeds.
///
/// `pdftotext` ends every page with a form feed, so the empty tail after the
/// last one is not a page.
pub fn split_pages(text: &str) -> Vec<String> {
    let mut pages: Vec<String> = text.split('\x0c').map(str::to_string).collect();
    if pages.len() > 1 && pages.last().map(|p| p.trim().is_empty()).unwrap_or(false) {
        pages.pop();
    }
    pages
}

/// Page number from a `pdftoppm` output name like `page-07.png`.
fn page_number(path: &Path) -> u32 {
    path.file_stem()
        .and_then(|s| s.to_str())
        .and_then(|s| s.rsplit('-').next())
        .and_then(|n| n.parse().ok())
        .unwrap_or(u32::MAX)
}
