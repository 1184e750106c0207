//! Normalization of raw OCR output.
//!
//! Engines report text as lines with blank lines between blocks. Recognition
//! results are grouped into paragraphs (one blank-line separated block each,
//! its lines joined with single spaces) and the paragraphs of one image are
//! joined with a single space.

/// Group raw OCR output into paragraphs.
pub fn paragraphs(raw: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join(" "));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join(" "));
    }

    paragraphs
}

/// Flatten raw OCR output for one image into a single string.
pub fn image_text(raw: &str) -> String {
    // Tesseract ends each page with a form feed
    let raw = raw.replace('\x0c', "\n");
    paragraphs(&raw).join(" ")
}
