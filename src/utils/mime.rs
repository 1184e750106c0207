//! MIME type detection and display utilities.

use std::path::Path;

/// MIME type of Office Open XML word-processing documents.
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Fallback when neither the file name nor the content identify a type.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Determine the declared MIME type for a file.
///
/// The extension wins (the way a browser declares an upload's type); content
/// sniffing is only used when the extension says nothing.
pub fn detect_mime_type(path: &Path, content: &[u8]) -> String {
    if let Some(mime) = mime_guess::from_path(path).first_raw() {
        return mime.to_string();
    }

    infer::get(content)
        .map(|kind| kind.mime_type().to_string())
        .unwrap_or_else(|| OCTET_STREAM.to_string())
}

/// Get an icon string for a MIME type.
pub fn mime_icon(mime: &str) -> &'static str {
    match mime {
        "application/pdf" => "[pdf]",
        m if m.starts_with("image/") => "[img]",
        m if m.contains("word") => "[doc]",
        "text/plain" => "[txt]",
        _ => "[---]",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_by_extension() {
        assert_eq!(detect_mime_type(Path::new("a.pdf"), b""), "application/pdf");
        assert_eq!(detect_mime_type(Path::new("a.txt"), b""), "text/plain");
        assert_eq!(detect_mime_type(Path::new("a.docx"), b""), DOCX_MIME);
        assert_eq!(detect_mime_type(Path::new("a.png"), b""), "image/png");
        assert_eq!(detect_mime_type(Path::new("a.jpg"), b""), "image/jpeg");
        assert_eq!(detect_mime_type(Path::new("a.csv"), b""), "text/csv");
    }

    #[test]
    fn test_detect_by_content_without_extension() {
        let png_magic = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
        assert_eq!(detect_mime_type(Path::new("scan"), png_magic), "image/png");
        assert_eq!(detect_mime_type(Path::new("blob"), b"\0\x01\x02"), OCTET_STREAM);
    }

    #[test]
    fn test_mime_icon() {
        assert_eq!(mime_icon("application/pdf"), "[pdf]");
        assert_eq!(mime_icon("image/jpeg"), "[img]");
        assert_eq!(mime_icon(DOCX_MIME), "[doc]");
        assert_eq!(mime_icon("text/csv"), "[---]");
    }
}
