//! MIME type detection module
//!
//! Picks a download `Content-Type` when the caller of `send_file` does not
//! supply one.

use std::path::Path;

/// Fallback for anything unrecognised; browsers save these instead of rendering
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Guess the MIME type of a file from its extension (case-insensitive)
///
/// # Examples
/// ```
/// use restpoint::http::mime::content_type_for;
/// use std::path::Path;
/// assert_eq!(content_type_for(Path::new("report.PDF")), "application/pdf");
/// assert_eq!(content_type_for(Path::new("notes")), "application/octet-stream");
/// ```
pub fn content_type_for(path: &Path) -> &'static str {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return OCTET_STREAM;
    };

    match ext.to_ascii_lowercase().as_str() {
        "json" => "application/json",
        "txt" | "log" | "md" => "text/plain; charset=utf-8",
        "csv" => "text/csv; charset=utf-8",
        "html" | "htm" => "text/html; charset=utf-8",
        "xml" => "application/xml",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "gz" | "tgz" => "application/gzip",
        "tar" => "application/x-tar",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "mp3" => "audio/mpeg",
        "mp4" => "video/mp4",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => OCTET_STREAM,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_types() {
        assert_eq!(content_type_for(Path::new("a/b/data.csv")), "text/csv; charset=utf-8");
        assert_eq!(content_type_for(Path::new("export.json")), "application/json");
        assert_eq!(content_type_for(Path::new("backup.tar")), "application/x-tar");
    }

    #[test]
    fn test_extension_case_is_ignored() {
        assert_eq!(content_type_for(Path::new("PHOTO.JPG")), "image/jpeg");
    }

    #[test]
    fn test_unknown_or_missing_extension() {
        assert_eq!(content_type_for(Path::new("blob.xyz")), OCTET_STREAM);
        assert_eq!(content_type_for(Path::new("Makefile")), OCTET_STREAM);
    }
}
