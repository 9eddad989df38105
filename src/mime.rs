//! Declared MIME types for input files.
//!
//! A file's *declared* type is what the caller says it is, before a single
//! byte is decoded. Files read from disk declare the type implied by their
//! extension; library callers may declare one explicitly. Only the three
//! formats the converter advertises pass the gate:
//!
//! | Extension | Declared type | Accepted |
//! |---|---|---|
//! | `png` | `image/png` | yes |
//! | `jpg`, `jpeg` | `image/jpeg` | yes |
//! | `gif` | `image/gif` | yes |
//! | `webp`, `bmp`, `tif`, `tiff`, `svg`, `avif` | `image/*` | no |
//! | anything else | `text/plain`, `application/...` | no |

use std::path::Path;

/// MIME type of every converted output.
pub const OUTPUT_MIME: &str = "image/webp";

/// Declared types the upload gate lets through.
pub const ACCEPTED_TYPES: &[&str] = &["image/png", "image/jpeg", "image/gif"];

/// Fallback for extensions with no better-known type.
pub const UNKNOWN_MIME: &str = "application/octet-stream";

const EXTENSION_TYPES: &[(&str, &str)] = &[
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("bmp", "image/bmp"),
    ("tif", "image/tiff"),
    ("tiff", "image/tiff"),
    ("svg", "image/svg+xml"),
    ("avif", "image/avif"),
    ("txt", "text/plain"),
    ("md", "text/markdown"),
    ("json", "application/json"),
    ("pdf", "application/pdf"),
];

/// Declared type for a path, from its extension (case-insensitive).
pub fn mime_for_path(path: &Path) -> &'static str {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return UNKNOWN_MIME;
    };
    EXTENSION_TYPES
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(ext))
        .map(|(_, mime)| *mime)
        .unwrap_or(UNKNOWN_MIME)
}

/// Whether a declared type is one the converter accepts.
pub fn is_accepted(mime: &str) -> bool {
    let essence = mime.split(';').next().unwrap_or("").trim();
    ACCEPTED_TYPES
        .iter()
        .any(|accepted| accepted.eq_ignore_ascii_case(essence))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extensions_map_to_declared_types() {
        assert_eq!(mime_for_path(Path::new("a.png")), "image/png");
        assert_eq!(mime_for_path(Path::new("a.JPG")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("dir/a.jpeg")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("a.gif")), "image/gif");
        assert_eq!(mime_for_path(Path::new("notes.txt")), "text/plain");
    }

    #[test]
    fn unknown_or_missing_extension_is_octet_stream() {
        assert_eq!(mime_for_path(Path::new("README")), UNKNOWN_MIME);
        assert_eq!(mime_for_path(Path::new("a.xyz")), UNKNOWN_MIME);
    }

    #[test]
    fn only_png_jpeg_gif_accepted() {
        assert!(is_accepted("image/png"));
        assert!(is_accepted("image/jpeg"));
        assert!(is_accepted("image/gif"));
        assert!(!is_accepted("image/webp"));
        assert!(!is_accepted("image/svg+xml"));
        assert!(!is_accepted("text/plain"));
        assert!(!is_accepted(""));
    }

    #[test]
    fn accepted_check_ignores_case_and_parameters() {
        assert!(is_accepted("IMAGE/PNG"));
        assert!(is_accepted("image/jpeg; charset=binary"));
    }
}
