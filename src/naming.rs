//! Output filename derivation.
//!
//! A converted file keeps the original's stem and swaps the extension for
//! `.webp`. The stem is everything before the *last* dot, so multi-dot names
//! keep their inner dots:
//!
//! - `photo.png` → `photo.webp`
//! - `archive.2024.jpg` → `archive.2024.webp`
//! - `README` → `README.webp` (no dot, whole name is the stem)
//! - `.hidden` → `.webp` (dot at position 0, empty stem)
//!
//! Only the final path component counts: `../shots/dawn.png` names
//! `dawn.webp`, so an output always lands directly in its target directory.

use std::path::Path;

/// Extension given to every converted file.
pub const OUTPUT_EXTENSION: &str = "webp";

/// The part of `name` before its last dot, or the whole name if it has none.
pub fn stem(name: &str) -> &str {
    match name.rfind('.') {
        Some(dot) => &name[..dot],
        None => name,
    }
}

/// Name of the converted artifact for an original file name.
pub fn output_name(original_name: &str) -> String {
    let base = Path::new(original_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");
    format!("{}.{}", stem(base), OUTPUT_EXTENSION)
}
