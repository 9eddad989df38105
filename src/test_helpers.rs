//! Shared test utilities for the webpify test suite.
//!
//! Synthetic images are generated in-test with the `image` crate so no binary
//! fixtures need to live in the repository.
//!
//! # Usage
//!
//! ```ignore
//! use crate::test_helpers::*;
//!
//! let tmp = tempfile::TempDir::new().unwrap();
//! let path = write_synthetic_png(tmp.path(), "dawn.png", 800, 600);
//! let file = SourceFile::from_path(&path).unwrap();
//! ```

use crate::upload::SourceFile;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;
use std::path::{Path, PathBuf};

// =========================================================================
// Synthetic images
// =========================================================================

/// Encode a gradient-plus-noise image in the given format.
///
/// The noise term keeps the encoder honest: flat images compress to nearly
/// nothing at every quality, which hides quality/size relationships.
pub fn synthetic_bytes(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        let noise = ((x * 7919 + y * 104_729) % 61) as u8;
        Rgba([
            (x % 256) as u8,
            (y % 256) as u8,
            128u8.wrapping_add(noise),
            255,
        ])
    });
    let dynamic = match format {
        // JPEG has no alpha channel
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(img).to_rgb8()),
        _ => DynamicImage::ImageRgba8(img),
    };
    let mut buf = Vec::new();
    dynamic
        .write_to(&mut Cursor::new(&mut buf), format)
        .unwrap();
    buf
}

/// A 64x48 PNG wrapped as an accepted upload.
///
/// With the mock backend the bytes are never decoded; they only give the
/// original a realistic size.
pub fn png_source(name: &str) -> SourceFile {
    SourceFile::new(name, "image/png", synthetic_bytes(64, 48, ImageFormat::Png))
}

// =========================================================================
// Files on disk
// =========================================================================

/// Write a synthetic PNG into `dir` and return its path.
pub fn write_synthetic_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    write_synthetic(dir, name, width, height, ImageFormat::Png)
}

/// Write a synthetic image in any format into `dir` and return its path.
pub fn write_synthetic(
    dir: &Path,
    name: &str,
    width: u32,
    height: u32,
    format: ImageFormat,
) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, synthetic_bytes(width, height, format)).unwrap();
    path
}
