//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the seam between session logic and pixel
//! work. It has exactly two operations, mirroring the two platform calls a
//! converter needs: decode file bytes into a surface, and draw that surface
//! at a target size and serialize it as WebP.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend). Tests use the
//! [`MockBackend`](tests::MockBackend), which records calls and fabricates
//! deterministic output sizes.

use super::params::EncodeParams;
use image::DynamicImage;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Encode failed: {0}")]
    Encode(String),
    #[error("Cannot create a {width}x{height} surface")]
    SurfaceTooLarge { width: u32, height: u32 },
}

/// Pixel dimensions of an image or surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A decoded source image, shared cheaply between the session and workers.
#[derive(Clone)]
pub struct DecodedImage {
    dimensions: Dimensions,
    pixels: Arc<DynamicImage>,
}

impl DecodedImage {
    pub fn new(pixels: DynamicImage) -> Self {
        Self {
            dimensions: Dimensions {
                width: pixels.width(),
                height: pixels.height(),
            },
            pixels: Arc::new(pixels),
        }
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    pub fn pixels(&self) -> &DynamicImage {
        &self.pixels
    }
}

impl fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedImage")
            .field("dimensions", &self.dimensions)
            .finish_non_exhaustive()
    }
}

/// The serialized WebP output of one encode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub dimensions: Dimensions,
}

impl EncodedImage {
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Trait for image processing backends.
///
/// `Sync` so one backend can serve a rayon batch and the background worker.
pub trait ImageBackend: Sync {
    /// Decode encoded file bytes (PNG, JPEG, GIF) into a pixel surface.
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, BackendError>;

    /// Draw `source` onto a `params.width` x `params.height` surface and
    /// serialize it as lossy WebP at `params.quality`.
    fn encode(
        &self,
        source: &DecodedImage,
        params: &EncodeParams,
    ) -> Result<EncodedImage, BackendError>;
}
