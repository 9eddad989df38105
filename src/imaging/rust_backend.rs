//! Pure Rust decoding plus libwebp encoding.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (PNG, JPEG, GIF) | `image::ImageReader` with format sniffing |
//! | Draw at target size | `image::imageops::resize` (exact, no aspect preservation) |
//! | Encode → lossy WebP | `webp::Encoder::encode_simple` |
//!
//! GIF input decodes to its first frame. The drawn surface is always RGBA8 so
//! transparency survives the conversion.

use super::backend::{BackendError, DecodedImage, Dimensions, EncodedImage, ImageBackend};
use super::calculations::fits_webp;
use super::params::EncodeParams;
use image::{DynamicImage, ImageReader, RgbaImage};
use std::io::Cursor;

/// Backend built on the `image` and `webp` crates.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Draw the source onto an RGBA surface of the requested size.
fn draw_surface(source: &DynamicImage, params: &EncodeParams) -> RgbaImage {
    if source.width() == params.width && source.height() == params.height {
        return source.to_rgba8();
    }
    source
        .resize_exact(params.width, params.height, params.filter.filter_type())
        .to_rgba8()
}

impl ImageBackend for RustBackend {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, BackendError> {
        let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
        if reader.format().is_none() {
            return Err(BackendError::Decode("unrecognized image data".to_string()));
        }
        let pixels = reader
            .decode()
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        Ok(DecodedImage::new(pixels))
    }

    fn encode(
        &self,
        source: &DecodedImage,
        params: &EncodeParams,
    ) -> Result<EncodedImage, BackendError> {
        if !fits_webp(params.width, params.height) {
            return Err(BackendError::SurfaceTooLarge {
                width: params.width,
                height: params.height,
            });
        }

        let surface = draw_surface(source.pixels(), params);
        let encoder = webp::Encoder::from_rgba(surface.as_raw(), params.width, params.height);
        let memory = encoder
            .encode_simple(false, params.quality.as_factor())
            .map_err(|e| BackendError::Encode(format!("{e:?}")))?;

        Ok(EncodedImage {
            bytes: memory.to_vec(),
            dimensions: Dimensions {
                width: params.width,
                height: params.height,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::params::{Quality, ResizeFilter};
    use crate::test_helpers::synthetic_bytes;
    use image::ImageFormat;

    fn params(width: u32, height: u32, quality: u32) -> EncodeParams {
        EncodeParams {
            width,
            height,
            quality: Quality::new(quality),
            filter: ResizeFilter::default(),
        }
    }

    fn is_webp(bytes: &[u8]) -> bool {
        bytes.len() >= 12 && bytes[0..4] == *b"RIFF" && bytes[8..12] == *b"WEBP"
    }

    #[test]
    fn decode_png_dimensions() {
        let backend = RustBackend::new();
        let decoded = backend
            .decode(&synthetic_bytes(200, 150, ImageFormat::Png))
            .unwrap();
        assert_eq!(
            decoded.dimensions(),
            Dimensions {
                width: 200,
                height: 150
            }
        );
    }

    #[test]
    fn decode_jpeg_and_gif() {
        let backend = RustBackend::new();
        let jpeg = backend
            .decode(&synthetic_bytes(64, 48, ImageFormat::Jpeg))
            .unwrap();
        assert_eq!(jpeg.dimensions().width, 64);

        let gif = backend
            .decode(&synthetic_bytes(32, 40, ImageFormat::Gif))
            .unwrap();
        assert_eq!(gif.dimensions().height, 40);
    }

    #[test]
    fn decode_garbage_fails() {
        let backend = RustBackend::new();
        let result = backend.decode(b"definitely not an image");
        assert!(matches!(result, Err(BackendError::Decode(_))));
    }

    #[test]
    fn decode_truncated_png_fails() {
        let backend = RustBackend::new();
        let bytes = synthetic_bytes(64, 64, ImageFormat::Png);
        assert!(backend.decode(&bytes[..bytes.len() / 3]).is_err());
    }

    #[test]
    fn encode_produces_webp_at_requested_size() {
        let backend = RustBackend::new();
        let source = backend
            .decode(&synthetic_bytes(200, 150, ImageFormat::Png))
            .unwrap();

        let out = backend.encode(&source, &params(100, 40, 75)).unwrap();
        assert!(is_webp(&out.bytes));
        assert_eq!(
            out.dimensions,
            Dimensions {
                width: 100,
                height: 40
            }
        );

        let roundtrip = image::load_from_memory_with_format(&out.bytes, ImageFormat::WebP).unwrap();
        assert_eq!((roundtrip.width(), roundtrip.height()), (100, 40));
    }

    #[test]
    fn encode_is_deterministic() {
        let backend = RustBackend::new();
        let source = backend
            .decode(&synthetic_bytes(120, 90, ImageFormat::Png))
            .unwrap();

        let a = backend.encode(&source, &params(60, 45, 75)).unwrap();
        let b = backend.encode(&source, &params(60, 45, 75)).unwrap();
        assert_eq!(a.size(), b.size());
    }

    #[test]
    fn higher_quality_is_larger_on_average() {
        let backend = RustBackend::new();
        let sources = [
            synthetic_bytes(160, 120, ImageFormat::Png),
            synthetic_bytes(97, 211, ImageFormat::Jpeg),
        ];

        for bytes in &sources {
            let source = backend.decode(bytes).unwrap();
            let dims = source.dimensions();
            let size_at = |q: u32| {
                backend
                    .encode(&source, &params(dims.width, dims.height, q))
                    .unwrap()
                    .size()
            };

            let low: u64 = [5, 15, 25, 35].iter().map(|&q| size_at(q)).sum();
            let high: u64 = [65, 75, 85, 95].iter().map(|&q| size_at(q)).sum();
            assert!(high > low, "high-quality total {high} <= low-quality total {low}");
        }
    }

    #[test]
    fn encode_rejects_oversized_surface() {
        let backend = RustBackend::new();
        let source = backend
            .decode(&synthetic_bytes(8, 8, ImageFormat::Png))
            .unwrap();

        let result = backend.encode(&source, &params(20_000, 10, 75));
        assert!(matches!(
            result,
            Err(BackendError::SurfaceTooLarge {
                width: 20_000,
                height: 10
            })
        ));
    }
}
