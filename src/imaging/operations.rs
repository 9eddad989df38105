//! High-level image operations.
//!
//! These functions combine calculations with backend execution. They take a
//! decoded source plus settings, compute parameters, and call the backend.

use super::backend::{BackendError, DecodedImage, Dimensions, EncodedImage, ImageBackend};
use super::params::{EncodeParams, Quality, ResizeFilter};
use std::time::Instant;
use tracing::debug;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Build encode parameters for a target size.
pub fn plan_encode(target: Dimensions, quality: Quality, filter: ResizeFilter) -> EncodeParams {
    EncodeParams {
        width: target.width,
        height: target.height,
        quality,
        filter,
    }
}

/// Run one conversion: draw at the target size and encode as WebP.
pub fn convert(
    backend: &(impl ImageBackend + ?Sized),
    source: &DecodedImage,
    params: &EncodeParams,
) -> Result<EncodedImage> {
    let started = Instant::now();
    let encoded = backend.encode(source, params)?;
    debug!(
        width = params.width,
        height = params.height,
        quality = params.quality.value(),
        bytes = encoded.size(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "encoded webp"
    );
    Ok(encoded)
}

/// Encoded size at one quality setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct SweepPoint {
    pub quality: u32,
    pub size: u64,
}

/// Qualities from 1 to 100 inclusive in `step` increments, always ending at 100.
pub fn sweep_qualities(step: u32) -> Vec<Quality> {
    let step = step.max(1) as usize;
    let mut qualities: Vec<Quality> = (Quality::MIN..=Quality::MAX)
        .step_by(step)
        .map(Quality::new)
        .collect();
    if qualities.last().map(|q| q.value()) != Some(Quality::MAX) {
        qualities.push(Quality::new(Quality::MAX));
    }
    qualities
}

/// Encode the same source at several qualities and report each size.
pub fn quality_sweep(
    backend: &(impl ImageBackend + ?Sized),
    source: &DecodedImage,
    target: Dimensions,
    filter: ResizeFilter,
    qualities: &[Quality],
) -> Result<Vec<SweepPoint>> {
    qualities
        .iter()
        .map(|&quality| {
            let encoded = convert(backend, source, &plan_encode(target, quality, filter))?;
            Ok(SweepPoint {
                quality: quality.value(),
                size: encoded.size(),
            })
        })
        .collect()
}

/// Whether sizes grow with quality on average: the mean size of the upper
/// half of the sweep is at least the mean of the lower half. Individual
/// steps may dip, which is codec behavior.
pub fn grows_with_quality(points: &[SweepPoint]) -> bool {
    if points.len() < 2 {
        return true;
    }
    let mut sorted = points.to_vec();
    sorted.sort_by_key(|p| p.quality);
    let (low, high) = sorted.split_at(sorted.len() / 2);
    let mean = |half: &[SweepPoint]| {
        half.iter().map(|p| p.size as f64).sum::<f64>() / half.len() as f64
    };
    mean(high) >= mean(low)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp, mock_size};

    fn dims(width: u32, height: u32) -> Dimensions {
        Dimensions { width, height }
    }

    #[test]
    fn plan_encode_copies_settings() {
        let params = plan_encode(dims(400, 300), Quality::new(60), ResizeFilter::Triangle);
        assert_eq!(params.width, 400);
        assert_eq!(params.height, 300);
        assert_eq!(params.quality.value(), 60);
        assert_eq!(params.filter, ResizeFilter::Triangle);
    }

    #[test]
    fn convert_passes_params_through() {
        let backend = MockBackend::with_dimensions(vec![dims(800, 600)]);
        let source = backend.decode(b"x").unwrap();
        let params = plan_encode(dims(400, 300), Quality::new(75), ResizeFilter::default());

        let out = convert(&backend, &source, &params).unwrap();
        assert_eq!(out.dimensions, dims(400, 300));
        assert_eq!(
            backend.get_operations().last(),
            Some(&RecordedOp::Encode {
                width: 400,
                height: 300,
                quality: 75
            })
        );
    }

    #[test]
    fn sweep_qualities_cover_range() {
        let qs: Vec<u32> = sweep_qualities(25).iter().map(|q| q.value()).collect();
        assert_eq!(qs, vec![1, 26, 51, 76, 100]);
    }

    #[test]
    fn sweep_qualities_step_zero_treated_as_one() {
        assert_eq!(sweep_qualities(0).len(), 100);
    }

    #[test]
    fn quality_sweep_reports_each_point() {
        let backend = MockBackend::with_dimensions(vec![dims(100, 100)]);
        let source = backend.decode(b"x").unwrap();
        let qualities = [Quality::new(10), Quality::new(90)];

        let points =
            quality_sweep(&backend, &source, dims(100, 100), ResizeFilter::default(), &qualities)
                .unwrap();
        assert_eq!(
            points,
            vec![
                SweepPoint {
                    quality: 10,
                    size: mock_size(100, 100, 10)
                },
                SweepPoint {
                    quality: 90,
                    size: mock_size(100, 100, 90)
                },
            ]
        );
        assert!(grows_with_quality(&points));
    }

    #[test]
    fn grows_with_quality_tolerates_local_dips() {
        let points = [
            SweepPoint { quality: 10, size: 100 },
            SweepPoint { quality: 20, size: 90 },
            SweepPoint { quality: 80, size: 300 },
            SweepPoint { quality: 90, size: 280 },
        ];
        assert!(grows_with_quality(&points));
    }

    #[test]
    fn grows_with_quality_detects_inversion() {
        let points = [
            SweepPoint { quality: 10, size: 500 },
            SweepPoint { quality: 90, size: 100 },
        ];
        assert!(!grows_with_quality(&points));
    }
}
