//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Largest edge libwebp can encode, in pixels.
pub const WEBP_MAX_DIMENSION: u32 = 16383;

/// Width-over-height ratio of an image.
///
/// A zero height (never produced by a successful decode) yields `1.0` rather
/// than infinity so downstream rounding stays finite.
pub fn aspect_ratio(width: u32, height: u32) -> f64 {
    if height == 0 {
        return 1.0;
    }
    width as f64 / height as f64
}

/// Clamp a requested dimension to the 1px minimum.
pub fn clamp_dimension(value: u32) -> u32 {
    value.max(1)
}

/// Height that keeps `width` at the locked aspect ratio.
///
/// # Examples
/// ```
/// # use webpify::imaging::calculations::height_for_width;
/// // 4:3 source, width 400 → height 300
/// assert_eq!(height_for_width(400, 800.0 / 600.0), 300);
/// ```
pub fn height_for_width(width: u32, ratio: f64) -> u32 {
    clamp_dimension((width as f64 / ratio).round() as u32)
}

/// Width that keeps `height` at the locked aspect ratio.
///
/// # Examples
/// ```
/// # use webpify::imaging::calculations::width_for_height;
/// // 4:3 source, height 300 → width 400
/// assert_eq!(width_for_height(300, 800.0 / 600.0), 400);
/// ```
pub fn width_for_height(height: u32, ratio: f64) -> u32 {
    clamp_dimension((height as f64 * ratio).round() as u32)
}

/// Whether a surface of this size can be handed to the WebP encoder.
pub fn fits_webp(width: u32, height: u32) -> bool {
    (1..=WEBP_MAX_DIMENSION).contains(&width) && (1..=WEBP_MAX_DIMENSION).contains(&height)
}

/// Percentage saved by the conversion, rounded to the nearest whole percent.
///
/// Only reported when the converted file is actually smaller.
pub fn savings_percent(original_size: u64, converted_size: u64) -> Option<u32> {
    if original_size == 0 || converted_size >= original_size {
        return None;
    }
    let ratio = converted_size as f64 / original_size as f64;
    Some((100.0 - ratio * 100.0).round() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // aspect ratio
    // =========================================================================

    #[test]
    fn aspect_ratio_landscape() {
        assert!((aspect_ratio(800, 600) - 4.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn aspect_ratio_zero_height_is_finite() {
        assert_eq!(aspect_ratio(10, 0), 1.0);
    }

    // =========================================================================
    // locked counterparts
    // =========================================================================

    #[test]
    fn height_follows_width_for_4_3() {
        let ratio = aspect_ratio(800, 600);
        assert_eq!(height_for_width(400, ratio), 300);
        assert_eq!(height_for_width(1000, ratio), 750);
    }

    #[test]
    fn width_follows_height_for_4_3() {
        let ratio = aspect_ratio(800, 600);
        assert_eq!(width_for_height(300, ratio), 400);
        assert_eq!(width_for_height(1, ratio), 1);
    }

    #[test]
    fn counterpart_rounds_to_nearest() {
        // 3:2, width 101 → 67.33 → 67
        assert_eq!(height_for_width(101, 1.5), 67);
        // 3:2, height 67 → 100.5 → 101 (half rounds up)
        assert_eq!(width_for_height(67, 1.5), 101);
    }

    #[test]
    fn counterpart_never_drops_below_one() {
        // 10000x1 strip, width 1 → 0.0001 would round to 0
        let ratio = aspect_ratio(10_000, 1);
        assert_eq!(height_for_width(1, ratio), 1);
    }

    #[test]
    fn locked_height_within_one_pixel_across_widths() {
        for (w, h) in [(800, 600), (1920, 1080), (333, 777), (1, 50), (4096, 17)] {
            let ratio = aspect_ratio(w, h);
            for target in [1u32, 7, 99, 400, 1000, 2999] {
                let derived = height_for_width(target, ratio);
                let exact = target as f64 / ratio;
                assert!(
                    (derived as f64 - exact.max(1.0)).abs() <= 1.0,
                    "{w}x{h}: width {target} gave height {derived}, exact {exact}"
                );
            }
        }
    }

    // =========================================================================
    // encoder limits and savings
    // =========================================================================

    #[test]
    fn webp_limit_boundaries() {
        assert!(fits_webp(1, 1));
        assert!(fits_webp(WEBP_MAX_DIMENSION, WEBP_MAX_DIMENSION));
        assert!(!fits_webp(WEBP_MAX_DIMENSION + 1, 10));
        assert!(!fits_webp(0, 10));
    }

    #[test]
    fn savings_reported_only_when_smaller() {
        assert_eq!(savings_percent(1000, 250), Some(75));
        assert_eq!(savings_percent(1000, 1000), None);
        assert_eq!(savings_percent(1000, 1500), None);
        assert_eq!(savings_percent(0, 0), None);
    }

    #[test]
    fn savings_rounds_to_nearest_percent() {
        // 1 - 333/1000 = 66.7% → 67
        assert_eq!(savings_percent(1000, 333), Some(67));
    }
}
