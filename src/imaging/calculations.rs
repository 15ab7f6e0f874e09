//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Largest size that fits within the bounds while keeping the aspect ratio.
///
/// Images are never upscaled: a source already inside the bounds comes back
/// unchanged. Missing bounds are unconstrained. Neither side drops below 1.
///
/// # Examples
/// ```
/// # use bakehouse::imaging::calculate_fit_dimensions;
/// // Landscape into a 200x200 box → width-limited
/// assert_eq!(calculate_fit_dimensions((800, 600), Some(200), Some(200)), (200, 150));
///
/// // Height bound only
/// assert_eq!(calculate_fit_dimensions((800, 600), None, Some(300)), (400, 300));
/// ```
pub fn calculate_fit_dimensions(
    source: (u32, u32),
    max_width: Option<u32>,
    max_height: Option<u32>,
) -> (u32, u32) {
    let (src_w, src_h) = source;
    if src_w == 0 || src_h == 0 {
        return source;
    }

    let scale_w = max_width.map_or(1.0, |w| w as f64 / src_w as f64);
    let scale_h = max_height.map_or(1.0, |h| h as f64 / src_h as f64);
    let scale = scale_w.min(scale_h).min(1.0);
    if scale >= 1.0 {
        return source;
    }

    let w = ((src_w as f64 * scale).round() as u32).max(1);
    let h = ((src_h as f64 * scale).round() as u32).max(1);
    (w, h)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn landscape_limited_by_width() {
        assert_eq!(calculate_fit_dimensions((800, 600), Some(200), Some(200)), (200, 150));
    }

    #[test]
    fn portrait_limited_by_height() {
        assert_eq!(calculate_fit_dimensions((600, 800), Some(200), Some(200)), (150, 200));
    }

    #[test]
    fn single_bound() {
        assert_eq!(calculate_fit_dimensions((800, 600), Some(400), None), (400, 300));
        assert_eq!(calculate_fit_dimensions((800, 600), None, Some(300)), (400, 300));
    }

    #[test]
    fn never_upscales() {
        assert_eq!(calculate_fit_dimensions((100, 50), Some(400), Some(400)), (100, 50));
        assert_eq!(calculate_fit_dimensions((100, 50), None, None), (100, 50));
    }

    #[test]
    fn extreme_aspect_keeps_one_pixel() {
        assert_eq!(calculate_fit_dimensions((4000, 2), Some(100), None), (100, 1));
    }
}
