//! Pure calculation functions for thumbnail dimensions.
//!
//! Format sizing lives in [`fitting`](crate::fitting); this covers the one
//! size the renderer computes itself.

/// Shrink `source` to fit inside `bounds`, preserving the aspect ratio.
///
/// Never enlarges. Width is clamped first, then height; the scaled axis is
/// floored and kept at least one pixel.
///
/// # Examples
/// ```
/// # use photo_formats::render::thumbnail_dimensions;
/// assert_eq!(thumbnail_dimensions((800, 600), (80, 80)), (80, 60));
/// assert_eq!(thumbnail_dimensions((50, 40), (80, 80)), (50, 40));
/// ```
pub fn thumbnail_dimensions(source: (u32, u32), bounds: (u32, u32)) -> (u32, u32) {
    let (mut w, mut h) = (u64::from(source.0), u64::from(source.1));
    let (max_w, max_h) = (u64::from(bounds.0), u64::from(bounds.1));

    if w > max_w {
        h = (h * max_w / w).max(1);
        w = max_w;
    }
    if h > max_h {
        w = (w * max_h / h).max(1);
        h = max_h;
    }

    (w as u32, h as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thumbnail_landscape() {
        assert_eq!(thumbnail_dimensions((800, 600), (80, 80)), (80, 60));
    }

    #[test]
    fn thumbnail_portrait() {
        // Width first: 600x800 → 80x106, then height: 106 → 80, width 80*80/106 = 60
        assert_eq!(thumbnail_dimensions((600, 800), (80, 80)), (60, 80));
    }

    #[test]
    fn thumbnail_square() {
        assert_eq!(thumbnail_dimensions((1000, 1000), (80, 80)), (80, 80));
    }

    #[test]
    fn thumbnail_smaller_than_box_is_unchanged() {
        assert_eq!(thumbnail_dimensions((50, 40), (80, 80)), (50, 40));
    }

    #[test]
    fn thumbnail_extreme_strip_keeps_a_pixel() {
        assert_eq!(thumbnail_dimensions((1000, 10), (80, 80)), (80, 1));
    }

    #[test]
    fn thumbnail_non_square_box() {
        assert_eq!(thumbnail_dimensions((1920, 1080), (160, 120)), (160, 90));
    }
}
