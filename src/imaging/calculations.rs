//! Pure calculation functions for trim bounds and resize dimensions.
//!
//! Nothing here touches the filesystem or an encoder; everything works on
//! dimensions or an in-memory pixel buffer and is unit testable directly.

use image::{Rgba, RgbaImage};

/// Calculate the output width for a height-normalised resize.
///
/// `width = round(source_width × target_height / source_height)`, never
/// less than 1 so extremely wide-to-narrow scales still yield an image.
///
/// # Examples
/// ```
/// # use trimpress::imaging::scaled_width;
/// assert_eq!(scaled_width((400, 300), 700), 933);
/// assert_eq!(scaled_width((1000, 1000), 700), 700);
/// ```
pub fn scaled_width(source: (u32, u32), target_height: u32) -> u32 {
    let (src_w, src_h) = source;
    let w = (src_w as f64 * target_height as f64 / src_h as f64).round();
    (w as u32).max(1)
}

/// Rectangle to keep after trimming, in source pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Largest per-channel distance between two RGBA pixels.
fn channel_delta(a: &Rgba<u8>, b: &Rgba<u8>) -> u8 {
    a.0.iter()
        .zip(b.0.iter())
        .map(|(x, y)| x.abs_diff(*y))
        .max()
        .unwrap_or(0)
}

/// Find the bounding box of everything that is not background.
///
/// The background reference is the top-left pixel. Rows are scanned inward
/// from the top and bottom edges, columns from the left and right edges,
/// each scan stopping at the first line holding a pixel whose
/// [channel delta](channel_delta) exceeds `threshold`.
///
/// Returns `None` when no pixel deviates (a blank image) or the buffer is
/// empty; callers keep the original bounds in that case.
pub fn content_bounds(pixels: &RgbaImage, threshold: u8) -> Option<CropBox> {
    let (width, height) = pixels.dimensions();
    if width == 0 || height == 0 {
        return None;
    }

    let reference = *pixels.get_pixel(0, 0);
    let deviates = |x: u32, y: u32| channel_delta(pixels.get_pixel(x, y), &reference) > threshold;
    let row_has_content = |y: u32| (0..width).any(|x| deviates(x, y));

    let top = (0..height).find(|&y| row_has_content(y))?;
    let bottom = (top..height)
        .rev()
        .find(|&y| row_has_content(y))
        .unwrap_or(top);

    // Only rows inside [top, bottom] can hold content.
    let column_has_content = |x: u32| (top..=bottom).any(|y| deviates(x, y));
    let left = (0..width).find(|&x| column_has_content(x)).unwrap_or(0);
    let right = (left..width)
        .rev()
        .find(|&x| column_has_content(x))
        .unwrap_or(left);

    Some(CropBox {
        x: left,
        y: top,
        width: right - left + 1,
        height: bottom - top + 1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn framed(width: u32, height: u32, border: u32, bg: [u8; 4], fg: [u8; 4]) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            let inside =
                x >= border && y >= border && x < width - border && y < height - border;
            Rgba(if inside { fg } else { bg })
        })
    }

    // =========================================================================
    // scaled_width tests
    // =========================================================================

    #[test]
    fn scaled_width_landscape() {
        // 400x300 → height 700: 400 * 700 / 300 = 933.33
        assert_eq!(scaled_width((400, 300), 700), 933);
    }

    #[test]
    fn scaled_width_portrait() {
        // 300x400 → height 700: 300 * 700 / 400 = 525
        assert_eq!(scaled_width((300, 400), 700), 525);
    }

    #[test]
    fn scaled_width_upscales_short_sources() {
        // 100x50 → height 700: 1400
        assert_eq!(scaled_width((100, 50), 700), 1400);
    }

    #[test]
    fn scaled_width_rounds_to_nearest() {
        // 360 * 700 / 260 = 969.23
        assert_eq!(scaled_width((360, 260), 700), 969);
        // 5 * 3 / 2 = 7.5 rounds away from zero
        assert_eq!(scaled_width((5, 2), 3), 8);
    }

    #[test]
    fn scaled_width_never_zero() {
        assert_eq!(scaled_width((1, 10_000), 10), 1);
    }

    // =========================================================================
    // content_bounds tests
    // =========================================================================

    #[test]
    fn bounds_strip_uniform_border() {
        let img = framed(400, 300, 20, [255, 255, 255, 255], [20, 40, 60, 255]);
        let bounds = content_bounds(&img, 100).unwrap();
        assert_eq!(
            bounds,
            CropBox {
                x: 20,
                y: 20,
                width: 360,
                height: 260
            }
        );
    }

    #[test]
    fn bounds_none_for_blank_image() {
        let img = RgbaImage::from_pixel(50, 40, Rgba([200, 200, 200, 255]));
        assert_eq!(content_bounds(&img, 10), None);
    }

    #[test]
    fn bounds_none_when_all_within_threshold() {
        // Content differs by 80, below the threshold of 100
        let img = framed(60, 60, 10, [255, 255, 255, 255], [175, 175, 175, 255]);
        assert_eq!(content_bounds(&img, 100), None);
    }

    #[test]
    fn bounds_threshold_is_exclusive() {
        // Difference of exactly the threshold is still background
        let img = framed(30, 30, 5, [100, 100, 100, 255], [150, 100, 100, 255]);
        assert_eq!(content_bounds(&img, 50), None);
        assert!(content_bounds(&img, 49).is_some());
    }

    #[test]
    fn bounds_asymmetric_border() {
        let img = RgbaImage::from_fn(100, 80, |x, y| {
            if (10..=69).contains(&x) && (5..=49).contains(&y) {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        });
        let bounds = content_bounds(&img, 100).unwrap();
        assert_eq!(
            bounds,
            CropBox {
                x: 10,
                y: 5,
                width: 60,
                height: 45
            }
        );
    }

    #[test]
    fn bounds_alpha_counts_as_a_channel() {
        // Transparent background, opaque content of the same colour
        let img = framed(40, 40, 8, [255, 255, 255, 0], [255, 255, 255, 255]);
        let bounds = content_bounds(&img, 100).unwrap();
        assert_eq!((bounds.width, bounds.height), (24, 24));
    }

    #[test]
    fn bounds_no_border_keeps_everything() {
        // Content touches every edge: corner pixel is the reference but every
        // edge line still contains deviating pixels.
        let img = RgbaImage::from_fn(20, 10, |x, y| {
            if (x + y) % 2 == 0 {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        });
        let bounds = content_bounds(&img, 100).unwrap();
        assert_eq!(
            bounds,
            CropBox {
                x: 0,
                y: 0,
                width: 20,
                height: 10
            }
        );
    }

    #[test]
    fn bounds_single_pixel_content() {
        let mut img = RgbaImage::from_pixel(9, 9, Rgba([255, 255, 255, 255]));
        img.put_pixel(4, 6, Rgba([0, 0, 0, 255]));
        let bounds = content_bounds(&img, 0).unwrap();
        assert_eq!(
            bounds,
            CropBox {
                x: 4,
                y: 6,
                width: 1,
                height: 1
            }
        );
    }

    #[test]
    fn bounds_empty_buffer() {
        let img = RgbaImage::new(0, 0);
        assert_eq!(content_bounds(&img, 0), None);
    }

    #[test]
    fn bounds_never_exceed_source() {
        let img = framed(33, 17, 3, [0, 0, 0, 255], [255, 0, 0, 255]);
        let b = content_bounds(&img, 10).unwrap();
        assert!(b.x + b.width <= 33);
        assert!(b.y + b.height <= 17);
    }
}
