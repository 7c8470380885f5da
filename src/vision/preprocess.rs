//! Geometric normalization for template matching
//!
//! Converts a photograph to grayscale, rotates it so the dominant near-horizontal
//! line (the weld symbol reference line) becomes level, limits the width, and
//! trims the margins.

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, Luma};
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};
use tracing::{debug, info};

use super::lines::{find_segments, longest_near_horizontal, SegmentParams};
use crate::config::NormalizeConfig;

/// Fill for pixels uncovered by rotation; symbols are drawn on light paper
const BACKGROUND: Luma<u8> = Luma([255]);

/// Grayscale, alignment and scale normalization
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    config: NormalizeConfig,
}

impl Normalizer {
    pub fn new(config: NormalizeConfig) -> Self {
        Self { config }
    }

    /// Grayscale, level the reference line, and cap the width.
    ///
    /// When no qualifying line exists the image passes through unrotated.
    pub fn normalize(&self, image: &DynamicImage) -> GrayImage {
        let gray = to_grayscale(image);
        let aligned = self.align_horizontal(gray);
        self.limit_width(aligned)
    }

    /// Angle in degrees of the longest near-horizontal segment, if any
    pub fn alignment_angle(&self, gray: &GrayImage) -> Option<f64> {
        let params = SegmentParams {
            canny_low: self.config.canny_low,
            canny_high: self.config.canny_high,
            votes: self.config.hough_votes,
            min_length: self.config.min_line_length,
            max_gap: self.config.max_line_gap,
        };

        let segments = find_segments(gray, &params);
        let longest = longest_near_horizontal(&segments, self.config.max_tilt_degrees as f64, true)?;
        debug!(
            "Alignment line {:?} -> {:?} (length {:.1}, angle {:.2}°) out of {} segments",
            longest.start,
            longest.end,
            longest.length(),
            longest.angle_degrees(),
            segments.len()
        );
        Some(longest.angle_degrees())
    }

    fn align_horizontal(&self, gray: GrayImage) -> GrayImage {
        let Some(angle) = self.alignment_angle(&gray) else {
            info!("No near-horizontal line found; skipping rotation");
            return gray;
        };

        if angle == 0.0 {
            return gray;
        }

        // rotate_about_center turns clockwise for positive theta
        let theta = -(angle.to_radians()) as f32;
        debug!("Rotating by {:.2}° about the image center", -angle);
        rotate_about_center(&gray, theta, Interpolation::Bilinear, BACKGROUND)
    }

    fn limit_width(&self, image: GrayImage) -> GrayImage {
        let (width, height) = image.dimensions();
        if width <= self.config.max_width {
            return image;
        }

        let ratio = self.config.max_width as f64 / width as f64;
        let new_height = ((height as f64 * ratio) as u32).max(1);
        debug!("Downscaling {}x{} to {}x{}", width, height, self.config.max_width, new_height);

        imageops::resize(&image, self.config.max_width, new_height, FilterType::Triangle)
    }

    /// Trim the configured fraction from every edge
    pub fn crop(&self, image: GrayImage) -> GrayImage {
        crop_margins(image, self.config.crop_fraction)
    }
}

/// Luma conversion of any decoded color layout
pub fn to_grayscale(image: &DynamicImage) -> GrayImage {
    image.to_luma8()
}

/// Remove `fraction` of the width from left and right and of the height from
/// top and bottom
pub fn crop_margins(image: GrayImage, fraction: f32) -> GrayImage {
    let (width, height) = image.dimensions();
    let crop_x = (width as f32 * fraction) as u32;
    let crop_y = (height as f32 * fraction) as u32;

    if crop_x == 0 && crop_y == 0 {
        return image;
    }

    let new_width = width.saturating_sub(2 * crop_x);
    let new_height = height.saturating_sub(2 * crop_y);
    if new_width == 0 || new_height == 0 {
        return image;
    }

    imageops::crop_imm(&image, crop_x, crop_y, new_width, new_height).to_image()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use imageproc::drawing::{draw_filled_rect_mut, draw_line_segment_mut};
    use imageproc::rect::Rect;

    fn white(width: u32, height: u32) -> GrayImage {
        GrayImage::from_pixel(width, height, Luma([255]))
    }

    /// Five-pixel-thick dark line from (x0, y0) descending by `slope`
    fn draw_thick_line(img: &mut GrayImage, x0: f32, y0: f32, x1: f32, slope: f32) {
        for offset in 0..5 {
            let dy = offset as f32;
            draw_line_segment_mut(img, (x0, y0 + dy), (x1, y0 + dy + (x1 - x0) * slope), Luma([0]));
        }
    }

    #[test]
    fn test_grayscale_conversion() {
        let rgb = RgbImage::from_fn(2, 1, |x, _| if x == 0 { Rgb([0, 255, 0]) } else { Rgb([0, 0, 255]) });
        let gray = to_grayscale(&DynamicImage::ImageRgb8(rgb));

        assert_eq!(gray.dimensions(), (2, 1));
        assert!(gray.get_pixel(0, 0).0[0] > gray.get_pixel(1, 0).0[0], "green is brighter than blue");
    }

    #[test]
    fn test_blank_image_passes_through() {
        let img = white(320, 200);
        let normalized = Normalizer::default().normalize(&DynamicImage::ImageLuma8(img.clone()));
        assert_eq!(normalized, img);
    }

    #[test]
    fn test_level_line_is_not_rotated() {
        let mut img = white(320, 200);
        draw_filled_rect_mut(&mut img, Rect::at(20, 98).of_size(280, 5), Luma([0]));

        let normalizer = Normalizer::default();
        let angle = normalizer.alignment_angle(&img).unwrap();
        assert!(angle.abs() < 1e-9, "angle {}", angle);

        let normalized = normalizer.normalize(&DynamicImage::ImageLuma8(img.clone()));
        assert_eq!(normalized, img);
    }

    #[test]
    fn test_tilted_line_is_leveled() {
        let mut img = white(400, 300);
        let slope = 5.0f32.to_radians().tan();
        draw_thick_line(&mut img, 40.0, 130.0, 360.0, slope);

        let normalizer = Normalizer::default();
        let before = normalizer.alignment_angle(&img).unwrap();
        assert!((before - 5.0).abs() < 1.5, "detected tilt {}", before);

        let normalized = normalizer.normalize(&DynamicImage::ImageLuma8(img));
        assert_eq!(normalized.dimensions(), (400, 300));

        let after = normalizer.alignment_angle(&normalized).unwrap();
        assert!(after.abs() < 1.5, "residual tilt {}", after);
    }

    #[test]
    fn test_steep_lines_are_ignored() {
        let mut img = white(300, 300);
        let slope = 30.0f32.to_radians().tan();
        draw_thick_line(&mut img, 20.0, 40.0, 260.0, slope);

        assert!(Normalizer::default().alignment_angle(&img).is_none());
    }

    #[test]
    fn test_wide_image_is_downscaled() {
        let img = white(2400, 600);
        let normalized = Normalizer::default().normalize(&DynamicImage::ImageLuma8(img));
        assert_eq!(normalized.dimensions(), (1200, 300));
    }

    #[test]
    fn test_crop_margins() {
        let img = GrayImage::from_fn(200, 100, |x, y| Luma([((x + y) % 256) as u8]));
        let cropped = crop_margins(img, 0.05);

        assert_eq!(cropped.dimensions(), (180, 90));
        assert_eq!(cropped.get_pixel(0, 0).0[0], 15);
    }

    #[test]
    fn test_crop_margins_degenerate() {
        let tiny = GrayImage::new(5, 5);
        assert_eq!(crop_margins(tiny.clone(), 0.05).dimensions(), (5, 5));
        assert_eq!(crop_margins(tiny, 0.6).dimensions(), (5, 5));
    }
}
