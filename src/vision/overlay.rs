//! Detection overlay rendering for visual review

use image::{GrayImage, Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;

use super::detection::Detection;
use crate::symbol::Side;

const ARROW_COLOR: Rgb<u8> = Rgb([220, 30, 30]);
const OTHER_COLOR: Rgb<u8> = Rgb([30, 80, 220]);
const LINE_COLOR: Rgb<u8> = Rgb([30, 170, 60]);

/// Color copy of `image` with a rectangle around each detection and the
/// reference line, when known
pub fn draw_detections(image: &GrayImage, detections: &[Detection], reference_line: Option<u32>) -> RgbImage {
    let mut canvas = RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let v = image.get_pixel(x, y).0[0];
        Rgb([v, v, v])
    });

    if let Some(y) = reference_line {
        let y = y as f32;
        draw_line_segment_mut(&mut canvas, (0.0, y), (image.width() as f32, y), LINE_COLOR);
    }

    for detection in detections {
        let (x, y, w, h) = detection.bounds();
        if w == 0 || h == 0 {
            continue;
        }
        let color = match detection.side {
            Side::Arrow => ARROW_COLOR,
            Side::Other => OTHER_COLOR,
        };
        draw_hollow_rect_mut(&mut canvas, Rect::at(x as i32, y as i32).of_size(w, h), color);
    }

    canvas
}
