//! Frame data structures for decoded photographs

use image::DynamicImage;
use std::time::Instant;

use super::CaptureError;

/// A decoded photograph of a weld symbol
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    /// Decoded pixels, in whatever color layout the source had
    pub image: DynamicImage,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Timestamp when frame was decoded
    pub timestamp: Instant,
}

impl CapturedFrame {
    /// Wrap a decoded image; zero-sized images are rejected
    pub fn new(image: DynamicImage) -> Result<Self, CaptureError> {
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Err(CaptureError::Empty { width, height });
        }

        Ok(Self {
            image,
            width,
            height,
            timestamp: Instant::now(),
        })
    }

    /// Get frame dimensions as (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GrayImage;

    #[test]
    fn test_frame_dimensions() {
        let frame = CapturedFrame::new(DynamicImage::ImageLuma8(GrayImage::new(30, 20))).unwrap();
        assert_eq!(frame.dimensions(), (30, 20));
    }

    #[test]
    fn test_empty_frame_rejected() {
        let result = CapturedFrame::new(DynamicImage::ImageLuma8(GrayImage::new(0, 20)));
        assert!(matches!(result, Err(CaptureError::Empty { width: 0, height: 20 })));
    }
}
