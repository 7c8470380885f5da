//! Reference-line side split
//!
//! Partitions a normalized image at its longest near-horizontal line: "other
//! side" glyphs are drawn above the reference line, "arrow side" glyphs below.
//! Both halves keep a band of rows around the line so glyphs touching it are
//! not sliced.

use image::imageops;
use image::GrayImage;
use tracing::{debug, info};

use super::lines::{find_segments, longest_near_horizontal, SegmentParams};
use crate::config::SplitConfig;

/// The two halves of a split image
#[derive(Debug, Clone)]
pub struct SideSplit {
    /// Rows above the line (plus overlap)
    pub other: GrayImage,
    /// Rows below the line (plus overlap)
    pub arrow: GrayImage,
    /// Row of the reference line in the source image
    pub line_y: u32,
    /// First source row contained in `arrow`
    pub arrow_offset: u32,
}

/// Finds the reference line and splits around it
#[derive(Debug, Clone, Default)]
pub struct SideSplitter {
    config: SplitConfig,
}

impl SideSplitter {
    pub fn new(config: SplitConfig) -> Self {
        Self { config }
    }

    /// Row of the longest near-horizontal line, if any
    pub fn find_reference_line(&self, image: &GrayImage) -> Option<u32> {
        let params = SegmentParams {
            canny_low: self.config.canny_low,
            canny_high: self.config.canny_high,
            votes: self.config.hough_votes,
            min_length: self.config.min_line_length,
            max_gap: self.config.max_line_gap,
        };

        let segments = find_segments(image, &params);
        let line = longest_near_horizontal(&segments, self.config.max_tilt_degrees as f64, false)?;
        let y = line.mean_y();
        if y < 0 {
            return None;
        }

        debug!("Reference line at y={} (length {:.1})", y, line.length());
        Some(y as u32)
    }

    /// Split into (other, arrow) halves, or `None` when no reference line exists
    pub fn split(&self, image: &GrayImage) -> Option<SideSplit> {
        let Some(line_y) = self.find_reference_line(image) else {
            info!("No reference line found; image cannot be split by side");
            return None;
        };

        let (width, height) = image.dimensions();
        let top_end = (line_y + self.config.overlap).min(height);
        let bottom_start = line_y.saturating_sub(self.config.overlap).min(height.saturating_sub(1));

        let other = imageops::crop_imm(image, 0, 0, width, top_end).to_image();
        let arrow = imageops::crop_imm(image, 0, bottom_start, width, height - bottom_start).to_image();

        debug!(
            "Split {}x{} at y={}: other rows 0..{}, arrow rows {}..{}",
            width, height, line_y, top_end, bottom_start, height
        );

        Some(SideSplit {
            other,
            arrow,
            line_y,
            arrow_offset: bottom_start,
        })
    }
}
