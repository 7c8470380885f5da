//! Groove glyph detection
//!
//! Multi-scale template matching restricted to one side of the reference line.
//! Scores are zero-mean normalized cross-correlation (correlation coefficient),
//! so a match is insensitive to the overall brightness and contrast of the photo.

use image::imageops::{self, FilterType};
use image::{GrayImage, ImageBuffer, Luma};
use imageproc::integral_image::{integral_image, integral_squared_image};
use imageproc::template_matching::{match_template_parallel, MatchTemplateMethod};
use serde::Serialize;
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, info};

use super::templates::{TemplateDefinition, TemplateSet};
use crate::config::DetectionConfig;
use crate::symbol::{GrooveType, Side};

/// Score surface: one correlation value per template placement
pub type ScoreMap = ImageBuffer<Luma<f32>, Vec<f32>>;

/// A template match above its threshold
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
    /// Template name that matched, e.g. "ArrowU"
    pub template_name: String,
    pub side: Side,
    pub groove: GrooveType,
    /// Match location (x, y) - top-left corner, in the searched image
    pub position: (u32, u32),
    /// Match size (width, height)
    pub size: (u32, u32),
    /// Match confidence (0.0 - 1.0)
    pub confidence: f32,
    /// Scale at which match was found
    pub scale: f32,
}

impl Detection {
    /// Get bounding box as (x, y, width, height)
    pub fn bounds(&self) -> (u32, u32, u32, u32) {
        (self.position.0, self.position.1, self.size.0, self.size.1)
    }
}

/// Template matching primitive: score every placement of `template` in `image`.
///
/// Implementations must return a map of size
/// `(image.w - template.w + 1, image.h - template.h + 1)` with scores in [0, 1].
/// Callers guarantee the template fits inside the image.
pub trait MatchScorer {
    fn score_map(&self, image: &GrayImage, template: &GrayImage) -> ScoreMap;
}

/// Correlation coefficient built on imageproc's normalized cross-correlation
/// and integral images
#[derive(Debug, Clone, Copy, Default)]
pub struct CorrelationCoefficient;

impl MatchScorer for CorrelationCoefficient {
    fn score_map(&self, image: &GrayImage, template: &GrayImage) -> ScoreMap {
        let (tmpl_w, tmpl_h) = template.dimensions();
        let n = (tmpl_w * tmpl_h) as f64;

        let (sum_t, sum_t2) = template.pixels().fold((0u64, 0u64), |(s, s2), p| {
            let v = p.0[0] as u64;
            (s + v, s2 + v * v)
        });
        let mean_t = sum_t as f64 / n;
        // Σ(T - mean)^2, computed exactly before the division
        let var_t = (n as u128 * sum_t2 as u128 - sum_t as u128 * sum_t as u128) as f64 / n;

        let ccorr_normed = match_template_parallel(image, template, MatchTemplateMethod::CrossCorrelationNormalized);
        let sums = integral_image::<_, u64>(image);
        let squares = integral_squared_image::<_, u64>(image);

        let (out_w, out_h) = ccorr_normed.dimensions();
        ScoreMap::from_fn(out_w, out_h, |x, y| {
            let sum_i = window_sum(&sums, x, y, tmpl_w, tmpl_h);
            let sum_i2 = window_sum(&squares, x, y, tmpl_w, tmpl_h);

            let var_i = (n as u128 * sum_i2 as u128 - sum_i as u128 * sum_i as u128) as f64 / n;
            let denominator = (var_i * var_t).sqrt();
            if denominator < 1e-10 {
                return Luma([0.0]);
            }

            // Undo imageproc's normalization to recover Σ(I·T)
            let normed = ccorr_normed.get_pixel(x, y).0[0] as f64;
            let cross = if normed.is_finite() {
                normed * ((sum_i2 as f64) * (sum_t2 as f64)).sqrt()
            } else {
                0.0
            };

            let numerator = cross - mean_t * sum_i as f64;
            Luma([(numerator / denominator).clamp(0.0, 1.0) as f32])
        })
    }
}

/// Sum of a window from an integral image with a leading zero row and column
fn window_sum(integral: &ImageBuffer<Luma<u64>, Vec<u64>>, x: u32, y: u32, w: u32, h: u32) -> u64 {
    let a = integral.get_pixel(x, y).0[0];
    let b = integral.get_pixel(x + w, y).0[0];
    let c = integral.get_pixel(x, y + h).0[0];
    let d = integral.get_pixel(x + w, y + h).0[0];
    (d + a) - (b + c)
}

/// Multi-scale, side-restricted template detector
pub struct TemplateDetector<S: MatchScorer = CorrelationCoefficient> {
    config: DetectionConfig,
    scorer: S,
}

impl TemplateDetector<CorrelationCoefficient> {
    pub fn new(config: DetectionConfig) -> Self {
        Self::with_scorer(config, CorrelationCoefficient)
    }
}

impl Default for TemplateDetector<CorrelationCoefficient> {
    fn default() -> Self {
        Self::new(DetectionConfig::default())
    }
}

impl<S: MatchScorer> TemplateDetector<S> {
    pub fn with_scorer(config: DetectionConfig, scorer: S) -> Self {
        Self { config, scorer }
    }

    /// Scale factors from min to max inclusive
    pub fn scales(&self) -> Vec<f32> {
        scale_range(self.config.min_scale, self.config.max_scale, self.config.scale_step)
    }

    /// Best detection per template on one side, sorted by confidence descending.
    ///
    /// `side = None` searches with every template.
    pub fn detect(&self, image: &GrayImage, templates: &TemplateSet, side: Option<Side>) -> Vec<Detection> {
        let start = Instant::now();
        let scales = self.scales();

        let mut all_detections = Vec::new();
        for template in templates.for_side(side) {
            for &scale in &scales {
                all_detections.extend(self.match_template_at_scale(image, template, scale));
            }
        }

        let raw_count = all_detections.len();
        let best = best_per_template(all_detections);

        debug!(
            "Template matching ({}) complete in {:?}: {} raw matches, {} kept",
            side.map_or("all sides", Side::prefix),
            start.elapsed(),
            raw_count,
            best.len()
        );
        for detection in &best {
            info!(
                "Template {} (scale {}) score {:.4} at ({}, {}) size {}x{}",
                detection.template_name,
                detection.scale,
                detection.confidence,
                detection.position.0,
                detection.position.1,
                detection.size.0,
                detection.size.1
            );
        }

        best
    }

    /// Every placement of the scaled template scoring at or above its threshold
    fn match_template_at_scale(&self, image: &GrayImage, template: &TemplateDefinition, scale: f32) -> Vec<Detection> {
        let template_img = template.image();
        let (orig_w, orig_h) = template_img.dimensions();
        let new_w = ((orig_w as f32) * scale) as u32;
        let new_h = ((orig_h as f32) * scale) as u32;

        let (img_w, img_h) = image.dimensions();
        if new_w == 0 || new_h == 0 || new_w > img_w || new_h > img_h {
            debug!(
                "Template '{}' at scale {} ({}x{}) does not fit {}x{}; skipping",
                template.name(),
                scale,
                new_w,
                new_h,
                img_w,
                img_h
            );
            return vec![];
        }

        let scaled = if new_w == orig_w && new_h == orig_h {
            template_img.clone()
        } else {
            imageops::resize(template_img, new_w, new_h, FilterType::Triangle)
        };

        let scores = self.scorer.score_map(image, &scaled);
        let name = template.name();

        scores
            .enumerate_pixels()
            .filter(|(_, _, score)| score.0[0] >= template.threshold)
            .map(|(x, y, score)| Detection {
                template_name: name.clone(),
                side: template.side,
                groove: template.groove,
                position: (x, y),
                size: (new_w, new_h),
                confidence: score.0[0],
                scale,
            })
            .collect()
    }
}

/// Scale factors `min, min + step, ...` not exceeding `max`
pub fn scale_range(min: f32, max: f32, step: f32) -> Vec<f32> {
    if step <= 0.0 || max < min {
        return vec![min];
    }
    // Count steps with a small tolerance so 2.0..=2.5 by 0.5 yields both ends
    let count = ((max - min) / step + 1e-4).floor() as usize + 1;
    (0..count).map(|i| min + step * i as f32).collect()
}

/// Keep the highest-confidence detection per template name (first wins on ties),
/// sorted by confidence descending
pub fn best_per_template(detections: Vec<Detection>) -> Vec<Detection> {
    let mut order: Vec<String> = Vec::new();
    let mut best: HashMap<String, Detection> = HashMap::new();

    for detection in detections {
        match best.get(&detection.template_name) {
            Some(existing) if existing.confidence >= detection.confidence => {}
            Some(_) => {
                best.insert(detection.template_name.clone(), detection);
            }
            None => {
                order.push(detection.template_name.clone());
                best.insert(detection.template_name.clone(), detection);
            }
        }
    }

    let mut result: Vec<Detection> = order.iter().filter_map(|name| best.remove(name)).collect();
    result.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    result
}
