//! Vision Layer
//!
//! Turns a photographed weld symbol into evidence: the geometrically
//! normalized image, per-side template detections, and recognized text. The
//! `WeldAnalyzer` drives the whole pipeline and hands the evidence to the
//! analysis layer.

pub mod detection;
pub mod lines;
pub mod ocr;
pub mod overlay;
pub mod preprocess;
pub mod split;
pub mod templates;

pub use detection::{Detection, TemplateDetector};
pub use ocr::{JsonTextSource, NoText, OcrError, RecognizedText, TextBox, TextRecognizer};
pub use preprocess::Normalizer;
pub use split::{SideSplit, SideSplitter};
pub use templates::{TemplateDefinition, TemplateError, TemplateSet};

use image::GrayImage;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::analysis::{extract_context, split_by_side, GrooveBuilder, WeldSymbolContext};
use crate::capture::{self, CaptureError, CapturedFrame};
use crate::config::AppConfig;
use crate::symbol::{GrooveSymbol, Side};

/// Everything one pipeline run produced
#[derive(Debug, Clone)]
pub struct Analysis {
    /// Retained detections for both sides, positions in `normalized` coordinates
    pub detections: Vec<Detection>,
    /// OCR fragments in source-image coordinates
    pub recognized_texts: Vec<RecognizedText>,
    pub context: WeldSymbolContext,
    pub groove: GrooveSymbol,
    /// Normalized and margin-cropped image the detector searched
    pub normalized: GrayImage,
    /// Row of the reference line in `normalized`, if one was found
    pub reference_line: Option<u32>,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

/// Weld symbol interpretation pipeline
pub struct WeldAnalyzer<R: TextRecognizer = NoText> {
    templates: Arc<TemplateSet>,
    recognizer: R,
    normalizer: Normalizer,
    splitter: SideSplitter,
    detector: TemplateDetector,
    builder: GrooveBuilder,
}

impl WeldAnalyzer<NoText> {
    /// Create an analyzer without an OCR collaborator
    pub fn new(templates: Arc<TemplateSet>, config: &AppConfig) -> Self {
        Self::with_recognizer(templates, NoText, config)
    }
}

impl<R: TextRecognizer> WeldAnalyzer<R> {
    /// Create an analyzer with a text recognizer
    pub fn with_recognizer(templates: Arc<TemplateSet>, recognizer: R, config: &AppConfig) -> Self {
        Self {
            templates,
            recognizer,
            normalizer: Normalizer::new(config.normalize.clone()),
            splitter: SideSplitter::new(config.split.clone()),
            detector: TemplateDetector::new(config.detection.clone()),
            builder: GrooveBuilder::new(config.groove.clone()),
        }
    }

    /// Decode encoded bytes and analyze them. Undecodable input is the only failure.
    pub fn analyze_bytes(&self, bytes: &[u8]) -> Result<Analysis, CaptureError> {
        let frame = capture::decode_image(bytes)?;
        Ok(self.analyze(&frame))
    }

    /// Run the full pipeline on a decoded frame
    pub fn analyze(&self, frame: &CapturedFrame) -> Analysis {
        let start = Instant::now();

        let recognized_texts = match self.recognizer.recognize(&frame.image) {
            Ok(texts) => texts,
            Err(e) => {
                warn!("Text recognition failed, continuing without text: {}", e);
                vec![]
            }
        };
        let (arrow_texts, other_texts) = split_by_side(&recognized_texts, frame.height);
        let context = extract_context(&arrow_texts, &other_texts);
        debug!(
            "{} text fragments ({} arrow side, {} other side)",
            recognized_texts.len(),
            arrow_texts.len(),
            other_texts.len()
        );

        let normalized = self.normalizer.crop(self.normalizer.normalize(&frame.image));
        let (detections, reference_line) = self.detect_by_side(&normalized);

        let groove = self
            .builder
            .build(&detections, &recognized_texts, &context, frame.width, frame.height);

        let processing_time = start.elapsed();
        info!(
            "Analysis complete in {:?}: {} detections, {} texts, groove {:?}",
            processing_time,
            detections.len(),
            recognized_texts.len(),
            groove
        );

        Analysis {
            detections,
            recognized_texts,
            context,
            groove,
            normalized,
            reference_line,
            processing_time_ms: processing_time.as_millis() as u64,
        }
    }

    /// Detect on the half of each side, or on the whole image for both sides
    /// when no reference line is found
    fn detect_by_side(&self, normalized: &GrayImage) -> (Vec<Detection>, Option<u32>) {
        let Some(split) = self.splitter.split(normalized) else {
            let mut detections = self.detector.detect(normalized, &self.templates, Some(Side::Other));
            detections.extend(self.detector.detect(normalized, &self.templates, Some(Side::Arrow)));
            return (detections, None);
        };

        let mut detections = self.detector.detect(&split.other, &self.templates, Some(Side::Other));
        detections.extend(
            self.detector
                .detect(&split.arrow, &self.templates, Some(Side::Arrow))
                .into_iter()
                .map(|mut d| {
                    d.position.1 += split.arrow_offset;
                    d
                }),
        );

        (detections, Some(split.line_y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::GrooveType;
    use image::{DynamicImage, Luma};
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect;

    fn u_glyph() -> GrayImage {
        GrayImage::from_fn(12, 12, |x, y| {
            if x < 2 || x >= 10 || y >= 10 {
                Luma([0])
            } else {
                Luma([255])
            }
        })
    }

    #[test]
    fn test_blank_image_yields_empty_symbol() {
        let templates = Arc::new(TemplateSet::new(vec![TemplateDefinition::new(
            Side::Arrow,
            GrooveType::U,
            u_glyph(),
        )]));
        let analyzer = WeldAnalyzer::new(templates, &AppConfig::default());
        let frame = CapturedFrame::new(DynamicImage::ImageLuma8(GrayImage::from_pixel(200, 120, Luma([255])))).unwrap();

        let analysis = analyzer.analyze(&frame);
        assert!(analysis.groove.is_empty());
        assert!(analysis.detections.is_empty());
        assert_eq!(analysis.reference_line, None);
        assert_eq!(analysis.normalized.dimensions(), (180, 108));
    }

    #[test]
    fn test_ocr_failure_degrades_to_no_text() {
        let failing = |_: &DynamicImage| -> Result<Vec<RecognizedText>, OcrError> {
            Err(OcrError::Engine("unavailable".into()))
        };
        let analyzer = WeldAnalyzer::with_recognizer(Arc::new(TemplateSet::default()), failing, &AppConfig::default());
        let frame = CapturedFrame::new(DynamicImage::ImageLuma8(GrayImage::from_pixel(64, 64, Luma([200])))).unwrap();

        let analysis = analyzer.analyze(&frame);
        assert!(analysis.recognized_texts.is_empty());
        assert_eq!(analysis.context, WeldSymbolContext::default());
    }

    #[test]
    fn test_arrow_detections_are_offset_into_normalized_coordinates() {
        let mut raw = GrayImage::from_pixel(300, 200, Luma([255]));
        draw_filled_rect_mut(&mut raw, Rect::at(20, 98).of_size(260, 5), Luma([0]));
        let glyph = image::imageops::resize(&u_glyph(), 24, 24, image::imageops::FilterType::Triangle);
        image::imageops::replace(&mut raw, &glyph, 150, 140);

        let templates = Arc::new(TemplateSet::new(vec![TemplateDefinition::new(
            Side::Arrow,
            GrooveType::U,
            u_glyph(),
        )]));
        let analyzer = WeldAnalyzer::new(templates, &AppConfig::default());
        let analysis = analyzer.analyze(&CapturedFrame::new(DynamicImage::ImageLuma8(raw)).unwrap());

        assert!(analysis.reference_line.is_some());
        let best = &analysis.detections[0];
        assert_eq!(best.groove, GrooveType::U);
        // 5% crop removes 15 columns and 10 rows
        assert_eq!(best.position, (135, 130));
    }

    #[test]
    fn test_undecodable_bytes_fail() {
        let analyzer = WeldAnalyzer::new(Arc::new(TemplateSet::default()), &AppConfig::default());
        assert!(matches!(analyzer.analyze_bytes(b"not an image"), Err(CaptureError::Decode(_))));
    }
}
