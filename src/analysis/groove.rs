//! Groove symbol assembly
//!
//! Combines template detections, the per-side text context and positional
//! text heuristics into one `GrooveSymbol`. Missing evidence leaves the
//! corresponding field empty.

use tracing::debug;

use super::context::{is_likely_depth, is_likely_root_opening, parse_numeric_value, WeldSymbolContext};
use crate::config::GrooveConfig;
use crate::symbol::{GrooveSymbol, GrooveType, Side};
use crate::vision::detection::Detection;
use crate::vision::ocr::RecognizedText;

/// Builds the final symbol from collected evidence
#[derive(Debug, Clone, Default)]
pub struct GrooveBuilder {
    config: GrooveConfig,
}

impl GrooveBuilder {
    pub fn new(config: GrooveConfig) -> Self {
        Self { config }
    }

    /// Assemble a symbol. `image_width`/`image_height` are the dimensions of
    /// the image the text boxes were measured in.
    pub fn build(
        &self,
        detections: &[Detection],
        recognized_texts: &[RecognizedText],
        context: &WeldSymbolContext,
        image_width: u32,
        image_height: u32,
    ) -> GrooveSymbol {
        let mut symbol = GrooveSymbol {
            arrow_groove: self.groove_for(detections, Side::Arrow),
            other_groove: self.groove_for(detections, Side::Other),
            arrow_angle: context.arrow_side.angle.parse().ok(),
            other_angle: context.other_side.angle.parse().ok(),
            ..GrooveSymbol::default()
        };

        let midline = (image_height / 2) as i64;

        for recognized in recognized_texts {
            let Some(value) = parse_numeric_value(recognized.text.trim()) else {
                continue;
            };
            let bounding_box = &recognized.bounding_box;

            if symbol.root_opening.is_none() && is_likely_root_opening(bounding_box, image_width) {
                debug!("Root opening {} from '{}'", value, recognized.text);
                symbol.root_opening = Some(value);
            } else if is_likely_depth(bounding_box, image_width) {
                let below = bounding_box.center_y() > midline;
                let slot = if below { &mut symbol.arrow_depth } else { &mut symbol.other_depth };
                if slot.is_none() {
                    debug!("{} depth {} from '{}'", if below { "Arrow" } else { "Other" }, value, recognized.text);
                    *slot = Some(value);
                }
            }
        }

        symbol
    }

    /// Groove type of the best detection on `side`, if it clears the acceptance threshold
    fn groove_for(&self, detections: &[Detection], side: Side) -> Option<GrooveType> {
        let best = detections
            .iter()
            .filter(|d| d.side == side)
            .reduce(|best, d| if d.confidence > best.confidence { d } else { best })?;

        if best.confidence >= self.config.acceptance_threshold {
            Some(best.groove)
        } else {
            debug!(
                "Best {} detection {} at {:.3} is below {:.2}",
                side, best.template_name, best.confidence, self.config.acceptance_threshold
            );
            None
        }
    }
}
