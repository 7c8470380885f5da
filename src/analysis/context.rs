//! Weld-context extraction from recognized text
//!
//! OCR fragments are partitioned by their vertical position in the source
//! image, then each side's fragments are classified as the groove angle or as
//! free-form dimension text.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::vision::ocr::{RecognizedText, TextBox};

const DEGREE_SIGN: char = '°';

/// Largest angle read literally from a bare numeral; larger values are
/// assumed to carry a misread trailing digit
const MAX_PLAUSIBLE_ANGLE: i32 = 140;

/// Text evidence for one side of the reference line
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WeldSideData {
    /// Angle digits, empty when no angle-like fragment was seen
    pub angle: String,
    /// Non-angle fragments in recognition order
    pub dimensions: Vec<String>,
}

/// Text evidence for both sides
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WeldSymbolContext {
    pub arrow_side: WeldSideData,
    pub other_side: WeldSideData,
}

/// Partition fragments into (arrow, other) by box top against the image midline.
///
/// A fragment whose top lies strictly below `image_height / 2` is arrow side.
pub fn split_by_side(texts: &[RecognizedText], image_height: u32) -> (Vec<RecognizedText>, Vec<RecognizedText>) {
    let midline = (image_height / 2) as i64;
    texts
        .iter()
        .cloned()
        .partition(|t| t.bounding_box.top as i64 > midline)
}

/// Build the per-side context from already partitioned fragments
pub fn extract_context(arrow_texts: &[RecognizedText], other_texts: &[RecognizedText]) -> WeldSymbolContext {
    WeldSymbolContext {
        arrow_side: parse_side(arrow_texts),
        other_side: parse_side(other_texts),
    }
}

fn parse_side(texts: &[RecognizedText]) -> WeldSideData {
    let mut side = WeldSideData::default();

    for recognized in texts {
        let raw = recognized.text.trim();

        if !is_likely_angle(raw) {
            side.dimensions.push(raw.to_string());
            continue;
        }

        let angle = if raw.contains(DEGREE_SIGN) {
            parse_angle(raw)
        } else {
            let corrected = correct_irregular_angle(raw);
            debug!("Angle '{}' read from '{}'", corrected, raw);
            parse_angle(&corrected)
        };
        // Last angle-like fragment wins
        side.angle = angle.to_string();
    }

    side
}

/// Degree sign anywhere, or a bare 2-3 digit numeral
pub fn is_likely_angle(text: &str) -> bool {
    text.contains(DEGREE_SIGN) || ((2..=3).contains(&text.len()) && text.bytes().all(|b| b.is_ascii_digit()))
}

/// Fix bare numerals above the plausible range by dropping the last digit
/// ("600" -> "60"). Text that is not an integer is returned unchanged.
pub fn correct_irregular_angle(text: &str) -> String {
    match text.parse::<i32>() {
        Ok(angle) if (0..=MAX_PLAUSIBLE_ANGLE).contains(&angle) => angle.to_string(),
        Ok(angle) => (angle / 10).to_string(),
        Err(_) => text.to_string(),
    }
}

/// Integer formed by the ASCII digits of `text`, 0 when there are none
pub fn parse_angle(text: &str) -> i32 {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    digits.parse().unwrap_or(0)
}

/// Decimal ("0.25") or fraction ("1/4") text as a finite number
pub fn parse_numeric_value(text: &str) -> Option<f64> {
    if !text.contains('/') {
        return parse_finite(text);
    }

    let mut parts = text.split('/');
    let (Some(numerator), Some(denominator), None) = (parts.next(), parts.next(), parts.next()) else {
        return None;
    };
    let numerator = parse_finite(numerator)?;
    let denominator = parse_finite(denominator)?;
    if denominator == 0.0 {
        return None;
    }
    Some(numerator / denominator).filter(|v| v.is_finite())
}

/// `inf`, `NaN` and friends are not dimensions
fn parse_finite(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Horizontal center strictly inside the middle 20% of the image width
pub fn is_likely_root_opening(bounding_box: &TextBox, image_width: u32) -> bool {
    let center = bounding_box.center_x();
    let width = image_width as f64;
    center > width * 0.4 && center < width * 0.6
}

/// Horizontal center in the left half of the image
pub fn is_likely_depth(bounding_box: &TextBox, image_width: u32) -> bool {
    bounding_box.center_x() < image_width as f64 * 0.5
}
