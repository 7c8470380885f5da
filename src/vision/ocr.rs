//! OCR collaborator
//!
//! Text recognition is supplied from outside the core. A recognizer takes the
//! decoded source image and returns trimmed text fragments with bounding boxes
//! in source-image pixel coordinates. An empty result is valid.

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// OCR collaborator failure
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("failed to read OCR results from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed OCR results: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("text recognition failed: {0}")]
    Engine(String),
}

/// Axis-aligned text bounding box (edges in pixels)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TextBox {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl TextBox {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self { left, top, right, bottom }
    }

    /// Horizontal center, not rounded
    pub fn center_x(&self) -> f64 {
        (self.left as f64 + self.right as f64) / 2.0
    }

    /// Vertical center, truncated to a whole pixel
    pub fn center_y(&self) -> i64 {
        (self.top as i64 + self.bottom as i64) / 2
    }
}

/// One recognized text fragment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizedText {
    pub text: String,
    #[serde(rename = "box")]
    pub bounding_box: TextBox,
}

impl RecognizedText {
    /// Create a fragment; surrounding whitespace is trimmed
    pub fn new(text: impl AsRef<str>, bounding_box: TextBox) -> Self {
        Self {
            text: text.as_ref().trim().to_string(),
            bounding_box,
        }
    }
}

/// Source of recognized text for one image
pub trait TextRecognizer {
    fn recognize(&self, image: &DynamicImage) -> Result<Vec<RecognizedText>, OcrError>;
}

impl<F> TextRecognizer for F
where
    F: Fn(&DynamicImage) -> Result<Vec<RecognizedText>, OcrError>,
{
    fn recognize(&self, image: &DynamicImage) -> Result<Vec<RecognizedText>, OcrError> {
        self(image)
    }
}

/// Recognizer that never finds text
#[derive(Debug, Clone, Copy, Default)]
pub struct NoText;

impl TextRecognizer for NoText {
    fn recognize(&self, _image: &DynamicImage) -> Result<Vec<RecognizedText>, OcrError> {
        Ok(vec![])
    }
}

/// Pre-recognized fragments read from a JSON document:
/// `[{"text": "3/4", "box": {"left": 10, "top": 20, "right": 40, "bottom": 32}}]`
#[derive(Debug, Clone, Default)]
pub struct JsonTextSource {
    texts: Vec<RecognizedText>,
}

impl JsonTextSource {
    pub fn from_json(json: &str) -> Result<Self, OcrError> {
        let raw: Vec<RecognizedText> = serde_json::from_str(json)?;
        let texts = raw
            .into_iter()
            .map(|t| RecognizedText::new(t.text, t.bounding_box))
            .collect();
        Ok(Self { texts })
    }

    pub fn from_path(path: &Path) -> Result<Self, OcrError> {
        let json = std::fs::read_to_string(path).map_err(|source| OcrError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let source = Self::from_json(&json)?;
        debug!("Loaded {} OCR fragments from {:?}", source.texts.len(), path);
        Ok(source)
    }
}

impl TextRecognizer for JsonTextSource {
    fn recognize(&self, _image: &DynamicImage) -> Result<Vec<RecognizedText>, OcrError> {
        Ok(self.texts.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GrayImage;

    #[test]
    fn test_box_centers() {
        let b = TextBox::new(10, 20, 41, 35);
        assert!((b.center_x() - 25.5).abs() < f64::EPSILON);
        assert_eq!(b.center_y(), 27);
    }

    #[test]
    fn test_box_centers_at_extreme_coordinates() {
        let b = TextBox::new(i32::MAX - 1, i32::MAX - 1, i32::MAX, i32::MAX);
        assert_eq!(b.center_y(), i32::MAX as i64 - 1);
        assert!((b.center_x() - (i32::MAX as f64 - 0.5)).abs() < 1e-6);

        let json = r#"[{"text": "1/8", "box": {"left": 2147483600, "top": 2147483600, "right": 2147483647, "bottom": 2147483647}}]"#;
        let source = JsonTextSource::from_json(json).unwrap();
        let image = DynamicImage::ImageLuma8(GrayImage::new(2, 2));
        let texts = source.recognize(&image).unwrap();
        assert_eq!(texts[0].bounding_box.center_y(), 2147483623);
    }

    #[test]
    fn test_text_is_trimmed() {
        let t = RecognizedText::new("  3/4 \n", TextBox::default());
        assert_eq!(t.text, "3/4");
    }

    #[test]
    fn test_json_source() {
        let json = r#"[
            {"text": " 45° ", "box": {"left": 1, "top": 2, "right": 30, "bottom": 14}},
            {"text": "1/8", "box": {"left": 50, "top": 60, "right": 70, "bottom": 72}}
        ]"#;

        let source = JsonTextSource::from_json(json).unwrap();
        let image = DynamicImage::ImageLuma8(GrayImage::new(4, 4));
        let texts = source.recognize(&image).unwrap();

        assert_eq!(texts.len(), 2);
        assert_eq!(texts[0].text, "45°");
        assert_eq!(texts[1].bounding_box, TextBox::new(50, 60, 70, 72));
    }

    #[test]
    fn test_json_source_rejects_garbage() {
        assert!(matches!(JsonTextSource::from_json("{not json"), Err(OcrError::Parse(_))));
    }

    #[test]
    fn test_json_source_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = JsonTextSource::from_path(&dir.path().join("missing.json"));
        assert!(matches!(result, Err(OcrError::Read { .. })));
    }

    #[test]
    fn test_closure_recognizer() {
        let failing = |_: &DynamicImage| -> Result<Vec<RecognizedText>, OcrError> {
            Err(OcrError::Engine("offline".into()))
        };
        let image = DynamicImage::ImageLuma8(GrayImage::new(2, 2));
        assert!(failing.recognize(&image).is_err());
        assert!(NoText.recognize(&image).unwrap().is_empty());
    }
}
