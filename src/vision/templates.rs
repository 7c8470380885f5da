//! Groove glyph templates
//!
//! Each template pairs a reference glyph image with the side of the reference
//! line it belongs to and the groove type it depicts. Asset files are named
//! `<Side><Groove>.png`, e.g. `ArrowBevel.png`.

use image::GrayImage;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::symbol::{GrooveType, Side};

/// Match threshold used when a template does not specify one
pub const DEFAULT_MATCH_THRESHOLD: f32 = 0.6;

/// Template loading failures
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template name '{0}' must be Arrow|Other followed by V|U|J|Bevel")]
    InvalidName(String),
    #[error("failed to load template image {path:?}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("template image {0:?} has no pixels")]
    Empty(PathBuf),
}

/// A reference glyph for one (side, groove type) pair
#[derive(Debug, Clone)]
pub struct TemplateDefinition {
    pub side: Side,
    pub groove: GrooveType,
    image: GrayImage,
    /// Minimum correlation score for a match (0.0 - 1.0)
    pub threshold: f32,
}

impl TemplateDefinition {
    /// Create a template with the default threshold
    pub fn new(side: Side, groove: GrooveType, image: GrayImage) -> Self {
        Self {
            side,
            groove,
            image,
            threshold: DEFAULT_MATCH_THRESHOLD,
        }
    }

    /// Create a template from an asset name such as "OtherJ"
    pub fn from_name(name: &str, image: GrayImage) -> Result<Self, TemplateError> {
        let (side, groove) = parse_template_name(name)?;
        Ok(Self::new(side, groove, image))
    }

    /// Load template from an image file; the side and groove come from the file stem
    pub fn from_file(path: &Path, threshold: f32) -> Result<Self, TemplateError> {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| TemplateError::InvalidName(path.display().to_string()))?;
        let (side, groove) = parse_template_name(name)?;

        let img = image::open(path).map_err(|source| TemplateError::Image {
            path: path.to_path_buf(),
            source,
        })?;
        let image = img.to_luma8();
        if image.width() == 0 || image.height() == 0 {
            return Err(TemplateError::Empty(path.to_path_buf()));
        }

        Ok(Self::new(side, groove, image).with_threshold(threshold))
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Asset name, e.g. "ArrowV"
    pub fn name(&self) -> String {
        template_name(self.side, self.groove)
    }

    /// Get the grayscale image
    pub fn image(&self) -> &GrayImage {
        &self.image
    }
}

/// Asset name for a (side, groove type) pair
pub fn template_name(side: Side, groove: GrooveType) -> String {
    format!("{}{}", side.prefix(), groove.as_str())
}

/// Decode "ArrowBevel" into (Arrow, Bevel)
pub fn parse_template_name(name: &str) -> Result<(Side, GrooveType), TemplateError> {
    Side::ALL
        .iter()
        .find_map(|&side| {
            let suffix = name.strip_prefix(side.prefix())?;
            let groove = suffix.parse::<GrooveType>().ok()?;
            Some((side, groove))
        })
        .ok_or_else(|| TemplateError::InvalidName(name.to_string()))
}

/// The immutable set of templates shared by every detection call
#[derive(Debug, Clone, Default)]
pub struct TemplateSet {
    templates: Vec<TemplateDefinition>,
}

impl TemplateSet {
    pub fn new(templates: Vec<TemplateDefinition>) -> Self {
        Self { templates }
    }

    /// Load the eight standard templates (`ArrowV.png` ... `OtherBevel.png`) from a directory
    pub fn load_dir(dir: &Path, threshold: f32) -> Result<Self, TemplateError> {
        let mut templates = Vec::with_capacity(8);

        for groove in GrooveType::ALL {
            for side in Side::ALL {
                let path = dir.join(format!("{}.png", template_name(side, groove)));
                templates.push(TemplateDefinition::from_file(&path, threshold)?);
            }
        }

        info!("Loaded {} templates from {:?}", templates.len(), dir);
        Ok(Self { templates })
    }

    pub fn iter(&self) -> impl Iterator<Item = &TemplateDefinition> {
        self.templates.iter()
    }

    /// Templates for one side, or all of them when `side` is `None`
    pub fn for_side(&self, side: Option<Side>) -> impl Iterator<Item = &TemplateDefinition> {
        self.templates
            .iter()
            .filter(move |t| side.map_or(true, |s| t.side == s))
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_parse_template_names() {
        assert_eq!(parse_template_name("ArrowV").unwrap(), (Side::Arrow, GrooveType::V));
        assert_eq!(parse_template_name("OtherBevel").unwrap(), (Side::Other, GrooveType::Bevel));
        assert!(parse_template_name("ArrowX").is_err());
        assert!(parse_template_name("SideU").is_err());
        assert!(parse_template_name("Arrow").is_err());
    }

    #[test]
    fn test_template_creation() {
        let template = TemplateDefinition::from_name("OtherJ", GrayImage::new(4, 6)).unwrap();
        assert_eq!(template.side, Side::Other);
        assert_eq!(template.groove, GrooveType::J);
        assert_eq!(template.name(), "OtherJ");
        assert!((template.threshold - DEFAULT_MATCH_THRESHOLD).abs() < f32::EPSILON);
        assert_eq!(template.image().dimensions(), (4, 6));
    }

    #[test]
    fn test_for_side_filter() {
        let set = TemplateSet::new(vec![
            TemplateDefinition::new(Side::Arrow, GrooveType::V, GrayImage::new(2, 2)),
            TemplateDefinition::new(Side::Other, GrooveType::V, GrayImage::new(2, 2)),
            TemplateDefinition::new(Side::Other, GrooveType::U, GrayImage::new(2, 2)),
        ]);

        assert_eq!(set.for_side(Some(Side::Other)).count(), 2);
        assert_eq!(set.for_side(Some(Side::Arrow)).count(), 1);
        assert_eq!(set.for_side(None).count(), 3);
    }

    #[test]
    fn test_load_dir() {
        let dir = tempfile::tempdir().unwrap();
        for groove in GrooveType::ALL {
            for side in Side::ALL {
                let img = GrayImage::from_pixel(6, 5, Luma([128]));
                img.save(dir.path().join(format!("{}.png", template_name(side, groove)))).unwrap();
            }
        }

        let set = TemplateSet::load_dir(dir.path(), 0.75).unwrap();
        assert_eq!(set.len(), 8);
        assert!(set.iter().all(|t| (t.threshold - 0.75).abs() < f32::EPSILON));
        assert!(set.iter().any(|t| t.name() == "ArrowBevel"));
    }

    #[test]
    fn test_load_dir_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = TemplateSet::load_dir(dir.path(), 0.6);
        assert!(matches!(result, Err(TemplateError::Image { .. })));
    }
}
