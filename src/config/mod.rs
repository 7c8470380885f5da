//! Application Configuration
//!
//! Tunable pipeline constants stored in TOML format. Every default matches the
//! calibrated values the pipeline was tuned with.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Geometric normalization settings
    pub normalize: NormalizeConfig,
    /// Reference-line side split settings
    pub split: SplitConfig,
    /// Template detection settings
    pub detection: DetectionConfig,
    /// Groove decision settings
    pub groove: GrooveConfig,
    /// Template asset settings
    pub templates: TemplateSettings,
}

/// Grayscale, alignment, downscale and margin crop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    /// Canny low hysteresis threshold
    pub canny_low: f32,
    /// Canny high hysteresis threshold
    pub canny_high: f32,
    /// Minimum Hough votes for a candidate line
    pub hough_votes: u32,
    /// Minimum segment length in pixels
    pub min_line_length: f32,
    /// Maximum gap bridged inside one segment, in pixels
    pub max_line_gap: f32,
    /// Lines steeper than this (degrees from horizontal) are ignored
    pub max_tilt_degrees: f32,
    /// Images wider than this are downscaled to it
    pub max_width: u32,
    /// Fraction of width/height trimmed from every edge before splitting
    pub crop_fraction: f32,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            canny_low: 50.0,
            canny_high: 150.0,
            hough_votes: 50,
            min_line_length: 50.0,
            max_line_gap: 10.0,
            max_tilt_degrees: 10.0,
            max_width: 1200,
            crop_fraction: 0.05,
        }
    }
}

/// Reference-line split
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    pub canny_low: f32,
    pub canny_high: f32,
    /// Higher than alignment: the image is already aligned and cropped
    pub hough_votes: u32,
    pub min_line_length: f32,
    pub max_line_gap: f32,
    pub max_tilt_degrees: f32,
    /// Rows shared by both halves around the split line
    pub overlap: u32,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            canny_low: 50.0,
            canny_high: 150.0,
            hough_votes: 100,
            min_line_length: 50.0,
            max_line_gap: 10.0,
            max_tilt_degrees: 10.0,
            overlap: 15,
        }
    }
}

/// Multi-scale template matching
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// First template scale factor
    pub min_scale: f32,
    /// Last template scale factor (inclusive)
    pub max_scale: f32,
    pub scale_step: f32,
    /// Match threshold given to templates loaded from disk
    pub default_threshold: f32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_scale: 2.0,
            max_scale: 2.5,
            scale_step: 0.5,
            default_threshold: 0.6,
        }
    }
}

/// Groove decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrooveConfig {
    /// Minimum detection confidence for a groove type to be accepted
    pub acceptance_threshold: f32,
}

impl Default for GrooveConfig {
    fn default() -> Self {
        Self {
            acceptance_threshold: 0.71,
        }
    }
}

/// Template assets
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateSettings {
    /// Directory holding ArrowV.png ... OtherBevel.png
    pub directory: Option<PathBuf>,
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {:?}", path))?;
    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file {:?}", path))?;
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Get the configuration directory
pub fn get_config_dir() -> Result<PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("com", "weldvision", "WeldVision")
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

    let config_dir = proj_dirs.config_dir().to_path_buf();
    std::fs::create_dir_all(&config_dir)?;

    Ok(config_dir)
}

/// Default location of the configuration file
pub fn default_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_app_config() {
        let config = AppConfig::default();

        assert!((config.normalize.canny_low - 50.0).abs() < f32::EPSILON);
        assert!((config.normalize.canny_high - 150.0).abs() < f32::EPSILON);
        assert_eq!(config.normalize.hough_votes, 50);
        assert_eq!(config.normalize.max_width, 1200);
        assert!((config.normalize.crop_fraction - 0.05).abs() < f32::EPSILON);

        assert_eq!(config.split.hough_votes, 100);
        assert_eq!(config.split.overlap, 15);

        assert!((config.detection.min_scale - 2.0).abs() < f32::EPSILON);
        assert!((config.detection.max_scale - 2.5).abs() < f32::EPSILON);
        assert!((config.detection.default_threshold - 0.6).abs() < f32::EPSILON);

        assert!((config.groove.acceptance_threshold - 0.71).abs() < f32::EPSILON);
        assert!(config.templates.directory.is_none());
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let mut config = AppConfig::default();
        config.templates.directory = Some(PathBuf::from("/opt/weld/templates"));
        config.split.overlap = 20;

        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(config, parsed);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let parsed: AppConfig = toml::from_str("[groove]\nacceptance_threshold = 0.8\n").unwrap();

        assert!((parsed.groove.acceptance_threshold - 0.8).abs() < f32::EPSILON);
        assert_eq!(parsed.normalize, NormalizeConfig::default());
        assert_eq!(parsed.detection, DetectionConfig::default());
    }

    #[test]
    fn test_save_and_load_config() {
        let config = AppConfig::default();
        let temp_file = NamedTempFile::new().unwrap();

        save_config(&config, temp_file.path()).unwrap();
        let loaded = load_config(temp_file.path()).unwrap();

        assert_eq!(config, loaded);
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/path/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "this is not valid toml {{{{").unwrap();

        let result = load_config(temp_file.path());
        assert!(result.is_err());
    }
}
