use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Top-level configuration, usually read from a TOML file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub detection: DetectionConfig,
    pub models: ModelPaths,
}

impl AppConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&raw).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(raw)?)
    }
}

/// Every tolerance of the region-detection pipeline.
/// Fractions are relative to the source image width or height.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub preprocess: PreprocessParams,
    pub size: SizeEnvelope,
    pub merge: MergeParams,
    pub group: GroupParams,
    pub validation: ValidationParams,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct PreprocessParams {
    /// Width of the horizontal erosion element as a fraction of image width
    pub erode_width_fraction: f64,
}

impl Default for PreprocessParams {
    fn default() -> Self {
        Self {
            erode_width_fraction: 0.025,
        }
    }
}

/// Plausible glyph/word box size, as fractions of the image size.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct SizeEnvelope {
    pub max_width: f64,
    pub max_height: f64,
    pub min_width: f64,
    pub min_height: f64,
}

impl Default for SizeEnvelope {
    fn default() -> Self {
        Self {
            max_width: 0.40,
            max_height: 0.20,
            min_width: 0.04,
            min_height: 0.005,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct MergeParams {
    /// Horizontal reach (split across both sides) as a fraction of image width
    pub reach_fraction: f64,
    /// Merged boxes must stay strictly below these fractions
    pub max_width: f64,
    pub max_height: f64,
    /// Boxes narrower or shorter than this many pixels are noise
    pub min_side: i32,
}

impl Default for MergeParams {
    fn default() -> Self {
        Self {
            reach_fraction: 0.01,
            max_width: 0.30,
            max_height: 0.05,
            min_side: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct GroupParams {
    /// A candidate may start at most this many of its own heights below the block
    pub gap_factor: i32,
    /// Required horizontal overlap as a fraction of each box's own area
    pub min_overlap: f64,
}

impl Default for GroupParams {
    fn default() -> Self {
        Self {
            gap_factor: 2,
            min_overlap: 0.25,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct ValidationParams {
    /// Pixels added on every side of a group before cropping
    pub padding: i32,
    pub min_members: usize,
    pub max_members: usize,
    /// Also demand a LOCATION tag on the name line
    pub require_location: bool,
}

impl Default for ValidationParams {
    fn default() -> Self {
        Self {
            padding: 5,
            min_members: 2,
            max_members: 5,
            require_location: false,
        }
    }
}

impl ValidationParams {
    pub fn accepts_group_size(&self, len: usize) -> bool {
        len >= self.min_members && len <= self.max_members
    }
}

/// Local resources the collaborators are loaded from.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ModelPaths {
    /// Directory holding `text-detection.rten` and `text-recognition.rten`
    pub ocr_dir: Option<PathBuf>,
    /// Tab-separated entity lexicon
    pub lexicon: Option<PathBuf>,
}

impl ModelPaths {
    /// OCR model directory, falling back to the `ocrs` cache under `$HOME`.
    pub fn resolve_ocr_dir(&self) -> anyhow::Result<PathBuf> {
        if let Some(dir) = &self.ocr_dir {
            return Ok(dir.clone());
        }
        let home_dir = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .context("Cannot locate home directory for the OCR model cache")?;
        Ok(Path::new(&home_dir).join(".cache/ocrs"))
    }

    pub fn require_lexicon(&self) -> anyhow::Result<&Path> {
        self.lexicon
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("No entity lexicon configured (use --lexicon or [models] lexicon)"))
    }
}
