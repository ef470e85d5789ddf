use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Everything tunable about a scan, in one TOML-loadable record. The
/// defaults are the empirically best-performing values; nothing in here is
/// derived from first principles.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScanConfig {
    pub normalize: NormalizeConfig,
    pub extract: ExtractConfig,
}

impl ScanConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }
}

/// Pixel-transform settings applied before the image reaches the recognizer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NormalizeConfig {
    /// Integer upscale factor applied before anything else. Small overlay
    /// text needs thicker strokes before the recognizer segments it reliably.
    pub scale: u32,
    /// Keep only the top fraction of the frame (0–1]; `None` keeps all of it.
    /// Line indices downstream are relative to the cropped frame.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crop_top: Option<f32>,
    pub strategy: ColorStrategy,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            scale: 2,
            crop_top: None,
            strategy: ColorStrategy::default(),
        }
    }
}

/// Text/background separation strategy. Exactly one is active per scan;
/// they are alternatives, never composed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ColorStrategy {
    /// Blend the blue channel into the luminance (`0.6·B + 0.4·luma`),
    /// invert, then snap values below `low` to black and above `high` to
    /// white. Warm backgrounds (gold, orange) carry little blue, so this
    /// suppresses them while leaving near-white glyphs intact.
    BlueChannelBlend { low: u8, high: u8 },
    /// A pixel is text only when all three channels exceed `threshold`.
    /// Rejects saturated brights (gold has one channel near zero). The
    /// threshold is the single most sensitive tuning parameter: ~160 admits
    /// light backgrounds, ~210 separates glyphs from near-white backdrops.
    BrightnessIsolation { threshold: u8 },
    /// Linear contrast stretch around mid-gray, no binarization. Smoother
    /// than the hard thresholds when separation is less extreme, at the
    /// cost of leaving more noise for the recognizer to discard.
    ContrastStretch { contrast: f32 },
}

impl Default for ColorStrategy {
    fn default() -> Self {
        ColorStrategy::BlueChannelBlend { low: 100, high: 180 }
    }
}

/// Heuristic-parser settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExtractConfig {
    /// Closed plausibility bounds for the CP anchor. Reflect the highest
    /// legitimate values observed in game, and reject clock times and day
    /// counters that otherwise look like a CP.
    pub cp_min: u32,
    pub cp_max: u32,
    /// How many leading transcript lines the CP strategies consider.
    pub lead_window: usize,
    /// How many lines past the CP anchor the ratio search looks.
    pub hp_window: usize,
    /// How many lines past the CP anchor the forward name scan looks.
    pub name_window: usize,
    /// Tokens that disqualify a line from being a name (case-insensitive
    /// substring match) — status words and category labels that share the
    /// name's screen region.
    pub deny_list: Vec<String>,
    pub stardust_min: u32,
    pub stardust_max: u32,
    /// Cap on recovered move names.
    pub max_moves: usize,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            cp_min: 10,
            cp_max: 6500,
            lead_window: 6,
            hp_window: 6,
            name_window: 4,
            deny_list: [
                "hp", "cp", "stardust", "candy", "power up", "evolve",
                "weight", "height", "heaviest", "tallest", "buddy", "km", "kg",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            stardust_min: 100,
            stardust_max: 500_000,
            max_moves: 3,
        }
    }
}
