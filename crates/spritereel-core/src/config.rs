use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::aspect::AspectRatio;
use crate::error::{ReelError, ReelResult};

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "spritereel.toml";

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PreviewConfig {
    pub aspect: AspectRatio,
    /// Sprite zoom in percent; clamped to 10..=100 when applied.
    pub zoom: u32,
    /// Background color as a hex string (`#rgb` or `#rrggbb`).
    pub background: String,
    pub background_image: Option<PathBuf>,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            aspect: AspectRatio::default(),
            zoom: 100,
            background: "#ffffff".to_string(),
            background_image: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RecordingConfig {
    pub fps: u32,
    /// Requested video bitrate in bits per second.
    pub bitrate: u64,
    /// Media types to try, best first.
    pub codecs: Vec<String>,
    pub output_dir: PathBuf,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            fps: 60,
            bitrate: 16_000_000,
            codecs: vec![
                "video/webm;codecs=vp9".to_string(),
                "video/webm;codecs=vp8".to_string(),
                "video/webm".to_string(),
            ],
            output_dir: PathBuf::from("output"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SheetConfig {
    pub columns: u32,
    pub file_name: String,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            columns: 4,
            file_name: "sprite_sheet.png".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ReelConfig {
    #[serde(default)]
    pub preview: PreviewConfig,
    #[serde(default)]
    pub recording: RecordingConfig,
    #[serde(default)]
    pub sheet: SheetConfig,
}

impl ReelConfig {
    pub fn load_from_file(path: &Path) -> ReelResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> ReelResult<Self> {
        toml::from_str(contents).map_err(|e| ReelError::Config(e.to_string()))
    }

    pub fn save_to_file(&self, path: &Path) -> ReelResult<()> {
        let contents =
            toml::to_string_pretty(self).map_err(|e| ReelError::Config(e.to_string()))?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}
