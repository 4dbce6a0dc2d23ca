use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use crate::quality::DesiredQuality;

/// Configuration for the VOD archiver pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiverConfig {
    /// Directory where lock files and other runtime state are kept.
    pub config_dir: PathBuf,
    /// Path to the ffmpeg binary.
    pub ffmpeg_bin: PathBuf,
    /// Path to the ffprobe binary.
    pub ffprobe_bin: PathBuf,
    /// Desired stream quality: "best", "worst" or "<resolution>@<framerate>".
    pub quality: String,
    /// Continue conversion through corrupt packets instead of failing.
    /// Corrupt packets are expected when a stream was downloaded while live.
    pub ignore_corruptions: bool,
}

impl Default for ArchiverConfig {
    fn default() -> Self {
        Self::default_config()
    }
}

impl ArchiverConfig {
    /// Create a default configuration with sensible values.
    pub fn default_config() -> Self {
        Self {
            config_dir: PathBuf::from("/tmp/vodarc"),
            ffmpeg_bin: PathBuf::from("ffmpeg"),
            ffprobe_bin: PathBuf::from("ffprobe"),
            quality: "best".to_string(),
            ignore_corruptions: false,
        }
    }

    /// Load configuration from a file, or return defaults if path is None or
    /// the file doesn't exist.
    pub fn load_config(path: Option<&Path>) -> Result<Self> {
        let mut config = Self::default_config();

        if let Some(config_path) = path {
            if config_path.exists() {
                let content = std::fs::read_to_string(config_path).with_context(|| {
                    format!("Failed to read config file: {}", config_path.display())
                })?;

                // Try JSON first, then TOML
                if config_path.extension().and_then(|s| s.to_str()) == Some("toml") {
                    config = toml::from_str(&content).with_context(|| {
                        format!("Failed to parse TOML config: {}", config_path.display())
                    })?;
                } else {
                    config = serde_json::from_str(&content).with_context(|| {
                        format!("Failed to parse JSON config: {}", config_path.display())
                    })?;
                }
            }
        }

        Ok(config)
    }

    /// Parse the configured quality string.
    pub fn desired_quality(&self) -> Result<DesiredQuality> {
        self.quality
            .parse()
            .with_context(|| format!("Invalid quality in configuration: {}", self.quality))
    }
}
