use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Result, ScripterError};
use crate::i18n::Language;

fn default_request_timeout_secs() -> u64 {
    300
}

fn default_max_poll_attempts() -> u32 {
    90
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub gemini: GeminiConfig,
    pub video: VideoConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// Generative Language API base URL
    pub endpoint: String,
    /// Model used for script and prompt generation
    pub text_model: String,
    /// Model used for video generation
    pub video_model: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoConfig {
    /// Delay between two job status queries, in seconds
    pub poll_interval_secs: u64,
    /// Status queries before a job is given up on (0 polls forever)
    #[serde(default = "default_max_poll_attempts")]
    pub max_poll_attempts: u32,
    /// Output resolution requested from the video model
    pub resolution: String,
    /// Root directory for fetched media; each session gets its own subdirectory
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Initial UI language
    pub language: Language,
    /// Initial target video duration in minutes
    pub duration_minutes: u32,
    /// Initial aspect ratio
    pub aspect_ratio: AspectRatio,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectRatio {
    /// 16:9
    #[serde(rename = "16:9")]
    Landscape,
    /// 9:16
    #[serde(rename = "9:16")]
    Portrait,
}

impl AspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Landscape => "16:9",
            Self::Portrait => "9:16",
        }
    }

    /// Translation key of the orientation label
    pub fn label_key(&self) -> &'static str {
        match self {
            Self::Landscape => "landscape",
            Self::Portrait => "portrait",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = ScripterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "16:9" | "landscape" => Ok(Self::Landscape),
            "9:16" | "portrait" => Ok(Self::Portrait),
            other => Err(ScripterError::Config(format!("Unknown aspect ratio: {}", other))),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gemini: GeminiConfig {
                endpoint: "https://generativelanguage.googleapis.com".to_string(),
                text_model: "gemini-2.5-pro".to_string(),
                video_model: "veo-3.1-fast-generate-preview".to_string(),
                request_timeout_secs: default_request_timeout_secs(),
            },
            video: VideoConfig {
                poll_interval_secs: 10,
                max_poll_attempts: default_max_poll_attempts(),
                resolution: "720p".to_string(),
                output_dir: PathBuf::from(".veo-scripter/output"),
            },
            session: SessionConfig {
                language: Language::Vi,
                duration_minutes: 1,
                aspect_ratio: AspectRatio::Landscape,
            },
        }
    }
}

impl VideoConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ScripterError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| ScripterError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ScripterError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| ScripterError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }
}
