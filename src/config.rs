// Settings file management

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::engine::worker::{EngineSettings, Timeouts};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub timeouts: TimeoutConfig,

    #[serde(default)]
    pub variants: VariantsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// ffmpeg executable (name on PATH or absolute path)
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: String,

    #[serde(default = "default_ffprobe")]
    pub ffprobe: String,

    /// JPEG optimizer invoked as `<optimizer> <input> <output>`
    #[serde(default = "default_optimizer")]
    pub optimizer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Jobs allowed to run at once; 0 launches everything that is ready
    #[serde(default)]
    pub max_parallel: usize,

    /// How often each job's process is checked for liveness
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

/// Per-class wall clock limits in seconds; 0 disables the limit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    #[serde(default = "default_encode_secs")]
    pub encode_secs: u64,

    #[serde(default = "default_stream_secs")]
    pub stream_secs: u64,

    #[serde(default = "default_poster_secs")]
    pub poster_secs: u64,

    #[serde(default = "default_optimize_secs")]
    pub optimize_secs: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VariantsConfig {
    /// Reject unknown names in `--variants` instead of warning
    #[serde(default)]
    pub strict: bool,
}

fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe() -> String {
    "ffprobe".to_string()
}

fn default_optimizer() -> String {
    "guetzli".to_string()
}

fn default_poll_interval_ms() -> u64 {
    200
}

fn default_encode_secs() -> u64 {
    4 * 60 * 60
}

fn default_stream_secs() -> u64 {
    4 * 60 * 60
}

fn default_poster_secs() -> u64 {
    300
}

fn default_optimize_secs() -> u64 {
    900
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg: default_ffmpeg(),
            ffprobe: default_ffprobe(),
            optimizer: default_optimizer(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_parallel: 0,
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            encode_secs: default_encode_secs(),
            stream_secs: default_stream_secs(),
            poster_secs: default_poster_secs(),
            optimize_secs: default_optimize_secs(),
        }
    }
}

fn limit(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

impl TimeoutConfig {
    pub fn to_timeouts(&self) -> Timeouts {
        Timeouts {
            encode: limit(self.encode_secs),
            stream: limit(self.stream_secs),
            poster: limit(self.poster_secs),
            optimize: limit(self.optimize_secs),
        }
    }
}

impl Config {
    /// Get the path to the default settings file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "macos") {
            dirs::home_dir()
                .context("Could not determine home directory")?
                .join(".config")
                .join("webvariants")
        } else {
            dirs::config_dir()
                .context("Could not determine config directory")?
                .join("webvariants")
        };

        Ok(config_dir.join("config.toml"))
    }

    /// Load the default settings file, or built-in defaults if there is none
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::debug!(
                "no settings file at {}, using defaults",
                config_path.display()
            );
            Ok(Config::default())
        }
    }

    /// Load an explicit settings file; it has to exist
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Engine knobs derived from `[engine]` and `[timeouts]`
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            max_parallel: self.engine.max_parallel,
            poll_interval: Duration::from_millis(self.engine.poll_interval_ms.max(1)),
            timeouts: self.timeouts.to_timeouts(),
        }
    }
}
