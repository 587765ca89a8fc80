//! Configuration types for track-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

/// Default number of items processed at the same time
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Download behavior configuration (output location, naming, concurrency)
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Directory downloaded files are written to (default: "./tracks")
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Extension appended to the sanitized item name (default: "mp3")
    #[serde(default = "default_file_extension")]
    pub file_extension: String,

    /// Maximum number of items resolved/fetched at the same time (default: 5)
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_workers: usize,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            file_extension: default_file_extension(),
            max_concurrent_workers: default_max_concurrent(),
        }
    }
}

/// External tool paths (yt-dlp, ffmpeg) and extraction settings
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Path to yt-dlp executable (auto-detected if None)
    #[serde(default)]
    pub yt_dlp_path: Option<PathBuf>,

    /// Path to ffmpeg executable, passed to yt-dlp as `--ffmpeg-location`
    ///
    /// When unset, yt-dlp falls back to its own discovery.
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    /// Audio format requested from yt-dlp's extractor (default: "mp3")
    #[serde(default = "default_audio_format")]
    pub audio_format: String,

    /// Whether to search PATH for external binaries if explicit paths not set (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            yt_dlp_path: None,
            ffmpeg_path: None,
            audio_format: default_audio_format(),
            search_path: true,
        }
    }
}

/// Per-call deadlines for the external collaborators
///
/// `None` means the call may run for as long as the tool takes.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Deadline for a single resolve call, in seconds
    #[serde(default, with = "optional_duration_serde")]
    pub resolve_timeout: Option<Duration>,

    /// Deadline for a single fetch call, in seconds
    #[serde(default, with = "optional_duration_serde")]
    pub fetch_timeout: Option<Duration>,
}

/// Main configuration for the download pipeline
///
/// Sub-config fields are flattened, so the JSON format is a single flat object:
///
/// ```json
/// {
///   "output_dir": "tracks",
///   "max_concurrent_workers": 5,
///   "yt_dlp_path": "/usr/local/bin/yt-dlp",
///   "fetch_timeout": 600
/// }
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Output location, naming and concurrency
    #[serde(flatten)]
    pub download: DownloadConfig,

    /// External tool paths
    #[serde(flatten)]
    pub tools: ToolsConfig,

    /// Resolve/fetch deadlines
    #[serde(flatten)]
    pub timeouts: TimeoutConfig,
}

impl Config {
    /// Output directory
    pub fn output_dir(&self) -> &PathBuf {
        &self.download.output_dir
    }

    /// Load a configuration from a JSON file and validate it
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Config = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the settings that cannot be expressed in the type system
    pub fn validate(&self) -> Result<()> {
        validate_concurrency(self.download.max_concurrent_workers)?;

        if self.download.file_extension.trim().is_empty() {
            return Err(Error::config(
                "file_extension",
                "file extension must not be empty",
            ));
        }

        if self.download.file_extension.contains(['/', '\\', '.']) {
            return Err(Error::config(
                "file_extension",
                format!(
                    "file extension '{}' must not contain '.', '/' or '\\'",
                    self.download.file_extension
                ),
            ));
        }

        if self.tools.audio_format.trim().is_empty() {
            return Err(Error::config("audio_format", "audio format must not be empty"));
        }

        for (key, timeout) in [
            ("resolve_timeout", self.timeouts.resolve_timeout),
            ("fetch_timeout", self.timeouts.fetch_timeout),
        ] {
            if timeout == Some(Duration::ZERO) {
                return Err(Error::config(key, "timeout must be greater than zero"));
            }
        }

        Ok(())
    }
}

/// Reject a concurrency limit of zero
pub(crate) fn validate_concurrency(limit: usize) -> Result<()> {
    if limit == 0 {
        return Err(Error::config(
            "max_concurrent_workers",
            "concurrency limit must be at least 1",
        ));
    }
    Ok(())
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./tracks")
}

fn default_file_extension() -> String {
    "mp3".to_string()
}

fn default_max_concurrent() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_audio_format() -> String {
    "mp3".to_string()
}

fn default_true() -> bool {
    true
}

// Optional Duration serialization helper (whole seconds)
mod optional_duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}
