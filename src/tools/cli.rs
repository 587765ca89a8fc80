//! yt-dlp backed resolver and fetcher

use super::parser::{ExitStatus, parse_download_output, parse_search_output};
use super::traits::{Fetcher, Resolver};
use crate::config::ToolsConfig;
use crate::types::ResourceLocator;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// Name of the yt-dlp executable looked up on PATH
const YT_DLP_BINARY: &str = "yt-dlp";

/// Locate yt-dlp according to the tool settings
///
/// An explicit `yt_dlp_path` always wins. Otherwise PATH is searched when
/// `search_path` is enabled.
pub fn locate_yt_dlp(tools: &ToolsConfig) -> crate::Result<PathBuf> {
    if let Some(ref path) = tools.yt_dlp_path {
        return Ok(path.clone());
    }

    if !tools.search_path {
        return Err(crate::Error::config(
            "yt_dlp_path",
            "yt_dlp_path is not set and PATH search is disabled",
        ));
    }

    which::which(YT_DLP_BINARY).map_err(|e| {
        crate::Error::config(
            "yt_dlp_path",
            format!("{} not found in PATH: {}", YT_DLP_BINARY, e),
        )
    })
}

/// Resolver that runs `yt-dlp ytsearch1:<query> --get-id`
///
/// # Examples
///
/// ```no_run
/// use track_dl::tools::YtDlpResolver;
/// use std::path::PathBuf;
///
/// // Create with explicit path
/// let resolver = YtDlpResolver::new(PathBuf::from("/usr/local/bin/yt-dlp"));
///
/// // Or auto-discover from PATH
/// let resolver = YtDlpResolver::from_path().expect("yt-dlp not found in PATH");
/// ```
#[derive(Debug, Clone)]
pub struct YtDlpResolver {
    binary_path: PathBuf,
}

impl YtDlpResolver {
    /// Create a new resolver with an explicit binary path
    pub fn new(binary_path: PathBuf) -> Self {
        Self { binary_path }
    }

    /// Attempt to find yt-dlp in PATH
    pub fn from_path() -> Option<Self> {
        which::which(YT_DLP_BINARY).ok().map(Self::new)
    }

    /// Build a resolver from the tool settings
    pub fn from_config(tools: &ToolsConfig) -> crate::Result<Self> {
        locate_yt_dlp(tools).map(Self::new)
    }
}

#[async_trait]
impl Resolver for YtDlpResolver {
    async fn resolve(&self, query: &str) -> crate::Result<Option<ResourceLocator>> {
        tracing::debug!(query, binary = %self.binary_path.display(), "Running yt-dlp search");

        let output = Command::new(&self.binary_path)
            .arg(format!("ytsearch1:{}", query))
            .arg("--get-id")
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                crate::Error::ExternalTool(format!("Failed to execute yt-dlp: {}", e))
            })?;

        parse_search_output(
            &output.stdout,
            &output.stderr,
            ExitStatus::from(output.status.success()),
        )
    }

    fn name(&self) -> &'static str {
        "yt-dlp-search"
    }
}

/// Fetcher that runs `yt-dlp -x --audio-format <fmt> -o <destination> <url>`
#[derive(Debug, Clone)]
pub struct YtDlpFetcher {
    binary_path: PathBuf,
    ffmpeg_path: Option<PathBuf>,
    audio_format: String,
}

impl YtDlpFetcher {
    /// Create a new fetcher with an explicit binary path and mp3 output
    pub fn new(binary_path: PathBuf) -> Self {
        Self {
            binary_path,
            ffmpeg_path: None,
            audio_format: "mp3".to_string(),
        }
    }

    /// Pass `--ffmpeg-location` to yt-dlp
    pub fn with_ffmpeg(mut self, ffmpeg_path: PathBuf) -> Self {
        self.ffmpeg_path = Some(ffmpeg_path);
        self
    }

    /// Change the extracted audio format
    pub fn with_audio_format(mut self, format: impl Into<String>) -> Self {
        self.audio_format = format.into();
        self
    }

    /// Build a fetcher from the tool settings
    pub fn from_config(tools: &ToolsConfig) -> crate::Result<Self> {
        let mut fetcher =
            Self::new(locate_yt_dlp(tools)?).with_audio_format(tools.audio_format.clone());
        if let Some(ref ffmpeg) = tools.ffmpeg_path {
            fetcher = fetcher.with_ffmpeg(ffmpeg.clone());
        }
        Ok(fetcher)
    }

    fn command(&self, locator: &ResourceLocator, destination: &Path) -> Command {
        let mut cmd = Command::new(&self.binary_path);
        cmd.arg("-x").arg("--audio-format").arg(&self.audio_format);
        if let Some(ref ffmpeg) = self.ffmpeg_path {
            cmd.arg("--ffmpeg-location").arg(ffmpeg);
        }
        cmd.arg("-o")
            .arg(output_template(destination))
            .arg(locator.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

/// Turn a literal destination into a yt-dlp `-o` template that expands to itself
///
/// yt-dlp treats `%` as the start of a template field, so every `%` is doubled.
fn output_template(destination: &Path) -> OsString {
    match destination.to_str() {
        Some(path) => path.replace('%', "%%").into(),
        None => destination.as_os_str().to_owned(),
    }
}

#[async_trait]
impl Fetcher for YtDlpFetcher {
    async fn fetch(&self, locator: &ResourceLocator, destination: &Path) -> crate::Result<()> {
        tracing::debug!(
            locator = %locator,
            destination = %destination.display(),
            "Running yt-dlp download"
        );

        let output = self
            .command(locator, destination)
            .output()
            .await
            .map_err(|e| {
                crate::Error::ExternalTool(format!("Failed to execute yt-dlp: {}", e))
            })?;

        parse_download_output(&output.stderr, ExitStatus::from(output.status.success()))
    }

    fn name(&self) -> &'static str {
        "yt-dlp-extract"
    }
}
