//! Parser for yt-dlp command output

use crate::types::ResourceLocator;
use std::str;

/// Prefix turning a bare video id into a watch URL
const WATCH_URL_PREFIX: &str = "https://www.youtube.com/watch?v=";

/// Exit status of an external command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// The command exited successfully (exit code 0)
    Success,
    /// The command exited with a non-zero exit code
    Failure,
}

impl ExitStatus {
    /// Returns `true` if the exit status represents success
    pub fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

impl From<bool> for ExitStatus {
    fn from(success: bool) -> Self {
        if success {
            Self::Success
        } else {
            Self::Failure
        }
    }
}

/// Parse output from `yt-dlp ytsearch1:<query> --get-id`
///
/// On success the first non-blank stdout line is the video id. A successful
/// run with no output means the search matched nothing. A failed run is an
/// [`Error::ExternalTool`](crate::Error::ExternalTool) carrying the last
/// line of stderr, which is where yt-dlp prints its `ERROR:` message.
pub fn parse_search_output(
    stdout: &[u8],
    stderr: &[u8],
    exit_status: ExitStatus,
) -> crate::Result<Option<ResourceLocator>> {
    if !exit_status.is_success() {
        return Err(crate::Error::ExternalTool(format!(
            "yt-dlp search failed: {}",
            last_error_line(stderr)
        )));
    }

    let output = str::from_utf8(stdout).unwrap_or_default();
    let id = output.lines().map(str::trim).find(|line| !line.is_empty());

    Ok(id.map(|id| {
        if id.starts_with("http://") || id.starts_with("https://") {
            ResourceLocator::new(id)
        } else {
            ResourceLocator::new(format!("{}{}", WATCH_URL_PREFIX, id))
        }
    }))
}

/// Parse output from a `yt-dlp -x` download run
pub fn parse_download_output(stderr: &[u8], exit_status: ExitStatus) -> crate::Result<()> {
    if exit_status.is_success() {
        return Ok(());
    }

    Err(crate::Error::ExternalTool(format!(
        "yt-dlp download failed: {}",
        last_error_line(stderr)
    )))
}

/// Pick the most useful line of stderr for an error message
fn last_error_line(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    lines
        .iter()
        .rev()
        .find(|l| l.starts_with("ERROR:"))
        .or_else(|| lines.last())
        .map(|l| l.to_string())
        .unwrap_or_else(|| "no error output".to_string())
}
