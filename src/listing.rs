//! Track listing file: one `"<name> - <artists>"` line per track
//!
//! The listing is produced upstream (from a catalog export) and is the usual
//! source of [`WorkItem`]s. Only the line format lives here.

use crate::error::Result;
use crate::types::WorkItem;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Separator between artist names on a listing line
const ARTIST_SEPARATOR: &str = ", ";

/// A catalog entry before it becomes a work item
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    /// Track title
    pub name: String,
    /// Performing artists, in credit order
    pub artists: Vec<String>,
}

impl Track {
    /// Create a track from a title and its artists
    pub fn new(name: impl Into<String>, artists: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            artists: artists.into_iter().map(Into::into).collect(),
        }
    }

    /// `"<name> - <artist1, artist2>"`, the form used as the resolver query
    pub fn display_name(&self) -> String {
        format!("{} - {}", self.name, self.artists.join(ARTIST_SEPARATOR))
    }

    /// Turn the track into a work item named after [`display_name`](Self::display_name)
    pub fn to_work_item(&self) -> WorkItem {
        WorkItem::new(self.display_name())
    }
}

/// Render tracks in listing format, one line each
pub fn render_listing(tracks: &[Track]) -> String {
    let mut out = String::new();
    for track in tracks {
        out.push_str(&track.display_name());
        out.push('\n');
    }
    out
}

/// Parse listing text into work items
///
/// Every line becomes one item after trimming, including blank lines and
/// lines without a `" - "` separator. A trailing newline does not add an item.
pub fn parse_listing(text: &str) -> Vec<WorkItem> {
    text.lines().map(str::trim).map(WorkItem::from).collect()
}

/// Write tracks to `path`, replacing any existing file
pub async fn write_listing(path: impl AsRef<Path>, tracks: &[Track]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, render_listing(tracks)).await?;
    tracing::info!(path = %path.display(), tracks = tracks.len(), "Track listing saved");
    Ok(())
}

/// Read a listing file into work items, in file order
pub async fn read_listing(path: impl AsRef<Path>) -> Result<Vec<WorkItem>> {
    let path = path.as_ref();
    let text = tokio::fs::read_to_string(path).await?;
    let items = parse_listing(&text);
    tracing::debug!(path = %path.display(), items = items.len(), "Track listing loaded");
    Ok(items)
}
