//! Core types and events for track-dl

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// One unit of work: the display name of a track
///
/// The name doubles as the resolver query and, once sanitized, as the
/// output filename stem. It is passed through unchanged, so an empty or
/// whitespace-only name still reaches the resolver.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkItem(String);

impl WorkItem {
    /// Create a new WorkItem
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The item's display name
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl From<&str> for WorkItem {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for WorkItem {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl fmt::Display for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque reference to a remote resource returned by a resolver
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceLocator(String);

impl ResourceLocator {
    /// Create a new ResourceLocator
    pub fn new(locator: impl Into<String>) -> Self {
        Self(locator.into())
    }

    /// The locator as a string (usually a URL)
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ResourceLocator {
    fn from(locator: &str) -> Self {
        Self(locator.to_string())
    }
}

impl fmt::Display for ResourceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Event emitted while a batch is processed
///
/// Every event carries the name of the item it belongs to. For a single item
/// `Found` always precedes `Downloaded`/`DownloadFailed`; events of different
/// items interleave freely.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// The resolver returned a locator for the item
    Found {
        /// Item name
        item: String,
        /// Locator the fetcher will download from
        locator: ResourceLocator,
    },

    /// The resolver produced no locator (terminal)
    NotFound {
        /// Item name
        item: String,
        /// Why resolution failed, if the resolver itself errored or timed out
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    /// The fetcher stored the resource (terminal)
    Downloaded {
        /// Item name
        item: String,
        /// Path the content was written to
        path: PathBuf,
    },

    /// The fetcher failed (terminal)
    DownloadFailed {
        /// Item name
        item: String,
        /// Error message
        error: String,
    },

    /// The batch was cancelled before the item finished (terminal)
    Cancelled {
        /// Item name
        item: String,
    },
}

impl Event {
    /// Name of the item this event belongs to
    pub fn item(&self) -> &str {
        match self {
            Event::Found { item, .. }
            | Event::NotFound { item, .. }
            | Event::Downloaded { item, .. }
            | Event::DownloadFailed { item, .. }
            | Event::Cancelled { item } => item,
        }
    }

    /// Whether this is the final event for its item
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Event::Found { .. })
    }

    /// Whether this terminal event counts as a success
    pub fn is_success(&self) -> bool {
        matches!(self, Event::Downloaded { .. })
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Found { locator, .. } => write!(f, "Found URL: {}", locator),
            Event::NotFound { item, error: None } => write!(f, "Could not find: {}", item),
            Event::NotFound {
                item,
                error: Some(e),
            } => write!(f, "Could not find: {} ({})", item, e),
            Event::Downloaded { path, .. } => write!(f, "Downloaded: {}", path.display()),
            Event::DownloadFailed { item, error } => {
                write!(f, "Error downloading {}: {}", item, error)
            }
            Event::Cancelled { item } => write!(f, "Cancelled: {}", item),
        }
    }
}

/// Returned by [`Pipeline::run`](crate::Pipeline::run) once every item is terminal
///
/// Deliberately carries no success/failure split; consumers derive that from
/// the events they received.
#[must_use]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Number of items handed to the pipeline
    pub submitted: usize,
    /// Number of terminal events emitted (equals `submitted`)
    pub terminal: usize,
}
