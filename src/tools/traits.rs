//! Traits for the external collaborators the pipeline drives

use crate::types::ResourceLocator;
use async_trait::async_trait;
use std::path::Path;

/// Looks up a downloadable resource for a free-text query
///
/// Implementations may use an external binary, an HTTP API, or canned data
/// in tests. Returning `Ok(None)` means "nothing found"; returning `Err` means
/// the lookup itself failed. The pipeline treats both as a miss for the
/// item, but reports the error text so the two stay distinguishable.
///
/// # Examples
///
/// ```no_run
/// use track_dl::tools::{Resolver, YtDlpResolver};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let resolver = YtDlpResolver::from_path().expect("yt-dlp not found in PATH");
///
/// match resolver.resolve("Song A - Artist1").await? {
///     Some(locator) => println!("found {}", locator),
///     None => println!("nothing found"),
/// }
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Resolve `query` to at most one locator
    async fn resolve(&self, query: &str) -> crate::Result<Option<ResourceLocator>>;

    /// Get the name of this implementation (for logging/debugging)
    fn name(&self) -> &'static str;
}

/// Retrieves a resource and stores it at a destination path
///
/// Any failure (spawn error, non-zero exit, I/O error) is reported as `Err`.
/// The destination's parent directory already exists when this is called.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Download `locator` into `destination`
    async fn fetch(&self, locator: &ResourceLocator, destination: &Path) -> crate::Result<()>;

    /// Get the name of this implementation (for logging/debugging)
    fn name(&self) -> &'static str;
}
