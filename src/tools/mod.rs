//! External collaborators: resource lookup and download
//!
//! This module provides the traits the pipeline drives for each item:
//!
//! - [`Resolver`]: query string to an optional [`ResourceLocator`](crate::ResourceLocator)
//! - [`Fetcher`]: locator and destination path to a stored file
//!
//! ## Implementations
//!
//! - [`YtDlpResolver`]: `yt-dlp ytsearch1:<query> --get-id`
//! - [`YtDlpFetcher`]: `yt-dlp -x --audio-format mp3 -o <dest> <url>`
//!
//! Both spawn the binary through `tokio::process` with `kill_on_drop`, so a
//! cancelled or timed-out call does not leave the child running. Tests swap
//! in fakes implementing the same traits.

mod cli;
mod parser;
mod traits;

pub use cli::{YtDlpFetcher, YtDlpResolver, locate_yt_dlp};
pub use parser::{ExitStatus, parse_download_output, parse_search_output};
pub use traits::{Fetcher, Resolver};
