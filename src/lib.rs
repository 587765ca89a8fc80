//! # track-dl
//!
//! Bounded-concurrency batch downloader for track lists.
//!
//! Given an ordered list of track names, the [`Pipeline`] resolves each one
//! to a downloadable resource, fetches it into an output directory, and
//! reports every step to a [`ProgressSink`]. A failing item never aborts the
//! batch; it just ends with a `NotFound` or `DownloadFailed` event.
//!
//! ## Design Philosophy
//!
//! - **Library-first** - no UI; progress goes to an injectable sink
//! - **Pluggable collaborators** - lookup and download sit behind the
//!   [`Resolver`] and [`Fetcher`] traits; yt-dlp implementations included
//! - **Bounded** - the concurrency ceiling is an explicit argument
//! - **One outcome per item** - every item ends with exactly one terminal event
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use track_dl::sink::BroadcastSink;
//! use track_dl::{Config, Pipeline, listing};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let sink = Arc::new(BroadcastSink::new());
//!     let mut events = sink.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("{}", event);
//!         }
//!     });
//!
//!     let config = Config::default();
//!     let limit = config.download.max_concurrent_workers;
//!     let pipeline = Pipeline::from_config(config, sink)?;
//!
//!     let items = listing::read_listing("tracks/track_metadata.txt").await?;
//!     pipeline.run(items, limit).await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Track listing file format
pub mod listing;
/// Batch pipeline (worker pool and per-item procedure)
pub mod pipeline;
/// Progress sinks
pub mod sink;
/// External resolver and fetcher collaborators
pub mod tools;
/// Core types and events
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
pub use pipeline::Pipeline;
pub use sink::ProgressSink;
pub use tokio_util::sync::CancellationToken;
pub use tools::{Fetcher, Resolver, YtDlpFetcher, YtDlpResolver};
pub use types::{BatchSummary, Event, ResourceLocator, WorkItem};

/// Cancel `token` when the process receives a termination signal.
///
/// Spawns a background task that waits for a signal and then cancels the
/// token, which makes a running [`Pipeline::run_until_cancelled`] stop
/// dispatching and abort in-flight items.
///
/// On Unix this is SIGTERM or SIGINT, falling back to Ctrl+C handling when
/// neither handler can be registered. Elsewhere it is Ctrl+C.
///
/// The task also ends quietly if the token is cancelled some other way.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use track_dl::sink::TracingSink;
/// use track_dl::{CancellationToken, Config, Pipeline, WorkItem, cancel_on_signal};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let pipeline = Pipeline::from_config(Config::default(), Arc::new(TracingSink))?;
///
///     let token = CancellationToken::new();
///     cancel_on_signal(token.clone());
///
///     let items = vec![WorkItem::new("Song A - Artist1")];
///     pipeline.run_until_cancelled(items, 5, token).await?;
///     Ok(())
/// }
/// ```
pub fn cancel_on_signal(token: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = token.cancelled() => {}
            signal = wait_for_signal() => {
                tracing::info!(signal, "Cancelling batch");
                token.cancel();
            }
        }
    })
}

/// Resolve with the name of the first termination signal received
#[cfg(unix)]
async fn wait_for_signal() -> &'static str {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration can fail in sandboxes; a missing stream just never fires
    let mut sigterm = signal(SignalKind::terminate())
        .inspect_err(|e| tracing::warn!(error = %e, "SIGTERM handler unavailable"))
        .ok();
    let mut sigint = signal(SignalKind::interrupt())
        .inspect_err(|e| tracing::warn!(error = %e, "SIGINT handler unavailable"))
        .ok();

    if sigterm.is_none() && sigint.is_none() {
        return ctrl_c().await;
    }

    tokio::select! {
        Some(()) = recv_signal(sigterm.as_mut()) => "SIGTERM",
        Some(()) = recv_signal(sigint.as_mut()) => "SIGINT",
        else => std::future::pending::<&'static str>().await,
    }
}

#[cfg(unix)]
async fn recv_signal(stream: Option<&mut tokio::signal::unix::Signal>) -> Option<()> {
    match stream {
        Some(stream) => stream.recv().await,
        None => std::future::pending().await,
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> &'static str {
    ctrl_c().await
}

async fn ctrl_c() -> &'static str {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Cannot listen for Ctrl+C, signal cancellation disabled");
        std::future::pending::<()>().await;
    }
    "Ctrl+C"
}
