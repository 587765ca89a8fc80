//! Bounded-concurrency batch pipeline.
//!
//! [`Pipeline`] takes an ordered batch of [`WorkItem`]s and, for each one,
//! resolves a locator and fetches it to disk, with at most `concurrency_limit`
//! items in flight. Split into:
//! - this module - construction and the dispatch/join coordinator
//! - [`worker`] - the per-item Resolve -> Fetch procedure and its reporter

mod worker;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;

use crate::config::{Config, validate_concurrency};
use crate::error::Result;
use crate::sink::ProgressSink;
use crate::tools::{Fetcher, Resolver, YtDlpFetcher, YtDlpResolver};
use crate::types::{BatchSummary, Event, WorkItem};

use worker::{ItemReporter, WorkerContext, process_item};

/// Runs Resolve -> Fetch for every item of a batch under a concurrency ceiling
///
/// Per-item failures never escape [`run`](Self::run): they become
/// `NotFound`/`DownloadFailed` events on the sink and the rest of the batch
/// carries on. Cloning is cheap; all fields are Arc-wrapped.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use track_dl::{Config, Pipeline, WorkItem};
/// use track_dl::sink::TracingSink;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = Config::default();
///     let limit = config.download.max_concurrent_workers;
///     let pipeline = Pipeline::from_config(config, Arc::new(TracingSink))?;
///
///     let items = vec![
///         WorkItem::new("Song A - Artist1"),
///         WorkItem::new("Song B - Artist2"),
///     ];
///     pipeline.run(items, limit).await?;
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Pipeline {
    /// Settings shared with every worker
    config: Arc<Config>,
    /// Looks up a locator for each item name
    resolver: Arc<dyn Resolver>,
    /// Stores the resource behind a locator
    fetcher: Arc<dyn Fetcher>,
    /// Receives every event from every worker
    sink: Arc<dyn ProgressSink>,
}

impl Pipeline {
    /// Create a pipeline from explicit collaborators
    ///
    /// Fails with [`Error::Config`](crate::Error::Config) if the configuration
    /// does not validate.
    pub fn new(
        config: Config,
        resolver: Arc<dyn Resolver>,
        fetcher: Arc<dyn Fetcher>,
        sink: Arc<dyn ProgressSink>,
    ) -> Result<Self> {
        config.validate()?;

        tracing::info!(
            resolver = resolver.name(),
            fetcher = fetcher.name(),
            output_dir = %config.download.output_dir.display(),
            "Pipeline initialized"
        );

        Ok(Self {
            config: Arc::new(config),
            resolver,
            fetcher,
            sink,
        })
    }

    /// Create a pipeline backed by yt-dlp for both lookup and download
    pub fn from_config(config: Config, sink: Arc<dyn ProgressSink>) -> Result<Self> {
        let resolver = Arc::new(YtDlpResolver::from_config(&config.tools)?);
        let fetcher = Arc::new(YtDlpFetcher::from_config(&config.tools)?);
        Self::new(config, resolver, fetcher, sink)
    }

    /// Get the current configuration
    pub fn config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Process every item, at most `concurrency_limit` at a time
    ///
    /// Returns once every item has reached a terminal event. An empty batch
    /// returns immediately. The only errors are a zero `concurrency_limit`
    /// and failing to create the output directory, both detected before any
    /// item starts.
    pub async fn run(
        &self,
        items: impl IntoIterator<Item = WorkItem>,
        concurrency_limit: usize,
    ) -> Result<BatchSummary> {
        self.run_until_cancelled(items, concurrency_limit, CancellationToken::new())
            .await
    }

    /// Like [`run`](Self::run), but stops early once `cancel_token` fires
    ///
    /// After cancellation no further items are dispatched and in-flight
    /// resolve/fetch calls are dropped (killing their child processes). Every
    /// item that did not finish on its own gets a `Cancelled` event, so the
    /// one-terminal-event-per-item guarantee still holds.
    pub async fn run_until_cancelled(
        &self,
        items: impl IntoIterator<Item = WorkItem>,
        concurrency_limit: usize,
        cancel_token: CancellationToken,
    ) -> Result<BatchSummary> {
        validate_concurrency(concurrency_limit)?;

        let mut items = items.into_iter().peekable();
        if items.peek().is_none() {
            tracing::debug!("Empty batch, nothing to do");
            return Ok(BatchSummary::default());
        }

        tokio::fs::create_dir_all(&self.config.download.output_dir)
            .await
            .map_err(|e| {
                crate::Error::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create output directory '{}': {}",
                        self.config.download.output_dir.display(),
                        e
                    ),
                ))
            })?;

        let ctx = Arc::new(WorkerContext {
            resolver: Arc::clone(&self.resolver),
            fetcher: Arc::clone(&self.fetcher),
            output_dir: self.config.download.output_dir.clone(),
            file_extension: self.config.download.file_extension.clone(),
            timeouts: self.config.timeouts.clone(),
            cancel_token: cancel_token.clone(),
        });

        let concurrent_limit = Arc::new(Semaphore::new(concurrency_limit));
        let mut workers = JoinSet::new();
        let mut reporters: HashMap<tokio::task::Id, Arc<ItemReporter>> = HashMap::new();
        let mut summary = BatchSummary::default();

        tracing::info!(concurrency_limit, "Starting batch");

        while let Some(item) = items.next() {
            summary.submitted += 1;

            // Wait for a free slot unless the batch is cancelled first
            let permit = tokio::select! {
                biased;
                _ = cancel_token.cancelled() => None,
                permit = Arc::clone(&concurrent_limit).acquire_owned() => permit.ok(),
            };

            let Some(permit) = permit else {
                // Cancelled: this item and everything behind it never start
                tracing::info!("Batch cancelled, skipping undispatched items");
                self.sink.post(Event::Cancelled {
                    item: item.name().to_string(),
                });
                summary.terminal += 1;
                for rest in items.by_ref() {
                    summary.submitted += 1;
                    self.sink.post(Event::Cancelled {
                        item: rest.name().to_string(),
                    });
                    summary.terminal += 1;
                }
                break;
            };

            let reporter = Arc::new(ItemReporter::new(
                item.name().to_string(),
                Arc::clone(&self.sink),
            ));
            let task_reporter = Arc::clone(&reporter);
            let task_ctx = Arc::clone(&ctx);

            let handle = workers.spawn(async move {
                let _permit = permit;
                process_item(&task_ctx, &item, &task_reporter).await;
            });
            reporters.insert(handle.id(), reporter);
        }

        while let Some(joined) = workers.join_next_with_id().await {
            let (id, reason) = match joined {
                Ok((id, ())) => (id, None),
                Err(e) => {
                    tracing::error!(error = %e, "Worker task did not complete");
                    (e.id(), Some(join_failure_reason(e)))
                }
            };

            if let Some(reporter) = reporters.remove(&id) {
                if let Some(reason) = reason {
                    reporter.finish_if_unreported(&reason);
                }
                summary.terminal += 1;
            }
        }

        tracing::info!(
            submitted = summary.submitted,
            terminal = summary.terminal,
            "All items processed"
        );

        Ok(summary)
    }
}

/// Describe why a worker task failed, keeping the panic message when there is one
fn join_failure_reason(err: JoinError) -> String {
    if !err.is_panic() {
        return "worker task was aborted".to_string();
    }

    let payload = err.into_panic();
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned());
    match message {
        Some(message) => format!("worker task panicked: {}", message),
        None => "worker task panicked".to_string(),
    }
}
