//! Per-item worker: Resolve -> Fetch, reporting every step to the sink.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::TimeoutConfig;
use crate::error::{Error, Result};
use crate::sink::ProgressSink;
use crate::tools::{Fetcher, Resolver};
use crate::types::{Event, WorkItem};
use crate::utils::destination_path;

/// State shared by every worker of one batch
pub(super) struct WorkerContext {
    pub(super) resolver: Arc<dyn Resolver>,
    pub(super) fetcher: Arc<dyn Fetcher>,
    pub(super) output_dir: PathBuf,
    pub(super) file_extension: String,
    pub(super) timeouts: TimeoutConfig,
    pub(super) cancel_token: CancellationToken,
}

impl WorkerContext {
    /// Await `operation` under the batch's cancellation token and an optional deadline
    async fn guarded<T>(
        &self,
        operation: &'static str,
        deadline: Option<Duration>,
        fut: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        let timed = async {
            match deadline {
                Some(after) => match tokio::time::timeout(after, fut).await {
                    Ok(result) => result,
                    Err(_) => Err(Error::Timeout { operation, after }),
                },
                None => fut.await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel_token.cancelled() => Err(Error::Cancelled),
            result = timed => result,
        }
    }
}

/// Posts one item's events and remembers whether its terminal event went out
///
/// The coordinator keeps a handle too, so a worker that dies before reporting
/// still gets exactly one terminal event.
pub(super) struct ItemReporter {
    item: String,
    sink: Arc<dyn ProgressSink>,
    /// Set once `Found` went out, i.e. the item moved on to fetching
    resolved: AtomicBool,
    terminal_sent: AtomicBool,
}

impl ItemReporter {
    pub(super) fn new(item: String, sink: Arc<dyn ProgressSink>) -> Self {
        Self {
            item,
            sink,
            resolved: AtomicBool::new(false),
            terminal_sent: AtomicBool::new(false),
        }
    }

    /// Post a non-terminal event
    fn progress(&self, event: Event) {
        debug_assert!(!event.is_terminal());
        if matches!(event, Event::Found { .. }) {
            self.resolved.store(true, Ordering::Release);
        }
        self.sink.post(event);
    }

    /// Post the terminal event; later calls are ignored
    fn finish(&self, event: Event) {
        debug_assert!(event.is_terminal());
        if self.terminal_sent.swap(true, Ordering::AcqRel) {
            tracing::warn!(item = %self.item, "Terminal event already reported, dropping {:?}", event);
            return;
        }
        self.sink.post(event);
    }

    pub(super) fn is_finished(&self) -> bool {
        self.terminal_sent.load(Ordering::Acquire)
    }

    /// Report a failure for an item whose worker ended without a terminal event
    ///
    /// The outcome follows the stage the worker died in: a resolver crash is
    /// `NotFound` with the reason, a fetcher crash is `DownloadFailed`.
    pub(super) fn finish_if_unreported(&self, reason: &str) {
        if self.is_finished() {
            return;
        }

        let fetching = self.resolved.load(Ordering::Acquire);
        let stage = if fetching { "fetch" } else { "resolve" };
        tracing::error!(item = %self.item, stage, reason, "Item ended without an outcome");

        let error = format!("{} stage: {}", stage, reason);
        if fetching {
            self.finish(Event::DownloadFailed {
                item: self.item.clone(),
                error,
            });
        } else {
            self.finish(Event::NotFound {
                item: self.item.clone(),
                error: Some(error),
            });
        }
    }
}

/// Run the Resolve -> Fetch state machine for one item
///
/// Always ends with exactly one terminal event on `reporter`: `NotFound`
/// (miss or resolver error), `Downloaded`, `DownloadFailed` or `Cancelled`.
/// No error leaves this function.
pub(super) async fn process_item(ctx: &WorkerContext, item: &WorkItem, reporter: &ItemReporter) {
    let name = item.name();

    // Resolving
    let resolved = ctx
        .guarded(
            "resolve",
            ctx.timeouts.resolve_timeout,
            ctx.resolver.resolve(name),
        )
        .await;

    let locator = match resolved {
        Ok(Some(locator)) => locator,
        Ok(None) => {
            tracing::info!(item = %name, "No match found");
            reporter.finish(Event::NotFound {
                item: name.to_string(),
                error: None,
            });
            return;
        }
        Err(Error::Cancelled) => {
            reporter.finish(Event::Cancelled {
                item: name.to_string(),
            });
            return;
        }
        Err(e) => {
            tracing::warn!(item = %name, error = %e, "Resolver failed");
            reporter.finish(Event::NotFound {
                item: name.to_string(),
                error: Some(e.to_string()),
            });
            return;
        }
    };

    reporter.progress(Event::Found {
        item: name.to_string(),
        locator: locator.clone(),
    });

    // Fetching
    let destination = destination_path(&ctx.output_dir, name, &ctx.file_extension);
    let fetched = ctx
        .guarded(
            "fetch",
            ctx.timeouts.fetch_timeout,
            ctx.fetcher.fetch(&locator, &destination),
        )
        .await;

    match fetched {
        Ok(()) => {
            tracing::info!(item = %name, path = %destination.display(), "Downloaded");
            reporter.finish(Event::Downloaded {
                item: name.to_string(),
                path: destination,
            });
        }
        Err(Error::Cancelled) => {
            reporter.finish(Event::Cancelled {
                item: name.to_string(),
            });
        }
        Err(e) => {
            tracing::warn!(item = %name, locator = %locator, error = %e, "Download failed");
            reporter.finish(Event::DownloadFailed {
                item: name.to_string(),
                error: e.to_string(),
            });
        }
    }
}
