//! Progress sinks: where workers report [`Event`]s
//!
//! A sink is shared by every worker in a batch, so `post` must be callable
//! from many tasks at once and must never wait on the consumer. None of the
//! sinks here apply backpressure.

use crate::types::Event;
use futures::Stream;
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, mpsc};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::{BroadcastStream, UnboundedReceiverStream};

/// Observer receiving events as workers produce them
pub trait ProgressSink: Send + Sync {
    /// Record one event. Must not block.
    fn post(&self, event: Event);
}

impl<S: ProgressSink + ?Sized> ProgressSink for Arc<S> {
    fn post(&self, event: Event) {
        (**self).post(event);
    }
}

/// Buffer size of the broadcast channel used by [`BroadcastSink::new`]
pub const DEFAULT_BROADCAST_CAPACITY: usize = 1000;

/// Fan-out sink: every subscriber receives every event
///
/// Subscribers that fall more than the channel capacity behind receive
/// `RecvError::Lagged` and lose the oldest events; producers are never held
/// up. Events posted while nobody is subscribed are dropped.
///
/// # Examples
///
/// ```
/// use track_dl::sink::{BroadcastSink, ProgressSink};
/// use track_dl::Event;
///
/// # #[tokio::main]
/// # async fn main() {
/// let sink = BroadcastSink::new();
/// let mut events = sink.subscribe();
///
/// sink.post(Event::Cancelled { item: "Song".into() });
/// assert_eq!(events.recv().await.unwrap().item(), "Song");
/// # }
/// ```
#[derive(Clone)]
pub struct BroadcastSink {
    event_tx: broadcast::Sender<Event>,
}

impl BroadcastSink {
    /// Create a sink with [`DEFAULT_BROADCAST_CAPACITY`]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BROADCAST_CAPACITY)
    }

    /// Create a sink buffering up to `capacity` events per subscriber
    pub fn with_capacity(capacity: usize) -> Self {
        let (event_tx, _rx) = broadcast::channel(capacity.max(1));
        Self { event_tx }
    }

    /// Subscribe to events posted from now on
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Subscribe as a [`Stream`], skipping over lagged gaps with a warning
    pub fn stream(&self) -> impl Stream<Item = Event> + use<> {
        BroadcastStream::new(self.subscribe()).filter_map(|result| match result {
            Ok(event) => Some(event),
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                tracing::warn!("Event subscriber lagged, skipped {} events", skipped);
                None
            }
        })
    }
}

impl Default for BroadcastSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for BroadcastSink {
    fn post(&self, event: Event) {
        // send() returns Err if there are no receivers, which is fine - we just drop the event
        self.event_tx.send(event).ok();
    }
}

/// Lossless single-consumer sink backed by an unbounded channel
///
/// Use this when the consumer must see every event, e.g. to render
/// cumulative counts once the batch is done.
#[derive(Clone)]
pub struct ChannelSink {
    event_tx: mpsc::UnboundedSender<Event>,
}

impl ChannelSink {
    /// Create the sink together with its receiving end
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Event>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        (Self { event_tx }, event_rx)
    }
}

impl ProgressSink for ChannelSink {
    fn post(&self, event: Event) {
        if self.event_tx.send(event).is_err() {
            tracing::trace!("Event receiver dropped, discarding event");
        }
    }
}

/// Adapt a [`ChannelSink`] receiver into a [`Stream`] of events
///
/// The stream ends once every sender (and so the pipeline holding it) is gone.
pub fn event_stream(event_rx: mpsc::UnboundedReceiver<Event>) -> impl Stream<Item = Event> {
    UnboundedReceiverStream::new(event_rx)
}

/// Sink that records events in arrival order
#[derive(Default)]
pub struct MemorySink {
    events: Mutex<Vec<Event>>,
}

impl MemorySink {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far, in arrival order
    pub fn events(&self) -> Vec<Event> {
        self.lock().clone()
    }

    /// Events recorded for one item, in arrival order
    pub fn events_for(&self, item: &str) -> Vec<Event> {
        self.lock()
            .iter()
            .filter(|e| e.item() == item)
            .cloned()
            .collect()
    }

    /// Number of terminal events recorded so far
    pub fn terminal_count(&self) -> usize {
        self.lock().iter().filter(|e| e.is_terminal()).count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Event>> {
        // A panic while holding the lock cannot leave the Vec half-written
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ProgressSink for MemorySink {
    fn post(&self, event: Event) {
        self.lock().push(event);
    }
}

/// Sink that writes every event to the `tracing` log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn post(&self, event: Event) {
        match &event {
            Event::Found { item, locator } => {
                tracing::info!(item = %item, locator = %locator, "{}", event);
            }
            Event::Downloaded { item, path } => {
                tracing::info!(item = %item, path = %path.display(), "{}", event);
            }
            Event::NotFound { item, .. }
            | Event::DownloadFailed { item, .. }
            | Event::Cancelled { item } => {
                tracing::warn!(item = %item, "{}", event);
            }
        }
    }
}
