//! Batch download example
//!
//! This example demonstrates the core functionality of track-dl:
//! - Loading work items from a track listing file
//! - Creating a yt-dlp backed pipeline
//! - Consuming events through a lossless channel sink
//! - Cancelling cleanly on Ctrl+C
//!
//! Usage: `cargo run --example batch_download -- tracks/track_metadata.txt`

use futures::StreamExt;
use std::sync::Arc;
use track_dl::config::{Config, DownloadConfig};
use track_dl::sink::{ChannelSink, event_stream};
use track_dl::{CancellationToken, Event, Pipeline, cancel_on_signal, listing};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for logging (optional)
    // Uncomment if you add tracing-subscriber to your dependencies:
    // tracing_subscriber::fmt::init();

    let listing_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "tracks/track_metadata.txt".to_string());

    // Build configuration
    let config = Config {
        download: DownloadConfig {
            output_dir: "tracks".into(),
            max_concurrent_workers: 5,
            ..Default::default()
        },
        ..Default::default()
    };
    let limit = config.download.max_concurrent_workers;

    // Lossless sink so the totals below see every event
    let (sink, event_rx) = ChannelSink::new();
    let pipeline = Pipeline::from_config(config, Arc::new(sink))?;

    let items = listing::read_listing(&listing_path).await?;
    println!("Loaded {} tracks from {}", items.len(), listing_path);

    let printer = tokio::spawn(async move {
        let mut downloaded = 0usize;
        let mut failed = 0usize;
        let mut events = Box::pin(event_stream(event_rx));
        while let Some(event) = events.next().await {
            match &event {
                Event::Found { .. } => println!("  {}", event),
                Event::Downloaded { .. } => {
                    downloaded += 1;
                    println!("✓ {}", event);
                }
                Event::NotFound { .. } | Event::DownloadFailed { .. } | Event::Cancelled { .. } => {
                    failed += 1;
                    println!("✗ {}", event);
                }
            }
        }
        (downloaded, failed)
    });

    let token = CancellationToken::new();
    cancel_on_signal(token.clone());

    let summary = pipeline.run_until_cancelled(items, limit, token).await?;

    // Dropping the pipeline drops the last sink handle and ends the event stream
    drop(pipeline);
    let (downloaded, failed) = printer.await?;

    println!(
        "All tracks processed: {} submitted, {} downloaded, {} not downloaded",
        summary.submitted, downloaded, failed
    );

    Ok(())
}
