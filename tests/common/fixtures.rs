//! Scripted collaborators for integration tests

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use track_dl::{Error, Fetcher, ResourceLocator, Resolver, Result};

/// Counts calls in flight across resolver and fetcher
#[derive(Default)]
pub struct InFlight {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl InFlight {
    fn enter(self: &Arc<Self>) -> InFlightGuard {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        InFlightGuard(Arc::clone(self))
    }

    /// Highest number of simultaneous calls observed
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

struct InFlightGuard(Arc<InFlight>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.current.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Resolver returning `scripted://<query>` unless told otherwise
pub struct ScriptedResolver {
    misses: HashSet<String>,
    errors: HashSet<String>,
    delay: Duration,
    in_flight: Arc<InFlight>,
    calls: AtomicUsize,
}

impl ScriptedResolver {
    pub fn new(in_flight: Arc<InFlight>) -> Self {
        Self {
            misses: HashSet::new(),
            errors: HashSet::new(),
            delay: Duration::ZERO,
            in_flight,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn missing(mut self, query: &str) -> Self {
        self.misses.insert(query.to_string());
        self
    }

    pub fn failing(mut self, query: &str) -> Self {
        self.errors.insert(query.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Resolver for ScriptedResolver {
    async fn resolve(&self, query: &str) -> Result<Option<ResourceLocator>> {
        let _guard = self.in_flight.enter();
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;

        if self.errors.contains(query) {
            return Err(Error::ExternalTool(format!("search crashed for {}", query)));
        }
        if self.misses.contains(query) {
            return Ok(None);
        }
        Ok(Some(ResourceLocator::new(format!("scripted://{}", query))))
    }

    fn name(&self) -> &'static str {
        "scripted-resolver"
    }
}

/// Fetcher that writes the locator into the destination, or fails for chosen locators
pub struct ScriptedFetcher {
    failures: HashMap<String, String>,
    delay: Duration,
    in_flight: Arc<InFlight>,
    destinations: Mutex<Vec<PathBuf>>,
}

impl ScriptedFetcher {
    pub fn new(in_flight: Arc<InFlight>) -> Self {
        Self {
            failures: HashMap::new(),
            delay: Duration::ZERO,
            in_flight,
            destinations: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(mut self, locator: &str, message: &str) -> Self {
        self.failures
            .insert(locator.to_string(), message.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn destinations(&self) -> Vec<PathBuf> {
        self.destinations
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, locator: &ResourceLocator, destination: &Path) -> Result<()> {
        let _guard = self.in_flight.enter();
        self.destinations
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(destination.to_path_buf());
        tokio::time::sleep(self.delay).await;

        if let Some(message) = self.failures.get(locator.as_str()) {
            return Err(Error::ExternalTool(message.clone()));
        }
        tokio::fs::write(destination, locator.as_str()).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "scripted-fetcher"
    }
}
