//! Fake collaborators for pipeline unit tests.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::sink::MemorySink;
use crate::tools::{Fetcher, Resolver};
use crate::types::ResourceLocator;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

use super::Pipeline;

/// Tracks how many calls are running at once and the highest value seen
#[derive(Default)]
pub(crate) struct ConcurrencyProbe {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl ConcurrencyProbe {
    pub(crate) fn enter(self: &Arc<Self>) -> ProbeGuard {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        ProbeGuard {
            probe: Arc::clone(self),
        }
    }

    pub(crate) fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub(crate) fn current(&self) -> usize {
        self.current.load(Ordering::SeqCst)
    }
}

pub(crate) struct ProbeGuard {
    probe: Arc<ConcurrencyProbe>,
}

impl Drop for ProbeGuard {
    fn drop(&mut self) {
        self.probe.current.fetch_sub(1, Ordering::SeqCst);
    }
}

/// What a fake collaborator does for one key
#[derive(Clone, Debug)]
pub(crate) enum Behavior {
    /// Resolver: return this locator. Fetcher: succeed.
    Succeed(Option<String>),
    /// Resolver only: return no locator
    Miss,
    /// Return an ExternalTool error with this message
    Fail(String),
    /// Never complete
    Hang,
    /// Panic inside the call
    Panic,
}

/// Resolver answering from a table; unknown queries resolve to `fake://<query>`
pub(crate) struct FakeResolver {
    behaviors: HashMap<String, Behavior>,
    delay: Duration,
    probe: Arc<ConcurrencyProbe>,
    pub(crate) calls: Mutex<Vec<String>>,
}

impl FakeResolver {
    pub(crate) fn new(probe: Arc<ConcurrencyProbe>) -> Self {
        Self {
            behaviors: HashMap::new(),
            delay: Duration::ZERO,
            probe,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn on(mut self, query: &str, behavior: Behavior) -> Self {
        self.behaviors.insert(query.to_string(), behavior);
        self
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Resolver for FakeResolver {
    async fn resolve(&self, query: &str) -> Result<Option<ResourceLocator>> {
        let _guard = self.probe.enter();
        self.calls.lock().unwrap().push(query.to_string());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match self.behaviors.get(query) {
            None | Some(Behavior::Succeed(None)) => {
                Ok(Some(ResourceLocator::new(format!("fake://{}", query))))
            }
            Some(Behavior::Succeed(Some(locator))) => Ok(Some(ResourceLocator::new(locator))),
            Some(Behavior::Miss) => Ok(None),
            Some(Behavior::Fail(msg)) => Err(Error::ExternalTool(msg.clone())),
            Some(Behavior::Hang) => std::future::pending().await,
            Some(Behavior::Panic) => panic!("resolver exploded for {}", query),
        }
    }

    fn name(&self) -> &'static str {
        "fake-resolver"
    }
}

/// Fetcher keyed by locator; unknown locators succeed and write the file
pub(crate) struct FakeFetcher {
    behaviors: HashMap<String, Behavior>,
    delay: Duration,
    probe: Arc<ConcurrencyProbe>,
    pub(crate) calls: Mutex<Vec<(String, PathBuf)>>,
}

impl FakeFetcher {
    pub(crate) fn new(probe: Arc<ConcurrencyProbe>) -> Self {
        Self {
            behaviors: HashMap::new(),
            delay: Duration::ZERO,
            probe,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn on(mut self, locator: &str, behavior: Behavior) -> Self {
        self.behaviors.insert(locator.to_string(), behavior);
        self
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Fetcher for FakeFetcher {
    async fn fetch(&self, locator: &ResourceLocator, destination: &Path) -> Result<()> {
        let _guard = self.probe.enter();
        self.calls
            .lock()
            .unwrap()
            .push((locator.as_str().to_string(), destination.to_path_buf()));
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match self.behaviors.get(locator.as_str()) {
            None | Some(Behavior::Succeed(_)) | Some(Behavior::Miss) => {
                tokio::fs::write(destination, locator.as_str()).await?;
                Ok(())
            }
            Some(Behavior::Fail(msg)) => Err(Error::ExternalTool(msg.clone())),
            Some(Behavior::Hang) => std::future::pending().await,
            Some(Behavior::Panic) => panic!("fetcher exploded for {}", locator),
        }
    }

    fn name(&self) -> &'static str {
        "fake-fetcher"
    }
}

/// Everything a pipeline test needs to make assertions afterwards
pub(crate) struct TestPipeline {
    pub(crate) pipeline: Pipeline,
    pub(crate) resolver: Arc<FakeResolver>,
    pub(crate) fetcher: Arc<FakeFetcher>,
    pub(crate) sink: Arc<MemorySink>,
    pub(crate) probe: Arc<ConcurrencyProbe>,
    pub(crate) temp_dir: TempDir,
}

/// Build a pipeline writing into a fresh temp dir
///
/// `configure` receives the probe shared by both fakes plus the config,
/// and returns the fakes to use.
pub(crate) fn create_test_pipeline(
    configure: impl FnOnce(Arc<ConcurrencyProbe>, &mut Config) -> (FakeResolver, FakeFetcher),
) -> TestPipeline {
    let temp_dir = TempDir::new().unwrap();
    let probe = Arc::new(ConcurrencyProbe::default());

    let mut config = Config::default();
    config.download.output_dir = temp_dir.path().join("tracks");

    let (resolver, fetcher) = configure(Arc::clone(&probe), &mut config);
    let resolver = Arc::new(resolver);
    let fetcher = Arc::new(fetcher);
    let sink = Arc::new(MemorySink::new());

    let pipeline = Pipeline::new(
        config,
        Arc::clone(&resolver) as Arc<dyn Resolver>,
        Arc::clone(&fetcher) as Arc<dyn Fetcher>,
        Arc::clone(&sink) as Arc<dyn crate::sink::ProgressSink>,
    )
    .unwrap();

    TestPipeline {
        pipeline,
        resolver,
        fetcher,
        sink,
        probe,
        temp_dir,
    }
}

/// Pipeline whose fakes succeed for everything
pub(crate) fn create_default_test_pipeline() -> TestPipeline {
    create_test_pipeline(|probe, _| {
        (
            FakeResolver::new(Arc::clone(&probe)),
            FakeFetcher::new(probe),
        )
    })
}
