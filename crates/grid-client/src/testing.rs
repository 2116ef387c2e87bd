//! Test doubles for the transport, factory and backoff seams.
//!
//! Compiled for this crate's tests and, behind the `test-utils` feature,
//! for downstream crates.

use crate::config::GridConfig;
use crate::holder::{ClientFactory, ClientHolder};
use crate::retry::Delay;
use crate::session::SessionSecrets;
use async_trait::async_trait;
use grid_core::{ApiRequest, BoxedTransport, Failure, GridResult, GridTransport, RawFailure};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Key used by [`test_config`]
pub const TEST_API_KEY: &str = "grid_sk_test_1234567890";

pub fn test_config() -> GridConfig {
    GridConfig::new(TEST_API_KEY)
}

fn resolve_test_config() -> GridResult<GridConfig> {
    Ok(test_config())
}

/// Holder that always resolves [`test_config`] and builds with `factory`
pub fn test_holder(factory: Arc<dyn ClientFactory>) -> Arc<ClientHolder> {
    Arc::new(ClientHolder::new(Arc::new(resolve_test_config), factory))
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Transport that replays queued outcomes in order and records requests
pub struct ScriptedTransport {
    outcomes: Mutex<VecDeque<Result<Value, Failure>>>,
    requests: Mutex<Vec<ApiRequest>>,
    probe: Mutex<Result<(), Failure>>,
    latency: Option<Duration>,
    calls: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            outcomes: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            probe: Mutex::new(Ok(())),
            latency: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Queue a successful response body
    pub fn respond(self, body: Value) -> Self {
        lock(&self.outcomes).push_back(Ok(body));
        self
    }

    /// Queue a failure
    pub fn fail(self, failure: impl Into<Failure>) -> Self {
        lock(&self.outcomes).push_back(Err(failure.into()));
        self
    }

    pub fn with_probe(self, outcome: Result<(), Failure>) -> Self {
        *lock(&self.probe) = outcome;
        self
    }

    /// Sleep before answering each call
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        lock(&self.requests).clone()
    }

    pub fn last_request(&self) -> Option<ApiRequest> {
        lock(&self.requests).last().cloned()
    }
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GridTransport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> Result<Value, Failure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.requests).push(request.clone());

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        lock(&self.outcomes).pop_front().unwrap_or_else(|| {
            Err(RawFailure::new(format!("no scripted response for {}", request.path())).into())
        })
    }

    async fn probe(&self) -> Result<(), Failure> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        lock(&self.probe).clone()
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Factory returning a fixed transport (or failure) and counting calls
pub struct StaticFactory {
    outcome: Result<BoxedTransport, Failure>,
    delay: Option<Duration>,
    constructions: AtomicUsize,
}

impl StaticFactory {
    pub fn new(transport: Arc<ScriptedTransport>) -> Self {
        Self {
            outcome: Ok(transport),
            delay: None,
            constructions: AtomicUsize::new(0),
        }
    }

    pub fn failing(failure: impl Into<Failure>) -> Self {
        Self {
            outcome: Err(failure.into()),
            delay: None,
            constructions: AtomicUsize::new(0),
        }
    }

    /// Sleep inside `connect`, widening the window for concurrent callers
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn constructions(&self) -> usize {
        self.constructions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClientFactory for StaticFactory {
    async fn connect(
        &self,
        _config: &GridConfig,
        _secrets: &SessionSecrets,
    ) -> Result<BoxedTransport, Failure> {
        self.constructions.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.outcome.clone()
    }
}

/// Backoff that records requested waits instead of sleeping
#[derive(Default)]
pub struct RecordingDelay {
    waits: Mutex<Vec<Duration>>,
}

impl RecordingDelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn waits(&self) -> Vec<Duration> {
        lock(&self.waits).clone()
    }
}

#[async_trait]
impl Delay for RecordingDelay {
    async fn delay(&self, duration: Duration) {
        lock(&self.waits).push(duration);
    }
}
