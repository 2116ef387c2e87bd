//! # Client Holder
//!
//! Owns the single Grid transport and its session secrets for the life of
//! the process (or until [`ClientHolder::reset`]).
//!
//! ```text
//!   Uninitialized ──initialize()──▶ Initializing ──ok──▶ Ready
//!         ▲                              │                 │
//!         └────────────err───────────────┘                 │
//!         └─────────────────────reset()────────────────────┘
//! ```
//!
//! Concurrent `initialize()` calls share one in-flight construction, so the
//! factory runs exactly once per successful initialization.

use crate::config::GridConfig;
use crate::http::HttpClientFactory;
use crate::session::SessionSecrets;
use async_trait::async_trait;
use grid_core::{BoxedTransport, Failure, GridError, GridResult};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OnceCell;
use tracing::{error, info};

/// Builds the transport once configuration and secrets are known.
#[async_trait]
pub trait ClientFactory: Send + Sync {
    async fn connect(
        &self,
        config: &GridConfig,
        secrets: &SessionSecrets,
    ) -> Result<BoxedTransport, Failure>;
}

/// Shared factory (dynamic dispatch)
pub type BoxedFactory = Arc<dyn ClientFactory>;

/// Produces the configuration for each initialization
pub type ConfigResolver = Arc<dyn Fn() -> GridResult<GridConfig> + Send + Sync>;

/// The initialized client: config, transport and session secrets
pub struct ClientHandle {
    config: GridConfig,
    transport: BoxedTransport,
    secrets: SessionSecrets,
}

impl ClientHandle {
    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn transport(&self) -> &BoxedTransport {
        &self.transport
    }

    pub fn session_secrets(&self) -> &SessionSecrets {
        &self.secrets
    }
}

impl fmt::Debug for ClientHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientHandle")
            .field("config", &self.config)
            .field("transport", &self.transport.name())
            .field("secrets", &self.secrets)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HolderState {
    Uninitialized,
    Initializing,
    Ready,
}

type HandleCell = Arc<OnceCell<Arc<ClientHandle>>>;

/// Lazily-initialized owner of the Grid client
pub struct ClientHolder {
    resolver: ConfigResolver,
    factory: BoxedFactory,
    resolved: Mutex<Option<GridConfig>>,
    cell: Mutex<HandleCell>,
    in_flight: AtomicUsize,
}

impl ClientHolder {
    pub fn new(resolver: ConfigResolver, factory: BoxedFactory) -> Self {
        Self {
            resolver,
            factory,
            resolved: Mutex::new(None),
            cell: Mutex::new(Arc::new(OnceCell::new())),
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Holder wired to process environment and the HTTP transport.
    pub fn from_env() -> Self {
        Self::new(Arc::new(GridConfig::from_env), Arc::new(HttpClientFactory))
    }

    /// Initialize the client if needed and return the live handle.
    ///
    /// Configuration failures come back as `Config` errors. Factory
    /// failures are passed through unclassified. A failed initialization
    /// leaves the holder `Uninitialized`; the next call tries again.
    pub async fn initialize(&self) -> Result<Arc<ClientHandle>, Failure> {
        let cell = self.current_cell();
        if let Some(handle) = cell.get() {
            return Ok(Arc::clone(handle));
        }

        let _guard = InFlight::enter(&self.in_flight);
        cell.get_or_try_init(|| self.construct())
            .await
            .map(Arc::clone)
    }

    async fn construct(&self) -> Result<Arc<ClientHandle>, Failure> {
        let config = self.resolve_config()?;
        info!(
            environment = %config.environment,
            api_key = %config.masked_api_key(),
            "Initializing Grid client"
        );

        let secrets = SessionSecrets::generate(&config.api_key);
        let transport = self
            .factory
            .connect(&config, &secrets)
            .await
            .map_err(|failure| {
                error!("Grid client construction failed: {:?}", failure);
                failure
            })?;

        info!(
            transport = transport.name(),
            session_id = %secrets.session_id(),
            "Grid client initialized"
        );

        Ok(Arc::new(ClientHandle {
            config,
            transport,
            secrets,
        }))
    }

    /// The live handle, or a `Config` error unless `Ready`
    pub fn handle(&self) -> GridResult<Arc<ClientHandle>> {
        self.current_cell()
            .get()
            .cloned()
            .ok_or_else(|| GridError::config("Grid client not initialized. Call initialize() first."))
    }

    pub fn client(&self) -> GridResult<BoxedTransport> {
        self.handle().map(|handle| Arc::clone(&handle.transport))
    }

    pub fn session_secrets(&self) -> GridResult<SessionSecrets> {
        self.handle().map(|handle| handle.secrets.clone())
    }

    /// Live config when `Ready`, otherwise the resolved config.
    ///
    /// The resolver runs at most once per successful resolution; failures
    /// are not cached, so a later call sees a fixed environment.
    pub fn config(&self) -> GridResult<GridConfig> {
        match self.current_cell().get() {
            Some(handle) => Ok(handle.config.clone()),
            None => self.resolve_config(),
        }
    }

    fn resolve_config(&self) -> GridResult<GridConfig> {
        let mut resolved = self.resolved.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(config) = resolved.as_ref() {
            return Ok(config.clone());
        }
        let config = (self.resolver)()?;
        *resolved = Some(config.clone());
        Ok(config)
    }

    pub fn state(&self) -> HolderState {
        if self.current_cell().initialized() {
            HolderState::Ready
        } else if self.in_flight.load(Ordering::SeqCst) > 0 {
            HolderState::Initializing
        } else {
            HolderState::Uninitialized
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.state() == HolderState::Ready
    }

    /// Drop the held client and the resolved config. Callers still holding
    /// the old handle keep it until they finish.
    pub fn reset(&self) {
        *self.resolved.lock().unwrap_or_else(PoisonError::into_inner) = None;
        let mut cell = self.cell.lock().unwrap_or_else(PoisonError::into_inner);
        *cell = Arc::new(OnceCell::new());
        info!("Grid client reset");
    }

    fn current_cell(&self) -> HandleCell {
        Arc::clone(&self.cell.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl fmt::Debug for ClientHolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientHolder")
            .field("state", &self.state())
            .finish()
    }
}

/// Counts an initialization in progress; released on drop so a cancelled
/// caller does not leave the holder stuck in `Initializing`.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_config, test_holder as holder, ScriptedTransport, StaticFactory};
    use grid_core::{classify, GridErrorKind, RawFailure};
    use std::time::Duration;
    use tokio::task::JoinSet;

    #[tokio::test]
    async fn test_lazy_initialization() {
        let factory = Arc::new(StaticFactory::new(Arc::new(ScriptedTransport::new())));
        let holder = holder(factory.clone());

        assert_eq!(holder.state(), HolderState::Uninitialized);
        assert_eq!(factory.constructions(), 0);

        holder.initialize().await.unwrap();
        assert_eq!(holder.state(), HolderState::Ready);
        assert!(holder.client().is_ok());

        // Idempotent once ready
        holder.initialize().await.unwrap();
        assert_eq!(factory.constructions(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_initialize_constructs_once() {
        let factory = Arc::new(
            StaticFactory::new(Arc::new(ScriptedTransport::new()))
                .with_delay(Duration::from_millis(20)),
        );
        let holder = holder(factory.clone());

        let mut tasks = JoinSet::new();
        for _ in 0..16 {
            let holder = Arc::clone(&holder);
            tasks.spawn(async move {
                holder
                    .initialize()
                    .await
                    .map(|handle| handle.session_secrets().session_id())
            });
        }

        let mut session_ids = Vec::new();
        while let Some(result) = tasks.join_next().await {
            session_ids.push(result.unwrap().unwrap());
        }

        assert_eq!(factory.constructions(), 1);
        assert!(session_ids.iter().all(|id| *id == session_ids[0]));
    }

    #[tokio::test]
    async fn test_missing_key_is_config_error() {
        let factory = Arc::new(StaticFactory::new(Arc::new(ScriptedTransport::new())));
        let resolver: ConfigResolver = Arc::new(|| GridConfig::from_lookup(|_| None));
        let holder = ClientHolder::new(resolver, factory.clone());

        let err = classify(holder.initialize().await.unwrap_err());
        assert!(err.is(GridErrorKind::Config));
        assert_eq!(factory.constructions(), 0);
        assert_eq!(holder.state(), HolderState::Uninitialized);
    }

    #[tokio::test]
    async fn test_failed_construction_is_retried_next_call() {
        let factory = Arc::new(StaticFactory::failing(RawFailure::new(
            "network error: connection refused",
        )));
        let holder = holder(factory.clone());

        let failure = holder.initialize().await.unwrap_err();
        assert_eq!(classify(failure).kind(), GridErrorKind::Network);
        assert_eq!(holder.state(), HolderState::Uninitialized);

        assert!(holder.initialize().await.is_err());
        assert_eq!(factory.constructions(), 2);
    }

    #[tokio::test]
    async fn test_getters_before_initialize() {
        let factory = Arc::new(StaticFactory::new(Arc::new(ScriptedTransport::new())));
        let holder = holder(factory);

        assert!(matches!(holder.client(), Err(e) if e.is(GridErrorKind::Config)));
        assert!(holder.session_secrets().unwrap_err().is(GridErrorKind::Config));
        // Config still resolves without initializing
        assert_eq!(holder.config().unwrap(), test_config());
        assert!(!holder.is_initialized());
    }

    #[tokio::test]
    async fn test_reset_discards_client() {
        let factory = Arc::new(StaticFactory::new(Arc::new(ScriptedTransport::new())));
        let holder = holder(factory.clone());

        let first = holder.initialize().await.unwrap();
        holder.reset();

        assert_eq!(holder.state(), HolderState::Uninitialized);
        assert!(holder.client().is_err());

        let second = holder.initialize().await.unwrap();
        assert_eq!(factory.constructions(), 2);
        assert_ne!(
            first.session_secrets().session_id(),
            second.session_secrets().session_id()
        );
    }

    #[tokio::test]
    async fn test_config_resolved_once_until_reset() {
        let resolutions = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&resolutions);
        let resolver: ConfigResolver = Arc::new(move || -> GridResult<GridConfig> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(test_config())
        });
        let factory = Arc::new(StaticFactory::new(Arc::new(ScriptedTransport::new())));
        let holder = ClientHolder::new(resolver, factory);

        holder.config().unwrap();
        holder.config().unwrap();
        holder.initialize().await.unwrap();
        holder.config().unwrap();
        assert_eq!(resolutions.load(Ordering::SeqCst), 1);

        holder.reset();
        holder.config().unwrap();
        assert_eq!(resolutions.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_failed_resolution_is_not_cached() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);
        let resolver: ConfigResolver = Arc::new(move || -> GridResult<GridConfig> {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(GridError::config("GRID_API_KEY is required"))
            } else {
                Ok(test_config())
            }
        });
        let factory = Arc::new(StaticFactory::new(Arc::new(ScriptedTransport::new())));
        let holder = ClientHolder::new(resolver, factory);

        assert!(holder.config().is_err());
        assert_eq!(holder.config().unwrap(), test_config());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }
}
