//! # Sync Orchestrator
//!
//! Entry point the scheduler calls once per sync invocation. Resolves the
//! account's collection pairs, runs one pass per pair and folds the outcomes
//! into a [`ResultSummary`].
//!
//! ## Invocation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     synchronize(invocation, provider)                   │
//! │                                                                         │
//! │  ┌──────────────┐    ┌──────────────┐    ┌───────────────────────────┐ │
//! │  │ PairResolver │───►│ Deduplicate  │───►│ JoinSet of pass tasks     │ │
//! │  │              │    │ by PairKey   │    │ (Semaphore-bounded)       │ │
//! │  └──────────────┘    └──────────────┘    └─────────────┬─────────────┘ │
//! │                                                        │               │
//! │                                         PassOutcome per pair           │
//! │                                                        ▼               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │ Fold (this task only) ──► ResultSummary ──► RetryAdvisor        │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  • Every pair is attempted exactly once per invocation.                │
//! │  • A classified failure never stops sibling pairs.                     │
//! │  • A defect (unclassified error or panic) aborts the invocation.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//! ```ignore
//! let orchestrator = SyncOrchestrator::builder(SyncConfig::load(None)?)
//!     .client_factory(HttpClientFactory)
//!     .resolver(resolver)
//!     .engines(Arc::new(engines))
//!     .build()?;
//!
//! let summary = orchestrator
//!     .synchronize(&SyncInvocation::new(account).manual(true), &provider)
//!     .await?;
//!
//! orchestrator.close();
//! ```

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use tandem_core::{ResultSummary, SyncInvocation};
use tokio::runtime::Handle;
use tokio::sync::{RwLock, Semaphore};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::collection::CollectionPair;
use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::lifecycle::{ClientFactory, ClientLifecycle, LifecycleState, NetworkClient};
use crate::pass::{EngineFactory, PassRunner};
use crate::platform;
use crate::resolver::PairResolver;
use crate::retry::{RetryAdvice, RetryAdvisor};

// =============================================================================
// Orchestrator Status
// =============================================================================

/// Snapshot of the orchestrator for external queries.
#[derive(Debug, Clone)]
pub struct OrchestratorStatus {
    /// Lifecycle state of the orchestrator and its client.
    pub state: LifecycleState,

    /// Invocations started since construction.
    pub invocations: u64,

    /// Completion time of the last finished invocation.
    pub last_sync: Option<DateTime<Utc>>,

    /// Summary of the last finished invocation.
    pub last_summary: Option<ResultSummary>,

    /// Last defect that aborted an invocation (if any).
    pub last_error: Option<String>,
}

impl Default for OrchestratorStatus {
    fn default() -> Self {
        OrchestratorStatus {
            state: LifecycleState::Active,
            invocations: 0,
            last_sync: None,
            last_summary: None,
            last_error: None,
        }
    }
}

// =============================================================================
// Sync Orchestrator
// =============================================================================

/// Runs sync invocations for one host over a shared network client.
pub struct SyncOrchestrator<C: NetworkClient, R: PairResolver> {
    /// Sync configuration.
    config: Arc<SyncConfig>,

    /// Discovers collection pairs per account.
    resolver: R,

    /// Runs single passes.
    runner: PassRunner<C>,

    /// Shared client ownership.
    lifecycle: ClientLifecycle<C>,

    /// Back-off state across invocations.
    retry: Mutex<RetryAdvisor>,

    /// Current status.
    status: RwLock<OrchestratorStatus>,

    /// Process-wide platform identifier.
    platform_id: &'static str,
}

impl<C: NetworkClient, R: PairResolver> SyncOrchestrator<C, R> {
    /// Starts building an orchestrator.
    pub fn builder(config: SyncConfig) -> SyncOrchestratorBuilder<C, R> {
        SyncOrchestratorBuilder::new(config)
    }

    /// Returns the configuration the orchestrator was built with.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Returns the process-wide platform identifier.
    pub fn platform_id(&self) -> &'static str {
        self.platform_id
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    /// Returns the current status.
    pub async fn status(&self) -> OrchestratorStatus {
        let mut status = self.status.read().await.clone();
        status.state = self.lifecycle.state();
        status
    }

    /// Runs one sync invocation.
    ///
    /// Classified pass failures are counted in the returned summary. `Err` is
    /// returned when the orchestrator is closed, the resolver fails, or a pass
    /// hits a defect.
    pub async fn synchronize(
        &self,
        invocation: &SyncInvocation,
        provider: &R::Provider,
    ) -> SyncResult<ResultSummary> {
        let span = info_span!(
            "sync",
            invocation = %invocation.id,
            account = %invocation.account,
            authority = invocation.authority.as_deref().unwrap_or("-"),
        );

        self.run_invocation(invocation, provider).instrument(span).await
    }

    /// Requests teardown of the shared client and returns immediately.
    ///
    /// Idempotent. Only the call that scheduled the close gets the handle.
    pub fn close(&self) -> Option<JoinHandle<()>> {
        self.lifecycle.close_async()
    }

    // =========================================================================
    // Invocation
    // =========================================================================

    async fn run_invocation(
        &self,
        invocation: &SyncInvocation,
        provider: &R::Provider,
    ) -> SyncResult<ResultSummary> {
        let client = self.lifecycle.client().map_err(|_| {
            warn!(state = %self.lifecycle.state(), "Sync requested after close");
            SyncError::OrchestratorClosed
        })?;

        self.status.write().await.invocations += 1;
        info!(manual = invocation.manual, "Performing sync");

        let pairs = match self.resolver.resolve(&invocation.account, provider).await {
            Ok(pairs) => unique_pairs(pairs),
            Err(e) => {
                error!(?e, "Couldn't resolve collection pairs");
                self.record_defect(&e).await;
                return Err(e);
            }
        };

        let mut summary = ResultSummary::new();
        if pairs.is_empty() {
            info!("Nothing to synchronize");
        } else if let Err(e) = self.run_passes(pairs, client, invocation.manual, &mut summary).await {
            self.record_defect(&e).await;
            return Err(e);
        }

        let completed_at = Utc::now();
        summary.completed_at = Some(completed_at);

        let advice = self
            .retry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .advise(&summary);
        summary.retry_after = advice.delay();

        info!(
            successes = summary.successes,
            auth_failures = summary.auth_failures,
            protocol_failures = summary.protocol_failures,
            transport_failures = summary.transport_failures,
            storage_failures = summary.storage_failures,
            items = summary.items.total(),
            "Sync finished"
        );
        if advice != RetryAdvice::None {
            debug!(?advice, "Retry advice");
        }

        {
            let mut s = self.status.write().await;
            s.last_sync = Some(completed_at);
            s.last_summary = Some(summary.clone());
        }

        Ok(summary)
    }

    /// Runs every pair once and folds the outcomes into `summary`.
    async fn run_passes(
        &self,
        pairs: Vec<CollectionPair>,
        client: Arc<C>,
        manual: bool,
        summary: &mut ResultSummary,
    ) -> SyncResult<()> {
        let limit = Arc::new(Semaphore::new(self.config.max_concurrent_passes()));
        let mut passes = JoinSet::new();

        debug!(pairs = pairs.len(), limit = self.config.max_concurrent_passes(), "Starting passes");
        for pair in pairs {
            let runner = self.runner.clone();
            let client = client.clone();
            let limit = limit.clone();

            passes.spawn(async move {
                let _permit = limit
                    .acquire_owned()
                    .await
                    .map_err(|_| SyncError::Internal("pass limiter closed".into()))?;
                runner.run_pass(&pair, client, manual).await
            });
        }

        while let Some(joined) = passes.join_next().await {
            match joined {
                Ok(Ok(outcome)) => summary.record(outcome),
                Ok(Err(defect)) => {
                    passes.abort_all();
                    return Err(defect);
                }
                Err(join_error) => {
                    passes.abort_all();
                    if join_error.is_panic() {
                        error!("Pass panicked, aborting invocation");
                        std::panic::resume_unwind(join_error.into_panic());
                    }
                    return Err(SyncError::Internal(format!("pass cancelled: {join_error}")));
                }
            }
        }

        Ok(())
    }

    async fn record_defect(&self, err: &SyncError) {
        let mut s = self.status.write().await;
        s.last_error = Some(err.to_string());
    }
}

/// Drops pairs whose key was already seen, keeping the first.
fn unique_pairs(pairs: Vec<CollectionPair>) -> Vec<CollectionPair> {
    let mut seen = HashSet::new();
    pairs
        .into_iter()
        .filter(|pair| {
            let fresh = seen.insert(pair.key());
            if !fresh {
                warn!(pair = %pair, "Dropping duplicate collection pair");
            }
            fresh
        })
        .collect()
}

// =============================================================================
// Builder Pattern
// =============================================================================

/// Builder for creating a SyncOrchestrator.
pub struct SyncOrchestratorBuilder<C: NetworkClient, R: PairResolver> {
    config: SyncConfig,
    client_factory: Option<Box<dyn ClientFactory<Client = C>>>,
    resolver: Option<R>,
    engines: Option<Arc<dyn EngineFactory<C>>>,
}

impl<C: NetworkClient, R: PairResolver> SyncOrchestratorBuilder<C, R> {
    /// Creates a new builder with the given config.
    pub fn new(config: SyncConfig) -> Self {
        SyncOrchestratorBuilder {
            config,
            client_factory: None,
            resolver: None,
            engines: None,
        }
    }

    /// Sets the factory for the shared network client.
    pub fn client_factory<F>(mut self, factory: F) -> Self
    where
        F: ClientFactory<Client = C> + 'static,
    {
        self.client_factory = Some(Box::new(factory));
        self
    }

    /// Sets the pair resolver.
    pub fn resolver(mut self, resolver: R) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Sets the reconciliation engine factory.
    pub fn engines<E: EngineFactory<C>>(mut self, engines: Arc<E>) -> Self {
        self.engines = Some(engines);
        self
    }

    /// Builds the orchestrator. Must be called inside a Tokio runtime.
    pub fn build(self) -> SyncResult<SyncOrchestrator<C, R>> {
        let runtime = Handle::try_current()
            .map_err(|_| SyncError::InvalidConfig("Tokio runtime required".into()))?;

        self.config.validate()?;

        let factory = self
            .client_factory
            .ok_or_else(|| SyncError::InvalidConfig("Client factory required".into()))?;
        let resolver = self
            .resolver
            .ok_or_else(|| SyncError::InvalidConfig("Pair resolver required".into()))?;
        let engines = self
            .engines
            .ok_or_else(|| SyncError::InvalidConfig("Engine factory required".into()))?;

        let platform_id = platform::init(self.config.device_id());
        let lifecycle =
            ClientLifecycle::create(factory.as_ref(), &self.config.client, platform_id, runtime)?;
        let retry = RetryAdvisor::new(&self.config.sync);

        info!(
            device_id = %self.config.device_id(),
            max_concurrent_passes = self.config.max_concurrent_passes(),
            "Sync orchestrator ready"
        );

        Ok(SyncOrchestrator {
            config: Arc::new(self.config),
            resolver,
            runner: PassRunner::new(engines),
            lifecycle,
            retry: Mutex::new(retry),
            status: RwLock::new(OrchestratorStatus::default()),
            platform_id,
        })
    }
}
