//! # Pass Runner
//!
//! Runs one reconciliation pass over one collection pair and turns whatever
//! the engine reports into a [`PassOutcome`].
//!
//! ## Isolation Boundary
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         run_pass(pair)                                  │
//! │                                                                         │
//! │  EngineFactory::build(pair, client) ──► ReconciliationEngine            │
//! │                                              │                          │
//! │                                     synchronize(manual)                 │
//! │                                              │                          │
//! │              ┌───────────────────────────────┼──────────────────┐       │
//! │              ▼                               ▼                  ▼       │
//! │     Ok(ItemStats)               Err(classified)       Err(unclassified) │
//! │              │                               │                  │       │
//! │  Ok(Succeeded(stats))          Ok(Failed(category))      Err(defect)    │
//! │                                                                         │
//! │  Classified failures stop here; sibling pairs never see them.          │
//! │  Only defects leave the runner as errors.                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A failure ends the pass: the engine is not asked to continue with the
//! remaining items of the pair. The next invocation retries the whole pair.

use std::sync::Arc;

use async_trait::async_trait;
use tandem_core::{FailureCategory, ItemStats, PassOutcome};
use tracing::{debug, error, warn};

use crate::collection::CollectionPair;
use crate::error::{SyncError, SyncResult};
use crate::lifecycle::NetworkClient;

// =============================================================================
// Engine Traits
// =============================================================================

/// Per-pair reconciliation algorithm (diffing, conflict resolution, change
/// tokens). One engine is built per pass.
#[async_trait]
pub trait ReconciliationEngine: Send {
    /// Reconciles the pair. `manual` is true for user-initiated syncs.
    async fn synchronize(&mut self, manual: bool) -> SyncResult<ItemStats>;
}

/// Builds a reconciliation engine bound to a pair and the shared client.
pub trait EngineFactory<C: NetworkClient>: Send + Sync + 'static {
    fn build(&self, pair: &CollectionPair, client: Arc<C>) -> Box<dyn ReconciliationEngine>;
}

// =============================================================================
// Pass Runner
// =============================================================================

/// Runs single passes. Cheap to clone into pass tasks.
pub struct PassRunner<C: NetworkClient> {
    engines: Arc<dyn EngineFactory<C>>,
}

impl<C: NetworkClient> Clone for PassRunner<C> {
    fn clone(&self) -> Self {
        PassRunner {
            engines: self.engines.clone(),
        }
    }
}

impl<C: NetworkClient> PassRunner<C> {
    pub fn new(engines: Arc<dyn EngineFactory<C>>) -> Self {
        PassRunner { engines }
    }

    /// Runs one pass over `pair`.
    ///
    /// Returns `Err` only for failures that fit no [`FailureCategory`].
    pub async fn run_pass(
        &self,
        pair: &CollectionPair,
        client: Arc<C>,
        manual: bool,
    ) -> SyncResult<PassOutcome> {
        debug!(pair = %pair, manual, "Starting pass");
        let mut engine = self.engines.build(pair, client);

        match engine.synchronize(manual).await {
            Ok(stats) => {
                debug!(
                    pair = %pair,
                    inserted = stats.inserted,
                    updated = stats.updated,
                    deleted = stats.deleted,
                    "Pass complete"
                );
                Ok(PassOutcome::Succeeded(stats))
            }
            Err(err) => match err.category() {
                Some(category) => {
                    log_failure(pair, category, &err);
                    Ok(PassOutcome::Failed(category))
                }
                None => {
                    error!(pair = %pair, ?err, "Unclassified failure during pass");
                    Err(err)
                }
            },
        }
    }
}

fn log_failure(pair: &CollectionPair, category: FailureCategory, err: &SyncError) {
    match category {
        FailureCategory::Auth => error!(pair = %pair, ?err, "Remote rejected credentials"),
        FailureCategory::Protocol => error!(pair = %pair, ?err, "Invalid remote response"),
        FailureCategory::Transport => warn!(pair = %pair, ?err, "Soft network error"),
        FailureCategory::Storage => error!(pair = %pair, ?err, "Local storage error"),
    }
}
