//! # tandem-sync: Sync Orchestration for Tandem
//!
//! This crate runs sync invocations for an account against its remote
//! collections: it resolves the (local, remote) collection pairs, runs one
//! reconciliation pass per pair, classifies failures and hands the scheduler
//! an aggregated [`ResultSummary`](tandem_core::ResultSummary).
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Sync Orchestrator Architecture                      │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                   SyncOrchestrator (entry point)                 │  │
//! │  │                                                                  │  │
//! │  │  Called by the scheduler once per invocation                     │  │
//! │  │  Folds pass outcomes into one ResultSummary                      │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │                                         │
//! │         ┌─────────────────────┼─────────────────────┐                  │
//! │         ▼                     ▼                     ▼                   │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────┐    │
//! │  │  PairResolver  │  │   PassRunner   │  │   ClientLifecycle      │    │
//! │  │                │  │                │  │                        │    │
//! │  │ Account →      │  │ One engine per │  │ Shared client created  │    │
//! │  │ collection     │  │ pair, failures │  │ once, closed in the    │    │
//! │  │ pairs          │  │ classified     │  │ background exactly once│    │
//! │  └────────────────┘  └────────────────┘  └────────────────────────┘    │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────┐    │
//! │  │  RetryAdvisor  │  │   platform     │  │   HttpClient           │    │
//! │  │                │  │                │  │                        │    │
//! │  │ Exponential    │  │ Process-wide   │  │ Pooled reqwest client  │    │
//! │  │ back-off after │  │ device id,     │  │ carrying the platform  │    │
//! │  │ soft failures  │  │ set once       │  │ id in its user agent   │    │
//! │  └────────────────┘  └────────────────┘  └────────────────────────┘    │
//! │                                                                         │
//! │  FAILURE TAXONOMY (per pass):                                          │
//! │  • Auth      - credentials rejected (HTTP 401)         hard            │
//! │  • Protocol  - malformed response, other HTTP 4xx      hard            │
//! │  • Transport - timeouts, I/O, 5xx, closed client       soft            │
//! │  • Storage   - local collection read/write failed      hard            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`orchestrator`] - `SyncOrchestrator`, its builder and status
//! - [`pass`] - Single-pass runner and the reconciliation engine seam
//! - [`resolver`] - Collection pair discovery
//! - [`collection`] - Local/remote collection traits and `CollectionPair`
//! - [`lifecycle`] - Shared network client creation and teardown
//! - [`platform`] - Process-wide platform identifier
//! - [`http`] - `reqwest`-backed network client
//! - [`retry`] - Back-off advice for the scheduler
//! - [`config`] - Configuration (TOML file + environment)
//! - [`error`] - Sync error types and classification
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tandem_core::SyncInvocation;
//! use tandem_sync::{HttpClientFactory, SyncConfig, SyncOrchestrator};
//!
//! let config = SyncConfig::load_or_default(None);
//!
//! let orchestrator = SyncOrchestrator::builder(config)
//!     .client_factory(HttpClientFactory)
//!     .resolver(resolver)
//!     .engines(Arc::new(engines))
//!     .build()?;
//!
//! let summary = orchestrator
//!     .synchronize(&SyncInvocation::new(account), &provider)
//!     .await?;
//! if summary.needs_reauthentication() {
//!     prompt_for_credentials();
//! }
//!
//! // On shutdown; does not block.
//! orchestrator.close();
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod collection;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod orchestrator;
pub mod pass;
pub mod platform;
pub mod resolver;
pub mod retry;

#[cfg(test)]
mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use collection::{CollectionPair, LocalCollection, PairKey, RemoteCollection};
pub use config::{ClientSettings, DeviceConfig, SyncConfig, SyncSettings};
pub use error::{SyncError, SyncResult};
pub use http::{HttpClient, HttpClientFactory};
pub use lifecycle::{ClientFactory, ClientLifecycle, LifecycleState, NetworkClient};
pub use orchestrator::{OrchestratorStatus, SyncOrchestrator, SyncOrchestratorBuilder};
pub use pass::{EngineFactory, PassRunner, ReconciliationEngine};
pub use resolver::{PairResolver, StaticPairResolver};
pub use retry::{RetryAdvice, RetryAdvisor};
