//! # tandem-core: Pure Domain Types for Tandem
//!
//! Everything the sync orchestrator and its scheduler agree on, with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tandem Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Scheduler (host application)                 │   │
//! │  │    periodic timer / push trigger / manual request              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ SyncInvocation ▼   ▲ ResultSummary     │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 tandem-sync (SyncOrchestrator)                  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tandem-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌────────────────┐  ┌───────────┐             │   │
//! │  │   │   types   │  │    summary     │  │ validation│             │   │
//! │  │   │  Account  │  │ FailureCategory│  │   rules   │             │   │
//! │  │   │   Item    │  │ ResultSummary  │  │           │             │   │
//! │  │   └───────────┘  └────────────────┘  └───────────┘             │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • NO RUNTIME                              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Account, invocation and item types
//! - [`summary`] - Failure taxonomy and result accumulation
//! - [`error`] - Validation errors
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use tandem_core::{FailureCategory, ItemStats, PassOutcome, ResultSummary};
//!
//! let mut summary = ResultSummary::new();
//! summary.record(PassOutcome::Succeeded(ItemStats::default()));
//! summary.record(PassOutcome::Failed(FailureCategory::Auth));
//!
//! assert_eq!(summary.total_passes(), 2);
//! assert!(summary.needs_reauthentication());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod summary;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreResult, ValidationError};
pub use summary::{FailureCategory, PassOutcome, ResultSummary};
pub use types::*;
