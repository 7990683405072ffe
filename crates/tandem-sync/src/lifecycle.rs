//! # Client Lifecycle
//!
//! Owns the shared network client: created once when the orchestrator is
//! built, closed at most once in the background when asked.
//!
//! ## Lifecycle States
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Shared Client Lifecycle                              │
//! │                                                                         │
//! │  ┌────────────┐  close_async()  ┌────────────┐  close task  ┌────────┐ │
//! │  │   Active   │ ──────────────► │  Closing   │ ───────────► │ Closed │ │
//! │  └────────────┘                 └────────────┘   finished   └────────┘ │
//! │        │                              │                          │      │
//! │   client() ok                  client() → ClientClosed      (same)     │
//! │                                                                         │
//! │  • close_async() never blocks: the close runs on the runtime captured  │
//! │    at creation, so it may be called from any thread.                   │
//! │  • A second close_async() is a no-op.                                  │
//! │  • Passes already holding the client keep their Arc; if the close      │
//! │    lands mid-pass they see ClientClosed (a transport failure).         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::ClientSettings;
use crate::error::{SyncError, SyncResult};

// =============================================================================
// Client Traits
// =============================================================================

/// A long-lived network client shared by every pass of an orchestrator.
#[async_trait]
pub trait NetworkClient: Send + Sync + 'static {
    /// Releases the client's resources. Failures are reported, never retried.
    async fn close(&self) -> SyncResult<()>;

    /// Returns true once `close` has run.
    fn is_closed(&self) -> bool;
}

/// Builds the shared network client.
pub trait ClientFactory: Send + Sync {
    type Client: NetworkClient;

    fn create(&self, settings: &ClientSettings, platform_id: &str) -> SyncResult<Self::Client>;
}

// =============================================================================
// Lifecycle State
// =============================================================================

/// State of an orchestrator and its shared client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Client live, invocations may run.
    Active,
    /// Close requested, no new invocations may start.
    Closing,
    /// Client released.
    Closed,
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleState::Active => write!(f, "active"),
            LifecycleState::Closing => write!(f, "closing"),
            LifecycleState::Closed => write!(f, "closed"),
        }
    }
}

// =============================================================================
// Client Lifecycle
// =============================================================================

/// Creation and idempotent background teardown of the shared client.
pub struct ClientLifecycle<C: NetworkClient> {
    /// The live client. Emptied when close is requested.
    slot: RwLock<Option<Arc<C>>>,

    /// Latch: the first close request wins.
    close_requested: AtomicBool,

    /// Set by the close task when it finishes.
    closed: Arc<AtomicBool>,

    /// Runtime the close task is spawned on.
    runtime: Handle,
}

impl<C: NetworkClient> ClientLifecycle<C> {
    /// Creates the client through `factory`.
    pub fn create<F>(
        factory: &F,
        settings: &ClientSettings,
        platform_id: &str,
        runtime: Handle,
    ) -> SyncResult<Self>
    where
        F: ClientFactory<Client = C> + ?Sized,
    {
        let client = factory.create(settings, platform_id)?;
        debug!(platform_id = %platform_id, "Shared network client created");

        Ok(ClientLifecycle {
            slot: RwLock::new(Some(Arc::new(client))),
            close_requested: AtomicBool::new(false),
            closed: Arc::new(AtomicBool::new(false)),
            runtime,
        })
    }

    /// Returns the live client, or `ClientClosed` once a close was requested.
    pub fn client(&self) -> SyncResult<Arc<C>> {
        let slot = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        if self.close_requested.load(Ordering::Acquire) {
            return Err(SyncError::ClientClosed);
        }
        slot.clone().ok_or(SyncError::ClientClosed)
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        if self.closed.load(Ordering::Acquire) {
            LifecycleState::Closed
        } else if self.close_requested.load(Ordering::Acquire) {
            LifecycleState::Closing
        } else {
            LifecycleState::Active
        }
    }

    /// Schedules the client close on the captured runtime and returns at once.
    ///
    /// Only the first call schedules anything; it gets the task handle back.
    /// Close failures are logged, not returned.
    pub fn close_async(&self) -> Option<JoinHandle<()>> {
        // Latch and take under the slot lock; client() checks the latch.
        let client = {
            let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
            if self
                .close_requested
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                debug!("Close already requested");
                return None;
            }
            slot.take()
        };
        let closed = MarkClosed(self.closed.clone());

        let client = client?;

        info!("Closing shared network client");
        Some(self.runtime.spawn(async move {
            // Marks Closed however this task ends.
            let _closed = closed;
            match client.close().await {
                Ok(()) => debug!("Shared network client closed"),
                Err(e) => warn!(?e, "Couldn't close network client"),
            }
        }))
    }
}

/// Moves the lifecycle to Closed when dropped.
struct MarkClosed(Arc<AtomicBool>);

impl Drop for MarkClosed {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Release);
    }
}
