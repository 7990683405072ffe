//! # Collections
//!
//! Capability traits for the two sides of a collection pair. Concrete local
//! stores and remote protocols live outside this crate and plug in here.
//!
//! ```text
//! ┌───────────────────────┐            ┌───────────────────────┐
//! │   LocalCollection     │            │   RemoteCollection    │
//! │   id()                │  ◄─pair─►  │   url()               │
//! │   list/read/write/    │            │   list/read/write/    │
//! │   delete              │            │   delete              │
//! └───────────────────────┘            └───────────────────────┘
//! ```
//!
//! Local implementations report their failures as
//! [`SyncError::LocalStorage`](crate::SyncError::LocalStorage); remote
//! implementations use the remote variants (`Http`, `InvalidResponse`, ...).

use std::sync::Arc;

use async_trait::async_trait;
use tandem_core::{Item, ItemRef};
use url::Url;

use crate::error::SyncResult;

// =============================================================================
// Capability Traits
// =============================================================================

/// A collection in local storage (address book, calendar, ...).
///
/// Implementations must report their failures as
/// [`SyncError::LocalStorage`](crate::SyncError::LocalStorage). A bare `?` on
/// a `std::io::Error` converts to a transport error and would be counted as a
/// network failure; map it with `.map_err(|e| SyncError::local_storage(e.to_string()))`.
#[async_trait]
pub trait LocalCollection: Send + Sync {
    /// Stable identifier of the collection within the local store.
    fn id(&self) -> &str;

    /// Enumerates the items currently stored.
    async fn list(&self) -> SyncResult<Vec<ItemRef>>;

    /// Reads one item.
    async fn read(&self, name: &str) -> SyncResult<Item>;

    /// Inserts or replaces an item, returning its new reference.
    async fn write(&self, item: Item) -> SyncResult<ItemRef>;

    /// Deletes an item.
    async fn delete(&self, name: &str) -> SyncResult<()>;
}

/// A collection on the remote server.
#[async_trait]
pub trait RemoteCollection: Send + Sync {
    /// Location of the collection on the server.
    fn url(&self) -> &Url;

    async fn list(&self) -> SyncResult<Vec<ItemRef>>;

    async fn read(&self, name: &str) -> SyncResult<Item>;

    /// Uploads an item, returning the reference (with server etag).
    async fn write(&self, item: Item) -> SyncResult<ItemRef>;

    async fn delete(&self, name: &str) -> SyncResult<()>;
}

// =============================================================================
// Collection Pair
// =============================================================================

/// One local and one remote collection to reconcile against each other.
#[derive(Clone)]
pub struct CollectionPair {
    pub local: Arc<dyn LocalCollection>,
    pub remote: Arc<dyn RemoteCollection>,
}

/// Identity of a pair within one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PairKey {
    pub local_id: String,
    pub remote_url: Url,
}

impl CollectionPair {
    pub fn new(local: Arc<dyn LocalCollection>, remote: Arc<dyn RemoteCollection>) -> Self {
        CollectionPair { local, remote }
    }

    /// Returns the identity used to deduplicate pairs.
    pub fn key(&self) -> PairKey {
        PairKey {
            local_id: self.local.id().to_string(),
            remote_url: self.remote.url().clone(),
        }
    }
}

impl std::fmt::Debug for CollectionPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionPair")
            .field("local", &self.local.id())
            .field("remote", &self.remote.url().as_str())
            .finish()
    }
}

impl std::fmt::Display for CollectionPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} <-> {}", self.local.id(), self.remote.url())
    }
}
