//! # Pair Resolver
//!
//! Discovers which (local, remote) collection pairs an account synchronizes.
//! The resolver is injected into the orchestrator; each account kind
//! (contacts, calendars, ...) brings its own implementation.

use async_trait::async_trait;
use tandem_core::Account;

use crate::collection::CollectionPair;
use crate::error::SyncResult;

/// Resolves the collection pairs for one account.
#[async_trait]
pub trait PairResolver: Send + Sync + 'static {
    /// Handle to the local storage provider the pairs are opened from.
    type Provider: ?Sized + Send + Sync;

    /// Returns the pairs to synchronize. An empty list means "nothing to
    /// synchronize" and is not an error.
    ///
    /// Errors returned here are not classified; they abort the invocation.
    async fn resolve(
        &self,
        account: &Account,
        provider: &Self::Provider,
    ) -> SyncResult<Vec<CollectionPair>>;
}

/// Resolver over a fixed set of pairs, for hosts that configure their
/// collections up front.
#[derive(Debug, Clone, Default)]
pub struct StaticPairResolver {
    pairs: Vec<CollectionPair>,
}

impl StaticPairResolver {
    pub fn new(pairs: Vec<CollectionPair>) -> Self {
        StaticPairResolver { pairs }
    }
}

#[async_trait]
impl PairResolver for StaticPairResolver {
    type Provider = ();

    async fn resolve(&self, _account: &Account, _provider: &()) -> SyncResult<Vec<CollectionPair>> {
        Ok(self.pairs.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{account, pair};

    #[tokio::test]
    async fn test_static_resolver() {
        let resolver = StaticPairResolver::new(vec![pair("a"), pair("b")]);
        let pairs = resolver.resolve(&account(), &()).await.unwrap();
        assert_eq!(pairs.len(), 2);

        let empty = StaticPairResolver::default();
        assert!(empty.resolve(&account(), &()).await.unwrap().is_empty());
    }
}
