//! # HTTP Client
//!
//! Production [`NetworkClient`]: a pooled `reqwest` client shared by every
//! reconciliation engine of an orchestrator.
//!
//! The user agent carries the platform identifier, so the server sees one
//! stable device per process:
//!
//! ```text
//! User-Agent: tandem-sync/0.1.0 (550e8400-e29b-41d4-a716-446655440000)
//! ```

use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use tracing::debug;

use crate::config::ClientSettings;
use crate::error::{SyncError, SyncResult};
use crate::lifecycle::{ClientFactory, NetworkClient};

/// Shared HTTP client. Closing drops the connection pool.
#[derive(Debug)]
pub struct HttpClient {
    inner: RwLock<Option<reqwest::Client>>,
    user_agent: String,
}

impl HttpClient {
    /// Returns a handle to the underlying client for issuing requests.
    ///
    /// `reqwest::Client` is reference-counted, so the handle is cheap and
    /// stays usable by a request already in flight when the client closes.
    pub fn inner(&self) -> SyncResult<reqwest::Client> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(SyncError::ClientClosed)
    }

    /// The user agent sent with every request.
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

#[async_trait]
impl NetworkClient for HttpClient {
    async fn close(&self) -> SyncResult<()> {
        let client = self
            .inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if client.is_some() {
            debug!("HTTP client connection pool released");
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

/// Builds [`HttpClient`]s from [`ClientSettings`].
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpClientFactory;

impl ClientFactory for HttpClientFactory {
    type Client = HttpClient;

    fn create(&self, settings: &ClientSettings, platform_id: &str) -> SyncResult<HttpClient> {
        let user_agent = format!("{} ({})", settings.user_agent, platform_id);

        let client = reqwest::Client::builder()
            .user_agent(user_agent.clone())
            .connect_timeout(settings.connect_timeout())
            .timeout(settings.request_timeout())
            .pool_idle_timeout(settings.pool_idle_timeout())
            .build()?;

        Ok(HttpClient {
            inner: RwLock::new(Some(client)),
            user_agent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_close() {
        let client = HttpClientFactory
            .create(&ClientSettings::default(), "device-42")
            .unwrap();

        assert!(client.user_agent().starts_with("tandem-sync/"));
        assert!(client.user_agent().ends_with("(device-42)"));
        assert!(client.inner().is_ok());
        assert!(!client.is_closed());

        client.close().await.unwrap();
        assert!(client.is_closed());
        assert!(matches!(client.inner(), Err(SyncError::ClientClosed)));

        // Idempotent
        client.close().await.unwrap();
    }
}
