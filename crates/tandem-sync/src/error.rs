//! # Sync Error Types
//!
//! Error types for sync operations, and the rules that sort them into the
//! [`FailureCategory`] taxonomy.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sync Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Auth           │  │   Protocol      │  │     Transport           │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  Unauthorized   │  │  InvalidResponse│  │  Http (other)           │ │
//! │  │  Http(401)      │  │  Http(4xx)      │  │  Timeout, Io            │ │
//! │  │                 │  │                 │  │  ConnectionFailed       │ │
//! │  │                 │  │                 │  │  ClientClosed           │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌───────────────────────────────────────────────┐ │
//! │  │    Storage      │  │   Unclassified (defects, never counted)       │ │
//! │  │                 │  │                                               │ │
//! │  │  LocalStorage   │  │  InvalidConfig, MissingDeviceId, InvalidUrl   │ │
//! │  │                 │  │  ConfigLoad/SaveFailed, Validation            │ │
//! │  │                 │  │  OrchestratorClosed, Internal                 │ │
//! │  └─────────────────┘  └───────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Precedence
//! Classification is first-match: Auth, then Protocol, then Transport, then
//! Storage. A 401 is always Auth even though it is also a 4xx.

use tandem_core::{FailureCategory, ValidationError};
use thiserror::Error;

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// HTTP status for an authorization rejection.
const HTTP_UNAUTHORIZED: u16 = 401;

/// Sync error type covering collaborator failures and core defects.
#[derive(Debug, Error)]
pub enum SyncError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid sync configuration.
    #[error("Invalid sync configuration: {0}")]
    InvalidConfig(String),

    /// Missing device ID (required for the platform identifier).
    #[error("Device ID not configured")]
    MissingDeviceId,

    /// Invalid collection URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    /// Caller-supplied value failed validation.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    // =========================================================================
    // Remote Errors
    // =========================================================================
    /// Remote rejected the credentials.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Remote answered with a non-success HTTP status.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// Remote response is well-formed at the transport level but violates
    /// the protocol (bad XML, missing properties, ...).
    #[error("Invalid remote response: {0}")]
    InvalidResponse(String),

    /// Request timed out.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Could not reach the remote.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Generic transport I/O failure.
    #[error("I/O error: {0}")]
    Io(String),

    /// The shared network client has been closed.
    #[error("Network client is closed")]
    ClientClosed,

    // =========================================================================
    // Local Storage Errors
    // =========================================================================
    /// Local collection store failed.
    #[error("Local storage error: {0}")]
    LocalStorage(String),

    // =========================================================================
    // Internal Errors
    // =========================================================================
    /// The orchestrator is closing or closed and cannot start an invocation.
    #[error("Sync orchestrator is closed")]
    OrchestratorClosed,

    /// Internal logic error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SyncError {
    /// Creates an HTTP status error.
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        SyncError::Http {
            status,
            message: message.into(),
        }
    }

    /// Creates a local storage error.
    pub fn local_storage(message: impl Into<String>) -> Self {
        SyncError::LocalStorage(message.into())
    }
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::TimedOut => SyncError::Timeout(err.to_string()),
            std::io::ErrorKind::ConnectionRefused
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::NotConnected => SyncError::ConnectionFailed(err.to_string()),
            _ => SyncError::Io(err.to_string()),
        }
    }
}

/// Convert reqwest errors to SyncError.
///
/// ## Error Mapping
/// ```text
/// error with status   → SyncError::Http (classified by status)
/// is_timeout()        → SyncError::Timeout
/// is_connect()        → SyncError::ConnectionFailed
/// is_decode()         → SyncError::InvalidResponse
/// is_builder()        → SyncError::InvalidConfig
/// Other               → SyncError::Io
/// ```
impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return SyncError::http(status.as_u16(), err.to_string());
        }
        if err.is_timeout() {
            SyncError::Timeout(err.to_string())
        } else if err.is_connect() {
            SyncError::ConnectionFailed(err.to_string())
        } else if err.is_decode() {
            SyncError::InvalidResponse(err.to_string())
        } else if err.is_builder() {
            SyncError::InvalidConfig(err.to_string())
        } else {
            SyncError::Io(err.to_string())
        }
    }
}

impl From<url::ParseError> for SyncError {
    fn from(err: url::ParseError) -> Self {
        SyncError::InvalidUrl(err.to_string())
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for SyncError {
    fn from(err: toml::ser::Error) -> Self {
        SyncError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl SyncError {
    /// Classifies this error into the pass failure taxonomy.
    ///
    /// Returns `None` for defects: errors that point at a bug or misuse of
    /// the core rather than at the environment. Those must propagate.
    pub fn category(&self) -> Option<FailureCategory> {
        match self {
            SyncError::Unauthorized(_) => Some(FailureCategory::Auth),
            SyncError::Http { status, .. } if *status == HTTP_UNAUTHORIZED => {
                Some(FailureCategory::Auth)
            }

            SyncError::InvalidResponse(_) => Some(FailureCategory::Protocol),
            SyncError::Http { status, .. } if (400..500).contains(status) => {
                Some(FailureCategory::Protocol)
            }

            SyncError::Http { .. }
            | SyncError::Timeout(_)
            | SyncError::ConnectionFailed(_)
            | SyncError::Io(_)
            | SyncError::ClientClosed => Some(FailureCategory::Transport),

            SyncError::LocalStorage(_) => Some(FailureCategory::Storage),

            SyncError::InvalidConfig(_)
            | SyncError::MissingDeviceId
            | SyncError::InvalidUrl(_)
            | SyncError::ConfigLoadFailed(_)
            | SyncError::ConfigSaveFailed(_)
            | SyncError::Validation(_)
            | SyncError::OrchestratorClosed
            | SyncError::Internal(_) => None,
        }
    }

    /// Returns true if this error is not a classified environmental failure.
    pub fn is_defect(&self) -> bool {
        self.category().is_none()
    }

    /// Returns true if a later invocation may succeed without intervention.
    pub fn is_retryable(&self) -> bool {
        self.category() == Some(FailureCategory::Transport)
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SyncError::InvalidConfig(_)
                | SyncError::MissingDeviceId
                | SyncError::InvalidUrl(_)
                | SyncError::ConfigLoadFailed(_)
                | SyncError::ConfigSaveFailed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_401_is_auth_not_protocol() {
        assert_eq!(
            SyncError::http(401, "nope").category(),
            Some(FailureCategory::Auth)
        );
        assert_eq!(
            SyncError::Unauthorized("bad password".into()).category(),
            Some(FailureCategory::Auth)
        );
    }

    #[test]
    fn test_client_errors_are_protocol() {
        for status in [400, 403, 404, 412, 499] {
            assert_eq!(
                SyncError::http(status, "").category(),
                Some(FailureCategory::Protocol),
                "status {status}"
            );
        }
        assert_eq!(
            SyncError::InvalidResponse("missing getetag".into()).category(),
            Some(FailureCategory::Protocol)
        );
    }

    #[test]
    fn test_server_and_io_errors_are_transport() {
        for status in [302, 500, 502, 503] {
            assert_eq!(
                SyncError::http(status, "").category(),
                Some(FailureCategory::Transport),
                "status {status}"
            );
        }
        assert_eq!(
            SyncError::Timeout("read".into()).category(),
            Some(FailureCategory::Transport)
        );
        assert_eq!(SyncError::ClientClosed.category(), Some(FailureCategory::Transport));
        assert!(SyncError::ConnectionFailed("reset".into()).is_retryable());
    }

    #[test]
    fn test_local_storage_is_storage() {
        assert_eq!(
            SyncError::local_storage("provider died").category(),
            Some(FailureCategory::Storage)
        );
    }

    #[test]
    fn test_defects_are_unclassified() {
        assert!(SyncError::Internal("bug".into()).is_defect());
        assert!(SyncError::OrchestratorClosed.is_defect());
        assert!(SyncError::MissingDeviceId.is_defect());
        assert!(SyncError::MissingDeviceId.is_config_error());
        assert!(!SyncError::Internal("bug".into()).is_retryable());
    }

    #[test]
    fn test_io_error_conversion() {
        let timed_out = std::io::Error::new(std::io::ErrorKind::TimedOut, "slow");
        assert!(matches!(SyncError::from(timed_out), SyncError::Timeout(_)));

        let reset = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "rst");
        assert!(matches!(SyncError::from(reset), SyncError::ConnectionFailed(_)));

        let other = std::io::Error::new(std::io::ErrorKind::Other, "eof");
        assert_eq!(
            SyncError::from(other).category(),
            Some(FailureCategory::Transport)
        );
    }

    /// Serves one canned HTTP response on a local port.
    async fn serve_once(response: &'static str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });
        format!("http://{addr}/contacts/")
    }

    #[tokio::test]
    async fn test_reqwest_error_conversion() {
        let client = reqwest::Client::new();

        // Nothing listens on port 1.
        let refused = client.get("http://127.0.0.1:1/").send().await.unwrap_err();
        let refused = SyncError::from(refused);
        assert!(matches!(refused, SyncError::ConnectionFailed(_)), "{refused:?}");
        assert_eq!(refused.category(), Some(FailureCategory::Transport));

        let malformed = client.get("not a url").send().await.unwrap_err();
        let malformed = SyncError::from(malformed);
        assert!(matches!(malformed, SyncError::InvalidConfig(_)), "{malformed:?}");
        assert!(malformed.is_defect());

        let url = serve_once("HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n").await;
        let missing = client
            .get(url)
            .send()
            .await
            .unwrap()
            .error_for_status()
            .unwrap_err();
        let missing = SyncError::from(missing);
        assert!(matches!(missing, SyncError::Http { status: 404, .. }), "{missing:?}");
        assert_eq!(missing.category(), Some(FailureCategory::Protocol));
    }
}
