//! # Platform Identifier
//!
//! Process-wide device identifier, initialized exactly once.
//!
//! Every orchestrator in the process shares the first identifier that was
//! initialized. Later initializations with a different id are ignored (and
//! logged), so remote servers always see one stable device per process.

use std::sync::OnceLock;

use tracing::{debug, info};
use uuid::Uuid;

/// Init-once identifier cell.
///
/// Safe under concurrent first use: exactly one initializer runs, every
/// caller observes its value.
pub struct PlatformId {
    value: OnceLock<String>,
}

impl PlatformId {
    pub const fn new() -> Self {
        PlatformId {
            value: OnceLock::new(),
        }
    }

    /// Returns the identifier, running `init` if nobody has yet.
    pub fn get_or_init(&self, init: impl FnOnce() -> String) -> &str {
        self.value.get_or_init(init)
    }

    /// Returns the identifier if it has been initialized.
    pub fn get(&self) -> Option<&str> {
        self.value.get().map(String::as_str)
    }
}

impl Default for PlatformId {
    fn default() -> Self {
        Self::new()
    }
}

static PLATFORM_ID: PlatformId = PlatformId::new();

/// Initializes the process-wide platform identifier from `device_id`.
///
/// A blank `device_id` falls back to a random UUID. Returns the identifier in
/// effect, which is the first one ever initialized.
pub fn init(device_id: &str) -> &'static str {
    let id = PLATFORM_ID.get_or_init(|| {
        let id = if device_id.trim().is_empty() {
            Uuid::new_v4().to_string()
        } else {
            device_id.to_string()
        };
        info!(platform_id = %id, "Platform identifier initialized");
        id
    });

    if !device_id.trim().is_empty() && id != device_id {
        debug!(
            platform_id = %id,
            requested = %device_id,
            "Platform identifier already initialized, keeping existing value"
        );
    }

    id
}

/// Returns the process-wide platform identifier, if initialized.
pub fn get() -> Option<&'static str> {
    PLATFORM_ID.get()
}
