//! # Domain Types
//!
//! Core domain types used throughout Tandem.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Account      │   │ SyncInvocation  │   │      Item       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  name           │   │  id (UUID)      │   │  name           │       │
//! │  │  account_type   │   │  account        │   │  etag           │       │
//! │  │  credential     │   │  manual         │   │  body           │       │
//! │  └─────────────────┘   │  authority      │   └─────────────────┘       │
//! │                        │  started_at     │                              │
//! │                        └─────────────────┘   ┌─────────────────┐       │
//! │                                              │   ItemStats     │       │
//! │                                              │  inserted       │       │
//! │                                              │  updated        │       │
//! │                                              │  deleted        │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Accounts are owned by an external credential store; this crate only ever
//! reads them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreResult;
use crate::validation::{validate_account_name, validate_account_type, validate_item_name};

// =============================================================================
// Account
// =============================================================================

/// Opaque key into the external credential store.
///
/// The key itself is not secret, but it is still redacted in `Debug` output so
/// it never lands in logs next to account names.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CredentialRef(String);

impl CredentialRef {
    pub fn new(key: impl Into<String>) -> Self {
        CredentialRef(key.into())
    }

    /// Returns the raw key for the credential store lookup.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for CredentialRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CredentialRef(<redacted>)")
    }
}

/// An authenticated account to synchronize.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Account {
    /// Account name (usually the login, e.g. "alice@example.com").
    pub name: String,

    /// Account type, scoping the name (e.g. "org.tandem.caldav").
    pub account_type: String,

    /// Handle to the stored credential.
    pub credential: CredentialRef,
}

impl Account {
    /// Creates a validated account.
    pub fn new(
        name: impl Into<String>,
        account_type: impl Into<String>,
        credential: CredentialRef,
    ) -> CoreResult<Self> {
        let name = name.into();
        let account_type = account_type.into();
        validate_account_name(&name)?;
        validate_account_type(&account_type)?;

        Ok(Account {
            name,
            account_type,
            credential,
        })
    }
}

impl std::fmt::Display for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.account_type)
    }
}

// =============================================================================
// Sync Invocation
// =============================================================================

/// One call from the scheduler into the orchestrator.
///
/// The result summary is not stored here: the orchestrator creates it at the
/// start of the call and hands it back when every pair has been attempted.
#[derive(Debug, Clone)]
pub struct SyncInvocation {
    /// Unique id, attached to every log line of the invocation.
    pub id: Uuid,

    /// Account being synchronized.
    pub account: Account,

    /// True if the user asked for this sync, false if the scheduler did.
    pub manual: bool,

    /// Content authority that triggered the sync (diagnostics only).
    pub authority: Option<String>,

    /// When the scheduler created the invocation.
    pub started_at: DateTime<Utc>,
}

impl SyncInvocation {
    /// Creates a scheduler-initiated invocation.
    pub fn new(account: Account) -> Self {
        SyncInvocation {
            id: Uuid::new_v4(),
            account,
            manual: false,
            authority: None,
            started_at: Utc::now(),
        }
    }

    /// Marks the invocation as user-initiated.
    pub fn manual(mut self, manual: bool) -> Self {
        self.manual = manual;
        self
    }

    /// Records the content authority that triggered the sync.
    pub fn with_authority(mut self, authority: impl Into<String>) -> Self {
        self.authority = Some(authority.into());
        self
    }
}

// =============================================================================
// Items
// =============================================================================

/// Reference to an item inside a collection, as returned by enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemRef {
    /// Name of the item, unique within its collection.
    pub name: String,

    /// Opaque version tag. `None` if the store does not version items.
    pub etag: Option<String>,
}

/// A complete item (reference plus content).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub etag: Option<String>,
    pub body: Vec<u8>,
}

impl Item {
    /// Creates a validated, unversioned item.
    pub fn new(name: impl Into<String>, body: impl Into<Vec<u8>>) -> CoreResult<Self> {
        let name = name.into();
        validate_item_name(&name)?;
        Ok(Item {
            name,
            etag: None,
            body: body.into(),
        })
    }

    /// Returns the reference part of this item.
    pub fn to_ref(&self) -> ItemRef {
        ItemRef {
            name: self.name.clone(),
            etag: self.etag.clone(),
        }
    }
}

/// Item-level changes made by one successful pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStats {
    pub inserted: u64,
    pub updated: u64,
    pub deleted: u64,
}

impl ItemStats {
    /// Total number of changed items.
    pub fn total(&self) -> u64 {
        self.inserted + self.updated + self.deleted
    }

    /// Adds another pass's stats to this one.
    pub fn absorb(&mut self, other: ItemStats) {
        self.inserted += other.inserted;
        self.updated += other.updated;
        self.deleted += other.deleted;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> Account {
        Account::new("alice", "org.tandem.caldav", CredentialRef::new("cred-1")).unwrap()
    }

    #[test]
    fn test_account_requires_name() {
        assert!(Account::new("", "org.tandem.caldav", CredentialRef::new("c")).is_err());
        assert!(Account::new("bob", " ", CredentialRef::new("c")).is_err());
    }

    #[test]
    fn test_credential_is_redacted() {
        let debug = format!("{:?}", account());
        assert!(!debug.contains("cred-1"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_invocation_defaults_to_scheduled() {
        let invocation = SyncInvocation::new(account());
        assert!(!invocation.manual);
        assert!(invocation.authority.is_none());

        let manual = SyncInvocation::new(account())
            .manual(true)
            .with_authority("com.android.calendar");
        assert!(manual.manual);
        assert_eq!(manual.authority.as_deref(), Some("com.android.calendar"));
        assert_ne!(invocation.id, manual.id);
    }

    #[test]
    fn test_item_stats_absorb() {
        let mut stats = ItemStats {
            inserted: 1,
            updated: 2,
            deleted: 0,
        };
        stats.absorb(ItemStats {
            inserted: 0,
            updated: 1,
            deleted: 3,
        });
        assert_eq!(stats.total(), 7);
    }

    #[test]
    fn test_item_validates_name() {
        assert!(Item::new("a.ics", b"BEGIN:VCALENDAR".to_vec()).is_ok());
        assert!(Item::new("a/b.ics", Vec::new()).is_err());
    }
}
