//! In-memory fakes shared by the unit tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tandem_core::{Account, CredentialRef, Item, ItemRef, ItemStats};
use url::Url;

use crate::collection::{CollectionPair, LocalCollection, RemoteCollection};
use crate::config::ClientSettings;
use crate::error::{SyncError, SyncResult};
use crate::lifecycle::{ClientFactory, NetworkClient};
use crate::pass::{EngineFactory, ReconciliationEngine};
use crate::resolver::PairResolver;

// =============================================================================
// Fixtures
// =============================================================================

pub fn account() -> Account {
    Account::new(
        "alice@example.com",
        "org.tandem.caldav",
        CredentialRef::new("alice-token"),
    )
    .unwrap()
}

/// A pair whose local id is `name` and whose remote lives under the same name.
pub fn pair(name: &str) -> CollectionPair {
    CollectionPair::new(
        Arc::new(MemoryLocal::new(name)),
        Arc::new(MemoryRemote::new(&format!(
            "https://dav.example.com/alice/{name}/"
        ))),
    )
}

// =============================================================================
// Collections
// =============================================================================

pub struct MemoryLocal {
    id: String,
    items: Mutex<BTreeMap<String, Item>>,
}

impl MemoryLocal {
    pub fn new(id: &str) -> Self {
        MemoryLocal {
            id: id.to_string(),
            items: Mutex::new(BTreeMap::new()),
        }
    }
}

#[async_trait]
impl LocalCollection for MemoryLocal {
    fn id(&self) -> &str {
        &self.id
    }

    async fn list(&self) -> SyncResult<Vec<ItemRef>> {
        Ok(self.items.lock().unwrap().values().map(Item::to_ref).collect())
    }

    async fn read(&self, name: &str) -> SyncResult<Item> {
        self.items
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| SyncError::local_storage(format!("no such item: {name}")))
    }

    async fn write(&self, item: Item) -> SyncResult<ItemRef> {
        let item_ref = item.to_ref();
        self.items.lock().unwrap().insert(item.name.clone(), item);
        Ok(item_ref)
    }

    async fn delete(&self, name: &str) -> SyncResult<()> {
        self.items.lock().unwrap().remove(name);
        Ok(())
    }
}

pub struct MemoryRemote {
    url: Url,
    items: Mutex<BTreeMap<String, Item>>,
}

impl MemoryRemote {
    pub fn new(url: &str) -> Self {
        MemoryRemote {
            url: Url::parse(url).unwrap(),
            items: Mutex::new(BTreeMap::new()),
        }
    }
}

#[async_trait]
impl RemoteCollection for MemoryRemote {
    fn url(&self) -> &Url {
        &self.url
    }

    async fn list(&self) -> SyncResult<Vec<ItemRef>> {
        Ok(self.items.lock().unwrap().values().map(Item::to_ref).collect())
    }

    async fn read(&self, name: &str) -> SyncResult<Item> {
        self.items
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| SyncError::http(404, format!("{name} not found")))
    }

    async fn write(&self, mut item: Item) -> SyncResult<ItemRef> {
        item.etag = Some(format!("\"{}\"", item.body.len()));
        let item_ref = item.to_ref();
        self.items.lock().unwrap().insert(item.name.clone(), item);
        Ok(item_ref)
    }

    async fn delete(&self, name: &str) -> SyncResult<()> {
        self.items
            .lock()
            .unwrap()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| SyncError::http(404, format!("{name} not found")))
    }
}

// =============================================================================
// Network Client
// =============================================================================

#[derive(Default)]
pub struct FakeClient {
    closed: AtomicBool,
    close_calls: AtomicUsize,
    fail_close: bool,
    panic_close: bool,
}

impl FakeClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails like a real client would once its pool is gone.
    pub fn check(&self) -> SyncResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            Err(SyncError::ClientClosed)
        } else {
            Ok(())
        }
    }

    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NetworkClient for FakeClient {
    async fn close(&self) -> SyncResult<()> {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        self.closed.store(true, Ordering::SeqCst);
        if self.panic_close {
            panic!("close exploded");
        }
        if self.fail_close {
            return Err(SyncError::Io("socket already gone".into()));
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
pub struct FakeClientFactory {
    created: AtomicUsize,
    fail_close: bool,
    panic_close: bool,
}

impl FakeClientFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    pub fn panicking_close(mut self) -> Self {
        self.panic_close = true;
        self
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl ClientFactory for FakeClientFactory {
    type Client = FakeClient;

    fn create(&self, _settings: &ClientSettings, _platform_id: &str) -> SyncResult<FakeClient> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(FakeClient {
            fail_close: self.fail_close,
            panic_close: self.panic_close,
            ..FakeClient::default()
        })
    }
}

// =============================================================================
// Resolvers
// =============================================================================

/// Resolver whose provider is unavailable.
pub struct FailingResolver;

#[async_trait]
impl PairResolver for FailingResolver {
    type Provider = ();

    async fn resolve(&self, _account: &Account, _provider: &()) -> SyncResult<Vec<CollectionPair>> {
        Err(SyncError::local_storage("contacts provider unavailable"))
    }
}

// =============================================================================
// Engines
// =============================================================================

/// What a scripted engine does for one pair.
#[derive(Clone, Copy)]
pub enum Script {
    /// Writes a marker item into the local collection.
    Succeed,
    /// Returns the produced error.
    Fail(fn() -> SyncError),
    /// Panics mid-pass.
    Panic,
    /// Sleeps, then behaves like `Succeed` (and so sees a closed client).
    Slow(Duration),
}

#[derive(Default)]
struct EngineLog {
    runs: Mutex<Vec<(String, bool)>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

/// Engine factory driven by per-pair scripts. Unscripted pairs succeed.
#[derive(Default)]
pub struct ScriptedEngines {
    scripts: HashMap<String, Script>,
    log: Arc<EngineLog>,
}

impl ScriptedEngines {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(mut self, local_id: &str, script: Script) -> Self {
        self.scripts.insert(local_id.to_string(), script);
        self
    }

    /// Local ids of the pairs a pass was started for, in start order.
    pub fn runs(&self) -> Vec<String> {
        self.log.runs.lock().unwrap().iter().map(|(id, _)| id.clone()).collect()
    }

    pub fn manual_flags(&self) -> Vec<bool> {
        self.log.runs.lock().unwrap().iter().map(|(_, manual)| *manual).collect()
    }

    /// Highest number of passes observed running at once.
    pub fn peak_concurrency(&self) -> usize {
        self.log.peak.load(Ordering::SeqCst)
    }
}

impl EngineFactory<FakeClient> for ScriptedEngines {
    fn build(&self, pair: &CollectionPair, client: Arc<FakeClient>) -> Box<dyn ReconciliationEngine> {
        let script = self
            .scripts
            .get(pair.local.id())
            .copied()
            .unwrap_or(Script::Succeed);

        Box::new(ScriptedEngine {
            local: pair.local.clone(),
            client,
            script,
            log: self.log.clone(),
        })
    }
}

struct ScriptedEngine {
    local: Arc<dyn LocalCollection>,
    client: Arc<FakeClient>,
    script: Script,
    log: Arc<EngineLog>,
}

impl ScriptedEngine {
    async fn write_marker(&self) -> SyncResult<ItemStats> {
        self.client.check()?;
        self.local.write(Item::new("synced.marker", b"ok".to_vec())?).await?;
        Ok(ItemStats {
            inserted: 1,
            ..ItemStats::default()
        })
    }

    async fn run(&self) -> SyncResult<ItemStats> {
        match self.script {
            Script::Succeed => self.write_marker().await,
            Script::Fail(make_error) => Err(make_error()),
            Script::Panic => panic!("reconciliation engine bug"),
            Script::Slow(delay) => {
                tokio::time::sleep(delay).await;
                self.write_marker().await
            }
        }
    }
}

#[async_trait]
impl ReconciliationEngine for ScriptedEngine {
    async fn synchronize(&mut self, manual: bool) -> SyncResult<ItemStats> {
        self.log
            .runs
            .lock()
            .unwrap()
            .push((self.local.id().to_string(), manual));
        let active = self.log.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.log.peak.fetch_max(active, Ordering::SeqCst);

        let result = self.run().await;

        self.log.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
