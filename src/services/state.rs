use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::{broadcast, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::{
    constants::EVENT_CHANNEL_CAPACITY,
    crypto::Address,
    models::{AssetSnapshot, NftItem, Transaction},
    utils::{self, PaginationState},
};

/// Contract and collection addresses are cached under their lowercase form.
pub fn cache_key(address: &str) -> String {
    address.trim().to_ascii_lowercase()
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenValue {
    Ready(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImageSlot {
    Pending,
    Ready(String),
    Unavailable,
}

/// Published changes, for the presentation layer and notification collaborators.
#[derive(Debug, Clone, PartialEq)]
pub enum ExplorerEvent {
    SnapshotPublished {
        generation: u64,
        address: String,
    },
    TokenValueResolved {
        generation: u64,
        contract: String,
        value: String,
    },
    TokenValueFailed {
        generation: u64,
        contract: String,
        message: String,
    },
    EnrichmentFinished {
        generation: u64,
        resolved: usize,
        failed: usize,
        skipped: usize,
    },
    CollectionLoaded {
        generation: u64,
        collection: String,
        items: usize,
    },
    NftImageResolved {
        generation: u64,
        collection: String,
        token_id: String,
        image: Option<String>,
    },
    Reset,
    /// User-facing failure message.
    Error { message: String },
}

/// Everything the explorer knows about the current account.
#[derive(Debug, Default)]
pub struct ExplorerState {
    pub(crate) generation: u64,
    pub(crate) loading: bool,
    pub(crate) owner: Option<Address>,
    pub(crate) snapshot: Option<Arc<AssetSnapshot>>,
    pub(crate) token_values: HashMap<String, TokenValue>,
    pub(crate) collections: HashMap<String, Vec<NftItem>>,
    pub(crate) collections_in_flight: HashSet<String>,
    pub(crate) nft_images: HashMap<String, HashMap<String, Option<String>>>,
    pub(crate) pagination: PaginationState,
}

impl ExplorerState {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    fn clear_account(&mut self) {
        self.owner = None;
        self.snapshot = None;
        self.token_values.clear();
        self.collections.clear();
        self.collections_in_flight.clear();
        self.nft_images.clear();
        self.pagination.reset();
    }

    /// Invalidates in-flight work and drops the current account.
    pub(crate) fn next_generation(&mut self, loading: bool) -> u64 {
        self.generation += 1;
        self.loading = loading;
        self.clear_account();
        self.generation
    }

    pub(crate) fn install_snapshot(&mut self, owner: Address, snapshot: Arc<AssetSnapshot>) {
        self.clear_account();
        self.owner = Some(owner);
        self.snapshot = Some(snapshot);
        self.loading = false;
    }

    pub fn view(&self) -> ExplorerView {
        ExplorerView {
            generation: self.generation,
            loading: self.loading,
            owner: self.owner.clone(),
            snapshot: self.snapshot.clone(),
            token_values: self.token_values.clone(),
            collections: self.collections.clone(),
            nft_images: self.nft_images.clone(),
            pagination: self.pagination,
        }
    }
}

/// Owned point-in-time copy of [`ExplorerState`].
#[derive(Debug, Clone)]
pub struct ExplorerView {
    pub generation: u64,
    pub loading: bool,
    pub owner: Option<Address>,
    pub snapshot: Option<Arc<AssetSnapshot>>,
    pub token_values: HashMap<String, TokenValue>,
    pub collections: HashMap<String, Vec<NftItem>>,
    pub nft_images: HashMap<String, HashMap<String, Option<String>>>,
    pub pagination: PaginationState,
}

impl ExplorerView {
    /// `None` while the balance is still loading.
    pub fn token_value(&self, contract: &str) -> Option<&TokenValue> {
        self.token_values.get(&cache_key(contract))
    }

    pub fn collection_items(&self, collection: &str) -> Option<&[NftItem]> {
        self.collections.get(&cache_key(collection)).map(Vec::as_slice)
    }

    /// Image state per item, in item order.
    pub fn images_for(&self, collection: &str) -> Vec<ImageSlot> {
        let key = cache_key(collection);
        let Some(items) = self.collections.get(&key) else {
            return Vec::new();
        };
        let resolved = self.nft_images.get(&key);
        items
            .iter()
            .map(|item| match resolved.and_then(|m| m.get(&item.token_id)) {
                None => ImageSlot::Pending,
                Some(Some(url)) => ImageSlot::Ready(url.clone()),
                Some(None) => ImageSlot::Unavailable,
            })
            .collect()
    }

    pub fn current_page(&self, page_size: usize) -> Vec<Transaction> {
        self.snapshot
            .as_ref()
            .map(|s| utils::page(&s.transactions, self.pagination.current_page, page_size).to_vec())
            .unwrap_or_default()
    }
}

/// Shared handle over the single lock that owns all explorer state.
#[derive(Clone)]
pub struct StateHandle {
    inner: Arc<RwLock<ExplorerState>>,
    events: broadcast::Sender<ExplorerEvent>,
}

impl Default for StateHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl StateHandle {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(RwLock::new(ExplorerState::default())),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ExplorerEvent> {
        self.events.subscribe()
    }

    pub(crate) fn emit(&self, event: ExplorerEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, ExplorerState> {
        self.inner.read().await
    }

    pub(crate) async fn write(&self) -> RwLockWriteGuard<'_, ExplorerState> {
        self.inner.write().await
    }

    pub async fn is_current(&self, generation: u64) -> bool {
        self.inner.read().await.is_current(generation)
    }

    /// Applies `apply` only while `generation` is still current.
    pub(crate) async fn publish_if_current<F, R>(&self, generation: u64, apply: F) -> Option<R>
    where
        F: FnOnce(&mut ExplorerState) -> R,
    {
        let mut state = self.inner.write().await;
        if !state.is_current(generation) {
            tracing::debug!(
                "discarding stale result for generation {} (current {})",
                generation,
                state.generation
            );
            return None;
        }
        Some(apply(&mut state))
    }
}
