//! Scripted in-memory backend shared by the service tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

use crate::{
    client::ExplorerApi,
    error::{ExplorerError, NetworkErrorKind, Result},
    models::{
        AssetSnapshot, Erc20TokenRef, Erc721CollectionRef, NftItem, NftMetadata, SyncInfo,
        TokenBalance, Transaction,
    },
    services::state::{cache_key, StateHandle},
};

pub(crate) const OWNER_A: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
pub(crate) const OWNER_B: &str = "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359";

pub(crate) fn not_found() -> ExplorerError {
    ExplorerError::Network(NetworkErrorKind::NotFound)
}

pub(crate) fn token(address: &str, symbol: &str, decimals: u8) -> Erc20TokenRef {
    Erc20TokenRef {
        contract_address: address.to_string(),
        symbol: symbol.to_string(),
        name: symbol.to_string(),
        decimals,
        description: String::new(),
        link: String::new(),
    }
}

pub(crate) fn collection(address: &str, name: &str) -> Erc721CollectionRef {
    Erc721CollectionRef {
        contract_address: address.to_string(),
        name: name.to_string(),
        symbol: String::new(),
    }
}

pub(crate) fn nft(collection_address: &str, token_id: &str) -> NftItem {
    NftItem {
        token_ref: collection(collection_address, "Collection"),
        token_id: token_id.to_string(),
        metadata_url: None,
        special_url: false,
    }
}

pub(crate) fn tx(from: &str, to: &str, value: &str, timestamp: u64) -> Transaction {
    Transaction {
        hash: format!("0x{:x}", timestamp),
        from: from.to_string(),
        to: to.to_string(),
        value_wei: value.to_string(),
        timestamp,
        data: None,
    }
}

pub(crate) fn snapshot(
    address: &str,
    tokens: Vec<Erc20TokenRef>,
    collections: Vec<Erc721CollectionRef>,
    transactions: Vec<Transaction>,
) -> AssetSnapshot {
    AssetSnapshot {
        address: address.to_string(),
        native_balance: "1500000000000000000".to_string(),
        erc20_tokens: tokens,
        erc721_collections: collections,
        tx_count: transactions.len(),
        transactions,
    }
}

#[derive(Default)]
pub(crate) struct FakeApi {
    assets: Mutex<HashMap<String, AssetSnapshot>>,
    balances: Mutex<HashMap<String, Result<String>>>,
    nft_items: Mutex<HashMap<String, Result<Vec<NftItem>>>>,
    metadata: Mutex<HashMap<String, Result<NftMetadata>>>,
    sync: Mutex<VecDeque<Result<SyncInfo>>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    calls: Mutex<Vec<String>>,
    observer: Mutex<Option<StateHandle>>,
    values_seen: Mutex<Vec<usize>>,
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_asset(&self, snapshot: AssetSnapshot) {
        self.assets
            .lock()
            .unwrap()
            .insert(cache_key(&snapshot.address), snapshot);
    }

    pub fn with_balance(&self, token: &str, value: Result<&str>) {
        self.balances
            .lock()
            .unwrap()
            .insert(cache_key(token), value.map(str::to_string));
    }

    pub fn with_nft_items(&self, collection: &str, items: Result<Vec<NftItem>>) {
        self.nft_items
            .lock()
            .unwrap()
            .insert(cache_key(collection), items);
    }

    pub fn with_image(&self, collection: &str, token_id: &str, image: Result<Option<&str>>) {
        self.metadata.lock().unwrap().insert(
            format!("{}/{}", cache_key(collection), token_id),
            image.map(|i| NftMetadata {
                image: i.map(str::to_string),
            }),
        );
    }

    pub fn push_sync(&self, info: Result<SyncInfo>) {
        self.sync.lock().unwrap().push_back(info);
    }

    /// Holds every call named `key` until the returned gate is notified.
    pub fn gate(&self, key: &str) -> Arc<Notify> {
        self.gates
            .lock()
            .unwrap()
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Notify::new()))
            .clone()
    }

    /// Records how many token values were published each time a balance is requested.
    pub fn observe(&self, state: StateHandle) {
        *self.observer.lock().unwrap() = Some(state);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count_calls(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    pub fn values_seen(&self) -> Vec<usize> {
        self.values_seen.lock().unwrap().clone()
    }

    async fn enter(&self, key: String) {
        self.calls.lock().unwrap().push(key.clone());
        let gate = self.gates.lock().unwrap().get(&key).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }
}

#[async_trait::async_trait]
impl ExplorerApi for FakeApi {
    async fn blockchain_info(&self) -> Result<SyncInfo> {
        self.enter("info".to_string()).await;
        let mut queue = self.sync.lock().unwrap();
        match queue.len() {
            0 => Err(not_found()),
            1 => queue.front().cloned().unwrap_or_else(|| Err(not_found())),
            _ => queue.pop_front().unwrap_or_else(|| Err(not_found())),
        }
    }

    async fn asset(&self, address: &str) -> Result<AssetSnapshot> {
        self.enter(format!("asset:{}", cache_key(address))).await;
        self.assets
            .lock()
            .unwrap()
            .get(&cache_key(address))
            .cloned()
            .ok_or_else(not_found)
    }

    async fn erc20_token_asset(&self, _address: &str, token_address: &str) -> Result<TokenBalance> {
        let observer = self.observer.lock().unwrap().clone();
        if let Some(state) = observer {
            let published = state.read().await.token_values.len();
            self.values_seen.lock().unwrap().push(published);
        }
        self.enter(format!("erc20:{}", cache_key(token_address))).await;
        self.balances
            .lock()
            .unwrap()
            .get(&cache_key(token_address))
            .cloned()
            .unwrap_or_else(|| Err(not_found()))
            .map(|value| TokenBalance { value })
    }

    async fn erc721_token_assets(
        &self,
        _address: &str,
        token_address: &str,
    ) -> Result<Vec<NftItem>> {
        self.enter(format!("erc721:{}", cache_key(token_address))).await;
        self.nft_items
            .lock()
            .unwrap()
            .get(&cache_key(token_address))
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn metadata(&self, token_address: &str, token_id: &str) -> Result<NftMetadata> {
        let key = format!("{}/{}", cache_key(token_address), token_id);
        self.enter(format!("metadata:{}", key)).await;
        self.metadata
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .unwrap_or_else(|| Ok(NftMetadata::default()))
    }

    fn icon_url(&self, token_address: &str) -> String {
        format!("http://fake/asset/icon/{}", token_address)
    }
}
