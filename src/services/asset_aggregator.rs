use std::sync::Arc;

use tokio::sync::broadcast;

use crate::{
    client::ExplorerApi,
    config::Config,
    constants::STORE_KEY_ADDRESS,
    crypto::validate,
    error::{ExplorerError, Result},
    models::Transaction,
    services::{
        erc20_enrichment::{EnrichmentReport, Erc20EnrichmentPipeline},
        nft_loader::{ExpandOutcome, NftCollectionLoader},
        nft_metadata::NftMetadataResolver,
        state::{ExplorerEvent, ExplorerView, StateHandle},
    },
    store::KeyValueStore,
    utils,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded {
        generation: u64,
        enrichment: EnrichmentReport,
    },
    /// A newer load or a reset took over before this one finished.
    Superseded,
}

/// Entry point for searching an account and reading back what is known about it.
pub struct AssetAggregator {
    api: Arc<dyn ExplorerApi>,
    store: Arc<dyn KeyValueStore>,
    state: StateHandle,
    enrichment: Erc20EnrichmentPipeline,
    nft_loader: NftCollectionLoader,
    page_size: usize,
}

impl AssetAggregator {
    pub fn new(api: Arc<dyn ExplorerApi>, store: Arc<dyn KeyValueStore>, config: &Config) -> Self {
        let state = StateHandle::new();
        let resolver = Arc::new(NftMetadataResolver::new(
            api.clone(),
            config.ipfs_gateway_url.clone(),
        ));
        let enrichment = Erc20EnrichmentPipeline::new(
            api.clone(),
            state.clone(),
            config.enrichment_failure_policy,
        );
        let nft_loader = NftCollectionLoader::new(
            api.clone(),
            resolver,
            state.clone(),
            config.nft_metadata_concurrency,
        );

        Self {
            api,
            store,
            state,
            enrichment,
            nft_loader,
            page_size: config.tx_page_size,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ExplorerEvent> {
        self.state.subscribe()
    }

    pub async fn view(&self) -> ExplorerView {
        self.state.read().await.view()
    }

    /// Searches `input`, publishes its snapshot, then enriches ERC-20 balances.
    pub async fn load(&self, input: &str) -> Result<LoadOutcome> {
        let address = match validate(input) {
            Ok(address) => address,
            Err(err) => {
                tracing::warn!("rejected address {:?}: {}", input, err);
                self.state.emit(ExplorerEvent::Error {
                    message: err.user_message(),
                });
                return Err(err);
            }
        };

        let generation = self.state.write().await.next_generation(true);
        tracing::info!("loading {} (generation {})", address, generation);

        let snapshot = match self.api.asset(address.as_str()).await {
            Ok(snapshot) => Arc::new(snapshot),
            Err(err) => {
                let current = self
                    .state
                    .publish_if_current(generation, |state| state.loading = false)
                    .await;
                if current.is_none() {
                    return Ok(LoadOutcome::Superseded);
                }
                tracing::error!("asset load failed for {}: {}", address, err);
                self.state.emit(ExplorerEvent::Error {
                    message: err.user_message(),
                });
                return Err(err);
            }
        };

        {
            // Persisting under the lock keeps a reset or newer load from being overwritten.
            let mut state = self.state.write().await;
            if !state.is_current(generation) {
                return Ok(LoadOutcome::Superseded);
            }
            state.install_snapshot(address.clone(), snapshot.clone());
            let value = address.to_string();
            if let Err(err) = self
                .with_store(move |store| store.set(STORE_KEY_ADDRESS, &value))
                .await
            {
                tracing::warn!("failed to persist address {}: {}", address, err);
            }
        }
        tracing::info!(
            "snapshot for {}: {} erc20, {} erc721, {} txs",
            address,
            snapshot.erc20_tokens.len(),
            snapshot.erc721_collections.len(),
            snapshot.tx_count
        );
        self.state.emit(ExplorerEvent::SnapshotPublished {
            generation,
            address: address.to_string(),
        });

        let enrichment = self
            .enrichment
            .run(generation, &address, &snapshot.erc20_tokens)
            .await;
        if enrichment.superseded || !self.state.is_current(generation).await {
            return Ok(LoadOutcome::Superseded);
        }

        Ok(LoadOutcome::Loaded {
            generation,
            enrichment,
        })
    }

    /// Forgets the current account and cancels whatever is still in flight for it.
    pub async fn reset(&self) -> Result<()> {
        let removed = {
            let mut state = self.state.write().await;
            let generation = state.next_generation(false);
            tracing::info!("explorer reset (generation {})", generation);
            self.with_store(|store| store.remove(STORE_KEY_ADDRESS))
                .await
        };
        self.state.emit(ExplorerEvent::Reset);
        removed
    }

    /// Reloads the last searched address, if one was persisted.
    pub async fn restore(&self) -> Result<Option<LoadOutcome>> {
        let saved = self
            .with_store(|store| store.get(STORE_KEY_ADDRESS))
            .await?;
        match saved {
            Some(address) if !address.trim().is_empty() => {
                tracing::info!("restoring last address {}", address);
                self.load(&address).await.map(Some)
            }
            _ => Ok(None),
        }
    }

    // Store implementations may touch the filesystem, so keep them off the async workers.
    async fn with_store<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&dyn KeyValueStore) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || op(store.as_ref()))
            .await
            .map_err(|e| ExplorerError::Storage(format!("store task failed: {}", e)))?
    }

    pub async fn page_count(&self) -> usize {
        let state = self.state.read().await;
        state
            .snapshot
            .as_ref()
            .map(|s| utils::page_count(s.transactions.len(), self.page_size))
            .unwrap_or(0)
    }

    /// Moves to `page`, clamped to the available pages. Returns the page now shown.
    pub async fn set_page(&self, page: usize) -> usize {
        let mut state = self.state.write().await;
        let pages = state
            .snapshot
            .as_ref()
            .map(|s| utils::page_count(s.transactions.len(), self.page_size))
            .unwrap_or(0)
            .max(1);
        state.pagination.current_page = page.clamp(1, pages);
        state.pagination.current_page
    }

    pub async fn current_page_transactions(&self) -> Vec<Transaction> {
        self.state.read().await.view().current_page(self.page_size)
    }

    pub async fn expand_collection(&self, collection: &str) -> Result<ExpandOutcome> {
        self.nft_loader.expand(collection).await
    }

    pub fn icon_url(&self, token_address: &str) -> String {
        self.api.icon_url(token_address)
    }
}
