use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::{
    client::ExplorerApi,
    error::Result,
    models::NftItem,
    services::{
        nft_metadata::NftMetadataResolver,
        state::{cache_key, ExplorerEvent, StateHandle},
    },
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpandOutcome {
    Loaded { items: usize, images: usize },
    AlreadyLoaded,
    InFlight,
    NoAccount,
    Superseded,
}

/// Loads an NFT collection's items on first expansion and resolves their images.
pub struct NftCollectionLoader {
    api: Arc<dyn ExplorerApi>,
    resolver: Arc<NftMetadataResolver>,
    state: StateHandle,
    permits: Arc<Semaphore>,
}

impl NftCollectionLoader {
    pub fn new(
        api: Arc<dyn ExplorerApi>,
        resolver: Arc<NftMetadataResolver>,
        state: StateHandle,
        max_inflight: usize,
    ) -> Self {
        Self {
            api,
            resolver,
            state,
            permits: Arc::new(Semaphore::new(max_inflight.max(1))),
        }
    }

    pub async fn expand(&self, collection: &str) -> Result<ExpandOutcome> {
        let key = cache_key(collection);

        let (generation, owner) = {
            let mut state = self.state.write().await;
            let Some(owner) = state.owner.clone() else {
                return Ok(ExpandOutcome::NoAccount);
            };
            if state.collections.contains_key(&key) {
                return Ok(ExpandOutcome::AlreadyLoaded);
            }
            if !state.collections_in_flight.insert(key.clone()) {
                return Ok(ExpandOutcome::InFlight);
            }
            (state.generation(), owner)
        };

        let items = match self.api.erc721_token_assets(owner.as_str(), collection).await {
            Ok(items) => items,
            Err(err) => {
                tracing::warn!(
                    "erc721 items failed owner={} collection={} err={}",
                    owner,
                    collection,
                    err
                );
                let released = self
                    .state
                    .publish_if_current(generation, |state| {
                        state.collections_in_flight.remove(&key);
                    })
                    .await;
                if released.is_none() {
                    return Ok(ExpandOutcome::Superseded);
                }
                self.state.emit(ExplorerEvent::Error {
                    message: err.user_message(),
                });
                return Err(err);
            }
        };

        let stored = self
            .state
            .publish_if_current(generation, |state| {
                state.collections_in_flight.remove(&key);
                state.collections.insert(key.clone(), items.clone());
                state.nft_images.entry(key.clone()).or_default();
            })
            .await;
        if stored.is_none() {
            return Ok(ExpandOutcome::Superseded);
        }
        tracing::info!("collection {} loaded with {} items", collection, items.len());
        self.state.emit(ExplorerEvent::CollectionLoaded {
            generation,
            collection: collection.to_string(),
            items: items.len(),
        });

        let images = self.resolve_images(generation, &key, collection, &items).await;
        Ok(ExpandOutcome::Loaded {
            items: items.len(),
            images,
        })
    }

    // Fans out metadata lookups; at most `max_inflight` run at once across all collections.
    async fn resolve_images(
        &self,
        generation: u64,
        key: &str,
        collection: &str,
        items: &[NftItem],
    ) -> usize {
        let mut tasks = JoinSet::new();

        for item in items.iter().cloned() {
            let permits = self.permits.clone();
            let resolver = self.resolver.clone();
            let state = self.state.clone();
            let key = key.to_string();
            let collection = collection.to_string();

            tasks.spawn(async move {
                let Ok(_permit) = permits.acquire_owned().await else {
                    return false;
                };
                if !state.is_current(generation).await {
                    return false;
                }

                let image = match resolver.resolve(&item).await {
                    Ok(image) => image,
                    Err(err) => {
                        tracing::warn!(
                            "nft metadata failed collection={} token_id={} err={}",
                            collection,
                            item.token_id,
                            err
                        );
                        None
                    }
                };

                let published = state
                    .publish_if_current(generation, |s| {
                        s.nft_images
                            .entry(key.clone())
                            .or_default()
                            .insert(item.token_id.clone(), image.clone());
                    })
                    .await;
                if published.is_none() {
                    return false;
                }
                state.emit(ExplorerEvent::NftImageResolved {
                    generation,
                    collection,
                    token_id: item.token_id,
                    image,
                });
                true
            });
        }

        let mut resolved = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(true) => resolved += 1,
                Ok(false) => {}
                Err(err) => tracing::error!("nft metadata task panicked: {}", err),
            }
        }
        resolved
    }
}
