use std::sync::Arc;

use crate::{client::ExplorerApi, constants::IPFS_SCHEME, error::Result, models::NftItem};

/// Rewrites every `ipfs://` reference to go through an HTTP gateway.
pub fn rewrite_ipfs(uri: &str, gateway: &str) -> String {
    if uri.contains(IPFS_SCHEME) {
        uri.replace(IPFS_SCHEME, gateway)
    } else {
        uri.to_string()
    }
}

/// Resolves the display image of a single NFT.
pub struct NftMetadataResolver {
    api: Arc<dyn ExplorerApi>,
    gateway: String,
}

impl NftMetadataResolver {
    pub fn new(api: Arc<dyn ExplorerApi>, gateway: impl Into<String>) -> Self {
        Self {
            api,
            gateway: gateway.into(),
        }
    }

    pub async fn resolve(&self, item: &NftItem) -> Result<Option<String>> {
        if item.special_url {
            return Ok(item.preset_image().map(str::to_string));
        }

        let metadata = self
            .api
            .metadata(&item.token_ref.contract_address, &item.token_id)
            .await?;

        Ok(metadata
            .image
            .map(|image| image.trim().to_string())
            .filter(|image| !image.is_empty())
            .map(|image| rewrite_ipfs(&image, &self.gateway)))
    }
}
