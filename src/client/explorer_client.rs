use serde::de::DeserializeOwned;

use crate::{
    config::Config,
    error::{kind_for_status, ExplorerError, Result},
    models::{
        chain::BlockchainInfoResponse, ApiEnvelope, AssetSnapshot, NftItem, NftMetadata, SyncInfo,
        TokenBalance,
    },
};

use super::ExplorerApi;

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

fn asset_path(address: &str) -> String {
    format!("asset/{}", address)
}

fn erc20_asset_path(address: &str, token_address: &str) -> String {
    format!("asset/erc20_token_assets/{}/{}", address, token_address)
}

fn erc721_assets_path(address: &str, token_address: &str) -> String {
    format!("asset/erc721_token_assets/{}/{}", address, token_address)
}

fn metadata_path(token_address: &str, token_id: &str) -> String {
    format!("asset/metadata/{}/{}", token_address, token_id)
}

/// HTTP client for the indexing backend
pub struct HttpExplorerApi {
    base_url: String,
    client: reqwest::Client,
}

impl HttpExplorerApi {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ExplorerError::Config(format!("HTTP client error: {}", e)))?;
        Ok(Self {
            base_url: config.api_base_url.clone(),
            client,
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.envelope(path).await?.into_result()
    }

    async fn get_optional<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        self.envelope(path).await?.into_optional()
    }

    async fn envelope<T: DeserializeOwned>(&self, path: &str) -> Result<ApiEnvelope<T>> {
        let url = join_url(&self.base_url, path);
        tracing::debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!("GET {} failed with status {}", url, status);
            return Err(ExplorerError::Network(kind_for_status(status.as_u16())));
        }

        Ok(response.json().await?)
    }
}

#[async_trait::async_trait]
impl ExplorerApi for HttpExplorerApi {
    /// Get indexer sync progress
    async fn blockchain_info(&self) -> Result<SyncInfo> {
        let raw: BlockchainInfoResponse = self.get("blockchain/info").await?;
        Ok(raw.into())
    }

    /// Get the full asset snapshot of an account
    async fn asset(&self, address: &str) -> Result<AssetSnapshot> {
        self.get(&asset_path(address)).await
    }

    async fn erc20_token_asset(&self, address: &str, token_address: &str) -> Result<TokenBalance> {
        self.get(&erc20_asset_path(address, token_address)).await
    }

    async fn erc721_token_assets(
        &self,
        address: &str,
        token_address: &str,
    ) -> Result<Vec<NftItem>> {
        // Backend serves `null` for accounts with no items in the collection
        let items = self
            .get_optional::<Vec<NftItem>>(&erc721_assets_path(address, token_address))
            .await?;
        Ok(items.unwrap_or_default())
    }

    async fn metadata(&self, token_address: &str, token_id: &str) -> Result<NftMetadata> {
        self.get(&metadata_path(token_address, token_id)).await
    }

    fn icon_url(&self, token_address: &str) -> String {
        join_url(&self.base_url, &format!("asset/icon/{}", token_address))
    }
}
