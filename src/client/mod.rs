pub mod explorer_client;

pub use explorer_client::HttpExplorerApi;

use crate::{
    error::Result,
    models::{AssetSnapshot, NftItem, NftMetadata, SyncInfo, TokenBalance},
};

/// Read-only view of the indexing backend.
#[async_trait::async_trait]
pub trait ExplorerApi: Send + Sync {
    async fn blockchain_info(&self) -> Result<SyncInfo>;

    async fn asset(&self, address: &str) -> Result<AssetSnapshot>;

    async fn erc20_token_asset(&self, address: &str, token_address: &str) -> Result<TokenBalance>;

    async fn erc721_token_assets(&self, address: &str, token_address: &str)
        -> Result<Vec<NftItem>>;

    async fn metadata(&self, token_address: &str, token_id: &str) -> Result<NftMetadata>;

    /// URL of a token icon; the image itself is fetched by the renderer.
    fn icon_url(&self, token_address: &str) -> String;
}
