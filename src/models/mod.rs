// src/models/mod.rs
pub mod asset;
pub mod chain;

pub use asset::{
    AssetSnapshot,
    Direction,
    Erc20TokenRef,
    Erc721CollectionRef,
    NftItem,
    NftMetadata,
    TokenBalance,
    Transaction,
};
pub use chain::SyncInfo;

use serde::Deserialize;

// ==================== API ENVELOPE ====================
/// Wrapper every backend response is served in.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub code: u16,
    pub data: Option<T>,
    #[serde(default)]
    pub error: String,
}

impl<T> ApiEnvelope<T> {
    pub fn into_optional(self) -> crate::error::Result<Option<T>> {
        if !self.error.is_empty() {
            return Err(crate::error::ExplorerError::Backend(self.error));
        }
        Ok(self.data)
    }

    pub fn into_result(self) -> crate::error::Result<T> {
        if !self.error.is_empty() {
            return Err(crate::error::ExplorerError::Backend(self.error));
        }
        self.data.ok_or_else(|| {
            crate::error::ExplorerError::Decode(format!(
                "response (code {}) carried no data",
                self.code
            ))
        })
    }
}
