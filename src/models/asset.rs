use serde::{Deserialize, Serialize};

use crate::{constants::TOKEN_ID_DISPLAY_CHARS, crypto::Address};

// ==================== TOKENS ====================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Erc20TokenRef {
    #[serde(rename = "address")]
    pub contract_address: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub decimals: u8,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub link: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Erc721CollectionRef {
    #[serde(rename = "address")]
    pub contract_address: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub symbol: String,
}

// ==================== TRANSACTION ====================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(default)]
    pub hash: String,
    pub from: String,
    #[serde(default)]
    pub to: String,
    #[serde(rename = "value")]
    pub value_wei: String,
    pub timestamp: u64,
    /// Opaque call payload as served by the backend.
    #[serde(default)]
    pub data: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Outgoing,
    Incoming,
}

impl Transaction {
    /// Outgoing when the viewed account is the sender.
    pub fn direction(&self, owner: &Address) -> Direction {
        if owner.matches(&self.from) {
            Direction::Outgoing
        } else {
            Direction::Incoming
        }
    }
}

// ==================== SNAPSHOT ====================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetSnapshot {
    pub address: String,
    #[serde(rename = "balance")]
    pub native_balance: String,
    #[serde(rename = "erc20_tokens", default)]
    pub erc20_tokens: Vec<Erc20TokenRef>,
    #[serde(rename = "erc721_tokens", default)]
    pub erc721_collections: Vec<Erc721CollectionRef>,
    #[serde(rename = "txs", default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub tx_count: usize,
}

// ==================== TOKEN ASSETS ====================
#[derive(Debug, Clone, Deserialize)]
pub struct TokenBalance {
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NftItem {
    #[serde(rename = "token")]
    pub token_ref: Erc721CollectionRef,
    pub token_id: String,
    #[serde(default)]
    pub metadata_url: Option<String>,
    #[serde(default)]
    pub special_url: bool,
}

impl NftItem {
    /// Pre-resolved image URL, present only for collections without a fetchable token URI.
    pub fn preset_image(&self) -> Option<&str> {
        if !self.special_url {
            return None;
        }
        self.metadata_url.as_deref().filter(|url| !url.is_empty())
    }

    /// Token id shortened for list display.
    pub fn display_token_id(&self) -> String {
        if self.token_id.chars().count() > TOKEN_ID_DISPLAY_CHARS {
            let head: String = self.token_id.chars().take(TOKEN_ID_DISPLAY_CHARS).collect();
            format!("{}…", head)
        } else {
            self.token_id.clone()
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NftMetadata {
    #[serde(default)]
    pub image: Option<String>,
}
