use serde::Deserialize;
use std::env;
use std::path::PathBuf;

use crate::constants::{
    DEFAULT_API_URL, DEFAULT_IPFS_GATEWAY, DEFAULT_NFT_METADATA_CONCURRENCY,
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_STATE_FILE, DEFAULT_TX_PAGE_SIZE,
    SYNC_POLL_INTERVAL_SECS,
};

/// What the enrichment loop does after one token balance fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EnrichmentFailurePolicy {
    /// Record the failure and keep resolving the remaining tokens.
    #[default]
    Isolate,
    /// Stop at the first failure; later tokens are never requested.
    Abort,
}

impl std::str::FromStr for EnrichmentFailurePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "isolate" => Ok(EnrichmentFailurePolicy::Isolate),
            "abort" | "abort_remaining" => Ok(EnrichmentFailurePolicy::Abort),
            other => anyhow::bail!("Unknown ENRICHMENT_FAILURE_POLICY: {}", other),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // Backend
    pub api_base_url: String,
    pub request_timeout_secs: u64,

    // Sync status
    pub sync_poll_interval_secs: u64,

    // NFT
    pub ipfs_gateway_url: String,
    pub nft_metadata_concurrency: usize,

    // Presentation
    pub tx_page_size: usize,
    pub enrichment_failure_policy: EnrichmentFailurePolicy,

    // Persistence
    pub state_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_base_url: DEFAULT_API_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            sync_poll_interval_secs: SYNC_POLL_INTERVAL_SECS,
            ipfs_gateway_url: DEFAULT_IPFS_GATEWAY.to_string(),
            nft_metadata_concurrency: DEFAULT_NFT_METADATA_CONCURRENCY,
            tx_page_size: DEFAULT_TX_PAGE_SIZE,
            enrichment_failure_policy: EnrichmentFailurePolicy::default(),
            state_file: PathBuf::from(DEFAULT_STATE_FILE),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            api_base_url: env::var("EXPLORER_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            request_timeout_secs: env::var("EXPLORER_REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| DEFAULT_REQUEST_TIMEOUT_SECS.to_string())
                .parse()?,

            sync_poll_interval_secs: env::var("SYNC_POLL_INTERVAL_SECS")
                .unwrap_or_else(|_| SYNC_POLL_INTERVAL_SECS.to_string())
                .parse()?,

            ipfs_gateway_url: env::var("IPFS_GATEWAY_URL")
                .unwrap_or_else(|_| DEFAULT_IPFS_GATEWAY.to_string()),
            nft_metadata_concurrency: env::var("NFT_METADATA_CONCURRENCY")
                .unwrap_or_else(|_| DEFAULT_NFT_METADATA_CONCURRENCY.to_string())
                .parse()?,

            tx_page_size: env::var("TX_PAGE_SIZE")
                .unwrap_or_else(|_| DEFAULT_TX_PAGE_SIZE.to_string())
                .parse()?,
            enrichment_failure_policy: env::var("ENRICHMENT_FAILURE_POLICY")
                .ok()
                .map(|raw| raw.parse())
                .transpose()?
                .unwrap_or_default(),

            state_file: env::var("EXPLORER_STATE_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_STATE_FILE)),
        })
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let parsed = url::Url::parse(&self.api_base_url)
            .map_err(|e| anyhow::anyhow!("EXPLORER_API_URL is invalid: {}", e))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            anyhow::bail!("EXPLORER_API_URL must use http or https");
        }
        if self.request_timeout_secs == 0 {
            anyhow::bail!("EXPLORER_REQUEST_TIMEOUT_SECS must be > 0");
        }
        if self.sync_poll_interval_secs == 0 {
            anyhow::bail!("SYNC_POLL_INTERVAL_SECS must be > 0");
        }
        if self.nft_metadata_concurrency == 0 {
            anyhow::bail!("NFT_METADATA_CONCURRENCY must be > 0");
        }
        if self.tx_page_size == 0 {
            anyhow::bail!("TX_PAGE_SIZE must be > 0");
        }

        if !self.ipfs_gateway_url.ends_with('/') {
            tracing::warn!("IPFS_GATEWAY_URL does not end with '/'; rewritten URLs may be malformed");
        }
        if self.nft_metadata_concurrency > 64 {
            tracing::warn!(
                "NFT_METADATA_CONCURRENCY={} is high; the backend may throttle metadata requests",
                self.nft_metadata_concurrency
            );
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs)
    }

    pub fn sync_poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.sync_poll_interval_secs)
    }
}
