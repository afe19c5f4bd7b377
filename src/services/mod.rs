// Explorer services
pub mod asset_aggregator;
pub mod erc20_enrichment;
pub mod nft_loader;
pub mod nft_metadata;
pub mod state;
pub mod sync_poller;

#[cfg(test)]
pub(crate) mod testing;

// Re-export for convenience
pub use asset_aggregator::{AssetAggregator, LoadOutcome};
pub use state::{ExplorerEvent, ExplorerView, ImageSlot, TokenValue};
pub use sync_poller::SyncStatusPoller;
