use serde::{Deserialize, Serialize};

// ==================== SYNC STATUS ====================
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SyncInfo {
    pub block_count: u64,
    pub current_block_number: u64,
    pub last_block_number: u64,
    /// Indexer progress in `0.0..=1.0`.
    pub percent: f64,
}

impl SyncInfo {
    /// Whole-number progress for a progress bar.
    pub fn progress_percent(&self) -> u8 {
        if !self.percent.is_finite() || self.percent <= 0.0 {
            return 0;
        }
        (self.percent * 100.0).floor().min(100.0) as u8
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct BlockchainInfoResponse {
    pub block_count: u64,
    #[serde(default)]
    pub percent: f64,
    pub sync_info: SyncProgress,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SyncProgress {
    pub current_block_number: u64,
    pub last_block_number: u64,
}

impl From<BlockchainInfoResponse> for SyncInfo {
    fn from(raw: BlockchainInfoResponse) -> Self {
        SyncInfo {
            block_count: raw.block_count,
            current_block_number: raw.sync_info.current_block_number,
            last_block_number: raw.sync_info.last_block_number,
            percent: raw.percent,
        }
    }
}
