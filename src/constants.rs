/// Application constants

// Backend
pub const DEFAULT_API_URL: &str = "http://localhost:8080/api_v1";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

// Units
pub const NATIVE_DECIMALS: u8 = 18;
pub const NATIVE_DISPLAY_DIGITS: usize = 8;
pub const TOKEN_DISPLAY_DIGITS: usize = 6;
pub const NATIVE_SYMBOL: &str = "ETH";

// Addresses
pub const ADDRESS_LENGTH: usize = 42;

// NFT
pub const DEFAULT_IPFS_GATEWAY: &str = "https://gateway.pinata.cloud/ipfs/";
pub const IPFS_SCHEME: &str = "ipfs://";
pub const DEFAULT_NFT_METADATA_CONCURRENCY: usize = 8;
pub const TOKEN_ID_DISPLAY_CHARS: usize = 16;

// Pagination (one value for slicing and page count)
pub const DEFAULT_TX_PAGE_SIZE: usize = 10;

// Background intervals
pub const SYNC_POLL_INTERVAL_SECS: u64 = 3;

// Persistence keys
pub const STORE_KEY_ADDRESS: &str = "address";
pub const STORE_KEY_LOCALE: &str = "locale";
pub const DEFAULT_STATE_FILE: &str = ".tokenscope/state.json";

// Event fan-out
pub const EVENT_CHANNEL_CAPACITY: usize = 256;
