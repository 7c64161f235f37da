//! Constants Module - Single Source of Truth
//!
//! All defaults used by the discovery engine, the LCD client and the API are
//! defined here. Other modules must not hardcode these values.

// ============================================
// APPLICATION CONSTANTS
// ============================================

/// Application name
pub const APP_NAME: &str = "CampaignDiscovery";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// User-Agent for LCD requests
pub const USER_AGENT: &str = "CampaignDiscovery/0.1.0";

// ============================================
// LEDGER CONSTANTS
// ============================================

/// Default LCD endpoint
pub const DEFAULT_LCD_URL: &str = "https://lcd-juno.itastakers.com";

/// Default bech32 prefix for contract addresses
pub const DEFAULT_ADDRESS_PREFIX: &str = "juno";

/// Escrow contract code IDs, oldest first. Groups are crawled in this order.
pub const DEFAULT_ESCROW_CODE_IDS: [u64; 3] = [1, 2, 3];

/// Default timeout for LCD requests (seconds)
pub const DEFAULT_LCD_TIMEOUT_SECS: u64 = 10;

/// Length of the bech32 data part (payload + checksum) of a 32-byte contract address
pub const CONTRACT_ADDRESS_DATA_LEN: usize = 58;

/// Page size requested from the ledger when listing contracts by code
pub const CONTRACTS_BY_CODE_LIMIT: u32 = 100;

/// Page size requested from the name service when listing names
pub const NAME_SERVICE_PAGE_LIMIT: u32 = 30;

// Retry constants live in src/providers/lcd.rs

// ============================================
// DISCOVERY CONSTANTS
// ============================================

/// Hard cap on the number of discoverable addresses considered per listing
pub const DEFAULT_ADDRESSES_HALT_CUTOFF: usize = 1000;

/// Default number of campaigns per page
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// First page number (pages are one-based)
pub const MIN_PAGE: usize = 1;

/// Extra matches collected beyond the requested window: one to turn the end
/// index into a count, one to prove a following page exists.
pub const PAGE_LOOKAHEAD: usize = 2;

/// Cached graph nodes unread for this long are evicted
pub const DEFAULT_CACHE_MAX_IDLE_SECS: u64 = 600;

/// Upper bound on cached graph nodes before least recently read ones are evicted
pub const DEFAULT_MAX_CACHED_NODES: usize = 20_000;

/// How often the background task evicts idle nodes
pub const CACHE_EVICTION_INTERVAL_SECS: u64 = 60;

/// Error message surfaced when a campaign cannot be built from resolved inputs
pub const UNKNOWN_ERROR: &str = "Unknown error.";

// ============================================
// API CONSTANTS
// ============================================

/// Default API port
pub const DEFAULT_API_PORT: u16 = 8080;

/// Largest page size the API accepts
pub const MAX_API_PAGE_SIZE: usize = 100;
