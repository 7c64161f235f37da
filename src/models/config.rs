//! Configuration module for campaign discovery
//!
//! Static host configuration (code groups, cutoff, page size, registry
//! contracts). Defaults come from utils/constants.rs, overrides from env.

use std::time::Duration;
use tracing::{info, warn};

use crate::models::errors::{AppError, AppResult};
use crate::utils::constants::{
    DEFAULT_ADDRESSES_HALT_CUTOFF, DEFAULT_ADDRESS_PREFIX, DEFAULT_CACHE_MAX_IDLE_SECS,
    DEFAULT_ESCROW_CODE_IDS, DEFAULT_LCD_TIMEOUT_SECS, DEFAULT_LCD_URL, DEFAULT_MAX_CACHED_NODES,
    DEFAULT_PAGE_SIZE,
};

/// Configuration for the discovery engine and its ledger client
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryConfig {
    /// LCD REST endpoint of the ledger
    pub lcd_url: String,
    /// bech32 prefix of contract addresses
    pub address_prefix: String,
    /// Escrow contract code IDs, crawled strictly in this order
    pub code_ids: Vec<u64>,
    /// Hard cap on discoverable addresses per listing
    pub addresses_halt_cutoff: usize,
    /// Default page size for listings
    pub page_size: usize,
    /// Contract holding the deny list
    pub deny_list_contract: Option<String>,
    /// Contract holding the featured list
    pub featured_contract: Option<String>,
    /// Name-service contract used for vanity campaign names
    pub name_service_contract: Option<String>,
    /// Timeout for LCD calls
    pub lcd_timeout: Duration,
    /// Idle time after which unread cached results are evicted
    pub cache_max_idle: Duration,
    /// Cached results kept before least recently read ones are evicted
    pub max_cached_nodes: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            lcd_url: DEFAULT_LCD_URL.to_string(),
            address_prefix: DEFAULT_ADDRESS_PREFIX.to_string(),
            code_ids: DEFAULT_ESCROW_CODE_IDS.to_vec(),
            addresses_halt_cutoff: DEFAULT_ADDRESSES_HALT_CUTOFF,
            page_size: DEFAULT_PAGE_SIZE,
            deny_list_contract: None,
            featured_contract: None,
            name_service_contract: None,
            lcd_timeout: Duration::from_secs(DEFAULT_LCD_TIMEOUT_SECS),
            cache_max_idle: Duration::from_secs(DEFAULT_CACHE_MAX_IDLE_SECS),
            max_cached_nodes: DEFAULT_MAX_CACHED_NODES,
        }
    }
}

impl DiscoveryConfig {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> AppResult<Self> {
        let defaults = Self::default();

        let code_ids = match std::env::var("ESCROW_CODE_IDS") {
            Ok(raw) => parse_code_ids(&raw)?,
            Err(_) => defaults.code_ids,
        };

        let config = Self {
            lcd_url: std::env::var("LCD_URL").unwrap_or(defaults.lcd_url),
            address_prefix: std::env::var("ADDRESS_PREFIX").unwrap_or(defaults.address_prefix),
            code_ids,
            addresses_halt_cutoff: env_parse("ADDRESSES_HALT_CUTOFF")?
                .unwrap_or(defaults.addresses_halt_cutoff),
            page_size: env_parse("PAGE_SIZE")?.unwrap_or(defaults.page_size),
            deny_list_contract: env_opt("DENY_LIST_CONTRACT"),
            featured_contract: env_opt("FEATURED_CONTRACT"),
            name_service_contract: env_opt("NAME_SERVICE_CONTRACT"),
            lcd_timeout: env_parse("LCD_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.lcd_timeout),
            cache_max_idle: env_parse("CACHE_MAX_IDLE_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.cache_max_idle),
            max_cached_nodes: env_parse("MAX_CACHED_NODES")?.unwrap_or(defaults.max_cached_nodes),
        };

        if config.code_ids.is_empty() {
            warn!("⚠️ No escrow code IDs configured, listings will be empty");
        }
        info!(
            "⚙️ Discovery config: {} code groups, cutoff {}, page size {}",
            config.code_ids.len(),
            config.addresses_halt_cutoff,
            config.page_size
        );

        Ok(config)
    }
}

/// Parse a comma separated list of code IDs, e.g. `"1,4,7"`
pub fn parse_code_ids(raw: &str) -> AppResult<Vec<u64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u64>()
                .map_err(|_| AppError::invalid_config("ESCROW_CODE_IDS", s))
        })
        .collect()
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> AppResult<Option<T>> {
    match env_opt(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| AppError::invalid_config(key, &raw)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_code_ids() {
        assert_eq!(parse_code_ids("1, 4,7").unwrap(), vec![1, 4, 7]);
        assert_eq!(parse_code_ids("").unwrap(), Vec::<u64>::new());
        assert!(parse_code_ids("1,x").is_err());
    }

    #[test]
    fn test_defaults() {
        let config = DiscoveryConfig::default();
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.code_ids, DEFAULT_ESCROW_CODE_IDS.to_vec());
        assert!(config.deny_list_contract.is_none());
        assert_eq!(config.max_cached_nodes, DEFAULT_MAX_CACHED_NODES);
    }
}
