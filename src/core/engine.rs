//! Discovery Engine - public facade
//!
//! Owns the computation graph and exposes the read operations used by the
//! API and the CLI. All caching, sharing and invalidation happens in the
//! graph; the engine only maps calls onto nodes and cells.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::core::graph::{EvictionPolicy, GraphStats};
use crate::core::pager::{
    PageRequest, ALL_CAMPAIGNS, FAVORITE_CAMPAIGNS, FEATURED_CAMPAIGNS, FILTERED_CAMPAIGNS,
};
use crate::core::query::Visibility;
use crate::core::resolver::{
    CampaignKey, FETCH_CAMPAIGN, NAME_SERVICE_ADDRESS, TOKEN_INFO, WALLET_TOKEN_BALANCE,
};
use crate::core::state::{
    DiscoveryEnv, DiscoveryGraph, FAVORITE_ADDRESSES, LEDGER_CLIENT, LISTING_GENERATION,
    REFRESH_ID, WALLET_ADDRESS,
};
use crate::models::config::DiscoveryConfig;
use crate::models::errors::{AppError, AppResult};
use crate::models::types::{Campaign, CampaignPage, CampaignResponse, TokenInfo};
use crate::providers::ledger::{ClientHandle, LedgerClient};
use crate::utils::address::{is_contract_address, normalize_address, short_address};
use crate::utils::constants::CACHE_EVICTION_INTERVAL_SECS;

/// Campaign discovery engine
///
/// Cloning is cheap and every clone shares the same cache.
#[derive(Clone)]
pub struct DiscoveryEngine {
    graph: DiscoveryGraph,
}

impl DiscoveryEngine {
    /// Create an engine with no ledger client yet
    pub fn new(config: DiscoveryConfig) -> Self {
        info!(
            "🚀 Discovery engine: code groups {:?}, cutoff {}, page size {}",
            config.code_ids, config.addresses_halt_cutoff, config.page_size
        );
        Self {
            graph: DiscoveryGraph::new(DiscoveryEnv { config }),
        }
    }

    /// Create an engine already connected to `client`
    pub fn with_client(config: DiscoveryConfig, client: Arc<dyn LedgerClient>) -> Self {
        let engine = Self::new(config);
        engine.set_client(Some(client));
        engine
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.graph.env().config
    }

    /// Replace the ledger client. Everything read through the old client is
    /// recomputed on next access.
    pub fn set_client(&self, client: Option<Arc<dyn LedgerClient>>) {
        let handle = client.map(ClientHandle::new);
        match &handle {
            Some(h) => info!("🔗 Ledger client set: {}", h.endpoint_name()),
            None => warn!("⚠️ Ledger client cleared"),
        }
        self.graph.set(&LEDGER_CLIENT, &(), handle);
    }

    pub fn has_client(&self) -> bool {
        self.graph.get_cell(&LEDGER_CLIENT, &()).is_some()
    }

    // ============================================
    // Campaign reads
    // ============================================

    /// Resolve a single campaign. `full` adds the creation height lookup.
    pub async fn get_campaign(&self, address: &str, full: bool) -> CampaignResponse {
        let address = normalize_address(address);
        if address.is_empty() {
            return CampaignResponse::failed(AppError::invalid_address("Empty campaign address"));
        }
        if !is_contract_address(&address, &self.config().address_prefix) {
            return CampaignResponse::failed(AppError::invalid_address(format!(
                "Invalid campaign address: {}",
                address
            )));
        }

        self.graph
            .get(&FETCH_CAMPAIGN, CampaignKey { address, full })
            .await
            .unwrap_or_else(CampaignResponse::failed)
    }

    /// Filtered page with default visibility (hidden excluded)
    pub async fn get_page(&self, query: &str, page: usize, size: usize) -> AppResult<CampaignPage> {
        self.get_page_with(query, page, size, Visibility::default())
            .await
    }

    pub async fn get_page_with(
        &self,
        query: &str,
        page: usize,
        size: usize,
        visibility: Visibility,
    ) -> AppResult<CampaignPage> {
        let request = PageRequest {
            query: query.trim().to_string(),
            page,
            size,
            visibility,
        };
        self.graph.get(&FILTERED_CAMPAIGNS, request).await
    }

    pub async fn featured_campaigns(&self) -> AppResult<Vec<Campaign>> {
        Ok(self.graph.get(&FEATURED_CAMPAIGNS, ()).await?.to_vec())
    }

    pub async fn all_campaigns(&self) -> AppResult<Vec<Campaign>> {
        Ok(self.graph.get(&ALL_CAMPAIGNS, ()).await?.to_vec())
    }

    // ============================================
    // Favorites
    // ============================================

    pub fn set_favorites(&self, addresses: Vec<String>) {
        let addresses = addresses.iter().map(|a| normalize_address(a)).collect();
        self.graph.set(&FAVORITE_ADDRESSES, &(), addresses);
    }

    pub fn favorites(&self) -> Vec<String> {
        self.graph.get_cell(&FAVORITE_ADDRESSES, &())
    }

    pub async fn favorite_campaigns(&self) -> AppResult<Vec<Campaign>> {
        Ok(self.graph.get(&FAVORITE_CAMPAIGNS, ()).await?.to_vec())
    }

    // ============================================
    // Tokens & wallet
    // ============================================

    /// CW20 metadata for `token`
    pub async fn token_info(&self, token: &str) -> AppResult<TokenInfo> {
        self.graph.get(&TOKEN_INFO, normalize_address(token)).await
    }

    pub fn set_wallet_address(&self, address: Option<String>) {
        let address = address.map(|a| normalize_address(&a)).filter(|a| !a.is_empty());
        self.graph.set(&WALLET_ADDRESS, &(), address);
    }

    /// Connected wallet's balance of `token`; `None` without a wallet
    pub async fn wallet_token_balance(&self, token: &str) -> AppResult<Option<u128>> {
        self.graph
            .get(&WALLET_TOKEN_BALANCE, normalize_address(token))
            .await
    }

    // ============================================
    // Name service
    // ============================================

    /// Map user input to a campaign address: contract addresses pass
    /// through, anything else is looked up in the name service.
    pub async fn resolve_campaign_address(&self, input: &str) -> AppResult<String> {
        let input = normalize_address(input);
        if input.is_empty() {
            return Err(AppError::invalid_address("Empty campaign address"));
        }
        if is_contract_address(&input, &self.config().address_prefix) {
            return Ok(input);
        }

        self.graph
            .get(&NAME_SERVICE_ADDRESS, input.clone())
            .await?
            .ok_or_else(|| AppError::name_not_found(&input))
    }

    // ============================================
    // Refresh
    // ============================================

    /// Force re-fetch of everything keyed by `key` (a campaign or token
    /// address). Returns the new refresh id.
    pub fn bump_refresh(&self, key: &str) -> u64 {
        let key = normalize_address(key);
        let id = self.graph.update(&REFRESH_ID, &key, |id| id + 1);
        info!("🔄 Refresh {} (id {})", short_address(&key), id);
        id
    }

    /// Start a new listing generation: registry pages, deny list, featured
    /// list and name service are read again on next access
    pub fn refresh_listings(&self) -> u64 {
        let generation = self.graph.update(&LISTING_GENERATION, &(), |g| g + 1);
        info!("🔄 Listing generation {}", generation);
        generation
    }

    pub fn stats(&self) -> GraphStats {
        self.graph.stats()
    }

    // ============================================
    // Cache eviction
    // ============================================

    /// Drop cached results nothing reads any more: idle past
    /// `cache_max_idle`, or least recently read beyond `max_cached_nodes`.
    /// Returns the number of nodes evicted.
    pub fn evict_idle(&self) -> usize {
        let config = self.config();
        self.graph.evict(EvictionPolicy {
            max_idle: config.cache_max_idle,
            max_nodes: config.max_cached_nodes,
        })
    }

    /// Periodically evict idle cached results on the current runtime
    pub fn start_eviction_task(&self) {
        let engine = self.clone();
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(Duration::from_secs(CACHE_EVICTION_INTERVAL_SECS));
            loop {
                interval.tick().await;
                let evicted = engine.evict_idle();
                if evicted > 0 {
                    debug!("🧹 Cache eviction: {} idle nodes dropped", evicted);
                }
            }
        });
    }
}
