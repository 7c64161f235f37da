//! Campaign Resolver
//!
//! Resolves one address into a [`CampaignResponse`]. Every remote read is its
//! own cached node, so list views and detail views share sub-fetches.
//! Per-campaign failures are encoded in the response, never propagated.

use futures_util::future::join;
use futures_util::FutureExt;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::core::graph::NodeFamily;
use crate::core::normalizer::{normalize, NameMap};
use crate::core::state::{
    require_client, DiscoveryCtx, DiscoveryEnv, NodeFuture, LEDGER_CLIENT, LISTING_GENERATION,
    REFRESH_ID, WALLET_ADDRESS,
};
use crate::models::errors::AppError;
use crate::models::types::{AddressPriority, CampaignResponse, RawCampaignState, TokenInfo};
use crate::utils::address::short_address;

/// Parameters of a single campaign resolution
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CampaignKey {
    pub address: String,
    /// Include the creation height lookup (detail views only)
    pub full: bool,
}

/// Balance of `owner` in CW20 `token`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct BalanceKey {
    pub token: String,
    pub owner: String,
}

pub static CAMPAIGN_STATE: NodeFamily<DiscoveryEnv, String, RawCampaignState> =
    NodeFamily::new("campaignState", campaign_state);

pub static TOKEN_BALANCE: NodeFamily<DiscoveryEnv, BalanceKey, u128> =
    NodeFamily::new("tokenBalance", token_balance);

pub static TOKEN_INFO: NodeFamily<DiscoveryEnv, String, TokenInfo> =
    NodeFamily::new("cw20TokenInfo", token_info);

/// Creation height, `None` when it could not be read
pub static CREATION_HEIGHT: NodeFamily<DiscoveryEnv, String, Option<u64>> =
    NodeFamily::new("campaignCreationBlockHeight", creation_height);

pub static FEATURED_ADDRESSES: NodeFamily<DiscoveryEnv, (), Arc<Vec<AddressPriority>>> =
    NodeFamily::new("featuredCampaignAddressList", featured_addresses);

/// Name-service label -> contract address
pub static NAME_SERVICE_ADDRESS: NodeFamily<DiscoveryEnv, String, Option<String>> =
    NodeFamily::new("densCampaignAddress", name_service_address);

/// Campaign address -> name-service label
pub static NAME_SERVICE_MAP: NodeFamily<DiscoveryEnv, (), Arc<NameMap>> =
    NodeFamily::new("densAddressMap", name_service_map);

pub static FETCH_CAMPAIGN: NodeFamily<DiscoveryEnv, CampaignKey, CampaignResponse> =
    NodeFamily::new("fetchCampaign", fetch_campaign);

/// Connected wallet's balance of a token; `None` without a wallet
pub static WALLET_TOKEN_BALANCE: NodeFamily<DiscoveryEnv, String, Option<u128>> =
    NodeFamily::new("walletTokenBalance", wallet_token_balance);

fn campaign_state(ctx: DiscoveryCtx, address: String) -> NodeFuture<RawCampaignState> {
    async move {
        ctx.cell(&REFRESH_ID, &address);
        let client = require_client(&ctx)?;
        client.contract_state(&address).await
    }
    .boxed()
}

fn token_balance(ctx: DiscoveryCtx, key: BalanceKey) -> NodeFuture<u128> {
    async move {
        ctx.cell(&REFRESH_ID, &key.token);
        let client = require_client(&ctx)?;
        client.token_balance(&key.token, &key.owner).await
    }
    .boxed()
}

fn token_info(ctx: DiscoveryCtx, token: String) -> NodeFuture<TokenInfo> {
    async move {
        ctx.cell(&REFRESH_ID, &token);
        let client = require_client(&ctx)?;
        client.token_info(&token).await
    }
    .boxed()
}

fn creation_height(ctx: DiscoveryCtx, address: String) -> NodeFuture<Option<u64>> {
    async move {
        let Some(client) = ctx.cell(&LEDGER_CLIENT, &()) else {
            return Ok(None);
        };
        match client.creation_height(&address).await {
            Ok(height) => Ok(Some(height)),
            Err(e) => {
                warn!("⚠️ No creation height for {}: {}", short_address(&address), e);
                Ok(None)
            }
        }
    }
    .boxed()
}

fn featured_addresses(ctx: DiscoveryCtx, _: ()) -> NodeFuture<Arc<Vec<AddressPriority>>> {
    async move {
        ctx.cell(&LISTING_GENERATION, &());
        let client = require_client(&ctx)?;
        Ok(Arc::new(client.featured_addresses().await?))
    }
    .boxed()
}

fn name_service_address(ctx: DiscoveryCtx, name: String) -> NodeFuture<Option<String>> {
    async move {
        ctx.cell(&LISTING_GENERATION, &());
        let Some(client) = ctx.cell(&LEDGER_CLIENT, &()) else {
            return Ok(None);
        };
        client.resolve_name(&name).await
    }
    .boxed()
}

fn name_service_map(ctx: DiscoveryCtx, _: ()) -> NodeFuture<Arc<NameMap>> {
    async move {
        ctx.cell(&LISTING_GENERATION, &());
        let Some(client) = ctx.cell(&LEDGER_CLIENT, &()) else {
            return Ok(Arc::new(NameMap::new()));
        };

        let names = client.name_service_names().await?;
        let addresses = ctx.read_all(&NAME_SERVICE_ADDRESS, names.clone()).await;

        let mut map = NameMap::new();
        for (name, address) in names.into_iter().zip(addresses) {
            match address {
                Ok(Some(address)) => {
                    map.entry(address).or_insert(name);
                }
                Ok(None) => {}
                Err(e) => warn!("⚠️ Could not resolve name {}: {}", name, e),
            }
        }
        debug!("🏷️ Name service map: {} entries", map.len());
        Ok(Arc::new(map))
    }
    .boxed()
}

fn fetch_campaign(ctx: DiscoveryCtx, key: CampaignKey) -> NodeFuture<CampaignResponse> {
    async move { Ok(resolve(&ctx, &key).await.unwrap_or_else(CampaignResponse::failed)) }.boxed()
}

async fn resolve(ctx: &DiscoveryCtx, key: &CampaignKey) -> Result<CampaignResponse, AppError> {
    let address = &key.address;
    let state = ctx.read(&CAMPAIGN_STATE, address.clone()).await?;

    let (campaign_balance, dao_balance) = join(
        ctx.read(
            &TOKEN_BALANCE,
            BalanceKey {
                token: state.gov_token_addr.clone(),
                owner: address.clone(),
            },
        ),
        ctx.read(
            &TOKEN_BALANCE,
            BalanceKey {
                token: state.gov_token_addr.clone(),
                owner: state.dao_addr.clone(),
            },
        ),
    )
    .await;
    let (campaign_balance, dao_balance) = (campaign_balance?, dao_balance?);

    let created_at_height = if key.full {
        ctx.read(&CREATION_HEIGHT, address.clone()).await?
    } else {
        None
    };

    let featured = ctx.read(&FEATURED_ADDRESSES, ()).await.unwrap_or_else(|e| {
        warn!("⚠️ Featured list unavailable: {}", e);
        Arc::new(Vec::new())
    });
    let name_map = ctx.read(&NAME_SERVICE_MAP, ()).await.unwrap_or_else(|e| {
        warn!("⚠️ Name service unavailable: {}", e);
        Arc::new(NameMap::new())
    });

    match normalize(
        address,
        created_at_height,
        &state,
        campaign_balance,
        dao_balance,
        &featured,
        &name_map,
    ) {
        Some(campaign) => {
            debug!("✅ Resolved campaign {} ({})", short_address(address), campaign.name);
            Ok(CampaignResponse::found(campaign))
        }
        None => {
            error!("❌ Failed to normalize campaign {}", address);
            Ok(CampaignResponse::failed(AppError::normalization_failed()))
        }
    }
}

fn wallet_token_balance(ctx: DiscoveryCtx, token: String) -> NodeFuture<Option<u128>> {
    async move {
        let Some(owner) = ctx.cell(&WALLET_ADDRESS, &()) else {
            return Ok(None);
        };
        let balance = ctx.read(&TOKEN_BALANCE, BalanceKey { token, owner }).await?;
        Ok(Some(balance))
    }
    .boxed()
}
