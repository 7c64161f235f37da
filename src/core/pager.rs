//! Filter & Pager
//!
//! Turns a query string and a one-based `(page, size)` request into one page
//! of matching campaigns, resolving only as many addresses as needed to fill
//! the window plus a two-item look-ahead for `has_more`.
//!
//! Also hosts the unwindowed listings (featured, all, favorites).

use futures_util::FutureExt;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::core::enumerator::{CAMPAIGN_DENY_LIST, PAGED_ADDRESSES};
use crate::core::graph::NodeFamily;
use crate::core::query::{CampaignQuery, Visibility};
use crate::core::resolver::{CampaignKey, FEATURED_ADDRESSES, FETCH_CAMPAIGN};
use crate::core::state::{DiscoveryCtx, DiscoveryEnv, NodeFuture, FAVORITE_ADDRESSES};
use crate::models::errors::AppResult;
use crate::models::types::{Campaign, CampaignPage, CampaignResponse, PageWindow};
use crate::utils::constants::{MIN_PAGE, PAGE_LOOKAHEAD};

/// Parameters of one filtered page
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PageRequest {
    pub query: String,
    pub page: usize,
    pub size: usize,
    pub visibility: Visibility,
}

pub static FILTERED_CAMPAIGNS: NodeFamily<DiscoveryEnv, PageRequest, CampaignPage> =
    NodeFamily::new("filteredCampaigns", filtered_campaigns);

/// Featured campaigns, highest priority first
pub static FEATURED_CAMPAIGNS: NodeFamily<DiscoveryEnv, (), Arc<Vec<Campaign>>> =
    NodeFamily::new("featuredCampaigns", featured_campaigns);

/// Every discoverable campaign, no window
pub static ALL_CAMPAIGNS: NodeFamily<DiscoveryEnv, (), Arc<Vec<Campaign>>> =
    NodeFamily::new("allCampaigns", all_campaigns);

pub static FAVORITE_CAMPAIGNS: NodeFamily<DiscoveryEnv, (), Arc<Vec<Campaign>>> =
    NodeFamily::new("favoriteCampaigns", favorite_campaigns);

fn filtered_campaigns(ctx: DiscoveryCtx, request: PageRequest) -> NodeFuture<CampaignPage> {
    async move {
        // Guard against expanding forever on an empty window.
        if request.size == 0 {
            return Ok(CampaignPage {
                campaigns: Vec::new(),
                has_more: true,
            });
        }

        let window = PageWindow::new(request.page, request.size);
        let query = CampaignQuery::parse(&request.query);
        let mut matches = Vec::new();
        let mut address_page = MIN_PAGE;

        loop {
            let addresses = ctx
                .read(
                    &PAGED_ADDRESSES,
                    Some(PageWindow::new(address_page, request.size)),
                )
                .await?;
            // A full batch means more addresses may follow.
            let addresses_left = addresses.len() == request.size;

            let resolved = resolve_all(&ctx, &addresses).await;
            matches.extend(
                resolved
                    .into_iter()
                    .filter(|c| request.visibility.admits(c) && query.matches(c)),
            );
            address_page += 1;

            let wanted = window.end_index.saturating_add(PAGE_LOOKAHEAD);
            if matches.len() >= wanted || !addresses_left {
                break;
            }
        }

        let campaigns = window.slice(&matches).to_vec();
        let has_more = matches.len() > window.end_index;
        info!(
            "📋 Page {} of \"{}\": {} campaigns ({} scanned pages, more: {})",
            request.page.max(MIN_PAGE),
            request.query,
            campaigns.len(),
            address_page - MIN_PAGE,
            has_more
        );
        Ok(CampaignPage { campaigns, has_more })
    }
    .boxed()
}

fn featured_campaigns(ctx: DiscoveryCtx, _: ()) -> NodeFuture<Arc<Vec<Campaign>>> {
    async move {
        let featured = ctx.read(&FEATURED_ADDRESSES, ()).await?;
        let deny_list = ctx.read(&CAMPAIGN_DENY_LIST, ()).await?;

        let mut ranked: Vec<_> = featured
            .iter()
            .filter(|f| !deny_list.contains(&f.addr))
            .cloned()
            .collect();
        // Stable, so equal priorities keep registry order.
        ranked.sort_by(|a, b| b.priority.cmp(&a.priority));

        let addresses: Vec<String> = ranked.into_iter().map(|f| f.addr).collect();
        Ok(Arc::new(resolve_all(&ctx, &addresses).await))
    }
    .boxed()
}

fn all_campaigns(ctx: DiscoveryCtx, _: ()) -> NodeFuture<Arc<Vec<Campaign>>> {
    async move {
        let addresses = ctx.read(&PAGED_ADDRESSES, None).await?;
        Ok(Arc::new(resolve_all(&ctx, &addresses).await))
    }
    .boxed()
}

fn favorite_campaigns(ctx: DiscoveryCtx, _: ()) -> NodeFuture<Arc<Vec<Campaign>>> {
    async move {
        let addresses = ctx.cell(&FAVORITE_ADDRESSES, &());
        Ok(Arc::new(resolve_all(&ctx, &addresses).await))
    }
    .boxed()
}

/// Resolve `addresses` concurrently (list views skip the creation height) and
/// keep the ones that resolved, in input order
async fn resolve_all(ctx: &DiscoveryCtx, addresses: &[String]) -> Vec<Campaign> {
    let keys = addresses
        .iter()
        .map(|address| CampaignKey {
            address: address.clone(),
            full: false,
        })
        .collect();

    ctx.read_all(&FETCH_CAMPAIGN, keys)
        .await
        .into_iter()
        .zip(addresses)
        .filter_map(|(response, address)| keep_resolved(response, address))
        .collect()
}

fn keep_resolved(response: AppResult<CampaignResponse>, address: &str) -> Option<Campaign> {
    match response {
        Ok(CampaignResponse {
            campaign: Some(campaign),
            ..
        }) => Some(campaign),
        Ok(CampaignResponse { error, .. }) => {
            debug!(
                "🙈 Dropping {} from listing: {}",
                address,
                error.map(|e| e.to_string()).unwrap_or_default()
            );
            None
        }
        Err(e) => {
            warn!("⚠️ Resolution of {} failed: {}", address, e);
            None
        }
    }
}
