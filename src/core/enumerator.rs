//! Address Enumerator
//!
//! Produces the ordered sequence of discoverable campaign addresses:
//! 1. Code groups are crawled strictly in configured order, never interleaved
//! 2. Within a group, addresses keep the ledger's pagination order
//! 3. Denied addresses are dropped as pages arrive
//! 4. The result is capped at `addresses_halt_cutoff` before windowing
//!
//! Each registry page is its own cached node, so repeated crawls within one
//! generation cost nothing. The crawl loop itself is a plain state machine.

use futures_util::FutureExt;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::core::graph::NodeFamily;
use crate::core::state::{
    require_client, DiscoveryCtx, DiscoveryEnv, NodeFuture, LEDGER_CLIENT, LISTING_GENERATION,
};
use crate::models::errors::AppError;
use crate::models::types::{AddressPage, PageWindow};

/// Registry page identity: code group plus hex-encoded continuation cursor
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CodePageKey {
    pub code_id: u64,
    pub cursor: Option<String>,
}

impl CodePageKey {
    pub fn new(code_id: u64, cursor: Option<&[u8]>) -> Self {
        Self {
            code_id,
            cursor: cursor.map(hex::encode),
        }
    }
}

/// One registry page; `None` when there is no client or the read failed
pub static CODE_CONTRACTS: NodeFamily<DiscoveryEnv, CodePageKey, Option<AddressPage>> =
    NodeFamily::new("codeContracts", code_contracts);

/// Addresses excluded from every listing
pub static CAMPAIGN_DENY_LIST: NodeFamily<DiscoveryEnv, (), Arc<HashSet<String>>> =
    NodeFamily::new("campaignDenyList", campaign_deny_list);

/// Deny-list filtered, cutoff-capped addresses; `None` means every address
pub static PAGED_ADDRESSES: NodeFamily<DiscoveryEnv, Option<PageWindow>, Arc<Vec<String>>> =
    NodeFamily::new("pagedEscrowContractAddresses", paged_addresses);

fn code_contracts(ctx: DiscoveryCtx, key: CodePageKey) -> NodeFuture<Option<AddressPage>> {
    async move {
        ctx.cell(&LISTING_GENERATION, &());
        let Some(client) = ctx.cell(&LEDGER_CLIENT, &()) else {
            warn!("⚠️ No ledger client, skipping code group {}", key.code_id);
            return Ok(None);
        };

        let cursor = match key.cursor.as_deref().map(hex::decode).transpose() {
            Ok(cursor) => cursor,
            Err(e) => {
                warn!("⚠️ Bad cursor for code group {}: {}", key.code_id, e);
                return Ok(None);
            }
        };

        match client.list_contracts_by_code(key.code_id, cursor.as_deref()).await {
            Ok(page) => {
                debug!(
                    "📄 Code group {}: {} addresses (last page: {})",
                    key.code_id,
                    page.addresses.len(),
                    page.is_last()
                );
                Ok(Some(page))
            }
            Err(e) => {
                warn!("⚠️ Abandoning code group {}: {}", key.code_id, e);
                Ok(None)
            }
        }
    }
    .boxed()
}

fn campaign_deny_list(ctx: DiscoveryCtx, _: ()) -> NodeFuture<Arc<HashSet<String>>> {
    async move {
        ctx.cell(&LISTING_GENERATION, &());
        let client = require_client(&ctx)?;

        let addresses = client.deny_list_addresses().await.map_err(|e| {
            warn!("⚠️ Deny list unavailable: {}", e);
            e
        })?;
        debug!("🚫 Deny list: {} addresses", addresses.len());
        Ok(Arc::new(addresses.into_iter().collect()))
    }
    .boxed()
}

fn paged_addresses(
    ctx: DiscoveryCtx,
    window: Option<PageWindow>,
) -> NodeFuture<Arc<Vec<String>>> {
    async move {
        let deny_list = ctx.read(&CAMPAIGN_DENY_LIST, ()).await?;
        let config = &ctx.env().config;

        let mut crawl = AddressCrawl::new(config.code_ids.clone());
        while !crawl.is_done(window) {
            let key = crawl.next_key().ok_or_else(|| {
                AppError::internal("Address crawl has no group left to visit")
            })?;
            let page = ctx.read(&CODE_CONTRACTS, key).await?;
            crawl.advance(page, &deny_list);
        }

        let mut addresses = crawl.into_addresses();
        if addresses.len() > config.addresses_halt_cutoff {
            info!(
                "✂️ Address universe capped at {} ({} found)",
                config.addresses_halt_cutoff,
                addresses.len()
            );
            addresses.truncate(config.addresses_halt_cutoff);
        }

        let addresses = match window {
            Some(window) => window.slice(&addresses).to_vec(),
            None => addresses,
        };
        Ok(Arc::new(addresses))
    }
    .boxed()
}

/// Restartable crawl over the code groups
#[derive(Debug, Clone)]
pub struct AddressCrawl {
    code_ids: Vec<u64>,
    group_index: usize,
    cursor: Option<Vec<u8>>,
    accumulated: Vec<String>,
}

impl AddressCrawl {
    pub fn new(code_ids: Vec<u64>) -> Self {
        Self {
            code_ids,
            group_index: 0,
            cursor: None,
            accumulated: Vec::new(),
        }
    }

    /// All groups visited, or enough addresses to cover `window` plus one
    pub fn is_done(&self, window: Option<PageWindow>) -> bool {
        if self.group_index >= self.code_ids.len() {
            return true;
        }
        window.map_or(false, |w| self.accumulated.len() > w.end_index)
    }

    /// Key of the next page to fetch
    pub fn next_key(&self) -> Option<CodePageKey> {
        let code_id = *self.code_ids.get(self.group_index)?;
        Some(CodePageKey::new(code_id, self.cursor.as_deref()))
    }

    /// Consume one fetched page. A missing page abandons the current group.
    pub fn advance(&mut self, page: Option<AddressPage>, deny_list: &HashSet<String>) {
        let Some(page) = page else {
            self.next_group();
            return;
        };

        let exhausted = page.is_last();
        self.accumulated.extend(
            page.addresses
                .into_iter()
                .filter(|address| !deny_list.contains(address)),
        );

        if exhausted {
            self.next_group();
        } else {
            self.cursor = page.next_key;
        }
    }

    fn next_group(&mut self) {
        self.group_index += 1;
        self.cursor = None;
    }

    pub fn into_addresses(self) -> Vec<String> {
        self.accumulated
    }
}
