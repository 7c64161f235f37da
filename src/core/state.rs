//! Engine state: environment and mutable cells
//!
//! Every node of the discovery graph reads its inputs from the cells declared
//! here. Writing a cell is the only way cached results go stale.

use futures_util::future::BoxFuture;

use crate::core::graph::{CellFamily, Ctx, Graph};
use crate::models::config::DiscoveryConfig;
use crate::models::errors::{AppError, AppResult};
use crate::providers::ledger::ClientHandle;

/// Static environment shared by every node evaluation
#[derive(Debug, Clone)]
pub struct DiscoveryEnv {
    pub config: DiscoveryConfig,
}

pub type DiscoveryGraph = Graph<DiscoveryEnv>;
pub type DiscoveryCtx = Ctx<DiscoveryEnv>;
pub type NodeFuture<T> = BoxFuture<'static, AppResult<T>>;

/// Current ledger connection; `None` until the host supplies one
pub static LEDGER_CLIENT: CellFamily<(), Option<ClientHandle>> =
    CellFamily::new("ledgerClient", |_| None);

/// Per-key refresh counter. Bumping it re-fetches everything keyed by that
/// address or token.
pub static REFRESH_ID: CellFamily<String, u64> = CellFamily::new("refreshId", |_| 0);

/// Bumped to re-crawl registries and shared lists (code pages, deny list,
/// featured list, name service)
pub static LISTING_GENERATION: CellFamily<(), u64> = CellFamily::new("listingGeneration", |_| 0);

/// Campaign addresses the user marked as favorite
pub static FAVORITE_ADDRESSES: CellFamily<(), Vec<String>> =
    CellFamily::new("favoriteCampaignAddresses", |_| Vec::new());

/// Connected wallet address
pub static WALLET_ADDRESS: CellFamily<(), Option<String>> =
    CellFamily::new("walletAddress", |_| None);

/// Read the ledger client, failing with `CLIENT_UNAVAILABLE` when absent
pub fn require_client(ctx: &DiscoveryCtx) -> AppResult<ClientHandle> {
    ctx.cell(&LEDGER_CLIENT, &()).ok_or_else(AppError::client_unavailable)
}
