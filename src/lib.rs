//! Campaign Discovery Library
//!
//! Read-side discovery and aggregation engine for CosmWasm escrow campaigns:
//! - Crawls the contract registry per code group, deny-list filtered
//! - Resolves each address into a denormalized campaign view
//! - Filters and paginates with a look-ahead for `has_more`
//! - Caches every remote read in a dependency-tracked async graph

pub mod api;
pub mod core;
pub mod models;
pub mod providers;
pub mod utils;

pub use crate::core::{CampaignQuery, DiscoveryEngine, GraphStats, Visibility};
pub use models::{
    AppError, AppResult, Campaign, CampaignPage, CampaignResponse, CampaignStatus,
    DiscoveryConfig, ErrorCode,
};
pub use providers::{InMemoryLedger, LcdClient, LedgerClient};
