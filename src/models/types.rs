//! Type definitions for campaign discovery
//! Raw ledger payloads, derived campaign views and listing windows

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::errors::AppError;

// ============================================
// Campaign status
// ============================================

/// Lifecycle status derived from the raw contract state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    /// Awaiting DAO approval
    Pending,
    /// Accepting pledges
    Open,
    /// Goal reached, governance tokens released
    Funded,
    /// Closed without funding
    Cancelled,
}

impl CampaignStatus {
    pub const ALL: [CampaignStatus; 4] = [
        CampaignStatus::Pending,
        CampaignStatus::Open,
        CampaignStatus::Funded,
        CampaignStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Pending => "pending",
            CampaignStatus::Open => "open",
            CampaignStatus::Funded => "funded",
            CampaignStatus::Cancelled => "cancelled",
        }
    }

    /// Case-insensitive parse, as typed in filter strings
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim().to_lowercase();
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

// ============================================
// Raw ledger payloads
// ============================================

/// CW20 `token_info` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: String,
}

/// Amount of either a native denom or a CW20 token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundToken {
    pub is_token: bool,
    pub addr: String,
    pub amount: String,
}

/// Campaign metadata stored in the escrow contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCampaignInfo {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub profile_image_url: Option<String>,
    #[serde(default)]
    pub description_image_urls: Option<Vec<String>>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub twitter: Option<String>,
    #[serde(default)]
    pub discord: Option<String>,
}

/// Per-status payload; fields only exist on some contract versions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusDetails {
    #[serde(default)]
    pub initial_gov_token_balance: Option<String>,
    #[serde(default)]
    pub token_price: Option<String>,
}

/// Raw status tag, e.g. `{"open": {"initial_gov_token_balance": "1000"}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawStatus {
    Pending(StatusDetails),
    Open(StatusDetails),
    Funded(StatusDetails),
    Cancelled(StatusDetails),
}

impl RawStatus {
    pub fn status(&self) -> CampaignStatus {
        match self {
            RawStatus::Pending(_) => CampaignStatus::Pending,
            RawStatus::Open(_) => CampaignStatus::Open,
            RawStatus::Funded(_) => CampaignStatus::Funded,
            RawStatus::Cancelled(_) => CampaignStatus::Cancelled,
        }
    }

    pub fn details(&self) -> &StatusDetails {
        match self {
            RawStatus::Pending(d)
            | RawStatus::Open(d)
            | RawStatus::Funded(d)
            | RawStatus::Cancelled(d) => d,
        }
    }
}

/// Escrow contract `dump_state` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCampaignState {
    pub campaign_info: RawCampaignInfo,
    pub creator: String,
    pub dao_addr: String,
    #[serde(default)]
    pub fee_manager_addr: Option<String>,
    pub funding_goal: FundToken,
    pub funding_token_addr: String,
    pub funding_token_info: TokenInfo,
    pub funds_raised: FundToken,
    pub gov_token_addr: String,
    #[serde(default)]
    pub gov_token_info: Option<TokenInfo>,
    pub status: RawStatus,
    #[serde(default)]
    pub version: Option<String>,
}

/// Member of an address priority list (featured list, deny list)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressPriority {
    pub addr: String,
    pub priority: u32,
}

/// One page of contract addresses for a code group
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressPage {
    pub addresses: Vec<String>,
    /// Continuation cursor; `None` or empty means the group is exhausted
    pub next_key: Option<Vec<u8>>,
}

impl AddressPage {
    pub fn is_last(&self) -> bool {
        self.next_key.as_ref().map_or(true, |k| k.is_empty())
    }
}

// ============================================
// Derived campaign
// ============================================

/// Funding token of a campaign
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FundingToken {
    /// Native denom or CW20 contract address
    pub address: String,
    pub is_cw20: bool,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Governance token of the campaign's DAO with current balances
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GovToken {
    pub address: String,
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub decimals: Option<u8>,
    /// Tokens still held by the escrow contract
    pub campaign_balance: u128,
    /// Tokens held by the DAO treasury
    pub dao_balance: u128,
    pub initial_campaign_balance: Option<u128>,
    /// Price of one governance token in funding token units
    pub price: Option<f64>,
}

/// Fully resolved campaign view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Campaign {
    pub address: String,
    pub name: String,
    pub description: String,
    pub status: CampaignStatus,
    pub hidden: bool,
    pub featured: bool,
    /// Reverse name-service label
    pub dens_name: Option<String>,
    pub created_at_height: Option<u64>,
    pub creator: String,
    pub dao_address: String,
    pub version: Option<String>,

    pub goal: u128,
    pub pledged: u128,
    pub funding_token: FundingToken,
    pub gov_token: GovToken,

    pub image_url: Option<String>,
    pub profile_image_url: Option<String>,
    pub description_image_urls: Vec<String>,
    pub website: Option<String>,
    pub twitter: Option<String>,
    pub discord: Option<String>,
}

impl Campaign {
    /// Pledged fraction of the goal in percent
    pub fn progress_percent(&self) -> f64 {
        if self.goal == 0 {
            return 0.0;
        }
        self.pledged as f64 / self.goal as f64 * 100.0
    }
}

// ============================================
// Responses
// ============================================

/// Single campaign read: either a campaign or the reason it is missing
#[derive(Debug, Clone, PartialEq)]
pub struct CampaignResponse {
    pub campaign: Option<Campaign>,
    pub error: Option<AppError>,
}

impl CampaignResponse {
    pub fn found(campaign: Campaign) -> Self {
        Self {
            campaign: Some(campaign),
            error: None,
        }
    }

    pub fn failed(error: AppError) -> Self {
        Self {
            campaign: None,
            error: Some(error),
        }
    }
}

/// One page of campaigns
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CampaignPage {
    pub campaigns: Vec<Campaign>,
    pub has_more: bool,
}

// ============================================
// Listing windows
// ============================================

/// Half-open index window `[start_index, end_index)` for a one-based page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageWindow {
    pub start_index: usize,
    pub end_index: usize,
}

impl PageWindow {
    /// Page numbers start at 1; page 0 is treated as page 1.
    pub fn new(page: usize, size: usize) -> Self {
        let page = page.max(crate::utils::constants::MIN_PAGE);
        let start_index = (page - 1).saturating_mul(size);
        Self {
            start_index,
            end_index: start_index.saturating_add(size),
        }
    }

    pub fn len(&self) -> usize {
        self.end_index.saturating_sub(self.start_index)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Slice `items` by this window, clamped to its length
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let end = self.end_index.min(items.len());
        let start = self.start_index.min(end);
        &items[start..end]
    }
}
