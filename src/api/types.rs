//! API Request/Response Types

use serde::{Deserialize, Serialize};

use crate::core::GraphStats;
use crate::models::errors::AppError;
use crate::models::types::{Campaign, CampaignStatus, TokenInfo};

/// API Response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
    pub latency_ms: f64,
    pub timestamp: i64,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T, latency_ms: f64) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            latency_ms,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

impl ApiResponse<()> {
    pub fn error(error: ApiError, latency_ms: f64) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            latency_ms,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// API Error
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            code: "API_BAD_REQUEST".to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn rate_limited(retry_after: u64) -> Self {
        Self {
            code: "API_RATE_LIMITED".to_string(),
            message: format!("Rate limit exceeded. Retry after {} seconds", retry_after),
            details: Some(format!("retry_after: {}", retry_after)),
        }
    }
}

impl From<&AppError> for ApiError {
    fn from(err: &AppError) -> Self {
        Self {
            code: err.code_str().to_string(),
            message: err.message.clone(),
            details: err.code.is_retryable().then(|| "retryable".to_string()),
        }
    }
}

// ============================================
// Campaign listings
// ============================================

/// `GET /v1/campaigns` query string
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    /// Filter string, e.g. `status:open rocket`
    #[serde(default)]
    pub q: String,
    pub page: Option<usize>,
    pub size: Option<usize>,
    pub include_hidden: Option<bool>,
    pub include_pending: Option<bool>,
}

/// `GET /v1/campaigns/:address` query string
#[derive(Debug, Default, Deserialize)]
pub struct CampaignParams {
    /// Include the creation height lookup
    #[serde(default)]
    pub full: bool,
}

#[derive(Debug, Serialize)]
pub struct CampaignPageData {
    pub query: String,
    pub page: usize,
    pub size: usize,
    pub has_more: bool,
    pub campaigns: Vec<CampaignData>,
}

#[derive(Debug, Serialize)]
pub struct CampaignListData {
    pub total: usize,
    pub campaigns: Vec<CampaignData>,
}

// ============================================
// Campaign view
// ============================================

/// Campaign as served over HTTP; token amounts are decimal strings
#[derive(Debug, Serialize)]
pub struct CampaignData {
    pub address: String,
    pub name: String,
    pub description: String,
    pub status: CampaignStatus,
    pub hidden: bool,
    pub featured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dens_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at_height: Option<u64>,
    pub creator: String,
    pub dao_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub goal: String,
    pub pledged: String,
    pub progress_percent: f64,
    pub funding_token: FundingTokenData,
    pub gov_token: GovTokenData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image_url: Option<String>,
    pub description_image_urls: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discord: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FundingTokenData {
    pub address: String,
    pub is_cw20: bool,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

#[derive(Debug, Serialize)]
pub struct GovTokenData {
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decimals: Option<u8>,
    pub campaign_balance: String,
    pub dao_balance: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_campaign_balance: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

impl From<Campaign> for CampaignData {
    fn from(campaign: Campaign) -> Self {
        let progress_percent = campaign.progress_percent();
        let gov = campaign.gov_token;
        Self {
            address: campaign.address,
            name: campaign.name,
            description: campaign.description,
            status: campaign.status,
            hidden: campaign.hidden,
            featured: campaign.featured,
            dens_name: campaign.dens_name,
            created_at_height: campaign.created_at_height,
            creator: campaign.creator,
            dao_address: campaign.dao_address,
            version: campaign.version,
            goal: campaign.goal.to_string(),
            pledged: campaign.pledged.to_string(),
            progress_percent,
            funding_token: FundingTokenData {
                address: campaign.funding_token.address,
                is_cw20: campaign.funding_token.is_cw20,
                name: campaign.funding_token.name,
                symbol: campaign.funding_token.symbol,
                decimals: campaign.funding_token.decimals,
            },
            gov_token: GovTokenData {
                address: gov.address,
                name: gov.name,
                symbol: gov.symbol,
                decimals: gov.decimals,
                campaign_balance: gov.campaign_balance.to_string(),
                dao_balance: gov.dao_balance.to_string(),
                initial_campaign_balance: gov.initial_campaign_balance.map(|b| b.to_string()),
                price: gov.price,
            },
            image_url: campaign.image_url,
            profile_image_url: campaign.profile_image_url,
            description_image_urls: campaign.description_image_urls,
            website: campaign.website,
            twitter: campaign.twitter,
            discord: campaign.discord,
        }
    }
}

/// `GET /v1/tokens/:address`
#[derive(Debug, Serialize)]
pub struct TokenData {
    pub address: String,
    #[serde(flatten)]
    pub info: TokenInfo,
}

// ============================================
// Refresh
// ============================================

#[derive(Debug, Serialize)]
pub struct RefreshData {
    /// Refreshed key, absent for a listing refresh
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// New refresh id or listing generation
    pub generation: u64,
}

// ============================================
// Stats
// ============================================

#[derive(Debug, Serialize)]
pub struct StatsData {
    pub graph: GraphStats,
    pub has_client: bool,
    pub uptime_seconds: u64,
    pub api_version: String,
}

// ============================================
// Health Check
// ============================================

#[derive(Debug, Serialize)]
pub struct HealthData {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}
