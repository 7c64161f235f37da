//! API Request Handlers

use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use super::types::*;
use crate::core::{DiscoveryEngine, Visibility};
use crate::models::errors::AppError;
use crate::utils::constants::{APP_VERSION, MAX_API_PAGE_SIZE, MIN_PAGE};

/// Shared application state
pub struct AppState {
    pub engine: DiscoveryEngine,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(engine: DiscoveryEngine) -> Self {
        Self {
            engine,
            start_time: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, (StatusCode, Json<ApiResponse<()>>)>;

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

fn error_response(err: &AppError, start: Instant) -> (StatusCode, Json<ApiResponse<()>>) {
    let status =
        StatusCode::from_u16(err.code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(ApiResponse::error(ApiError::from(err), elapsed_ms(start))),
    )
}

// ============================================
// Health Check
// ============================================

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<ApiResponse<HealthData>> {
    let start = Instant::now();

    let data = HealthData {
        status: if state.engine.has_client() {
            "healthy"
        } else {
            "degraded"
        }
        .to_string(),
        version: APP_VERSION.to_string(),
        uptime_seconds: state.uptime_seconds(),
    };

    Json(ApiResponse::success(data, elapsed_ms(start)))
}

// ============================================
// Campaigns
// ============================================

/// `GET /v1/campaigns?q=&page=&size=`
pub async fn list_campaigns(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageParams>,
) -> ApiResult<CampaignPageData> {
    let start = Instant::now();

    let page = params.page.unwrap_or(MIN_PAGE).max(MIN_PAGE);
    let size = params.size.unwrap_or(state.engine.config().page_size);
    if size > MAX_API_PAGE_SIZE {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(
                ApiError::bad_request(format!("Page size must be at most {}", MAX_API_PAGE_SIZE)),
                elapsed_ms(start),
            )),
        ));
    }

    let defaults = Visibility::default();
    let visibility = Visibility {
        include_hidden: params.include_hidden.unwrap_or(defaults.include_hidden),
        include_pending: params.include_pending.unwrap_or(defaults.include_pending),
    };

    let result = state
        .engine
        .get_page_with(&params.q, page, size, visibility)
        .await
        .map_err(|e| {
            warn!("⚠️ Listing failed for \"{}\": {}", params.q, e);
            error_response(&e, start)
        })?;

    let data = CampaignPageData {
        query: params.q.trim().to_string(),
        page,
        size,
        has_more: result.has_more,
        campaigns: result.campaigns.into_iter().map(CampaignData::from).collect(),
    };
    Ok(Json(ApiResponse::success(data, elapsed_ms(start))))
}

/// `GET /v1/campaigns/featured`
pub async fn featured_campaigns(State(state): State<Arc<AppState>>) -> ApiResult<CampaignListData> {
    let start = Instant::now();

    let campaigns = state
        .engine
        .featured_campaigns()
        .await
        .map_err(|e| error_response(&e, start))?;

    let data = CampaignListData {
        total: campaigns.len(),
        campaigns: campaigns.into_iter().map(CampaignData::from).collect(),
    };
    Ok(Json(ApiResponse::success(data, elapsed_ms(start))))
}

/// `GET /v1/campaigns/:address?full=true`; accepts a name-service label too
pub async fn get_campaign(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
    Query(params): Query<CampaignParams>,
) -> ApiResult<CampaignData> {
    let start = Instant::now();

    let address = state
        .engine
        .resolve_campaign_address(&address)
        .await
        .map_err(|e| error_response(&e, start))?;

    let response = state.engine.get_campaign(&address, params.full).await;
    match (response.campaign, response.error) {
        (Some(campaign), _) => Ok(Json(ApiResponse::success(
            CampaignData::from(campaign),
            elapsed_ms(start),
        ))),
        (None, error) => {
            let error = error.unwrap_or_else(AppError::normalization_failed);
            Err(error_response(&error, start))
        }
    }
}

// ============================================
// Tokens
// ============================================

/// `GET /v1/tokens/:address`
pub async fn get_token(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> ApiResult<TokenData> {
    let start = Instant::now();

    let info = state
        .engine
        .token_info(&address)
        .await
        .map_err(|e| error_response(&e, start))?;

    Ok(Json(ApiResponse::success(
        TokenData { address, info },
        elapsed_ms(start),
    )))
}

// ============================================
// Refresh
// ============================================

/// `POST /v1/refresh`: re-crawl registries and shared lists
pub async fn refresh_listings(State(state): State<Arc<AppState>>) -> Json<ApiResponse<RefreshData>> {
    let start = Instant::now();
    let generation = state.engine.refresh_listings();

    Json(ApiResponse::success(
        RefreshData {
            key: None,
            generation,
        },
        elapsed_ms(start),
    ))
}

/// `POST /v1/refresh/:key`: re-fetch one campaign or token
pub async fn refresh_key(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> ApiResult<RefreshData> {
    let start = Instant::now();
    if key.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(
                ApiError::bad_request("Refresh key must not be empty"),
                elapsed_ms(start),
            )),
        ));
    }

    let generation = state.engine.bump_refresh(&key);
    Ok(Json(ApiResponse::success(
        RefreshData {
            key: Some(key),
            generation,
        },
        elapsed_ms(start),
    )))
}

// ============================================
// Stats
// ============================================

pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<ApiResponse<StatsData>> {
    let start = Instant::now();
    let graph = state.engine.stats();

    info!(
        "📊 Graph Stats: {} nodes, {} cells, {} evaluations, {} invalidations (generation {})",
        graph.nodes, graph.cells, graph.evaluations, graph.invalidations, graph.generation
    );

    let data = StatsData {
        graph,
        has_client: state.engine.has_client(),
        uptime_seconds: state.uptime_seconds(),
        api_version: APP_VERSION.to_string(),
    };
    Json(ApiResponse::success(data, elapsed_ms(start)))
}
