//! LCD Client Module - CosmWasm REST Integration
//!
//! Implements [`LedgerClient`] over the Cosmos LCD REST API:
//! 1. `/cosmwasm/wasm/v1/code/{id}/contracts` for registry pagination
//! 2. `/cosmwasm/wasm/v1/contract/{addr}` for instantiation height
//! 3. `/cosmwasm/wasm/v1/contract/{addr}/smart/{query}` for contract queries
//! 4. Exponential backoff retry with jitter on 429 / 5xx / transport errors
//! 5. Gzip compression and a fixed User-Agent

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING, USER_AGENT};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::models::config::DiscoveryConfig;
use crate::models::errors::{AppError, AppResult, ErrorCode};
use crate::models::types::{AddressPage, AddressPriority, RawCampaignState, TokenInfo};
use crate::providers::ledger::LedgerClient;
use crate::utils::constants::{
    CONTRACTS_BY_CODE_LIMIT, NAME_SERVICE_PAGE_LIMIT, USER_AGENT as USER_AGENT_CONST,
};

// ============================================
// RETRY CONSTANTS
// ============================================

/// Base retry delay in milliseconds
pub const LCD_BASE_RETRY_MS: u64 = 500;

/// Maximum retry delay in milliseconds
pub const LCD_MAX_RETRY_MS: u64 = 8000;

/// Maximum attempts per request (500ms→1s→2s→4s)
pub const LCD_MAX_RETRIES: u32 = 5;

/// Jitter percentage for retry delay
pub const RETRY_JITTER_PERCENT: u64 = 20;

#[derive(Debug, Deserialize)]
struct ContractsByCodeResponse {
    #[serde(default)]
    contracts: Vec<String>,
    pagination: Option<PageResponse>,
}

#[derive(Debug, Deserialize)]
struct PageResponse {
    next_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContractInfoResponse {
    contract_info: ContractInfo,
}

#[derive(Debug, Deserialize)]
struct ContractInfo {
    created: Option<AbsoluteTxPosition>,
}

#[derive(Debug, Deserialize)]
struct AbsoluteTxPosition {
    block_height: String,
}

#[derive(Debug, Deserialize)]
struct SmartQueryResponse<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct BalanceResponse {
    balance: String,
}

#[derive(Debug, Deserialize)]
struct ListMembersResponse {
    members: Vec<AddressPriority>,
}

#[derive(Debug, Deserialize)]
struct TokensResponse {
    tokens: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ResolveRecordResponse {
    address: Option<String>,
}

/// Outcome of one HTTP attempt
enum Attempt<T> {
    Done(T),
    Retry(AppError),
    Fail(AppError),
}

/// CosmWasm LCD client with retry logic
#[derive(Clone)]
pub struct LcdClient {
    base_url: String,
    client: reqwest::Client,
    deny_list_contract: Option<String>,
    featured_contract: Option<String>,
    name_service_contract: Option<String>,
}

impl LcdClient {
    /// Create a client from discovery configuration
    pub fn new(config: &DiscoveryConfig) -> AppResult<Self> {
        let client = Self::build_client(config.lcd_timeout)?;
        info!("🔗 LCD client for {}", config.lcd_url);

        Ok(Self {
            base_url: config.lcd_url.trim_end_matches('/').to_string(),
            client,
            deny_list_contract: config.deny_list_contract.clone(),
            featured_contract: config.featured_contract.clone(),
            name_service_contract: config.name_service_contract.clone(),
        })
    }

    /// Build HTTP client with custom headers (gzip enabled)
    fn build_client(timeout: Duration) -> AppResult<reqwest::Client> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_CONST));
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip"));

        reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .gzip(true)
            .build()
            .map_err(|e| {
                AppError::with_source(ErrorCode::ClientUnavailable, "Failed to build HTTP client", e)
            })
    }

    /// GET `path` with retry and decode the JSON body
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> AppResult<T> {
        let url = format!("{}{}", self.base_url, path);
        let mut last_error = None;

        for attempt in 0..LCD_MAX_RETRIES {
            if attempt > 0 {
                let delay = retry_delay(attempt);
                debug!("⏳ Retry {}/{} for {} after {}ms", attempt + 1, LCD_MAX_RETRIES, path, delay);
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }

            match self.execute::<T>(&url, query).await {
                Attempt::Done(value) => return Ok(value),
                Attempt::Fail(error) => return Err(error),
                Attempt::Retry(error) => {
                    warn!("⚠️ LCD request {} failed (attempt {}): {}", path, attempt + 1, error);
                    last_error = Some(error);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            AppError::remote_read("lcd", path, format!("failed after {} retries", LCD_MAX_RETRIES))
        }))
    }

    async fn execute<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> Attempt<T> {
        let response = match self.client.get(url).query(query).send().await {
            Ok(response) => response,
            Err(e) => return Attempt::Retry(AppError::from(e)),
        };

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            return Attempt::Retry(AppError::remote_read("lcd", url, format!("HTTP {}", status)));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Attempt::Fail(AppError::remote_read(
                "lcd",
                url,
                format!("HTTP {}: {}", status, body),
            ));
        }

        match response.json::<T>().await {
            Ok(value) => Attempt::Done(value),
            Err(e) => Attempt::Fail(AppError::with_source(
                ErrorCode::RemoteInvalidResponse,
                format!("Failed to decode response from {}", url),
                e,
            )),
        }
    }

    /// Run a CosmWasm smart query against `contract`
    async fn smart_query<T: DeserializeOwned>(
        &self,
        contract: &str,
        msg: serde_json::Value,
    ) -> AppResult<T> {
        let encoded = path_escape(&STANDARD.encode(msg.to_string()));
        let path = format!("/cosmwasm/wasm/v1/contract/{}/smart/{}", contract, encoded);
        let response: SmartQueryResponse<T> = self.get_json(&path, &[]).await?;
        Ok(response.data)
    }

    async fn list_members(&self, contract: &Option<String>) -> AppResult<Vec<AddressPriority>> {
        let Some(contract) = contract else {
            return Ok(Vec::new());
        };
        let response: ListMembersResponse = self
            .smart_query(contract, json!({ "list_members": {} }))
            .await?;
        Ok(response.members)
    }
}

/// Exponential backoff with ±jitter, never below 100ms
fn retry_delay(attempt: u32) -> u64 {
    let base_delay = LCD_BASE_RETRY_MS.saturating_mul(2_u64.pow(attempt.saturating_sub(1)));
    let capped_delay = base_delay.min(LCD_MAX_RETRY_MS);
    let jitter_range = (capped_delay * RETRY_JITTER_PERCENT) / 100;
    let jitter: i64 =
        rand::thread_rng().gen_range(-(jitter_range as i64)..=(jitter_range as i64));
    (capped_delay as i64 + jitter).max(100) as u64
}

/// Escape the base64 characters that are not path-safe
fn path_escape(encoded: &str) -> String {
    encoded
        .replace('+', "%2B")
        .replace('/', "%2F")
        .replace('=', "%3D")
}

#[async_trait::async_trait]
impl LedgerClient for LcdClient {
    async fn list_contracts_by_code(
        &self,
        code_id: u64,
        cursor: Option<&[u8]>,
    ) -> AppResult<AddressPage> {
        let mut query = vec![("pagination.limit", CONTRACTS_BY_CODE_LIMIT.to_string())];
        if let Some(cursor) = cursor.filter(|c| !c.is_empty()) {
            query.push(("pagination.key", STANDARD.encode(cursor)));
        }

        let path = format!("/cosmwasm/wasm/v1/code/{}/contracts", code_id);
        let response: ContractsByCodeResponse = self.get_json(&path, &query).await?;

        let next_key = match response.pagination.and_then(|p| p.next_key) {
            Some(key) if !key.is_empty() => Some(STANDARD.decode(&key).map_err(|e| {
                AppError::with_source(ErrorCode::RemoteInvalidResponse, "Invalid pagination key", e)
            })?),
            _ => None,
        };

        Ok(AddressPage {
            addresses: response.contracts,
            next_key,
        })
    }

    async fn contract_state(&self, address: &str) -> AppResult<RawCampaignState> {
        self.smart_query(address, json!({ "dump_state": {} })).await
    }

    async fn token_balance(&self, token_address: &str, owner: &str) -> AppResult<u128> {
        let response: BalanceResponse = self
            .smart_query(token_address, json!({ "balance": { "address": owner } }))
            .await?;
        response.balance.parse::<u128>().map_err(|_| {
            AppError::invalid_response(format!("Invalid balance for {}: {}", owner, response.balance))
        })
    }

    async fn token_info(&self, token_address: &str) -> AppResult<TokenInfo> {
        self.smart_query(token_address, json!({ "token_info": {} }))
            .await
    }

    async fn creation_height(&self, address: &str) -> AppResult<u64> {
        let path = format!("/cosmwasm/wasm/v1/contract/{}", address);
        let response: ContractInfoResponse = self.get_json(&path, &[]).await?;
        let created = response
            .contract_info
            .created
            .ok_or_else(|| AppError::invalid_response(format!("No creation info for {}", address)))?;
        created.block_height.parse::<u64>().map_err(|_| {
            AppError::invalid_response(format!("Invalid block height: {}", created.block_height))
        })
    }

    async fn deny_list_addresses(&self) -> AppResult<Vec<String>> {
        Ok(self
            .list_members(&self.deny_list_contract)
            .await?
            .into_iter()
            .map(|m| m.addr)
            .collect())
    }

    async fn featured_addresses(&self) -> AppResult<Vec<AddressPriority>> {
        self.list_members(&self.featured_contract).await
    }

    async fn name_service_names(&self) -> AppResult<Vec<String>> {
        let Some(contract) = &self.name_service_contract else {
            return Ok(Vec::new());
        };

        let mut names = Vec::new();
        loop {
            let mut msg = json!({ "all_tokens": { "limit": NAME_SERVICE_PAGE_LIMIT } });
            if let Some(last) = names.last() {
                msg["all_tokens"]["start_after"] = json!(last);
            }
            let response: TokensResponse = self.smart_query(contract, msg).await?;
            let done = response.tokens.len() < NAME_SERVICE_PAGE_LIMIT as usize;
            names.extend(response.tokens);
            if done {
                break;
            }
        }
        Ok(names)
    }

    async fn resolve_name(&self, name: &str) -> AppResult<Option<String>> {
        let Some(contract) = &self.name_service_contract else {
            return Ok(None);
        };
        let response: ResolveRecordResponse = self
            .smart_query(contract, json!({ "resolve_record": { "name": name } }))
            .await?;
        Ok(response.address.filter(|a| !a.is_empty()))
    }

    fn endpoint_name(&self) -> String {
        self.base_url.clone()
    }
}
