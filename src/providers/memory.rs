//! In-memory ledger
//!
//! Deterministic `LedgerClient` backed by maps, with per-method call counters
//! and failure injection. Used by tests and offline demos.

use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};

use crate::models::errors::{AppError, AppResult};
use crate::models::types::{
    AddressPage, AddressPriority, CampaignStatus, FundToken, RawCampaignInfo, RawCampaignState,
    RawStatus, StatusDetails, TokenInfo,
};
use crate::providers::ledger::LedgerClient;

pub const SAMPLE_GOV_TOKEN: &str = "juno1govtoken";
pub const SAMPLE_DAO: &str = "juno1dao";
pub const SAMPLE_FUNDING_DENOM: &str = "ujuno";

/// Build a well-formed escrow state for tests and demos
pub fn sample_campaign_state(name: &str, description: &str, status: CampaignStatus) -> RawCampaignState {
    let details = StatusDetails {
        initial_gov_token_balance: Some("1000000".to_string()),
        token_price: Some("0.5".to_string()),
    };
    let status = match status {
        CampaignStatus::Pending => RawStatus::Pending(StatusDetails::default()),
        CampaignStatus::Open => RawStatus::Open(details),
        CampaignStatus::Funded => RawStatus::Funded(details),
        CampaignStatus::Cancelled => RawStatus::Cancelled(StatusDetails::default()),
    };

    RawCampaignState {
        campaign_info: RawCampaignInfo {
            name: name.to_string(),
            description: description.to_string(),
            hidden: false,
            image_url: None,
            profile_image_url: None,
            description_image_urls: None,
            website: None,
            twitter: None,
            discord: None,
        },
        creator: "juno1creator".to_string(),
        dao_addr: SAMPLE_DAO.to_string(),
        fee_manager_addr: None,
        funding_goal: FundToken {
            is_token: false,
            addr: SAMPLE_FUNDING_DENOM.to_string(),
            amount: "1000000000".to_string(),
        },
        funding_token_addr: SAMPLE_FUNDING_DENOM.to_string(),
        funding_token_info: TokenInfo {
            name: "Juno".to_string(),
            symbol: "JUNO".to_string(),
            decimals: 6,
            total_supply: "0".to_string(),
        },
        funds_raised: FundToken {
            is_token: false,
            addr: SAMPLE_FUNDING_DENOM.to_string(),
            amount: "250000000".to_string(),
        },
        gov_token_addr: SAMPLE_GOV_TOKEN.to_string(),
        gov_token_info: Some(TokenInfo {
            name: "Gov".to_string(),
            symbol: "GOV".to_string(),
            decimals: 6,
            total_supply: "2000000".to_string(),
        }),
        status,
        version: Some("0.3.0".to_string()),
    }
}

/// Map-backed ledger
pub struct InMemoryLedger {
    page_size: usize,
    groups: DashMap<u64, Vec<String>>,
    states: DashMap<String, RawCampaignState>,
    balances: DashMap<(String, String), u128>,
    token_infos: DashMap<String, TokenInfo>,
    heights: DashMap<String, u64>,
    deny_list: RwLock<Vec<String>>,
    featured: RwLock<Vec<AddressPriority>>,
    names: RwLock<Vec<(String, String)>>,
    failing: DashMap<String, ()>,
    deny_list_down: AtomicBool,
    calls: DashMap<&'static str, usize>,
}

impl InMemoryLedger {
    /// `page_size` is the number of addresses per `list_contracts_by_code` page
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            groups: DashMap::new(),
            states: DashMap::new(),
            balances: DashMap::new(),
            token_infos: DashMap::new(),
            heights: DashMap::new(),
            deny_list: RwLock::new(Vec::new()),
            featured: RwLock::new(Vec::new()),
            names: RwLock::new(Vec::new()),
            failing: DashMap::new(),
            deny_list_down: AtomicBool::new(false),
            calls: DashMap::new(),
        }
    }

    /// Register a campaign under `code_id` (appended in order)
    pub fn add_campaign(&self, code_id: u64, address: &str, state: RawCampaignState) {
        self.groups
            .entry(code_id)
            .or_default()
            .push(address.to_string());
        self.states.insert(address.to_string(), state);
    }

    /// Register a code group with no campaigns yet
    pub fn add_group(&self, code_id: u64) {
        self.groups.entry(code_id).or_default();
    }

    pub fn set_state(&self, address: &str, state: RawCampaignState) {
        self.states.insert(address.to_string(), state);
    }

    pub fn set_balance(&self, token_address: &str, owner: &str, amount: u128) {
        self.balances
            .insert((token_address.to_string(), owner.to_string()), amount);
    }

    pub fn set_token_info(&self, token_address: &str, info: TokenInfo) {
        self.token_infos.insert(token_address.to_string(), info);
    }

    pub fn set_creation_height(&self, address: &str, height: u64) {
        self.heights.insert(address.to_string(), height);
    }

    pub fn set_deny_list(&self, addresses: &[&str]) {
        *self.deny_list.write().unwrap_or_else(PoisonError::into_inner) =
            addresses.iter().map(|a| a.to_string()).collect();
    }

    pub fn set_featured(&self, members: Vec<AddressPriority>) {
        *self.featured.write().unwrap_or_else(PoisonError::into_inner) = members;
    }

    pub fn register_name(&self, name: &str, address: &str) {
        self.names
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((name.to_string(), address.to_string()));
    }

    /// Make every read touching `key` fail (a contract address, a token
    /// address, or `code:<id>` for a registry group)
    pub fn fail(&self, key: &str) {
        self.failing.insert(key.to_string(), ());
    }

    pub fn recover(&self, key: &str) {
        self.failing.remove(key);
    }

    pub fn set_deny_list_down(&self, down: bool) {
        self.deny_list_down.store(down, Ordering::SeqCst);
    }

    /// Number of calls made to `method`
    pub fn calls(&self, method: &str) -> usize {
        self.calls.get(method).map(|c| *c).unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.iter().map(|c| *c.value()).sum()
    }

    fn record(&self, method: &'static str) {
        *self.calls.entry(method).or_insert(0) += 1;
    }

    fn check(&self, source: &str, key: &str) -> AppResult<()> {
        if self.failing.contains_key(key) {
            return Err(AppError::remote_read(source, key, "injected failure"));
        }
        Ok(())
    }
}

fn decode_offset(cursor: Option<&[u8]>) -> usize {
    match cursor {
        Some(bytes) if bytes.len() == 8 => {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(bytes);
            u64::from_be_bytes(buf) as usize
        }
        _ => 0,
    }
}

#[async_trait::async_trait]
impl LedgerClient for InMemoryLedger {
    async fn list_contracts_by_code(
        &self,
        code_id: u64,
        cursor: Option<&[u8]>,
    ) -> AppResult<AddressPage> {
        self.record("list_contracts_by_code");
        self.check("listContractsByCode", &format!("code:{}", code_id))?;

        let addresses = self
            .groups
            .get(&code_id)
            .map(|g| g.value().clone())
            .unwrap_or_default();
        let start = decode_offset(cursor).min(addresses.len());
        let end = (start + self.page_size).min(addresses.len());
        let next_key = (end < addresses.len()).then(|| (end as u64).to_be_bytes().to_vec());

        Ok(AddressPage {
            addresses: addresses[start..end].to_vec(),
            next_key,
        })
    }

    async fn contract_state(&self, address: &str) -> AppResult<RawCampaignState> {
        self.record("contract_state");
        self.check("contractState", address)?;
        self.states
            .get(address)
            .map(|s| s.value().clone())
            .ok_or_else(|| AppError::remote_read("contractState", address, "contract not found"))
    }

    async fn token_balance(&self, token_address: &str, owner: &str) -> AppResult<u128> {
        self.record("token_balance");
        self.check("tokenBalance", token_address)?;
        self.check("tokenBalance", owner)?;
        Ok(self
            .balances
            .get(&(token_address.to_string(), owner.to_string()))
            .map(|b| *b)
            .unwrap_or(0))
    }

    async fn token_info(&self, token_address: &str) -> AppResult<TokenInfo> {
        self.record("token_info");
        self.check("tokenInfo", token_address)?;
        self.token_infos
            .get(token_address)
            .map(|t| t.value().clone())
            .ok_or_else(|| AppError::remote_read("tokenInfo", token_address, "token not found"))
    }

    async fn creation_height(&self, address: &str) -> AppResult<u64> {
        self.record("creation_height");
        self.check("creationHeight", address)?;
        self.heights
            .get(address)
            .map(|h| *h)
            .ok_or_else(|| AppError::remote_read("creationHeight", address, "unknown contract"))
    }

    async fn deny_list_addresses(&self) -> AppResult<Vec<String>> {
        self.record("deny_list_addresses");
        if self.deny_list_down.load(Ordering::SeqCst) {
            return Err(AppError::remote_read("denyList", "registry", "injected failure"));
        }
        Ok(self
            .deny_list
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    async fn featured_addresses(&self) -> AppResult<Vec<AddressPriority>> {
        self.record("featured_addresses");
        Ok(self
            .featured
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    async fn name_service_names(&self) -> AppResult<Vec<String>> {
        self.record("name_service_names");
        Ok(self
            .names
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(name, _)| name.clone())
            .collect())
    }

    async fn resolve_name(&self, name: &str) -> AppResult<Option<String>> {
        self.record("resolve_name");
        Ok(self
            .names
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|(label, _)| label == name)
            .map(|(_, address)| address.clone()))
    }

    fn endpoint_name(&self) -> String {
        "in-memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pagination_cursor_walks_group() {
        let ledger = InMemoryLedger::new(2);
        for i in 0..5 {
            let state = sample_campaign_state("c", "d", CampaignStatus::Open);
            ledger.add_campaign(1, &format!("addr{}", i), state);
        }

        let first = ledger.list_contracts_by_code(1, None).await.unwrap();
        assert_eq!(first.addresses, vec!["addr0", "addr1"]);
        let second = ledger
            .list_contracts_by_code(1, first.next_key.as_deref())
            .await
            .unwrap();
        assert_eq!(second.addresses, vec!["addr2", "addr3"]);
        let last = ledger
            .list_contracts_by_code(1, second.next_key.as_deref())
            .await
            .unwrap();
        assert_eq!(last.addresses, vec!["addr4"]);
        assert!(last.is_last());
        assert_eq!(ledger.calls("list_contracts_by_code"), 3);
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let ledger = InMemoryLedger::new(10);
        ledger.add_campaign(1, "x", sample_campaign_state("c", "d", CampaignStatus::Open));
        ledger.fail("x");
        assert!(ledger.contract_state("x").await.is_err());
        ledger.recover("x");
        assert!(ledger.contract_state("x").await.is_ok());
    }

    #[tokio::test]
    async fn test_fixture_setup_survives_poisoned_lock() {
        let ledger = InMemoryLedger::new(10);
        let poisoned = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = ledger.deny_list.write().unwrap();
            panic!("writer died holding the lock");
        }));
        assert!(poisoned.is_err());
        assert!(ledger.deny_list.is_poisoned());

        ledger.set_deny_list(&["juno1denied"]);
        assert_eq!(ledger.deny_list_addresses().await.unwrap(), vec!["juno1denied"]);

        ledger.register_name("rocket", "juno1rocket");
        assert_eq!(
            ledger.resolve_name("rocket").await.unwrap().as_deref(),
            Some("juno1rocket")
        );
    }
}
