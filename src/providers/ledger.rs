//! Ledger client abstraction
//!
//! Every remote read the discovery engine needs. Implementations decide how
//! the registries (deny list, featured list, name service) are located.

use std::fmt;
use std::sync::Arc;

use crate::models::errors::AppResult;
use crate::models::types::{AddressPage, AddressPriority, RawCampaignState, TokenInfo};

#[async_trait::async_trait]
pub trait LedgerClient: Send + Sync + 'static {
    /// One page of contract addresses instantiated from `code_id`
    async fn list_contracts_by_code(
        &self,
        code_id: u64,
        cursor: Option<&[u8]>,
    ) -> AppResult<AddressPage>;

    /// Raw escrow contract state
    async fn contract_state(&self, address: &str) -> AppResult<RawCampaignState>;

    /// CW20 balance of `owner`
    async fn token_balance(&self, token_address: &str, owner: &str) -> AppResult<u128>;

    /// CW20 token metadata
    async fn token_info(&self, token_address: &str) -> AppResult<TokenInfo>;

    /// Ledger height at which the contract was instantiated
    async fn creation_height(&self, address: &str) -> AppResult<u64>;

    /// Addresses excluded from discovery
    async fn deny_list_addresses(&self) -> AppResult<Vec<String>>;

    /// Curated addresses with their priority
    async fn featured_addresses(&self) -> AppResult<Vec<AddressPriority>>;

    /// Every registered name-service label
    async fn name_service_names(&self) -> AppResult<Vec<String>>;

    /// Contract address a label resolves to
    async fn resolve_name(&self, name: &str) -> AppResult<Option<String>>;

    /// Endpoint display name for logs
    fn endpoint_name(&self) -> String;
}

/// Ledger client stored in a graph cell; equality is identity
#[derive(Clone)]
pub struct ClientHandle(pub Arc<dyn LedgerClient>);

impl ClientHandle {
    pub fn new(client: Arc<dyn LedgerClient>) -> Self {
        Self(client)
    }
}

impl std::ops::Deref for ClientHandle {
    type Target = dyn LedgerClient;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl PartialEq for ClientHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ClientHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClientHandle")
            .field(&self.0.endpoint_name())
            .finish()
    }
}
