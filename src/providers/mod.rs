//! Ledger providers
//!
//! - `ledger`: the `LedgerClient` trait every provider implements
//! - `lcd`: CosmWasm LCD REST client with retry
//! - `memory`: deterministic in-memory ledger for tests and demos

pub mod lcd;
pub mod ledger;
pub mod memory;

pub use lcd::LcdClient;
pub use ledger::{ClientHandle, LedgerClient};
pub use memory::InMemoryLedger;
