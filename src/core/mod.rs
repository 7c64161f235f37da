//! Core discovery pipeline
//!
//! graph -> enumerator -> resolver -> pager, fronted by the engine.

pub mod engine;
pub mod enumerator;
pub mod graph;
pub mod normalizer;
pub mod pager;
pub mod query;
pub mod resolver;
pub mod state;

pub use engine::DiscoveryEngine;
pub use graph::{EvictionPolicy, Graph, GraphStats};
pub use query::{add_filter, filter_exists, remove_filter, CampaignQuery, Visibility};
