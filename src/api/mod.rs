//! Campaign Discovery REST API Module
//! Read-only HTTP surface over the discovery engine

pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod types;

pub use middleware::start_cleanup_task;
pub use routes::create_router;
pub use types::*;
