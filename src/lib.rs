// ============================================================================
// fieldops: field-service management backend
// ============================================================================

pub mod client;
pub mod config;
pub mod core;
pub mod models;
pub mod numbering;
pub mod pagination;
pub mod seed;
pub mod service;
pub mod state;
pub mod store;
pub mod web;

pub use core::{StoreError, StoreResult};
pub use service::{FieldService, ServiceError, ServiceResult};
pub use state::AppState;
pub use store::{DocumentStore, MemoryStore, PgStore};
pub use web::build_router;
