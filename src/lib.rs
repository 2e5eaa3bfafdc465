//! Inventory API library
//!
//! Product catalog with case-insensitive unique names, a per-product stock
//! ledger and CSV import/export reconciliation, served over axum.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod health;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod services;
pub mod tracing;

#[cfg(test)]
pub(crate) mod test_support;

use axum::{
    extract::{DefaultBodyLimit, State},
    response::Json,
    routing::get,
    Router,
};
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};
use std::sync::Arc;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub services: handlers::AppServices,
}

impl AppState {
    pub fn new(db: Arc<DatabaseConnection>, config: config::AppConfig) -> Self {
        let services = handlers::AppServices::new(db.clone(), &config.default_changed_by);
        Self {
            db,
            config,
            services,
        }
    }
}

/// Versioned API surface, mounted under `/api/v1`
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .route("/status", get(api_status))
        .nest("/products", handlers::products::products_routes())
}

/// Full application router with request id, tracing and upload limit layers.
///
/// Transport concerns that depend on deployment (CORS, timeouts, compression)
/// are added by the server binary.
pub fn app(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .nest("/api/v1", api_v1_routes())
        .merge(health::health_routes())
        .merge(openapi::openapi_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(crate::tracing::configure_http_tracing())
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id_middleware,
        ))
        .with_state(state)
}

async fn api_status(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "inventory-api",
        "environment": state.config.environment,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

pub mod prelude {
    pub use crate::config::AppConfig;
    pub use crate::db::DbPool;
    pub use crate::entities::{InventoryLogModel, ProductModel};
    pub use crate::errors::ServiceError;
    pub use crate::services::{
        ImportExportService, ImportSummary, InventoryLogService, ProductInput, ProductService,
    };
    pub use crate::AppState;
}
