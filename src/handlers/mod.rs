pub mod common;
pub mod products;

use crate::{
    db::DbPool,
    services::{ImportExportService, InventoryLogService, ProductService},
};
use std::sync::Arc;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub products: Arc<ProductService>,
    pub inventory_log: Arc<InventoryLogService>,
    pub import_export: Arc<ImportExportService>,
}

impl AppServices {
    /// Builds every service over one shared pool.
    pub fn new(db_pool: Arc<DbPool>, default_changed_by: &str) -> Self {
        Self {
            products: Arc::new(ProductService::new(db_pool.clone(), default_changed_by)),
            inventory_log: Arc::new(InventoryLogService::new(db_pool.clone())),
            import_export: Arc::new(ImportExportService::new(db_pool)),
        }
    }
}
