use crate::{
    db::{self, DbPool},
    entities::inventory_log::{self, Column as LogColumn, Entity as InventoryLog},
    errors::ServiceError,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Appends one stock transition. Callers pass their open transaction so the
/// entry commits together with the product write.
pub async fn append<C>(
    conn: &C,
    product_id: i32,
    old_stock: i32,
    new_stock: i32,
    changed_by: &str,
    at: DateTime<Utc>,
) -> Result<inventory_log::Model, ServiceError>
where
    C: ConnectionTrait,
{
    let entry = inventory_log::ActiveModel {
        product_id: Set(product_id),
        old_stock: Set(old_stock),
        new_stock: Set(new_stock),
        changed_by: Set(changed_by.to_string()),
        timestamp: Set(at),
        ..Default::default()
    }
    .insert(conn)
    .await
    .map_err(ServiceError::db_error)?;

    debug!(
        product_id,
        old_stock, new_stock, changed_by, "stock change recorded"
    );
    Ok(entry)
}

/// Removes every entry of a product.
pub async fn delete_for_product<C>(conn: &C, product_id: i32) -> Result<u64, ServiceError>
where
    C: ConnectionTrait,
{
    let result = InventoryLog::delete_many()
        .filter(LogColumn::ProductId.eq(product_id))
        .exec(conn)
        .await
        .map_err(ServiceError::db_error)?;
    Ok(result.rows_affected)
}

/// Read side of the stock ledger
#[derive(Clone)]
pub struct InventoryLogService {
    db: Arc<DbPool>,
}

impl InventoryLogService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Entries of one product, newest first. Unknown products have no history.
    #[instrument(skip(self))]
    pub async fn history(&self, product_id: i32) -> Result<Vec<inventory_log::Model>, ServiceError> {
        InventoryLog::find()
            .filter(LogColumn::ProductId.eq(product_id))
            .order_by_desc(LogColumn::Timestamp)
            .order_by_desc(LogColumn::Id)
            .all(&*self.db)
            .await
            .map_err(db::read_error("inventory_history"))
    }
}
