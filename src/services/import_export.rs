use crate::{
    db::{self, DbPool},
    entities::product::{self, Column as ProductColumn, Entity as Product},
    errors::ServiceError,
    services::{
        csv_codec::{self, CsvRecord},
        products::{find_by_name, next_timestamp},
    },
};
use chrono::Utc;
use metrics::counter;
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument};
use utoipa::ToSchema;

/// Per-outcome counts of one import
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ImportSummary {
    pub added: u64,
    pub updated: u64,
    pub skipped: u64,
}

impl ImportSummary {
    fn record(&mut self, outcome: RecordOutcome) {
        match outcome {
            RecordOutcome::Added => self.added += 1,
            RecordOutcome::Updated => self.updated += 1,
            RecordOutcome::Skipped => self.skipped += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Added,
    Updated,
    Skipped,
}

/// The comparable part of an imported row.
#[derive(Debug, PartialEq, Eq)]
struct Attributes {
    unit: String,
    category: String,
    brand: String,
    stock: i32,
    status: String,
    image: String,
}

impl Attributes {
    fn from_record(record: &CsvRecord) -> Self {
        Self {
            unit: record.get("unit").to_string(),
            category: record.get("category").to_string(),
            brand: record.get("brand").to_string(),
            stock: csv_codec::lenient_stock(record.get("stock")),
            status: record.get("status").to_string(),
            image: record.get("image").to_string(),
        }
    }

    fn of(model: &product::Model) -> Self {
        Self {
            unit: model.unit.clone(),
            category: model.category.clone(),
            brand: model.brand.clone(),
            stock: model.stock,
            status: model.status.clone(),
            image: model.image.clone(),
        }
    }
}

/// Applies one record against the store. Bulk changes do not touch the stock ledger.
async fn reconcile_record<C>(conn: &C, record: &CsvRecord) -> Result<RecordOutcome, ServiceError>
where
    C: ConnectionTrait,
{
    let name = record.get("name").trim();
    if name.is_empty() {
        return Ok(RecordOutcome::Skipped);
    }

    let incoming = Attributes::from_record(record);

    let Some(existing) = find_by_name(conn, name, None).await? else {
        let now = Utc::now();
        product::ActiveModel {
            name: Set(name.to_string()),
            name_key: Set(product::name_key(name)),
            unit: Set(incoming.unit),
            category: Set(incoming.category),
            brand: Set(incoming.brand),
            stock: Set(incoming.stock),
            status: Set(incoming.status),
            image: Set(incoming.image),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(conn)
        .await
        .map_err(ServiceError::from_write)?;
        return Ok(RecordOutcome::Added);
    };

    if Attributes::of(&existing) == incoming {
        return Ok(RecordOutcome::Skipped);
    }

    debug!(product_id = existing.id, "import changes existing product");
    let now = next_timestamp(existing.updated_at);
    let mut active: product::ActiveModel = existing.into();
    active.unit = Set(incoming.unit);
    active.category = Set(incoming.category);
    active.brand = Set(incoming.brand);
    active.stock = Set(incoming.stock);
    active.status = Set(incoming.status);
    active.image = Set(incoming.image);
    active.updated_at = Set(now);
    active.update(conn).await.map_err(ServiceError::from_write)?;

    Ok(RecordOutcome::Updated)
}

/// Bulk CSV transfer of the product catalog
#[derive(Clone)]
pub struct ImportExportService {
    db: Arc<DbPool>,
}

impl ImportExportService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Parses an uploaded CSV file and reconciles it in one transaction.
    #[instrument(skip(self, data), fields(bytes = data.len()))]
    pub async fn import_csv(&self, data: &[u8]) -> Result<ImportSummary, ServiceError> {
        let records = csv_codec::parse_records(data)?;
        self.reconcile(records).await
    }

    /// Reconciles records in order; later rows see rows inserted earlier in the batch.
    pub async fn reconcile(&self, records: Vec<CsvRecord>) -> Result<ImportSummary, ServiceError> {
        let summary = db::run_in_transaction(&self.db, "import_products", move |txn| {
            Box::pin(async move {
                let mut summary = ImportSummary::default();
                for record in &records {
                    summary.record(reconcile_record(txn, record).await?);
                }
                Ok(summary)
            })
        })
        .await?;

        counter!("inventory_import.added", summary.added);
        counter!("inventory_import.updated", summary.updated);
        counter!("inventory_import.skipped", summary.skipped);
        info!(
            added = summary.added,
            updated = summary.updated,
            skipped = summary.skipped,
            "import committed"
        );

        Ok(summary)
    }

    /// The whole catalog as CSV, oldest id first.
    #[instrument(skip(self))]
    pub async fn export_csv(&self) -> Result<String, ServiceError> {
        let products = Product::find()
            .order_by_asc(ProductColumn::Id)
            .all(&*self.db)
            .await
            .map_err(db::read_error("export_products"))?;

        info!(rows = products.len(), "export rendered");
        Ok(csv_codec::render_products(&products))
    }
}
