use crate::{
    db::{self, DbPool},
    entities::product::{self, Column as ProductColumn, Entity as Product},
    errors::{ServiceError, NAME_REQUIRED, STOCK_INVALID},
    services::inventory_log,
};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    sea_query::LikeExpr, ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;

/// Body of create and update requests.
///
/// `stock` is accepted either as a JSON number or as a numeric string.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: Option<String>,
    pub unit: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    #[schema(value_type = Option<f64>, example = 12)]
    pub stock: Option<Value>,
    pub status: Option<String>,
    pub image: Option<String>,
    /// Actor recorded on the stock history entry
    pub changed_by: Option<String>,
}

/// Product fields after validation, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductFields {
    pub name: String,
    pub unit: String,
    pub category: String,
    pub brand: String,
    pub stock: i32,
    pub status: String,
    pub image: String,
}

impl ProductInput {
    /// Checks name then stock, returning the first failure.
    pub fn validate(&self) -> Result<ProductFields, ServiceError> {
        let name = match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name.to_string(),
            _ => return Err(ServiceError::ValidationError(NAME_REQUIRED.to_string())),
        };
        let stock = parse_stock(self.stock.as_ref())
            .ok_or_else(|| ServiceError::ValidationError(STOCK_INVALID.to_string()))?;

        let text = |v: &Option<String>| v.clone().unwrap_or_default();
        Ok(ProductFields {
            name,
            unit: text(&self.unit),
            category: text(&self.category),
            brand: text(&self.brand),
            stock,
            status: text(&self.status),
            image: text(&self.image),
        })
    }
}

fn parse_stock(value: Option<&Value>) -> Option<i32> {
    let number = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                0.0
            } else {
                s.parse::<f64>().ok()?
            }
        }
        _ => return None,
    };

    if number.is_finite() && number >= 0.0 && number.fract() == 0.0 && number <= f64::from(i32::MAX)
    {
        Some(number as i32)
    } else {
        None
    }
}

/// A timestamp strictly after `previous`, so `updatedAt` always advances.
pub(crate) fn next_timestamp(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

/// Case-insensitive lookup, optionally ignoring one id.
pub(crate) async fn find_by_name<C>(
    conn: &C,
    name: &str,
    excluding: Option<i32>,
) -> Result<Option<product::Model>, ServiceError>
where
    C: ConnectionTrait,
{
    let mut query = Product::find().filter(ProductColumn::NameKey.eq(product::name_key(name)));
    if let Some(id) = excluding {
        query = query.filter(ProductColumn::Id.ne(id));
    }
    query.one(conn).await.map_err(ServiceError::db_error)
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Single-record product operations
#[derive(Clone)]
pub struct ProductService {
    db: Arc<DbPool>,
    default_changed_by: String,
}

impl ProductService {
    pub fn new(db: Arc<DbPool>, default_changed_by: impl Into<String>) -> Self {
        Self {
            db,
            default_changed_by: default_changed_by.into(),
        }
    }

    fn actor(&self, changed_by: Option<&str>) -> String {
        changed_by
            .filter(|actor| !actor.trim().is_empty())
            .unwrap_or(self.default_changed_by.as_str())
            .to_string()
    }

    /// All products, newest id first
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<product::Model>, ServiceError> {
        Product::find()
            .order_by_desc(ProductColumn::Id)
            .all(&*self.db)
            .await
            .map_err(db::read_error("list_products"))
    }

    /// Case-insensitive substring match on the name. A blank term matches nothing.
    #[instrument(skip(self))]
    pub async fn search(&self, term: &str) -> Result<Vec<product::Model>, ServiceError> {
        let term = term.trim();
        if term.is_empty() {
            return Ok(Vec::new());
        }

        let pattern = format!("%{}%", escape_like(&product::name_key(term)));
        Product::find()
            .filter(ProductColumn::NameKey.like(LikeExpr::new(pattern).escape('\\')))
            .order_by_desc(ProductColumn::Id)
            .all(&*self.db)
            .await
            .map_err(db::read_error("search_products"))
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i32) -> Result<product::Model, ServiceError> {
        Product::find_by_id(id)
            .one(&*self.db)
            .await
            .map_err(db::read_error("get_product"))?
            .ok_or_else(ServiceError::product_not_found)
    }

    /// Inserts a product; a non-zero opening stock is recorded as 0 -> stock.
    #[instrument(skip(self, input), fields(name = ?input.name))]
    pub async fn create(&self, input: ProductInput) -> Result<product::Model, ServiceError> {
        let fields = input.validate()?;
        let actor = self.actor(input.changed_by.as_deref());

        let created = db::run_in_transaction(&self.db, "create_product", move |txn| {
            Box::pin(async move {
                if find_by_name(txn, &fields.name, None).await?.is_some() {
                    return Err(ServiceError::name_conflict());
                }

                let now = Utc::now();
                let model = product::ActiveModel {
                    name_key: Set(product::name_key(&fields.name)),
                    name: Set(fields.name),
                    unit: Set(fields.unit),
                    category: Set(fields.category),
                    brand: Set(fields.brand),
                    stock: Set(fields.stock),
                    status: Set(fields.status),
                    image: Set(fields.image),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                }
                .insert(txn)
                .await
                .map_err(ServiceError::from_write)?;

                if model.stock != 0 {
                    inventory_log::append(txn, model.id, 0, model.stock, &actor, now).await?;
                }

                Ok(model)
            })
        })
        .await?;

        info!(product_id = created.id, stock = created.stock, "product created");
        Ok(created)
    }

    /// Replaces every field of an existing product; a stock change is recorded.
    #[instrument(skip(self, input), fields(name = ?input.name))]
    pub async fn update(
        &self,
        id: i32,
        input: ProductInput,
    ) -> Result<product::Model, ServiceError> {
        let fields = input.validate()?;
        let actor = self.actor(input.changed_by.as_deref());

        let updated = db::run_in_transaction(&self.db, "update_product", move |txn| {
            Box::pin(async move {
                if find_by_name(txn, &fields.name, Some(id)).await?.is_some() {
                    return Err(ServiceError::name_conflict());
                }

                let existing = Product::find_by_id(id)
                    .one(txn)
                    .await
                    .map_err(ServiceError::db_error)?
                    .ok_or_else(ServiceError::product_not_found)?;

                let old_stock = existing.stock;
                let now = next_timestamp(existing.updated_at);

                let mut active: product::ActiveModel = existing.into();
                active.name = Set(fields.name);
                active.unit = Set(fields.unit);
                active.category = Set(fields.category);
                active.brand = Set(fields.brand);
                active.stock = Set(fields.stock);
                active.status = Set(fields.status);
                active.image = Set(fields.image);
                active.updated_at = Set(now);

                let model = active.update(txn).await.map_err(ServiceError::from_write)?;

                if old_stock != model.stock {
                    inventory_log::append(txn, model.id, old_stock, model.stock, &actor, now)
                        .await?;
                }

                Ok(model)
            })
        })
        .await?;

        info!(product_id = updated.id, stock = updated.stock, "product updated");
        Ok(updated)
    }

    /// Removes the product and its history. Unknown ids are not an error.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        let removed = db::run_in_transaction(&self.db, "delete_product", move |txn| {
            Box::pin(async move {
                inventory_log::delete_for_product(txn, id).await?;
                let result = Product::delete_by_id(id)
                    .exec(txn)
                    .await
                    .map_err(ServiceError::db_error)?;
                Ok(result.rows_affected)
            })
        })
        .await?;

        info!(product_id = id, removed, "product delete processed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::inventory_log::InventoryLogService;
    use crate::test_support::temp_database;
    use assert_matches::assert_matches;
    use rstest::rstest;
    use serde_json::json;

    fn input(name: &str, stock: Value) -> ProductInput {
        ProductInput {
            name: Some(name.to_string()),
            unit: Some("pcs".into()),
            category: Some("Tools".into()),
            brand: Some("Acme".into()),
            stock: Some(stock),
            status: Some("In Stock".into()),
            image: None,
            changed_by: None,
        }
    }

    async fn services() -> (ProductService, InventoryLogService, tempfile::TempDir) {
        let (db, dir) = temp_database().await;
        let db = Arc::new(db);
        (
            ProductService::new(db.clone(), "admin"),
            InventoryLogService::new(db),
            dir,
        )
    }

    #[rstest]
    #[case(json!(5), Some(5))]
    #[case(json!("5"), Some(5))]
    #[case(json!(" 8 "), Some(8))]
    #[case(json!(""), Some(0))]
    #[case(json!(0), Some(0))]
    #[case(json!(4.0), Some(4))]
    #[case(json!(-1), None)]
    #[case(json!(2.5), None)]
    #[case(json!("ten"), None)]
    #[case(json!(null), None)]
    #[case(json!(true), None)]
    fn stock_parsing(#[case] raw: Value, #[case] expected: Option<i32>) {
        assert_eq!(parse_stock(Some(&raw)), expected);
    }

    #[test]
    fn missing_stock_is_invalid() {
        let mut candidate = input("Saw", json!(1));
        candidate.stock = None;
        assert_matches!(candidate.validate(), Err(ServiceError::ValidationError(m)) if m == STOCK_INVALID);
    }

    #[test]
    fn name_is_checked_before_stock() {
        let candidate = input("   ", json!(-3));
        assert_matches!(candidate.validate(), Err(ServiceError::ValidationError(m)) if m == NAME_REQUIRED);
    }

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }

    #[tokio::test]
    async fn create_keeps_untrimmed_name_and_logs_opening_stock() {
        let (products, logs, _dir) = services().await;

        let created = products.create(input("  Hammer ", json!(7))).await.unwrap();
        assert_eq!(created.name, "  Hammer ");
        assert_eq!(created.stock, 7);

        let history = logs.history(created.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!((history[0].old_stock, history[0].new_stock), (0, 7));
        assert_eq!(history[0].changed_by, "admin");
    }

    #[tokio::test]
    async fn create_with_zero_stock_writes_no_history() {
        let (products, logs, _dir) = services().await;
        let created = products.create(input("Chisel", json!(0))).await.unwrap();
        assert!(logs.history(created.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn names_are_unique_ignoring_case() {
        let (products, _logs, _dir) = services().await;
        products.create(input("Widget", json!(1))).await.unwrap();

        let err = products.create(input("WIDGET", json!(1))).await.unwrap_err();
        assert_matches!(err, ServiceError::Conflict(_));
        assert_eq!(products.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_records_stock_transition_once() {
        let (products, logs, _dir) = services().await;
        let created = products.create(input("Drill", json!(3))).await.unwrap();

        let mut change = input("Drill", json!(9));
        change.changed_by = Some("maria".into());
        let updated = products.update(created.id, change).await.unwrap();
        assert_eq!(updated.stock, 9);
        assert!(updated.updated_at > created.updated_at);

        let history = logs.history(created.id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!((history[0].old_stock, history[0].new_stock), (3, 9));
        assert_eq!(history[0].changed_by, "maria");
    }

    #[tokio::test]
    async fn update_with_same_stock_writes_no_history() {
        let (products, logs, _dir) = services().await;
        let created = products.create(input("Level", json!(2))).await.unwrap();

        let mut change = input("Level", json!("2"));
        change.brand = Some("Stanley".into());
        let updated = products.update(created.id, change).await.unwrap();
        assert_eq!(updated.brand, "Stanley");
        assert!(updated.updated_at > created.updated_at);
        assert_eq!(logs.history(created.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_may_change_case_of_own_name() {
        let (products, _logs, _dir) = services().await;
        let created = products.create(input("wrench", json!(1))).await.unwrap();
        let updated = products
            .update(created.id, input("Wrench", json!(1)))
            .await
            .unwrap();
        assert_eq!(updated.name, "Wrench");
    }

    #[tokio::test]
    async fn update_rejects_name_of_another_product() {
        let (products, _logs, _dir) = services().await;
        products.create(input("Pliers", json!(1))).await.unwrap();
        let other = products.create(input("Clamp", json!(1))).await.unwrap();

        let err = products
            .update(other.id, input("pliers", json!(1)))
            .await
            .unwrap_err();
        assert_matches!(err, ServiceError::Conflict(_));
    }

    #[tokio::test]
    async fn update_of_missing_product_is_not_found() {
        let (products, _logs, _dir) = services().await;
        let err = products.update(404, input("Ghost", json!(1))).await.unwrap_err();
        assert_matches!(err, ServiceError::NotFound(_));
    }

    #[tokio::test]
    async fn delete_cascades_history_and_ignores_unknown_ids() {
        let (products, logs, _dir) = services().await;
        let created = products.create(input("Vise", json!(4))).await.unwrap();

        products.delete(created.id).await.unwrap();
        products.delete(created.id).await.unwrap();

        assert_matches!(products.get(created.id).await, Err(ServiceError::NotFound(_)));
        assert!(logs.history(created.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn search_is_case_insensitive_and_literal() {
        let (products, _logs, _dir) = services().await;
        products.create(input("Paint Brush", json!(1))).await.unwrap();
        products.create(input("100% Cotton Rag", json!(1))).await.unwrap();
        products.create(input("Paint_Roller", json!(1))).await.unwrap();

        let hits = products.search("PAINT").await.unwrap();
        let names: Vec<_> = hits.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Paint_Roller", "Paint Brush"]);

        assert_eq!(products.search("0%").await.unwrap().len(), 1);
        assert_eq!(products.search("t_").await.unwrap().len(), 1);
        assert!(products.search("   ").await.unwrap().is_empty());
        assert!(products.search("sandpaper").await.unwrap().is_empty());
    }

    fn raw_product(name: &str) -> product::ActiveModel {
        let now = Utc::now();
        product::ActiveModel {
            name: Set(name.to_string()),
            unit: Set(String::new()),
            category: Set(String::new()),
            brand: Set(String::new()),
            stock: Set(0),
            status: Set(String::new()),
            image: Set(String::new()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn unique_index_violation_maps_to_conflict() {
        let (db, _dir) = temp_database().await;

        raw_product("Bolt").insert(&db).await.unwrap();
        let err = raw_product(" BOLT ")
            .insert(&db)
            .await
            .map_err(ServiceError::from_write)
            .unwrap_err();

        assert_matches!(err, ServiceError::Conflict(_));
        assert_eq!(err.status_code(), axum::http::StatusCode::CONFLICT);
    }
}
