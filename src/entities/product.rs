use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelBehavior, ActiveValue, ActiveValue::Set, ConnectionTrait};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Product entity
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "products")]
#[serde(rename_all = "camelCase")]
#[schema(as = Product)]
pub struct Model {
    /// Surrogate key, assigned on insert
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Display name, unique ignoring case
    pub name: String,

    /// Lower-cased name backing the unique index
    #[sea_orm(unique)]
    #[serde(skip)]
    pub name_key: String,

    pub unit: String,
    pub category: String,
    pub brand: String,

    /// Units on hand, never negative
    pub stock: i32,

    pub status: String,

    /// Opaque image reference (usually a URL)
    pub image: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Product entity relations
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::inventory_log::Entity")]
    InventoryLogs,
}

impl Related<super::inventory_log::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InventoryLogs.def()
    }
}

/// Normalized form used for case-insensitive name comparison.
/// Surrounding whitespace is ignored; the stored name keeps it.
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;

        if let ActiveValue::Set(name) = &active_model.name {
            let key = name_key(name);
            active_model.name_key = Set(key);
        }

        if let ActiveValue::Set(stock) = &active_model.stock {
            if *stock < 0 {
                return Err(DbErr::Custom(format!(
                    "stock cannot be negative (got {stock})"
                )));
            }
        }

        Ok(active_model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_key_folds_case_and_ignores_padding() {
        assert_eq!(name_key("Blue WIDGET"), "blue widget");
        assert_eq!(name_key(" Padded "), "padded");
        assert_eq!(name_key("\tTwo  Words "), "two  words");
        assert_eq!(name_key("ÄPFEL"), "äpfel");
    }

    #[test]
    fn serialized_product_hides_name_key() {
        let now = Utc::now();
        let model = Model {
            id: 7,
            name: "Bolt".into(),
            name_key: "bolt".into(),
            unit: "pcs".into(),
            category: "Hardware".into(),
            brand: "Acme".into(),
            stock: 3,
            status: "active".into(),
            image: String::new(),
            created_at: now,
            updated_at: now,
        };

        let value = serde_json::to_value(&model).unwrap();
        assert!(value.get("nameKey").is_none());
        assert_eq!(value["createdAt"], serde_json::to_value(now).unwrap());
        assert_eq!(value["stock"], 3);
    }
}
