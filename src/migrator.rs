use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_products_table::Migration),
            Box::new(m20240101_000002_create_inventory_logs_table::Migration),
        ]
    }
}

mod m20240101_000001_create_products_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_products_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Products::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Products::Name).string().not_null())
                        .col(ColumnDef::new(Products::NameKey).string().not_null())
                        .col(ColumnDef::new(Products::Unit).string().not_null().default(""))
                        .col(
                            ColumnDef::new(Products::Category)
                                .string()
                                .not_null()
                                .default(""),
                        )
                        .col(ColumnDef::new(Products::Brand).string().not_null().default(""))
                        .col(
                            ColumnDef::new(Products::Stock)
                                .integer()
                                .not_null()
                                .default(0)
                                .check(Expr::col(Products::Stock).gte(0)),
                        )
                        .col(ColumnDef::new(Products::Status).string().not_null().default(""))
                        .col(ColumnDef::new(Products::Image).string().not_null().default(""))
                        .col(
                            ColumnDef::new(Products::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Products::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            // Case-insensitive uniqueness lives here, not only in the service check.
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_products_name_key")
                        .table(Products::Table)
                        .col(Products::NameKey)
                        .unique()
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum Products {
        Table,
        Id,
        Name,
        NameKey,
        Unit,
        Category,
        Brand,
        Stock,
        Status,
        Image,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000002_create_inventory_logs_table {
    use super::m20240101_000001_create_products_table::Products;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_inventory_logs_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(InventoryLogs::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InventoryLogs::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(InventoryLogs::ProductId).integer().not_null())
                        .col(ColumnDef::new(InventoryLogs::OldStock).integer().not_null())
                        .col(ColumnDef::new(InventoryLogs::NewStock).integer().not_null())
                        .col(ColumnDef::new(InventoryLogs::ChangedBy).string().not_null())
                        .col(
                            ColumnDef::new(InventoryLogs::Timestamp)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_inventory_logs_product_id")
                                .from(InventoryLogs::Table, InventoryLogs::ProductId)
                                .to(Products::Table, Products::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_logs_product_id")
                        .table(InventoryLogs::Table)
                        .col(InventoryLogs::ProductId)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(InventoryLogs::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum InventoryLogs {
        Table,
        Id,
        ProductId,
        OldStock,
        NewStock,
        ChangedBy,
        Timestamp,
    }
}
