use std::{fs, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use inventory_api::{
    config::{self, AppConfig},
    db::{self, DbPool},
    entities::{InventoryLogModel, ProductModel},
    services::{ImportExportService, InventoryLogService, ProductService},
};
use serde::Serialize;
use tracing::debug;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let context = CliContext::initialize(matches!(cli.command, Commands::Migrate)).await?;

    match cli.command {
        Commands::Migrate => {
            db::run_migrations(&context.db)
                .await
                .context("failed to run migrations")?;
            println!("Migrations applied");
        }
        Commands::Import { file } => handle_import(&context, file, cli.json).await?,
        Commands::Export { output } => handle_export(&context, output).await?,
        Commands::List { search } => handle_list(&context, search, cli.json).await?,
        Commands::History { id } => handle_history(&context, id, cli.json).await?,
    }

    Ok(())
}

#[derive(Parser)]
#[command(
    name = "inventory-cli",
    about = "Operator commands for the inventory database",
    version
)]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON"
    )]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending schema migrations
    Migrate,
    /// Reconcile a CSV file against the catalog
    Import {
        /// CSV file with a header row
        file: PathBuf,
    },
    /// Write the catalog as CSV
    Export {
        /// Destination file; stdout when omitted
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// List products, optionally filtered by name
    List {
        #[arg(long, short)]
        search: Option<String>,
    },
    /// Show the stock history of one product
    History { id: i32 },
}

struct CliContext {
    config: AppConfig,
    db: Arc<DbPool>,
}

impl CliContext {
    async fn initialize(skip_auto_migrate: bool) -> Result<Self> {
        let config = config::load_config().context("failed to load application config")?;
        config::init_tracing(config.log_level(), config.log_json);

        let db_pool = db::establish_connection_from_app_config(&config)
            .await
            .context("failed to connect to database")?;

        if config.auto_migrate && !skip_auto_migrate {
            db::run_migrations(&db_pool)
                .await
                .context("failed to run migrations")?;
        }

        debug!(target: "inventory_cli", database = %config.database_url(), "cli context ready");

        Ok(Self {
            config,
            db: Arc::new(db_pool),
        })
    }

    fn product_service(&self) -> ProductService {
        ProductService::new(self.db.clone(), self.config.default_changed_by.clone())
    }

    fn import_export_service(&self) -> ImportExportService {
        ImportExportService::new(self.db.clone())
    }

    fn inventory_log_service(&self) -> InventoryLogService {
        InventoryLogService::new(self.db.clone())
    }
}

async fn handle_import(context: &CliContext, file: PathBuf, json: bool) -> Result<()> {
    let data = fs::read(&file).with_context(|| format!("failed to read {}", file.display()))?;
    let summary = context
        .import_export_service()
        .import_csv(&data)
        .await
        .with_context(|| format!("failed to import {}", file.display()))?;

    if json {
        print_json(&summary)?;
    } else {
        println!(
            "Imported {}: {} added, {} updated, {} skipped",
            file.display(),
            summary.added,
            summary.updated,
            summary.skipped
        );
    }
    Ok(())
}

async fn handle_export(context: &CliContext, output: Option<PathBuf>) -> Result<()> {
    let csv = context
        .import_export_service()
        .export_csv()
        .await
        .context("failed to export products")?;

    match output {
        Some(path) => {
            fs::write(&path, csv).with_context(|| format!("failed to write {}", path.display()))?;
            println!("Catalog written to {}", path.display());
        }
        None => print!("{csv}"),
    }
    Ok(())
}

async fn handle_list(context: &CliContext, search: Option<String>, json: bool) -> Result<()> {
    let service = context.product_service();
    let products = match search {
        Some(term) => service.search(&term).await,
        None => service.list().await,
    }
    .context("failed to load products")?;

    if json {
        return print_json(&products);
    }

    if products.is_empty() {
        println!("No products found");
    }
    for product in &products {
        render_product(product);
    }
    Ok(())
}

async fn handle_history(context: &CliContext, id: i32, json: bool) -> Result<()> {
    let entries = context
        .inventory_log_service()
        .history(id)
        .await
        .with_context(|| format!("failed to load history of product {id}"))?;

    if json {
        return print_json(&entries);
    }

    if entries.is_empty() {
        println!("No stock changes recorded for product {id}");
    }
    for entry in &entries {
        render_entry(entry);
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn render_product(product: &ProductModel) {
    println!(
        "- #{} {} • stock {} {} • {} • {}",
        product.id, product.name, product.stock, product.unit, product.category, product.status
    );
}

fn render_entry(entry: &InventoryLogModel) {
    println!(
        "- {} • {} -> {} • by {}",
        entry.timestamp.to_rfc3339(),
        entry.old_stock,
        entry.new_stock,
        entry.changed_by
    );
}
