pub mod csv_codec;
pub mod import_export;
pub mod inventory_log;
pub mod products;

pub use import_export::{ImportExportService, ImportSummary};
pub use inventory_log::InventoryLogService;
pub use products::{ProductInput, ProductService};
