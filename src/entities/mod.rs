pub mod inventory_log;
pub mod product;

pub use inventory_log::{Entity as InventoryLog, Model as InventoryLogModel};
pub use product::{Entity as Product, Model as ProductModel};
