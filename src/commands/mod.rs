pub mod index;
pub mod inventory;
pub mod overview;
pub mod page;
pub mod status;
pub mod watch;

use std::path::{Path, PathBuf};

pub const CATALOG_DB_FILE_NAME: &str = "report_catalog.sqlite";
pub const INVENTORY_MANIFEST_FILE_NAME: &str = "report_inventory.json";

pub fn default_db_path(runs_root: &Path) -> PathBuf {
    runs_root.join(CATALOG_DB_FILE_NAME)
}

pub fn default_inventory_path(runs_root: &Path) -> PathBuf {
    runs_root.join("manifests").join(INVENTORY_MANIFEST_FILE_NAME)
}
