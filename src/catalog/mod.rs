//! Product catalog enrichment.
//!
//! Loads the product, aisle, department and order-history tables and joins
//! them into one read-only [`Catalog`] that the index and retriever share.

mod builder;
mod loader;
mod types;

pub use builder::build_catalog;
pub use loader::{load_raw_tables, RawTables};
pub use types::{
    AisleRow, Catalog, CatalogEntry, CatalogStats, DepartmentRow, OrderProductRow, ProductRow,
};

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("missing catalog source '{name}' at {path}")]
    MissingSource { name: &'static str, path: PathBuf },
    #[error("failed to read {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("duplicate product_id {0} in product table")]
    DuplicateProduct(u64),
}

/// Reads the four CSV sources from `data_dir` and builds the enriched catalog.
pub fn load_catalog(data_dir: &Path) -> Result<Catalog, CatalogError> {
    let tables = load_raw_tables(data_dir)?;
    build_catalog(tables)
}
