use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use super::builder::popularity_counts;
use super::types::{AisleRow, DepartmentRow, OrderProductRow, ProductRow};
use super::CatalogError;

pub const PRODUCTS_FILE: &str = "products.csv";
pub const AISLES_FILE: &str = "aisles.csv";
pub const DEPARTMENTS_FILE: &str = "departments.csv";
pub const ORDER_HISTORY_FILE: &str = "order_products__prior.csv";

/// The raw source tables, with order history already folded into counts.
#[derive(Debug, Clone, Default)]
pub struct RawTables {
    pub products: Vec<ProductRow>,
    pub aisles: Vec<AisleRow>,
    pub departments: Vec<DepartmentRow>,
    pub order_counts: HashMap<u64, u64>,
}

pub fn load_raw_tables(data_dir: &Path) -> Result<RawTables, CatalogError> {
    let products_path = require_source(data_dir, "products", PRODUCTS_FILE)?;
    let aisles_path = require_source(data_dir, "aisles", AISLES_FILE)?;
    let departments_path = require_source(data_dir, "departments", DEPARTMENTS_FILE)?;
    let orders_path = require_source(data_dir, "order history", ORDER_HISTORY_FILE)?;

    let products: Vec<ProductRow> = read_rows(&products_path)?;
    let aisles: Vec<AisleRow> = read_rows(&aisles_path)?;
    let departments: Vec<DepartmentRow> = read_rows(&departments_path)?;

    // Order history is large; aggregate while streaming instead of buffering.
    let mut reader = open_reader(&orders_path)?;
    let mut parse_error = None;
    let rows = reader
        .deserialize::<OrderProductRow>()
        .map_while(|row| match row {
            Ok(row) => Some(row),
            Err(err) => {
                parse_error = Some(err);
                None
            }
        });
    let order_counts = popularity_counts(rows);
    if let Some(err) = parse_error {
        return Err(parse_failure(&orders_path, err));
    }

    tracing::info!(
        "Loaded catalog sources: {} products, {} aisles, {} departments, {} ordered products",
        products.len(),
        aisles.len(),
        departments.len(),
        order_counts.len()
    );

    Ok(RawTables {
        products,
        aisles,
        departments,
        order_counts,
    })
}

fn require_source(
    data_dir: &Path,
    name: &'static str,
    file: &str,
) -> Result<PathBuf, CatalogError> {
    let path = data_dir.join(file);
    if !path.is_file() {
        return Err(CatalogError::MissingSource { name, path });
    }
    Ok(path)
}

fn open_reader(path: &Path) -> Result<csv::Reader<std::fs::File>, CatalogError> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|err| parse_failure(path, err))
}

fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, CatalogError> {
    let mut reader = open_reader(path)?;
    reader
        .deserialize::<T>()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| parse_failure(path, err))
}

fn parse_failure(path: &Path, err: csv::Error) -> CatalogError {
    CatalogError::Parse {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_sources(dir: &Path) {
        fs::write(
            dir.join(PRODUCTS_FILE),
            "product_id,product_name,aisle_id,department_id\n\
             1,\"Bananas, Organic\",24,4\n\
             2,Whole Milk,84,16\n",
        )
        .unwrap();
        fs::write(dir.join(AISLES_FILE), "aisle_id,aisle\n24,fresh fruits\n84,milk\n").unwrap();
        fs::write(
            dir.join(DEPARTMENTS_FILE),
            "department_id,department\n4,produce\n16,dairy eggs\n",
        )
        .unwrap();
        fs::write(
            dir.join(ORDER_HISTORY_FILE),
            "order_id,product_id,add_to_cart_order,reordered\n\
             10,1,1,0\n11,1,2,1\n12,2,1,0\n",
        )
        .unwrap();
    }

    #[test]
    fn loads_all_sources_and_counts_orders() {
        let dir = tempfile::tempdir().unwrap();
        write_sources(dir.path());

        let tables = load_raw_tables(dir.path()).expect("sources should load");

        assert_eq!(tables.products.len(), 2);
        assert_eq!(tables.products[0].product_name, "Bananas, Organic");
        assert_eq!(tables.aisles.len(), 2);
        assert_eq!(tables.departments.len(), 2);
        assert_eq!(tables.order_counts.get(&1), Some(&2));
        assert_eq!(tables.order_counts.get(&2), Some(&1));
    }

    #[test]
    fn missing_source_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_sources(dir.path());
        fs::remove_file(dir.path().join(DEPARTMENTS_FILE)).unwrap();

        let err = load_raw_tables(dir.path()).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::MissingSource {
                name: "departments",
                ..
            }
        ));
    }

    #[test]
    fn malformed_order_row_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_sources(dir.path());
        fs::write(
            dir.path().join(ORDER_HISTORY_FILE),
            "order_id,product_id\n10,not-a-number\n",
        )
        .unwrap();

        let err = load_raw_tables(dir.path()).unwrap_err();
        assert!(matches!(err, CatalogError::Parse { .. }));
    }
}
