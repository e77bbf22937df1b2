use std::collections::{HashMap, HashSet};

use super::loader::RawTables;
use super::types::{Catalog, CatalogEntry, CatalogStats, OrderProductRow};
use super::CatalogError;

/// Folds order-history rows into per-product order counts.
pub(crate) fn popularity_counts<I>(rows: I) -> HashMap<u64, u64>
where
    I: IntoIterator<Item = OrderProductRow>,
{
    let mut counts = HashMap::new();
    for row in rows {
        *counts.entry(row.product_id).or_insert(0u64) += 1;
    }
    counts
}

/// Joins products with aisles and departments and attaches popularity.
///
/// Products whose aisle or department is unknown are dropped (inner join)
/// and counted in [`CatalogStats`]. Products without orders keep
/// popularity 0. Output order follows the product table.
pub fn build_catalog(tables: RawTables) -> Result<Catalog, CatalogError> {
    let RawTables {
        products,
        aisles,
        departments,
        order_counts,
    } = tables;

    let aisle_names: HashMap<u64, String> = aisles
        .into_iter()
        .map(|row| (row.aisle_id, row.aisle))
        .collect();
    let department_names: HashMap<u64, String> = departments
        .into_iter()
        .map(|row| (row.department_id, row.department))
        .collect();

    let mut stats = CatalogStats {
        products_read: products.len(),
        ..Default::default()
    };
    let mut seen = HashSet::with_capacity(products.len());
    let mut entries = Vec::with_capacity(products.len());

    for product in products {
        if !seen.insert(product.product_id) {
            return Err(CatalogError::DuplicateProduct(product.product_id));
        }

        let Some(aisle) = aisle_names.get(&product.aisle_id) else {
            stats.dropped_missing_aisle += 1;
            continue;
        };
        let Some(department) = department_names.get(&product.department_id) else {
            stats.dropped_missing_department += 1;
            continue;
        };

        let popularity = order_counts.get(&product.product_id).copied().unwrap_or(0);
        if popularity == 0 {
            stats.never_ordered += 1;
        }

        entries.push(CatalogEntry::new(
            product.product_id,
            product.product_name,
            aisle.clone(),
            department.clone(),
            popularity,
        ));
    }

    if stats.dropped() > 0 {
        tracing::warn!(
            "Catalog join dropped {} products ({} unknown aisle, {} unknown department)",
            stats.dropped(),
            stats.dropped_missing_aisle,
            stats.dropped_missing_department
        );
    }
    tracing::info!(
        "Catalog built: {} entries, {} never ordered",
        entries.len(),
        stats.never_ordered
    );

    Ok(Catalog::new(entries, stats))
}
