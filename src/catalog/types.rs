use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct ProductRow {
    pub product_id: u64,
    pub product_name: String,
    pub aisle_id: u64,
    pub department_id: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AisleRow {
    pub aisle_id: u64,
    pub aisle: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DepartmentRow {
    pub department_id: u64,
    pub department: String,
}

/// One line of order history. Only the product reference matters here.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderProductRow {
    pub product_id: u64,
}

/// One enriched product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub product_id: u64,
    pub product_name: String,
    pub aisle: String,
    pub department: String,
    /// Historical order count; 0 when the product was never ordered.
    pub popularity: u64,
    /// Input to the embedder. Never shown to users.
    #[serde(skip_serializing, default)]
    pub embedding_text: String,
}

impl CatalogEntry {
    pub fn new(
        product_id: u64,
        product_name: impl Into<String>,
        aisle: impl Into<String>,
        department: impl Into<String>,
        popularity: u64,
    ) -> Self {
        let product_name = product_name.into();
        let aisle = aisle.into();
        let department = department.into();
        let embedding_text = embedding_text(&product_name, &aisle, &department);
        Self {
            product_id,
            product_name,
            aisle,
            department,
            popularity,
            embedding_text,
        }
    }
}

pub(crate) fn embedding_text(product_name: &str, aisle: &str, department: &str) -> String {
    format!(
        "{} | aisle: {} | department: {}",
        product_name, aisle, department
    )
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    pub products_read: usize,
    pub dropped_missing_aisle: usize,
    pub dropped_missing_department: usize,
    pub never_ordered: usize,
}

impl CatalogStats {
    pub fn dropped(&self) -> usize {
        self.dropped_missing_aisle + self.dropped_missing_department
    }
}

/// Enriched catalog in product-table order.
///
/// Row positions are stable for the process lifetime; the vector index
/// stores vectors in the same order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    stats: CatalogStats,
}

impl Catalog {
    pub fn new(entries: Vec<CatalogEntry>, stats: CatalogStats) -> Self {
        Self { entries, stats }
    }

    pub fn from_entries(entries: Vec<CatalogEntry>) -> Self {
        let stats = CatalogStats {
            products_read: entries.len(),
            never_ordered: entries.iter().filter(|e| e.popularity == 0).count(),
            ..Default::default()
        };
        Self::new(entries, stats)
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn get(&self, row: usize) -> Option<&CatalogEntry> {
        self.entries.get(row)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CatalogStats {
        self.stats
    }

    pub fn embedding_texts(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|entry| entry.embedding_text.clone())
            .collect()
    }
}
