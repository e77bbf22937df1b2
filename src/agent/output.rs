use serde::{Deserialize, Serialize};

use crate::catalog::CatalogEntry;

/// The single output contract of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub answer: String,
}

impl Answer {
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
        }
    }
}

/// A product suggestion in catalog-only mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub product_name: String,
    pub department: String,
    pub aisle: String,
    pub popularity: u64,
}

impl From<CatalogEntry> for Recommendation {
    fn from(entry: CatalogEntry) -> Self {
        Self {
            product_name: entry.product_name,
            department: entry.department,
            aisle: entry.aisle,
            popularity: entry.popularity,
        }
    }
}

/// Shapes the agent can hand back to the router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentOutput {
    PlainText(String),
    StructuredAnswer { answer: String },
    RecommendationList(Vec<Recommendation>),
}
