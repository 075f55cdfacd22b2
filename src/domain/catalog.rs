use serde::{Deserialize, Serialize};

/// One priced reference item. Only `description` participates in matching;
/// `code` and `unit` are carried through unvalidated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceCatalogEntry {
    pub code: String,
    pub description: String,
    pub unit: String,
    /// Non-negative; rows with unparseable prices are kept at 0.
    pub unit_price: f64,
    /// Provenance tag: "upload", "cache", "remote", or the CSV's own column.
    pub source: String,
}

/// Catalog status DTO for the API
#[derive(Debug, Clone, Serialize)]
pub struct CatalogStatus {
    pub entries: usize,
    pub source: String,
    /// First few entries, for a quick visual sanity check
    pub sample: Vec<PriceCatalogEntry>,
}
