//! Line-item and costing types
//!
//! The pipeline is `LineItem -> MatchedLineItem -> CostedLineItem -> BoqTables`;
//! each stage only adds fields, never mutates what an earlier stage produced.

use serde::{Deserialize, Serialize};

/// A candidate unit of work extracted from a drawing or scope document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineItem {
    /// Manufacturer/drawing code, e.g. "EL-001". Absent for numbered-list rows.
    pub item_code: Option<String>,
    /// Free-text description; never empty (empty rows are dropped at parse time).
    pub description: String,
    /// Always > 0; decimal-comma input is normalized to a dot before parsing.
    pub quantity: f64,
    /// Unit-of-measure token ("m", "ea", ...). Free text, not an enum.
    pub unit: String,
}

/// Fallback when a document yields no structurally matchable lines: the raw
/// extracted text is surfaced for manual inspection. A documented state, not
/// an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawTextRecord {
    pub full_text: String,
}

/// Result of a parse pass over one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParseOutcome {
    Items { items: Vec<LineItem> },
    Raw { record: RawTextRecord },
}

/// A line item after the price-matching pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchedLineItem {
    #[serde(flatten)]
    pub item: LineItem,
    pub matched_code: Option<String>,
    /// None when no catalog entry matched; costing treats None as 0.
    pub matched_unit_price: Option<f64>,
    /// Binary by policy: 0.75 = heuristic match needing human confirmation,
    /// 0.0 = no match, priced at zero.
    pub match_confidence: f64,
}

/// A fully costed line item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostedLineItem {
    #[serde(flatten)]
    pub matched: MatchedLineItem,
    pub material_cost: f64,
    pub labor_cost: f64,
    pub total_cost: f64,
}

/// Material-only projection row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialRow {
    pub item_code: Option<String>,
    pub description: String,
    pub quantity: f64,
    pub unit: String,
    pub unit_price: f64,
    pub material_cost: f64,
}

/// Labor-only projection row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaborRow {
    pub item_code: Option<String>,
    pub description: String,
    pub quantity: f64,
    pub unit: String,
    pub labor_cost: f64,
}

/// Placeholder procurement record, not a multi-supplier breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseOrderRow {
    pub supplier: String,
    pub amount: f64,
}

/// The four canonical output views. All are projections of the same costed
/// item set; `purchase_order` always holds exactly one summary row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoqTables {
    pub total: Vec<CostedLineItem>,
    pub material: Vec<MaterialRow>,
    pub labor: Vec<LaborRow>,
    pub purchase_order: Vec<PurchaseOrderRow>,
}
