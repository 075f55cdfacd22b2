//! Cost aggregation
//!
//! Deterministic costing over matched line items. Labor is modeled as a fixed
//! fraction of material cost rather than looked up independently; the rate is
//! a policy constant that deployments can override. This stage never raises
//! on bad numeric input — costing must always produce a number.

use crate::domain::{
    BoqTables, CostedLineItem, LaborRow, MatchedLineItem, MaterialRow, PurchaseOrderRow,
};

/// Labor as a fraction of material cost.
pub const DEFAULT_LABOR_RATE: f64 = 0.10;

/// Placeholder supplier for the purchase-order summary row.
pub const PO_SUPPLIER_PLACEHOLDER: &str = "TBD";

/// Cost every item. `material = qty * unit_price`, `labor = material * rate`,
/// `total = material + labor` — exactly, no rounding until display.
pub fn cost_items(items: &[MatchedLineItem], labor_rate: f64) -> Vec<CostedLineItem> {
    items
        .iter()
        .map(|matched| {
            let quantity = coerce(matched.item.quantity);
            let unit_price = coerce(matched.matched_unit_price.unwrap_or(0.0));

            let material_cost = quantity * unit_price;
            let labor_cost = material_cost * labor_rate;
            let total_cost = material_cost + labor_cost;

            CostedLineItem {
                matched: matched.clone(),
                material_cost,
                labor_cost,
                total_cost,
            }
        })
        .collect()
}

/// Produce the four canonical report tables. All four are projections of one
/// costed item set; an empty input yields well-formed empty tables with a
/// single zero-amount purchase-order row.
pub fn aggregate(items: &[MatchedLineItem], labor_rate: f64) -> BoqTables {
    let total = cost_items(items, labor_rate);

    let material = total
        .iter()
        .map(|c| MaterialRow {
            item_code: c.matched.item.item_code.clone(),
            description: c.matched.item.description.clone(),
            quantity: c.matched.item.quantity,
            unit: c.matched.item.unit.clone(),
            unit_price: c.matched.matched_unit_price.unwrap_or(0.0),
            material_cost: c.material_cost,
        })
        .collect();

    let labor = total
        .iter()
        .map(|c| LaborRow {
            item_code: c.matched.item.item_code.clone(),
            description: c.matched.item.description.clone(),
            quantity: c.matched.item.quantity,
            unit: c.matched.item.unit.clone(),
            labor_cost: c.labor_cost,
        })
        .collect();

    // fold from +0.0: `Iterator::sum` for floats uses -0.0 as its identity on
    // newer toolchains, and an empty BOQ must export as "0", not "-0"
    let amount = total.iter().fold(0.0, |acc, c| acc + c.total_cost);
    let purchase_order = vec![PurchaseOrderRow {
        supplier: PO_SUPPLIER_PLACEHOLDER.to_string(),
        amount,
    }];

    BoqTables {
        total,
        material,
        labor,
        purchase_order,
    }
}

/// Unusable numeric input is costed as zero, never propagated as an error.
fn coerce(value: f64) -> f64 {
    if value.is_finite() && value >= 0.0 {
        value
    } else {
        0.0
    }
}
