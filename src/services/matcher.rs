//! Price matcher
//!
//! The simplest matcher that is useful: first-token substring search against
//! catalog descriptions, full-description containment as the fallback, first
//! catalog entry wins on ties. Confidence is deliberately binary — 0.75 says
//! "heuristic match, confirm by hand", 0.0 says "no match, priced at zero" —
//! not a graded similarity score.

use crate::domain::{LineItem, MatchedLineItem, PriceCatalogEntry};

/// Fixed confidence for any heuristic hit.
pub const MATCH_CONFIDENCE: f64 = 0.75;

/// Match every line item against the catalog. Total: exactly one output per
/// input, whatever the catalog looks like. A miss is not an error — the item
/// is carried through priced at zero for manual correction.
pub fn match_items(items: &[LineItem], catalog: &[PriceCatalogEntry]) -> Vec<MatchedLineItem> {
    items
        .iter()
        .map(|item| match find_candidate(item, catalog) {
            Some(entry) => MatchedLineItem {
                item: item.clone(),
                matched_code: Some(entry.code.clone()).filter(|c| !c.trim().is_empty()),
                matched_unit_price: Some(entry.unit_price),
                match_confidence: MATCH_CONFIDENCE,
            },
            None => MatchedLineItem {
                item: item.clone(),
                matched_code: None,
                matched_unit_price: None,
                match_confidence: 0.0,
            },
        })
        .collect()
}

fn find_candidate<'a>(
    item: &LineItem,
    catalog: &'a [PriceCatalogEntry],
) -> Option<&'a PriceCatalogEntry> {
    if catalog.is_empty() {
        return None;
    }

    let description = item.description.to_lowercase();
    let key = description.split_whitespace().next().unwrap_or("");

    if !key.is_empty() {
        if let Some(entry) = catalog
            .iter()
            .find(|e| e.description.to_lowercase().contains(key))
        {
            return Some(entry);
        }
    }

    // Token missed every entry: fall back to containment of the whole
    // description.
    catalog
        .iter()
        .find(|e| e.description.to_lowercase().contains(&description))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn item(description: &str, quantity: f64, unit: &str) -> LineItem {
        LineItem {
            item_code: None,
            description: description.to_string(),
            quantity,
            unit: unit.to_string(),
        }
    }

    fn entry(code: &str, description: &str, unit_price: f64) -> PriceCatalogEntry {
        PriceCatalogEntry {
            code: code.to_string(),
            description: description.to_string(),
            unit: "m".to_string(),
            unit_price,
            source: "test".to_string(),
        }
    }

    #[test]
    fn thai_description_matches_by_first_token() {
        let catalog = vec![entry("EL-001", "สายไฟ THW 2.5 mm2", 12.5)];
        let items = vec![item("สายไฟ THW 2.5 mm2", 100.0, "m")];

        let matched = match_items(&items, &catalog);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].matched_code.as_deref(), Some("EL-001"));
        assert_eq!(matched[0].matched_unit_price, Some(12.5));
        assert_eq!(matched[0].match_confidence, MATCH_CONFIDENCE);
    }

    #[test]
    fn empty_catalog_yields_zero_confidence_for_all() {
        let items = vec![
            item("สายไฟ THW 2.5 mm2", 100.0, "m"),
            item("conduit EMT 1/2\"", 20.0, "m"),
        ];

        let matched = match_items(&items, &[]);
        assert_eq!(matched.len(), items.len());
        for m in &matched {
            assert_eq!(m.matched_unit_price, None);
            assert_eq!(m.match_confidence, 0.0);
            assert_eq!(m.matched_code, None);
        }
    }

    #[test]
    fn one_output_per_input_with_mixed_hits() {
        let catalog = vec![entry("C-1", "cable THW", 10.0)];
        let items = vec![
            item("cable THW 2.5", 1.0, "m"),
            item("unobtainium rod", 2.0, "ea"),
        ];

        let matched = match_items(&items, &catalog);
        assert_eq!(matched.len(), 2);
        assert_eq!(matched[0].match_confidence, MATCH_CONFIDENCE);
        assert_eq!(matched[1].match_confidence, 0.0);
    }

    #[test]
    fn first_catalog_entry_wins_ties() {
        let catalog = vec![
            entry("A", "cable THW red", 1.0),
            entry("B", "cable THW blue", 2.0),
        ];
        let items = vec![item("cable THW", 1.0, "m")];

        let matched = match_items(&items, &catalog);
        assert_eq!(matched[0].matched_code.as_deref(), Some("A"));
        assert_eq!(matched[0].matched_unit_price, Some(1.0));
    }

    #[test]
    fn matching_is_case_insensitive() {
        let catalog = vec![entry("C-1", "Cable THW 2.5 MM2", 5.0)];
        let items = vec![item("CABLE thw", 1.0, "m")];

        let matched = match_items(&items, &catalog);
        assert_eq!(matched[0].match_confidence, MATCH_CONFIDENCE);
    }

    #[test]
    fn blank_catalog_code_maps_to_none() {
        let catalog = vec![entry("", "cable THW", 5.0)];
        let items = vec![item("cable THW", 1.0, "m")];

        let matched = match_items(&items, &catalog);
        assert_eq!(matched[0].matched_code, None);
        assert_eq!(matched[0].matched_unit_price, Some(5.0));
    }

    #[test]
    fn entries_with_empty_descriptions_never_match() {
        let catalog = vec![entry("X", "", 99.0)];
        let items = vec![item("cable THW", 1.0, "m")];

        let matched = match_items(&items, &catalog);
        assert_eq!(matched[0].match_confidence, 0.0);
    }
}
