//! Line-item parser
//!
//! Turns plain extracted text into typed candidate line items. Precision over
//! recall: a line that matches no pattern is skipped silently, because a false
//! line item corrupts pricing downstream while a missing one stays visible as
//! an omission during human review. When *nothing* matches, the parser
//! abstains and hands back the raw text instead of an empty result.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::{LineItem, ParseOutcome, RawTextRecord};

/// Upper bound on the raw-text fallback payload.
pub const RAW_TEXT_PREFIX_LIMIT: usize = 20_000;

// Numbered-list row: `1. <description> <qty> <unit>`. Checked before the coded
// pattern so an ordinal is never captured as an item code.
static ORDINAL_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\d+\.\s+(.+?)\s+(\d+(?:[.,]\d+)?)\s+([A-Za-zก-๙/%"\.]+)$"#).unwrap()
});

// No-space variant: `1.<description> ...`. The character after the dot must
// not be a digit, so a decimal quantity like "2.5" never reads as an ordinal.
static ORDINAL_TIGHT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\d+\.([^\d\s].*?)\s+(\d+(?:[.,]\d+)?)\s+([A-Za-zก-๙/%"\.]+)$"#).unwrap()
});

// Coded row: `EL-001 <description> <qty> <unit>`. The code is one token of
// alphanumerics/hyphen/dot/slash; the unit class covers Thai script, percent
// and inch marks as seen on electrical drawings.
static CODED_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^([A-Za-z0-9\-\._/]+)\s+(.+?)\s+(\d+(?:[.,]\d+)?)\s+([A-Za-zก-๙/%"\.]+)$"#)
        .unwrap()
});

// Last resort: any line ending in `<qty> <unit>`; everything before becomes
// the description.
static TRAILING_QTY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(.+?)\s+(\d+(?:[.,]\d+)?)\s+([A-Za-zก-๙/%"\.]+)$"#).unwrap()
});

/// Parse one document's text. Returns the extracted items, or a single
/// [`RawTextRecord`] when no line matched any pattern (abstention, not
/// emptiness).
pub fn parse(text: &str) -> ParseOutcome {
    let mut items = Vec::new();

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(item) = parse_line(line) {
            items.push(item);
        }
    }

    if items.is_empty() {
        let full_text = bounded_prefix(text, RAW_TEXT_PREFIX_LIMIT);
        tracing::debug!("No line matched any structural pattern, abstaining with raw text");
        return ParseOutcome::Raw {
            record: RawTextRecord { full_text },
        };
    }

    tracing::debug!(count = items.len(), "Parsed line items");
    ParseOutcome::Items { items }
}

/// First matching pattern wins; numeric failure is a hard skip of the line.
fn parse_line(line: &str) -> Option<LineItem> {
    if let Some(caps) = ORDINAL_LINE.captures(line) {
        return build_item(None, &caps[1], &caps[2], &caps[3]);
    }

    if let Some(caps) = ORDINAL_TIGHT.captures(line) {
        return build_item(None, &caps[1], &caps[2], &caps[3]);
    }

    if let Some(caps) = CODED_LINE.captures(line) {
        return build_item(Some(caps[1].to_string()), &caps[2], &caps[3], &caps[4]);
    }

    // Not anchored at the start: scan for a trailing qty/unit pair.
    if let Some(caps) = TRAILING_QTY.captures(line) {
        return build_item(None, &caps[1], &caps[2], &caps[3]);
    }

    None
}

fn build_item(item_code: Option<String>, desc: &str, qty: &str, unit: &str) -> Option<LineItem> {
    let description = desc.trim().to_string();
    if description.is_empty() {
        return None;
    }

    let quantity = parse_quantity(qty)?;

    Some(LineItem {
        item_code,
        description,
        quantity,
        unit: unit.to_string(),
    })
}

/// Locale-tolerant quantity parsing: a decimal comma is normalized to a dot.
/// Quantities must be strictly positive.
pub fn parse_quantity(raw: &str) -> Option<f64> {
    raw.replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|q| q.is_finite() && *q > 0.0)
}

/// Char-boundary-safe prefix of at most `limit` bytes.
pub fn bounded_prefix(text: &str, limit: usize) -> String {
    if text.len() <= limit {
        return text.to_string();
    }
    // Cut on a char boundary at or below the limit
    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn items(text: &str) -> Vec<LineItem> {
        match parse(text) {
            ParseOutcome::Items { items } => items,
            ParseOutcome::Raw { .. } => panic!("expected items, got abstention"),
        }
    }

    #[test]
    fn coded_line_with_thai_description() {
        let got = items("EL-001 สายไฟ THW 2.5 mm2 100 m");
        assert_eq!(
            got,
            vec![LineItem {
                item_code: Some("EL-001".to_string()),
                description: "สายไฟ THW 2.5 mm2".to_string(),
                quantity: 100.0,
                unit: "m".to_string(),
            }]
        );
    }

    #[test]
    fn ordinal_line_captures_no_code() {
        let got = items("3. โคมไฟ LED 18W 10 ea");
        assert_eq!(got[0].item_code, None);
        assert_eq!(got[0].description, "โคมไฟ LED 18W");
        assert_eq!(got[0].quantity, 10.0);
        assert_eq!(got[0].unit, "ea");
    }

    #[test]
    fn ordinal_without_space_still_strips_the_marker() {
        let got = items("1.สายไฟ THW 100 m");
        assert_eq!(got[0].item_code, None);
        assert_eq!(got[0].description, "สายไฟ THW");
        assert_eq!(got[0].quantity, 100.0);
    }

    #[test]
    fn decimal_leading_token_is_not_an_ordinal() {
        let got = items("2.5 sq-mm cable 10 m");
        // "2.5" survives as a code token instead of being eaten as "2."
        assert_eq!(got[0].item_code.as_deref(), Some("2.5"));
        assert_eq!(got[0].description, "sq-mm cable");
        assert_eq!(got[0].quantity, 10.0);
    }

    #[test]
    fn decimal_comma_quantity_is_normalized() {
        let got = items("EL-002 conduit EMT 100,5 m");
        assert_eq!(got[0].quantity, 100.5);
    }

    #[test]
    fn trailing_qty_fallback_without_code() {
        let got = items("สายไฟ THW 2.5 mm2 100 m");
        assert_eq!(got[0].item_code, None);
        assert_eq!(got[0].description, "สายไฟ THW 2.5 mm2");
        assert_eq!(got[0].quantity, 100.0);
        assert_eq!(got[0].unit, "m");
    }

    #[test]
    fn unmatched_lines_are_skipped_not_fatal() {
        let text = "GENERAL NOTES\nEL-001 cable THW 100 m\nSEE SHEET E-201";
        let got = items(text);
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].item_code.as_deref(), Some("EL-001"));
    }

    #[test]
    fn zero_quantity_line_is_dropped() {
        let text = "EL-001 cable THW 0 m\nEL-002 conduit EMT 20 m";
        let got = items(text);
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].item_code.as_deref(), Some("EL-002"));
    }

    #[test]
    fn abstention_returns_single_raw_record() {
        let text = "TITLE BLOCK\nREVISION HISTORY\nAPPROVED BY";
        match parse(text) {
            ParseOutcome::Raw { record } => assert_eq!(record.full_text, text),
            ParseOutcome::Items { .. } => panic!("expected abstention"),
        }
    }

    #[test]
    fn abstention_text_is_bounded() {
        let text = "x".repeat(RAW_TEXT_PREFIX_LIMIT * 2);
        match parse(&text) {
            ParseOutcome::Raw { record } => {
                assert_eq!(record.full_text.len(), RAW_TEXT_PREFIX_LIMIT)
            }
            ParseOutcome::Items { .. } => panic!("expected abstention"),
        }
    }

    #[test]
    fn quantity_parser_rejects_garbage() {
        assert_eq!(parse_quantity("100,5"), Some(100.5));
        assert_eq!(parse_quantity("12.25"), Some(12.25));
        assert_eq!(parse_quantity("0"), None);
        assert_eq!(parse_quantity("abc"), None);
    }
}
