//! BOQ workbook export
//!
//! Serializes the four report tables into an in-memory `.xlsx`: a zip
//! container holding hand-written OOXML parts, with strings inlined per cell
//! so no shared-string table is needed. Sheet order is part of the contract —
//! downstream consumers address sheets by position.

use std::io::{Cursor, Write};

use anyhow::{Context, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::domain::BoqTables;

/// Sheet names, in the canonical order: combined master table, material-only,
/// labor-only, purchase order.
pub const SHEET_NAMES: [&str; 4] = ["Combined", "Material", "Labor", "PO"];

const XMLNS_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const XMLNS_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

enum Cell {
    Text(String),
    Number(f64),
}

impl Cell {
    fn text(s: &str) -> Self {
        Cell::Text(s.to_string())
    }

    fn opt(s: &Option<String>) -> Self {
        Cell::Text(s.clone().unwrap_or_default())
    }
}

/// Render the four-sheet workbook. An empty BOQ is a valid, exportable state:
/// header rows are always present, the PO sheet always has its one row.
pub fn write_workbook(tables: &BoqTables) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options =
        SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let sheets: [Vec<Vec<Cell>>; 4] = [
        combined_rows(tables),
        material_rows(tables),
        labor_rows(tables),
        purchase_order_rows(tables),
    ];

    zip.start_file("[Content_Types].xml", options)?;
    zip.write_all(content_types().as_bytes())?;

    zip.start_file("_rels/.rels", options)?;
    zip.write_all(ROOT_RELS.as_bytes())?;

    zip.start_file("xl/workbook.xml", options)?;
    zip.write_all(workbook_xml().as_bytes())?;

    zip.start_file("xl/_rels/workbook.xml.rels", options)?;
    zip.write_all(workbook_rels().as_bytes())?;

    zip.start_file("xl/styles.xml", options)?;
    zip.write_all(STYLES.as_bytes())?;

    for (idx, rows) in sheets.iter().enumerate() {
        zip.start_file(format!("xl/worksheets/sheet{}.xml", idx + 1), options)?;
        zip.write_all(&worksheet_xml(rows)?)?;
    }

    let cursor = zip.finish().context("Failed to finalize workbook zip")?;
    Ok(cursor.into_inner())
}

fn combined_rows(tables: &BoqTables) -> Vec<Vec<Cell>> {
    let mut rows = vec![header(&[
        "item_code",
        "description",
        "qty",
        "unit",
        "matched_code",
        "match_confidence",
        "unit_price",
        "material_cost",
        "labor_cost",
        "total_cost",
    ])];
    for c in &tables.total {
        rows.push(vec![
            Cell::opt(&c.matched.item.item_code),
            Cell::text(&c.matched.item.description),
            Cell::Number(c.matched.item.quantity),
            Cell::text(&c.matched.item.unit),
            Cell::opt(&c.matched.matched_code),
            Cell::Number(c.matched.match_confidence),
            Cell::Number(c.matched.matched_unit_price.unwrap_or(0.0)),
            Cell::Number(c.material_cost),
            Cell::Number(c.labor_cost),
            Cell::Number(c.total_cost),
        ]);
    }
    rows
}

fn material_rows(tables: &BoqTables) -> Vec<Vec<Cell>> {
    let mut rows = vec![header(&[
        "item_code",
        "description",
        "qty",
        "unit",
        "unit_price",
        "material_cost",
    ])];
    for m in &tables.material {
        rows.push(vec![
            Cell::opt(&m.item_code),
            Cell::text(&m.description),
            Cell::Number(m.quantity),
            Cell::text(&m.unit),
            Cell::Number(m.unit_price),
            Cell::Number(m.material_cost),
        ]);
    }
    rows
}

fn labor_rows(tables: &BoqTables) -> Vec<Vec<Cell>> {
    let mut rows = vec![header(&["item_code", "description", "qty", "unit", "labor_cost"])];
    for l in &tables.labor {
        rows.push(vec![
            Cell::opt(&l.item_code),
            Cell::text(&l.description),
            Cell::Number(l.quantity),
            Cell::text(&l.unit),
            Cell::Number(l.labor_cost),
        ]);
    }
    rows
}

fn purchase_order_rows(tables: &BoqTables) -> Vec<Vec<Cell>> {
    let mut rows = vec![header(&["supplier", "amount"])];
    for po in &tables.purchase_order {
        rows.push(vec![Cell::text(&po.supplier), Cell::Number(po.amount)]);
    }
    rows
}

fn header(names: &[&str]) -> Vec<Cell> {
    names.iter().map(|n| Cell::text(n)).collect()
}

fn worksheet_xml(rows: &[Vec<Cell>]) -> Result<Vec<u8>> {
    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;

    let mut worksheet = BytesStart::new("worksheet");
    worksheet.push_attribute(("xmlns", XMLNS_MAIN));
    writer.write_event(Event::Start(worksheet))?;
    writer.write_event(Event::Start(BytesStart::new("sheetData")))?;

    for (row_idx, cells) in rows.iter().enumerate() {
        let row_ref = (row_idx + 1).to_string();
        let mut row = BytesStart::new("row");
        row.push_attribute(("r", row_ref.as_str()));
        writer.write_event(Event::Start(row))?;

        for (col_idx, cell) in cells.iter().enumerate() {
            let cell_ref = format!("{}{}", column_letters(col_idx), row_idx + 1);
            let mut c = BytesStart::new("c");
            c.push_attribute(("r", cell_ref.as_str()));

            match cell {
                Cell::Text(s) => {
                    c.push_attribute(("t", "inlineStr"));
                    writer.write_event(Event::Start(c))?;
                    writer.write_event(Event::Start(BytesStart::new("is")))?;
                    writer.write_event(Event::Start(BytesStart::new("t")))?;
                    writer.write_event(Event::Text(BytesText::new(s)))?;
                    writer.write_event(Event::End(BytesEnd::new("t")))?;
                    writer.write_event(Event::End(BytesEnd::new("is")))?;
                    writer.write_event(Event::End(BytesEnd::new("c")))?;
                }
                Cell::Number(n) => {
                    writer.write_event(Event::Start(c))?;
                    writer.write_event(Event::Start(BytesStart::new("v")))?;
                    writer.write_event(Event::Text(BytesText::new(&n.to_string())))?;
                    writer.write_event(Event::End(BytesEnd::new("v")))?;
                    writer.write_event(Event::End(BytesEnd::new("c")))?;
                }
            }
        }

        writer.write_event(Event::End(BytesEnd::new("row")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("sheetData")))?;
    writer.write_event(Event::End(BytesEnd::new("worksheet")))?;
    Ok(writer.into_inner())
}

/// 0-based column index to spreadsheet letters (0 -> A, 26 -> AA).
fn column_letters(mut idx: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (idx % 26) as u8);
        if idx < 26 {
            break;
        }
        idx = idx / 26 - 1;
    }
    letters.reverse();
    String::from_utf8(letters).expect("ASCII letters")
}

fn content_types() -> String {
    let mut overrides = String::new();
    for i in 1..=SHEET_NAMES.len() {
        overrides.push_str(&format!(
            r#"<Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
            i
        ));
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>{}</Types>"#,
        overrides
    )
}

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><fonts count="1"><font><sz val="11"/><name val="Calibri"/></font></fonts><fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills><borders count="1"><border/></borders><cellStyleXfs count="1"><xf/></cellStyleXfs><cellXfs count="1"><xf xfId="0"/></cellXfs></styleSheet>"#;

fn workbook_xml() -> String {
    let mut sheets = String::new();
    for (i, name) in SHEET_NAMES.iter().enumerate() {
        sheets.push_str(&format!(
            r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
            name,
            i + 1,
            i + 1
        ));
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="{}" xmlns:r="{}"><sheets>{}</sheets></workbook>"#,
        XMLNS_MAIN, XMLNS_REL, sheets
    )
}

fn workbook_rels() -> String {
    let mut rels = String::new();
    for i in 1..=SHEET_NAMES.len() {
        rels.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{}.xml"/>"#,
            i, i
        ));
    }
    rels.push_str(&format!(
        r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
        SHEET_NAMES.len() + 1
    ));
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{}</Relationships>"#,
        rels
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LineItem, MatchedLineItem};
    use crate::services::costing;
    use std::io::Read;

    fn sample_tables() -> BoqTables {
        let matched = vec![MatchedLineItem {
            item: LineItem {
                item_code: Some("EL-001".to_string()),
                description: "สายไฟ THW 2.5 mm2".to_string(),
                quantity: 100.0,
                unit: "m".to_string(),
            },
            matched_code: Some("EL-001".to_string()),
            matched_unit_price: Some(12.5),
            match_confidence: 0.75,
        }];
        costing::aggregate(&matched, costing::DEFAULT_LABOR_RATE)
    }

    fn read_part(bytes: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
        let mut part = archive.by_name(name).unwrap();
        let mut content = String::new();
        part.read_to_string(&mut content).unwrap();
        content
    }

    #[test]
    fn workbook_contains_four_sheets_in_order() {
        let bytes = write_workbook(&sample_tables()).unwrap();

        let workbook = read_part(&bytes, "xl/workbook.xml");
        let positions: Vec<usize> = SHEET_NAMES
            .iter()
            .map(|name| workbook.find(&format!(r#"name="{}""#, name)).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "sheet order is fixed");

        for i in 1..=4 {
            read_part(&bytes, &format!("xl/worksheets/sheet{}.xml", i));
        }
    }

    #[test]
    fn combined_sheet_carries_costs_and_thai_text() {
        let bytes = write_workbook(&sample_tables()).unwrap();
        let sheet = read_part(&bytes, "xl/worksheets/sheet1.xml");

        assert!(sheet.contains("สายไฟ THW 2.5 mm2"));
        assert!(sheet.contains("<v>1250</v>"));
        assert!(sheet.contains("<v>125</v>"));
        assert!(sheet.contains("<v>1375</v>"));
    }

    #[test]
    fn po_sheet_has_placeholder_supplier_row() {
        let bytes = write_workbook(&sample_tables()).unwrap();
        let sheet = read_part(&bytes, "xl/worksheets/sheet4.xml");

        assert!(sheet.contains("TBD"));
        assert!(sheet.contains("<v>1375</v>"));
    }

    #[test]
    fn empty_boq_is_still_a_valid_workbook() {
        let tables = costing::aggregate(&[], costing::DEFAULT_LABOR_RATE);
        let bytes = write_workbook(&tables).unwrap();

        let po = read_part(&bytes, "xl/worksheets/sheet4.xml");
        assert!(po.contains("<v>0</v>"));

        // header-only sheets are present and well formed
        let combined = read_part(&bytes, "xl/worksheets/sheet1.xml");
        assert!(combined.contains("total_cost"));
    }

    #[test]
    fn column_letters_roll_over_past_z() {
        assert_eq!(column_letters(0), "A");
        assert_eq!(column_letters(9), "J");
        assert_eq!(column_letters(25), "Z");
        assert_eq!(column_letters(26), "AA");
    }
}
