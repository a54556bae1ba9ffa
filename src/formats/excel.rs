//! Excel (SpreadsheetML) parsing
//!
//! Cell values are kept as display strings: shared and inline strings are
//! resolved, booleans become `TRUE`/`FALSE`, everything else is the raw
//! stored value. Empty cells are not kept.

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::warn;

use super::ooxml::{attr_value, relationship_id, OoxmlPackage};
use crate::document::{Cell, DocumentResult, Row, Sheet, WorkbookContent};

const WORKBOOK_PART: &str = "xl/workbook.xml";
const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";

pub(crate) fn parse(data: Vec<u8>) -> DocumentResult<WorkbookContent> {
    let mut package = OoxmlPackage::open(data)?;
    let workbook = package.read_part(WORKBOOK_PART)?;
    let rels = package.relationships(WORKBOOK_PART)?;

    let shared = match package.read_optional_part(SHARED_STRINGS_PART)? {
        Some(xml) => parse_shared_strings(&xml)?,
        None => Vec::new(),
    };

    let mut sheets = Vec::new();
    for (index, (name, rel_id)) in sheet_entries(&workbook)?.into_iter().enumerate() {
        let part = rel_id
            .and_then(|id| rels.get(&id).cloned())
            .unwrap_or_else(|| format!("xl/worksheets/sheet{}.xml", index + 1));

        match package.read_optional_part(&part)? {
            Some(xml) => sheets.push(Sheet {
                name,
                rows: parse_rows(&xml, &shared)?,
            }),
            None => warn!("Workbook sheet '{}' points at missing part {}", name, part),
        }
    }

    Ok(WorkbookContent {
        sheets,
        metadata: package.metadata(),
    })
}

/// (sheet name, relationship id) in workbook order
fn sheet_entries(xml: &str) -> DocumentResult<Vec<(String, Option<String>)>> {
    let mut reader = Reader::from_str(xml);
    let mut entries = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheet" => {
                let name = attr_value(&e, b"name")
                    .unwrap_or_else(|| format!("Sheet{}", entries.len() + 1));
                entries.push((name, relationship_id(&e)));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(entries)
}

/// Shared string table; phonetic runs (`rPh`) are skipped
fn parse_shared_strings(xml: &str) -> DocumentResult<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut strings = Vec::new();
    let mut current = String::new();
    let mut in_text = false;
    let mut phonetic_depth = 0usize;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"si" => current.clear(),
                b"rPh" => phonetic_depth += 1,
                b"t" => in_text = phonetic_depth == 0,
                _ => {}
            },
            Event::Text(t) if in_text => current.push_str(&t.unescape()?),
            Event::End(e) => match e.local_name().as_ref() {
                b"si" => strings.push(std::mem::take(&mut current)),
                b"rPh" => phonetic_depth = phonetic_depth.saturating_sub(1),
                b"t" => in_text = false,
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"si" => strings.push(String::new()),
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(strings)
}

#[derive(Default)]
struct PendingCell {
    reference: Option<String>,
    cell_type: Option<String>,
    value: String,
}

fn parse_rows(xml: &str, shared: &[String]) -> DocumentResult<Vec<Row>> {
    let mut reader = Reader::from_str(xml);
    let mut rows = Vec::new();
    let mut row: Option<Row> = None;
    let mut cell: Option<PendingCell> = None;
    let mut column = 0u32;
    let mut in_value = false;
    let mut in_inline = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"row" => {
                    let previous = rows.last().map(|r: &Row| r.number).unwrap_or(0);
                    let number = attr_value(&e, b"r")
                        .and_then(|r| r.parse().ok())
                        .unwrap_or(previous + 1);
                    row = Some(Row { number, cells: Vec::new() });
                    column = 0;
                }
                b"c" => {
                    column += 1;
                    cell = Some(PendingCell {
                        reference: attr_value(&e, b"r"),
                        cell_type: attr_value(&e, b"t"),
                        value: String::new(),
                    });
                }
                b"v" => in_value = true,
                b"is" => in_inline = true,
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"c" => column += 1,
            Event::Text(t) if in_value || in_inline => {
                if let Some(pending) = cell.as_mut() {
                    pending.value.push_str(&t.unescape()?);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"v" => in_value = false,
                b"is" => in_inline = false,
                b"c" => {
                    if let (Some(pending), Some(current)) = (cell.take(), row.as_mut()) {
                        let reference = pending
                            .reference
                            .clone()
                            .unwrap_or_else(|| format!("{}{}", column_name(column), current.number));
                        let value = resolve_value(pending, shared);
                        if !value.is_empty() {
                            current.cells.push(Cell { reference, value });
                        }
                    }
                }
                b"row" => {
                    if let Some(finished) = row.take() {
                        if !finished.cells.is_empty() {
                            rows.push(finished);
                        }
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(rows)
}

fn resolve_value(cell: PendingCell, shared: &[String]) -> String {
    let raw = cell.value.trim();
    match cell.cell_type.as_deref() {
        Some("s") => raw
            .parse::<usize>()
            .ok()
            .and_then(|index| shared.get(index).cloned())
            .unwrap_or_default(),
        Some("b") => match raw {
            "1" => "TRUE".to_string(),
            "0" => "FALSE".to_string(),
            other => other.to_string(),
        },
        Some("inlineStr") | Some("str") => cell.value,
        _ => raw.to_string(),
    }
}

/// 1-based column index to letters (1 -> A, 27 -> AA)
fn column_name(mut index: u32) -> String {
    let mut letters = Vec::new();
    while index > 0 {
        let rem = (index - 1) % 26;
        letters.push(char::from(b'A' + rem as u8));
        index = (index - 1) / 26;
    }
    letters.iter().rev().collect()
}
