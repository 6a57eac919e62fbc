//! Minimal reader for the first worksheet of an `.xlsx` workbook.
//!
//! Only cell values are read: shared strings, inline strings, booleans and
//! numbers. Styles, formulas and additional sheets are ignored.

use crate::utils::error::{Result, SendError};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::{Cursor, Read};
use zip::ZipArchive;

const SHARED_STRINGS: &str = "xl/sharedStrings.xml";
const WORKSHEET_PREFIX: &str = "xl/worksheets/";
const FIRST_WORKSHEET: &str = "xl/worksheets/sheet1.xml";

/// Zero-based index of column `XFD`, the last one a worksheet may use.
pub const MAX_COLUMN: usize = 16_383;

/// One row of a sheet with its 1-based row number in the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRow {
    pub number: usize,
    pub cells: Vec<String>,
}

pub fn read_first_sheet(bytes: &[u8]) -> Result<Vec<SheetRow>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;

    let shared = match read_entry(&mut archive, SHARED_STRINGS)? {
        Some(xml) => parse_shared_strings(&xml)?,
        None => Vec::new(),
    };

    let sheet = first_worksheet(&archive).ok_or_else(|| SendError::SpreadsheetError {
        message: "workbook contains no worksheets".to_string(),
    })?;
    tracing::debug!("Reading worksheet {} ({} shared strings)", sheet, shared.len());

    let xml = read_entry(&mut archive, &sheet)?.ok_or_else(|| SendError::SpreadsheetError {
        message: format!("worksheet {} is missing", sheet),
    })?;
    parse_sheet(&xml, &shared)
}

fn read_entry(archive: &mut ZipArchive<Cursor<&[u8]>>, name: &str) -> Result<Option<String>> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut xml = String::new();
    file.read_to_string(&mut xml)?;
    Ok(Some(xml))
}

fn first_worksheet(archive: &ZipArchive<Cursor<&[u8]>>) -> Option<String> {
    let mut sheets: Vec<&str> = archive
        .file_names()
        .filter(|name| {
            name.starts_with(WORKSHEET_PREFIX)
                && name.ends_with(".xml")
                && !name[WORKSHEET_PREFIX.len()..].contains('/')
        })
        .collect();

    if sheets.contains(&FIRST_WORKSHEET) {
        return Some(FIRST_WORKSHEET.to_string());
    }

    // sheet2.xml before sheet10.xml
    sheets.sort_by(|a, b| a.len().cmp(&b.len()).then(a.cmp(b)));
    sheets.first().map(|name| name.to_string())
}

fn xml_error(e: impl std::fmt::Display) -> SendError {
    SendError::SpreadsheetError {
        message: e.to_string(),
    }
}

fn parse_shared_strings(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut strings = Vec::new();
    let mut current: Option<String> = None;
    let mut in_text = false;
    let mut in_phonetic = false;

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"si" => current = Some(String::new()),
                b"t" => in_text = true,
                b"rPh" => in_phonetic = true,
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"si" => strings.push(String::new()),
            Event::Text(t) if in_text && !in_phonetic => {
                if let Some(current) = current.as_mut() {
                    current.push_str(&t.unescape().map_err(xml_error)?);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"rPh" => in_phonetic = false,
                b"si" => {
                    if let Some(value) = current.take() {
                        strings.push(value);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(strings)
}

struct CellStart {
    column: usize,
    kind: String,
}

fn parse_sheet(xml: &str, shared: &[String]) -> Result<Vec<SheetRow>> {
    let mut reader = Reader::from_str(xml);
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut row_number = 0;
    let mut cell: Option<CellStart> = None;
    let mut value = String::new();
    let mut in_value = false;
    let mut next_column = 0;

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"row" => {
                    row = Vec::new();
                    row_number = row_reference(&e)?.unwrap_or(row_number + 1);
                    next_column = 0;
                }
                b"c" => {
                    let start = cell_start(&e, next_column)?;
                    next_column = start.column + 1;
                    cell = Some(start);
                    value.clear();
                }
                b"v" | b"t" => in_value = cell.is_some(),
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"row" => row_number = row_reference(&e)?.unwrap_or(row_number + 1),
                b"c" => next_column = cell_start(&e, next_column)?.column + 1,
                _ => {}
            },
            Event::Text(t) if in_value => value.push_str(&t.unescape().map_err(xml_error)?),
            Event::End(e) => match e.local_name().as_ref() {
                b"v" | b"t" => in_value = false,
                b"c" => {
                    if let Some(start) = cell.take() {
                        let text = resolve_value(&start.kind, &value, shared)?;
                        if row.len() <= start.column {
                            row.resize(start.column + 1, String::new());
                        }
                        row[start.column] = text;
                    }
                }
                b"row" => rows.push(SheetRow {
                    number: row_number,
                    cells: std::mem::take(&mut row),
                }),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(rows)
}

fn row_reference(e: &BytesStart) -> Result<Option<usize>> {
    for attr in e.attributes() {
        let attr = attr.map_err(xml_error)?;
        if attr.key.as_ref() == b"r" {
            let value = attr.unescape_value().map_err(xml_error)?;
            return Ok(value.trim().parse().ok());
        }
    }
    Ok(None)
}

fn cell_start(e: &BytesStart, fallback_column: usize) -> Result<CellStart> {
    let mut column = fallback_column;
    let mut kind = String::new();

    for attr in e.attributes() {
        let attr = attr.map_err(xml_error)?;
        let value = attr.unescape_value().map_err(xml_error)?;
        match attr.key.as_ref() {
            b"r" => column = column_index(&value)?.unwrap_or(fallback_column),
            b"t" => kind = value.into_owned(),
            _ => {}
        }
    }

    if column > MAX_COLUMN {
        return Err(SendError::SpreadsheetError {
            message: format!("row has more than {} columns", MAX_COLUMN + 1),
        });
    }
    Ok(CellStart { column, kind })
}

/// `"A1"` -> 0, `"B7"` -> 1, `"AA3"` -> 26. `None` when the reference has no
/// column letters; an error past column `XFD`.
fn column_index(reference: &str) -> Result<Option<usize>> {
    let mut index: Option<usize> = None;
    for b in reference.bytes().take_while(u8::is_ascii_alphabetic) {
        let digit = (b.to_ascii_uppercase() - b'A') as usize + 1;
        let next = index.unwrap_or(0) * 26 + digit;
        if next > MAX_COLUMN + 1 {
            return Err(SendError::SpreadsheetError {
                message: format!("cell reference '{}' is beyond column XFD", reference),
            });
        }
        index = Some(next);
    }
    Ok(index.map(|i| i - 1))
}

fn resolve_value(kind: &str, raw: &str, shared: &[String]) -> Result<String> {
    match kind {
        "s" => {
            let index: usize = raw.trim().parse().map_err(|_| SendError::SpreadsheetError {
                message: format!("invalid shared string index '{}'", raw),
            })?;
            shared
                .get(index)
                .cloned()
                .ok_or_else(|| SendError::SpreadsheetError {
                    message: format!("shared string index {} out of range", index),
                })
        }
        "b" => Ok(if raw.trim() == "1" { "TRUE" } else { "FALSE" }.to_string()),
        "" | "n" => Ok(format_number(raw)),
        _ => Ok(raw.to_string()),
    }
}

/// Phone numbers typed as numbers come back as `911234567890` or
/// `9.1123456789E+11`; both render as plain integers.
fn format_number(raw: &str) -> String {
    match raw.trim().parse::<f64>() {
        Ok(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e16 => format!("{}", n as i64),
        _ => raw.to_string(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::{FileOptions, ZipWriter};

    pub(crate) fn build_workbook(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in entries {
            zip.start_file::<_, ()>(*name, FileOptions::default()).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    pub(crate) const SHARED: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="6" uniqueCount="6">
<si><t>Name</t></si><si><t>Phone</t></si><si><t>Message</t></si>
<si><t>John</t></si><si><r><t>Hi </t></r><r><t>{name} &amp; co</t></r></si><si><t>Jane</t></si>
</sst>"#;

    pub(crate) const SHEET: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>
<row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c><c r="C1" t="s"><v>2</v></c></row>
<row r="2"><c r="A2" t="s"><v>3</v></c><c r="B2"><v>911234567890</v></c><c r="C2" t="s"><v>4</v></c></row>
<row r="3"><c r="A3" t="s"><v>5</v></c><c r="B3"><v>9.11234567891E+11</v></c><c r="C3" t="inlineStr"><is><t>Hey {name}</t></is></c></row>
</sheetData></worksheet>"#;

    #[test]
    fn test_reads_shared_inline_and_numeric_cells() {
        let bytes = build_workbook(&[(SHARED_STRINGS, SHARED), (FIRST_WORKSHEET, SHEET)]);
        let rows = read_first_sheet(&bytes).unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].cells, vec!["Name", "Phone", "Message"]);
        assert_eq!(rows[1].cells, vec!["John", "911234567890", "Hi {name} & co"]);
        assert_eq!(rows[2].cells, vec!["Jane", "911234567891", "Hey {name}"]);
        let numbers: Vec<usize> = rows.iter().map(|r| r.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[test]
    fn test_sparse_cells_keep_their_columns() {
        let sheet = r#"<worksheet><sheetData>
<row r="1"><c r="A1" t="inlineStr"><is><t>a</t></is></c><c r="C1" t="inlineStr"><is><t>c</t></is></c></row>
</sheetData></worksheet>"#;
        let bytes = build_workbook(&[(FIRST_WORKSHEET, sheet)]);
        let rows = read_first_sheet(&bytes).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].cells, vec!["a".to_string(), String::new(), "c".to_string()]);
    }

    #[test]
    fn test_row_numbers_follow_the_sheet() {
        let sheet = r#"<worksheet><sheetData>
<row r="1"><c t="inlineStr"><is><t>a</t></is></c></row>
<row r="4"><c t="inlineStr"><is><t>b</t></is></c></row>
<row><c t="inlineStr"><is><t>c</t></is></c></row>
</sheetData></worksheet>"#;
        let bytes = build_workbook(&[(FIRST_WORKSHEET, sheet)]);
        let numbers: Vec<usize> = read_first_sheet(&bytes)
            .unwrap()
            .iter()
            .map(|r| r.number)
            .collect();
        assert_eq!(numbers, vec![1, 4, 5]);
    }

    #[test]
    fn test_oversized_cell_reference_is_rejected() {
        for reference in ["ZZZZZZZZZZZZZZ1", "AAAAAAA1", "XFE1"] {
            let sheet = format!(
                r#"<worksheet><sheetData><row r="1"><c r="{}" t="inlineStr"><is><t>x</t></is></c></row></sheetData></worksheet>"#,
                reference
            );
            let bytes = build_workbook(&[(FIRST_WORKSHEET, sheet.as_str())]);
            let err = read_first_sheet(&bytes).unwrap_err();
            assert!(matches!(err, SendError::SpreadsheetError { .. }), "{reference}");
        }
    }

    #[test]
    fn test_workbook_without_sheets_is_rejected() {
        let bytes = build_workbook(&[("docProps/app.xml", "<Properties/>")]);
        let err = read_first_sheet(&bytes).unwrap_err();
        assert!(matches!(err, SendError::SpreadsheetError { .. }));
    }

    #[test]
    fn test_non_zip_bytes_are_a_zip_error() {
        let err = read_first_sheet(b"Name,Phone,Message\n").unwrap_err();
        assert!(matches!(err, SendError::ZipError(_)));
    }

    #[test]
    fn test_column_index() {
        assert_eq!(column_index("A1").unwrap(), Some(0));
        assert_eq!(column_index("b7").unwrap(), Some(1));
        assert_eq!(column_index("AA3").unwrap(), Some(26));
        assert_eq!(column_index("XFD1048576").unwrap(), Some(MAX_COLUMN));
        assert_eq!(column_index("12").unwrap(), None);
        assert!(column_index("XFE1").is_err());
    }
}
