use crate::core::xlsx::{self, SheetRow};
use crate::domain::model::Contact;
use crate::utils::error::{Result, SendError};
use crate::utils::phone::normalize_phone;
use std::path::Path;

pub const NAME_COLUMN: &str = "name";
pub const PHONE_COLUMN: &str = "phone";
pub const MESSAGE_COLUMN: &str = "message";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    Tsv,
    Xlsx,
}

impl InputFormat {
    pub fn from_path(path: &str) -> Result<Self> {
        let extension = Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "csv" => Ok(InputFormat::Csv),
            "tsv" | "tab" => Ok(InputFormat::Tsv),
            "xlsx" => Ok(InputFormat::Xlsx),
            _ => Err(SendError::UnsupportedFormat { extension }),
        }
    }
}

/// Header row plus data rows, before any schema checks. Each data row is
/// numbered from 1 at the line after the header, blank rows included.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<SheetRow>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ContactLoader;

impl ContactLoader {
    pub fn new() -> Self {
        Self
    }

    pub fn load(&self, format: InputFormat, bytes: &[u8]) -> Result<Vec<Contact>> {
        let table = match format {
            InputFormat::Csv => read_delimited(bytes, b',')?,
            InputFormat::Tsv => read_delimited(bytes, b'\t')?,
            InputFormat::Xlsx => table_from_rows(xlsx::read_first_sheet(bytes)?),
        };
        tracing::debug!(
            "Parsed {:?} table: {} columns, {} rows",
            format,
            table.headers.len(),
            table.rows.len()
        );
        self.contacts_from_table(table)
    }

    /// Maps headers case-insensitively onto `name`, `phone` and `message`,
    /// then builds one contact per row. Every empty phone or message cell is
    /// reported together so the file can be fixed in one pass.
    pub fn contacts_from_table(&self, table: Table) -> Result<Vec<Contact>> {
        let column_of = |wanted: &str| {
            table
                .headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(wanted))
        };

        let name_idx = column_of(NAME_COLUMN);
        let (phone_idx, message_idx) = match (column_of(PHONE_COLUMN), column_of(MESSAGE_COLUMN)) {
            (Some(phone), Some(message)) => (phone, message),
            (phone, message) => {
                let mut columns = Vec::new();
                if phone.is_none() {
                    columns.push(PHONE_COLUMN.to_string());
                }
                if message.is_none() {
                    columns.push(MESSAGE_COLUMN.to_string());
                }
                return Err(SendError::MissingColumns { columns });
            }
        };

        let cell = |row: &[String], idx: usize| {
            row.get(idx).map(|v| v.trim()).unwrap_or("").to_string()
        };

        let mut contacts = Vec::with_capacity(table.rows.len());
        let mut problems = Vec::new();

        for SheetRow { number, cells } in &table.rows {
            let raw_phone = cell(cells, phone_idx);
            let message = cell(cells, message_idx);

            if raw_phone.is_empty() {
                problems.push(format!("row {}: missing {}", number, PHONE_COLUMN));
            }
            if message.is_empty() {
                problems.push(format!("row {}: missing {}", number, MESSAGE_COLUMN));
            }
            if raw_phone.is_empty() || message.is_empty() {
                continue;
            }

            contacts.push(Contact {
                row: *number,
                name: name_idx.map(|idx| cell(cells, idx)).unwrap_or_default(),
                phone: normalize_phone(&raw_phone),
                raw_phone,
                message,
            });
        }

        if !problems.is_empty() {
            return Err(SendError::ValidationError {
                message: problems.join("; "),
            });
        }

        Ok(contacts)
    }
}

fn read_delimited(bytes: &[u8], delimiter: u8) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .from_reader(bytes);

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        let number = record
            .position()
            .map(|pos| pos.line() as usize)
            .unwrap_or(i + 1);
        rows.push(SheetRow {
            number,
            cells: record.iter().map(|v| v.to_string()).collect(),
        });
    }

    Ok(table_from_rows(rows))
}

/// First non-blank row is the header; data rows are renumbered relative to it.
fn table_from_rows(rows: Vec<SheetRow>) -> Table {
    let mut rows = rows.into_iter().filter(|row| !is_blank(&row.cells));
    let Some(header) = rows.next() else {
        return Table::default();
    };
    let rows = rows
        .map(|row| SheetRow {
            number: row.number.saturating_sub(header.number),
            cells: row.cells,
        })
        .collect();

    Table {
        headers: header.cells,
        rows,
    }
}

fn is_blank(row: &[String]) -> bool {
    row.iter().all(|v| v.trim().is_empty())
}
