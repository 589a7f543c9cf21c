//! Service catalog CSV import and export.
//!
//! Import locates columns by header substring (`name`/`service`,
//! `price`/`cost`, `category`/`type`) and reads RFC 4180 records: quoted
//! fields may contain commas, line breaks and doubled quotes.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{is_valid_price, Service, ServiceDraft, DEFAULT_CATEGORY};

/// Header line written by [`export_services_csv`].
pub const EXPORT_HEADER: &str = "Name,Price,Category";

/// CSV import errors. Any of these rejects the whole file.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CsvImportError {
    #[error("CSV must contain at least \"name\" and \"price\" columns")]
    MissingColumns,

    #[error("Unterminated quoted field starting on line {line}")]
    UnterminatedQuote { line: usize },
}

/// Rows accepted from an import, before ids are assigned.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ParsedServices {
    /// Accepted rows in file order
    pub drafts: Vec<ServiceDraft>,
    /// Rows with a missing name or an unusable price
    pub skipped_invalid: usize,
    /// Rows whose name already exists (case-insensitive)
    pub skipped_duplicate: usize,
}

/// Column positions resolved from the header row.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Columns {
    name: usize,
    price: usize,
    category: Option<usize>,
}

impl Columns {
    fn locate(header: &[String]) -> Result<Self, CsvImportError> {
        let headers: Vec<String> = header.iter().map(|h| h.trim().to_lowercase()).collect();
        let find = |keys: &[&str]| headers.iter().position(|h| keys.iter().any(|k| h.contains(k)));

        match (find(&["name", "service"]), find(&["price", "cost"])) {
            (Some(name), Some(price)) => Ok(Self {
                name,
                price,
                category: find(&["category", "type"]),
            }),
            _ => Err(CsvImportError::MissingColumns),
        }
    }
}

/// Parse an uploaded catalog file.
///
/// `existing_names` are the names already in the catalog; rows repeating one
/// of them, or an earlier row of the same file, are skipped.
pub fn parse_services_csv<'a, I>(text: &str, existing_names: I) -> Result<ParsedServices, CsvImportError>
where
    I: IntoIterator<Item = &'a str>,
{
    let records = parse_records(text)?;
    let mut records = records.into_iter();
    let header = records.next().ok_or(CsvImportError::MissingColumns)?;
    let columns = Columns::locate(&header)?;

    let mut seen: HashSet<String> = existing_names.into_iter().map(str::to_lowercase).collect();
    let mut parsed = ParsedServices::default();

    for record in records {
        if is_blank(&record) {
            continue;
        }
        if record.len() < 2 {
            parsed.skipped_invalid += 1;
            continue;
        }

        let name = record.get(columns.name).map(|v| v.trim()).unwrap_or("");
        let price = record
            .get(columns.price)
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|p| is_valid_price(*p));

        let Some(price) = price.filter(|_| !name.is_empty()) else {
            parsed.skipped_invalid += 1;
            continue;
        };

        if !seen.insert(name.to_lowercase()) {
            parsed.skipped_duplicate += 1;
            continue;
        }

        let category = columns
            .category
            .and_then(|i| record.get(i))
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_CATEGORY);

        parsed.drafts.push(ServiceDraft::new(name, price, category));
    }

    Ok(parsed)
}

/// Serialize the catalog as `Name,Price,Category` with quoted text fields.
pub fn export_services_csv(services: &[Service]) -> String {
    let mut csv = String::new();

    // Header
    csv.push_str(EXPORT_HEADER);
    csv.push('\n');

    // Lines
    for service in services {
        csv.push_str(&format!(
            "{},{},{}\n",
            quote_csv(&service.name),
            service.price,
            quote_csv(&service.category),
        ));
    }

    csv
}

/// Always quote, doubling embedded quotes.
fn quote_csv(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

fn is_blank(record: &[String]) -> bool {
    record.iter().all(|v| v.trim().is_empty())
}

/// Split text into records of fields.
///
/// Unquoted fields are trimmed. A quote only opens a quoted field at the
/// start of a field; elsewhere it is kept literally. Whitespace after a
/// closing quote is dropped.
fn parse_records(text: &str) -> Result<Vec<Vec<String>>, CsvImportError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut in_quotes = false;
    let mut line = 1;
    let mut record_line = 1;

    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if !quoted && field.trim().is_empty() => {
                field.clear();
                quoted = true;
                in_quotes = true;
            }
            ',' => record.push(finish_field(&mut field, &mut quoted)),
            '\r' | '\n' => {
                if c == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                record.push(finish_field(&mut field, &mut quoted));
                records.push(std::mem::take(&mut record));
                line += 1;
                record_line = line;
            }
            c if quoted && c.is_whitespace() => {}
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(CsvImportError::UnterminatedQuote { line: record_line });
    }
    if quoted || !field.is_empty() || !record.is_empty() {
        record.push(finish_field(&mut field, &mut quoted));
        records.push(record);
    }

    Ok(records)
}

fn finish_field(field: &mut String, quoted: &mut bool) -> String {
    let value = std::mem::take(field);
    if std::mem::take(quoted) {
        value
    } else {
        value.trim().to_string()
    }
}
