//! In-memory CSV tables with order-preserving parse and export.
//!
//! The workflow loads the whole dataset, mutates cells in place, and writes it
//! back row-for-row, so the table keeps columns and rows exactly in input
//! order. Export prepends a UTF-8 BOM so spreadsheet tools pick up the
//! encoding (the labels are Japanese by default).
use anyhow::{bail, Result};

/// An ordered table of string cells under a single header row.
///
/// Cells are kept as raw text; a coordinate cell is considered "missing" by
/// callers when it is blank. Rows are padded to the header width on parse.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Build a table from parts, padding short rows to the header width.
    pub fn from_parts(headers: Vec<String>, mut rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        for row in &mut rows {
            row.resize(width, String::new());
        }
        Self { headers, rows }
    }

    /// Parse CSV text into a table.
    ///
    /// Accepts RFC 4180 quoting (embedded commas, doubled quotes, embedded
    /// line breaks), CRLF or LF line endings, and a leading UTF-8 BOM. Blank
    /// lines are skipped. Rows wider than the header are an error; shorter
    /// rows are padded with empty cells.
    pub fn parse(text: &str) -> Result<Table> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut records = parse_records(text)?;
        if records.is_empty() {
            bail!("input table is empty");
        }
        let headers = records.remove(0);
        let width = headers.len();
        let mut rows = Vec::with_capacity(records.len());
        for (index, mut row) in records.into_iter().enumerate() {
            if row.len() > width {
                // +2: one for the header line, one for 1-based numbering.
                bail!(
                    "row {} has {} fields, expected at most {}",
                    index + 2,
                    row.len(),
                    width
                );
            }
            row.resize(width, String::new());
            rows.push(row);
        }
        Ok(Table { headers, rows })
    }

    /// Return the header labels in column order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Return the index of the column with the given label, if present.
    pub fn column_index(&self, label: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == label)
    }

    /// Return the index of the labeled column, appending an empty column
    /// when it does not exist yet.
    pub fn ensure_column(&mut self, label: &str) -> usize {
        if let Some(index) = self.column_index(label) {
            return index;
        }
        self.headers.push(label.to_string());
        for row in &mut self.rows {
            row.push(String::new());
        }
        self.headers.len() - 1
    }

    /// Number of data rows (excluding the header).
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Borrow a cell's text.
    pub fn cell(&self, row: usize, column: usize) -> &str {
        &self.rows[row][column]
    }

    /// Overwrite a cell.
    pub fn set_cell(&mut self, row: usize, column: usize, value: String) {
        self.rows[row][column] = value;
    }

    /// Serialize to CSV with a leading UTF-8 BOM.
    ///
    /// Fields containing commas, quotes, or line breaks are quoted with
    /// doubled inner quotes; everything else is written verbatim.
    pub fn to_csv(&self) -> String {
        let mut out = String::from('\u{feff}');
        push_record(&mut out, &self.headers);
        for row in &self.rows {
            push_record(&mut out, row);
        }
        out
    }
}

fn push_record(out: &mut String, fields: &[String]) {
    for (index, field) in fields.iter().enumerate() {
        if index > 0 {
            out.push(',');
        }
        push_field(out, field);
    }
    out.push('\n');
}

fn push_field(out: &mut String, field: &str) {
    if field.contains([',', '"', '\n', '\r']) {
        out.push('"');
        out.push_str(&field.replace('"', "\"\""));
        out.push('"');
    } else {
        out.push_str(field);
    }
}

/// Split CSV text into records of fields, honoring quoting.
fn parse_records(text: &str) -> Result<Vec<Vec<String>>> {
    let mut records: Vec<Vec<String>> = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    // Distinguishes a blank line from a line holding a single empty field.
    let mut saw_content = false;

    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if in_quotes {
            if ch == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(ch);
            }
            continue;
        }
        match ch {
            '"' => {
                in_quotes = true;
                saw_content = true;
            }
            ',' => {
                record.push(std::mem::take(&mut field));
                saw_content = true;
            }
            '\r' | '\n' => {
                if ch == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                if saw_content || !record.is_empty() || !field.is_empty() {
                    record.push(std::mem::take(&mut field));
                    records.push(std::mem::take(&mut record));
                }
                saw_content = false;
            }
            _ => {
                field.push(ch);
                saw_content = true;
            }
        }
    }
    if in_quotes {
        bail!("unterminated quoted field at end of input");
    }
    if saw_content || !record.is_empty() || !field.is_empty() {
        record.push(field);
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
#[path = "table_tests.rs"]
mod tests;
