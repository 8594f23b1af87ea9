//! In-memory tabular data loaded from delimited text.

use std::fmt;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rand::Rng;
use thiserror::Error;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

pub const SAMPLE_SOURCE_NAME: &str = "sample_data.csv";
const SAMPLE_ROWS: usize = 50;

#[derive(Debug, Error)]
pub enum TableParseError {
    #[error("the file is empty")]
    Empty,
    #[error("the header row has no column names")]
    MissingHeader,
    #[error("malformed delimited data: {0}")]
    Csv(#[from] csv::Error),
}

/// Inferred value type of a column, shown in the column info view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Float,
    Boolean,
    Text,
    Empty,
}

impl ColumnKind {
    pub fn label(&self) -> &'static str {
        match self {
            ColumnKind::Integer => "integer",
            ColumnKind::Float => "float",
            ColumnKind::Boolean => "boolean",
            ColumnKind::Text => "text",
            ColumnKind::Empty => "empty",
        }
    }

    fn infer<'a>(cells: impl Iterator<Item = &'a str>) -> Self {
        let mut kind = ColumnKind::Empty;
        for cell in cells.map(str::trim).filter(|cell| !cell.is_empty()) {
            let cell_kind = if cell.parse::<i64>().is_ok() {
                ColumnKind::Integer
            } else if cell.parse::<f64>().is_ok() {
                ColumnKind::Float
            } else if cell.eq_ignore_ascii_case("true") || cell.eq_ignore_ascii_case("false") {
                ColumnKind::Boolean
            } else {
                return ColumnKind::Text;
            };
            kind = match (kind, cell_kind) {
                (ColumnKind::Empty, next) => next,
                (current, next) if current == next => current,
                (ColumnKind::Integer, ColumnKind::Float) | (ColumnKind::Float, ColumnKind::Integer) => {
                    ColumnKind::Float
                }
                _ => return ColumnKind::Text,
            };
        }
        kind
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub kind: ColumnKind,
    /// Number of blank cells in the column.
    pub missing: usize,
}

/// Named columns over an ordered sequence of rows. Every row has exactly
/// one cell per column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Parses comma-delimited UTF-8 text whose first record is the header.
    pub fn parse(bytes: &[u8]) -> Result<Self, TableParseError> {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(TableParseError::Empty);
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(bytes);

        let columns: Vec<String> = reader
            .headers()?
            .iter()
            .map(|name| name.trim().to_string())
            .collect();
        if columns.iter().all(String::is_empty) {
            return Err(TableParseError::MissingHeader);
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        Ok(Self { columns, rows })
    }

    /// The built-in demo dataset: daily sales for three products across
    /// four regions, starting 2023-01-01.
    pub fn sample<R: Rng>(rng: &mut R) -> Self {
        const PRODUCTS: [&str; 3] = ["Product A", "Product B", "Product C"];
        const REGIONS: [&str; 4] = ["North", "South", "East", "West"];

        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_default();
        let rows = start
            .iter_days()
            .take(SAMPLE_ROWS)
            .enumerate()
            .map(|(idx, date)| {
                vec![
                    date.format("%Y-%m-%d").to_string(),
                    PRODUCTS[idx % PRODUCTS.len()].to_string(),
                    rng.gen_range(100..1000).to_string(),
                    REGIONS[idx % REGIONS.len()].to_string(),
                    format!("{:.2}", rng.gen_range(1.0..5.0)),
                ]
            })
            .collect();

        Self {
            columns: ["Date", "Product", "Sales", "Region", "Rating"]
                .into_iter()
                .map(String::from)
                .collect(),
            rows,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// The first `limit` rows.
    pub fn preview(&self, limit: usize) -> &[Vec<String>] {
        &self.rows[..limit.min(self.rows.len())]
    }

    pub fn column_info(&self) -> Vec<ColumnInfo> {
        self.columns
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let cells = || self.rows.iter().map(move |row| row[idx].as_str());
                ColumnInfo {
                    name: name.clone(),
                    kind: ColumnKind::infer(cells()),
                    missing: cells().filter(|cell| cell.trim().is_empty()).count(),
                }
            })
            .collect()
    }

    /// Serialises the header plus at most `max_rows` rows back to CSV.
    pub fn to_csv_string(&self, max_rows: usize) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&self.columns)?;
        for row in self.preview(max_rows) {
            writer.write_record(row)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|err| err.into_error())
            .context("flushing CSV buffer")?;
        String::from_utf8(bytes).context("CSV output was not UTF-8")
    }
}
