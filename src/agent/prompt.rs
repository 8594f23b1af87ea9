use std::fmt::Write as _;

use anyhow::Result;

use crate::table::Table;

/// Rows of raw data included with every question.
pub const MAX_CONTEXT_ROWS: usize = 200;

/// Describes the table to the model: shape, per-column type and missing
/// counts, then the leading rows as CSV.
pub fn data_context(table: &Table) -> Result<String> {
    let mut out = String::new();
    writeln!(
        out,
        "You are working with a table of {} rows and {} columns.",
        table.row_count(),
        table.column_count()
    )?;
    writeln!(out, "Columns:")?;
    for column in table.column_info() {
        writeln!(
            out,
            "- {} ({}, {} missing)",
            column.name, column.kind, column.missing
        )?;
    }

    let shown = table.row_count().min(MAX_CONTEXT_ROWS);
    writeln!(out)?;
    if shown < table.row_count() {
        writeln!(out, "Data (CSV, first {} of {} rows):", shown, table.row_count())?;
    } else {
        writeln!(out, "Data (CSV):")?;
    }
    out.push_str(&table.to_csv_string(MAX_CONTEXT_ROWS)?);
    Ok(out)
}

/// The system message: locale prompt first, then the data description.
pub fn system_message(system_prompt: &str, data_context: &str) -> String {
    format!("{system_prompt}\n\n{data_context}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describes_columns_and_embeds_rows() {
        let table = Table::parse(b"city,temp\nOslo,4\nRome,\n").unwrap();
        let context = data_context(&table).unwrap();
        assert!(context.starts_with("You are working with a table of 2 rows and 2 columns."));
        assert!(context.contains("- city (text, 0 missing)"));
        assert!(context.contains("- temp (integer, 1 missing)"));
        assert!(context.contains("Data (CSV):\ncity,temp\nOslo,4\nRome,\n"));
    }

    #[test]
    fn large_tables_are_truncated() {
        let mut raw = String::from("n\n");
        for idx in 0..(MAX_CONTEXT_ROWS + 5) {
            raw.push_str(&format!("{idx}\n"));
        }
        let table = Table::parse(raw.as_bytes()).unwrap();
        let context = data_context(&table).unwrap();
        assert!(context.contains("first 200 of 205 rows"));
        assert!(context.contains("\n199\n"));
        assert!(!context.contains("\n200\n"));
    }

    #[test]
    fn system_message_puts_locale_prompt_first() {
        let message = system_message("Be brief.", "DATA");
        assert_eq!(message, "Be brief.\n\nDATA");
    }
}
