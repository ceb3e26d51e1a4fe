//! # Tabular Output
//!
//! Rows that know their header and how to render themselves as string
//! records, and a CSV writer for any `Write` sink.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use tracing::info;

use crate::error::Result;

/// A row of a named-column table.
pub trait TableRow {
    /// Column names, in record order.
    const HEADER: &'static [&'static str];

    /// Renders the row as one string per column.
    fn to_record(&self) -> Result<Vec<String>>;
}

/// Writes `rows` as UTF-8 CSV with a header row and `\n` line endings.
///
/// The header is written even when there are no rows.
pub fn write_csv<W: Write, R: TableRow>(writer: W, rows: &[R]) -> Result<()> {
    let mut csv = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    csv.write_record(R::HEADER)?;
    for row in rows {
        csv.write_record(row.to_record()?)?;
    }
    csv.flush()?;
    Ok(())
}

/// Creates `path` and writes `rows` to it as CSV.
pub fn write_csv_file<P: AsRef<Path>, R: TableRow>(path: P, rows: &[R]) -> Result<()> {
    let file = File::create(path.as_ref())?;
    write_csv(file, rows)?;
    info!(path = %path.as_ref().display(), rows = rows.len(), "wrote table");
    Ok(())
}
