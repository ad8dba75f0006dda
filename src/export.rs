//! Gridsift - CSV export of rows

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::data::Row;
use crate::schema::Column;

/// Write a header plus `rows` as CSV. Absent cells become empty fields.
pub fn write_csv<W: Write>(writer: W, columns: &[Column], rows: &[&Row]) -> Result<()> {
    let mut out = csv::WriterBuilder::new().flexible(false).from_writer(writer);
    out.write_record(columns.iter().map(|c| c.name.as_str()))
        .with_context(|| "Failed to write CSV header")?;
    for row in rows {
        out.write_record((0..columns.len()).map(|i| row.cell(i).unwrap_or("")))
            .with_context(|| format!("Failed to write row {}", row.id()))?;
    }
    out.flush().with_context(|| "Failed to flush CSV output")?;
    Ok(())
}

/// Write rows to a CSV file at `path`
pub fn export_to_file<P: AsRef<Path>>(path: P, columns: &[Column], rows: &[&Row]) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    write_csv(BufWriter::new(file), columns, rows)
}

/// Default export path next to the input: `data.csv` → `data_export.csv`
pub fn default_export_path(input: &str) -> String {
    if input == "-" || input.is_empty() || input == "<stdin>" {
        return "gridsift_export.csv".to_string();
    }
    let path = Path::new(input);
    let stem = path.file_stem().unwrap_or_default().to_string_lossy();
    let parent = path.parent().unwrap_or(Path::new(""));
    parent
        .join(format!("{}_export.csv", stem))
        .to_string_lossy()
        .to_string()
}
