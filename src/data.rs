//! Gridsift - In-memory dataset
//!
//! Rows are fully materialized. Each row carries a stable identity assigned
//! at ingestion so selection survives any filtering, sorting or paging.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::schema::{self, Column};

/// Source of dataset versions. Every constructed dataset gets a fresh one.
static NEXT_VERSION: AtomicU64 = AtomicU64::new(1);

fn next_version() -> u64 {
    NEXT_VERSION.fetch_add(1, Ordering::Relaxed)
}

/// Stable row identity, assigned in ingestion order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RowId(pub u64);

impl std::fmt::Display for RowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single row. Cells are positional against the dataset's column list;
/// `None` means the record had no value for that column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    id: RowId,
    cells: Vec<Option<String>>,
}

impl Row {
    pub fn new(id: RowId, cells: Vec<Option<String>>) -> Self {
        Self { id, cells }
    }

    pub fn id(&self) -> RowId {
        self.id
    }

    /// Value of the cell at `column`, or None when absent
    pub fn cell(&self, column: usize) -> Option<&str> {
        self.cells.get(column).and_then(|c| c.as_deref())
    }

    /// Iterate the present cells
    pub fn present_cells(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().filter_map(|c| c.as_deref())
    }
}

/// A loaded dataset: one column set shared by all rows
#[derive(Debug, Clone)]
pub struct Dataset {
    columns: Vec<Column>,
    rows: Vec<Row>,
    version: u64,
    /// Where the data came from, for display
    pub source: String,
}

impl Default for Dataset {
    fn default() -> Self {
        Self::empty()
    }
}

impl Dataset {
    /// A dataset with no columns and no rows
    pub fn empty() -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
            version: next_version(),
            source: String::new(),
        }
    }

    /// Build from raw delimited records.
    ///
    /// The first record is the header; every later record is mapped to it by
    /// position. Short records leave trailing cells absent, extra fields
    /// beyond the header are dropped. A repeated header name keeps its first
    /// position in the column list and takes its value from the last field
    /// with that name.
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = Vec<String>>,
    {
        let mut records = records.into_iter();
        let Some(header) = records.next() else {
            return Self::empty();
        };

        let mut names: Vec<String> = Vec::with_capacity(header.len());
        let mut sources: Vec<usize> = Vec::with_capacity(header.len());
        for (pos, name) in header.into_iter().enumerate() {
            match names.iter().position(|n| *n == name) {
                Some(existing) => sources[existing] = pos,
                None => {
                    names.push(name);
                    sources.push(pos);
                }
            }
        }

        let rows: Vec<Row> = records
            .enumerate()
            .map(|(i, record)| {
                let cells = sources.iter().map(|&pos| record.get(pos).cloned()).collect();
                Row::new(RowId(i as u64), cells)
            })
            .collect();

        Self::assemble(names, rows)
    }

    /// Build from string-keyed records.
    ///
    /// Columns are the union of keys in first-seen order. A `None` value
    /// registers the column but leaves the cell absent.
    pub fn from_maps(records: Vec<Vec<(String, Option<String>)>>) -> Self {
        let names = schema::column_union(
            records
                .iter()
                .map(|record| record.iter().map(|(k, _)| k.as_str())),
        );

        let rows: Vec<Row> = records
            .into_iter()
            .enumerate()
            .map(|(i, record)| {
                let mut cells: Vec<Option<String>> = vec![None; names.len()];
                for (key, value) in record {
                    if let Some(pos) = names.iter().position(|n| *n == key) {
                        cells[pos] = value;
                    }
                }
                Row::new(RowId(i as u64), cells)
            })
            .collect();

        Self::assemble(names, rows)
    }

    fn assemble(names: Vec<String>, rows: Vec<Row>) -> Self {
        let columns = schema::infer_schema(names, &rows);
        Self {
            columns,
            rows,
            version: next_version(),
            source: String::new(),
        }
    }

    /// Attach a display name for where the data came from
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Position of a column by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Look up a row by identity. Ids are dense in ingestion order.
    pub fn row(&self, id: RowId) -> Option<&Row> {
        let index = usize::try_from(id.0).ok()?;
        self.rows.get(index).filter(|row| row.id() == id)
    }

    /// Number of rows (the pre-filter row count)
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Process-unique version, changes with every load
    pub fn version(&self) -> u64 {
        self.version
    }
}
