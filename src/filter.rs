//! Gridsift - Filter evaluation
//!
//! One global substring filter plus per-column filters. Text columns match
//! by case-insensitive substring, numeric columns by inclusive range.
//! Evaluation is a pure function of its inputs.

use serde::{Deserialize, Serialize};

use crate::data::{Dataset, Row};
use crate::schema::parse_number;

/// Predicate of a single column filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterPredicate {
    /// Case-insensitive substring match
    Text(String),
    /// Inclusive numeric range; a `None` side is unbounded
    Range { min: Option<f64>, max: Option<f64> },
}

impl FilterPredicate {
    /// Build a range from raw user input. Malformed text becomes an
    /// unbounded side rather than an error.
    pub fn range_from_input(min: &str, max: &str) -> Self {
        FilterPredicate::Range {
            min: parse_number(min),
            max: parse_number(max),
        }
    }

    /// Parse `min..max` (either side may be empty) into a range
    pub fn parse_range(input: &str) -> Self {
        match input.split_once("..") {
            Some((min, max)) => Self::range_from_input(min, max),
            None => Self::range_from_input(input, input),
        }
    }

    /// An inactive predicate filters nothing
    pub fn is_active(&self) -> bool {
        match self {
            FilterPredicate::Text(text) => !text.is_empty(),
            FilterPredicate::Range { min, max } => min.is_some() || max.is_some(),
        }
    }

    /// Test one cell against the predicate
    pub fn matches(&self, cell: Option<&str>) -> bool {
        match self {
            FilterPredicate::Text(text) => {
                if text.is_empty() {
                    return true;
                }
                cell.is_some_and(|value| contains_ignore_case(value, &text.to_lowercase()))
            }
            FilterPredicate::Range { min, max } => {
                if min.is_none() && max.is_none() {
                    return true;
                }
                let Some(value) = cell.and_then(parse_number) else {
                    return false;
                };
                min.map_or(true, |lo| value >= lo) && max.map_or(true, |hi| value <= hi)
            }
        }
    }

    /// Text shown in the filter box for this predicate
    pub fn display(&self) -> String {
        match self {
            FilterPredicate::Text(text) => text.clone(),
            FilterPredicate::Range { min, max } => format!(
                "{}..{}",
                min.map(|n| n.to_string()).unwrap_or_default(),
                max.map(|n| n.to_string()).unwrap_or_default()
            ),
        }
    }
}

/// A predicate bound to a column by name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnFilter {
    pub column: String,
    pub predicate: FilterPredicate,
}

impl ColumnFilter {
    pub fn new(column: impl Into<String>, predicate: FilterPredicate) -> Self {
        Self {
            column: column.into(),
            predicate,
        }
    }

    pub fn text(column: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(column, FilterPredicate::Text(text.into()))
    }

    pub fn range(column: impl Into<String>, min: Option<f64>, max: Option<f64>) -> Self {
        Self::new(column, FilterPredicate::Range { min, max })
    }
}

fn contains_ignore_case(value: &str, lowered_needle: &str) -> bool {
    value.to_lowercase().contains(lowered_needle)
}

/// Does any present cell of `row` contain `global` (case-insensitive)?
pub fn matches_global(row: &Row, global: &str) -> bool {
    if global.is_empty() {
        return true;
    }
    let needle = global.to_lowercase();
    row.present_cells()
        .any(|value| contains_ignore_case(value, &needle))
}

/// Apply the global filter and every active column filter, keeping input order.
///
/// Column filters naming a column the dataset lacks see an absent cell.
pub fn filter_rows<'a>(
    dataset: &'a Dataset,
    global: &str,
    filters: &[ColumnFilter],
) -> Vec<&'a Row> {
    let active: Vec<(Option<usize>, &FilterPredicate)> = filters
        .iter()
        .filter(|f| f.predicate.is_active())
        .map(|f| (dataset.column_index(&f.column), &f.predicate))
        .collect();

    dataset
        .rows()
        .iter()
        .filter(|row| matches_global(row, global))
        .filter(|row| {
            active
                .iter()
                .all(|(index, predicate)| predicate.matches(index.and_then(|i| row.cell(i))))
        })
        .collect()
}
