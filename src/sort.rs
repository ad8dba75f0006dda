//! Gridsift - Sort evaluation
//!
//! Multi-key stable sort. Numbers compare numerically when both cells
//! parse, everything else compares by code point. Absent cells always sort
//! last, whatever the direction.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::data::{Dataset, Row};
use crate::schema::parse_number;

/// Direction of a single sort key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    /// Header indicator
    pub fn arrow(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "▲",
            SortDirection::Descending => "▼",
        }
    }
}

/// One (column, direction) entry of the sort order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub column: String,
    pub descending: bool,
}

impl SortKey {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: false,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: true,
        }
    }

    /// Parse `col` or `col:desc` / `col:asc`
    pub fn parse(arg: &str) -> Self {
        match arg.rsplit_once(':') {
            Some((column, dir)) if dir.eq_ignore_ascii_case("desc") => Self::desc(column),
            Some((column, dir)) if dir.eq_ignore_ascii_case("asc") => Self::asc(column),
            _ => Self::asc(arg),
        }
    }

    pub fn direction(&self) -> SortDirection {
        if self.descending {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        }
    }
}

/// Compare two cells for one key, ignoring direction.
///
/// A numeric cell against a non-numeric one orders the number first so the
/// comparator stays a total order on mixed columns.
fn compare_values(a: &str, b: &str) -> Ordering {
    match (parse_number(a), parse_number(b)) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Compare two cells for a key, with absent cells after present ones.
pub fn compare_cells(a: Option<&str>, b: Option<&str>, descending: bool) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => {
            let ord = compare_values(a, b);
            if descending {
                ord.reverse()
            } else {
                ord
            }
        }
    }
}

/// Stable sort of `rows` by `keys`, left to right.
///
/// Keys naming unknown columns compare every row as equal.
pub fn sort_rows(dataset: &Dataset, rows: &mut [&Row], keys: &[SortKey]) {
    if keys.is_empty() {
        return;
    }
    let resolved: Vec<(Option<usize>, bool)> = keys
        .iter()
        .map(|k| (dataset.column_index(&k.column), k.descending))
        .collect();

    rows.sort_by(|a, b| {
        resolved
            .iter()
            .map(|(index, descending)| {
                let (x, y) = match index {
                    Some(i) => (a.cell(*i), b.cell(*i)),
                    None => (None, None),
                };
                compare_cells(x, y, *descending)
            })
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    });
}

/// Current direction of `column` in `keys`, if sorted
pub fn sort_direction(keys: &[SortKey], column: &str) -> Option<SortDirection> {
    keys.iter()
        .find(|k| k.column == column)
        .map(SortKey::direction)
}

/// Header-click cycle: ascending, then descending, then unsorted.
///
/// Without `multi` the clicked column becomes the only key. With `multi`
/// it is appended, or updated in place when already present.
pub fn toggle_sort(keys: &[SortKey], column: &str, multi: bool) -> Vec<SortKey> {
    let next = match sort_direction(keys, column) {
        None => Some(SortKey::asc(column)),
        Some(SortDirection::Ascending) => Some(SortKey::desc(column)),
        Some(SortDirection::Descending) => None,
    };

    if !multi {
        return next.into_iter().collect();
    }

    let mut out: Vec<SortKey> = Vec::with_capacity(keys.len() + 1);
    let mut placed = false;
    for key in keys {
        if key.column == column {
            if let Some(ref k) = next {
                out.push(k.clone());
            }
            placed = true;
        } else {
            out.push(key.clone());
        }
    }
    if !placed {
        out.extend(next);
    }
    out
}
