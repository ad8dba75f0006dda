//! Gridsift - Schema inference
//!
//! Decides the column list of a dataset and whether each column is numeric
//! or text. The decision is made once per dataset and never revisited.

use serde::Serialize;

use crate::data::Row;

/// Inferred kind of a column, used to pick the filter affordance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    /// First non-empty value parsed as a finite number
    Numeric,
    /// Anything else, including columns with no values at all
    Text,
}

impl ColumnKind {
    pub fn label(&self) -> &'static str {
        match self {
            ColumnKind::Numeric => "numeric",
            ColumnKind::Text => "text",
        }
    }
}

/// A named column. Position in the dataset's column list is display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.kind == ColumnKind::Numeric
    }
}

/// Parse a cell as a finite number.
///
/// Accepts an optional sign, a decimal point and an exponent. Surrounding
/// whitespace is ignored. `inf`, `nan` and friends are rejected.
pub fn parse_number(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Collect column names across string-keyed records, in first-seen order.
pub fn column_union<'a, I, R>(records: I) -> Vec<String>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator<Item = &'a str>,
{
    let mut names: Vec<String> = Vec::new();
    for record in records {
        for key in record {
            if !names.iter().any(|n| n == key) {
                names.push(key.to_string());
            }
        }
    }
    names
}

/// Infer the kind of each named column from the rows.
///
/// For every column the rows are scanned in order until a non-empty value
/// turns up; that single value decides the kind.
pub fn infer_schema(names: Vec<String>, rows: &[Row]) -> Vec<Column> {
    names
        .into_iter()
        .enumerate()
        .map(|(index, name)| {
            let first = rows
                .iter()
                .filter_map(|row| row.cell(index))
                .find(|value| !value.is_empty());
            let kind = match first.and_then(parse_number) {
                Some(_) => ColumnKind::Numeric,
                None => ColumnKind::Text,
            };
            Column { name, kind }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::RowId;

    fn rows(cells: &[&[Option<&str>]]) -> Vec<Row> {
        cells
            .iter()
            .enumerate()
            .map(|(i, r)| {
                Row::new(
                    RowId(i as u64),
                    r.iter().map(|c| c.map(str::to_string)).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn test_parse_number_literals() {
        assert_eq!(parse_number("42"), Some(42.0));
        assert_eq!(parse_number("-3.5"), Some(-3.5));
        assert_eq!(parse_number("+.5"), Some(0.5));
        assert_eq!(parse_number("1e3"), Some(1000.0));
        assert_eq!(parse_number("  7  "), Some(7.0));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number("12abc"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("NaN"), None);
    }

    #[test]
    fn test_first_non_empty_value_decides() {
        let data = rows(&[
            &[Some(""), Some("x")],
            &[Some("30"), Some("y")],
            &[Some("n/a"), Some("1")],
        ]);
        let columns = infer_schema(vec!["age".into(), "name".into()], &data);
        assert_eq!(columns[0].kind, ColumnKind::Numeric);
        assert_eq!(columns[1].kind, ColumnKind::Text);
    }

    #[test]
    fn test_column_without_values_is_text() {
        let data = rows(&[&[None], &[Some("")]]);
        let columns = infer_schema(vec!["empty".into()], &data);
        assert_eq!(columns[0].kind, ColumnKind::Text);
    }

    #[test]
    fn test_whitespace_value_is_text() {
        let data = rows(&[&[Some("  ")], &[Some("5")]]);
        let columns = infer_schema(vec!["v".into()], &data);
        assert_eq!(columns[0].kind, ColumnKind::Text);
    }

    #[test]
    fn test_empty_dataset_has_no_columns() {
        assert!(infer_schema(Vec::new(), &[]).is_empty());
    }

    #[test]
    fn test_column_union_first_seen_order() {
        let records = vec![vec!["b", "a"], vec!["a", "c"], vec!["d", "b"]];
        let names = column_union(records.iter().map(|r| r.iter().copied()));
        assert_eq!(names, vec!["b", "a", "c", "d"]);
    }
}
