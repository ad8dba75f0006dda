//! Gridsift - Table engine
//!
//! Owns the loaded dataset together with filter, sort, page and selection
//! state. Each intent is a pure transition of [`TableState`] followed by a
//! full recomputation of the derived view:
//!
//! ```text
//! ┌─────────┐   ┌──────────┐   ┌────────┐   ┌──────────┐   ┌────────┐
//! │ Dataset │──▶│  filter  │──▶│  sort  │──▶│ paginate │──▶│  page  │
//! └────┬────┘   └──────────┘   └────────┘   └──────────┘   └────────┘
//!      │
//!      └──────▶ facets (cached per dataset version)
//! ```
//!
//! Selection lives beside the pipeline and is keyed by row identity.

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::commands::TableCommand;
use crate::data::{Dataset, Row, RowId};
use crate::facet::{FacetCache, Facets};
use crate::filter::{self, ColumnFilter, FilterPredicate};
use crate::paginate::{self, Page, PageSize};
use crate::schema::Column;
use crate::selection::{SelectAllState, SelectionTracker};
use crate::sort::{self, SortDirection, SortKey};

/// User-controlled view state
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TableState {
    pub global_filter: String,
    pub column_filters: Vec<ColumnFilter>,
    pub sort: Vec<SortKey>,
    pub page_index: usize,
    pub page_size: PageSize,
}

impl TableState {
    /// Pure transition for every non-selection intent.
    ///
    /// Selection intents leave the state unchanged.
    pub fn apply(mut self, command: &TableCommand) -> Self {
        match command {
            TableCommand::SetGlobalFilter(text) => {
                self.global_filter = text.clone();
            }
            TableCommand::SetColumnFilter { column, predicate } => {
                let existing = self.column_filters.iter().position(|f| f.column == *column);
                match (existing, predicate.is_active()) {
                    (Some(i), true) => self.column_filters[i].predicate = predicate.clone(),
                    (Some(i), false) => {
                        self.column_filters.remove(i);
                    }
                    (None, true) => self
                        .column_filters
                        .push(ColumnFilter::new(column.clone(), predicate.clone())),
                    (None, false) => {}
                }
            }
            TableCommand::ClearFilters => {
                self.global_filter.clear();
                self.column_filters.clear();
            }
            TableCommand::SetSort(keys) => {
                self.sort = keys.clone();
            }
            TableCommand::ToggleSort { column, multi } => {
                self.sort = sort::toggle_sort(&self.sort, column, *multi);
            }
            TableCommand::SetPageIndex(index) => {
                self.page_index = *index;
            }
            TableCommand::SetPageSize(size) => {
                self.page_size = *size;
            }
            _ => {}
        }
        self
    }

    /// Filter currently set on `column`
    pub fn column_filter(&self, column: &str) -> Option<&FilterPredicate> {
        self.column_filters
            .iter()
            .find(|f| f.column == column)
            .map(|f| &f.predicate)
    }

    /// Defaults for a freshly loaded dataset; rows per page is kept
    fn reset(&self) -> Self {
        Self {
            page_size: self.page_size,
            ..Self::default()
        }
    }
}

/// Serializable dump of the whole table state
#[derive(Debug, Clone, Serialize)]
pub struct TableSnapshot {
    pub source: String,
    pub columns: Vec<Column>,
    #[serde(flatten)]
    pub state: TableState,
    pub page_count: usize,
    pub total_rows: usize,
    pub filtered_rows: usize,
    pub selected: Vec<RowId>,
}

/// Output of the last recomputation
#[derive(Debug, Clone)]
struct DerivedView {
    /// Filtered rows in sorted order
    order: Vec<RowId>,
    page: Page,
}

/// The table engine
pub struct Table {
    dataset: Dataset,
    state: TableState,
    selection: SelectionTracker,
    facets: FacetCache,
    view: DerivedView,
}

impl Default for Table {
    fn default() -> Self {
        Self::new(Dataset::empty())
    }
}

impl Table {
    pub fn new(dataset: Dataset) -> Self {
        Self::with_state(dataset, TableState::default())
    }

    /// Start from a given state (page size, initial filters, ...)
    pub fn with_state(dataset: Dataset, state: TableState) -> Self {
        let mut table = Self {
            dataset,
            state: TableState::default(),
            selection: SelectionTracker::new(),
            facets: FacetCache::default(),
            view: DerivedView {
                order: Vec::new(),
                page: paginate::paginate(0, 0, PageSize::default()),
            },
        };
        table.state = table.sanitize(state);
        table.recompute();
        table
    }

    /// Replace the dataset. Filters, sort, page and selection reset.
    pub fn load(&mut self, dataset: Dataset) {
        info!(
            "Loaded dataset {:?}: {} rows, {} columns (v{})",
            dataset.source,
            dataset.len(),
            dataset.columns().len(),
            dataset.version()
        );
        self.dataset = dataset;
        self.state = self.state.reset();
        self.selection.clear_all();
        self.facets.clear();
        self.recompute();
    }

    /// Apply one intent and recompute the view
    pub fn apply(&mut self, command: TableCommand) {
        debug!("Applying {:?}", command);
        if command.is_selection() {
            self.apply_selection(command);
            return;
        }

        let top_row = self.view.page.range.start;
        let next = self.state.clone().apply(&command);
        self.state = self.sanitize(next);

        if let TableCommand::SetPageSize(size) = command {
            // keep the first visible row on screen
            self.state.page_index = top_row / size.resolve(self.view.order.len());
        }
        self.recompute();
    }

    fn apply_selection(&mut self, command: TableCommand) {
        match command {
            TableCommand::Select(id) => self.selection.select(id),
            TableCommand::Deselect(id) => self.selection.deselect(id),
            TableCommand::ToggleRow(id) => self.selection.toggle(id),
            TableCommand::SelectAllVisible(ids) => self.selection.select_all_visible(&ids),
            TableCommand::DeselectAllVisible(ids) => self.selection.deselect_all_visible(&ids),
            TableCommand::ToggleAllVisible(ids) => self.selection.toggle_all_visible(&ids),
            TableCommand::ClearSelection => self.selection.clear_all(),
            _ => {}
        }
    }

    /// Drop filters and sort keys that name columns the dataset lacks
    fn sanitize(&self, mut state: TableState) -> TableState {
        let dataset = &self.dataset;
        state.column_filters.retain(|f| {
            let known = dataset.column_index(&f.column).is_some();
            if !known {
                warn!("Ignoring filter on unknown column {:?}", f.column);
            }
            known
        });
        state.sort.retain(|k| {
            let known = dataset.column_index(&k.column).is_some();
            if !known {
                warn!("Ignoring sort on unknown column {:?}", k.column);
            }
            known
        });
        state
    }

    /// Run filter → sort → paginate from the full row set
    fn recompute(&mut self) {
        let mut rows = filter::filter_rows(
            &self.dataset,
            &self.state.global_filter,
            &self.state.column_filters,
        );
        sort::sort_rows(&self.dataset, &mut rows, &self.state.sort);
        let order: Vec<RowId> = rows.iter().map(|r| r.id()).collect();

        let page = paginate::paginate(order.len(), self.state.page_index, self.state.page_size);
        if page.page_index != self.state.page_index {
            debug!(
                "Clamped page index {} -> {}",
                self.state.page_index, page.page_index
            );
            self.state.page_index = page.page_index;
        }
        self.view = DerivedView { order, page };
    }

    // ─── Outbound ───────────────────────────────────────────────────────────

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn columns(&self) -> &[Column] {
        self.dataset.columns()
    }

    pub fn state(&self) -> &TableState {
        &self.state
    }

    pub fn selection(&self) -> &SelectionTracker {
        &self.selection
    }

    /// Ids of the filtered rows, sorted
    pub fn filtered_ids(&self) -> &[RowId] {
        &self.view.order
    }

    /// Filtered rows in sorted order
    pub fn filtered_rows(&self) -> Vec<&Row> {
        self.rows_for(&self.view.order)
    }

    /// Ids of the rows on the current page
    pub fn page_ids(&self) -> &[RowId] {
        &self.view.order[self.view.page.range.clone()]
    }

    /// Rows on the current page
    pub fn page_rows(&self) -> Vec<&Row> {
        self.rows_for(self.page_ids())
    }

    fn rows_for(&self, ids: &[RowId]) -> Vec<&Row> {
        ids.iter().filter_map(|id| self.dataset.row(*id)).collect()
    }

    /// Selected rows in ingestion order, including rows hidden by filters
    pub fn selected_rows(&self) -> Vec<&Row> {
        self.rows_for(&self.selection.ids())
    }

    pub fn filtered_len(&self) -> usize {
        self.view.order.len()
    }

    /// Row count before filtering
    pub fn total_len(&self) -> usize {
        self.dataset.len()
    }

    pub fn page(&self) -> &Page {
        &self.view.page
    }

    pub fn page_count(&self) -> usize {
        self.view.page.page_count
    }

    pub fn page_index(&self) -> usize {
        self.view.page.page_index
    }

    pub fn page_size(&self) -> PageSize {
        self.state.page_size
    }

    /// Facets for a column over the unfiltered dataset
    pub fn facets(&mut self, column: &str) -> Arc<Facets> {
        self.facets.get(&self.dataset, column)
    }

    pub fn sort_direction(&self, column: &str) -> Option<SortDirection> {
        sort::sort_direction(&self.state.sort, column)
    }

    /// Checkbox state over the current page
    pub fn page_select_state(&self) -> SelectAllState {
        self.selection.select_all_state(self.page_ids())
    }

    /// Checkbox state over every filtered row
    pub fn filtered_select_state(&self) -> SelectAllState {
        self.selection.select_all_state(&self.view.order)
    }

    pub fn snapshot(&self) -> TableSnapshot {
        TableSnapshot {
            source: self.dataset.source.clone(),
            columns: self.dataset.columns().to_vec(),
            state: self.state.clone(),
            page_count: self.page_count(),
            total_rows: self.total_len(),
            filtered_rows: self.filtered_len(),
            selected: self.selection.ids(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn people() -> Dataset {
        Dataset::from_records(vec![
            vec!["name".into(), "age".into()],
            vec!["Alice".into(), "30".into()],
            vec!["Bob".into(), "25".into()],
            vec!["Carol".into(), "40".into()],
        ])
    }

    fn page_names(table: &Table) -> Vec<String> {
        table
            .page_rows()
            .iter()
            .map(|r| r.cell(0).unwrap_or("").to_string())
            .collect()
    }

    fn range(column: &str, min: Option<f64>, max: Option<f64>) -> TableCommand {
        TableCommand::SetColumnFilter {
            column: column.into(),
            predicate: FilterPredicate::Range { min, max },
        }
    }

    #[test]
    fn test_range_then_sort_scenario() {
        let mut table = Table::new(people());
        table.apply(range("age", Some(26.0), Some(40.0)));
        assert_eq!(page_names(&table), vec!["Alice", "Carol"]);
        table.apply(TableCommand::SetSort(vec![SortKey::asc("age")]));
        assert_eq!(page_names(&table), vec!["Alice", "Carol"]);
        table.apply(TableCommand::SetSort(vec![SortKey::desc("age")]));
        assert_eq!(page_names(&table), vec!["Carol", "Alice"]);
        assert_eq!(table.sort_direction("age"), Some(SortDirection::Descending));
        assert_eq!(table.sort_direction("name"), None);
    }

    #[test]
    fn test_page_clamp_persists() {
        let mut table = Table::new(people());
        table.apply(TableCommand::SetPageSize(PageSize::Rows(1)));
        table.apply(TableCommand::SetPageIndex(5));
        assert_eq!(table.page_index(), 2);
        assert_eq!(table.state().page_index, 2);
        assert_eq!(page_names(&table), vec!["Carol"]);
    }

    #[test]
    fn test_filter_shrink_reclamps_page() {
        let mut table = Table::new(people());
        table.apply(TableCommand::SetPageSize(PageSize::Rows(1)));
        table.apply(TableCommand::SetPageIndex(2));
        table.apply(TableCommand::SetGlobalFilter("bo".into()));
        assert_eq!(table.page_index(), 0);
        assert_eq!(table.page_count(), 1);
        assert_eq!(page_names(&table), vec!["Bob"]);
        assert_eq!(table.filtered_len(), 1);
        assert_eq!(table.total_len(), 3);
    }

    #[test]
    fn test_selection_survives_filter() {
        let mut table = Table::new(people());
        let carol = table.page_ids()[2];
        table.apply(TableCommand::Select(carol));
        table.apply(TableCommand::SetGlobalFilter("bob".into()));
        assert!(!table.page_ids().contains(&carol));
        assert!(table.selection().is_selected(carol));
        table.apply(TableCommand::SetGlobalFilter(String::new()));
        assert!(table.selection().is_selected(carol));
        assert_eq!(table.selected_rows().len(), 1);
    }

    #[test]
    fn test_select_all_on_page_only() {
        let mut table = Table::new(people());
        table.apply(TableCommand::SetPageSize(PageSize::Rows(2)));
        let page: Vec<RowId> = table.page_ids().to_vec();
        table.apply(TableCommand::ToggleAllVisible(page));
        assert_eq!(table.page_select_state(), SelectAllState::Checked);
        assert_eq!(table.filtered_select_state(), SelectAllState::Indeterminate);
        assert_eq!(table.selection().len(), 2);
    }

    #[test]
    fn test_load_resets_state() {
        let mut table = Table::new(people());
        table.apply(TableCommand::SetPageSize(PageSize::Rows(1)));
        table.apply(TableCommand::SetGlobalFilter("a".into()));
        table.apply(TableCommand::ToggleSort { column: "age".into(), multi: false });
        table.apply(TableCommand::Select(RowId(0)));
        let old_facets = table.facets("name");

        table.load(people());
        assert_eq!(table.state().global_filter, "");
        assert!(table.state().sort.is_empty());
        assert_eq!(table.page_index(), 0);
        assert_eq!(table.page_size(), PageSize::Rows(1));
        assert!(table.selection().is_empty());
        assert!(!Arc::ptr_eq(&old_facets, &table.facets("name")));
    }

    #[test]
    fn test_filter_on_repeated_header_column() {
        let ds = Dataset::from_records(vec![
            vec!["id".into(), "id".into()],
            vec!["a".into(), "x".into()],
            vec!["b".into(), "y".into()],
        ]);
        let mut table = Table::new(ds);
        assert_eq!(table.columns().len(), 1);
        table.apply(TableCommand::SetColumnFilter {
            column: "id".into(),
            predicate: FilterPredicate::Text("y".into()),
        });
        assert_eq!(table.filtered_len(), 1);
        assert_eq!(page_names(&table), vec!["y"]);
    }

    #[test]
    fn test_unknown_column_filter_ignored() {
        let mut table = Table::new(people());
        table.apply(TableCommand::SetColumnFilter {
            column: "fullName".into(),
            predicate: FilterPredicate::Text("x".into()),
        });
        assert!(table.state().column_filters.is_empty());
        assert_eq!(table.filtered_len(), 3);
        table.apply(TableCommand::ToggleSort { column: "fullName".into(), multi: false });
        assert!(table.state().sort.is_empty());
    }

    #[test]
    fn test_column_filter_replace_and_remove() {
        let state = TableState::default()
            .apply(&TableCommand::SetColumnFilter {
                column: "name".into(),
                predicate: FilterPredicate::Text("a".into()),
            })
            .apply(&TableCommand::SetColumnFilter {
                column: "name".into(),
                predicate: FilterPredicate::Text("b".into()),
            });
        assert_eq!(state.column_filters.len(), 1);
        assert_eq!(
            state.column_filter("name"),
            Some(&FilterPredicate::Text("b".into()))
        );
        let state = state.apply(&TableCommand::SetColumnFilter {
            column: "name".into(),
            predicate: FilterPredicate::Text(String::new()),
        });
        assert!(state.column_filters.is_empty());
    }

    #[test]
    fn test_page_size_change_keeps_top_row() {
        let rows: Vec<Vec<String>> = std::iter::once(vec!["n".to_string()])
            .chain((0..30).map(|i| vec![i.to_string()]))
            .collect();
        let mut table = Table::new(Dataset::from_records(rows));
        table.apply(TableCommand::SetPageSize(PageSize::Rows(5)));
        table.apply(TableCommand::SetPageIndex(3));
        assert_eq!(table.page().range.start, 15);
        table.apply(TableCommand::SetPageSize(PageSize::Rows(10)));
        assert_eq!(table.page_index(), 1);
        table.apply(TableCommand::SetPageSize(PageSize::All));
        assert_eq!(table.page_count(), 1);
        assert_eq!(table.page_rows().len(), 30);
    }

    #[test]
    fn test_empty_dataset_view() {
        let mut table = Table::default();
        table.apply(TableCommand::SetGlobalFilter("x".into()));
        assert_eq!(table.page_count(), 1);
        assert!(table.page_rows().is_empty());
        assert_eq!(table.page_select_state(), SelectAllState::Unchecked);
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut table = Table::new(people().with_source("people.csv"));
        table.apply(TableCommand::Select(RowId(1)));
        let json = serde_json::to_value(table.snapshot()).unwrap();
        assert_eq!(json["source"], "people.csv");
        assert_eq!(json["total_rows"], 3);
        assert_eq!(json["selected"][0], 1);
        assert_eq!(json["columns"][1]["kind"], "numeric");
        assert_eq!(json["page_size"]["rows"], 10);
    }
}
