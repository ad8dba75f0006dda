//! Gridsift - Application state management
//!
//! Presentation state around the [`Table`] engine: cursor, focused column,
//! the filter edit buffer and popups. Edits are buffered here and reach the
//! table through the debouncer.

use std::time::Duration;

use crate::commands::{command_channel, CommandReceiver, TableCommand};
use crate::data::RowId;
use crate::debounce::Debouncer;
use crate::export;
use crate::facet::SUGGESTION_CAP;
use crate::filter::FilterPredicate;
use crate::table::Table;

/// What keystrokes currently edit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Navigation keys
    Normal,
    /// Editing the all-column search
    Global,
    /// Editing the filter of the column at this index
    Column(usize),
}

/// Main application state
pub struct App {
    /// The table engine
    pub table: Table,
    /// Current input mode
    pub mode: InputMode,
    /// Locally buffered filter text, shown before it is committed
    pub input: String,
    /// Typed text and position in the suggestion list while cycling with Tab
    pub suggestion: Option<(String, usize)>,
    /// Highlighted row within the current page
    pub cursor: usize,
    /// Focused column (sort / filter target)
    pub column: usize,
    /// Whether to show the help popup
    pub show_help: bool,
    /// Whether to show the state inspector
    pub show_state: bool,
    /// Whether the app should quit
    pub should_quit: bool,
    /// One-line message for the status bar
    pub status: Option<String>,
    /// Where `export` writes
    pub export_path: String,
    debouncer: Debouncer,
    commands: CommandReceiver,
}

impl App {
    /// Create the app. Must be called inside a tokio runtime.
    pub fn new(table: Table, debounce: Duration) -> Self {
        let (tx, rx) = command_channel();
        let export_path = export::default_export_path(&table.dataset().source);
        Self {
            table,
            mode: InputMode::Normal,
            input: String::new(),
            suggestion: None,
            cursor: 0,
            column: 0,
            show_help: false,
            show_state: false,
            should_quit: false,
            status: None,
            export_path,
            debouncer: Debouncer::on_current(debounce, tx),
            commands: rx,
        }
    }

    /// Apply a command right away
    pub fn apply(&mut self, command: TableCommand) {
        self.table.apply(command);
        self.clamp_cursor();
    }

    /// Apply every debounced command that has arrived
    pub fn drain_commands(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(command) = self.commands.try_recv() {
            self.table.apply(command);
            applied += 1;
        }
        if applied > 0 {
            self.clamp_cursor();
        }
        applied
    }

    fn clamp_cursor(&mut self) {
        self.cursor = self
            .cursor
            .min(self.table.page_ids().len().saturating_sub(1));
        self.column = self
            .column
            .min(self.table.columns().len().saturating_sub(1));
    }

    /// Row under the cursor
    pub fn current_row(&self) -> Option<RowId> {
        self.table.page_ids().get(self.cursor).copied()
    }

    // ─── Navigation ─────────────────────────────────────────────────────────

    pub fn cursor_down(&mut self, n: usize) {
        let last = self.table.page_ids().len().saturating_sub(1);
        self.cursor = (self.cursor + n).min(last);
    }

    pub fn cursor_up(&mut self, n: usize) {
        self.cursor = self.cursor.saturating_sub(n);
    }

    pub fn column_right(&mut self) {
        let last = self.table.columns().len().saturating_sub(1);
        self.column = (self.column + 1).min(last);
    }

    pub fn column_left(&mut self) {
        self.column = self.column.saturating_sub(1);
    }

    pub fn next_page(&mut self) {
        let index = self.table.page_index() + 1;
        self.apply(TableCommand::SetPageIndex(index));
    }

    pub fn prev_page(&mut self) {
        let index = self.table.page_index().saturating_sub(1);
        self.apply(TableCommand::SetPageIndex(index));
    }

    pub fn first_page(&mut self) {
        self.apply(TableCommand::SetPageIndex(0));
    }

    pub fn last_page(&mut self) {
        self.apply(TableCommand::SetPageIndex(usize::MAX));
    }

    pub fn cycle_page_size(&mut self, forward: bool) {
        let size = self.table.page_size().cycle(forward);
        self.apply(TableCommand::SetPageSize(size));
    }

    // ─── Sorting and selection ──────────────────────────────────────────────

    /// Cycle the sort of the focused column
    pub fn toggle_sort(&mut self, multi: bool) {
        if let Some(column) = self.focused_column_name() {
            self.apply(TableCommand::ToggleSort { column, multi });
        }
    }

    pub fn toggle_row(&mut self) {
        if let Some(id) = self.current_row() {
            self.apply(TableCommand::ToggleRow(id));
        }
    }

    /// Footer checkbox: all rows on this page
    pub fn toggle_page_selection(&mut self) {
        let ids = self.table.page_ids().to_vec();
        self.apply(TableCommand::ToggleAllVisible(ids));
    }

    /// Header checkbox: all filtered rows
    pub fn toggle_filtered_selection(&mut self) {
        let ids = self.table.filtered_ids().to_vec();
        self.apply(TableCommand::ToggleAllVisible(ids));
    }

    pub fn clear_selection(&mut self) {
        self.apply(TableCommand::ClearSelection);
    }

    /// Drop every filter, including any edit still waiting on the timer
    pub fn clear_filters(&mut self) {
        self.debouncer.cancel();
        self.mode = InputMode::Normal;
        self.input.clear();
        self.apply(TableCommand::ClearFilters);
    }

    fn focused_column_name(&self) -> Option<String> {
        self.table
            .columns()
            .get(self.column)
            .map(|c| c.name.clone())
    }

    // ─── Filter editing ─────────────────────────────────────────────────────

    /// Start editing the global search
    pub fn begin_global_edit(&mut self) {
        self.input = self.table.state().global_filter.clone();
        self.suggestion = None;
        self.mode = InputMode::Global;
    }

    /// Start editing the focused column's filter
    pub fn begin_column_edit(&mut self) {
        let Some(name) = self.focused_column_name() else {
            return;
        };
        self.input = self
            .table
            .state()
            .column_filter(&name)
            .map(FilterPredicate::display)
            .unwrap_or_default();
        self.suggestion = None;
        self.mode = InputMode::Column(self.column);
    }

    /// Intent that commits the current buffer
    fn edit_command(&self) -> Option<TableCommand> {
        match self.mode {
            InputMode::Normal => None,
            InputMode::Global => Some(TableCommand::SetGlobalFilter(self.input.clone())),
            InputMode::Column(index) => {
                let column = self.table.columns().get(index)?;
                let predicate = if column.is_numeric() {
                    FilterPredicate::parse_range(&self.input)
                } else {
                    FilterPredicate::Text(self.input.clone())
                };
                Some(TableCommand::SetColumnFilter {
                    column: column.name.clone(),
                    predicate,
                })
            }
        }
    }

    fn schedule_edit(&mut self) {
        if let Some(command) = self.edit_command() {
            self.debouncer.schedule(command);
        }
    }

    pub fn edit_push(&mut self, c: char) {
        self.input.push(c);
        self.suggestion = None;
        self.schedule_edit();
    }

    pub fn edit_backspace(&mut self) {
        self.input.pop();
        self.suggestion = None;
        self.schedule_edit();
    }

    /// Commit the buffer immediately and leave edit mode
    pub fn edit_commit(&mut self) {
        if let Some(command) = self.edit_command() {
            self.debouncer.flush(command);
        }
        self.mode = InputMode::Normal;
        self.suggestion = None;
        self.drain_commands();
    }

    /// Leave edit mode, dropping any pending commit
    pub fn edit_cancel(&mut self) {
        self.debouncer.cancel();
        self.mode = InputMode::Normal;
        self.suggestion = None;
        self.input.clear();
    }

    /// Suggestions for the column being edited (text columns only)
    pub fn suggestions(&mut self) -> Vec<String> {
        let InputMode::Column(index) = self.mode else {
            return Vec::new();
        };
        let Some(column) = self.table.columns().get(index).cloned() else {
            return Vec::new();
        };
        if column.is_numeric() {
            return Vec::new();
        }
        // while cycling, keep narrowing by what was typed before the first Tab
        let typed = match &self.suggestion {
            Some((typed, _)) => typed.clone(),
            None => self.input.clone(),
        };
        let facets = self.table.facets(&column.name);
        facets
            .suggestions(&typed, SUGGESTION_CAP)
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Replace the buffer with the next suggestion
    pub fn cycle_suggestion(&mut self) {
        let list = self.suggestions();
        if list.is_empty() {
            return;
        }
        let (typed, next) = match self.suggestion.take() {
            Some((typed, i)) => (typed, (i + 1) % list.len()),
            None => (self.input.clone(), 0),
        };
        self.input = list[next].clone();
        self.suggestion = Some((typed, next));
        self.schedule_edit();
    }

    // ─── Export ─────────────────────────────────────────────────────────────

    /// Write selected rows (or all filtered rows when none are selected)
    pub fn export(&mut self) {
        let rows = if self.table.selection().is_empty() {
            self.table.filtered_rows()
        } else {
            self.table.selected_rows()
        };
        let count = rows.len();
        let result = export::export_to_file(&self.export_path, self.table.columns(), &rows);
        self.status = Some(match result {
            Ok(()) => format!("Exported {} rows to {}", count, self.export_path),
            Err(e) => format!("Export failed: {:#}", e),
        });
    }

    /// Pretty JSON of the table state for the inspector popup
    pub fn state_json(&self) -> String {
        serde_json::to_string_pretty(&self.table.snapshot())
            .unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Dataset;
    use crate::paginate::PageSize;

    fn app() -> App {
        let ds = Dataset::from_records(vec![
            vec!["name".into(), "age".into()],
            vec!["Alice".into(), "30".into()],
            vec!["Bob".into(), "25".into()],
            vec!["Carol".into(), "40".into()],
            vec!["Bobby".into(), "19".into()],
        ]);
        App::new(Table::new(ds), Duration::from_millis(500))
    }

    #[tokio::test(start_paused = true)]
    async fn test_global_edit_is_debounced() {
        let mut app = app();
        app.begin_global_edit();
        app.edit_push('b');
        app.edit_push('o');
        assert_eq!(app.table.filtered_len(), 4);

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(app.drain_commands(), 1);
        assert_eq!(app.table.filtered_len(), 2);
        assert_eq!(app.mode, InputMode::Global);
    }

    #[tokio::test(start_paused = true)]
    async fn test_commit_and_cancel() {
        let mut app = app();
        app.begin_global_edit();
        app.edit_push('r');
        app.edit_commit();
        assert_eq!(app.table.filtered_len(), 1);
        assert_eq!(app.mode, InputMode::Normal);

        app.begin_global_edit();
        app.edit_backspace();
        app.edit_cancel();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(app.drain_commands(), 0);
        assert_eq!(app.table.state().global_filter, "r");
    }

    #[tokio::test(start_paused = true)]
    async fn test_numeric_column_edit() {
        let mut app = app();
        app.column_right();
        app.begin_column_edit();
        for c in "20..35".chars() {
            app.edit_push(c);
        }
        app.edit_commit();
        assert_eq!(app.table.filtered_len(), 2);

        app.begin_column_edit();
        assert_eq!(app.input, "20..35");
    }

    #[tokio::test(start_paused = true)]
    async fn test_suggestion_cycle() {
        let mut app = app();
        app.begin_column_edit();
        app.edit_push('b');
        app.cycle_suggestion();
        assert_eq!(app.input, "Bob");
        app.cycle_suggestion();
        assert_eq!(app.input, "Bobby");
        app.edit_commit();
        assert_eq!(app.table.filtered_len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cursor_and_selection() {
        let mut app = app();
        app.apply(TableCommand::SetPageSize(PageSize::Rows(2)));
        app.cursor_down(5);
        assert_eq!(app.cursor, 1);
        app.toggle_row();
        assert!(app.table.selection().is_selected(RowId(1)));

        app.last_page();
        assert_eq!(app.table.page_index(), 1);
        app.toggle_page_selection();
        assert_eq!(app.table.selection().len(), 3);

        app.toggle_filtered_selection();
        assert_eq!(app.table.selection().len(), 4);
        app.toggle_filtered_selection();
        assert!(app.table.selection().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sort_focused_column() {
        let mut app = app();
        app.column_right();
        app.toggle_sort(false);
        let first = app.table.page_rows()[0].cell(0).map(str::to_string);
        assert_eq!(first.as_deref(), Some("Bobby"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_export_selected() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let mut app = app();
        app.export_path = dir.path().join("out.csv").to_string_lossy().to_string();
        app.apply(TableCommand::Select(RowId(2)));
        app.export();
        let text = std::fs::read_to_string(&app.export_path)?;
        assert_eq!(text, "name,age\nCarol,40\n");
        assert!(app.status.as_deref().is_some_and(|s| s.starts_with("Exported 1")));
        Ok(())
    }
}
