//! Table intents and the channel that carries them
//!
//! Every user action that changes the table is expressed as a
//! `TableCommand`. Debounced edits arrive through an mpsc channel which the
//! UI loop drains between frames.

use tokio::sync::mpsc;

use crate::data::RowId;
use crate::filter::FilterPredicate;
use crate::paginate::PageSize;
use crate::sort::SortKey;

/// Intents accepted by the table engine
#[derive(Debug, Clone, PartialEq)]
pub enum TableCommand {
    /// Replace the all-column search term
    SetGlobalFilter(String),

    /// Set or replace the filter on one column; an inactive predicate removes it
    SetColumnFilter {
        column: String,
        predicate: FilterPredicate,
    },

    /// Remove the global filter and every column filter
    ClearFilters,

    /// Replace the whole sort order
    SetSort(Vec<SortKey>),

    /// Header click: cycle one column's direction
    ToggleSort { column: String, multi: bool },

    /// Jump to a page (clamped on recompute)
    SetPageIndex(usize),

    /// Change rows per page
    SetPageSize(PageSize),

    Select(RowId),
    Deselect(RowId),
    ToggleRow(RowId),

    /// Select the given rows only
    SelectAllVisible(Vec<RowId>),

    DeselectAllVisible(Vec<RowId>),

    /// Select all given rows, or deselect them if all were selected
    ToggleAllVisible(Vec<RowId>),

    ClearSelection,
}

impl TableCommand {
    /// Whether the command touches selection only
    pub fn is_selection(&self) -> bool {
        matches!(
            self,
            TableCommand::Select(_)
                | TableCommand::Deselect(_)
                | TableCommand::ToggleRow(_)
                | TableCommand::SelectAllVisible(_)
                | TableCommand::DeselectAllVisible(_)
                | TableCommand::ToggleAllVisible(_)
                | TableCommand::ClearSelection
        )
    }
}

/// Sending half (held by the debouncer)
pub type CommandSender = mpsc::UnboundedSender<TableCommand>;

/// Receiving half (drained by the UI loop)
pub type CommandReceiver = mpsc::UnboundedReceiver<TableCommand>;

/// Create a new command channel pair
pub fn command_channel() -> (CommandSender, CommandReceiver) {
    mpsc::unbounded_channel()
}
