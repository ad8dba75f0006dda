//! Gridsift - Row selection
//!
//! Selection is kept by row identity, never by position, so it survives
//! re-filtering, re-sorting and paging. Rows hidden by a filter stay
//! selected until explicitly cleared.

use serde::Serialize;
use std::collections::HashSet;

use crate::data::RowId;

/// State of a "select all" checkbox over some set of visible rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectAllState {
    Unchecked,
    Checked,
    Indeterminate,
}

impl SelectAllState {
    pub fn glyph(&self) -> &'static str {
        match self {
            SelectAllState::Unchecked => "[ ]",
            SelectAllState::Checked => "[x]",
            SelectAllState::Indeterminate => "[-]",
        }
    }
}

/// Set of selected row identities
#[derive(Debug, Clone, Default)]
pub struct SelectionTracker {
    selected: HashSet<RowId>,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&mut self, id: RowId) {
        self.selected.insert(id);
    }

    pub fn deselect(&mut self, id: RowId) {
        self.selected.remove(&id);
    }

    pub fn toggle(&mut self, id: RowId) {
        if !self.selected.remove(&id) {
            self.selected.insert(id);
        }
    }

    /// Select exactly the given ids, leaving others untouched
    pub fn select_all_visible(&mut self, visible: &[RowId]) {
        self.selected.extend(visible.iter().copied());
    }

    pub fn deselect_all_visible(&mut self, visible: &[RowId]) {
        for id in visible {
            self.selected.remove(id);
        }
    }

    /// Select all of `visible`, or deselect them if they are all selected
    pub fn toggle_all_visible(&mut self, visible: &[RowId]) {
        if self.is_all_visible_selected(visible) {
            self.deselect_all_visible(visible);
        } else {
            self.select_all_visible(visible);
        }
    }

    pub fn clear_all(&mut self) {
        self.selected.clear();
    }

    pub fn is_selected(&self, id: RowId) -> bool {
        self.selected.contains(&id)
    }

    /// True when `visible` is non-empty and every id in it is selected
    pub fn is_all_visible_selected(&self, visible: &[RowId]) -> bool {
        !visible.is_empty() && visible.iter().all(|id| self.selected.contains(id))
    }

    /// True when some, but not all, of `visible` are selected
    pub fn is_some_visible_selected(&self, visible: &[RowId]) -> bool {
        visible.iter().any(|id| self.selected.contains(id))
            && !self.is_all_visible_selected(visible)
    }

    pub fn select_all_state(&self, visible: &[RowId]) -> SelectAllState {
        if self.is_all_visible_selected(visible) {
            SelectAllState::Checked
        } else if self.is_some_visible_selected(visible) {
            SelectAllState::Indeterminate
        } else {
            SelectAllState::Unchecked
        }
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Selected ids in ascending order
    pub fn ids(&self) -> Vec<RowId> {
        let mut ids: Vec<RowId> = self.selected.iter().copied().collect();
        ids.sort_unstable();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[u64]) -> Vec<RowId> {
        raw.iter().map(|&i| RowId(i)).collect()
    }

    #[test]
    fn test_select_toggle_deselect() {
        let mut sel = SelectionTracker::new();
        sel.select(RowId(1));
        sel.toggle(RowId(2));
        assert!(sel.is_selected(RowId(1)));
        assert!(sel.is_selected(RowId(2)));
        sel.toggle(RowId(2));
        sel.deselect(RowId(1));
        assert!(sel.is_empty());
    }

    #[test]
    fn test_select_all_visible_is_scoped() {
        let mut sel = SelectionTracker::new();
        sel.select_all_visible(&ids(&[0, 1]));
        assert!(!sel.is_selected(RowId(2)));
        assert_eq!(sel.ids(), ids(&[0, 1]));
    }

    #[test]
    fn test_three_states() {
        let mut sel = SelectionTracker::new();
        let page = ids(&[3, 4, 5]);
        assert_eq!(sel.select_all_state(&page), SelectAllState::Unchecked);
        sel.select(RowId(4));
        assert_eq!(sel.select_all_state(&page), SelectAllState::Indeterminate);
        sel.select_all_visible(&page);
        assert_eq!(sel.select_all_state(&page), SelectAllState::Checked);
        // an empty visible set is never checked
        assert_eq!(sel.select_all_state(&[]), SelectAllState::Unchecked);
    }

    #[test]
    fn test_toggle_all_visible() {
        let mut sel = SelectionTracker::new();
        let page = ids(&[0, 1]);
        sel.select(RowId(9));
        sel.select(RowId(0));
        sel.toggle_all_visible(&page);
        assert_eq!(sel.ids(), ids(&[0, 1, 9]));
        sel.toggle_all_visible(&page);
        assert_eq!(sel.ids(), ids(&[9]));
        sel.clear_all();
        assert_eq!(sel.len(), 0);
    }
}
