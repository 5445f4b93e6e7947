//! Row selection state

use std::collections::BTreeSet;
use std::collections::HashSet;

use serde::Deserialize;
use serde::Serialize;

use crate::model::RowId;

/// Selection mode for the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    /// At most one row (radio-button style).
    Single,
    /// Any number of rows (checkbox style).
    #[default]
    Multiple,
}

/// Tracks selected rows by id, plus the anchor used for range extension.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    mode: SelectionMode,
    selected: BTreeSet<RowId>,
    anchor: Option<RowId>,
}

impl SelectionState {
    /// Creates an empty selection in the given mode.
    pub fn new(mode: SelectionMode) -> Self {
        Self {
            mode,
            selected: BTreeSet::new(),
            anchor: None,
        }
    }

    /// Returns the selection mode.
    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    /// Switches mode, collapsing to a single row when entering `Single`.
    pub fn set_mode(&mut self, mode: SelectionMode) {
        self.mode = mode;
        self.enforce_mode();
    }

    /// Replaces the selection and anchor.
    pub fn replace(&mut self, ids: impl IntoIterator<Item = RowId>, anchor: Option<RowId>) {
        self.selected = ids.into_iter().collect();
        self.anchor = anchor;
        self.enforce_mode();
    }

    /// Selects exactly one row and makes it the anchor.
    pub fn select_only(&mut self, id: RowId) {
        self.selected.clear();
        self.selected.insert(id.clone());
        self.anchor = Some(id);
    }

    /// Toggles one row. Returns `true` if it is selected afterwards.
    pub fn toggle(&mut self, id: RowId) -> bool {
        if self.selected.remove(&id) {
            if self.anchor.as_ref() == Some(&id) {
                self.anchor = None;
            }
            return false;
        }
        if self.mode == SelectionMode::Single {
            self.selected.clear();
        }
        self.selected.insert(id.clone());
        self.anchor = Some(id);
        true
    }

    /// Selects the rows between the anchor and `id` in `order`, inclusive.
    ///
    /// Without an anchor (or in single mode, or when either end isn't in
    /// `order`) this behaves like [`select_only`](Self::select_only). The
    /// anchor itself doesn't move.
    pub fn extend_to(&mut self, id: RowId, order: &[RowId]) {
        let range = match (&self.anchor, self.mode) {
            (Some(anchor), SelectionMode::Multiple) => {
                let from = order.iter().position(|r| r == anchor);
                let to = order.iter().position(|r| *r == id);
                from.zip(to).map(|(a, b)| (a.min(b), a.max(b)))
            }
            _ => None,
        };
        match range {
            Some((start, end)) => {
                self.selected = order[start..=end].iter().cloned().collect();
            }
            None => self.select_only(id),
        }
    }

    /// Clears the selection and the anchor.
    pub fn clear(&mut self) {
        self.selected.clear();
        self.anchor = None;
    }

    /// Removes ids that aren't loaded. Returns `true` if anything was removed.
    pub fn prune(&mut self, loaded: &HashSet<RowId>) -> bool {
        let before = self.selected.len();
        self.selected.retain(|id| loaded.contains(id));
        if self.anchor.as_ref().is_some_and(|a| !loaded.contains(a)) {
            self.anchor = None;
        }
        self.selected.len() != before
    }

    /// Checks if a row is selected.
    pub fn is_selected(&self, id: &RowId) -> bool {
        self.selected.contains(id)
    }

    /// Returns the selected ids in sorted order.
    pub fn selected(&self) -> impl Iterator<Item = &RowId> {
        self.selected.iter()
    }

    /// Returns the anchor row, if any.
    pub fn anchor(&self) -> Option<&RowId> {
        self.anchor.as_ref()
    }

    /// Returns the number of selected rows.
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    /// Returns `true` if nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    fn enforce_mode(&mut self) {
        if self.mode != SelectionMode::Single || self.selected.len() <= 1 {
            return;
        }
        let keep = self
            .anchor
            .clone()
            .filter(|a| self.selected.contains(a))
            .or_else(|| self.selected.iter().next().cloned());
        self.selected.clear();
        if let Some(keep) = keep {
            self.selected.insert(keep.clone());
            self.anchor = Some(keep);
        }
    }
}
