//! Sort model types

use serde::Deserialize;
use serde::Serialize;

/// Sort direction for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Ascending order (A-Z, 0-9).
    Asc,
    /// Descending order (Z-A, 9-0).
    Desc,
}

/// One entry of a sort model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortEntry {
    /// Column id to sort by.
    pub col_id: String,
    /// Sort direction.
    pub direction: Direction,
}

/// Ordered multi-column sort.
///
/// Entry order is priority order: the first entry is the primary key, later
/// entries break ties. An empty model keeps insertion order.
///
/// # Example
///
/// ```
/// use tablekit_lib::state::SortModel;
///
/// let sort = SortModel::desc("salary").then_asc("name");
/// assert_eq!(sort.entries().len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SortModel {
    entries: Vec<SortEntry>,
}

impl SortModel {
    /// Creates an empty sort model (insertion order).
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an ascending sort on a column.
    pub fn asc(col_id: impl Into<String>) -> Self {
        Self::new().then_asc(col_id)
    }

    /// Creates a descending sort on a column.
    pub fn desc(col_id: impl Into<String>) -> Self {
        Self::new().then_desc(col_id)
    }

    /// Adds a lower-priority ascending sort on a column.
    pub fn then_asc(self, col_id: impl Into<String>) -> Self {
        self.then(col_id, Direction::Asc)
    }

    /// Adds a lower-priority descending sort on a column.
    pub fn then_desc(self, col_id: impl Into<String>) -> Self {
        self.then(col_id, Direction::Desc)
    }

    /// Adds a lower-priority sort, replacing any existing entry for the column.
    pub fn then(mut self, col_id: impl Into<String>, direction: Direction) -> Self {
        self.push(col_id, direction);
        self
    }

    /// Appends a sort entry, replacing any existing entry for the column.
    pub fn push(&mut self, col_id: impl Into<String>, direction: Direction) {
        let col_id = col_id.into();
        self.entries.retain(|e| e.col_id != col_id);
        self.entries.push(SortEntry { col_id, direction });
    }

    /// Removes the entry for a column. Returns `true` if one was removed.
    pub fn remove(&mut self, col_id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.col_id != col_id);
        self.entries.len() != before
    }

    /// Returns the direction a column is sorted in, if any.
    pub fn direction_of(&self, col_id: &str) -> Option<Direction> {
        self.entries
            .iter()
            .find(|e| e.col_id == col_id)
            .map(|e| e.direction)
    }

    /// Sets the direction of an existing entry in place, keeping its priority.
    pub(crate) fn set_direction(&mut self, col_id: &str, direction: Direction) -> bool {
        match self.entries.iter_mut().find(|e| e.col_id == col_id) {
            Some(entry) => {
                entry.direction = direction;
                true
            }
            None => false,
        }
    }

    /// Drops the highest-priority entries until at most `max` remain.
    pub(crate) fn truncate_front(&mut self, max: usize) {
        if self.entries.len() > max {
            let excess = self.entries.len() - max;
            self.entries.drain(..excess);
        }
    }

    /// Returns the sort entries in priority order.
    pub fn entries(&self) -> &[SortEntry] {
        &self.entries
    }

    /// Returns `true` if no sort is applied.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<SortEntry> for SortModel {
    fn from_iter<I: IntoIterator<Item = SortEntry>>(iter: I) -> Self {
        let mut model = SortModel::new();
        for entry in iter {
            model.push(entry.col_id, entry.direction);
        }
        model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_replaces_existing_entry() {
        let sort = SortModel::asc("age").then_desc("name").then_desc("age");
        let cols: Vec<_> = sort.entries().iter().map(|e| e.col_id.as_str()).collect();
        assert_eq!(cols, vec!["name", "age"]);
        assert_eq!(sort.direction_of("age"), Some(Direction::Desc));
    }

    #[test]
    fn test_deserialize_from_json() {
        let sort: SortModel =
            serde_json::from_str(r#"[{"colId":"age","direction":"desc"}]"#).unwrap();
        assert_eq!(sort, SortModel::desc("age"));
    }
}
