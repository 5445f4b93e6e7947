//! Sort stage

use std::cmp::Ordering;

use crate::model::ColumnDef;
use crate::model::Row;
use crate::model::find_column;
use crate::state::Direction;
use crate::state::SortModel;

/// A resolved sort key: the column and its direction.
struct SortKey<'a> {
    column: &'a ColumnDef,
    field: &'a str,
    direction: Direction,
}

/// Sorts raw row indices by the sort model.
///
/// Entries whose column is unknown, unsortable or field-less are skipped.
/// Full ties are broken by the original index, so the result is stable
/// regardless of the underlying sort algorithm.
pub fn sort_indices(indices: &mut [usize], rows: &[Row], columns: &[ColumnDef], sort: &SortModel) {
    let keys: Vec<SortKey<'_>> = sort
        .entries()
        .iter()
        .filter_map(|entry| {
            let column = find_column(columns, &entry.col_id)?;
            let field = column.field_name()?;
            column.sortable.then_some(SortKey {
                column,
                field,
                direction: entry.direction,
            })
        })
        .collect();

    if keys.is_empty() {
        return;
    }

    indices.sort_unstable_by(|&a, &b| {
        keys.iter()
            .map(|key| {
                let ord = key
                    .column
                    .compare(rows[a].value(key.field), rows[b].value(key.field));
                match key.direction {
                    Direction::Asc => ord,
                    Direction::Desc => ord.reverse(),
                }
            })
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or_else(|| a.cmp(&b))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Value;

    fn ids(indices: &[usize], rows: &[Row]) -> Vec<i64> {
        indices
            .iter()
            .map(|&i| match rows[i].value("id") {
                Value::Int(v) => *v,
                _ => -1,
            })
            .collect()
    }

    fn people() -> Vec<Row> {
        vec![
            Row::new().set("id", 1).set("age", 30).set("name", "bob"),
            Row::new().set("id", 2).set("age", 25).set("name", "Amy"),
            Row::new().set("id", 3).set("age", 30).set("name", "al"),
        ]
    }

    #[test]
    fn test_ties_keep_original_order() {
        let rows = people();
        let columns = vec![ColumnDef::field("age")];
        let mut indices: Vec<usize> = (0..rows.len()).collect();
        sort_indices(&mut indices, &rows, &columns, &SortModel::asc("age"));
        assert_eq!(ids(&indices, &rows), vec![2, 1, 3]);

        // Descending reverses the key, not the tie-break.
        let mut indices: Vec<usize> = (0..rows.len()).collect();
        sort_indices(&mut indices, &rows, &columns, &SortModel::desc("age"));
        assert_eq!(ids(&indices, &rows), vec![1, 3, 2]);
    }

    #[test]
    fn test_secondary_key_breaks_ties() {
        let rows = people();
        let columns = vec![ColumnDef::field("age"), ColumnDef::field("name")];
        let mut indices: Vec<usize> = (0..rows.len()).collect();
        sort_indices(
            &mut indices,
            &rows,
            &columns,
            &SortModel::desc("age").then_asc("name"),
        );
        assert_eq!(ids(&indices, &rows), vec![3, 1, 2]);
    }

    #[test]
    fn test_custom_comparator() {
        let rows = people();
        let columns = vec![ColumnDef::field("name").with_comparator(|a, b| {
            let len = |v: &Value| v.as_str().map(str::len).unwrap_or(0);
            len(a).cmp(&len(b))
        })];
        let mut indices: Vec<usize> = (0..rows.len()).collect();
        sort_indices(&mut indices, &rows, &columns, &SortModel::asc("name"));
        assert_eq!(ids(&indices, &rows), vec![3, 1, 2]);
    }

    #[test]
    fn test_unsortable_column_ignored() {
        let rows = people();
        let columns = vec![ColumnDef::field("age").with_sortable(false)];
        let mut indices: Vec<usize> = (0..rows.len()).collect();
        sort_indices(&mut indices, &rows, &columns, &SortModel::asc("age"));
        assert_eq!(ids(&indices, &rows), vec![1, 2, 3]);
    }

    #[test]
    fn test_mixed_kinds_and_nan_sort_without_panicking() {
        let rows: Vec<Row> = (0..120i64)
            .map(|i| {
                let score = match i % 4 {
                    0 => Value::Int((i * 37) % 50),
                    1 => Value::from(format!("{}", (i * 13) % 50)),
                    2 => Value::Float(f64::NAN),
                    _ => Value::from(if i % 8 == 3 { "N/A" } else { "1a" }),
                };
                Row::new().set("id", i).set("score", score)
            })
            .collect();
        let columns = vec![ColumnDef::field("score")];

        for sort in [SortModel::asc("score"), SortModel::desc("score")] {
            let mut indices: Vec<usize> = (0..rows.len()).collect();
            sort_indices(&mut indices, &rows, &columns, &sort);
            assert_eq!(indices.len(), rows.len());
            for pair in indices.windows(2) {
                let ord = rows[pair[0]].value("score").natural_cmp(rows[pair[1]].value("score"));
                match sort.entries()[0].direction {
                    Direction::Asc => assert_ne!(ord, Ordering::Greater),
                    Direction::Desc => assert_ne!(ord, Ordering::Less),
                }
            }
        }

        // Numbers come before strings, NaN after the other numbers.
        let mut indices: Vec<usize> = (0..rows.len()).collect();
        sort_indices(&mut indices, &rows, &columns, &SortModel::asc("score"));
        let kinds: Vec<&str> = indices
            .iter()
            .map(|&i| match rows[i].value("score") {
                Value::Float(v) if v.is_nan() => "nan",
                v => v.type_name(),
            })
            .collect();
        assert_eq!(&kinds[..30], &["int"; 30]);
        assert_eq!(&kinds[30..60], &["nan"; 30]);
        assert!(kinds[60..].iter().all(|k| *k == "string"));
    }
}
