//! Filter stage
//!
//! Matching never fails: a spec that can't be evaluated against a cell
//! (unknown column, non-numeric operand, unparsable date) simply doesn't
//! match.

use std::cmp::Ordering;

use crate::model::ColumnDef;
use crate::model::FilterKind;
use crate::model::Row;
use crate::model::Value;
use crate::model::find_column;
use crate::state::FilterModel;
use crate::state::FilterSpec;

/// A filter model resolved against the column set.
pub(crate) struct RowFilter<'a> {
    /// `None` marks a filter on a column that can't match anything.
    column_filters: Vec<Option<(&'a ColumnDef, &'a str, &'a FilterSpec)>>,
    quick_fields: Vec<&'a str>,
    quick_needle: Option<String>,
}

impl<'a> RowFilter<'a> {
    pub(crate) fn new(columns: &'a [ColumnDef], filter: &'a FilterModel, quick_filter: &str) -> Self {
        let column_filters = filter
            .iter()
            .map(|(col_id, spec)| {
                let column = find_column(columns, col_id)?;
                let field = column.field_name()?;
                Some((column, field, spec))
            })
            .collect();

        let needle = quick_filter.trim();
        let quick_needle = (!needle.is_empty()).then(|| needle.to_lowercase());
        let quick_fields = columns
            .iter()
            .filter(|c| c.filterable)
            .filter_map(|c| c.field_name())
            .collect();

        Self {
            column_filters,
            quick_fields,
            quick_needle,
        }
    }

    /// Returns `true` if no filtering applies.
    pub(crate) fn is_pass_through(&self) -> bool {
        self.column_filters.is_empty() && self.quick_needle.is_none()
    }

    /// AND across column filters, then OR of the quick filter across
    /// filterable columns.
    pub(crate) fn matches(&self, row: &Row) -> bool {
        let columns_pass = self.column_filters.iter().all(|resolved| match resolved {
            Some((column, field, spec)) => matches_spec(spec, row.value(field), column.filter_kind),
            None => false,
        });
        if !columns_pass {
            return false;
        }

        match &self.quick_needle {
            None => true,
            Some(needle) => self
                .quick_fields
                .iter()
                .any(|field| contains_ci(row.value(field), needle)),
        }
    }
}

/// Evaluates one filter spec against a cell value.
pub fn matches_spec(spec: &FilterSpec, cell: &Value, kind: FilterKind) -> bool {
    match spec {
        FilterSpec::Contains { filter } => {
            filter.is_empty() || contains_ci(cell, &filter.to_lowercase())
        }
        FilterSpec::Equals { filter } => coerced_eq(cell, filter, kind),
        FilterSpec::GreaterThan { filter } => {
            ordered_cmp(cell, filter, kind) == Some(Ordering::Greater)
        }
        FilterSpec::LessThan { filter } => ordered_cmp(cell, filter, kind) == Some(Ordering::Less),
        FilterSpec::Between { from, to } => {
            let lower = ordered_cmp(cell, from, kind);
            let upper = ordered_cmp(cell, to, kind);
            matches!(lower, Some(Ordering::Greater | Ordering::Equal))
                && matches!(upper, Some(Ordering::Less | Ordering::Equal))
        }
        FilterSpec::Boolean { filter } => cell.coerce_bool() == Some(*filter),
        FilterSpec::Select { values } => values.iter().any(|v| coerced_eq(cell, v, kind)),
    }
}

fn contains_ci(cell: &Value, needle_lower: &str) -> bool {
    !cell.is_null() && cell.to_display_string().to_lowercase().contains(needle_lower)
}

/// Equality after coercing both sides to the column's declared kind.
fn coerced_eq(cell: &Value, filter: &Value, kind: FilterKind) -> bool {
    match kind {
        FilterKind::Number => match (cell.coerce_f64(), filter.coerce_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        },
        FilterKind::Date => match (cell.coerce_datetime(), filter.coerce_datetime()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        },
        FilterKind::Boolean => match (cell.coerce_bool(), filter.coerce_bool()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        },
        FilterKind::Text | FilterKind::Select => {
            if cell.is_null() || filter.is_null() {
                return cell.is_null() && filter.is_null();
            }
            cell.to_display_string() == filter.to_display_string()
        }
    }
}

/// Ordered comparison for `greaterThan`, `lessThan` and `between`.
///
/// Date columns compare as dates. Everything else compares numerically,
/// falling back to dates when both sides are date-like.
fn ordered_cmp(cell: &Value, filter: &Value, kind: FilterKind) -> Option<Ordering> {
    let as_dates = || Some(cell.coerce_datetime()?.cmp(&filter.coerce_datetime()?));
    if kind == FilterKind::Date {
        return as_dates();
    }
    match (cell.coerce_f64(), filter.coerce_f64()) {
        (Some(a), Some(b)) => a.partial_cmp(&b),
        (None, None) => as_dates(),
        _ => None,
    }
}
