//! Column definitions

use std::cmp::Ordering;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;

use super::Value;

/// Default column width in pixels.
pub const DEFAULT_COLUMN_WIDTH: u32 = 150;

/// How a column claims horizontal space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ColumnWidth {
    /// Fixed width in pixels.
    Fixed(u32),
    /// Share of the remaining space, weighted against other flex columns.
    Flex(u32),
}

impl Default for ColumnWidth {
    fn default() -> Self {
        ColumnWidth::Fixed(DEFAULT_COLUMN_WIDTH)
    }
}

/// Pin position of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Pinned {
    /// Scrolls with the body.
    #[default]
    None,
    /// Pinned to the left edge.
    Left,
    /// Pinned to the right edge.
    Right,
}

/// The declared filter kind of a column.
///
/// Determines how `equals` coerces values and whether ordered comparisons use
/// numbers or dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterKind {
    /// Free text.
    #[default]
    Text,
    /// Numeric.
    Number,
    /// Date or date-time.
    Date,
    /// Boolean.
    Boolean,
    /// One of an enumerated set of values.
    Select,
}

/// A user-supplied ordering for a column's values.
#[derive(Clone)]
pub struct Comparator(Arc<dyn Fn(&Value, &Value) -> Ordering + Send + Sync>);

impl Comparator {
    /// Wraps a comparison function.
    pub fn new(f: impl Fn(&Value, &Value) -> Ordering + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Compares two values.
    pub fn compare(&self, a: &Value, b: &Value) -> Ordering {
        (self.0)(a, b)
    }
}

impl std::fmt::Debug for Comparator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Comparator(..)")
    }
}

/// Definition of a single grid column.
///
/// `id` must be unique across the active column set. A column without a
/// `field` is a display-only column (e.g. a checkbox column); it never sorts,
/// filters or mirrors.
///
/// # Example
///
/// ```
/// use tablekit_lib::model::{ColumnDef, FilterKind, Pinned};
///
/// let salary = ColumnDef::field("salary")
///     .with_filter_kind(FilterKind::Number)
///     .with_width(120);
/// let actions = ColumnDef::new("actions").with_pinned(Pinned::Right);
/// ```
#[derive(Debug, Clone)]
pub struct ColumnDef {
    /// Unique column id.
    pub id: String,
    /// Row field this column displays.
    pub field: Option<String>,
    /// Header label.
    pub header: Option<String>,
    /// Width or flex weight.
    pub width: ColumnWidth,
    /// Whether the column can be sorted.
    pub sortable: bool,
    /// Whether the column takes part in filtering.
    pub filterable: bool,
    /// Whether cells are editable.
    pub editable: bool,
    /// Pin position.
    pub pinned: Pinned,
    /// Hidden columns stay in the model but are not rendered or mirrored.
    pub hidden: bool,
    /// Declared filter kind.
    pub filter_kind: FilterKind,
    /// Custom sort comparator.
    pub comparator: Option<Comparator>,
}

impl ColumnDef {
    /// Creates a display-only column with the given id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            field: None,
            header: None,
            width: ColumnWidth::default(),
            sortable: true,
            filterable: true,
            editable: false,
            pinned: Pinned::None,
            hidden: false,
            filter_kind: FilterKind::Text,
            comparator: None,
        }
    }

    /// Creates a column bound to `field`, using the field name as its id.
    pub fn field(field: impl Into<String>) -> Self {
        let field = field.into();
        Self::new(field.clone()).with_field(field)
    }

    /// Sets the bound field.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Sets the header label.
    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = Some(header.into());
        self
    }

    /// Sets a fixed width in pixels.
    pub fn with_width(mut self, width: u32) -> Self {
        self.width = ColumnWidth::Fixed(width);
        self
    }

    /// Sets a flex weight.
    pub fn with_flex(mut self, flex: u32) -> Self {
        self.width = ColumnWidth::Flex(flex);
        self
    }

    /// Sets whether the column can be sorted.
    pub fn with_sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    /// Sets whether the column takes part in filtering.
    pub fn with_filterable(mut self, filterable: bool) -> Self {
        self.filterable = filterable;
        self
    }

    /// Sets whether cells are editable.
    pub fn with_editable(mut self, editable: bool) -> Self {
        self.editable = editable;
        self
    }

    /// Sets the pin position.
    pub fn with_pinned(mut self, pinned: Pinned) -> Self {
        self.pinned = pinned;
        self
    }

    /// Sets whether the column is hidden.
    pub fn with_hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    /// Sets the declared filter kind.
    pub fn with_filter_kind(mut self, kind: FilterKind) -> Self {
        self.filter_kind = kind;
        self
    }

    /// Sets a custom sort comparator.
    pub fn with_comparator(
        mut self,
        compare: impl Fn(&Value, &Value) -> Ordering + Send + Sync + 'static,
    ) -> Self {
        self.comparator = Some(Comparator::new(compare));
        self
    }

    /// Returns the bound field, if any.
    pub fn field_name(&self) -> Option<&str> {
        self.field.as_deref()
    }

    /// Returns the header label, falling back to the id.
    pub fn header_label(&self) -> &str {
        self.header.as_deref().unwrap_or(&self.id)
    }

    /// Returns `true` if the column is mirrored into the relational table.
    pub fn is_mirrored(&self) -> bool {
        !self.hidden && self.field.is_some()
    }

    /// Compares two cell values using the custom comparator or natural order.
    pub fn compare(&self, a: &Value, b: &Value) -> Ordering {
        match &self.comparator {
            Some(comparator) => comparator.compare(a, b),
            None => a.natural_cmp(b),
        }
    }

    /// Returns the fixed pixel width, or `None` for flex columns.
    pub fn fixed_width(&self) -> Option<u32> {
        match self.width {
            ColumnWidth::Fixed(w) => Some(w),
            ColumnWidth::Flex(_) => None,
        }
    }
}

/// Finds a column by id.
pub fn find_column<'a>(columns: &'a [ColumnDef], id: &str) -> Option<&'a ColumnDef> {
    columns.iter().find(|c| c.id == id)
}
