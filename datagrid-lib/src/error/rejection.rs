//! Rejected user actions

/// A user action refused because it would break a table invariant.
///
/// A rejection never mutates state. The caller is expected to surface it as
/// a transient warning and carry on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    /// Hiding the column would leave no visible column.
    #[error("at least one column must remain visible")]
    LastVisibleColumn,

    /// Pinning another column would exceed the limit.
    #[error("at most {max} columns can be pinned")]
    PinLimitReached { max: usize },

    /// Adding another sort entry would exceed the limit.
    #[error("at most {max} columns can be sorted")]
    SortLimitReached { max: usize },

    /// The column is already part of the sort priority list.
    #[error("column '{column}' is already sorted")]
    SortColumnExists { column: String },

    /// The column does not allow sorting.
    #[error("column '{column}' cannot be sorted")]
    NotSortable { column: String },

    /// The column does not allow hiding.
    #[error("column '{column}' cannot be hidden")]
    NotHideable { column: String },

    /// The column does not allow pinning.
    #[error("column '{column}' cannot be pinned")]
    NotPinnable { column: String },

    /// The column does not allow reordering.
    #[error("column '{column}' cannot be moved")]
    NotReorderable { column: String },

    /// The column is not part of the table definition.
    #[error("column '{column}' not found")]
    UnknownColumn { column: String },

    /// The page size is not one of the configured options.
    #[error("{value} rows per page is not an available option")]
    PerPageNotAllowed { value: u32 },
}

impl Rejection {
    /// Creates an unknown column rejection.
    pub fn unknown(column: impl Into<String>) -> Self {
        Self::UnknownColumn {
            column: column.into(),
        }
    }
}
