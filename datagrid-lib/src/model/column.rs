//! Table definition: columns and filters

use serde::Deserialize;
use serde::Serialize;

/// Opaque column identifier, unique within one table definition.
pub type ColumnId = String;

/// Definition of one leaf column.
///
/// The capability flags default to `true`; a column that opts out of an
/// action has every request for that action rejected.
///
/// # Example
///
/// ```
/// use datagrid_lib::model::ColumnDef;
///
/// let column = ColumnDef::new("email").header("E-mail").sortable(false);
/// assert!(!column.sortable);
/// assert!(column.hideable);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub id: ColumnId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
    #[serde(default = "enabled")]
    pub sortable: bool,
    #[serde(default = "enabled")]
    pub hideable: bool,
    #[serde(default = "enabled")]
    pub pinnable: bool,
    #[serde(default = "enabled")]
    pub reorderable: bool,
}

fn enabled() -> bool {
    true
}

impl ColumnDef {
    /// Creates a column with every capability enabled.
    pub fn new(id: impl Into<ColumnId>) -> Self {
        Self {
            id: id.into(),
            header: None,
            sortable: true,
            hideable: true,
            pinnable: true,
            reorderable: true,
        }
    }

    pub fn header(mut self, header: impl Into<String>) -> Self {
        self.header = Some(header.into());
        self
    }

    pub fn sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    pub fn hideable(mut self, hideable: bool) -> Self {
        self.hideable = hideable;
        self
    }

    pub fn pinnable(mut self, pinnable: bool) -> Self {
        self.pinnable = pinnable;
        self
    }

    pub fn reorderable(mut self, reorderable: bool) -> Self {
        self.reorderable = reorderable;
        self
    }

    /// Returns the header label, falling back to the column id.
    pub fn label(&self) -> &str {
        self.header.as_deref().unwrap_or(&self.id)
    }
}

/// Input widget a filter is rendered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    Select,
    MultiSelect,
    Date,
    DateRange,
    #[default]
    Text,
    Number,
    NumberRange,
}

/// One selectable value of a select-style filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOption {
    pub value: String,
    pub label: String,
}

/// Definition of a column filter.
///
/// When `query_key` is set, the active value is sent to the server as a
/// top-level parameter under that alias instead of `filter[column]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterDef {
    pub column_id: ColumnId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub kind: FilterKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FilterOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_key: Option<String>,
}

impl FilterDef {
    /// Creates a text filter on a column.
    pub fn new(column_id: impl Into<ColumnId>) -> Self {
        Self {
            column_id: column_id.into(),
            label: None,
            kind: FilterKind::default(),
            options: Vec::new(),
            query_key: None,
        }
    }

    pub fn kind(mut self, kind: FilterKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn option(mut self, value: impl Into<String>, label: impl Into<String>) -> Self {
        self.options.push(FilterOption {
            value: value.into(),
            label: label.into(),
        });
        self
    }

    /// Sends the filter value under an external query key instead.
    pub fn query_key(mut self, key: impl Into<String>) -> Self {
        self.query_key = Some(key.into());
        self
    }
}

/// Everything the table knows about itself before any data arrives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDefinition {
    pub columns: Vec<ColumnDef>,
    #[serde(default)]
    pub filters: Vec<FilterDef>,
    /// Explicit table identity used as the preference storage key.
    #[serde(default)]
    pub table_id: Option<String>,
    /// Server resource holding the paginated rows.
    #[serde(default)]
    pub resource_key: Option<String>,
    /// Server resources that must be refreshed together with the rows.
    #[serde(default)]
    pub additional_resource_keys: Vec<String>,
}

impl TableDefinition {
    pub fn new(columns: Vec<ColumnDef>) -> Self {
        Self {
            columns,
            ..Default::default()
        }
    }

    pub fn with_filters(mut self, filters: Vec<FilterDef>) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_table_id(mut self, table_id: impl Into<String>) -> Self {
        self.table_id = Some(table_id.into());
        self
    }

    pub fn with_resource_key(mut self, key: impl Into<String>) -> Self {
        self.resource_key = Some(key.into());
        self
    }

    pub fn with_additional_resource_keys(mut self, keys: Vec<String>) -> Self {
        self.additional_resource_keys = keys;
        self
    }

    /// Column ids in definition order, duplicates and blanks removed.
    pub fn column_ids(&self) -> Vec<ColumnId> {
        let mut ids: Vec<ColumnId> = Vec::with_capacity(self.columns.len());
        for column in &self.columns {
            if !column.id.is_empty() && !ids.contains(&column.id) {
                ids.push(column.id.clone());
            }
        }
        ids
    }

    /// Looks up a column by id.
    pub fn column(&self, id: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|column| column.id == id)
    }

    /// Looks up the filter defined for a column.
    pub fn filter(&self, column_id: &str) -> Option<&FilterDef> {
        self.filters.iter().find(|filter| filter.column_id == column_id)
    }

    /// Position of a column in definition order.
    pub fn definition_index(&self, id: &str) -> Option<usize> {
        self.column_ids().iter().position(|candidate| candidate == id)
    }

    /// Resolves the identity preferences are stored under.
    ///
    /// A non-blank explicit table id wins; otherwise the page path is used.
    /// Without either, preferences are not persisted.
    pub fn resolve_identity(&self, page_path: Option<&str>) -> Option<String> {
        if let Some(id) = self.table_id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
            return Some(id.to_string());
        }
        page_path
            .map(str::trim)
            .filter(|path| !path.is_empty())
            .map(str::to_string)
    }

    /// Server resources to refresh on every fetch.
    ///
    /// The row resource comes first, then `filters` if any filter is defined,
    /// then the additional keys. Returns `None` when there is nothing to scope.
    pub fn partial_reload_keys(&self) -> Option<Vec<String>> {
        let mut keys: Vec<String> = Vec::new();
        let mut push = |key: &str| {
            if !key.is_empty() && !keys.iter().any(|existing| existing == key) {
                keys.push(key.to_string());
            }
        };

        if let Some(resource) = &self.resource_key {
            push(resource);
        }
        if !self.filters.is_empty() {
            push("filters");
        }
        for key in &self.additional_resource_keys {
            push(key);
        }

        if keys.is_empty() { None } else { Some(keys) }
    }
}
