//! Persisted view preferences

use std::collections::BTreeMap;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use super::ColumnId;
use crate::TableConfig;

/// Which edge a column is pinned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinSide {
    Left,
    Right,
}

/// Columns pinned to each edge, in display order.
///
/// A column id appears in at most one of the two lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnPinning {
    #[serde(default)]
    pub left: Vec<ColumnId>,
    #[serde(default)]
    pub right: Vec<ColumnId>,
}

impl ColumnPinning {
    /// Number of pinned columns on both sides.
    pub fn len(&self) -> usize {
        self.left.len() + self.right.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty() && self.right.is_empty()
    }

    /// Returns the side a column is pinned to.
    pub fn side_of(&self, column: &str) -> Option<PinSide> {
        if self.left.iter().any(|id| id == column) {
            Some(PinSide::Left)
        } else if self.right.iter().any(|id| id == column) {
            Some(PinSide::Right)
        } else {
            None
        }
    }

    /// Removes a column from both sides.
    pub fn unpin(&mut self, column: &str) {
        self.left.retain(|id| id != column);
        self.right.retain(|id| id != column);
    }

    /// Pins a column to one side, moving it off the other side first.
    pub fn pin(&mut self, column: &str, side: PinSide) {
        if self.side_of(column) == Some(side) {
            return;
        }
        self.unpin(column);
        match side {
            PinSide::Left => self.left.push(column.to_string()),
            PinSide::Right => self.right.push(column.to_string()),
        }
    }
}

/// One entry of the sort priority list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortEntry {
    #[serde(rename = "id")]
    pub column: ColumnId,
    #[serde(rename = "desc", default)]
    pub descending: bool,
}

impl SortEntry {
    pub fn asc(column: impl Into<ColumnId>) -> Self {
        Self {
            column: column.into(),
            descending: false,
        }
    }

    pub fn desc(column: impl Into<ColumnId>) -> Self {
        Self {
            column: column.into(),
            descending: true,
        }
    }

    /// Direction as sent to the server.
    pub fn direction(&self) -> &'static str {
        if self.descending { "desc" } else { "asc" }
    }
}

/// The view-shaping part of the preferences, shared by the persisted record
/// and the live view state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewPreferences {
    /// Absent key means visible.
    #[serde(default)]
    pub column_visibility: BTreeMap<ColumnId, bool>,
    /// Empty means definition order.
    #[serde(default)]
    pub column_order: Vec<ColumnId>,
    #[serde(default)]
    pub column_pinning: ColumnPinning,
    /// First entry is the primary sort.
    #[serde(default)]
    pub sorting: Vec<SortEntry>,
    pub per_page: u32,
}

impl ViewPreferences {
    /// Schema defaults: everything visible, definition order, nothing pinned
    /// or sorted, default page size.
    pub fn defaults(config: &TableConfig) -> Self {
        Self {
            column_visibility: BTreeMap::new(),
            column_order: Vec::new(),
            column_pinning: ColumnPinning::default(),
            sorting: Vec::new(),
            per_page: config.default_per_page,
        }
    }

    /// Whether a column is visible, treating an absent entry as visible.
    pub fn resolve_visibility(&self, column: &str) -> bool {
        resolve_visibility(&self.column_visibility, column)
    }
}

/// Resolves a column's visibility against a visibility map.
///
/// Only an explicit `false` hides a column.
pub fn resolve_visibility(visibility: &BTreeMap<ColumnId, bool>, column: &str) -> bool {
    visibility.get(column).copied().unwrap_or(true)
}

/// The persisted, versioned preference record.
///
/// # Example
///
/// ```
/// use datagrid_lib::model::TablePreferences;
/// use datagrid_lib::TableConfig;
///
/// let prefs = TablePreferences::defaults(&TableConfig::default());
/// assert_eq!(prefs.view.per_page, 10);
/// assert!(prefs.view.resolve_visibility("anything"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TablePreferences {
    #[serde(flatten)]
    pub view: ViewPreferences,
    pub version: u32,
    /// Time of the last mutation; `None` for a record never mutated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl TablePreferences {
    /// A fresh default record.
    pub fn defaults(config: &TableConfig) -> Self {
        Self {
            view: ViewPreferences::defaults(config),
            version: config.schema_version,
            updated_at: None,
        }
    }

    /// Applies a partial update. Fields the patch leaves unset keep their
    /// previous value; supplied fields are moved in, never shared.
    pub fn merge(&mut self, patch: PreferencesPatch) {
        if let Some(visibility) = patch.column_visibility {
            self.view.column_visibility = visibility;
        }
        if let Some(order) = patch.column_order {
            self.view.column_order = order;
        }
        if let Some(pinning) = patch.column_pinning {
            self.view.column_pinning = pinning;
        }
        if let Some(sorting) = patch.sorting {
            self.view.sorting = sorting;
        }
        if let Some(per_page) = patch.per_page {
            self.view.per_page = per_page;
        }
    }
}

/// A partial preference update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreferencesPatch {
    pub column_visibility: Option<BTreeMap<ColumnId, bool>>,
    pub column_order: Option<Vec<ColumnId>>,
    pub column_pinning: Option<ColumnPinning>,
    pub sorting: Option<Vec<SortEntry>>,
    pub per_page: Option<u32>,
}

impl PreferencesPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn column_visibility(mut self, visibility: BTreeMap<ColumnId, bool>) -> Self {
        self.column_visibility = Some(visibility);
        self
    }

    pub fn column_order(mut self, order: Vec<ColumnId>) -> Self {
        self.column_order = Some(order);
        self
    }

    pub fn column_pinning(mut self, pinning: ColumnPinning) -> Self {
        self.column_pinning = Some(pinning);
        self
    }

    pub fn sorting(mut self, sorting: Vec<SortEntry>) -> Self {
        self.sorting = Some(sorting);
        self
    }

    pub fn per_page(mut self, per_page: u32) -> Self {
        self.per_page = Some(per_page);
        self
    }

    /// A patch that replaces every view field.
    pub fn from_view(view: &ViewPreferences) -> Self {
        Self {
            column_visibility: Some(view.column_visibility.clone()),
            column_order: Some(view.column_order.clone()),
            column_pinning: Some(view.column_pinning.clone()),
            sorting: Some(view.sorting.clone()),
            per_page: Some(view.per_page),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format_uses_camel_case() {
        let mut prefs = TablePreferences::defaults(&TableConfig::default());
        prefs.view.sorting.push(SortEntry::desc("name"));
        prefs.view.column_pinning.left.push("id".into());

        let json = serde_json::to_value(&prefs).unwrap();
        assert_eq!(json["perPage"], 10);
        assert_eq!(json["version"], 1);
        assert_eq!(json["sorting"][0]["id"], "name");
        assert_eq!(json["sorting"][0]["desc"], true);
        assert_eq!(json["columnPinning"]["left"][0], "id");
        assert!(json.get("updatedAt").is_none());
    }

    #[test]
    fn test_merge_keeps_unsupplied_fields() {
        let mut prefs = TablePreferences::defaults(&TableConfig::default());
        prefs.view.column_order = vec!["b".into(), "a".into()];

        prefs.merge(PreferencesPatch::new().per_page(25));

        assert_eq!(prefs.view.per_page, 25);
        assert_eq!(prefs.view.column_order, vec!["b", "a"]);
    }

    #[test]
    fn test_pinning_moves_between_sides() {
        let mut pinning = ColumnPinning::default();
        pinning.pin("a", PinSide::Left);
        pinning.pin("a", PinSide::Right);
        assert!(pinning.left.is_empty());
        assert_eq!(pinning.right, vec!["a"]);
        assert_eq!(pinning.len(), 1);
    }

    #[test]
    fn test_resolve_visibility_defaults_to_visible() {
        let mut visibility = BTreeMap::new();
        visibility.insert("hidden".to_string(), false);
        visibility.insert("shown".to_string(), true);
        assert!(!resolve_visibility(&visibility, "hidden"));
        assert!(resolve_visibility(&visibility, "shown"));
        assert!(resolve_visibility(&visibility, "unset"));
    }
}
