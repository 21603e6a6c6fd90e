//! Repairing untrusted preference records.
//!
//! Persisted records may come from an older schema, a different column set or
//! a hand-edited store. Sanitizing never fails: wrong-typed fields fall back to
//! their defaults, unknown column ids are dropped, and limits are enforced.

use std::collections::BTreeMap;

use chrono::DateTime;
use chrono::Utc;
use serde_json::Map;
use serde_json::Value;

use crate::TableConfig;
use crate::model::ColumnId;
use crate::model::ColumnPinning;
use crate::model::SortEntry;
use crate::model::TablePreferences;
use crate::model::ViewPreferences;

/// Produces a structurally valid record from arbitrary JSON.
///
/// When `valid_ids` is a non-empty list, every column-bearing field is
/// filtered down to those ids, keeping the relative order of survivors.
/// Applying it twice gives the same result as applying it once.
///
/// # Example
///
/// ```
/// use datagrid_lib::prefs::sanitize;
/// use datagrid_lib::TableConfig;
///
/// let raw = serde_json::json!({
///     "columnOrder": ["b", "gone", "a"],
///     "perPage": "lots",
/// });
/// let ids = vec!["a".to_string(), "b".to_string()];
/// let prefs = sanitize(&raw, Some(ids.as_slice()), &TableConfig::default());
///
/// assert_eq!(prefs.view.column_order, vec!["b", "a"]);
/// assert_eq!(prefs.view.per_page, 10);
/// ```
pub fn sanitize(raw: &Value, valid_ids: Option<&[ColumnId]>, config: &TableConfig) -> TablePreferences {
    let empty = Map::new();
    let object = raw.as_object().unwrap_or(&empty);

    let mut view = ViewPreferences {
        column_visibility: read_visibility(object.get("columnVisibility")),
        column_order: read_ids(object.get("columnOrder")),
        column_pinning: read_pinning(object.get("columnPinning")),
        sorting: read_sorting(object.get("sorting")),
        per_page: read_per_page(object.get("perPage"), config),
    };

    if let Some(valid) = valid_ids.filter(|ids| !ids.is_empty()) {
        restrict_to(&mut view, valid);
    }
    enforce_limits(&mut view, config);

    TablePreferences {
        view,
        version: read_version(object.get("version"), config),
        updated_at: read_timestamp(object.get("updatedAt")),
    }
}

/// Sanitizes an already typed record, e.g. one loaded before the live column
/// set was known.
pub fn sanitize_record(
    prefs: &TablePreferences,
    valid_ids: Option<&[ColumnId]>,
    config: &TableConfig,
) -> TablePreferences {
    match serde_json::to_value(prefs) {
        Ok(raw) => sanitize(&raw, valid_ids, config),
        Err(_) => TablePreferences::defaults(config),
    }
}

fn read_visibility(value: Option<&Value>) -> BTreeMap<ColumnId, bool> {
    let Some(Value::Object(entries)) = value else {
        return BTreeMap::new();
    };
    entries
        .iter()
        .filter_map(|(id, visible)| visible.as_bool().map(|visible| (id.clone(), visible)))
        .collect()
}

fn read_ids(value: Option<&Value>) -> Vec<ColumnId> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    let mut ids: Vec<ColumnId> = Vec::with_capacity(items.len());
    for id in items.iter().filter_map(Value::as_str) {
        if !id.is_empty() && !ids.iter().any(|existing| existing == id) {
            ids.push(id.to_string());
        }
    }
    ids
}

fn read_pinning(value: Option<&Value>) -> ColumnPinning {
    let Some(Value::Object(sides)) = value else {
        return ColumnPinning::default();
    };
    let left = read_ids(sides.get("left"));
    let right = read_ids(sides.get("right"))
        .into_iter()
        .filter(|id| !left.contains(id))
        .collect();
    ColumnPinning { left, right }
}

fn read_sorting(value: Option<&Value>) -> Vec<SortEntry> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    let mut sorting: Vec<SortEntry> = Vec::with_capacity(items.len());
    for item in items {
        let Some(entry) = item.as_object() else {
            continue;
        };
        let column = entry
            .get("id")
            .or_else(|| entry.get("column"))
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty());
        let Some(column) = column else {
            continue;
        };
        if sorting.iter().any(|existing| existing.column == column) {
            continue;
        }
        let descending = entry
            .get("desc")
            .or_else(|| entry.get("descending"))
            .and_then(Value::as_bool)
            .unwrap_or(false);
        sorting.push(SortEntry {
            column: column.to_string(),
            descending,
        });
    }
    sorting
}

fn read_per_page(value: Option<&Value>, config: &TableConfig) -> u32 {
    value
        .and_then(Value::as_u64)
        .and_then(|per_page| u32::try_from(per_page).ok())
        .filter(|per_page| config.allows_per_page(*per_page))
        .unwrap_or(config.default_per_page)
}

fn read_version(value: Option<&Value>, config: &TableConfig) -> u32 {
    value
        .and_then(Value::as_u64)
        .and_then(|version| u32::try_from(version).ok())
        .filter(|version| *version > 0)
        .unwrap_or(config.schema_version)
}

fn read_timestamp(value: Option<&Value>) -> Option<DateTime<Utc>> {
    let text = value?.as_str()?;
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|timestamp| timestamp.with_timezone(&Utc))
}

fn restrict_to(view: &mut ViewPreferences, valid: &[ColumnId]) {
    let known = |id: &ColumnId| valid.contains(id);

    view.column_visibility.retain(|id, _| known(id));
    view.column_order.retain(|id| known(id));
    view.column_pinning.left.retain(|id| known(id));
    view.column_pinning.right.retain(|id| known(id));
    view.sorting.retain(|entry| known(&entry.column));

    // At least one column stays visible.
    if valid.iter().all(|id| !view.resolve_visibility(id)) {
        view.column_visibility.retain(|_, visible| *visible);
    }
}

fn enforce_limits(view: &mut ViewPreferences, config: &TableConfig) {
    let pinning = &mut view.column_pinning;
    pinning.left.truncate(config.max_pinned);
    let remaining = config.max_pinned - pinning.left.len();
    pinning.right.truncate(remaining);

    view.sorting.truncate(config.max_sorting);
}
