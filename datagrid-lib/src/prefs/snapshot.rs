//! Structural signatures of view preferences.
//!
//! Two view states that mean the same thing produce the same signature, no
//! matter how they were assembled: visibility keys are ordered, entries that
//! only restate the default (`visible = true`) are dropped, and missing lists
//! compare equal to empty ones.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::ColumnId;
use crate::model::ViewPreferences;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Normalized<'a> {
    column_visibility: BTreeMap<&'a str, bool>,
    column_order: &'a [ColumnId],
    column_pinning: NormalizedPinning<'a>,
    sorting: Vec<NormalizedSort<'a>>,
    per_page: u32,
}

#[derive(Serialize)]
struct NormalizedPinning<'a> {
    left: &'a [ColumnId],
    right: &'a [ColumnId],
}

#[derive(Serialize)]
struct NormalizedSort<'a> {
    id: &'a str,
    desc: bool,
}

/// Canonical string form of a view, used for dirty detection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PreferenceSnapshot(String);

impl PreferenceSnapshot {
    /// Builds the snapshot of a view.
    pub fn of(view: &ViewPreferences) -> Self {
        let normalized = Normalized {
            column_visibility: view
                .column_visibility
                .iter()
                .filter(|(_, visible)| !**visible)
                .map(|(id, visible)| (id.as_str(), *visible))
                .collect(),
            column_order: &view.column_order,
            column_pinning: NormalizedPinning {
                left: &view.column_pinning.left,
                right: &view.column_pinning.right,
            },
            sorting: view
                .sorting
                .iter()
                .map(|entry| NormalizedSort {
                    id: &entry.column,
                    desc: entry.descending,
                })
                .collect(),
            per_page: view.per_page,
        };

        // Serializing string keys, slices and scalars cannot fail.
        Self(serde_json::to_string(&normalized).unwrap_or_default())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
