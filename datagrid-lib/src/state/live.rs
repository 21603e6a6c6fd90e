//! Live view state of one table instance.
//!
//! Every operation either applies fully or returns a [`Rejection`] and leaves
//! the state as it was.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use log::debug;
use serde::Deserialize;
use serde::Serialize;

use super::FilterValue;
use crate::TableConfig;
use crate::error::Rejection;
use crate::model::ColumnDef;
use crate::model::ColumnId;
use crate::model::PageMeta;
use crate::model::PinSide;
use crate::model::SortEntry;
use crate::model::TableDefinition;
use crate::model::TablePreferences;
use crate::model::ViewPreferences;
use crate::order;
use crate::order::DropPosition;
use crate::order::MoveDirection;
use crate::prefs::PreferenceSnapshot;
use crate::prefs::sanitize_record;

/// Direction of a sort priority change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortShift {
    Up,
    Down,
}

/// Where a dragged header currently hovers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragOver {
    pub target: ColumnId,
    pub position: DropPosition,
}

/// View configuration plus the ephemeral state of one table instance.
///
/// # Example
///
/// ```
/// use datagrid_lib::model::{ColumnDef, TableDefinition};
/// use datagrid_lib::state::LiveState;
/// use datagrid_lib::TableConfig;
///
/// let definition = TableDefinition::new(vec![ColumnDef::new("name"), ColumnDef::new("email")]);
/// let mut state = LiveState::new(definition, TableConfig::default());
///
/// state.set_visibility("email", false).unwrap();
/// assert!(state.set_visibility("name", false).is_err());
/// assert_eq!(state.visible_columns(), vec!["name"]);
/// ```
#[derive(Debug, Clone)]
pub struct LiveState {
    definition: TableDefinition,
    config: TableConfig,
    column_ids: Vec<ColumnId>,
    view: ViewPreferences,
    search: String,
    filters: BTreeMap<ColumnId, FilterValue>,
    page_index: u32,
    selection: BTreeSet<String>,
    dragging: Option<ColumnId>,
    drag_over: Option<DragOver>,
}

impl LiveState {
    pub fn new(definition: TableDefinition, config: TableConfig) -> Self {
        let column_ids = definition.column_ids();
        let view = ViewPreferences::defaults(&config);
        Self {
            definition,
            config,
            column_ids,
            view,
            search: String::new(),
            filters: BTreeMap::new(),
            page_index: 0,
            selection: BTreeSet::new(),
            dragging: None,
            drag_over: None,
        }
    }

    /// Seeds pagination from the page the table was mounted with.
    pub fn with_page(mut self, meta: &PageMeta) -> Self {
        self.page_index = meta.current_page.saturating_sub(1);
        if self.config.allows_per_page(meta.per_page) {
            self.view.per_page = meta.per_page;
        }
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn definition(&self) -> &TableDefinition {
        &self.definition
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// Live column ids in definition order.
    pub fn column_ids(&self) -> &[ColumnId] {
        &self.column_ids
    }

    pub fn view(&self) -> &ViewPreferences {
        &self.view
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn filters(&self) -> &BTreeMap<ColumnId, FilterValue> {
        &self.filters
    }

    pub fn filter(&self, column: &str) -> Option<&FilterValue> {
        self.filters.get(column)
    }

    /// 0-based page index.
    pub fn page_index(&self) -> u32 {
        self.page_index
    }

    /// 1-based page number, as sent to the server.
    pub fn page(&self) -> u32 {
        self.page_index + 1
    }

    pub fn per_page(&self) -> u32 {
        self.view.per_page
    }

    pub fn selection(&self) -> &BTreeSet<String> {
        &self.selection
    }

    pub fn dragging(&self) -> Option<&str> {
        self.dragging.as_deref()
    }

    /// The header the dragged column currently hovers.
    pub fn drag_target(&self) -> Option<&DragOver> {
        self.drag_over.as_ref()
    }

    /// Structural snapshot of the view part, for dirty detection.
    pub fn snapshot(&self) -> PreferenceSnapshot {
        PreferenceSnapshot::of(&self.view)
    }

    /// The order columns are displayed in, ignoring pinning.
    pub fn effective_order(&self) -> Vec<ColumnId> {
        order::effective_order(&self.view.column_order, &self.column_ids)
    }

    pub fn is_visible(&self, column: &str) -> bool {
        self.view.resolve_visibility(column)
    }

    /// Visible columns in effective order.
    pub fn visible_columns(&self) -> Vec<ColumnId> {
        self.effective_order()
            .into_iter()
            .filter(|id| self.is_visible(id))
            .collect()
    }

    /// Visible columns as rendered: left-pinned, unpinned, right-pinned.
    pub fn display_columns(&self) -> Vec<ColumnId> {
        let pinning = &self.view.column_pinning;
        let visible = self.visible_columns();

        let pinned_on = |side: &[ColumnId]| -> Vec<ColumnId> {
            side.iter().filter(|id| visible.contains(id)).cloned().collect()
        };

        let mut columns = pinned_on(&pinning.left);
        columns.extend(
            visible
                .iter()
                .filter(|id| pinning.side_of(id).is_none())
                .cloned(),
        );
        columns.extend(pinned_on(&pinning.right));
        columns
    }

    fn require(&self, column: &str) -> Result<&ColumnDef, Rejection> {
        if !self.column_ids.iter().any(|id| id == column) {
            return Err(Rejection::unknown(column));
        }
        self.definition
            .column(column)
            .ok_or_else(|| Rejection::unknown(column))
    }

    fn visible_count(&self) -> usize {
        self.column_ids
            .iter()
            .filter(|id| self.view.resolve_visibility(id))
            .count()
    }

    // =========================================================================
    // Visibility
    // =========================================================================

    /// Shows or hides a column. Hiding the last visible column is rejected.
    pub fn set_visibility(&mut self, column: &str, visible: bool) -> Result<(), Rejection> {
        let hideable = self.require(column)?.hideable;

        if visible {
            self.view.column_visibility.insert(column.to_string(), true);
            return Ok(());
        }
        if !hideable {
            return Err(Rejection::NotHideable {
                column: column.to_string(),
            });
        }
        if !self.is_visible(column) {
            return Ok(());
        }
        if self.visible_count() <= 1 {
            return Err(Rejection::LastVisibleColumn);
        }

        self.view.column_visibility.insert(column.to_string(), false);
        Ok(())
    }

    pub fn toggle_visibility(&mut self, column: &str) -> Result<(), Rejection> {
        let visible = self.is_visible(column);
        self.set_visibility(column, !visible)
    }

    pub fn show_all(&mut self) {
        self.view.column_visibility.clear();
    }

    /// Hides every hideable column. Rejected when nothing would stay visible.
    pub fn hide_all(&mut self) -> Result<(), Rejection> {
        let hideable: Vec<ColumnId> = self
            .column_ids
            .iter()
            .filter(|id| self.definition.column(id).is_some_and(|column| column.hideable))
            .cloned()
            .collect();

        let remaining = self
            .column_ids
            .iter()
            .filter(|id| !hideable.contains(id) && self.is_visible(id))
            .count();
        if remaining == 0 {
            return Err(Rejection::LastVisibleColumn);
        }

        for id in hideable {
            self.view.column_visibility.insert(id, false);
        }
        Ok(())
    }

    // =========================================================================
    // Pinning
    // =========================================================================

    /// Pins a column to a side, or unpins it with `None`.
    ///
    /// Moving an already pinned column to the other side does not count
    /// against the pin limit.
    pub fn pin(&mut self, column: &str, side: Option<PinSide>) -> Result<(), Rejection> {
        let pinnable = self.require(column)?.pinnable;

        let Some(side) = side else {
            self.view.column_pinning.unpin(column);
            return Ok(());
        };

        if !pinnable {
            return Err(Rejection::NotPinnable {
                column: column.to_string(),
            });
        }

        let pinning = &self.view.column_pinning;
        if pinning.side_of(column).is_none() && pinning.len() >= self.config.max_pinned {
            return Err(Rejection::PinLimitReached {
                max: self.config.max_pinned,
            });
        }

        self.view.column_pinning.pin(column, side);
        Ok(())
    }

    pub fn reset_pinning(&mut self) {
        self.view.column_pinning = Default::default();
    }

    // =========================================================================
    // Sorting
    // =========================================================================

    fn require_sortable(&self, column: &str) -> Result<(), Rejection> {
        if self.require(column)?.sortable {
            Ok(())
        } else {
            Err(Rejection::NotSortable {
                column: column.to_string(),
            })
        }
    }

    /// Appends an ascending sort entry with the lowest priority.
    pub fn add_sort(&mut self, column: &str) -> Result<(), Rejection> {
        self.require_sortable(column)?;

        if self.view.sorting.iter().any(|entry| entry.column == column) {
            return Err(Rejection::SortColumnExists {
                column: column.to_string(),
            });
        }
        if self.view.sorting.len() >= self.config.max_sorting {
            return Err(Rejection::SortLimitReached {
                max: self.config.max_sorting,
            });
        }

        self.view.sorting.push(SortEntry::asc(column));
        Ok(())
    }

    /// Header click: flips the primary sort if it is this column, otherwise
    /// sorts by this column alone, ascending.
    pub fn toggle_sort(&mut self, column: &str) -> Result<(), Rejection> {
        self.require_sortable(column)?;

        let is_primary = self.view.sorting.first().is_some_and(|entry| entry.column == column);
        if !is_primary {
            self.view.sorting = vec![SortEntry::asc(column)];
        } else if let Some(primary) = self.view.sorting.first_mut() {
            primary.descending = !primary.descending;
        }
        Ok(())
    }

    /// Flips the direction of an existing sort entry.
    pub fn toggle_sort_direction(&mut self, column: &str) -> Result<(), Rejection> {
        self.require(column)?;
        if let Some(entry) = self.view.sorting.iter_mut().find(|entry| entry.column == column) {
            entry.descending = !entry.descending;
        }
        Ok(())
    }

    pub fn remove_sort(&mut self, column: &str) {
        self.view.sorting.retain(|entry| entry.column != column);
    }

    /// Swaps a sort entry with its neighbour in the priority list.
    pub fn move_sort_priority(&mut self, column: &str, shift: SortShift) {
        let Some(index) = self.view.sorting.iter().position(|entry| entry.column == column) else {
            return;
        };
        let target = match shift {
            SortShift::Up => index.checked_sub(1),
            SortShift::Down => Some(index + 1).filter(|target| *target < self.view.sorting.len()),
        };
        if let Some(target) = target {
            self.view.sorting.swap(index, target);
        }
    }

    pub fn reset_sorting(&mut self) {
        self.view.sorting.clear();
    }

    // =========================================================================
    // Column order
    // =========================================================================

    fn require_reorderable(&self, column: &str) -> Result<(), Rejection> {
        if self.require(column)?.reorderable {
            Ok(())
        } else {
            Err(Rejection::NotReorderable {
                column: column.to_string(),
            })
        }
    }

    pub fn move_column(&mut self, column: &str, direction: MoveDirection) -> Result<(), Rejection> {
        self.require_reorderable(column)?;
        self.view.column_order = order::move_adjacent(&self.effective_order(), column, direction);
        Ok(())
    }

    pub fn reorder_column(
        &mut self,
        source: &str,
        target: &str,
        position: DropPosition,
    ) -> Result<(), Rejection> {
        self.require_reorderable(source)?;
        self.require(target)?;
        self.view.column_order = order::reorder(&self.effective_order(), source, target, position);
        Ok(())
    }

    pub fn reset_column_order(&mut self) {
        self.view.column_order.clear();
    }

    /// Restores one column: no sort, unpinned, visible, back at its
    /// definition position.
    pub fn reset_column(&mut self, column: &str) -> Result<(), Rejection> {
        self.require(column)?;
        let index = self
            .definition
            .definition_index(column)
            .unwrap_or(self.column_ids.len());

        let next_order = order::reset_column(&self.effective_order(), column, index);

        self.view.sorting.retain(|entry| entry.column != column);
        self.view.column_pinning.unpin(column);
        self.view.column_visibility.insert(column.to_string(), true);
        self.view.column_order = next_order;
        Ok(())
    }

    // =========================================================================
    // Drag and drop
    // =========================================================================

    /// Starts dragging a header.
    pub fn drag_start(&mut self, column: &str) -> Result<(), Rejection> {
        self.require_reorderable(column)?;
        if self.column_ids.len() < 2 {
            return Err(Rejection::NotReorderable {
                column: column.to_string(),
            });
        }
        self.dragging = Some(column.to_string());
        self.drag_over = None;
        Ok(())
    }

    /// Records the header under the pointer. Hovering the dragged header
    /// itself or an unknown one clears the marker.
    pub fn drag_over(&mut self, target: &str, position: DropPosition) {
        let valid = self
            .dragging
            .as_deref()
            .is_some_and(|source| source != target)
            && self.column_ids.iter().any(|id| id == target);

        self.drag_over = valid.then(|| DragOver {
            target: target.to_string(),
            position,
        });
    }

    /// Drops the dragged header onto the current target.
    ///
    /// Returns `true` if the column order changed.
    pub fn drag_end(&mut self) -> bool {
        let source = self.dragging.take();
        let over = self.drag_over.take();

        let (Some(source), Some(over)) = (source, over) else {
            return false;
        };

        let before = self.effective_order();
        match self.reorder_column(&source, &over.target, over.position) {
            Ok(()) => self.effective_order() != before,
            Err(_) => false,
        }
    }

    pub fn drag_cancel(&mut self) {
        self.dragging = None;
        self.drag_over = None;
    }

    // =========================================================================
    // Filters and search
    // =========================================================================

    /// Sets a column filter. An empty value removes the filter.
    pub fn set_filter(&mut self, column: &str, value: impl Into<FilterValue>) -> Result<(), Rejection> {
        let known = self.column_ids.iter().any(|id| id == column)
            || self.definition.filter(column).is_some();
        if !known {
            return Err(Rejection::unknown(column));
        }

        let value = value.into();
        if value.is_empty() {
            self.filters.remove(column);
        } else {
            self.filters.insert(column.to_string(), value);
        }
        Ok(())
    }

    pub fn remove_filter(&mut self, column: &str) {
        self.filters.remove(column);
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
    }

    // =========================================================================
    // Pagination
    // =========================================================================

    /// Goes to a 1-based page, clamped to the pages the server reported.
    pub fn set_page(&mut self, page: u32, meta: &PageMeta) {
        self.page_index = meta.clamp_page(page) - 1;
    }

    /// Changes the page size and returns to the first page.
    pub fn set_per_page(&mut self, per_page: u32) -> Result<(), Rejection> {
        if !self.config.allows_per_page(per_page) {
            return Err(Rejection::PerPageNotAllowed { value: per_page });
        }
        self.view.per_page = per_page;
        self.page_index = 0;
        Ok(())
    }

    // =========================================================================
    // Row selection
    // =========================================================================

    pub fn select(&mut self, row_id: impl Into<String>) {
        self.selection.insert(row_id.into());
    }

    pub fn deselect(&mut self, row_id: &str) {
        self.selection.remove(row_id);
    }

    pub fn toggle_selected(&mut self, row_id: &str) {
        if !self.selection.remove(row_id) {
            self.selection.insert(row_id.to_string());
        }
    }

    pub fn is_selected(&self, row_id: &str) -> bool {
        self.selection.contains(row_id)
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    // =========================================================================
    // Preferences
    // =========================================================================

    /// Takes over a loaded or reset preference record. Returns to the first
    /// page when the page size changes.
    pub fn adopt(&mut self, prefs: &TablePreferences) {
        if prefs.view.per_page != self.view.per_page {
            self.page_index = 0;
        }
        self.view = prefs.view.clone();
    }

    /// Takes over the view of a state built from an earlier definition.
    ///
    /// Column ids the current definition no longer has are dropped from the
    /// view; search, page and the filters that still apply are kept.
    pub fn carry_over(&mut self, previous: &LiveState) {
        let record = TablePreferences {
            view: previous.view.clone(),
            version: self.config.schema_version,
            updated_at: None,
        };
        let valid_ids = (!self.column_ids.is_empty()).then_some(self.column_ids.as_slice());
        self.view = sanitize_record(&record, valid_ids, &self.config).view;
        self.page_index = previous.page_index;
        self.search = previous.search.clone();
        for (column, value) in &previous.filters {
            if self.set_filter(column, value.clone()).is_err() {
                debug!("Dropping filter on removed column '{}'", column);
            }
        }
    }

    /// Reverts the view to schema defaults and returns to the first page.
    pub fn reset_view(&mut self) {
        self.view = ViewPreferences::defaults(&self.config);
        self.page_index = 0;
    }
}
