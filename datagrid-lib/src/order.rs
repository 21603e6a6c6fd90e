//! Column order resolution and reordering.
//!
//! Every function here is pure: it takes an order and returns a new one.
//! Operations that cannot apply (unknown id, already at the edge, source equal
//! to target) return the input unchanged.

use serde::Deserialize;
use serde::Serialize;

use crate::model::ColumnId;

/// Direction of a single-step column move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveDirection {
    Left,
    Right,
}

/// Where a dragged column lands relative to the drop target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DropPosition {
    Before,
    After,
}

/// Computes the order columns are displayed in.
///
/// An empty persisted order yields the live columns in definition order.
/// Otherwise the persisted order is kept for ids that still exist, and live
/// columns it does not mention are appended in definition order. The result
/// is always a permutation of `live`.
///
/// # Example
///
/// ```
/// use datagrid_lib::order::effective_order;
///
/// let persisted = vec!["b".to_string(), "gone".to_string(), "a".to_string()];
/// let live = vec!["a".to_string(), "b".to_string(), "c".to_string()];
/// assert_eq!(effective_order(&persisted, &live), vec!["b", "a", "c"]);
/// ```
pub fn effective_order(persisted: &[ColumnId], live: &[ColumnId]) -> Vec<ColumnId> {
    let mut order: Vec<ColumnId> = Vec::with_capacity(live.len());

    for id in persisted {
        if live.contains(id) && !order.contains(id) {
            order.push(id.clone());
        }
    }
    for id in live {
        if !order.contains(id) {
            order.push(id.clone());
        }
    }

    order
}

/// Swaps a column with its neighbour in the given direction.
pub fn move_adjacent(order: &[ColumnId], column: &str, direction: MoveDirection) -> Vec<ColumnId> {
    let mut next = order.to_vec();
    let Some(index) = order.iter().position(|id| id == column) else {
        return next;
    };

    let target = match direction {
        MoveDirection::Left => index.checked_sub(1),
        MoveDirection::Right => Some(index + 1).filter(|target| *target < order.len()),
    };

    if let Some(target) = target {
        next.swap(index, target);
    }
    next
}

/// Moves `source` to sit immediately before or after `target`.
pub fn reorder(order: &[ColumnId], source: &str, target: &str, position: DropPosition) -> Vec<ColumnId> {
    let mut next = order.to_vec();
    if source.is_empty() || target.is_empty() || source == target {
        return next;
    }

    let (Some(source_index), Some(mut target_index)) = (
        order.iter().position(|id| id == source),
        order.iter().position(|id| id == target),
    ) else {
        return next;
    };

    let moved = next.remove(source_index);

    // Removing the source shifts everything after it one slot left.
    if source_index < target_index {
        target_index -= 1;
    }
    if position == DropPosition::After {
        target_index += 1;
    }

    let target_index = target_index.min(next.len());
    next.insert(target_index, moved);
    next
}

/// Puts a column back at its definition position.
///
/// The column is removed and reinserted at `min(definition_index, len)`.
pub fn reset_column(order: &[ColumnId], column: &str, definition_index: usize) -> Vec<ColumnId> {
    let mut next: Vec<ColumnId> = order.iter().filter(|id| *id != column).cloned().collect();
    let index = definition_index.min(next.len());
    next.insert(index, column.to_string());
    next
}
