#[cfg(feature = "parallel-diff")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::Table;

/// Row count above which the `parallel-diff` feature compares rows in parallel.
#[cfg(feature = "parallel-diff")]
pub const PARALLEL_DIFF_MIN_ROWS: usize = 4_096;

/// Change to apply to one dataset of a live view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataAction {
    NoOp,
    /// Drop every row of the dataset, if the view has it.
    Remove,
    InsertAll,
    /// Insert only the rows starting at this offset.
    InsertFrom(usize),
    /// Clear the dataset and insert every row fresh.
    ReplaceAll,
}

/// Decides how to move a view dataset from `prev` to `next`.
///
/// Pure over table shape and cell bytes; the tables' identities never
/// matter.
#[must_use]
pub fn reconcile(prev: Option<&Table>, next: Option<&Table>) -> DataAction {
    let Some(next) = next.filter(|table| !table.is_empty()) else {
        return DataAction::Remove;
    };
    let Some(prev) = prev.filter(|table| !table.is_empty()) else {
        return DataAction::InsertAll;
    };

    if !data_is_append_of_prev(prev, next) {
        DataAction::ReplaceAll
    } else if next.row_count() == prev.row_count() {
        DataAction::NoOp
    } else {
        DataAction::InsertFrom(prev.row_count())
    }
}

/// Returns `true` when `next` keeps `prev`'s column count, has at least as
/// many rows, and every row of `prev` is byte-identical in `next`.
#[must_use]
pub fn data_is_append_of_prev(prev: &Table, next: &Table) -> bool {
    if prev.column_count() != next.column_count() || next.row_count() < prev.row_count() {
        return false;
    }
    overlapping_rows_match(prev, next)
}

fn overlapping_rows_match(prev: &Table, next: &Table) -> bool {
    let rows = prev.row_count();

    #[cfg(feature = "parallel-diff")]
    {
        if rows >= PARALLEL_DIFF_MIN_ROWS {
            return (0..rows)
                .into_par_iter()
                .all(|row| prev.row_matches(next, row));
        }
    }

    (0..rows).all(|row| prev.row_matches(next, row))
}

#[cfg(test)]
mod tests {
    use super::{DataAction, reconcile};
    use crate::core::{Column, Table};

    fn table(values: &[i64]) -> Table {
        Table::new(vec![Column::new("v", values.iter().copied())]).expect("table")
    }

    #[test]
    fn shrinking_table_is_replaced() {
        let prev = table(&[1, 2, 3]);
        let next = table(&[1, 2]);
        assert_eq!(reconcile(Some(&prev), Some(&next)), DataAction::ReplaceAll);
    }

    #[test]
    fn column_count_change_is_replaced() {
        let prev = table(&[1, 2]);
        let next = Table::new(vec![
            Column::new("v", [1_i64, 2, 3]),
            Column::new("w", [0_i64, 0, 0]),
        ])
        .expect("table");
        assert_eq!(reconcile(Some(&prev), Some(&next)), DataAction::ReplaceAll);
    }

    #[test]
    fn empty_previous_table_inserts_everything() {
        let prev = Table::empty();
        let next = table(&[7]);
        assert_eq!(reconcile(Some(&prev), Some(&next)), DataAction::InsertAll);
        assert_eq!(reconcile(None, Some(&next)), DataAction::InsertAll);
    }
}
