use chart_sync::api::{DataAction, reconcile};
use chart_sync::core::{Column, Table};
use proptest::prelude::*;

fn table(xs: &[i64], ys: &[f64]) -> Table {
    Table::new(vec![
        Column::new("x", xs.iter().copied()),
        Column::new("y", ys.iter().copied()),
    ])
    .expect("table")
}

fn rows() -> impl Strategy<Value = Vec<(i64, f64)>> {
    prop::collection::vec((any::<i64>(), any::<f64>()), 0..48)
}

fn split(rows: &[(i64, f64)]) -> Table {
    let xs: Vec<i64> = rows.iter().map(|(x, _)| *x).collect();
    let ys: Vec<f64> = rows.iter().map(|(_, y)| *y).collect();
    table(&xs, &ys)
}

fn expected_action(prev: &[(i64, f64)], next: &[(i64, f64)]) -> DataAction {
    if next.is_empty() {
        return DataAction::Remove;
    }
    if prev.is_empty() {
        return DataAction::InsertAll;
    }
    let keeps_prev = next.len() >= prev.len()
        && prev
            .iter()
            .zip(next)
            .all(|((px, py), (nx, ny))| px == nx && py.to_bits() == ny.to_bits());
    if !keeps_prev {
        DataAction::ReplaceAll
    } else if next.len() == prev.len() {
        DataAction::NoOp
    } else {
        DataAction::InsertFrom(prev.len())
    }
}

proptest! {
    #[test]
    fn reconcile_matches_row_model_for_any_table_layout(
        prev in rows(),
        next in rows(),
        cut in 0usize..48
    ) {
        let expected = expected_action(&prev, &next);

        let (a, b) = (split(&prev), split(&next));
        prop_assert_eq!(reconcile(Some(&a), Some(&b)), expected);

        // Same content, assembled from two separately built halves.
        let rebuilt = |rows: &[(i64, f64)]| {
            let at = cut.min(rows.len());
            split(&rows[..at]).concat(&split(&rows[at..])).expect("concat halves")
        };
        let (a_rebuilt, b_rebuilt) = (rebuilt(&prev), rebuilt(&next));
        prop_assert_eq!(reconcile(Some(&a_rebuilt), Some(&b_rebuilt)), expected);
    }

    #[test]
    fn appended_suffix_is_detected_and_reapplying_is_a_no_op(
        head in prop::collection::vec((any::<i64>(), any::<f64>()), 1..32),
        tail in prop::collection::vec((any::<i64>(), any::<f64>()), 1..16)
    ) {
        let prev = split(&head);
        let next = prev.concat(&split(&tail)).expect("concat");

        prop_assert_eq!(reconcile(Some(&prev), Some(&next)), DataAction::InsertFrom(head.len()));

        // The view now holds prev plus the inserted suffix.
        let applied = prev.concat(&Table::new(
            next.columns()
                .iter()
                .map(|column| Column::new(column.name.clone(), column.cells[head.len()..].to_vec()))
                .collect(),
        ).expect("suffix")).expect("apply suffix");
        prop_assert_eq!(reconcile(Some(&applied), Some(&next)), DataAction::NoOp);
    }

    #[test]
    fn empty_next_always_removes(prev in rows()) {
        let prev = split(&prev);
        prop_assert_eq!(reconcile(Some(&prev), Some(&Table::empty())), DataAction::Remove);
        prop_assert_eq!(reconcile(Some(&prev), None), DataAction::Remove);
    }
}
