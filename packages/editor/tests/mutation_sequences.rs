//! Property-based invariant tests for random edit sequences.
//!
//! Whatever sequence of inserts, moves, section moves, duplicates and deletes
//! is thrown at a tree:
//!
//! 1. A successful mutation leaves `verify()` empty (containment, single
//!    listing, matching `parentId`, no cycles, no orphans).
//! 2. A failed mutation leaves the tree exactly as it was.
//! 3. Column resize preserves the pair's total and honors the floor.
//! 4. Export then import gives back the same tree, fractional widths included.

use funnel_editor::{
    compute_resize, export_string, import_str, InsertPosition, Mutation, Node, NodeKind,
    PopupDefinition, Tree, MIN_COLUMN_WIDTH,
};
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

const KINDS: [NodeKind; 4] = [
    NodeKind::Section,
    NodeKind::Row,
    NodeKind::Column,
    NodeKind::Element,
];

#[derive(Debug, Clone)]
enum Op {
    Insert { kind: usize, parent: usize, index: usize },
    Move { node: usize, target: usize, index: usize },
    MoveSection { node: usize, list: usize, index: usize },
    Delete { node: usize },
    Duplicate { node: usize },
    Resize { row: usize, pair: usize, dx: f64, row_width: f64 },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        5 => (0usize..4, any::<usize>(), 0usize..4)
            .prop_map(|(kind, parent, index)| Op::Insert { kind, parent, index }),
        3 => (any::<usize>(), any::<usize>(), 0usize..4)
            .prop_map(|(node, target, index)| Op::Move { node, target, index }),
        1 => (any::<usize>(), 0usize..3, 0usize..4)
            .prop_map(|(node, list, index)| Op::MoveSection { node, list, index }),
        1 => any::<usize>().prop_map(|node| Op::Delete { node }),
        1 => any::<usize>().prop_map(|node| Op::Duplicate { node }),
        3 => (any::<usize>(), any::<usize>(), -800.0f64..800.0, 1.0f64..1600.0)
            .prop_map(|(row, pair, dx, row_width)| Op::Resize { row, pair, dx, row_width }),
    ]
}

fn base_tree() -> Tree {
    let mut tree = Tree::new();
    tree.add_popup(PopupDefinition::new("p1", "First")).unwrap();
    tree.add_popup(PopupDefinition::new("p2", "Second")).unwrap();
    tree
}

fn pick(ids: &[String], n: usize) -> Option<String> {
    if ids.is_empty() {
        None
    } else {
        Some(ids[n % ids.len()].clone())
    }
}

fn fresh_id(next: &mut u32) -> String {
    *next += 1;
    format!("n{}", next)
}

fn to_mutation(tree: &Tree, op: &Op, next: &mut u32) -> Option<Mutation> {
    let ids: Vec<String> = tree.nodes.keys().cloned().collect();

    let mutation = match op {
        Op::Insert { kind, parent, index } => {
            let mut parents: Vec<Option<String>> = vec![None];
            parents.extend(ids.iter().cloned().map(Some));
            Mutation::InsertNode {
                node: Node::new(fresh_id(next), KINDS[*kind]),
                position: InsertPosition {
                    parent_id: parents[parent % parents.len()].clone(),
                    index: Some(*index),
                    popup_id: None,
                },
            }
        }
        Op::Move { node, target, index } => Mutation::MoveNode {
            node_id: pick(&ids, *node)?,
            to: InsertPosition::child_of(pick(&ids, *target)?).at(*index),
        },
        Op::MoveSection { node, list, index } => Mutation::MoveSection {
            section_id: pick(&ids, *node)?,
            popup_id: [None, Some("p1".to_string()), Some("p2".to_string())][*list].clone(),
            index: Some(*index),
        },
        Op::Delete { node } => Mutation::DeleteNode {
            node_id: pick(&ids, *node)?,
        },
        Op::Duplicate { node } => Mutation::DuplicateElement {
            element_id: pick(&ids, *node)?,
            new_id: fresh_id(next),
        },
        Op::Resize { row, pair, dx, row_width } => {
            let rows: Vec<&Node> = tree
                .nodes
                .values()
                .filter(|n| n.kind == NodeKind::Row && n.children().len() >= 2)
                .collect();
            let row = rows.get(row % rows.len().max(1))?;
            let columns = row.children();
            let i = pair % (columns.len() - 1);
            Mutation::ResizeColumns {
                left_id: columns[i].clone(),
                right_id: columns[i + 1].clone(),
                dx: *dx,
                row_width: *row_width,
            }
        }
    };
    Some(mutation)
}

// ═════════════════════════════════════════════════════════════════════════
// 1 + 2. Successful edits stay consistent, failed edits change nothing
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn random_edits_keep_tree_consistent(ops in prop::collection::vec(op_strategy(), 1..80)) {
        let mut tree = base_tree();
        let mut next = 0u32;

        for op in &ops {
            let Some(mutation) = to_mutation(&tree, op, &mut next) else {
                continue;
            };
            let before = tree.clone();

            match mutation.apply(&mut tree) {
                Ok(_) => {
                    let violations = tree.verify();
                    prop_assert!(
                        violations.is_empty(),
                        "{:?} after {:?}",
                        violations,
                        mutation
                    );
                }
                Err(e) => {
                    prop_assert_eq!(&tree, &before, "{} changed the tree", e);
                }
            }
        }
    }
}

proptest! {
    #[test]
    fn delete_removes_whole_subtree(ops in prop::collection::vec(op_strategy(), 1..60), victim in any::<usize>()) {
        let mut tree = base_tree();
        let mut next = 0u32;
        for op in &ops {
            if let Some(mutation) = to_mutation(&tree, op, &mut next) {
                let _ = mutation.apply(&mut tree);
            }
        }

        let ids: Vec<String> = tree.nodes.keys().cloned().collect();
        if let Some(id) = pick(&ids, victim) {
            let subtree = tree.collect_subtree(&id);
            let removed = tree.delete_node(&id).unwrap();

            prop_assert_eq!(&removed, &subtree);
            for gone in &removed {
                prop_assert!(!tree.contains(gone));
            }
            prop_assert!(tree.verify().is_empty());
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Resize preserves totals and honors the floor
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn resize_preserves_pair_total(
        left in 0.0f64..200.0,
        right in 0.0f64..200.0,
        dx in -3000.0f64..3000.0,
        row_width in 0.0f64..2000.0,
    ) {
        let (new_left, new_right) = compute_resize(left, right, dx, row_width, MIN_COLUMN_WIDTH);

        prop_assert!(((new_left + new_right) - (left + right)).abs() < 1e-9);
        if left + right >= 2.0 * MIN_COLUMN_WIDTH {
            prop_assert!(new_left >= MIN_COLUMN_WIDTH - 1e-9);
            prop_assert!(new_right >= MIN_COLUMN_WIDTH - 1e-9);
        } else {
            prop_assert!((new_left - new_right).abs() < 1e-9);
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Export/import round trip
// ═════════════════════════════════════════════════════════════════════════

fn row_of_columns(count: usize) -> Tree {
    let mut tree = base_tree();
    tree.insert(Node::section("s"), &InsertPosition::page()).unwrap();
    tree.insert(Node::row("r"), &InsertPosition::child_of("s")).unwrap();
    for i in 0..count {
        let column = Node::column(format!("c{}", i)).with_prop("width", 100.0 / count as f64);
        tree.insert(column, &InsertPosition::child_of("r")).unwrap();
    }
    tree
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn export_import_round_trips_after_edits(ops in prop::collection::vec(op_strategy(), 1..80)) {
        let mut tree = base_tree();
        let mut next = 0u32;
        for op in &ops {
            if let Some(mutation) = to_mutation(&tree, op, &mut next) {
                let _ = mutation.apply(&mut tree);
            }
        }

        let restored = import_str(&export_string(&tree).unwrap()).unwrap();
        prop_assert_eq!(restored, tree);
    }

    #[test]
    fn resized_widths_survive_round_trip(
        drags in prop::collection::vec((0usize..2, -500.0f64..500.0, 100.0f64..1400.0), 1..6),
    ) {
        let mut tree = row_of_columns(3);
        for (i, dx, row_width) in drags {
            let left = format!("c{}", i);
            let right = format!("c{}", i + 1);
            Mutation::ResizeColumns { left_id: left, right_id: right, dx, row_width }
                .apply(&mut tree)
                .unwrap();
        }

        let restored = import_str(&export_string(&tree).unwrap()).unwrap();
        for id in ["c0", "c1", "c2"] {
            let before = tree.get(id).and_then(Node::width).unwrap();
            let after = restored.get(id).and_then(Node::width).unwrap();
            prop_assert_eq!(before.to_bits(), after.to_bits(), "width of {} drifted", id);
        }
        prop_assert_eq!(restored, tree);
    }
}
