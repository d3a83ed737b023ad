//! # Column Resize
//!
//! Dragging the handle between two columns moves width from one to the other.
//! Widths are proportional (the columns of a row usually sum to 100, but any
//! total works); the pair's combined width never changes and neither side
//! drops below the floor.

use crate::mutations::MutationError;
use crate::node::NodeKind;
use crate::tree::Tree;
use serde_json::Value;
use std::collections::HashMap;

/// Smallest width a column can be dragged down to
pub const MIN_COLUMN_WIDTH: f64 = 3.0;

/// Width shared out among a row's columns when none is set
pub const DEFAULT_ROW_TOTAL: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeConfig {
    pub min_width: f64,
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self {
            min_width: MIN_COLUMN_WIDTH,
        }
    }
}

/// Rendered geometry supplied by whoever paints the tree
pub trait RectLookup {
    /// Rendered pixel width of `node_id`, if it is on screen
    fn width_of(&self, node_id: &str) -> Option<f64>;
}

impl RectLookup for HashMap<String, f64> {
    fn width_of(&self, node_id: &str) -> Option<f64> {
        self.get(node_id).copied()
    }
}

/// New `(left, right)` widths after dragging the boundary by `dx` pixels
pub fn compute_resize(left: f64, right: f64, dx: f64, row_width: f64, min_width: f64) -> (f64, f64) {
    let total = left + right;
    let delta = (dx / row_width.max(1.0)) * total;

    let new_left = if total - min_width < min_width {
        // Pair too narrow to honor the floor on both sides
        total / 2.0
    } else {
        (left + delta).clamp(min_width, total - min_width)
    };

    (new_left, total - new_left)
}

impl Tree {
    /// Width of a column, falling back to an equal share of 100
    pub fn column_width(&self, column_id: &str) -> Option<f64> {
        let column = self.get(column_id)?;
        if let Some(width) = column.width() {
            return Some(width);
        }

        let siblings = column
            .parent_id
            .as_deref()
            .and_then(|p| self.get(p))
            .map_or(1, |row| row.children().len().max(1));
        Some(DEFAULT_ROW_TOTAL / siblings as f64)
    }

    /// Move the boundary between two adjacent columns of the same row
    ///
    /// Returns the new `(left, right)` widths.
    pub fn resize_adjacent_columns(
        &mut self,
        left_id: &str,
        right_id: &str,
        dx: f64,
        row_width: f64,
        config: &ResizeConfig,
    ) -> Result<(f64, f64), MutationError> {
        let row_id = self.check_adjacent_columns(left_id, right_id)?;

        let left = self.column_width(left_id).unwrap_or(DEFAULT_ROW_TOTAL);
        let right = self.column_width(right_id).unwrap_or(DEFAULT_ROW_TOTAL);
        let (new_left, new_right) = compute_resize(left, right, dx, row_width, config.min_width);

        for (id, width) in [(left_id, new_left), (right_id, new_right)] {
            if let Some(column) = self.nodes.get_mut(id) {
                column.props.insert("width".to_string(), Value::from(width));
            }
        }

        tracing::debug!(row_id = %row_id, new_left, new_right, "Resized columns");
        Ok((new_left, new_right))
    }

    /// Resize using the row's rendered width from `rects`
    pub fn resize_with_rects<R: RectLookup + ?Sized>(
        &mut self,
        left_id: &str,
        right_id: &str,
        dx: f64,
        rects: &R,
        config: &ResizeConfig,
    ) -> Result<(f64, f64), MutationError> {
        let row_id = self.check_adjacent_columns(left_id, right_id)?;
        let row_width = rects.width_of(&row_id).unwrap_or(0.0);
        self.resize_adjacent_columns(left_id, right_id, dx, row_width, config)
    }

    /// Both ids must be columns, listed side by side in one row; returns the row id
    fn check_adjacent_columns(&self, left_id: &str, right_id: &str) -> Result<String, MutationError> {
        let mut parents = Vec::with_capacity(2);
        for id in [left_id, right_id] {
            let node = self
                .get(id)
                .ok_or_else(|| MutationError::NodeNotFound(id.to_string()))?;
            if node.kind != NodeKind::Column {
                return Err(MutationError::InvalidStructure(format!(
                    "{} is a {}, only columns can be resized",
                    id, node.kind
                )));
            }
            parents.push(node.parent_id.clone());
        }

        let row_id = match (&parents[0], &parents[1]) {
            (Some(a), Some(b)) if a == b => a.clone(),
            _ => {
                return Err(MutationError::InvalidStructure(format!(
                    "{} and {} are not in the same row",
                    left_id, right_id
                )))
            }
        };

        let children = self.get(&row_id).map(|r| r.children()).unwrap_or(&[]);
        let left_index = children.iter().position(|c| c == left_id);
        let right_index = children.iter().position(|c| c == right_id);
        match (left_index, right_index) {
            (Some(l), Some(r)) if r == l + 1 => Ok(row_id),
            _ => Err(MutationError::InvalidStructure(format!(
                "{} and {} are not adjacent",
                left_id, right_id
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutations::InsertPosition;
    use crate::node::Node;

    fn row_with(widths: &[Option<f64>]) -> Tree {
        let mut tree = Tree::new();
        tree.insert(Node::section("s"), &InsertPosition::page()).unwrap();
        tree.insert(Node::row("r"), &InsertPosition::child_of("s")).unwrap();
        for (i, width) in widths.iter().enumerate() {
            let mut column = Node::column(format!("c{}", i));
            if let Some(w) = width {
                column = column.with_prop("width", *w);
            }
            tree.insert(column, &InsertPosition::child_of("r")).unwrap();
        }
        tree
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_compute_resize_moves_boundary() {
        let (l, r) = compute_resize(50.0, 50.0, 100.0, 1000.0, MIN_COLUMN_WIDTH);
        assert!(approx(l, 60.0));
        assert!(approx(r, 40.0));
    }

    #[test]
    fn test_compute_resize_clamps_to_floor() {
        let (l, r) = compute_resize(50.0, 50.0, -5000.0, 1000.0, MIN_COLUMN_WIDTH);
        assert!(approx(l, 3.0));
        assert!(approx(r, 97.0));

        let (l, r) = compute_resize(30.0, 20.0, 5000.0, 1000.0, MIN_COLUMN_WIDTH);
        assert!(approx(l + r, 50.0));
        assert!(approx(r, 3.0));
    }

    #[test]
    fn test_compute_resize_zero_row_width() {
        // Width clamped to 1px so the delta stays finite
        let (l, r) = compute_resize(50.0, 50.0, 0.5, 0.0, MIN_COLUMN_WIDTH);
        assert!(l.is_finite() && r.is_finite());
        assert!(approx(l + r, 100.0));
    }

    #[test]
    fn test_resize_preserves_pair_total() {
        let mut tree = row_with(&[Some(20.0), Some(30.0), Some(50.0)]);
        let (l, r) = tree
            .resize_adjacent_columns("c1", "c2", -40.0, 800.0, &ResizeConfig::default())
            .unwrap();

        assert!(approx(l + r, 80.0));
        assert!(approx(tree.get("c1").unwrap().width().unwrap(), l));
        assert!(approx(tree.get("c2").unwrap().width().unwrap(), r));
        assert_eq!(tree.get("c0").unwrap().width(), Some(20.0));
    }

    #[test]
    fn test_missing_widths_default_to_equal_share() {
        let mut tree = row_with(&[None, None]);
        assert_eq!(tree.column_width("c0"), Some(50.0));

        let (l, r) = tree
            .resize_adjacent_columns("c0", "c1", 0.0, 500.0, &ResizeConfig::default())
            .unwrap();
        assert!(approx(l, 50.0) && approx(r, 50.0));
    }

    #[test]
    fn test_rejects_non_siblings_and_non_columns() {
        let mut tree = row_with(&[Some(50.0), Some(50.0)]);
        tree.insert(Node::row("r2"), &InsertPosition::child_of("s")).unwrap();
        tree.insert(Node::column("other"), &InsertPosition::child_of("r2"))
            .unwrap();
        let before = tree.clone();
        let config = ResizeConfig::default();

        assert!(matches!(
            tree.resize_adjacent_columns("c0", "other", 10.0, 100.0, &config),
            Err(MutationError::InvalidStructure(_))
        ));
        assert!(matches!(
            tree.resize_adjacent_columns("c0", "r", 10.0, 100.0, &config),
            Err(MutationError::InvalidStructure(_))
        ));
        assert!(matches!(
            tree.resize_adjacent_columns("c1", "c0", 10.0, 100.0, &config),
            Err(MutationError::InvalidStructure(_))
        ));
        assert_eq!(
            tree.resize_adjacent_columns("c0", "nope", 10.0, 100.0, &config),
            Err(MutationError::NodeNotFound("nope".into()))
        );
        assert_eq!(tree, before);
    }

    #[test]
    fn test_resize_with_rects() {
        let mut tree = row_with(&[Some(50.0), Some(50.0)]);
        let rects: HashMap<String, f64> = [("r".to_string(), 200.0)].into_iter().collect();

        let (l, _) = tree
            .resize_with_rects("c0", "c1", 20.0, &rects, &ResizeConfig::default())
            .unwrap();
        assert!(approx(l, 60.0));
    }
}
