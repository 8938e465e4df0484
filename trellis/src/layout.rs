//! Graph layout: coordinates for newly created nodes and one-shot
//! displacement of pre-existing nodes that would overlap them.
//!
//! Steps and answers share a single horizontal row below the expansion
//! source, centered via a computed negative left offset plus fixed per-item
//! spacing. Clarifiers split into two columns left and right of the source
//! (`ceil(n/2)` left, `floor(n/2)` right), stacked vertically.
//!
//! Overlap avoidance is a one-shot positional correction, not a physics
//! simulation: it runs once per expansion and does not iterate to a fixed
//! point, so a displaced node may in turn overlap a third node.

use serde::{Deserialize, Serialize};

use crate::graph::GraphNode;

/// Vertical offset from the source to the step/answer row.
pub const BRANCH_ROW_OFFSET_Y: f64 = 140.0;
/// Horizontal spacing between adjacent nodes in the step/answer row.
pub const BRANCH_SPACING_X: f64 = 180.0;
/// Horizontal distance from the source to each clarifier column.
pub const CLARIFY_COLUMN_OFFSET_X: f64 = 320.0;
/// Vertical spacing between clarifiers within a column.
pub const CLARIFY_SPACING_Y: f64 = 110.0;
/// Vertical offset applied to every clarifier relative to the source.
pub const CLARIFY_ROW_OFFSET_Y: f64 = 40.0;

/// Assumed node extents for overlap tests (rendering-independent estimate).
pub const NODE_WIDTH: f64 = 150.0;
pub const NODE_HEIGHT: f64 = 60.0;
/// Padding added around the new-node bounding box before displacement.
pub const REGION_PADDING: f64 = 40.0;

/// A node position in layout space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Positions for `count` step/answer nodes in one centered row below
/// `source`. Steps occupy the first slots and answers continue after them,
/// so the caller passes the combined count and splits the result.
pub fn branch_row_positions(source: Point, count: usize) -> Vec<Point> {
    let left_offset = -((count.saturating_sub(1)) as f64 * BRANCH_SPACING_X) / 2.0;
    let y = source.y + BRANCH_ROW_OFFSET_Y;
    (0..count)
        .map(|i| Point::new(source.x + left_offset + i as f64 * BRANCH_SPACING_X, y))
        .collect()
}

/// Positions for `count` clarifier nodes: index `i` goes to the left column
/// when `i < ceil(count / 2)`, else to the right column; within a column,
/// `y = source.y + row * CLARIFY_SPACING_Y + CLARIFY_ROW_OFFSET_Y`.
pub fn clarifier_positions(source: Point, count: usize) -> Vec<Point> {
    let left_count = count.div_ceil(2);
    (0..count)
        .map(|i| {
            let (dx, row) = if i < left_count {
                (-CLARIFY_COLUMN_OFFSET_X, i)
            } else {
                (CLARIFY_COLUMN_OFFSET_X, i - left_count)
            };
            Point::new(
                source.x + dx,
                source.y + row as f64 * CLARIFY_SPACING_Y + CLARIFY_ROW_OFFSET_Y,
            )
        })
        .collect()
}

/// Axis-aligned bounding region of one expansion's new nodes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Region {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Region {
    /// Bounding box of the given points, expanded by [`REGION_PADDING`].
    /// Returns `None` when there are no points (nothing was placed).
    pub fn around(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let mut r = Region {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        };
        for p in &points[1..] {
            r.min_x = r.min_x.min(p.x);
            r.min_y = r.min_y.min(p.y);
            r.max_x = r.max_x.max(p.x);
            r.max_y = r.max_y.max(p.y);
        }
        r.min_x -= REGION_PADDING;
        r.min_y -= REGION_PADDING;
        r.max_x += REGION_PADDING;
        r.max_y += REGION_PADDING;
        Some(r)
    }

    /// True when a node box of assumed extents centered at `p` intersects
    /// this region.
    pub fn intersects(&self, p: Point) -> bool {
        let (hw, hh) = (NODE_WIDTH / 2.0, NODE_HEIGHT / 2.0);
        p.x + hw > self.min_x && p.x - hw < self.max_x && p.y + hh > self.min_y && p.y - hh < self.max_y
    }

    fn center(&self) -> Point {
        Point::new((self.min_x + self.max_x) / 2.0, (self.min_y + self.max_y) / 2.0)
    }
}

/// Displaces every node (except `exclude_id`) whose assumed box intersects
/// `region`, pushing it just outside along whichever axis needs the smaller
/// move (both axes on a tie), away from the region's center.
pub fn displace_overlapping(nodes: &mut [GraphNode], region: &Region, exclude_id: &str) {
    let c = region.center();
    let (hw, hh) = (NODE_WIDTH / 2.0, NODE_HEIGHT / 2.0);
    for node in nodes.iter_mut() {
        if node.id == exclude_id || !region.intersects(node.position) {
            continue;
        }
        let p = node.position;
        let push_x = if p.x >= c.x {
            region.max_x + hw - p.x
        } else {
            region.min_x - hw - p.x
        };
        let push_y = if p.y >= c.y {
            region.max_y + hh - p.y
        } else {
            region.min_y - hh - p.y
        };
        if (push_x.abs() - push_y.abs()).abs() < f64::EPSILON {
            node.position.x += push_x;
            node.position.y += push_y;
        } else if push_x.abs() < push_y.abs() {
            node.position.x += push_x;
        } else {
            node.position.y += push_y;
        }
    }
}
