//! Finds the shapes of an index whose interior contains a target.
//!
//! Point, edge and nested-index targets reduce to point-in-shape tests
//! answered from a single index cell: the clipped shape records whether the
//! cell anchor is inside, and the parity of the clipped edges crossed on the
//! way from the anchor to the point flips that answer.
//!
//! Cell targets are approximate. When an index cell contains the whole
//! target, a shape is reported if it contains the target center. When the
//! target is subdivided into index cells, every shape intersecting the first
//! of them in cell id order is reported.

use std::collections::BTreeSet;

use crate::geometry::cell::Cell;
use crate::geometry::shape::crosses_odd;
use crate::index::{cell_anchor, CellRelation, IndexCell, ShapeIndex};
use crate::math::Point;

use super::target::Target;

/// Collects containing shape ids in ascending order, stopping once `limit`
/// distinct ids have been seen.
pub(super) fn containing_shapes(target: &Target<'_>, index: &ShapeIndex, limit: usize) -> Vec<i32> {
    if limit == 0 {
        return Vec::new();
    }
    let mut ids = BTreeSet::new();
    visit_containing_shapes(target, index, &mut |id| {
        ids.insert(id);
        ids.len() < limit
    });
    ids.into_iter().collect()
}

/// Calls `visitor` with every shape containing the target, possibly more
/// than once per shape. Returns false if the visitor asked to stop.
fn visit_containing_shapes(
    target: &Target<'_>,
    index: &ShapeIndex,
    visitor: &mut impl FnMut(i32) -> bool,
) -> bool {
    match target {
        Target::Point(p) => visit_point(index, p, visitor),
        Target::Edge(a, b) => {
            let sum = a + b;
            let mid = if sum.norm_squared() > 0.0 {
                sum.normalize()
            } else {
                *a
            };
            visit_point(index, &mid, visitor)
        }
        Target::Cell(cell) => visit_cell(index, cell, visitor),
        Target::ShapeIndex(t) => {
            for (_, shape) in t.index().iter_shapes() {
                let starts = shape.chain_starts();
                if starts.is_empty() {
                    // Only a full polygon can contain points without edges.
                    let reference = shape.reference_point();
                    if reference.contained && !visit_point(index, &reference.point, visitor) {
                        return false;
                    }
                    continue;
                }
                for start in &starts {
                    if !visit_point(index, start, visitor) {
                        return false;
                    }
                }
            }
            true
        }
    }
}

fn visit_point(index: &ShapeIndex, p: &Point, visitor: &mut impl FnMut(i32) -> bool) -> bool {
    match index.locate_point(p) {
        Some((id, cell)) => visit_cell_containing(index, cell, &cell_anchor(id), p, visitor),
        None => true,
    }
}

/// Visits the shapes of `cell` whose interior contains `p`, given the cell
/// `anchor`.
fn visit_cell_containing(
    index: &ShapeIndex,
    cell: &IndexCell,
    anchor: &Point,
    p: &Point,
    visitor: &mut impl FnMut(i32) -> bool,
) -> bool {
    for clipped in cell.clipped() {
        let Some(shape) = index.shape(clipped.shape_id()) else {
            continue;
        };
        if !shape.has_interior() {
            continue;
        }
        let edges = clipped.edges().iter().map(|&e| shape.edge(e));
        if clipped.contains_anchor() ^ crosses_odd(anchor, p, edges) && !visitor(clipped.shape_id()) {
            return false;
        }
    }
    true
}

/// Visits every shape with an interior that intersects `cell`.
fn visit_intersecting(
    index: &ShapeIndex,
    cell: &IndexCell,
    visitor: &mut impl FnMut(i32) -> bool,
) -> bool {
    for clipped in cell.clipped() {
        let has_interior = index
            .shape(clipped.shape_id())
            .is_some_and(|shape| shape.has_interior());
        if has_interior && !visitor(clipped.shape_id()) {
            return false;
        }
    }
    true
}

fn visit_cell(index: &ShapeIndex, target: &Cell, visitor: &mut impl FnMut(i32) -> bool) -> bool {
    match index.locate(target.id()) {
        CellRelation::Indexed(pos) => match index.cell_at(pos) {
            Some((id, cell)) => {
                visit_cell_containing(index, cell, &cell_anchor(id), target.center(), visitor)
            }
            None => true,
        },
        CellRelation::Subdivided => match index.cell_at(index.seek(target.id().range_min())) {
            Some((_, cell)) => visit_intersecting(index, cell, visitor),
            None => true,
        },
        CellRelation::Disjoint => true,
    }
}
