use crate::geometry::cell::Cell;
use crate::geometry::cell_id::{CellId, NUM_FACES};
use crate::geometry::shape::Shape;

use super::{cell_anchor, to_id, ClippedShape, IndexCell, IndexOptions};

/// Edges of one shape that may intersect the cell being built.
#[derive(Debug, Clone)]
struct Candidate {
    shape: usize,
    edges: Vec<usize>,
}

/// Recursively decomposes the six faces and returns the non-empty leaf
/// cells in id order.
pub(super) fn build(shapes: &[Shape], options: &IndexOptions) -> Vec<(CellId, IndexCell)> {
    let candidates: Vec<Candidate> = shapes
        .iter()
        .enumerate()
        .filter(|(_, shape)| shape.num_edges() > 0)
        .map(|(shape, s)| Candidate {
            shape,
            edges: (0..s.num_edges()).collect(),
        })
        .collect();
    let mut cells = Vec::new();
    for face in 0..NUM_FACES {
        build_cell(
            shapes,
            options,
            &Cell::new(CellId::from_face(face)),
            &candidates,
            &mut cells,
        );
    }
    cells
}

fn build_cell(
    shapes: &[Shape],
    options: &IndexOptions,
    cell: &Cell,
    parent: &[Candidate],
    out: &mut Vec<(CellId, IndexCell)>,
) {
    let clipped: Vec<Candidate> = parent
        .iter()
        .filter_map(|candidate| {
            let shape = &shapes[candidate.shape];
            let edges: Vec<usize> = candidate
                .edges
                .iter()
                .copied()
                .filter(|&e| {
                    let (a, b) = shape.edge(e);
                    cell.may_intersect_edge(&a, &b)
                })
                .collect();
            (!edges.is_empty()).then_some(Candidate {
                shape: candidate.shape,
                edges,
            })
        })
        .collect();

    let num_edges: usize = clipped.iter().map(|c| c.edges.len()).sum();
    if num_edges > options.max_edges_per_cell() && cell.level() < options.max_level() {
        for child in cell.id().children() {
            build_cell(shapes, options, &Cell::new(child), &clipped, out);
        }
        return;
    }

    let anchor = cell_anchor(cell.id());
    let mut edges_by_shape = clipped.into_iter().peekable();
    let mut index_cell = IndexCell::default();
    for (shape_id, shape) in shapes.iter().enumerate() {
        let edges = match edges_by_shape.peek() {
            Some(c) if c.shape == shape_id => edges_by_shape.next().map(|c| c.edges),
            _ => None,
        }
        .unwrap_or_default();
        let contains_anchor = shape.has_interior() && shape.contains(&anchor);
        if edges.is_empty() && !contains_anchor {
            continue;
        }
        index_cell.clipped.push(ClippedShape {
            shape_id: to_id(shape_id),
            contains_anchor,
            edges,
        });
    }
    if !index_cell.clipped.is_empty() {
        tracing::trace!(
            cell = ?cell.id(),
            shapes = index_cell.clipped.len(),
            edges = num_edges,
            "added index cell"
        );
        out.push((cell.id(), index_cell));
    }
}

/// Returns one top-level cell per face that has index cells: the smallest
/// cell containing all of them.
pub(super) fn covering(cells: &[(CellId, IndexCell)]) -> Vec<(CellId, Option<usize>)> {
    let mut covering = Vec::new();
    let mut start = 0;
    while start < cells.len() {
        let face = cells[start].0.face();
        let end = start + cells[start..].partition_point(|(id, _)| id.face() == face);
        let (first, last) = (cells[start].0, cells[end - 1].0);
        if start + 1 == end {
            covering.push((first, Some(start)));
        } else if let Some(ancestor) = first.common_ancestor(last) {
            covering.push((ancestor, None));
        }
        start = end;
    }
    covering
}
