//! An in-memory spatial index of shapes on the sphere.
//!
//! The index decomposes the sphere into [`CellId`] cells and stores, for
//! every non-empty leaf, the shapes that intersect it. Cells are kept in a
//! single vector sorted by id, so navigation is binary search.

mod builder;

use crate::error::IndexError;
use crate::geometry::cap::Cap;
use crate::geometry::cell_id::{face_uv_to_xyz, CellId, MAX_LEVEL};
use crate::geometry::shape::Shape;
use crate::math::Point;

/// Default number of edges above which a cell is subdivided.
pub const DEFAULT_MAX_EDGES_PER_CELL: usize = 10;

/// Default deepest level the builder subdivides to.
pub const DEFAULT_MAX_LEVEL: u8 = 24;

/// Parameters controlling how the index decomposes space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexOptions {
    max_edges_per_cell: usize,
    max_level: u8,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            max_edges_per_cell: DEFAULT_MAX_EDGES_PER_CELL,
            max_level: DEFAULT_MAX_LEVEL,
        }
    }
}

impl IndexOptions {
    /// Creates the default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of edges above which a cell is subdivided.
    #[must_use]
    pub fn max_edges_per_cell(&self) -> usize {
        self.max_edges_per_cell
    }

    /// Returns the deepest level an index cell may have.
    #[must_use]
    pub fn max_level(&self) -> u8 {
        self.max_level
    }

    /// Sets the number of edges above which a cell is subdivided.
    ///
    /// # Errors
    ///
    /// Returns an error if `n` is zero.
    pub fn set_max_edges_per_cell(&mut self, n: usize) -> Result<&mut Self, IndexError> {
        if n == 0 {
            return Err(IndexError::ZeroEdgesPerCell);
        }
        self.max_edges_per_cell = n;
        Ok(self)
    }

    /// Sets the deepest level cells are subdivided to.
    ///
    /// # Errors
    ///
    /// Returns an error if `level` exceeds [`MAX_LEVEL`].
    pub fn set_max_level(&mut self, level: u8) -> Result<&mut Self, IndexError> {
        if level > MAX_LEVEL {
            return Err(IndexError::LevelOutOfRange(level));
        }
        self.max_level = level;
        Ok(self)
    }
}

/// The part of one shape that intersects an index cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClippedShape {
    shape_id: i32,
    contains_anchor: bool,
    edges: Vec<usize>,
}

impl ClippedShape {
    /// Returns the id of the clipped shape.
    #[must_use]
    pub fn shape_id(&self) -> i32 {
        self.shape_id
    }

    /// True if the shape's interior contains the [`cell_anchor`] of the
    /// cell.
    #[must_use]
    pub fn contains_anchor(&self) -> bool {
        self.contains_anchor
    }

    /// Ids of the shape's edges that intersect the cell, ascending.
    #[must_use]
    pub fn edges(&self) -> &[usize] {
        &self.edges
    }

    #[must_use]
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }
}

/// The contents of one leaf cell of the index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexCell {
    clipped: Vec<ClippedShape>,
}

impl IndexCell {
    /// Clipped shapes, ascending by shape id.
    #[must_use]
    pub fn clipped(&self) -> &[ClippedShape] {
        &self.clipped
    }

    #[must_use]
    pub fn num_edges(&self) -> usize {
        self.clipped.iter().map(ClippedShape::num_edges).sum()
    }

    /// Returns the clipped shape with the given id, if present.
    #[must_use]
    pub fn find_clipped(&self, shape_id: i32) -> Option<&ClippedShape> {
        self.clipped
            .binary_search_by_key(&shape_id, ClippedShape::shape_id)
            .ok()
            .map(|k| &self.clipped[k])
    }
}

/// How an arbitrary cell relates to the cells of an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellRelation {
    /// The cell is, or is contained by, the index cell at this position.
    Indexed(usize),
    /// The cell contains one or more index cells.
    Subdivided,
    /// The cell does not intersect any index cell.
    Disjoint,
}

/// Fractional `(u, v)` position of the anchor within its cell. Off-center
/// so that anchors never land on the round coordinates vertices tend to use.
const ANCHOR_FRACTION: (f64, f64) = (0.561_803_398_874_989_5, 0.458_578_643_762_690_5);

/// The point of an index cell at which interior containment is recorded.
#[must_use]
pub fn cell_anchor(id: CellId) -> Point {
    let (face, u, v) = id.face_uv_bounds();
    let (fu, fv) = ANCHOR_FRACTION;
    face_uv_to_xyz(face, u[0] + (u[1] - u[0]) * fu, v[0] + (v[1] - v[0]) * fv).normalize()
}

/// A shape id as stored in results: shapes are numbered by insertion order.
pub(crate) fn to_id(n: usize) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

/// An immutable index over a set of shapes.
///
/// Shape ids are positions in the input vector. The index is fully built on
/// construction and never changes afterwards, so it can be shared across
/// threads and queried concurrently.
#[derive(Debug, Clone)]
pub struct ShapeIndex {
    shapes: Vec<Shape>,
    cells: Vec<(CellId, IndexCell)>,
    covering: Vec<(CellId, Option<usize>)>,
    num_edges: usize,
    options: IndexOptions,
}

impl Default for ShapeIndex {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl ShapeIndex {
    /// Builds an index with default options.
    #[must_use]
    pub fn new(shapes: Vec<Shape>) -> Self {
        Self::with_options(shapes, IndexOptions::default())
    }

    /// Builds an index with the given options.
    #[must_use]
    pub fn with_options(shapes: Vec<Shape>, options: IndexOptions) -> Self {
        let num_edges = shapes.iter().map(Shape::num_edges).sum();
        let cells = builder::build(&shapes, &options);
        let covering = builder::covering(&cells);
        tracing::debug!(
            shapes = shapes.len(),
            edges = num_edges,
            cells = cells.len(),
            top_level = covering.len(),
            "built shape index"
        );
        Self {
            shapes,
            cells,
            covering,
            num_edges,
            options,
        }
    }

    /// Returns the options the index was built with.
    #[must_use]
    pub fn options(&self) -> &IndexOptions {
        &self.options
    }

    /// Returns all shapes, in id order.
    #[must_use]
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    /// Returns the number of shapes.
    #[must_use]
    pub fn num_shapes(&self) -> usize {
        self.shapes.len()
    }

    /// Looks up a shape by id.
    #[must_use]
    pub fn shape(&self, id: i32) -> Option<&Shape> {
        usize::try_from(id).ok().and_then(|k| self.shapes.get(k))
    }

    /// Iterates over `(shape_id, shape)` pairs.
    pub fn iter_shapes(&self) -> impl Iterator<Item = (i32, &Shape)> {
        self.shapes.iter().enumerate().map(|(k, s)| (to_id(k), s))
    }

    /// Total number of edges over all shapes.
    #[must_use]
    pub fn num_edges(&self) -> usize {
        self.num_edges
    }

    /// Number of edges, saturating at `limit`.
    #[must_use]
    pub fn num_edges_up_to(&self, limit: usize) -> usize {
        self.num_edges.min(limit)
    }

    /// Returns the number of index cells.
    #[must_use]
    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    /// Returns the index cell at position `pos` in id order.
    #[must_use]
    pub fn cell_at(&self, pos: usize) -> Option<(CellId, &IndexCell)> {
        self.cells.get(pos).map(|(id, cell)| (*id, cell))
    }

    /// Iterates over all index cells in id order.
    pub fn cells(&self) -> impl Iterator<Item = (CellId, &IndexCell)> {
        self.cells.iter().map(|(id, cell)| (*id, cell))
    }

    /// Position of the first index cell whose id is `>= target`.
    #[must_use]
    pub fn seek(&self, target: CellId) -> usize {
        self.cells.partition_point(|(id, _)| *id < target)
    }

    /// Finds the index cell containing `p`, if any.
    #[must_use]
    pub fn locate_point(&self, p: &Point) -> Option<(CellId, &IndexCell)> {
        match self.locate(CellId::from_point(p)) {
            CellRelation::Indexed(pos) => self.cell_at(pos),
            _ => None,
        }
    }

    /// Classifies `target` against the index cells.
    #[must_use]
    pub fn locate(&self, target: CellId) -> CellRelation {
        // If `target` contains index cells, it contains the one at `pos`; if
        // an index cell contains `target`, it is at `pos` or just before.
        let pos = self.seek(target.range_min());
        if let Some((id, _)) = self.cell_at(pos) {
            if id >= target && id.range_min() <= target {
                return CellRelation::Indexed(pos);
            }
            if id <= target.range_max() {
                return CellRelation::Subdivided;
            }
        }
        if pos > 0 {
            if let Some((id, _)) = self.cell_at(pos - 1) {
                if id.range_max() >= target {
                    return CellRelation::Indexed(pos - 1);
                }
            }
        }
        CellRelation::Disjoint
    }

    /// A handful of cells (at most one per face) that together cover every
    /// index cell. Entries that are themselves index cells carry their
    /// position.
    #[must_use]
    pub fn covering(&self) -> &[(CellId, Option<usize>)] {
        &self.covering
    }

    /// Returns a cap containing every shape in the index.
    #[must_use]
    pub fn cap_bound(&self) -> Cap {
        if self
            .shapes
            .iter()
            .any(|s| matches!(s, Shape::Polygon(p) if p.is_full()))
        {
            return Cap::full();
        }
        let vertices = || self.shapes.iter().flat_map(Shape::edges).map(|(a, _)| a);
        let sum: Point = vertices().sum();
        let center = if sum.norm_squared() > 0.0 {
            sum.normalize()
        } else {
            match vertices().next() {
                Some(v) => v,
                None => return Cap::empty(),
            }
        };
        let mut cap = Cap::from_point(center);
        for shape in &self.shapes {
            for (a, b) in shape.edges() {
                cap.add_point(&a);
                cap.add_point(&b);
            }
        }
        cap
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::shape::Polygon;
    use crate::math::from_lat_lng_degrees as ll;

    fn sample_index() -> ShapeIndex {
        let mut shapes = vec![Shape::points((0..40).map(|k| ll(f64::from(k) * 0.1, 1.0)).collect()).unwrap()];
        shapes.push(
            Shape::polygon(vec![vec![ll(0.0, 0.0), ll(0.0, 5.0), ll(5.0, 5.0), ll(5.0, 0.0)]])
                .unwrap(),
        );
        ShapeIndex::new(shapes)
    }

    #[test]
    fn cells_are_sorted_and_disjoint() {
        let index = sample_index();
        assert!(index.num_cells() > 1);
        let ids: Vec<CellId> = index.cells().map(|(id, _)| id).collect();
        for pair in ids.windows(2) {
            assert!(pair[0].range_max() < pair[1].range_min());
        }
        for (_, cell) in index.cells() {
            assert!(cell.num_edges() <= DEFAULT_MAX_EDGES_PER_CELL);
        }
    }

    #[test]
    fn every_edge_is_indexed() {
        let index = sample_index();
        for (shape_id, shape) in index.iter_shapes() {
            for e in 0..shape.num_edges() {
                let found = index.cells().any(|(_, cell)| {
                    cell.find_clipped(shape_id)
                        .is_some_and(|c| c.edges().contains(&e))
                });
                assert!(found, "edge {shape_id}:{e} missing");
            }
        }
    }

    #[test]
    fn locate_point_and_cells() {
        let index = sample_index();
        let inside = ll(2.5, 2.5);
        let (id, cell) = index.locate_point(&inside).unwrap();
        assert!(id.contains(CellId::from_point(&inside)));
        assert!(cell.find_clipped(1).is_some());
        assert!(index.locate_point(&ll(-40.0, 120.0)).is_none());

        let leaf = CellId::from_point(&inside);
        assert!(matches!(index.locate(leaf), CellRelation::Indexed(_)));
        assert_eq!(index.locate(CellId::from_face(0)), CellRelation::Subdivided);
        assert_eq!(index.locate(CellId::from_face(3)), CellRelation::Disjoint);
    }

    #[test]
    fn interior_only_cells_flag_their_anchor() {
        let index = sample_index();
        let interior_only: Vec<_> = index
            .cells()
            .filter_map(|(id, cell)| cell.find_clipped(1).map(|c| (id, c.clone())))
            .filter(|(_, c)| c.num_edges() == 0)
            .collect();
        for (id, clipped) in &interior_only {
            assert!(clipped.contains_anchor(), "{id:?}");
        }
    }

    #[test]
    fn anchor_lies_inside_its_cell() {
        let id = CellId::from_point(&ll(12.0, 34.0)).parent_at(7);
        let cell = crate::geometry::cell::Cell::new(id);
        let anchor = cell_anchor(id);
        assert!(cell.contains(&anchor));
        assert_eq!(CellId::from_point(&anchor).parent_at(7), id);
        assert!((anchor - id.to_point()).norm() > 0.0);
    }

    #[test]
    fn full_polygon_covers_every_face() {
        let index = ShapeIndex::new(vec![Shape::Polygon(Polygon::full())]);
        assert_eq!(index.num_cells(), 6);
        assert_eq!(index.num_edges(), 0);
        assert_eq!(index.covering().len(), 6);
        assert!(index.locate_point(&ll(-40.0, 120.0)).is_some());
        assert_eq!(index.cap_bound().radius(), Cap::full().radius());
    }

    #[test]
    fn empty_index() {
        let index = ShapeIndex::default();
        assert_eq!(index.num_cells(), 0);
        assert!(index.covering().is_empty());
        assert!(index.cap_bound().is_empty());
        assert_eq!(index.locate(CellId::from_face(2)), CellRelation::Disjoint);
    }

    #[test]
    fn options_validate() {
        let mut options = IndexOptions::new();
        assert!(options.set_max_edges_per_cell(0).is_err());
        assert!(options.set_max_level(31).is_err());
        options.set_max_edges_per_cell(3).unwrap().set_max_level(12).unwrap();
        assert_eq!(options.max_edges_per_cell(), 3);
        assert_eq!(options.max_level(), 12);
    }
}
