use crate::geometry::cap::Cap;
use crate::geometry::cell::Cell;
use crate::index::ShapeIndex;
use crate::math::edge_distance::{update_edge_pair_min_distance, update_min_distance};
use crate::math::{ChordAngle, Point};

use super::closest_edge::ClosestEdgeQuery;
use super::containment;
use super::options::Options;

/// Index size up to which a [`Target::Point`] query scans all edges.
pub const POINT_MAX_BRUTE_FORCE_INDEX_SIZE: usize = 120;
/// Index size up to which a [`Target::Edge`] query scans all edges.
pub const EDGE_MAX_BRUTE_FORCE_INDEX_SIZE: usize = 60;
/// Index size up to which a [`Target::Cell`] query scans all edges.
pub const CELL_MAX_BRUTE_FORCE_INDEX_SIZE: usize = 30;
/// Index size up to which a [`Target::ShapeIndex`] query scans all edges.
pub const SHAPE_INDEX_MAX_BRUTE_FORCE_INDEX_SIZE: usize = 25;

/// The geometry a closest-edge query measures distances from.
///
/// All distance updates are strict: they lower `min_dist` and return true
/// only when the new distance is strictly smaller, so the current value can
/// be passed in as a limit.
#[derive(Debug, Clone)]
pub enum Target<'a> {
    Point(Point),
    Edge(Point, Point),
    Cell(Cell),
    ShapeIndex(ShapeIndexTarget<'a>),
}

/// A target made of every shape of another index.
#[derive(Debug, Clone, Copy)]
pub struct ShapeIndexTarget<'a> {
    index: &'a ShapeIndex,
    include_interiors: bool,
    max_error: ChordAngle,
}

impl<'a> ShapeIndexTarget<'a> {
    /// Creates a target over every shape of `index`.
    #[must_use]
    pub fn new(index: &'a ShapeIndex, include_interiors: bool) -> Self {
        Self {
            index,
            include_interiors,
            max_error: ChordAngle::ZERO,
        }
    }

    /// Returns the wrapped index.
    #[must_use]
    pub fn index(&self) -> &'a ShapeIndex {
        self.index
    }

    /// Whether the interiors of the target's polygons count as part of the
    /// target.
    #[must_use]
    pub fn include_interiors(&self) -> bool {
        self.include_interiors
    }

    /// Returns the error allowed in nested distance queries.
    #[must_use]
    pub fn max_error(&self) -> ChordAngle {
        self.max_error
    }

    /// Distance from the target index to `other`, found with a nested query
    /// limited to the current `min_dist`.
    fn update_min_distance(&self, other: &Target<'_>, min_dist: &mut ChordAngle) -> bool {
        let mut options = Options::default();
        options.max_results = 1;
        options.max_distance = *min_dist;
        options.max_error = self.max_error;
        options.include_interiors = self.include_interiors;
        let result = ClosestEdgeQuery::with_options(self.index, options).find_closest_edge(other);
        if result.is_empty() || result.distance() >= *min_dist {
            return false;
        }
        *min_dist = result.distance();
        true
    }
}

impl<'a> Target<'a> {
    /// Creates a point target.
    #[must_use]
    pub fn point(p: Point) -> Self {
        Self::Point(p)
    }

    /// Creates an edge target.
    #[must_use]
    pub fn edge(a: Point, b: Point) -> Self {
        Self::Edge(a, b)
    }

    /// Creates a cell target.
    #[must_use]
    pub fn cell(cell: Cell) -> Self {
        Self::Cell(cell)
    }

    /// Creates a target made of every shape of `index`.
    #[must_use]
    pub fn shape_index(index: &'a ShapeIndex, include_interiors: bool) -> Self {
        Self::ShapeIndex(ShapeIndexTarget::new(index, include_interiors))
    }

    /// Largest index (in edges) for which scanning every edge beats the
    /// cell search.
    #[must_use]
    pub fn max_brute_force_index_size(&self) -> usize {
        match self {
            Self::Point(_) => POINT_MAX_BRUTE_FORCE_INDEX_SIZE,
            Self::Edge(..) => EDGE_MAX_BRUTE_FORCE_INDEX_SIZE,
            Self::Cell(_) => CELL_MAX_BRUTE_FORCE_INDEX_SIZE,
            Self::ShapeIndex(_) => SHAPE_INDEX_MAX_BRUTE_FORCE_INDEX_SIZE,
        }
    }

    /// Returns a cap containing the target.
    #[must_use]
    pub fn cap_bound(&self) -> Cap {
        match self {
            Self::Point(p) => Cap::from_point(*p),
            Self::Edge(a, b) => {
                let sum = a + b;
                if sum.norm_squared() == 0.0 {
                    return Cap::full();
                }
                let center = sum.normalize();
                let radius = ChordAngle::between(&center, a).max(ChordAngle::between(&center, b));
                Cap::new(center, radius.plus_error(radius.point_constructor_max_error()))
            }
            Self::Cell(cell) => *cell.cap_bound(),
            Self::ShapeIndex(t) => t.index.cap_bound(),
        }
    }

    /// Lowers `min_dist` to the distance between the target and edge `ab`.
    pub fn update_min_distance_to_edge(
        &self,
        a: &Point,
        b: &Point,
        min_dist: &mut ChordAngle,
    ) -> bool {
        match self {
            Self::Point(p) => update_min_distance(p, a, b, min_dist),
            Self::Edge(c, d) => update_edge_pair_min_distance(c, d, a, b, min_dist),
            Self::Cell(cell) => update_if_less(cell.distance_to_edge(a, b), min_dist),
            Self::ShapeIndex(t) => t.update_min_distance(&Target::Edge(*a, *b), min_dist),
        }
    }

    /// Lowers `min_dist` to a lower bound on the distance between the target
    /// and any point of `cell`.
    pub fn update_min_distance_to_cell(&self, cell: &Cell, min_dist: &mut ChordAngle) -> bool {
        match self {
            Self::Point(p) => update_if_less(cell.cap_bound().distance_to_point(p), min_dist),
            Self::Edge(a, b) => update_if_less(cell.cap_bound().distance_to_edge(a, b), min_dist),
            Self::Cell(target) => update_if_less(
                target.cap_bound().distance_to_cap(cell.cap_bound()),
                min_dist,
            ),
            Self::ShapeIndex(t) => t.update_min_distance(&Target::Cell(cell.clone()), min_dist),
        }
    }

    /// Lets the target use approximate distances with the given error.
    /// Returns true if the target takes advantage of it.
    pub fn set_max_error(&mut self, max_error: ChordAngle) -> bool {
        match self {
            Self::ShapeIndex(t) => {
                t.max_error = max_error;
                true
            }
            _ => false,
        }
    }

    /// Returns the ids of shapes in `index` whose interior contains the
    /// target, ascending and distinct, stopping once `limit` ids have been
    /// found. Cell targets are resolved approximately: a shape may be
    /// reported when it contains only part of the cell.
    #[must_use]
    pub fn containing_shapes(&self, index: &ShapeIndex, limit: usize) -> Vec<i32> {
        containment::containing_shapes(self, index, limit)
    }
}

fn update_if_less(dist: ChordAngle, min_dist: &mut ChordAngle) -> bool {
    if dist < *min_dist {
        *min_dist = dist;
        return true;
    }
    false
}
