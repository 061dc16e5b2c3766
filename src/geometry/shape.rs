use crate::error::GeometryError;
use crate::math::edge_distance::{crossing, distance, Crossing};
use crate::math::{is_unit_length, ortho, robust_cross, ChordAngle, Point};

/// Largest step, in radians, from a loop vertex to the polygon's reference
/// point.
const MAX_REFERENCE_STEP: f64 = 1e-3;

/// A point whose containment in a shape's interior is known.
///
/// Containment of any other point is derived by counting the shape's edges
/// crossed on the way from the reference point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferencePoint {
    pub point: Point,
    pub contained: bool,
}

impl ReferencePoint {
    /// A reference point for shapes without an interior.
    #[must_use]
    pub fn outside() -> Self {
        Self {
            point: Point::z(),
            contained: false,
        }
    }
}

/// A polygon made of zero or more loops.
///
/// Each loop is a closed sequence of vertices with the interior on its left
/// (counter-clockwise seen from outside the sphere), so shells are
/// counter-clockwise and holes clockwise. A polygon without loops is either
/// empty or full (the whole sphere).
#[derive(Debug, Clone)]
pub struct Polygon {
    loops: Vec<Vec<Point>>,
    /// Cumulative edge counts: loop `k` owns edges `offsets[k]..offsets[k + 1]`.
    offsets: Vec<usize>,
    reference: ReferencePoint,
}

impl Polygon {
    /// Creates a polygon from its loops.
    ///
    /// # Errors
    ///
    /// Returns an error if a loop has fewer than 3 vertices, a vertex is
    /// not unit length, or no vertex has a well-defined interior wedge.
    pub fn new(loops: Vec<Vec<Point>>) -> Result<Self, GeometryError> {
        for (index, vertices) in loops.iter().enumerate() {
            if vertices.len() < 3 {
                return Err(GeometryError::LoopTooShort {
                    index,
                    len: vertices.len(),
                });
            }
            check_unit_length(vertices)?;
        }
        let mut offsets = Vec::with_capacity(loops.len() + 1);
        offsets.push(0);
        for vertices in &loops {
            offsets.push(offsets[offsets.len() - 1] + vertices.len());
        }
        let reference = if loops.is_empty() {
            ReferencePoint::outside()
        } else {
            interior_reference(&loops)?
        };
        Ok(Self {
            loops,
            offsets,
            reference,
        })
    }

    /// The polygon containing no points.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            loops: Vec::new(),
            offsets: vec![0],
            reference: ReferencePoint::outside(),
        }
    }

    /// The polygon containing the whole sphere.
    #[must_use]
    pub fn full() -> Self {
        Self {
            loops: Vec::new(),
            offsets: vec![0],
            reference: ReferencePoint {
                point: Point::z(),
                contained: true,
            },
        }
    }

    /// Returns the loops of the polygon.
    #[must_use]
    pub fn loops(&self) -> &[Vec<Point>] {
        &self.loops
    }

    #[must_use]
    pub fn num_edges(&self) -> usize {
        self.offsets[self.offsets.len() - 1]
    }

    /// Returns true for the polygon containing no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.loops.is_empty() && !self.reference.contained
    }

    /// Returns true for the polygon covering the whole sphere.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.loops.is_empty() && self.reference.contained
    }

    /// Returns edge `e`, counting through the loops in order.
    ///
    /// # Panics
    ///
    /// Panics if `e >= self.num_edges()`.
    #[must_use]
    pub fn edge(&self, e: usize) -> (Point, Point) {
        let k = self.offsets.partition_point(|&offset| offset <= e) - 1;
        let vertices = &self.loops[k];
        let i = e - self.offsets[k];
        (vertices[i], vertices[(i + 1) % vertices.len()])
    }

    #[must_use]
    pub fn reference_point(&self) -> ReferencePoint {
        self.reference
    }

    /// Returns true if `p` lies in the polygon's interior.
    #[must_use]
    pub fn contains(&self, p: &Point) -> bool {
        let edges = (0..self.num_edges()).map(|e| self.edge(e));
        self.reference.contained ^ crosses_odd(&self.reference.point, p, edges)
    }
}

/// Returns a point just inside the polygon next to one of its vertices.
///
/// The point lies on the bisector of the interior wedge at the vertex, and
/// closer to the vertex than any edge not incident to it, so no boundary
/// separates it from the interior side of the vertex.
fn interior_reference(loops: &[Vec<Point>]) -> Result<ReferencePoint, GeometryError> {
    for (k, vertices) in loops.iter().enumerate() {
        let n = vertices.len();
        for i in 0..n {
            let v = &vertices[i];
            let Some(bisector) = wedge_bisector(&vertices[(i + n - 1) % n], v, &vertices[(i + 1) % n])
            else {
                continue;
            };
            let clearance = loop_edges(loops)
                .filter(|&(lk, j, _, _)| lk != k || (j != i && (j + 1) % n != i))
                .map(|(_, _, a, b)| distance(v, &a, &b))
                .min()
                .unwrap_or(ChordAngle::INFINITY);
            if clearance.is_zero() {
                continue;
            }
            let step = (0.5 * clearance.to_radians()).min(MAX_REFERENCE_STEP);
            let (sin, cos) = step.sin_cos();
            return Ok(ReferencePoint {
                point: (v * cos + bisector * sin).normalize(),
                contained: true,
            });
        }
    }
    Err(GeometryError::Degenerate(
        "no polygon vertex has a well-defined interior wedge".to_string(),
    ))
}

/// Every loop edge as `(loop, index in loop, start, end)`.
fn loop_edges(loops: &[Vec<Point>]) -> impl Iterator<Item = (usize, usize, Point, Point)> + '_ {
    loops.iter().enumerate().flat_map(|(k, vertices)| {
        let n = vertices.len();
        (0..n).map(move |j| (k, j, vertices[j], vertices[(j + 1) % n]))
    })
}

/// Unit tangent at `v` pointing along the geodesic toward `q`.
fn tangent_toward(v: &Point, q: &Point) -> Option<Point> {
    let t = robust_cross(v, q).cross(v);
    (t.norm_squared() > 1e-30).then(|| t.normalize())
}

/// Unit tangent at `v` halving the wedge that lies to the left of the path
/// `prev -> v -> next`. None when the wedge is degenerate.
fn wedge_bisector(prev: &Point, v: &Point, next: &Point) -> Option<Point> {
    let to_next = tangent_toward(v, next)?;
    let to_prev = tangent_toward(v, prev)?;
    let sum = to_next + to_prev;
    if sum.norm_squared() < 1e-20 {
        // Straight through `v`: the interior is to the left of travel.
        return Some(v.cross(&to_next));
    }
    // Positive when the counter-clockwise turn from `to_next` to `to_prev`
    // is less than half a turn.
    let turn = to_next.cross(&to_prev).dot(v);
    if turn.abs() < 1e-15 {
        return None;
    }
    let bisector = sum.normalize();
    Some(if turn > 0.0 { bisector } else { -bisector })
}

fn check_unit_length(vertices: &[Point]) -> Result<(), GeometryError> {
    match vertices.iter().find(|p| !is_unit_length(p)) {
        Some(p) => Err(GeometryError::NotUnitLength {
            x: p.x,
            y: p.y,
            z: p.z,
        }),
        None => Ok(()),
    }
}

/// Returns true if the path from `from` to `to` properly crosses an odd
/// number of `edges`. Paths longer than 90 degrees are split at their
/// midpoint so that every leg is a well-defined geodesic.
pub(crate) fn crosses_odd<I>(from: &Point, to: &Point, edges: I) -> bool
where
    I: IntoIterator<Item = (Point, Point)>,
{
    if from.dot(to) >= 0.0 {
        return edges
            .into_iter()
            .filter(|(a, b)| crossing(from, to, a, b) == Crossing::Proper)
            .count()
            % 2
            == 1;
    }
    let sum = from + to;
    let mid = if sum.norm_squared() > 1e-20 {
        sum.normalize()
    } else {
        ortho(from)
    };
    edges
        .into_iter()
        .filter(|(a, b)| {
            (crossing(from, &mid, a, b) == Crossing::Proper)
                ^ (crossing(&mid, to, a, b) == Crossing::Proper)
        })
        .count()
        % 2
        == 1
}

/// A geometric object stored in a [`ShapeIndex`](crate::index::ShapeIndex).
#[derive(Debug, Clone)]
pub enum Shape {
    /// A set of points; each point is a degenerate edge.
    Points(Vec<Point>),
    /// An open chain of edges.
    Polyline(Vec<Point>),
    /// A polygon with an interior.
    Polygon(Polygon),
}

impl Shape {
    /// Creates a point set.
    ///
    /// # Errors
    ///
    /// Returns an error if a point is not unit length.
    pub fn points(points: Vec<Point>) -> Result<Self, GeometryError> {
        check_unit_length(&points)?;
        Ok(Self::Points(points))
    }

    /// Creates a polyline.
    ///
    /// # Errors
    ///
    /// Returns an error if a vertex is not unit length.
    pub fn polyline(vertices: Vec<Point>) -> Result<Self, GeometryError> {
        check_unit_length(&vertices)?;
        Ok(Self::Polyline(vertices))
    }

    /// Creates a polygon shape from its loops.
    ///
    /// # Errors
    ///
    /// See [`Polygon::new`].
    pub fn polygon(loops: Vec<Vec<Point>>) -> Result<Self, GeometryError> {
        Ok(Self::Polygon(Polygon::new(loops)?))
    }

    /// 0 for points, 1 for polylines, 2 for polygons.
    #[must_use]
    pub fn dimension(&self) -> u8 {
        match self {
            Self::Points(_) => 0,
            Self::Polyline(_) => 1,
            Self::Polygon(_) => 2,
        }
    }

    /// Returns true for polygons.
    #[must_use]
    pub fn has_interior(&self) -> bool {
        self.dimension() == 2
    }

    #[must_use]
    pub fn num_edges(&self) -> usize {
        match self {
            Self::Points(points) => points.len(),
            Self::Polyline(vertices) => vertices.len().saturating_sub(1),
            Self::Polygon(polygon) => polygon.num_edges(),
        }
    }

    /// Returns edge `e`.
    ///
    /// # Panics
    ///
    /// Panics if `e >= self.num_edges()`.
    #[must_use]
    pub fn edge(&self, e: usize) -> (Point, Point) {
        match self {
            Self::Points(points) => (points[e], points[e]),
            Self::Polyline(vertices) => (vertices[e], vertices[e + 1]),
            Self::Polygon(polygon) => polygon.edge(e),
        }
    }

    /// Iterates over all edges in order.
    pub fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        (0..self.num_edges()).map(|e| self.edge(e))
    }

    /// Returns the first vertex of every non-empty chain of edges: each
    /// point, the start of the polyline, the first vertex of each loop.
    #[must_use]
    pub fn chain_starts(&self) -> Vec<Point> {
        match self {
            Self::Points(points) => points.clone(),
            Self::Polyline(vertices) if vertices.len() >= 2 => vec![vertices[0]],
            Self::Polyline(_) => Vec::new(),
            Self::Polygon(polygon) => polygon.loops().iter().map(|l| l[0]).collect(),
        }
    }

    #[must_use]
    pub fn reference_point(&self) -> ReferencePoint {
        match self {
            Self::Polygon(polygon) => polygon.reference_point(),
            _ => ReferencePoint::outside(),
        }
    }

    /// Returns true if `p` lies in the shape's interior. Always false for
    /// points and polylines.
    #[must_use]
    pub fn contains(&self, p: &Point) -> bool {
        match self {
            Self::Polygon(polygon) => polygon.contains(p),
            _ => false,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::from_lat_lng_degrees as ll;

    fn square() -> Polygon {
        Polygon::new(vec![vec![
            ll(0.0, 0.0),
            ll(0.0, 5.0),
            ll(5.0, 5.0),
            ll(5.0, 0.0),
        ]])
        .unwrap()
    }

    #[test]
    fn polygon_contains_interior_points_only() {
        let polygon = square();
        assert_eq!(polygon.num_edges(), 4);
        assert!(polygon.contains(&ll(2.0, 2.0)));
        assert!(polygon.contains(&ll(4.9, 0.1)));
        assert!(!polygon.contains(&ll(6.0, 2.0)));
        assert!(!polygon.contains(&ll(-30.0, 170.0)));
        assert!(!polygon.contains(&ll(-2.0, -2.0)));
    }

    #[test]
    fn polygon_with_hole() {
        let polygon = Polygon::new(vec![
            vec![ll(0.0, 0.0), ll(0.0, 10.0), ll(10.0, 10.0), ll(10.0, 0.0)],
            vec![ll(4.0, 4.0), ll(6.0, 4.0), ll(6.0, 6.0), ll(4.0, 6.0)],
        ])
        .unwrap();
        assert_eq!(polygon.num_edges(), 8);
        assert_eq!(polygon.edge(5), (ll(6.0, 4.0), ll(6.0, 6.0)));
        assert!(polygon.contains(&ll(2.0, 2.0)));
        assert!(!polygon.contains(&ll(5.0, 5.0)));
        assert!(!polygon.contains(&ll(20.0, 20.0)));
    }

    #[test]
    fn sliver_polygon_keeps_its_reference_inside() {
        let sliver = Polygon::new(vec![vec![ll(0.0, 0.0), ll(0.0, 10.0), ll(0.005, 5.0)]]).unwrap();
        assert!(sliver.contains(&ll(0.001, 5.0)));
        assert!(!sliver.contains(&ll(50.0, 50.0)));
        assert!(!sliver.contains(&ll(-0.001, 5.0)));
        assert!(!sliver.contains(&ll(0.01, 5.0)));
        let reference = sliver.reference_point();
        assert!(reference.contained);
        assert!(reference.point.iter().all(|c| c.is_finite()));
    }

    #[test]
    fn reference_skips_degenerate_vertices() {
        // The first edge has zero length, so neither of its vertices has a
        // wedge.
        let polygon = Polygon::new(vec![vec![
            ll(0.0, 0.0),
            ll(0.0, 0.0),
            ll(0.0, 5.0),
            ll(5.0, 5.0),
            ll(5.0, 0.0),
        ]])
        .unwrap();
        assert!(polygon.reference_point().point.iter().all(|c| c.is_finite()));
        assert!(polygon.contains(&ll(2.0, 2.0)));
        assert!(!polygon.contains(&ll(-2.0, 2.0)));

        let err = Polygon::new(vec![vec![ll(0.0, 0.0), ll(0.0, 5.0), ll(0.0, 0.0)]]).unwrap_err();
        assert!(matches!(err, GeometryError::Degenerate(_)));
    }

    #[test]
    fn clockwise_shell_contains_the_outside() {
        let polygon = Polygon::new(vec![vec![
            ll(5.0, 0.0),
            ll(5.0, 5.0),
            ll(0.0, 5.0),
            ll(0.0, 0.0),
        ]])
        .unwrap();
        assert!(!polygon.contains(&ll(2.0, 2.0)));
        assert!(polygon.contains(&ll(-40.0, 120.0)));
    }

    #[test]
    fn empty_and_full() {
        let empty = Polygon::empty();
        let full = Polygon::full();
        assert!(empty.is_empty() && !empty.is_full());
        assert!(full.is_full() && !full.is_empty());
        assert_eq!(full.num_edges(), 0);
        assert!(!empty.contains(&ll(1.0, 1.0)));
        assert!(full.contains(&ll(1.0, 1.0)));
    }

    #[test]
    fn short_loop_is_rejected() {
        let err = Polygon::new(vec![vec![ll(0.0, 0.0), ll(0.0, 1.0)]]).unwrap_err();
        assert!(matches!(err, GeometryError::LoopTooShort { index: 0, len: 2 }));
        assert!(Shape::points(vec![Point::new(1.0, 1.0, 0.0)]).is_err());
    }

    #[test]
    fn shape_edges_and_chains() {
        let points = Shape::points(vec![ll(1.0, 1.0), ll(2.0, 2.0)]).unwrap();
        assert_eq!(points.num_edges(), 2);
        assert_eq!(points.edge(1), (ll(2.0, 2.0), ll(2.0, 2.0)));
        assert_eq!(points.chain_starts().len(), 2);
        assert!(!points.has_interior());

        let line = Shape::polyline(vec![ll(0.0, 0.0), ll(0.0, 1.0), ll(1.0, 1.0)]).unwrap();
        assert_eq!(line.num_edges(), 2);
        assert_eq!(line.chain_starts(), vec![ll(0.0, 0.0)]);
        assert!(!line.contains(&ll(0.5, 0.5)));

        let polygon = Shape::Polygon(square());
        assert_eq!(polygon.dimension(), 2);
        assert_eq!(polygon.edges().count(), 4);
        assert!(polygon.contains(&ll(1.0, 1.0)));
    }
}
