use crate::math::edge_distance::{update_edge_pair_min_distance, update_min_distance};
use crate::math::{ChordAngle, Point};

use super::cap::Cap;
use super::cell_id::{face_uv_to_xyz, face_xyz_to_uv, CellId};

/// Slack applied to `(u, v)` bounds so that points on a shared boundary are
/// reported inside every adjacent cell.
const UV_MARGIN: f64 = 4.0 * f64::EPSILON;

/// Largest squared chord distance at which an edge is still considered to
/// touch a cell.
const TOUCH_LENGTH2: f64 = 1e-30;

/// The geometry of a [`CellId`]: a spherical quadrilateral bounded by four
/// geodesic edges.
#[derive(Debug, Clone)]
pub struct Cell {
    id: CellId,
    face: u8,
    u: [f64; 2],
    v: [f64; 2],
    vertices: [Point; 4],
    center: Point,
    cap: Cap,
}

impl Cell {
    /// Creates the cell with the given id.
    #[must_use]
    pub fn new(id: CellId) -> Self {
        let (face, u, v) = id.face_uv_bounds();
        let vertices = [
            face_uv_to_xyz(face, u[0], v[0]).normalize(),
            face_uv_to_xyz(face, u[1], v[0]).normalize(),
            face_uv_to_xyz(face, u[1], v[1]).normalize(),
            face_uv_to_xyz(face, u[0], v[1]).normalize(),
        ];
        let center = id.to_point();
        let radius = vertices
            .iter()
            .map(|v| ChordAngle::between(&center, v))
            .max()
            .unwrap_or(ChordAngle::ZERO);
        let cap = Cap::new(center, radius.plus_error(2.0 * radius.point_constructor_max_error()));
        Self {
            id,
            face,
            u,
            v,
            vertices,
            center,
            cap,
        }
    }

    /// Returns the cell of the given level containing `p`.
    #[must_use]
    pub fn from_point(p: &Point, level: u8) -> Self {
        Self::new(CellId::from_point(p).parent_at(level))
    }

    /// Returns the id of the cell.
    #[must_use]
    pub fn id(&self) -> CellId {
        self.id
    }

    /// Returns the level of the cell (0 for a face).
    #[must_use]
    pub fn level(&self) -> u8 {
        self.id.level()
    }

    /// Returns the center of the cell.
    #[must_use]
    pub fn center(&self) -> &Point {
        &self.center
    }

    /// Returns the four corners of the cell.
    #[must_use]
    pub fn vertices(&self) -> &[Point; 4] {
        &self.vertices
    }

    /// Returns a cap bounding the cell.
    #[must_use]
    pub fn cap_bound(&self) -> &Cap {
        &self.cap
    }

    /// Returns true if `p` lies inside the cell or on its boundary.
    #[must_use]
    pub fn contains(&self, p: &Point) -> bool {
        face_xyz_to_uv(self.face, p).is_some_and(|(u, v)| {
            u >= self.u[0] - UV_MARGIN
                && u <= self.u[1] + UV_MARGIN
                && v >= self.v[0] - UV_MARGIN
                && v <= self.v[1] + UV_MARGIN
        })
    }

    fn boundary_edges(&self) -> impl Iterator<Item = (&Point, &Point)> {
        (0..4).map(move |k| (&self.vertices[k], &self.vertices[(k + 1) % 4]))
    }

    /// Returns the exact distance from the cell to `p` (zero inside).
    #[must_use]
    pub fn distance_to_point(&self, p: &Point) -> ChordAngle {
        if self.contains(p) {
            return ChordAngle::ZERO;
        }
        let mut dist = ChordAngle::INFINITY;
        for (v0, v1) in self.boundary_edges() {
            update_min_distance(p, v0, v1, &mut dist);
        }
        dist
    }

    /// Returns the exact distance from the cell to edge `ab` (zero when the
    /// edge touches the cell).
    #[must_use]
    pub fn distance_to_edge(&self, a: &Point, b: &Point) -> ChordAngle {
        if self.contains(a) || self.contains(b) {
            return ChordAngle::ZERO;
        }
        let mut dist = ChordAngle::INFINITY;
        for (v0, v1) in self.boundary_edges() {
            update_edge_pair_min_distance(a, b, v0, v1, &mut dist);
        }
        dist
    }

    /// Returns true if edge `ab` intersects the cell, erring on the side of
    /// reporting an intersection for edges that graze the boundary.
    #[must_use]
    pub fn may_intersect_edge(&self, a: &Point, b: &Point) -> bool {
        if self.cap.distance_to_edge(a, b) > ChordAngle::ZERO {
            return false;
        }
        self.distance_to_edge(a, b).length2() <= TOUCH_LENGTH2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::from_lat_lng_degrees as ll;

    #[test]
    fn cap_bounds_vertices() {
        let cell = Cell::from_point(&ll(10.0, 20.0), 6);
        for v in cell.vertices() {
            assert!(cell.cap_bound().contains(v));
            assert!(cell.contains(v));
        }
        assert!(cell.contains(cell.center()));
        assert!(cell.contains(&ll(10.0, 20.0)));
    }

    #[test]
    fn distances() {
        let cell = Cell::from_point(&ll(0.0, 0.0), 10);
        assert_eq!(cell.distance_to_point(cell.center()), ChordAngle::ZERO);
        let far = ll(0.0, 5.0);
        let d = cell.distance_to_point(&far);
        assert!(d > ChordAngle::ZERO);
        assert!(cell.cap_bound().distance_to_point(&far) <= d);

        // An edge passing straight through the cell without an endpoint in it.
        let c = cell.center();
        let (lat, lng) = crate::math::lat_lng_degrees(c);
        let a = ll(lat - 1.0, lng);
        let b = ll(lat + 1.0, lng);
        assert_eq!(cell.distance_to_edge(&a, &b), ChordAngle::ZERO);
        assert!(cell.may_intersect_edge(&a, &b));
        assert!(!cell.may_intersect_edge(&ll(lat + 1.0, lng - 1.0), &ll(lat + 1.0, lng + 1.0)));
    }

    #[test]
    fn neighbours_share_boundary_points() {
        let parent = Cell::from_point(&ll(3.0, 4.0), 8);
        let children: Vec<Cell> = parent.id().children().into_iter().map(Cell::new).collect();
        let corner = children[0].vertices()[2];
        for child in &children {
            assert!(child.contains(&corner));
        }
    }
}
