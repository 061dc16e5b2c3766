use std::fmt;

use crate::math::ChordAngle;

/// One answer of a closest-edge query.
///
/// Results order by distance, then shape id, then edge id. An `edge_id` of
/// -1 means the target lies inside the interior of shape `shape_id`; a
/// `shape_id` of -1 marks the empty result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct EdgeResult {
    distance: ChordAngle,
    shape_id: i32,
    edge_id: i32,
}

impl Default for EdgeResult {
    fn default() -> Self {
        Self::empty()
    }
}

impl EdgeResult {
    /// Creates a result for the given edge.
    #[must_use]
    pub fn new(distance: ChordAngle, shape_id: i32, edge_id: i32) -> Self {
        Self {
            distance,
            shape_id,
            edge_id,
        }
    }

    /// The result returned when nothing satisfies the query.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(ChordAngle::INFINITY, -1, -1)
    }

    /// A zero-distance result for a shape whose interior contains the
    /// target.
    #[must_use]
    pub fn interior(shape_id: i32) -> Self {
        Self::new(ChordAngle::ZERO, shape_id, -1)
    }

    /// Returns the distance to the target.
    #[must_use]
    pub fn distance(&self) -> ChordAngle {
        self.distance
    }

    /// Returns the shape id, or -1 for an empty result.
    #[must_use]
    pub fn shape_id(&self) -> i32 {
        self.shape_id
    }

    /// Returns the edge id within the shape, or -1 for interior and empty
    /// results.
    #[must_use]
    pub fn edge_id(&self) -> i32 {
        self.edge_id
    }

    /// Returns true if the result names no shape, like [`EdgeResult::empty`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shape_id < 0
    }

    /// True if the result refers to a shape's interior rather than an edge.
    #[must_use]
    pub fn is_interior(&self) -> bool {
        self.shape_id >= 0 && self.edge_id < 0
    }
}

impl fmt::Display for EdgeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}:{})", self.distance, self.shape_id, self.edge_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering() {
        let near = EdgeResult::new(ChordAngle::from_degrees(1.0), 5, 7);
        let far = EdgeResult::new(ChordAngle::from_degrees(2.0), 0, 0);
        assert!(near < far);
        assert!(EdgeResult::new(near.distance(), 5, 6) < near);
        assert!(EdgeResult::new(near.distance(), 4, 9) < near);
        assert!(EdgeResult::interior(9) < near);
    }

    #[test]
    fn empty_and_interior() {
        let empty = EdgeResult::default();
        assert!(empty.is_empty());
        assert!(!empty.is_interior());
        assert_eq!(empty.distance(), ChordAngle::INFINITY);

        let interior = EdgeResult::interior(2);
        assert!(interior.is_interior());
        assert_eq!(interior.edge_id(), -1);
        assert_eq!(interior.distance(), ChordAngle::ZERO);
    }
}
