use crate::math::edge_distance;
use crate::math::{ChordAngle, Point};

/// A spherical cap: all points within `radius` of `center`.
///
/// Caps are the cheap bounding regions used to prune the closest-edge
/// search. A negative radius denotes the empty cap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cap {
    center: Point,
    radius: ChordAngle,
}

impl Cap {
    /// Creates a cap from a center and a chord radius.
    #[must_use]
    pub fn new(center: Point, radius: ChordAngle) -> Self {
        Self { center, radius }
    }

    /// Creates a cap containing only `center`.
    #[must_use]
    pub fn from_point(center: Point) -> Self {
        Self::new(center, ChordAngle::ZERO)
    }

    /// Returns the empty cap.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(Point::z(), ChordAngle::NEGATIVE)
    }

    /// Returns the cap covering the whole sphere.
    #[must_use]
    pub fn full() -> Self {
        Self::new(Point::z(), ChordAngle::STRAIGHT)
    }

    /// Returns the center of the cap.
    #[must_use]
    pub fn center(&self) -> &Point {
        &self.center
    }

    /// Returns the radius as a chord angle.
    #[must_use]
    pub fn radius(&self) -> ChordAngle {
        self.radius
    }

    /// Returns true if the cap contains no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.radius.is_negative()
    }

    /// Returns true if `p` lies inside the cap (boundary included).
    #[must_use]
    pub fn contains(&self, p: &Point) -> bool {
        ChordAngle::between(&self.center, p) <= self.radius
    }

    /// Expands the cap, if necessary, so that it contains `p`.
    pub fn add_point(&mut self, p: &Point) {
        if self.is_empty() {
            *self = Self::from_point(*p);
            return;
        }
        let dist = ChordAngle::between(&self.center, p);
        if dist > self.radius {
            self.radius = dist;
        }
    }

    /// Returns a lower bound on the distance from `p` to any point of the
    /// cap. The empty cap is infinitely far away.
    #[must_use]
    pub fn distance_to_point(&self, p: &Point) -> ChordAngle {
        if self.is_empty() {
            return ChordAngle::INFINITY;
        }
        ChordAngle::between(&self.center, p) - self.radius
    }

    /// Returns a lower bound on the distance from edge `ab` to the cap.
    #[must_use]
    pub fn distance_to_edge(&self, a: &Point, b: &Point) -> ChordAngle {
        if self.is_empty() {
            return ChordAngle::INFINITY;
        }
        edge_distance::distance(&self.center, a, b) - self.radius
    }

    /// Returns a lower bound on the distance between two caps.
    #[must_use]
    pub fn distance_to_cap(&self, other: &Self) -> ChordAngle {
        if self.is_empty() || other.is_empty() {
            return ChordAngle::INFINITY;
        }
        ChordAngle::between(&self.center, &other.center) - self.radius - other.radius
    }
}
