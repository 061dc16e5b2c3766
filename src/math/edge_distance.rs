//! Distances between points and geodesic edges on the unit sphere.
//!
//! All "update" functions share one contract: they overwrite `min_dist` and
//! return true only when the computed distance is strictly less than the
//! current value. Callers rely on this to detect when a candidate actually
//! improves a running minimum.

use super::{orientation, robust_cross, ChordAngle, Point};

/// How two edges relate to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crossing {
    /// The interiors of the edges cross at a single point.
    Proper,
    /// The edges share a vertex or a vertex lies exactly on the other edge.
    Touching,
    /// The edges do not intersect.
    None,
}

/// Classifies how edge `ab` relates to edge `cd`.
#[must_use]
pub fn crossing(a: &Point, b: &Point, c: &Point, d: &Point) -> Crossing {
    if a == c || a == d || b == c || b == d {
        return Crossing::Touching;
    }
    if a == b || c == d {
        return Crossing::None;
    }
    let acb = -orientation(a, b, c);
    let bda = orientation(a, b, d);
    if acb == 0 || bda == 0 {
        return touching_or_none(a, b, c, d);
    }
    if acb != bda {
        return Crossing::None;
    }
    let cbd = -orientation(c, d, b);
    let dac = orientation(c, d, a);
    if cbd == 0 || dac == 0 {
        return touching_or_none(a, b, c, d);
    }
    if cbd != acb || dac != acb {
        return Crossing::None;
    }
    Crossing::Proper
}

fn touching_or_none(a: &Point, b: &Point, c: &Point, d: &Point) -> Crossing {
    let mut dist = ChordAngle::INFINITY;
    update_min_distance(a, c, d, &mut dist);
    update_min_distance(b, c, d, &mut dist);
    update_min_distance(c, a, b, &mut dist);
    update_min_distance(d, a, b, &mut dist);
    if dist.is_zero() {
        Crossing::Touching
    } else {
        Crossing::None
    }
}

/// Updates `min_dist` with the distance from `x` to edge `ab` if it is
/// strictly smaller.
pub fn update_min_distance(x: &Point, a: &Point, b: &Point, min_dist: &mut ChordAngle) -> bool {
    let xa2 = (x - a).norm_squared();
    let xb2 = (x - b).norm_squared();
    if update_min_interior_distance(x, a, b, xa2, xb2, min_dist) {
        return true;
    }
    let dist2 = xa2.min(xb2);
    if dist2 >= min_dist.length2() {
        return false;
    }
    *min_dist = ChordAngle::from_length2(dist2);
    true
}

/// Handles the case where the closest point on `ab` lies in its interior.
fn update_min_interior_distance(
    x: &Point,
    a: &Point,
    b: &Point,
    xa2: f64,
    xb2: f64,
    min_dist: &mut ChordAngle,
) -> bool {
    // Both planar angles XAB and XBA must be acute, otherwise the closest
    // point is a vertex.
    if xa2.max(xb2) >= xa2.min(xb2) + (a - b).norm_squared() {
        return false;
    }
    let c = robust_cross(a, b);
    let c2 = c.norm_squared();
    if c2 == 0.0 {
        return false;
    }
    let x_dot_c = x.dot(&c);
    let x_dot_c2 = x_dot_c * x_dot_c;
    // Distance to the plane of the great circle is a lower bound.
    if x_dot_c2 > c2 * min_dist.length2() {
        return false;
    }
    let cx = c.cross(x);
    if a.dot(&cx) >= 0.0 || b.dot(&cx) <= 0.0 {
        return false;
    }
    let qr = 1.0 - (cx.norm_squared() / c2).sqrt();
    let dist2 = x_dot_c2 / c2 + qr * qr;
    if dist2 >= min_dist.length2() {
        return false;
    }
    *min_dist = ChordAngle::from_length2(dist2);
    true
}

/// Returns the distance from `x` to edge `ab`.
#[must_use]
pub fn distance(x: &Point, a: &Point, b: &Point) -> ChordAngle {
    let mut dist = ChordAngle::INFINITY;
    update_min_distance(x, a, b, &mut dist);
    dist
}

/// Updates `min_dist` with the minimum distance between edges `a0a1` and
/// `b0b1` if it is strictly smaller.
pub fn update_edge_pair_min_distance(
    a0: &Point,
    a1: &Point,
    b0: &Point,
    b1: &Point,
    min_dist: &mut ChordAngle,
) -> bool {
    if min_dist.is_zero() {
        return false;
    }
    if crossing(a0, a1, b0, b1) == Crossing::Proper {
        *min_dist = ChordAngle::ZERO;
        return true;
    }
    // Non-short-circuiting `|` so all four endpoint cases are evaluated.
    update_min_distance(a0, b0, b1, min_dist)
        | update_min_distance(a1, b0, b1, min_dist)
        | update_min_distance(b0, a0, a1, min_dist)
        | update_min_distance(b1, a0, a1, min_dist)
}

/// Returns the point on edge `ab` closest to `x`.
#[must_use]
pub fn project(x: &Point, a: &Point, b: &Point) -> Point {
    let a_cross_b = robust_cross(a, b);
    let n2 = a_cross_b.norm_squared();
    if n2 > 0.0 {
        let p = x - a_cross_b * (x.dot(&a_cross_b) / n2);
        if a_cross_b.cross(a).dot(&p) > 0.0 && p.cross(b).dot(&a_cross_b) > 0.0 {
            return p.normalize();
        }
    }
    if (x - a).norm_squared() <= (x - b).norm_squared() {
        *a
    } else {
        *b
    }
}

/// Returns the maximum error in the `length2` of a distance computed by
/// [`update_min_distance`] whose result is `dist`.
#[must_use]
pub fn update_min_distance_max_error(dist: ChordAngle) -> f64 {
    interior_distance_max_error(dist).max(dist.point_constructor_max_error())
}

fn interior_distance_max_error(dist: ChordAngle) -> f64 {
    // Beyond 90 degrees the closest point is always an endpoint.
    if dist >= ChordAngle::RIGHT {
        return 0.0;
    }
    let sqrt3 = 3.0_f64.sqrt();
    let b = (0.5 * dist.length2()).min(1.0);
    let a = (b * (2.0 - b)).sqrt();
    ((2.5 + 2.0 * sqrt3 + 8.5 * a) * a
        + (2.0 + 2.0 * sqrt3 / 3.0 + 6.5 * (1.0 - b)) * b
        + (23.0 + 16.0 / sqrt3) * f64::EPSILON)
        * f64::EPSILON
}
