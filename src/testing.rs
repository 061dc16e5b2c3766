//! Random geometry and result checks shared by the unit tests.

use std::f64::consts::PI;

use rand::rngs::StdRng;
use rand::Rng;

use crate::geometry::cap::Cap;
use crate::geometry::shape::Shape;
use crate::math::{ortho, ChordAngle, Point};
use crate::query::EdgeResult;

/// Mean Earth radius, for expressing test distances in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.01;

/// Converts a distance on the Earth to an angle.
pub fn km_to_radians(km: f64) -> f64 {
    km / EARTH_RADIUS_KM
}

/// Installs a `tracing` subscriber honouring `RUST_LOG`. Safe to call from
/// every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A point uniformly distributed on the sphere.
pub fn random_point(rng: &mut StdRng) -> Point {
    loop {
        let p = Point::new(
            rng.random_range(-1.0..1.0),
            rng.random_range(-1.0..1.0),
            rng.random_range(-1.0..1.0),
        );
        let n2 = p.norm_squared();
        if n2 > 1e-6 && n2 <= 1.0 {
            return p.normalize();
        }
    }
}

/// A right-handed orthonormal frame whose third axis is `z`.
pub fn frame_at(z: &Point) -> (Point, Point, Point) {
    let x = ortho(z);
    let y = z.cross(&x);
    (x, y, *z)
}

/// Like [`frame_at`] but rotated by a random angle about `z`.
pub fn random_frame_at(rng: &mut StdRng, z: &Point) -> (Point, Point, Point) {
    let (x, y, z) = frame_at(z);
    let (sin, cos) = rng.random_range(0.0..2.0 * PI).sin_cos();
    (x * cos + y * sin, y * cos - x * sin, z)
}

/// A point uniformly distributed within `cap`.
pub fn sample_point(rng: &mut StdRng, cap: &Cap) -> Point {
    let (x, y, z) = frame_at(cap.center());
    // Cap area is proportional to its height, so pick the height uniformly.
    let h = rng.random::<f64>() * 0.5 * cap.radius().length2();
    let theta = rng.random_range(0.0..2.0 * PI);
    let r = (h * (2.0 - h)).sqrt();
    (x * (theta.cos() * r) + y * (theta.sin() * r) + z * (1.0 - h)).normalize()
}

/// A counter-clockwise loop of `n` vertices evenly spaced on the circle of
/// angular radius `radius` around `center`.
pub fn regular_loop(center: &Point, radius: f64, n: usize) -> Vec<Point> {
    let (x, y, z) = frame_at(center);
    let (sin_r, cos_r) = radius.sin_cos();
    (0..n)
        .map(|k| {
            #[allow(clippy::cast_precision_loss)]
            let theta = 2.0 * PI * k as f64 / n as f64;
            (z * cos_r + (x * theta.cos() + y * theta.sin()) * sin_r).normalize()
        })
        .collect()
}

/// A Koch snowflake with at most `max_edges` edges that fits in the cap of
/// angular radius `radius` around the third axis of `frame`, counter-clockwise.
pub fn fractal_loop(frame: &(Point, Point, Point), radius: f64, max_edges: usize) -> Vec<Point> {
    let mut level = 0;
    while 3 * 4_usize.pow(level + 1) <= max_edges {
        level += 1;
    }
    // Equilateral triangle inscribed in the unit circle.
    let mut vertices: Vec<(f64, f64)> = (0..3)
        .map(|k| {
            let theta = 2.0 * PI * f64::from(k) / 3.0;
            (theta.cos(), theta.sin())
        })
        .collect();
    for _ in 0..level {
        let mut next = Vec::with_capacity(vertices.len() * 4);
        for (k, &(x0, y0)) in vertices.iter().enumerate() {
            let (x1, y1) = vertices[(k + 1) % vertices.len()];
            let (dx, dy) = ((x1 - x0) / 3.0, (y1 - y0) / 3.0);
            let (ax, ay) = (x0 + dx, y0 + dy);
            let (bx, by) = (x0 + 2.0 * dx, y0 + 2.0 * dy);
            // Apex of the bump, to the right of the edge (outside the loop).
            let h = 3.0_f64.sqrt() / 2.0;
            let apex = (0.5 * (ax + bx) + dy * h, 0.5 * (ay + by) - dx * h);
            next.extend([(x0, y0), (ax, ay), apex, (bx, by)]);
        }
        vertices = next;
    }
    // The snowflake reaches 1.0 from its center; map the plane onto the cap
    // with a gnomonic projection.
    let (x, y, z) = frame;
    let scale = radius.tan();
    vertices
        .into_iter()
        .map(|(u, v)| (z + x * (u * scale) + y * (v * scale)).normalize())
        .collect()
}

/// `n` points sampled uniformly within `cap`.
pub fn point_cloud(rng: &mut StdRng, cap: &Cap, n: usize) -> Vec<Point> {
    (0..n).map(|_| sample_point(rng, cap)).collect()
}

/// Convenience wrapper turning a loop into a single-loop polygon shape.
#[allow(clippy::unwrap_used)]
pub fn loop_shape(vertices: Vec<Point>) -> Shape {
    Shape::polygon(vec![vertices]).unwrap()
}

/// Checks that `actual` agrees with the exhaustive `expected` answer of a
/// query with the given limits. Differences are tolerated only where
/// `max_error` or cell pruning round-off allow them.
pub fn check_distance_results(
    expected: &[EdgeResult],
    actual: &[EdgeResult],
    max_results: usize,
    max_distance: ChordAngle,
    max_error: ChordAngle,
) -> bool {
    // Bound on the error of cell distance bounds, which can prune candidates
    // right at the limit.
    const MAX_PRUNING_ERROR: f64 = 1e-15;
    let missing = check_result_set(actual, expected, max_results, max_distance, max_error, MAX_PRUNING_ERROR, "missing");
    let extra = check_result_set(expected, actual, max_results, max_distance, max_error, 0.0, "extra");
    missing && extra
}

/// Checks that `x` holds, exactly once, every item of `y` that it must
/// contain given its size and the limits.
fn check_result_set(
    x: &[EdgeResult],
    y: &[EdgeResult],
    max_results: usize,
    max_distance: ChordAngle,
    max_error: ChordAngle,
    max_pruning_error: f64,
    label: &str,
) -> bool {
    assert!(x.windows(2).all(|w| w[0].distance() <= w[1].distance()));
    let limit = if x.len() < max_results {
        if max_distance.is_infinity() {
            f64::INFINITY
        } else {
            max_distance.to_radians() - max_pruning_error
        }
    } else if let Some(last) = x.last() {
        last.distance().to_radians() - max_error.to_radians() - max_pruning_error
    } else {
        0.0
    };
    let mut ok = true;
    for item in y {
        let count = x
            .iter()
            .filter(|r| (r.shape_id(), r.edge_id()) == (item.shape_id(), item.edge_id()))
            .count();
        if item.distance().to_radians() < limit && count != 1 {
            let kind = if count > 1 { "duplicate" } else { label };
            tracing::error!(%item, kind, "result sets differ");
            ok = false;
        }
    }
    ok
}
