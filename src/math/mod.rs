pub mod chord_angle;
pub mod edge_distance;

pub use chord_angle::ChordAngle;

/// A point on the unit sphere, stored as a unit-length 3D vector.
pub type Point = nalgebra::Vector3<f64>;

/// Largest accepted deviation of `|p|^2` from 1 for a valid [`Point`].
pub const UNIT_LENGTH_TOLERANCE: f64 = 1e-12;

/// Returns true if `p` is within [`UNIT_LENGTH_TOLERANCE`] of unit length.
#[must_use]
pub fn is_unit_length(p: &Point) -> bool {
    (p.norm_squared() - 1.0).abs() <= UNIT_LENGTH_TOLERANCE
}

/// Converts a latitude/longitude pair in degrees to a point on the sphere.
#[must_use]
pub fn from_lat_lng_degrees(lat: f64, lng: f64) -> Point {
    let (lat, lng) = (lat.to_radians(), lng.to_radians());
    let (sin_lat, cos_lat) = lat.sin_cos();
    let (sin_lng, cos_lng) = lng.sin_cos();
    Point::new(cos_lat * cos_lng, cos_lat * sin_lng, sin_lat)
}

/// Returns the `(lat, lng)` of `p` in degrees.
#[must_use]
pub fn lat_lng_degrees(p: &Point) -> (f64, f64) {
    let lat = p.z.atan2(p.x.hypot(p.y));
    let lng = p.y.atan2(p.x);
    (lat.to_degrees(), lng.to_degrees())
}

/// Returns the sign of the triple product `(a x b) . c`: `1` when `a, b, c`
/// are counter-clockwise, `-1` when clockwise, `0` when coplanar.
#[must_use]
pub fn orientation(a: &Point, b: &Point, c: &Point) -> i32 {
    let det = a.cross(b).dot(c);
    if det > 0.0 {
        1
    } else if det < 0.0 {
        -1
    } else {
        0
    }
}

/// Returns a vector parallel to `a x b` computed as `(b + a) x (b - a)`,
/// which stays accurate when `a` and `b` are nearly identical.
#[must_use]
pub fn robust_cross(a: &Point, b: &Point) -> Point {
    (b + a).cross(&(b - a))
}

/// Returns a unit vector orthogonal to `a`.
#[must_use]
pub fn ortho(a: &Point) -> Point {
    let k = match largest_abs_component(a) {
        0 => 2,
        k => k - 1,
    };
    let mut temp = Point::new(0.012, 0.0053, 0.004_57);
    temp[k] = 1.0;
    a.cross(&temp).normalize()
}

fn largest_abs_component(a: &Point) -> usize {
    let (x, y, z) = (a.x.abs(), a.y.abs(), a.z.abs());
    if x > y {
        if x > z {
            0
        } else {
            2
        }
    } else if y > z {
        1
    } else {
        2
    }
}

/// Returns the angle between two points in radians, accurate for both small
/// and nearly antipodal separations.
#[must_use]
pub fn angle(a: &Point, b: &Point) -> f64 {
    a.cross(b).norm().atan2(a.dot(b))
}

/// Returns the point at angle `radians` from `a` along the great circle
/// toward `b`.
#[must_use]
pub fn interpolate_at_distance(radians: f64, a: &Point, b: &Point) -> Point {
    let normal = robust_cross(a, b);
    let tangent = normal.cross(a).normalize();
    let (sin, cos) = radians.sin_cos();
    (a * cos + tangent * sin).normalize()
}

/// Returns the point a fraction `t` of the way from `a` to `b`.
#[must_use]
pub fn interpolate(t: f64, a: &Point, b: &Point) -> Point {
    if t == 0.0 {
        return *a;
    }
    if t == 1.0 {
        return *b;
    }
    interpolate_at_distance(t * angle(a, b), a, b)
}
