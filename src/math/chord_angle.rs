use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Sub};

use super::Point;

/// An angle represented by the squared length of the chord it subtends on
/// the unit sphere.
///
/// Chord angles are cheap to compute from two points (no trigonometry) and
/// are ordered the same way as the angles they represent, which makes them
/// the distance type of every closest-edge computation. Valid values lie in
/// `[0, 4]`; [`ChordAngle::NEGATIVE`] and [`ChordAngle::INFINITY`] are the
/// special values below and above that range.
#[derive(Clone, Copy, Debug, Default)]
pub struct ChordAngle {
    length2: f64,
}

impl ChordAngle {
    /// Largest squared chord length (two antipodal points).
    pub const MAX_LENGTH2: f64 = 4.0;

    /// The zero angle.
    pub const ZERO: Self = Self { length2: 0.0 };

    /// A 90 degree angle.
    pub const RIGHT: Self = Self { length2: 2.0 };

    /// A 180 degree angle, the largest finite chord angle.
    pub const STRAIGHT: Self = Self {
        length2: Self::MAX_LENGTH2,
    };

    /// Greater than every finite chord angle.
    pub const INFINITY: Self = Self {
        length2: f64::INFINITY,
    };

    /// Less than every finite chord angle.
    pub const NEGATIVE: Self = Self { length2: -1.0 };

    /// Creates a chord angle from a squared chord length, clamped to
    /// [`ChordAngle::STRAIGHT`]. Negative input yields [`ChordAngle::NEGATIVE`].
    #[must_use]
    pub fn from_length2(length2: f64) -> Self {
        if length2 < 0.0 {
            return Self::NEGATIVE;
        }
        if length2 == 0.0 {
            return Self::ZERO;
        }
        Self {
            length2: length2.min(Self::MAX_LENGTH2),
        }
    }

    /// Creates a chord angle from an angle in radians.
    ///
    /// Angles above pi are clamped to [`ChordAngle::STRAIGHT`], infinite
    /// angles map to [`ChordAngle::INFINITY`].
    #[must_use]
    pub fn from_radians(radians: f64) -> Self {
        if radians < 0.0 {
            Self::NEGATIVE
        } else if radians.is_infinite() {
            Self::INFINITY
        } else {
            let length = 2.0 * (0.5 * radians.min(std::f64::consts::PI)).sin();
            Self::from_length2(length * length)
        }
    }

    /// Creates a chord angle from an angle in degrees.
    #[must_use]
    pub fn from_degrees(degrees: f64) -> Self {
        Self::from_radians(degrees.to_radians())
    }

    /// Returns the chord angle between two unit-length points.
    #[must_use]
    pub fn between(a: &Point, b: &Point) -> Self {
        Self::from_length2((a - b).norm_squared())
    }

    /// Returns the squared chord length.
    #[must_use]
    pub fn length2(self) -> f64 {
        self.length2
    }

    /// Converts to an angle in radians.
    #[must_use]
    pub fn to_radians(self) -> f64 {
        if self.is_negative() {
            -1.0
        } else if self.is_infinity() {
            f64::INFINITY
        } else {
            2.0 * (0.5 * self.length2.sqrt()).asin()
        }
    }

    /// Converts to an angle in degrees.
    #[must_use]
    pub fn to_degrees(self) -> f64 {
        self.to_radians().to_degrees()
    }

    /// Returns true for a zero angle.
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.length2 == 0.0
    }

    /// Returns true for [`ChordAngle::NEGATIVE`] and other negative values.
    #[must_use]
    pub fn is_negative(self) -> bool {
        self.length2 < 0.0
    }

    /// Returns true for [`ChordAngle::INFINITY`].
    #[must_use]
    pub fn is_infinity(self) -> bool {
        self.length2.is_infinite()
    }

    /// Returns true for [`ChordAngle::NEGATIVE`] and [`ChordAngle::INFINITY`].
    #[must_use]
    pub fn is_special(self) -> bool {
        self.is_negative() || self.is_infinity()
    }

    /// Returns the smallest representable chord angle strictly greater than
    /// this one.
    ///
    /// Turning an inclusive bound `d` into the exclusive bound
    /// `d.successor()` never skips a value a distance computation can return.
    #[must_use]
    pub fn successor(self) -> Self {
        if self.length2 >= Self::MAX_LENGTH2 {
            return Self::INFINITY;
        }
        if self.length2 < 0.0 {
            return Self::ZERO;
        }
        Self {
            length2: self.length2.next_up(),
        }
    }

    /// Returns the largest representable chord angle strictly less than
    /// this one.
    #[must_use]
    pub fn predecessor(self) -> Self {
        if self.length2 <= 0.0 {
            return Self::NEGATIVE;
        }
        if self.length2 > Self::MAX_LENGTH2 {
            return Self::STRAIGHT;
        }
        Self::from_length2(self.length2.next_down())
    }

    /// Adds an error bound expressed in squared chord length units. Special
    /// values are returned unchanged.
    #[must_use]
    pub fn plus_error(self, error: f64) -> Self {
        if self.is_special() {
            return self;
        }
        Self::from_length2((self.length2 + error).max(0.0))
    }

    /// Maximum error in `length2` of a chord angle computed with
    /// [`ChordAngle::between`] from two points that were each normalized in
    /// double precision.
    #[must_use]
    pub fn point_constructor_max_error(self) -> f64 {
        4.5 * f64::EPSILON * self.length2 + 16.0 * f64::EPSILON * f64::EPSILON
    }
}

impl PartialEq for ChordAngle {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ChordAngle {}

impl PartialOrd for ChordAngle {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ChordAngle {
    fn cmp(&self, other: &Self) -> Ordering {
        self.length2.total_cmp(&other.length2)
    }
}

/// Adds two angles, clamping the sum to [`ChordAngle::STRAIGHT`].
impl Add for ChordAngle {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        let (a2, b2) = (self.length2, rhs.length2);
        if b2 <= 0.0 || self.is_special() {
            return self;
        }
        if a2 + b2 >= Self::MAX_LENGTH2 {
            return Self::STRAIGHT;
        }
        // sin/cos angle addition rewritten in terms of squared chords.
        let x = a2 * (1.0 - 0.25 * b2);
        let y = b2 * (1.0 - 0.25 * a2);
        Self::from_length2(x + y + 2.0 * (x * y).sqrt())
    }
}

/// Subtracts two angles, clamping the difference at zero.
impl Sub for ChordAngle {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        let (a2, b2) = (self.length2, rhs.length2);
        if b2 <= 0.0 || self.is_special() {
            return self;
        }
        if a2 <= b2 {
            return Self::ZERO;
        }
        let x = a2 * (1.0 - 0.25 * b2);
        let y = b2 * (1.0 - 0.25 * a2);
        Self::from_length2((x + y - 2.0 * (x * y).sqrt()).max(0.0))
    }
}

impl fmt::Display for ChordAngle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.to_degrees())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn special_values_order() {
        assert!(ChordAngle::NEGATIVE < ChordAngle::ZERO);
        assert!(ChordAngle::ZERO < ChordAngle::RIGHT);
        assert!(ChordAngle::RIGHT < ChordAngle::STRAIGHT);
        assert!(ChordAngle::STRAIGHT < ChordAngle::INFINITY);
        assert_eq!(ChordAngle::from_length2(-0.0), ChordAngle::ZERO);
    }

    #[test]
    fn radians_round_trip() {
        for deg in [0.0, 1e-9, 0.5, 45.0, 90.0, 179.0, 180.0] {
            let a = ChordAngle::from_degrees(deg);
            assert_relative_eq!(a.to_degrees(), deg, max_relative = 1e-12, epsilon = 1e-13);
        }
        assert_eq!(ChordAngle::from_degrees(270.0), ChordAngle::STRAIGHT);
        assert_eq!(ChordAngle::from_radians(-1.0), ChordAngle::NEGATIVE);
        assert_eq!(ChordAngle::from_radians(f64::INFINITY), ChordAngle::INFINITY);
    }

    #[test]
    fn successor_and_predecessor() {
        assert_eq!(ChordAngle::NEGATIVE.successor(), ChordAngle::ZERO);
        assert!(ChordAngle::ZERO.successor() > ChordAngle::ZERO);
        assert!(ChordAngle::ZERO.successor().length2() < 1e-300);
        assert_eq!(ChordAngle::STRAIGHT.successor(), ChordAngle::INFINITY);
        assert_eq!(ChordAngle::INFINITY.predecessor(), ChordAngle::STRAIGHT);
        assert_eq!(ChordAngle::ZERO.predecessor(), ChordAngle::NEGATIVE);

        let d = ChordAngle::from_degrees(10.0);
        assert!(d < d.successor());
        assert_eq!(d.successor().predecessor(), d);
    }

    #[test]
    fn angle_arithmetic() {
        let a = ChordAngle::from_degrees(10.0);
        let b = ChordAngle::from_degrees(20.0);
        assert_relative_eq!((a + b).to_degrees(), 30.0, max_relative = 1e-12);
        assert_relative_eq!((b - a).to_degrees(), 10.0, max_relative = 1e-12);
        assert_eq!(a - b, ChordAngle::ZERO);
        assert_eq!(a + ChordAngle::ZERO, a);
        assert_eq!(a - ChordAngle::ZERO, a);
        assert_eq!(
            ChordAngle::from_degrees(150.0) + ChordAngle::from_degrees(60.0),
            ChordAngle::STRAIGHT
        );
        assert_eq!(ChordAngle::INFINITY - a, ChordAngle::INFINITY);
    }

    #[test]
    fn plus_error_clamps() {
        assert_eq!(ChordAngle::STRAIGHT.plus_error(1.0), ChordAngle::STRAIGHT);
        assert_eq!(ChordAngle::ZERO.plus_error(-1.0), ChordAngle::ZERO);
        assert_eq!(ChordAngle::INFINITY.plus_error(1.0), ChordAngle::INFINITY);
        let d = ChordAngle::from_length2(1.0);
        assert_eq!(d.plus_error(0.5).length2(), 1.5);
    }
}
