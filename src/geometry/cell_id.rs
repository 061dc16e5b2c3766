//! Hierarchical cell identifiers.
//!
//! The sphere is projected onto the six faces of a cube. Each face is
//! recursively split into four children down to [`MAX_LEVEL`]. A cell id
//! packs the face into the top 3 bits, followed by two bits per level that
//! select the child (Morton order of the `(i, j)` face coordinates), followed
//! by a single marker bit. Consequently every cell's descendants occupy the
//! contiguous id range `[range_min, range_max]`, and sorting ids sorts cells
//! in a depth-first traversal order.

use std::fmt;

use crate::math::Point;

/// Number of levels below a face cell.
pub const MAX_LEVEL: u8 = 30;

/// Number of cube faces.
pub const NUM_FACES: u8 = 6;

const POS_BITS: u32 = 2 * MAX_LEVEL as u32 + 1;
const MAX_SIZE: u64 = 1 << MAX_LEVEL;

/// A cell in the hierarchical decomposition of the sphere.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellId(u64);

impl CellId {
    /// Returns the level-0 cell covering cube face `face`.
    #[must_use]
    pub fn from_face(face: u8) -> Self {
        Self((u64::from(face) << POS_BITS) + lsb_for_level(0))
    }

    /// Returns the leaf cell containing `p`.
    #[must_use]
    pub fn from_point(p: &Point) -> Self {
        let (face, u, v) = xyz_to_face_uv(p);
        Self::from_face_ij(face, uv_to_ij(u), uv_to_ij(v))
    }

    /// Returns the leaf cell at face coordinates `(i, j)`.
    #[must_use]
    pub fn from_face_ij(face: u8, i: u32, j: u32) -> Self {
        let pos = (spread(u64::from(i)) << 1) | spread(u64::from(j));
        Self((u64::from(face) << POS_BITS) | (pos << 1) | 1)
    }

    /// Wraps a raw id. The caller is responsible for its validity.
    #[must_use]
    pub fn from_raw(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw 64-bit id.
    #[must_use]
    pub fn raw(self) -> u64 {
        self.0
    }

    /// Returns the cube face (0..6).
    #[must_use]
    pub fn face(self) -> u8 {
        // The face occupies the top three bits, so the shift leaves at most 7.
        #[allow(clippy::cast_possible_truncation)]
        let face = (self.0 >> POS_BITS) as u8;
        face
    }

    /// Lowest set bit, the marker that encodes the level.
    #[must_use]
    pub fn lsb(self) -> u64 {
        self.0 & self.0.wrapping_neg()
    }

    /// Returns the subdivision level (0 for a face cell).
    #[must_use]
    pub fn level(self) -> u8 {
        // trailing_zeros of a valid id is at most 60.
        #[allow(clippy::cast_possible_truncation)]
        let half = (self.0.trailing_zeros() / 2) as u8;
        MAX_LEVEL - half
    }

    /// Returns true for a level-0 cell.
    #[must_use]
    pub fn is_face(self) -> bool {
        self.level() == 0
    }

    /// Returns true for a cell at [`MAX_LEVEL`].
    #[must_use]
    pub fn is_leaf(self) -> bool {
        self.0 & 1 != 0
    }

    /// Returns true if the face and marker bit are well formed.
    #[must_use]
    pub fn is_valid(self) -> bool {
        self.face() < NUM_FACES && self.lsb() & 0x1555_5555_5555_5555 != 0
    }

    /// Returns the ancestor at `level`, which must not exceed this cell's level.
    #[must_use]
    pub fn parent_at(self, level: u8) -> Self {
        let lsb = lsb_for_level(level);
        Self((self.0 & lsb.wrapping_neg()) | lsb)
    }

    /// Returns the immediate parent. Must not be called on a face cell.
    #[must_use]
    pub fn parent(self) -> Self {
        let lsb = self.lsb() << 2;
        Self((self.0 & lsb.wrapping_neg()) | lsb)
    }

    /// Returns child `k` (0..4). Must not be called on a leaf.
    #[must_use]
    pub fn child(self, k: u8) -> Self {
        let lsb = self.lsb();
        let child_lsb = lsb >> 2;
        Self(self.0 - lsb + (2 * u64::from(k) + 1) * child_lsb)
    }

    /// Returns the four children in id order.
    #[must_use]
    pub fn children(self) -> [Self; 4] {
        [self.child(0), self.child(1), self.child(2), self.child(3)]
    }

    /// Smallest leaf id contained by this cell.
    #[must_use]
    pub fn range_min(self) -> Self {
        Self(self.0 - (self.lsb() - 1))
    }

    /// Largest leaf id contained by this cell.
    #[must_use]
    pub fn range_max(self) -> Self {
        Self(self.0 + (self.lsb() - 1))
    }

    /// Returns true if `other` is this cell or one of its descendants.
    #[must_use]
    pub fn contains(self, other: Self) -> bool {
        self.range_min() <= other && other <= self.range_max()
    }

    /// Returns true if either cell contains the other.
    #[must_use]
    pub fn intersects(self, other: Self) -> bool {
        other.range_min() <= self.range_max() && other.range_max() >= self.range_min()
    }

    /// Returns the smallest cell containing both `self` and `other`, if they
    /// lie on the same face.
    #[must_use]
    pub fn common_ancestor(self, other: Self) -> Option<Self> {
        if self.face() != other.face() {
            return None;
        }
        let bits = (self.0 ^ other.0).max(self.lsb().max(other.lsb()));
        // Highest differing bit position determines the shared level.
        let highest = 63 - bits.leading_zeros();
        #[allow(clippy::cast_possible_truncation)]
        let level = MAX_LEVEL - ((highest + 1) / 2) as u8;
        Some(self.parent_at(level.min(self.level()).min(other.level())))
    }

    /// Returns the face and the `(i, j)` leaf coordinates of the cell's
    /// lower-left corner, plus the edge length in leaf units.
    #[must_use]
    pub fn face_ij_size(self) -> (u8, u32, u32, u32) {
        let pos = (self.range_min().0 & ((1 << POS_BITS) - 1)) >> 1;
        // compact() of a 60-bit position yields at most 30 bits.
        #[allow(clippy::cast_possible_truncation)]
        let (i, j) = (compact(pos >> 1) as u32, compact(pos) as u32);
        (self.face(), i, j, 1 << (MAX_LEVEL - self.level()))
    }

    /// Returns the face and the `[u0, u1] x [v0, v1]` bounds of the cell.
    #[must_use]
    pub fn face_uv_bounds(self) -> (u8, [f64; 2], [f64; 2]) {
        let (face, i, j, size) = self.face_ij_size();
        let u = [ij_to_uv(u64::from(i)), ij_to_uv(u64::from(i) + u64::from(size))];
        let v = [ij_to_uv(u64::from(j)), ij_to_uv(u64::from(j) + u64::from(size))];
        (face, u, v)
    }

    /// Returns the center of the cell as a unit-length point.
    #[must_use]
    pub fn to_point(self) -> Point {
        let (face, u, v) = self.face_uv_bounds();
        face_uv_to_xyz(face, 0.5 * (u[0] + u[1]), 0.5 * (v[0] + v[1])).normalize()
    }
}

impl fmt::Debug for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CellId({}/", self.face())?;
        for level in 1..=self.level() {
            let shift = 2 * u32::from(MAX_LEVEL - level) + 1;
            write!(f, "{}", (self.0 >> shift) & 3)?;
        }
        write!(f, ")")
    }
}

fn lsb_for_level(level: u8) -> u64 {
    1 << (2 * u32::from(MAX_LEVEL - level))
}

/// Spreads the low 32 bits of `x` so that bit `k` lands on bit `2k`.
fn spread(x: u64) -> u64 {
    let mut x = x & 0xffff_ffff;
    x = (x | (x << 16)) & 0x0000_ffff_0000_ffff;
    x = (x | (x << 8)) & 0x00ff_00ff_00ff_00ff;
    x = (x | (x << 4)) & 0x0f0f_0f0f_0f0f_0f0f;
    x = (x | (x << 2)) & 0x3333_3333_3333_3333;
    (x | (x << 1)) & 0x5555_5555_5555_5555
}

/// Inverse of [`spread`]: gathers the even bits of `x`.
fn compact(x: u64) -> u64 {
    let mut x = x & 0x5555_5555_5555_5555;
    x = (x | (x >> 1)) & 0x3333_3333_3333_3333;
    x = (x | (x >> 2)) & 0x0f0f_0f0f_0f0f_0f0f;
    x = (x | (x >> 4)) & 0x00ff_00ff_00ff_00ff;
    x = (x | (x >> 8)) & 0x0000_ffff_0000_ffff;
    (x | (x >> 16)) & 0xffff_ffff
}

#[allow(clippy::cast_precision_loss)]
fn ij_to_uv(ij: u64) -> f64 {
    2.0 * (ij as f64) / (MAX_SIZE as f64) - 1.0
}

#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn uv_to_ij(uv: f64) -> u32 {
    let scaled = (0.5 * (uv + 1.0) * MAX_SIZE as f64).floor();
    scaled.clamp(0.0, (MAX_SIZE - 1) as f64) as u32
}

/// Maps a point to the cube face it projects onto and its `(u, v)`
/// coordinates in `[-1, 1]` on that face.
#[must_use]
pub fn xyz_to_face_uv(p: &Point) -> (u8, f64, f64) {
    let (x, y, z) = (p.x, p.y, p.z);
    let (ax, ay, az) = (x.abs(), y.abs(), z.abs());
    if ax >= ay && ax >= az {
        if x >= 0.0 {
            (0, -z / ax, y / ax)
        } else {
            (1, z / ax, y / ax)
        }
    } else if ay >= az {
        if y >= 0.0 {
            (2, x / ay, -z / ay)
        } else {
            (3, x / ay, z / ay)
        }
    } else if z >= 0.0 {
        (4, x / az, y / az)
    } else {
        (5, -x / az, y / az)
    }
}

/// Projects `p` onto the plane of `face`, or returns `None` when `p` lies in
/// the opposite hemisphere.
#[must_use]
pub fn face_xyz_to_uv(face: u8, p: &Point) -> Option<(f64, f64)> {
    let (x, y, z) = (p.x, p.y, p.z);
    match face {
        0 if x > 0.0 => Some((-z / x, y / x)),
        1 if x < 0.0 => Some((-z / x, -y / x)),
        2 if y > 0.0 => Some((x / y, -z / y)),
        3 if y < 0.0 => Some((-x / y, -z / y)),
        4 if z > 0.0 => Some((x / z, y / z)),
        5 if z < 0.0 => Some((x / z, -y / z)),
        _ => None,
    }
}

/// Returns the (non-normalized) point on the cube at `(u, v)` of `face`.
#[must_use]
pub fn face_uv_to_xyz(face: u8, u: f64, v: f64) -> Point {
    match face {
        0 => Point::new(1.0, v, -u),
        1 => Point::new(-1.0, v, u),
        2 => Point::new(u, 1.0, -v),
        3 => Point::new(u, -1.0, v),
        4 => Point::new(u, v, 1.0),
        _ => Point::new(-u, v, -1.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::from_lat_lng_degrees as ll;

    #[test]
    fn face_cells_have_level_zero() {
        for face in 0..NUM_FACES {
            let id = CellId::from_face(face);
            assert!(id.is_valid());
            assert!(id.is_face());
            assert_eq!(id.face(), face);
            assert_eq!(id.level(), 0);
        }
    }

    #[test]
    fn leaf_from_point_is_contained_by_ancestors() {
        let p = ll(12.0, 34.0);
        let leaf = CellId::from_point(&p);
        assert!(leaf.is_leaf());
        assert_eq!(leaf.level(), MAX_LEVEL);
        for level in 0..=MAX_LEVEL {
            let ancestor = leaf.parent_at(level);
            assert_eq!(ancestor.level(), level);
            assert!(ancestor.contains(leaf));
        }
        assert_eq!(leaf.parent().level(), MAX_LEVEL - 1);
    }

    #[test]
    fn children_are_contiguous_and_ordered() {
        let parent = CellId::from_face(3).child(2).child(1);
        let children = parent.children();
        assert_eq!(children[0].range_min(), parent.range_min());
        assert_eq!(children[3].range_max(), parent.range_max());
        for pair in children.windows(2) {
            assert!(pair[0] < pair[1]);
            assert_eq!(pair[0].range_max().raw() + 2, pair[1].range_min().raw());
        }
        for child in children {
            assert_eq!(child.parent(), parent);
            assert!(parent.contains(child));
            assert!(!child.contains(parent));
        }
    }

    #[test]
    fn ij_round_trip() {
        let id = CellId::from_face_ij(4, 123_456, 987_654);
        let (face, i, j, size) = id.face_ij_size();
        assert_eq!((face, i, j, size), (4, 123_456, 987_654, 1));
        let (_, i, j, size) = id.parent_at(10).face_ij_size();
        assert_eq!(size, 1 << 20);
        assert_eq!(i, 123_456 & !((1 << 20) - 1));
        assert_eq!(j, 987_654 & !((1 << 20) - 1));
    }

    #[test]
    fn uv_projection_round_trip() {
        for face in 0..NUM_FACES {
            let p = face_uv_to_xyz(face, 0.25, -0.5).normalize();
            let (f, u, v) = xyz_to_face_uv(&p);
            assert_eq!(f, face);
            assert!((u - 0.25).abs() < 1e-15 && (v + 0.5).abs() < 1e-15);
            let (u, v) = face_xyz_to_uv(face, &p).unwrap_or((f64::NAN, f64::NAN));
            assert!((u - 0.25).abs() < 1e-15 && (v + 0.5).abs() < 1e-15);
        }
    }

    #[test]
    fn center_maps_back_to_cell() {
        let id = CellId::from_point(&ll(-40.0, 100.0)).parent_at(7);
        assert!(id.contains(CellId::from_point(&id.to_point())));
    }

    #[test]
    fn common_ancestor() {
        let a = CellId::from_point(&ll(1.0, 1.0));
        let b = CellId::from_point(&ll(1.0, 1.1));
        let anc = a.common_ancestor(b).unwrap_or(a);
        assert!(anc.contains(a) && anc.contains(b));
        for child in anc.children() {
            assert!(!(child.contains(a) && child.contains(b)));
        }
        assert_eq!(a.common_ancestor(a), Some(a));
        assert_eq!(a.common_ancestor(CellId::from_face(5)), None);
    }
}
