//! Closest-edge queries against a [`ShapeIndex`](crate::index::ShapeIndex).

mod closest_edge;
mod containment;
mod options;
mod result;
mod target;

pub use closest_edge::ClosestEdgeQuery;
pub use options::{Options, UNLIMITED_RESULTS};
pub use result::EdgeResult;
pub use target::{
    ShapeIndexTarget, Target, CELL_MAX_BRUTE_FORCE_INDEX_SIZE, EDGE_MAX_BRUTE_FORCE_INDEX_SIZE,
    POINT_MAX_BRUTE_FORCE_INDEX_SIZE, SHAPE_INDEX_MAX_BRUTE_FORCE_INDEX_SIZE,
};
